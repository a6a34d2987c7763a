//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! Command results and messages go through this module so quiet mode and
//! JSON output behave the same for every command. Library diagnostics go
//! through `tracing` instead.

pub mod output;
