//! core
//!
//! Core domain types, schemas, and supporting primitives for repokit.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, RefName
//! - [`config`] - Configuration schema and loading
//! - [`format`] - Archive formats and their names
//! - [`lock`] - Exclusive file locks around archive writes
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing

pub mod config;
pub mod format;
pub mod lock;
pub mod types;
