//! core::format
//!
//! Archive formats and the names callers may use for them.
//!
//! Format names come from URLs and config files, so parsing is lenient:
//! [`ArchiveFormat::from_name_or_default`] maps anything unrecognized to
//! `tar.gz`. Config validation uses the strict [`ArchiveFormat::parse`].

use std::fmt;

use crate::git::ArchiveKind;

/// Compression applied on top of the container `git archive` produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
}

/// A supported archive format.
///
/// # Example
///
/// ```
/// use repokit::core::format::ArchiveFormat;
///
/// assert_eq!(ArchiveFormat::from_name_or_default("tbz2"), ArchiveFormat::TarBz2);
/// assert_eq!(ArchiveFormat::from_name_or_default("zip").extension(), ".zip");
/// assert_eq!(ArchiveFormat::from_name_or_default("madeup"), ArchiveFormat::TarGz);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveFormat {
    #[default]
    TarGz,
    TarBz2,
    Tar,
    Zip,
}

impl ArchiveFormat {
    pub const ALL: [ArchiveFormat; 4] = [
        ArchiveFormat::TarGz,
        ArchiveFormat::TarBz2,
        ArchiveFormat::Tar,
        ArchiveFormat::Zip,
    ];

    /// Parse a format name or alias. Case-insensitive.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "tar.gz" | "tgz" | "gzip" | "gz" => Some(ArchiveFormat::TarGz),
            "tar.bz2" | "tbz" | "tbz2" | "tb2" | "bz2" => Some(ArchiveFormat::TarBz2),
            "tar" => Some(ArchiveFormat::Tar),
            "zip" => Some(ArchiveFormat::Zip),
            _ => None,
        }
    }

    /// Parse a format name, falling back to `tar.gz` for unknown names.
    pub fn from_name_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_default()
    }

    /// File extension including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => ".tar.gz",
            ArchiveFormat::TarBz2 => ".tar.bz2",
            ArchiveFormat::Tar => ".tar",
            ArchiveFormat::Zip => ".zip",
        }
    }

    /// The container `git archive` must produce.
    pub fn container(&self) -> ArchiveKind {
        match self {
            ArchiveFormat::Zip => ArchiveKind::Zip,
            _ => ArchiveKind::Tar,
        }
    }

    pub fn compression(&self) -> Compression {
        match self {
            ArchiveFormat::TarGz => Compression::Gzip,
            ArchiveFormat::TarBz2 => Compression::Bzip2,
            ArchiveFormat::Tar | ArchiveFormat::Zip => Compression::None,
        }
    }

    /// Canonical name, accepted back by [`ArchiveFormat::parse`].
    pub fn name(&self) -> &'static str {
        self.extension().trim_start_matches('.')
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
