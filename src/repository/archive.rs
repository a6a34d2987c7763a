//! repository::archive
//!
//! Archive export of a ref's tree.
//!
//! # Layout
//!
//! Archives land at
//! `<storage>/<repo name>/<repo name minus .git>-<commit sha><ext>`, and
//! every entry inside sits under `<repo name minus .git>/`. The name carries
//! the full commit id, so a file on disk always matches its content and is
//! reused instead of rebuilt.
//!
//! # Concurrency
//!
//! Writers hold [`FileLock`] on `<archive>.lock` while checking for and
//! producing the file. `git archive` output is streamed through the
//! compressor into a temp file in the same directory and renamed into place,
//! so readers never see a partial file. The lock file is removed once the
//! archive exists.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;
use tracing::{debug, info, warn};

use super::{Repository, RepositoryError};
use crate::core::format::{ArchiveFormat, Compression};
use crate::core::lock::FileLock;

impl Repository {
    /// Export the tree at `ref_name` as an archive and return its path.
    ///
    /// - `ref_name` defaults to the default branch
    /// - `storage_path` defaults to the configured storage directory
    /// - `format` is a name such as `tar.gz`, `tbz2` or `zip`; unknown names
    ///   fall back to `tar.gz`, and `None` uses the configured format
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::NoDefaultBranch`] if no ref was given and there is
    ///   no default branch
    /// - [`crate::git::GitError::RefNotFound`] if the ref does not resolve
    /// - [`RepositoryError::Io`] if the archive cannot be written
    pub fn archive_repo(
        &self,
        ref_name: Option<&str>,
        storage_path: Option<&Path>,
        format: Option<&str>,
    ) -> Result<PathBuf, RepositoryError> {
        let ref_name = self.ref_or_default(ref_name)?;
        let commit = self.git.resolve_revision(&ref_name)?;
        let format = match format {
            Some(name) => ArchiveFormat::from_name_or_default(name),
            None => self.config.archive_format(),
        };
        let storage = match storage_path {
            Some(path) => path.to_path_buf(),
            None => self.config.storage_path(),
        };

        let stem = self.archive_stem();
        let path = storage
            .join(&self.name)
            .join(format!("{}-{}{}", stem, commit, format.extension()));

        if path.exists() {
            debug!(path = %path.display(), "reusing existing archive");
            return Ok(path);
        }

        let lock_file = lock_path(&path);
        let lock = match FileLock::try_acquire(&lock_file)? {
            Some(lock) => lock,
            None => {
                debug!(lock = %lock_file.display(), "waiting for another export");
                FileLock::acquire(&lock_file)?
            }
        };
        // Another process may have finished while we waited.
        if path.exists() {
            debug!(path = %path.display(), "archive appeared while waiting for lock");
            let _ = lock.unlink();
            return Ok(path);
        }

        let prefix = format!("{stem}/");
        let size = write_atomic(&path, |file| {
            let mut encoder = Encoder::new(file, format.compression());
            self.git
                .write_archive(&commit, &prefix, format.container(), &mut encoder)?;
            encoder.finish().map_err(RepositoryError::io(&path))?;
            Ok(())
        })?;
        // Every later caller finds the archive before it needs the lock file.
        if let Err(e) = lock.unlink() {
            warn!(lock = %lock_file.display(), error = %e, "could not remove lock file");
        }

        info!(
            path = %path.display(),
            %format,
            commit = commit.short(7),
            bytes = size,
            "created archive"
        );
        Ok(path)
    }

    /// Repository name without a trailing `.git`.
    fn archive_stem(&self) -> &str {
        self.name.strip_suffix(".git").unwrap_or(&self.name)
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

/// Applies an archive format's compression to a `git archive` stream as it
/// is written.
enum Encoder<W: Write> {
    Plain(W),
    // GzEncoder writes no file name and a zero mtime, like `gzip -n`.
    Gzip(GzEncoder<W>),
    Bzip2(BzEncoder<W>),
}

impl<W: Write> Encoder<W> {
    fn new(inner: W, compression: Compression) -> Self {
        match compression {
            Compression::None => Encoder::Plain(inner),
            Compression::Gzip => {
                Encoder::Gzip(GzEncoder::new(inner, flate2::Compression::default()))
            }
            Compression::Bzip2 => {
                Encoder::Bzip2(BzEncoder::new(inner, bzip2::Compression::default()))
            }
        }
    }

    /// Write any trailer and hand back the inner writer.
    fn finish(self) -> io::Result<W> {
        match self {
            Encoder::Plain(mut inner) => {
                inner.flush()?;
                Ok(inner)
            }
            Encoder::Gzip(encoder) => encoder.finish(),
            Encoder::Bzip2(encoder) => encoder.finish(),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Encoder::Plain(inner) => inner.write(buf),
            Encoder::Gzip(encoder) => encoder.write(buf),
            Encoder::Bzip2(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Encoder::Plain(inner) => inner.flush(),
            Encoder::Gzip(encoder) => encoder.flush(),
            Encoder::Bzip2(encoder) => encoder.flush(),
        }
    }
}

/// Fill a temp file next to `path` with `fill`, then rename it over `path`.
///
/// Returns the size of the finished file. The temp file is removed if any
/// step fails.
fn write_atomic<F>(path: &Path, fill: F) -> Result<u64, RepositoryError>
where
    F: FnOnce(&mut File) -> Result<(), RepositoryError>,
{
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(RepositoryError::io(dir))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = dir.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    let result = File::create(&temp_path)
        .map_err(RepositoryError::io(&temp_path))
        .and_then(|mut file| {
            fill(&mut file)?;
            file.sync_all().map_err(RepositoryError::io(&temp_path))?;
            let size = file.metadata().map_err(RepositoryError::io(&temp_path))?.len();
            drop(file);
            fs::rename(&temp_path, path).map_err(RepositoryError::io(path))?;
            Ok(size)
        });

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lock::LockError;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn lock_path_appends_suffix() {
        assert_eq!(
            lock_path(Path::new("/tmp/gitlabhq.git/gitlabhq-abc.tar.gz")),
            PathBuf::from("/tmp/gitlabhq.git/gitlabhq-abc.tar.gz.lock")
        );
    }

    fn encode(data: &[u8], compression: Compression) -> Vec<u8> {
        let mut encoder = Encoder::new(Vec::new(), compression);
        // Uneven chunks, the way a pipe delivers them.
        for chunk in data.chunks(7) {
            encoder.write_all(chunk).unwrap();
        }
        encoder.finish().unwrap()
    }

    #[test]
    fn uncompressed_passes_through() {
        let data = b"tar bytes".to_vec();
        assert_eq!(encode(&data, Compression::None), data);
    }

    #[test]
    fn gzip_decodes_back() {
        let data = b"hello archive".repeat(100);
        let packed = encode(&data, Compression::Gzip);
        assert_eq!(&packed[..2], &[0x1f, 0x8b]);

        let mut unpacked = Vec::new();
        flate2::read::GzDecoder::new(&packed[..])
            .read_to_end(&mut unpacked)
            .unwrap();
        assert_eq!(unpacked, data);
    }

    #[test]
    fn gzip_is_reproducible() {
        let data = b"same input".to_vec();
        assert_eq!(
            encode(&data, Compression::Gzip),
            encode(&data, Compression::Gzip)
        );
    }

    #[test]
    fn bzip2_decodes_back() {
        let data = b"hello archive".repeat(100);
        let packed = encode(&data, Compression::Bzip2);
        assert_eq!(&packed[..3], b"BZh");

        let mut unpacked = Vec::new();
        bzip2::read::BzDecoder::new(&packed[..])
            .read_to_end(&mut unpacked)
            .unwrap();
        assert_eq!(unpacked, data);
    }

    fn dir_names(dir: &Path) -> Vec<std::ffi::OsString> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect()
    }

    #[test]
    fn write_atomic_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("repo.git").join("repo-abc.tar");

        let size = write_atomic(&path, |file| {
            file.write_all(b"contents").unwrap();
            Ok(())
        })
        .unwrap();

        assert_eq!(size, 8);
        assert_eq!(fs::read(&path).unwrap(), b"contents");
        assert_eq!(dir_names(path.parent().unwrap()).len(), 1);
    }

    #[test]
    fn write_atomic_removes_temp_file_when_fill_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("repo.git").join("repo-abc.tar");

        let result = write_atomic(&path, |file| {
            file.write_all(b"half an archive").unwrap();
            Err(RepositoryError::Lock(LockError::AcquireFailed(
                "interrupted".into(),
            )))
        });

        assert!(result.is_err());
        assert!(!path.exists());
        assert!(dir_names(path.parent().unwrap()).is_empty());
    }
}
