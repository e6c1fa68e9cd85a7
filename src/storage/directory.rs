use super::{StorageReference, StorageSink};
use crate::error::{HeadshotError, Result};
use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Give up after this many name collisions for a single hint
const MAX_ATTEMPTS: u32 = 1000;

/// Stores files in a directory on the local filesystem
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Open (and create if needed) the output directory
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tracing::info!("Storing processed images in {}", root.display());

        std::fs::create_dir_all(&root).map_err(|source| HeadshotError::StorageWrite {
            path: root.clone(),
            source,
        })?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate path for the n-th attempt: `name.ext`, `name_1.ext`, ...
    fn candidate(&self, filename_hint: &str, attempt: u32) -> PathBuf {
        if attempt == 0 {
            return self.root.join(filename_hint);
        }
        let hint = Path::new(filename_hint);
        let stem = hint
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        let name = match hint.extension() {
            Some(ext) => format!("{}_{}.{}", stem, attempt, ext.to_string_lossy()),
            None => format!("{}_{}", stem, attempt),
        };
        self.root.join(name)
    }

    /// Create a file that did not exist before
    fn create_unique(&self, filename_hint: &str) -> Result<(PathBuf, File)> {
        for attempt in 0..MAX_ATTEMPTS {
            let path = self.candidate(filename_hint, attempt);
            match File::options().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!("{} already exists, trying next name", path.display());
                }
                Err(source) => return Err(HeadshotError::StorageWrite { path, source }),
            }
        }
        Err(HeadshotError::StorageWrite {
            path: self.root.join(filename_hint),
            source: std::io::Error::new(ErrorKind::AlreadyExists, "no free file name"),
        })
    }
}

impl StorageSink for DirectorySink {
    fn store(&self, bytes: &[u8], filename_hint: &str) -> Result<StorageReference> {
        if filename_hint.is_empty() || filename_hint.contains(['/', '\\']) {
            return Err(HeadshotError::invalid(format!(
                "bad file name hint {:?}",
                filename_hint
            )));
        }

        let (path, mut file) = self.create_unique(filename_hint)?;

        let written = file.write_all(bytes).and_then(|_| file.sync_all());
        drop(file);
        let reference = discard_on_error(path, written)?;

        tracing::debug!("Wrote {} bytes to {}", bytes.len(), reference);
        Ok(reference)
    }
}

/// Keep a finished file, or remove what was partially written
fn discard_on_error(path: PathBuf, written: std::io::Result<()>) -> Result<StorageReference> {
    match written {
        Ok(()) => Ok(StorageReference::new(path)),
        Err(source) => {
            tracing::warn!("Write to {} failed, removing partial file", path.display());
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!("Failed to remove {}: {}", path.display(), e);
            }
            Err(HeadshotError::StorageWrite { path, source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested/out");

        let sink = DirectorySink::new(&root).unwrap();

        assert!(root.is_dir());
        assert_eq!(sink.root(), root.as_path());
    }

    #[test]
    fn writes_bytes_under_hint() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path()).unwrap();

        let reference = sink.store(b"hello", "a.jpg").unwrap();

        assert_eq!(reference.path(), dir.path().join("a.jpg"));
        assert_eq!(std::fs::read(reference.path()).unwrap(), b"hello");
    }

    #[test]
    fn never_overwrites_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path()).unwrap();

        let first = sink.store(b"one", "shot.jpg").unwrap();
        let second = sink.store(b"two", "shot.jpg").unwrap();
        let third = sink.store(b"three", "shot.jpg").unwrap();

        assert_eq!(second.path(), dir.path().join("shot_1.jpg"));
        assert_eq!(third.path(), dir.path().join("shot_2.jpg"));
        assert_eq!(std::fs::read(first.path()).unwrap(), b"one");
        assert_eq!(std::fs::read(second.path()).unwrap(), b"two");
    }

    #[test]
    fn rejects_path_like_hints() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path()).unwrap();

        assert!(matches!(
            sink.store(b"x", "../escape.jpg"),
            Err(HeadshotError::InvalidInput(_))
        ));
        assert!(matches!(
            sink.store(b"x", ""),
            Err(HeadshotError::InvalidInput(_))
        ));
    }

    #[test]
    fn removed_root_fails_store() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("out");
        let sink = DirectorySink::new(&root).unwrap();
        std::fs::remove_dir_all(&root).unwrap();

        let err = sink.store(b"bytes", "shot.jpg").unwrap_err();

        match err {
            HeadshotError::StorageWrite { path, source } => {
                assert_eq!(path, root.join("shot.jpg"));
                assert_eq!(source.kind(), ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failed_write_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.jpg");
        std::fs::write(&path, b"half").unwrap();

        let err = discard_on_error(
            path.clone(),
            Err(std::io::Error::new(ErrorKind::Other, "disk full")),
        )
        .unwrap_err();

        assert!(matches!(err, HeadshotError::StorageWrite { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn unwritable_root_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = DirectorySink::new(blocker.join("sub")).err().unwrap();

        assert!(matches!(err, HeadshotError::StorageWrite { .. }));
    }
}
