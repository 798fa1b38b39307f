use std::path::{Path, PathBuf};

/// Failures raised while moving document text to or from storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("document has no file path")]
    NoPath,
}

/// Whole-file text storage.
///
/// Documents are read and written as a single UTF-8 string; there is no
/// other persistence format.
pub trait DocumentStore {
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the file is missing, unreadable or not UTF-8.
    fn read(&self, path: &Path) -> Result<String, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the file cannot be written.
    fn write(&self, path: &Path, text: &str) -> Result<(), StoreError>;
}

/// The local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl DocumentStore for FsStore {
    fn read(&self, path: &Path) -> Result<String, StoreError> {
        std::fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write(&self, path: &Path, text: &str) -> Result<(), StoreError> {
        std::fs::write(path, text).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fs_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.md");
        FsStore.write(&path, "# Hi\n").unwrap();
        assert_eq!(FsStore.read(&path).unwrap(), "# Hi\n");
    }

    #[test]
    fn test_fs_store_read_missing_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.md");
        let err = FsStore.read(&path).unwrap_err();
        assert!(err.to_string().contains("missing.md"));
    }

    #[test]
    fn test_fs_store_rejects_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bin.md");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(FsStore.read(&path), Err(StoreError::Read { .. })));
    }

    #[test]
    fn test_fs_store_write_into_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope").join("a.md");
        assert!(matches!(
            FsStore.write(&path, "x"),
            Err(StoreError::Write { .. })
        ));
    }
}
