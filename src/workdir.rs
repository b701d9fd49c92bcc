use crate::error::{CatResult, Error};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Directory for intermediate files, exclusively used by one conversion.
///
/// A temporary directory is deleted recursively when this is dropped, including during unwinding.
/// A directory supplied by the caller is left alone.
#[derive(Debug)]
pub enum WorkDir {
    Temporary(TempDir),
    Persistent(PathBuf),
}

impl WorkDir {
    /// Creates `dir` if it doesn't exist, or a fresh temporary directory if `None`
    pub fn acquire(dir: Option<&Path>) -> CatResult<Self> {
        match dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, "create directory", e))?;
                Ok(Self::Persistent(dir.into()))
            },
            None => tempfile::Builder::new()
                .prefix("apng2webp_")
                .tempdir()
                .map(Self::Temporary)
                .map_err(|e| Error::io(std::env::temp_dir(), "create a temporary directory in", e)),
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        match self {
            Self::Temporary(dir) => dir.path(),
            Self::Persistent(dir) => dir,
        }
    }

    /// Same as dropping, but reports failure to delete the temporary directory
    pub fn close(self) -> CatResult<()> {
        match self {
            Self::Temporary(dir) => {
                let path = dir.path().to_path_buf();
                dir.close().map_err(|e| Error::io(path, "remove", e))
            },
            Self::Persistent(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_dir_is_removed() {
        let dir = WorkDir::acquire(None).unwrap();
        let path = dir.path().to_path_buf();
        std::fs::write(path.join("frame1.png"), b"x").unwrap();
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("apng2webp_"));
        dir.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn temporary_dir_is_removed_on_panic() {
        let path = std::sync::Mutex::new(None);
        let res = std::panic::catch_unwind(|| {
            let dir = WorkDir::acquire(None).unwrap();
            *path.lock().unwrap() = Some(dir.path().to_path_buf());
            panic!("stage blew up");
        });
        assert!(res.is_err());
        let path = path.into_inner().unwrap_or_else(|e| e.into_inner()).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn persistent_dir_is_created_and_kept() {
        let parent = tempfile::tempdir().unwrap();
        let wanted = parent.path().join("a/b");
        let dir = WorkDir::acquire(Some(&wanted)).unwrap();
        assert_eq!(dir.path(), wanted);
        std::fs::write(wanted.join("frame1.png"), b"x").unwrap();
        dir.close().unwrap();
        assert!(wanted.join("frame1.png").exists());
    }
}
