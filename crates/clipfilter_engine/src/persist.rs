use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{} exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Saves downloaded artifacts into one directory.
///
/// Content goes to a temp file next to the target and is renamed into place
/// only after it is fully synced, so a failed download never leaves a
/// truncated video behind.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        create_dir_if_missing(&self.dir)?;

        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(content)?;
        staged.as_file_mut().sync_all()?;

        let target = self.dir.join(filename);
        staged
            .persist(&target)
            .map_err(|err| PersistError::Io(err.error))?;
        Ok(target)
    }
}

fn create_dir_if_missing(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PersistError::NotADirectory(dir.to_path_buf())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(fs::create_dir_all(dir)?),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_directory_and_replaces_previous_download() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AtomicFileWriter::new(dir.path().join("downloads"));

        let path = writer.write("processed-video.mp4", b"first").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"first");

        let path = writer.write("processed-video.mp4", b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert_eq!(fs::read_dir(dir.path().join("downloads")).unwrap().count(), 1);
    }

    #[test]
    fn file_in_place_of_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();

        let err = AtomicFileWriter::new(blocker.clone())
            .write("processed-video.mp4", b"data")
            .unwrap_err();
        assert!(matches!(err, PersistError::NotADirectory(path) if path == blocker));
    }
}
