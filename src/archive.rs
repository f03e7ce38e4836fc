//! Backup archive extraction.
//!
//! The backup is a plain zip container. It is unpacked into a scoped temporary
//! directory that is removed when the [`ExtractedArchive`] is dropped.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Name of the catalog store at the root of every backup.
pub const CATALOG_FILE_NAME: &str = "ShapeDatabase.db";

/// File extension of the per-note stroke stores (`<note_id>.db`).
pub const NOTE_STORE_EXTENSION: &str = "db";

/// Errors that can occur while unpacking a backup.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Corrupt backup archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Backup archive has no catalog ({})", CATALOG_FILE_NAME)]
    MissingCatalog,
}

/// A backup unpacked into a working directory.
pub struct ExtractedArchive {
    dir: TempDir,
}

impl ExtractedArchive {
    /// Unpacks the archive at `path` into a fresh temporary directory.
    pub fn extract(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path)?;
        let mut zip = zip::ZipArchive::new(file)?;
        let dir = tempfile::Builder::new().prefix("note-backup-").tempdir()?;

        log::debug!(
            "extracting {} entries from {} into {}",
            zip.len(),
            path.display(),
            dir.path().display()
        );
        zip.extract(dir.path())?;

        let extracted = ExtractedArchive { dir };
        if !extracted.catalog_path().is_file() {
            return Err(ArchiveError::MissingCatalog);
        }

        Ok(extracted)
    }

    /// Gets the working directory holding the unpacked stores.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Gets the path of the catalog store.
    pub fn catalog_path(&self) -> PathBuf {
        self.path().join(CATALOG_FILE_NAME)
    }
}

/// Returns the path of a note's stroke store inside a working directory.
pub fn note_store_path(workdir: &Path, note_id: &str) -> PathBuf {
    workdir.join(format!("{}.{}", note_id, NOTE_STORE_EXTENSION))
}
