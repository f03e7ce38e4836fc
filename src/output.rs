//! Output file placement.

use crate::catalog::NoteDescriptor;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while writing a note's PDF.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Makes a catalog title usable as a single path component.
pub fn sanitize_component(title: &str) -> String {
    match title {
        "" | "." | ".." => "_".to_string(),
        _ => title
            .chars()
            .map(|c| match c {
                '/' | '\\' | '\0' => '_',
                c => c,
            })
            .collect(),
    }
}

/// Returns `<root>/<folder>/.../<title>.pdf` for a note.
pub fn output_path(root: &Path, note: &NoteDescriptor) -> PathBuf {
    let mut path = root.to_path_buf();
    for folder in &note.folder_path {
        path.push(sanitize_component(folder));
    }
    path.push(format!("{}.pdf", sanitize_component(&note.title)));
    path
}

/// Writes the PDF bytes of a note below `root`, creating folders as needed.
pub fn write_document(root: &Path, note: &NoteDescriptor, pdf: &[u8]) -> Result<PathBuf, OutputError> {
    let path = output_path(root, note);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    fs::write(&path, pdf).map_err(|source| OutputError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
