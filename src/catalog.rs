//! Note catalog reader.
//!
//! The catalog store keeps folders and notes in one `NoteModel` table as an
//! adjacency list (`parentUniqueId`). Folders are loaded into a
//! [`FolderForest`] that lives only while notes are being resolved; each note
//! comes out with its folder path already walked from root to parent.

use rusqlite::{Connection, OpenFlags};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

const FOLDER_KIND: i64 = 0;
const NOTE_KIND: i64 = 1;

const SELECT_FOLDERS: &str =
    "SELECT uniqueId, title, parentUniqueId FROM NoteModel WHERE type = ?1";
const SELECT_NOTES: &str =
    "SELECT uniqueId, title, pageNameList, parentUniqueId FROM NoteModel WHERE type = ?1";

/// Errors that make the whole catalog unusable.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Folder hierarchy contains a cycle through folder {0}")]
    Cycle(String),

    #[error("Parent folder {0} does not exist")]
    DanglingParent(String),

    #[error("Catalog record without an id (kind {kind})")]
    MissingId { kind: i64 },
}

/// Errors decoding a note's page id list.
#[derive(Debug, thiserror::Error)]
pub enum PageListError {
    #[error("page list is missing")]
    Missing,

    #[error("malformed page list: {0}")]
    Json(#[from] serde_json::Error),
}

/// A folder record from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderNode {
    pub id: String,
    pub title: String,
    pub parent_id: Option<String>,
}

/// The folder adjacency list, keyed by folder id.
#[derive(Debug, Default)]
pub struct FolderForest {
    folders: HashMap<String, FolderNode>,
}

impl FolderForest {
    /// Builds a forest from folder records. Later duplicates replace earlier ones.
    pub fn new(nodes: impl IntoIterator<Item = FolderNode>) -> Self {
        let folders = nodes
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect();
        FolderForest { folders }
    }

    /// Returns the number of folders.
    pub fn len(&self) -> usize {
        self.folders.len()
    }

    /// Returns true when the catalog has no folders.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Walks parent links from `parent_id` up to a root and returns the folder
    /// titles in root-to-parent order.
    pub fn resolve_path(&self, parent_id: Option<&str>) -> Result<Vec<String>, CatalogError> {
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        let mut current = parent_id.filter(|id| !id.is_empty());

        while let Some(id) = current {
            if !visited.insert(id) {
                return Err(CatalogError::Cycle(id.to_string()));
            }
            let folder = self
                .folders
                .get(id)
                .ok_or_else(|| CatalogError::DanglingParent(id.to_string()))?;
            path.push(folder.title.clone());
            current = folder.parent_id.as_deref().filter(|id| !id.is_empty());
        }

        path.reverse();
        Ok(path)
    }

    /// Resolves every folder once so integrity errors surface before any note
    /// is rendered.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for folder in self.folders.values() {
            self.resolve_path(Some(&folder.id))?;
        }
        Ok(())
    }
}

/// A note ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDescriptor {
    pub id: String,
    pub title: String,
    pub page_ids: Vec<String>,
    /// Folder titles from root to immediate parent. Empty for top-level notes.
    pub folder_path: Vec<String>,
}

impl NoteDescriptor {
    /// Returns `folder/.../title` for display.
    pub fn display_path(&self) -> String {
        display_path(&self.folder_path, &self.title)
    }
}

/// A note whose page list could not be decoded.
#[derive(Debug)]
pub struct UnreadableNote {
    pub id: String,
    pub title: String,
    pub folder_path: Vec<String>,
    pub error: PageListError,
}

impl UnreadableNote {
    /// Returns `folder/.../title` for display.
    pub fn display_path(&self) -> String {
        display_path(&self.folder_path, &self.title)
    }
}

/// Notes of a backup, in the catalog's enumeration order.
#[derive(Debug, Default)]
pub struct Catalog {
    pub notes: Vec<Result<NoteDescriptor, UnreadableNote>>,
}

impl Catalog {
    /// Reads the catalog store at `path`.
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Self::read(&conn)
    }

    /// Reads folders and notes from an open catalog connection.
    pub fn read(conn: &Connection) -> Result<Self, CatalogError> {
        let forest = FolderForest::new(read_folders(conn)?);
        forest.validate()?;

        let mut stmt = conn.prepare(SELECT_NOTES)?;
        let mut rows = stmt.query([NOTE_KIND])?;
        let mut notes = Vec::new();

        while let Some(row) = rows.next()? {
            let id: String = row
                .get::<_, Option<String>>(0)?
                .ok_or(CatalogError::MissingId { kind: NOTE_KIND })?;
            let title: String = row.get::<_, Option<String>>(1)?.unwrap_or_default();
            let page_list: Option<String> = row.get(2)?;
            let parent_id: Option<String> = row.get(3)?;

            let folder_path = forest.resolve_path(parent_id.as_deref())?;
            let note = match decode_page_list(page_list.as_deref()) {
                Ok(page_ids) => Ok(NoteDescriptor {
                    id,
                    title,
                    page_ids,
                    folder_path,
                }),
                Err(error) => {
                    log::warn!("note {} ({}) has an unreadable page list: {}", title, id, error);
                    Err(UnreadableNote {
                        id,
                        title,
                        folder_path,
                        error,
                    })
                }
            };
            notes.push(note);
        }

        log::info!(
            "catalog loaded: {} folders, {} notes",
            forest.len(),
            notes.len()
        );
        Ok(Catalog { notes })
    }

    /// Returns the number of notes, readable or not.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Returns true when the catalog lists no notes.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Renders one indented line per note, unreadable notes flagged.
    pub fn tree_summary(&self) -> String {
        self.notes
            .iter()
            .map(|note| match note {
                Ok(note) => format!("    {}\n", note.display_path()),
                Err(note) => format!("    {} (unreadable: {})\n", note.display_path(), note.error),
            })
            .collect()
    }
}

fn read_folders(conn: &Connection) -> Result<Vec<FolderNode>, CatalogError> {
    let mut stmt = conn.prepare(SELECT_FOLDERS)?;
    let mut rows = stmt.query([FOLDER_KIND])?;
    let mut folders = Vec::new();

    while let Some(row) = rows.next()? {
        let id = row
            .get::<_, Option<String>>(0)?
            .ok_or(CatalogError::MissingId { kind: FOLDER_KIND })?;
        folders.push(FolderNode {
            id,
            title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            parent_id: row.get(2)?,
        });
    }

    Ok(folders)
}

#[derive(Deserialize)]
struct PageList {
    #[serde(rename = "pageNameList")]
    page_name_list: Vec<String>,
}

/// Decodes the `pageNameList` JSON field into page ids.
pub fn decode_page_list(raw: Option<&str>) -> Result<Vec<String>, PageListError> {
    let raw = raw.ok_or(PageListError::Missing)?;
    let list: PageList = serde_json::from_str(raw)?;
    Ok(list.page_name_list)
}

fn display_path(folder_path: &[String], title: &str) -> String {
    folder_path
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(title))
        .collect::<Vec<_>>()
        .join("/")
}
