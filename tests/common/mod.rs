//! Builders for synthetic note backups.

#![allow(dead_code)]

use printpdf::lopdf::content::Content;
use printpdf::lopdf::Document;
use rusqlite::{params, Connection};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

pub const IDENTITY: &str = r#"{"values": [1, 0, 0, 0, 1, 0, 0, 0, 1]}"#;

/// One stroke row of a note store.
pub struct StrokeRow {
    pub page_id: &'static str,
    pub points: Vec<u8>,
    pub matrix: &'static str,
    pub thickness: f64,
}

/// Encodes (x, y) pairs as a big-endian vertex buffer with zeroed extra channels.
pub fn vertex_buffer(points: &[(f32, f32)]) -> Vec<u8> {
    let mut data = Vec::new();
    for &(x, y) in points {
        for value in [x, y, 0.0, 0.0, 0.0, 0.0] {
            data.extend_from_slice(&value.to_be_bytes());
        }
    }
    data
}

/// A backup being assembled in a scratch directory.
pub struct BackupBuilder {
    dir: TempDir,
    catalog: Connection,
}

impl BackupBuilder {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let catalog = Connection::open(dir.path().join("ShapeDatabase.db")).unwrap();
        catalog
            .execute_batch(
                "CREATE TABLE NoteModel (
                    uniqueId TEXT, title TEXT, pageNameList TEXT,
                    parentUniqueId TEXT, type INTEGER
                );",
            )
            .unwrap();
        BackupBuilder { dir, catalog }
    }

    pub fn folder(self, id: &str, title: &str, parent: Option<&str>) -> Self {
        self.catalog
            .execute(
                "INSERT INTO NoteModel (uniqueId, title, parentUniqueId, type) VALUES (?1, ?2, ?3, 0)",
                params![id, title, parent],
            )
            .unwrap();
        self
    }

    pub fn note(self, id: &str, title: &str, page_list: &str, parent: Option<&str>, strokes: &[StrokeRow]) -> Self {
        self.catalog
            .execute(
                "INSERT INTO NoteModel (uniqueId, title, pageNameList, parentUniqueId, type)
                 VALUES (?1, ?2, ?3, ?4, 1)",
                params![id, title, page_list, parent],
            )
            .unwrap();

        let store = Connection::open(self.dir.path().join(format!("{}.db", id))).unwrap();
        store
            .execute_batch(
                "CREATE TABLE NewShapeModel (
                    pageUniqueId TEXT, points BLOB, matrixValues TEXT, thickness REAL
                );",
            )
            .unwrap();
        for row in strokes {
            store
                .execute(
                    "INSERT INTO NewShapeModel (pageUniqueId, points, matrixValues, thickness)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![row.page_id, row.points, row.matrix, row.thickness],
                )
                .unwrap();
        }
        self
    }

    /// Removes a note's store, as if the backup lost it.
    pub fn without_store(self, id: &str) -> Self {
        std::fs::remove_file(self.dir.path().join(format!("{}.db", id))).unwrap();
        self
    }

    /// Zips every store into `path`.
    pub fn write_zip(self, path: &Path) {
        drop(self.catalog);
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        for entry in std::fs::read_dir(self.dir.path()).unwrap() {
            let entry = entry.unwrap();
            let name = entry.file_name().to_string_lossy().into_owned();
            writer.start_file(name, SimpleFileOptions::default()).unwrap();
            writer.write_all(&std::fs::read(entry.path()).unwrap()).unwrap();
        }
        writer.finish().unwrap();
    }
}

/// The note from the "Work/Projects/Meeting" scenario.
pub fn meeting_backup() -> BackupBuilder {
    BackupBuilder::new()
        .folder("f1", "Work", None)
        .folder("f2", "Projects", Some("f1"))
        .note(
            "n1",
            "Meeting",
            r#"{"pageNameList": ["p1"]}"#,
            Some("f2"),
            &[StrokeRow {
                page_id: "p1",
                points: vertex_buffer(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]),
                matrix: IDENTITY,
                thickness: 1.0,
            }],
        )
}

/// Reads a written PDF and returns the drawing operators (`w`, `m`, `l`, `S`)
/// of every page, in page order.
pub fn pdf_drawing_ops(path: &Path) -> Vec<Vec<String>> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            Content::decode(&doc.get_page_content(page_id).unwrap())
                .unwrap()
                .operations
                .into_iter()
                .map(|op| op.operator)
                .filter(|operator| matches!(operator.as_str(), "w" | "m" | "l" | "S"))
                .collect()
        })
        .collect()
}
