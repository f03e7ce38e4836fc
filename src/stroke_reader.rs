//! Stroke decoding from per-note stores.
//!
//! Every note has its own SQLite store with one `NewShapeModel` row per
//! stroke:
//! - `points`: vertex buffer, big-endian `f32` values, 6 per vertex
//!   (x, y and four opaque channels)
//! - `matrixValues`: JSON object with the 3x3 row-major transform under `values`
//! - `thickness`: pen thickness in source units
//!
//! A malformed row only loses that stroke; the page keeps going.

use byteorder::{BigEndian, ByteOrder};
use rusqlite::{Connection, OpenFlags, Row};
use serde::Deserialize;
use std::path::Path;

/// Byte order of the vertex buffer, fixed by the backup format.
pub type VertexByteOrder = BigEndian;

/// Scalars stored per vertex.
pub const VERTEX_COMPONENTS: usize = 6;

/// Bytes stored per vertex.
pub const VERTEX_SIZE: usize = VERTEX_COMPONENTS * std::mem::size_of::<f32>();

const SELECT_STROKES: &str =
    "SELECT points, matrixValues, thickness FROM NewShapeModel WHERE pageUniqueId = ?1";

/// One decoded vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    /// Opaque per-vertex data carried by the format but not used for drawing.
    pub channels: [f32; 4],
}

impl Vertex {
    /// Creates a vertex with zeroed extra channels.
    pub fn new(x: f32, y: f32) -> Self {
        Vertex {
            x,
            y,
            channels: [0.0; 4],
        }
    }
}

/// A 3x3 affine transform in row-major order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform(pub [f32; 9]);

impl Transform {
    pub const IDENTITY: Transform = Transform([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

    /// Returns the element at `row`, `col`.
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.0[row * 3 + col]
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

/// One continuous pen motion on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub vertices: Vec<Vertex>,
    pub transform: Transform,
    pub thickness: f32,
}

/// Reasons a single stroke row cannot be decoded.
#[derive(Debug, thiserror::Error)]
pub enum StrokeError {
    #[error("Invalid vertex buffer: {len} bytes is not a positive multiple of {}", VERTEX_SIZE)]
    InvalidVertexBuffer { len: usize },

    #[error("Missing vertex buffer")]
    MissingVertexBuffer,

    #[error("Missing transform matrix")]
    MissingTransform,

    #[error("Malformed transform matrix: {0}")]
    MalformedTransform(#[from] serde_json::Error),

    #[error("Transform matrix has {0} values, expected 9")]
    TransformShape(usize),

    #[error("Missing thickness")]
    MissingThickness,

    #[error("Unreadable column: {0}")]
    Column(#[from] rusqlite::Error),
}

/// Errors that stop reading a note's store altogether.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Note store not found: {0}")]
    NotFound(String),

    #[error("Note store error: {0}")]
    Db(#[from] rusqlite::Error),
}

/// A stroke that was left out of its page.
#[derive(Debug)]
pub struct SkippedStroke {
    pub page_id: String,
    /// Position of the row among the page's stroke rows.
    pub index: usize,
    pub error: StrokeError,
}

/// The strokes of one page, in storage order.
#[derive(Debug, Default)]
pub struct DecodedPage {
    pub page_id: String,
    pub strokes: Vec<Stroke>,
    pub skipped: Vec<SkippedStroke>,
}

/// Reinterprets a big-endian vertex buffer as host-order vertices.
pub fn decode_vertices(bytes: &[u8]) -> Result<Vec<Vertex>, StrokeError> {
    if bytes.is_empty() || bytes.len() % VERTEX_SIZE != 0 {
        return Err(StrokeError::InvalidVertexBuffer { len: bytes.len() });
    }

    let mut scalars = vec![0f32; bytes.len() / std::mem::size_of::<f32>()];
    VertexByteOrder::read_f32_into(bytes, &mut scalars);

    Ok(scalars
        .chunks_exact(VERTEX_COMPONENTS)
        .map(|v| Vertex {
            x: v[0],
            y: v[1],
            channels: [v[2], v[3], v[4], v[5]],
        })
        .collect())
}

#[derive(Deserialize)]
struct MatrixValues {
    values: Vec<f32>,
}

/// Parses the `matrixValues` JSON into a transform.
pub fn decode_transform(raw: &str) -> Result<Transform, StrokeError> {
    let matrix: MatrixValues = serde_json::from_str(raw)?;
    let values: [f32; 9] = matrix
        .values
        .as_slice()
        .try_into()
        .map_err(|_| StrokeError::TransformShape(matrix.values.len()))?;
    Ok(Transform(values))
}

fn decode_row(row: &Row<'_>) -> Result<Stroke, StrokeError> {
    let points: Option<Vec<u8>> = row.get(0)?;
    let matrix: Option<String> = row.get(1)?;
    let thickness: Option<f64> = row.get(2)?;

    let vertices = decode_vertices(&points.ok_or(StrokeError::MissingVertexBuffer)?)?;
    let transform = decode_transform(&matrix.ok_or(StrokeError::MissingTransform)?)?;
    let thickness = thickness.ok_or(StrokeError::MissingThickness)? as f32;

    Ok(Stroke {
        vertices,
        transform,
        thickness,
    })
}

/// Read-only handle on one note's stroke store.
pub struct PageStore {
    conn: Connection,
}

impl PageStore {
    /// Opens the store at `path` read-only.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.is_file() {
            return Err(StoreError::NotFound(path.display().to_string()));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(PageStore { conn })
    }

    /// Wraps an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        PageStore { conn }
    }

    /// Decodes the strokes of `page_id`. A page without rows is empty, not an error.
    pub fn read_page(&self, page_id: &str) -> Result<DecodedPage, StoreError> {
        let mut stmt = self.conn.prepare_cached(SELECT_STROKES)?;
        let mut rows = stmt.query([page_id])?;
        let mut page = DecodedPage {
            page_id: page_id.to_string(),
            ..Default::default()
        };

        let mut index = 0;
        while let Some(row) = rows.next()? {
            match decode_row(row) {
                Ok(stroke) => page.strokes.push(stroke),
                Err(error) => {
                    log::warn!("skipping stroke {} on page {}: {}", index, page_id, error);
                    page.skipped.push(SkippedStroke {
                        page_id: page_id.to_string(),
                        index,
                        error,
                    });
                }
            }
            index += 1;
        }

        log::debug!(
            "page {}: {} strokes decoded, {} skipped",
            page_id,
            page.strokes.len(),
            page.skipped.len()
        );
        Ok(page)
    }
}
