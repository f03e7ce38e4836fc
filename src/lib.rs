//! Handwritten note backup to PDF converter.
//!
//! This library unpacks a note backup archive, reads its note catalog,
//! decodes the pen strokes of every page and redraws them as vector lines,
//! writing one PDF per note into a folder tree that mirrors the catalog.

pub mod archive;
pub mod catalog;
pub mod output;
pub mod pdf_renderer;
pub mod pipeline;
pub mod projection;
pub mod stroke_reader;

pub use archive::{ArchiveError, ExtractedArchive};
pub use catalog::{Catalog, CatalogError, FolderForest, FolderNode, NoteDescriptor};
pub use pdf_renderer::{PageLayout, PdfError, PdfRenderer};
pub use pipeline::{
    convert_archive, convert_directory, Converter, NoteError, NoteReport, Progress, RunError,
    RunSummary,
};
pub use projection::{ProjectedSegment, ProjectedStroke, Projector};
pub use stroke_reader::{PageStore, Stroke, StrokeError, Transform, Vertex};

