//! The conversion run: archive to catalog to one PDF per note.
//!
//! Notes are converted one after the other. A failing note is reported and
//! skipped; only archive and catalog failures abort the run.

use crate::archive::{note_store_path, ArchiveError, ExtractedArchive, CATALOG_FILE_NAME};
use crate::catalog::{Catalog, CatalogError, NoteDescriptor, PageListError, UnreadableNote};
use crate::output::{write_document, OutputError};
use crate::pdf_renderer::{PageLayout, PdfError, PdfRenderer};
use crate::stroke_reader::{DecodedPage, PageStore, SkippedStroke, StoreError};
use std::path::{Path, PathBuf};

/// Errors that abort the whole run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("Catalog integrity error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Errors that skip a single note.
#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("{0}")]
    PageList(#[from] PageListError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Pdf(#[from] PdfError),

    #[error("{0}")]
    Output(#[from] OutputError),
}

/// Outcome of a converted note.
#[derive(Debug)]
pub struct NoteReport {
    pub output_path: PathBuf,
    pub pages: usize,
    pub segments: usize,
    pub skipped_strokes: Vec<SkippedStroke>,
}

/// A note that was not converted.
#[derive(Debug)]
pub struct NoteFailure {
    pub id: String,
    pub title: String,
    pub error: NoteError,
}

/// Totals of a finished run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<NoteFailure>,
    pub skipped_strokes: usize,
}

/// Receives progress events during a run.
///
/// Every method has an empty default; `()` ignores all events.
pub trait Progress {
    fn catalog_loaded(&mut self, _catalog: &Catalog) {}

    fn note_started(&mut self, _note: &NoteDescriptor) {}

    fn page_decoded(&mut self, _note: &NoteDescriptor, _page: &DecodedPage, _position: usize) {}

    fn note_finished(&mut self, _id: &str, _title: &str, _result: &Result<NoteReport, NoteError>) {}
}

impl Progress for () {}

/// Converts notes found in an extracted working directory.
pub struct Converter {
    workdir: PathBuf,
    output_root: PathBuf,
    renderer: PdfRenderer,
}

impl Converter {
    /// Creates a Converter that writes letter-size PDFs below `output_root`.
    pub fn new(workdir: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Converter {
            workdir: workdir.into(),
            output_root: output_root.into(),
            renderer: PdfRenderer::new(),
        }
    }

    /// Reads the catalog of the working directory.
    pub fn read_catalog(&self) -> Result<Catalog, CatalogError> {
        Catalog::open(&self.workdir.join(CATALOG_FILE_NAME))
    }

    /// Decodes, renders and writes one note.
    ///
    /// The note's store is closed when this returns, whatever the outcome.
    pub fn convert_note(
        &self,
        note: &NoteDescriptor,
        progress: &mut dyn Progress,
    ) -> Result<NoteReport, NoteError> {
        let store = PageStore::open(&note_store_path(&self.workdir, &note.id))?;

        let mut pages = Vec::with_capacity(note.page_ids.len());
        for (position, page_id) in note.page_ids.iter().enumerate() {
            let page = store.read_page(page_id)?;
            progress.page_decoded(note, &page, position);
            pages.push(page);
        }
        drop(store);

        let layouts: Vec<PageLayout> = pages
            .iter()
            .map(|page| self.renderer.layout_page(page))
            .collect();
        let pdf = self.renderer.render(note, &layouts)?;
        let output_path = write_document(&self.output_root, note, &pdf)?;

        let segments = layouts.iter().map(PageLayout::segment_count).sum();
        let skipped_strokes = pages.into_iter().flat_map(|page| page.skipped).collect();

        log::info!("wrote {} ({} pages)", output_path.display(), note.page_ids.len());
        Ok(NoteReport {
            output_path,
            pages: note.page_ids.len(),
            segments,
            skipped_strokes,
        })
    }

    /// Converts every note of the catalog in enumeration order.
    pub fn run(&self, progress: &mut dyn Progress) -> Result<RunSummary, RunError> {
        let catalog = self.read_catalog()?;
        progress.catalog_loaded(&catalog);

        let mut summary = RunSummary::default();
        for entry in catalog.notes {
            let (id, title, result) = match entry {
                Ok(note) => {
                    progress.note_started(&note);
                    let result = self.convert_note(&note, progress);
                    (note.id, note.title, result)
                }
                Err(UnreadableNote { id, title, error, .. }) => {
                    (id, title, Err(NoteError::PageList(error)))
                }
            };
            progress.note_finished(&id, &title, &result);

            match result {
                Ok(report) => {
                    summary.skipped_strokes += report.skipped_strokes.len();
                    summary.written.push(report.output_path);
                }
                Err(error) => {
                    log::warn!("note {} ({}) skipped: {}", title, id, error);
                    summary.failed.push(NoteFailure { id, title, error });
                }
            }
        }

        Ok(summary)
    }
}

/// Converts an already extracted backup directory.
pub fn convert_directory(
    workdir: &Path,
    output_root: &Path,
    progress: &mut dyn Progress,
) -> Result<RunSummary, RunError> {
    Converter::new(workdir, output_root).run(progress)
}

/// Unpacks a backup archive and converts all of its notes.
///
/// The extracted working directory is removed before returning.
pub fn convert_archive(
    archive: &Path,
    output_root: &Path,
    progress: &mut dyn Progress,
) -> Result<RunSummary, RunError> {
    let extracted = ExtractedArchive::extract(archive)?;
    convert_directory(extracted.path(), output_root, progress)
}
