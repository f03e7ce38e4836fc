//! Note backup to PDF CLI
//!
//! Unpacks a handwritten-note backup and writes one PDF per note below the
//! destination directory, mirroring the backup's folder structure.

use clap::Parser;
use note_backup_pdf::catalog::Catalog;
use note_backup_pdf::stroke_reader::DecodedPage;
use note_backup_pdf::{convert_archive, NoteDescriptor, NoteError, NoteReport, Progress};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Convert a handwritten-note backup into one PDF per note
#[derive(Parser, Debug)]
#[command(name = "note-backup-pdf")]
#[command(version, about, long_about = None)]
struct Args {
    /// Note backup archive
    source: PathBuf,

    /// Directory to render the notes into
    destination: PathBuf,
}

/// Prints the note tree and per-note progress to the console.
#[derive(Default)]
struct ConsoleProgress {
    pages_total: usize,
}

impl Progress for ConsoleProgress {
    fn catalog_loaded(&mut self, catalog: &Catalog) {
        println!("Found note structure:");
        print!("{}", catalog.tree_summary());
    }

    fn note_started(&mut self, note: &NoteDescriptor) {
        self.pages_total = note.page_ids.len();
        println!("\nRendering note {}", note.title);
    }

    fn page_decoded(&mut self, _note: &NoteDescriptor, page: &DecodedPage, position: usize) {
        print!("\r  page {}/{}", position + 1, self.pages_total);
        let _ = std::io::stdout().flush();

        for skipped in &page.skipped {
            eprintln!(
                "\n  ! skipped stroke {} on page {}: {}",
                skipped.index, skipped.page_id, skipped.error
            );
        }
    }

    fn note_finished(&mut self, id: &str, title: &str, result: &Result<NoteReport, NoteError>) {
        match result {
            Ok(report) => {
                if report.pages > 0 {
                    println!();
                }
                println!(
                    "✓ {} ({} pages, {} segments)",
                    report.output_path.display(),
                    report.pages,
                    report.segments
                );
            }
            Err(e) => eprintln!("\n✗ Skipped note {} ({}): {}", title, id, e),
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();

    let args = Args::parse();

    let mut progress = ConsoleProgress::default();
    let summary = match convert_archive(&args.source, &args.destination, &mut progress) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Summary
    println!();
    println!("{}", "=".repeat(50));
    println!("Conversion Summary:");
    println!("  Written: {}", summary.written.len());
    println!("  Failed: {}", summary.failed.len());
    println!("  Skipped strokes: {}", summary.skipped_strokes);

    if !summary.failed.is_empty() {
        println!("\nFailed notes:");
        for failure in &summary.failed {
            println!("  - {} ({}): {}", failure.title, failure.id, failure.error);
        }
    }

    ExitCode::SUCCESS
}
