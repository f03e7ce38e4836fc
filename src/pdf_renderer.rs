//! PDF rendering of projected strokes.
//!
//! This module lays out decoded pages and draws them as vector lines into a
//! PDF document, one document page per note page.

use crate::catalog::NoteDescriptor;
use crate::projection::{ProjectedStroke, Projector};
use crate::stroke_reader::DecodedPage;
use printpdf::*;
use std::io::BufWriter;

/// US letter width in millimetres.
pub const LETTER_WIDTH_MM: f64 = 215.9;

/// US letter height in millimetres.
pub const LETTER_HEIGHT_MM: f64 = 279.4;

const LAYER_NAME: &str = "Strokes";

/// Errors that can occur during PDF rendering.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("PDF creation error: {0}")]
    PdfCreation(String),
}

/// The strokes of one page, projected and ready to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub strokes: Vec<ProjectedStroke>,
}

impl PageLayout {
    /// Returns the number of line segments on the page.
    pub fn segment_count(&self) -> usize {
        self.strokes.iter().map(|s| s.segments.len()).sum()
    }
}

/// Renders notes into letter-size PDF documents.
#[derive(Default)]
pub struct PdfRenderer {
    projector: Projector,
}

impl PdfRenderer {
    /// Creates a new PdfRenderer with the default scales.
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts millimetres to points (1/72 inch).
    fn mm_to_points(mm: f64) -> f64 {
        mm * 72.0 / 25.4
    }

    /// Projects every stroke of a decoded page, keeping storage order.
    pub fn layout_page(&self, page: &DecodedPage) -> PageLayout {
        PageLayout {
            strokes: page
                .strokes
                .iter()
                .map(|stroke| self.projector.project(stroke))
                .collect(),
        }
    }

    /// Renders a note into PDF bytes, one layout per entry of `note.page_ids`.
    ///
    /// Every page yields a document page, including pages without strokes.
    pub fn render(&self, note: &NoteDescriptor, layouts: &[PageLayout]) -> Result<Vec<u8>, PdfError> {
        debug_assert_eq!(layouts.len(), note.page_ids.len());

        let width = Mm(LETTER_WIDTH_MM as f32);
        let height = Mm(LETTER_HEIGHT_MM as f32);

        // A document always has at least one page; an empty note stays blank.
        let (doc, first_page, first_layer) = PdfDocument::new(note.title.as_str(), width, height, LAYER_NAME);
        let doc = doc.with_document_id(note.id.clone());

        for (i, layout) in layouts.iter().enumerate() {
            let (page_idx, layer_idx) = if i == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(width, height, LAYER_NAME)
            };
            let layer = doc.get_page(page_idx).get_layer(layer_idx);
            Self::draw_page(&layer, layout);
        }

        let mut buf = Vec::new();
        doc.save(&mut BufWriter::new(&mut buf))
            .map_err(|e| PdfError::PdfCreation(e.to_string()))?;

        Ok(buf)
    }

    /// Draws strokes in order, switching line width before each stroke.
    fn draw_page(layer: &PdfLayerReference, layout: &PageLayout) {
        for stroke in &layout.strokes {
            layer.set_outline_thickness(Self::mm_to_points(stroke.line_width) as f32);

            for segment in &stroke.segments {
                let line = Line {
                    points: vec![
                        (Self::to_pdf_point(segment.x_start, segment.y_start), false),
                        (Self::to_pdf_point(segment.x_end, segment.y_end), false),
                    ],
                    is_closed: false,
                };
                layer.add_line(line);
            }
        }
    }

    /// Flips a top-left based coordinate into PDF's bottom-left space.
    fn to_pdf_point(x: f64, y: f64) -> Point {
        Point::new(Mm(x as f32), Mm((LETTER_HEIGHT_MM - y) as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke_reader::{Stroke, Transform, Vertex};
    use printpdf::lopdf::content::Content;
    use printpdf::lopdf::{Document, Object};

    /// Letter height in points.
    const PAGE_HEIGHT_PT: f64 = 792.0;

    fn note(pages: usize) -> NoteDescriptor {
        NoteDescriptor {
            id: "n1".to_string(),
            title: "Meeting".to_string(),
            page_ids: (0..pages).map(|i| format!("p{}", i)).collect(),
            folder_path: vec!["Work".to_string(), "Projects".to_string()],
        }
    }

    fn page(id: &str, strokes: Vec<Stroke>) -> DecodedPage {
        DecodedPage {
            page_id: id.to_string(),
            strokes,
            skipped: Vec::new(),
        }
    }

    fn stroke(points: &[(f32, f32)], thickness: f32) -> Stroke {
        Stroke {
            vertices: points.iter().map(|&(x, y)| Vertex::new(x, y)).collect(),
            transform: Transform::IDENTITY,
            thickness,
        }
    }

    fn render_pages(pages: &[DecodedPage]) -> Vec<u8> {
        let renderer = PdfRenderer::new();
        let layouts: Vec<PageLayout> = pages.iter().map(|p| renderer.layout_page(p)).collect();
        renderer.render(&note(pages.len()), &layouts).unwrap()
    }

    /// Returns the `w`, `m`, `l` and `S` operations of every page, in page order.
    fn drawing_ops(pdf: &[u8]) -> Vec<Vec<(String, Vec<f64>)>> {
        let doc = Document::load_mem(pdf).unwrap();
        doc.get_pages()
            .values()
            .map(|&page_id| {
                let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
                content
                    .operations
                    .into_iter()
                    .filter(|op| matches!(op.operator.as_str(), "w" | "m" | "l" | "S"))
                    .map(|op| {
                        let operands = op
                            .operands
                            .iter()
                            .map(|operand| match operand {
                                Object::Integer(v) => *v as f64,
                                Object::Real(v) => *v as f64,
                                other => panic!("unexpected operand {:?}", other),
                            })
                            .collect();
                        (op.operator, operands)
                    })
                    .collect()
            })
            .collect()
    }

    fn assert_op(op: &(String, Vec<f64>), operator: &str, expected: &[f64]) {
        assert_eq!(op.0, operator);
        assert_eq!(op.1.len(), expected.len(), "{:?}", op);
        for (actual, expected) in op.1.iter().zip(expected) {
            assert!((actual - expected).abs() < 1e-2, "{:?} != {:?}", op, expected);
        }
    }

    #[test]
    fn test_mm_to_points() {
        // 25.4 mm = 1 inch = 72 points
        assert!((PdfRenderer::mm_to_points(25.4) - 72.0).abs() < 1e-9);
    }

    #[test]
    fn test_pdf_point_flips_y() {
        let point = PdfRenderer::to_pdf_point(10.0, 50.0);
        assert_eq!(point, Point::new(Mm(10.0), Mm((LETTER_HEIGHT_MM - 50.0) as f32)));
    }

    #[test]
    fn test_layout_keeps_stroke_order_and_widths() {
        let renderer = PdfRenderer::new();
        let layout = renderer.layout_page(&page(
            "p0",
            vec![
                stroke(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)], 1.0),
                stroke(&[(0.5, 0.5), (0.6, 0.6)], 4.0),
            ],
        ));

        assert_eq!(layout.strokes.len(), 2);
        assert_eq!(layout.segment_count(), 3);
        assert!((layout.strokes[0].line_width - 0.1).abs() < 1e-9);
        assert!((layout.strokes[1].line_width - 0.4).abs() < 1e-9);
        assert_eq!(layout.strokes[0].segments[1].x_end, 279.0);
        assert_eq!(layout.strokes[0].segments[1].y_end, 279.0);
    }

    #[test]
    fn test_render_meeting_page() {
        let pdf_data = render_pages(&[page("p0", vec![stroke(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)], 1.0)])]);
        assert!(pdf_data.starts_with(b"%PDF-"));

        let pages = drawing_ops(&pdf_data);
        assert_eq!(pages.len(), 1);

        // 279 mm = 790.866 pt; 0.1 mm = 0.2835 pt.
        let ops = &pages[0];
        assert_eq!(ops.len(), 7);
        assert_op(&ops[0], "w", &[0.2835]);
        assert_op(&ops[1], "m", &[0.0, PAGE_HEIGHT_PT]);
        assert_op(&ops[2], "l", &[790.866, PAGE_HEIGHT_PT]);
        assert_op(&ops[3], "S", &[]);
        assert_op(&ops[4], "m", &[790.866, PAGE_HEIGHT_PT]);
        assert_op(&ops[5], "l", &[790.866, PAGE_HEIGHT_PT - 790.866]);
        assert_op(&ops[6], "S", &[]);
    }

    #[test]
    fn test_line_width_set_before_each_stroke() {
        let pdf_data = render_pages(&[page(
            "p0",
            vec![
                stroke(&[(0.0, 0.0), (0.5, 0.0)], 1.0),
                stroke(&[(0.0, 0.5), (0.5, 0.5)], 4.0),
            ],
        )]);

        let pages = drawing_ops(&pdf_data);
        let operators: Vec<&str> = pages[0].iter().map(|op| op.0.as_str()).collect();
        assert_eq!(operators, vec!["w", "m", "l", "S", "w", "m", "l", "S"]);
        assert_op(&pages[0][0], "w", &[0.2835]);
        assert_op(&pages[0][4], "w", &[1.1339]);
        assert_op(&pages[0][5], "m", &[0.0, PAGE_HEIGHT_PT - 395.433]);
    }

    #[test]
    fn test_render_keeps_blank_pages() {
        let pdf_data = render_pages(&[
            page("p0", vec![stroke(&[(0.1, 0.1), (0.2, 0.2)], 1.0)]),
            page("p1", vec![]),
            page("p2", vec![stroke(&[(0.3, 0.3), (0.4, 0.4)], 1.0)]),
        ]);

        let pages = drawing_ops(&pdf_data);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].len(), 4);
        assert!(pages[1].is_empty());
        assert_eq!(pages[2].len(), 4);
    }

    #[test]
    fn test_render_note_without_pages() {
        let pdf_data = render_pages(&[]);
        let pages = drawing_ops(&pdf_data);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
    }
}
