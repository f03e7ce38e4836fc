//! Projection of decoded strokes into page space.
//!
//! Output units are millimetres with the origin at the top-left corner of the
//! page and y growing downwards.

use crate::stroke_reader::{Stroke, Transform, Vertex};

/// Source units to millimetres. Maps the unit page onto a letter sheet's height.
pub const DEFAULT_SCALE: f64 = 279.0;

/// Pen thickness to millimetres. Independent of [`DEFAULT_SCALE`].
pub const DEFAULT_WIDTH_SCALE: f64 = 0.1;

/// A straight piece of a stroke between two consecutive vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedSegment {
    pub x_start: f64,
    pub y_start: f64,
    pub x_end: f64,
    pub y_end: f64,
}

/// A stroke ready to draw: one line width and its segments in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedStroke {
    pub line_width: f64,
    pub segments: Vec<ProjectedSegment>,
}

/// Applies stroke transforms and the output scales.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    scale: f64,
    width_scale: f64,
}

impl Default for Projector {
    fn default() -> Self {
        Projector {
            scale: DEFAULT_SCALE,
            width_scale: DEFAULT_WIDTH_SCALE,
        }
    }
}

impl Projector {
    /// Creates a Projector with the default scales.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a Projector with custom coordinate and width scales.
    pub fn with_scales(scale: f64, width_scale: f64) -> Self {
        Projector { scale, width_scale }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn width_scale(&self) -> f64 {
        self.width_scale
    }

    /// Maps `(x, y, 1)` through the transform and the coordinate scale.
    ///
    /// The row vector is right-multiplied by the transposed matrix, which is
    /// the matrix applied to the column vector.
    pub fn project_point(&self, transform: &Transform, vertex: &Vertex) -> (f64, f64) {
        let (x, y) = (vertex.x as f64, vertex.y as f64);
        let m = |row, col| transform.at(row, col) as f64;

        let px = m(0, 0) * x + m(0, 1) * y + m(0, 2);
        let py = m(1, 0) * x + m(1, 1) * y + m(1, 2);
        (px * self.scale, py * self.scale)
    }

    /// Projects a stroke into `vertices - 1` segments (none for fewer than two vertices).
    pub fn project(&self, stroke: &Stroke) -> ProjectedStroke {
        let points: Vec<(f64, f64)> = stroke
            .vertices
            .iter()
            .map(|vertex| self.project_point(&stroke.transform, vertex))
            .collect();

        let segments = points
            .windows(2)
            .map(|pair| ProjectedSegment {
                x_start: pair[0].0,
                y_start: pair[0].1,
                x_end: pair[1].0,
                y_end: pair[1].1,
            })
            .collect();

        ProjectedStroke {
            line_width: stroke.thickness as f64 * self.width_scale,
            segments,
        }
    }
}
