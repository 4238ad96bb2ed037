//! Placement grid shared by the PDF and image tiling passes.
//!
//! The grid is the set of tile *centres* covering a canvas extended by a
//! margin on every side. Rows start at `-margin` and advance by `y_step`
//! while `y < height + margin`; columns likewise with `x_step`. Coordinates
//! are computed as `-margin + k * step` rather than accumulated, so long
//! rows do not drift.
//!
//! # Example
//!
//! ```ignore
//! use tilemark::watermark::grid::{GridSpec, PlacementGrid};
//!
//! let grid = PlacementGrid::new(612.0, 792.0, GridSpec::new(320.0, 240.0, 36.0))?;
//! for placement in &grid {
//!     println!("{} {}", placement.x, placement.y);
//! }
//! ```

use crate::error::WatermarkError;

/// Step sizes and margin of a placement grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub x_step: f64,
    pub y_step: f64,
    pub margin: f64,
}

impl GridSpec {
    pub fn new(x_step: f64, y_step: f64, margin: f64) -> Self {
        Self {
            x_step,
            y_step,
            margin,
        }
    }

    /// Reject steps that would never terminate and non-finite margins.
    pub fn validate(&self) -> Result<(), WatermarkError> {
        if !(self.x_step.is_finite() && self.x_step > 0.0) {
            return Err(WatermarkError::InvalidLayout(format!(
                "x_step must be a positive number, got {}",
                self.x_step
            )));
        }
        if !(self.y_step.is_finite() && self.y_step > 0.0) {
            return Err(WatermarkError::InvalidLayout(format!(
                "y_step must be a positive number, got {}",
                self.y_step
            )));
        }
        if !self.margin.is_finite() {
            return Err(WatermarkError::InvalidLayout(format!(
                "margin must be finite, got {}",
                self.margin
            )));
        }
        Ok(())
    }
}

/// A single tile centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
}

impl Placement {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Target rectangle of one stamped tile, top-left origin, y downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Region {
    /// Rectangle of `width` x `height` centred on `placement`.
    pub fn centered_on(placement: Placement, width: f64, height: f64) -> Self {
        Self {
            x0: placement.x - width / 2.0,
            y0: placement.y - height / 2.0,
            x1: placement.x + width / 2.0,
            y1: placement.y + height / 2.0,
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

/// Lazy, finite, restartable grid of placements over one canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementGrid {
    width: f64,
    height: f64,
    spec: GridSpec,
}

impl PlacementGrid {
    pub fn new(width: f64, height: f64, spec: GridSpec) -> Result<Self, WatermarkError> {
        spec.validate()?;
        if !(width.is_finite() && height.is_finite()) {
            return Err(WatermarkError::InvalidLayout(format!(
                "canvas size must be finite, got {}x{}",
                width, height
            )));
        }

        Ok(Self {
            width,
            height,
            spec,
        })
    }

    pub fn spec(&self) -> GridSpec {
        self.spec
    }

    /// Column centres: `-margin + k * x_step < width + margin`.
    pub fn columns(&self) -> Axis {
        Axis::new(self.width, self.spec.x_step, self.spec.margin)
    }

    /// Row centres: `-margin + k * y_step < height + margin`.
    pub fn rows(&self) -> Axis {
        Axis::new(self.height, self.spec.y_step, self.spec.margin)
    }

    /// Total number of placements.
    pub fn len(&self) -> usize {
        self.columns().len() * self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate row by row, left to right within a row.
    pub fn iter(&self) -> Placements {
        Placements {
            columns: self.columns(),
            rows: self.rows(),
            row: 0,
            column: 0,
        }
    }
}

impl<'a> IntoIterator for &'a PlacementGrid {
    type Item = Placement;
    type IntoIter = Placements;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Coordinates along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    start: f64,
    step: f64,
    count: usize,
}

impl Axis {
    fn new(extent: f64, step: f64, margin: f64) -> Self {
        let start = -margin;
        let end = extent + margin;

        let mut count = if end > start {
            ((end - start) / step).ceil() as usize
        } else {
            0
        };

        // Guard the loop condition exactly against float rounding of ceil
        while count > 0 && start + (count - 1) as f64 * step >= end {
            count -= 1;
        }
        while start + count as f64 * step < end {
            count += 1;
        }

        Self { start, step, count }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get(&self, k: usize) -> Option<f64> {
        (k < self.count).then(|| self.start + k as f64 * self.step)
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.count).map(move |k| self.start + k as f64 * self.step)
    }
}

/// Iterator over a [`PlacementGrid`].
#[derive(Debug, Clone)]
pub struct Placements {
    columns: Axis,
    rows: Axis,
    row: usize,
    column: usize,
}

impl Iterator for Placements {
    type Item = Placement;

    fn next(&mut self) -> Option<Placement> {
        if self.columns.is_empty() {
            return None;
        }

        let y = self.rows.get(self.row)?;
        let x = self.columns.get(self.column)?;

        self.column += 1;
        if self.column == self.columns.len() {
            self.column = 0;
            self.row += 1;
        }

        Some(Placement::new(x, y))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total = self.columns.len() * self.rows.len();
        let done = self.row * self.columns.len() + self.column;
        let remaining = total.saturating_sub(done);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Placements {}
