//! The live, editable pixel grid.
//!
//! DESIGN
//! ======
//! Pixels are stored as one flat row-major sequence: the outer loop runs over
//! columns and the inner over rows, so the cell at `(x, y)` lives at index
//! `x * GRID_ROWS + y`. Snapshots are plain clones of that sequence.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::color::PixelColor;
use super::pixel::Pixel;

/// Number of columns on every canvas.
pub const GRID_COLUMNS: u32 = 53;

/// Number of rows on every canvas.
pub const GRID_ROWS: u32 = 30;

/// Total cells on every canvas.
pub const PIXEL_COUNT: usize = (GRID_COLUMNS * GRID_ROWS) as usize;

/// A named grid of `PIXEL_COUNT` pixels plus its creation time (epoch millis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Canvas {
    pub name: String,
    pub pixels: Vec<Pixel>,
    pub time_created: i64,
}

/// Allocate a full white grid with fresh pixel ids.
#[must_use]
pub fn blank_grid() -> Vec<Pixel> {
    let mut pixels = Vec::with_capacity(PIXEL_COUNT);
    for x in 0..GRID_COLUMNS {
        for y in 0..GRID_ROWS {
            pixels.push(Pixel::new(x, y, PixelColor::WHITE));
        }
    }
    pixels
}

fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

impl Canvas {
    /// Create an all-white canvas stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), pixels: blank_grid(), time_created: now_ms() }
    }

    /// Recolour the pixel at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= PIXEL_COUNT`. Callers validate indices against the
    /// fixed grid size before reaching the canvas.
    pub fn paint(&mut self, index: usize, color: PixelColor) {
        assert!(index < self.pixels.len(), "pixel index {index} out of range (grid has {} cells)", self.pixels.len());
        self.pixels[index].color = color;
    }

    /// Full copy of the current grid.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Pixel> {
        self.pixels.clone()
    }
}

#[cfg(test)]
#[path = "canvas_test.rs"]
mod tests;
