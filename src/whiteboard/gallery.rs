//! Append-only snapshot log for one canvas.
//!
//! DESIGN
//! ======
//! History entry 0 is the blank grid. Every later entry is the grid as it
//! stood *before* an edit was applied, so the live canvas is always one edit
//! ahead of the newest recorded snapshot. Snapshots are immutable once
//! recorded and shared behind `Arc` so wire models can be produced without
//! copying every grid.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::canvas::blank_grid;
use super::pixel::Pixel;

/// One full-grid snapshot.
pub type Snapshot = Arc<Vec<Pixel>>;

/// Named history of a canvas, used for timelapse playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryCanvas {
    pub name: String,
    pub history: Vec<Snapshot>,
}

impl GalleryCanvas {
    /// Start a history seeded with one all-white snapshot.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), history: vec![Arc::new(blank_grid())] }
    }

    /// Append a snapshot to the end of the history.
    pub fn record(&mut self, snapshot: Vec<Pixel>) {
        self.history.push(Arc::new(snapshot));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
