//! One addressable grid cell.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::color::PixelColor;

/// A grid cell with stable identity. Only `color` changes after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pixel {
    pub id: String,
    pub x: u32,
    pub y: u32,
    pub color: PixelColor,
}

impl Pixel {
    /// Create a pixel at `(x, y)` with a freshly generated id.
    #[must_use]
    pub fn new(x: u32, y: u32, color: PixelColor) -> Self {
        Self { id: Uuid::new_v4().to_string(), x, y, color }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_assigns_unique_ids() {
        let a = Pixel::new(0, 0, PixelColor::WHITE);
        let b = Pixel::new(0, 0, PixelColor::WHITE);
        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn new_keeps_coordinates_and_color() {
        let color = PixelColor::new(10, 20, 30, 1.0);
        let pixel = Pixel::new(52, 29, color);
        assert_eq!(pixel.x, 52);
        assert_eq!(pixel.y, 29);
        assert_eq!(pixel.color, color);
    }
}
