//! RGBA colour value carried by every pixel.

use serde::{Deserialize, Serialize};

/// Immutable RGBA value. Channels `r`, `g`, `b` are 0-255; `a` is opacity in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl PixelColor {
    /// Opaque white, the colour of every cell on a fresh canvas.
    pub const WHITE: Self = Self::new(255, 255, 255, 1.0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for PixelColor {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_all_channels() {
        let color = PixelColor::new(237, 23, 23, 0.5);
        assert_eq!(color.r, 237);
        assert_eq!(color.g, 23);
        assert_eq!(color.b, 23);
        assert!((color.a - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(PixelColor::new(1, 2, 3, 1.0), PixelColor::new(1, 2, 3, 1.0));
        assert_ne!(PixelColor::new(1, 2, 3, 1.0), PixelColor::new(1, 2, 3, 0.9));
    }

    #[test]
    fn default_is_opaque_white() {
        assert_eq!(PixelColor::default(), PixelColor::new(255, 255, 255, 1.0));
    }

    #[test]
    fn serializes_as_flat_channels() {
        let json = serde_json::to_value(PixelColor::new(0, 128, 255, 1.0)).unwrap();
        assert_eq!(json, serde_json::json!({"r": 0, "g": 128, "b": 255, "a": 1.0}));
    }
}
