//! Whiteboard core: pixel grid, comment thread, gallery history, and the area
//! that ties them together.

pub mod area;
pub mod canvas;
pub mod color;
pub mod comments;
pub mod gallery;
pub mod mirror;
pub mod pixel;

pub use area::{AreaError, MapObject, NewPixelData, WhiteboardArea, WhiteboardAreaModel};
pub use canvas::{Canvas, GRID_COLUMNS, GRID_ROWS, PIXEL_COUNT};
pub use color::PixelColor;
pub use comments::{Comment, CommentThread};
pub use gallery::GalleryCanvas;
pub use mirror::WhiteboardAreaController;
pub use pixel::Pixel;
