//! Client-side reflection of a whiteboard area.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each connected client holds one controller per area it has joined. The
//! server pushes `WhiteboardAreaModel` values; the controller keeps the last
//! one and exposes two independent watch streams so the canvas view and the
//! comment panel re-render only when their own slice changes.

use tokio::sync::watch;

use super::area::WhiteboardAreaModel;
use super::canvas::Canvas;
use super::comments::Comment;
use super::gallery::GalleryCanvas;

#[derive(Debug)]
pub struct WhiteboardAreaController {
    id: String,
    canvas: watch::Sender<Option<Canvas>>,
    comments: watch::Sender<Vec<Comment>>,
    gallery: Vec<GalleryCanvas>,
}

impl WhiteboardAreaController {
    pub fn new(model: WhiteboardAreaModel) -> Self {
        Self {
            id: model.id,
            canvas: watch::channel(model.canvas).0,
            comments: watch::channel(model.comments).0,
            gallery: model.gallery,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn canvas(&self) -> Option<Canvas> {
        self.canvas.borrow().clone()
    }

    #[must_use]
    pub fn comments(&self) -> Vec<Comment> {
        self.comments.borrow().clone()
    }

    #[must_use]
    pub fn gallery(&self) -> &[GalleryCanvas] {
        &self.gallery
    }

    pub fn subscribe_canvas(&self) -> watch::Receiver<Option<Canvas>> {
        self.canvas.subscribe()
    }

    pub fn subscribe_comments(&self) -> watch::Receiver<Vec<Comment>> {
        self.comments.subscribe()
    }

    /// Store a canvas. `Some` notifies only when it differs from the held
    /// value; `None` always notifies. Returns whether watchers were notified.
    pub fn set_canvas(&self, canvas: Option<Canvas>) -> bool {
        let Some(canvas) = canvas else {
            self.canvas.send_replace(None);
            return true;
        };
        self.canvas.send_if_modified(|current| {
            if current.as_ref() == Some(&canvas) {
                return false;
            }
            *current = Some(canvas);
            true
        })
    }

    /// Store the comment list, notifying only when it changed.
    pub fn set_comments(&self, comments: Vec<Comment>) -> bool {
        self.comments.send_if_modified(|current| {
            if *current == comments {
                return false;
            }
            *current = comments;
            true
        })
    }

    pub fn set_gallery(&mut self, gallery: Vec<GalleryCanvas>) {
        self.gallery = gallery;
    }

    /// Apply a model pushed by the server. A model without a canvas only
    /// notifies canvas watchers when a canvas was live here.
    pub fn update_from(&mut self, model: WhiteboardAreaModel) {
        let live = self.canvas.borrow().is_some();
        match model.canvas {
            Some(canvas) => {
                self.set_canvas(Some(canvas));
            }
            None if live => {
                self.set_canvas(None);
            }
            None => {}
        }
        self.set_comments(model.comments);
        self.set_gallery(model.gallery);
    }

    /// Local destroy: drop the canvas and its comments.
    pub fn destroy_canvas(&self) {
        self.set_canvas(None);
        self.set_comments(Vec::new());
    }

    #[must_use]
    pub fn to_model(&self) -> WhiteboardAreaModel {
        WhiteboardAreaModel {
            id: self.id.clone(),
            canvas: self.canvas(),
            comments: self.comments(),
            gallery: self.gallery.clone(),
        }
    }
}

#[cfg(test)]
#[path = "mirror_test.rs"]
mod tests;
