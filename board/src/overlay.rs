//! Reference overlay: a small image laid over the board as a painting guide.
//!
//! Uploaded images are shrunk to `OVERLAY_SIZE_CELLS` square so each image
//! pixel lines up with one board cell. The overlay never touches the grid; it
//! is drawn translucently and can be dragged around.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

use crate::consts::{OVERLAY_DEFAULT_OPACITY, OVERLAY_DEFAULT_ORIGIN, OVERLAY_SIZE_CELLS};
use crate::viewport::{Point, ScreenRect, Viewport};

/// A reference image positioned in board space.
#[derive(Debug, Clone)]
pub struct ReferenceOverlay {
    image: RgbaImage,
    origin: Point,
    opacity: f32,
}

impl ReferenceOverlay {
    /// Shrink `source` to the overlay size and place it at the default origin.
    #[must_use]
    pub fn from_image(source: &DynamicImage) -> Self {
        let image = imageops::resize(&source.to_rgba8(), OVERLAY_SIZE_CELLS, OVERLAY_SIZE_CELLS, FilterType::Triangle);
        Self {
            image,
            origin: Point::new(OVERLAY_DEFAULT_ORIGIN, OVERLAY_DEFAULT_ORIGIN),
            opacity: OVERLAY_DEFAULT_OPACITY,
        }
    }

    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Board position of the top-left corner, in (fractional) cells.
    #[must_use]
    pub fn origin(&self) -> Point {
        self.origin
    }

    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_nan() { OVERLAY_DEFAULT_OPACITY } else { opacity.clamp(0.0, 1.0) };
    }

    /// Whether a world point lies on the overlay.
    #[must_use]
    pub fn contains(&self, world: Point) -> bool {
        let size = f64::from(OVERLAY_SIZE_CELLS);
        world.x >= self.origin.x
            && world.x < self.origin.x + size
            && world.y >= self.origin.y
            && world.y < self.origin.y + size
    }

    /// Shift the overlay by a delta in cells. The overlay may hang off the board.
    pub fn move_by(&mut self, delta: Point) {
        self.origin = Point::new(self.origin.x + delta.x, self.origin.y + delta.y);
    }

    /// Where to draw the overlay on screen.
    #[must_use]
    pub fn screen_rect(&self, viewport: &Viewport) -> ScreenRect {
        let top_left = viewport.to_screen(self.origin);
        let side = f64::from(OVERLAY_SIZE_CELLS) * viewport.scale();
        ScreenRect { x: top_left.x, y: top_left.y, width: side, height: side }
    }
}
