//! Sub-region export: rasterize a rectangle of the board for minting.
//!
//! Each cell becomes an `cell_px` square of solid color. Cells that are
//! unpainted, off the board, or carry a color token that does not parse come
//! out as background. Uploading the PNG and metadata is the host's job.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use serde::Serialize;

use crate::consts::BOARD_SIZE;
use crate::grid::{BoardCoordinate, CellColor, GridStore};
use crate::input::SelectionRect;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("empty export region {width}x{height}")]
    EmptyRegion { width: i32, height: i32 },
    #[error("export image too large: {width}x{height} cells at {cell_px}px")]
    TooLarge { width: i32, height: i32, cell_px: u32 },
    #[error("png encode failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("metadata encode failed: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Render `rect` of `grid` at `cell_px` output pixels per cell.
///
/// # Errors
///
/// Returns [`ExportError::EmptyRegion`] for a rectangle with no area and
/// [`ExportError::TooLarge`] when either side exceeds the board or the
/// output size overflows `u32`.
pub fn rasterize(grid: &GridStore, rect: SelectionRect, cell_px: u32) -> Result<RgbaImage, ExportError> {
    let (Ok(w), Ok(h)) = (u32::try_from(rect.width), u32::try_from(rect.height)) else {
        return Err(ExportError::EmptyRegion { width: rect.width, height: rect.height });
    };
    if w == 0 || h == 0 || cell_px == 0 {
        return Err(ExportError::EmptyRegion { width: rect.width, height: rect.height });
    }
    let too_large = || ExportError::TooLarge { width: rect.width, height: rect.height, cell_px };
    if rect.width > BOARD_SIZE || rect.height > BOARD_SIZE {
        return Err(too_large());
    }
    let out_w = w.checked_mul(cell_px).ok_or_else(too_large)?;
    let out_h = h.checked_mul(cell_px).ok_or_else(too_large)?;

    let background = rgba_or_background(&CellColor::background());
    let mut img = RgbaImage::from_pixel(out_w, out_h, background);
    for cy in 0..h {
        for cx in 0..w {
            let color = cell_color(grid, rect, cx, cy).map_or(background, rgba_or_background);
            if color == background {
                continue;
            }
            for py in cy * cell_px..(cy + 1) * cell_px {
                for px in cx * cell_px..(cx + 1) * cell_px {
                    img.put_pixel(px, py, color);
                }
            }
        }
    }
    Ok(img)
}

fn cell_color(grid: &GridStore, rect: SelectionRect, cx: u32, cy: u32) -> Option<&CellColor> {
    let x = rect.x.checked_add(i32::try_from(cx).unwrap_or(i32::MAX))?;
    let y = rect.y.checked_add(i32::try_from(cy).unwrap_or(i32::MAX))?;
    let coord = BoardCoordinate::new(x, y)?;
    grid.get(coord)
}

fn rgba_or_background(color: &CellColor) -> Rgba<u8> {
    Rgba(color.to_rgba().unwrap_or([0x11, 0x11, 0x11, 0xff]))
}

/// Encode an image as PNG bytes.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the encoder fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    let dyn_img = DynamicImage::ImageRgba8(image.clone());
    dyn_img.write_to(&mut Cursor::new(&mut buffer), ImageOutputFormat::Png)?;
    Ok(buffer)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataAttribute {
    pub trait_type: String,
    pub value: serde_json::Value,
}

/// Token metadata document for an exported region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
    pub attributes: Vec<MetadataAttribute>,
}

impl ExportMetadata {
    /// Metadata for `rect` once its image is reachable at `image_uri`.
    #[must_use]
    pub fn for_region(
        name: impl Into<String>,
        description: impl Into<String>,
        image_uri: impl Into<String>,
        rect: SelectionRect,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            image: image_uri.into(),
            attributes: vec![
                MetadataAttribute { trait_type: "Width".into(), value: rect.width.into() },
                MetadataAttribute { trait_type: "Height".into(), value: rect.height.into() },
            ],
        }
    }

    /// # Errors
    ///
    /// Returns [`ExportError::Metadata`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
