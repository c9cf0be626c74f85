//! Screenshot markup: element outlines and crops

use std::path::Path;

use image::{GenericImageView, Rgba};

use crate::error::Result;
use crate::session::ElementRect;

/// Outline colour for the element under operation (`#8B0000`)
pub const OUTLINE_COLOR: Rgba<u8> = Rgba([0x8B, 0x00, 0x00, 0xFF]);

/// `(x0, y0, x1, y1)` with `x1 = x + width` and `y1 = y + height`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl BoundingBox {
    pub fn from_rect(rect: &ElementRect) -> Self {
        let x0 = rect.x.round() as i64;
        let y0 = rect.y.round() as i64;
        Self {
            x0,
            y0,
            x1: x0 + rect.width.round() as i64,
            y1: y0 + rect.height.round() as i64,
        }
    }

    /// Intersection with a `width` x `height` image, `None` when nothing is left
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<BoundingBox> {
        let (w, h) = (i64::from(width), i64::from(height));
        let clamped = BoundingBox {
            x0: self.x0.clamp(0, w),
            y0: self.y0.clamp(0, h),
            x1: self.x1.clamp(0, w),
            y1: self.y1.clamp(0, h),
        };
        (clamped.x0 < clamped.x1 && clamped.y0 < clamped.y1).then_some(clamped)
    }
}

/// Draw a one-pixel outline around `bbox` and overwrite the image at `path`.
///
/// Boxes partly outside the image are clamped; boxes entirely outside leave
/// the image unchanged.
pub fn draw_outline(path: &Path, bbox: BoundingBox) -> Result<()> {
    let mut img = image::open(path)?.to_rgba8();
    let (width, height) = img.dimensions();

    if let Some(b) = bbox.clamp_to(width, height) {
        let (x0, y0) = (b.x0 as u32, b.y0 as u32);
        let x1 = (b.x1 as u32).min(width - 1);
        let y1 = (b.y1 as u32).min(height - 1);

        for x in x0..=x1 {
            img.put_pixel(x, y0, OUTLINE_COLOR);
            img.put_pixel(x, y1, OUTLINE_COLOR);
        }
        for y in y0..=y1 {
            img.put_pixel(x0, y, OUTLINE_COLOR);
            img.put_pixel(x1, y, OUTLINE_COLOR);
        }
    }

    img.save(path)?;
    Ok(())
}

/// Save the `bbox` region of the image at `source` to `target`.
///
/// Returns `false` without writing when the box lies outside the image.
pub fn crop_to(source: &Path, bbox: BoundingBox, target: &Path) -> Result<bool> {
    let img = image::open(source)?;
    let (width, height) = img.dimensions();

    let Some(b) = bbox.clamp_to(width, height) else {
        return Ok(false);
    };
    let region = img.crop_imm(
        b.x0 as u32,
        b.y0 as u32,
        (b.x1 - b.x0) as u32,
        (b.y1 - b.y0) as u32,
    );
    region.save(target)?;
    Ok(true)
}
