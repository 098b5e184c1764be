// SPDX-License-Identifier: GPL-3.0-only

//! Print layout compositor
//!
//! Joins the four session photos onto a 4x6" portrait canvas: a column of
//! four slots on the left, mirrored on the right so the strip can be cut
//! in half, with an optional decorative mask on top.

use crate::errors::CompositeError;
use image::{RgbaImage, imageops};
use std::path::{Path, PathBuf};

/// Print canvas size in pixels (1200x1800 = 4x6" at 300 dpi)
pub const CANVAS_SIZE: (u32, u32) = (1200, 1800);

/// Visible slot size for each photo
const SLOT_SIZE: (u32, u32) = (540, 375);

/// Margin between the canvas edge and the outermost slots
const OUTER_MARGIN: u32 = 29;

/// Vertical gap between slots
const INNER_GAP: u32 = 15;

/// Extra pixels on each fill-resize so photos bleed past their slot
const FILL_BLEED: u32 = 5;

/// Slot origins for the left column and its mirrored right column
fn slot_positions() -> [((i64, i64), (i64, i64)); 4] {
    let right_x = (CANVAS_SIZE.0 - SLOT_SIZE.0 - OUTER_MARGIN) as i64;
    let mut positions = [((0, 0), (0, 0)); 4];
    for (row, slot) in positions.iter_mut().enumerate() {
        let y = (OUTER_MARGIN + (SLOT_SIZE.1 + INNER_GAP) * row as u32) as i64;
        *slot = ((OUTER_MARGIN as i64, y), (right_x, y));
    }
    positions
}

/// Join the four captured photos into one print-ready composite.
/// Deterministic for identical inputs.
pub fn join_photos(photos: &[PathBuf], mask: Option<&Path>) -> Result<RgbaImage, CompositeError> {
    if photos.len() != 4 {
        return Err(CompositeError::WrongPhotoCount(photos.len()));
    }

    let mut canvas = RgbaImage::new(CANVAS_SIZE.0, CANVAS_SIZE.1);

    for (photo_path, (left, right)) in photos.iter().zip(slot_positions()) {
        let photo = image::open(photo_path)
            .map_err(|e| CompositeError::Photo(format!("{}: {}", photo_path.display(), e)))?
            .to_rgba8();
        let photo = resize_to_fill(&photo);

        // Center the overhang so the slot shows the middle of the photo
        let overhang_x = (photo.width() - SLOT_SIZE.0) as i64;
        let overhang_y = (photo.height() - SLOT_SIZE.1) as i64;
        for (slot_x, slot_y) in [left, right] {
            imageops::overlay(
                &mut canvas,
                &photo,
                slot_x - overhang_x / 2,
                slot_y - overhang_y / 2,
            );
        }
    }

    if let Some(mask_path) = mask {
        let mask_image = image::open(mask_path)
            .map_err(|e| CompositeError::Mask(format!("{}: {}", mask_path.display(), e)))?
            .to_rgba8();
        imageops::overlay(&mut canvas, &mask_image, 0, 0);
    }

    Ok(canvas)
}

/// Scale up/down so the photo covers the slot plus bleed on both axes
fn resize_to_fill(photo: &RgbaImage) -> RgbaImage {
    let scale_x = (SLOT_SIZE.0 + FILL_BLEED) as f64 / photo.width() as f64;
    let scale_y = (SLOT_SIZE.1 + FILL_BLEED) as f64 / photo.height() as f64;
    let scale = scale_x.max(scale_y);
    imageops::resize(
        photo,
        (scale * photo.width() as f64).ceil() as u32,
        (scale * photo.height() as f64).ceil() as u32,
        imageops::FilterType::Triangle,
    )
}
