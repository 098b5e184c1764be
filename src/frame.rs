// SPDX-License-Identifier: GPL-3.0-only

//! Display frame type and the pixel operations the state machine needs
//!
//! Wraps an RGB image and provides mirroring, aspect-fit scaling, the
//! capture flash crossfade and a small block font for on-frame prompts.

use image::{Rgb, RgbImage, imageops};
use std::path::Path;

/// One camera or screen frame
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Solid-color frame of the given size
    pub fn solid(width: u32, height: u32, color: Rgb<u8>) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, color),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Horizontal mirror, so guests see themselves as in a mirror
    pub fn mirrored(&self) -> Frame {
        Frame::new(imageops::flip_horizontal(&self.image))
    }

    /// All-white frame with this frame's dimensions
    pub fn white_like(&self) -> Frame {
        Frame::solid(self.width(), self.height(), Rgb([255, 255, 255]))
    }

    /// Scale down/up preserving aspect ratio so the frame fits inside
    /// `max_width` x `max_height`
    pub fn fit_to(&self, max_width: u32, max_height: u32) -> Frame {
        let scale_x = max_width as f64 / self.width() as f64;
        let scale_y = max_height as f64 / self.height() as f64;
        let scale = scale_x.min(scale_y);
        let width = (scale * self.width() as f64).ceil() as u32;
        let height = (scale * self.height() as f64).ceil() as u32;
        Frame::new(imageops::resize(
            &self.image,
            width.max(1),
            height.max(1),
            imageops::FilterType::Triangle,
        ))
    }

    /// Capture flash blend: `frame*1.0 + white*(1-t)` saturating per channel,
    /// with `t` clamped to [0, 1]. The additive weighting over-brightens
    /// mid-transition; that is the intended flash look, not a lerp.
    pub fn flash_blend(&self, white: &Frame, t: f64) -> Frame {
        const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
        let weight = (1.0 - t).clamp(0.0, 1.0);
        let mut out = self.image.clone();
        for (x, y, pixel) in out.enumerate_pixels_mut() {
            let white_px = if x < white.width() && y < white.height() {
                white.image.get_pixel(x, y)
            } else {
                &WHITE
            };
            for c in 0..3 {
                let added = pixel[c] as f64 + white_px[c] as f64 * weight;
                pixel[c] = added.min(255.0) as u8;
            }
        }
        Frame::new(out)
    }

    /// Paste another frame on top of this one at (x, y); off-canvas parts
    /// are clipped
    pub fn overlay(&mut self, top: &Frame, x: i64, y: i64) {
        imageops::overlay(&mut self.image, &top.image, x, y);
    }

    /// Stamp text using the built-in 5x7 block font. Characters without a
    /// glyph advance the cursor without drawing.
    pub fn stamp_text(&mut self, text: &str, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
        let scale = scale.max(1);
        let mut cursor_x = x;
        for ch in text.chars() {
            if let Some(rows) = glyph(ch.to_ascii_uppercase()) {
                for (row, bits) in rows.iter().enumerate() {
                    for col in 0..GLYPH_WIDTH {
                        if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                            self.fill_block(
                                cursor_x + col as u32 * scale,
                                y + row as u32 * scale,
                                scale,
                                color,
                            );
                        }
                    }
                }
            }
            cursor_x += (GLYPH_WIDTH as u32 + 1) * scale;
        }
    }

    /// Stamp text twice with a 1-block offset, dark pass under a light pass,
    /// so prompts stay readable on any live feed
    pub fn stamp_text_shadowed(&mut self, text: &str, x: u32, y: u32, scale: u32) {
        self.stamp_text(text, x, y, scale, Rgb([0, 0, 0]));
        self.stamp_text(text, x + scale, y + scale, scale, Rgb([255, 255, 255]));
    }

    fn fill_block(&mut self, x: u32, y: u32, size: u32, color: Rgb<u8>) {
        for dy in 0..size {
            for dx in 0..size {
                let px = x + dx;
                let py = y + dy;
                if px < self.width() && py < self.height() {
                    self.image.put_pixel(px, py, color);
                }
            }
        }
    }

    /// Persist the frame as an image file; format follows the extension
    pub fn save(&self, path: &Path) -> Result<(), image::ImageError> {
        self.image.save(path)
    }
}

const GLYPH_WIDTH: usize = 5;

/// 5x7 glyph bitmaps, one byte per row, low 5 bits used, MSB-left
fn glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        '?' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
        '=' => [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '\'' => [0x04, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
        _ => return None,
    };
    Some(rows)
}
