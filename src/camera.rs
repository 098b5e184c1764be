// SPDX-License-Identifier: GPL-3.0-only

//! V4L frame source
//!
//! Opens a capture device, negotiates an RGB or YUYV format, and decodes
//! raw buffers into [`Frame`]s. The mmap stream borrows the camera, so the
//! render loop creates it locally and pulls one frame per turn.

use crate::errors::CameraError;
use crate::frame::Frame;
use image::RgbImage;
use tracing::info;
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

/// Pixel layouts the booth can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelLayout {
    /// Packed 24-bit RGB
    Rgb3,
    /// Packed 4:2:2 YUV, two pixels per four bytes
    Yuyv,
}

/// An opened capture device with a negotiated format
pub struct Camera {
    device: Device,
    width: u32,
    height: u32,
    stride: u32,
    layout: PixelLayout,
}

impl Camera {
    /// Open `/dev/video{index}` and negotiate a format the booth can
    /// decode, preferring packed RGB over YUYV.
    pub fn open(index: usize, width: u32, height: u32) -> Result<Camera, CameraError> {
        let device = Device::new(index)
            .map_err(|e| CameraError::OpenFailed(format!("/dev/video{}: {}", index, e)))?;

        for (fourcc, layout) in [(b"RGB3", PixelLayout::Rgb3), (b"YUYV", PixelLayout::Yuyv)] {
            let requested = Format::new(width, height, FourCC::new(fourcc));
            let actual = device
                .set_format(&requested)
                .map_err(|e| CameraError::OpenFailed(e.to_string()))?;
            if actual.fourcc == FourCC::new(fourcc) {
                info!(
                    width = actual.width,
                    height = actual.height,
                    fourcc = %actual.fourcc,
                    "Camera format negotiated"
                );
                let stride = match layout {
                    PixelLayout::Rgb3 if actual.stride > 0 => actual.stride,
                    PixelLayout::Rgb3 => actual.width * 3,
                    PixelLayout::Yuyv if actual.stride > 0 => actual.stride,
                    PixelLayout::Yuyv => actual.width * 2,
                };
                return Ok(Camera {
                    device,
                    width: actual.width,
                    height: actual.height,
                    stride,
                    layout,
                });
            }
        }

        Err(CameraError::UnsupportedFormat(
            "device offers neither RGB3 nor YUYV".to_string(),
        ))
    }

    /// Start the memory-mapped capture stream. The stream borrows the
    /// camera for its lifetime.
    pub fn stream(&self) -> Result<MmapStream<'_>, CameraError> {
        MmapStream::with_buffers(&self.device, Type::VideoCapture, 4)
            .map_err(|e| CameraError::StreamFailed(e.to_string()))
    }

    /// Decode one raw capture buffer into an RGB frame
    pub fn decode(&self, data: &[u8]) -> Result<Frame, CameraError> {
        decode_buffer(data, self.width, self.height, self.stride, self.layout).map(Frame::new)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

fn decode_buffer(
    data: &[u8],
    width: u32,
    height: u32,
    stride: u32,
    layout: PixelLayout,
) -> Result<RgbImage, CameraError> {
    let needed = match layout {
        PixelLayout::Rgb3 => (height.saturating_sub(1) * stride + width * 3) as usize,
        PixelLayout::Yuyv => (height.saturating_sub(1) * stride + width * 2) as usize,
    };
    if data.len() < needed {
        return Err(CameraError::StreamFailed(format!(
            "truncated frame: {} of {} bytes",
            data.len(),
            needed
        )));
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    match layout {
        PixelLayout::Rgb3 => {
            for y in 0..height {
                let row = (y * stride) as usize;
                rgb.extend_from_slice(&data[row..row + (width * 3) as usize]);
            }
        }
        PixelLayout::Yuyv => {
            // Two pixels share chroma: Y0 U Y1 V
            for y in 0..height {
                let row = (y * stride) as usize;
                for x in 0..width {
                    let pair = row + (x & !1) as usize * 2;
                    let luma = if x & 1 == 0 {
                        data[pair]
                    } else {
                        data[pair + 2]
                    };
                    let (r, g, b) = yuv_to_rgb(luma, data[pair + 1], data[pair + 3]);
                    rgb.push(r);
                    rgb.push(g);
                    rgb.push(b);
                }
            }
        }
    }

    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| CameraError::StreamFailed("frame buffer size mismatch".to_string()))
}

/// Convert YUV (BT.601) to RGB
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}
