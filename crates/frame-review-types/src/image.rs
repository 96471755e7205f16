use std::sync::Arc;

use crate::Size;

#[derive(Clone, Debug)]
pub struct Nv12Planes {
    pub width: u32,
    pub height: u32,
    pub y_stride: usize,
    pub uv_stride: usize,
    pub y_plane: Arc<[u8]>,
    pub uv_plane: Arc<[u8]>,
}

/// Tightly packed RGBA8 pixels ready for upload to a renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RgbaBuffer {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let bytes = self.data.get(offset..offset + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

/// The processed frame an analysis ran on. Resolved once at the import
/// boundary; downstream code only asks for its size or an RGBA copy.
#[derive(Clone, Debug)]
pub enum FrameImage {
    Rgba8 {
        width: u32,
        height: u32,
        data: Arc<[u8]>,
    },
    Nv12(Nv12Planes),
    /// Pixels were not retained, only the dimensions.
    Blank { width: u32, height: u32 },
}

impl FrameImage {
    pub fn blank(width: u32, height: u32) -> Self {
        FrameImage::Blank { width, height }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            FrameImage::Rgba8 { width, height, .. } => (*width, *height),
            FrameImage::Nv12(planes) => (planes.width, planes.height),
            FrameImage::Blank { width, height } => (*width, *height),
        }
    }

    pub fn pixel_size(&self) -> Size {
        Size::from(self.dimensions())
    }

    pub fn to_rgba(&self) -> RgbaBuffer {
        let (width, height) = self.dimensions();
        let len = width as usize * height as usize * 4;
        let data = match self {
            FrameImage::Rgba8 { data, .. } => {
                let mut out = vec![0u8; len];
                let copied = len.min(data.len());
                out[..copied].copy_from_slice(&data[..copied]);
                out
            }
            FrameImage::Nv12(planes) => nv12_to_rgba(planes),
            FrameImage::Blank { .. } => vec![0u8; len],
        };
        RgbaBuffer {
            width,
            height,
            data,
        }
    }
}

// BT.601 limited range.
fn nv12_to_rgba(planes: &Nv12Planes) -> Vec<u8> {
    let width = planes.width as usize;
    let height = planes.height as usize;
    let mut out = Vec::with_capacity(width * height * 4);
    for row in 0..height {
        let y_row = row * planes.y_stride;
        let uv_row = (row / 2) * planes.uv_stride;
        for col in 0..width {
            let y = planes.y_plane.get(y_row + col).copied().unwrap_or(16) as i32;
            let uv_col = uv_row + (col / 2) * 2;
            let u = planes.uv_plane.get(uv_col).copied().unwrap_or(128) as i32;
            let v = planes.uv_plane.get(uv_col + 1).copied().unwrap_or(128) as i32;

            let c = y - 16;
            let d = u - 128;
            let e = v - 128;
            let r = (298 * c + 409 * e + 128) >> 8;
            let g = (298 * c - 100 * d - 208 * e + 128) >> 8;
            let b = (298 * c + 516 * d + 128) >> 8;
            out.extend_from_slice(&[clamp_u8(r), clamp_u8(g), clamp_u8(b), 255]);
        }
    }
    out
}

fn clamp_u8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}
