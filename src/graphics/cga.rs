//! 4-colour sprites: four 2-bit pixels per byte, most significant pair first.
//!
//! The high half of `layer_info` picks how bytes are laid out in memory.

use image::{Rgba, RgbaImage};

use super::palette::{CGA_PALETTE, TRANSPARENT};
use crate::{binary_utils::read_u8, error::SpriteError, formats::sprite::SpriteRecord};

const PIXELS_PER_BYTE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgaLayout {
    /// One row after the other.
    RowMajor,
    /// One byte-wide column after the other.
    ColumnMajor,
    /// Column-major, even and odd rows in separate halves.
    Interlaced,
    /// Column-major, rows alternate between halves whose heights differ by
    /// one when the sprite height is odd.
    InterlacedAlternating,
    /// Drawn fully transparent.
    Unknown(u16),
}

impl CgaLayout {
    pub fn from_layer_info(layer_info: u32) -> Self {
        match (layer_info >> 16) as u16 {
            0x0000 => CgaLayout::RowMajor,
            0x0010 => CgaLayout::ColumnMajor,
            0x0020 => CgaLayout::Interlaced,
            0x0030 => CgaLayout::InterlacedAlternating,
            other => CgaLayout::Unknown(other),
        }
    }

    /// Byte index of pixel (x, y) relative to the start of the pixel data.
    /// `width` is in pixels.
    fn byte_index(self, width: usize, height: usize, x: usize, y: usize) -> Option<usize> {
        let column = x / PIXELS_PER_BYTE;
        let index = match self {
            CgaLayout::RowMajor => column + y * (width / PIXELS_PER_BYTE),
            CgaLayout::ColumnMajor => column * height + y,
            CgaLayout::Interlaced => {
                let half = ((height % 2) ^ (y % 2)) * (height / 2);
                half + column * height + y / 2
            }
            CgaLayout::InterlacedAlternating => {
                let odd_row = y % 2;
                let half = odd_row * width * (height + height % 2) / 8;
                let corrected_height = if odd_row == 1 {
                    height - height % 2
                } else {
                    height + height % 2
                };
                half + (column * corrected_height + y) / 2
            }
            CgaLayout::Unknown(_) => return None,
        };

        Some(index)
    }
}

pub fn pixel_color(
    contents: &[u8],
    offset: usize,
    layout: CgaLayout,
    width: usize,
    height: usize,
    x: usize,
    y: usize,
) -> Result<Rgba<u8>, SpriteError> {
    let Some(index) = layout.byte_index(width, height, x, y) else {
        return Ok(TRANSPARENT);
    };

    let byte = read_u8(contents, offset + index)?;
    let shift = 2 * (3 - x % PIXELS_PER_BYTE);
    Ok(CGA_PALETTE[((byte >> shift) & 0x03) as usize])
}

pub fn decode(
    contents: &[u8],
    record: &SpriteRecord,
    width: u32,
) -> Result<RgbaImage, SpriteError> {
    let height = record.pixel_height();
    let layout = CgaLayout::from_layer_info(record.layer_info);
    let mut image = RgbaImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        *pixel = pixel_color(
            contents,
            record.data_offset,
            layout,
            width as usize,
            height as usize,
            x as usize,
            y as usize,
        )?;
    }

    Ok(image)
}
