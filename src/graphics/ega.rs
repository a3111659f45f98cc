//! 16-colour sprites stored as up to four separate 1-bit planes.
//!
//! `layer_info` byte `n` (bits `8n..8n+3`) lists the output colour bits that
//! stored plane `n` supplies. Bit `0x10 << n` marks plane `n` as stored
//! column-major. Bits 12-15 hold the background colour that every pixel index
//! is XORed with.

use image::{Rgba, RgbaImage};

use super::palette::EGA_PALETTE;
use crate::{binary_utils::read_u8, error::SpriteError, formats::sprite::SpriteRecord};

const PLANE_COUNT: usize = 4;
const PIXELS_PER_BYTE: usize = 8;
const COLUMN_MAJOR_FLAG: u32 = 0x0000_0010;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneMapping {
    /// Stored plane feeding each output colour bit, indexed by bit.
    sources: [Option<usize>; PLANE_COUNT],
    column_major: [bool; PLANE_COUNT],
    background: u8,
}

impl PlaneMapping {
    pub fn from_layer_info(layer_info: u32) -> Self {
        let mut sources = [None; PLANE_COUNT];
        for (bit, source) in sources.iter_mut().enumerate() {
            // Several planes may claim a bit; the highest one wins.
            *source = (0..PLANE_COUNT)
                .filter(|plane| (layer_info >> (plane * 8)) & (1 << bit) != 0)
                .last();
        }

        let mut column_major = [false; PLANE_COUNT];
        for (plane, flag) in column_major.iter_mut().enumerate() {
            *flag = layer_info & (COLUMN_MAJOR_FLAG << plane) != 0;
        }

        PlaneMapping {
            sources,
            column_major,
            background: ((layer_info >> 12) & 0x0F) as u8,
        }
    }

    pub fn source_of(&self, bit: usize) -> Option<usize> {
        self.sources[bit]
    }

    pub fn is_column_major(&self, plane: usize) -> bool {
        self.column_major[plane]
    }

    pub fn background(&self) -> u8 {
        self.background
    }
}

pub fn pixel_color(
    contents: &[u8],
    offset: usize,
    mapping: &PlaneMapping,
    width: usize,
    height: usize,
    x: usize,
    y: usize,
) -> Result<Rgba<u8>, SpriteError> {
    let plane_size = width * height / PIXELS_PER_BYTE;
    let row_major = x / PIXELS_PER_BYTE + y * (width / PIXELS_PER_BYTE);
    let column_major = (x / PIXELS_PER_BYTE) * height + y;
    let shift = 7 - x % PIXELS_PER_BYTE;

    let mut color = 0u8;
    for bit in (0..PLANE_COUNT).rev() {
        color <<= 1;

        let Some(plane) = mapping.source_of(bit) else {
            continue;
        };

        let index = if mapping.is_column_major(plane) {
            column_major
        } else {
            row_major
        };
        let byte = read_u8(contents, offset + plane * plane_size + index)?;
        color |= (byte >> shift) & 1;
    }

    Ok(EGA_PALETTE[(mapping.background() ^ color) as usize])
}

pub fn decode(
    contents: &[u8],
    record: &SpriteRecord,
    width: u32,
) -> Result<RgbaImage, SpriteError> {
    let height = record.pixel_height();
    let mapping = PlaneMapping::from_layer_info(record.layer_info);
    let mut image = RgbaImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        *pixel = pixel_color(
            contents,
            record.data_offset,
            &mapping,
            width as usize,
            height as usize,
            x as usize,
            y as usize,
        )?;
    }

    Ok(image)
}
