use log::debug;

use crate::{
    binary_utils::{read_bytes, read_u16_le, read_u32_le},
    containers::header::ColorSpace,
    error::SpriteError,
};

pub const SPRITE_HEADER_SIZE: usize = 16;

/// Per-sprite subheader.
///
/// ```text
/// +0  u16  width in bytes
/// +2  u16  height in rows
/// +4  [u8; 8] raw, meaning unknown (the last four overlap the origin)
/// +8  u16  origin x
/// +10 u16  origin y
/// +12 u32  layer info
/// +16 pixel data
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteRecord {
    pub width: u16,
    pub height: u16,
    pub header_data: [u8; 8],
    pub origin_x: u16,
    pub origin_y: u16,
    pub layer_info: u32,
    pub data_offset: usize,
}

impl SpriteRecord {
    pub fn parse(contents: &[u8], base: usize) -> Result<Self, SpriteError> {
        let record = SpriteRecord {
            width: read_u16_le(contents, base)?,
            height: read_u16_le(contents, base + 2)?,
            header_data: read_bytes(contents, base + 4)?,
            origin_x: read_u16_le(contents, base + 8)?,
            origin_y: read_u16_le(contents, base + 10)?,
            layer_info: read_u32_le(contents, base + 12)?,
            data_offset: base + SPRITE_HEADER_SIZE,
        };

        debug!(
            "sprite at {:#x}: {}x{} header {:02x?} layer_info {:#010x}",
            base, record.width, record.height, record.header_data, record.layer_info
        );

        Ok(record)
    }

    /// Width in pixels once the packed bytes are unfolded.
    pub fn pixel_width(&self, color_space: ColorSpace) -> u32 {
        self.width as u32 * color_space.pixels_per_byte()
    }

    pub fn pixel_height(&self) -> u32 {
        self.height as u32
    }
}
