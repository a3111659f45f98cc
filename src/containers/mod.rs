pub mod compression;
pub mod header;
pub mod sprite_pack;

use crate::error::SpriteError;

pub trait CompressionContainer {
    fn decompress(&self) -> Result<Vec<u8>, SpriteError>;
}
