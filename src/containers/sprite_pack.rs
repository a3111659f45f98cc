use std::{fs, path::Path};

use log::debug;

use super::{
    compression::rle::{size_mismatch, PackedContent},
    header::{ColorSpace, ContainerHeader},
    CompressionContainer,
};
use crate::{
    error::{SizeMismatch, SpriteError},
    formats::{directory::SpriteDirectory, sprite::SpriteRecord},
    graphics::assembler::{self, DecodedSprite},
};

/// A packed sprite file (`.PCS` or `.PES`) after decompression.
///
/// The unpacked buffer and the directory are built once on open and never
/// change afterwards.
#[derive(Debug)]
pub struct PackedSpriteFile {
    color_space: ColorSpace,
    header: ContainerHeader,
    contents: Vec<u8>,
    directory: SpriteDirectory,
}

impl PackedSpriteFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SpriteError> {
        let path = path.as_ref();
        let color_space = ColorSpace::from_path(path)?;
        let data = fs::read(path)?;

        Self::from_bytes(&data, color_space)
    }

    pub fn from_bytes(data: &[u8], color_space: ColorSpace) -> Result<Self, SpriteError> {
        let (header, header_len) = ContainerHeader::parse(data)?;
        debug!(
            "header: unpacked {} packed {} skip_phase1 {} markers {:?}",
            header.unpacked_length, header.packed_length, header.skip_phase1, header.markers
        );

        let contents = PackedContent::new(&header, &data[header_len..]).decompress()?;
        let directory = SpriteDirectory::parse(&contents, header.unpacked_length)?;
        debug!("directory: {:?}", directory.entries());

        Ok(PackedSpriteFile {
            color_space,
            header,
            contents,
            directory,
        })
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn directory(&self) -> &SpriteDirectory {
        &self.directory
    }

    pub fn sprite_names(&self) -> Vec<&str> {
        self.directory.names().collect()
    }

    pub fn size_mismatch(&self) -> Option<SizeMismatch> {
        size_mismatch(&self.header, &self.contents)
    }

    pub fn sprite_record(&self, name: &str) -> Result<SpriteRecord, SpriteError> {
        let offset = self
            .directory
            .get(name)
            .ok_or_else(|| SpriteError::UnknownSprite {
                name: name.to_string(),
            })?;

        SpriteRecord::parse(
            &self.contents,
            self.directory.sprite_base() + offset as usize,
        )
    }

    pub fn decode_sprite(&self, name: &str) -> Result<DecodedSprite, SpriteError> {
        assembler::decode_sprite(self, name)
    }

    pub fn save_sprite(&self, name: &str, path: &Path) -> Result<DecodedSprite, SpriteError> {
        let sprite = self.decode_sprite(name)?;
        sprite.image.save(path)?;
        Ok(sprite)
    }

    /// Composites the named sprites onto a 320x200 screen and saves it.
    pub fn build_screen<S: AsRef<str>>(&self, names: &[S], path: &Path) -> Result<(), SpriteError> {
        let sprites = names
            .iter()
            .map(|name| self.decode_sprite(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        assembler::compose_screen(&sprites).save(path)?;
        Ok(())
    }

    pub fn dump_unpacked(&self, path: &Path) -> Result<(), SpriteError> {
        debug!("Dumping {} bytes to {}", self.contents.len(), path.display());
        fs::write(path, &self.contents)?;
        Ok(())
    }
}
