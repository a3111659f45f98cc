use image::{imageops, RgbaImage};
use log::warn;

use super::{cga, ega};
use crate::{
    containers::{header::ColorSpace, sprite_pack::PackedSpriteFile},
    error::SpriteError,
    formats::sprite::SpriteRecord,
};

pub const SCREEN_WIDTH: u32 = 320;
pub const SCREEN_HEIGHT: u32 = 200;

#[derive(Debug, Clone)]
pub struct DecodedSprite {
    pub name: String,
    pub offset: u32,
    pub record: SpriteRecord,
    pub image: RgbaImage,
}

impl DecodedSprite {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn origin(&self) -> (u32, u32) {
        (self.record.origin_x as u32, self.record.origin_y as u32)
    }
}

/// Decodes one sprite from scratch. Nothing is cached between calls.
pub fn decode_sprite(file: &PackedSpriteFile, name: &str) -> Result<DecodedSprite, SpriteError> {
    let record = file.sprite_record(name)?;
    let offset = file.directory().get(name).unwrap_or_default();
    let contents = file.contents();
    let width = record.pixel_width(file.color_space());

    let image = match file.color_space() {
        ColorSpace::Cga4 => cga::decode(contents, &record, width)?,
        ColorSpace::Ega16 => ega::decode(contents, &record, width)?,
    };

    Ok(DecodedSprite {
        name: name.to_string(),
        offset,
        record,
        image,
    })
}

/// Draws sprites in order onto a transparent screen at their origins.
/// Later sprites replace what earlier ones drew.
pub fn compose_screen(sprites: &[DecodedSprite]) -> RgbaImage {
    let mut screen = RgbaImage::new(SCREEN_WIDTH, SCREEN_HEIGHT);

    for sprite in sprites {
        let (x, y) = sprite.origin();
        if x + sprite.width() > SCREEN_WIDTH || y + sprite.height() > SCREEN_HEIGHT {
            warn!(
                "{}: {}x{} at ({}, {}) does not fit on the screen, clipping",
                sprite.name,
                sprite.width(),
                sprite.height(),
                x,
                y
            );
        }

        imageops::replace(&mut screen, &sprite.image, x as i64, y as i64);
    }

    screen
}
