//! Builders for synthetic sprite containers.

pub struct TestSprite {
    pub name: [u8; 4],
    pub width: u16,
    pub height: u16,
    pub origin: (u16, u16),
    pub layer_info: u32,
    pub pixels: Vec<u8>,
}

impl TestSprite {
    pub fn new(name: &[u8; 4], width: u16, height: u16, layer_info: u32, pixels: Vec<u8>) -> Self {
        TestSprite {
            name: *name,
            width,
            height,
            origin: (0, 0),
            layer_info,
            pixels,
        }
    }

    pub fn with_origin(mut self, x: u16, y: u16) -> Self {
        self.origin = (x, y);
        self
    }
}

/// Unpacked buffer: length, directory, then each subheader and its pixels.
pub fn unpacked_contents(sprites: &[TestSprite]) -> Vec<u8> {
    let mut names = Vec::new();
    let mut offsets = Vec::new();
    let mut blocks = Vec::new();

    for sprite in sprites {
        names.extend_from_slice(&sprite.name);
        offsets.extend_from_slice(&(blocks.len() as u32).to_le_bytes());

        blocks.extend_from_slice(&sprite.width.to_le_bytes());
        blocks.extend_from_slice(&sprite.height.to_le_bytes());
        blocks.extend_from_slice(&[0; 4]);
        blocks.extend_from_slice(&sprite.origin.0.to_le_bytes());
        blocks.extend_from_slice(&sprite.origin.1.to_le_bytes());
        blocks.extend_from_slice(&sprite.layer_info.to_le_bytes());
        blocks.extend_from_slice(&sprite.pixels);
    }

    let mut contents = vec![0u8; 4];
    contents.extend_from_slice(&(sprites.len() as u16).to_le_bytes());
    contents.extend_from_slice(&names);
    contents.extend_from_slice(&offsets);
    contents.extend_from_slice(&blocks);

    let length = contents.len() as u32;
    contents[0..4].copy_from_slice(&length.to_le_bytes());
    contents
}

/// Container file holding `sprites` uncompressed.
pub fn pack_container(sprites: &[TestSprite]) -> Vec<u8> {
    let contents = unpacked_contents(sprites);
    let length = contents.len() as u32;

    let mut data = Vec::new();
    data.extend_from_slice(&length.to_le_bytes());
    data.extend_from_slice(&length.to_le_bytes());
    // no markers, phase 1 skipped
    data.push(0x80);
    data.extend_from_slice(&contents);
    data
}
