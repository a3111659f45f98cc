use crate::{
    binary_utils::{read_name, read_u16_le, read_u32_le},
    error::SpriteError,
};

/// Offset of the sprite count; the first four bytes repeat the unpacked length.
pub const SPRITE_COUNT_OFFSET: usize = 4;
pub const NAME_TABLE_OFFSET: usize = 6;
pub const SPRITE_NAME_LEN: usize = 4;
pub const SPRITE_OFFSET_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub offset: u32,
}

/// Named sprite offsets in declaration order.
///
/// A name declared twice keeps its first position and takes the later offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpriteDirectory {
    entries: Vec<DirectoryEntry>,
    declared_count: u16,
}

impl SpriteDirectory {
    pub fn parse(contents: &[u8], unpacked_length: u32) -> Result<Self, SpriteError> {
        let declared_count = read_u16_le(contents, SPRITE_COUNT_OFFSET)?;
        let count = declared_count as usize;
        let offset_table = NAME_TABLE_OFFSET + count * SPRITE_NAME_LEN;

        let mut directory = SpriteDirectory {
            entries: Vec::with_capacity(count),
            declared_count,
        };

        for i in 0..count {
            let name = read_name(contents, NAME_TABLE_OFFSET + i * SPRITE_NAME_LEN, SPRITE_NAME_LEN)?;
            let offset = read_u32_le(contents, offset_table + i * SPRITE_OFFSET_LEN)?;

            if offset > unpacked_length {
                return Err(SpriteError::InvalidDirectoryOffset {
                    name,
                    offset,
                    unpacked_length,
                });
            }

            directory.insert(name, offset);
        }

        Ok(directory)
    }

    fn insert(&mut self, name: String, offset: u32) {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.offset = offset,
            None => self.entries.push(DirectoryEntry { name, offset }),
        }
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.offset)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start of the sprite subheaders, just past the name and offset tables.
    ///
    /// Uses the declared count, so every table slot is skipped even when
    /// duplicate names collapsed into one entry. The old extraction tool used
    /// the collapsed count instead; both agree for files without duplicates.
    pub fn sprite_base(&self) -> usize {
        NAME_TABLE_OFFSET + self.declared_count as usize * (SPRITE_NAME_LEN + SPRITE_OFFSET_LEN)
    }
}
