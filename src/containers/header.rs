use std::path::Path;

use serde::Serialize;

use crate::error::SpriteError;

/// Fixed bytes before the marker declarations: two lengths and the marker count.
pub const CONTAINER_HEADER_SIZE: usize = 9;

const MARKER_COUNT_MASK: u8 = 0x0F;
const MARKER_FLAGS_MASK: u8 = 0xF0;
const SKIP_PHASE1_FLAG: u8 = 0x80;

/// Class whose marker opens and closes a repeated sequence.
pub const SEQUENCE_MARKER_CLASS: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorSpace {
    #[serde(rename = "CGA4")]
    Cga4,
    #[serde(rename = "EGA16")]
    Ega16,
}

impl ColorSpace {
    pub fn from_extension(extension: &str) -> Result<Self, SpriteError> {
        match extension.to_ascii_uppercase().as_str() {
            "PCS" => Ok(ColorSpace::Cga4),
            "PES" => Ok(ColorSpace::Ega16),
            _ => Err(SpriteError::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    pub fn is_supported(path: &Path) -> bool {
        Self::from_path(path).is_ok()
    }

    pub fn from_path(path: &Path) -> Result<Self, SpriteError> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::from_extension(&extension)
    }

    /// Pixels packed into one byte of a sprite's declared width.
    pub fn pixels_per_byte(self) -> u32 {
        match self {
            ColorSpace::Cga4 => 4,
            ColorSpace::Ega16 => 8,
        }
    }
}

/// Byte value to marker class lookup.
///
/// The first declaration of a byte value wins; later declarations of the
/// same value are ignored.
#[derive(Clone, PartialEq, Eq)]
pub struct RunLengthMarkers {
    classes: [Option<u8>; 256],
}

impl Default for RunLengthMarkers {
    fn default() -> Self {
        RunLengthMarkers {
            classes: [None; 256],
        }
    }
}

impl std::fmt::Debug for RunLengthMarkers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.classes
                    .iter()
                    .enumerate()
                    .filter_map(|(byte, class)| class.map(|c| (byte, c))),
            )
            .finish()
    }
}

impl RunLengthMarkers {
    /// Registers `byte` as `class` unless it already has one. Returns whether
    /// the registration took effect.
    pub fn register(&mut self, byte: u8, class: u8) -> bool {
        let slot = &mut self.classes[byte as usize];
        if slot.is_some() {
            return false;
        }
        *slot = Some(class);
        true
    }

    pub fn class_of(&self, byte: u8) -> Option<u8> {
        self.classes[byte as usize]
    }

    pub fn sequence_marker(&self) -> Option<u8> {
        self.classes
            .iter()
            .position(|&class| class == Some(SEQUENCE_MARKER_CLASS))
            .map(|byte| byte as u8)
    }
}

#[derive(Debug, Clone)]
pub struct ContainerHeader {
    pub unpacked_length: u32,
    pub packed_length: u32,
    pub markers: RunLengthMarkers,
    pub skip_phase1: bool,
}

impl ContainerHeader {
    /// Parses the header and returns it with the number of bytes it occupied.
    pub fn parse(data: &[u8]) -> Result<(ContainerHeader, usize), SpriteError> {
        if data.len() < CONTAINER_HEADER_SIZE {
            return Err(SpriteError::TruncatedHeader { length: data.len() });
        }

        let unpacked_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let packed_length = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        let marker_info = data[8];

        let marker_count = (marker_info & MARKER_COUNT_MASK) as usize;
        let header_len = CONTAINER_HEADER_SIZE + marker_count;
        let declarations = data
            .get(CONTAINER_HEADER_SIZE..header_len)
            .ok_or(SpriteError::TruncatedHeader { length: data.len() })?;

        let mut markers = RunLengthMarkers::default();
        for (class, &byte) in declarations.iter().enumerate() {
            // A repeated declaration still uses up its class number.
            markers.register(byte, class as u8);
        }

        Ok((
            ContainerHeader {
                unpacked_length,
                packed_length,
                markers,
                // Only an exact 0x8 high nibble skips phase 1.
                skip_phase1: marker_info & MARKER_FLAGS_MASK == SKIP_PHASE1_FLAG,
            },
            header_len,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(unpacked: u32, packed: u32, info: u8, markers: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&unpacked.to_le_bytes());
        data.extend_from_slice(&packed.to_le_bytes());
        data.push(info);
        data.extend_from_slice(markers);
        data
    }

    #[test]
    fn parses_lengths_and_markers() {
        let data = header_bytes(0x1234, 0x0100, 0x03, &[0xF0, 0xF1, 0xF2]);
        let (header, len) = ContainerHeader::parse(&data).unwrap();

        assert_eq!(len, 12);
        assert_eq!(header.unpacked_length, 0x1234);
        assert_eq!(header.packed_length, 0x0100);
        assert!(!header.skip_phase1);
        assert_eq!(header.markers.class_of(0xF0), Some(0));
        assert_eq!(header.markers.class_of(0xF1), Some(1));
        assert_eq!(header.markers.class_of(0xF2), Some(2));
        assert_eq!(header.markers.sequence_marker(), Some(0xF1));
        assert_eq!(header.markers.class_of(0x00), None);
    }

    #[test]
    fn first_declaration_of_a_marker_wins() {
        let data = header_bytes(0, 0, 0x03, &[0x10, 0x90, 0x90]);
        let (header, _) = ContainerHeader::parse(&data).unwrap();

        assert_eq!(header.markers.class_of(0x90), Some(1));
    }

    #[test]
    fn duplicate_declaration_consumes_its_class() {
        let data = header_bytes(0, 0, 0x04, &[0x90, 0x90, 0xA0, 0xB0]);
        let (header, _) = ContainerHeader::parse(&data).unwrap();

        assert_eq!(header.markers.class_of(0x90), Some(0));
        assert_eq!(header.markers.class_of(0xA0), Some(2));
        assert_eq!(header.markers.class_of(0xB0), Some(3));
        assert_eq!(header.markers.sequence_marker(), None);
    }

    #[test]
    fn register_does_not_overwrite() {
        let mut markers = RunLengthMarkers::default();
        assert!(markers.register(0x90, 1));
        assert!(!markers.register(0x90, 2));
        assert_eq!(markers.class_of(0x90), Some(1));
    }

    #[test]
    fn high_bit_sets_skip_flag() {
        let data = header_bytes(4, 4, 0x80, &[]);
        let (header, len) = ContainerHeader::parse(&data).unwrap();

        assert!(header.skip_phase1);
        assert_eq!(header.markers.sequence_marker(), None);
        assert_eq!(len, CONTAINER_HEADER_SIZE);
    }

    #[test]
    fn other_high_nibbles_keep_phase1() {
        let data = header_bytes(0, 0, 0x92, &[0xF0, 0xF1]);
        let (header, len) = ContainerHeader::parse(&data).unwrap();

        assert!(!header.skip_phase1);
        assert_eq!(len, CONTAINER_HEADER_SIZE + 2);
        assert_eq!(header.markers.sequence_marker(), Some(0xF1));

        let data = header_bytes(0, 0, 0x82, &[0xF0, 0xF1]);
        let (header, _) = ContainerHeader::parse(&data).unwrap();
        assert!(header.skip_phase1);

        for info in [0x90, 0xA0, 0xC0, 0xF0] {
            let (header, _) = ContainerHeader::parse(&header_bytes(0, 0, info, &[])).unwrap();
            assert!(!header.skip_phase1, "{:#04x}", info);
        }
    }

    #[test]
    fn short_header_is_rejected() {
        assert!(matches!(
            ContainerHeader::parse(&[0u8; 5]),
            Err(SpriteError::TruncatedHeader { length: 5 })
        ));

        let data = header_bytes(0, 0, 0x02, &[0xF0]);
        assert!(matches!(
            ContainerHeader::parse(&data),
            Err(SpriteError::TruncatedHeader { .. })
        ));
    }

    #[test]
    fn colour_space_follows_extension() {
        assert_eq!(ColorSpace::from_extension("PCS").unwrap(), ColorSpace::Cga4);
        assert_eq!(ColorSpace::from_extension("pes").unwrap(), ColorSpace::Ega16);
        assert!(matches!(
            ColorSpace::from_path(Path::new("grandprix/TITLE.PCX")),
            Err(SpriteError::UnsupportedFormat { .. })
        ));
        assert!(ColorSpace::from_path(Path::new("README")).is_err());
    }
}
