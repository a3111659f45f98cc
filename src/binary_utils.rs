use crate::error::SpriteError;

fn slice_at(data: &[u8], offset: usize, length: usize) -> Result<&[u8], SpriteError> {
    offset
        .checked_add(length)
        .and_then(|end| data.get(offset..end))
        .ok_or(SpriteError::OutOfBounds {
            offset,
            length,
            available: data.len(),
        })
}

pub fn read_u8(data: &[u8], offset: usize) -> Result<u8, SpriteError> {
    Ok(slice_at(data, offset, 1)?[0])
}

pub fn read_u16_le(data: &[u8], offset: usize) -> Result<u16, SpriteError> {
    let bytes = slice_at(data, offset, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

pub fn read_u32_le(data: &[u8], offset: usize) -> Result<u32, SpriteError> {
    let bytes = slice_at(data, offset, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub fn read_bytes<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], SpriteError> {
    let mut buffer = [0u8; N];
    buffer.copy_from_slice(slice_at(data, offset, N)?);
    Ok(buffer)
}

/// Fixed-width ASCII name with NUL bytes removed.
pub fn read_name(data: &[u8], offset: usize, length: usize) -> Result<String, SpriteError> {
    Ok(slice_at(data, offset, length)?
        .iter()
        .filter(|&&b| b != 0)
        .map(|&b| b as char)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let data = [0x34, 0x12, 0x78, 0x56, 0xAA];
        assert_eq!(read_u16_le(&data, 0).unwrap(), 0x1234);
        assert_eq!(read_u32_le(&data, 0).unwrap(), 0x5678_1234);
        assert_eq!(read_u8(&data, 4).unwrap(), 0xAA);
    }

    #[test]
    fn out_of_range_read_is_an_error() {
        let data = [0u8; 3];
        assert!(matches!(
            read_u32_le(&data, 0),
            Err(SpriteError::OutOfBounds {
                offset: 0,
                length: 4,
                available: 3
            })
        ));
        assert!(read_u8(&data, usize::MAX).is_err());
    }

    #[test]
    fn names_drop_nul_bytes() {
        let data = b"CA\0R";
        assert_eq!(read_name(data, 0, 4).unwrap(), "CAR");
    }
}
