use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum SpriteError {
    #[error("Unsupported file type: {extension:?}")]
    UnsupportedFormat { extension: String },
    #[error("Header too short ({length} bytes)")]
    TruncatedHeader { length: usize },
    #[error("Read beyond end of file ({requested} > {packed_length})")]
    TruncatedInput { requested: usize, packed_length: usize },
    #[error("File ended after {consumed} packed bytes, header declares {declared}")]
    UnexpectedEndOfFile { consumed: usize, declared: usize },
    #[error("Sprite offset beyond end of unpacked contents ({name}: {offset} > {unpacked_length})")]
    InvalidDirectoryOffset {
        name: String,
        offset: u32,
        unpacked_length: u32,
    },
    #[error("Read of {length} bytes at {offset} outside unpacked contents ({available} bytes)")]
    OutOfBounds {
        offset: usize,
        length: usize,
        available: usize,
    },
    #[error("No sprite named {name:?}")]
    UnknownSprite { name: String },
    #[error("Image error: {source}")]
    Image {
        #[from]
        source: image::ImageError,
    },
    #[error("IOError: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("Failed to serialise manifest: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

/// Produced length differs from the length declared in the header.
///
/// Some shipped game files carry this defect, so it is reported rather than
/// treated as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMismatch {
    pub declared: u32,
    pub actual: usize,
}

impl fmt::Display for SizeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unpacked content size mismatch: expected {} but is {}",
            self.declared, self.actual
        )
    }
}
