//! Two-phase run-length decompression.
//!
//! Phase 1 expands repeated byte sequences delimited by the class-1 marker.
//! Phase 2 expands single-byte runs from phase 1's output, so a run marker may
//! itself come out of a repeated sequence. Both phases are pull-based cursors
//! and the whole pipeline stops once `packed_length` raw bytes have been read.

use log::warn;

use crate::{
    containers::{header::ContainerHeader, CompressionContainer},
    error::{SizeMismatch, SpriteError},
};

const BYTE_RUN_CLASS: u8 = 0;
const WORD_RUN_CLASS: u8 = 2;
const MAX_RESERVE_FACTOR: usize = 16;

/// Raw byte source limited to the header's packed length.
pub struct PackedReader<'a> {
    data: &'a [u8],
    packed_length: usize,
    consumed: usize,
}

impl<'a> PackedReader<'a> {
    pub fn new(data: &'a [u8], packed_length: usize) -> Self {
        PackedReader {
            data,
            packed_length,
            consumed: 0,
        }
    }

    pub fn next_byte(&mut self) -> Result<u8, SpriteError> {
        let requested = self.consumed + 1;
        if requested > self.packed_length {
            return Err(SpriteError::TruncatedInput {
                requested,
                packed_length: self.packed_length,
            });
        }

        let byte = *self
            .data
            .get(self.consumed)
            .ok_or(SpriteError::UnexpectedEndOfFile {
                consumed: self.consumed,
                declared: self.packed_length,
            })?;

        self.consumed = requested;
        Ok(byte)
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn is_exhausted(&self) -> bool {
        self.consumed >= self.packed_length
    }
}

/// Phase 1: sequence expansion.
///
/// `M s0 s1 .. sn M count` emits `s0 .. sn` `count` times, where `M` is the
/// class-1 marker. Everything else passes through unchanged.
pub struct SequenceExpander<'a> {
    reader: PackedReader<'a>,
    sequence_marker: Option<u8>,
    sequence: Vec<u8>,
    position: usize,
    repeats_left: usize,
}

impl<'a> SequenceExpander<'a> {
    /// With `sequence_marker` set to `None` this is the identity transform.
    pub fn new(reader: PackedReader<'a>, sequence_marker: Option<u8>) -> Self {
        SequenceExpander {
            reader,
            sequence_marker,
            sequence: Vec::new(),
            position: 0,
            repeats_left: 0,
        }
    }

    pub fn from_header(data: &'a [u8], header: &ContainerHeader) -> Self {
        let sequence_marker = if header.skip_phase1 {
            None
        } else {
            header.markers.sequence_marker()
        };

        Self::new(
            PackedReader::new(data, header.packed_length as usize),
            sequence_marker,
        )
    }

    /// Next phase-1 byte, or `None` once the packed input is used up and no
    /// repeated sequence is pending.
    pub fn next_byte(&mut self) -> Result<Option<u8>, SpriteError> {
        loop {
            if let Some(byte) = self.next_pending() {
                return Ok(Some(byte));
            }

            if self.reader.is_exhausted() {
                return Ok(None);
            }

            let byte = self.reader.next_byte()?;
            match self.sequence_marker {
                Some(marker) if byte == marker => self.start_sequence(marker)?,
                _ => return Ok(Some(byte)),
            }
        }
    }

    pub fn source_exhausted(&self) -> bool {
        self.reader.is_exhausted()
    }

    pub fn consumed(&self) -> usize {
        self.reader.consumed()
    }

    fn start_sequence(&mut self, marker: u8) -> Result<(), SpriteError> {
        self.sequence.clear();
        loop {
            let byte = self.reader.next_byte()?;
            if byte == marker {
                break;
            }
            self.sequence.push(byte);
        }

        self.repeats_left = self.reader.next_byte()? as usize;
        self.position = 0;
        Ok(())
    }

    fn next_pending(&mut self) -> Option<u8> {
        if self.sequence.is_empty() {
            return None;
        }

        while self.repeats_left > 0 {
            if let Some(&byte) = self.sequence.get(self.position) {
                self.position += 1;
                return Some(byte);
            }
            self.position = 0;
            self.repeats_left -= 1;
        }

        None
    }
}

/// Phase 2: run expansion over phase 1's output.
pub struct RunExpander<'a, 'h> {
    source: SequenceExpander<'a>,
    header: &'h ContainerHeader,
}

impl<'a, 'h> RunExpander<'a, 'h> {
    pub fn new(source: SequenceExpander<'a>, header: &'h ContainerHeader) -> Self {
        RunExpander { source, header }
    }

    pub fn expand(mut self) -> Result<Vec<u8>, SpriteError> {
        // The declared length is untrusted; bound the reservation by the input size.
        let capacity = (self.header.unpacked_length as usize)
            .min((self.header.packed_length as usize).saturating_mul(MAX_RESERVE_FACTOR));
        let mut contents = Vec::with_capacity(capacity);

        // Driven by raw consumption: phase-1 output still pending when the last
        // packed byte has been read is never pulled.
        while !self.source.source_exhausted() {
            let byte = self.pull()?;

            match self.header.markers.class_of(byte) {
                Some(BYTE_RUN_CLASS) => {
                    let run_length = self.pull()? as usize;
                    let value = self.pull()?;
                    contents.resize(contents.len() + run_length, value);
                }
                Some(WORD_RUN_CLASS) => {
                    let low = self.pull()?;
                    let high = self.pull()?;
                    let run_length = u16::from_le_bytes([low, high]) as usize;
                    let value = self.pull()?;
                    contents.resize(contents.len() + run_length, value);
                }
                // The class number is the run length itself.
                Some(class) => {
                    let value = self.pull()?;
                    contents.resize(contents.len() + class as usize, value);
                }
                None => contents.push(byte),
            }
        }

        Ok(contents)
    }

    fn pull(&mut self) -> Result<u8, SpriteError> {
        self.source
            .next_byte()?
            .ok_or(SpriteError::TruncatedInput {
                requested: self.source.consumed() + 1,
                packed_length: self.header.packed_length as usize,
            })
    }
}

/// Packed payload following a container header.
pub struct PackedContent<'a> {
    pub header: &'a ContainerHeader,
    pub data: &'a [u8],
}

impl<'a> PackedContent<'a> {
    pub fn new(header: &'a ContainerHeader, data: &'a [u8]) -> Self {
        PackedContent { header, data }
    }
}

impl CompressionContainer for PackedContent<'_> {
    fn decompress(&self) -> Result<Vec<u8>, SpriteError> {
        let phase1 = SequenceExpander::from_header(self.data, self.header);
        let contents = RunExpander::new(phase1, self.header).expand()?;

        if let Some(mismatch) = size_mismatch(self.header, &contents) {
            warn!("{}", mismatch);
        }

        Ok(contents)
    }
}

pub fn size_mismatch(header: &ContainerHeader, contents: &[u8]) -> Option<SizeMismatch> {
    (contents.len() != header.unpacked_length as usize).then_some(SizeMismatch {
        declared: header.unpacked_length,
        actual: contents.len(),
    })
}
