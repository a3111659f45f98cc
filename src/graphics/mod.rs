//! Pixel reconstruction for packed sprites
//!
//! Turns sprite subheaders and their bit-plane data into RGBA images, and
//! places decoded sprites on a full game screen.

pub mod assembler;
pub mod cga;
pub mod ega;
pub mod palette;

pub use assembler::DecodedSprite;
