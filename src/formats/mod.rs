pub mod directory;
pub mod sprite;
