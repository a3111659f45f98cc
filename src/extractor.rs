//! Batch extraction of every sprite in a directory of packed sprite files.
//!
//! Each container is decoded on its own; a broken file is logged, recorded in
//! the report and skipped. `.PCS`/`.PES` extensions are matched in any case,
//! so lowercase copies of the game files are picked up too.

use std::{
    fs::{self, File},
    hash::Hasher,
    path::{Path, PathBuf},
};

use image::RgbaImage;
use log::{info, warn};
use serde::Serialize;
use twox_hash::XxHash64;

use crate::{
    containers::{header::ColorSpace, sprite_pack::PackedSpriteFile},
    error::SpriteError,
    graphics::DecodedSprite,
    progress::write_progress,
};

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub output_dir: PathBuf,
    /// Re-encode every PNG through oxipng.
    pub optimise: bool,
    /// Write a JSON manifest next to each container's sprites.
    pub manifest: bool,
    pub progress_path: Option<PathBuf>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            output_dir: PathBuf::from("sprites"),
            optimise: false,
            manifest: false,
            progress_path: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub sprites_written: usize,
    pub failed: Vec<(PathBuf, String)>,
}

#[derive(Debug, Serialize)]
pub struct ContainerManifest {
    pub file: String,
    pub color_space: ColorSpace,
    pub declared_length: u32,
    pub unpacked_length: usize,
    pub sprites: Vec<SpriteManifestEntry>,
}

#[derive(Debug, Serialize)]
pub struct SpriteManifestEntry {
    pub name: String,
    pub offset: u32,
    pub width: u32,
    pub height: u32,
    pub origin_x: u16,
    pub origin_y: u16,
    pub layer_info: u32,
    pub pixel_hash: String,
}

impl SpriteManifestEntry {
    fn from_sprite(sprite: &DecodedSprite) -> Self {
        SpriteManifestEntry {
            name: sprite.name.clone(),
            offset: sprite.offset,
            width: sprite.width(),
            height: sprite.height(),
            origin_x: sprite.record.origin_x,
            origin_y: sprite.record.origin_y,
            layer_info: sprite.record.layer_info,
            pixel_hash: format!("{:016x}", pixel_hash(&sprite.image)),
        }
    }
}

/// xxHash64 of the raw RGBA bytes; equal sprites hash equally.
pub fn pixel_hash(image: &RgbaImage) -> u64 {
    let mut hasher = XxHash64::default();
    hasher.write(image.as_raw());
    hasher.finish()
}

pub struct SpriteExtractor {
    options: ExtractOptions,
}

impl SpriteExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        SpriteExtractor { options }
    }

    /// Container files directly inside `input_dir`, sorted by name.
    /// Extensions are compared case-insensitively.
    pub fn find_containers(input_dir: &Path) -> Result<Vec<PathBuf>, SpriteError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(input_dir)? {
            let path = entry?.path();
            if path.is_file() && ColorSpace::is_supported(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    pub fn run(&self, input_dir: &Path) -> Result<BatchReport, SpriteError> {
        fs::create_dir_all(&self.options.output_dir)?;

        let containers = Self::find_containers(input_dir)?;
        let total = containers.len();
        let mut report = BatchReport::default();

        for (index, path) in containers.iter().enumerate() {
            info!("Processing {}", path.display());

            match self.extract_file(path) {
                Ok(count) => {
                    report.processed += 1;
                    report.sprites_written += count;
                }
                Err(e) => {
                    warn!("{}: {}", path.display(), e);
                    report.failed.push((path.clone(), e.to_string()));
                }
            }

            self.report_progress(index + 1, total, path);
        }

        info!(
            "Extracted {} sprites from {} files ({} failed)",
            report.sprites_written,
            report.processed,
            report.failed.len()
        );

        Ok(report)
    }

    /// Saves every sprite of one container and returns how many were written.
    pub fn extract_file(&self, path: &Path) -> Result<usize, SpriteError> {
        let file = PackedSpriteFile::open(path)?;
        let file_name = file_name(path);

        let mut entries = Vec::new();
        for name in file.sprite_names() {
            let output_path = self
                .options
                .output_dir
                .join(format!("{}.{}.png", file_name, name));

            let sprite = file.save_sprite(name, &output_path)?;
            if self.options.optimise {
                self.optimise_png(&output_path)?;
            }
            entries.push(SpriteManifestEntry::from_sprite(&sprite));
        }

        let count = entries.len();
        if self.options.manifest {
            let manifest = ContainerManifest {
                file: file_name.clone(),
                color_space: file.color_space(),
                declared_length: file.header().unpacked_length,
                unpacked_length: file.contents().len(),
                sprites: entries,
            };
            self.save_manifest(&manifest, &file_name)?;
        }

        Ok(count)
    }

    fn save_manifest(&self, manifest: &ContainerManifest, file_name: &str) -> Result<(), SpriteError> {
        let path = self.options.output_dir.join(format!("{}.json", file_name));
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(file, manifest)?;
        Ok(())
    }

    /// Re-encodes an already written PNG in place.
    fn optimise_png(&self, path: &Path) -> Result<(), SpriteError> {
        let temp_path = path.with_extension("temp.png");
        fs::rename(path, &temp_path)?;

        let mut options = oxipng::Options::from_preset(2);
        options.bit_depth_reduction = true;
        options.interlace = None;

        match oxipng::optimize(
            &oxipng::InFile::Path(temp_path.clone()),
            &oxipng::OutFile::Path(Some(path.to_path_buf())),
            &options,
        ) {
            Ok(_) => {
                let _ = fs::remove_file(temp_path);
            }
            Err(e) => {
                fs::rename(&temp_path, path)?;
                warn!(
                    "oxipng optimisation failed for {}: {}. File saved unoptimised.",
                    path.display(),
                    e
                );
            }
        }

        Ok(())
    }

    fn report_progress(&self, current: usize, total: usize, path: &Path) {
        let Some(progress_path) = &self.options.progress_path else {
            return;
        };

        if let Err(e) = write_progress(progress_path, current, total, "extract", &file_name(path)) {
            warn!("Failed to write progress to {}: {}", progress_path.display(), e);
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{pack_container, TestSprite};

    fn options(output_dir: &Path) -> ExtractOptions {
        ExtractOptions {
            output_dir: output_dir.to_path_buf(),
            ..ExtractOptions::default()
        }
    }

    fn sample_container() -> Vec<u8> {
        pack_container(&[
            TestSprite::new(b"CAR1", 1, 2, 0, vec![0x1B, 0xE4]),
            TestSprite::new(b"CAR2", 1, 2, 0, vec![0x1B, 0xE4]),
            TestSprite::new(b"SKY1", 2, 1, 0, vec![0x00, 0xFF]),
        ])
    }

    #[test]
    fn finds_only_containers() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["B.PES", "A.PCS", "notes.txt", "c.pcs"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("SUB.PCS")).unwrap();

        let found: Vec<_> = SpriteExtractor::find_containers(dir.path())
            .unwrap()
            .iter()
            .map(|p| file_name(p))
            .collect();

        assert_eq!(found, vec!["A.PCS", "B.PES", "c.pcs"]);
    }

    #[test]
    fn extracts_all_sprites_and_skips_broken_files() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let out_dir = output.path().join("sprites");

        fs::write(input.path().join("CARS.PCS"), sample_container()).unwrap();
        // Declares 100 packed bytes but holds none.
        let mut broken = Vec::new();
        broken.extend_from_slice(&100u32.to_le_bytes());
        broken.extend_from_slice(&100u32.to_le_bytes());
        broken.push(0x80);
        fs::write(input.path().join("BROKEN.PES"), broken).unwrap();

        let mut opts = options(&out_dir);
        opts.manifest = true;
        opts.progress_path = Some(output.path().join("progress.json"));
        let report = SpriteExtractor::new(opts).run(input.path()).unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.sprites_written, 3);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].0.ends_with("BROKEN.PES"));

        for name in ["CAR1", "CAR2", "SKY1"] {
            assert!(out_dir.join(format!("CARS.PCS.{}.png", name)).is_file());
        }

        let manifest: serde_json::Value =
            serde_json::from_reader(File::open(out_dir.join("CARS.PCS.json")).unwrap()).unwrap();
        assert_eq!(manifest["color_space"], "CGA4");
        let sprites = manifest["sprites"].as_array().unwrap();
        assert_eq!(sprites.len(), 3);
        assert_eq!(sprites[2]["width"], 8);
        assert_eq!(sprites[0]["pixel_hash"], sprites[1]["pixel_hash"]);
        assert_ne!(sprites[0]["pixel_hash"], sprites[2]["pixel_hash"]);

        let progress: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(output.path().join("progress.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(progress["current"], 2);
        assert_eq!(progress["total"], 2);
    }

    #[test]
    fn optimised_output_keeps_pixels() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let container = input.path().join("CARS.PCS");
        fs::write(&container, sample_container()).unwrap();

        let mut opts = options(output.path());
        opts.optimise = true;
        let count = SpriteExtractor::new(opts).extract_file(&container).unwrap();
        assert_eq!(count, 3);

        let file = PackedSpriteFile::open(&container).unwrap();
        for name in ["CAR1", "CAR2", "SKY1"] {
            let path = output.path().join(format!("CARS.PCS.{}.png", name));
            let saved = image::open(&path).unwrap().to_rgba8();
            assert_eq!(saved, file.decode_sprite(name).unwrap().image);
            assert!(!path.with_extension("temp.png").exists());
        }
    }

    #[test]
    fn missing_input_directory_is_an_error() {
        let output = tempfile::tempdir().unwrap();
        let extractor = SpriteExtractor::new(options(output.path()));

        assert!(matches!(
            extractor.run(&output.path().join("does-not-exist")),
            Err(SpriteError::Io { .. })
        ));
    }
}
