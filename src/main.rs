mod binary_utils;
mod containers;
mod error;
mod extractor;
mod formats;
mod graphics;
mod progress;
#[cfg(test)]
mod test_utils;

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use log::{error, info, warn};

use containers::sprite_pack::PackedSpriteFile;
use error::SpriteError;
use extractor::{ExtractOptions, SpriteExtractor};

#[derive(Parser)]
#[command(version, about = "Extracts sprites from packed .PCS/.PES sprite files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save every sprite of every container in a directory as PNG
    Extract {
        input_dir: PathBuf,
        #[arg(short, long, default_value = "sprites")]
        output: PathBuf,
        /// Run written PNGs through oxipng
        #[arg(long)]
        optimise: bool,
        /// Write a JSON manifest per container
        #[arg(long)]
        manifest: bool,
        /// File to keep updated with batch progress
        #[arg(long)]
        progress: Option<PathBuf>,
    },
    /// Print the sprite directory of one container
    List { file: PathBuf },
    /// Compose named sprites into a 320x200 screen
    Screen {
        file: PathBuf,
        #[arg(short, long, value_delimiter = ',', required = true)]
        sprites: Vec<String>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write the unpacked contents of a container verbatim
    Dump { file: PathBuf, output: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Extract {
            input_dir,
            output,
            optimise,
            manifest,
            progress,
        } => extract(
            &input_dir,
            ExtractOptions {
                output_dir: output,
                optimise,
                manifest,
                progress_path: progress,
            },
        ),
        Command::List { file } => list(&file),
        Command::Screen {
            file,
            sprites,
            output,
        } => PackedSpriteFile::open(&file).and_then(|f| f.build_screen(sprites.as_slice(), &output)),
        Command::Dump { file, output } => {
            PackedSpriteFile::open(&file).and_then(|f| f.dump_unpacked(&output))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn extract(input_dir: &Path, options: ExtractOptions) -> Result<(), SpriteError> {
    info!("Sprites output dir: {}", options.output_dir.display());

    let report = SpriteExtractor::new(options).run(input_dir)?;
    for (path, reason) in &report.failed {
        warn!("Skipped {}: {}", path.display(), reason);
    }

    Ok(())
}

fn list(path: &Path) -> Result<(), SpriteError> {
    let file = PackedSpriteFile::open(path)?;
    if let Some(mismatch) = file.size_mismatch() {
        println!("# {}", mismatch);
    }
    if file.directory().is_empty() {
        println!("# no sprites");
        return Ok(());
    }
    println!("# {} sprites", file.directory().len());

    println!("{:<6} {:>8} {:>9} {:>11} {:>10}", "name", "offset", "size", "origin", "layer_info");
    for entry in file.directory().entries() {
        let record = file.sprite_record(&entry.name)?;
        println!(
            "{:<6} {:>8} {:>9} {:>11} {:#010x}",
            entry.name,
            entry.offset,
            format!(
                "{}x{}",
                record.pixel_width(file.color_space()),
                record.pixel_height()
            ),
            format!("{},{}", record.origin_x, record.origin_y),
            record.layer_info
        );
    }

    Ok(())
}
