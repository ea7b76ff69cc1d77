use crate::{design, icon_set, inspect, png};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

/// Default output file name in the working directory.
pub const DEFAULT_OUTPUT: &str = "app-icon.png";

#[derive(Debug, Clone)]
pub struct Args {
    pub output: PathBuf,
    pub icons: Option<PathBuf>,
    pub verify: bool,
}

/// Renders the icon to PNG bytes
pub fn render() -> Result<Vec<u8>> {
    png::encode(design::CANVAS_SIZE, design::CANVAS_SIZE, design::icon)
}

pub fn generate(args: Args) -> Result<()> {
    debug!(?args, "Starting");

    let bytes = render().context("Failed to encode icon")?;
    png::save(&bytes, &args.output)?;
    println!("Created {}", args.output.display());
    info!(path = %args.output.display(), bytes = bytes.len(), "Wrote icon");

    if args.verify {
        let written = std::fs::read(&args.output)
            .with_context(|| format!("Failed to read back {}", args.output.display()))?;
        let report = inspect::verify(&written)
            .with_context(|| format!("{} failed verification", args.output.display()))?;
        println!(
            "✓ Verified {}x{} RGBA, chunks {}, {} -> {} bytes",
            report.width,
            report.height,
            report.tags.join(" "),
            report.raw_len,
            report.compressed_len
        );
    }

    if let Some(dir) = &args.icons {
        println!("Generating icon set in {}...", dir.display());
        let source = image::load_from_memory(&bytes).context("Failed to decode rendered icon")?;
        let manifest = icon_set::generate_icon_set(&source, dir)?;
        info!(files = manifest.icon.len(), "Wrote icon set");
    }

    Ok(())
}
