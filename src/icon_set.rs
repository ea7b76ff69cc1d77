//! Desktop bundle icons derived from the rendered app icon
//!
//! App shells such as Tauri list their bundle icons as a handful of PNG sizes
//! plus a Windows `.ico` and a macOS `.icns`. Everything here downsamples the
//! full-size icon with Lanczos3 and writes the files into one directory,
//! followed by a `bundle.json` listing them in the order they were written.

use anyhow::{Context, Result};
use icns::{IconFamily, IconType, OSType};
use image::{
    codecs::{
        ico::{IcoEncoder, IcoFrame},
        png::{CompressionType, FilterType as PngFilterType, PngEncoder},
    },
    imageops::FilterType,
    ColorType, DynamicImage, ImageEncoder,
};
use serde::Serialize;
use std::{
    fs::{create_dir_all, File},
    io::{BufWriter, Write},
    path::Path,
};
use tracing::debug;

/// PNG files of the bundle: (file name, edge length)
pub const PNG_ICONS: [(&str, u32); 4] = [
    ("32x32.png", 32),
    ("128x128.png", 128),
    ("128x128@2x.png", 256),
    ("icon.png", 512),
];

/// Frame sizes stored in `icon.ico`
pub const ICO_SIZES: [u32; 6] = [16, 24, 32, 48, 64, 256];

/// Icon types stored in `icon.icns`: (ostype, edge length)
pub const ICNS_ENTRIES: [(&[u8; 4], u32); 10] = [
    (b"is32", 16),
    (b"ic11", 32),
    (b"il32", 32),
    (b"ic12", 64),
    (b"ic07", 128),
    (b"ic13", 256),
    (b"ic08", 256),
    (b"ic14", 512),
    (b"ic09", 512),
    (b"ic10", 1024),
];

pub const ICO_FILE: &str = "icon.ico";
pub const ICNS_FILE: &str = "icon.icns";
pub const MANIFEST_FILE: &str = "bundle.json";

/// `bundle.json`: the icon list in the shape of a Tauri `bundle.icon` entry
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BundleManifest {
    pub icon: Vec<String>,
}

/// Writes the whole icon bundle for `source` into `out_dir`
///
/// Returns the manifest that was written next to the icons.
pub fn generate_icon_set(source: &DynamicImage, out_dir: &Path) -> Result<BundleManifest> {
    if source.width() != source.height() {
        anyhow::bail!("Source image must be square (width == height)");
    }
    create_dir_all(out_dir).context("Can't create icon set directory")?;

    let dir_name = out_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut manifest = BundleManifest { icon: Vec::new() };

    for (file_name, size) in PNG_ICONS {
        generate_png(source, out_dir, file_name, size)?;
        manifest.icon.push(bundle_path(&dir_name, file_name));
    }

    generate_icns(source, out_dir)?;
    manifest.icon.push(bundle_path(&dir_name, ICNS_FILE));

    generate_ico(source, out_dir)?;
    manifest.icon.push(bundle_path(&dir_name, ICO_FILE));

    write_manifest(out_dir, &manifest)?;
    Ok(manifest)
}

fn bundle_path(dir_name: &str, file_name: &str) -> String {
    if dir_name.is_empty() {
        file_name.to_string()
    } else {
        format!("{dir_name}/{file_name}")
    }
}

fn generate_png(source: &DynamicImage, out_dir: &Path, file_name: &str, size: u32) -> Result<()> {
    let resized = source.resize_exact(size, size, FilterType::Lanczos3);
    let path = out_dir.join(file_name);

    let mut file = BufWriter::new(
        File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?,
    );
    write_png(resized.to_rgba8().as_raw(), &mut file, size)
        .with_context(|| format!("Failed to write {file_name}"))?;
    file.flush()?;

    println!("  ✓ Generated {file_name}");
    Ok(())
}

fn generate_ico(source: &DynamicImage, out_dir: &Path) -> Result<()> {
    let mut frames = Vec::with_capacity(ICO_SIZES.len());

    for size in ICO_SIZES {
        let rgba_image = source
            .resize_exact(size, size, FilterType::Lanczos3)
            .to_rgba8();

        // the 256px frame dominates the file size, so it gets the best compression
        if size == 256 {
            let mut buf = Vec::new();
            write_png(rgba_image.as_raw(), &mut buf, size)?;
            frames.push(IcoFrame::with_encoded(buf, size, size, ColorType::Rgba8)?);
        } else {
            frames.push(IcoFrame::as_png(
                rgba_image.as_raw(),
                size,
                size,
                ColorType::Rgba8,
            )?);
        }
    }

    let mut out_file = BufWriter::new(File::create(out_dir.join(ICO_FILE))?);
    IcoEncoder::new(&mut out_file).encode_images(&frames)?;
    out_file.flush()?;

    println!("  ✓ Generated {ICO_FILE}");
    Ok(())
}

fn generate_icns(source: &DynamicImage, out_dir: &Path) -> Result<()> {
    let mut family = IconFamily::new();

    for (ostype, size) in ICNS_ENTRIES {
        let resized = source.resize_exact(size, size, FilterType::Lanczos3);

        let mut buf = Vec::new();
        write_png(resized.to_rgba8().as_raw(), &mut buf, size)?;
        let image = icns::Image::read_png(&buf[..])?;

        let name = String::from_utf8_lossy(ostype);
        let icon_type = IconType::from_ostype(OSType(*ostype))
            .with_context(|| format!("Unknown icns ostype {name}"))?;
        family
            .add_icon_with_type(&image, icon_type)
            .with_context(|| format!("Can't add {name} to Icns Family"))?;
        debug!(ostype = %name, size, "Added icns entry");
    }

    let mut out_file = BufWriter::new(File::create(out_dir.join(ICNS_FILE))?);
    family.write(&mut out_file)?;
    out_file.flush()?;

    println!("  ✓ Generated {ICNS_FILE}");
    Ok(())
}

fn write_manifest(out_dir: &Path, manifest: &BundleManifest) -> Result<()> {
    let json =
        serde_json::to_string_pretty(manifest).context("Failed to serialize bundle.json")?;
    std::fs::write(out_dir.join(MANIFEST_FILE), json).context("Failed to write bundle.json")?;

    println!("  ✓ Generated {MANIFEST_FILE}");
    Ok(())
}

// Best-compression PNG for the bundle files and embedded frames
fn write_png<W: Write>(image_data: &[u8], w: W, size: u32) -> Result<()> {
    let encoder = PngEncoder::new_with_quality(w, CompressionType::Best, PngFilterType::Adaptive);
    encoder.write_image(image_data, size, size, ColorType::Rgba8)?;
    Ok(())
}
