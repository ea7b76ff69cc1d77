//! Minimal PNG writer for 8-bit RGBA images
//!
//! Pixels are pulled from a closure row by row into an unfiltered scanline
//! buffer, compressed as one zlib stream and framed as `IHDR`, `IDAT`, `IEND`.

use anyhow::{bail, Context, Result};
use flate2::{write::ZlibEncoder, Compression, Crc};
use image::Rgba;
use std::{fs, io::Write, path::Path};
use tempfile::NamedTempFile;
use tracing::debug;

/// The 8 bytes every PNG data stream starts with.
pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

pub const IHDR: &[u8; 4] = b"IHDR";
pub const IDAT: &[u8; 4] = b"IDAT";
pub const IEND: &[u8; 4] = b"IEND";

/// Bytes per RGBA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

const BIT_DEPTH: u8 = 8;
const COLOR_TYPE_RGBA: u8 = 6;
const FILTER_NONE: u8 = 0;

/// Largest width or height a PNG may declare.
pub const MAX_DIMENSION: u32 = (1 << 31) - 1;

/// Image header fields written into `IHDR`
///
/// Only [`Header::new`] builds one, so the scanline size math below never
/// overflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    width: u32,
    height: u32,
}

impl Header {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("Image dimensions must be positive, got {width}x{height}");
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            bail!("Image dimensions {width}x{height} exceed the PNG limit of {MAX_DIMENSION}");
        }
        if checked_raw_len(width, height).is_none() {
            bail!("Image dimensions {width}x{height} are too large for this platform");
        }
        Ok(Self { width, height })
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }

    /// The 13-byte `IHDR` payload: size, depth 8, RGBA, default methods
    pub fn to_bytes(self) -> [u8; 13] {
        let mut out = [0u8; 13];
        out[0..4].copy_from_slice(&self.width.to_be_bytes());
        out[4..8].copy_from_slice(&self.height.to_be_bytes());
        out[8] = BIT_DEPTH;
        out[9] = COLOR_TYPE_RGBA;
        // compression, filter and interlace methods stay 0
        out
    }

    /// Length of one scanline including its filter byte
    pub fn stride(self) -> usize {
        1 + self.width as usize * BYTES_PER_PIXEL
    }

    /// Exact length of the unfiltered scanline buffer
    pub fn raw_len(self) -> usize {
        self.height as usize * self.stride()
    }
}

fn checked_raw_len(width: u32, height: u32) -> Option<usize> {
    usize::try_from(width)
        .ok()?
        .checked_mul(BYTES_PER_PIXEL)?
        .checked_add(1)?
        .checked_mul(usize::try_from(height).ok()?)
}

/// Builds the unfiltered scanline buffer, calling `pixel` once per pixel
pub fn raw_scanlines<F>(header: Header, pixel: F) -> Vec<u8>
where
    F: Fn(u32, u32) -> Rgba<u8>,
{
    let mut raw = Vec::with_capacity(header.raw_len());
    for y in 0..header.height {
        raw.push(FILTER_NONE);
        for x in 0..header.width {
            raw.extend_from_slice(&pixel(x, y).0);
        }
    }
    raw
}

/// CRC-32 of a chunk, computed over its tag followed by its payload
pub fn chunk_crc(tag: &[u8; 4], data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(tag);
    crc.update(data);
    crc.sum()
}

/// Appends one length-prefixed, checksummed chunk
pub fn write_chunk<W: Write>(w: &mut W, tag: &[u8; 4], data: &[u8]) -> Result<()> {
    let len = u32::try_from(data.len())
        .with_context(|| format!("{} chunk too large", String::from_utf8_lossy(tag)))?;
    w.write_all(&len.to_be_bytes())?;
    w.write_all(tag)?;
    w.write_all(data)?;
    w.write_all(&chunk_crc(tag, data).to_be_bytes())?;
    Ok(())
}

/// zlib-compresses the scanline buffer at the default level
pub fn compress(raw: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw).context("Failed to compress scanlines")?;
    encoder.finish().context("Failed to finish zlib stream")
}

/// Encodes a `width` x `height` RGBA image whose pixels come from `pixel`
pub fn encode<F>(width: u32, height: u32, pixel: F) -> Result<Vec<u8>>
where
    F: Fn(u32, u32) -> Rgba<u8>,
{
    let header = Header::new(width, height)?;

    let raw = raw_scanlines(header, pixel);
    let compressed = compress(&raw)?;
    debug!(
        raw = raw.len(),
        compressed = compressed.len(),
        "Compressed {width}x{height} scanlines"
    );

    // signature + three chunks of 12 framing bytes each
    let mut out = Vec::with_capacity(SIGNATURE.len() + 3 * 12 + 13 + compressed.len());
    out.extend_from_slice(&SIGNATURE);
    write_chunk(&mut out, IHDR, &header.to_bytes())?;
    write_chunk(&mut out, IDAT, &compressed)?;
    write_chunk(&mut out, IEND, &[])?;
    Ok(out)
}

/// Writes `bytes` to `path`, replacing any existing file
///
/// The data goes to a temporary file next to `path` first and is renamed
/// into place, so a failed write never leaves a truncated file behind.
pub fn save(bytes: &[u8], path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("Can't create output directory {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir).context("Failed to create temporary file")?;
    tmp.write_all(bytes).context("Failed to write PNG")?;
    tmp.as_file().sync_all().context("Failed to flush PNG")?;
    // dropping the PersistError removes the temporary file
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to move PNG into place at {}", path.display()))?;

    debug!(path = %path.display(), bytes = bytes.len(), "Saved PNG");
    Ok(())
}
