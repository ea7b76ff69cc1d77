//! Reads a PNG written by [`crate::png`] back and checks its structure

use crate::png::{chunk_crc, Header, IDAT, IEND, IHDR, SIGNATURE};
use anyhow::{bail, ensure, Context, Result};
use flate2::read::ZlibDecoder;
use std::io::Read;

/// A chunk borrowed from a PNG byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub tag: [u8; 4],
    pub data: &'a [u8],
    pub crc: u32,
}

impl Chunk<'_> {
    /// Whether the stored CRC matches the one recomputed over tag and payload
    pub fn crc_matches(&self) -> bool {
        chunk_crc(&self.tag, self.data) == self.crc
    }

    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }
}

/// Summary of a verified PNG
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub tags: Vec<String>,
    pub compressed_len: usize,
    pub raw_len: usize,
}

/// Splits a PNG data stream into its chunks
pub fn chunks(bytes: &[u8]) -> Result<Vec<Chunk<'_>>> {
    ensure!(
        bytes.len() >= SIGNATURE.len() && bytes[..SIGNATURE.len()] == SIGNATURE,
        "Not a PNG: bad signature"
    );

    let mut rest = &bytes[SIGNATURE.len()..];
    let mut out = Vec::new();
    while !rest.is_empty() {
        if rest.len() < 12 {
            bail!("Truncated chunk header: {} trailing bytes", rest.len());
        }
        let len = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        let tag = [rest[4], rest[5], rest[6], rest[7]];
        let end = 8 + len;
        if rest.len() < end + 4 {
            bail!(
                "Truncated {} chunk: needs {} bytes, {} left",
                String::from_utf8_lossy(&tag),
                end + 4,
                rest.len()
            );
        }
        let crc = u32::from_be_bytes([rest[end], rest[end + 1], rest[end + 2], rest[end + 3]]);
        out.push(Chunk {
            tag,
            data: &rest[8..end],
            crc,
        });
        rest = &rest[end + 4..];
    }
    Ok(out)
}

fn parse_header(chunk: &Chunk<'_>) -> Result<(Header, u8, u8)> {
    ensure!(
        chunk.data.len() == 13,
        "IHDR must be 13 bytes, got {}",
        chunk.data.len()
    );
    let d = chunk.data;
    let width = u32::from_be_bytes([d[0], d[1], d[2], d[3]]);
    let height = u32::from_be_bytes([d[4], d[5], d[6], d[7]]);
    let header = Header::new(width, height)?;
    ensure!(
        d[10..13] == [0u8; 3],
        "Unsupported compression/filter/interlace methods {:?}",
        &d[10..13]
    );
    Ok((header, d[8], d[9]))
}

/// Upper bound on how far deflate can expand its input.
const MAX_DEFLATE_RATIO: usize = 1032;

/// Inflates at most `expected + 1` bytes so an oversized stream is caught
/// without reading all of it
fn inflate(compressed: &[u8], expected: usize) -> Result<Vec<u8>> {
    let capacity = expected.min(compressed.len().saturating_mul(MAX_DEFLATE_RATIO));
    let mut raw = Vec::with_capacity(capacity);
    ZlibDecoder::new(compressed)
        .take(expected as u64 + 1)
        .read_to_end(&mut raw)
        .context("Failed to inflate IDAT stream")?;
    ensure!(
        raw.len() <= expected,
        "Scanline buffer is longer than the {expected} bytes the header allows"
    );
    Ok(raw)
}

/// Inflates the image data of `bytes` back into the scanline buffer
pub fn decode_scanlines(bytes: &[u8]) -> Result<Vec<u8>> {
    let chunks = chunks(bytes)?;
    let first = chunks.first().context("PNG has no chunks")?;
    ensure!(&first.tag == IHDR, "First chunk must be IHDR");
    let (header, _, _) = parse_header(first)?;

    let compressed: Vec<u8> = chunks
        .iter()
        .filter(|c| &c.tag == IDAT)
        .flat_map(|c| c.data.iter().copied())
        .collect();
    inflate(&compressed, header.raw_len())
}

/// Checks chunk order, checksums, header fields and the scanline buffer
pub fn verify(bytes: &[u8]) -> Result<Report> {
    let chunks = chunks(bytes)?;

    for chunk in &chunks {
        ensure!(
            chunk.crc_matches(),
            "CRC mismatch in {} chunk: stored {:#010x}, computed {:#010x}",
            chunk.tag_str(),
            chunk.crc,
            chunk_crc(&chunk.tag, chunk.data)
        );
    }

    let (first, last) = match (chunks.first(), chunks.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => bail!("PNG has no chunks"),
    };
    ensure!(&first.tag == IHDR, "First chunk must be IHDR, got {}", first.tag_str());
    ensure!(&last.tag == IEND, "Last chunk must be IEND, got {}", last.tag_str());
    ensure!(last.data.is_empty(), "IEND must be empty");

    let (header, bit_depth, color_type) = parse_header(first)?;
    ensure!(bit_depth == 8, "Expected bit depth 8, got {bit_depth}");
    ensure!(color_type == 6, "Expected RGBA color type 6, got {color_type}");

    let compressed: Vec<u8> = chunks
        .iter()
        .filter(|c| &c.tag == IDAT)
        .flat_map(|c| c.data.iter().copied())
        .collect();
    ensure!(!compressed.is_empty(), "PNG has no IDAT data");

    let raw = inflate(&compressed, header.raw_len())?;
    ensure!(
        raw.len() == header.raw_len(),
        "Scanline buffer is {} bytes, expected {}",
        raw.len(),
        header.raw_len()
    );
    if let Some(row) = raw
        .chunks(header.stride())
        .position(|row| row[0] != 0)
    {
        bail!("Row {row} uses a filter other than None");
    }

    Ok(Report {
        width: header.width(),
        height: header.height(),
        bit_depth,
        color_type,
        tags: chunks.iter().map(Chunk::tag_str).collect(),
        compressed_len: compressed.len(),
        raw_len: raw.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::png::{compress, encode, raw_scanlines, write_chunk, MAX_DIMENSION};
    use image::Rgba;

    /// PNG with a hand-written IHDR payload and `raw` as the image data
    fn assemble(ihdr: &[u8], raw: &[u8]) -> Vec<u8> {
        let mut png = SIGNATURE.to_vec();
        write_chunk(&mut png, IHDR, ihdr).unwrap();
        write_chunk(&mut png, IDAT, &compress(raw).unwrap()).unwrap();
        write_chunk(&mut png, IEND, &[]).unwrap();
        png
    }

    fn ihdr(width: u32, height: u32) -> Vec<u8> {
        let mut data = Vec::with_capacity(13);
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[8, 6, 0, 0, 0]);
        data
    }

    fn gradient(x: u32, y: u32) -> Rgba<u8> {
        Rgba([x as u8, y as u8, (x ^ y) as u8, 255])
    }

    #[test]
    fn test_chunks_in_order_with_valid_crcs() {
        let png = encode(8, 6, gradient).unwrap();
        let chunks = chunks(&png).unwrap();

        let tags: Vec<_> = chunks.iter().map(Chunk::tag_str).collect();
        assert_eq!(tags, ["IHDR", "IDAT", "IEND"]);
        assert!(chunks.iter().all(Chunk::crc_matches));
        assert_eq!(chunks[0].data.len(), 13);
        assert!(chunks[2].data.is_empty());
    }

    #[test]
    fn test_round_trip_scanlines() {
        let png = encode(8, 6, gradient).unwrap();
        let expected = raw_scanlines(Header::new(8, 6).unwrap(), gradient);

        let raw = decode_scanlines(&png).unwrap();
        assert_eq!(raw.len(), 6 * (1 + 8 * 4));
        assert_eq!(raw, expected);
    }

    #[test]
    fn test_verify_report() {
        let png = encode(8, 6, gradient).unwrap();
        let report = verify(&png).unwrap();

        assert_eq!(report.width, 8);
        assert_eq!(report.height, 6);
        assert_eq!(report.bit_depth, 8);
        assert_eq!(report.color_type, 6);
        assert_eq!(report.tags, ["IHDR", "IDAT", "IEND"]);
        assert_eq!(report.raw_len, 198);
    }

    #[test]
    fn test_bad_signature_rejected() {
        let mut png = encode(2, 2, gradient).unwrap();
        png[1] = b'X';
        assert!(chunks(&png).is_err());
        assert!(verify(b"PNG").is_err());
    }

    #[test]
    fn test_corrupted_payload_fails_crc() {
        let mut png = encode(2, 2, gradient).unwrap();
        // first width byte of IHDR
        png[16] ^= 0xff;

        let chunks = chunks(&png).unwrap();
        assert!(!chunks[0].crc_matches());
        let err = verify(&png).unwrap_err();
        assert!(err.to_string().contains("CRC mismatch in IHDR"));
    }

    #[test]
    fn test_truncated_stream_rejected() {
        let png = encode(2, 2, gradient).unwrap();
        let err = chunks(&png[..png.len() - 3]).unwrap_err();
        assert!(err.to_string().contains("Truncated"));
    }

    #[test]
    fn test_missing_iend_rejected() {
        let png = encode(2, 2, gradient).unwrap();
        let err = verify(&png[..png.len() - 12]).unwrap_err();
        assert!(err.to_string().contains("Last chunk must be IEND"));
    }

    #[test]
    fn test_huge_header_is_an_error() {
        let png = assemble(&ihdr(u32::MAX, u32::MAX), &[0; 16]);

        assert!(chunks(&png).unwrap().iter().all(Chunk::crc_matches));
        assert!(verify(&png).is_err());
        assert!(decode_scanlines(&png).is_err());
    }

    #[test]
    fn test_large_header_with_short_data_is_an_error() {
        // valid PNG limits, far more pixels than the IDAT holds
        let png = assemble(&ihdr(MAX_DIMENSION, 1), &[0; 16]);

        assert!(verify(&png).is_err());
    }

    #[test]
    fn test_image_data_longer_than_header_is_an_error() {
        let raw = raw_scanlines(Header::new(4, 4).unwrap(), gradient);
        let png = assemble(&ihdr(2, 2), &raw);

        let err = verify(&png).unwrap_err();
        assert!(err.to_string().contains("longer than the 18 bytes"), "{err:#}");
        assert!(decode_scanlines(&png).is_err());
    }
}
