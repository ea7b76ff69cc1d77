use lcars_icon::{generate::DEFAULT_OUTPUT, inspect};

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    let bytes = std::fs::read(&path)?;

    println!("Checking chunks in: {}", path);
    for chunk in inspect::chunks(&bytes)? {
        let status = if chunk.crc_matches() { "ok" } else { "BAD CRC" };
        println!(
            "  {} {:>8} bytes  crc {:#010x}  {}",
            chunk.tag_str(),
            chunk.data.len(),
            chunk.crc,
            status
        );
    }

    let report = match inspect::verify(&bytes) {
        Ok(report) => report,
        Err(e) => {
            println!("⚠ PNG structure is invalid");
            return Err(e.context(format!("{path} failed verification")));
        }
    };

    println!("\nImage dimensions: {}x{}", report.width, report.height);
    println!(
        "Scanlines: {} bytes inflated from {} bytes",
        report.raw_len, report.compressed_len
    );
    println!("✓ PNG structure is valid");
    Ok(())
}
