use anyhow::Result;
use clap::Parser;
use lcars_icon::generate;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[clap(
    name = "lcars-icon",
    about = "Render the LCARS app icon as a 1024x1024 PNG"
)]
struct Cli {
    /// Where to write the icon. An existing file is replaced.
    #[clap(short, long, value_name = "FILE", default_value = generate::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Also write the desktop bundle icons (PNG sizes, .ico, .icns, bundle.json) into DIR
    #[clap(long, value_name = "DIR")]
    icons: Option<PathBuf>,

    /// Read the written PNG back and check its chunks and image data
    #[clap(long)]
    verify: bool,

    /// Log debug output to stderr
    #[clap(short, long)]
    verbose: bool,
}

impl From<Cli> for generate::Args {
    fn from(cli: Cli) -> Self {
        Self {
            output: cli.output,
            icons: cli.icons,
            verify: cli.verify,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    generate::generate(cli.into())
}
