use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiffwalk::decoder::{Decoder, Options};
use tiffwalk::walk::{Needle, Walker};
use tiffwalk::TiffResult;

/// Walk all the directories in a TIFF file (DNG, ORF, RW2, ...) looking for a value.
///
/// Prints one line per matching tag: the path of directories leading to it, then the tag.
#[derive(Parser, Debug)]
#[command(name = "tiffwalk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File to search
    file: PathBuf,

    /// Integer to find in numeric tags, or text to find in ASCII and UNDEFINED tags
    value: String,

    /// Treat VALUE as text even if it parses as an integer
    #[arg(long, default_value_t = false)]
    text: bool,

    /// Only accept standard TIFF headers, not the ORF and RW2 variants
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Maximum number of nested directory pointers to follow
    #[arg(long)]
    max_nested: Option<usize>,
}

impl Cli {
    fn needle(&self) -> Needle {
        match self.value.parse::<i64>() {
            Ok(n) if !self.text => Needle::Integer(n),
            _ => Needle::from(self.value.as_str()),
        }
    }

    fn options(&self) -> Options {
        let mut options = Options {
            allow_variants: !self.strict,
            ..Options::default()
        };
        if let Some(max) = self.max_nested {
            options.limits.nested_directories = max;
        }
        options
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {}", cli.file.display(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> TiffResult<()> {
    let file = File::open(&cli.file)?;
    let mut decoder = Decoder::with_options(BufReader::new(file), cli.options())?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut write_err = None;

    Walker::new(&mut decoder).search(&cli.needle(), |found| {
        if write_err.is_none() {
            write_err = writeln!(out, "{}", found).err();
        }
    })?;

    match write_err {
        Some(err) => Err(err.into()),
        None => Ok(out.flush()?),
    }
}

/// Diagnostics go to stderr so they never mix with matches.
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiffwalk=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
