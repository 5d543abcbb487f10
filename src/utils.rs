use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to parse header: truncated at byte {offset}, expected {expected} bytes")]
    TruncatedHeader { offset: u64, expected: u64 },
    #[error("Failed to read pixel data: truncated at byte {offset}, expected {expected} bytes")]
    TruncatedPixelData { offset: u64, expected: u64 },
    #[error("Failed to read {}: {source}", display_source(.path))]
    InvalidSource {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },
    #[error("Image of {width}x{height} pixels exceeds the limit of {limit} pixels")]
    ImageTooLarge { width: u32, height: u32, limit: u64 },
    #[error("Failed to write {}: {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

fn display_source(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "input".to_string(),
    }
}

impl Error {
    /// The stage of a conversion that produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::TruncatedHeader { .. } | Error::ImageTooLarge { .. } => "header",
            Error::TruncatedPixelData { .. } => "pixel data",
            Error::InvalidSource { .. } => "read",
            Error::WriteFailure { .. } => "write",
        }
    }
}

/// Convert a .qif image into any format the `image` crate can write.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Input .qif path.
    pub input: PathBuf,
    /// Output image path. The format is chosen from its extension.
    pub output: PathBuf,
    /// Read the header as big endian (default little endian).
    #[arg(long = "be")]
    pub big_endian: bool,
    /// Refuse images with more than this many pixels.
    #[arg(long)]
    pub max_pixels: Option<u64>,
    /// More logging. Repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
