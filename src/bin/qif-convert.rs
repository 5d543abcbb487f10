use std::time::Instant;

use anyhow::Context;
use clap::Parser;

use qif::{decode_file, save_grid, Args, DecodeOptions, Decoder, Endianness};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    log_init(args.log_level())?;

    let decoder = Decoder::with_options(DecodeOptions {
        endianness: Endianness::from_big_endian(args.big_endian),
        max_pixels: args.max_pixels,
    });

    log::debug!("header byte order: {}", decoder.options().endianness);

    let now = Instant::now();
    // Decode fully before touching the output path.
    let (header, grid) = decode_file(&args.input, &decoder)
        .map_err(|e| {
            let stage = e.stage();
            anyhow::Error::new(e).context(format!("{} stage failed", stage))
        })
        .with_context(|| format!("could not decode {}", args.input.display()))?;
    log::info!("decoded {} in {} ms", header, now.elapsed().as_millis());

    save_grid(&grid, &args.output)
        .context("write stage failed")
        .with_context(|| format!("could not write {}", args.output.display()))?;

    Ok(())
}

fn log_init(filter: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    use simplelog::*;
    let term = TermLogger::new(
        filter,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
    CombinedLogger::init(vec![term])
}
