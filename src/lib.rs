//! Decoder for QIF, a raw 3-channel image format: two u32s (width, height) in either byte order,
//! followed by `width * height` pixels stored as B, G, R bytes, row by row.
//!
//! ```no_run
//! use qif::{decode_file, save_grid, Decoder, Endianness};
//!
//! let (_header, grid) = decode_file("render.qif", &Decoder::new(Endianness::Little))?;
//! save_grid(&grid, "render.png")?;
//! # Ok::<(), qif::Error>(())
//! ```

mod dec;
mod utils;
mod write;

pub use dec::{
    decode_file, DecodeOptions, Decoder, Endianness, Header, Pixel, PixelGrid, CHANNELS,
    HEADER_LEN,
};
pub use utils::{Args, Error};
pub use write::save_grid;
