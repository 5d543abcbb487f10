use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::utils::Error;

/// Size of the width/height prefix of a QIF file.
pub const HEADER_LEN: u64 = 8;

/// Bytes per pixel, both on disk and in a [PixelGrid].
pub const CHANNELS: usize = 3;

/// Most pixel storage reserved before any pixel bytes arrive. Past this the buffer grows with the
/// bytes actually present in the source.
const MAX_PREALLOC: u64 = 1 << 24;

/// Byte order of the two header integers. Pixel bytes are unaffected.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

impl Endianness {
    pub fn from_big_endian(big_endian: bool) -> Self {
        if big_endian {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

impl Display for Endianness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let val = match self {
            Endianness::Little => "little endian",
            Endianness::Big => "big endian",
        };
        f.write_str(val)
    }
}

/// The header that appears as the first 8 bytes of a QIF image. There is no magic number, so any
/// 8 bytes parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub width: u32,
    pub height: u32,
}

impl Header {
    pub fn from_bytes(data: &[u8; 8], endianness: Endianness) -> Self {
        let (width, height) = data.split_at(4);
        match endianness {
            Endianness::Little => Header {
                width: LittleEndian::read_u32(width),
                height: LittleEndian::read_u32(height),
            },
            Endianness::Big => Header {
                width: BigEndian::read_u32(width),
                height: BigEndian::read_u32(height),
            },
        }
    }

    pub fn num_pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Number of pixel bytes following the header, or `None` if that doesn't fit in a u64.
    pub fn data_len(&self) -> Option<u64> {
        self.num_pixels().checked_mul(CHANNELS as u64)
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format!("Width: {}, Height: {}", self.width, self.height))
    }
}

/// A pixel with RGB values.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Pixel { r, g, b }
    }

    /// Builds a pixel from one on-disk triple.
    pub fn from_bgr(bytes: [u8; 3]) -> Self {
        Pixel::new(bytes[2], bytes[1], bytes[0])
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl Display for Pixel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format!("r:{}, g:{}, b:{}", self.r, self.g, self.b))
    }
}

/// A decoded image: `height` rows of `width` pixels, each pixel 3 bytes in R, G, B order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelGrid {
    /// Wraps an RGB buffer. Returns `None` if `data` is not exactly `width * height * 3` bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let len = (width as u64 * height as u64).checked_mul(CHANNELS as u64)?;
        if data.len() as u64 != len {
            return None;
        }
        Some(PixelGrid {
            width,
            height,
            data,
        })
    }

    /// Reorders a buffer of on-disk BGR triples into RGB, in place.
    fn from_bgr(header: Header, mut data: Vec<u8>) -> Self {
        for px in data.chunks_exact_mut(CHANNELS) {
            let rgb = Pixel::from_bgr([px[0], px[1], px[2]]).to_bytes();
            px.copy_from_slice(&rgb);
        }
        PixelGrid {
            width: header.width,
            height: header.height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * CHANNELS)
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Pixel> {
        let i = self.offset(x, y)?;
        Some(Pixel::new(self.data[i], self.data[i + 1], self.data[i + 2]))
    }

    /// Channel 0 is R, 1 is G, 2 is B.
    pub fn get_channel(&self, x: u32, y: u32, channel: usize) -> Option<u8> {
        if channel >= CHANNELS {
            return None;
        }
        self.offset(x, y).map(|i| self.data[i + channel])
    }

    /// Each row as a slice of `width * 3` RGB bytes, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let stride = self.width as usize * CHANNELS;
        (0..self.height as usize).map(move |y| &self.data[y * stride..(y + 1) * stride])
    }

    pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        self.data
            .chunks_exact(CHANNELS)
            .map(|px| Pixel::new(px[0], px[1], px[2]))
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

/// Configuration for a [Decoder].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub endianness: Endianness,
    /// Largest `width * height` accepted. `None` accepts any size.
    pub max_pixels: Option<u64>,
}

/// A decoder for QIF images.
///
/// Holds only configuration. Every call to [decode][Decoder::decode] is independent, so one
/// decoder can be shared between threads.
#[derive(Debug, Default, Clone)]
pub struct Decoder {
    options: DecodeOptions,
}

impl Decoder {
    /// Creates a decoder with no size limit.
    pub fn new(endianness: Endianness) -> Self {
        Self::with_options(DecodeOptions {
            endianness,
            ..Default::default()
        })
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decodes a QIF image from a readable object.
    ///
    /// Assumes to start at the beginning, before the header. Reads at most
    /// `8 + width * height * 3` bytes; anything after that is left in the reader.
    pub fn decode<T>(&self, data: &mut T) -> Result<(Header, PixelGrid), Error>
    where
        T: Read,
    {
        let mut buf = [0u8; 8];
        let read = read_full(data, &mut buf)?;
        if read < buf.len() {
            return Err(Error::TruncatedHeader {
                offset: read as u64,
                expected: HEADER_LEN,
            });
        }

        let header = Header::from_bytes(&buf, self.options.endianness);
        log::debug!(target: "qif", "header ({}): {}", self.options.endianness, header);

        if let Some(max) = self.options.max_pixels {
            if header.num_pixels() > max {
                return Err(Error::ImageTooLarge {
                    width: header.width,
                    height: header.height,
                    limit: max,
                });
            }
        }

        // A length past u64 can never be supplied, so it ends as truncated pixel data.
        let data_len = header.data_len().unwrap_or(u64::MAX);

        let mut pixels = Vec::with_capacity(data_len.min(MAX_PREALLOC) as usize);
        data.by_ref()
            .take(data_len)
            .read_to_end(&mut pixels)
            .map_err(|e| Error::InvalidSource {
                path: None,
                source: e,
            })?;
        log::trace!(target: "qif", "read {} of {} pixel bytes", pixels.len(), data_len);

        if (pixels.len() as u64) < data_len {
            return Err(Error::TruncatedPixelData {
                offset: HEADER_LEN + pixels.len() as u64,
                expected: HEADER_LEN.saturating_add(data_len),
            });
        }

        Ok((header, PixelGrid::from_bgr(header, pixels)))
    }
}

/// Opens and decodes the QIF file at `path`. The file is closed before this returns.
pub fn decode_file<P>(path: P, decoder: &Decoder) -> Result<(Header, PixelGrid), Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let with_path = |e: Error| match e {
        Error::InvalidSource { path: None, source } => Error::InvalidSource {
            path: Some(path.to_path_buf()),
            source,
        },
        e => e,
    };

    let file = File::open(path).map_err(|e| Error::InvalidSource {
        path: Some(path.to_path_buf()),
        source: e,
    })?;
    log::info!(target: "qif", "decoding {}", path.display());

    let mut file = BufReader::new(file);
    decoder.decode(&mut file).map_err(with_path)
}

/// Fills as much of `buf` as the reader can provide. Returns how many bytes were read; less than
/// `buf.len()` only at end of stream.
fn read_full<T: Read>(data: &mut T, buf: &mut [u8]) -> Result<usize, Error> {
    let mut filled = 0;
    while filled < buf.len() {
        match data.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                return Err(Error::InvalidSource {
                    path: None,
                    source: e,
                })
            }
        }
    }
    Ok(filled)
}
