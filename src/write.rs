use std::path::Path;

use image::error::{ParameterError, ParameterErrorKind};
use image::{ImageBuffer, ImageError, Rgb, RgbImage};

use crate::dec::PixelGrid;
use crate::utils::Error;

fn dimension_mismatch() -> ImageError {
    ImageError::Parameter(ParameterError::from_kind(
        ParameterErrorKind::DimensionMismatch,
    ))
}

impl PixelGrid {
    /// Borrows the grid as an `image` buffer.
    pub fn as_rgb_image(&self) -> Result<ImageBuffer<Rgb<u8>, &[u8]>, ImageError> {
        ImageBuffer::from_raw(self.width(), self.height(), self.as_raw())
            .ok_or_else(dimension_mismatch)
    }

    /// Moves the grid into an [RgbImage] without copying.
    pub fn into_rgb_image(self) -> Result<RgbImage, ImageError> {
        let (width, height) = (self.width(), self.height());
        RgbImage::from_raw(width, height, self.into_raw()).ok_or_else(dimension_mismatch)
    }
}

/// Writes `grid` to `path` as 8-bit RGB. The `image` crate picks the format from the extension.
pub fn save_grid<P>(grid: &PixelGrid, path: P) -> Result<(), Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    log::info!(
        target: "qif",
        "writing {}x{} image to {}",
        grid.width(),
        grid.height(),
        path.display()
    );

    grid.as_rgb_image()
        .and_then(|img| img.save(path))
        .map_err(|e| Error::WriteFailure {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> PixelGrid {
        // 2x2: red, green / blue, white
        let data = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
        PixelGrid::new(2, 2, data).unwrap()
    }

    #[test]
    fn test_into_rgb_image() {
        let img = grid().into_rgb_image().unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(1, 0).0, [0, 255, 0]);
        assert_eq!(img.get_pixel(0, 1).0, [0, 0, 255]);
    }

    #[test]
    fn test_as_rgb_image() {
        let grid = grid();
        let img = grid.as_rgb_image().unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(1, 1).0, [255, 255, 255]);
        assert_eq!(&**img.as_raw(), grid.as_raw());
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");

        save_grid(&grid(), &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.into_raw(), grid().into_raw());
    }

    #[test]
    fn test_save_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.notaformat");

        let err = save_grid(&grid(), &path).unwrap_err();
        assert_eq!(err.stage(), "write");
        assert!(matches!(err, Error::WriteFailure { .. }));
    }
}
