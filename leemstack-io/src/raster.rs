//! Raster image frames decoded through the `image` crate.

use std::path::Path;

use image::{DynamicImage, ImageReader};
use ndarray::Array2;

use leemstack_core::SampleDepth;

use crate::{IngestError, Result};

/// A decoded grayscale frame and the sample width it was stored with.
#[derive(Debug, Clone)]
pub struct RasterFrame {
    /// Intensities widened to `u16`.
    pub samples: Array2<u16>,
    /// Native sample width.
    pub sample_depth: SampleDepth,
}

/// Converts a decoded image to a grayscale frame.
///
/// 16-bit images keep their 16-bit samples; everything else is reduced to
/// 8-bit luma. Colour images go through the decoder's luma transform.
///
/// # Errors
/// [`IngestError::SampleCount`] if the converted buffer does not match the
/// image dimensions.
pub fn to_frame(path: &Path, img: DynamicImage) -> Result<RasterFrame> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let (raw, sample_depth): (Vec<u16>, SampleDepth) = match img {
        DynamicImage::ImageLuma16(buf) => (buf.into_raw(), SampleDepth::U16),
        DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => (img.to_luma16().into_raw(), SampleDepth::U16),
        DynamicImage::ImageLuma8(buf) => (
            buf.into_raw().into_iter().map(u16::from).collect(),
            SampleDepth::U8,
        ),
        other => (
            other.to_luma8().into_raw().into_iter().map(u16::from).collect(),
            SampleDepth::U8,
        ),
    };
    frame_from_samples(path, (height, width), raw, sample_depth)
}

/// Shapes a row-major sample buffer into an `(H, W)` frame.
///
/// # Errors
/// [`IngestError::SampleCount`] unless `raw` holds exactly `H * W` samples.
pub fn frame_from_samples(
    path: &Path,
    dim: (usize, usize),
    raw: Vec<u16>,
    sample_depth: SampleDepth,
) -> Result<RasterFrame> {
    let found = raw.len();
    let samples = Array2::from_shape_vec(dim, raw).map_err(|_| IngestError::SampleCount {
        path: path.to_path_buf(),
        dim,
        expected: dim.0.saturating_mul(dim.1),
        found,
    })?;
    Ok(RasterFrame {
        samples,
        sample_depth,
    })
}

/// Decodes one image file into a grayscale frame.
///
/// # Errors
/// [`IngestError::Io`] when the file cannot be opened, [`IngestError::Decode`]
/// when its contents are not a supported image.
pub fn read_frame(path: &Path, swap_bytes: bool) -> Result<RasterFrame> {
    let reader = ImageReader::open(path)
        .map_err(|e| IngestError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| IngestError::io(path, e))?;
    let img = reader.decode().map_err(|source| IngestError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let mut frame = to_frame(path, img)?;
    if swap_bytes && frame.sample_depth == SampleDepth::U16 {
        frame.samples.mapv_inplace(u16::swap_bytes);
    }
    Ok(frame)
}
