//! Dense 3D intensity volume indexed by `(row, col, energy slice)`.

use ndarray::{s, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Native width of the samples a volume was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SampleDepth {
    /// 8-bit samples.
    U8,
    /// 16-bit samples.
    #[default]
    U16,
}

impl SampleDepth {
    /// Maps a bit count to a sample depth. Only 8 and 16 are supported.
    #[must_use]
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            8 => Some(Self::U8),
            16 => Some(Self::U16),
            _ => None,
        }
    }

    /// Bits per sample.
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            Self::U8 => 8,
            Self::U16 => 16,
        }
    }

    /// Bytes per sample.
    #[must_use]
    pub fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
        }
    }

    /// Number of representable sample values (`2^bits`).
    #[must_use]
    pub fn domain_size(self) -> usize {
        1usize << self.bits()
    }
}

impl std::fmt::Display for SampleDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// A stack of frames, one per energy step.
///
/// Samples are stored widened to `u16` in row-major `(H, W, D)` order, so a
/// pixel's spectrum is contiguous in memory. The native width is kept in
/// [`SampleDepth`] for display mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: Array3<u16>,
    sample_depth: SampleDepth,
}

impl Volume {
    /// Wraps an existing `(H, W, D)` array.
    #[must_use]
    pub fn from_array(data: Array3<u16>, sample_depth: SampleDepth) -> Self {
        Self { data, sample_depth }
    }

    /// Stacks equally-sized `(H, W)` frames along a new depth axis, in order.
    ///
    /// # Errors
    /// Returns [`Error::InvalidVolume`] if `frames` is empty or the frame
    /// shapes differ.
    pub fn from_frames(frames: &[Array2<u16>], sample_depth: SampleDepth) -> Result<Self> {
        let Some(first) = frames.first() else {
            return Err(Error::InvalidVolume("no frames to stack".to_string()));
        };
        if let Some((idx, bad)) = frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.dim() != first.dim())
        {
            return Err(Error::InvalidVolume(format!(
                "frame {idx} has shape {:?}, expected {:?}",
                bad.dim(),
                first.dim()
            )));
        }

        let views: Vec<ArrayView2<'_, u16>> = frames.iter().map(Array2::view).collect();
        let data = ndarray::stack(Axis(2), &views)
            .map_err(|e| Error::InvalidVolume(e.to_string()))?;
        Ok(Self { data, sample_depth })
    }

    /// Volume of the given shape with every sample set to `value`.
    #[must_use]
    pub fn filled(height: usize, width: usize, depth: usize, value: u16) -> Self {
        Self {
            data: Array3::from_elem((height, width, depth), value),
            sample_depth: SampleDepth::U16,
        }
    }

    /// Number of rows (H).
    #[must_use]
    #[inline]
    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    /// Number of columns (W).
    #[must_use]
    #[inline]
    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    /// Number of energy slices (D).
    #[must_use]
    #[inline]
    pub fn depth(&self) -> usize {
        self.data.dim().2
    }

    /// `(H, W, D)`.
    #[must_use]
    #[inline]
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Native sample width.
    #[must_use]
    #[inline]
    pub fn sample_depth(&self) -> SampleDepth {
        self.sample_depth
    }

    /// Read-only view of the whole array.
    #[must_use]
    pub fn view(&self) -> ArrayView3<'_, u16> {
        self.data.view()
    }

    /// Sample at `(row, col, k)`, or `None` when out of bounds.
    #[must_use]
    #[inline]
    pub fn get(&self, row: usize, col: usize, k: usize) -> Option<u16> {
        self.data.get((row, col, k)).copied()
    }

    /// Fails with [`Error::PixelOutOfBounds`] unless `(row, col)` is inside the frame.
    ///
    /// # Errors
    /// See above.
    pub fn check_pixel(&self, row: usize, col: usize) -> Result<()> {
        if row < self.height() && col < self.width() {
            Ok(())
        } else {
            Err(Error::PixelOutOfBounds {
                row,
                col,
                height: self.height(),
                width: self.width(),
            })
        }
    }

    /// Depth slice `k` as an `(H, W)` view.
    ///
    /// # Errors
    /// Returns [`Error::FrameOutOfRange`] if `k >= depth`.
    pub fn frame(&self, k: usize) -> Result<ArrayView2<'_, u16>> {
        if k >= self.depth() {
            return Err(Error::FrameOutOfRange {
                index: k,
                depth: self.depth(),
            });
        }
        Ok(self.data.index_axis(Axis(2), k))
    }

    /// Raw intensity-vs-energy curve of one pixel.
    ///
    /// # Errors
    /// Returns [`Error::PixelOutOfBounds`] for coordinates outside the frame.
    pub fn spectrum(&self, row: usize, col: usize) -> Result<ArrayView1<'_, u16>> {
        self.check_pixel(row, col)?;
        Ok(self.data.slice(s![row, col, ..]))
    }

    /// Owned sub-volume between two inclusive `(row, col)` corners.
    ///
    /// # Errors
    /// Returns [`Error::PixelOutOfBounds`] if a corner lies outside the frame,
    /// or [`Error::InvalidVolume`] if the corners are not ordered.
    pub fn crop(&self, top_left: (usize, usize), bottom_right: (usize, usize)) -> Result<Self> {
        self.check_pixel(top_left.0, top_left.1)?;
        self.check_pixel(bottom_right.0, bottom_right.1)?;
        if top_left.0 > bottom_right.0 || top_left.1 > bottom_right.1 {
            return Err(Error::InvalidVolume(format!(
                "crop corners {top_left:?} and {bottom_right:?} are not ordered"
            )));
        }
        let data = self
            .data
            .slice(s![
                top_left.0..=bottom_right.0,
                top_left.1..=bottom_right.1,
                ..
            ])
            .to_owned();
        Ok(Self {
            data,
            sample_depth: self.sample_depth,
        })
    }
}
