//! Quantization of raw samples to 8-bit display levels.
//!
//! Display mapping produces a new array; the volume it reads from is never
//! modified, so analysis keeps working on the raw intensities.

use ndarray::{Array2, ArrayView2};

use crate::error::RangeError;
use crate::volume::SampleDepth;

/// Largest accepted lower bound (exclusive).
const LOWER_LIMIT: u32 = 65_535;
/// Largest accepted upper bound (exclusive).
const UPPER_LIMIT: u32 = 65_536;

/// Maps raw frames to `u8` through a lookup table spanning the sample domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayRangeMapper {
    sample_depth: SampleDepth,
}

impl DisplayRangeMapper {
    /// Creates a mapper for samples of the given native width.
    #[must_use]
    pub fn new(sample_depth: SampleDepth) -> Self {
        Self { sample_depth }
    }

    /// Validates a `[lower, upper)` display window.
    ///
    /// # Errors
    /// Returns [`RangeError::InvalidRange`] unless
    /// `lower < 65535`, `upper < 65536` and `lower < upper`.
    pub fn validate(lower: u32, upper: u32) -> Result<(), RangeError> {
        if lower < LOWER_LIMIT && upper < UPPER_LIMIT && lower < upper {
            Ok(())
        } else {
            Err(RangeError::InvalidRange { lower, upper })
        }
    }

    /// Builds the lookup table for `[lower, upper)`.
    ///
    /// Entries below `lower` are 0, entries at or above `upper` are 255 and
    /// the span in between is scaled linearly onto `0..255`.
    ///
    /// # Errors
    /// See [`DisplayRangeMapper::validate`].
    pub fn lookup_table(&self, lower: u32, upper: u32) -> Result<Vec<u8>, RangeError> {
        Self::validate(lower, upper)?;
        let span = upper - lower;
        let lut = (0..self.sample_depth.domain_size())
            .map(|v| {
                let v = u32::try_from(v).unwrap_or(u32::MAX);
                if v < lower {
                    0
                } else if v >= upper {
                    u8::MAX
                } else {
                    u8::try_from((v - lower) * 255 / span).unwrap_or(u8::MAX)
                }
            })
            .collect();
        Ok(lut)
    }

    /// Maps `img` to display levels.
    ///
    /// Missing bounds default to the image minimum (`lower`) and maximum
    /// (`upper`). The output has the same shape as `img`.
    ///
    /// # Errors
    /// Returns [`RangeError::InvalidRange`] when the resolved bounds fail
    /// validation, including a flat image whose minimum equals its maximum.
    pub fn map(
        &self,
        img: ArrayView2<'_, u16>,
        lower: Option<u32>,
        upper: Option<u32>,
    ) -> Result<Array2<u8>, RangeError> {
        let lower = lower.unwrap_or_else(|| img.iter().copied().min().map_or(0, u32::from));
        let upper = upper.unwrap_or_else(|| img.iter().copied().max().map_or(0, u32::from));
        let lut = self.lookup_table(lower, upper)?;
        Ok(img.mapv(|v| lut.get(usize::from(v)).copied().unwrap_or(u8::MAX)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fixed_range_mapping() {
        let mapper = DisplayRangeMapper::new(SampleDepth::U16);
        let img = array![[0u16, 50], [100, 200]];
        let out = mapper.map(img.view(), Some(0), Some(100)).unwrap();
        assert_eq!(out[[0, 0]], 0);
        assert_eq!(out[[0, 1]], 127);
        assert_eq!(out[[1, 0]], 255);
        assert_eq!(out[[1, 1]], 255);
    }

    #[test]
    fn test_below_lower_maps_to_zero() {
        let mapper = DisplayRangeMapper::new(SampleDepth::U16);
        let img = array![[5u16, 10, 20]];
        let out = mapper.map(img.view(), Some(10), Some(20)).unwrap();
        assert_eq!(out.as_slice().unwrap(), &[0, 0, 255]);
    }

    #[test]
    fn test_default_bounds_use_image_extremes() {
        let mapper = DisplayRangeMapper::new(SampleDepth::U16);
        let img = array![[1000u16, 2000], [3000, 1500]];
        let out = mapper.map(img.view(), None, None).unwrap();
        assert_eq!(out[[0, 0]], 0);
        assert_eq!(out[[1, 0]], 255);
        assert_eq!(out.dim(), img.dim());
        // Source untouched.
        assert_eq!(img[[1, 0]], 3000);
    }

    #[test]
    fn test_invalid_ranges() {
        let mapper = DisplayRangeMapper::new(SampleDepth::U16);
        let img = array![[7u16, 7]];
        assert_eq!(
            mapper.map(img.view(), None, None),
            Err(RangeError::InvalidRange { lower: 7, upper: 7 })
        );
        assert!(DisplayRangeMapper::validate(65_535, 65_535).is_err());
        assert!(DisplayRangeMapper::validate(0, 65_536).is_err());
        assert!(DisplayRangeMapper::validate(10, 5).is_err());
        assert!(DisplayRangeMapper::validate(0, 65_535).is_ok());
    }

    #[test]
    fn test_lut_spans_sample_domain() {
        let lut8 = DisplayRangeMapper::new(SampleDepth::U8)
            .lookup_table(0, 255)
            .unwrap();
        assert_eq!(lut8.len(), 256);
        let lut16 = DisplayRangeMapper::new(SampleDepth::U16)
            .lookup_table(0, 255)
            .unwrap();
        assert_eq!(lut16.len(), 65_536);
        assert_eq!(lut16[300], 255);
    }
}
