//! Box integration of a spatial window, one sum per energy slice.

use ndarray::{s, Axis};

use crate::error::AggregationError;
use crate::volume::Volume;

/// Inclusive square window centred on a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrationWindow {
    /// Centre row.
    pub row: usize,
    /// Centre column.
    pub col: usize,
    /// Distance from the centre to each edge; the box is `2 * half_width + 1` wide.
    pub half_width: usize,
}

impl IntegrationWindow {
    /// Creates a window.
    #[must_use]
    pub fn new(row: usize, col: usize, half_width: usize) -> Self {
        Self {
            row,
            col,
            half_width,
        }
    }

    /// Row and column ranges, or an error if any edge falls outside `height x width`.
    ///
    /// # Errors
    /// Returns [`AggregationError::WindowOutOfBounds`]; the window is never clipped.
    pub fn bounds(
        &self,
        height: usize,
        width: usize,
    ) -> Result<((usize, usize), (usize, usize)), AggregationError> {
        let hw = self.half_width;
        let fits = self.row >= hw
            && self.col >= hw
            && self.row.saturating_add(hw) < height
            && self.col.saturating_add(hw) < width;
        if !fits {
            return Err(AggregationError::WindowOutOfBounds {
                row: self.row,
                col: self.col,
                half_width: hw,
                height,
                width,
            });
        }
        Ok((
            (self.row - hw, self.row + hw),
            (self.col - hw, self.col + hw),
        ))
    }
}

/// Sums every sample inside `window` for each depth slice.
///
/// The result has one entry per energy.
///
/// # Errors
/// Returns [`AggregationError::WindowOutOfBounds`] if the box leaves the volume.
pub fn integrate(volume: &Volume, window: IntegrationWindow) -> Result<Vec<f64>, AggregationError> {
    let ((r0, r1), (c0, c1)) = window.bounds(volume.height(), volume.width())?;
    let region = volume.view().slice_move(s![r0..=r1, c0..=c1, ..]);
    let sums = region
        .mapv(f64::from)
        .sum_axis(Axis(0))
        .sum_axis(Axis(0));
    Ok(sums.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::SampleDepth;
    use ndarray::Array3;

    #[test]
    fn test_uniform_volume_box_sum() {
        let vol = Volume::filled(5, 5, 3, 1);
        let curve = integrate(&vol, IntegrationWindow::new(2, 2, 1)).unwrap();
        assert_eq!(curve, vec![9.0, 9.0, 9.0]);
    }

    #[test]
    fn test_per_slice_sums_are_independent() {
        let data = Array3::from_shape_fn((4, 4, 2), |(r, c, k)| {
            u16::try_from((r * 4 + c) * (k + 1)).unwrap()
        });
        let vol = Volume::from_array(data, SampleDepth::U16);
        let curve = integrate(&vol, IntegrationWindow::new(1, 1, 1)).unwrap();
        // rows 0..=2, cols 0..=2 of r*4+c: 0+1+2+4+5+6+8+9+10 = 45
        assert_eq!(curve, vec![45.0, 90.0]);
    }

    #[test]
    fn test_zero_half_width_is_single_pixel() {
        let data = Array3::from_shape_fn((3, 3, 2), |(r, c, k)| {
            u16::try_from(r * 100 + c * 10 + k).unwrap()
        });
        let vol = Volume::from_array(data, SampleDepth::U16);
        let curve = integrate(&vol, IntegrationWindow::new(2, 1, 0)).unwrap();
        assert_eq!(curve, vec![210.0, 211.0]);
    }

    #[test]
    fn test_window_past_edge_is_rejected() {
        let vol = Volume::filled(5, 5, 3, 1);
        for (row, col) in [(0, 2), (2, 0), (4, 2), (2, 4)] {
            assert!(matches!(
                integrate(&vol, IntegrationWindow::new(row, col, 1)),
                Err(AggregationError::WindowOutOfBounds { .. })
            ));
        }
        assert!(integrate(&vol, IntegrationWindow::new(2, 2, 3)).is_err());
        assert!(integrate(&vol, IntegrationWindow::new(2, 2, 2)).is_ok());
    }
}
