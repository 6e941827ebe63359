//! Published image stack and its per-pixel smoothing cache.

use ndarray::{s, Array2, Array3};

use crate::display::DisplayRangeMapper;
use crate::energy::EnergyAxis;
use crate::integration::{integrate, IntegrationWindow};
use crate::smoothing::{smooth, WindowSpec};
use crate::util::samples_to_f64;
use crate::volume::Volume;
use crate::{Error, Result};

/// A volume together with the energy of each of its slices.
///
/// The depth of the volume always equals the length of the axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    volume: Volume,
    energy: EnergyAxis,
}

impl Stack {
    /// Pairs a volume with its energy axis.
    ///
    /// # Errors
    /// Returns [`Error::AxisMismatch`] if the axis length differs from the volume depth.
    pub fn new(volume: Volume, energy: EnergyAxis) -> Result<Self> {
        if volume.depth() != energy.len() {
            return Err(Error::AxisMismatch {
                depth: volume.depth(),
                axis_len: energy.len(),
            });
        }
        Ok(Self { volume, energy })
    }

    /// The intensity volume.
    #[must_use]
    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    /// The energy axis.
    #[must_use]
    pub fn energy(&self) -> &EnergyAxis {
        &self.energy
    }

    /// Splits into volume and axis.
    #[must_use]
    pub fn into_parts(self) -> (Volume, EnergyAxis) {
        (self.volume, self.energy)
    }
}

/// Lazily filled smoothed copy of the volume.
///
/// A pixel is smoothed the first time it is requested; later requests read
/// the stored curve. Entries are keyed by position only, so curves computed
/// with earlier window settings are returned until the cache is reset.
///
/// The full `(H, W, D)` cube of `f64` is allocated up front, four times the
/// size of the `u16` volume: a 600x592x400 stack needs about 1.1 GB here.
/// See [`SmoothCache::footprint`].
#[derive(Debug, Clone)]
pub struct SmoothCache {
    visited: Array2<bool>,
    curves: Array3<f64>,
    computed: usize,
}

impl SmoothCache {
    /// Empty cache for an `(H, W, D)` volume.
    #[must_use]
    pub fn new(height: usize, width: usize, depth: usize) -> Self {
        Self {
            visited: Array2::from_elem((height, width), false),
            curves: Array3::zeros((height, width, depth)),
            computed: 0,
        }
    }

    /// `(H, W)` of the visited mask.
    #[must_use]
    pub fn dim(&self) -> (usize, usize) {
        self.visited.dim()
    }

    /// True if `(row, col)` already holds a smoothed curve.
    #[must_use]
    pub fn is_visited(&self, row: usize, col: usize) -> bool {
        self.visited.get((row, col)).copied().unwrap_or(false)
    }

    /// Stored curve for a visited pixel.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<Vec<f64>> {
        self.is_visited(row, col)
            .then(|| self.curves.slice(s![row, col, ..]).to_vec())
    }

    /// Bytes held by the smoothed cube and the visited mask.
    #[must_use]
    pub fn footprint(&self) -> usize {
        self.curves.len() * std::mem::size_of::<f64>()
            + self.visited.len() * std::mem::size_of::<bool>()
    }

    /// Number of curves computed since the cache was created.
    #[must_use]
    pub fn computed(&self) -> usize {
        self.computed
    }

    fn insert(&mut self, row: usize, col: usize, curve: &[f64]) {
        self.curves
            .slice_mut(s![row, col, ..])
            .iter_mut()
            .zip(curve)
            .for_each(|(dst, &v)| *dst = v);
        self.visited[[row, col]] = true;
        self.computed += 1;
    }
}

/// Owner of the current stack and everything derived from it.
///
/// Starts unloaded; every query fails with [`Error::NoData`] until a stack
/// is published with [`StackStore::replace`].
#[derive(Debug, Default)]
pub struct StackStore {
    stack: Option<Stack>,
    cache: Option<SmoothCache>,
}

impl StackStore {
    /// Creates an unloaded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a stack has been published.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.stack.is_some()
    }

    /// Publishes `stack`, dropping the previous one and resetting the cache.
    pub fn replace(&mut self, stack: Stack) {
        let (h, w, d) = stack.volume().dim();
        self.cache = Some(SmoothCache::new(h, w, d));
        self.stack = Some(stack);
        log::debug!("published stack {h}x{w}x{d}");
    }

    /// Returns to the unloaded state.
    pub fn clear(&mut self) {
        self.stack = None;
        self.cache = None;
    }

    /// The current stack, if any.
    #[must_use]
    pub fn stack(&self) -> Option<&Stack> {
        self.stack.as_ref()
    }

    /// The current stack.
    ///
    /// # Errors
    /// Returns [`Error::NoData`] before the first load.
    pub fn require(&self) -> Result<&Stack> {
        self.stack.as_ref().ok_or(Error::NoData)
    }

    /// The smoothing cache of the current stack.
    #[must_use]
    pub fn cache(&self) -> Option<&SmoothCache> {
        self.cache.as_ref()
    }

    /// Raw curve of one pixel as `f64`.
    ///
    /// # Errors
    /// [`Error::NoData`] or [`Error::PixelOutOfBounds`].
    pub fn raw_spectrum(&self, row: usize, col: usize) -> Result<Vec<f64>> {
        let spectrum = self.require()?.volume().spectrum(row, col)?;
        Ok(samples_to_f64(spectrum.iter()))
    }

    /// Smoothed curve of one pixel, computed once and then served from the cache.
    ///
    /// # Errors
    /// [`Error::NoData`], [`Error::PixelOutOfBounds`], or a smoothing error.
    /// A failed computation leaves the pixel unvisited.
    pub fn smoothed_spectrum(
        &mut self,
        row: usize,
        col: usize,
        spec: &WindowSpec,
    ) -> Result<Vec<f64>> {
        self.require()?.volume().check_pixel(row, col)?;
        if let Some(curve) = self.cache.as_ref().and_then(|c| c.get(row, col)) {
            log::trace!("smooth cache hit at ({row}, {col})");
            return Ok(curve);
        }
        let raw = self.raw_spectrum(row, col)?;
        let curve = smooth(&raw, spec)?;
        self.cache
            .as_mut()
            .ok_or(Error::NoData)?
            .insert(row, col, &curve);
        Ok(curve)
    }

    /// Box-integrated curve around a pixel.
    ///
    /// # Errors
    /// [`Error::NoData`] or [`crate::AggregationError::WindowOutOfBounds`].
    pub fn integrate(&self, window: IntegrationWindow) -> Result<Vec<f64>> {
        Ok(integrate(self.require()?.volume(), window)?)
    }

    /// Depth slice `k` quantized for display.
    ///
    /// # Errors
    /// [`Error::NoData`], [`Error::FrameOutOfRange`] or a range error.
    pub fn display_frame(
        &self,
        k: usize,
        lower: Option<u32>,
        upper: Option<u32>,
    ) -> Result<Array2<u8>> {
        let volume = self.require()?.volume();
        let frame = volume.frame(k)?;
        Ok(DisplayRangeMapper::new(volume.sample_depth()).map(frame, lower, upper)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::EnergySettings;
    use crate::smoothing::WindowType;
    use crate::volume::SampleDepth;
    use ndarray::Array3;

    fn ramp_stack(h: usize, w: usize, d: usize) -> Stack {
        let data = Array3::from_shape_fn((h, w, d), |(r, c, k)| {
            u16::try_from(r * 1000 + c * 100 + k * (k % 3)).unwrap()
        });
        let volume = Volume::from_array(data, SampleDepth::U16);
        Stack::new(volume, EnergyAxis::build(EnergySettings::new(10.0, 0.5), d)).unwrap()
    }

    #[test]
    fn test_unloaded_store_rejects_queries() {
        let mut store = StackStore::new();
        assert!(!store.has_data());
        assert_eq!(store.raw_spectrum(0, 0), Err(Error::NoData));
        assert_eq!(
            store.smoothed_spectrum(0, 0, &WindowSpec::default()),
            Err(Error::NoData)
        );
        assert_eq!(
            store.integrate(IntegrationWindow::new(0, 0, 0)),
            Err(Error::NoData)
        );
    }

    #[test]
    fn test_stack_requires_matching_axis() {
        let volume = Volume::filled(2, 2, 4, 0);
        let axis = EnergyAxis::build(EnergySettings::default(), 3);
        assert_eq!(
            Stack::new(volume, axis),
            Err(Error::AxisMismatch {
                depth: 4,
                axis_len: 3
            })
        );
    }

    #[test]
    fn test_smoothing_is_memoized() {
        let mut store = StackStore::new();
        store.replace(ramp_stack(3, 3, 20));
        let spec = WindowSpec::default();

        let first = store.smoothed_spectrum(1, 2, &spec).unwrap();
        assert_eq!(store.cache().unwrap().computed(), 1);
        let second = store.smoothed_spectrum(1, 2, &spec).unwrap();
        assert_eq!(store.cache().unwrap().computed(), 1);
        assert_eq!(first.len(), 20);
        assert!(first
            .iter()
            .zip(&second)
            .all(|(a, b)| a.to_bits() == b.to_bits()));
    }

    #[test]
    fn test_cache_is_keyed_by_position_only() {
        let mut store = StackStore::new();
        store.replace(ramp_stack(2, 2, 16));
        let flat = store.smoothed_spectrum(0, 0, &WindowSpec::default()).unwrap();
        let hann = WindowSpec::new(6, WindowType::Hanning).unwrap();
        assert_eq!(store.smoothed_spectrum(0, 0, &hann).unwrap(), flat);
        assert_eq!(store.cache().unwrap().computed(), 1);
    }

    #[test]
    fn test_replace_resets_cache() {
        let mut store = StackStore::new();
        store.replace(ramp_stack(3, 3, 12));
        store.smoothed_spectrum(0, 0, &WindowSpec::default()).unwrap();
        assert!(store.cache().unwrap().is_visited(0, 0));

        store.replace(ramp_stack(4, 5, 12));
        let cache = store.cache().unwrap();
        assert_eq!(cache.dim(), (4, 5));
        assert!(!cache.is_visited(0, 0));
        assert_eq!(cache.computed(), 0);
    }

    #[test]
    fn test_cache_footprint_is_eight_bytes_per_sample() {
        let cache = SmoothCache::new(600, 592, 400);
        assert_eq!(cache.footprint(), 600 * 592 * 400 * 8 + 600 * 592);
        assert!(cache.footprint() > 1_100_000_000);

        let mut store = StackStore::new();
        store.replace(ramp_stack(3, 4, 12));
        let raw_bytes = 3 * 4 * 12 * std::mem::size_of::<u16>();
        assert_eq!(store.cache().unwrap().footprint(), 4 * raw_bytes + 12);
    }

    #[test]
    fn test_failed_smoothing_leaves_pixel_unvisited() {
        let mut store = StackStore::new();
        store.replace(ramp_stack(2, 2, 6));
        assert!(store.smoothed_spectrum(1, 1, &WindowSpec::default()).is_err());
        assert!(!store.cache().unwrap().is_visited(1, 1));
        assert!(matches!(
            store.smoothed_spectrum(5, 1, &WindowSpec::default()),
            Err(Error::PixelOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_display_frame_leaves_volume_untouched() {
        let mut store = StackStore::new();
        store.replace(ramp_stack(3, 3, 4));
        let before = store.stack().unwrap().volume().clone();
        let frame = store.display_frame(1, None, None).unwrap();
        assert_eq!(frame.dim(), (3, 3));
        assert_eq!(frame[[0, 0]], 0);
        assert_eq!(frame[[2, 2]], 255);
        assert_eq!(store.stack().unwrap().volume(), &before);
    }
}
