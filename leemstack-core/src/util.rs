//! Numeric conversion helpers.
//!
//! Casts are isolated here so precision loss is allowed in one place.

/// Convert usize to f64 with allowed precision loss.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    value as f64
}

/// Convert a sample slice to `f64`.
#[must_use]
pub fn samples_to_f64<'a, I>(samples: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a u16>,
{
    samples.into_iter().map(|&v| f64::from(v)).collect()
}
