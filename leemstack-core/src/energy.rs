//! Energy axis paired with the depth dimension of a volume.

use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Start energy and step used to build an [`EnergyAxis`], in eV.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnergySettings {
    /// Energy of the first frame.
    pub start: f64,
    /// Increment between consecutive frames.
    pub step: f64,
}

impl Default for EnergySettings {
    fn default() -> Self {
        Self {
            start: 0.0,
            step: 0.1,
        }
    }
}

impl EnergySettings {
    /// Creates energy settings.
    #[must_use]
    pub fn new(start: f64, step: f64) -> Self {
        Self { start, step }
    }
}

/// Rounds to the nearest hundredth of the exact binary value, ties to even.
///
/// `value * 100.0` is itself rounded, so a product that lands near a half
/// is resolved against the exact value instead.
fn round2(value: f64) -> f64 {
    let magnitude = value.abs();
    if !magnitude.is_finite() || magnitude >= 1e13 {
        return value;
    }
    let scaled = magnitude * 100.0;
    let lower = scaled.floor();
    let hundredths = if (scaled - lower - 0.5).abs() > 1e-6 {
        scaled.round()
    } else {
        match cmp_half_hundredth(magnitude, lower) {
            Ordering::Less => lower,
            Ordering::Greater => lower + 1.0,
            Ordering::Equal if lower.rem_euclid(2.0) < 1.0 => lower,
            Ordering::Equal => lower + 1.0,
        }
    };
    (hundredths / 100.0).copysign(value)
}

/// Compares a non-negative `value` with `(lower + 0.5) / 100` exactly.
///
/// `lower` is an integral float below `1e15`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cmp_half_hundredth(value: f64, lower: f64) -> Ordering {
    let bits = value.to_bits();
    let biased_exp = (bits >> 52) & 0x7ff;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exp) = if biased_exp == 0 {
        (fraction, -1074_i64)
    } else {
        (fraction | (1u64 << 52), biased_exp as i64 - 1075)
    };
    // value = mantissa * 2^exp; compare mantissa * 200 with (2 * lower + 1) * 2^-exp.
    if exp >= 0 {
        return value.partial_cmp(&((lower + 0.5) / 100.0)).unwrap_or(Ordering::Equal);
    }
    let shift = (-exp) as u32;
    let lhs = u128::from(mantissa) * 200;
    let odd = u128::from(2 * (lower as u64) + 1);
    if odd.leading_zeros() <= shift {
        return Ordering::Less;
    }
    lhs.cmp(&(odd << shift))
}

/// Ordered energy values, one per depth slice.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnergyAxis {
    values: Vec<f64>,
}

impl EnergyAxis {
    /// Builds `count` energies starting at `settings.start`.
    ///
    /// Each value is the previous one plus the step, rounded to two decimals.
    /// Rounding happens at every step, so drift accumulates the same way an
    /// iterative scan would rather than following `start + i * step`.
    #[must_use]
    pub fn build(settings: EnergySettings, count: usize) -> Self {
        let mut values = Vec::with_capacity(count);
        if count > 0 {
            values.push(settings.start);
        }
        while values.len() < count {
            let prev = values[values.len() - 1];
            values.push(round2(prev + settings.step));
        }
        Self { values }
    }

    /// Wraps explicit values.
    #[must_use]
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Number of energies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the axis has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All values in depth order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Energy of depth slice `index`.
    #[must_use]
    pub fn energy_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Depth slice whose energy equals `energy` at two-decimal precision.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn index_of(&self, energy: f64) -> Option<usize> {
        let target = round2(energy);
        self.values.iter().position(|&e| round2(e) == target)
    }

    /// First and last energies.
    #[must_use]
    pub fn range(&self) -> Option<(f64, f64)> {
        Some((*self.values.first()?, *self.values.last()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_negative_start_rounds_each_step() {
        let axis = EnergyAxis::build(EnergySettings::new(-9.9, 0.1), 5);
        assert_eq!(axis.values(), &[-9.9, -9.8, -9.7, -9.6, -9.5]);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_exact_halves_round_to_even() {
        let axis = EnergyAxis::build(EnergySettings::new(0.0, 0.125), 5);
        assert_eq!(axis.values(), &[0.0, 0.12, 0.24, 0.36, 0.48]);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(-0.125), -0.12);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_rounding_uses_exact_binary_value() {
        // 0.045 and 2.675 are stored just below the half.
        let axis = EnergyAxis::build(EnergySettings::new(0.0, 0.045), 7);
        assert_eq!(axis.values(), &[0.0, 0.04, 0.08, 0.12, 0.16, 0.21, 0.26]);
        assert_eq!(round2(2.675), 2.67);
        assert_eq!(round2(1.005), 1.0);
        assert_eq!(round2(12.3456), 12.35);
    }

    #[test]
    fn test_length_matches_count() {
        assert_eq!(EnergyAxis::build(EnergySettings::default(), 0).len(), 0);
        assert_eq!(EnergyAxis::build(EnergySettings::default(), 1).len(), 1);
        assert_eq!(EnergyAxis::build(EnergySettings::new(3.0, 0.25), 40).len(), 40);
    }

    #[test]
    fn test_strictly_monotonic_with_nonzero_step() {
        let axis = EnergyAxis::build(EnergySettings::new(20.0, -0.5), 30);
        assert!(axis.values().windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_energy_index_lookup() {
        let axis = EnergyAxis::build(EnergySettings::new(1.0, 0.1), 10);
        assert_eq!(axis.energy_at(3), Some(1.3));
        assert_eq!(axis.energy_at(10), None);
        assert_eq!(axis.index_of(1.3), Some(3));
        assert_eq!(axis.index_of(5.0), None);
        assert_eq!(axis.range(), Some((1.0, 1.9)));
    }
}
