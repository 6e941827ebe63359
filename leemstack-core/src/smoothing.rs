//! Window-convolution smoothing of 1D spectra.
//!
//! The sequence is reflect-padded on both ends, convolved with a normalized
//! window in "valid" mode, and trimmed back to the input length.

use std::f64::consts::PI;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::SmoothError;
use crate::util::usize_to_f64;

/// Window used as the convolution kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WindowType {
    /// Uniform weights (moving average).
    #[default]
    Flat,
    /// Hann window.
    Hanning,
    /// Hamming window.
    Hamming,
    /// Triangular window with zero end points.
    Bartlett,
    /// Blackman window.
    Blackman,
}

impl WindowType {
    /// All supported window types.
    pub const ALL: [WindowType; 5] = [
        WindowType::Flat,
        WindowType::Hanning,
        WindowType::Hamming,
        WindowType::Bartlett,
        WindowType::Blackman,
    ];

    /// Lowercase name accepted by [`FromStr`].
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            WindowType::Flat => "flat",
            WindowType::Hanning => "hanning",
            WindowType::Hamming => "hamming",
            WindowType::Bartlett => "bartlett",
            WindowType::Blackman => "blackman",
        }
    }

    /// Unnormalized window of length `len`.
    ///
    /// `len` must be at least 2; callers go through [`WindowSpec`], which
    /// guarantees at least 4.
    #[must_use]
    pub fn weights(self, len: usize) -> Vec<f64> {
        let m = usize_to_f64(len.saturating_sub(1).max(1));
        (0..len)
            .map(|i| {
                let n = usize_to_f64(i);
                match self {
                    WindowType::Flat => 1.0,
                    WindowType::Hanning => 0.5 - 0.5 * (2.0 * PI * n / m).cos(),
                    WindowType::Hamming => 0.54 - 0.46 * (2.0 * PI * n / m).cos(),
                    WindowType::Bartlett => 2.0 / m * (m / 2.0 - (n - m / 2.0).abs()),
                    WindowType::Blackman => {
                        0.42 - 0.5 * (2.0 * PI * n / m).cos() + 0.08 * (4.0 * PI * n / m).cos()
                    }
                }
            })
            .collect()
    }

    /// Window of length `len` scaled to sum to one.
    #[must_use]
    pub fn kernel(self, len: usize) -> Vec<f64> {
        let mut w = self.weights(len);
        let sum: f64 = w.iter().sum();
        if sum != 0.0 {
            for x in &mut w {
                *x /= sum;
            }
        }
        w
    }
}

impl std::fmt::Display for WindowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindowType {
    type Err = SmoothError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(WindowType::Flat),
            "hanning" => Ok(WindowType::Hanning),
            "hamming" => Ok(WindowType::Hamming),
            "bartlett" => Ok(WindowType::Bartlett),
            "blackman" => Ok(WindowType::Blackman),
            _ => Err(SmoothError::InvalidWindowType(s.to_string())),
        }
    }
}

/// Validated smoothing parameters: an even window length above 3 and a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WindowSpec {
    len: usize,
    kind: WindowType,
    requested_len: usize,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            len: 10,
            kind: WindowType::Flat,
            requested_len: 10,
        }
    }
}

impl WindowSpec {
    /// Validates a window length for the given shape.
    ///
    /// An odd length is bumped to the next even number and logged; check
    /// [`WindowSpec::was_adjusted`] to report it further.
    ///
    /// # Errors
    /// Returns [`SmoothError::WindowTooSmall`] if the (even) length is 3 or less.
    pub fn new(len: usize, kind: WindowType) -> Result<Self, SmoothError> {
        let even = if len % 2 == 0 { len } else { len + 1 };
        if even != len {
            log::warn!("window length {len} is odd, using {even}");
        }
        if even <= 3 {
            return Err(SmoothError::WindowTooSmall(even));
        }
        Ok(Self {
            len: even,
            kind,
            requested_len: len,
        })
    }

    /// Validates the length as [`WindowSpec::new`], then parses the window name.
    ///
    /// # Errors
    /// [`SmoothError::WindowTooSmall`] or [`SmoothError::InvalidWindowType`].
    pub fn parse(len: usize, kind: &str) -> Result<Self, SmoothError> {
        let spec = Self::new(len, WindowType::Flat)?;
        Ok(Self {
            kind: kind.parse()?,
            ..spec
        })
    }

    /// Effective (even) window length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; a valid spec has at least four taps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Window shape.
    #[must_use]
    pub fn kind(&self) -> WindowType {
        self.kind
    }

    /// Length originally asked for.
    #[must_use]
    pub fn requested_len(&self) -> usize {
        self.requested_len
    }

    /// True when an odd length was rounded up.
    #[must_use]
    pub fn was_adjusted(&self) -> bool {
        self.len != self.requested_len
    }
}

impl std::fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.kind, self.len)
    }
}

/// Smooths `input`, returning a sequence of the same length.
///
/// # Errors
/// Returns [`SmoothError::SequenceTooShort`] when `input` is shorter than the
/// window, since the reflection padding needs `len - 1` interior samples.
pub fn smooth(input: &[f64], spec: &WindowSpec) -> Result<Vec<f64>, SmoothError> {
    let n = input.len();
    let w = spec.len();
    if n < w {
        return Err(SmoothError::SequenceTooShort {
            len: n,
            window_len: w,
        });
    }

    // [x[w-1], ..., x[1]] ++ x ++ [x[n-2], ..., x[n-w]]
    let mut padded = Vec::with_capacity(n + 2 * (w - 1));
    padded.extend(input[1..w].iter().rev());
    padded.extend_from_slice(input);
    padded.extend(input[n - w..n - 1].iter().rev());

    let kernel = spec.kind().kernel(w);
    let front = w / 2 - 1;

    // Valid-mode convolution has n + w - 1 outputs; keep n of them starting at `front`.
    let out = (front..front + n)
        .map(|k| {
            kernel
                .iter()
                .enumerate()
                .map(|(j, weight)| weight * padded[k + w - 1 - j])
                .sum()
        })
        .collect();
    Ok(out)
}

/// Smooths with a window chosen by name, as [`smooth`].
///
/// # Errors
/// Any [`SmoothError`].
pub fn smooth_named(
    input: &[f64],
    window_len: usize,
    window_type: &str,
) -> Result<Vec<f64>, SmoothError> {
    let spec = WindowSpec::parse(window_len, window_type)?;
    smooth(input, &spec)
}
