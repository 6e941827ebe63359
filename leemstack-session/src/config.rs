//! Session settings.

use leemstack_core::WindowSpec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smoothing and selection settings of an interactive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionConfig {
    /// Window applied to hover curves.
    pub hover: WindowSpec,
    /// Window applied to exported curves; `None` exports them unsmoothed.
    pub export_smoothing: Option<WindowSpec>,
    /// Half-width of diffraction-spot integration boxes.
    pub region_half_width: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hover: WindowSpec::default(),
            export_smoothing: None,
            region_half_width: 20,
        }
    }
}

impl SessionConfig {
    /// Sets the hover smoothing window.
    #[must_use]
    pub fn with_hover(mut self, spec: WindowSpec) -> Self {
        self.hover = spec;
        self
    }

    /// Enables or disables smoothing of exported curves.
    #[must_use]
    pub fn with_export_smoothing(mut self, spec: Option<WindowSpec>) -> Self {
        self.export_smoothing = spec;
        self
    }

    /// Sets the integration half-width.
    #[must_use]
    pub fn with_region_half_width(mut self, half_width: usize) -> Self {
        self.region_half_width = half_width;
        self
    }
}
