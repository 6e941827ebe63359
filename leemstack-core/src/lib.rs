//! leemstack-core: Core types for energy-resolved LEEM/LEED image stacks.
//!
//! This crate provides the intensity volume and its energy axis, per-pixel
//! spectrum smoothing with memoization, box integration for diffraction
//! spots, and display quantization.
//!

pub mod display;
pub mod energy;
pub mod error;
pub mod integration;
pub mod selection;
pub mod smoothing;
pub mod store;
pub mod util;
pub mod volume;

pub use display::DisplayRangeMapper;
pub use energy::{EnergyAxis, EnergySettings};
pub use error::{AggregationError, Error, RangeError, Result, SmoothError};
pub use integration::{integrate, IntegrationWindow};
pub use selection::{Palette, Selection, SelectionOutcome, SelectionSet};
pub use smoothing::{smooth, smooth_named, WindowSpec, WindowType};
pub use store::{SmoothCache, Stack, StackStore};
pub use volume::{SampleDepth, Volume};
