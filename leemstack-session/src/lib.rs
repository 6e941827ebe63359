//! leemstack-session: Interactive exploration of an image stack.
//!
//! A [`Session`] owns the published stack, its smoothing cache and the
//! current selections. Loads run on a background thread through a
//! [`LoadCoordinator`]; curve export runs on an [`ExportPool`].
//!

mod config;
pub mod coordinator;
mod error;
pub mod export;
pub mod message;
pub mod report;
mod session;

pub use config::SessionConfig;
pub use coordinator::{LoadCoordinator, StackSource};
pub use error::{Error, Result};
pub use export::{export_path, write_curve, ExportPool};
pub use message::{LoadEvent, LoadStatus};
pub use report::{LogSink, MemorySink, Report, ReportSink};
pub use session::{Curve, Session};
