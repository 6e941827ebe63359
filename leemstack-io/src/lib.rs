//! leemstack-io: Frame ingestion for leemstack.
//!
//! Reads a directory of per-energy frames, either headered raw binary files
//! (memory-mapped via memmap2) or raster images (decoded via `image`), into
//! one dense volume.
//!

mod error;
pub mod ingest;
pub mod raster;
pub mod raw;
pub mod request;

pub use error::{IngestError, Result};
pub use ingest::{list_frames, FrameIngestor};
pub use request::{ByteOrder, ImageSource, LoadRequest, RawLayout, Source};
