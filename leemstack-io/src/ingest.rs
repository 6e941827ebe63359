//! Directory ingestion: list, decode and stack frames into a volume.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Instant;

use ndarray::Array2;
use rayon::prelude::*;

use leemstack_core::{EnergyAxis, SampleDepth, Stack, Volume};

use crate::request::{ImageSource, LoadRequest, RawLayout, Source};
use crate::{raster, raw, IngestError, Result};

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

fn matches_extension(name: &OsStr, ext: &str) -> bool {
    let name = name.to_string_lossy();
    if name.starts_with('.') {
        return false;
    }
    Path::new(name.as_ref())
        .extension()
        .is_some_and(|e| e.to_string_lossy().to_ascii_lowercase() == ext)
}

/// Files in `dir` with the given extension, sorted by file name.
///
/// Hidden files are skipped. An empty result is not an error here.
///
/// # Errors
/// [`IngestError::PathNotFound`] if `dir` is not a directory, or
/// [`IngestError::Io`] if it cannot be listed.
pub fn list_frames(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::PathNotFound(dir.to_path_buf()));
    }
    let ext = normalize_extension(extension);
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| IngestError::io(dir, e))? {
        let entry = entry.map_err(|e| IngestError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && matches_extension(&entry.file_name(), &ext) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Like [`list_frames`], but treats `tif` and `tiff` as interchangeable
/// when the requested one matches nothing.
fn list_image_frames(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let files = list_frames(dir, extension)?;
    if !files.is_empty() {
        return Ok(files);
    }
    let alternate = match normalize_extension(extension).as_str() {
        "tif" => "tiff",
        "tiff" => "tif",
        _ => return Ok(files),
    };
    log::debug!("no '{extension}' files in {}, trying '{alternate}'", dir.display());
    list_frames(dir, alternate)
}

fn no_frames(dir: &Path, extension: &str) -> IngestError {
    IngestError::NoFrames {
        dir: dir.to_path_buf(),
        extension: normalize_extension(extension),
    }
}

/// Reads a directory of per-energy frames into one volume.
///
/// Frames are ordered by ascending file name and decoded in parallel. Any
/// failing file aborts the whole ingestion.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameIngestor;

impl FrameIngestor {
    /// Creates an ingestor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Builds the volume described by `source`.
    ///
    /// # Errors
    /// Any [`IngestError`]; no partial volume is returned.
    pub fn ingest(&self, source: &Source) -> Result<Volume> {
        let start = Instant::now();
        let volume = match source {
            Source::Raw(layout) => self.ingest_raw(layout)?,
            Source::Image(src) => self.ingest_images(src)?,
        };
        let (h, w, d) = volume.dim();
        log::info!(
            "ingested {d} frames of {h}x{w} ({}) from {} in {:.2}s",
            volume.sample_depth(),
            source.dir().display(),
            start.elapsed().as_secs_f64()
        );
        Ok(volume)
    }

    /// Builds the volume and its energy axis.
    ///
    /// # Errors
    /// Any [`IngestError`].
    pub fn load(&self, request: &LoadRequest) -> Result<Stack> {
        let volume = self.ingest(&request.source)?;
        let axis = EnergyAxis::build(request.energy, volume.depth());
        Ok(Stack::new(volume, axis)?)
    }

    /// Headered raw frames.
    ///
    /// # Errors
    /// Any [`IngestError`].
    pub fn ingest_raw(&self, layout: &RawLayout) -> Result<Volume> {
        let sample_depth = layout.sample_depth()?;
        let payload_len = layout.payload_len()?;
        let files = list_frames(&layout.dir, &layout.extension)?;
        if files.is_empty() {
            return Err(no_frames(&layout.dir, &layout.extension));
        }
        log::debug!(
            "reading {} raw frames from {} ({payload_len}-byte payload)",
            files.len(),
            layout.dir.display()
        );

        let frames: Vec<Array2<u16>> = files
            .par_iter()
            .map(|path| raw::read_frame(path, layout))
            .collect::<Result<_>>()?;
        Ok(Volume::from_frames(&frames, sample_depth)?)
    }

    /// Raster image frames.
    ///
    /// # Errors
    /// Any [`IngestError`]; frames of differing size give
    /// [`IngestError::ShapeMismatch`] naming the first offending file.
    pub fn ingest_images(&self, src: &ImageSource) -> Result<Volume> {
        let files = list_image_frames(&src.dir, &src.extension)?;
        if files.is_empty() {
            return Err(no_frames(&src.dir, &src.extension));
        }
        log::debug!("decoding {} images from {}", files.len(), src.dir.display());

        let frames: Vec<raster::RasterFrame> = files
            .par_iter()
            .map(|path| raster::read_frame(path, src.swap_bytes))
            .collect::<Result<_>>()?;

        let expected = frames[0].samples.dim();
        if let Some((path, frame)) = files
            .iter()
            .zip(&frames)
            .find(|(_, f)| f.samples.dim() != expected)
        {
            return Err(IngestError::ShapeMismatch {
                path: path.clone(),
                expected,
                found: frame.samples.dim(),
            });
        }

        let sample_depth = if frames.iter().any(|f| f.sample_depth == SampleDepth::U16) {
            SampleDepth::U16
        } else {
            SampleDepth::U8
        };
        let samples: Vec<Array2<u16>> = frames.into_iter().map(|f| f.samples).collect();
        Ok(Volume::from_frames(&samples, sample_depth)?)
    }
}
