//! The interactive session: single owner of the stack, cache and selections.

use std::path::{Path, PathBuf};

use ndarray::Array2;

use leemstack_core::{
    smooth, EnergyAxis, Error as CoreError, IntegrationWindow, Selection, SelectionOutcome,
    SelectionSet, Stack, StackStore, WindowSpec,
};
use leemstack_io::LoadRequest;

use crate::config::SessionConfig;
use crate::coordinator::LoadCoordinator;
use crate::export::{export_path, write_curve, ExportPool};
use crate::message::{LoadEvent, LoadStatus};
use crate::report::ReportSink;
use crate::{Error, Result};

/// A selection and its curve, ready to plot or export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curve<'s> {
    pub selection: Selection,
    pub values: &'s [f64],
}

/// Selections of one kind with the curve computed for each.
#[derive(Debug, Default)]
struct CurveSet {
    selections: SelectionSet,
    curves: Vec<Vec<f64>>,
}

impl CurveSet {
    fn add(
        &mut self,
        row: usize,
        col: usize,
        half_width: Option<usize>,
        values: Vec<f64>,
    ) -> SelectionOutcome {
        let outcome = self.selections.add(row, col, half_width);
        if outcome.cleared {
            self.curves.clear();
        }
        self.curves.push(values);
        outcome
    }

    fn clear(&mut self) {
        self.selections.clear();
        self.curves.clear();
    }

    fn iter(&self) -> impl Iterator<Item = Curve<'_>> {
        self.selections
            .iter()
            .zip(&self.curves)
            .map(|(s, c)| Curve {
                selection: *s,
                values: c,
            })
    }
}

/// Interactive exploration of one image stack at a time.
///
/// Loads run in the background; until a load is observed through
/// [`Session::poll`] or [`Session::wait`] every query sees the previously
/// published stack. Rejected requests are reported to the sink and leave
/// the current curves untouched.
pub struct Session<'a> {
    config: SessionConfig,
    coordinator: LoadCoordinator,
    store: StackStore,
    pixels: CurveSet,
    regions: CurveSet,
    hover: Option<Vec<f64>>,
    frame: usize,
    exports: ExportPool,
    sink: &'a dyn ReportSink,
}

impl<'a> Session<'a> {
    /// Session loading from disk.
    #[must_use]
    pub fn new(config: SessionConfig, sink: &'a dyn ReportSink) -> Self {
        Self::with_coordinator(config, LoadCoordinator::default(), sink)
    }

    /// Session using a specific loader.
    #[must_use]
    pub fn with_coordinator(
        config: SessionConfig,
        coordinator: LoadCoordinator,
        sink: &'a dyn ReportSink,
    ) -> Self {
        Self {
            config,
            coordinator,
            store: StackStore::new(),
            pixels: CurveSet::default(),
            regions: CurveSet::default(),
            hover: None,
            frame: 0,
            exports: ExportPool::new(),
            sink,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The published stack and its smoothing cache.
    #[must_use]
    pub fn store(&self) -> &StackStore {
        &self.store
    }

    /// Energy axis of the published stack.
    #[must_use]
    pub fn energy(&self) -> Option<&EnergyAxis> {
        self.store.stack().map(Stack::energy)
    }

    /// True while a submitted load has not been observed.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.coordinator.is_loading()
    }

    /// Starts loading `request` in the background, superseding any load
    /// still in progress.
    pub fn load(&mut self, request: LoadRequest) -> u64 {
        if self.coordinator.is_loading() {
            self.sink.warn("previous load superseded");
        }
        self.sink
            .info(&format!("loading from {}", request.source.dir().display()));
        self.coordinator.submit(request)
    }

    /// Applies the outcome of the current load if it has arrived.
    pub fn poll(&mut self) -> LoadStatus {
        match self.coordinator.poll() {
            Some(event) => self.apply(event),
            None if self.coordinator.is_loading() => LoadStatus::Loading,
            None => LoadStatus::Idle,
        }
    }

    /// Blocks until the current load finishes, then applies it.
    pub fn wait(&mut self) -> LoadStatus {
        match self.coordinator.wait() {
            Some(event) => self.apply(event),
            None => LoadStatus::Idle,
        }
    }

    fn apply(&mut self, event: LoadEvent) -> LoadStatus {
        match event {
            LoadEvent::StackReady(stack) => {
                let (height, width, depth) = stack.volume().dim();
                self.publish(*stack);
                self.sink
                    .info(&format!("loaded {depth} frames of {height}x{width}"));
                LoadStatus::Ready {
                    height,
                    width,
                    depth,
                }
            }
            LoadEvent::LoadFailed(err) => {
                let kept = if self.store.has_data() {
                    "; keeping previous stack"
                } else {
                    ""
                };
                self.sink.error(&format!("load failed: {err}{kept}"));
                LoadStatus::Failed(err)
            }
        }
    }

    fn publish(&mut self, stack: Stack) {
        self.frame = stack.volume().depth() / 2;
        self.store.replace(stack);
        self.pixels.clear();
        self.regions.clear();
        self.hover = None;
    }

    fn reject(&self, what: &str, err: impl Into<Error>) -> Error {
        let err = err.into();
        self.sink.warn(&format!("{what}: {err}"));
        err
    }

    /// Smoothed curve under the cursor, using the hover window.
    ///
    /// # Errors
    /// Out-of-bounds pixels, an unloaded store or a smoothing failure; the
    /// previous hover curve is kept.
    pub fn hover(&mut self, row: usize, col: usize) -> Result<&[f64]> {
        match self.store.smoothed_spectrum(row, col, &self.config.hover) {
            Ok(curve) => Ok(self.hover.insert(curve).as_slice()),
            Err(e) => Err(self.reject(&format!("hover at ({row}, {col})"), e)),
        }
    }

    /// Last successful hover curve.
    #[must_use]
    pub fn hover_curve(&self) -> Option<&[f64]> {
        self.hover.as_deref()
    }

    /// Selects a real-space pixel and records its raw curve.
    ///
    /// # Errors
    /// Out-of-bounds pixels or an unloaded store.
    pub fn select_pixel(&mut self, row: usize, col: usize) -> Result<SelectionOutcome> {
        let values = self
            .store
            .raw_spectrum(row, col)
            .map_err(|e| self.reject(&format!("pixel selection at ({row}, {col})"), e))?;
        let outcome = self.pixels.add(row, col, None, values);
        if outcome.cleared {
            self.sink.info("pixel selections reset");
        }
        Ok(outcome)
    }

    /// Selects a diffraction spot and records its box-integrated curve.
    ///
    /// # Errors
    /// An unloaded store, or a box that leaves the volume.
    pub fn select_region(&mut self, row: usize, col: usize) -> Result<SelectionOutcome> {
        let half_width = self.config.region_half_width;
        let values = self
            .store
            .integrate(IntegrationWindow::new(row, col, half_width))
            .map_err(|e| self.reject(&format!("region selection at ({row}, {col})"), e))?;
        let outcome = self.regions.add(row, col, Some(half_width), values);
        if outcome.cleared {
            self.sink.info("region selections reset");
        }
        Ok(outcome)
    }

    /// Real-space selections with their curves.
    #[must_use]
    pub fn pixel_curves(&self) -> Vec<Curve<'_>> {
        self.pixels.iter().collect()
    }

    /// Diffraction selections with their curves.
    #[must_use]
    pub fn region_curves(&self) -> Vec<Curve<'_>> {
        self.regions.iter().collect()
    }

    /// Drops all real-space selections.
    pub fn clear_pixels(&mut self) {
        self.pixels.clear();
    }

    /// Drops all diffraction selections.
    pub fn clear_regions(&mut self) {
        self.regions.clear();
    }

    /// Index of the displayed frame.
    #[must_use]
    pub fn current_frame(&self) -> usize {
        self.frame
    }

    /// Energy of the displayed frame.
    #[must_use]
    pub fn current_energy(&self) -> Option<f64> {
        self.energy().and_then(|axis| axis.energy_at(self.frame))
    }

    /// Moves to frame `index`, clamped to the stack, and returns its energy.
    ///
    /// # Errors
    /// [`leemstack_core::Error::NoData`] before the first load.
    pub fn set_frame(&mut self, index: usize) -> Result<f64> {
        let depth = self
            .store
            .require()
            .map_err(|e| self.reject("frame change", e))?
            .volume()
            .depth();
        self.frame = index.min(depth.saturating_sub(1));
        self.current_energy()
            .ok_or(Error::Core(CoreError::FrameOutOfRange {
                index: self.frame,
                depth,
            }))
    }

    /// Moves `delta` frames forward or back, stopping at either end.
    ///
    /// # Errors
    /// As [`Session::set_frame`].
    pub fn step_frame(&mut self, delta: isize) -> Result<f64> {
        let target = if delta < 0 {
            self.frame.saturating_sub(delta.unsigned_abs())
        } else {
            self.frame.saturating_add(delta.unsigned_abs())
        };
        self.set_frame(target)
    }

    /// The displayed frame quantized to 8 bits.
    ///
    /// Bounds default to the frame's own minimum and maximum.
    ///
    /// # Errors
    /// An unloaded store or an invalid range.
    pub fn display_frame(&self, lower: Option<u32>, upper: Option<u32>) -> Result<Array2<u8>> {
        self.store
            .display_frame(self.frame, lower, upper)
            .map_err(|e| self.reject("display", e))
    }

    /// Changes the hover window. Already cached curves are kept.
    pub fn set_hover_window(&mut self, spec: WindowSpec) {
        if spec.was_adjusted() {
            self.sink.warn(&format!(
                "window length {} is odd; using {}",
                spec.requested_len(),
                spec.len()
            ));
        }
        self.config.hover = spec;
    }

    /// Enables or disables smoothing of exported curves.
    pub fn set_export_smoothing(&mut self, spec: Option<WindowSpec>) {
        self.config.export_smoothing = spec;
    }

    /// Changes the half-width used by later region selections.
    pub fn set_region_half_width(&mut self, half_width: usize) {
        self.config.region_half_width = half_width;
    }

    /// Writes every real-space curve to `<dir>/<base><index>.txt`.
    ///
    /// Returns the number of files being written.
    ///
    /// # Errors
    /// [`Error::ExportBusy`], [`Error::NothingToExport`], or a smoothing
    /// error when export smoothing is enabled.
    pub fn export_pixels(&mut self, dir: &Path, base: &str) -> Result<usize> {
        let curves: Vec<Vec<f64>> = self.pixels.curves.clone();
        self.export("pixel", curves, dir, base)
    }

    /// Writes every diffraction curve to `<dir>/<base><index>.txt`.
    ///
    /// # Errors
    /// As [`Session::export_pixels`].
    pub fn export_regions(&mut self, dir: &Path, base: &str) -> Result<usize> {
        let curves: Vec<Vec<f64>> = self.regions.curves.clone();
        self.export("region", curves, dir, base)
    }

    fn export(
        &mut self,
        what: &'static str,
        curves: Vec<Vec<f64>>,
        dir: &Path,
        base: &str,
    ) -> Result<usize> {
        if self.exports.is_busy() {
            return Err(self.reject(
                "export",
                Error::ExportBusy {
                    running: self.exports.running(),
                },
            ));
        }
        if curves.is_empty() {
            return Err(self.reject("export", Error::NothingToExport { what }));
        }
        let energy = match self.energy() {
            Some(axis) => axis.values().to_vec(),
            None => return Err(self.reject("export", CoreError::NoData)),
        };

        let curves = match self.config.export_smoothing {
            Some(spec) => curves
                .iter()
                .map(|c| smooth(c, &spec))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| self.reject("export smoothing", e))?,
            None => curves,
        };

        let jobs: Vec<_> = curves
            .into_iter()
            .enumerate()
            .map(|(index, values)| {
                let path = export_path(dir, base, index);
                let energy = energy.clone();
                move || write_curve(&path, &energy, &values).map(|()| path)
            })
            .collect();
        let count = self
            .exports
            .launch(jobs)
            .map_err(|e| self.reject("export", e))?;
        self.sink
            .info(&format!("exporting {count} {what} curve(s) to {}", dir.display()));
        Ok(count)
    }

    /// Blocks until the running export batch has written every file.
    ///
    /// # Errors
    /// The first write failure of the batch.
    pub fn wait_exports(&mut self) -> Result<Vec<PathBuf>> {
        self.exports
            .wait()
            .map_err(|e| self.reject("export", e))
    }
}
