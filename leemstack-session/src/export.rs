//! Text export of curves.
//!
//! Each selection is written to its own file, `<base><index>.txt`, one
//! `energy<TAB>intensity` pair per line. Files are written by a small pool
//! of worker threads, one per file; a batch is refused while any worker of
//! the previous batch is still running.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crate::{Error, Result};

/// Path of the export file for selection `index`.
#[must_use]
pub fn export_path(dir: &Path, base: &str, index: usize) -> PathBuf {
    dir.join(format!("{base}{index}.txt"))
}

/// Writes one curve as `energy\tintensity` lines.
///
/// Pairs beyond the shorter of the two slices are not written.
///
/// # Errors
/// [`Error::Io`] if the file cannot be created or written.
pub fn write_curve(path: &Path, energy: &[f64], values: &[f64]) -> Result<()> {
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
    for (e, v) in energy.iter().zip(values) {
        writeln!(out, "{e}\t{v}").map_err(io_err)?;
    }
    out.flush().map_err(io_err)?;
    Ok(())
}

/// Worker threads of the latest export batch.
#[derive(Debug, Default)]
pub struct ExportPool {
    workers: Vec<JoinHandle<Result<PathBuf>>>,
}

impl ExportPool {
    /// Creates an idle pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of workers from the last batch that have not finished.
    #[must_use]
    pub fn running(&self) -> usize {
        self.workers.iter().filter(|w| !w.is_finished()).count()
    }

    /// True while any worker from the last batch is running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.running() > 0
    }

    /// Starts one worker per job.
    ///
    /// Results of the previous, finished batch are collected and logged.
    ///
    /// # Errors
    /// [`Error::ExportBusy`] if the previous batch is still running; no job
    /// is started in that case.
    pub fn launch<F>(&mut self, jobs: Vec<F>) -> Result<usize>
    where
        F: FnOnce() -> Result<PathBuf> + Send + 'static,
    {
        let running = self.running();
        if running > 0 {
            return Err(Error::ExportBusy { running });
        }
        self.reap();
        let count = jobs.len();
        self.workers = jobs.into_iter().map(thread::spawn).collect();
        log::debug!("export batch started with {count} worker(s)");
        Ok(count)
    }

    /// Blocks until every worker of the last batch has finished.
    ///
    /// Returns the written paths, or the first error encountered.
    ///
    /// # Errors
    /// The first worker error, or [`Error::Io`] if a worker panicked.
    pub fn wait(&mut self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.workers.len());
        let mut first_err = None;
        for worker in self.workers.drain(..) {
            match join(worker) {
                Ok(path) => written.push(path),
                Err(e) => {
                    log::warn!("export failed: {e}");
                    first_err.get_or_insert(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }

    fn reap(&mut self) {
        for worker in self.workers.drain(..) {
            match join(worker) {
                Ok(path) => log::trace!("exported {}", path.display()),
                Err(e) => log::warn!("export failed: {e}"),
            }
        }
    }
}

fn join(worker: JoinHandle<Result<PathBuf>>) -> Result<PathBuf> {
    worker.join().unwrap_or_else(|_| {
        Err(Error::Io {
            path: PathBuf::new(),
            source: std::io::Error::other("export worker panicked"),
        })
    })
}
