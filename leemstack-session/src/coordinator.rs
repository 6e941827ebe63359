//! Background loading with single-subscriber delivery.
//!
//! Each submitted load runs on its own worker thread and reports through a
//! fresh channel. Submitting again drops the receiver of the previous load,
//! so a superseded worker may still finish but its result has nowhere to go.

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use leemstack_core::Stack;
use leemstack_io::{FrameIngestor, IngestError, LoadRequest};

use crate::message::LoadEvent;

/// Produces a complete stack for a load request.
///
/// Implemented by [`FrameIngestor`]; tests substitute in-memory sources.
pub trait StackSource: Send + Sync {
    /// Builds the stack described by `request`.
    ///
    /// # Errors
    /// Any [`IngestError`]; the whole load is abandoned.
    fn load(&self, request: &LoadRequest) -> Result<Stack, IngestError>;
}

impl StackSource for FrameIngestor {
    fn load(&self, request: &LoadRequest) -> Result<Stack, IngestError> {
        FrameIngestor::load(self, request)
    }
}

struct Subscription {
    generation: u64,
    dir: PathBuf,
    rx: Receiver<LoadEvent>,
}

impl Subscription {
    fn worker_lost(&self) -> LoadEvent {
        log::error!("load #{} worker exited without a result", self.generation);
        LoadEvent::LoadFailed(IngestError::Io {
            path: self.dir.clone(),
            source: std::io::Error::other("loader thread exited without a result"),
        })
    }
}

/// Runs loads off the interactive thread and delivers each outcome once.
pub struct LoadCoordinator {
    source: Arc<dyn StackSource>,
    current: Option<Subscription>,
    submitted: u64,
}

impl Default for LoadCoordinator {
    fn default() -> Self {
        Self::new(Arc::new(FrameIngestor::new()))
    }
}

impl std::fmt::Debug for LoadCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadCoordinator")
            .field("submitted", &self.submitted)
            .field("loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

impl LoadCoordinator {
    /// Coordinator loading through `source`.
    #[must_use]
    pub fn new(source: Arc<dyn StackSource>) -> Self {
        Self {
            source,
            current: None,
            submitted: 0,
        }
    }

    /// Starts loading `request` on a background thread.
    ///
    /// Any load still outstanding is detached first: its worker keeps
    /// running, but its outcome is discarded. Returns the load's sequence
    /// number.
    pub fn submit(&mut self, request: LoadRequest) -> u64 {
        if let Some(old) = self.current.take() {
            log::debug!("detaching load #{} from {}", old.generation, old.dir.display());
        }
        self.submitted += 1;
        let generation = self.submitted;
        let (tx, rx) = channel();
        let dir = request.source.dir().to_path_buf();
        let source = Arc::clone(&self.source);

        thread::spawn(move || {
            let start = Instant::now();
            let event = match source.load(&request) {
                Ok(stack) => LoadEvent::StackReady(Box::new(stack)),
                Err(e) => LoadEvent::LoadFailed(e),
            };
            if tx.send(event).is_err() {
                log::debug!(
                    "load #{generation} finished after {:.2}s but was superseded; result dropped",
                    start.elapsed().as_secs_f64()
                );
            }
        });

        log::debug!("submitted load #{generation} from {}", dir.display());
        self.current = Some(Subscription { generation, dir, rx });
        generation
    }

    /// True while a submitted load has not delivered its outcome.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.current.is_some()
    }

    /// Number of loads submitted so far.
    #[must_use]
    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    /// Takes the outcome of the current load if it has arrived.
    pub fn poll(&mut self) -> Option<LoadEvent> {
        let sub = self.current.as_ref()?;
        let event = match sub.rx.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => sub.worker_lost(),
        };
        self.current = None;
        Some(event)
    }

    /// Blocks until the current load delivers its outcome.
    ///
    /// Returns `None` if nothing is loading.
    pub fn wait(&mut self) -> Option<LoadEvent> {
        let sub = self.current.take()?;
        Some(sub.rx.recv().unwrap_or_else(|_| sub.worker_lost()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leemstack_core::{EnergyAxis, Volume};
    use leemstack_io::RawLayout;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::Sender;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Builds a 2x2 stack whose samples equal the request's start energy,
    /// once the test releases it.
    struct GatedSource {
        gate: Mutex<Receiver<()>>,
        finished: AtomicUsize,
    }

    impl GatedSource {
        fn new() -> (Arc<Self>, Sender<()>) {
            let (tx, rx) = channel();
            let source = Arc::new(Self {
                gate: Mutex::new(rx),
                finished: AtomicUsize::new(0),
            });
            (source, tx)
        }
    }

    impl StackSource for GatedSource {
        fn load(&self, request: &LoadRequest) -> Result<Stack, IngestError> {
            self.gate.lock().unwrap().recv().unwrap();
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let value = request.energy.start as u16;
            let volume = Volume::filled(2, 2, 3, value);
            let axis = EnergyAxis::build(request.energy, 3);
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(Stack::new(volume, axis)?)
        }
    }

    fn request(start: f64) -> LoadRequest {
        LoadRequest::raw(RawLayout::new("/gated", 2, 2)).with_energy(start, 1.0)
    }

    #[test]
    fn test_superseded_load_is_never_delivered() {
        let (source, gate) = GatedSource::new();
        let mut coordinator = LoadCoordinator::new(source.clone());

        assert_eq!(coordinator.submit(request(1.0)), 1);
        assert_eq!(coordinator.submit(request(2.0)), 2);
        gate.send(()).unwrap();
        gate.send(()).unwrap();

        match coordinator.wait() {
            Some(LoadEvent::StackReady(stack)) => {
                assert_eq!(stack.volume().get(0, 0, 0), Some(2));
            }
            other => panic!("expected StackReady, got {other:?}"),
        }

        let deadline = Instant::now() + Duration::from_secs(5);
        while source.finished.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(source.finished.load(Ordering::SeqCst), 2);
        assert!(coordinator.poll().is_none());
        assert!(!coordinator.is_loading());
    }

    #[test]
    fn test_poll_before_completion_is_empty() {
        let (source, gate) = GatedSource::new();
        let mut coordinator = LoadCoordinator::new(source);
        coordinator.submit(request(7.0));
        assert!(coordinator.poll().is_none());
        assert!(coordinator.is_loading());
        gate.send(()).unwrap();
        assert!(matches!(coordinator.wait(), Some(LoadEvent::StackReady(_))));
        assert!(coordinator.wait().is_none());
    }

    #[test]
    fn test_ingest_failure_is_delivered() {
        let mut coordinator = LoadCoordinator::default();
        coordinator.submit(LoadRequest::raw(RawLayout::new(
            "/this/path/does/not/exist",
            4,
            4,
        )));
        assert!(matches!(
            coordinator.wait(),
            Some(LoadEvent::LoadFailed(IngestError::PathNotFound(_)))
        ));
    }
}
