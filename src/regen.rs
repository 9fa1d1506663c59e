//! Background regeneration.
//!
//! Generating a million particles takes long enough to drop frames, so the
//! render loop hands parameter snapshots to a worker thread and picks finished
//! sets up on a later frame.
//!
//! Results are last-write-wins: [`Regenerator::poll`] only ever returns the
//! outcome of the most recent [`Regenerator::request`]. Older results that
//! arrive late are dropped, and the worker skips queued snapshots that have
//! already been superseded.
//!
//! ```ignore
//! let mut regen = Regenerator::new(GenerationLimits::from(&device.limits()), None);
//! regen.request(&params);
//!
//! // Each frame:
//! if let Some(result) = regen.poll() {
//!     match result {
//!         Ok(set) => gpu.bind_attributes(set)?,
//!         Err(e) => log::warn!("keeping previous galaxy: {e}"),
//!     }
//! }
//! ```

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::error::GenerationError;
use crate::generator::{generate_with_limits, GenerationLimits, ParticleAttributeSet};
use crate::params::GalaxyParameters;

/// Outcome of one regeneration.
pub type RegenResult = Result<ParticleAttributeSet, GenerationError>;

struct Request {
    id: u64,
    params: GalaxyParameters,
}

struct Completed {
    id: u64,
    result: RegenResult,
}

/// Owns the regeneration worker thread.
pub struct Regenerator {
    requests: Option<Sender<Request>>,
    completed: Receiver<Completed>,
    worker: Option<JoinHandle<()>>,
    last_sent: Option<GalaxyParameters>,
    latest_id: u64,
    pending: bool,
}

impl Regenerator {
    /// Spawn the worker.
    ///
    /// With a `seed`, every snapshot is generated from a fresh RNG seeded with
    /// it, so identical parameters always give the identical galaxy.
    pub fn new(limits: GenerationLimits, seed: Option<u64>) -> Self {
        let (request_tx, request_rx) = unbounded();
        let (completed_tx, completed_rx) = unbounded();

        let worker = thread::spawn(move || run_worker(request_rx, completed_tx, limits, seed));

        Self {
            requests: Some(request_tx),
            completed: completed_rx,
            worker: Some(worker),
            last_sent: None,
            latest_id: 0,
            pending: false,
        }
    }

    /// Queue a snapshot for generation.
    ///
    /// Returns the request id, or `None` if `params` equals the last snapshot
    /// sent (nothing to do) or the worker has stopped.
    pub fn request(&mut self, params: &GalaxyParameters) -> Option<u64> {
        if self.last_sent.as_ref() == Some(params) {
            return None;
        }
        let sender = self.requests.as_ref()?;

        let id = self.latest_id + 1;
        let request = Request {
            id,
            params: params.clone(),
        };
        if sender.send(request).is_err() {
            log::error!("regeneration worker has stopped; dropping request");
            return None;
        }

        log::debug!("queued regeneration #{} ({} particles)", id, params.count);
        self.latest_id = id;
        self.last_sent = Some(params.clone());
        self.pending = true;
        Some(id)
    }

    /// Whether the newest request has not produced a result yet.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Id of the newest request, `0` before the first one.
    #[inline]
    pub fn latest_id(&self) -> u64 {
        self.latest_id
    }

    /// Take the newest request's result if it is ready. Never blocks.
    pub fn poll(&mut self) -> Option<RegenResult> {
        let mut newest = None;
        loop {
            match self.completed.try_recv() {
                Ok(done) => {
                    if let Some(result) = self.accept(done) {
                        newest = Some(result);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.worker_lost();
                    break;
                }
            }
        }
        newest
    }

    /// Block until the newest request's result arrives or `timeout` passes.
    pub fn wait(&mut self, timeout: Duration) -> Option<RegenResult> {
        if let Some(result) = self.poll() {
            return Some(result);
        }
        if !self.pending {
            return None;
        }

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.completed.recv_timeout(remaining) {
                Ok(done) => {
                    if let Some(result) = self.accept(done) {
                        return Some(result);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => {
                    self.worker_lost();
                    return None;
                }
            }
        }
    }

    fn accept(&mut self, done: Completed) -> Option<RegenResult> {
        if done.id == self.latest_id {
            self.pending = false;
            Some(done.result)
        } else {
            log::debug!(
                "discarding stale regeneration #{} (latest is #{})",
                done.id,
                self.latest_id
            );
            None
        }
    }

    fn worker_lost(&mut self) {
        if self.pending {
            log::error!("regeneration worker exited with a request outstanding");
        }
        self.pending = false;
        self.requests = None;
    }
}

impl Drop for Regenerator {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("regeneration worker panicked");
            }
        }
    }
}

fn run_worker(
    requests: Receiver<Request>,
    completed: Sender<Completed>,
    limits: GenerationLimits,
    seed: Option<u64>,
) {
    while let Ok(mut request) = requests.recv() {
        let mut skipped = 0;
        while let Ok(newer) = requests.try_recv() {
            request = newer;
            skipped += 1;
        }
        if skipped > 0 {
            log::debug!("skipped {} superseded regeneration requests", skipped);
        }

        let mut rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let started = Instant::now();
        let result = generate_with_limits(&request.params, &limits, &mut rng);
        match &result {
            Ok(set) => log::info!(
                "generated {} particles in {:.1?}",
                set.len(),
                started.elapsed()
            ),
            Err(e) => log::debug!("regeneration #{} failed: {}", request.id, e),
        }

        let done = Completed {
            id: request.id,
            result,
        };
        if completed.send(done).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::generator::generate;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn params(count: u32) -> GalaxyParameters {
        GalaxyParameters {
            count,
            ..GalaxyParameters::default()
        }
    }

    #[test]
    fn test_request_and_wait() {
        let mut regen = Regenerator::new(GenerationLimits::default(), Some(1));
        assert!(!regen.is_pending());

        let id = regen.request(&params(1_000));
        assert_eq!(id, Some(1));
        assert!(regen.is_pending());

        let set = regen.wait(TIMEOUT).unwrap().unwrap();
        assert_eq!(set.len(), 1_000);
        assert!(!regen.is_pending());
        assert!(regen.poll().is_none());
    }

    #[test]
    fn test_identical_snapshot_not_resent() {
        let mut regen = Regenerator::new(GenerationLimits::default(), Some(1));
        assert_eq!(regen.request(&params(1_000)), Some(1));
        assert_eq!(regen.request(&params(1_000)), None);
        assert_eq!(regen.request(&params(2_000)), Some(2));
        assert_eq!(regen.latest_id(), 2);
    }

    #[test]
    fn test_last_write_wins() {
        let mut regen = Regenerator::new(GenerationLimits::default(), Some(1));
        regen.request(&params(50_000));
        regen.request(&params(1_000));
        regen.request(&params(2_000));

        let set = regen.wait(TIMEOUT).unwrap().unwrap();
        assert_eq!(set.len(), 2_000);

        // Nothing older may surface afterwards
        thread::sleep(Duration::from_millis(50));
        assert!(regen.poll().is_none());
    }

    #[test]
    fn test_seeded_matches_direct_generation() {
        let mut regen = Regenerator::new(GenerationLimits::default(), Some(42));
        regen.request(&params(1_500));
        let from_worker = regen.wait(TIMEOUT).unwrap().unwrap();

        let direct = generate(&params(1_500), &mut SmallRng::seed_from_u64(42)).unwrap();
        assert_eq!(from_worker, direct);
    }

    #[test]
    fn test_failure_is_reported() {
        let mut regen = Regenerator::new(GenerationLimits::default(), None);
        let bad = GalaxyParameters {
            branches: 0,
            ..GalaxyParameters::default()
        };
        regen.request(&bad);
        assert_eq!(
            regen.wait(TIMEOUT),
            Some(Err(GenerationError::Validation(ValidationError::Branches {
                branches: 0
            })))
        );
    }

    #[test]
    fn test_limits_are_applied_on_worker() {
        let limits = GenerationLimits {
            max_buffer_size: 1_024,
        };
        let mut regen = Regenerator::new(limits, None);
        regen.request(&params(1_000));
        assert!(matches!(
            regen.wait(TIMEOUT),
            Some(Err(GenerationError::ResourceExhausted { .. }))
        ));
    }

    #[test]
    fn test_wait_without_request() {
        let mut regen = Regenerator::new(GenerationLimits::default(), None);
        assert!(regen.wait(Duration::from_millis(10)).is_none());
    }
}
