use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::campaign::RegistrationResult;
use crate::orchestrator::{Progress, ProgressSink};

/// Handle to the background task running one campaign.
///
/// Stop requests do not use it. A stopped campaign keeps running detached
/// from the slot until it finishes or the process shuts down.
#[derive(Debug)]
pub struct CampaignHandle {
    pub launch: u64,
    pub task: JoinHandle<()>,
}

/// What a successful [`CampaignState::try_begin`] hands to the new campaign.
#[derive(Debug, Clone)]
pub struct Launch {
    pub id: u64,
    pub progress: Arc<LiveProgress>,
}

/// Live counters written by the orchestrator, read by `/status`.
#[derive(Debug, Default)]
pub struct LiveProgress {
    completed: AtomicUsize,
    succeeded: AtomicUsize,
    total: AtomicUsize,
}

impl LiveProgress {
    pub fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.succeeded.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    /// (completed, succeeded, total)
    pub fn snapshot(&self) -> (usize, usize, usize) {
        (
            self.completed.load(Ordering::Relaxed),
            self.succeeded.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }
}

impl ProgressSink for LiveProgress {
    fn update(&self, p: &Progress) {
        self.completed.store(p.completed, Ordering::Relaxed);
        self.succeeded.store(p.succeeded, Ordering::Relaxed);
        self.total.store(p.total, Ordering::Relaxed);
    }
}

/// The single campaign slot of a control plane.
#[derive(Debug, Default)]
pub struct CampaignState {
    pub running: bool,
    pub start_time: Option<Instant>,
    pub results: Vec<RegistrationResult>,
    /// Counters of the most recent launch.
    pub progress: Arc<LiveProgress>,
    /// Id of the most recent launch; 0 before the first one.
    pub launch: u64,
    /// Tasks that have not been observed finished yet, stopped ones included.
    pub handles: Vec<CampaignHandle>,
}

impl CampaignState {
    /// Claim the slot. Returns `None`, touching nothing, if a campaign runs.
    pub fn try_begin(&mut self) -> Option<Launch> {
        if self.running {
            return None;
        }
        self.running = true;
        self.start_time = Some(Instant::now());
        self.results.clear();
        self.launch += 1;
        self.progress = Arc::new(LiveProgress::default());
        Some(Launch {
            id: self.launch,
            progress: Arc::clone(&self.progress),
        })
    }

    /// Advisory stop. Returns whether a campaign was marked as running.
    pub fn request_stop(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }

    /// Record a finished campaign. Safe to call after a stop request.
    ///
    /// Returns false and leaves the slot alone when `launch` has been
    /// superseded by a newer one.
    pub fn complete(&mut self, launch: u64, results: Vec<RegistrationResult>) -> bool {
        if launch != self.launch {
            return false;
        }
        self.results = results;
        self.running = false;
        true
    }

    /// Remember a spawned campaign task, forgetting finished ones.
    pub fn track(&mut self, handle: CampaignHandle) {
        self.handles.retain(|h| !h.task.is_finished());
        self.handles.push(handle);
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.map(|t| t.elapsed()).unwrap_or_default()
    }
}
