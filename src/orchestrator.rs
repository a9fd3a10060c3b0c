use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::alert::AlertSink;
use crate::attempt::{IdentityFields, RegistrationAttempt};
use crate::campaign::{Job, RegistrationResult, RegistrationWorker, RetryPolicy};
use crate::proxy::ProxyCredential;
use crate::report::{CampaignSummary, save_results};

/// Snapshot emitted once per completed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub succeeded: usize,
    pub elapsed: Duration,
}

/// Receives progress snapshots from the result collector.
pub trait ProgressSink: Send + Sync {
    fn update(&self, progress: &Progress);

    fn finish(&self, _summary: &CampaignSummary) {}
}

/// Everything a finished campaign produced.
#[derive(Debug, Clone)]
pub struct CampaignReport {
    pub run_id: Uuid,
    /// Arrival order, not enumeration order.
    pub results: Vec<RegistrationResult>,
    pub summary: CampaignSummary,
    pub results_file: Option<PathBuf>,
}

/// Build the job set: every identity for `targets[0]`, then every identity
/// for `targets[1]`, and so on. Job `i` is tagged with worker `i % concurrency`.
pub fn build_jobs(targets: &[String], identities: &[String], concurrency: usize) -> Vec<Job> {
    let concurrency = concurrency.max(1);
    targets
        .iter()
        .flat_map(|t| identities.iter().map(move |i| (t, i)))
        .enumerate()
        .map(|(index, (target, identity))| Job::new(target.as_str(), identity.as_str(), index % concurrency))
        .collect()
}

/// Fans a campaign out over a fixed pool of worker tasks.
pub struct Orchestrator<A, S> {
    attempt: Arc<A>,
    alerts: Arc<S>,
    fields: Arc<IdentityFields>,
    concurrency: usize,
    policy: RetryPolicy,
    results_dir: Option<PathBuf>,
}

impl<A, S> Orchestrator<A, S>
where
    A: RegistrationAttempt + 'static,
    S: AlertSink + 'static,
{
    pub fn new(attempt: Arc<A>, alerts: Arc<S>, fields: IdentityFields, concurrency: usize) -> Self {
        Self {
            attempt,
            alerts,
            fields: Arc::new(fields),
            concurrency: concurrency.max(1),
            policy: RetryPolicy::default(),
            results_dir: None,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Persist `results_<timestamp>.json` into `dir` when the run ends.
    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = Some(dir.into());
        self
    }

    /// Run every (target, identity) pair and return one result per pair.
    pub async fn run(
        &self,
        targets: &[String],
        identities: &[String],
        proxies: Vec<ProxyCredential>,
        progress: &dyn ProgressSink,
    ) -> CampaignReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("campaign", %run_id);
        self.run_inner(run_id, targets, identities, proxies, progress)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        targets: &[String],
        identities: &[String],
        proxies: Vec<ProxyCredential>,
        progress: &dyn ProgressSink,
    ) -> CampaignReport {
        let jobs = build_jobs(targets, identities, self.concurrency);
        let total = jobs.len();
        let workers = self.concurrency.min(total).max(1);

        info!(
            targets = targets.len(),
            identities = identities.len(),
            total,
            workers,
            proxies = proxies.len(),
            "starting registration campaign"
        );
        let started = Instant::now();

        let (job_tx, job_rx) = mpsc::channel::<Job>(total.max(1));
        for job in jobs {
            // Capacity equals the job count, so this never waits.
            if job_tx.send(job).await.is_err() {
                break;
            }
        }
        drop(job_tx);

        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<RegistrationResult>();
        let worker = RegistrationWorker::new(
            Arc::clone(&self.attempt),
            Arc::clone(&self.alerts),
            proxies.into(),
            self.policy,
        );

        let mut pool = JoinSet::new();
        for worker_id in 0..workers {
            let worker = worker.clone();
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();
            let fields = Arc::clone(&self.fields);
            pool.spawn(
                async move {
                    loop {
                        let next = job_rx.lock().await.recv().await;
                        let Some(job) = next else { break };
                        let result = worker.execute(&job, &fields).await;
                        if result_tx.send(result).is_err() {
                            break;
                        }
                    }
                }
                .instrument(info_span!("worker", worker_id)),
            );
        }
        drop(result_tx);

        let mut results = Vec::with_capacity(total);
        let mut succeeded = 0;
        while let Some(result) = result_rx.recv().await {
            if result.is_success() {
                succeeded += 1;
            }
            results.push(result);
            progress.update(&Progress {
                completed: results.len(),
                total,
                succeeded,
                elapsed: started.elapsed(),
            });
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "worker task ended abnormally");
            }
        }

        let summary = CampaignSummary::from_results(&results, started.elapsed());
        log_summary(&summary);
        progress.finish(&summary);

        let results_file = match &self.results_dir {
            Some(dir) if !results.is_empty() => match save_results(dir, &results) {
                Ok(path) => {
                    info!(path = %path.display(), "results saved");
                    Some(path)
                }
                Err(e) => {
                    warn!(error = %e, "failed to save results");
                    None
                }
            },
            _ => None,
        };

        CampaignReport {
            run_id,
            results,
            summary,
            results_file,
        }
    }
}

fn log_summary(summary: &CampaignSummary) {
    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        success_rate = summary.success_rate(),
        duration_secs = summary.duration.as_secs_f64(),
        rate_per_sec = summary.rate_per_sec(),
        "registration campaign summary"
    );
}
