use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::job::{Job, RegistrationResult, RetryPolicy};
use crate::alert::{AlertSink, FailureAlert};
use crate::attempt::{AttemptOutcome, AttemptRequest, IdentityFields, RegistrationAttempt};
use crate::proxy::ProxyCredential;

pub const MAX_RETRIES_MESSAGE: &str = "max retries exceeded";

/// Runs one job to completion: attempts, backoff between attempts and the
/// final alert.
pub struct RegistrationWorker<A, S> {
    attempt: Arc<A>,
    alerts: Arc<S>,
    proxies: Arc<[ProxyCredential]>,
    policy: RetryPolicy,
}

impl<A, S> Clone for RegistrationWorker<A, S> {
    fn clone(&self) -> Self {
        Self {
            attempt: Arc::clone(&self.attempt),
            alerts: Arc::clone(&self.alerts),
            proxies: Arc::clone(&self.proxies),
            policy: self.policy,
        }
    }
}

impl<A: RegistrationAttempt, S: AlertSink> RegistrationWorker<A, S> {
    pub fn new(
        attempt: Arc<A>,
        alerts: Arc<S>,
        proxies: Arc<[ProxyCredential]>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            attempt,
            alerts,
            proxies,
            policy,
        }
    }

    /// Deterministic proxy for a worker index, `None` without proxies.
    pub fn proxy_for(&self, worker_index: usize) -> Option<&ProxyCredential> {
        if self.proxies.is_empty() {
            None
        } else {
            self.proxies.get(worker_index % self.proxies.len())
        }
    }

    pub async fn execute(&self, job: &Job, fields: &IdentityFields) -> RegistrationResult {
        let max = self.policy.max_attempts.max(1);
        let proxy = self.proxy_for(job.worker_index);
        match proxy {
            Some(p) => debug!(identity = %job.identity, proxy = %p.server, "using proxy"),
            None => debug!(identity = %job.identity, "no proxy configured, direct connection"),
        }

        for attempt in 1..=max {
            info!(identity = %job.identity, attempt, max, "registration attempt");
            let outcome = self
                .attempt
                .attempt(AttemptRequest {
                    target: &job.target,
                    email: &job.identity,
                    fields,
                    proxy,
                })
                .await;

            let reason = match outcome {
                AttemptOutcome::Success(message) => {
                    info!(identity = %job.identity, attempt, "registration succeeded");
                    return RegistrationResult::success(job, attempt, message);
                }
                AttemptOutcome::Failure(reason) => reason,
            };
            warn!(identity = %job.identity, attempt, %reason, "registration attempt failed");

            if attempt < max {
                let delay_ms = self.policy.delay_for_attempt(attempt);
                debug!(identity = %job.identity, delay_ms, "retrying after backoff");
                sleep(Duration::from_millis(delay_ms)).await;
            } else {
                self.raise_alert(job, attempt, max, reason).await;
            }
        }

        RegistrationResult::failed(job, max, MAX_RETRIES_MESSAGE.to_string())
    }

    async fn raise_alert(&self, job: &Job, attempt: u32, max: u32, reason: String) {
        let alert = FailureAlert {
            identity: job.identity.clone(),
            target: job.target.clone(),
            attempt,
            max_attempts: max,
            reason,
        };
        if let Err(e) = self.alerts.send_alert(&alert).await {
            warn!(identity = %job.identity, error = %e, "failed to deliver failure alert");
        }
    }
}
