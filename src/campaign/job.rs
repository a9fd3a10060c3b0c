use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::report::event_label;

/// Terminal status of one registration job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegistrationStatus {
    Success,
    Failed,
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::Success => write!(f, "SUCCESS"),
            RegistrationStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per job, including the first one.
    pub max_attempts: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// Delay after a failed attempt, before the next one.
    /// delay = base_delay_ms * 3^attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        self.base_delay_ms.saturating_mul(3u64.saturating_pow(attempt))
    }
}

/// One (target, identity) unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub target: String,
    pub identity: String,
    /// Only selects the proxy; execution may happen on any worker task.
    pub worker_index: usize,
}

impl Job {
    pub fn new(target: impl Into<String>, identity: impl Into<String>, worker_index: usize) -> Self {
        Self {
            target: target.into(),
            identity: identity.into(),
            worker_index,
        }
    }
}

/// Record produced exactly once per job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResult {
    pub identity: String,
    /// Display form of the target, see [`event_label`].
    pub target: String,
    pub status: RegistrationStatus,
    pub attempt: u32,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl RegistrationResult {
    pub fn success(job: &Job, attempt: u32, message: String) -> Self {
        Self::new(job, RegistrationStatus::Success, attempt, message)
    }

    pub fn failed(job: &Job, attempt: u32, message: String) -> Self {
        Self::new(job, RegistrationStatus::Failed, attempt, message)
    }

    fn new(job: &Job, status: RegistrationStatus, attempt: u32, message: String) -> Self {
        Self {
            identity: job.identity.clone(),
            target: event_label(&job.target),
            status,
            attempt,
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RegistrationStatus::Success
    }
}
