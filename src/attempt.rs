//! The registration attempt seam.
//!
//! Filling and submitting a target form is delegated to a
//! [`RegistrationAttempt`] implementation. The worker only needs a yes/no
//! answer and a human-readable message for each try.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::proxy::ProxyCredential;

/// Identity fields shared by every job of a campaign. The email is per job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityFields {
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
}

impl IdentityFields {
    pub fn new(first_name: &str, last_name: &str, organization: &str) -> Self {
        Self {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            organization: organization.trim().to_string(),
        }
    }

    /// All three fields are required before a campaign can start.
    pub fn is_complete(&self) -> bool {
        !self.first_name.is_empty() && !self.last_name.is_empty() && !self.organization.is_empty()
    }
}

/// What one attempt against a target produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(String),
    Failure(String),
}

/// Everything one attempt needs. Borrowed so retries never clone.
#[derive(Debug, Clone, Copy)]
pub struct AttemptRequest<'a> {
    pub target: &'a str,
    pub email: &'a str,
    pub fields: &'a IdentityFields,
    pub proxy: Option<&'a ProxyCredential>,
}

/// Performs one registration try against a target page.
pub trait RegistrationAttempt: Send + Sync {
    fn attempt(&self, req: AttemptRequest<'_>) -> impl Future<Output = AttemptOutcome> + Send;
}

/// Attempt backend that never submits anything.
///
/// It validates the request shape, optionally waits to mimic page latency
/// and reports success. Used by `check`-style dry runs and as the default
/// backend until a real submitter is configured.
#[derive(Debug, Clone, Default)]
pub struct DryRunAttempt {
    pub latency: Duration,
    /// Visible mode: every attempt is logged at info level instead of debug.
    pub visible: bool,
}

impl RegistrationAttempt for DryRunAttempt {
    async fn attempt(&self, req: AttemptRequest<'_>) -> AttemptOutcome {
        if self.visible {
            info!(target_url = req.target, email = req.email, "opening registration page");
        } else {
            debug!(target_url = req.target, email = req.email, "opening registration page");
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if req.target.trim().is_empty() {
            return AttemptOutcome::Failure("empty target".into());
        }
        if !req.fields.is_complete() {
            return AttemptOutcome::Failure("identity fields incomplete".into());
        }
        let via = req
            .proxy
            .map(|p| format!(" via {}", p.server))
            .unwrap_or_default();
        AttemptOutcome::Success(format!("dry run: {} accepted{via}", req.email))
    }
}
