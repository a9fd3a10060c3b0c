mod job;
mod worker;

pub use job::{Job, RegistrationResult, RegistrationStatus, RetryPolicy};
pub use worker::RegistrationWorker;

#[cfg(test)]
pub(crate) use worker::MAX_RETRIES_MESSAGE;
#[cfg(test)]
pub(crate) use worker::tests::{RecordingAlerts, ScriptedAttempt};
