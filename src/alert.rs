//! Out-of-band failure alerts.
//!
//! Alerts are best effort. A sink reports delivery problems through its
//! return value and the worker only logs them.

use std::future::Future;
use std::sync::Arc;

use chrono::Local;

use crate::report::event_label;
use crate::telegram::{ChatTransport, TelegramError, escape_html};

/// One terminal failure worth telling a human about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureAlert {
    pub identity: String,
    pub target: String,
    pub attempt: u32,
    pub max_attempts: u32,
    pub reason: String,
}

pub trait AlertSink: Send + Sync {
    fn send_alert(&self, alert: &FailureAlert) -> impl Future<Output = Result<(), TelegramError>> + Send;
}

/// Sink used when no alert destination is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAlerts;

impl AlertSink for NoAlerts {
    async fn send_alert(&self, _alert: &FailureAlert) -> Result<(), TelegramError> {
        Ok(())
    }
}

/// Delivers alerts to one chat through a [`ChatTransport`].
pub struct ChatAlerts<T> {
    transport: Arc<T>,
    chat_id: i64,
}

impl<T> ChatAlerts<T> {
    pub fn new(transport: Arc<T>, chat_id: i64) -> Self {
        Self { transport, chat_id }
    }
}

impl<T: ChatTransport> AlertSink for ChatAlerts<T> {
    async fn send_alert(&self, alert: &FailureAlert) -> Result<(), TelegramError> {
        self.transport
            .send_text(self.chat_id, &format_failure_alert(alert))
            .await
    }
}

/// HTML body for a failure alert.
pub fn format_failure_alert(alert: &FailureAlert) -> String {
    format!(
        "❌ <b>Registration Failed</b>\n\
         ━━━━━━━━━━━━━━━━━━━━\n\
         📧 Email: <code>{}</code>\n\
         🎫 Event: <code>{}...</code>\n\
         🔄 Attempt: {}/{}\n\
         ❗️ Reason: {}\n\
         ⏰ Time: {}",
        escape_html(&alert.identity),
        escape_html(&event_label(&alert.target)),
        alert.attempt,
        alert.max_attempts,
        escape_html(&alert.reason),
        Local::now().format("%Y-%m-%d %H:%M:%S"),
    )
}
