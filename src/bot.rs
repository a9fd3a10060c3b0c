//! Long-polling loop feeding Telegram updates to the control plane.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::attempt::RegistrationAttempt;
use crate::control::{ControlPlane, InboundEvent};
use crate::telegram::{TelegramClient, TelegramError};

const ERROR_BACKOFF: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Fetch one batch of updates, dispatch them in order and return the next
/// offset (`update_id + 1` of the last update seen).
pub async fn poll_once<A>(
    client: &TelegramClient,
    plane: &ControlPlane<TelegramClient, A>,
    offset: i64,
    timeout_secs: u64,
) -> Result<i64, TelegramError>
where
    A: RegistrationAttempt + 'static,
{
    let updates = client.get_updates(offset, timeout_secs).await?;
    let mut next = offset;
    for update in updates {
        next = next.max(update.update_id + 1);
        let Some(message) = update.message else {
            debug!(update_id = update.update_id, "skipping update without message");
            continue;
        };
        let Some(event) = InboundEvent::from_message(&message) else {
            debug!(update_id = update.update_id, "skipping message without text or document");
            continue;
        };
        debug!(
            update_id = update.update_id,
            chat_id = message.chat.id,
            chat_type = %message.chat.chat_type,
            user = message.from.as_ref().and_then(|u| u.username.as_deref()).unwrap_or("-"),
            file_size = message.document.as_ref().and_then(|d| d.file_size),
            "inbound message"
        );
        plane.handle(event).await;
    }
    Ok(next)
}

/// Poll until Ctrl-C. Poll errors are logged and retried after a pause.
pub async fn run<A>(client: &TelegramClient, plane: &ControlPlane<TelegramClient, A>, timeout_secs: u64)
where
    A: RegistrationAttempt + 'static,
{
    info!("bot started, send /start to begin");
    let mut offset = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                plane.shutdown().await;
                return;
            }
            polled = poll_once(client, plane, offset, timeout_secs) => match polled {
                Ok(next) => {
                    offset = next;
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(TelegramError::RateLimited { retry_after_secs }) => {
                    warn!(retry_after_secs, "rate limited by telegram");
                    tokio::time::sleep(Duration::from_secs(retry_after_secs)).await;
                }
                Err(e) => {
                    error!(error = %e, "failed to fetch updates");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::attempt::DryRunAttempt;
    use crate::campaign::RetryPolicy;
    use crate::control::ControlSettings;

    fn plane(client: Arc<TelegramClient>, dir: &TempDir) -> ControlPlane<TelegramClient, DryRunAttempt> {
        ControlPlane::new(
            client,
            Arc::new(DryRunAttempt::default()),
            ControlSettings {
                data_dir: dir.path().to_path_buf(),
                results_dir: dir.path().to_path_buf(),
                shared_proxies: dir.path().join("proxies.txt"),
                default_workers: 20,
                max_workers: 200,
                policy: RetryPolicy::default(),
            },
        )
    }

    #[tokio::test]
    async fn poll_once_dispatches_and_advances_offset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/botTOKEN/getUpdates"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [
                    {"update_id": 40, "message": {"message_id": 1, "chat": {"id": 9, "type": "private"}, "text": "/help"}},
                    {"update_id": 41},
                    {"update_id": 42, "message": {"message_id": 2, "chat": {"id": 9, "type": "private"}}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .and(body_partial_json(json!({"chat_id": 9, "parse_mode": "HTML"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {"message_id": 3}})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let client = Arc::new(TelegramClient::with_base_url("TOKEN".into(), server.uri()).unwrap());
        let plane = plane(Arc::clone(&client), &dir);

        let next = poll_once(&client, &plane, 0, 0).await.unwrap();
        assert_eq!(next, 43);
    }

    #[tokio::test]
    async fn poll_once_keeps_offset_when_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/botTOKEN/getUpdates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": []})))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let client = Arc::new(TelegramClient::with_base_url("TOKEN".into(), server.uri()).unwrap());
        let plane = plane(Arc::clone(&client), &dir);

        assert_eq!(poll_once(&client, &plane, 17, 0).await.unwrap(), 17);
    }

    #[tokio::test]
    async fn poll_once_propagates_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/botTOKEN/getUpdates"))
            .respond_with(ResponseTemplate::new(409).set_body_string("Conflict"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let client = Arc::new(TelegramClient::with_base_url("TOKEN".into(), server.uri()).unwrap());
        let plane = plane(Arc::clone(&client), &dir);

        let err = poll_once(&client, &plane, 0, 0).await.unwrap_err();
        assert!(matches!(err, TelegramError::Api { status: 409, .. }));
    }
}
