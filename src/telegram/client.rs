use std::path::Path;
use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::ChatTransport;
use super::error::TelegramError;
use super::types::{ApiResponse, FileInfo, SendMessageRequest, Update};

const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

pub const API_BASE: &str = "https://api.telegram.org";

pub struct TelegramClient {
    token: String,
    client: Client,
    base_url: String,
}

impl TelegramClient {
    /// `base_url` is [`API_BASE`] in production and a mock server in tests.
    pub fn with_base_url(token: String, base_url: String) -> Result<Self, TelegramError> {
        // Long polls hold the connection open, so the request timeout must
        // exceed any `getUpdates` timeout we ask for.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(90))
            .build()?;
        Ok(Self {
            token,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.token)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{file_path}", self.base_url, self.token)
    }

    /// Long-poll for updates starting at `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, TelegramError> {
        let response = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&[("offset", offset.to_string()), ("timeout", timeout_secs.to_string())])
            .send()
            .await?;
        let updates: Vec<Update> = read_result(response).await?;
        debug!(count = updates.len(), offset, "received updates");
        Ok(updates)
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let req = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "HTML",
        };
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&req)
            .send()
            .await?;
        read_result::<serde_json::Value>(response).await?;
        Ok(())
    }

    pub async fn get_file(&self, file_id: &str) -> Result<FileInfo, TelegramError> {
        let response = self
            .client
            .get(self.method_url("getFile"))
            .query(&[("file_id", file_id)])
            .send()
            .await?;
        read_result(response).await
    }

    /// Resolve `file_id` and store its contents at `dest`. Returns the byte count.
    pub async fn download_file(&self, file_id: &str, dest: &Path) -> Result<u64, TelegramError> {
        let info = self.get_file(file_id).await?;
        let file_path = info
            .file_path
            .ok_or_else(|| TelegramError::MissingFilePath(info.file_id.clone()))?;

        let response = self.client.get(self.file_url(&file_path)).send().await?;
        let response = check_status(response).await?;
        let bytes = response.bytes().await?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;
        debug!(file_id, dest = %dest.display(), bytes = bytes.len(), "downloaded file");
        Ok(bytes.len() as u64)
    }
}

impl ChatTransport for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        self.send_message(chat_id, text).await
    }

    async fn download_document(&self, file_id: &str, dest: &Path) -> Result<u64, TelegramError> {
        self.download_file(file_id, dest).await
    }
}

async fn check_status(response: Response) -> Result<Response, TelegramError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let header = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let retry_after = match header {
            Some(secs) => secs,
            None => response
                .json::<ApiResponse<serde_json::Value>>()
                .await
                .ok()
                .and_then(|body| body.parameters)
                .and_then(|p| p.retry_after)
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        };
        return Err(TelegramError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(TelegramError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response)
}

async fn read_result<T: DeserializeOwned>(response: Response) -> Result<T, TelegramError> {
    let response = check_status(response).await?;
    let body = response.json::<ApiResponse<T>>().await?;
    match (body.ok, body.result) {
        (true, Some(result)) => Ok(result),
        (_, _) => Err(TelegramError::Rejected(
            body.description.unwrap_or_else(|| "no result".to_string()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> TelegramClient {
        TelegramClient::with_base_url("TOKEN".into(), server.uri()).unwrap()
    }

    #[tokio::test]
    async fn get_updates_parses_messages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/botTOKEN/getUpdates"))
            .and(query_param("offset", "5"))
            .and(query_param("timeout", "30"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [
                    {"update_id": 5, "message": {"message_id": 1, "chat": {"id": 9, "type": "private"}, "text": "/help"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let updates = client(&server).await.get_updates(5, 30).await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 5);
        assert_eq!(updates[0].message.as_ref().unwrap().text.as_deref(), Some("/help"));
    }

    #[tokio::test]
    async fn send_message_posts_html() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .and(body_partial_json(json!({"chat_id": 9, "text": "<b>hi</b>", "parse_mode": "HTML"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {"message_id": 3}})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).await.send_message(9, "<b>hi</b>").await.unwrap();
    }

    #[tokio::test]
    async fn rate_limit_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let err = client(&server).await.send_message(9, "x").await.unwrap_err();
        assert!(matches!(err, TelegramError::RateLimited { retry_after_secs: 7 }));
    }

    #[tokio::test]
    async fn rate_limit_reads_retry_after_from_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/botTOKEN/getUpdates"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "ok": false,
                "error_code": 429,
                "description": "Too Many Requests: retry after 35",
                "parameters": {"retry_after": 35}
            })))
            .mount(&server)
            .await;

        let err = client(&server).await.get_updates(0, 1).await.unwrap_err();
        assert!(matches!(err, TelegramError::RateLimited { retry_after_secs: 35 }));
    }

    #[tokio::test]
    async fn rate_limit_without_hint_waits_one_second() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = client(&server).await.send_message(9, "x").await.unwrap_err();
        assert!(matches!(err, TelegramError::RateLimited { retry_after_secs: 1 }));
    }

    #[tokio::test]
    async fn http_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/botTOKEN/getUpdates"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let err = client(&server).await.get_updates(0, 1).await.unwrap_err();
        match err {
            TelegramError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Unauthorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn ok_false_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": false, "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let err = client(&server).await.send_message(1, "x").await.unwrap_err();
        assert_eq!(err.to_string(), "request rejected: Bad Request: chat not found");
    }

    #[tokio::test]
    async fn download_file_writes_contents() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/botTOKEN/getFile"))
            .and(query_param("file_id", "F1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "result": {"file_id": "F1", "file_path": "documents/file_1.txt"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/file/botTOKEN/documents/file_1.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a@x.com\nb@x.com\n"))
            .mount(&server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("nested").join("emails_9.txt");
        let written = client(&server).await.download_file("F1", &dest).await.unwrap();
        assert_eq!(written, 16);
        assert_eq!(std::fs::read_to_string(dest).unwrap(), "a@x.com\nb@x.com\n");
    }

    #[tokio::test]
    async fn download_without_file_path_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/botTOKEN/getFile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "result": {"file_id": "F2"}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let err = client(&server)
            .await
            .download_file("F2", &dir.path().join("x.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, TelegramError::MissingFilePath(id) if id == "F2"));
    }
}
