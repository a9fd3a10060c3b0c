//! Diagnostics: inspect proxies and probe event pages without registering.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use reqwest::redirect::Policy;
use tracing::{info, warn};

use crate::inputs::{read_proxies, read_targets};
use crate::ui;

/// Client for HEAD probes. Redirects are reported, not followed.
pub fn probe_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .build()
}

/// HEAD `url` and return the response status.
pub async fn probe_target(client: &Client, url: &str) -> Result<u16, String> {
    client
        .head(url)
        .send()
        .await
        .map(|r| r.status().as_u16())
        .map_err(|e| e.to_string())
}

pub async fn run(proxies_path: &Path, events_path: &Path) -> Result<(), reqwest::Error> {
    info!(path = %proxies_path.display(), "checking proxies");
    match read_proxies(proxies_path) {
        Ok(proxies) => ui::print_proxies(&proxies),
        Err(e) => warn!(error = %e, "could not load proxies"),
    }

    info!(path = %events_path.display(), "checking event pages");
    let targets = match read_targets(events_path) {
        Ok(targets) => targets,
        Err(e) => {
            warn!(error = %e, "could not load event list");
            return Ok(());
        }
    };
    if targets.is_empty() {
        warn!("no event URLs configured");
        return Ok(());
    }

    let client = probe_client()?;
    for target in &targets {
        let outcome = probe_target(&client, target).await;
        match &outcome {
            Ok(status) => info!(target_url = %target, status, "probed"),
            Err(reason) => warn!(target_url = %target, %reason, "probe failed"),
        }
        ui::print_target_check(target, outcome);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn probe_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/event/open"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/event/closed"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = probe_client().unwrap();
        let open = probe_target(&client, &format!("{}/event/open", server.uri())).await;
        let closed = probe_target(&client, &format!("{}/event/closed", server.uri())).await;
        assert_eq!(open, Ok(200));
        assert_eq!(closed, Ok(404));
    }

    #[tokio::test]
    async fn probe_does_not_follow_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/moved"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/elsewhere"))
            .mount(&server)
            .await;

        let client = probe_client().unwrap();
        let status = probe_target(&client, &format!("{}/moved", server.uri())).await;
        assert_eq!(status, Ok(302));
    }

    #[tokio::test]
    async fn probe_unreachable_host_is_an_error() {
        let client = probe_client().unwrap();
        assert!(probe_target(&client, "http://127.0.0.1:1/").await.is_err());
    }
}
