//! WebDriver server readiness

use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{DriverError, DriverResult};

/// Wait until the WebDriver server answers `GET /status`
///
/// chromedriver and geckodriver both report `{"value": {"ready": bool}}`; a
/// server that answers without that field is taken as ready.
pub async fn wait_for_webdriver(url: &str, timeout: Duration) -> DriverResult<()> {
    let status_url = format!("{}/status", url.trim_end_matches('/'));
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    let start = std::time::Instant::now();
    let mut attempts = 0;

    while attempts == 0 || start.elapsed() < timeout {
        attempts += 1;

        match client.get(&status_url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let body: serde_json::Value = resp.json().await.unwrap_or_default();
                match body.pointer("/value/ready").and_then(|v| v.as_bool()) {
                    Some(false) => warn!("WebDriver at {} is not ready yet", url),
                    _ => return Ok(()),
                }
            }
            Ok(resp) => {
                warn!("WebDriver status returned {}", resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for WebDriver at {}...", url);
                }
                if !e.is_connect() {
                    warn!("WebDriver status error: {}", e);
                }
            }
        }

        sleep(Duration::from_millis(250)).await;
    }

    Err(DriverError::WebDriverUnavailable {
        url: url.to_string(),
        attempts,
    })
}
