//! Usage telemetry
//!
//! Fire-and-forget run start/end pings. Inert unless both enabled and
//! pointed at an endpoint; every failure is swallowed at debug level so
//! telemetry can never affect a run.

use crate::config::TelemetryConfig;
use serde_json::json;
use tracing::debug;

/// Telemetry client holding the endpoint and an HTTP client
pub struct TelemetryClient {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl TelemetryClient {
    /// Build a client from config; a disabled config yields an inert client
    pub fn new(config: &TelemetryConfig) -> Self {
        let endpoint = if config.enabled {
            config.endpoint.clone()
        } else {
            None
        };
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Report the start of a run
    pub async fn track_start(&self, service: &str, profile: &str, parallel: usize, limit: usize) {
        self.post(json!({
            "event": "download_start",
            "version": env!("CARGO_PKG_VERSION"),
            "service": service,
            "profile": profile,
            "parallel": parallel,
            "limit": limit,
        }))
        .await;
    }

    /// Report the end of a run
    pub async fn track_end(
        &self,
        service: &str,
        profile: &str,
        total: usize,
        failures: usize,
        duplicates: usize,
    ) {
        self.post(json!({
            "event": "download_end",
            "version": env!("CARGO_PKG_VERSION"),
            "service": service,
            "profile": profile,
            "total": total,
            "failures": failures,
            "duplicates": duplicates,
        }))
        .await;
    }

    async fn post(&self, payload: serde_json::Value) {
        let Some(endpoint) = &self.endpoint else {
            return;
        };
        match self.client.post(endpoint).json(&payload).send().await {
            Ok(response) => {
                debug!(status = %response.status(), "telemetry ping sent");
            }
            Err(err) => {
                debug!(%err, "telemetry ping failed");
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn pings_carry_event_and_counts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/t"))
            .and(body_partial_json(serde_json::json!({
                "event": "download_end",
                "total": 5,
                "duplicates": 2,
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = TelemetryClient::new(&TelemetryConfig {
            enabled: true,
            endpoint: Some(format!("{}/t", server.uri())),
        });
        client.track_end("fanwork", "Alice", 5, 1, 2).await;
    }

    #[tokio::test]
    async fn disabled_client_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let client = TelemetryClient::new(&TelemetryConfig {
            enabled: false,
            endpoint: Some(server.uri()),
        });
        client.track_start("fanwork", "Alice", 3, 100).await;
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_swallowed() {
        let client = TelemetryClient::new(&TelemetryConfig {
            enabled: true,
            endpoint: Some("http://127.0.0.1:1/t".to_string()),
        });
        // Must not panic or error.
        client.track_start("fanwork", "Alice", 3, 100).await;
    }
}
