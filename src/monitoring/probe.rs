use chrono::Utc;
use reqwest::Method;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::db::entities::monitor;
use crate::db::services::check_service::NewCheck;

const RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// The probe parameters of a monitor. A running task is restarted when these change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub monitor_id: i32,
    pub url: String,
    pub method: String,
    pub expected_status: i32,
    pub interval_s: u64,
    pub timeout_ms: u64,
}

impl ProbeTarget {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_s.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

impl From<&monitor::Model> for ProbeTarget {
    fn from(m: &monitor::Model) -> Self {
        Self {
            monitor_id: m.id,
            url: m.url.clone(),
            method: m.method.clone(),
            expected_status: m.expected_status,
            interval_s: u64::try_from(m.interval_s).unwrap_or(1),
            timeout_ms: u64::try_from(m.timeout_ms).unwrap_or(1),
        }
    }
}

/// Issues one request against the target and reports the outcome.
///
/// Transport failures (connect errors, timeouts) are retried up to `retries`
/// more times. A response with an unexpected status is not retried.
pub async fn probe(client: &reqwest::Client, target: &ProbeTarget, retries: u32) -> NewCheck {
    let ts = Utc::now();
    let method = match Method::from_bytes(target.method.as_bytes()) {
        Ok(method) => method,
        Err(_) => {
            return failed(target, ts, 0, format!("Unsupported method {}", target.method));
        }
    };

    let mut attempt = 0;
    loop {
        let start_time = Instant::now();
        let result = client
            .request(method.clone(), &target.url)
            .timeout(target.timeout())
            .send()
            .await;
        let latency_ms = i32::try_from(start_time.elapsed().as_millis()).unwrap_or(i32::MAX);

        match result {
            Ok(response) => {
                let status = i32::from(response.status().as_u16());
                return NewCheck {
                    monitor_id: target.monitor_id,
                    ts,
                    latency_ms,
                    status_code: Some(status),
                    ok: status == target.expected_status,
                    error: None,
                };
            }
            Err(e) if attempt < retries => {
                attempt += 1;
                debug!(monitor_id = target.monitor_id, attempt, error = %e, "Probe failed, retrying.");
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
            }
            Err(e) => {
                let details = if e.is_timeout() {
                    "Request timed out".to_string()
                } else {
                    e.to_string()
                };
                return failed(target, ts, latency_ms, details);
            }
        }
    }
}

fn failed(
    target: &ProbeTarget,
    ts: chrono::DateTime<Utc>,
    latency_ms: i32,
    error: String,
) -> NewCheck {
    NewCheck {
        monitor_id: target.monitor_id,
        ts,
        latency_ms,
        status_code: None,
        ok: false,
        error: Some(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(method: &str) -> ProbeTarget {
        ProbeTarget {
            monitor_id: 7,
            url: "http://127.0.0.1:1/".to_string(),
            method: method.to_string(),
            expected_status: 200,
            interval_s: 60,
            timeout_ms: 500,
        }
    }

    #[test]
    fn target_copies_probe_parameters() {
        let model = monitor::Model {
            id: 3,
            user_id: 1,
            name: "api".into(),
            url: "https://example.com/".into(),
            method: "HEAD".into(),
            expected_status: 204,
            interval_s: 30,
            timeout_ms: 1500,
            is_paused: false,
            created_at: Utc::now(),
        };
        let t = ProbeTarget::from(&model);
        assert_eq!(t.monitor_id, 3);
        assert_eq!(t.interval(), Duration::from_secs(30));
        assert_eq!(t.timeout(), Duration::from_millis(1500));
        assert_eq!(t.expected_status, 204);
    }

    #[tokio::test]
    async fn unreachable_target_reports_transport_error() {
        let client = reqwest::Client::new();
        let check = probe(&client, &target("GET"), 0).await;
        assert_eq!(check.monitor_id, 7);
        assert!(!check.ok);
        assert_eq!(check.status_code, None);
        assert!(check.error.is_some());
    }

    #[tokio::test]
    async fn invalid_method_is_reported_without_a_request() {
        let client = reqwest::Client::new();
        let check = probe(&client, &target("NOT A METHOD"), 3).await;
        assert!(!check.ok);
        assert_eq!(check.latency_ms, 0);
        assert!(check.error.unwrap().starts_with("Unsupported method"));
    }
}
