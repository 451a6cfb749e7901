use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::db::entities::monitor;
use crate::web::error::AppError;

pub const ALLOWED_METHODS: [&str; 5] = ["GET", "POST", "HEAD", "PUT", "DELETE"];
pub const INTERVAL_RANGE_S: std::ops::RangeInclusive<i32> = 10..=86400;
pub const TIMEOUT_RANGE_MS: std::ops::RangeInclusive<i32> = 100..=60000;
pub const STATUS_RANGE: std::ops::RangeInclusive<i32> = 100..=599;
const NAME_MAX_LEN: usize = 200;
const URL_MAX_LEN: usize = 2048;

fn default_method() -> String {
    "GET".to_string()
}

fn default_expected_status() -> i32 {
    200
}

fn default_interval_s() -> i32 {
    60
}

fn default_timeout_ms() -> i32 {
    2500
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct MonitorCreate {
    pub name: String,
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_expected_status")]
    pub expected_status: i32,
    #[serde(default = "default_interval_s")]
    pub interval_s: i32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: i32,
}

impl MonitorCreate {
    /// Checks ranges and normalizes `url` and `method` in place.
    pub fn validate(&mut self) -> Result<(), AppError> {
        validate_name(&self.name)?;
        self.url = normalize_url(&self.url)?;
        self.method = normalize_method(&self.method)?;
        validate_expected_status(self.expected_status)?;
        validate_interval(self.interval_s)?;
        validate_timeout(self.timeout_ms)
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct MonitorUpdate {
    pub name: Option<String>,
    pub url: Option<String>,
    pub method: Option<String>,
    pub expected_status: Option<i32>,
    pub interval_s: Option<i32>,
    pub timeout_ms: Option<i32>,
    pub is_paused: Option<bool>,
}

impl MonitorUpdate {
    pub fn validate(&mut self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(url) = &self.url {
            self.url = Some(normalize_url(url)?);
        }
        if let Some(method) = &self.method {
            self.method = Some(normalize_method(method)?);
        }
        if let Some(status) = self.expected_status {
            validate_expected_status(status)?;
        }
        if let Some(interval) = self.interval_s {
            validate_interval(interval)?;
        }
        if let Some(timeout) = self.timeout_ms {
            validate_timeout(timeout)?;
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MonitorOut {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub url: String,
    pub method: String,
    pub expected_status: i32,
    pub interval_s: i32,
    pub timeout_ms: i32,
    pub is_paused: bool,
    pub created_at: DateTime<Utc>,
}

impl From<monitor::Model> for MonitorOut {
    fn from(m: monitor::Model) -> Self {
        MonitorOut {
            id: m.id,
            user_id: m.user_id,
            name: m.name,
            url: m.url,
            method: m.method,
            expected_status: m.expected_status,
            interval_s: m.interval_s,
            timeout_ms: m.timeout_ms,
            is_paused: m.is_paused,
            created_at: m.created_at,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct MonitorListQuery {
    #[serde(default = "default_list_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_list_limit() -> u64 {
    25
}

fn validate_name(name: &str) -> Result<(), AppError> {
    let len = name.chars().count();
    if len == 0 || len > NAME_MAX_LEN {
        return Err(AppError::InvalidInput(format!(
            "name must be between 1 and {NAME_MAX_LEN} characters"
        )));
    }
    Ok(())
}

pub fn normalize_url(raw: &str) -> Result<String, AppError> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| AppError::InvalidInput(format!("invalid url: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(AppError::InvalidInput(
            "url must be an absolute http or https URL".to_string(),
        ));
    }
    let normalized = parsed.to_string();
    if normalized.len() > URL_MAX_LEN {
        return Err(AppError::InvalidInput(format!(
            "url must be at most {URL_MAX_LEN} characters"
        )));
    }
    Ok(normalized)
}

fn normalize_method(raw: &str) -> Result<String, AppError> {
    let method = raw.trim().to_ascii_uppercase();
    if !ALLOWED_METHODS.contains(&method.as_str()) {
        return Err(AppError::InvalidInput(format!(
            "method must be one of {}",
            ALLOWED_METHODS.join(", ")
        )));
    }
    Ok(method)
}

fn validate_expected_status(status: i32) -> Result<(), AppError> {
    if !STATUS_RANGE.contains(&status) {
        return Err(AppError::InvalidInput(
            "expected_status must be between 100 and 599".to_string(),
        ));
    }
    Ok(())
}

fn validate_interval(interval_s: i32) -> Result<(), AppError> {
    if !INTERVAL_RANGE_S.contains(&interval_s) {
        return Err(AppError::InvalidInput(
            "interval_s must be between 10 and 86400".to_string(),
        ));
    }
    Ok(())
}

fn validate_timeout(timeout_ms: i32) -> Result<(), AppError> {
    if !TIMEOUT_RANGE_MS.contains(&timeout_ms) {
        return Err(AppError::InvalidInput(
            "timeout_ms must be between 100 and 60000".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(url: &str) -> MonitorCreate {
        serde_json::from_value(serde_json::json!({ "name": "site", "url": url })).unwrap()
    }

    #[test]
    fn create_applies_defaults() {
        let m = create("https://example.com");
        assert_eq!(m.method, "GET");
        assert_eq!(m.expected_status, 200);
        assert_eq!(m.interval_s, 60);
        assert_eq!(m.timeout_ms, 2500);
    }

    #[test]
    fn url_is_normalized() {
        let mut m = create("https://Example.com");
        m.validate().unwrap();
        assert_eq!(m.url, "https://example.com/");
    }

    #[test]
    fn rejects_non_http_urls() {
        for bad in ["ftp://example.com", "example.com", "mailto:a@b.io", "http://"] {
            assert!(create(bad).validate().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn method_is_uppercased_and_checked() {
        let mut m = create("http://example.com");
        m.method = "head".to_string();
        m.validate().unwrap();
        assert_eq!(m.method, "HEAD");

        m.method = "PATCH".to_string();
        assert!(m.validate().is_err());
    }

    #[test]
    fn update_checks_ranges_only_for_present_fields() {
        assert!(MonitorUpdate::default().validate().is_ok());

        let mut too_fast = MonitorUpdate {
            interval_s: Some(5),
            ..Default::default()
        };
        assert!(too_fast.validate().is_err());

        let mut too_slow = MonitorUpdate {
            timeout_ms: Some(60_001),
            ..Default::default()
        };
        assert!(too_slow.validate().is_err());

        let mut ok = MonitorUpdate {
            interval_s: Some(86400),
            timeout_ms: Some(100),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_fields() {
        let parsed = serde_json::from_value::<MonitorCreate>(serde_json::json!({
            "name": "site",
            "url": "https://example.com",
            "user_id": 3,
        }));
        assert!(parsed.is_err());
    }
}
