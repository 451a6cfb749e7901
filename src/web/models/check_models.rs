use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::entities::check;

/// Fixed body of `POST /checks/stub`.
pub const CHECK_STUB_MESSAGE: &str = "This is a stub endpoint for creating a monitor.";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CheckOut {
    pub id: i32,
    pub monitor_id: i32,
    pub ts: DateTime<Utc>,
    pub latency_ms: i32,
    pub status_code: Option<i32>,
    pub ok: bool,
    pub error: Option<String>,
}

impl From<check::Model> for CheckOut {
    fn from(c: check::Model) -> Self {
        CheckOut {
            id: c.id,
            monitor_id: c.monitor_id,
            ts: c.ts,
            latency_ms: c.latency_ms,
            status_code: c.status_code,
            ok: c.ok,
            error: c.error,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct CheckListQuery {
    #[serde(default = "default_check_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_check_limit() -> u64 {
    50
}
