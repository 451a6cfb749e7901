use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::db::entities::{check, prelude::*};

/// A probe result waiting to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCheck {
    pub monitor_id: i32,
    pub ts: DateTime<Utc>,
    pub latency_ms: i32,
    pub status_code: Option<i32>,
    pub ok: bool,
    pub error: Option<String>,
}

pub async fn record_check(db: &DatabaseConnection, result: NewCheck) -> Result<check::Model, DbErr> {
    let new_check = check::ActiveModel {
        monitor_id: Set(result.monitor_id),
        ts: Set(result.ts),
        latency_ms: Set(result.latency_ms.max(0)),
        status_code: Set(result.status_code),
        ok: Set(result.ok),
        error: Set(result.error),
        ..Default::default()
    };
    new_check.insert(db).await
}

/// Check history of one monitor, newest first.
pub async fn list_for_monitor(
    db: &DatabaseConnection,
    monitor_id: i32,
    limit: u64,
    offset: u64,
) -> Result<Vec<check::Model>, DbErr> {
    Check::find()
        .filter(check::Column::MonitorId.eq(monitor_id))
        .order_by_desc(check::Column::Ts)
        .order_by_desc(check::Column::Id)
        .limit(limit)
        .offset(offset)
        .all(db)
        .await
}
