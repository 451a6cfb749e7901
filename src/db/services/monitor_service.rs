//! Service for managing monitors.
//!
//! Every lookup is scoped to the owning user: a monitor that exists but
//! belongs to somebody else behaves exactly like a missing one.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::db::entities::{monitor, prelude::*};
use crate::web::models::monitor_models::{MonitorCreate, MonitorUpdate};

pub async fn exists_url_for_user(
    db: &DatabaseConnection,
    user_id: i32,
    url: &str,
) -> Result<bool, DbErr> {
    let count = Monitor::find()
        .filter(monitor::Column::UserId.eq(user_id))
        .filter(monitor::Column::Url.eq(url))
        .count(db)
        .await?;
    Ok(count > 0)
}

pub async fn create_monitor(
    db: &DatabaseConnection,
    user_id: i32,
    monitor_data: MonitorCreate,
) -> Result<monitor::Model, DbErr> {
    let new_monitor = monitor::ActiveModel {
        user_id: Set(user_id),
        name: Set(monitor_data.name),
        url: Set(monitor_data.url),
        method: Set(monitor_data.method),
        expected_status: Set(monitor_data.expected_status),
        interval_s: Set(monitor_data.interval_s),
        timeout_ms: Set(monitor_data.timeout_ms),
        is_paused: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    new_monitor.insert(db).await
}

pub async fn list_for_user(
    db: &DatabaseConnection,
    user_id: i32,
    limit: u64,
    offset: u64,
) -> Result<Vec<monitor::Model>, DbErr> {
    Monitor::find()
        .filter(monitor::Column::UserId.eq(user_id))
        .order_by_asc(monitor::Column::Id)
        .limit(limit)
        .offset(offset)
        .all(db)
        .await
}

pub async fn get_for_user(
    db: &DatabaseConnection,
    user_id: i32,
    monitor_id: i32,
) -> Result<Option<monitor::Model>, DbErr> {
    Monitor::find_by_id(monitor_id)
        .filter(monitor::Column::UserId.eq(user_id))
        .one(db)
        .await
}

/// Applies the fields present in `payload`. Returns `None` when the monitor
/// is missing or owned by another user.
pub async fn update_for_user(
    db: &DatabaseConnection,
    user_id: i32,
    monitor_id: i32,
    payload: MonitorUpdate,
) -> Result<Option<monitor::Model>, DbErr> {
    let Some(existing) = get_for_user(db, user_id, monitor_id).await? else {
        return Ok(None);
    };

    let mut active_monitor: monitor::ActiveModel = existing.into();

    if let Some(name) = payload.name {
        active_monitor.name = Set(name);
    }
    if let Some(url) = payload.url {
        active_monitor.url = Set(url);
    }
    if let Some(method) = payload.method {
        active_monitor.method = Set(method);
    }
    if let Some(expected_status) = payload.expected_status {
        active_monitor.expected_status = Set(expected_status);
    }
    if let Some(interval_s) = payload.interval_s {
        active_monitor.interval_s = Set(interval_s);
    }
    if let Some(timeout_ms) = payload.timeout_ms {
        active_monitor.timeout_ms = Set(timeout_ms);
    }
    if let Some(is_paused) = payload.is_paused {
        active_monitor.is_paused = Set(is_paused);
    }

    active_monitor.update(db).await.map(Some)
}

pub async fn delete_for_user(
    db: &DatabaseConnection,
    user_id: i32,
    monitor_id: i32,
) -> Result<bool, DbErr> {
    let result = Monitor::delete_many()
        .filter(monitor::Column::Id.eq(monitor_id))
        .filter(monitor::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// All monitors the scheduler should be probing.
pub async fn get_runnable_monitors(db: &DatabaseConnection) -> Result<Vec<monitor::Model>, DbErr> {
    Monitor::find()
        .filter(monitor::Column::IsPaused.eq(false))
        .order_by_asc(monitor::Column::Id)
        .all(db)
        .await
}
