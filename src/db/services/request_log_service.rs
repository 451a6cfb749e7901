use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};

use crate::db::entities::request_log;

pub async fn record_request(
    db: &DatabaseConnection,
    method: &str,
    path: &str,
    status: u16,
    latency_ms: i32,
    ip: Option<String>,
) -> Result<(), DbErr> {
    let entry = request_log::ActiveModel {
        method: Set(truncate(method, 8)),
        path: Set(truncate(path, 512)),
        status: Set(i32::from(status)),
        latency_ms: Set(latency_ms),
        ip: Set(ip.map(|ip| truncate(&ip, 64))),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    entry.insert(db).await?;
    Ok(())
}

// Column widths are fixed; postgres rejects longer values.
fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("/api/monitors", 4), "/api");
        assert_eq!(truncate("мониторы", 3), "мон");
        assert_eq!(truncate("GET", 8), "GET");
    }
}
