use sea_orm::DatabaseConnection;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::db::services::check_service::{self, NewCheck};

/// Persists probe results received over a channel.
pub struct CheckWriter {
    db: DatabaseConnection,
    rx: mpsc::Receiver<NewCheck>,
}

impl CheckWriter {
    /// Creates the writer together with the sender handed to probe tasks.
    pub fn channel(db: DatabaseConnection, capacity: usize) -> (mpsc::Sender<NewCheck>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { db, rx })
    }

    /// Runs until every sender has been dropped.
    pub async fn run(mut self) {
        while let Some(result) = self.rx.recv().await {
            let monitor_id = result.monitor_id;
            // Fails when the monitor was deleted after the probe started.
            if let Err(e) = check_service::record_check(&self.db, result).await {
                error!(monitor_id, error = %e, "Failed to persist check result.");
            }
        }
        info!("Check writer stopped.");
    }
}
