use sea_orm::{DatabaseConnection, DbErr};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::probe::{ProbeTarget, probe};
use crate::db::services::check_service::NewCheck;
use crate::db::services::monitor_service;
use crate::server::config::ServerConfig;

/// Upper bound of the random delay before a task's first probe.
const MAX_START_JITTER_MS: u64 = 1000;

/// Keeps one probe task per runnable monitor.
pub struct MonitorScheduler {
    db: DatabaseConnection,
    client: reqwest::Client,
    results_tx: mpsc::Sender<NewCheck>,
    permits: Arc<Semaphore>,
    reconcile_every: Duration,
    retries: u32,
    // monitor_id -> (task handle, parameters the task was started with)
    running_tasks: HashMap<i32, (JoinHandle<()>, ProbeTarget)>,
}

impl MonitorScheduler {
    pub fn new(
        db: DatabaseConnection,
        results_tx: mpsc::Sender<NewCheck>,
        config: &ServerConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("api-health-checker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            db,
            client,
            results_tx,
            permits: Arc::new(Semaphore::new(config.max_concurrent_probes.max(1))),
            reconcile_every: Duration::from_secs(config.scheduler_reconcile_seconds.max(1)),
            retries: config.probe_retries,
            running_tasks: HashMap::new(),
        })
    }

    pub fn running_monitor_ids(&self) -> HashSet<i32> {
        self.running_tasks.keys().copied().collect()
    }

    /// Parameters the monitor's current task was started with.
    pub fn running_target(&self, monitor_id: i32) -> Option<&ProbeTarget> {
        self.running_tasks.get(&monitor_id).map(|(_, target)| target)
    }

    /// Reconciles until `shutdown_rx` fires or its sender is dropped.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<()>) {
        info!(every = ?self.reconcile_every, "Monitor scheduler started.");
        loop {
            if let Err(e) = self.reconcile().await {
                error!(error = %e, "Failed to load monitors, keeping current tasks.");
            }

            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                _ = tokio::time::sleep(self.reconcile_every) => {}
            }
        }
        self.stop_all();
        info!("Monitor scheduler stopped.");
    }

    /// Brings the running tasks in line with the monitors in the database.
    pub async fn reconcile(&mut self) -> Result<(), DbErr> {
        let desired: HashMap<i32, ProbeTarget> = monitor_service::get_runnable_monitors(&self.db)
            .await?
            .iter()
            .map(|m| (m.id, ProbeTarget::from(m)))
            .collect();

        // Deleted or paused.
        self.running_tasks.retain(|monitor_id, (handle, _)| {
            if desired.contains_key(monitor_id) {
                return true;
            }
            info!(monitor_id, "Stopping probe task.");
            handle.abort();
            false
        });

        for (monitor_id, target) in desired {
            if let Some((handle, running)) = self.running_tasks.get(&monitor_id) {
                if *running == target && !handle.is_finished() {
                    continue;
                }
            }

            if let Some((handle, _)) = self.running_tasks.remove(&monitor_id) {
                info!(monitor_id, "Restarting probe task with new parameters.");
                handle.abort();
                // The old task must be gone before its replacement can probe.
                if let Err(e) = handle.await {
                    if !e.is_cancelled() {
                        warn!(monitor_id, error = %e, "Probe task ended abnormally.");
                    }
                }
            } else {
                info!(monitor_id, "Starting probe task.");
            }

            let handle = self.spawn_probe_task(target.clone());
            self.running_tasks.insert(monitor_id, (handle, target));
        }
        Ok(())
    }

    fn stop_all(&mut self) {
        for (_, (handle, _)) in self.running_tasks.drain() {
            handle.abort();
        }
    }

    fn spawn_probe_task(&self, target: ProbeTarget) -> JoinHandle<()> {
        let client = self.client.clone();
        let results_tx = self.results_tx.clone();
        let permits = self.permits.clone();
        let retries = self.retries;

        tokio::spawn(async move {
            let jitter_cap = MAX_START_JITTER_MS.min(target.interval_s * 1000);
            let jitter = rand::random_range(0..=jitter_cap);
            tokio::time::sleep(Duration::from_millis(jitter)).await;

            loop {
                let result = {
                    let Ok(_permit) = permits.acquire().await else {
                        break;
                    };
                    probe(&client, &target, retries).await
                };

                if results_tx.send(result).await.is_err() {
                    warn!(
                        monitor_id = target.monitor_id,
                        "Check writer is gone, stopping probe task."
                    );
                    break;
                }
                tokio::time::sleep(target.interval()).await;
            }
        })
    }
}

impl Drop for MonitorScheduler {
    fn drop(&mut self) {
        self.stop_all();
    }
}
