//! Acceptance deadline monitor
//!
//! Deadlines live on the order rows, so a restart loses nothing: the next
//! sweep picks up every pending order whose deadline has passed. Firing is a
//! conditional update in the store, which keeps concurrent sweepers from
//! escalating the same order twice.

use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::database::Store;
use crate::services::OrderEngine;
use crate::utils::errors::Result;

pub struct AcceptanceMonitor {
    store: Arc<dyn Store>,
    orders: OrderEngine,
    interval: Duration,
}

impl AcceptanceMonitor {
    pub fn new(store: Arc<dyn Store>, orders: OrderEngine) -> Self {
        let interval = orders.config().sweep_interval();
        Self { store, orders, interval }
    }

    /// Escalate every due deadline once; returns how many fired
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<usize> {
        let due = self.store.due_acceptance_timers(now).await?;
        let mut fired = 0;

        for order in due {
            match self.orders.escalate(order.id, now).await {
                Ok(true) => fired += 1,
                Ok(false) => debug!(order_id = order.id, "Deadline already handled"),
                Err(e) => warn!(order_id = order.id, error = %e, "Failed to escalate order"),
            }
        }

        Ok(fired)
    }

    /// Sweep on a fixed interval until `shutdown` flips to true
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "Acceptance monitor started");

        let mut interval = tokio::time::interval(self.interval);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.sweep_once(Utc::now()).await {
                        Ok(0) => {}
                        Ok(fired) => info!(fired = fired, "Acceptance deadlines escalated"),
                        Err(e) => warn!(error = %e, "Acceptance sweep failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Acceptance monitor stopped");
    }
}
