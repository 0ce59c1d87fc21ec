//! Background timers
//!
//! Two periodic tasks back the UI: a poller that refreshes the unread
//! notification badge from the server, and a ticker that drives elapsed-time
//! counters without touching the network. Each publishes on a
//! `tokio::sync::watch` channel and is torn down by its [`PeriodicTask`]
//! handle.

use crate::client::MarketplaceApi;
use crate::clock::Clock;
use crate::transport::Transport;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Handle to a spawned periodic task. Dropping it stops the task.
#[derive(Debug)]
pub struct PeriodicTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    fn spawn<F>(name: &'static str, interval: Duration, task: F) -> Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        info!(task = name, interval_ms = interval.as_millis() as u64, "Periodic task started");
        Self {
            name,
            handle: tokio::spawn(task),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            self.handle.abort();
            info!(task = self.name, "Periodic task stopped");
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Poll the unread notification count every `interval`, starting now.
///
/// A failed poll publishes 0. The task ends on its own once every receiver
/// is gone.
pub fn spawn_unread_poller<T>(
    api: Arc<MarketplaceApi<T>>,
    token: Option<String>,
    interval: Duration,
) -> (PeriodicTask, watch::Receiver<u64>)
where
    T: Transport + 'static,
{
    let (tx, rx) = watch::channel(0);

    let task = PeriodicTask::spawn("unread_poller", interval, async move {
        let mut ticks = tokio::time::interval(interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticks.tick().await;
            let count = match api.unread_notification_count(token.as_deref()).await {
                Ok(count) => count,
                Err(e) => {
                    debug!(kind = %e.kind(), error = %e, "Unread count poll failed");
                    0
                }
            };
            if tx.send(count).is_err() {
                break;
            }
        }
    });

    (task, rx)
}

/// Publish the clock's time every `interval` for elapsed-time displays
pub fn spawn_ticker(
    clock: Arc<dyn Clock>,
    interval: Duration,
) -> (PeriodicTask, watch::Receiver<DateTime<Utc>>) {
    let (tx, rx) = watch::channel(clock.now());

    let task = PeriodicTask::spawn("ticker", interval, async move {
        let mut ticks = tokio::time::interval(interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticks.tick().await;
            if tx.send(clock.now()).is_err() {
                break;
            }
        }
    });

    (task, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::ClientConfig;
    use crate::transport::{Method, MockTransport};
    use chrono::TimeZone;
    use serde_json::json;

    fn count_url() -> String {
        ClientConfig::default().url_for("notificaciones/no-leidas/count")
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_publishes_each_poll() {
        let api = Arc::new(MarketplaceApi::new(ClientConfig::default(), MockTransport::new()));
        api.transport()
            .respond_json(Method::Get, &count_url(), 200, json!({"count": 3}))
            .respond_json(Method::Get, &count_url(), 200, json!({"count": 5}));

        let (task, mut rx) = spawn_unread_poller(api.clone(), Some("t".into()), Duration::from_secs(30));

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 3);

        tokio::time::advance(Duration::from_secs(30)).await;
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 5);
        assert!(task.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_failure_publishes_zero() {
        let api = Arc::new(MarketplaceApi::new(ClientConfig::default(), MockTransport::new()));
        api.transport().unreachable(Method::Get, &count_url());

        let (_task, mut rx) = spawn_unread_poller(api, None, Duration::from_secs(30));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling() {
        let api = Arc::new(MarketplaceApi::new(ClientConfig::default(), MockTransport::new()));
        api.transport()
            .respond_json(Method::Get, &count_url(), 200, json!(1));

        let (task, mut rx) = spawn_unread_poller(api.clone(), None, Duration::from_secs(30));
        rx.changed().await.unwrap();

        task.cancel();
        // The aborted task drops its sender
        assert!(rx.changed().await.is_err());
        assert!(!task.is_running());

        let polls = api.transport().requests().len();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(api.transport().requests().len(), polls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_reads_clock_without_network() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let (task, mut rx) = spawn_ticker(clock.clone(), Duration::from_secs(1));

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), start);

        clock.advance(chrono::Duration::seconds(1));
        tokio::time::advance(Duration::from_secs(1)).await;
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), start + chrono::Duration::seconds(1));

        drop(task);
        assert!(rx.changed().await.is_err());
    }
}
