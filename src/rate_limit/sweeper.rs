use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval};

use super::admission::Admission;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Background expiry sweep over the rate limit store.
pub struct Sweeper {
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    pub fn start(admission: Arc<Admission>, every: Duration) -> Self {
        let every = every.max(Duration::from_millis(1));
        let (shutdown, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;

            info!("Rate limit sweeper started (interval: {:?})", every);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = admission.sweep();
                        debug!(
                            "Sweep removed {} keys, {} still tracked",
                            removed,
                            admission.tracked_keys()
                        );
                    }
                    _ = &mut stop_rx => break,
                }
            }

            info!("Rate limit sweeper stopped");
        });

        Self {
            shutdown: Some(shutdown),
            handle,
        }
    }

    /// Signal the task and wait for it to finish.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = self.handle.await {
            warn!("Rate limit sweeper ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::identifier::RequestMeta;
    use crate::rate_limit::policy::{PolicyTable, RateLimitPolicy};

    #[tokio::test]
    async fn periodic_sweep_clears_expired_keys_and_stops() {
        let mut table = PolicyTable::default();
        table
            .insert(RateLimitPolicy::new("flash", 1, 5, "busy", false))
            .unwrap();
        let admission = Arc::new(Admission::new(table));

        assert!(admission.admit("flash", &RequestMeta::new(Some("1.2.3.4"))).is_allowed());
        assert_eq!(admission.tracked_keys(), 1);

        let sweeper = Sweeper::start(Arc::clone(&admission), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        sweeper.stop().await;

        assert_eq!(admission.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn stop_returns_promptly() {
        let admission = Arc::new(Admission::new(PolicyTable::default()));
        let sweeper = Sweeper::start(admission, DEFAULT_SWEEP_INTERVAL);
        tokio::time::timeout(Duration::from_secs(1), sweeper.stop())
            .await
            .expect("sweeper should stop without waiting for a tick");
    }
}
