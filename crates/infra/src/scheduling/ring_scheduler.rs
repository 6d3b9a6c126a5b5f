//! Platform-timer adapter for the next alarm occurrence.
//!
//! The core emits "arm a timer for instant X" events; this scheduler is
//! the collaborator that owns the actual timer. One timer is armed at a
//! time (the soonest occurrence across all alarms); re-arming replaces
//! the previous timer. Join handles are tracked, cancellation is
//! explicit, and stop is timeout-bounded.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use chime_domain::ChimeError;

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Trait representing the action to run when the timer fires.
#[async_trait]
pub trait RingJob: Send + Sync {
    /// Deliver the trigger for the given alarm.
    async fn ring(&self, alarm_id: i64) -> Result<(), ChimeError>;
}

/// Configuration for the ring scheduler.
#[derive(Debug, Clone)]
pub struct RingSchedulerConfig {
    /// Timeout for awaiting the armed task's join handle on stop.
    pub join_timeout: Duration,
}

impl Default for RingSchedulerConfig {
    fn default() -> Self {
        Self { join_timeout: Duration::from_secs(5) }
    }
}

/// One-shot alarm timer with explicit lifecycle management.
pub struct RingScheduler {
    job: Arc<dyn RingJob>,
    config: RingSchedulerConfig,
    armed: Option<ArmedTimer>,
}

struct ArmedTimer {
    alarm_id: i64,
    cancellation: CancellationToken,
    handle: JoinHandle<()>,
}

impl RingScheduler {
    /// Create a scheduler with the default configuration.
    pub fn new(job: Arc<dyn RingJob>) -> Self {
        Self::with_config(RingSchedulerConfig::default(), job)
    }

    /// Create a scheduler with a custom configuration.
    pub fn with_config(config: RingSchedulerConfig, job: Arc<dyn RingJob>) -> Self {
        Self { job, config, armed: None }
    }

    /// Arm the timer for `at`, replacing any previously armed timer.
    ///
    /// An instant already in the past fires immediately.
    pub fn arm(&mut self, alarm_id: i64, at: DateTime<Utc>) {
        self.cancel_armed();

        let delay = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        let cancellation = CancellationToken::new();
        let token = cancellation.clone();
        let job = Arc::clone(&self.job);

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(alarm_id, "armed timer cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    if let Err(err) = job.ring(alarm_id).await {
                        warn!(alarm_id, error = %err, "ring delivery failed");
                    }
                }
            }
        });

        info!(alarm_id, at = %at, delay_ms = delay.as_millis() as u64, "alarm timer armed");
        self.armed = Some(ArmedTimer { alarm_id, cancellation, handle });
    }

    /// Cancel any armed timer without waiting for the task.
    pub fn disarm(&mut self) {
        if self.cancel_armed() {
            debug!("alarm timer disarmed");
        }
    }

    /// Cancel the armed timer and wait for its task to finish.
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let Some(armed) = self.armed.take() else {
            return Err(SchedulerError::NotArmed);
        };
        armed.cancellation.cancel();

        let join_timeout = self.config.join_timeout;
        tokio::time::timeout(join_timeout, armed.handle)
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: join_timeout.as_secs() })?
            .map_err(|err| SchedulerError::TaskJoinFailed(err.to_string()))?;
        Ok(())
    }

    /// Alarm id of the armed timer, if one is pending.
    pub fn armed_alarm(&self) -> Option<i64> {
        self.armed
            .as_ref()
            .filter(|armed| !armed.handle.is_finished())
            .map(|armed| armed.alarm_id)
    }

    fn cancel_armed(&mut self) -> bool {
        if let Some(armed) = self.armed.take() {
            armed.cancellation.cancel();
            true
        } else {
            false
        }
    }
}

impl Drop for RingScheduler {
    fn drop(&mut self) {
        if self.armed.is_some() {
            warn!("RingScheduler dropped while armed; cancelling timer");
            self.cancel_armed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingJob {
        rings: AtomicUsize,
        last_alarm: Mutex<Option<i64>>,
    }

    impl CountingJob {
        fn ring_count(&self) -> usize {
            self.rings.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RingJob for CountingJob {
        async fn ring(&self, alarm_id: i64) -> Result<(), ChimeError> {
            self.rings.fetch_add(1, Ordering::SeqCst);
            *self.last_alarm.lock().expect("lock") = Some(alarm_id);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn armed_timer_fires_at_the_instant() {
        let job = Arc::new(CountingJob::default());
        let mut scheduler = RingScheduler::new(job.clone());

        scheduler.arm(7, Utc::now() + chrono::Duration::seconds(30));
        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(job.ring_count(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(job.ring_count(), 1);
        assert_eq!(*job.last_alarm.lock().expect("lock"), Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_the_previous_timer() {
        let job = Arc::new(CountingJob::default());
        let mut scheduler = RingScheduler::new(job.clone());

        scheduler.arm(1, Utc::now() + chrono::Duration::seconds(10));
        scheduler.arm(2, Utc::now() + chrono::Duration::seconds(20));

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(job.ring_count(), 1);
        assert_eq!(*job.last_alarm.lock().expect("lock"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_prevents_the_ring() {
        let job = Arc::new(CountingJob::default());
        let mut scheduler = RingScheduler::new(job.clone());

        scheduler.arm(1, Utc::now() + chrono::Duration::seconds(10));
        scheduler.disarm();

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(job.ring_count(), 0);
        assert!(scheduler.armed_alarm().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn past_instants_fire_immediately() {
        let job = Arc::new(CountingJob::default());
        let mut scheduler = RingScheduler::new(job.clone());

        scheduler.arm(3, Utc::now() - chrono::Duration::seconds(60));
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(job.ring_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_waits_for_the_armed_task() {
        let job = Arc::new(CountingJob::default());
        let mut scheduler = RingScheduler::new(job.clone());

        scheduler.arm(1, Utc::now() + chrono::Duration::seconds(10));
        scheduler.stop().await.expect("stop succeeds");
        assert_eq!(job.ring_count(), 0);

        let err = scheduler.stop().await.expect_err("nothing armed");
        assert!(matches!(err, SchedulerError::NotArmed));
    }
}
