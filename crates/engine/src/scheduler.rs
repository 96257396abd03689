//! Background tick scheduling.
//!
//! A small fixed set of periodic tasks, one tokio task per tick type. Each
//! loop awaits the tick body before sleeping again, so a tick type never
//! overlaps itself; different tick types run concurrently. Tick failures are
//! logged and the loop carries on; every tick is idempotent against the
//! store, so the next firing repairs whatever the failed one left behind.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::checkin::CheckInCooldowns;
use crate::fanout::NotificationFanout;
use crate::reconcile::LifecycleReconciler;
use crate::reminder::ReminderDeduper;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Period of the event/session status reconciliation ticks.
    pub status_period: Duration,
    /// Period of the reminder sweep.
    pub reminder_period: Duration,
    /// Period of the check-in cooldown sweep.
    pub cooldown_period: Duration,
    /// Period of the expired-notification cleanup.
    pub cleanup_period: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            status_period: Duration::from_secs(60),
            reminder_period: Duration::from_secs(60 * 60),
            cooldown_period: Duration::from_secs(60),
            cleanup_period: Duration::from_secs(24 * 60 * 60),
        }
    }
}

pub struct Scheduler {
    config: SchedulerConfig,
    reconciler: Arc<LifecycleReconciler>,
    reminders: Arc<ReminderDeduper>,
    fanout: Arc<NotificationFanout>,
    cooldowns: Arc<CheckInCooldowns>,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        reconciler: Arc<LifecycleReconciler>,
        reminders: Arc<ReminderDeduper>,
        fanout: Arc<NotificationFanout>,
        cooldowns: Arc<CheckInCooldowns>,
    ) -> Self {
        Self {
            config,
            reconciler,
            reminders,
            fanout,
            cooldowns,
        }
    }

    /// Spawns one task per tick type and returns their handles. The tasks
    /// run until the process exits; an abandoned in-flight tick is safe
    /// because every write it makes is idempotent-checked on the next one.
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        {
            let reconciler = Arc::clone(&self.reconciler);
            handles.push(spawn_tick("event-status", self.config.status_period, move || {
                let reconciler = Arc::clone(&reconciler);
                async move {
                    reconciler.reconcile_events(Utc::now()).await.map(|n| n as u64)
                }
            }));
        }

        {
            let reconciler = Arc::clone(&self.reconciler);
            handles.push(spawn_tick(
                "session-status",
                self.config.status_period,
                move || {
                    let reconciler = Arc::clone(&reconciler);
                    async move {
                        reconciler
                            .reconcile_sessions(Utc::now())
                            .await
                            .map(|n| n as u64)
                    }
                },
            ));
        }

        {
            let reminders = Arc::clone(&self.reminders);
            handles.push(spawn_tick(
                "event-reminders",
                self.config.reminder_period,
                move || {
                    let reminders = Arc::clone(&reminders);
                    async move { reminders.sweep(Utc::now()).await.map(|n| n as u64) }
                },
            ));
        }

        {
            let cooldowns = Arc::clone(&self.cooldowns);
            handles.push(spawn_tick(
                "cooldown-sweep",
                self.config.cooldown_period,
                move || {
                    let cooldowns = Arc::clone(&cooldowns);
                    async move { Ok(cooldowns.sweep(Utc::now()) as u64) }
                },
            ));
        }

        {
            let fanout = Arc::clone(&self.fanout);
            handles.push(spawn_tick(
                "notification-cleanup",
                self.config.cleanup_period,
                move || {
                    let fanout = Arc::clone(&fanout);
                    async move { fanout.cleanup_expired(Utc::now()).await }
                },
            ));
        }

        handles
    }
}

fn spawn_tick<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = eyre::Result<u64>> + Send,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // A slow tick should not cause a burst of catch-up firings.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match tick().await {
                Ok(affected) => {
                    tracing::debug!(tick = name, affected, "tick complete");
                }
                Err(err) => {
                    tracing::error!(tick = name, error = %err, "tick failed");
                }
            }
        }
    })
}
