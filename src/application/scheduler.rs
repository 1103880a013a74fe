//! Wall-clock jobs: the daily sweep and the daily backup.
//!
//! Runs as one background task, independent of request handling.

use std::sync::Arc;

use chrono::{Duration, NaiveTime};
use tokio::sync::watch;

use crate::domain::foundation::Timestamp;

use super::backup::BackupExporter;
use super::lifecycle_engine::{LifecycleEngine, SweepOutcome};
use super::pending_proofs::PendingProofRegistry;

/// Times of day (UTC) the jobs run at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub sweep_at: NaiveTime,
    pub backup_at: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Sweep,
    Backup,
}

/// First instant strictly after `now` whose UTC time of day is `at`.
pub fn next_occurrence(now: Timestamp, at: NaiveTime) -> Timestamp {
    let now_dt = *now.as_datetime();
    let today = now_dt.date_naive().and_time(at).and_utc();
    if today > now_dt {
        Timestamp::from_datetime(today)
    } else {
        Timestamp::from_datetime(today + Duration::days(1))
    }
}

impl Schedule {
    /// The next wake-up and every job due then.
    pub fn next_jobs(&self, now: Timestamp) -> (Timestamp, Vec<Job>) {
        let sweep = next_occurrence(now, self.sweep_at);
        let backup = next_occurrence(now, self.backup_at);
        let at = sweep.min(backup);

        let mut jobs = Vec::with_capacity(2);
        if sweep == at {
            jobs.push(Job::Sweep);
        }
        if backup == at {
            jobs.push(Job::Backup);
        }
        (at, jobs)
    }
}

pub struct Scheduler {
    engine: Arc<LifecycleEngine>,
    exporter: Arc<BackupExporter>,
    proofs: Arc<PendingProofRegistry>,
    schedule: Schedule,
}

impl Scheduler {
    pub fn new(
        engine: Arc<LifecycleEngine>,
        exporter: Arc<BackupExporter>,
        proofs: Arc<PendingProofRegistry>,
        schedule: Schedule,
    ) -> Self {
        Self {
            engine,
            exporter,
            proofs,
            schedule,
        }
    }

    /// Run until the shutdown signal turns true or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            sweep_at = %self.schedule.sweep_at,
            backup_at = %self.schedule.backup_at,
            "Scheduler started"
        );

        let mut cursor = Timestamp::now();
        loop {
            let now = Timestamp::now();
            let (at, jobs) = self.schedule.next_jobs(cursor.max(now));
            let delay = at.duration_since(&now).to_std().unwrap_or_default();
            tracing::debug!(next_run = %at.to_storage_string(), ?jobs, "Scheduler sleeping");

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Scheduler stopped");
                        return;
                    }
                }

                _ = tokio::time::sleep(delay) => {
                    for job in jobs {
                        self.run_job(job, Timestamp::now()).await;
                    }
                    // The wall clock may still read just before `at`.
                    cursor = at;
                }
            }
        }
    }

    /// Run one job now. Failures are logged, never returned.
    pub async fn run_job(&self, job: Job, now: Timestamp) {
        match job {
            Job::Sweep => {
                match self.engine.sweep(now).await {
                    Ok(SweepOutcome::Completed(_)) => {}
                    Ok(SweepOutcome::Skipped) => {
                        tracing::info!("Scheduled sweep skipped, another one is running")
                    }
                    Err(e) => tracing::error!(error = %e, "Scheduled sweep failed"),
                }
                let purged = self.proofs.purge_expired(now).await;
                if purged > 0 {
                    tracing::info!(purged, "Stale pending proofs dropped");
                }
            }
            Job::Backup => {
                if let Err(e) = self.exporter.send_backup(now).await {
                    tracing::error!(error = %e, "Scheduled backup failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionStore;
    use crate::adapters::recording::{PlatformOp, RecordingPlatform};
    use crate::domain::foundation::{ChatId, UserId};
    use crate::domain::subscription::{LifecyclePolicy, PendingProof, SubscriptionStatus, Tier};
    use crate::ports::SubscriptionStore;
    use chrono::{TimeZone, Utc};

    fn at(h: u32, m: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2026, 3, 1, h, m, 0).unwrap())
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn schedule() -> Schedule {
        Schedule {
            sweep_at: time(9, 0),
            backup_at: time(21, 0),
        }
    }

    #[test]
    fn next_occurrence_later_today() {
        assert_eq!(next_occurrence(at(8, 30), time(9, 0)), at(9, 0));
    }

    #[test]
    fn next_occurrence_rolls_to_tomorrow() {
        assert_eq!(next_occurrence(at(9, 0), time(9, 0)), at(9, 0).add_days(1));
        assert_eq!(next_occurrence(at(22, 0), time(9, 0)), at(9, 0).add_days(1));
    }

    #[test]
    fn next_jobs_picks_the_earliest() {
        assert_eq!(schedule().next_jobs(at(10, 0)), (at(21, 0), vec![Job::Backup]));
        assert_eq!(schedule().next_jobs(at(22, 0)), (at(9, 0).add_days(1), vec![Job::Sweep]));
    }

    #[test]
    fn served_slot_is_not_scheduled_again() {
        let (slot, jobs) = schedule().next_jobs(at(20, 0));
        assert_eq!(jobs, vec![Job::Backup]);

        // Woken on the monotonic clock while the wall clock lags a little.
        let lagging = Timestamp::from_datetime(*slot.as_datetime() - Duration::milliseconds(5));
        assert_eq!(schedule().next_jobs(lagging).0, slot);
        assert_eq!(schedule().next_jobs(slot.max(lagging)), (slot.add_hours(12), vec![Job::Sweep]));
    }

    #[test]
    fn same_time_runs_both_jobs() {
        let both = Schedule {
            sweep_at: time(9, 0),
            backup_at: time(9, 0),
        };
        assert_eq!(both.next_jobs(at(8, 0)), (at(9, 0), vec![Job::Sweep, Job::Backup]));
    }

    struct Fixture {
        store: Arc<InMemorySubscriptionStore>,
        platform: Arc<RecordingPlatform>,
        proofs: Arc<PendingProofRegistry>,
        scheduler: Scheduler,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let platform = Arc::new(RecordingPlatform::new());
        let proofs = Arc::new(PendingProofRegistry::default());
        let engine = Arc::new(LifecycleEngine::new(
            store.clone(),
            platform.clone(),
            ChatId::new(-100),
            ChatId::new(1),
            LifecyclePolicy::default(),
        ));
        let exporter = Arc::new(BackupExporter::new(store.clone(), platform.clone(), ChatId::new(1)));
        let scheduler = Scheduler::new(engine, exporter, proofs.clone(), schedule());
        Fixture { store, platform, proofs, scheduler }
    }

    #[tokio::test]
    async fn sweep_job_moves_rows_and_drops_stale_proofs() {
        let f = fixture();
        let user = UserId::new(5).unwrap();
        f.store.upsert(user, None, Tier::FourteenDays, Tier::FourteenDays.duration(), at(9, 0)).await.unwrap();
        f.proofs.record(PendingProof::new(user, Tier::OneMonth, None, at(9, 0))).await;

        f.scheduler.run_job(Job::Sweep, at(9, 0).add_days(15)).await;

        assert_eq!(f.store.get(user).await.unwrap().unwrap().status, SubscriptionStatus::Grace);
        assert!(f.proofs.is_empty().await);
    }

    #[tokio::test]
    async fn backup_job_sends_document() {
        let f = fixture();

        f.scheduler.run_job(Job::Backup, at(21, 0)).await;

        assert_eq!(f.platform.count(PlatformOp::SendDocument), 1);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let f = fixture();
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { f.scheduler.run(rx).await });
        tx.send(true).unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
    }
}
