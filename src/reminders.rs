//! Time-of-day reminder scheduling.
//!
//! An owned scheduler object, not a process-wide singleton: callers hold a
//! `ReminderScheduler`, re-`schedule` it whenever the plan changes (the job
//! set is replaced wholesale, so re-registration never duplicates firings),
//! and `start`/`stop` the single polling thread around it. Firing delivers
//! through the `Notifier` seam and appends a delivery-log row; a delivery
//! failure is logged and the loop keeps going.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, Db};
use crate::models::{RecoveryPlan, TimeOfDay};

/// Due-job polling interval. A stop request is observed at latest one
/// interval after being raised.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Notification-delivery capability. Desktop toasts, push, or anything
/// else external; the scheduler only needs this one call.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError>;
}

/// Default delivery: structured log lines only. Useful headless and in dev.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        tracing::info!(title, message, "Reminder");
        Ok(())
    }
}

/// One time-triggered notification, tied to a specific plan day.
#[derive(Debug, Clone)]
pub struct ReminderJob {
    pub plan_id: String,
    pub date: NaiveDate,
    pub activity_id: Uuid,
    pub notify_at: NaiveTime,
    pub title: String,
    pub message: String,
    pub fired: bool,
}

/// Fixed wall-clock delivery time (local) for each part of the day.
pub fn notify_time(time_of_day: TimeOfDay) -> NaiveTime {
    let (hour, minute) = match time_of_day {
        TimeOfDay::Morning => (8, 0),
        TimeOfDay::Afternoon => (13, 0),
        TimeOfDay::Evening => (18, 0),
    };
    NaiveTime::from_hms_opt(hour, minute, 0).expect("fixed notify time is valid")
}

/// Walks plans into reminder jobs and fires them from one background loop.
pub struct ReminderScheduler {
    jobs: Arc<Mutex<Vec<ReminderJob>>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    notifier: Arc<dyn Notifier>,
    db: Db,
}

impl ReminderScheduler {
    pub fn new(db: Db, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            notifier,
            db,
        }
    }

    /// Register one job per activity across the whole plan window.
    ///
    /// All previously registered jobs are cleared first: registration is
    /// idempotent per call, not cumulative, so rescheduling an adjusted
    /// plan cannot double-fire.
    pub fn schedule(&self, plan: &RecoveryPlan) {
        let mut jobs = self.jobs.lock().expect("jobs lock poisoned");
        jobs.clear();

        let mut date = plan.start_date;
        while date <= plan.end_date {
            for activity in plan.activities_on(date) {
                jobs.push(ReminderJob {
                    plan_id: plan.plan_id.clone(),
                    date,
                    activity_id: activity.id,
                    notify_at: notify_time(activity.time_of_day),
                    title: format!("Recovery Activity: {}", activity.activity_type.as_str()),
                    message: activity.description.clone(),
                    fired: false,
                });
            }
            date += chrono::Duration::days(1);
        }

        tracing::debug!(plan_id = %plan.plan_id, jobs = jobs.len(), "Reminders scheduled");
    }

    /// Snapshot of the registered jobs.
    pub fn jobs(&self) -> Vec<ReminderJob> {
        self.jobs.lock().expect("jobs lock poisoned").clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Start the polling loop. No-op when already running.
    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let jobs = Arc::clone(&self.jobs);
        let running = Arc::clone(&self.running);
        let notifier = Arc::clone(&self.notifier);
        let db = Arc::clone(&self.db);

        self.handle = Some(std::thread::spawn(move || {
            tracing::info!("Reminder loop started");
            while running.load(Ordering::Relaxed) {
                fire_due_jobs(&jobs, &db, notifier.as_ref(), Local::now().naive_local());
                std::thread::sleep(POLL_INTERVAL);
            }
            tracing::info!("Reminder loop stopped");
        }));
    }

    /// Stop the polling loop and block until the thread has exited.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Which jobs are due at `now`? A job fires on its own date, at or after
/// its wall-clock time, at most once.
fn due_indices(jobs: &[ReminderJob], now: NaiveDateTime) -> Vec<usize> {
    jobs.iter()
        .enumerate()
        .filter(|(_, job)| !job.fired && job.date == now.date() && now.time() >= job.notify_at)
        .map(|(i, _)| i)
        .collect()
}

/// One firing pass: deliver every due job, then record it. Delivery and
/// logging failures are logged and never abort the pass.
fn fire_due_jobs(jobs: &Mutex<Vec<ReminderJob>>, db: &Db, notifier: &dyn Notifier, now: NaiveDateTime) {
    let mut jobs = jobs.lock().expect("jobs lock poisoned");
    for index in due_indices(&jobs, now) {
        let job = &mut jobs[index];
        job.fired = true;

        if let Err(e) = notifier.notify(&job.title, &job.message) {
            tracing::warn!(
                plan_id = %job.plan_id,
                activity_id = %job.activity_id,
                error = %e,
                "Reminder delivery failed"
            );
            continue;
        }

        let conn = db.lock().expect("db lock poisoned");
        if let Err(e) =
            db::append_delivery_log(&conn, &job.plan_id, job.date, &job.activity_id, Utc::now())
        {
            tracing::warn!(plan_id = %job.plan_id, error = %e, "Delivery log write failed");
        }
    }
}
