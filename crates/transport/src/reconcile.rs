//! The reconciliation loop
//!
//! Each cycle walks the local mappings, plans jobs against the previous
//! snapshot and the jobs that failed last time, and executes them over the
//! owned [`SyncClient`]. Nothing is persisted: a new [`Reconciler`] starts
//! cold and uploads everything.

use std::time::{Duration, SystemTime};

use ftpwatch_core::{Error, Job, Result, Settings, Snapshot, Walker, full_upload, plan};
use tracing::{debug, error, info, warn};

use crate::RemoteSession;
use crate::client::{ConnectionState, Sleeper, SyncClient, ThreadSleeper};

/// Subtracted from the cycle start when it becomes the next cutoff, so a file
/// written in the same second as the walk is still picked up.
pub const CUTOFF_SLACK: Duration = Duration::from_secs(1);

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Walking,
    Diffing,
    Syncing,
    Resting,
}

/// Hooks for showing progress while jobs run
pub trait CycleObserver {
    /// Called once with the jobs about to be executed
    fn planned(&mut self, _jobs: &[Job]) {}

    /// Called after every job
    fn finished(&mut self, _job: &Job, _outcome: &Result<u64>) {}

    /// Called at the end of every cycle, idle ones included
    fn completed(&mut self, _report: &CycleReport) {}
}

impl CycleObserver for () {}

/// What one cycle did
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Jobs planned for the cycle, in execution order
    pub jobs: Vec<Job>,
    pub uploaded: usize,
    pub deleted: usize,
    /// Bytes sent by successful uploads
    pub bytes: u64,
    /// Per-job failures plus at most one connection failure
    pub failures: Vec<Error>,
}

impl CycleReport {
    fn new(jobs: Vec<Job>) -> Self {
        Self {
            jobs,
            ..Self::default()
        }
    }

    /// Nothing failed
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Nothing was planned
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Remove and return the first failure the loop cannot recover from
    pub fn take_fatal(&mut self) -> Option<Error> {
        let pos = self.failures.iter().position(|e| !e.is_recoverable())?;
        Some(self.failures.swap_remove(pos))
    }
}

/// Polls the local mappings and keeps the remote in step
pub struct Reconciler<S: RemoteSession, Z: Sleeper = ThreadSleeper> {
    walker: Walker,
    client: SyncClient<S, Z>,
    previous: Option<Snapshot>,
    cutoff: Option<SystemTime>,
    dirty: Vec<Job>,
    interval: Duration,
    phase: Phase,
    cycles: u64,
}

impl<S: RemoteSession, Z: Sleeper> Reconciler<S, Z> {
    /// # Errors
    /// Returns [`Error::InvalidEndpoint`] if the settings' endpoint is unusable.
    pub fn new(settings: &Settings, client: SyncClient<S, Z>) -> Result<Self> {
        Ok(Self {
            walker: Walker::new(settings)?,
            client,
            previous: None,
            cutoff: None,
            dirty: Vec::new(),
            interval: settings.interval(),
            phase: Phase::Idle,
            cycles: 0,
        })
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Completed cycles
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Snapshot taken by the last cycle
    #[must_use]
    pub fn previous(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }

    /// Failed jobs waiting for the next cycle
    #[must_use]
    pub fn dirty(&self) -> &[Job] {
        &self.dirty
    }

    #[must_use]
    pub fn client(&self) -> &SyncClient<S, Z> {
        &self.client
    }

    /// Run a single walk, plan and sync cycle
    pub fn run_cycle(&mut self, observer: &mut impl CycleObserver) -> CycleReport {
        let cycle_start = SystemTime::now();

        self.phase = Phase::Walking;
        let current = self.walker.walk();

        self.phase = Phase::Diffing;
        let carried = std::mem::take(&mut self.dirty);
        let jobs = plan(self.previous.as_ref(), &current, self.cutoff, &carried).into_vec();
        debug!(
            "cycle {}: {} entries, {} jobs ({} carried over)",
            self.cycles + 1,
            current.len(),
            jobs.len(),
            carried.len()
        );

        let mut report = CycleReport::new(jobs);
        if !report.jobs.is_empty() {
            self.phase = Phase::Syncing;
            self.dirty = sync_jobs(&mut self.client, &mut report, observer);
        }

        self.previous = Some(current);
        self.cutoff = Some(cycle_start.checked_sub(CUTOFF_SLACK).unwrap_or(cycle_start));
        self.cycles += 1;
        self.phase = Phase::Resting;
        observer.completed(&report);
        report
    }

    /// Run cycles until a non-recoverable error, pausing between them.
    ///
    /// # Errors
    /// Returns the first non-recoverable failure, such as rejected
    /// credentials.
    pub fn watch(&mut self, observer: &mut impl CycleObserver) -> Result<()> {
        info!("watching, polling every {:?}", self.interval);
        loop {
            let mut report = self.run_cycle(observer);
            if !report.is_idle() {
                info!(
                    "cycle {}: {} uploaded, {} deleted, {} failed",
                    self.cycles,
                    report.uploaded,
                    report.deleted,
                    report.failures.len()
                );
            }
            if let Some(fatal) = report.take_fatal() {
                error!("stopping: {fatal}");
                return Err(fatal);
            }
            self.client.pause(self.interval);
        }
    }
}

/// Upload the whole current inventory once, without diffing.
///
/// # Errors
/// Returns [`Error::InvalidEndpoint`] if the settings' endpoint is unusable.
/// Connection and per-job failures land in the report.
pub fn run_once<S: RemoteSession, Z: Sleeper>(
    settings: &Settings,
    client: &mut SyncClient<S, Z>,
    observer: &mut impl CycleObserver,
) -> Result<CycleReport> {
    let snapshot = Walker::new(settings)?.walk();
    let mut report = CycleReport::new(full_upload(&snapshot).into_vec());
    info!("uploading {} files", report.jobs.len());
    if !report.jobs.is_empty() {
        sync_jobs(client, &mut report, observer);
    }
    observer.completed(&report);
    Ok(report)
}

/// Execute `report.jobs`, returning the jobs that should be retried
fn sync_jobs<S: RemoteSession, Z: Sleeper>(
    client: &mut SyncClient<S, Z>,
    report: &mut CycleReport,
    observer: &mut impl CycleObserver,
) -> Vec<Job> {
    let jobs = report.jobs.clone();
    observer.planned(&jobs);

    let mut failed = Vec::new();
    for (i, job) in jobs.iter().enumerate() {
        // Probe once per cycle, redial mid-cycle only after a failure
        if i == 0 || client.state() != ConnectionState::Ready {
            if let Err(e) = client.ensure_connected() {
                error!("skipping {} remaining jobs: {e}", jobs.len() - i);
                failed.extend_from_slice(&jobs[i..]);
                report.failures.push(e);
                return failed;
            }
        }

        let outcome = client.execute(job);
        observer.finished(job, &outcome);
        match outcome {
            Ok(bytes) if job.is_upload() => {
                report.uploaded += 1;
                report.bytes += bytes;
            }
            Ok(_) => report.deleted += 1,
            Err(e) => {
                warn!("{e}");
                failed.push(job.clone());
                report.failures.push(e);
            }
        }
    }
    failed
}
