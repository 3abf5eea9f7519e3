//! Jobs: the upload/delete actions a cycle hands to the remote side
//!
//! Planning turns a previous/current snapshot pair into a deduplicated job
//! list. At most one job exists per remote destination; when a destination is
//! both uploaded and deleted in the same cycle the upload wins, because the
//! walk is authoritative for what currently exists.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::Serialize;

use crate::snapshot::{EntryId, Snapshot};

/// A single remote action
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Job {
    Upload { source: PathBuf, destination: String },
    Delete { destination: String },
}

impl Job {
    #[must_use]
    pub fn upload(source: impl Into<PathBuf>, destination: impl Into<String>) -> Self {
        Self::Upload {
            source: source.into(),
            destination: destination.into(),
        }
    }

    #[must_use]
    pub fn delete(destination: impl Into<String>) -> Self {
        Self::Delete {
            destination: destination.into(),
        }
    }

    /// Remote path this job touches
    #[must_use]
    pub fn destination(&self) -> &str {
        match self {
            Self::Upload { destination, .. } | Self::Delete { destination } => destination,
        }
    }

    #[must_use]
    pub fn is_upload(&self) -> bool {
        matches!(self, Self::Upload { .. })
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload {
                source,
                destination,
            } => write!(f, "upload {} -> {destination}", source.display()),
            Self::Delete { destination } => write!(f, "delete {destination}"),
        }
    }
}

/// Jobs for one cycle, deduplicated by destination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobList {
    by_destination: BTreeMap<String, Job>,
}

impl JobList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a job.
    ///
    /// A delete never replaces a pending upload of the same destination;
    /// anything else replaces what was there.
    pub fn push(&mut self, job: Job) {
        let key = job.destination().to_string();
        match self.by_destination.get(&key) {
            Some(existing) if existing.is_upload() && !job.is_upload() => {}
            _ => {
                self.by_destination.insert(key, job);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_destination.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_destination.is_empty()
    }

    /// Number of upload jobs
    #[must_use]
    pub fn uploads(&self) -> usize {
        self.by_destination.values().filter(|j| j.is_upload()).count()
    }

    /// Number of delete jobs
    #[must_use]
    pub fn deletes(&self) -> usize {
        self.len() - self.uploads()
    }

    #[must_use]
    pub fn get(&self, destination: &str) -> Option<&Job> {
        self.by_destination.get(destination)
    }

    /// Jobs in execution order: deletes first, then uploads, each by path
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        let deletes = self.by_destination.values().filter(|j| !j.is_upload());
        let uploads = self.by_destination.values().filter(|j| j.is_upload());
        deletes.chain(uploads)
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Job> {
        let (uploads, mut deletes): (Vec<_>, Vec<_>) = self
            .by_destination
            .into_values()
            .partition(Job::is_upload);
        deletes.extend(uploads);
        deletes
    }
}

impl Extend<Job> for JobList {
    fn extend<T: IntoIterator<Item = Job>>(&mut self, iter: T) {
        for job in iter {
            self.push(job);
        }
    }
}

impl FromIterator<Job> for JobList {
    fn from_iter<T: IntoIterator<Item = Job>>(iter: T) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

/// Upload every entry of `snapshot` (cold start and one-shot runs).
///
/// When several entries share a destination, the one with the greatest
/// source path wins.
#[must_use]
pub fn full_upload(snapshot: &Snapshot) -> JobList {
    snapshot
        .sorted_entries()
        .into_iter()
        .map(|e| Job::upload(e.source.clone(), e.destination.clone()))
        .collect()
}

/// Plan the jobs for one cycle.
///
/// - No `previous` snapshot: cold start, every current entry is uploaded.
/// - Otherwise added entries are uploaded, removed entries deleted, and
///   entries present in both are re-uploaded when modified at or after
///   `cutoff`. A removed entry whose destination is still produced by
///   another current entry re-uploads that entry instead of deleting.
///
/// `carried` holds jobs that failed in earlier cycles. They are kept only if
/// still meaningful against `current`: an upload whose entry still exists, a
/// delete whose destination no longer exists. Freshly planned jobs take
/// precedence over carried ones.
#[must_use]
pub fn plan(
    previous: Option<&Snapshot>,
    current: &Snapshot,
    cutoff: Option<SystemTime>,
    carried: &[Job],
) -> JobList {
    let mut jobs = JobList::new();

    for job in carried {
        let still_valid = match job {
            Job::Upload {
                source,
                destination,
            } => current
                .get(&EntryId::new(source.clone(), destination.clone()))
                .is_some(),
            Job::Delete { destination } => !current.has_destination(destination),
        };
        if still_valid {
            jobs.push(job.clone());
        }
    }

    let Some(previous) = previous else {
        jobs.extend(full_upload(current).into_vec());
        return jobs;
    };

    let diff = previous.diff(current, cutoff);
    for entry in diff.removed {
        // Another source still maps here: push its bytes instead
        match current.producer(&entry.destination) {
            Some(survivor) => {
                jobs.push(Job::upload(survivor.source.clone(), entry.destination));
            }
            None => jobs.push(Job::delete(entry.destination)),
        }
    }
    let mut uploads: Vec<_> = diff.added.into_iter().chain(diff.modified).collect();
    uploads.sort_by(|a, b| {
        a.destination
            .cmp(&b.destination)
            .then_with(|| a.source.cmp(&b.source))
    });
    for entry in uploads {
        jobs.push(Job::upload(entry.source, entry.destination));
    }
    jobs
}
