//! Snapshot: the inventory produced by one walk, and how two of them differ

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

use crate::scan::InventoryEntry;

/// Identity of an inventory entry: the (source, destination) pair.
///
/// The modification time is not part of identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntryId {
    pub source: PathBuf,
    pub destination: String,
}

impl EntryId {
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl From<&InventoryEntry> for EntryId {
    fn from(entry: &InventoryEntry) -> Self {
        Self::new(entry.source.clone(), entry.destination.clone())
    }
}

/// A snapshot of every deployable file at a point in time
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    files: HashMap<EntryId, InventoryEntry>,
}

impl Snapshot {
    /// Create a snapshot from walked entries
    #[must_use]
    pub fn from_entries(entries: Vec<InventoryEntry>) -> Self {
        let files = entries
            .into_iter()
            .map(|e| (EntryId::from(&e), e))
            .collect();
        Self { files }
    }

    /// Create an empty snapshot
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &EntryId) -> Option<&InventoryEntry> {
        self.files.get(id)
    }

    #[must_use]
    pub fn contains(&self, source: &Path, destination: &str) -> bool {
        self.files
            .contains_key(&EntryId::new(source.to_path_buf(), destination))
    }

    /// Whether any entry lands on `destination`
    #[must_use]
    pub fn has_destination(&self, destination: &str) -> bool {
        self.files.keys().any(|id| id.destination == destination)
    }

    /// The entry that lands on `destination`; with several, the one with
    /// the greatest source path
    #[must_use]
    pub fn producer(&self, destination: &str) -> Option<&InventoryEntry> {
        self.files
            .values()
            .filter(|e| e.destination == destination)
            .max_by(|a, b| a.source.cmp(&b.source))
    }

    /// Entries in arbitrary order
    pub fn entries(&self) -> impl Iterator<Item = &InventoryEntry> {
        self.files.values()
    }

    /// Entries ordered by destination, for stable output
    #[must_use]
    pub fn sorted_entries(&self) -> Vec<&InventoryEntry> {
        let mut entries: Vec<_> = self.files.values().collect();
        entries.sort_by(|a, b| {
            a.destination
                .cmp(&b.destination)
                .then_with(|| a.source.cmp(&b.source))
        });
        entries
    }

    /// Set equality on identities, ignoring timestamps
    #[must_use]
    pub fn same_membership(&self, other: &Self) -> bool {
        self.files.len() == other.files.len()
            && self.files.keys().all(|id| other.files.contains_key(id))
    }

    /// Compare `self` (previous) against `current`.
    ///
    /// Entries present in both count as modified when their current
    /// modification time is at or after `cutoff`. With no cutoff nothing is
    /// reported as modified.
    #[must_use]
    pub fn diff(&self, current: &Self, cutoff: Option<SystemTime>) -> SnapshotDiff {
        let mut added = Vec::new();
        let mut removed = Vec::new();
        let mut modified = Vec::new();

        for (id, entry) in &current.files {
            if self.files.contains_key(id) {
                if cutoff.is_some_and(|cutoff| entry.modified >= cutoff) {
                    modified.push(entry.clone());
                }
            } else {
                added.push(entry.clone());
            }
        }

        for (id, entry) in &self.files {
            if !current.files.contains_key(id) {
                removed.push(entry.clone());
            }
        }

        SnapshotDiff {
            added,
            removed,
            modified,
        }
    }

    /// Distinct destinations, for summaries
    #[must_use]
    pub fn destinations(&self) -> HashSet<&str> {
        self.files.keys().map(|id| id.destination.as_str()).collect()
    }
}

/// Differences between two snapshots
#[derive(Debug, Clone, Default)]
pub struct SnapshotDiff {
    /// Entries in current but not in previous
    pub added: Vec<InventoryEntry>,
    /// Entries in previous but not in current
    pub removed: Vec<InventoryEntry>,
    /// Entries in both, touched at or after the cutoff
    pub modified: Vec<InventoryEntry>,
}

impl SnapshotDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}
