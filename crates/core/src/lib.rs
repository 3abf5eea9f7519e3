//! ftpwatch-core: the reconciliation engine's pure half
//!
//! Walks local mappings into snapshots, diffs snapshots into upload/delete
//! jobs, and owns the path, exclusion and settings rules they share.

pub mod endpoint;
pub mod error;
pub mod exclude;
pub mod job;
pub mod path;
pub mod scan;
pub mod settings;
pub mod snapshot;

pub use endpoint::{Endpoint, Scheme};
pub use error::{Error, Result};
pub use exclude::{Exclusion, ExclusionSet, is_excluded};
pub use job::{Job, JobList, full_upload, plan};
pub use path::{join_path, remote_destination};
pub use scan::{InventoryEntry, Walker, walk};
pub use settings::{DirectoryMapping, FileMapping, Settings};
pub use snapshot::{EntryId, Snapshot, SnapshotDiff};
