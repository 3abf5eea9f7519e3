//! Inventory walking: local roots and files to remote destinations

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ignore::WalkBuilder;
use serde::Serialize;
use tracing::{debug, warn};

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::exclude::ExclusionSet;
use crate::path::relative_segments;
use crate::settings::{DirectoryMapping, FileMapping, Settings};
use crate::snapshot::Snapshot;

/// One local file and where it lands remotely
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryEntry {
    /// Local path as discovered (rooted at the mapping's local directory)
    pub source: PathBuf,
    /// Absolute remote path
    pub destination: String,
    /// Modification time observed during the walk
    pub modified: SystemTime,
    pub is_dir: bool,
}

impl InventoryEntry {
    /// A regular-file entry
    #[must_use]
    pub fn file(
        source: impl Into<PathBuf>,
        destination: impl Into<String>,
        modified: SystemTime,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            modified,
            is_dir: false,
        }
    }
}

/// Walks every mapping in a [`Settings`] value
pub struct Walker {
    endpoint: Endpoint,
    directories: Vec<DirectoryMapping>,
    files: Vec<FileMapping>,
    exclusions: ExclusionSet,
}

impl Walker {
    /// Prepare a walker; the endpoint is parsed once here.
    ///
    /// # Errors
    /// Returns [`Error::InvalidEndpoint`] if the endpoint URL is unusable.
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            endpoint: settings.endpoint()?,
            directories: settings.directories.clone(),
            files: settings.files.clone(),
            exclusions: settings.exclusions(),
        })
    }

    /// Enumerate every deployable file.
    ///
    /// Unreadable entries are logged and skipped; the walk itself never
    /// fails.
    #[must_use]
    pub fn walk(&self) -> Snapshot {
        let mut entries = Vec::new();

        for mapping in &self.directories {
            self.walk_directory(mapping, &mut entries);
        }
        for mapping in &self.files {
            if let Some(entry) = self.standalone_file(mapping) {
                entries.push(entry);
            }
        }

        debug!("walk found {} entries", entries.len());
        Snapshot::from_entries(entries)
    }

    fn walk_directory(&self, mapping: &DirectoryMapping, out: &mut Vec<InventoryEntry>) {
        let root = &mapping.local;
        let mut builder = WalkBuilder::new(root);
        // Deploy exactly what is on disk: no ignore files, hidden files included
        builder.standard_filters(false).follow_links(false);

        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    report_unreadable(root, &e.to_string());
                    continue;
                }
            };
            let path = entry.path();

            let metadata = match std::fs::metadata(path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    report_unreadable(path, &e.to_string());
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if self.exclusions.is_excluded(&name) {
                debug!("excluded {}", path.display());
                continue;
            }

            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let modified = match metadata.modified() {
                Ok(modified) => modified,
                Err(e) => {
                    report_unreadable(path, &e.to_string());
                    continue;
                }
            };

            let mut segments = vec![mapping.remote.clone()];
            segments.extend(relative_segments(relative));
            out.push(InventoryEntry::file(
                path,
                self.endpoint.destination(&segments),
                modified,
            ));
        }
    }

    fn standalone_file(&self, mapping: &FileMapping) -> Option<InventoryEntry> {
        let path = &mapping.local;
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("mapped file {} does not exist", path.display());
                return None;
            }
            Err(e) => {
                report_unreadable(path, &e.to_string());
                return None;
            }
        };
        if !metadata.is_file() {
            debug!("mapped file {} is not a regular file", path.display());
            return None;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        if self.exclusions.is_excluded(&name) {
            debug!("excluded {}", path.display());
            return None;
        }

        match metadata.modified() {
            Ok(modified) => Some(InventoryEntry::file(
                path.clone(),
                self.endpoint.destination(&[mapping.remote.as_str()]),
                modified,
            )),
            Err(e) => {
                report_unreadable(path, &e.to_string());
                None
            }
        }
    }
}

fn report_unreadable(path: &Path, reason: &str) {
    let err = Error::WalkEntryUnreadable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };
    warn!("{err}");
}

/// Walk every mapping in `settings` once.
///
/// # Errors
/// Returns [`Error::InvalidEndpoint`] if the endpoint URL is unusable.
pub fn walk(settings: &Settings) -> Result<Snapshot> {
    Ok(Walker::new(settings)?.walk())
}
