//! Remote path joining and normalization
//!
//! Remote paths are always `/`-separated regardless of the local platform.

use std::path::Path;

use crate::error::Result;
use crate::settings::Settings;

/// Join path segments with `/`.
///
/// Runs of slashes collapse into one, `.` segments are dropped and trailing
/// slashes disappear. The result is absolute iff the first non-empty segment
/// starts with `/`. Joining is idempotent:
/// `join_path(&[&join_path(&[a, b]), c]) == join_path(&[a, b, c])`.
#[must_use]
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    let absolute = segments
        .iter()
        .map(AsRef::<str>::as_ref)
        .find(|s| !s.is_empty())
        .is_some_and(|s| s.starts_with('/'));

    let parts: Vec<&str> = segments
        .iter()
        .flat_map(|s| AsRef::<str>::as_ref(s).split('/'))
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Compute the absolute remote destination for `segments` under the
/// endpoint's base path.
///
/// # Errors
/// Returns [`Error::InvalidEndpoint`](crate::Error::InvalidEndpoint) if the
/// settings' endpoint URL cannot be parsed.
pub fn remote_destination<S: AsRef<str>>(settings: &Settings, segments: &[S]) -> Result<String> {
    let endpoint = settings.endpoint()?;
    Ok(endpoint.destination(segments))
}

/// Render a relative local path as `/`-separated segments.
///
/// Non-UTF-8 components are converted lossily; `.` components are dropped by
/// the later join.
#[must_use]
pub fn relative_segments(relative: &Path) -> Vec<String> {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect()
}

/// Ancestor directories of a remote path, root-to-leaf, excluding `/` itself
/// and the path's final component.
///
/// `"/www/css/site.css"` yields `["/www", "/www/css"]`.
#[must_use]
pub fn ancestors(remote_path: &str) -> Vec<String> {
    let normalized = join_path(&[remote_path]);
    let absolute = normalized.starts_with('/');
    let parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty()).collect();

    let mut out = Vec::new();
    let mut current = String::new();
    for part in parts.iter().take(parts.len().saturating_sub(1)) {
        if absolute || !current.is_empty() {
            current.push('/');
        }
        current.push_str(part);
        out.push(current.clone());
    }
    out
}

/// Final component of a remote path
#[must_use]
pub fn basename(remote_path: &str) -> &str {
    remote_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(remote_path)
}
