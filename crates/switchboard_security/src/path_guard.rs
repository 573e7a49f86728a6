//! Directory allowlist.

use std::path::{Component, Path, PathBuf};
use switchboard_core::PathGuardSettings;
use tracing::{debug, instrument, warn};

/// Lexically normalize an absolute path, resolving `.` and `..`.
///
/// Returns `None` for relative paths and for paths that climb above the root.
fn normalize(path: &Path) -> Option<PathBuf> {
    if !path.is_absolute() {
        return None;
    }
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    Some(normalized)
}

/// Checks requested paths against allowed and denied roots.
///
/// Denied roots take precedence. With no allowed roots every path is denied.
#[derive(Debug, Clone, Default)]
pub struct PathGuard {
    allowed: Vec<PathBuf>,
    denied: Vec<PathBuf>,
}

impl PathGuard {
    /// Build a guard from settings. Relative roots are ignored.
    pub fn new(settings: &PathGuardSettings) -> Self {
        Self {
            allowed: normalize_roots(settings.allowed_roots()),
            denied: normalize_roots(settings.denied_roots()),
        }
    }

    /// Whether `path` lies under an allowed root and no denied root.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn is_path_allowed(&self, path: impl AsRef<Path>) -> bool {
        let Some(path) = normalize(path.as_ref()) else {
            debug!("Path is relative or escapes the root");
            return false;
        };
        if self.denied.iter().any(|root| path.starts_with(root)) {
            debug!("Path is under a denied root");
            return false;
        }
        let allowed = self.allowed.iter().any(|root| path.starts_with(root));
        debug!(allowed, "Checked path against allowlist");
        allowed
    }
}

fn normalize_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    roots
        .iter()
        .filter_map(|root| {
            let normalized = normalize(root);
            if normalized.is_none() {
                warn!(root = %root.display(), "Ignoring relative directory root");
            }
            normalized
        })
        .collect()
}
