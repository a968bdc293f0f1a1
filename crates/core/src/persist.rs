//! Persistence root resolution for local mode
//!
//! Every local-mode invocation stores its buckets under a single root
//! directory. Invocations that resolve to different roots never see each
//! other's objects.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Default persistence root, relative to the working directory
pub const DEFAULT_PERSIST_DIR: &str = ".r2/state";

/// A directory that holds all local-mode state for one invocation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceRoot {
    path: PathBuf,
}

impl PersistenceRoot {
    /// The root directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory that holds the buckets of the object store
    pub fn buckets_dir(&self) -> PathBuf {
        self.path.join("r2")
    }
}

/// Resolve the persistence root against the current working directory
pub fn resolve_root(explicit: Option<&Path>) -> Result<PersistenceRoot> {
    let cwd = std::env::current_dir()?;
    resolve_root_in(&cwd, explicit)
}

/// Resolve the persistence root against `base`
///
/// An explicit path is used as given (relative paths are taken relative to
/// `base`); otherwise `base/.r2/state` is used. The directory is created if
/// it does not exist yet.
pub fn resolve_root_in(base: &Path, explicit: Option<&Path>) -> Result<PersistenceRoot> {
    let path = match explicit {
        Some(dir) => base.join(dir),
        None => base.join(DEFAULT_PERSIST_DIR),
    };

    std::fs::create_dir_all(&path)?;
    tracing::debug!(root = %path.display(), "Resolved persistence root");

    Ok(PersistenceRoot { path })
}
