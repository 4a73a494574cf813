// =============================================================================
// BUILD WORKSPACE MODULE - tools/goose-builder/src/workspace/mod.rs
// =============================================================================

//! Per-run scratch directory
//!
//! A workspace exists only for the duration of [`BuildWorkspace::scoped`].
//! The directory is removed before `scoped` returns, whether the body
//! succeeded, failed or panicked.

use log::{debug, warn};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tempfile::TempDir;

use shared::{BuildError, BuildResult};

/// Prefix of every workspace directory name
pub const WORKSPACE_PREFIX: &str = "goose-build-";

/// Uniquely named directory exclusively owned by one pipeline run
#[derive(Debug)]
pub struct BuildWorkspace {
    dir: TempDir,
}

impl BuildWorkspace {
    /// Create a workspace under `root`, run `body` in it, then remove it
    pub fn scoped<T, F>(root: &Path, body: F) -> BuildResult<T>
    where
        F: FnOnce(&BuildWorkspace) -> BuildResult<T>,
    {
        let workspace = Self::create(root)?;
        let path = workspace.path().to_path_buf();
        debug!("Created build workspace {}", path.display());

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&workspace)));
        let teardown = workspace.dir.close();

        match outcome {
            Ok(Ok(value)) => {
                if let Err(err) = teardown {
                    warn!("Failed to remove build workspace {}: {}", path.display(), err);
                } else {
                    debug!("Removed build workspace {}", path.display());
                }
                Ok(value)
            }
            Ok(Err(err)) => {
                if let Err(teardown_err) = teardown {
                    warn!("Failed to remove build workspace {}: {}", path.display(), teardown_err);
                }
                Err(err)
            }
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    fn create(root: &Path) -> BuildResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(root)
            .map_err(|source| BuildError::Workspace {
                root: root.to_path_buf(),
                source,
            })?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn leftovers(root: &Path) -> usize {
        fs::read_dir(root).unwrap().count()
    }

    #[test]
    fn directory_is_removed_after_success() {
        let root = tempfile::tempdir().unwrap();
        let seen = BuildWorkspace::scoped(root.path(), |ws| {
            fs::write(ws.path().join("scratch.txt"), "x").unwrap();
            assert!(ws.path().file_name().unwrap().to_string_lossy().starts_with(WORKSPACE_PREFIX));
            Ok(ws.path().to_path_buf())
        })
        .unwrap();

        assert!(!seen.exists());
        assert_eq!(leftovers(root.path()), 0);
    }

    #[test]
    fn directory_is_removed_after_failure() {
        let root = tempfile::tempdir().unwrap();
        let result: BuildResult<()> = BuildWorkspace::scoped(root.path(), |_| {
            Err(BuildError::InvalidRequest { message: "stop".to_string() })
        });

        assert!(matches!(result, Err(BuildError::InvalidRequest { .. })));
        assert_eq!(leftovers(root.path()), 0);
    }

    #[test]
    fn directory_is_removed_when_the_body_panics() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().to_path_buf();
        let outcome = panic::catch_unwind(move || {
            let _: BuildResult<()> = BuildWorkspace::scoped(&path, |_| panic!("tool exploded"));
        });

        assert!(outcome.is_err());
        assert_eq!(leftovers(root.path()), 0);
    }

    #[test]
    fn missing_root_is_a_workspace_error() {
        let root = PathBuf::from("/nonexistent/goose-root");
        let result = BuildWorkspace::scoped(&root, |_| Ok(()));
        assert!(matches!(result, Err(BuildError::Workspace { .. })));
    }
}
