// =============================================================================
// ARTIFACT PUBLISHING MODULE - tools/goose-builder/src/packaging/mod.rs
// =============================================================================

//! Copies build outputs out of the workspace
//!
//! Publishing always copies. The workspace is about to be removed, so
//! anything the user wants to keep must land at its destination first.

use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::compilation::IntermediateArtifact;
use shared::{BuildError, BuildResult};

/// Files written outside the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedArtifacts {
    pub output: PathBuf,
    pub intermediate: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ArtifactPublisher;

impl ArtifactPublisher {
    pub fn new() -> Self {
        Self
    }

    /// Copy the ELF to `destination` and, when asked, the intermediate next to it
    pub fn publish(
        &self,
        final_artifact: &Path,
        destination: &Path,
        keep_intermediate: bool,
        intermediate: &IntermediateArtifact,
    ) -> BuildResult<PublishedArtifacts> {
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| publish_error(parent, err))?;
        }

        fs::copy(final_artifact, destination).map_err(|err| publish_error(destination, err))?;
        info!("Payload written to {}", destination.display());

        let intermediate = if keep_intermediate {
            let retained = retained_path(destination, intermediate);
            fs::copy(intermediate.path(), &retained).map_err(|err| publish_error(&retained, err))?;
            info!("Intermediate kept at {}", retained.display());
            Some(retained)
        } else {
            None
        };

        Ok(PublishedArtifacts {
            output: destination.to_path_buf(),
            intermediate,
        })
    }
}

/// `<destination stem>.<cpp|a>` beside the destination, or
/// `<destination stem>.intermediate.<cpp|a>` when that would be the destination itself
pub fn retained_path(destination: &Path, intermediate: &IntermediateArtifact) -> PathBuf {
    let extension = intermediate.extension();
    let retained = destination.with_extension(extension);
    if retained == destination {
        destination.with_extension(format!("intermediate.{}", extension))
    } else {
        retained
    }
}

fn publish_error(path: &Path, source: std::io::Error) -> BuildError {
    BuildError::Publish {
        path: path.to_path_buf(),
        source,
    }
}
