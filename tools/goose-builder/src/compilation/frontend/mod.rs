// =============================================================================
// FRONT-END ADAPTERS - tools/goose-builder/src/compilation/frontend/mod.rs
// =============================================================================

//! Source-language front-ends
//!
//! Both front-ends sit behind [`FrontendAdapter`] so the pipeline drives
//! them identically: source in, intermediate native artifact out, with
//! everything written inside the build workspace.

use std::path::Path;

use crate::compilation::IntermediateArtifact;
use shared::{BuildResult, FrontendKind, TargetDescriptor};

pub use self::script::ScriptFrontend;
pub use self::systems::SystemsFrontend;

pub mod script;
pub mod systems;

/// Turns payload source into an intermediate native artifact
pub trait FrontendAdapter {
    fn kind(&self) -> FrontendKind;

    fn compile(
        &self,
        source: &Path,
        workspace: &Path,
        target: &TargetDescriptor,
    ) -> BuildResult<IntermediateArtifact>;
}

/// File stem used to name workspace files
fn file_stem(source: &Path) -> String {
    source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "payload".to_string())
}
