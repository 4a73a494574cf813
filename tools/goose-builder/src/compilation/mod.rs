// =============================================================================
// COMPILATION MODULE - tools/goose-builder/src/compilation/mod.rs
// =============================================================================

//! Front-end compilation and native linking for payloads
//!
//! A front-end turns payload source into an [`IntermediateArtifact`] inside
//! the build workspace; the linker turns that artifact into the final ELF.

use std::path::{Path, PathBuf};

use crate::config::ToolConfiguration;

// Compilation component exports
pub use self::frontend::{FrontendAdapter, ScriptFrontend, SystemsFrontend};
pub use self::invoker::{SystemToolRunner, ToolInvocation, ToolOutput, ToolRunner};
pub use self::linker::{ArtifactLinker, LinkCommand};
pub use self::staging::{ProjectStaging, StagedProject};
pub use self::toolchain::ToolchainProvisioner;

// Compilation module declarations
pub mod frontend;
pub mod invoker;
pub mod linker;
pub mod staging;
pub mod toolchain;

/// Native artifact a front-end hands to the linker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntermediateArtifact {
    /// C++ translation unit produced by the script front-end
    NativeSource(PathBuf),
    /// Archive produced by the systems front-end
    StaticLibrary(PathBuf),
}

impl IntermediateArtifact {
    pub fn path(&self) -> &Path {
        match self {
            IntermediateArtifact::NativeSource(path) | IntermediateArtifact::StaticLibrary(path) => path,
        }
    }

    /// Extension used when the artifact is retained next to the output
    pub fn extension(&self) -> &'static str {
        match self {
            IntermediateArtifact::NativeSource(_) => "cpp",
            IntermediateArtifact::StaticLibrary(_) => "a",
        }
    }

    /// Compiler driver able to link this artifact
    pub fn driver<'c>(&self, tools: &'c ToolConfiguration) -> &'c str {
        match self {
            IntermediateArtifact::NativeSource(_) => &tools.cxx,
            IntermediateArtifact::StaticLibrary(_) => &tools.cc,
        }
    }
}
