// =============================================================================
// PAYLOAD BUILD SYSTEM - tools/goose-builder/src/lib.rs
// USB Goose payload builder for freestanding RISC-V targets
// =============================================================================

//! Payload builder library
//!
//! Compiles a single payload source file (Python through Pythran, or Rust
//! through Cargo) into a freestanding ELF image for one of the configured
//! microcontroller targets. [`PipelineOrchestrator`] sequences the stages;
//! external tools are reached only through [`ToolRunner`].

/// Module declarations for build system components
pub mod compilation;
pub mod config;
pub mod packaging;
pub mod pipeline;
pub mod targets;
pub mod verification;
pub mod workspace;

// =============================================================================
// PUBLIC PAYLOAD BUILDER INTERFACE EXPORTS
// =============================================================================

// Build system exports
pub use crate::compilation::{
    ArtifactLinker, FrontendAdapter, IntermediateArtifact, LinkCommand, ScriptFrontend,
    SystemToolRunner, SystemsFrontend, ToolInvocation, ToolOutput, ToolRunner,
};
pub use crate::config::BuilderConfiguration;
pub use crate::packaging::{ArtifactPublisher, PublishedArtifacts};
pub use crate::pipeline::{BuildReport, PipelineFailure, PipelineOrchestrator, PipelineStage};
pub use crate::targets::TargetRegistry;
pub use crate::verification::{BuildVerifier, VerificationResult};
pub use crate::workspace::BuildWorkspace;

// Shared type re-exports for build system integration
pub use shared::{
    BuildError, BuildFlags, BuildResult, CompilationRequest, FrontendKind, TargetDescriptor, ToolExit,
};
