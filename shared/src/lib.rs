// =============================================================================
// SHARED FOUNDATION - shared/src/lib.rs
// Types and errors shared by the USB Goose payload build tools
// =============================================================================

//! Shared foundation for the payload build tools
//!
//! The builder library, its command-line front door and its tests all speak
//! in these types: target descriptors, compilation requests, tool exit
//! classifications and the build error taxonomy.

// Module declarations
pub mod types;

// =============================================================================
// PUBLIC RE-EXPORTS
// =============================================================================

// Target and request exports
pub use types::target::TargetDescriptor;
pub use types::request::{BuildFlags, CompilationRequest, FrontendKind};

// Tool invocation exports
pub use types::tool::ToolExit;

// Error handling exports
pub use types::error::{BuildError, BuildResult};
