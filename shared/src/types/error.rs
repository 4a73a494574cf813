// =============================================================================
// SHARED/SRC/TYPES/ERROR.RS - Build Error Definitions
// =============================================================================

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::tool::ToolExit;

/// Every way a payload build can fail
///
/// Tool failures carry the captured diagnostic output verbatim so the
/// command-line front door can show it to the user unchanged.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Unknown target '{identifier}' (available: {available})")]
    InvalidTarget { identifier: String, available: String },

    #[error("Target '{identifier}' is misconfigured: {message}")]
    TargetConfiguration { identifier: String, message: String },

    #[error("Source file {path:?} is not readable")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid compilation request: {message}")]
    InvalidRequest { message: String },

    #[error("Required tool '{tool}' is not available: {message}")]
    ToolMissing { tool: String, message: String },

    #[error("Failed to launch '{program}'")]
    ToolLaunch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Transpilation failed: {tool} {exit}\n{diagnostics}")]
    Transpile {
        tool: String,
        exit: ToolExit,
        diagnostics: String,
    },

    #[error("Payload build failed: {tool} {exit}\n{diagnostics}")]
    BuildTool {
        tool: String,
        exit: ToolExit,
        diagnostics: String,
    },

    #[error("Linking failed: {tool} {exit}\n{diagnostics}")]
    Link {
        tool: String,
        exit: ToolExit,
        diagnostics: String,
    },

    #[error("Failed to stage build project file {path:?}")]
    ProjectStaging {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to publish artifact to {path:?}")]
    Publish {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create build workspace under {root:?}")]
    Workspace {
        root: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Artifact {path:?} failed verification: {message}")]
    Verification { path: PathBuf, message: String },
}

impl BuildError {
    /// Short machine-friendly name of the failure class, used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            BuildError::InvalidTarget { .. } => "invalid-target",
            BuildError::TargetConfiguration { .. } => "target-configuration",
            BuildError::SourceUnreadable { .. } => "source-unreadable",
            BuildError::InvalidRequest { .. } => "invalid-request",
            BuildError::ToolMissing { .. } => "tool-missing",
            BuildError::ToolLaunch { .. } => "tool-launch",
            BuildError::Transpile { .. } => "transpile",
            BuildError::BuildTool { .. } => "build-tool",
            BuildError::Link { .. } => "link",
            BuildError::ProjectStaging { .. } => "project-staging",
            BuildError::Publish { .. } => "publish",
            BuildError::Workspace { .. } => "workspace",
            BuildError::Verification { .. } => "verification",
        }
    }
}

/// Result type for build operations
pub type BuildResult<T> = Result<T, BuildError>;
