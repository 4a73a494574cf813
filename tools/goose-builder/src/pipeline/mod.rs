// =============================================================================
// BUILD PIPELINE MODULE - tools/goose-builder/src/pipeline/mod.rs
// =============================================================================

//! Pipeline orchestration for one compilation request
//!
//! A run moves through `Validating -> Staged -> FrontendDone -> Linked ->
//! Published -> Done`, or stops in `Failed`. Validation happens before any
//! workspace or process exists; everything after it runs inside a scoped
//! [`BuildWorkspace`] that is gone by the time [`PipelineOrchestrator::run`]
//! returns.

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::compilation::{
    ArtifactLinker, FrontendAdapter, ScriptFrontend, SystemsFrontend, ToolRunner,
};
use crate::config::BuilderConfiguration;
use crate::packaging::{ArtifactPublisher, PublishedArtifacts};
use crate::targets::TargetRegistry;
use crate::verification::{BuildVerifier, VerificationResult};
use crate::workspace::BuildWorkspace;
use shared::{BuildError, BuildResult, CompilationRequest, FrontendKind, TargetDescriptor};

pub mod selftest;

/// Pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Validating,
    Staged,
    FrontendDone,
    Linked,
    Published,
    Done,
    Failed,
}

impl PipelineStage {
    /// Successor on the success path; terminal states have none
    pub fn next(self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Validating => Some(PipelineStage::Staged),
            PipelineStage::Staged => Some(PipelineStage::FrontendDone),
            PipelineStage::FrontendDone => Some(PipelineStage::Linked),
            PipelineStage::Linked => Some(PipelineStage::Published),
            PipelineStage::Published => Some(PipelineStage::Done),
            PipelineStage::Done | PipelineStage::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Validating => "validating",
            PipelineStage::Staged => "staged",
            PipelineStage::FrontendDone => "frontend-done",
            PipelineStage::Linked => "linked",
            PipelineStage::Published => "published",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Current state plus the states visited so far
#[derive(Debug, Clone)]
pub struct StageTracker {
    current: PipelineStage,
    history: Vec<PipelineStage>,
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            current: PipelineStage::Validating,
            history: vec![PipelineStage::Validating],
        }
    }

    pub fn current(&self) -> PipelineStage {
        self.current
    }

    pub fn history(&self) -> &[PipelineStage] {
        &self.history
    }

    /// Move to the successor state; terminal states stay put
    pub fn advance(&mut self) -> PipelineStage {
        if let Some(next) = self.current.next() {
            debug!("Pipeline {} -> {}", self.current, next);
            self.current = next;
            self.history.push(next);
        }
        self.current
    }

    /// Enter `Failed`, remembering where the run stopped
    pub fn fail(&mut self, error: BuildError) -> PipelineFailure {
        let stage = self.current;
        error!("Build failed in state {} ({}): {}", stage, error.kind(), error);
        if !stage.is_terminal() {
            self.current = PipelineStage::Failed;
            self.history.push(PipelineStage::Failed);
        }
        PipelineFailure { stage, error }
    }
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// A failed run: the state it was in and the first error
#[derive(Error, Debug)]
#[error("build stopped in state '{stage}'")]
pub struct PipelineFailure {
    pub stage: PipelineStage,
    #[source]
    pub error: BuildError,
}

/// Summary of a successful run
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub output: PathBuf,
    pub intermediate: Option<PathBuf>,
    pub target: String,
    pub frontend: FrontendKind,
    pub size: u64,
    pub sha256: String,
    pub stages: Vec<PipelineStage>,
    pub build_time: DateTime<Utc>,
}

/// Drives compilation requests through the stages
///
/// The orchestrator only borrows the registry, configuration and runner, so
/// several can run on separate threads against the same shared state.
pub struct PipelineOrchestrator<'a> {
    registry: &'a TargetRegistry,
    config: &'a BuilderConfiguration,
    runner: &'a dyn ToolRunner,
}

impl<'a> PipelineOrchestrator<'a> {
    pub fn new(
        registry: &'a TargetRegistry,
        config: &'a BuilderConfiguration,
        runner: &'a dyn ToolRunner,
    ) -> Self {
        Self { registry, config, runner }
    }

    pub fn registry(&self) -> &TargetRegistry {
        self.registry
    }

    pub fn config(&self) -> &BuilderConfiguration {
        self.config
    }

    /// Run one request to completion
    pub fn run(&self, request: &CompilationRequest) -> Result<BuildReport, PipelineFailure> {
        let mut tracker = StageTracker::new();
        info!(
            "Building {} payload {} for {}",
            request.frontend,
            request.source.display(),
            request.target
        );

        // Step 1: Validate before anything touches the filesystem
        let target = self.validate(request).map_err(|err| tracker.fail(err))?;
        let destination = request.output_path();

        // Steps 2-5: Work inside a scoped workspace
        let outcome = BuildWorkspace::scoped(&self.config.workspace_root(), |workspace| {
            self.execute(request, target, &destination, workspace, &mut tracker)
        });
        let (published, verification) = outcome.map_err(|err| tracker.fail(err))?;

        tracker.advance();
        info!("Payload build completed: {}", published.output.display());

        Ok(BuildReport {
            output: published.output,
            intermediate: published.intermediate,
            target: target.identifier().to_string(),
            frontend: request.frontend,
            size: verification.size,
            sha256: verification.sha256,
            stages: tracker.history().to_vec(),
            build_time: Utc::now(),
        })
    }

    fn validate(&self, request: &CompilationRequest) -> BuildResult<&'a TargetDescriptor> {
        let target = self.registry.lookup(&request.target)?;

        if request.flags.self_test && request.frontend != FrontendKind::Systems {
            return Err(BuildError::InvalidRequest {
                message: format!("the self-test is only available for {} payloads", FrontendKind::Systems),
            });
        }

        check_readable(&request.source)?;
        Ok(target)
    }

    fn execute(
        &self,
        request: &CompilationRequest,
        target: &TargetDescriptor,
        destination: &Path,
        workspace: &BuildWorkspace,
        tracker: &mut StageTracker,
    ) -> BuildResult<(PublishedArtifacts, VerificationResult)> {
        let frontend: Box<dyn FrontendAdapter + '_> = match request.frontend {
            FrontendKind::Script => Box::new(ScriptFrontend::new(self.runner, self.config)),
            FrontendKind::Systems => Box::new(SystemsFrontend::new(self.runner, self.config)),
        };
        tracker.advance();

        // Step 2: Front-end compilation into the workspace
        let intermediate = frontend.compile(&request.source, workspace.path(), target)?;
        tracker.advance();

        // Step 3: Link against the target's memory layout
        let linked = workspace.path().join(format!("{}.elf", request.source_stem()));
        ArtifactLinker::new(self.runner, self.config).link(&intermediate, target, &linked)?;
        tracker.advance();

        // Step 4: Verify, then copy out before the workspace goes away
        let verification = BuildVerifier::new().verify(&linked)?;
        let published = ArtifactPublisher::new().publish(
            &linked,
            destination,
            request.flags.keep_intermediate,
            &intermediate,
        )?;
        tracker.advance();

        Ok((published, verification))
    }
}

fn check_readable(source: &Path) -> BuildResult<()> {
    let unreadable = |err: io::Error| BuildError::SourceUnreadable {
        path: source.to_path_buf(),
        source: err,
    };

    let file = fs::File::open(source).map_err(unreadable)?;
    let metadata = file.metadata().map_err(unreadable)?;
    if !metadata.is_file() {
        return Err(unreadable(io::Error::new(io::ErrorKind::InvalidInput, "not a regular file")));
    }
    Ok(())
}
