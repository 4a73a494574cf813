// =============================================================================
// SCRIPT FRONT-END - tools/goose-builder/src/compilation/frontend/script.rs
// =============================================================================

//! Python payloads, transpiled to C++ by Pythran

use log::{info, warn};
use std::fs;
use std::path::Path;

use super::{file_stem, FrontendAdapter};
use crate::compilation::invoker::{ToolInvocation, ToolRunner};
use crate::compilation::toolchain::ToolchainProvisioner;
use crate::compilation::IntermediateArtifact;
use crate::config::BuilderConfiguration;
use shared::{BuildError, BuildResult, FrontendKind, TargetDescriptor};

/// C glue exposing the firmware API to transpiled code and defining the entry point
const FRAMEWORK_BINDINGS: &str = include_str!("../../../bindings/pythran_bindings.cpp");

/// Separator written between the transpiled code and the bindings
const BINDINGS_SEPARATOR: &str = "\n\n// Framework bindings\n";

pub struct ScriptFrontend<'a> {
    runner: &'a dyn ToolRunner,
    config: &'a BuilderConfiguration,
}

impl<'a> ScriptFrontend<'a> {
    pub fn new(runner: &'a dyn ToolRunner, config: &'a BuilderConfiguration) -> Self {
        Self { runner, config }
    }
}

impl FrontendAdapter for ScriptFrontend<'_> {
    fn kind(&self) -> FrontendKind {
        FrontendKind::Script
    }

    fn compile(
        &self,
        source: &Path,
        workspace: &Path,
        _target: &TargetDescriptor,
    ) -> BuildResult<IntermediateArtifact> {
        ToolchainProvisioner::new(self.runner, self.config).ensure_pythran()?;

        let text = fs::read_to_string(source).map_err(|err| BuildError::SourceUnreadable {
            path: source.to_path_buf(),
            source: err,
        })?;
        if !text.contains("#pythran export") {
            warn!("{} has no '#pythran export' directive", source.display());
        }

        let stem = file_stem(source);
        let transpiled = workspace.join(format!("{}.pythran.cpp", stem));
        let pythran = &self.config.tools.pythran;

        info!("Transpiling {} with {}", source.display(), pythran);
        let invocation = ToolInvocation::new(pythran)
            .arg("-e")
            .arg(source)
            .arg("-o")
            .arg(&transpiled);
        let output = self.runner.run(&invocation)?;

        if !output.success() {
            return Err(BuildError::Transpile {
                tool: pythran.clone(),
                exit: output.exit(),
                diagnostics: output.diagnostics(),
            });
        }

        let generated = fs::read_to_string(&transpiled).map_err(|_| BuildError::Transpile {
            tool: pythran.clone(),
            exit: output.exit(),
            diagnostics: format!("no C++ was written to {}", transpiled.display()),
        })?;

        let combined = workspace.join(format!("{}.cpp", stem));
        let mut contents = generated;
        contents.push_str(BINDINGS_SEPARATOR);
        contents.push_str(FRAMEWORK_BINDINGS);
        fs::write(&combined, contents).map_err(|err| BuildError::ProjectStaging {
            path: combined.clone(),
            source: err,
        })?;

        Ok(IntermediateArtifact::NativeSource(combined))
    }
}
