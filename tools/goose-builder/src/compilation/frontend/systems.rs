// =============================================================================
// SYSTEMS FRONT-END - tools/goose-builder/src/compilation/frontend/systems.rs
// =============================================================================

//! Rust payloads, built into a static library by Cargo
//!
//! The payload is wrapped in a staged `no_std` project and built with
//! `build-std` for the target's Rust triple. Cargo writes its output under
//! the staged project so nothing escapes the workspace.

use log::info;
use std::path::Path;

use super::{file_stem, FrontendAdapter};
use crate::compilation::invoker::{ToolInvocation, ToolRunner};
use crate::compilation::staging::{package_name, rustflags, ProjectStaging};
use crate::compilation::toolchain::ToolchainProvisioner;
use crate::compilation::IntermediateArtifact;
use crate::config::BuilderConfiguration;
use shared::{BuildError, BuildResult, FrontendKind, TargetDescriptor};

pub struct SystemsFrontend<'a> {
    runner: &'a dyn ToolRunner,
    config: &'a BuilderConfiguration,
}

impl<'a> SystemsFrontend<'a> {
    pub fn new(runner: &'a dyn ToolRunner, config: &'a BuilderConfiguration) -> Self {
        Self { runner, config }
    }

    fn build_invocation(&self, project_root: &Path, target_dir: &Path, cpu: &str) -> ToolInvocation {
        let mut invocation = ToolInvocation::new(&self.config.tools.cargo);
        if let Some(toolchain) = &self.config.systems.toolchain {
            invocation = invocation.arg(format!("+{}", toolchain));
        }
        invocation
            .args(["build", "--release"])
            .current_dir(project_root)
            .env("RUSTFLAGS", rustflags(&self.config.tools.cc, cpu).join(" "))
            .env("CARGO_TARGET_DIR", target_dir)
    }
}

impl FrontendAdapter for SystemsFrontend<'_> {
    fn kind(&self) -> FrontendKind {
        FrontendKind::Systems
    }

    fn compile(
        &self,
        source: &Path,
        workspace: &Path,
        target: &TargetDescriptor,
    ) -> BuildResult<IntermediateArtifact> {
        let provisioner = ToolchainProvisioner::new(self.runner, self.config);
        provisioner.ensure_cargo()?;
        provisioner.ensure_rust_component()?;

        let name = package_name(&file_stem(source));
        let project = ProjectStaging::new(&self.config.tools.cc).stage(source, workspace, &name, target)?;

        info!("Building {} for {}", name, target.rust_triple());
        let invocation = self.build_invocation(project.root(), &project.target_dir(), target.cpu());
        let output = self.runner.run(&invocation)?;
        let cargo = &self.config.tools.cargo;

        if !output.success() {
            return Err(BuildError::BuildTool {
                tool: cargo.clone(),
                exit: output.exit(),
                diagnostics: output.diagnostics(),
            });
        }

        let library = project.staticlib_path();
        if !library.is_file() {
            return Err(BuildError::BuildTool {
                tool: cargo.clone(),
                exit: output.exit(),
                diagnostics: format!("static library {} was not produced", library.display()),
            });
        }

        Ok(IntermediateArtifact::StaticLibrary(library))
    }
}
