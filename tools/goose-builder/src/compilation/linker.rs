// =============================================================================
// ARTIFACT LINKER - tools/goose-builder/src/compilation/linker.rs
// =============================================================================

//! Final compile-and-link step shared by both front-ends

use log::{debug, info};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::compilation::invoker::{ToolInvocation, ToolRunner};
use crate::compilation::IntermediateArtifact;
use crate::config::BuilderConfiguration;
use shared::{BuildError, BuildResult, TargetDescriptor};

/// Clang driver call for one target, built from discrete arguments
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkCommand {
    program: String,
    args: Vec<OsString>,
}

impl LinkCommand {
    pub fn for_target(
        driver: &str,
        target: &TargetDescriptor,
        artifact: &IntermediateArtifact,
        output: &Path,
        entry_symbol: &str,
    ) -> Self {
        let mut args: Vec<OsString> = vec![
            "-target".into(),
            target.triple().into(),
            format!("-march={}", target.cpu()).into(),
            format!("-mabi={}", target.abi()).into(),
            "-Os".into(),
            "-ffunction-sections".into(),
            "-fdata-sections".into(),
            "-nostdlib".into(),
            "-ffreestanding".into(),
        ];

        args.extend(target.defines().iter().map(|define| OsString::from(format!("-D{}", define))));
        for dir in target.include_dirs() {
            args.push("-I".into());
            args.push(dir.into());
        }

        args.push("-T".into());
        args.push(target.linker_script().into());
        args.push("-o".into());
        args.push(output.into());
        args.push(artifact.path().into());
        args.push("-Wl,--gc-sections".into());

        // Nothing references the archive otherwise, so the linker would skip it
        if let IntermediateArtifact::StaticLibrary(_) = artifact {
            args.push(format!("-Wl,--undefined={}", entry_symbol).into());
        }

        Self {
            program: driver.to_string(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn to_invocation(&self) -> ToolInvocation {
        ToolInvocation::new(&self.program).args(&self.args)
    }
}

/// Runs the link step through a [`ToolRunner`]
pub struct ArtifactLinker<'a> {
    runner: &'a dyn ToolRunner,
    config: &'a BuilderConfiguration,
}

impl<'a> ArtifactLinker<'a> {
    pub fn new(runner: &'a dyn ToolRunner, config: &'a BuilderConfiguration) -> Self {
        Self { runner, config }
    }

    /// Produce the ELF at `output`
    pub fn link(
        &self,
        artifact: &IntermediateArtifact,
        target: &TargetDescriptor,
        output: &Path,
    ) -> BuildResult<PathBuf> {
        let driver = artifact.driver(&self.config.tools);
        let command = LinkCommand::for_target(
            driver,
            target,
            artifact,
            output,
            &self.config.systems.entry_symbol,
        );

        info!("Linking {} for {}", artifact.path().display(), target.identifier());
        let result = self.runner.run(&command.to_invocation())?;

        if !result.success() {
            return Err(BuildError::Link {
                tool: driver.to_string(),
                exit: result.exit(),
                diagnostics: result.diagnostics(),
            });
        }
        if !output.is_file() {
            return Err(BuildError::Link {
                tool: driver.to_string(),
                exit: result.exit(),
                diagnostics: format!("no output was written to {}", output.display()),
            });
        }

        debug!("Linked {}", output.display());
        Ok(output.to_path_buf())
    }
}
