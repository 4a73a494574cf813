// =============================================================================
// TOOLCHAIN AVAILABILITY - tools/goose-builder/src/compilation/toolchain.rs
// =============================================================================

//! Availability checks for the front-end toolchains
//!
//! Pythran and the rust-src component may be installed automatically, once
//! per run, when the configuration allows it. Cargo and the clang drivers
//! are never installed by the builder.

use log::{debug, info, warn};

use crate::compilation::invoker::{ToolInvocation, ToolRunner};
use crate::config::BuilderConfiguration;
use shared::{BuildError, BuildResult};

/// Probes tools and performs at most one install attempt per missing tool
pub struct ToolchainProvisioner<'a> {
    runner: &'a dyn ToolRunner,
    config: &'a BuilderConfiguration,
}

impl<'a> ToolchainProvisioner<'a> {
    pub fn new(runner: &'a dyn ToolRunner, config: &'a BuilderConfiguration) -> Self {
        Self { runner, config }
    }

    /// Make sure `pythran --version` works
    pub fn ensure_pythran(&self) -> BuildResult<()> {
        let tools = &self.config.tools;
        let probe = ToolInvocation::new(&tools.pythran).arg("--version");
        if self.probe(&probe)? {
            return Ok(());
        }

        self.require_auto_install(&tools.pythran)?;
        warn!("{} not found, installing it with pip", tools.pythran);

        let install = ToolInvocation::new(&tools.python).args(["-m", "pip", "install", "pythran"]);
        self.install(&tools.pythran, &install)?;

        if self.probe(&probe)? {
            info!("Installed {}", tools.pythran);
            Ok(())
        } else {
            Err(missing(&tools.pythran, "still unavailable after installation"))
        }
    }

    /// Make sure Cargo answers for the configured toolchain
    pub fn ensure_cargo(&self) -> BuildResult<()> {
        let tools = &self.config.tools;
        let mut probe = ToolInvocation::new(&tools.cargo);
        if let Some(toolchain) = &self.config.systems.toolchain {
            probe = probe.arg(format!("+{}", toolchain));
        }
        let probe = probe.arg("--version");

        if self.probe(&probe)? {
            Ok(())
        } else {
            Err(missing(&tools.cargo, "install it with rustup; it is never installed automatically"))
        }
    }

    /// Make sure the freestanding component (rust-src) is installed
    pub fn ensure_rust_component(&self) -> BuildResult<()> {
        let component = &self.config.systems.component;
        if self.component_installed()? {
            return Ok(());
        }

        self.require_auto_install(component)?;
        warn!("rustup component {} not installed, adding it", component);

        let install = self
            .rustup()
            .args(["component", "add"])
            .arg(component)
            .args(self.toolchain_args());
        self.install(component, &install)?;

        if self.component_installed()? {
            info!("Installed rustup component {}", component);
            Ok(())
        } else {
            Err(missing(component, "still not listed after installation"))
        }
    }

    fn component_installed(&self) -> BuildResult<bool> {
        let rustup = &self.config.tools.rustup;
        let component = &self.config.systems.component;
        let listing = self
            .rustup()
            .args(["component", "list", "--installed"])
            .args(self.toolchain_args());

        let output = match self.runner.run(&listing) {
            Ok(output) => output,
            Err(BuildError::ToolLaunch { .. }) => {
                return Err(missing(rustup, "needed to check for the rust-src component"))
            }
            Err(err) => return Err(err),
        };
        if !output.success() {
            return Err(missing(rustup, &format!("component listing failed: {}", output.diagnostics())));
        }

        let prefixed = format!("{}-", component);
        Ok(output
            .stdout()
            .lines()
            .map(str::trim)
            .any(|line| line == component.as_str() || line.starts_with(&prefixed)))
    }

    fn rustup(&self) -> ToolInvocation {
        ToolInvocation::new(&self.config.tools.rustup)
    }

    fn toolchain_args(&self) -> Vec<String> {
        match &self.config.systems.toolchain {
            Some(toolchain) => vec!["--toolchain".to_string(), toolchain.clone()],
            None => Vec::new(),
        }
    }

    /// True when the tool starts and exits zero; a missing executable is `false`
    fn probe(&self, invocation: &ToolInvocation) -> BuildResult<bool> {
        match self.runner.run(invocation) {
            Ok(output) => {
                debug!("Probe {} {}", invocation.command_line(), output.exit());
                Ok(output.success())
            }
            Err(BuildError::ToolLaunch { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn require_auto_install(&self, tool: &str) -> BuildResult<()> {
        if self.config.auto_install {
            Ok(())
        } else {
            Err(missing(tool, "not found and automatic installation is disabled"))
        }
    }

    fn install(&self, tool: &str, invocation: &ToolInvocation) -> BuildResult<()> {
        match self.runner.run(invocation) {
            Ok(output) if output.success() => Ok(()),
            Ok(output) => Err(missing(
                tool,
                &format!("installation failed ({}):\n{}", output.exit(), output.diagnostics()),
            )),
            Err(BuildError::ToolLaunch { program, .. }) => {
                Err(missing(tool, &format!("installer '{}' could not be started", program)))
            }
            Err(err) => Err(err),
        }
    }
}

fn missing(tool: &str, message: &str) -> BuildError {
    BuildError::ToolMissing {
        tool: tool.to_string(),
        message: message.to_string(),
    }
}
