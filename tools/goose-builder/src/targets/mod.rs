// =============================================================================
// PAYLOAD TARGETS MODULE - tools/goose-builder/src/targets/mod.rs
// =============================================================================

//! Registry of microcontroller targets
//!
//! The registry is built once from the configuration and is read-only
//! afterwards. Pipelines borrow descriptors from it, so any number of
//! concurrent runs can share one registry without locking.

use log::debug;
use std::collections::HashSet;

use crate::config::BuilderConfiguration;
use shared::{BuildError, BuildResult, TargetDescriptor};

/// Immutable table of target identifier to descriptor, in configuration order
#[derive(Debug, Clone)]
pub struct TargetRegistry {
    targets: Vec<TargetDescriptor>,
}

impl TargetRegistry {
    /// Build a registry, rejecting invalid descriptors and duplicate identifiers
    pub fn new(targets: Vec<TargetDescriptor>) -> BuildResult<Self> {
        if targets.is_empty() {
            return Err(BuildError::TargetConfiguration {
                identifier: "(none)".to_string(),
                message: "the configuration defines no targets".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for target in &targets {
            target.validate()?;
            if !seen.insert(target.identifier()) {
                return Err(BuildError::TargetConfiguration {
                    identifier: target.identifier().to_string(),
                    message: "identifier is registered more than once".to_string(),
                });
            }
        }

        debug!("Registered {} payload targets", targets.len());
        Ok(Self { targets })
    }

    /// Build the registry from `[[targets]]`, resolving paths against the firmware directory
    pub fn from_config(config: &BuilderConfiguration) -> BuildResult<Self> {
        let firmware_dir = config.resolve_firmware_dir();
        debug!("Resolving target paths against {}", firmware_dir.display());

        let targets = config
            .targets
            .iter()
            .map(|spec| spec.to_descriptor(&firmware_dir))
            .collect();
        Self::new(targets)
    }

    /// Find a target; its linker script must still exist on disk
    pub fn lookup(&self, identifier: &str) -> BuildResult<&TargetDescriptor> {
        let target = self
            .targets
            .iter()
            .find(|target| target.identifier() == identifier)
            .ok_or_else(|| BuildError::InvalidTarget {
                identifier: identifier.to_string(),
                available: self.identifiers().join(", "),
            })?;

        if !target.linker_script().is_file() {
            return Err(BuildError::TargetConfiguration {
                identifier: identifier.to_string(),
                message: format!("linker script {} does not exist", target.linker_script().display()),
            });
        }

        Ok(target)
    }

    /// First configured target
    pub fn default_target(&self) -> &TargetDescriptor {
        // `new` refuses an empty table
        &self.targets[0]
    }

    pub fn descriptors(&self) -> &[TargetDescriptor] {
        &self.targets
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.targets.iter().map(|target| target.identifier()).collect()
    }
}
