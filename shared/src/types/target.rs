// =============================================================================
// SHARED/SRC/TYPES/TARGET.RS - Payload Target Descriptor
// =============================================================================

use std::path::{Path, PathBuf};

use crate::types::error::BuildError;

/// Everything the toolchains need to know about one microcontroller target
///
/// Descriptors are assembled once while the target registry loads and are
/// only handed out by shared reference afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    identifier: String,
    triple: String,
    rust_triple: String,
    cpu: String,
    abi: String,
    defines: Vec<String>,
    include_dirs: Vec<PathBuf>,
    linker_script: PathBuf,
}

impl TargetDescriptor {
    /// Create a descriptor; the Rust target triple defaults to `triple`
    pub fn new(
        identifier: impl Into<String>,
        triple: impl Into<String>,
        cpu: impl Into<String>,
        abi: impl Into<String>,
        linker_script: impl Into<PathBuf>,
    ) -> Self {
        let triple = triple.into();
        Self {
            identifier: identifier.into(),
            rust_triple: triple.clone(),
            triple,
            cpu: cpu.into(),
            abi: abi.into(),
            defines: Vec::new(),
            include_dirs: Vec::new(),
            linker_script: linker_script.into(),
        }
    }

    pub fn with_rust_triple(mut self, rust_triple: impl Into<String>) -> Self {
        self.rust_triple = rust_triple.into();
        self
    }

    pub fn with_defines<I, S>(mut self, defines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.defines = defines.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_include_dirs<I, P>(mut self, include_dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.include_dirs = include_dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Registry key, e.g. `ch569`
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Triple handed to the C/C++ driver
    pub fn triple(&self) -> &str {
        &self.triple
    }

    /// Target name Cargo knows the same hardware by
    pub fn rust_triple(&self) -> &str {
        &self.rust_triple
    }

    pub fn cpu(&self) -> &str {
        &self.cpu
    }

    pub fn abi(&self) -> &str {
        &self.abi
    }

    pub fn defines(&self) -> &[String] {
        &self.defines
    }

    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }

    pub fn linker_script(&self) -> &Path {
        &self.linker_script
    }

    /// Check that no field is empty
    pub fn validate(&self) -> Result<(), BuildError> {
        let scalar_fields = [
            ("identifier", self.identifier.as_str()),
            ("triple", self.triple.as_str()),
            ("rust_triple", self.rust_triple.as_str()),
            ("cpu", self.cpu.as_str()),
            ("abi", self.abi.as_str()),
        ];
        for (name, value) in scalar_fields {
            if value.trim().is_empty() {
                return Err(self.misconfigured(format!("field '{}' is empty", name)));
            }
        }

        if self.defines.is_empty() || self.defines.iter().any(|d| d.trim().is_empty()) {
            return Err(self.misconfigured("defines must be a non-empty list of non-empty names"));
        }

        if self.include_dirs.is_empty() || self.include_dirs.iter().any(|p| p.as_os_str().is_empty()) {
            return Err(self.misconfigured("include_dirs must be a non-empty list of paths"));
        }

        if self.linker_script.as_os_str().is_empty() {
            return Err(self.misconfigured("field 'linker_script' is empty"));
        }

        Ok(())
    }

    fn misconfigured(&self, message: impl Into<String>) -> BuildError {
        BuildError::TargetConfiguration {
            identifier: self.identifier.clone(),
            message: message.into(),
        }
    }
}
