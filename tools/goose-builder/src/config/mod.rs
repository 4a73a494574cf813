// =============================================================================
// BUILD CONFIGURATION MODULE - tools/goose-builder/src/config/mod.rs
// =============================================================================

//! Build configuration management for payload compilation
//!
//! The builder is driven by one TOML document: which external tools to call,
//! whether a missing tool may be installed automatically, how the Rust
//! front-end is set up, and the table of hardware targets. A built-in
//! document ships inside the binary; `--config` replaces it wholesale.

use anyhow::{Context, Result as AnyhowResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use shared::TargetDescriptor;

/// Built-in configuration document
const DEFAULT_CONFIGURATION: &str = include_str!("../../config/default.toml");

/// Environment variable overriding the firmware directory
pub const FIRMWARE_DIR_ENV: &str = "GOOSE_FIRMWARE_DIR";

/// Complete builder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuilderConfiguration {
    /// Allow one automatic install attempt for Pythran and the rust-src component
    #[serde(default = "default_auto_install")]
    pub auto_install: bool,

    /// Directory that relative target paths are resolved against
    #[serde(default)]
    pub firmware_dir: Option<PathBuf>,

    /// Parent directory for per-run build workspaces
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,

    #[serde(default)]
    pub tools: ToolConfiguration,

    #[serde(default)]
    pub systems: SystemsConfiguration,

    #[serde(default)]
    pub targets: Vec<TargetSpecification>,
}

/// Names (or paths) of the external executables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfiguration {
    pub python: String,
    pub pythran: String,
    pub cargo: String,
    pub rustup: String,
    /// C driver, links static libraries
    pub cc: String,
    /// C++ driver, compiles and links transpiled sources
    pub cxx: String,
}

/// Rust front-end settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SystemsConfiguration {
    /// Toolchain passed as `+<toolchain>` to cargo and rustup
    pub toolchain: Option<String>,
    /// rustup component needed to rebuild `core` for a freestanding target
    pub component: String,
    /// Symbol the firmware jumps to
    pub entry_symbol: String,
}

/// One `[[targets]]` entry as written in the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSpecification {
    pub id: String,
    pub triple: String,
    #[serde(default)]
    pub rust_triple: Option<String>,
    pub cpu: String,
    pub abi: String,
    #[serde(default)]
    pub defines: Vec<String>,
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    pub linker_script: PathBuf,
}

fn default_auto_install() -> bool {
    true
}

impl Default for ToolConfiguration {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            pythran: "pythran".to_string(),
            cargo: "cargo".to_string(),
            rustup: "rustup".to_string(),
            cc: "clang".to_string(),
            cxx: "clang++".to_string(),
        }
    }
}

impl Default for SystemsConfiguration {
    fn default() -> Self {
        Self {
            toolchain: Some("nightly".to_string()),
            component: "rust-src".to_string(),
            entry_symbol: "payload_main".to_string(),
        }
    }
}

impl BuilderConfiguration {
    /// Configuration compiled into the binary
    pub fn builtin() -> AnyhowResult<Self> {
        Self::from_toml_str(DEFAULT_CONFIGURATION).context("Built-in configuration is invalid")
    }

    /// Parse a configuration document
    pub fn from_toml_str(text: &str) -> AnyhowResult<Self> {
        toml::from_str(text).context("Failed to parse builder configuration")
    }

    /// Load a configuration file; relative directories in it are taken
    /// relative to the file's own directory
    pub fn load(path: &Path) -> AnyhowResult<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        let mut config = Self::from_toml_str(&text)
            .with_context(|| format!("Invalid configuration file {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.firmware_dir = config.firmware_dir.map(|dir| base.join(dir));
        config.workspace_root = config.workspace_root.map(|dir| base.join(dir));

        Ok(config)
    }

    pub fn with_firmware_dir(mut self, firmware_dir: impl Into<PathBuf>) -> Self {
        self.firmware_dir = Some(firmware_dir.into());
        self
    }

    pub fn with_workspace_root(mut self, workspace_root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(workspace_root.into());
        self
    }

    pub fn with_auto_install(mut self, auto_install: bool) -> Self {
        self.auto_install = auto_install;
        self
    }

    /// Firmware directory: explicit setting, then environment, then source tree
    pub fn resolve_firmware_dir(&self) -> PathBuf {
        if let Some(dir) = &self.firmware_dir {
            return dir.clone();
        }
        if let Some(dir) = env::var_os(FIRMWARE_DIR_ENV) {
            return PathBuf::from(dir);
        }
        default_firmware_dir()
    }

    /// Parent directory for build workspaces
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root.clone().unwrap_or_else(env::temp_dir)
    }
}

impl TargetSpecification {
    /// Turn the file entry into a descriptor with absolute paths
    pub fn to_descriptor(&self, firmware_dir: &Path) -> TargetDescriptor {
        let descriptor = TargetDescriptor::new(
            self.id.clone(),
            self.triple.clone(),
            self.cpu.clone(),
            self.abi.clone(),
            firmware_dir.join(&self.linker_script),
        )
        .with_defines(self.defines.iter().cloned())
        .with_include_dirs(self.include_dirs.iter().map(|dir| firmware_dir.join(dir)));

        match &self.rust_triple {
            Some(rust_triple) => descriptor.with_rust_triple(rust_triple.clone()),
            None => descriptor,
        }
    }
}

/// `firmware/` at the top of the source tree
fn default_firmware_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..").join("firmware")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_configuration_lists_both_chips() {
        let config = BuilderConfiguration::builtin().unwrap();
        let ids: Vec<_> = config.targets.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["ch569", "esp32c6"]);
        assert!(config.auto_install);
        assert_eq!(config.tools.cxx, "clang++");
        assert_eq!(config.systems.component, "rust-src");
    }

    #[test]
    fn partial_tables_fall_back_to_defaults() {
        let config = BuilderConfiguration::from_toml_str(
            r#"
            auto_install = false

            [tools]
            cc = "/opt/llvm/bin/clang"
            "#,
        )
        .unwrap();
        assert!(!config.auto_install);
        assert_eq!(config.tools.cc, "/opt/llvm/bin/clang");
        assert_eq!(config.tools.pythran, "pythran");
        assert_eq!(config.systems.toolchain.as_deref(), Some("nightly"));
        assert!(config.targets.is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(BuilderConfiguration::from_toml_str("auto_instal = true").is_err());
    }

    #[test]
    fn load_resolves_directories_next_to_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goose.toml");
        fs::write(&path, "firmware_dir = \"fw\"\nworkspace_root = \"scratch\"\n").unwrap();

        let config = BuilderConfiguration::load(&path).unwrap();
        assert_eq!(config.resolve_firmware_dir(), dir.path().join("fw"));
        assert_eq!(config.workspace_root(), dir.path().join("scratch"));
    }

    #[test]
    fn target_paths_resolve_against_firmware_dir() {
        let config = BuilderConfiguration::builtin().unwrap();
        let descriptor = config.targets[0].to_descriptor(Path::new("/fw"));
        assert_eq!(descriptor.linker_script(), Path::new("/fw/ch569/ch569_payload.ld"));
        assert_eq!(descriptor.include_dirs()[0], PathBuf::from("/fw/common/include"));
        assert_eq!(descriptor.rust_triple(), "riscv32imac-unknown-none-elf");
    }
}
