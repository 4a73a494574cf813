// =============================================================================
// CARGO PROJECT STAGING - tools/goose-builder/src/compilation/staging.rs
// =============================================================================

//! Throwaway Cargo project around a single payload source file
//!
//! The project lives entirely inside the build workspace. The payload source
//! is referenced by absolute path and never copied.

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use shared::{BuildError, BuildResult, TargetDescriptor};

/// Writes the manifest, the Cargo configuration and the crate entry file
#[derive(Debug, Clone)]
pub struct ProjectStaging {
    linker: String,
}

/// Layout of a staged project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedProject {
    root: PathBuf,
    package_name: String,
    rust_triple: String,
    library_root: PathBuf,
}

impl ProjectStaging {
    /// `linker` is the C driver Cargo hands the final link to
    pub fn new(linker: impl Into<String>) -> Self {
        Self { linker: linker.into() }
    }

    pub fn stage(
        &self,
        source: &Path,
        workspace: &Path,
        package_name: &str,
        target: &TargetDescriptor,
    ) -> BuildResult<StagedProject> {
        let source_text = fs::read_to_string(source).map_err(|err| BuildError::SourceUnreadable {
            path: source.to_path_buf(),
            source: err,
        })?;
        let source = fs::canonicalize(source).map_err(|err| staging_error(source, err))?;

        let mut project = StagedProject {
            root: workspace.join(package_name),
            package_name: package_name.to_string(),
            rust_triple: target.rust_triple().to_string(),
            library_root: PathBuf::new(),
        };

        // Inner attributes cannot be include!d, so a source that is already
        // a crate root becomes the library target itself.
        project.library_root = if declares_crate_root(&source_text) {
            debug!("{} is a crate root, using it as the library target", source.display());
            source.clone()
        } else {
            project.entry_path()
        };

        create_dir(&project.root.join("src"))?;
        create_dir(&project.root.join(".cargo"))?;
        write_file(&project.manifest_path(), &project.manifest())?;
        write_file(&project.config_path(), &project.cargo_config(&self.linker, target.cpu()))?;
        write_file(&project.entry_path(), &entry_file(&source))?;

        debug!("Staged Cargo project {} at {}", project.package_name, project.root.display());
        Ok(project)
    }
}

impl StagedProject {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("Cargo.toml")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(".cargo").join("config.toml")
    }

    pub fn entry_path(&self) -> PathBuf {
        self.root.join("src").join("lib.rs")
    }

    /// File the `[lib]` section points at
    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    /// Cargo output directory, pinned inside the project
    pub fn target_dir(&self) -> PathBuf {
        self.root.join("target")
    }

    /// Where `cargo build --release` leaves the archive
    pub fn staticlib_path(&self) -> PathBuf {
        self.target_dir()
            .join(&self.rust_triple)
            .join("release")
            .join(format!("lib{}.a", self.package_name))
    }

    fn manifest(&self) -> String {
        format!(
            r#"[package]
name = {name}
version = "0.1.0"
edition = "2021"

[lib]
path = {path}
crate-type = ["staticlib"]

[profile.dev]
opt-level = "s"
debug = true
panic = "abort"

[profile.release]
opt-level = "s"
lto = true
debug = false
panic = "abort"

[workspace]
"#,
            name = toml_string(&self.package_name),
            path = toml_string(&self.library_root.to_string_lossy()),
        )
    }

    fn cargo_config(&self, linker: &str, cpu: &str) -> String {
        let flags = rustflags(linker, cpu)
            .iter()
            .map(|flag| toml_string(flag))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            r#"[build]
target = {triple}

[unstable]
build-std = ["core", "alloc"]
build-std-features = ["compiler-builtins-mem"]

[target.{triple}]
rustflags = [{flags}]
"#,
            triple = toml_string(&self.rust_triple),
            flags = flags,
        )
    }
}

/// Code generation and link flags for a freestanding payload
pub fn rustflags(linker: &str, cpu: &str) -> Vec<String> {
    [
        format!("linker={}", linker),
        "link-arg=-nostartfiles".to_string(),
        "link-arg=-nostdlib".to_string(),
        "link-arg=-static".to_string(),
        "opt-level=s".to_string(),
        format!("target-cpu={}", cpu),
    ]
    .into_iter()
    .flat_map(|flag| ["-C".to_string(), flag])
    .collect()
}

/// Cargo package name for a source stem
pub fn package_name(stem: &str) -> String {
    let name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    match name.chars().next() {
        Some(first) if first.is_ascii_alphabetic() => name,
        _ => format!("payload_{}", name),
    }
}

fn declares_crate_root(source: &str) -> bool {
    source.lines().any(|line| line.trim_start().starts_with("#!["))
}

fn entry_file(source: &Path) -> String {
    format!(
        "#![no_std]\n#![no_main]\n\ninclude!({:?});\n",
        source.to_string_lossy()
    )
}

fn toml_string(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

fn create_dir(path: &Path) -> BuildResult<()> {
    fs::create_dir_all(path).map_err(|err| staging_error(path, err))
}

fn write_file(path: &Path, contents: &str) -> BuildResult<()> {
    fs::write(path, contents).map_err(|err| staging_error(path, err))
}

fn staging_error(path: &Path, source: std::io::Error) -> BuildError {
    BuildError::ProjectStaging {
        path: path.to_path_buf(),
        source,
    }
}
