// =============================================================================
// SHARED/SRC/TYPES/REQUEST.RS - Compilation Request Types
// =============================================================================

use std::fmt;
use std::path::{Path, PathBuf};

/// Source language front-end used to turn a payload into native code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontendKind {
    /// Python dialect transpiled to C++ by Pythran
    Script,
    /// Rust built into a static library by Cargo
    Systems,
}

impl FrontendKind {
    /// Human-readable language label
    pub fn label(&self) -> &'static str {
        match self {
            FrontendKind::Script => "python",
            FrontendKind::Systems => "rust",
        }
    }
}

impl fmt::Display for FrontendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Optional behaviour switches of one request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildFlags {
    /// Copy the generated C++ or static library next to the output
    pub keep_intermediate: bool,
    /// Build the built-in probe payload instead of user source
    pub self_test: bool,
}

/// One user request: compile `source` for `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationRequest {
    pub source: PathBuf,
    pub frontend: FrontendKind,
    pub target: String,
    pub output: Option<PathBuf>,
    pub flags: BuildFlags,
}

impl CompilationRequest {
    pub fn new(frontend: FrontendKind, source: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            frontend,
            target: target.into(),
            output: None,
            flags: BuildFlags::default(),
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_flags(mut self, flags: BuildFlags) -> Self {
        self.flags = flags;
        self
    }

    /// File stem of the source, falling back to `payload`
    pub fn source_stem(&self) -> String {
        source_stem(&self.source)
    }

    /// Where the final ELF goes: the explicit output or `<stem>.elf`
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => PathBuf::from(format!("{}.elf", self.source_stem())),
        }
    }
}

fn source_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_is_derived_from_source() {
        let request = CompilationRequest::new(FrontendKind::Script, "payloads/os_detect.py", "ch569");
        assert_eq!(request.output_path(), PathBuf::from("os_detect.elf"));

        let request = request.with_output("out/detect.elf");
        assert_eq!(request.output_path(), PathBuf::from("out/detect.elf"));
    }

    #[test]
    fn frontend_labels() {
        assert_eq!(FrontendKind::Script.to_string(), "python");
        assert_eq!(FrontendKind::Systems.label(), "rust");
    }
}
