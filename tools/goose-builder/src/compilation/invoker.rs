// =============================================================================
// TOOLCHAIN INVOKER - tools/goose-builder/src/compilation/invoker.rs
// =============================================================================

//! External tool execution
//!
//! Every compiler, transpiler and package-manager call goes through the
//! [`ToolRunner`] trait. The production runner blocks on one child process
//! and captures both output streams; it never interprets the exit status.

use log::{debug, trace};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use shared::{BuildError, BuildResult, ToolExit};

/// One fully described process launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    program: String,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs.push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    pub fn get_envs(&self) -> &[(OsString, OsString)] {
        &self.envs
    }

    /// Value of an environment override, if set
    pub fn env_value(&self, key: &str) -> Option<&OsStr> {
        self.envs
            .iter()
            .rev()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_os_str())
    }

    /// Printable command line for logs
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        command
    }
}

/// What a finished tool left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    exit: ToolExit,
    stdout: String,
    stderr: String,
}

impl ToolOutput {
    pub fn new(exit: ToolExit, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn exit(&self) -> ToolExit {
        self.exit
    }

    pub fn success(&self) -> bool {
        self.exit.success()
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Captured output for error reports; stderr first since compilers write there
    pub fn diagnostics(&self) -> String {
        let stderr = self.stderr.trim_end();
        let stdout = self.stdout.trim_end();
        match (stderr.is_empty(), stdout.is_empty()) {
            (false, false) => format!("{}\n{}", stderr, stdout),
            (false, true) => stderr.to_string(),
            (true, false) => stdout.to_string(),
            (true, true) => String::new(),
        }
    }
}

/// Runs external tools; implementations must be shareable between pipelines
pub trait ToolRunner: Send + Sync {
    fn run(&self, invocation: &ToolInvocation) -> BuildResult<ToolOutput>;
}

/// Runs tools as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> BuildResult<ToolOutput> {
        debug!("Running: {}", invocation.command_line());

        let output = invocation
            .to_command()
            .output()
            .map_err(|source| BuildError::ToolLaunch {
                program: invocation.program().to_string(),
                source,
            })?;

        let result = ToolOutput::new(
            ToolExit::from(output.status),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        trace!("{} {}", invocation.program(), result.exit());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_keeps_arguments_discrete() {
        let invocation = ToolInvocation::new("clang")
            .arg("-I")
            .arg("/path with spaces/include")
            .args(["-o", "out.elf"]);
        assert_eq!(invocation.get_args().len(), 4);
        assert_eq!(invocation.get_args()[1], OsString::from("/path with spaces/include"));
        assert_eq!(
            invocation.command_line(),
            "clang -I /path with spaces/include -o out.elf"
        );
    }

    #[test]
    fn later_environment_overrides_win() {
        let invocation = ToolInvocation::new("cargo")
            .env("RUSTFLAGS", "-C a")
            .env("RUSTFLAGS", "-C b");
        assert_eq!(invocation.env_value("RUSTFLAGS"), Some(OsStr::new("-C b")));
        assert_eq!(invocation.env_value("CARGO_TARGET_DIR"), None);
    }

    #[test]
    fn diagnostics_prefer_stderr() {
        let output = ToolOutput::new(ToolExit::Failed(1), "note\n", "error: boom\n");
        assert_eq!(output.diagnostics(), "error: boom\nnote");
        assert!(!output.success());
    }

    #[test]
    fn launch_failure_is_distinct_from_tool_failure() {
        let invocation = ToolInvocation::new("goose-builder-no-such-tool");
        match SystemToolRunner.run(&invocation) {
            Err(BuildError::ToolLaunch { program, .. }) => {
                assert_eq!(program, "goose-builder-no-such-tool")
            }
            other => panic!("expected ToolLaunch, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_captured_not_raised() {
        let invocation = ToolInvocation::new("sh").args(["-c", "echo oops >&2; exit 3"]);
        let output = SystemToolRunner.run(&invocation).unwrap();
        assert_eq!(output.exit(), ToolExit::Failed(3));
        assert_eq!(output.stderr().trim(), "oops");
    }
}
