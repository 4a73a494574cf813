// =============================================================================
// PIPELINE TEST SUPPORT - tools/goose-builder/tests/common/mod.rs
// =============================================================================

//! Scripted toolchain for pipeline tests
//!
//! `FakeToolRunner` stands in for pythran, cargo, rustup and the clang
//! drivers. It writes the files the real tools would write so the pipeline
//! runs end to end without a RISC-V toolchain installed.

#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use goose_builder::{
    BuildError, BuildResult, BuilderConfiguration, TargetRegistry, ToolExit, ToolInvocation,
    ToolOutput, ToolRunner,
};

pub const FIRMWARE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../firmware");

/// Marker that makes the fake front-end tools reject a source
pub const SYNTAX_ERROR: &str = "syntax error";

pub const MINIMAL_PYTHON: &str = "#pythran export payload_main_python(int, int, int)\n\
def payload_main_python(a, b, c):\n    return 0\n";

pub const MINIMAL_RUST: &str = "#[no_mangle]\npub extern \"C\" fn payload_main() -> i32 {\n    0\n}\n";

pub struct FakeToolRunner {
    calls: Mutex<Vec<ToolInvocation>>,
    missing: Mutex<HashSet<String>>,
    component_installed: Mutex<bool>,
    pip_fixes_pythran: bool,
    linker_writes_output: bool,
}

impl FakeToolRunner {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            missing: Mutex::new(HashSet::new()),
            component_installed: Mutex::new(true),
            pip_fixes_pythran: true,
            linker_writes_output: true,
        }
    }

    /// Pretend `program` is not on the PATH
    pub fn without(self, program: &str) -> Self {
        self.missing.lock().unwrap().insert(program.to_string());
        self
    }

    pub fn without_rust_src(self) -> Self {
        *self.component_installed.lock().unwrap() = false;
        self
    }

    pub fn silent_linker(mut self) -> Self {
        self.linker_writes_output = false;
        self
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(ToolInvocation::command_line).collect()
    }

    pub fn calls_to(&self, program: &str) -> Vec<ToolInvocation> {
        self.calls().into_iter().filter(|call| call.program() == program).collect()
    }

    fn pythran(&self, args: &[String]) -> ToolOutput {
        if args.iter().any(|arg| arg == "--version") {
            return ok("0.15.0\n");
        }
        let source = value_after(args, "-e");
        let output = value_after(args, "-o");
        let text = fs::read_to_string(&source).unwrap_or_default();
        if text.contains(SYNTAX_ERROR) {
            return failed(1, "pythran: CompileError: invalid syntax");
        }
        fs::write(
            &output,
            format!("// transpiled from {}\nlong payload_main_python(long, long, long) {{ return 0; }}\n", source),
        )
        .unwrap();
        ok("")
    }

    fn cargo(&self, invocation: &ToolInvocation, args: &[String]) -> ToolOutput {
        if args.iter().any(|arg| arg == "--version") {
            return ok("cargo 1.80.0-nightly\n");
        }
        assert!(args.iter().any(|arg| arg == "build"), "unexpected cargo call {:?}", args);

        let project = invocation.get_current_dir().expect("cargo runs in the project").to_path_buf();
        let manifest: toml::Value = fs::read_to_string(project.join("Cargo.toml")).unwrap().parse().unwrap();
        let config: toml::Value = fs::read_to_string(project.join(".cargo/config.toml"))
            .unwrap()
            .parse()
            .unwrap();

        let name = manifest["package"]["name"].as_str().unwrap().to_string();
        let triple = config["build"]["target"].as_str().unwrap().to_string();
        let library_root = PathBuf::from(manifest["lib"]["path"].as_str().unwrap());

        if payload_text(&library_root).contains(SYNTAX_ERROR) {
            return failed(101, "error: expected item, found `syntax`");
        }

        let target_dir = PathBuf::from(invocation.env_value("CARGO_TARGET_DIR").expect("target dir pinned"));
        let release = target_dir.join(&triple).join("release");
        fs::create_dir_all(&release).unwrap();
        fs::write(release.join(format!("lib{}.a", name)), format!("!<arch>\n{}\n", library_root.display())).unwrap();
        ok("")
    }

    fn rustup(&self, args: &[String]) -> ToolOutput {
        if args.iter().any(|arg| arg == "list") {
            let installed = *self.component_installed.lock().unwrap();
            let listing = if installed {
                "rust-src\nrust-std-x86_64-unknown-linux-gnu\n"
            } else {
                "rust-std-x86_64-unknown-linux-gnu\n"
            };
            return ok(listing);
        }
        if args.iter().any(|arg| arg == "add") {
            *self.component_installed.lock().unwrap() = true;
        }
        ok("")
    }

    fn python(&self, args: &[String]) -> ToolOutput {
        if args.iter().any(|arg| arg == "pythran") && self.pip_fixes_pythran {
            self.missing.lock().unwrap().remove("pythran");
        }
        ok("Successfully installed pythran\n")
    }

    fn clang(&self, args: &[String]) -> ToolOutput {
        let output = value_after(args, "-o");
        let input = args[args.iter().position(|arg| arg == "-o").unwrap() + 2].clone();
        if !Path::new(&input).is_file() {
            return failed(1, &format!("clang: error: no such file or directory: '{}'", input));
        }
        if self.linker_writes_output {
            let mut image = b"\x7fELF\x01\x01\x01\x00".to_vec();
            image.extend_from_slice(input.as_bytes());
            fs::write(&output, image).unwrap();
        }
        ok("")
    }
}

impl ToolRunner for FakeToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> BuildResult<ToolOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        let program = invocation.program().to_string();
        if self.missing.lock().unwrap().contains(&program) {
            return Err(BuildError::ToolLaunch {
                program,
                source: io::Error::from(io::ErrorKind::NotFound),
            });
        }

        let args: Vec<String> = invocation
            .get_args()
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();

        Ok(match program.as_str() {
            "pythran" => self.pythran(&args),
            "cargo" => self.cargo(invocation, &args),
            "rustup" => self.rustup(&args),
            "python3" => self.python(&args),
            "clang" | "clang++" => self.clang(&args),
            other => panic!("unexpected tool {}", other),
        })
    }
}

/// Temporary workspace root plus a configuration pointing at it
pub struct TestEnv {
    pub dir: tempfile::TempDir,
    pub config: BuilderConfiguration,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let workspaces = dir.path().join("workspaces");
        fs::create_dir(&workspaces).unwrap();

        let config = BuilderConfiguration::builtin()
            .unwrap()
            .with_firmware_dir(FIRMWARE_DIR)
            .with_workspace_root(&workspaces);
        Self { dir, config }
    }

    pub fn registry(&self) -> TargetRegistry {
        TargetRegistry::from_config(&self.config).unwrap()
    }

    pub fn write_source(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.dir.path().join("out").join(name)
    }

    /// Entries left under the workspace root
    pub fn leftover_workspaces(&self) -> Vec<PathBuf> {
        fs::read_dir(self.dir.path().join("workspaces"))
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }
}

pub fn starts_with_elf_magic(path: &Path) -> bool {
    fs::read(path).map(|bytes| bytes.starts_with(b"\x7fELF")).unwrap_or(false)
}

fn ok(stdout: &str) -> ToolOutput {
    ToolOutput::new(ToolExit::Success, stdout, "")
}

fn failed(code: i32, stderr: &str) -> ToolOutput {
    ToolOutput::new(ToolExit::Failed(code), "", stderr)
}

fn value_after(args: &[String], flag: &str) -> String {
    let index = args.iter().position(|arg| arg == flag).unwrap_or_else(|| panic!("missing {}", flag));
    args[index + 1].clone()
}

/// Payload text behind a library root, following the generated include!
fn payload_text(library_root: &Path) -> String {
    let text = fs::read_to_string(library_root).unwrap();
    match text.find("include!(\"") {
        Some(start) => {
            let rest = &text[start + "include!(\"".len()..];
            let end = rest.find("\");").unwrap();
            fs::read_to_string(&rest[..end]).unwrap()
        }
        None => text,
    }
}
