// =============================================================================
// BUILD SYSTEM MAIN - tools/goose-builder/src/main.rs
// Command-line interface for USB Goose payload building
// =============================================================================

//! Payload Builder Command-Line Interface
//!
//! One subcommand per front-end with the same shape: a source file, a
//! target, an output path and the option to keep the intermediate artifact.
//! Any failure exits with status 1 and prints the full error chain,
//! including captured tool diagnostics.

use anyhow::{Context, Result as AnyhowResult};
use clap::{Args, Parser, Subcommand};
use env_logger::Builder as LogBuilder;
use log::{debug, info, warn, LevelFilter};
use std::path::PathBuf;
use std::process;

use goose_builder::pipeline::selftest;
use goose_builder::{
    BuildReport, BuilderConfiguration, PipelineOrchestrator, SystemToolRunner, TargetRegistry,
};
use shared::{BuildFlags, CompilationRequest, FrontendKind};

/// Command-line arguments for the payload builder
#[derive(Parser, Debug)]
#[command(name = "goose-build")]
#[command(about = "USB Goose payload builder - compile Python or Rust payloads to ELF")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct BuilderArgs {
    /// Verbose logging output
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Builder configuration file replacing the built-in one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding linker scripts and firmware headers
    #[arg(long, global = true)]
    firmware_dir: Option<PathBuf>,

    /// Never install missing tools automatically
    #[arg(long, global = true)]
    no_install: bool,

    #[command(subcommand)]
    command: BuilderCommand,
}

#[derive(Subcommand, Debug)]
enum BuilderCommand {
    /// Compile a Python payload through Pythran
    Python {
        /// Payload source file
        source: PathBuf,

        #[command(flatten)]
        build: BuildOptions,
    },

    /// Compile a Rust payload through Cargo
    Rust {
        /// Payload source file
        #[arg(required_unless_present = "test")]
        source: Option<PathBuf>,

        #[command(flatten)]
        build: BuildOptions,

        /// Build a built-in minimal payload to check the toolchain
        #[arg(long)]
        test: bool,
    },

    /// List the configured targets
    Targets,
}

/// Options shared by both front-ends
#[derive(Args, Debug)]
struct BuildOptions {
    /// Target identifier (default: first configured target)
    #[arg(long)]
    target: Option<String>,

    /// Output ELF file (default: <source stem>.elf)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Keep the generated C++ or static library next to the output
    #[arg(long)]
    keep_intermediate: bool,
}

impl BuildOptions {
    fn request(&self, frontend: FrontendKind, source: PathBuf, registry: &TargetRegistry) -> CompilationRequest {
        let target = self
            .target
            .clone()
            .unwrap_or_else(|| registry.default_target().identifier().to_string());

        let request = CompilationRequest::new(frontend, source, target).with_flags(BuildFlags {
            keep_intermediate: self.keep_intermediate,
            self_test: false,
        });
        match &self.output {
            Some(output) => request.with_output(output),
            None => request,
        }
    }
}

/// Main entry point for the payload builder CLI
fn main() -> AnyhowResult<()> {
    // Usage errors exit with 1 like every other failure
    let args = match BuilderArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            err.print().context("Failed to print usage")?;
            process::exit(code);
        }
    };

    // Initialize logging based on verbosity level
    initialize_logging(args.verbose);
    debug!("goose-build {} starting", env!("CARGO_PKG_VERSION"));

    let config = load_configuration(&args)?;
    let registry = TargetRegistry::from_config(&config).context("Invalid target configuration")?;
    let runner = SystemToolRunner;
    let orchestrator = PipelineOrchestrator::new(&registry, &config, &runner);

    match &args.command {
        BuilderCommand::Targets => list_targets(&registry),

        BuilderCommand::Python { source, build } => {
            let request = build.request(FrontendKind::Script, source.clone(), &registry);
            let report = orchestrator.run(&request).context("Payload build failed")?;
            display_build_report(&report);
        }

        BuilderCommand::Rust { source: _, build, test: true } => {
            if build.keep_intermediate {
                warn!("--keep-intermediate has no effect on the self-test");
            }
            let target = build
                .target
                .clone()
                .unwrap_or_else(|| registry.default_target().identifier().to_string());
            let report = selftest::run(&orchestrator, &target, build.output.as_deref())
                .context("Toolchain self-test failed")?;
            info!("Toolchain self-test passed for {}", report.target);
        }

        BuilderCommand::Rust { source: Some(source), build, test: false } => {
            let request = build.request(FrontendKind::Systems, source.clone(), &registry);
            let report = orchestrator.run(&request).context("Payload build failed")?;
            display_build_report(&report);
        }

        BuilderCommand::Rust { source: None, test: false, .. } => {
            anyhow::bail!("A source file is required unless --test is given");
        }
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn initialize_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    LogBuilder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .init();
}

/// Built-in configuration or `--config`, with command-line overrides applied
fn load_configuration(args: &BuilderArgs) -> AnyhowResult<BuilderConfiguration> {
    let mut config = match &args.config {
        Some(path) => BuilderConfiguration::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => BuilderConfiguration::builtin()?,
    };

    if let Some(dir) = &args.firmware_dir {
        config = config.with_firmware_dir(dir);
    }
    if args.no_install {
        config = config.with_auto_install(false);
    }
    Ok(config)
}

fn list_targets(registry: &TargetRegistry) {
    for target in registry.descriptors() {
        println!(
            "{:<10} {} ({}, {}) defines: {}",
            target.identifier(),
            target.triple(),
            target.cpu(),
            target.abi(),
            target.defines().join(" ")
        );
    }
}

/// Display build report information
fn display_build_report(report: &BuildReport) {
    info!("Payload build successful!");
    info!("  Output: {}", report.output.display());
    if let Some(intermediate) = &report.intermediate {
        info!("  Intermediate: {}", intermediate.display());
    }
    info!("  Target: {} ({})", report.target, report.frontend);
    info!("  Size: {} bytes", report.size);
    info!("  SHA-256: {}", report.sha256);
    info!("  Build Time: {}", report.build_time.format("%Y-%m-%d %H:%M:%S UTC"));
}
