// =============================================================================
// SELF-TEST INTEGRATION TESTS - tools/goose-builder/tests/selftest.rs
// =============================================================================

mod common;

use common::{starts_with_elf_magic, FakeToolRunner, TestEnv};
use goose_builder::pipeline::selftest;
use goose_builder::{BuildError, PipelineOrchestrator};

#[test]
fn probe_builds_for_the_requested_target() {
    let env = TestEnv::new();
    let registry = env.registry();
    let runner = FakeToolRunner::new();
    let orchestrator = PipelineOrchestrator::new(&registry, &env.config, &runner);

    let output = env.output("probe.elf");
    let report = selftest::run(&orchestrator, "esp32c6", Some(&output)).unwrap();

    assert_eq!(report.target, "esp32c6");
    assert!(starts_with_elf_magic(&output));
    assert!(runner
        .command_lines()
        .iter()
        .any(|line| line.contains("-march=rv32imc")));
    assert!(env.leftover_workspaces().is_empty());
}

#[test]
fn probe_output_is_discarded_by_default() {
    let env = TestEnv::new();
    let registry = env.registry();
    let runner = FakeToolRunner::new();
    let orchestrator = PipelineOrchestrator::new(&registry, &env.config, &runner);

    let report = selftest::run(&orchestrator, "ch569", None).unwrap();

    assert!(!report.output.exists());
    assert!(env.leftover_workspaces().is_empty());
}

#[test]
fn probe_reports_missing_cargo() {
    let env = TestEnv::new();
    let registry = env.registry();
    let runner = FakeToolRunner::new().without("cargo");
    let orchestrator = PipelineOrchestrator::new(&registry, &env.config, &runner);

    let failure = selftest::run(&orchestrator, "ch569", None).unwrap_err();
    assert!(matches!(failure.error, BuildError::ToolMissing { ref tool, .. } if tool == "cargo"));
    assert!(env.leftover_workspaces().is_empty());
}
