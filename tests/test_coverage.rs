use std::path::Path;
use std::time::Duration;

use mutiny::coverage::Coverage;
use mutiny::error::Error;
use mutiny::gomodule::GoModule;

mod common;
use common::{write_go_module, FakeToolchain, CALC_COVERAGE, CALC_GO};

// --- provider ---

#[test]
fn run_parses_the_generated_report() {
    let dir = tempfile::TempDir::new().unwrap();
    write_go_module(dir.path(), "example.com/demo", &[("calc.go", CALC_GO)]);
    let module = GoModule::init(dir.path()).unwrap();
    let work = tempfile::TempDir::new().unwrap();

    let toolchain =
        FakeToolchain::new(CALC_COVERAGE, |_| common::test_run(0)).with_elapsed(Duration::from_secs(7));
    let coverage = Coverage::new(&toolchain, work.path(), &module, "");

    let run = coverage.run().unwrap();
    assert_eq!(run.elapsed, Duration::from_secs(7));
    // Add covered, Neg not: its block has count 0.
    assert!(run.profile.covers(Path::new("calc.go"), 4, 14));
    assert!(!run.profile.covers(Path::new("calc.go"), 13, 12));
}

#[test]
fn run_fails_when_dependencies_cannot_download() {
    let dir = tempfile::TempDir::new().unwrap();
    write_go_module(dir.path(), "example.com/demo", &[("calc.go", CALC_GO)]);
    let module = GoModule::init(dir.path()).unwrap();
    let work = tempfile::TempDir::new().unwrap();

    let toolchain = FakeToolchain::failing_download();
    let coverage = Coverage::new(&toolchain, work.path(), &module, "");

    let err = coverage.run().unwrap_err();
    assert!(matches!(err, Error::Coverage(_)));
    assert!(err.to_string().contains("go mod download"));
}

#[test]
fn run_fails_when_the_instrumented_suite_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    write_go_module(dir.path(), "example.com/demo", &[("calc.go", CALC_GO)]);
    let module = GoModule::init(dir.path()).unwrap();
    let work = tempfile::TempDir::new().unwrap();

    let toolchain = FakeToolchain::failing_coverage();
    let coverage = Coverage::new(&toolchain, work.path(), &module, "");

    assert!(matches!(coverage.run(), Err(Error::Coverage(_))));
}

#[test]
fn run_fails_when_no_report_was_written() {
    let dir = tempfile::TempDir::new().unwrap();
    write_go_module(dir.path(), "example.com/demo", &[("calc.go", CALC_GO)]);
    let module = GoModule::init(dir.path()).unwrap();
    let work = tempfile::TempDir::new().unwrap();

    let toolchain = FakeToolchain::without_report();
    let coverage = Coverage::new(&toolchain, work.path(), &module, "");

    let err = coverage.run().unwrap_err();
    assert!(err.to_string().contains("coverage"));
}

#[test]
fn nested_package_paths_are_normalized() {
    let dir = tempfile::TempDir::new().unwrap();
    write_go_module(
        dir.path(),
        "example.com/demo",
        &[("pkg/calc/calc.go", CALC_GO)],
    );
    let module = GoModule::init(&dir.path().join("pkg").join("calc")).unwrap();
    let work = tempfile::TempDir::new().unwrap();

    let report = "mode: set\nexample.com/demo/pkg/calc/calc.go:3.1,5.2 1 1\n";
    let toolchain = FakeToolchain::new(report, |_| common::test_run(0));
    let coverage = Coverage::new(&toolchain, work.path(), &module, "");

    let run = coverage.run().unwrap();
    // Profile keys are relative to the package dir, so the scanner's
    // relative paths match directly.
    assert!(run.profile.covers(Path::new("calc.go"), 4, 14));
}
