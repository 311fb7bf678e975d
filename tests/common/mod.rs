#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mutiny::toolchain::{TestRun, Toolchain, ToolchainError};
use mutiny::CancelToken;

type TestRule = Box<dyn Fn(&Path) -> Result<TestRun, ToolchainError> + Send + Sync>;

/// Scripted toolchain: serves a canned coverage report and decides each
/// test run's outcome from a rule, without launching any process. The rule
/// receives the working directory of the run, so it can inspect the
/// mutated sandbox to act like a real suite would.
pub struct FakeToolchain {
    coverage_report: Option<String>,
    coverage_elapsed: Duration,
    fail_download: bool,
    fail_coverage: bool,
    rule: TestRule,
    test_runs: AtomicUsize,
}

impl FakeToolchain {
    pub fn new(
        coverage_report: &str,
        rule: impl Fn(&Path) -> Result<TestRun, ToolchainError> + Send + Sync + 'static,
    ) -> Self {
        FakeToolchain {
            coverage_report: Some(coverage_report.to_string()),
            coverage_elapsed: Duration::from_secs(1),
            fail_download: false,
            fail_coverage: false,
            rule: Box::new(rule),
            test_runs: AtomicUsize::new(0),
        }
    }

    /// Never writes a coverage report, so reading it fails downstream.
    pub fn without_report() -> Self {
        let mut fake = Self::new("", |_| test_run(0));
        fake.coverage_report = None;
        fake
    }

    pub fn failing_download() -> Self {
        let mut fake = Self::new("", |_| test_run(0));
        fake.fail_download = true;
        fake
    }

    pub fn failing_coverage() -> Self {
        let mut fake = Self::new("", |_| test_run(0));
        fake.fail_coverage = true;
        fake
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.coverage_elapsed = elapsed;
        self
    }

    /// How many times `run_tests` was invoked.
    pub fn test_runs(&self) -> usize {
        self.test_runs.load(Ordering::SeqCst)
    }
}

impl Toolchain for FakeToolchain {
    fn download_dependencies(&self, _cwd: &Path) -> Result<(), ToolchainError> {
        if self.fail_download {
            return Err(ToolchainError::Failed {
                command: "go mod download".to_string(),
                code: 1,
                detail: "no network".to_string(),
            });
        }
        Ok(())
    }

    fn run_tests_with_coverage(
        &self,
        _cwd: &Path,
        _tags: &str,
        profile_out: &Path,
    ) -> Result<Duration, ToolchainError> {
        if self.fail_coverage {
            return Err(ToolchainError::Failed {
                command: "go test -cover".to_string(),
                code: 1,
                detail: "tests failed".to_string(),
            });
        }
        if let Some(report) = &self.coverage_report {
            fs::write(profile_out, report).map_err(|e| ToolchainError::Io {
                command: "go test -cover".to_string(),
                source: e,
            })?;
        }
        Ok(self.coverage_elapsed)
    }

    fn run_tests(
        &self,
        cwd: &Path,
        _tags: &str,
        _timeout: Duration,
        _cancel: &CancelToken,
    ) -> Result<TestRun, ToolchainError> {
        self.test_runs.fetch_add(1, Ordering::SeqCst);
        (self.rule)(cwd)
    }
}

pub fn test_run(exit_code: i32) -> Result<TestRun, ToolchainError> {
    Ok(TestRun {
        exit_code,
        build_failed: exit_code == 2,
        timed_out: false,
        cancelled: false,
    })
}

pub fn timed_out_run() -> Result<TestRun, ToolchainError> {
    Ok(TestRun {
        exit_code: -1,
        build_failed: false,
        timed_out: true,
        cancelled: false,
    })
}

pub fn cancelled_run() -> Result<TestRun, ToolchainError> {
    Ok(TestRun {
        exit_code: -1,
        build_failed: false,
        timed_out: false,
        cancelled: true,
    })
}

/// Lay a Go module out on disk: a `go.mod` plus the given files, paths
/// relative to the module root.
pub fn write_go_module(dir: &Path, name: &str, files: &[(&str, &str)]) {
    fs::write(dir.join("go.mod"), format!("module {name}\n\ngo 1.22\n")).unwrap();
    for (rel, contents) in files {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
}

/// Three small functions with one mutable token each: `+` (line 4),
/// `++` (line 8) and a unary `-` (line 13).
pub const CALC_GO: &str = "package calc

func Add(a, b int) int {
    return a + b
}

func Inc(x int) int {
    x++
    return x
}

func Neg(x int) int {
    return -x
}
";

/// Coverage for CALC_GO: `Add` and `Inc` executed, `Neg` not.
pub const CALC_COVERAGE: &str = "mode: set
example.com/demo/calc.go:3.1,5.2 1 1
example.com/demo/calc.go:7.1,10.2 2 1
example.com/demo/calc.go:12.1,14.2 1 0
";
