use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::CancelToken;

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("failed to invoke `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with code {code}: {detail}")]
    Failed {
        command: String,
        code: i32,
        detail: String,
    },

    #[error("i/o failure while running `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of one bounded test run against a mutated sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestRun {
    pub exit_code: i32,
    /// The suite never ran because the mutated source did not build.
    pub build_failed: bool,
    /// The deadline elapsed and the child was killed.
    pub timed_out: bool,
    /// The run was interrupted by cancellation, not by its own deadline.
    pub cancelled: bool,
}

/// Seam to the external language toolchain. The real implementation shells
/// out to `go`; tests substitute a scripted fake.
pub trait Toolchain: Send + Sync {
    fn download_dependencies(&self, cwd: &Path) -> Result<(), ToolchainError>;

    /// Run the full suite with coverage instrumentation, writing the
    /// coverage report to `profile_out`. Returns the elapsed wall time of
    /// the test run alone (dependency downloads are a separate step so they
    /// never inflate the timeout derivation).
    fn run_tests_with_coverage(
        &self,
        cwd: &Path,
        tags: &str,
        profile_out: &Path,
    ) -> Result<Duration, ToolchainError>;

    /// Run the suite with a hard deadline. The child is torn down when the
    /// deadline elapses or the token is cancelled; the two are reported
    /// separately so timeout classification stays independent.
    fn run_tests(
        &self,
        cwd: &Path,
        tags: &str,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<TestRun, ToolchainError>;
}

/// The real Go toolchain. Every invocation gets an explicit working
/// directory; the process-wide cwd is never touched.
///
/// `go test` exit codes: 0 all tests passed, 1 a test failed, 2 the build
/// failed before any test ran. That distinction is what separates a killed
/// mutant from a non-viable one.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoToolchain;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long the process group gets to exit after SIGTERM before SIGKILL.
const KILL_GRACE: Duration = Duration::from_secs(2);

impl Toolchain for GoToolchain {
    fn download_dependencies(&self, cwd: &Path) -> Result<(), ToolchainError> {
        let output = Command::new("go")
            .args(["mod", "download"])
            .current_dir(cwd)
            .output()
            .map_err(|e| ToolchainError::Spawn {
                command: "go mod download".to_string(),
                source: e,
            })?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ToolchainError::Failed {
                command: "go mod download".to_string(),
                code: output.status.code().unwrap_or(-1),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    fn run_tests_with_coverage(
        &self,
        cwd: &Path,
        tags: &str,
        profile_out: &Path,
    ) -> Result<Duration, ToolchainError> {
        let mut cmd = Command::new("go");
        cmd.arg("test");
        if !tags.is_empty() {
            cmd.args(["-tags", tags]);
        }
        cmd.arg("-cover")
            .arg("-coverprofile")
            .arg(profile_out)
            .arg("./...")
            .current_dir(cwd);

        let start = Instant::now();
        let output = cmd.output().map_err(|e| ToolchainError::Spawn {
            command: "go test -cover".to_string(),
            source: e,
        })?;
        if output.status.success() {
            Ok(start.elapsed())
        } else {
            Err(ToolchainError::Failed {
                command: "go test -cover".to_string(),
                code: output.status.code().unwrap_or(-1),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    fn run_tests(
        &self,
        cwd: &Path,
        tags: &str,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<TestRun, ToolchainError> {
        let mut cmd = Command::new("go");
        cmd.arg("test");
        if !tags.is_empty() {
            cmd.args(["-tags", tags]);
        }
        cmd.arg("./...")
            .current_dir(cwd)
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // `go test` execs the compiled test binary as its own child; a kill
        // must reach that whole process group, not just the wrapper.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|e| ToolchainError::Spawn {
            command: "go test".to_string(),
            source: e,
        })?;

        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let code = status.code().unwrap_or(-1);
                    return Ok(TestRun {
                        exit_code: code,
                        build_failed: code == 2,
                        timed_out: false,
                        cancelled: false,
                    });
                }
                Ok(None) => {
                    if cancel.is_cancelled() {
                        terminate_group(&mut child);
                        return Ok(TestRun {
                            exit_code: -1,
                            build_failed: false,
                            timed_out: false,
                            cancelled: true,
                        });
                    }
                    if start.elapsed() > timeout {
                        terminate_group(&mut child);
                        return Ok(TestRun {
                            exit_code: -1,
                            build_failed: false,
                            timed_out: true,
                            cancelled: false,
                        });
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    terminate_group(&mut child);
                    return Err(ToolchainError::Io {
                        command: "go test".to_string(),
                        source: e,
                    });
                }
            }
        }
    }
}

/// Tear down the child's whole process group: SIGTERM first, a grace
/// period, then SIGKILL. The group leader is reaped last, so its pgid
/// cannot be reused while the group kill is still pending.
#[cfg(unix)]
fn terminate_group(child: &mut Child) {
    let pgid = child.id() as i32;
    unsafe {
        libc::kill(-pgid, libc::SIGTERM);
    }
    let sent = Instant::now();
    while sent.elapsed() < KILL_GRACE {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(_) => break,
        }
    }
    unsafe {
        libc::kill(-pgid, libc::SIGKILL);
    }
    let _ = child.wait();
}

#[cfg(not(unix))]
fn terminate_group(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
