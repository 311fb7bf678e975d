use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;
use crate::gomodule::GoModule;
use crate::mutants::{Mutant, MutantStatus};
use crate::toolchain::Toolchain;
use crate::CancelToken;

/// Lower bound on the derived timeout, so trivially fast suites do not get
/// a pathologically tight deadline.
const TIMEOUT_FLOOR: Duration = Duration::from_secs(10);

/// Applies a single mutant inside a sandbox, runs the tests under a
/// deadline, classifies the outcome, and restores the sandbox byte for
/// byte. Mutations are textual splices, never a reprinted AST, so the diff
/// against the original is exactly the replaced token.
pub struct Executor<'a> {
    toolchain: &'a dyn Toolchain,
    module: &'a GoModule,
    tags: &'a str,
    timeout: Duration,
}

impl<'a> Executor<'a> {
    pub fn new(
        toolchain: &'a dyn Toolchain,
        module: &'a GoModule,
        tags: &'a str,
        timeout: Duration,
    ) -> Self {
        Executor {
            toolchain,
            module,
            tags,
            timeout,
        }
    }

    /// The per-mutant deadline is the coverage elapsed time scaled by the
    /// configured coefficient, floored at 10 s.
    pub fn timeout_for(coverage_elapsed: Duration, coefficient: u32) -> Duration {
        (coverage_elapsed * coefficient).max(TIMEOUT_FLOOR)
    }

    /// Run one `Runnable` mutant. Returns `Ok(true)` when the mutant was
    /// classified, `Ok(false)` when cancellation interrupted the test run
    /// (the mutant stays `Runnable`, the sandbox is restored either way).
    /// Sandbox I/O failures are errors; the worker owning this sandbox
    /// cannot continue past them.
    pub fn execute(
        &self,
        sandbox: &Path,
        mutant: &mut Mutant,
        cancel: &CancelToken,
    ) -> Result<bool, Error> {
        let file = self.sandbox_file(sandbox, mutant);
        let original = fs::read(&file).map_err(|e| Error::sandbox(&file, e))?;

        let start = mutant.start_byte;
        let end = mutant.end_byte;
        if end > original.len() || original.get(start..end) != Some(mutant.original.as_bytes()) {
            // The sandbox copy does not hold the token the scanner saw.
            mutant.note = Some("token mismatch between scan and sandbox".to_string());
            mutant.transition(MutantStatus::NotViable);
            return Ok(true);
        }

        let mut mutated = Vec::with_capacity(original.len() + mutant.replacement.len());
        mutated.extend_from_slice(&original[..start]);
        mutated.extend_from_slice(mutant.replacement.as_bytes());
        mutated.extend_from_slice(&original[end..]);
        fs::write(&file, &mutated).map_err(|e| Error::sandbox(&file, e))?;

        let cwd = self.sandbox_pkg_root(sandbox);
        let outcome = self.toolchain.run_tests(&cwd, self.tags, self.timeout, cancel);

        // Restore before classifying, whatever happened.
        fs::write(&file, &original).map_err(|e| Error::sandbox(&file, e))?;

        match outcome {
            Err(e) => {
                // Not a test failure and not a timeout: record it on the
                // mutant and keep the run going.
                mutant.note = Some(e.to_string());
                mutant.transition(MutantStatus::NotViable);
                Ok(true)
            }
            Ok(run) if run.cancelled => Ok(false),
            Ok(run) => {
                let status = if run.timed_out {
                    MutantStatus::TimedOut
                } else if run.build_failed {
                    MutantStatus::NotViable
                } else if run.exit_code == 0 {
                    MutantStatus::Lived
                } else {
                    MutantStatus::Killed
                };
                mutant.transition(status);
                Ok(true)
            }
        }
    }

    fn sandbox_file(&self, sandbox: &Path, mutant: &Mutant) -> PathBuf {
        self.sandbox_pkg_root(sandbox).join(&mutant.path)
    }

    fn sandbox_pkg_root(&self, sandbox: &Path) -> PathBuf {
        if self.module.pkg_dir == Path::new(".") {
            sandbox.to_path_buf()
        } else {
            sandbox.join(&self.module.pkg_dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_scales_coverage_time() {
        let t = Executor::timeout_for(Duration::from_secs(20), 3);
        assert_eq!(t, Duration::from_secs(60));
    }

    #[test]
    fn timeout_floor_kicks_in_for_fast_suites() {
        let t = Executor::timeout_for(Duration::from_secs(2), 3);
        assert_eq!(t, Duration::from_secs(10));
        let t = Executor::timeout_for(Duration::ZERO, 3);
        assert_eq!(t, Duration::from_secs(10));
    }
}
