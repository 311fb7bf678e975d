use std::collections::HashSet;
use std::path::PathBuf;

use crate::catalog::{MutantKind, ALL_KINDS};
use crate::gate::Thresholds;

/// Run configuration. Constructed once at the CLI boundary and passed down
/// by reference; there is no global configuration store. `default()` is the
/// defaults record the CLI merges flag values over.
#[derive(Debug, Clone)]
pub struct Config {
    /// Scan only; never execute tests.
    pub dry_run: bool,
    /// Comma-separated build tags passed through to the toolchain.
    pub tags: String,
    /// Where to write the machine-readable report, if anywhere.
    pub output: Option<PathBuf>,
    /// Gate thresholds in percent; 0 disables a gate.
    pub threshold_efficacy: f64,
    pub threshold_mcover: f64,
    /// Multiplier on the coverage elapsed time for the per-mutant timeout.
    pub timeout_coefficient: u32,
    /// Worker count; 0 means one per available CPU.
    pub workers: usize,
    pub enabled_kinds: HashSet<MutantKind>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dry_run: false,
            tags: String::new(),
            output: None,
            threshold_efficacy: 0.0,
            threshold_mcover: 0.0,
            timeout_coefficient: 3,
            workers: 0,
            enabled_kinds: ALL_KINDS
                .iter()
                .copied()
                .filter(MutantKind::is_default_enabled)
                .collect(),
        }
    }
}

impl Config {
    pub fn set_kind_enabled(&mut self, kind: MutantKind, enabled: bool) {
        if enabled {
            self.enabled_kinds.insert(kind);
        } else {
            self.enabled_kinds.remove(&kind);
        }
    }

    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .max(1)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            efficacy: self.threshold_efficacy,
            mutant_coverage: self.threshold_mcover,
        }
    }
}
