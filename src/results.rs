use std::time::Duration;

use crate::mutants::{Mutant, MutantStatus};

/// Aggregate outcome of a run: every discovered mutant (covered or not),
/// the elapsed wall time of the two phases, and whether the run was cut
/// short by cancellation.
#[derive(Debug)]
pub struct Results {
    mutants: Vec<Mutant>,
    pub coverage_elapsed: Duration,
    pub mutation_elapsed: Duration,
    pub cancelled: bool,
    /// Workers lost along the way (sandbox I/O failures). The run went on
    /// without them.
    pub worker_errors: Vec<String>,
}

impl Results {
    pub fn new(
        mut mutants: Vec<Mutant>,
        coverage_elapsed: Duration,
        mutation_elapsed: Duration,
        cancelled: bool,
    ) -> Self {
        mutants.sort_by(|a, b| {
            (&a.path, a.line, a.column, a.kind.id(), &a.replacement)
                .cmp(&(&b.path, b.line, b.column, b.kind.id(), &b.replacement))
        });
        Results {
            mutants,
            coverage_elapsed,
            mutation_elapsed,
            cancelled,
            worker_errors: Vec::new(),
        }
    }

    pub fn mutants(&self) -> &[Mutant] {
        &self.mutants
    }

    pub fn total(&self) -> usize {
        self.mutants.len()
    }

    pub fn count(&self, status: MutantStatus) -> usize {
        self.mutants.iter().filter(|m| m.status() == status).count()
    }

    /// Fraction of executed mutants that were killed, in [0, 1].
    /// 0 when nothing was executed.
    pub fn efficacy(&self) -> f64 {
        let killed = self.count(MutantStatus::Killed) as f64;
        let lived = self.count(MutantStatus::Lived) as f64;
        ratio(killed, killed + lived)
    }

    /// Fraction of discovered mutants that were executable, in [0, 1].
    /// 0 when nothing was discovered.
    pub fn mutant_coverage(&self) -> f64 {
        let killed = self.count(MutantStatus::Killed) as f64;
        let lived = self.count(MutantStatus::Lived) as f64;
        let not_covered = self.count(MutantStatus::NotCovered) as f64;
        ratio(killed + lived, killed + lived + not_covered)
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
