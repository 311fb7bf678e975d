use crate::results::Results;

/// Quality-gate thresholds in percent, 0..=100. A threshold of 0 disables
/// that gate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Thresholds {
    pub efficacy: f64,
    pub mutant_coverage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub name: &'static str,
    pub threshold: f64,
    pub actual: f64,
}

/// Compare the run's metrics against the configured thresholds. An empty
/// result means every configured gate was met.
pub fn check(results: &Results, thresholds: &Thresholds) -> Vec<Violation> {
    let mut violations = Vec::new();

    let efficacy = results.efficacy() * 100.0;
    if thresholds.efficacy > 0.0 && efficacy < thresholds.efficacy {
        violations.push(Violation {
            name: "test efficacy",
            threshold: thresholds.efficacy,
            actual: efficacy,
        });
    }

    let mcover = results.mutant_coverage() * 100.0;
    if thresholds.mutant_coverage > 0.0 && mcover < thresholds.mutant_coverage {
        violations.push(Violation {
            name: "mutant coverage",
            threshold: thresholds.mutant_coverage,
            actual: mcover,
        });
    }

    violations
}
