use std::path::PathBuf;
use std::time::Duration;

use mutiny::catalog::MutantKind;
use mutiny::gomodule::GoModule;
use mutiny::mutants::{Mutant, MutantStatus};
use mutiny::report::{json_report, write_json, JsonReport};
use mutiny::results::Results;

fn module() -> GoModule {
    GoModule {
        name: "example.com/demo".to_string(),
        root: PathBuf::from("/src/demo"),
        pkg_dir: PathBuf::from("."),
    }
}

fn mutant(kind: MutantKind, status: MutantStatus, line: usize) -> Mutant {
    let mut m = Mutant::new(
        kind,
        PathBuf::from("calc.go"),
        line,
        7,
        0,
        1,
        "+".to_string(),
        "-".to_string(),
        if status == MutantStatus::NotCovered {
            MutantStatus::NotCovered
        } else {
            MutantStatus::Runnable
        },
    );
    m.transition(status);
    m
}

fn sample_results() -> Results {
    Results::new(
        vec![
            mutant(MutantKind::ArithmeticBase, MutantStatus::Killed, 3),
            mutant(MutantKind::ConditionalsBoundary, MutantStatus::Lived, 5),
            mutant(MutantKind::IncrementDecrement, MutantStatus::TimedOut, 8),
            mutant(MutantKind::InvertNegatives, MutantStatus::NotCovered, 12),
        ],
        Duration::from_millis(1500),
        Duration::from_millis(42_000),
        false,
    )
}

// --- json document ---

#[test]
fn json_report_carries_counts_and_metrics() {
    let report = json_report(&sample_results(), &module());

    assert_eq!(report.module, "example.com/demo");
    assert_eq!(report.counts.killed, 1);
    assert_eq!(report.counts.lived, 1);
    assert_eq!(report.counts.timed_out, 1);
    assert_eq!(report.counts.not_covered, 1);
    assert_eq!(report.counts.not_viable, 0);
    assert_eq!(report.counts.not_executed, 0);
    assert!((report.efficacy - 0.5).abs() < 1e-9);
    assert!((report.mutant_coverage - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(report.coverage_elapsed_ms, 1500);
    assert_eq!(report.mutation_elapsed_ms, 42_000);
    assert!(!report.cancelled);
}

#[test]
fn json_mutants_use_stable_identifiers() {
    let report = json_report(&sample_results(), &module());
    assert_eq!(report.mutants.len(), 4);

    let kinds: Vec<_> = report.mutants.iter().map(|m| m.kind.as_str()).collect();
    assert!(kinds.contains(&"ARITHMETIC_BASE"));
    assert!(kinds.contains(&"CONDITIONALS_BOUNDARY"));

    let statuses: Vec<_> = report.mutants.iter().map(|m| m.status.as_str()).collect();
    assert!(statuses.contains(&"KILLED"));
    assert!(statuses.contains(&"TIMED_OUT"));
    assert!(statuses.contains(&"NOT_COVERED"));

    let killed = report.mutants.iter().find(|m| m.status == "KILLED").unwrap();
    assert_eq!(killed.file, "calc.go");
    assert_eq!(killed.line, 3);
    assert_eq!(killed.column, 7);
    assert_eq!(killed.original, "+");
    assert_eq!(killed.replacement, "-");
}

#[test]
fn written_report_round_trips() {
    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("report.json");
    write_json(&sample_results(), &module(), &out).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    let parsed: JsonReport = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed.counts.killed, 1);
    assert_eq!(parsed.mutants.len(), 4);
}

#[test]
fn notes_survive_serialization() {
    let mut noted = mutant(MutantKind::ArithmeticBase, MutantStatus::Runnable, 3);
    noted.note = Some("go test: command not found".to_string());
    noted.transition(MutantStatus::NotViable);

    let results = Results::new(vec![noted], Duration::ZERO, Duration::ZERO, false);
    let report = json_report(&results, &module());
    assert_eq!(
        report.mutants[0].note.as_deref(),
        Some("go test: command not found")
    );
    assert_eq!(report.mutants[0].status, "NOT_VIABLE");
}

#[test]
fn cancelled_flag_is_reported() {
    let results = Results::new(vec![], Duration::ZERO, Duration::ZERO, true);
    let report = json_report(&results, &module());
    assert!(report.cancelled);
}
