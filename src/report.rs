use std::fs;
use std::path::Path;
use std::time::Duration;

use console::Style;
use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

use crate::gate::{Thresholds, Violation};
use crate::gomodule::GoModule;
use crate::mutants::{Mutant, MutantStatus};
use crate::results::Results;

pub fn print_error(msg: &str) {
    let style = Style::new().red().bold();
    eprintln!("{} {}", style.apply_to("✗"), msg);
}

pub fn print_note(msg: &str) {
    eprintln!("{msg}");
}

/// Human-readable report: one line per mutant, a diff for every survivor,
/// then the summary block with totals and both metrics.
pub fn print_results(results: &Results, module: &GoModule) {
    for mutant in results.mutants() {
        print_mutant(mutant, module);
    }

    if results.total() == 0 {
        let style = Style::new().green().bold();
        println!("{} No mutants found.", style.apply_to("✓"));
    }

    println!();
    println!(
        "Coverage gathering took {}; mutation testing took {}",
        format_duration(results.coverage_elapsed),
        format_duration(results.mutation_elapsed),
    );
    println!();
    println!("  Killed: {}", results.count(MutantStatus::Killed));
    println!("  Lived: {}", results.count(MutantStatus::Lived));
    println!("  Timed out: {}", results.count(MutantStatus::TimedOut));
    println!("  Not viable: {}", results.count(MutantStatus::NotViable));
    println!("  Not covered: {}", results.count(MutantStatus::NotCovered));
    let remaining = results.count(MutantStatus::Runnable);
    if remaining > 0 {
        println!("  Not executed: {remaining}");
    }
    println!();
    println!("Test efficacy: {:.2}%", results.efficacy() * 100.0);
    println!("Mutant coverage: {:.2}%", results.mutant_coverage() * 100.0);

    if results.cancelled {
        let style = Style::new().yellow().bold();
        println!();
        println!(
            "{} Run cancelled; the results above are partial.",
            style.apply_to("!")
        );
    }

    for err in &results.worker_errors {
        let style = Style::new().yellow().bold();
        eprintln!("{} worker lost: {err}", style.apply_to("!"));
    }
}

fn print_mutant(mutant: &Mutant, module: &GoModule) {
    let status = mutant.status();
    let style = match status {
        MutantStatus::Killed => Style::new().green(),
        MutantStatus::Lived => Style::new().red().bold(),
        MutantStatus::TimedOut => Style::new().yellow(),
        MutantStatus::NotViable | MutantStatus::NotCovered | MutantStatus::Runnable => {
            Style::new().dim()
        }
    };
    let op = if mutant.replacement.is_empty() {
        format!("remove {}", mutant.original)
    } else {
        format!("{} → {}", mutant.original, mutant.replacement)
    };
    println!(
        "  {:<12} {:<22} {}:{}:{} {}",
        style.apply_to(status.name()),
        mutant.kind.id(),
        mutant.path.display(),
        mutant.line,
        mutant.column,
        op,
    );
    if let Some(note) = &mutant.note {
        let dim = Style::new().dim();
        println!("    {}", dim.apply_to(note));
    }
    if status == MutantStatus::Lived {
        if let Some(diff) = mutated_diff(module, mutant) {
            for line in diff.lines() {
                if line.starts_with('-') {
                    println!("    {}", Style::new().red().apply_to(line));
                } else if line.starts_with('+') {
                    println!("    {}", Style::new().green().apply_to(line));
                }
            }
        }
    }
}

/// Minimal line diff of the survivor against the pristine source, read
/// from the original module tree (never from a sandbox).
fn mutated_diff(module: &GoModule, mutant: &Mutant) -> Option<String> {
    let source = fs::read_to_string(module.pkg_root().join(&mutant.path)).ok()?;
    let bytes = source.as_bytes();
    if mutant.end_byte > bytes.len()
        || bytes.get(mutant.start_byte..mutant.end_byte) != Some(mutant.original.as_bytes())
    {
        return None;
    }
    let mut mutated = String::with_capacity(source.len());
    mutated.push_str(&source[..mutant.start_byte]);
    mutated.push_str(&mutant.replacement);
    mutated.push_str(&source[mutant.end_byte..]);

    let diff = TextDiff::from_lines(&source, &mutated);
    let mut output = String::new();
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Delete => output.push_str(&format!("- {change}")),
            ChangeTag::Insert => output.push_str(&format!("+ {change}")),
            ChangeTag::Equal => {}
        }
    }
    Some(output)
}

/// One verdict line per configured gate.
pub fn print_gate(violations: &[Violation], thresholds: &Thresholds, results: &Results) {
    let gates = [
        ("test efficacy", thresholds.efficacy, results.efficacy() * 100.0),
        (
            "mutant coverage",
            thresholds.mutant_coverage,
            results.mutant_coverage() * 100.0,
        ),
    ];
    let mut printed_any = false;
    for (name, threshold, actual) in gates {
        if threshold <= 0.0 {
            continue;
        }
        if !printed_any {
            println!();
            printed_any = true;
        }
        if violations.iter().any(|v| v.name == name) {
            let style = Style::new().red().bold();
            println!(
                "{} {} {:.2}% is below the {:.2}% threshold",
                style.apply_to("✗"),
                name,
                actual,
                threshold,
            );
        } else {
            let style = Style::new().green().bold();
            println!(
                "{} {} {:.2}% meets the {:.2}% threshold",
                style.apply_to("✓"),
                name,
                actual,
                threshold,
            );
        }
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs >= 60.0 {
        format!("{}m {:.0}s", (secs / 60.0) as u64, secs % 60.0)
    } else {
        format!("{secs:.1}s")
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub module: String,
    pub efficacy: f64,
    pub mutant_coverage: f64,
    pub coverage_elapsed_ms: u64,
    pub mutation_elapsed_ms: u64,
    pub cancelled: bool,
    pub counts: JsonCounts,
    pub mutants: Vec<JsonMutant>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonCounts {
    pub killed: usize,
    pub lived: usize,
    pub timed_out: usize,
    pub not_viable: usize,
    pub not_covered: usize,
    pub not_executed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonMutant {
    pub kind: String,
    pub status: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub original: String,
    pub replacement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub fn json_report(results: &Results, module: &GoModule) -> JsonReport {
    JsonReport {
        module: module.name.clone(),
        efficacy: results.efficacy(),
        mutant_coverage: results.mutant_coverage(),
        coverage_elapsed_ms: results.coverage_elapsed.as_millis() as u64,
        mutation_elapsed_ms: results.mutation_elapsed.as_millis() as u64,
        cancelled: results.cancelled,
        counts: JsonCounts {
            killed: results.count(MutantStatus::Killed),
            lived: results.count(MutantStatus::Lived),
            timed_out: results.count(MutantStatus::TimedOut),
            not_viable: results.count(MutantStatus::NotViable),
            not_covered: results.count(MutantStatus::NotCovered),
            not_executed: results.count(MutantStatus::Runnable),
        },
        mutants: results
            .mutants()
            .iter()
            .map(|m| JsonMutant {
                kind: m.kind.id().to_string(),
                status: m.status().id().to_string(),
                file: m.path.display().to_string(),
                line: m.line,
                column: m.column,
                original: m.original.clone(),
                replacement: m.replacement.clone(),
                note: m.note.clone(),
            })
            .collect(),
    }
}

/// Machine-readable report for `--output`.
pub fn write_json(results: &Results, module: &GoModule, path: &Path) -> std::io::Result<()> {
    let report = json_report(results, module);
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    fs::write(path, json)
}
