use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};

use mutiny::catalog::MutantKind;
use mutiny::config::Config;
use mutiny::coverage::Coverage;
use mutiny::gate;
use mutiny::gomodule::GoModule;
use mutiny::report;
use mutiny::results::Results;
use mutiny::scanner::Scanner;
use mutiny::scheduler::Scheduler;
use mutiny::toolchain::GoToolchain;
use mutiny::workdir::Dealer;
use mutiny::CancelToken;

const EXIT_OK: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_GATE_VIOLATION: i32 = 10;

#[derive(Parser)]
#[command(name = "mutiny", version, about = "Mutation testing for Go modules")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unleash the mutants: run mutation testing on a Go module
    ///
    /// Coverage is gathered first and only covered mutants are executed,
    /// since no test can catch the others. In dry-run mode the source is
    /// analysed but no test runs. Thresholds are quality gates: efficacy is
    /// the percent of KILLED mutants over KILLED plus LIVED, and mutant
    /// coverage the percent of KILLED plus LIVED over the total; a violated
    /// gate makes the run exit with a distinct code.
    #[command(visible_aliases = ["run", "r"])]
    Unleash {
        /// Path to the Go module (default: current directory)
        path: Option<PathBuf>,
        /// Find mutations but do not execute tests
        #[arg(short = 'd', long, alias = "dry_run")]
        dry_run: bool,
        /// A comma-separated list of build tags
        #[arg(short = 't', long, default_value = "")]
        tags: String,
        /// Output file for the machine-readable report
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
        /// Threshold for the test-efficacy percent (0 disables the gate)
        #[arg(long, alias = "threshold_efficacy", default_value_t = 0.0)]
        threshold_efficacy: f64,
        /// Threshold for the mutant-coverage percent (0 disables the gate)
        #[arg(long, alias = "threshold_mcover", default_value_t = 0.0)]
        threshold_mcover: f64,
        /// Multiplier on the coverage time that sets the per-mutant timeout
        #[arg(long, alias = "timeout_coefficient", default_value_t = 3)]
        timeout_coefficient: u32,
        /// Number of parallel workers (0 = one per CPU)
        #[arg(long, default_value_t = 0)]
        workers: usize,
        /// Enable CONDITIONALS_BOUNDARY mutants
        #[arg(long, alias = "conditionals_boundary", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
        conditionals_boundary: Option<bool>,
        /// Enable CONDITIONALS_NEGATION mutants
        #[arg(long, alias = "conditionals_negation", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
        conditionals_negation: Option<bool>,
        /// Enable INCREMENT_DECREMENT mutants
        #[arg(long, alias = "increment_decrement", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
        increment_decrement: Option<bool>,
        /// Enable INVERT_NEGATIVES mutants
        #[arg(long, alias = "invert_negatives", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
        invert_negatives: Option<bool>,
        /// Enable ARITHMETIC_BASE mutants
        #[arg(long, alias = "arithmetic_base", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
        arithmetic_base: Option<bool>,
    },
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Unleash {
            path,
            dry_run,
            tags,
            output,
            threshold_efficacy,
            threshold_mcover,
            timeout_coefficient,
            workers,
            conditionals_boundary,
            conditionals_negation,
            increment_decrement,
            invert_negatives,
            arithmetic_base,
        } => {
            let mut config = Config {
                dry_run,
                tags,
                output,
                threshold_efficacy,
                threshold_mcover,
                timeout_coefficient,
                workers,
                ..Config::default()
            };
            let kind_flags = [
                (MutantKind::ConditionalsBoundary, conditionals_boundary),
                (MutantKind::ConditionalsNegation, conditionals_negation),
                (MutantKind::IncrementDecrement, increment_decrement),
                (MutantKind::InvertNegatives, invert_negatives),
                (MutantKind::ArithmeticBase, arithmetic_base),
            ];
            for (kind, flag) in kind_flags {
                if let Some(enabled) = flag {
                    config.set_kind_enabled(kind, enabled);
                }
            }
            cmd_unleash(path.unwrap_or_else(|| PathBuf::from(".")), config)
        }
    };

    process::exit(exit_code);
}

fn cmd_unleash(path: PathBuf, config: Config) -> i32 {
    let module = match GoModule::init(&path) {
        Ok(module) => module,
        Err(e) => {
            report::print_error(&e.to_string());
            return EXIT_ERROR;
        }
    };

    // The work root hosts the coverage report and every sandbox; the guard
    // removes it on all exit paths, panics included.
    let work_root = match tempfile::Builder::new().prefix("mutiny-").tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            report::print_error(&format!("cannot create the work directory: {e}"));
            return EXIT_ERROR;
        }
    };

    let toolchain = GoToolchain;

    report::print_note("Gathering coverage...");
    let coverage = Coverage::new(&toolchain, work_root.path(), &module, &config.tags);
    let coverage_run = match coverage.run() {
        Ok(run) => run,
        Err(e) => {
            report::print_error(&e.to_string());
            return EXIT_ERROR;
        }
    };
    report::print_note(&format!(
        "done in {:.1}s",
        coverage_run.elapsed.as_secs_f64()
    ));

    let results = if config.dry_run {
        let scanner = Scanner::new(&module, &coverage_run.profile, &config.enabled_kinds);
        match scanner.scan() {
            Ok(mutants) => Results::new(mutants, coverage_run.elapsed, Duration::ZERO, false),
            Err(e) => {
                report::print_error(&e.to_string());
                return EXIT_ERROR;
            }
        }
    } else {
        let dealer = Dealer::new(work_root.path(), &module.root);
        let cancel = CancelToken::new();
        let scheduler = Scheduler::new(&module, &coverage_run.profile, &toolchain, &config);
        match scheduler.run(&dealer, coverage_run.elapsed, &cancel) {
            Ok(results) => results,
            Err(e) => {
                report::print_error(&e.to_string());
                return EXIT_ERROR;
            }
        }
    };

    report::print_results(&results, &module);

    if let Some(out) = &config.output {
        if let Err(e) = report::write_json(&results, &module, out) {
            report::print_error(&format!("cannot write {}: {e}", out.display()));
            return EXIT_ERROR;
        }
    }

    // A cancelled run reports partial results and skips the gate.
    if results.cancelled {
        return EXIT_OK;
    }

    let thresholds = config.thresholds();
    let violations = gate::check(&results, &thresholds);
    report::print_gate(&violations, &thresholds, &results);
    if violations.is_empty() {
        EXIT_OK
    } else {
        EXIT_GATE_VIOLATION
    }
}
