use std::path::PathBuf;

use crate::catalog::MutantKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutantStatus {
    NotCovered,
    Runnable,
    Lived,
    Killed,
    NotViable,
    TimedOut,
}

impl MutantStatus {
    pub fn name(&self) -> &'static str {
        match self {
            MutantStatus::NotCovered => "NOT COVERED",
            MutantStatus::Runnable => "RUNNABLE",
            MutantStatus::Lived => "LIVED",
            MutantStatus::Killed => "KILLED",
            MutantStatus::NotViable => "NOT VIABLE",
            MutantStatus::TimedOut => "TIMED OUT",
        }
    }

    /// Stable token for machine-readable reports.
    pub fn id(&self) -> &'static str {
        match self {
            MutantStatus::NotCovered => "NOT_COVERED",
            MutantStatus::Runnable => "RUNNABLE",
            MutantStatus::Lived => "LIVED",
            MutantStatus::Killed => "KILLED",
            MutantStatus::NotViable => "NOT_VIABLE",
            MutantStatus::TimedOut => "TIMED_OUT",
        }
    }
}

impl std::fmt::Display for MutantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One localized syntactic alteration of the source. The byte range covers
/// exactly the token to replace; positions are 1-based and refer to the
/// token start, matching coverage-profile coordinates.
#[derive(Debug, Clone)]
pub struct Mutant {
    pub kind: MutantKind,
    /// Source file path, relative to the package dir.
    pub path: PathBuf,
    pub line: usize,
    pub column: usize,
    pub start_byte: usize,
    pub end_byte: usize,
    pub original: String,
    pub replacement: String,
    /// Attached by the executor when a toolchain invocation itself failed.
    pub note: Option<String>,
    status: MutantStatus,
}

impl Mutant {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: MutantKind,
        path: PathBuf,
        line: usize,
        column: usize,
        start_byte: usize,
        end_byte: usize,
        original: String,
        replacement: String,
        status: MutantStatus,
    ) -> Self {
        Mutant {
            kind,
            path,
            line,
            column,
            start_byte,
            end_byte,
            original,
            replacement,
            note: None,
            status,
        }
    }

    pub fn status(&self) -> MutantStatus {
        self.status
    }

    /// Status transitions are monotonic: only a `Runnable` mutant can move,
    /// and only to a terminal state. Anything else is a no-op.
    pub fn transition(&mut self, to: MutantStatus) {
        if self.status == MutantStatus::Runnable && to != MutantStatus::Runnable {
            self.status = to;
        }
    }
}
