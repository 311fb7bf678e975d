/// Mutation catalog: the single source of truth for which mutations exist,
/// which tokens they apply to, and what each token rewrites to. Adding a new
/// mutant kind touches only this module (plus a scanner hook if it applies
/// to a node shape the scanner does not visit yet).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutantKind {
    ConditionalsBoundary,
    ConditionalsNegation,
    IncrementDecrement,
    InvertNegatives,
    ArithmeticBase,
}

pub const ALL_KINDS: [MutantKind; 5] = [
    MutantKind::ConditionalsBoundary,
    MutantKind::ConditionalsNegation,
    MutantKind::IncrementDecrement,
    MutantKind::InvertNegatives,
    MutantKind::ArithmeticBase,
];

impl MutantKind {
    /// Stable identifier used in reports and as configuration key.
    pub fn id(&self) -> &'static str {
        match self {
            MutantKind::ConditionalsBoundary => "CONDITIONALS_BOUNDARY",
            MutantKind::ConditionalsNegation => "CONDITIONALS_NEGATION",
            MutantKind::IncrementDecrement => "INCREMENT_DECREMENT",
            MutantKind::InvertNegatives => "INVERT_NEGATIVES",
            MutantKind::ArithmeticBase => "ARITHMETIC_BASE",
        }
    }

    pub fn is_default_enabled(&self) -> bool {
        match self {
            MutantKind::ConditionalsBoundary
            | MutantKind::ConditionalsNegation
            | MutantKind::IncrementDecrement
            | MutantKind::InvertNegatives
            | MutantKind::ArithmeticBase => true,
        }
    }
}

impl std::fmt::Display for MutantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

pub struct Rewrite {
    pub kind: MutantKind,
    pub replacement: &'static str,
}

fn rw(kind: MutantKind, replacement: &'static str) -> Rewrite {
    Rewrite { kind, replacement }
}

/// Rewrites applicable to the operator token of a binary expression.
/// A single token can yield one mutant per (kind, replacement) pair, e.g.
/// `>` produces both a boundary mutant (`>=`) and a negation mutant (`<=`).
pub fn binary_rewrites(op: &str) -> Vec<Rewrite> {
    use MutantKind::*;
    match op {
        ">" => vec![rw(ConditionalsBoundary, ">="), rw(ConditionalsNegation, "<=")],
        ">=" => vec![rw(ConditionalsBoundary, ">"), rw(ConditionalsNegation, "<")],
        "<" => vec![rw(ConditionalsBoundary, "<="), rw(ConditionalsNegation, ">=")],
        "<=" => vec![rw(ConditionalsBoundary, "<"), rw(ConditionalsNegation, ">")],
        "==" => vec![rw(ConditionalsNegation, "!=")],
        "!=" => vec![rw(ConditionalsNegation, "==")],
        // Each arithmetic token rewrites to exactly one replacement.
        "+" => vec![rw(ArithmeticBase, "-")],
        "-" => vec![rw(ArithmeticBase, "+")],
        "*" => vec![rw(ArithmeticBase, "/")],
        "/" => vec![rw(ArithmeticBase, "*")],
        "%" => vec![rw(ArithmeticBase, "*")],
        _ => vec![],
    }
}

/// Rewrites for the `++`/`--` token of an increment or decrement statement.
pub fn inc_dec_rewrites(op: &str) -> Vec<Rewrite> {
    match op {
        "++" => vec![rw(MutantKind::IncrementDecrement, "--")],
        "--" => vec![rw(MutantKind::IncrementDecrement, "++")],
        _ => vec![],
    }
}

/// Rewrites for the operator token of a unary expression. Only the unary
/// minus applies: removing it turns `-x` into `x`. The binary minus never
/// reaches here; the scanner classifies by node shape, not by spelling.
pub fn unary_rewrites(op: &str) -> Vec<Rewrite> {
    match op {
        "-" => vec![rw(MutantKind::InvertNegatives, "")],
        _ => vec![],
    }
}
