//! The error-kind taxonomy for the core and an accumulator for validation
//! failures that are reported together rather than one at a time.
use std::fmt;

/// A coarse category of failure, attached to an [`anyhow::Error`] via
/// [`anyhow::Context`] so that callers (notably the CLI, which maps kinds to
/// exit codes) can tell categories apart without downcasting through a deep
/// error chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing files or malformed rows in tabular input.
    InputShape,
    /// An invariant from the data model was violated (bounds, cardinality,
    /// cross-entity).
    Validation,
    /// All rows for a required attribute were dropped by scenario
    /// filtering.
    ScenarioResolution,
    /// A dimension mismatch was found after unit parsing.
    Unit,
    /// A representative-period duration or profile-gap problem.
    Temporal,
    /// The solver returned an infeasible status.
    Infeasible,
    /// The solver crashed or returned an unsupported status.
    Solver,
    /// An invariant was violated while emitting the MILP; should not
    /// happen in a correctly built model.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InputShape => "InputShapeError",
            Self::Validation => "ValidationError",
            Self::ScenarioResolution => "ScenarioResolutionError",
            Self::Unit => "UnitError",
            Self::Temporal => "TemporalError",
            Self::Infeasible => "InfeasibleError",
            Self::Solver => "SolverError",
            Self::Internal => "InternalError",
        };
        write!(f, "{s}")
    }
}

impl ErrorKind {
    /// The process exit status associated with this error category, per the
    /// external-interfaces exit-code contract: 0 success, 2 validation, 3
    /// infeasible, 4 solver error.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Infeasible => 3,
            Self::Solver => 4,
            _ => 2,
        }
    }
}

/// Recover the process exit status for a top-level CLI failure (§6). Every
/// [`ErrorKind`] is attached to its `anyhow::Error` via `Display`
/// (`bail!("{kind}: ...")`, [`ValidationErrors::into_result`]'s `"{kind}
/// (...)"`), so the chain is scanned for the first link whose message
/// starts with a known kind's label rather than requiring a downcast;
/// anything unrecognised (a bare I/O error, say) is treated as the general
/// "validation error" category §6 describes as the non-solver default.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    const KINDS: [ErrorKind; 8] = [
        ErrorKind::Infeasible,
        ErrorKind::Solver,
        ErrorKind::InputShape,
        ErrorKind::Validation,
        ErrorKind::ScenarioResolution,
        ErrorKind::Unit,
        ErrorKind::Temporal,
        ErrorKind::Internal,
    ];
    for cause in err.chain() {
        let msg = cause.to_string();
        for kind in KINDS {
            if msg.starts_with(&kind.to_string()) {
                return kind.exit_code();
            }
        }
    }
    ErrorKind::Validation.exit_code()
}

/// Accumulates failures for a single validation phase so that all of them
/// can be reported together rather than aborting on the first.
///
/// Mirrors the "collected per component then reported as a single
/// exception" policy: callers push one message per offending entity, then
/// call [`ValidationErrors::into_result`] once the phase is done.
#[derive(Debug, Default)]
pub struct ValidationErrors {
    kind: ErrorKind,
    messages: Vec<String>,
}

impl ValidationErrors {
    /// Create a new, empty accumulator for the given error kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            messages: Vec::new(),
        }
    }

    /// Record a failure against a named entity.
    pub fn push(&mut self, entity: impl fmt::Display, message: impl fmt::Display) {
        self.messages.push(format!("{entity}: {message}"));
    }

    /// True if no failures have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of failures recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Consume the accumulator, returning `Ok(())` if no failures were
    /// recorded or a single combined `anyhow::Error` listing all of them.
    pub fn into_result(self) -> anyhow::Result<()> {
        if self.messages.is_empty() {
            return Ok(());
        }
        let kind = self.kind;
        let body = self.messages.join("\n  - ");
        Err(anyhow::anyhow!("{kind} ({} failure(s)):\n  - {body}", self.messages.len()))
    }
}

impl Default for ErrorKind {
    fn default() -> Self {
        Self::Validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_accumulator_is_ok() {
        let errs = ValidationErrors::new(ErrorKind::Validation);
        assert!(errs.is_empty());
        assert!(errs.into_result().is_ok());
    }

    #[test]
    fn non_empty_accumulator_reports_all_failures() {
        let mut errs = ValidationErrors::new(ErrorKind::Validation);
        errs.push("plant.gas1", "must have at least one linked zone");
        errs.push("policy.rps", "missing contribution channel");
        assert_eq!(errs.len(), 2);
        let err = errs.into_result().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("plant.gas1"));
        assert!(msg.contains("policy.rps"));
    }

    #[test]
    fn exit_codes_match_interface_contract() {
        assert_eq!(ErrorKind::Validation.exit_code(), 2);
        assert_eq!(ErrorKind::Infeasible.exit_code(), 3);
        assert_eq!(ErrorKind::Solver.exit_code(), 4);
    }

    #[test]
    fn exit_code_for_recognises_kind_prefix_anywhere_in_chain() {
        let err = anyhow::anyhow!("{}: HiGHS returned Infeasible", ErrorKind::Infeasible)
            .context("solving the MILP");
        assert_eq!(exit_code_for(&err), 3);

        let err = anyhow::anyhow!("{}: HiGHS crashed", ErrorKind::Solver).context("solving the MILP");
        assert_eq!(exit_code_for(&err), 4);
    }

    #[test]
    fn exit_code_for_defaults_to_validation_for_unrecognised_errors() {
        let err = anyhow::anyhow!("could not read file").context("loading model");
        assert_eq!(exit_code_for(&err), 2);
    }
}
