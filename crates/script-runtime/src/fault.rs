//! Fault taxonomy and the continue-or-abort policy

use action_primitives::AutomationError;
use thiserror::Error;

/// Everything that can go wrong while interpreting one script line
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Fault {
    #[error("cannot parse line: {reason}")]
    Parse { reason: String, text: String },

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("`{command}` expects at least {min} argument(s), got {got}")]
    InsufficientArguments {
        command: String,
        min: usize,
        got: usize,
    },

    #[error("`{command}` expects at most {max} argument(s), got {got}")]
    TooManyArguments {
        command: String,
        max: usize,
        got: usize,
    },

    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),

    #[error("variable substitution does not settle for `{0}`")]
    SubstitutionLoop(String),

    #[error("unknown selector strategy `{0}`")]
    UnknownSelectorStrategy(String),

    #[error("unknown key symbol `{0}`")]
    UnknownKeySymbol(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    /// Local file or output stream failure
    #[error("io error: {0}")]
    Io(String),

    #[error(transparent)]
    Automation(#[from] AutomationError),
}

impl Fault {
    /// Faults that abort the run regardless of the error policy
    pub fn is_fatal_always(&self) -> bool {
        matches!(
            self,
            Fault::Parse { .. } | Fault::UndefinedVariable(_) | Fault::SubstitutionLoop(_)
        )
    }

    /// Stable label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Fault::Parse { .. } => "parse",
            Fault::UnknownCommand(_) => "unknown_command",
            Fault::InsufficientArguments { .. } => "insufficient_arguments",
            Fault::TooManyArguments { .. } => "too_many_arguments",
            Fault::UndefinedVariable(_) => "undefined_variable",
            Fault::SubstitutionLoop(_) => "substitution_loop",
            Fault::UnknownSelectorStrategy(_) => "unknown_selector_strategy",
            Fault::UnknownKeySymbol(_) => "unknown_key_symbol",
            Fault::InvalidArgument(_) => "invalid_argument",
            Fault::AssertionFailed(_) => "assertion_failed",
            Fault::Io(_) => "io",
            Fault::Automation(err) => err.code(),
        }
    }
}

/// Chosen once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    #[default]
    Strict,
    IgnoreErrors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Abort,
}

pub fn classify(fault: &Fault, policy: ErrorPolicy) -> Verdict {
    if fault.is_fatal_always() {
        return Verdict::Abort;
    }
    match policy {
        ErrorPolicy::Strict => Verdict::Abort,
        ErrorPolicy::IgnoreErrors => Verdict::Continue,
    }
}

/// A fault pinned to the script line that produced it
#[derive(Debug, Error, Clone, PartialEq)]
#[error("line {line}: {fault} -> {text}")]
pub struct LineFault {
    pub line: usize,
    pub text: String,
    #[source]
    pub fault: Fault,
}

impl LineFault {
    pub fn new(line: usize, text: impl Into<String>, fault: Fault) -> Self {
        Self {
            line,
            text: text.into(),
            fault,
        }
    }
}
