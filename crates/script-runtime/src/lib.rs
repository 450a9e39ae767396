//! SoulScript interpreter
//!
//! Each script line flows through the same pipeline:
//! lexer → variable substitution → alias resolution → registry lookup →
//! argument normalization → dispatch. Faults are pinned to their line and
//! classified into continue-or-abort by the run's [`ErrorPolicy`].

pub mod alias;
pub mod context;
pub mod dispatch;
pub mod fault;
mod handlers;
pub mod keys;
pub mod lexer;
pub mod normalize;
pub mod operator;
pub mod registry;
pub mod runner;
pub mod vars;

pub use alias::{aliases_for, canonical_name};
pub use context::{ExecutionContext, DEFAULT_TIMEOUT};
pub use dispatch::dispatch;
pub use fault::{classify, ErrorPolicy, Fault, LineFault, Verdict};
pub use lexer::{tokenize, LineKind};
pub use normalize::normalize;
pub use operator::OperatorInput;
pub use registry::{commands, lookup, CommandSpec, Handler};
pub use runner::{check_file, check_source, RunReport, RunState, ScriptRunner};
pub use vars::{substitute, VariableStore, MAX_SUBSTITUTION_PASSES};
