//! Per-run execution state

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use action_primitives::Automation;
use tokio::io::{AsyncBufRead, BufReader};

use crate::fault::{ErrorPolicy, Fault};
use crate::operator::OperatorInput;
use crate::vars::VariableStore;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Everything a handler may touch while a script runs.
///
/// Exactly one per run, owned by the runner and lent to each handler in turn.
pub struct ExecutionContext {
    automation: Arc<dyn Automation>,
    default_timeout: Duration,
    policy: ErrorPolicy,
    keep_open: bool,
    vars: VariableStore,
    output: Box<dyn Write + Send>,
    operator: Box<dyn AsyncBufRead + Send + Unpin>,
}

impl ExecutionContext {
    /// Context writing to stdout and reading `pause` confirmations from stdin
    pub fn new(automation: Arc<dyn Automation>) -> Self {
        Self {
            automation,
            default_timeout: DEFAULT_TIMEOUT,
            policy: ErrorPolicy::default(),
            keep_open: false,
            vars: VariableStore::new(),
            output: Box::new(std::io::stdout()),
            operator: Box::new(BufReader::new(OperatorInput::stdin())),
        }
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_variables(mut self, vars: VariableStore) -> Self {
        self.vars = vars;
        self
    }

    /// Sink for `echo`, `print_*` and `cookie_get`
    pub fn with_output(mut self, output: Box<dyn Write + Send>) -> Self {
        self.output = output;
        self
    }

    /// Source of the Enter presses `pause` waits for
    pub fn with_operator_input(mut self, input: Box<dyn AsyncBufRead + Send + Unpin>) -> Self {
        self.operator = input;
        self
    }

    pub fn automation(&self) -> &dyn Automation {
        self.automation.as_ref()
    }

    pub fn automation_handle(&self) -> Arc<dyn Automation> {
        Arc::clone(&self.automation)
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn keep_open(&self) -> bool {
        self.keep_open
    }

    /// The flag only ever turns on
    pub fn request_keep_open(&mut self) {
        self.keep_open = true;
    }

    pub fn vars(&self) -> &VariableStore {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut VariableStore {
        &mut self.vars
    }

    pub(crate) fn operator(&mut self) -> &mut (dyn AsyncBufRead + Send + Unpin) {
        self.operator.as_mut()
    }

    /// Write one line to the output sink
    pub fn emit(&mut self, line: &str) -> Result<(), Fault> {
        writeln!(self.output, "{line}")
            .and_then(|_| self.output.flush())
            .map_err(|err| Fault::Io(format!("cannot write output: {err}")))
    }
}
