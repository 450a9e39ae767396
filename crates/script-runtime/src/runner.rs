//! Line-by-line execution and static checking of scripts

use std::path::Path;

use tracing::{debug, error, info, instrument, warn};

use crate::alias::canonical_name;
use crate::context::ExecutionContext;
use crate::dispatch::dispatch;
use crate::fault::{classify, Fault, LineFault, Verdict};
use crate::lexer::{tokenize, LineKind};
use crate::normalize::normalize;
use crate::registry::{lookup, CommandSpec, Handler};
use crate::vars::{substitute, VariableStore};

#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    Running,
    Completed,
    Aborted(LineFault),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunState::Running)
    }
}

/// What a finished run looked like
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub state: RunState,
    /// Lines that reached the pipeline (blank and comment lines excluded)
    pub executed: usize,
    /// Lines whose handler ran to completion
    pub dispatched: usize,
    /// Faults logged and passed over under the ignore-error policy
    pub skipped: Vec<LineFault>,
    pub keep_open: bool,
}

impl RunReport {
    pub fn completed(&self) -> bool {
        self.state == RunState::Completed
    }

    pub fn fault(&self) -> Option<&LineFault> {
        match &self.state {
            RunState::Aborted(fault) => Some(fault),
            _ => None,
        }
    }
}

/// A command line after substitution, alias resolution and normalization
struct Prepared {
    spec: &'static CommandSpec,
    args: Vec<String>,
}

/// Substitute every token, resolve the command and normalize its arguments.
/// `Ok(None)` marks a blank or comment line.
fn prepare(raw: &str, vars: &VariableStore) -> Result<Option<Prepared>, Fault> {
    let tokens = match tokenize(raw)? {
        LineKind::Blank | LineKind::Comment => return Ok(None),
        LineKind::Tokens(tokens) => tokens,
    };
    let mut tokens = tokens
        .iter()
        .map(|token| substitute(token, vars))
        .collect::<Result<Vec<_>, _>>()?;
    if tokens.is_empty() {
        return Ok(None);
    }
    let command = canonical_name(&tokens.remove(0));
    let spec = lookup(&command).ok_or(Fault::UnknownCommand(command))?;
    let args = normalize(spec, tokens)?;
    Ok(Some(Prepared { spec, args }))
}

/// Drives one script through the pipeline against a single context.
pub struct ScriptRunner {
    ctx: ExecutionContext,
    state: RunState,
}

impl ScriptRunner {
    pub fn new(ctx: ExecutionContext) -> Self {
        Self {
            ctx,
            state: RunState::Running,
        }
    }

    /// Seed a variable verbatim; the value is not substituted.
    pub fn with_variable(mut self, name: &str, value: impl Into<String>) -> Result<Self, Fault> {
        self.ctx.vars_mut().set(name, value)?;
        Ok(self)
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub async fn run_file(self, path: &Path) -> Result<RunReport, Fault> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| Fault::Io(format!("cannot read {}: {err}", path.display())))?;
        Ok(self.run_source(&source).await)
    }

    /// Execute every line in order until the script ends or a fault aborts it.
    pub async fn run_source(mut self, source: &str) -> RunReport {
        let policy = self.ctx.policy();
        let mut executed = 0;
        let mut dispatched = 0;
        let mut skipped = Vec::new();

        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            match self.execute_line(line, raw).await {
                Ok(None) => continue,
                Ok(Some(_)) => {
                    executed += 1;
                    dispatched += 1;
                }
                Err(fault) => {
                    executed += 1;
                    let line_fault = LineFault::new(line, raw.trim(), fault);
                    match classify(&line_fault.fault, policy) {
                        Verdict::Continue => {
                            warn!(
                                line,
                                text = %line_fault.text,
                                fault = line_fault.fault.kind(),
                                "{}; continuing",
                                line_fault.fault
                            );
                            skipped.push(line_fault);
                        }
                        Verdict::Abort => {
                            error!(
                                line,
                                text = %line_fault.text,
                                fault = line_fault.fault.kind(),
                                "script aborted"
                            );
                            self.state = RunState::Aborted(line_fault);
                            break;
                        }
                    }
                }
            }
        }

        if !self.state.is_terminal() {
            self.state = RunState::Completed;
            info!(executed, dispatched, skipped = skipped.len(), "script completed");
        }

        RunReport {
            state: self.state,
            executed,
            dispatched,
            skipped,
            keep_open: self.ctx.keep_open(),
        }
    }

    #[instrument(skip_all, fields(line = line))]
    async fn execute_line(&mut self, line: usize, raw: &str) -> Result<Option<Handler>, Fault> {
        let Some(Prepared { spec, args }) = prepare(raw, self.ctx.vars())? else {
            return Ok(None);
        };
        debug!(line, command = spec.name, ?args, "dispatching");
        dispatch(spec.handler, &args, &mut self.ctx).await?;
        Ok(Some(spec.handler))
    }
}

/// Validate a script without touching a browser.
///
/// Every line is lexed, substituted, resolved and normalized. `set_var`
/// lines are applied to a scratch store so later placeholders resolve.
pub fn check_source(source: &str, seed: VariableStore) -> Vec<LineFault> {
    let mut vars = seed;
    let mut faults = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let outcome = prepare(raw, &vars).and_then(|prepared| match prepared {
            Some(Prepared { spec, args }) if spec.handler == Handler::SetVar => {
                match args.as_slice() {
                    [name, value] => vars.set(name, value.as_str()),
                    _ => Ok(()),
                }
            }
            _ => Ok(()),
        });
        if let Err(fault) = outcome {
            faults.push(LineFault::new(line, raw.trim(), fault));
        }
    }
    faults
}

pub fn check_file(path: &Path, seed: VariableStore) -> Result<Vec<LineFault>, Fault> {
    let source = std::fs::read_to_string(path)
        .map_err(|err| Fault::Io(format!("cannot read {}: {err}", path.display())))?;
    Ok(check_source(&source, seed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_comment_lines_prepare_to_nothing() {
        let vars = VariableStore::new();
        assert!(prepare("", &vars).unwrap().is_none());
        assert!(prepare("   # click ID go", &vars).unwrap().is_none());
    }

    #[test]
    fn aliases_resolve_before_lookup() {
        let vars = VariableStore::new();
        let prepared = prepare("L_click ID go", &vars).unwrap().unwrap();
        assert_eq!(prepared.spec.name, "click");
        assert_eq!(prepared.args, vec!["ID", "go"]);
    }

    #[test]
    fn command_token_is_substituted() {
        let mut vars = VariableStore::new();
        vars.set("verb", "CLICK").unwrap();
        let prepared = prepare("${verb} ID go", &vars).unwrap().unwrap();
        assert_eq!(prepared.spec.handler, Handler::Click);
    }

    #[test]
    fn check_tracks_set_var() {
        let source = "set_var base https://example.test\ngoto ${base}/login\necho ${missing}\nfly away";
        let faults = check_source(source, VariableStore::new());
        assert_eq!(faults.len(), 2);
        assert_eq!(faults[0].line, 3);
        assert_eq!(faults[0].fault, Fault::UndefinedVariable("missing".into()));
        assert_eq!(faults[1].fault, Fault::UnknownCommand("fly".into()));
    }

    #[test]
    fn check_reports_arity_and_quoting() {
        let faults = check_source("click ID\necho \"open", VariableStore::new());
        assert!(matches!(
            faults[0].fault,
            Fault::InsufficientArguments { min: 2, got: 1, .. }
        ));
        assert!(matches!(faults[1].fault, Fault::Parse { .. }));
    }
}
