//! Commands that only touch the run itself

use std::time::Duration;

use tokio::io::AsyncBufReadExt;
use tracing::{debug, info};

use super::{arity, HandlerResult};
use crate::context::ExecutionContext;
use crate::fault::Fault;

pub(crate) fn parse_seconds(raw: &str) -> Result<Duration, Fault> {
    let seconds: f64 = raw
        .trim()
        .parse()
        .map_err(|_| Fault::InvalidArgument(format!("seconds must be a number, got `{raw}`")))?;
    Duration::try_from_secs_f64(seconds).map_err(|_| {
        Fault::InvalidArgument(format!("seconds must be finite and non-negative, got `{raw}`"))
    })
}

pub(crate) async fn sleep(args: &[String]) -> HandlerResult {
    let [raw] = args else {
        return Err(arity("sleep", args));
    };
    let duration = parse_seconds(raw)?;
    debug!(secs = duration.as_secs_f64(), "sleeping");
    tokio::time::sleep(duration).await;
    Ok(())
}

/// Block until the operator presses Enter; end of input also continues.
pub(crate) async fn pause(ctx: &mut ExecutionContext) -> HandlerResult {
    eprint!("Press Enter to continue ... ");
    let mut line = String::new();
    ctx.operator()
        .read_line(&mut line)
        .await
        .map_err(|err| Fault::Io(format!("cannot read operator input: {err}")))?;
    Ok(())
}

pub(crate) fn keep_open(ctx: &mut ExecutionContext) -> HandlerResult {
    ctx.request_keep_open();
    info!("browser will stay open after the script completes");
    Ok(())
}

pub(crate) fn set_var(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [name, value] = args else {
        return Err(arity("set_var", args));
    };
    ctx.vars_mut().set(name, value.as_str())?;
    debug!(name = %name, "variable set");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_seconds_are_allowed() {
        assert_eq!(parse_seconds("0.25").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_seconds("2").unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn negative_or_garbage_seconds_fault() {
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("soon").is_err());
        assert!(parse_seconds("inf").is_err());
    }
}
