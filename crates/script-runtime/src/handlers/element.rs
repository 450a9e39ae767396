use soulscript_core_types::{Action, ElementRef, SelectBy};
use tracing::debug;

use super::{arity, element, expand_home, parse_number, HandlerResult};
use crate::context::ExecutionContext;
use crate::fault::Fault;

/// Pointer and form actions that take exactly one element
#[derive(Debug, Clone, Copy)]
pub(crate) enum ElementAction {
    Click,
    ContextClick,
    DoubleClick,
    Hover,
    ScriptClick,
    Clear,
}

impl ElementAction {
    fn build(self, target: ElementRef) -> Action {
        match self {
            ElementAction::Click => Action::Click(target),
            ElementAction::ContextClick => Action::ContextClick(target),
            ElementAction::DoubleClick => Action::DoubleClick(target),
            ElementAction::Hover => Action::Hover(target),
            ElementAction::ScriptClick => Action::ScriptClick(target),
            ElementAction::Clear => Action::Clear(target),
        }
    }
}

pub(crate) async fn single(
    ctx: &mut ExecutionContext,
    kind: ElementAction,
    args: &[String],
) -> HandlerResult {
    let [strategy, selector] = args else {
        return Err(arity("element action", args));
    };
    let target = element(ctx, strategy, selector).await?;
    ctx.automation().perform(kind.build(target)).await?;
    Ok(())
}

pub(crate) async fn drag_drop(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [src_strategy, src_selector, dst_strategy, dst_selector] = args else {
        return Err(arity("drag_drop", args));
    };
    let source = element(ctx, src_strategy, src_selector).await?;
    let target = element(ctx, dst_strategy, dst_selector).await?;
    ctx.automation()
        .perform(Action::DragAndDrop { source, target })
        .await?;
    Ok(())
}

pub(crate) async fn drag_offset(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [strategy, selector, dx, dy] = args else {
        return Err(arity("drag_offset", args));
    };
    let dx = parse_number(dx, "x offset")?;
    let dy = parse_number(dy, "y offset")?;
    let target = element(ctx, strategy, selector).await?;
    ctx.automation()
        .perform(Action::DragBy { target, dx, dy })
        .await?;
    Ok(())
}

pub(crate) async fn select(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [strategy, selector, mode, value] = args else {
        return Err(arity("select", args));
    };
    let by = match mode.to_ascii_lowercase().as_str() {
        "text" => SelectBy::Text(value.clone()),
        "value" => SelectBy::Value(value.clone()),
        "index" => SelectBy::Index(parse_number(value, "option index")?),
        other => {
            return Err(Fault::InvalidArgument(format!(
                "select mode must be text, value or index, got `{other}`"
            )))
        }
    };
    let target = element(ctx, strategy, selector).await?;
    ctx.automation().perform(Action::Select { target, by }).await?;
    Ok(())
}

pub(crate) async fn upload(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [strategy, selector, raw_path] = args else {
        return Err(arity("upload", args));
    };
    let path = std::fs::canonicalize(expand_home(raw_path))
        .map_err(|_| Fault::InvalidArgument(format!("file not found: {raw_path}")))?;
    debug!(path = %path.display(), "resolved upload path");
    let target = element(ctx, strategy, selector).await?;
    ctx.automation()
        .perform(Action::Upload { target, path })
        .await?;
    Ok(())
}
