//! Scrolling, screenshots and raw script execution

use soulscript_core_types::{Action, ScrollBlock, ScrollEdge};
use tracing::{debug, info};

use super::{arity, element, ensure_parent, expand_home, parse_number, HandlerResult};
use crate::context::ExecutionContext;
use crate::fault::Fault;

pub(crate) async fn scroll_into_view(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [strategy, selector, rest @ ..] = args else {
        return Err(arity("scroll_into_view", args));
    };
    let block = match rest.first() {
        Some(raw) => ScrollBlock::parse(raw).ok_or_else(|| {
            Fault::InvalidArgument(format!(
                "scroll block must be start, center, end or nearest, got `{raw}`"
            ))
        })?,
        None => ScrollBlock::Center,
    };
    let target = element(ctx, strategy, selector).await?;
    ctx.automation()
        .perform(Action::ScrollIntoView { target, block })
        .await?;
    Ok(())
}

pub(crate) async fn scroll_by(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [dx, dy] = args else {
        return Err(arity("scroll_by", args));
    };
    let dx = parse_number(dx, "x offset")?;
    let dy = parse_number(dy, "y offset")?;
    ctx.automation().perform(Action::ScrollBy { dx, dy }).await?;
    Ok(())
}

pub(crate) async fn scroll_to(ctx: &mut ExecutionContext, edge: ScrollEdge) -> HandlerResult {
    ctx.automation().perform(Action::ScrollTo(edge)).await?;
    Ok(())
}

pub(crate) async fn screenshot(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [raw_path] = args else {
        return Err(arity("screenshot", args));
    };
    let path = expand_home(raw_path);
    ensure_parent(&path)?;
    ctx.automation().capture_screenshot(None, &path).await?;
    info!(path = %path.display(), "screenshot saved");
    Ok(())
}

pub(crate) async fn screenshot_element(
    ctx: &mut ExecutionContext,
    args: &[String],
) -> HandlerResult {
    let [strategy, selector, raw_path] = args else {
        return Err(arity("screenshot_element", args));
    };
    let path = expand_home(raw_path);
    ensure_parent(&path)?;
    let target = element(ctx, strategy, selector).await?;
    ctx.automation()
        .capture_screenshot(Some(&target), &path)
        .await?;
    info!(path = %path.display(), element = %target, "element screenshot saved");
    Ok(())
}

pub(crate) async fn exec_js(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [source] = args else {
        return Err(arity("exec_js", args));
    };
    let value = ctx.automation().run_script(source).await?;
    debug!(result = %value, "script evaluated");
    Ok(())
}
