use soulscript_core_types::WaitCondition;
use tracing::debug;

use super::{arity, locator, timeout, HandlerResult};
use crate::context::ExecutionContext;

/// Locator-based waits that only differ in the condition polled
#[derive(Debug, Clone, Copy)]
pub(crate) enum ElementWait {
    Present,
    Visible,
    Clickable,
    Invisible,
}

pub(crate) async fn element(
    ctx: &mut ExecutionContext,
    kind: ElementWait,
    args: &[String],
) -> HandlerResult {
    let [strategy, selector, rest @ ..] = args else {
        return Err(arity("wait", args));
    };
    let locator = locator(strategy, selector)?;
    let timeout = timeout(ctx, rest.first())?;
    let condition = match kind {
        ElementWait::Present => WaitCondition::Present(locator),
        ElementWait::Visible => WaitCondition::Visible(locator),
        ElementWait::Clickable => WaitCondition::Clickable(locator),
        ElementWait::Invisible => WaitCondition::Invisible(locator),
    };
    debug!(?condition, timeout_secs = timeout.as_secs(), "waiting");
    ctx.automation().wait_for(&condition, timeout).await?;
    Ok(())
}

pub(crate) async fn text(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [strategy, selector, text, rest @ ..] = args else {
        return Err(arity("wait_text", args));
    };
    let condition = WaitCondition::TextPresent {
        locator: locator(strategy, selector)?,
        text: text.clone(),
    };
    let timeout = timeout(ctx, rest.first())?;
    ctx.automation().wait_for(&condition, timeout).await?;
    Ok(())
}

pub(crate) async fn url_contains(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [fragment, rest @ ..] = args else {
        return Err(arity("wait_url_contains", args));
    };
    let timeout = timeout(ctx, rest.first())?;
    ctx.automation()
        .wait_for(&WaitCondition::UrlContains(fragment.clone()), timeout)
        .await?;
    Ok(())
}

pub(crate) async fn title_contains(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [fragment, rest @ ..] = args else {
        return Err(arity("wait_title_contains", args));
    };
    let timeout = timeout(ctx, rest.first())?;
    ctx.automation()
        .wait_for(&WaitCondition::TitleContains(fragment.clone()), timeout)
        .await?;
    Ok(())
}
