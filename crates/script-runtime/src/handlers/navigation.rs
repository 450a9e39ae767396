//! Navigation, window geometry, frames and tabs

use soulscript_core_types::{Action, FrameTarget, Navigation, WindowOp};
use tracing::{info, warn};

use super::{arity, element, parse_number, HandlerResult};
use crate::context::ExecutionContext;
use crate::fault::Fault;

pub(crate) async fn goto(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [url] = args else {
        return Err(arity("goto", args));
    };
    ctx.automation()
        .navigate(Navigation::Goto(url.clone()))
        .await?;
    Ok(())
}

pub(crate) async fn history(ctx: &mut ExecutionContext, navigation: Navigation) -> HandlerResult {
    ctx.automation().navigate(navigation).await?;
    Ok(())
}

/// Maximize/minimize are best effort: window managers and headless
/// sessions may refuse them.
pub(crate) async fn window_state(ctx: &mut ExecutionContext, op: WindowOp) -> HandlerResult {
    if let Err(err) = ctx.automation().perform(Action::Window(op)).await {
        warn!(?op, error = %err, "window state change refused");
    }
    Ok(())
}

pub(crate) async fn set_window(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [width, height] = args else {
        return Err(arity("set_window", args));
    };
    let width = parse_number(width, "width")?;
    let height = parse_number(height, "height")?;
    ctx.automation()
        .perform(Action::Window(WindowOp::Resize { width, height }))
        .await?;
    Ok(())
}

pub(crate) async fn frame(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [strategy, selector] = args else {
        return Err(arity("frame", args));
    };
    let target = element(ctx, strategy, selector).await?;
    ctx.automation()
        .switch_frame(FrameTarget::Element(target))
        .await?;
    Ok(())
}

pub(crate) async fn frame_index(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [index] = args else {
        return Err(arity("frame_index", args));
    };
    let index = parse_number(index, "frame index")?;
    ctx.automation()
        .switch_frame(FrameTarget::Index(index))
        .await?;
    Ok(())
}

pub(crate) async fn switch_frame(ctx: &mut ExecutionContext, target: FrameTarget) -> HandlerResult {
    ctx.automation().switch_frame(target).await?;
    Ok(())
}

pub(crate) async fn window_latest(ctx: &mut ExecutionContext) -> HandlerResult {
    let automation = ctx.automation();
    let windows = automation.windows().await?;
    let latest = windows
        .last()
        .ok_or_else(|| Fault::InvalidArgument("no open windows".to_string()))?;
    automation.switch_window(latest).await?;
    info!(window = %latest, "switched to latest window");
    Ok(())
}

pub(crate) async fn window_index(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [raw] = args else {
        return Err(arity("window_index", args));
    };
    let index: i64 = parse_number(raw, "window index")?;
    let automation = ctx.automation();
    let windows = automation.windows().await?;
    let handle = usize::try_from(index)
        .ok()
        .and_then(|index| windows.get(index))
        .ok_or_else(|| {
            Fault::InvalidArgument(format!(
                "window index {index} out of range ({} open)",
                windows.len()
            ))
        })?;
    automation.switch_window(handle).await?;
    Ok(())
}

pub(crate) async fn window_close(ctx: &mut ExecutionContext) -> HandlerResult {
    ctx.automation().close_window().await?;
    Ok(())
}
