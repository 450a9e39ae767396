//! Text entry: typing, key sequences and scripted content replacement

use soulscript_core_types::{Action, ContentMode};

use super::{arity, element, HandlerResult};
use crate::context::ExecutionContext;
use crate::keys::parse_key_sequence;

/// Click the element, then type the remaining tokens joined by spaces.
pub(crate) async fn write(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [strategy, selector, words @ ..] = args else {
        return Err(arity("write", args));
    };
    let target = element(ctx, strategy, selector).await?;
    let automation = ctx.automation();
    automation.perform(Action::Click(target.clone())).await?;
    automation
        .perform(Action::TypeText {
            target,
            text: words.join(" "),
        })
        .await?;
    Ok(())
}

/// Click the element, then send the parsed key sequence.
pub(crate) async fn send_keys(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [strategy, selector, tokens @ ..] = args else {
        return Err(arity("send_keys", args));
    };
    // keys are validated before the element is touched
    let keys = parse_key_sequence(tokens)?;
    let target = element(ctx, strategy, selector).await?;
    let automation = ctx.automation();
    automation.perform(Action::Click(target.clone())).await?;
    automation
        .perform(Action::SendKeys {
            target: Some(target),
            keys,
        })
        .await?;
    Ok(())
}

/// Send keys to whatever currently has focus.
pub(crate) async fn press(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let keys = parse_key_sequence(args)?;
    ctx.automation()
        .perform(Action::SendKeys { target: None, keys })
        .await?;
    Ok(())
}

pub(crate) async fn set_content(
    ctx: &mut ExecutionContext,
    mode: ContentMode,
    args: &[String],
) -> HandlerResult {
    let [strategy, selector, text] = args else {
        return Err(arity("write_ce/write_js", args));
    };
    let target = element(ctx, strategy, selector).await?;
    ctx.automation()
        .perform(Action::SetContent {
            target,
            text: text.clone(),
            mode,
        })
        .await?;
    Ok(())
}
