//! Assertions and everything that writes to the output sink

use soulscript_core_types::Query;

use super::{arity, element, HandlerResult};
use crate::context::ExecutionContext;
use crate::fault::Fault;

pub(crate) async fn assert_text(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [strategy, selector, expected] = args else {
        return Err(arity("assert_text", args));
    };
    let target = element(ctx, strategy, selector).await?;
    let actual = ctx
        .automation()
        .read(Query::Text(target))
        .await?
        .unwrap_or_default();
    if actual.contains(expected.as_str()) {
        Ok(())
    } else {
        Err(Fault::AssertionFailed(format!(
            "element text does not contain `{expected}` (was `{actual}`)"
        )))
    }
}

pub(crate) async fn assert_url_contains(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [fragment] = args else {
        return Err(arity("assert_url_contains", args));
    };
    let url = ctx.automation().read(Query::Url).await?.unwrap_or_default();
    if url.contains(fragment.as_str()) {
        Ok(())
    } else {
        Err(Fault::AssertionFailed(format!(
            "url `{url}` does not contain `{fragment}`"
        )))
    }
}

pub(crate) async fn assert_title_contains(
    ctx: &mut ExecutionContext,
    args: &[String],
) -> HandlerResult {
    let [fragment] = args else {
        return Err(arity("assert_title_contains", args));
    };
    let title = ctx.automation().read(Query::Title).await?.unwrap_or_default();
    if title.contains(fragment.as_str()) {
        Ok(())
    } else {
        Err(Fault::AssertionFailed(format!(
            "title `{title}` does not contain `{fragment}`"
        )))
    }
}

pub(crate) async fn print_text(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [strategy, selector] = args else {
        return Err(arity("print_text", args));
    };
    let target = element(ctx, strategy, selector).await?;
    let text = ctx.automation().read(Query::Text(target)).await?;
    ctx.emit(text.as_deref().unwrap_or_default())
}

pub(crate) async fn print_attr(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [strategy, selector, name] = args else {
        return Err(arity("print_attr", args));
    };
    let target = element(ctx, strategy, selector).await?;
    let value = ctx
        .automation()
        .read(Query::Attribute {
            target,
            name: name.clone(),
        })
        .await?;
    ctx.emit(value.as_deref().unwrap_or_default())
}

pub(crate) fn echo(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    ctx.emit(&args.join(" "))
}
