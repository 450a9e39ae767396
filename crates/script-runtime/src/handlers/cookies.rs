use soulscript_core_types::Cookie;
use tracing::debug;

use super::{arity, HandlerResult};
use crate::context::ExecutionContext;
use crate::fault::Fault;

pub(crate) async fn set(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [name, value] = args else {
        return Err(arity("cookie_set", args));
    };
    ctx.automation()
        .set_cookie(Cookie::new(name.as_str(), value.as_str()))
        .await?;
    Ok(())
}

/// Parse `name:value;name:value`, trimming whitespace around each part.
pub(crate) fn parse_cookie_list(raw: &str) -> Result<Vec<Cookie>, Fault> {
    raw.split(';')
        .map(|entry| {
            let parts: Vec<&str> = entry.split(':').collect();
            match parts.as_slice() {
                [name, value] => Ok(Cookie::new(name.trim(), value.trim())),
                _ => Err(Fault::InvalidArgument(format!(
                    "cookie entry must be name:value, got `{entry}`"
                ))),
            }
        })
        .collect()
}

/// All entries are validated before the first cookie is set.
pub(crate) async fn set_many(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [raw] = args else {
        return Err(arity("cookies_set", args));
    };
    let cookies = parse_cookie_list(raw)?;
    debug!(count = cookies.len(), "setting cookies");
    for cookie in cookies {
        ctx.automation().set_cookie(cookie).await?;
    }
    Ok(())
}

pub(crate) async fn get(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [name] = args else {
        return Err(arity("cookie_get", args));
    };
    let line = match ctx.automation().get_cookie(name).await? {
        Some(cookie) => serde_json::to_string(&cookie)
            .map_err(|err| Fault::Io(format!("cannot encode cookie: {err}")))?,
        None => String::new(),
    };
    ctx.emit(&line)
}

pub(crate) async fn delete(ctx: &mut ExecutionContext, args: &[String]) -> HandlerResult {
    let [name] = args else {
        return Err(arity("cookie_delete", args));
    };
    ctx.automation().delete_cookie(name).await?;
    Ok(())
}

pub(crate) async fn clear(ctx: &mut ExecutionContext) -> HandlerResult {
    ctx.automation().clear_cookies().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_trimmed() {
        let cookies = parse_cookie_list(" a : 1 ;b:2").unwrap();
        assert_eq!(cookies, vec![Cookie::new("a", "1"), Cookie::new("b", "2")]);
    }

    #[test]
    fn entries_need_exactly_one_colon() {
        assert!(parse_cookie_list("a:1;b").is_err());
        assert!(parse_cookie_list("a:1:2").is_err());
        assert!(parse_cookie_list("a:1;").is_err());
    }
}
