//! Page-side JavaScript used by the Chromium backend.
//!
//! Every snippet runs inside [`wrap`], which resolves the current frame path,
//! evaluates a body and reports `{ok, value}` or `{ok: false, kind, message}`
//! as a JSON string so results survive `returnByValue` untouched.

use serde::Deserialize;
use serde_json::Value;
use soulscript_core_types::{Locator, ScrollBlock, ScrollEdge, SelectBy, WaitCondition};

use crate::errors::{AutomationError, AutomationResult};

const PRELUDE: &str = r#"
const __sbx = (() => {
  const fail = (kind, message) => {
    const err = new Error(message);
    err.__sbx = true;
    err.kind = kind;
    throw err;
  };
  const byRef = (doc, id) => {
    const el = doc.querySelector('[data-sbx-ref="' + id + '"]');
    if (!el) fail('ElementNotFound', 'element ' + id + ' is no longer attached');
    return el;
  };
  const frameDoc = (path) => {
    let doc = document, ox = 0, oy = 0;
    for (const id of path) {
      const frame = doc.querySelector('[data-sbx-ref="' + id + '"]');
      if (!frame) fail('InvalidArgument', 'frame ' + id + ' is no longer attached');
      let inner = null;
      try { inner = frame.contentDocument; } catch (_) { inner = null; }
      if (!inner) fail('InvalidArgument', 'frame ' + id + ' is not accessible');
      const rect = frame.getBoundingClientRect();
      ox += rect.left + frame.clientLeft;
      oy += rect.top + frame.clientTop;
      doc = inner;
    }
    return { doc, ox, oy };
  };
  const find = (doc, strategy, selector) => {
    try {
      switch (strategy) {
        case 'XPATH': {
          const node = doc.evaluate(selector, doc, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;
          return node && node.nodeType === 1 ? node : null;
        }
        case 'CSS': return doc.querySelector(selector);
        case 'ID': return doc.getElementById(selector);
        case 'NAME': return doc.getElementsByName(selector)[0] || null;
        case 'CLASS': return doc.getElementsByClassName(selector)[0] || null;
        case 'TAG': return doc.getElementsByTagName(selector)[0] || null;
        case 'LINK': return Array.from(doc.querySelectorAll('a')).find((a) => a.textContent.trim() === selector) || null;
        case 'PLINK': return Array.from(doc.querySelectorAll('a')).find((a) => a.textContent.includes(selector)) || null;
      }
    } catch (err) {
      fail('InvalidSelector', strategy + ' ' + selector + ': ' + err.message);
    }
    fail('InvalidSelector', 'unsupported strategy ' + strategy);
  };
  const tag = (el, candidate) => {
    const existing = el.getAttribute('data-sbx-ref');
    if (existing) return existing;
    el.setAttribute('data-sbx-ref', candidate);
    return candidate;
  };
  const visible = (el) => {
    const rect = el.getBoundingClientRect();
    const style = el.ownerDocument.defaultView.getComputedStyle(el);
    return rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden' && style.display !== 'none';
  };
  const interactable = (el, what) => {
    if (!visible(el)) fail('NotInteractable', what + ' is not visible');
    if (el.disabled) fail('NotInteractable', what + ' is disabled');
  };
  const point = (path, el) => {
    el.scrollIntoView({ block: 'center', inline: 'center' });
    const { ox, oy } = frameDoc(path);
    const rect = el.getBoundingClientRect();
    return { x: ox + rect.left + rect.width / 2, y: oy + rect.top + rect.height / 2 };
  };
  const fire = (el, names) => {
    for (const name of names) el.dispatchEvent(new Event(name, { bubbles: true }));
  };
  return { fail, byRef, frameDoc, find, tag, visible, interactable, point, fire };
})();
"#;

/// Viewport coordinates (CSS pixels) of an element center
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub(crate) struct Point {
    pub x: f64,
    pub y: f64,
}

/// Element box in page coordinates, used to clip screenshots
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub(crate) struct Clip {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Deserialize)]
struct Outcome {
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn js(value: &str) -> String {
    // serde_json string encoding is a valid JS string literal
    Value::String(value.to_string()).to_string()
}

fn js_path(frames: &[String]) -> String {
    Value::from(frames.to_vec()).to_string()
}

/// Wrap `body` (statements ending in `return`) with frame resolution and the
/// JSON outcome protocol. `ctx` and `path` are in scope for the body.
pub(crate) fn wrap(frames: &[String], body: &str) -> String {
    format!(
        r#"(() => {{
{prelude}
try {{
  const path = {path};
  const ctx = __sbx.frameDoc(path);
  const value = (() => {{ {body} }})();
  return JSON.stringify({{ ok: true, value: value === undefined ? null : value }});
}} catch (err) {{
  if (err && err.__sbx) return JSON.stringify({{ ok: false, kind: err.kind, message: err.message }});
  return JSON.stringify({{ ok: false, kind: 'Script', message: String((err && err.message) || err) }});
}}
}})()"#,
        prelude = PRELUDE,
        path = js_path(frames),
        body = body
    )
}

/// Expression evaluating to the element object itself, for CDP calls that
/// need a remote object id.
pub(crate) fn element_object(frames: &[String], id: &str) -> String {
    format!(
        "(() => {{ {prelude} return __sbx.byRef(__sbx.frameDoc({path}).doc, {id}); }})()",
        prelude = PRELUDE,
        path = js_path(frames),
        id = js(id)
    )
}

pub(crate) fn parse_outcome(raw: &str) -> AutomationResult<Value> {
    let outcome: Outcome = serde_json::from_str(raw)
        .map_err(|err| AutomationError::Driver(format!("malformed script outcome: {err}")))?;
    if outcome.ok {
        return Ok(outcome.value);
    }
    let message = outcome.message.unwrap_or_default();
    Err(match outcome.kind.as_deref() {
        Some("ElementNotFound") => AutomationError::ElementNotFound(message),
        Some("InvalidSelector") => AutomationError::InvalidSelector(message),
        Some("NotInteractable") => AutomationError::NotInteractable(message),
        Some("InvalidArgument") => AutomationError::InvalidArgument(message),
        _ => AutomationError::Driver(format!("javascript error: {message}")),
    })
}

pub(crate) fn locate(locator: &Locator, candidate: &str) -> String {
    format!(
        "const el = __sbx.find(ctx.doc, {strategy}, {selector});
         if (!el) __sbx.fail('ElementNotFound', {display});
         return __sbx.tag(el, {candidate});",
        strategy = js(locator.strategy.keyword()),
        selector = js(&locator.selector),
        display = js(&locator.to_string()),
        candidate = js(candidate)
    )
}

/// Body returning `true` once `condition` holds; url/title are read natively.
pub(crate) fn probe(condition: &WaitCondition) -> Option<String> {
    let (locator, check) = match condition {
        WaitCondition::Present(locator) => (locator, "return !!el;".to_string()),
        WaitCondition::Visible(locator) => (locator, "return !!el && __sbx.visible(el);".to_string()),
        WaitCondition::Clickable(locator) => (
            locator,
            "return !!el && __sbx.visible(el) && !el.disabled;".to_string(),
        ),
        WaitCondition::Invisible(locator) => (locator, "return !el || !__sbx.visible(el);".to_string()),
        WaitCondition::TextPresent { locator, text } => (
            locator,
            format!(
                "return !!el && (el.innerText || el.textContent || '').includes({});",
                js(text)
            ),
        ),
        WaitCondition::UrlContains(_) | WaitCondition::TitleContains(_) => return None,
    };
    Some(format!(
        "const el = __sbx.find(ctx.doc, {strategy}, {selector}); {check}",
        strategy = js(locator.strategy.keyword()),
        selector = js(&locator.selector),
        check = check
    ))
}

/// Scroll the element into view, check it can receive input, return its center.
pub(crate) fn interaction_point(id: &str) -> String {
    format!(
        "const el = __sbx.byRef(ctx.doc, {id});
         __sbx.interactable(el, 'element ' + {id});
         return __sbx.point(path, el);",
        id = js(id)
    )
}

pub(crate) fn focus(id: &str) -> String {
    format!(
        "const el = __sbx.byRef(ctx.doc, {id});
         __sbx.interactable(el, 'element ' + {id});
         el.focus();
         return null;",
        id = js(id)
    )
}

pub(crate) fn script_click(id: &str) -> String {
    format!(
        "const el = __sbx.byRef(ctx.doc, {id}); el.click(); return null;",
        id = js(id)
    )
}

pub(crate) fn clear(id: &str) -> String {
    format!(
        "const el = __sbx.byRef(ctx.doc, {id});
         __sbx.interactable(el, 'element ' + {id});
         if ('value' in el) {{ el.value = ''; }} else if (el.isContentEditable) {{ el.textContent = ''; }}
         else {{ __sbx.fail('NotInteractable', 'element ' + {id} + ' is not editable'); }}
         __sbx.fire(el, ['input', 'change']);
         return null;",
        id = js(id)
    )
}

/// Replace element content through editing commands, or through the native
/// value setter for input-like elements when `prefer_value` is set.
pub(crate) fn set_content(id: &str, text: &str, prefer_value: bool) -> String {
    format!(
        "const el = __sbx.byRef(ctx.doc, {id});
         const text = {text};
         const doc = el.ownerDocument;
         const win = doc.defaultView;
         el.scrollIntoView({{ block: 'center', inline: 'nearest' }});
         try {{ el.focus(); }} catch (_) {{}}
         const tag = el.tagName.toLowerCase();
         if ({prefer_value} && (tag === 'input' || tag === 'textarea')) {{
           const proto = tag === 'input' ? win.HTMLInputElement.prototype : win.HTMLTextAreaElement.prototype;
           const desc = Object.getOwnPropertyDescriptor(proto, 'value');
           if (desc && desc.set) desc.set.call(el, text); else el.value = text;
           __sbx.fire(el, ['input', 'change']);
           return null;
         }}
         const editable = el.isContentEditable || el.getAttribute('contenteditable') === 'true' || el.getAttribute('role') === 'textbox';
         if (editable || !{prefer_value}) {{
           let inserted = false;
           try {{
             const sel = win.getSelection();
             sel.removeAllRanges();
             const range = doc.createRange();
             range.selectNodeContents(el);
             sel.addRange(range);
             doc.execCommand('delete');
             inserted = doc.execCommand('insertText', false, text);
           }} catch (_) {{
             inserted = false;
           }}
           if (inserted) return null;
         }}
         el.textContent = text;
         __sbx.fire(el, ['input', 'change']);
         return null;",
        id = js(id),
        text = js(text),
        prefer_value = prefer_value
    )
}

pub(crate) fn select(id: &str, by: &SelectBy) -> String {
    let matcher = match by {
        SelectBy::Text(text) => format!(
            "options.findIndex((o) => o.text.trim() === {})",
            js(text.trim())
        ),
        SelectBy::Value(value) => format!("options.findIndex((o) => o.value === {})", js(value)),
        SelectBy::Index(index) => format!("({index} < options.length ? {index} : -1)"),
    };
    format!(
        "const el = __sbx.byRef(ctx.doc, {id});
         if (el.tagName !== 'SELECT') __sbx.fail('InvalidArgument', 'element ' + {id} + ' is not a <select>');
         __sbx.interactable(el, 'element ' + {id});
         const options = Array.from(el.options);
         const index = {matcher};
         if (index < 0) __sbx.fail('ElementNotFound', 'no option matching ' + {wanted});
         el.selectedIndex = index;
         __sbx.fire(el, ['input', 'change']);
         return null;",
        id = js(id),
        matcher = matcher,
        wanted = js(&format!("{:?}", by))
    )
}

pub(crate) fn check_file_input(id: &str) -> String {
    format!(
        "const el = __sbx.byRef(ctx.doc, {id});
         if (el.tagName !== 'INPUT' || el.type !== 'file') __sbx.fail('InvalidArgument', 'element ' + {id} + ' is not a file input');
         return null;",
        id = js(id)
    )
}

pub(crate) fn scroll_into_view(id: &str, block: ScrollBlock) -> String {
    format!(
        "const el = __sbx.byRef(ctx.doc, {id});
         el.scrollIntoView({{ block: {block}, inline: 'nearest' }});
         return null;",
        id = js(id),
        block = js(block.as_str())
    )
}

pub(crate) fn scroll_by(dx: i64, dy: i64) -> String {
    format!("ctx.doc.defaultView.scrollBy({dx}, {dy}); return null;")
}

pub(crate) fn scroll_to(edge: ScrollEdge) -> String {
    match edge {
        ScrollEdge::Top => "ctx.doc.defaultView.scrollTo(0, 0); return null;".to_string(),
        ScrollEdge::Bottom => {
            "const root = ctx.doc.scrollingElement || ctx.doc.documentElement;
             ctx.doc.defaultView.scrollTo(0, root.scrollHeight);
             return null;"
                .to_string()
        }
    }
}

pub(crate) fn read_text(id: &str) -> String {
    format!(
        "const el = __sbx.byRef(ctx.doc, {id}); return (el.innerText || el.textContent || '').trim();",
        id = js(id)
    )
}

pub(crate) fn read_attribute(id: &str, name: &str) -> String {
    format!(
        "const el = __sbx.byRef(ctx.doc, {id});
         const name = {name};
         if (name in el && typeof el[name] !== 'function' && typeof el[name] !== 'object') return String(el[name]);
         return el.getAttribute(name);",
        id = js(id),
        name = js(name)
    )
}

/// Enter a frame element already tagged in the current document.
pub(crate) fn frame_by_ref(id: &str) -> String {
    format!(
        "const el = __sbx.byRef(ctx.doc, {id});
         if (el.tagName !== 'IFRAME' && el.tagName !== 'FRAME') __sbx.fail('InvalidArgument', 'element ' + {id} + ' is not a frame');
         return {id};",
        id = js(id)
    )
}

pub(crate) fn frame_by_index(index: usize, candidate: &str) -> String {
    format!(
        "const frames = ctx.doc.querySelectorAll('iframe, frame');
         if ({index} >= frames.length) __sbx.fail('InvalidArgument', 'frame index {index} out of range (' + frames.length + ' frames)');
         return __sbx.tag(frames[{index}], {candidate});",
        index = index,
        candidate = js(candidate)
    )
}

pub(crate) fn element_clip(id: &str) -> String {
    format!(
        "const el = __sbx.byRef(ctx.doc, {id});
         el.scrollIntoView({{ block: 'center', inline: 'center' }});
         const frame = __sbx.frameDoc(path);
         const rect = el.getBoundingClientRect();
         if (rect.width === 0 || rect.height === 0) __sbx.fail('NotInteractable', 'element ' + {id} + ' has no size');
         return {{ x: frame.ox + rect.left + window.scrollX, y: frame.oy + rect.top + window.scrollY, width: rect.width, height: rect.height }};",
        id = js(id)
    )
}

/// Run user code as a function body with positional `arguments`.
///
/// `args` entries are JS expressions evaluated inside the frame context.
/// Hides the usual automation fingerprints from page scripts.
pub(crate) const STEALTH_OVERRIDES: &str = r#"(() => {
  const define = (target, key, value) => {
    try {
      Object.defineProperty(target, key, { get: () => value, configurable: true });
    } catch (_) {}
  };
  define(Navigator.prototype, 'webdriver', undefined);
  define(Navigator.prototype, 'languages', ['en-US', 'en']);
  define(Navigator.prototype, 'plugins', [1, 2, 3, 4, 5]);
  if (!window.chrome) {
    window.chrome = { runtime: {} };
  }
})();"#;

pub(crate) fn user_function(source: &str) -> String {
    format!("return (function () {{ {source}\n }}).call(ctx.doc.defaultView);")
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulscript_core_types::Strategy;

    #[test]
    fn outcome_maps_error_kinds() {
        let raw = r#"{"ok":false,"kind":"ElementNotFound","message":"CSS #x"}"#;
        assert_eq!(
            parse_outcome(raw),
            Err(AutomationError::ElementNotFound("CSS #x".into()))
        );
        let raw = r#"{"ok":false,"kind":"Script","message":"boom"}"#;
        assert!(matches!(parse_outcome(raw), Err(AutomationError::Driver(_))));
    }

    #[test]
    fn outcome_returns_value() {
        let raw = r#"{"ok":true,"value":{"x":1.5,"y":2}}"#;
        let value = parse_outcome(raw).unwrap();
        let point: Point = serde_json::from_value(value).unwrap();
        assert_eq!(point, Point { x: 1.5, y: 2.0 });
    }

    #[test]
    fn selectors_are_embedded_as_string_literals() {
        let locator = Locator::new(Strategy::XPath, r#"//a[text()="it's"]"#);
        let body = locate(&locator, "sbx-1");
        assert!(body.contains(r#""//a[text()=\"it's\"]""#));
        assert!(body.contains(r#""XPATH""#));
    }

    #[test]
    fn url_and_title_waits_are_native() {
        assert!(probe(&WaitCondition::UrlContains("x".into())).is_none());
        assert!(probe(&WaitCondition::Present(Locator::new(Strategy::Id, "a"))).is_some());
    }

    #[test]
    fn stealth_overrides_cover_navigator_fingerprints() {
        for key in ["'webdriver', undefined", "'languages'", "'plugins'"] {
            assert!(STEALTH_OVERRIDES.contains(key), "missing {key}");
        }
        assert!(STEALTH_OVERRIDES.trim_end().ends_with("})();"));
    }

    #[test]
    fn user_source_runs_against_the_frame_window() {
        let body = user_function("return document.title;");
        assert!(body.contains("return document.title;"));
        assert!(body.ends_with(".call(ctx.doc.defaultView);"));
    }

    #[test]
    fn wrap_embeds_frame_path() {
        let source = wrap(&["sbx-3".to_string()], "return 1;");
        assert!(source.contains(r#"const path = ["sbx-3"];"#));
    }
}
