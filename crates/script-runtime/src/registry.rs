//! The command table: every script verb with its arity contract

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Handler identifier; the dispatcher matches on it exhaustively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    Click,
    RightClick,
    DoubleClick,
    Hover,
    ScriptClick,
    Clear,
    Write,
    SendKeys,
    Press,
    WriteEditable,
    WriteValue,
    DragDrop,
    DragOffset,
    Goto,
    Back,
    Forward,
    Refresh,
    Maximize,
    Minimize,
    SetWindow,
    Frame,
    FrameIndex,
    FrameParent,
    FrameDefault,
    WindowLatest,
    WindowIndex,
    WindowClose,
    WaitPresent,
    WaitVisible,
    WaitClickable,
    WaitInvisible,
    WaitText,
    WaitUrlContains,
    WaitTitleContains,
    ScrollIntoView,
    ScrollBy,
    ScrollTop,
    ScrollBottom,
    Select,
    Upload,
    Screenshot,
    ScreenshotElement,
    ExecJs,
    AssertText,
    AssertUrlContains,
    AssertTitleContains,
    PrintText,
    PrintAttr,
    Echo,
    CookieSet,
    CookiesSet,
    CookieGet,
    CookieDelete,
    CookieClear,
    Sleep,
    Pause,
    KeepOpen,
    SetVar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub handler: Handler,
    pub min_args: usize,
    /// `None` = unbounded
    pub max_args: Option<usize>,
    /// Tokens from this index on are space-joined into one argument
    pub join_from: Option<usize>,
    pub usage: &'static str,
}

const fn spec(
    name: &'static str,
    handler: Handler,
    min_args: usize,
    max_args: Option<usize>,
    join_from: Option<usize>,
    usage: &'static str,
) -> CommandSpec {
    CommandSpec {
        name,
        handler,
        min_args,
        max_args,
        join_from,
        usage,
    }
}

use Handler as H;

static COMMANDS: &[CommandSpec] = &[
    // element
    spec("click", H::Click, 2, Some(2), None, "<strategy> <selector>"),
    spec("rclick", H::RightClick, 2, Some(2), None, "<strategy> <selector>"),
    spec("dclick", H::DoubleClick, 2, Some(2), None, "<strategy> <selector>"),
    spec("hover", H::Hover, 2, Some(2), None, "<strategy> <selector>"),
    spec("click_js", H::ScriptClick, 2, Some(2), None, "<strategy> <selector>"),
    spec("clear", H::Clear, 2, Some(2), None, "<strategy> <selector>"),
    // text entry
    spec("write", H::Write, 3, None, None, "<strategy> <selector> <text>..."),
    spec("send_keys", H::SendKeys, 3, None, None, "<strategy> <selector> <key>..."),
    spec("press", H::Press, 1, None, None, "<key>..."),
    spec("write_ce", H::WriteEditable, 3, None, Some(2), "<strategy> <selector> <text>"),
    spec("write_js", H::WriteValue, 3, None, Some(2), "<strategy> <selector> <text>"),
    // drag
    spec(
        "drag_drop",
        H::DragDrop,
        4,
        Some(4),
        None,
        "<strategy> <selector> <target-strategy> <target-selector>",
    ),
    spec("drag_offset", H::DragOffset, 4, Some(4), None, "<strategy> <selector> <dx> <dy>"),
    // navigation
    spec("goto", H::Goto, 1, Some(1), None, "<url>"),
    spec("back", H::Back, 0, Some(0), None, ""),
    spec("forward", H::Forward, 0, Some(0), None, ""),
    spec("refresh", H::Refresh, 0, Some(0), None, ""),
    spec("maximize", H::Maximize, 0, Some(0), None, ""),
    spec("minimize", H::Minimize, 0, Some(0), None, ""),
    spec("set_window", H::SetWindow, 2, Some(2), None, "<width> <height>"),
    // frames
    spec("frame", H::Frame, 2, Some(2), None, "<strategy> <selector>"),
    spec("frame_index", H::FrameIndex, 1, Some(1), None, "<index>"),
    spec("frame_parent", H::FrameParent, 0, Some(0), None, ""),
    spec("frame_default", H::FrameDefault, 0, Some(0), None, ""),
    // windows
    spec("window_latest", H::WindowLatest, 0, Some(0), None, ""),
    spec("window_index", H::WindowIndex, 1, Some(1), None, "<index>"),
    spec("window_close", H::WindowClose, 0, Some(0), None, ""),
    // waits
    spec("wait_present", H::WaitPresent, 2, Some(3), None, "<strategy> <selector> [timeout]"),
    spec("wait_visible", H::WaitVisible, 2, Some(3), None, "<strategy> <selector> [timeout]"),
    spec("wait_clickable", H::WaitClickable, 2, Some(3), None, "<strategy> <selector> [timeout]"),
    spec("wait_invisible", H::WaitInvisible, 2, Some(3), None, "<strategy> <selector> [timeout]"),
    spec("wait_text", H::WaitText, 3, Some(4), None, "<strategy> <selector> <text> [timeout]"),
    spec("wait_url_contains", H::WaitUrlContains, 1, Some(2), None, "<fragment> [timeout]"),
    spec("wait_title_contains", H::WaitTitleContains, 1, Some(2), None, "<fragment> [timeout]"),
    // scrolling
    spec("scroll_into_view", H::ScrollIntoView, 2, Some(3), None, "<strategy> <selector> [block]"),
    spec("scroll_by", H::ScrollBy, 2, Some(2), None, "<dx> <dy>"),
    spec("scroll_top", H::ScrollTop, 0, Some(0), None, ""),
    spec("scroll_bottom", H::ScrollBottom, 0, Some(0), None, ""),
    // selection
    spec("select", H::Select, 4, Some(4), None, "<strategy> <selector> <text|value|index> <option>"),
    // file, script, capture
    spec("upload", H::Upload, 3, Some(3), None, "<strategy> <selector> <path>"),
    spec("screenshot", H::Screenshot, 1, Some(1), None, "<path>"),
    spec("screenshot_element", H::ScreenshotElement, 3, Some(3), None, "<strategy> <selector> <path>"),
    spec("exec_js", H::ExecJs, 1, None, Some(0), "<source>"),
    // assertions and printing
    spec("assert_text", H::AssertText, 3, None, Some(2), "<strategy> <selector> <expected>"),
    spec("assert_url_contains", H::AssertUrlContains, 1, None, Some(0), "<fragment>"),
    spec("assert_title_contains", H::AssertTitleContains, 1, None, Some(0), "<fragment>"),
    spec("print_text", H::PrintText, 2, Some(2), None, "<strategy> <selector>"),
    spec("print_attr", H::PrintAttr, 3, Some(3), None, "<strategy> <selector> <attribute>"),
    spec("echo", H::Echo, 0, None, None, "[text]..."),
    // cookies
    spec("cookie_set", H::CookieSet, 2, Some(2), None, "<name> <value>"),
    spec("cookies_set", H::CookiesSet, 1, Some(1), None, "\"<name>:<value>;...\""),
    spec("cookie_get", H::CookieGet, 1, Some(1), None, "<name>"),
    spec("cookie_delete", H::CookieDelete, 1, Some(1), None, "<name>"),
    spec("cookie_clear", H::CookieClear, 0, Some(0), None, ""),
    // session
    spec("sleep", H::Sleep, 1, Some(1), None, "<seconds>"),
    spec("pause", H::Pause, 0, Some(0), None, ""),
    spec("keep_open", H::KeepOpen, 0, Some(0), None, ""),
    spec("set_var", H::SetVar, 2, Some(2), None, "<name> <value>"),
];

static INDEX: Lazy<HashMap<&'static str, &'static CommandSpec>> =
    Lazy::new(|| COMMANDS.iter().map(|spec| (spec.name, spec)).collect());

pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    INDEX.get(name).copied()
}

/// All commands in table order
pub fn commands() -> &'static [CommandSpec] {
    COMMANDS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn arity_bounds_are_consistent() {
        for spec in commands() {
            if let Some(max) = spec.max_args {
                assert!(spec.min_args <= max, "{} has min > max", spec.name);
            }
            if let Some(join) = spec.join_from {
                assert!(join <= spec.min_args, "{} joins before its required head", spec.name);
            }
        }
    }

    #[test]
    fn names_and_handlers_are_unique() {
        let names: HashSet<_> = commands().iter().map(|spec| spec.name).collect();
        let handlers: HashSet<_> = commands().iter().map(|spec| spec.handler).collect();
        assert_eq!(names.len(), commands().len());
        assert_eq!(handlers.len(), commands().len());
    }

    #[test]
    fn lookup_finds_joined_commands() {
        let spec = lookup("assert_text").unwrap();
        assert_eq!((spec.min_args, spec.max_args, spec.join_from), (3, None, Some(2)));
        let spec = lookup("exec_js").unwrap();
        assert_eq!(spec.join_from, Some(0));
        assert!(lookup("L_click").is_none());
    }
}
