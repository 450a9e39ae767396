//! Shared value types exchanged between the script runtime and the automation
//! backends.

use std::fmt;
use std::path::PathBuf;

/// Element lookup strategy accepted by the script language.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Strategy {
    XPath,
    Css,
    Id,
    Name,
    Class,
    Tag,
    LinkText,
    PartialLinkText,
}

impl Strategy {
    pub const ALL: [Strategy; 8] = [
        Strategy::XPath,
        Strategy::Css,
        Strategy::Id,
        Strategy::Name,
        Strategy::Class,
        Strategy::Tag,
        Strategy::LinkText,
        Strategy::PartialLinkText,
    ];

    /// Parse a script keyword (`XPATH`, `css`, `Plink`, ...).
    pub fn parse(keyword: &str) -> Option<Self> {
        let upper = keyword.to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.keyword() == upper)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Strategy::XPath => "XPATH",
            Strategy::Css => "CSS",
            Strategy::Id => "ID",
            Strategy::Name => "NAME",
            Strategy::Class => "CLASS",
            Strategy::Tag => "TAG",
            Strategy::LinkText => "LINK",
            Strategy::PartialLinkText => "PLINK",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Locator {
    pub strategy: Strategy,
    pub selector: String,
}

impl Locator {
    pub fn new(strategy: Strategy, selector: impl Into<String>) -> Self {
        Self {
            strategy,
            selector: selector.into(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.strategy, self.selector)
    }
}

/// Opaque handle to an element previously returned by `locate`.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ElementRef {
    pub id: String,
    pub locator: Locator,
}

impl ElementRef {
    pub fn new(id: impl Into<String>, locator: Locator) -> Self {
        Self {
            id: id.into(),
            locator,
        }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.locator, self.id)
    }
}

/// Named keys that can appear in a key sequence.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum KeySymbol {
    Enter,
    Tab,
    Escape,
    Space,
    Backspace,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Control,
    Shift,
    Alt,
    Command,
    Meta,
}

impl KeySymbol {
    /// Modifiers stay pressed until the end of the sequence they appear in.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            KeySymbol::Control | KeySymbol::Shift | KeySymbol::Alt | KeySymbol::Command | KeySymbol::Meta
        )
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum KeyInput {
    Key(KeySymbol),
    Text(String),
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[cfg_attr(feature = "serde-full", serde(skip_serializing_if = "Option::is_none"))]
    pub domain: Option<String>,
    #[cfg_attr(feature = "serde-full", serde(skip_serializing_if = "Option::is_none"))]
    pub path: Option<String>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
        }
    }
}

/// Conditions polled by explicit waits.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WaitCondition {
    Present(Locator),
    Visible(Locator),
    Clickable(Locator),
    Invisible(Locator),
    TextPresent { locator: Locator, text: String },
    UrlContains(String),
    TitleContains(String),
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Navigation {
    Goto(String),
    Back,
    Forward,
    Refresh,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScrollBlock {
    Start,
    Center,
    End,
    Nearest,
}

impl ScrollBlock {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "start" => Some(ScrollBlock::Start),
            "center" => Some(ScrollBlock::Center),
            "end" => Some(ScrollBlock::End),
            "nearest" => Some(ScrollBlock::Nearest),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollBlock::Start => "start",
            ScrollBlock::Center => "center",
            ScrollBlock::End => "end",
            ScrollBlock::Nearest => "nearest",
        }
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScrollEdge {
    Top,
    Bottom,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SelectBy {
    Text(String),
    Value(String),
    Index(usize),
}

/// How `SetContent` writes into an element.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentMode {
    /// contenteditable / textbox replacement through editing commands
    Editable,
    /// value setter for input-like elements, editable fallback otherwise
    Value,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WindowOp {
    Maximize,
    Minimize,
    Resize { width: u32, height: u32 },
}

/// Side-effecting operations handed to `Automation::perform`.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Action {
    Click(ElementRef),
    ContextClick(ElementRef),
    DoubleClick(ElementRef),
    Hover(ElementRef),
    ScriptClick(ElementRef),
    Clear(ElementRef),
    TypeText {
        target: ElementRef,
        text: String,
    },
    /// `target: None` sends to the currently focused element.
    SendKeys {
        target: Option<ElementRef>,
        keys: Vec<KeyInput>,
    },
    SetContent {
        target: ElementRef,
        text: String,
        mode: ContentMode,
    },
    DragAndDrop {
        source: ElementRef,
        target: ElementRef,
    },
    DragBy {
        target: ElementRef,
        dx: i64,
        dy: i64,
    },
    Select {
        target: ElementRef,
        by: SelectBy,
    },
    Upload {
        target: ElementRef,
        path: PathBuf,
    },
    ScrollIntoView {
        target: ElementRef,
        block: ScrollBlock,
    },
    ScrollBy {
        dx: i64,
        dy: i64,
    },
    ScrollTo(ScrollEdge),
    Window(WindowOp),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Click(_) => "click",
            Action::ContextClick(_) => "context_click",
            Action::DoubleClick(_) => "double_click",
            Action::Hover(_) => "hover",
            Action::ScriptClick(_) => "script_click",
            Action::Clear(_) => "clear",
            Action::TypeText { .. } => "type_text",
            Action::SendKeys { .. } => "send_keys",
            Action::SetContent { .. } => "set_content",
            Action::DragAndDrop { .. } => "drag_and_drop",
            Action::DragBy { .. } => "drag_by",
            Action::Select { .. } => "select",
            Action::Upload { .. } => "upload",
            Action::ScrollIntoView { .. } => "scroll_into_view",
            Action::ScrollBy { .. } => "scroll_by",
            Action::ScrollTo(_) => "scroll_to",
            Action::Window(_) => "window",
        }
    }
}

/// Read-only lookups handed to `Automation::read`.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Query {
    Text(ElementRef),
    Attribute { target: ElementRef, name: String },
    Url,
    Title,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FrameTarget {
    Element(ElementRef),
    Index(usize),
    Parent,
    Default,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct WindowHandle(pub String);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_keywords_are_case_insensitive() {
        assert_eq!(Strategy::parse("css"), Some(Strategy::Css));
        assert_eq!(Strategy::parse("XPath"), Some(Strategy::XPath));
        assert_eq!(Strategy::parse("plink"), Some(Strategy::PartialLinkText));
        assert_eq!(Strategy::parse("shadow"), None);
    }

    #[test]
    fn strategy_keyword_roundtrips() {
        for strategy in Strategy::ALL {
            assert_eq!(Strategy::parse(strategy.keyword()), Some(strategy));
        }
    }

    #[test]
    fn modifiers_are_flagged() {
        assert!(KeySymbol::Control.is_modifier());
        assert!(KeySymbol::Meta.is_modifier());
        assert!(!KeySymbol::Enter.is_modifier());
    }

    #[test]
    fn scroll_block_parse() {
        assert_eq!(ScrollBlock::parse("Center"), Some(ScrollBlock::Center));
        assert_eq!(ScrollBlock::parse("middle"), None);
    }
}
