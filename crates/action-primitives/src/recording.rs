//! In-memory automation backend
//!
//! Records every capability call instead of touching a browser. The CLI uses
//! it for `--dry-run`; tests use its builder methods to script page state and
//! inject failures.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use soulscript_core_types::{
    Action, Cookie, ElementRef, FrameTarget, Locator, Navigation, Query,
    WaitCondition, WindowHandle,
};
use tracing::debug;

use crate::errors::{AutomationError, AutomationResult};
use crate::primitives::Automation;

#[derive(Debug)]
struct RecordingState {
    calls: Vec<String>,
    history: Vec<String>,
    history_pos: usize,
    title: String,
    texts: HashMap<String, String>,
    attributes: HashMap<(String, String), String>,
    missing: HashSet<String>,
    failures: HashMap<String, AutomationError>,
    cookies: Vec<Cookie>,
    windows: Vec<WindowHandle>,
    current_window: usize,
    frame_depth: usize,
    next_ref: u64,
    next_window: u64,
    shut_down: bool,
}

impl Default for RecordingState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            history: vec!["about:blank".to_string()],
            history_pos: 0,
            title: String::new(),
            texts: HashMap::new(),
            attributes: HashMap::new(),
            missing: HashSet::new(),
            failures: HashMap::new(),
            cookies: Vec::new(),
            windows: vec![WindowHandle("window-1".to_string())],
            current_window: 0,
            frame_depth: 0,
            next_ref: 0,
            next_window: 1,
            shut_down: false,
        }
    }
}

impl RecordingState {
    fn check(&self, operation: &str) -> AutomationResult<()> {
        match self.failures.get(operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn url(&self) -> &str {
        &self.history[self.history_pos]
    }

    /// Text an element shows; unregistered elements are empty
    fn text_of(&self, selector: &str) -> &str {
        self.texts.get(selector).map(String::as_str).unwrap_or_default()
    }
}

/// Automation double that never fails unless told to.
///
/// Elements exist unless their selector was registered with
/// [`RecordingAutomation::with_missing`], and only those count as invisible.
/// Text reads and text waits both see registered text or an empty string.
#[derive(Debug, Default)]
pub struct RecordingAutomation {
    state: Mutex<RecordingState>,
}

impl RecordingAutomation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        self.state.lock().title = title.into();
        self
    }

    pub fn with_url(self, url: impl Into<String>) -> Self {
        {
            let mut state = self.state.lock();
            state.history = vec![url.into()];
            state.history_pos = 0;
        }
        self
    }

    /// Text returned for elements matched by `selector`
    pub fn with_element_text(self, selector: impl Into<String>, text: impl Into<String>) -> Self {
        self.state.lock().texts.insert(selector.into(), text.into());
        self
    }

    pub fn with_attribute(
        self,
        selector: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.state
            .lock()
            .attributes
            .insert((selector.into(), name.into()), value.into());
        self
    }

    /// Selector that never resolves
    pub fn with_missing(self, selector: impl Into<String>) -> Self {
        self.state.lock().missing.insert(selector.into());
        self
    }

    /// Make an operation fail every time it is invoked.
    ///
    /// `operation` is an action name (`click`, `type_text`, ...) or one of
    /// `navigate`, `wait`, `read`, `cookie`, `frame`, `window`, `screenshot`,
    /// `script`.
    pub fn fail_on(self, operation: impl Into<String>, err: AutomationError) -> Self {
        self.state.lock().failures.insert(operation.into(), err);
        self
    }

    /// Simulate a page opening a new tab
    pub fn open_window(&self) -> WindowHandle {
        let mut state = self.state.lock();
        state.next_window += 1;
        let handle = WindowHandle(format!("window-{}", state.next_window));
        state.windows.push(handle.clone());
        handle
    }

    /// Human readable log of every call, in order
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn cookies(&self) -> Vec<Cookie> {
        self.state.lock().cookies.clone()
    }

    pub fn current_url(&self) -> String {
        self.state.lock().url().to_string()
    }

    pub fn current_window(&self) -> Option<WindowHandle> {
        let state = self.state.lock();
        state.windows.get(state.current_window).cloned()
    }

    pub fn frame_depth(&self) -> usize {
        self.state.lock().frame_depth
    }

    pub fn is_shut_down(&self) -> bool {
        self.state.lock().shut_down
    }

    fn record(&self, call: String) {
        debug!(call = %call, "recorded automation call");
        self.state.lock().calls.push(call);
    }
}

#[async_trait]
impl Automation for RecordingAutomation {
    async fn locate(&self, locator: &Locator) -> AutomationResult<ElementRef> {
        self.record(format!("locate {}", locator));
        let mut state = self.state.lock();
        if state.missing.contains(&locator.selector) {
            return Err(AutomationError::ElementNotFound(locator.to_string()));
        }
        state.next_ref += 1;
        Ok(ElementRef::new(format!("ref-{}", state.next_ref), locator.clone()))
    }

    async fn navigate(&self, navigation: Navigation) -> AutomationResult<()> {
        self.record(format!("navigate {:?}", navigation));
        let mut state = self.state.lock();
        state.check("navigate")?;
        match navigation {
            Navigation::Goto(url) => {
                let keep = state.history_pos + 1;
                state.history.truncate(keep);
                state.history.push(url);
                state.history_pos += 1;
            }
            Navigation::Back => state.history_pos = state.history_pos.saturating_sub(1),
            Navigation::Forward => {
                if state.history_pos + 1 < state.history.len() {
                    state.history_pos += 1;
                }
            }
            Navigation::Refresh => {}
        }
        state.frame_depth = 0;
        Ok(())
    }

    async fn wait_for(&self, condition: &WaitCondition, timeout: Duration) -> AutomationResult<()> {
        self.record(format!("wait {:?} {}s", condition, timeout.as_secs_f64()));
        let state = self.state.lock();
        state.check("wait")?;
        let holds = match condition {
            WaitCondition::Present(locator)
            | WaitCondition::Visible(locator)
            | WaitCondition::Clickable(locator) => !state.missing.contains(&locator.selector),
            WaitCondition::Invisible(locator) => state.missing.contains(&locator.selector),
            WaitCondition::TextPresent { locator, text } => {
                !state.missing.contains(&locator.selector)
                    && state.text_of(&locator.selector).contains(text.as_str())
            }
            WaitCondition::UrlContains(fragment) => state.url().contains(fragment.as_str()),
            WaitCondition::TitleContains(fragment) => state.title.contains(fragment.as_str()),
        };
        if holds {
            Ok(())
        } else {
            Err(AutomationError::WaitTimeout(format!("{:?}", condition)))
        }
    }

    async fn perform(&self, action: Action) -> AutomationResult<()> {
        let name = action.name();
        self.record(format!("perform {:?}", action));
        let mut state = self.state.lock();
        state.check(name)?;
        match action {
            Action::Upload { path, .. } if !path.exists() => Err(AutomationError::InvalidArgument(
                format!("file not found: {}", path.display()),
            )),
            Action::SetContent { target, text, .. } | Action::TypeText { target, text } => {
                state.texts.insert(target.locator.selector, text);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn read(&self, query: Query) -> AutomationResult<Option<String>> {
        self.record(format!("read {:?}", query));
        let state = self.state.lock();
        state.check("read")?;
        let value = match query {
            Query::Text(target) => Some(state.text_of(&target.locator.selector).to_string()),
            Query::Attribute { target, name } => state
                .attributes
                .get(&(target.locator.selector, name))
                .cloned(),
            Query::Url => Some(state.url().to_string()),
            Query::Title => Some(state.title.clone()),
        };
        Ok(value)
    }

    async fn set_cookie(&self, cookie: Cookie) -> AutomationResult<()> {
        self.record(format!("set_cookie {}={}", cookie.name, cookie.value));
        let mut state = self.state.lock();
        state.check("cookie")?;
        state.cookies.retain(|existing| existing.name != cookie.name);
        state.cookies.push(cookie);
        Ok(())
    }

    async fn get_cookie(&self, name: &str) -> AutomationResult<Option<Cookie>> {
        self.record(format!("get_cookie {}", name));
        let state = self.state.lock();
        state.check("cookie")?;
        Ok(state.cookies.iter().find(|c| c.name == name).cloned())
    }

    async fn delete_cookie(&self, name: &str) -> AutomationResult<()> {
        self.record(format!("delete_cookie {}", name));
        let mut state = self.state.lock();
        state.check("cookie")?;
        state.cookies.retain(|c| c.name != name);
        Ok(())
    }

    async fn clear_cookies(&self) -> AutomationResult<()> {
        self.record("clear_cookies".to_string());
        let mut state = self.state.lock();
        state.check("cookie")?;
        state.cookies.clear();
        Ok(())
    }

    async fn switch_frame(&self, target: FrameTarget) -> AutomationResult<()> {
        self.record(format!("switch_frame {:?}", target));
        let mut state = self.state.lock();
        state.check("frame")?;
        match target {
            FrameTarget::Element(_) | FrameTarget::Index(_) => state.frame_depth += 1,
            FrameTarget::Parent => state.frame_depth = state.frame_depth.saturating_sub(1),
            FrameTarget::Default => state.frame_depth = 0,
        }
        Ok(())
    }

    async fn windows(&self) -> AutomationResult<Vec<WindowHandle>> {
        self.record("windows".to_string());
        let state = self.state.lock();
        state.check("window")?;
        Ok(state.windows.clone())
    }

    async fn switch_window(&self, handle: &WindowHandle) -> AutomationResult<()> {
        self.record(format!("switch_window {}", handle));
        let mut state = self.state.lock();
        state.check("window")?;
        let index = state
            .windows
            .iter()
            .position(|candidate| candidate == handle)
            .ok_or_else(|| AutomationError::InvalidArgument(format!("no such window {}", handle)))?;
        state.current_window = index;
        state.frame_depth = 0;
        Ok(())
    }

    async fn close_window(&self) -> AutomationResult<()> {
        self.record("close_window".to_string());
        let mut state = self.state.lock();
        state.check("window")?;
        if state.windows.is_empty() {
            return Err(AutomationError::Driver("no window left to close".to_string()));
        }
        let current = state.current_window.min(state.windows.len() - 1);
        state.windows.remove(current);
        state.current_window = state.windows.len().saturating_sub(1);
        state.frame_depth = 0;
        Ok(())
    }

    async fn capture_screenshot(
        &self,
        target: Option<&ElementRef>,
        path: &Path,
    ) -> AutomationResult<()> {
        match target {
            Some(element) => self.record(format!("screenshot {} -> {}", element, path.display())),
            None => self.record(format!("screenshot -> {}", path.display())),
        }
        self.state.lock().check("screenshot")
    }

    async fn run_script(&self, source: &str) -> AutomationResult<Value> {
        self.record(format!("script {}", source));
        self.state.lock().check("script")?;
        Ok(Value::Null)
    }

    async fn shutdown(&self) -> AutomationResult<()> {
        self.record("shutdown".to_string());
        self.state.lock().shut_down = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulscript_core_types::Strategy;

    #[tokio::test]
    async fn missing_selectors_fail_lookup() {
        let automation = RecordingAutomation::new().with_missing("#gone");
        let err = automation
            .locate(&Locator::new(Strategy::Css, "#gone"))
            .await
            .unwrap_err();
        assert!(matches!(err, AutomationError::ElementNotFound(_)));
        assert!(automation
            .locate(&Locator::new(Strategy::Css, "#here"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn injected_failures_surface_on_perform() {
        let automation = RecordingAutomation::new()
            .fail_on("click", AutomationError::NotInteractable("covered".into()));
        let target = automation
            .locate(&Locator::new(Strategy::Id, "go"))
            .await
            .unwrap();
        let err = automation.perform(Action::Click(target.clone())).await.unwrap_err();
        assert_eq!(err, AutomationError::NotInteractable("covered".into()));
        assert!(automation.perform(Action::Hover(target)).await.is_ok());
    }

    #[tokio::test]
    async fn navigation_tracks_history() {
        let automation = RecordingAutomation::new();
        automation
            .navigate(Navigation::Goto("https://a.test".into()))
            .await
            .unwrap();
        automation
            .navigate(Navigation::Goto("https://b.test".into()))
            .await
            .unwrap();
        automation.navigate(Navigation::Back).await.unwrap();
        assert_eq!(automation.current_url(), "https://a.test");
        automation.navigate(Navigation::Forward).await.unwrap();
        assert_eq!(automation.current_url(), "https://b.test");
    }

    #[tokio::test]
    async fn text_waits_agree_with_text_reads() {
        let automation = RecordingAutomation::new().with_element_text("#status", "Ready to go");
        let status = Locator::new(Strategy::Css, "#status");
        let blank = Locator::new(Strategy::Css, "#blank");
        let wait = |locator: &Locator, text: &str| WaitCondition::TextPresent {
            locator: locator.clone(),
            text: text.to_string(),
        };

        assert!(automation
            .wait_for(&wait(&status, "Ready"), Duration::from_secs(1))
            .await
            .is_ok());
        let err = automation
            .wait_for(&wait(&blank, "Ready"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AutomationError::WaitTimeout(_)));

        let target = automation.locate(&blank).await.unwrap();
        let read = automation.read(Query::Text(target)).await.unwrap();
        assert_eq!(read.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn cookies_replace_by_name() {
        let automation = RecordingAutomation::new();
        automation.set_cookie(Cookie::new("a", "1")).await.unwrap();
        automation.set_cookie(Cookie::new("a", "2")).await.unwrap();
        let cookie = automation.get_cookie("a").await.unwrap();
        assert_eq!(cookie.map(|c| c.value), Some("2".to_string()));
        assert_eq!(automation.cookies().len(), 1);
    }

    #[tokio::test]
    async fn closing_a_window_falls_back_to_latest() {
        let automation = RecordingAutomation::new();
        let second = automation.open_window();
        automation.switch_window(&second).await.unwrap();
        automation.close_window().await.unwrap();
        assert_eq!(
            automation.current_window(),
            Some(WindowHandle("window-1".into()))
        );
    }
}
