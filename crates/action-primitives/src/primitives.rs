//! The automation capability consumed by the script runtime
//!
//! Every script command maps onto one or two calls of this trait. The runtime
//! only ever holds an `Arc<dyn Automation>` and never learns how the backend
//! was provisioned (launched browser, attached debugger, recording double).

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use soulscript_core_types::{
    Action, Cookie, ElementRef, FrameTarget, Locator, Navigation, Query,
    WaitCondition, WindowHandle,
};

use crate::errors::AutomationResult;

#[async_trait]
pub trait Automation: Send + Sync {
    /// Resolve a locator in the current window/frame
    async fn locate(&self, locator: &Locator) -> AutomationResult<ElementRef>;

    async fn navigate(&self, navigation: Navigation) -> AutomationResult<()>;

    /// Poll `condition` until it holds; `WaitTimeout` once `timeout` elapses
    async fn wait_for(&self, condition: &WaitCondition, timeout: Duration) -> AutomationResult<()>;

    async fn perform(&self, action: Action) -> AutomationResult<()>;

    async fn read(&self, query: Query) -> AutomationResult<Option<String>>;

    async fn set_cookie(&self, cookie: Cookie) -> AutomationResult<()>;
    async fn get_cookie(&self, name: &str) -> AutomationResult<Option<Cookie>>;
    async fn delete_cookie(&self, name: &str) -> AutomationResult<()>;
    async fn clear_cookies(&self) -> AutomationResult<()>;

    async fn switch_frame(&self, target: FrameTarget) -> AutomationResult<()>;

    /// Open windows/tabs in the order they were first seen
    async fn windows(&self) -> AutomationResult<Vec<WindowHandle>>;
    async fn switch_window(&self, handle: &WindowHandle) -> AutomationResult<()>;
    async fn close_window(&self) -> AutomationResult<()>;

    /// Capture the viewport, or a single element when `target` is set
    async fn capture_screenshot(
        &self,
        target: Option<&ElementRef>,
        path: &Path,
    ) -> AutomationResult<()>;

    /// Run a function body in the current frame; `this` is the frame's window
    async fn run_script(&self, source: &str) -> AutomationResult<Value>;

    /// Release the browser; safe to call more than once
    async fn shutdown(&self) -> AutomationResult<()>;
}
