//! Chromium DevTools backend built on `chromiumoxide`.
//!
//! Elements are resolved page-side and tagged with a `data-sbx-ref`
//! attribute, so an [`ElementRef`] stays valid across calls as long as the
//! node stays attached. Entered frames are tracked as a stack of tagged frame
//! elements; every script walks that stack before touching the document.

mod input;
mod script;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    Bounds, GetWindowForTargetParams, SetWindowBoundsParams, WindowState,
};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::input::MouseButton;
use chromiumoxide::cdp::browser_protocol::network::{
    ClearBrowserCookiesParams, CookieParam, DeleteCookiesParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, BringToFrontParams, CaptureScreenshotFormat, GetNavigationHistoryParams,
    NavigateToHistoryEntryParams, Viewport,
};
use chromiumoxide::cdp::js_protocol::runtime::{EvaluateParams, EvaluateReturns};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use parking_lot::Mutex;
use serde_json::Value;
use soulscript_core_types::{
    Action, ContentMode, Cookie, ElementRef, FrameTarget, Locator, Navigation, Query,
    WaitCondition, WindowHandle, WindowOp,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::errors::{AutomationError, AutomationResult};
use crate::primitives::Automation;
use crate::waiting::{poll_until, DEFAULT_POLL_INTERVAL};
use script::{Clip, Point};

pub(crate) fn driver_err(err: CdpError) -> AutomationError {
    AutomationError::Driver(err.to_string())
}

/// How to obtain a browser.
#[derive(Clone, Debug)]
pub struct ChromiumConfig {
    /// Chrome/Chromium binary; `None` lets chromiumoxide search the usual paths
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub user_data_dir: Option<PathBuf>,
    /// Extra command line switches, passed through verbatim
    pub args: Vec<String>,
    pub window_size: Option<(u32, u32)>,
    /// Patch `navigator` fingerprints in every page before its scripts run
    pub stealth: bool,
    pub launch_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ChromiumConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: false,
            user_data_dir: None,
            args: Vec::new(),
            window_size: None,
            stealth: false,
            launch_timeout: Duration::from_secs(20),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ChromiumConfig {
    fn browser_config(&self) -> AutomationResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .launch_timeout(self.launch_timeout)
            .request_timeout(self.request_timeout);
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &self.executable {
            if !executable.exists() {
                return Err(AutomationError::Driver(format!(
                    "chrome executable not found at {}",
                    executable.display()
                )));
            }
            builder = builder.chrome_executable(executable.clone());
        }
        if let Some(dir) = &self.user_data_dir {
            builder = builder.user_data_dir(dir.clone());
        }
        if let Some((width, height)) = self.window_size {
            builder = builder.window_size(width, height);
        }
        let mut args = vec![
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-popup-blocking".to_string(),
            "--password-store=basic".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
            args.push("--hide-scrollbars".to_string());
        }
        args.extend(self.args.iter().cloned());
        builder = builder.args(args);
        builder
            .build()
            .map_err(|err| AutomationError::Driver(format!("browser config error: {err}")))
    }
}

#[derive(Default)]
struct Session {
    pages: Vec<Page>,
    current: usize,
    frames: Vec<String>,
}

pub struct ChromiumAutomation {
    browser: tokio::sync::Mutex<Browser>,
    handler: Mutex<Option<JoinHandle<()>>>,
    session: Mutex<Session>,
    attached: bool,
    stealth: bool,
    request_timeout: Duration,
    next_ref: AtomicU64,
    closed: AtomicBool,
}

impl ChromiumAutomation {
    /// Launch a fresh browser process.
    #[instrument(skip_all, fields(headless = config.headless))]
    pub async fn launch(config: &ChromiumConfig) -> AutomationResult<Self> {
        let (browser, handler) = Browser::launch(config.browser_config()?)
            .await
            .map_err(|err| AutomationError::Driver(format!("failed to launch chromium: {err}")))?;
        let mut automation = Self::from_parts(browser, handler, false, config.request_timeout);
        automation.stealth = config.stealth;
        automation.adopt_pages().await?;
        info!("chromium launched");
        Ok(automation)
    }

    /// Attach to a browser started with `--remote-debugging-port`.
    ///
    /// `address` is `host:port`, an `http://` endpoint or a `ws://` URL.
    #[instrument(skip_all, fields(address = %address))]
    pub async fn connect(address: &str, request_timeout: Duration) -> AutomationResult<Self> {
        let url = if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{address}")
        };
        let (mut browser, handler) = Browser::connect(url)
            .await
            .map_err(|err| AutomationError::Driver(format!("failed to attach to {address}: {err}")))?;
        if let Err(err) = browser.fetch_targets().await {
            warn!(?err, "could not list existing targets");
        }
        let automation = Self::from_parts(browser, handler, true, request_timeout);
        // attached targets show up asynchronously
        tokio::time::sleep(Duration::from_millis(300)).await;
        automation.adopt_pages().await?;
        info!("attached to running chromium");
        Ok(automation)
    }

    fn from_parts(
        browser: Browser,
        mut handler: chromiumoxide::Handler,
        attached: bool,
        request_timeout: Duration,
    ) -> Self {
        let task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(?err, "cdp handler error");
                }
            }
        });
        Self {
            browser: tokio::sync::Mutex::new(browser),
            handler: Mutex::new(Some(task)),
            session: Mutex::new(Session::default()),
            attached,
            stealth: false,
            request_timeout,
            next_ref: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    async fn adopt_pages(&self) -> AutomationResult<()> {
        if self.refresh_pages().await?.is_empty() {
            let page = self
                .browser
                .lock()
                .await
                .new_page("about:blank")
                .await
                .map_err(driver_err)?;
            self.harden(&page).await;
            let mut session = self.session.lock();
            session.pages.push(page);
            session.current = session.pages.len() - 1;
        }
        Ok(())
    }

    /// Install the stealth overrides for future documents and the current one.
    async fn harden(&self, page: &Page) {
        if !self.stealth {
            return;
        }
        let install = AddScriptToEvaluateOnNewDocumentParams::new(script::STEALTH_OVERRIDES);
        if let Err(err) = page.execute(install).await {
            warn!(?err, "could not install stealth overrides");
            return;
        }
        if let Err(err) = self
            .evaluate_on(page, script::STEALTH_OVERRIDES.to_string(), true)
            .await
        {
            debug!(error = %err, "stealth overrides not applied to the current document");
        }
    }

    /// Merge the browser's page list into ours, keeping first-seen order.
    async fn refresh_pages(&self) -> AutomationResult<Vec<Page>> {
        let live = self.browser.lock().await.pages().await.map_err(driver_err)?;
        let (pages, fresh) = self.merge_pages(live);
        for page in &fresh {
            self.harden(page).await;
        }
        Ok(pages)
    }

    /// Returns the merged list and the pages seen for the first time.
    fn merge_pages(&self, live: Vec<Page>) -> (Vec<Page>, Vec<Page>) {
        let mut fresh = Vec::new();
        let mut session = self.session.lock();
        let current_id = session
            .pages
            .get(session.current)
            .map(|page| page.target_id().clone());
        session
            .pages
            .retain(|known| live.iter().any(|page| page.target_id() == known.target_id()));
        for page in live {
            if !session
                .pages
                .iter()
                .any(|known| known.target_id() == page.target_id())
            {
                fresh.push(page.clone());
                session.pages.push(page);
            }
        }
        session.current = current_id
            .and_then(|id| session.pages.iter().position(|page| *page.target_id() == id))
            .unwrap_or_else(|| session.pages.len().saturating_sub(1));
        (session.pages.clone(), fresh)
    }

    fn current(&self) -> AutomationResult<(Page, Vec<String>)> {
        let session = self.session.lock();
        let page = session
            .pages
            .get(session.current)
            .cloned()
            .ok_or_else(|| AutomationError::Driver("no open window".to_string()))?;
        Ok((page, session.frames.clone()))
    }

    fn next_ref(&self) -> String {
        format!("sbx-{}", self.next_ref.fetch_add(1, Ordering::Relaxed) + 1)
    }

    async fn evaluate_on(
        &self,
        page: &Page,
        expression: String,
        by_value: bool,
    ) -> AutomationResult<EvaluateReturns> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .return_by_value(by_value)
            .await_promise(true)
            .build()
            .map_err(AutomationError::Driver)?;
        let response = page.execute(params).await.map_err(driver_err)?;
        let returns = response.result;
        if let Some(details) = &returns.exception_details {
            let message = details
                .exception
                .as_ref()
                .and_then(|object| object.description.clone())
                .unwrap_or_else(|| details.text.clone());
            return Err(AutomationError::Driver(format!("javascript error: {message}")));
        }
        Ok(returns)
    }

    /// Run a body from [`script`] in the current frame context.
    async fn eval(&self, body: &str) -> AutomationResult<Value> {
        let (page, frames) = self.current()?;
        let returns = self
            .evaluate_on(&page, script::wrap(&frames, body), true)
            .await?;
        match returns.result.value {
            Some(Value::String(raw)) => script::parse_outcome(&raw),
            other => Err(AutomationError::Driver(format!(
                "unexpected script result: {other:?}"
            ))),
        }
    }

    async fn eval_as<T: serde::de::DeserializeOwned>(&self, body: &str) -> AutomationResult<T> {
        let value = self.eval(body).await?;
        serde_json::from_value(value)
            .map_err(|err| AutomationError::Driver(format!("unexpected script value: {err}")))
    }

    async fn point_of(&self, target: &ElementRef) -> AutomationResult<Point> {
        self.eval_as(&script::interaction_point(&target.id)).await
    }

    async fn click(&self, target: &ElementRef, button: MouseButton, clicks: i64) -> AutomationResult<()> {
        let at = self.point_of(target).await?;
        let (page, _) = self.current()?;
        input::click(&page, at, button, clicks).await
    }

    async fn wait_navigation(&self, page: &Page) {
        match tokio::time::timeout(self.request_timeout, page.wait_for_navigation()).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => debug!(?err, "navigation wait failed"),
            Err(_) => debug!("navigation wait timed out"),
        }
    }

    async fn history_step(&self, delta: i64) -> AutomationResult<()> {
        let (page, _) = self.current()?;
        let history = page
            .execute(GetNavigationHistoryParams::default())
            .await
            .map_err(driver_err)?;
        let target = history.result.current_index + delta;
        let Some(entry) = usize::try_from(target)
            .ok()
            .and_then(|index| history.result.entries.get(index))
        else {
            debug!(delta, "no history entry in that direction");
            return Ok(());
        };
        page.execute(NavigateToHistoryEntryParams::new(entry.id))
            .await
            .map_err(driver_err)?;
        self.wait_navigation(&page).await;
        Ok(())
    }

    async fn window_op(&self, op: WindowOp) -> AutomationResult<()> {
        let (page, _) = self.current()?;
        let mut lookup = GetWindowForTargetParams::default();
        lookup.target_id = Some(page.target_id().clone());
        let window = page.execute(lookup).await.map_err(driver_err)?;
        let window_id = window.result.window_id.clone();
        let bounds = match op {
            WindowOp::Maximize => Bounds {
                window_state: Some(WindowState::Maximized),
                ..Default::default()
            },
            WindowOp::Minimize => Bounds {
                window_state: Some(WindowState::Minimized),
                ..Default::default()
            },
            WindowOp::Resize { width, height } => {
                // bounds cannot change while maximized/minimized
                page.execute(SetWindowBoundsParams::new(
                    window_id.clone(),
                    Bounds {
                        window_state: Some(WindowState::Normal),
                        ..Default::default()
                    },
                ))
                .await
                .map_err(driver_err)?;
                Bounds {
                    width: Some(i64::from(width)),
                    height: Some(i64::from(height)),
                    ..Default::default()
                }
            }
        };
        page.execute(SetWindowBoundsParams::new(window_id, bounds))
            .await
            .map_err(driver_err)?;
        Ok(())
    }

    async fn upload(&self, target: &ElementRef, path: &Path) -> AutomationResult<()> {
        if !path.exists() {
            return Err(AutomationError::InvalidArgument(format!(
                "file not found: {}",
                path.display()
            )));
        }
        self.eval(&script::check_file_input(&target.id)).await?;
        let (page, frames) = self.current()?;
        let returns = self
            .evaluate_on(&page, script::element_object(&frames, &target.id), false)
            .await?;
        let object_id = returns.result.object_id.ok_or_else(|| {
            AutomationError::Driver("file input has no remote object".to_string())
        })?;
        let mut params = SetFileInputFilesParams::new(vec![path.display().to_string()]);
        params.object_id = Some(object_id);
        page.execute(params).await.map_err(driver_err)?;
        Ok(())
    }
}

#[async_trait]
impl Automation for ChromiumAutomation {
    async fn locate(&self, locator: &Locator) -> AutomationResult<ElementRef> {
        let candidate = self.next_ref();
        let id: String = self.eval_as(&script::locate(locator, &candidate)).await?;
        debug!(locator = %locator, id = %id, "element located");
        Ok(ElementRef::new(id, locator.clone()))
    }

    async fn navigate(&self, navigation: Navigation) -> AutomationResult<()> {
        match navigation {
            Navigation::Goto(url) => {
                let (page, _) = self.current()?;
                page.goto(url.as_str()).await.map_err(driver_err)?;
            }
            Navigation::Back => self.history_step(-1).await?,
            Navigation::Forward => self.history_step(1).await?,
            Navigation::Refresh => {
                let (page, _) = self.current()?;
                page.reload().await.map_err(driver_err)?;
            }
        }
        self.session.lock().frames.clear();
        Ok(())
    }

    async fn wait_for(&self, condition: &WaitCondition, timeout: Duration) -> AutomationResult<()> {
        let describe = format!("{condition:?}");
        match script::probe(condition) {
            Some(body) => {
                poll_until(timeout, DEFAULT_POLL_INTERVAL, &describe, || {
                    let body = body.as_str();
                    async move { self.eval_as::<bool>(body).await }
                })
                .await
            }
            None => {
                poll_until(timeout, DEFAULT_POLL_INTERVAL, &describe, || async {
                    let (page, _) = self.current()?;
                    let holds = match condition {
                        WaitCondition::UrlContains(fragment) => page
                            .url()
                            .await
                            .map_err(driver_err)?
                            .is_some_and(|url| url.contains(fragment.as_str())),
                        WaitCondition::TitleContains(fragment) => page
                            .get_title()
                            .await
                            .map_err(driver_err)?
                            .is_some_and(|title| title.contains(fragment.as_str())),
                        _ => false,
                    };
                    Ok(holds)
                })
                .await
            }
        }
    }

    #[instrument(skip_all, fields(action = action.name()))]
    async fn perform(&self, action: Action) -> AutomationResult<()> {
        match action {
            Action::Click(target) => self.click(&target, MouseButton::Left, 1).await,
            Action::ContextClick(target) => self.click(&target, MouseButton::Right, 1).await,
            Action::DoubleClick(target) => self.click(&target, MouseButton::Left, 2).await,
            Action::Hover(target) => {
                let at = self.point_of(&target).await?;
                let (page, _) = self.current()?;
                input::move_to(&page, at).await
            }
            Action::ScriptClick(target) => {
                self.eval(&script::script_click(&target.id)).await.map(drop)
            }
            Action::Clear(target) => self.eval(&script::clear(&target.id)).await.map(drop),
            Action::TypeText { target, text } => {
                self.eval(&script::focus(&target.id)).await?;
                let (page, _) = self.current()?;
                input::type_text(&page, &text).await
            }
            Action::SendKeys { target, keys } => {
                if let Some(target) = target {
                    self.eval(&script::focus(&target.id)).await?;
                }
                let (page, _) = self.current()?;
                input::send_keys(&page, &keys).await
            }
            Action::SetContent { target, text, mode } => self
                .eval(&script::set_content(
                    &target.id,
                    &text,
                    mode == ContentMode::Value,
                ))
                .await
                .map(drop),
            Action::DragAndDrop { source, target } => {
                let from = self.point_of(&source).await?;
                let to = self.point_of(&target).await?;
                let (page, _) = self.current()?;
                input::drag(&page, from, to).await
            }
            Action::DragBy { target, dx, dy } => {
                let from = self.point_of(&target).await?;
                let to = Point {
                    x: from.x + dx as f64,
                    y: from.y + dy as f64,
                };
                let (page, _) = self.current()?;
                input::drag(&page, from, to).await
            }
            Action::Select { target, by } => {
                self.eval(&script::select(&target.id, &by)).await.map(drop)
            }
            Action::Upload { target, path } => self.upload(&target, &path).await,
            Action::ScrollIntoView { target, block } => self
                .eval(&script::scroll_into_view(&target.id, block))
                .await
                .map(drop),
            Action::ScrollBy { dx, dy } => self.eval(&script::scroll_by(dx, dy)).await.map(drop),
            Action::ScrollTo(edge) => self.eval(&script::scroll_to(edge)).await.map(drop),
            Action::Window(op) => self.window_op(op).await,
        }
    }

    async fn read(&self, query: Query) -> AutomationResult<Option<String>> {
        let value = match query {
            Query::Text(target) => self.eval(&script::read_text(&target.id)).await?,
            Query::Attribute { target, name } => {
                self.eval(&script::read_attribute(&target.id, &name)).await?
            }
            Query::Url => {
                let (page, _) = self.current()?;
                return page.url().await.map_err(driver_err);
            }
            Query::Title => {
                let (page, _) = self.current()?;
                return page.get_title().await.map_err(driver_err);
            }
        };
        Ok(match value {
            Value::Null => None,
            Value::String(text) => Some(text),
            other => Some(other.to_string()),
        })
    }

    async fn set_cookie(&self, cookie: Cookie) -> AutomationResult<()> {
        let (page, _) = self.current()?;
        let mut param = CookieParam::new(cookie.name, cookie.value);
        param.domain = cookie.domain;
        param.path = cookie.path;
        page.set_cookie(param).await.map_err(driver_err)?;
        Ok(())
    }

    async fn get_cookie(&self, name: &str) -> AutomationResult<Option<Cookie>> {
        let (page, _) = self.current()?;
        let cookies = page.get_cookies().await.map_err(driver_err)?;
        Ok(cookies
            .into_iter()
            .find(|cookie| cookie.name == name)
            .map(|cookie| Cookie {
                name: cookie.name,
                value: cookie.value,
                domain: Some(cookie.domain),
                path: Some(cookie.path),
            }))
    }

    async fn delete_cookie(&self, name: &str) -> AutomationResult<()> {
        let (page, _) = self.current()?;
        page.delete_cookie(DeleteCookiesParams::new(name))
            .await
            .map_err(driver_err)?;
        Ok(())
    }

    async fn clear_cookies(&self) -> AutomationResult<()> {
        let (page, _) = self.current()?;
        page.execute(ClearBrowserCookiesParams::default())
            .await
            .map_err(driver_err)?;
        Ok(())
    }

    async fn switch_frame(&self, target: FrameTarget) -> AutomationResult<()> {
        let entered = match target {
            FrameTarget::Element(element) => {
                Some(self.eval_as::<String>(&script::frame_by_ref(&element.id)).await?)
            }
            FrameTarget::Index(index) => {
                let candidate = self.next_ref();
                Some(
                    self.eval_as::<String>(&script::frame_by_index(index, &candidate))
                        .await?,
                )
            }
            FrameTarget::Parent => {
                self.session.lock().frames.pop();
                None
            }
            FrameTarget::Default => {
                self.session.lock().frames.clear();
                None
            }
        };
        if let Some(id) = entered {
            self.session.lock().frames.push(id);
        }
        Ok(())
    }

    async fn windows(&self) -> AutomationResult<Vec<WindowHandle>> {
        let pages = self.refresh_pages().await?;
        Ok(pages
            .iter()
            .map(|page| WindowHandle(page.target_id().as_ref().to_string()))
            .collect())
    }

    async fn switch_window(&self, handle: &WindowHandle) -> AutomationResult<()> {
        let pages = self.refresh_pages().await?;
        let index = pages
            .iter()
            .position(|page| page.target_id().as_ref() == handle.0.as_str())
            .ok_or_else(|| AutomationError::InvalidArgument(format!("no such window {handle}")))?;
        pages[index]
            .execute(BringToFrontParams::default())
            .await
            .map_err(driver_err)?;
        let mut session = self.session.lock();
        session.current = index;
        session.frames.clear();
        Ok(())
    }

    async fn close_window(&self) -> AutomationResult<()> {
        let (page, _) = self.current()?;
        page.close().await.map_err(driver_err)?;
        {
            let mut session = self.session.lock();
            let current = session.current;
            if current < session.pages.len() {
                session.pages.remove(current);
            }
            session.current = session.pages.len().saturating_sub(1);
            session.frames.clear();
        }
        Ok(())
    }

    async fn capture_screenshot(
        &self,
        target: Option<&ElementRef>,
        path: &Path,
    ) -> AutomationResult<()> {
        let mut params = ScreenshotParams::builder().format(CaptureScreenshotFormat::Png);
        if let Some(element) = target {
            let clip: Clip = self.eval_as(&script::element_clip(&element.id)).await?;
            params = params.clip(Viewport {
                x: clip.x,
                y: clip.y,
                width: clip.width,
                height: clip.height,
                scale: 1.0,
            });
        }
        let (page, _) = self.current()?;
        let bytes = page.screenshot(params.build()).await.map_err(driver_err)?;
        tokio::fs::write(path, bytes).await.map_err(|err| {
            AutomationError::InvalidArgument(format!("cannot write {}: {err}", path.display()))
        })?;
        Ok(())
    }

    async fn run_script(&self, source: &str) -> AutomationResult<Value> {
        self.eval(&script::user_function(source)).await
    }

    async fn shutdown(&self) -> AutomationResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut result = Ok(());
        if self.attached {
            info!("detaching from chromium");
        } else {
            let mut browser = self.browser.lock().await;
            if let Err(err) = browser.close().await {
                warn!(?err, "browser close failed");
                result = Err(driver_err(err));
            }
            if let Err(err) = browser.wait().await {
                debug!(?err, "browser process wait failed");
            }
        }
        if let Some(task) = self.handler.lock().take() {
            task.abort();
        }
        result
    }
}
