use soulscript_core_types::{ContentMode, FrameTarget, Navigation, ScrollEdge, WindowOp};

use crate::context::ExecutionContext;
use crate::fault::Fault;
use crate::handlers::element::ElementAction;
use crate::handlers::waits::ElementWait;
use crate::handlers::{assertions, cookies, element, navigation, page, session, text, waits};
use crate::registry::Handler;

/// Run one normalized command against the context.
pub async fn dispatch(
    handler: Handler,
    args: &[String],
    ctx: &mut ExecutionContext,
) -> Result<(), Fault> {
    match handler {
        Handler::Click => element::single(ctx, ElementAction::Click, args).await,
        Handler::RightClick => element::single(ctx, ElementAction::ContextClick, args).await,
        Handler::DoubleClick => element::single(ctx, ElementAction::DoubleClick, args).await,
        Handler::Hover => element::single(ctx, ElementAction::Hover, args).await,
        Handler::ScriptClick => element::single(ctx, ElementAction::ScriptClick, args).await,
        Handler::Clear => element::single(ctx, ElementAction::Clear, args).await,
        Handler::Write => text::write(ctx, args).await,
        Handler::SendKeys => text::send_keys(ctx, args).await,
        Handler::Press => text::press(ctx, args).await,
        Handler::WriteEditable => text::set_content(ctx, ContentMode::Editable, args).await,
        Handler::WriteValue => text::set_content(ctx, ContentMode::Value, args).await,
        Handler::DragDrop => element::drag_drop(ctx, args).await,
        Handler::DragOffset => element::drag_offset(ctx, args).await,
        Handler::Goto => navigation::goto(ctx, args).await,
        Handler::Back => navigation::history(ctx, Navigation::Back).await,
        Handler::Forward => navigation::history(ctx, Navigation::Forward).await,
        Handler::Refresh => navigation::history(ctx, Navigation::Refresh).await,
        Handler::Maximize => navigation::window_state(ctx, WindowOp::Maximize).await,
        Handler::Minimize => navigation::window_state(ctx, WindowOp::Minimize).await,
        Handler::SetWindow => navigation::set_window(ctx, args).await,
        Handler::Frame => navigation::frame(ctx, args).await,
        Handler::FrameIndex => navigation::frame_index(ctx, args).await,
        Handler::FrameParent => navigation::switch_frame(ctx, FrameTarget::Parent).await,
        Handler::FrameDefault => navigation::switch_frame(ctx, FrameTarget::Default).await,
        Handler::WindowLatest => navigation::window_latest(ctx).await,
        Handler::WindowIndex => navigation::window_index(ctx, args).await,
        Handler::WindowClose => navigation::window_close(ctx).await,
        Handler::WaitPresent => waits::element(ctx, ElementWait::Present, args).await,
        Handler::WaitVisible => waits::element(ctx, ElementWait::Visible, args).await,
        Handler::WaitClickable => waits::element(ctx, ElementWait::Clickable, args).await,
        Handler::WaitInvisible => waits::element(ctx, ElementWait::Invisible, args).await,
        Handler::WaitText => waits::text(ctx, args).await,
        Handler::WaitUrlContains => waits::url_contains(ctx, args).await,
        Handler::WaitTitleContains => waits::title_contains(ctx, args).await,
        Handler::ScrollIntoView => page::scroll_into_view(ctx, args).await,
        Handler::ScrollBy => page::scroll_by(ctx, args).await,
        Handler::ScrollTop => page::scroll_to(ctx, ScrollEdge::Top).await,
        Handler::ScrollBottom => page::scroll_to(ctx, ScrollEdge::Bottom).await,
        Handler::Select => element::select(ctx, args).await,
        Handler::Upload => element::upload(ctx, args).await,
        Handler::Screenshot => page::screenshot(ctx, args).await,
        Handler::ScreenshotElement => page::screenshot_element(ctx, args).await,
        Handler::ExecJs => page::exec_js(ctx, args).await,
        Handler::AssertText => assertions::assert_text(ctx, args).await,
        Handler::AssertUrlContains => assertions::assert_url_contains(ctx, args).await,
        Handler::AssertTitleContains => assertions::assert_title_contains(ctx, args).await,
        Handler::PrintText => assertions::print_text(ctx, args).await,
        Handler::PrintAttr => assertions::print_attr(ctx, args).await,
        Handler::Echo => assertions::echo(ctx, args),
        Handler::CookieSet => cookies::set(ctx, args).await,
        Handler::CookiesSet => cookies::set_many(ctx, args).await,
        Handler::CookieGet => cookies::get(ctx, args).await,
        Handler::CookieDelete => cookies::delete(ctx, args).await,
        Handler::CookieClear => cookies::clear(ctx).await,
        Handler::Sleep => session::sleep(args).await,
        Handler::Pause => session::pause(ctx).await,
        Handler::KeepOpen => session::keep_open(ctx),
        Handler::SetVar => session::set_var(ctx, args),
    }
}
