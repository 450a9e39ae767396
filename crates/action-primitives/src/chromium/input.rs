//! Trusted mouse and keyboard input through `Input.dispatch*Event`.

use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, MouseButton,
};
use chromiumoxide::Page;
use soulscript_core_types::{KeyInput, KeySymbol};

use super::script::Point;
use super::driver_err;
use crate::errors::{AutomationError, AutomationResult};

const MOD_ALT: i64 = 1;
const MOD_CTRL: i64 = 2;
const MOD_META: i64 = 4;
const MOD_SHIFT: i64 = 8;

struct KeyDefinition {
    key: &'static str,
    code: &'static str,
    key_code: i64,
    text: Option<&'static str>,
}

fn definition(symbol: KeySymbol) -> KeyDefinition {
    let (key, code, key_code, text) = match symbol {
        KeySymbol::Enter => ("Enter", "Enter", 13, Some("\r")),
        KeySymbol::Tab => ("Tab", "Tab", 9, None),
        KeySymbol::Escape => ("Escape", "Escape", 27, None),
        KeySymbol::Space => (" ", "Space", 32, Some(" ")),
        KeySymbol::Backspace => ("Backspace", "Backspace", 8, None),
        KeySymbol::Delete => ("Delete", "Delete", 46, None),
        KeySymbol::Home => ("Home", "Home", 36, None),
        KeySymbol::End => ("End", "End", 35, None),
        KeySymbol::PageUp => ("PageUp", "PageUp", 33, None),
        KeySymbol::PageDown => ("PageDown", "PageDown", 34, None),
        KeySymbol::ArrowLeft => ("ArrowLeft", "ArrowLeft", 37, None),
        KeySymbol::ArrowUp => ("ArrowUp", "ArrowUp", 38, None),
        KeySymbol::ArrowRight => ("ArrowRight", "ArrowRight", 39, None),
        KeySymbol::ArrowDown => ("ArrowDown", "ArrowDown", 40, None),
        KeySymbol::Control => ("Control", "ControlLeft", 17, None),
        KeySymbol::Shift => ("Shift", "ShiftLeft", 16, None),
        KeySymbol::Alt => ("Alt", "AltLeft", 18, None),
        KeySymbol::Command | KeySymbol::Meta => ("Meta", "MetaLeft", 91, None),
    };
    KeyDefinition {
        key,
        code,
        key_code,
        text,
    }
}

fn modifier_bit(symbol: KeySymbol) -> i64 {
    match symbol {
        KeySymbol::Alt => MOD_ALT,
        KeySymbol::Control => MOD_CTRL,
        KeySymbol::Command | KeySymbol::Meta => MOD_META,
        KeySymbol::Shift => MOD_SHIFT,
        _ => 0,
    }
}

/// Editing command Chromium needs alongside a shortcut; key events alone do
/// not trigger them.
fn shortcut_command(ch: char) -> Option<&'static str> {
    match ch.to_ascii_lowercase() {
        'a' => Some("selectAll"),
        'c' => Some("copy"),
        'v' => Some("paste"),
        'x' => Some("cut"),
        'z' => Some("undo"),
        'y' => Some("redo"),
        _ => None,
    }
}

fn key_params(
    kind: DispatchKeyEventType,
    key: &str,
    code: &str,
    key_code: i64,
    text: Option<&str>,
    modifiers: i64,
) -> AutomationResult<DispatchKeyEventParams> {
    let mut params = DispatchKeyEventParams::builder()
        .r#type(kind)
        .key(key)
        .code(code)
        .windows_virtual_key_code(key_code)
        .native_virtual_key_code(key_code)
        .modifiers(modifiers)
        .build()
        .map_err(AutomationError::Driver)?;
    if let Some(text) = text {
        params.text = Some(text.to_string());
        params.unmodified_text = Some(text.to_string());
    }
    Ok(params)
}

async fn dispatch_key(page: &Page, params: DispatchKeyEventParams) -> AutomationResult<()> {
    page.execute(params).await.map_err(driver_err)?;
    Ok(())
}

async fn tap_symbol(page: &Page, symbol: KeySymbol, modifiers: i64) -> AutomationResult<()> {
    let def = definition(symbol);
    let text = if modifiers & (MOD_CTRL | MOD_ALT | MOD_META) == 0 {
        def.text
    } else {
        None
    };
    let down = if text.is_some() {
        DispatchKeyEventType::KeyDown
    } else {
        DispatchKeyEventType::RawKeyDown
    };
    dispatch_key(
        page,
        key_params(down, def.key, def.code, def.key_code, text, modifiers)?,
    )
    .await?;
    dispatch_key(
        page,
        key_params(
            DispatchKeyEventType::KeyUp,
            def.key,
            def.code,
            def.key_code,
            None,
            modifiers,
        )?,
    )
    .await
}

async fn tap_char(page: &Page, ch: char, modifiers: i64) -> AutomationResult<()> {
    let key = ch.to_string();
    let (code, key_code) = if ch.is_ascii_alphabetic() {
        let upper = ch.to_ascii_uppercase();
        (format!("Key{upper}"), upper as i64)
    } else if ch.is_ascii_digit() {
        (format!("Digit{ch}"), ch as i64)
    } else {
        (String::new(), 0)
    };

    let chorded = modifiers & (MOD_CTRL | MOD_ALT | MOD_META) != 0;
    if chorded {
        let mut down = key_params(
            DispatchKeyEventType::RawKeyDown,
            &key,
            &code,
            key_code,
            None,
            modifiers,
        )?;
        if modifiers & (MOD_CTRL | MOD_META) != 0 {
            if let Some(command) = shortcut_command(ch) {
                down.commands = Some(vec![command.to_string()]);
            }
        }
        dispatch_key(page, down).await?;
    } else {
        dispatch_key(
            page,
            key_params(
                DispatchKeyEventType::KeyDown,
                &key,
                &code,
                key_code,
                Some(&key),
                modifiers,
            )?,
        )
        .await?;
    }
    dispatch_key(
        page,
        key_params(
            DispatchKeyEventType::KeyUp,
            &key,
            &code,
            key_code,
            None,
            modifiers,
        )?,
    )
    .await
}

/// Type `text` one character at a time into the focused element.
pub(crate) async fn type_text(page: &Page, text: &str) -> AutomationResult<()> {
    for ch in text.chars() {
        tap_char(page, ch, 0).await?;
    }
    Ok(())
}

/// Send a key sequence; modifiers stay held until the sequence ends.
pub(crate) async fn send_keys(page: &Page, keys: &[KeyInput]) -> AutomationResult<()> {
    let mut held: Vec<KeySymbol> = Vec::new();
    let mut modifiers = 0i64;
    let mut result = Ok(());

    for input in keys {
        let step = match input {
            KeyInput::Key(symbol) if symbol.is_modifier() => {
                if held.contains(symbol) {
                    Ok(())
                } else {
                    let def = definition(*symbol);
                    modifiers |= modifier_bit(*symbol);
                    held.push(*symbol);
                    let params = key_params(
                        DispatchKeyEventType::RawKeyDown,
                        def.key,
                        def.code,
                        def.key_code,
                        None,
                        modifiers,
                    )?;
                    dispatch_key(page, params).await
                }
            }
            KeyInput::Key(symbol) => tap_symbol(page, *symbol, modifiers).await,
            KeyInput::Text(text) => {
                let mut step = Ok(());
                for ch in text.chars() {
                    step = tap_char(page, ch, modifiers).await;
                    if step.is_err() {
                        break;
                    }
                }
                step
            }
        };
        if step.is_err() {
            result = step;
            break;
        }
    }

    // release in reverse order even when a key failed midway
    for symbol in held.into_iter().rev() {
        modifiers &= !modifier_bit(symbol);
        let def = definition(symbol);
        let params = key_params(
            DispatchKeyEventType::KeyUp,
            def.key,
            def.code,
            def.key_code,
            None,
            modifiers,
        )?;
        let released = dispatch_key(page, params).await;
        if result.is_ok() {
            result = released;
        }
    }
    result
}

fn mouse_params(
    kind: DispatchMouseEventType,
    at: Point,
    button: MouseButton,
    click_count: i64,
) -> AutomationResult<DispatchMouseEventParams> {
    DispatchMouseEventParams::builder()
        .r#type(kind)
        .x(at.x)
        .y(at.y)
        .button(button)
        .click_count(click_count)
        .build()
        .map_err(AutomationError::Driver)
}

pub(crate) async fn move_to(page: &Page, at: Point) -> AutomationResult<()> {
    page.execute(mouse_params(
        DispatchMouseEventType::MouseMoved,
        at,
        MouseButton::None,
        0,
    )?)
    .await
    .map_err(driver_err)?;
    Ok(())
}

pub(crate) async fn press(page: &Page, at: Point, button: MouseButton, count: i64) -> AutomationResult<()> {
    page.execute(mouse_params(
        DispatchMouseEventType::MousePressed,
        at,
        button,
        count,
    )?)
    .await
    .map_err(driver_err)?;
    Ok(())
}

pub(crate) async fn release(page: &Page, at: Point, button: MouseButton, count: i64) -> AutomationResult<()> {
    page.execute(mouse_params(
        DispatchMouseEventType::MouseReleased,
        at,
        button,
        count,
    )?)
    .await
    .map_err(driver_err)?;
    Ok(())
}

/// Move, press and release; `clicks` of 2 emits the double-click sequence.
pub(crate) async fn click(page: &Page, at: Point, button: MouseButton, clicks: i64) -> AutomationResult<()> {
    move_to(page, at).await?;
    for count in 1..=clicks {
        press(page, at, button.clone(), count).await?;
        release(page, at, button.clone(), count).await?;
    }
    Ok(())
}

/// Press at `from`, glide to `to` in a few steps, release.
pub(crate) async fn drag(page: &Page, from: Point, to: Point) -> AutomationResult<()> {
    const STEPS: u32 = 8;
    move_to(page, from).await?;
    press(page, from, MouseButton::Left, 1).await?;
    for step in 1..=STEPS {
        let t = f64::from(step) / f64::from(STEPS);
        let at = Point {
            x: from.x + (to.x - from.x) * t,
            y: from.y + (to.y - from.y) * t,
        };
        page.execute(mouse_params(
            DispatchMouseEventType::MouseMoved,
            at,
            MouseButton::Left,
            0,
        )?)
        .await
        .map_err(driver_err)?;
    }
    release(page, to, MouseButton::Left, 1).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_bits_match_devtools_mask() {
        assert_eq!(modifier_bit(KeySymbol::Alt), 1);
        assert_eq!(modifier_bit(KeySymbol::Control), 2);
        assert_eq!(modifier_bit(KeySymbol::Meta), 4);
        assert_eq!(modifier_bit(KeySymbol::Command), 4);
        assert_eq!(modifier_bit(KeySymbol::Shift), 8);
        assert_eq!(modifier_bit(KeySymbol::Enter), 0);
    }

    #[test]
    fn enter_produces_carriage_return() {
        let def = definition(KeySymbol::Enter);
        assert_eq!(def.text, Some("\r"));
        assert_eq!(def.key_code, 13);
    }

    #[test]
    fn shortcut_commands_cover_combo_letters() {
        for (ch, command) in [('a', "selectAll"), ('C', "copy"), ('v', "paste"), ('z', "undo")] {
            assert_eq!(shortcut_command(ch), Some(command));
        }
        assert_eq!(shortcut_command('q'), None);
    }
}
