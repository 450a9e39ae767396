//! Key-token parsing for `press` and `send_keys`

use std::collections::HashMap;

use once_cell::sync::Lazy;
use soulscript_core_types::{KeyInput, KeySymbol};

use crate::fault::Fault;

static KEYS: Lazy<HashMap<&'static str, KeySymbol>> = Lazy::new(|| {
    HashMap::from([
        ("ENTER", KeySymbol::Enter),
        ("TAB", KeySymbol::Tab),
        ("ESC", KeySymbol::Escape),
        ("ESCAPE", KeySymbol::Escape),
        ("SPACE", KeySymbol::Space),
        ("BACKSPACE", KeySymbol::Backspace),
        ("DELETE", KeySymbol::Delete),
        ("HOME", KeySymbol::Home),
        ("END", KeySymbol::End),
        ("PAGE_UP", KeySymbol::PageUp),
        ("PAGE_DOWN", KeySymbol::PageDown),
        ("LEFT", KeySymbol::ArrowLeft),
        ("RIGHT", KeySymbol::ArrowRight),
        ("UP", KeySymbol::ArrowUp),
        ("DOWN", KeySymbol::ArrowDown),
        ("CTRL", KeySymbol::Control),
        ("SHIFT", KeySymbol::Shift),
        ("ALT", KeySymbol::Alt),
        ("CMD", KeySymbol::Command),
        ("META", KeySymbol::Meta),
    ])
});

const COMBO_LETTERS: [(&str, char); 7] = [
    ("CTRL_A", 'a'),
    ("CTRL_C", 'c'),
    ("CTRL_V", 'v'),
    ("CTRL_X", 'x'),
    ("CTRL_S", 's'),
    ("CTRL_Z", 'z'),
    ("CTRL_Y", 'y'),
];

static COMBOS: Lazy<HashMap<&'static str, [KeyInput; 2]>> = Lazy::new(|| {
    COMBO_LETTERS
        .iter()
        .map(|(name, letter)| {
            (
                *name,
                [
                    KeyInput::Key(KeySymbol::Control),
                    KeyInput::Text(letter.to_string()),
                ],
            )
        })
        .collect()
});

/// Symbolic names accepted inside `{...}`, for listings
pub fn key_names() -> Vec<&'static str> {
    let mut names: Vec<_> = KEYS.keys().chain(COMBOS.keys()).copied().collect();
    names.sort_unstable();
    names
}

/// Translate one script token into key inputs.
///
/// `{NAME}` looks `NAME` up case-insensitively among keys, then combos. A bare
/// combo name (`ctrl_a`) expands too. Anything else is typed literally.
pub fn parse_key_token(token: &str) -> Result<Vec<KeyInput>, Fault> {
    if token.len() >= 3 && token.starts_with('{') && token.ends_with('}') {
        let name = token[1..token.len() - 1].to_ascii_uppercase();
        if let Some(symbol) = KEYS.get(name.as_str()) {
            return Ok(vec![KeyInput::Key(*symbol)]);
        }
        if let Some(combo) = COMBOS.get(name.as_str()) {
            return Ok(combo.to_vec());
        }
        return Err(Fault::UnknownKeySymbol(token.to_string()));
    }
    if let Some(combo) = COMBOS.get(token.to_ascii_uppercase().as_str()) {
        return Ok(combo.to_vec());
    }
    Ok(vec![KeyInput::Text(token.to_string())])
}

/// Parse a whole argument list; text tokens stay separate inputs.
pub fn parse_key_sequence(tokens: &[String]) -> Result<Vec<KeyInput>, Fault> {
    let mut keys = Vec::with_capacity(tokens.len());
    for token in tokens {
        keys.extend(parse_key_token(token)?);
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn braced_names_are_case_insensitive() {
        assert_eq!(
            parse_key_token("{enter}").unwrap(),
            vec![KeyInput::Key(KeySymbol::Enter)]
        );
        assert_eq!(
            parse_key_token("{Page_Down}").unwrap(),
            vec![KeyInput::Key(KeySymbol::PageDown)]
        );
    }

    #[test]
    fn braced_combo_expands() {
        assert_eq!(
            parse_key_token("{ctrl_a}").unwrap(),
            vec![
                KeyInput::Key(KeySymbol::Control),
                KeyInput::Text("a".into())
            ]
        );
    }

    #[test]
    fn bare_combo_expands_but_bare_key_is_text() {
        assert_eq!(parse_key_token("Ctrl_V").unwrap().len(), 2);
        assert_eq!(
            parse_key_token("ENTER").unwrap(),
            vec![KeyInput::Text("ENTER".into())]
        );
    }

    #[test]
    fn unknown_braced_name_faults() {
        assert_eq!(
            parse_key_token("{HYPER}").unwrap_err(),
            Fault::UnknownKeySymbol("{HYPER}".into())
        );
    }

    #[test]
    fn short_braces_are_literal() {
        assert_eq!(parse_key_token("{}").unwrap(), vec![KeyInput::Text("{}".into())]);
    }

    #[test]
    fn sequences_flatten() {
        let tokens: Vec<String> = ["{CTRL}", "a", "{DELETE}", "hi"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(parse_key_sequence(&tokens).unwrap().len(), 4);
        assert!(key_names().contains(&"CTRL_Z"));
    }
}
