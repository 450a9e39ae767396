//! Legacy command names

use std::collections::HashMap;

use once_cell::sync::Lazy;

const ALIAS_PAIRS: &[(&str, &str)] = &[
    ("L_click", "click"),
    ("R_click", "rclick"),
    ("D_click", "dclick"),
    ("put", "hover"),
    ("jump", "goto"),
    ("delay", "sleep"),
    ("pause", "pause"),
    ("keep_open", "keep_open"),
    ("write", "write"),
];

static ALIASES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| ALIAS_PAIRS.iter().copied().collect());

/// Resolve a command token. Lookup is case-sensitive; the result is
/// lower-cased. Unknown tokens pass through.
pub fn canonical_name(token: &str) -> String {
    ALIASES.get(token).copied().unwrap_or(token).to_lowercase()
}

/// Alternative spellings of `canonical`, excluding itself
pub fn aliases_for(canonical: &str) -> Vec<&'static str> {
    ALIAS_PAIRS
        .iter()
        .filter(|(alias, target)| *target == canonical && alias != target)
        .map(|(alias, _)| *alias)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_names_resolve() {
        assert_eq!(canonical_name("L_click"), "click");
        assert_eq!(canonical_name("jump"), "goto");
        assert_eq!(canonical_name("delay"), "sleep");
    }

    #[test]
    fn lookup_is_case_sensitive_but_result_is_lowered() {
        assert_eq!(canonical_name("l_click"), "l_click");
        assert_eq!(canonical_name("CLICK"), "click");
    }

    #[test]
    fn identity_aliases_are_not_listed() {
        assert_eq!(aliases_for("click"), vec!["L_click"]);
        assert!(aliases_for("pause").is_empty());
    }
}
