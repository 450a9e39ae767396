//! Session variables and `${name}` substitution

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::fault::Fault;

/// Passes after which a still-unresolved token is treated as a cycle
pub const MAX_SUBSTITUTION_PASSES: usize = 64;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Name to value map living for one run
#[derive(Debug, Default, Clone)]
pub struct VariableStore {
    values: HashMap<String, String>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. Values are stored verbatim.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), Fault> {
        if !is_identifier(name) {
            return Err(Fault::InvalidArgument(format!(
                "`{name}` is not a valid variable name"
            )));
        }
        self.values.insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn substitute_once(current: &str, store: &VariableStore) -> Result<String, Fault> {
    let mut out = String::with_capacity(current.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(current) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = store
            .get(name.as_str())
            .ok_or_else(|| Fault::UndefinedVariable(name.as_str().to_string()))?;
        out.push_str(&current[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(&current[last..]);
    Ok(out)
}

/// Resolve every `${name}` in `token`, re-scanning until none remain.
pub fn substitute(token: &str, store: &VariableStore) -> Result<String, Fault> {
    if !token.contains("${") {
        return Ok(token.to_string());
    }
    let mut current = token.to_string();
    for _ in 0..MAX_SUBSTITUTION_PASSES {
        if !PLACEHOLDER.is_match(&current) {
            return Ok(current);
        }
        current = substitute_once(&current, store)?;
    }
    if PLACEHOLDER.is_match(&current) {
        Err(Fault::SubstitutionLoop(token.to_string()))
    } else {
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(pairs: &[(&str, &str)]) -> VariableStore {
        let mut store = VariableStore::new();
        for (name, value) in pairs {
            store.set(name, *value).unwrap();
        }
        store
    }

    #[test]
    fn tokens_without_placeholders_pass_through() {
        let empty = VariableStore::new();
        for token in ["plain", "$HOME", "{x}", "$ {x}", "${", "${1x}", ""] {
            assert_eq!(substitute(token, &empty).unwrap(), token);
        }
    }

    #[test]
    fn nested_values_resolve_recursively() {
        let vars = store(&[("a", "1"), ("b", "${a}2")]);
        assert_eq!(substitute("${b}", &vars).unwrap(), "12");
        assert_eq!(substitute("x${a}y${b}z", &vars).unwrap(), "x1y12z");
    }

    #[test]
    fn composed_placeholders_are_rescanned() {
        let vars = store(&[("d", "$"), ("n", "{a}"), ("a", "done")]);
        assert_eq!(substitute("${d}${n}", &vars).unwrap(), "done");
    }

    #[test]
    fn undefined_names_fail() {
        let err = substitute("hello ${who}", &VariableStore::new()).unwrap_err();
        assert_eq!(err, Fault::UndefinedVariable("who".into()));
    }

    #[test]
    fn self_reference_is_a_loop() {
        let vars = store(&[("a", "${a}")]);
        assert_eq!(
            substitute("${a}", &vars).unwrap_err(),
            Fault::SubstitutionLoop("${a}".into())
        );
        let vars = store(&[("a", "x${b}"), ("b", "${a}")]);
        assert!(matches!(
            substitute("${a}", &vars),
            Err(Fault::SubstitutionLoop(_))
        ));
    }

    #[test]
    fn invalid_names_are_rejected() {
        let mut vars = VariableStore::new();
        assert!(vars.set("9lives", "x").is_err());
        assert!(vars.set("with-dash", "x").is_err());
        assert!(vars.set("_ok9", "x").is_ok());
        assert_eq!(vars.len(), 1);
    }
}
