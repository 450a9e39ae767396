//! POSIX-shell style line splitting

use crate::fault::Fault;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Comment,
    Tokens(Vec<String>),
}

fn is_separator(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

fn parse_fault(line: &str, reason: &str) -> Fault {
    Fault::Parse {
        reason: reason.to_string(),
        text: line.trim().to_string(),
    }
}

/// Split one script line into tokens.
///
/// Single quotes group literally. Double quotes group and let a backslash
/// escape `\`, `"`, `$` and `` ` ``; any other escaped character keeps its
/// backslash. Outside quotes a backslash escapes the next character. `#`
/// starts a comment only as the first non-blank character.
pub fn tokenize(line: &str) -> Result<LineKind, Fault> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(LineKind::Blank);
    }
    if trimmed.starts_with('#') {
        return Ok(LineKind::Comment);
    }

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = trimmed.chars();

    while let Some(ch) = chars.next() {
        match ch {
            c if is_separator(c) => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '\\' => match chars.next() {
                Some(escaped) => {
                    current.push(escaped);
                    in_token = true;
                }
                None => return Err(parse_fault(line, "no escaped character")),
            },
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(parse_fault(line, "no closing quotation")),
                    }
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('\\' | '"' | '$' | '`')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(parse_fault(line, "no closing quotation")),
                        },
                        Some(c) => current.push(c),
                        None => return Err(parse_fault(line, "no closing quotation")),
                    }
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    Ok(LineKind::Tokens(tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(line: &str) -> Vec<String> {
        match tokenize(line).unwrap() {
            LineKind::Tokens(tokens) => tokens,
            other => panic!("expected tokens, got {other:?}"),
        }
    }

    #[test]
    fn blank_and_comment_lines() {
        assert_eq!(tokenize("").unwrap(), LineKind::Blank);
        assert_eq!(tokenize("   \t\n").unwrap(), LineKind::Blank);
        assert_eq!(tokenize("  # click ID go").unwrap(), LineKind::Comment);
    }

    #[test]
    fn hash_inside_a_line_is_literal() {
        assert_eq!(tokens("click CSS #submit"), vec!["click", "CSS", "#submit"]);
    }

    #[test]
    fn quotes_group_words() {
        assert_eq!(
            tokens(r#"write XPATH "//input[@name='q']" 'hello world'"#),
            vec!["write", "XPATH", "//input[@name='q']", "hello world"]
        );
    }

    #[test]
    fn adjacent_segments_concatenate() {
        assert_eq!(tokens(r#"echo a"b c"'d'"#), vec!["echo", "ab cd"]);
    }

    #[test]
    fn empty_quotes_yield_empty_token() {
        assert_eq!(tokens(r#"set_var x """#), vec!["set_var", "x", ""]);
        assert_eq!(tokens("echo ''"), vec!["echo", ""]);
    }

    #[test]
    fn escapes_follow_posix_rules() {
        assert_eq!(tokens(r"echo a\ b"), vec!["echo", "a b"]);
        assert_eq!(tokens(r#"echo "a\"b" "c\d""#), vec!["echo", "a\"b", r"c\d"]);
        assert_eq!(tokens(r"echo 'a\b'"), vec!["echo", r"a\b"]);
    }

    #[test]
    fn placeholders_survive_quoting() {
        assert_eq!(tokens(r#"echo "${name}" '${x}'"#), vec!["echo", "${name}", "${x}"]);
    }

    #[test]
    fn unterminated_quote_is_a_parse_fault() {
        let err = tokenize(r#"echo "oops"#).unwrap_err();
        assert!(matches!(err, Fault::Parse { ref text, .. } if text == r#"echo "oops"#));
        assert!(tokenize("echo 'oops").is_err());
    }

    #[test]
    fn dangling_backslash_is_a_parse_fault() {
        assert!(matches!(tokenize(r"echo oops\"), Err(Fault::Parse { .. })));
    }
}
