//! Join-from and arity rules applied before dispatch

use crate::fault::Fault;
use crate::registry::CommandSpec;

/// Fold trailing tokens per `join_from`, then check the argument count.
pub fn normalize(spec: &CommandSpec, mut args: Vec<String>) -> Result<Vec<String>, Fault> {
    if let Some(join_from) = spec.join_from {
        if args.len() < join_from {
            return Err(Fault::InsufficientArguments {
                command: spec.name.to_string(),
                min: spec.min_args,
                got: args.len(),
            });
        }
        let tail = args.split_off(join_from).join(" ");
        // an empty tail only stands in for the single argument still missing
        if !tail.is_empty() || spec.min_args.checked_sub(args.len()) == Some(1) {
            args.push(tail);
        }
    }

    let argc = args.len();
    if argc < spec.min_args {
        return Err(Fault::InsufficientArguments {
            command: spec.name.to_string(),
            min: spec.min_args,
            got: argc,
        });
    }
    if let Some(max) = spec.max_args {
        if argc > max {
            return Err(Fault::TooManyArguments {
                command: spec.name.to_string(),
                max,
                got: argc,
            });
        }
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::lookup;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn run(name: &str, raw: &[&str]) -> Result<Vec<String>, Fault> {
        normalize(lookup(name).unwrap(), args(raw))
    }

    #[test]
    fn trailing_words_are_joined() {
        assert_eq!(
            run("assert_text", &["ID", "foo", "hello", "world"]).unwrap(),
            args(&["ID", "foo", "hello world"])
        );
    }

    #[test]
    fn empty_tail_fills_the_last_required_slot() {
        assert_eq!(run("assert_url_contains", &[]).unwrap(), args(&[""]));
        assert_eq!(run("assert_text", &["ID", "foo"]).unwrap(), args(&["ID", "foo", ""]));
    }

    #[test]
    fn empty_tail_is_dropped_when_head_suffices() {
        let spec = CommandSpec {
            name: "probe",
            min_args: 1,
            max_args: None,
            join_from: Some(1),
            ..*lookup("exec_js").unwrap()
        };
        assert_eq!(normalize(&spec, args(&["a"])).unwrap(), args(&["a"]));
    }

    #[test]
    fn short_head_is_insufficient() {
        assert!(matches!(
            run("write_ce", &["ID"]),
            Err(Fault::InsufficientArguments { got: 1, .. })
        ));
    }

    #[test]
    fn arity_checked_after_joining() {
        assert!(matches!(
            run("click", &["ID"]),
            Err(Fault::InsufficientArguments { min: 2, got: 1, .. })
        ));
        assert!(matches!(
            run("click", &["ID", "go", "now"]),
            Err(Fault::TooManyArguments { max: 2, got: 3, .. })
        ));
        assert_eq!(run("exec_js", &["return", "1;"]).unwrap(), args(&["return 1;"]));
    }

    #[test]
    fn variadic_commands_keep_tokens_apart() {
        assert_eq!(
            run("write", &["ID", "q", "a", "b"]).unwrap(),
            args(&["ID", "q", "a", "b"])
        );
        assert_eq!(run("echo", &[]).unwrap(), Vec::<String>::new());
    }
}
