use std::sync::OnceLock;

use anyhow::{Context, Result};
use polishd::Args;
use regex::Regex;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"([a-zA-Z_]+)=([-0-9.]+)").expect("valid pattern"))
}

/// Splits `tail` into the expression in front of the first `name=value` pair
/// and the pairs themselves. Later pairs override earlier ones.
pub fn split(tail: &str) -> Result<(&str, Args)> {
    let mut args = Args::new();
    let mut start = tail.len();
    for (i, captures) in pattern().captures_iter(tail).enumerate() {
        let (Some(pair), Some(name), Some(value)) = (captures.get(0), captures.get(1), captures.get(2)) else {
            continue;
        };
        if i == 0 {
            start = pair.start();
        }
        let value: f64 = value
            .as_str()
            .parse()
            .with_context(|| format!("invalid value for argument `{}`", name.as_str()))?;
        args.insert(name.as_str().to_owned(), value);
    }
    Ok((tail[..start].trim(), args))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_then_arguments() {
        let (expr, args) = split("x * y + 1 x=2 y=-0.5").unwrap();
        assert_eq!(expr, "x * y + 1");
        assert_eq!(args.len(), 2);
        assert_eq!(args["x"], 2.0);
        assert_eq!(args["y"], -0.5);
    }

    #[test]
    fn no_arguments() {
        let (expr, args) = split(" 1 + 2 ").unwrap();
        assert_eq!(expr, "1 + 2");
        assert!(args.is_empty());
    }

    #[test]
    fn later_pairs_win() {
        let (expr, args) = split("a=1 a=3").unwrap();
        assert_eq!(expr, "");
        assert_eq!(args["a"], 3.0);
    }

    #[test]
    fn bad_value() {
        let err = split("x x=1-2").unwrap_err();
        assert_eq!(err.to_string(), "invalid value for argument `x`");
    }
}
