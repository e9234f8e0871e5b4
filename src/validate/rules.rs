//! Constraint tags and their checks.
//!
//! Tags use the `name[=param]` syntax joined by commas, e.g.
//! `required,min=16,max=100` or `oneof=toml json`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;

use crate::validate::field::{Field, FieldValue};

static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?[0-9]+(?:\.[0-9]+)?$").expect("numeric pattern"));

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("email pattern")
});

/// A single parsed constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule<'a> {
    pub tag: &'a str,
    pub param: &'a str,
}

/// Split a tag string into rules, skipping empty segments.
pub fn parse(rules: &str) -> Vec<Rule<'_>> {
    rules
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((tag, param)) => Rule {
                tag: tag.trim(),
                param: param.trim(),
            },
            None => Rule {
                tag: segment,
                param: "",
            },
        })
        .collect()
}

/// Result of checking one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
    /// Stop checking this field and treat it as valid (`omitempty`).
    Skip,
}

impl Verdict {
    fn from_bool(ok: bool) -> Self {
        if ok {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }
}

/// Check `rule` against `value`. `siblings` resolves `eqfield` targets.
pub fn check(rule: &Rule<'_>, value: &FieldValue, siblings: &[Field]) -> Verdict {
    match rule.tag {
        "required" => Verdict::from_bool(!value.is_zero()),
        "omitempty" => {
            if value.is_zero() {
                Verdict::Skip
            } else {
                Verdict::Pass
            }
        }
        "min" => compare(value, rule.param, |v, p| v >= p),
        "max" => compare(value, rule.param, |v, p| v <= p),
        "len" => compare(value, rule.param, |v, p| v == p),
        "gt" => compare(value, rule.param, |v, p| v > p),
        "gte" => compare(value, rule.param, |v, p| v >= p),
        "lt" => compare(value, rule.param, |v, p| v < p),
        "lte" => compare(value, rule.param, |v, p| v <= p),
        "eq" => Verdict::from_bool(equals(value, rule.param)),
        "ne" => Verdict::from_bool(!equals(value, rule.param)),
        "oneof" => {
            let text = value.as_text();
            Verdict::from_bool(rule.param.split_whitespace().any(|option| option == text))
        }
        "eqfield" => Verdict::from_bool(
            siblings
                .iter()
                .find(|f| f.name == rule.param)
                .map(|other| other.value == *value)
                .unwrap_or(false),
        ),
        "numeric" => Verdict::from_bool(value.is_number() || NUMERIC.is_match(&value.as_text())),
        "email" => Verdict::from_bool(EMAIL.is_match(&value.as_text())),
        "url" => Verdict::from_bool(is_url(&value.as_text())),
        "ip" => Verdict::from_bool(value.as_text().parse::<IpAddr>().is_ok()),
        "contains" => Verdict::from_bool(value.as_text().contains(rule.param)),
        "excludes" => Verdict::from_bool(!value.as_text().contains(rule.param)),
        "containsany" => {
            let text = value.as_text();
            Verdict::from_bool(rule.param.chars().any(|c| text.contains(c)))
        }
        "excludesall" => {
            let text = value.as_text();
            Verdict::from_bool(!rule.param.chars().any(|c| text.contains(c)))
        }
        "startswith" => Verdict::from_bool(value.as_text().starts_with(rule.param)),
        "endswith" => Verdict::from_bool(value.as_text().ends_with(rule.param)),
        "alpha" => text_class(value, |c| c.is_ascii_alphabetic()),
        "alphanum" => text_class(value, |c| c.is_ascii_alphanumeric()),
        "lowercase" => {
            let text = value.as_text();
            Verdict::from_bool(!text.is_empty() && text.to_lowercase() == text)
        }
        "uppercase" => {
            let text = value.as_text();
            Verdict::from_bool(!text.is_empty() && text.to_uppercase() == text)
        }
        // unknown tags never pass
        _ => Verdict::Fail,
    }
}

fn compare(value: &FieldValue, param: &str, op: impl Fn(f64, f64) -> bool) -> Verdict {
    match (value.measure(), param.parse::<f64>()) {
        (Some(v), Ok(p)) => Verdict::from_bool(op(v, p)),
        _ => Verdict::Fail,
    }
}

fn equals(value: &FieldValue, param: &str) -> bool {
    match value {
        FieldValue::Text(s) => s == param,
        FieldValue::Bool(b) => param.parse::<bool>().map(|p| p == *b).unwrap_or(false),
        other => match (other.measure(), param.parse::<f64>()) {
            (Some(v), Ok(p)) => v == p,
            _ => false,
        },
    }
}

fn is_url(text: &str) -> bool {
    match url::Url::parse(text) {
        Ok(parsed) => !parsed.scheme().is_empty() && (parsed.has_host() || parsed.scheme() == "file"),
        Err(_) => false,
    }
}

fn text_class(value: &FieldValue, allowed: impl Fn(char) -> bool) -> Verdict {
    let text = value.as_text();
    Verdict::from_bool(!text.is_empty() && text.chars().all(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(tag: &str, value: impl Into<FieldValue>) -> Verdict {
        let rules = parse(tag);
        check(&rules[0], &value.into(), &[])
    }

    #[test]
    fn test_parse_tags() {
        let rules = parse("required, min=16,max=100,oneof=toml json");
        assert_eq!(rules.len(), 4);
        assert_eq!(rules[1], Rule { tag: "min", param: "16" });
        assert_eq!(rules[3].param, "toml json");
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_length_and_range() {
        assert_eq!(run("min=3", "abc"), Verdict::Pass);
        assert_eq!(run("min=3", "ab"), Verdict::Fail);
        assert_eq!(run("max=2", "编码"), Verdict::Pass);
        assert_eq!(run("len=2", FieldValue::items(2)), Verdict::Pass);
        assert_eq!(run("gt=10", 11u32), Verdict::Pass);
        assert_eq!(run("lte=15", 16u32), Verdict::Fail);
        assert_eq!(run("min=abc", "abc"), Verdict::Fail);
    }

    #[test]
    fn test_formats() {
        assert_eq!(run("email", "dev@example.com"), Verdict::Pass);
        assert_eq!(run("email", "dev@"), Verdict::Fail);
        assert_eq!(run("url", "https://example.com/a?b=1"), Verdict::Pass);
        assert_eq!(run("url", "example.com"), Verdict::Fail);
        assert_eq!(run("ip", "10.0.0.1"), Verdict::Pass);
        assert_eq!(run("ip", "::1"), Verdict::Pass);
        assert_eq!(run("ip", "10.0.0"), Verdict::Fail);
        assert_eq!(run("numeric", "-12.5"), Verdict::Pass);
        assert_eq!(run("numeric", "12a"), Verdict::Fail);
    }

    #[test]
    fn test_string_constraints() {
        assert_eq!(run("oneof=toml json", "json"), Verdict::Pass);
        assert_eq!(run("oneof=toml json", "yaml"), Verdict::Fail);
        assert_eq!(run("containsany=!@", "a@b"), Verdict::Pass);
        assert_eq!(run("excludesall=!@", "a@b"), Verdict::Fail);
        assert_eq!(run("startswith=req-", "req-1"), Verdict::Pass);
        assert_eq!(run("endswith=.toml", "app.json"), Verdict::Fail);
        assert_eq!(run("ne=admin", "admin"), Verdict::Fail);
        assert_eq!(run("eq=5", 5i64), Verdict::Pass);
    }

    #[test]
    fn test_omitempty_and_unknown() {
        assert_eq!(run("omitempty", ""), Verdict::Skip);
        assert_eq!(run("omitempty", "x"), Verdict::Pass);
        assert_eq!(run("no_such_tag", "x"), Verdict::Fail);
    }

    #[test]
    fn test_eqfield_uses_siblings() {
        let siblings = vec![Field::new("password", "password", "s3cret", "required")];
        let rule = Rule { tag: "eqfield", param: "password" };
        assert_eq!(check(&rule, &"s3cret".into(), &siblings), Verdict::Pass);
        assert_eq!(check(&rule, &"other".into(), &siblings), Verdict::Fail);
    }
}
