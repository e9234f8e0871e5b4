//! Human-readable rendering of validation failures.

use serde::{Deserialize, Serialize};

use crate::validate::engine::ValidationFailure;

/// Language of rendered messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Zh => "zh",
        }
    }
}

/// Render one failure using the field's display label.
pub fn render(locale: Locale, failure: &ValidationFailure) -> String {
    match locale {
        Locale::En => render_en(failure),
        Locale::Zh => render_zh(failure),
    }
}

fn render_en(f: &ValidationFailure) -> String {
    let (field, param) = (&f.label, &f.param);
    match f.tag.as_str() {
        "required" => format!("{field} is required"),
        "min" => format!("{field} length must be ≥ {param}"),
        "max" => format!("{field} length must be ≤ {param}"),
        "len" => format!("{field} length must equal {param}"),
        "eq" => format!("{field} value must equal {param}"),
        "ne" => format!("{field} must not equal {}", f.value),
        "oneof" => format!("{field} must be one of [{param}]"),
        "gt" => format!("{field} must be > {param}"),
        "gte" => format!("{field} must be ≥ {param}"),
        "lt" => format!("{field} must be < {param}"),
        "lte" => format!("{field} must be ≤ {param}"),
        "eqfield" => format!("{field} must equal the value of {param}"),
        "numeric" => format!("{field} must be numeric"),
        "email" => format!("{field} must be a valid email"),
        "url" => format!("{field} must be a valid url"),
        "ip" => format!("{field} must be a valid ip"),
        "contains" => format!("{field} must contain {param}"),
        "excludes" => format!("{field} must not contain {param}"),
        "containsany" => format!("{field} must contain any of [{param}]"),
        "excludesall" => format!("{field} must exclude all of [{param}]"),
        "startswith" => format!("{field} must start with [{param}]"),
        "endswith" => format!("{field} must end with [{param}]"),
        _ => format!("{field} failed validation"),
    }
}

fn render_zh(f: &ValidationFailure) -> String {
    let (field, param) = (&f.label, &f.param);
    match f.tag.as_str() {
        "required" => format!("{field}为必填项"),
        "min" => format!("{field}的长度不应小于{param}"),
        "max" => format!("{field}的长度不应超过{param}"),
        "len" => format!("{field}的长度必须为{param}"),
        "eq" => format!("{field}的值必须为{param}"),
        "ne" => format!("{field}的值不应为{}", f.value),
        "oneof" => format!("{field}的值必须在[{param}]其中"),
        "gt" => format!("{field}的值必须大于{param}"),
        "gte" => format!("{field}的值必须大于或等于{param}"),
        "lt" => format!("{field}的值必须小于{param}"),
        "lte" => format!("{field}的值必须小于或等于{param}"),
        "eqfield" => format!("{field}的值必须与{param}的值相等"),
        "numeric" => format!("{field}的值必须为数字"),
        "email" => format!("{field}的值必须符合邮箱格式"),
        "url" => format!("{field}的值必须符合网址格式"),
        "ip" => format!("{field}的内容必须符合IP格式"),
        "contains" => format!("{field}的值必须包含{param}"),
        "excludes" => format!("{field}的值不可包含{param}"),
        "containsany" => format!("{field}的值必须包含[{param}]其中任意一个"),
        "excludesall" => format!("{field}的值不可包含[{param}]其中任意一个"),
        "startswith" => format!("{field}的值必须以[{param}]为开头"),
        "endswith" => format!("{field}的值必须以[{param}]为结尾"),
        _ => format!("{field}的值未通过校验"),
    }
}
