//! Field declarations for validatable structures.

use std::borrow::Cow;
use std::fmt;

/// A structure whose fields carry declared constraints.
///
/// ```ignore
/// impl Validate for ServerOption {
///     fn fields(&self) -> Vec<Field> {
///         vec![Field::new("port", "port", self.port, "required,min=3000,max=10000")]
///     }
/// }
/// ```
pub trait Validate {
    /// Fields in declaration order.
    fn fields(&self) -> Vec<Field>;
}

/// One field: structural name, display label, value and constraint tags.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub label: Cow<'static, str>,
    pub value: FieldValue,
    pub rules: &'static str,
}

impl Field {
    pub fn new(
        name: &'static str,
        label: impl Into<Cow<'static, str>>,
        value: impl Into<FieldValue>,
        rules: &'static str,
    ) -> Self {
        Self {
            name,
            label: label.into(),
            value: value.into(),
            rules,
        }
    }
}

/// Value of a field as seen by the constraint engine.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    /// Collection, reduced to its element count.
    Items(usize),
    Null,
}

impl FieldValue {
    pub fn items(len: usize) -> Self {
        FieldValue::Items(len)
    }

    /// Zero value: empty text, 0, false, no items, null.
    pub fn is_zero(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Int(v) => *v == 0,
            FieldValue::UInt(v) => *v == 0,
            FieldValue::Float(v) => *v == 0.0,
            FieldValue::Bool(v) => !*v,
            FieldValue::Items(n) => *n == 0,
            FieldValue::Null => true,
        }
    }

    /// Size used by length and range constraints.
    ///
    /// Text is measured in characters, collections by count, numbers by value.
    pub fn measure(&self) -> Option<f64> {
        match self {
            FieldValue::Text(s) => Some(s.chars().count() as f64),
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::UInt(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Items(n) => Some(*n as f64),
            FieldValue::Null => Some(0.0),
            FieldValue::Bool(_) => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, FieldValue::Int(_) | FieldValue::UInt(_) | FieldValue::Float(_))
    }

    /// Text form used by string constraints.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(s.as_str()),
            FieldValue::Null => Cow::Borrowed(""),
            other => Cow::Owned(other.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::UInt(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::Items(n) => write!(f, "{}", n),
            FieldValue::Null => Ok(()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&String> for FieldValue {
    fn from(v: &String) -> Self {
        FieldValue::Text(v.clone())
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

macro_rules! signed_value {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(v: $t) -> Self {
                FieldValue::Int(v as i64)
            }
        })*
    };
}

macro_rules! unsigned_value {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(v: $t) -> Self {
                FieldValue::UInt(v as u64)
            }
        })*
    };
}

signed_value!(i8, i16, i32, i64);
unsigned_value!(u8, u16, u32, u64, usize);

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values() {
        assert!(FieldValue::from("").is_zero());
        assert!(FieldValue::from(0u16).is_zero());
        assert!(FieldValue::from(None::<String>).is_zero());
        assert!(!FieldValue::from("x").is_zero());
        assert!(!FieldValue::from(-1i32).is_zero());
    }

    #[test]
    fn test_text_measured_in_chars() {
        assert_eq!(FieldValue::from("追踪编码").measure(), Some(4.0));
        assert_eq!(FieldValue::items(3).measure(), Some(3.0));
        assert_eq!(FieldValue::Bool(true).measure(), None);
    }
}
