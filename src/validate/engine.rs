//! The validation engine and its facade backend.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::factory::BackendFactory;
use crate::outcome::BoxError;
use crate::validate::field::{Field, Validate};
use crate::validate::rules::{self, Verdict};
use crate::validate::translate::{self, Locale};

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    /// Structural field name.
    pub field: String,
    /// Display label used in messages.
    pub label: String,
    pub tag: String,
    pub param: String,
    /// Offending value, rendered as text.
    pub value: String,
}

/// A structure failed validation.
///
/// `message` is the message rendered for the last failing field; every
/// rendered message is kept in `messages`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub messages: Vec<String>,
    pub failures: Vec<ValidationFailure>,
}

impl ValidationError {
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Message for the first failing field.
    pub fn first_message(&self) -> &str {
        self.messages.first().map(String::as_str).unwrap_or_default()
    }
}

impl From<ValidationError> for BoxError {
    fn from(err: ValidationError) -> Self {
        BoxError::param_invalid(err.message.clone()).with_cause(err)
    }
}

/// Options of the validation facade.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorOption {
    pub locale: Locale,
}

impl Validate for ValidatorOption {
    fn fields(&self) -> Vec<Field> {
        vec![Field::new("locale", "locale", self.locale.as_str(), "required,oneof=en zh")]
    }
}

/// Checks declared constraints and renders field-level messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    locale: Locale,
}

impl Validator {
    pub const DISCRIMINATOR: &'static str = "validator";

    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Validate every declared field.
    ///
    /// Each field reports at most its first failing constraint; fields are
    /// visited in declaration order.
    pub fn validate<V: Validate + ?Sized>(&self, payload: &V) -> Result<(), ValidationError> {
        let fields = payload.fields();
        let mut failures = Vec::new();

        for field in &fields {
            for rule in rules::parse(field.rules) {
                match rules::check(&rule, &field.value, &fields) {
                    Verdict::Pass => continue,
                    Verdict::Skip => break,
                    Verdict::Fail => {
                        failures.push(ValidationFailure {
                            field: field.name.to_string(),
                            label: field.label.to_string(),
                            tag: rule.tag.to_string(),
                            param: rule.param.to_string(),
                            value: field.value.to_string(),
                        });
                        break;
                    }
                }
            }
        }

        if failures.is_empty() {
            return Ok(());
        }

        let messages: Vec<String> = failures
            .iter()
            .map(|failure| translate::render(self.locale, failure))
            .collect();
        let message = messages.last().cloned().unwrap_or_default();
        Err(ValidationError {
            message,
            messages,
            failures,
        })
    }

    /// `(message, error)` form: an empty message means the payload is valid.
    pub fn work<V: Validate + ?Sized>(&self, payload: &V) -> (String, Option<ValidationError>) {
        match self.validate(payload) {
            Ok(()) => (String::new(), None),
            Err(err) => (err.message.clone(), Some(err)),
        }
    }

    /// Constructor table for the validation facade.
    pub fn factory() -> BackendFactory<Validator, ValidatorOption> {
        let mut factory = BackendFactory::new("validation");
        factory.register(Self::DISCRIMINATOR, |_, option: &ValidatorOption| {
            Ok(Arc::new(Validator::new(option.locale)))
        });
        factory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TraceContext;
    use crate::factory::BackendSlot;

    struct Signup {
        name: String,
        email: String,
        password: String,
        confirm: String,
        age: u8,
        nickname: String,
    }

    impl Validate for Signup {
        fn fields(&self) -> Vec<Field> {
            vec![
                Field::new("name", "user name", &self.name, "required,min=2,max=20"),
                Field::new("email", "email address", &self.email, "required,email"),
                Field::new("password", "password", &self.password, "required,min=8"),
                Field::new("confirm", "confirmation", &self.confirm, "eqfield=password"),
                Field::new("age", "age", self.age, "gte=18,lte=130"),
                Field::new("nickname", "nickname", &self.nickname, "omitempty,min=3"),
            ]
        }
    }

    fn valid() -> Signup {
        Signup {
            name: "ada".into(),
            email: "ada@example.com".into(),
            password: "correct-horse".into(),
            confirm: "correct-horse".into(),
            age: 36,
            nickname: String::new(),
        }
    }

    #[test]
    fn test_valid_structure_has_empty_message() {
        let validator = Validator::default();
        assert!(validator.validate(&valid()).is_ok());
        let (message, err) = validator.work(&valid());
        assert!(message.is_empty());
        assert!(err.is_none());
    }

    #[test]
    fn test_required_message_uses_display_label() {
        let mut signup = valid();
        signup.name.clear();

        let err = Validator::default().validate(&signup).unwrap_err();
        assert_eq!(err.message(), "user name is required");
        assert_eq!(err.message().matches("user name").count(), 1);
        assert_eq!(err.message().matches("required").count(), 1);
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].field, "name");
    }

    #[test]
    fn test_last_rendered_message_wins() {
        let mut signup = valid();
        signup.email = "not-an-email".into();
        signup.age = 12;
        signup.nickname = "x".into();

        let err = Validator::default().validate(&signup).unwrap_err();
        assert_eq!(err.failures.len(), 3);
        assert_eq!(err.first_message(), "email address must be a valid email");
        assert_eq!(err.messages[1], "age must be ≥ 18");
        assert_eq!(err.message(), "nickname length must be ≥ 3");
        assert_eq!(err.to_string(), err.message());
    }

    #[test]
    fn test_one_failure_per_field() {
        let mut signup = valid();
        signup.password = String::new();
        signup.confirm = "different".into();

        let err = Validator::default().validate(&signup).unwrap_err();
        let tags: Vec<_> = err.failures.iter().map(|f| f.tag.as_str()).collect();
        assert_eq!(tags, vec!["required", "eqfield"]);
        assert_eq!(err.message(), "confirmation must equal the value of password");
    }

    #[test]
    fn test_chinese_locale() {
        let mut signup = valid();
        signup.name.clear();
        let err = Validator::new(Locale::Zh).validate(&signup).unwrap_err();
        assert_eq!(err.message(), "user name为必填项");
    }

    #[test]
    fn test_into_box_error() {
        let mut signup = valid();
        signup.age = 200;
        let err: BoxError = Validator::default().validate(&signup).unwrap_err().into();
        assert!(err.is_param_invalid());
        assert_eq!(err.label, "age must be ≤ 130");
    }

    #[test]
    fn test_validation_facade_backend() {
        let slot = BackendSlot::new(Validator::factory());
        let ctx = TraceContext::detached("init-for-validate");
        let validator = slot
            .initialize(&ctx, "validator", ValidatorOption { locale: Locale::Zh })
            .unwrap();
        assert_eq!(validator.locale(), Locale::Zh);
    }
}
