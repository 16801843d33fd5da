//! Declarative validation of bound requests
//!
//! Constraints are declared on the request type with `validator`'s derive:
//!
//! ```rust
//! use users_service::adapter::{Validate, ValidationErrors};
//!
//! #[derive(Validate)]
//! struct Signup {
//!     #[validate(length(min = 3, max = 100, message = "name must be between 3 and 100 characters"))]
//!     name: String,
//!     #[validate(email(message = "email must be a valid email address"))]
//!     email: String,
//! }
//!
//! let signup = Signup { name: "Al".into(), email: "alice@example.com".into() };
//! let errors = ValidationErrors::from(signup.validate().unwrap_err());
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors.fields()[0].field, "name");
//! assert_eq!(errors.fields()[0].code, "INVALID_LENGTH");
//! ```

use std::fmt;

use serde::Serialize;
use validator::ValidationErrorsKind;

pub use validator::Validate;

/// A single failed constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as it appears on the wire
    pub field: String,
    /// Machine-readable reason (e.g. "REQUIRED", "INVALID_FORMAT")
    pub code: String,
    /// Human-readable message
    pub message: String,
}

/// All failed constraints of one request, flattened and ordered by field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Failures, ordered by field name
    pub fn fields(&self) -> &[FieldError] {
        &self.errors
    }

    /// Number of failures
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether every constraint passed
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn collect(&mut self, errors: &validator::ValidationErrors) {
        for (field, kind) in errors.errors() {
            match kind {
                ValidationErrorsKind::Field(failures) => {
                    for failure in failures {
                        let field = field.to_string();
                        let message = failure
                            .message
                            .as_ref()
                            .map(|message| message.to_string())
                            .unwrap_or_else(|| format!("{} is invalid", field));
                        self.errors.push(FieldError {
                            code: error_code(&failure.code),
                            field,
                            message,
                        });
                    }
                }
                ValidationErrorsKind::Struct(nested) => self.collect(nested),
                ValidationErrorsKind::List(items) => {
                    for nested in items.values() {
                        self.collect(nested);
                    }
                }
            }
        }
    }
}

/// Map a `validator` rule name onto the wire error code
fn error_code(rule: &str) -> String {
    match rule {
        "length" => "INVALID_LENGTH".to_string(),
        "email" | "url" | "regex" => "INVALID_FORMAT".to_string(),
        "range" => "OUT_OF_RANGE".to_string(),
        "required" => "REQUIRED".to_string(),
        other => other.to_uppercase(),
    }
}

impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut flattened = Self::default();
        flattened.collect(&errors);
        flattened
            .errors
            .sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.code.cmp(&b.code)));
        flattened
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Validate)]
    struct Profile {
        #[validate(length(min = 3, max = 100, message = "name must be between 3 and 100 characters"))]
        name: String,
        #[validate(email(message = "email must be a valid email address"))]
        email: String,
        #[validate(range(min = 1, message = "age must be a positive number"))]
        age: i64,
    }

    #[derive(Debug, Validate)]
    struct Envelope {
        #[validate(nested)]
        profile: Profile,
    }

    fn errors_of(value: &impl Validate) -> ValidationErrors {
        ValidationErrors::from(value.validate().unwrap_err())
    }

    fn profile(name: &str, email: &str, age: i64) -> Profile {
        Profile {
            name: name.to_string(),
            email: email.to_string(),
            age,
        }
    }

    #[test]
    fn test_valid_profile_passes() {
        assert!(profile("Alice", "a.b+tag@mail.example.org", 30).validate().is_ok());
    }

    #[test]
    fn test_rule_codes() {
        let errors = errors_of(&profile("Al", "alice@example.com", 30));
        assert_eq!(errors.fields()[0].code, "INVALID_LENGTH");

        let errors = errors_of(&profile("Alice", "alice", 30));
        assert_eq!(errors.fields()[0].code, "INVALID_FORMAT");

        let errors = errors_of(&profile("Alice", "alice@example.com", 0));
        assert_eq!(errors.fields()[0].code, "OUT_OF_RANGE");
    }

    #[test]
    fn test_collects_every_failure_in_field_order() {
        let errors = errors_of(&profile("", "nope", -1));

        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors.to_string(),
            "age must be a positive number; email must be a valid email address; name must be between 3 and 100 characters"
        );
    }

    #[test]
    fn test_nested_failures_use_leaf_field_names() {
        let errors = errors_of(&Envelope {
            profile: profile("Alice", "alice", 30),
        });

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.fields()[0].field, "email");
    }
}
