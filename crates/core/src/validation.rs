//! Glue between `validator` and [`CoreError`].
//!
//! Request structs derive [`Validate`]; handlers call [`check`] to turn the
//! first violation into a field-addressed [`CoreError::InvalidField`].
//! Enumerated values are closed Rust enums, so their membership is enforced
//! by serde before `validator` ever runs.

use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::CoreError;

/// Run `validator` rules and report the first violation.
///
/// Violations are visited in field-name order so the reported field is
/// stable across runs.
pub fn check<T: Validate>(value: &T) -> Result<(), CoreError> {
    match value.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let (field, message) = first_violation(&errors, "")
                .unwrap_or_else(|| ("request".to_string(), "is invalid".to_string()));
            Err(CoreError::InvalidField { field, message })
        }
    }
}

/// Parse a single form or query string into a closed enum (or any type
/// with a string-driven `Deserialize` impl).
pub fn parse_field<T: DeserializeOwned>(field: &str, raw: &str) -> Result<T, CoreError> {
    let de: StrDeserializer<'_, ValueError> = raw.into_deserializer();
    T::deserialize(de).map_err(|e| CoreError::invalid_field(field, e.to_string()))
}

/// `deserialize_with` helper: treat an explicit JSON `null` like an omitted
/// field and fall back to `T::default()`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Custom rule: text must contain something other than whitespace.
pub fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

fn first_violation(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (name, kind) in entries {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(err) = list.first() {
                    return Some((path, describe(err)));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_violation(inner, &path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    if let Some(found) = first_violation(inner, &format!("{path}[{idx}]")) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

fn describe(err: &ValidationError) -> String {
    match &err.message {
        Some(message) => message.to_string(),
        None => format!("failed '{}' check", err.code),
    }
}
