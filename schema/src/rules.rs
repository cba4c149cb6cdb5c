//! Custom rules for `#[validate(custom(...))]` and the two-phase read shared
//! by every payload validator: a lenient form carries the rules, the typed
//! value is only deserialized once the form passes.

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::error::ValidationErrors;
use crate::phone::is_valid_phone;

pub(crate) fn rule(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rule("blank", "Value is too short"));
    }
    Ok(())
}

pub(crate) fn phone(value: &str) -> Result<(), ValidationError> {
    if !is_valid_phone(value) {
        return Err(rule("phone", "Phone number is invalid"));
    }
    Ok(())
}

/// Absolute http(s) URL.
pub(crate) fn absolute_url(value: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(rule("url", "URL is invalid")),
    }
}

/// Becomes the last segment of an object key, so it may not walk the key.
pub(crate) fn file_id(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rule("blank", "File ID is required"));
    }
    if value.contains('/') || value.contains("..") {
        return Err(rule("file_id", "File ID is invalid"));
    }
    Ok(())
}

pub(crate) fn into_result(report: validator::ValidationErrors) -> Result<(), validator::ValidationErrors> {
    if report.is_empty() {
        Ok(())
    } else {
        Err(report)
    }
}

/// Validates a required nested record of a tagged union under `key`.
pub(crate) fn nest<T: Validate>(
    report: &mut validator::ValidationErrors,
    key: &'static str,
    value: Option<&T>,
    missing: &'static str,
) {
    match value.map(Validate::validate) {
        None => report.add(key, rule("required", missing)),
        Some(Ok(())) => {}
        Some(Err(inner)) => {
            report
                .errors_mut()
                .insert(key.into(), validator::ValidationErrorsKind::Struct(Box::new(inner)));
        }
    }
}

/// Reads `value` as the form `F`, runs `rules` on it and, when they record
/// nothing, deserializes the typed value `T`. Shape errors `serde` rejects
/// outright are reported on the root path.
pub(crate) fn check<F, T>(
    value: &Value,
    errors: &mut ValidationErrors,
    rules: impl FnOnce(&F) -> Result<(), validator::ValidationErrors>,
) -> Option<T>
where
    F: DeserializeOwned,
    T: DeserializeOwned,
{
    let form = match F::deserialize(value) {
        Ok(form) => form,
        Err(err) => {
            errors.push("", format!("Request body is invalid: {err}"));
            return None;
        }
    };
    if let Err(report) = rules(&form) {
        errors.absorb("", &report);
        return None;
    }
    match T::deserialize(value) {
        Ok(typed) => Some(typed),
        Err(err) => {
            errors.push("", format!("Request body is invalid: {err}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_url_requires_http_scheme() {
        assert!(absolute_url("https://cdn.example.com/a.jpg").is_ok());
        assert!(absolute_url("/a.jpg").is_err());
        assert!(absolute_url("ftp://cdn.example.com/a.jpg").is_err());
    }

    #[test]
    fn file_id_rejects_key_traversal() {
        assert!(file_id("c8f1e2").is_ok());
        assert!(file_id("a/b").is_err());
        assert!(file_id("..").is_err());
        assert_eq!(
            file_id("  ").unwrap_err().message.as_deref(),
            Some("File ID is required")
        );
    }
}
