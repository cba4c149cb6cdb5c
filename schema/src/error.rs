use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use validator::ValidationErrorsKind;

/// Key `validator` files struct-level failures under.
const STRUCT_LEVEL: &str = "__all__";

/// A single failed check, addressed by its dotted camelCase field path
/// (`propertyType.apartmentDetails.bedrooms`, `mediaData.0.url`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

/// Every check that failed while validating one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("validation failed: {}", describe(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| {
            if e.path.is_empty() {
                e.message.clone()
            } else {
                format!("{}: {}", e.path, e.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(path, message);
        errors
    }

    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|e| e.path.as_str())
    }

    /// True when some error sits at `path` or below it.
    pub fn touches(&self, path: &str) -> bool {
        self.paths().any(|p| {
            p == path || (p.starts_with(path) && p[path.len()..].starts_with('.'))
        })
    }

    /// Records every failure of a `validator` report below `prefix`. Field
    /// names become camelCase, list items become numeric segments and
    /// struct-level failures land on `prefix` itself.
    pub fn absorb(&mut self, prefix: &str, report: &validator::ValidationErrors) {
        for (field, kind) in report.errors() {
            let field: &str = field;
            let path = if field == STRUCT_LEVEL {
                prefix.to_owned()
            } else {
                join(prefix, &camel_case(field))
            };
            match kind {
                ValidationErrorsKind::Field(failures) => {
                    for failure in failures {
                        let message = match &failure.message {
                            Some(message) => message.to_string(),
                            None => format!("Invalid value ({})", failure.code),
                        };
                        self.push(path.clone(), message);
                    }
                }
                ValidationErrorsKind::Struct(inner) => self.absorb(&path, inner),
                ValidationErrorsKind::List(items) => {
                    for (index, inner) in items {
                        self.absorb(&join(&path, &index.to_string()), inner);
                    }
                }
            }
        }
    }

    /// Orders errors by path, comparing list indices numerically.
    pub fn sort(&mut self) {
        self.errors.sort_by(|a, b| compare_paths(&a.path, &b.path));
    }

    /// Sorted `Ok(value)` when nothing was recorded and a value was produced.
    pub fn finish<T>(mut self, value: Option<T>) -> Result<T, Self> {
        match value {
            Some(value) if self.is_empty() => Ok(value),
            _ if self.is_empty() => Err(Self::single("", "Request body is invalid")),
            _ => {
                self.sort();
                Err(self)
            }
        }
    }

    /// `Ok(value)` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(report: validator::ValidationErrors) -> Self {
        let mut errors = Self::new();
        errors.absorb("", &report);
        errors.sort();
        errors
    }
}

pub(crate) fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn compare_paths(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let order = match (x.parse::<usize>(), y.parse::<usize>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => x.cmp(y),
                };
                if order != Ordering::Equal {
                    return order;
                }
            }
        }
    }
}
