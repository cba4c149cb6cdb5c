use listing_schema::{FieldError, Step, ValidationErrors};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("complete the {} step first", .0.label())]
    StepIncomplete(Step),
    #[error("`{field}` is set by both the {} and {} steps", .first.label(), .second.label())]
    FieldConflict { field: String, first: Step, second: Step },
    #[error("failed to encode step data: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server rejected the request ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        fields: Vec<FieldError>,
    },
}

impl WizardError {
    /// Field-scoped problems, whether found locally or by the server.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            WizardError::Validation(errors) => &errors.errors,
            WizardError::Api { fields, .. } => fields,
            _ => &[],
        }
    }
}
