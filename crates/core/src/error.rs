#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A single request field failed validation. `field` is a dotted path
    /// such as `config.bpm` or `prompts[0].weight`.
    #[error("Invalid field {field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Daily quota of {limit} requests exceeded")]
    QuotaExceeded { limit: u32 },

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for an [`CoreError::InvalidField`] error.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}
