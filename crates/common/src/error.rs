use serde::Serialize;
use thiserror::Error;

/// A single rejected field from payload validation.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Class is full")]
    ClassFull,

    #[error("Student is already registered for this class")]
    AlreadyRegistered,

    #[error("Registration cannot be changed from status '{from}'")]
    InvalidTransition { from: String },

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Not authorized")]
    NotAuthorized,

    #[error("Invalid input")]
    Validation(Vec<FieldError>),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Payment processing failed: {0}")]
    Payment(String),

    #[error("Email delivery failed: {0}")]
    Email(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Shorthand for a single-field validation rejection.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
}

pub type Result<T> = std::result::Result<T, Error>;
