use thiserror::Error;

/// Indicates that a materialized value could not be encoded at its schema position.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{description}")]
pub struct EncodingError {
    description: String,
}

impl EncodingError {
    pub(crate) fn new(description: impl Into<String>) -> Self {
        EncodingError {
            description: description.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
