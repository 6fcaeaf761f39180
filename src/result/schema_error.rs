use thiserror::Error;

/// Indicates that a schema definition is malformed or violates one of Avro's schema rules.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("invalid schema: {description}")]
pub struct SchemaError {
    description: String,
}

impl SchemaError {
    pub(crate) fn new(description: impl Into<String>) -> Self {
        SchemaError {
            description: description.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
