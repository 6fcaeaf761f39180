use thiserror::Error;

/// Indicates that the token stream does not fit the schema at the current write position:
/// an unknown record field, or a structure (array, object) where the schema expects
/// something else.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{description}")]
pub struct SchemaMismatch {
    description: String,
}

impl SchemaMismatch {
    pub(crate) fn new(description: impl Into<String>) -> Self {
        SchemaMismatch {
            description: description.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
