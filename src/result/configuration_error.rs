use std::borrow::Cow;
use thiserror::Error;

/// Indicates that the generator was used before it was given everything it needs to operate,
/// most commonly a schema.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("generator is not configured: {description}")]
pub struct ConfigurationError {
    description: Cow<'static, str>,
}

impl ConfigurationError {
    pub(crate) fn new(description: impl Into<Cow<'static, str>>) -> Self {
        ConfigurationError {
            description: description.into(),
        }
    }

    pub fn description(&self) -> &str {
        self.description.as_ref()
    }
}
