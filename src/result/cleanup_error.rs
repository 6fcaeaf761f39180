use thiserror::Error;

use crate::result::AvroError;

/// Produced when an attempt to unwind a failed generator itself fails. The original failure
/// is kept as the source; the secondary failure is available through [`CleanupError::secondary`].
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{original} (cleanup also failed: {secondary})")]
pub struct CleanupError {
    #[source]
    original: Box<AvroError>,
    secondary: Box<AvroError>,
}

impl CleanupError {
    pub(crate) fn new(original: AvroError, secondary: AvroError) -> Self {
        CleanupError {
            original: Box::new(original),
            secondary: Box::new(secondary),
        }
    }

    pub fn original(&self) -> &AvroError {
        &self.original
    }

    pub fn secondary(&self) -> &AvroError {
        &self.secondary
    }
}
