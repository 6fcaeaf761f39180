use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Wraps an [`io::Error`] raised by the output sink. The original error is kept intact so that
/// callers can inspect its kind and source.
#[derive(Clone, Debug, Error)]
#[error("{source:?}")]
pub struct IoError {
    source: Arc<io::Error>,
}

impl From<io::Error> for IoError {
    fn from(source: io::Error) -> Self {
        IoError {
            source: Arc::new(source),
        }
    }
}

impl IoError {
    pub fn source(&self) -> &io::Error {
        &self.source
    }
}

// io::Error does not implement PartialEq; two IoErrors are considered equal when they
// have the same kind.
impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.source.kind() == other.source.kind()
    }
}
