use std::convert::From;
use std::io;

use thiserror::Error;

use crate::result::cleanup_error::CleanupError;
use crate::result::configuration_error::ConfigurationError;
use crate::result::decoding_error::DecodingError;
use crate::result::encoding_error::EncodingError;
use crate::result::illegal_operation::IllegalOperation;
use crate::result::schema_error::SchemaError;
use crate::result::schema_mismatch::SchemaMismatch;
use crate::result::unresolved_union::UnresolvedUnion;
use io_error::IoError;

pub mod cleanup_error;
pub mod configuration_error;
pub mod decoding_error;
pub mod encoding_error;
pub mod illegal_operation;
pub mod io_error;
pub mod schema_error;
pub mod schema_mismatch;
pub mod unresolved_union;

/// A unified Result type representing the outcome of method calls that may fail.
pub type AvroResult<T> = Result<T, AvroError>;

/// Represents the different types of high-level failures that might occur when writing or
/// reading Avro data.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AvroError {
    /// Indicates that an IO error was encountered while writing to (or reading from) a sink.
    #[error("{0}")]
    Io(#[from] IoError),

    /// Returned when the generator is used before it has a schema.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// Returned when the user has performed an illegal operation (for example: calling
    /// `end_object()` while a field name is still waiting for its value.)
    #[error("{0}")]
    IllegalOperation(#[from] IllegalOperation),

    /// Indicates that the token stream does not fit the schema at the current position.
    #[error("{0}")]
    SchemaMismatch(#[from] SchemaMismatch),

    /// Indicates that no branch of a union could hold a given datum.
    #[error("{0}")]
    UnresolvedUnion(#[from] UnresolvedUnion),

    /// Indicates that the writer encountered a problem while serializing a given piece of data.
    #[error("{0}")]
    Encoding(#[from] EncodingError),

    /// Indicates that the data being read contained illegal or otherwise unreadable data.
    #[error("{0}")]
    Decoding(#[from] DecodingError),

    /// Indicates that a schema definition is malformed.
    #[error("{0}")]
    Schema(#[from] SchemaError),

    /// A failure that happened while unwinding after an earlier failure.
    #[error("{0}")]
    Cleanup(#[from] CleanupError),
}

impl From<io::Error> for AvroError {
    fn from(io_error: io::Error) -> Self {
        IoError::from(io_error).into()
    }
}

impl From<io::ErrorKind> for AvroError {
    fn from(error_kind: io::ErrorKind) -> Self {
        // io::ErrorKind -> io::Error
        let io_error = io::Error::from(error_kind);
        // io::Error -> IoError -> AvroError
        IoError::from(io_error).into()
    }
}

impl From<serde_json::Error> for AvroError {
    fn from(error: serde_json::Error) -> Self {
        SchemaError::new(error.to_string()).into()
    }
}

/// A convenience method for creating an AvroResult containing an AvroError::Configuration with
/// the provided description text.
pub fn configuration_error<T, S: Into<String>>(description: S) -> AvroResult<T> {
    Err(ConfigurationError::new(description.into()).into())
}

/// A convenience method for creating an AvroResult containing an AvroError::Decoding with the
/// provided description text.
pub fn decoding_error<T, S: Into<String>>(description: S) -> AvroResult<T> {
    Err(decoding_error_raw(description))
}

/// A convenience method for creating an AvroError::Decoding with the provided description
/// text. Useful for calling Option#ok_or_else.
#[inline(never)]
pub(crate) fn decoding_error_raw<S: Into<String>>(description: S) -> AvroError {
    DecodingError::new(description.into()).into()
}

/// A convenience method for creating an AvroResult containing an AvroError::Encoding with the
/// provided description text.
pub(crate) fn encoding_error<T, S: Into<String>>(description: S) -> AvroResult<T> {
    Err(encoding_error_raw(description))
}

/// A convenience method for creating an AvroError::Encoding with the provided description
/// text. Useful for calling Option#ok_or_else.
#[inline(never)]
pub(crate) fn encoding_error_raw<S: Into<String>>(description: S) -> AvroError {
    EncodingError::new(description).into()
}

/// A convenience method for creating an AvroResult containing an AvroError::IllegalOperation
/// with the provided operation text.
pub fn illegal_operation<T, S: Into<String>>(operation: S) -> AvroResult<T> {
    Err(illegal_operation_raw(operation))
}

/// A convenience method for creating an AvroError::IllegalOperation with the provided operation
/// text. Useful for calling Option#ok_or_else.
#[inline(never)]
pub(crate) fn illegal_operation_raw<S: Into<String>>(operation: S) -> AvroError {
    IllegalOperation::new(operation.into()).into()
}

pub(crate) fn schema_mismatch<T, S: Into<String>>(description: S) -> AvroResult<T> {
    Err(SchemaMismatch::new(description).into())
}

pub(crate) fn schema_error<T, S: Into<String>>(description: S) -> AvroResult<T> {
    Err(schema_error_raw(description))
}

#[inline(never)]
pub(crate) fn schema_error_raw<S: Into<String>>(description: S) -> AvroError {
    SchemaError::new(description).into()
}

pub(crate) fn unresolved_union_raw(union: impl Into<String>, datum: impl Into<String>) -> AvroError {
    UnresolvedUnion::new(union, datum).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case::configuration(configuration_error::<(), _>("no schema supplied"), "no schema supplied")]
    #[case::illegal_operation(illegal_operation::<(), _>("no field name"), "no field name")]
    #[case::encoding(encoding_error::<(), _>("not an int"), "not an int")]
    #[case::decoding(decoding_error::<(), _>("truncated"), "truncated")]
    fn error_messages_carry_description(#[case] result: AvroResult<()>, #[case] expected: &str) {
        let message = result.unwrap_err().to_string();
        assert!(
            message.contains(expected),
            "'{message}' did not contain '{expected}'"
        );
    }

    #[test]
    fn io_errors_keep_their_kind() {
        let error: AvroError = io::Error::new(io::ErrorKind::BrokenPipe, "sink closed").into();
        match error {
            AvroError::Io(io_error) => {
                assert_eq!(io_error.source().kind(), io::ErrorKind::BrokenPipe)
            }
            other => panic!("expected an IO error, found {other:?}"),
        }
    }

    #[test]
    fn cleanup_errors_chain_the_original() {
        let original = illegal_operation_raw("field 'a' is still waiting for a value");
        let secondary = encoding_error_raw("sink rejected bytes");
        let chained: AvroError = CleanupError::new(original.clone(), secondary.clone()).into();
        let AvroError::Cleanup(cleanup) = &chained else {
            panic!("expected a cleanup error");
        };
        assert_eq!(cleanup.original(), &original);
        assert_eq!(cleanup.secondary(), &secondary);
        assert!(std::error::Error::source(cleanup).is_some());
    }
}
