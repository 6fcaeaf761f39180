use thiserror::Error;

/// Raised when none of a union's branches can hold a given datum.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("could not resolve union {union} for datum {datum}")]
pub struct UnresolvedUnion {
    union: String,
    datum: String,
}

impl UnresolvedUnion {
    pub fn new(union: impl Into<String>, datum: impl Into<String>) -> Self {
        UnresolvedUnion {
            union: union.into(),
            datum: datum.into(),
        }
    }

    /// A JSON rendering of the union schema that failed to resolve.
    pub fn union(&self) -> &str {
        &self.union
    }

    /// A short description of the value that no branch would accept.
    pub fn datum(&self) -> &str {
        &self.datum
    }
}
