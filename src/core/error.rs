use thiserror::Error;

use super::horizon::{HorizonKind, ReferenceKey, Status};

/// Caller mistakes: asking a document for something its kind cannot carry.
///
/// Malformed document text is never an error; these only come from code
/// that hands the core an impossible combination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HorizonError {
    #[error("{kind} documents have no `{key}` reference group")]
    InvalidReferenceKey { kind: HorizonKind, key: ReferenceKey },

    #[error("{kind} documents cannot link back: the kind has no reference group")]
    NoReciprocalGroup { kind: HorizonKind },

    #[error("status `{status}` is not valid for {kind} documents")]
    InvalidStatus { kind: HorizonKind, status: Status },

    #[error("{kind} documents have no `{field}` field")]
    InvalidField { kind: HorizonKind, field: &'static str },

    #[error("`{path}` does not belong in the `{key}` reference group")]
    MisfiledReference { key: ReferenceKey, path: String },

    #[error("`{0}` is not inside a horizon directory")]
    UnknownHorizon(String),

    #[error("`{0}` is not a usable workspace path")]
    InvalidPath(String),
}
