use std::time::Duration;

use thiserror::Error;

pub use crate::codec::FrameSizeError;

/// Defect in a mapping registry declaration, found when the registry is built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("wire field `{0}` has no mapping entry")]
    UnmappedWireField(String),

    #[error("domain field `{0}` has no mapping entry and is not skipped")]
    UnmappedDomainField(String),

    #[error("wire field `{0}` is targeted by more than one mapping entry")]
    DuplicateWireField(String),

    #[error("domain field `{0}` is targeted by more than one mapping entry")]
    DuplicateDomainField(String),

    #[error("wire type has no field `{0}`")]
    UnknownWireField(String),

    #[error("domain type has no field `{0}`")]
    UnknownDomainField(String),
}

/// Domain value that its wire field cannot hold.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("value {value} of `{field}` exceeds the wire maximum {max}")]
    TooLarge { field: String, value: u64, max: u64 },

    #[error("`{field}` = {value:?} is not a whole number of {unit:?}")]
    Inexact {
        field: String,
        value: Duration,
        unit: Duration,
    },
}

impl RangeError {
    /// Dotted path of the rejected domain field.
    pub fn field(&self) -> &str {
        match self {
            Self::TooLarge { field, .. } | Self::Inexact { field, .. } => field,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    FrameSize(#[from] FrameSizeError),

    #[error("frame i/o failed: {0}")]
    Io(#[from] std::io::Error),
}
