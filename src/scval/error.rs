//! Error type and Return values used by the codec.

use serde::ser;
use thiserror::Error;

use super::ScVal;

/// Represents all possible errors that can happen while building, encoding or
/// decoding [ScVal] trees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The value contains a type that has no [ScVal] counterpart, for
    /// example floating point numbers or integers narrower than 32 bits.
    #[error("type is not representable as ScVal: {0}")]
    TypeNotRepresentable(&'static str),
    #[error("{0}")]
    Custom(String),

    #[error("cannot build a map from {keys} keys and {values} values")]
    MapLengthMismatch { keys: usize, values: usize },
    #[error("key not found in map: {0:?}")]
    KeyNotFound(Box<ScVal>),
    /// Map keys on the wire must be strictly ascending.
    #[error("map keys are not sorted or not unique")]
    UnsortedMap,
    #[error("invalid symbol {0:?}")]
    InvalidSymbol(String),

    #[error("{ty}: expected a map with {expected} entries, found {found}")]
    WrongArity {
        ty: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{ty}: missing key {key}")]
    MissingKey {
        ty: &'static str,
        key: &'static str,
    },
    #[error("expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("expected a vec with {expected} elements, found {found}")]
    WrongElementCount { expected: usize, found: usize },
    /// A fixed-length field (public key, nonce, channel id, signature) has the
    /// wrong length.
    #[error("expected {expected} bytes, found {found}")]
    InvalidLength { expected: usize, found: usize },
    /// Wraps an error that occurred while decoding the field `key` of the
    /// struct `ty`.
    #[error("{ty}.{key}: {source}")]
    InField {
        ty: &'static str,
        key: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("unexpected end of input, {needed} more bytes needed")]
    UnexpectedEof { needed: usize },
    #[error("unknown {what} discriminant {value}")]
    UnknownDiscriminant { what: &'static str, value: i32 },
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
    #[error("non-zero padding")]
    NonZeroPadding,
    #[error("invalid bool encoding {0}")]
    InvalidBool(u32),
    #[error("string is not valid utf-8")]
    InvalidUtf8,
    #[error("{0} container is absent")]
    AbsentContainer(&'static str),
    #[error("length {0} does not fit into the wire format")]
    LengthOverflow(usize),
    #[error("value is nested deeper than {0} levels")]
    DepthLimitExceeded(usize),
}

impl Error {
    pub(crate) fn unexpected(expected: &'static str, found: &ScVal) -> Self {
        Error::UnexpectedType {
            expected,
            found: found.type_name(),
        }
    }

    pub(crate) fn in_field(self, ty: &'static str, key: &'static str) -> Self {
        Error::InField {
            ty,
            key,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping all [Error::InField] wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::InField { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether a fixed-length invariant was violated, as opposed to the tree
    /// having the wrong shape.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self.root_cause(), Error::InvalidLength { .. })
    }
}

impl ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: core::fmt::Display,
    {
        Error::Custom(msg.to_string())
    }
}

/// Alias for `Result` using the [Error] returned by the codec.
pub type Result<T> = core::result::Result<T, Error>;
