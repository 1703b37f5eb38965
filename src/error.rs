use thiserror::Error as ThisError;

use crate::{
    client::BackendError,
    event::{DecodeError, TransitionError},
    scval, sig,
    wire::ChannelId,
};

/// Errors returned by the client, funder, adjudicator and subscriptions.
#[derive(ThisError, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("codec error: {0}")]
    Codec(#[from] scval::Error),
    #[error("event decoding failed: {0}")]
    Event(#[from] DecodeError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("signature error: {0}")]
    Signature(#[from] sig::Error),
    #[error("channel {0:?} was not funded in time")]
    FundingTimeout(ChannelId),
    #[error("channel {0:?} was not opened in time")]
    ChannelNotOpened(ChannelId),
    #[error("channel {0:?} does not exist")]
    ChannelNotFound(ChannelId),
    #[error("no tokio runtime is running")]
    NoRuntime,
    #[error("operation was cancelled")]
    Cancelled,
    #[error("subscription is already closed")]
    SubscriptionClosed,
    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

/// Coarse classification of [Error]s.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value tree had the wrong shape.
    MalformedNode,
    /// A fixed-length field had the wrong length.
    InvariantViolation,
    NotOurContract,
    UnsupportedEvent,
    ContractMismatch,
    /// A latched control flag was cleared.
    InvalidTransition,
    /// The backend failed, retrying may succeed.
    TransientFetchFailure,
    Cancelled,
    Other,
}

fn codec_kind(e: &scval::Error) -> ErrorKind {
    if e.is_invariant_violation() {
        ErrorKind::InvariantViolation
    } else {
        ErrorKind::MalformedNode
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Codec(e) => codec_kind(e),
            Error::Event(e) => match e {
                DecodeError::TooFewTopics(_) => ErrorKind::MalformedNode,
                DecodeError::NotOurContract(_) => ErrorKind::NotOurContract,
                DecodeError::UnsupportedEvent(_) => ErrorKind::UnsupportedEvent,
                DecodeError::ContractMismatch { .. } => ErrorKind::ContractMismatch,
                DecodeError::MalformedPayload { source, .. } => codec_kind(source),
            },
            Error::Transition(_) => ErrorKind::InvalidTransition,
            Error::Backend(_) => ErrorKind::TransientFetchFailure,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Signature(_)
            | Error::FundingTimeout(_)
            | Error::ChannelNotOpened(_)
            | Error::ChannelNotFound(_)
            | Error::NoRuntime
            | Error::SubscriptionClosed
            | Error::Unsupported(_) => ErrorKind::Other,
        }
    }
}

/// Alias for `Result` using the crate's [Error].
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::ControlFlag,
        scval::{Address, ScVal},
    };

    #[test]
    fn kinds() {
        let invariant = scval::Error::InvalidLength {
            expected: 32,
            found: 31,
        }
        .in_field("Participant", "pubkey");
        assert_eq!(
            Error::from(invariant.clone()).kind(),
            ErrorKind::InvariantViolation
        );
        assert_eq!(
            Error::from(DecodeError::MalformedPayload {
                kind: crate::event::EventKind::Open,
                source: invariant,
            })
            .kind(),
            ErrorKind::InvariantViolation
        );
        assert_eq!(
            Error::from(scval::Error::WrongArity {
                ty: "Control",
                expected: 7,
                found: 6
            })
            .kind(),
            ErrorKind::MalformedNode
        );
        assert_eq!(
            Error::from(DecodeError::NotOurContract(ScVal::Void)).kind(),
            ErrorKind::NotOurContract
        );
        assert_eq!(
            Error::from(DecodeError::ContractMismatch {
                expected: Address::Contract([0; 32]),
                found: Address::Contract([1; 32]),
            })
            .kind(),
            ErrorKind::ContractMismatch
        );
        assert_eq!(
            Error::from(TransitionError::InvalidTransition {
                flag: ControlFlag::Closed
            })
            .kind(),
            ErrorKind::InvalidTransition
        );
        assert_eq!(
            Error::from(BackendError::new("connection reset")).kind(),
            ErrorKind::TransientFetchFailure
        );
        assert_eq!(Error::Cancelled.kind(), ErrorKind::Cancelled);
    }
}
