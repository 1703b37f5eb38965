use thiserror::Error;
use tracing::{trace, warn};

use super::{Event, EventKind, PERUN, TRANSFER};
use crate::{
    scval::{self, Address, ScVal},
    wire::{Channel, Control, FromScVal, Party},
};

/// An event as emitted by a contract during a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractEvent {
    /// The emitting contract, if known.
    pub contract: Option<Address>,
    pub topics: Vec<ScVal>,
    pub data: ScVal,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("event has {0} topics, at least 2 are required")]
    TooFewTopics(usize),
    #[error("event was not emitted by a channel contract (first topic {0:?})")]
    NotOurContract(ScVal),
    #[error("unsupported event {0:?}")]
    UnsupportedEvent(ScVal),
    #[error("event emitted by {found:?}, expected {expected:?}")]
    ContractMismatch { expected: Address, found: Address },
    #[error("malformed {kind:?} event payload: {source}")]
    MalformedPayload {
        kind: EventKind,
        #[source]
        source: scval::Error,
    },
}

/// Turns the events of a transaction into [Event]s.
#[derive(Debug, Clone, Default)]
pub struct EventDecoder {
    contract: Option<Address>,
}

impl EventDecoder {
    /// Decoder accepting events from any contract.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder rejecting events that name an emitting contract other than
    /// `contract`.
    pub fn for_contract(contract: Address) -> Self {
        Self {
            contract: Some(contract),
        }
    }

    /// Decodes all channel events, skipping token transfers. The order of the
    /// input is preserved.
    pub fn decode(&self, events: &[ContractEvent]) -> Result<Vec<Event>, DecodeError> {
        let mut out = Vec::with_capacity(events.len());
        for event in events {
            if let Some(decoded) = self.decode_one(event)? {
                out.push(decoded);
            }
        }
        Ok(out)
    }

    fn decode_one(&self, event: &ContractEvent) -> Result<Option<Event>, DecodeError> {
        let (first, second) = match event.topics.as_slice() {
            [first, second, ..] => (first, second),
            topics => return Err(DecodeError::TooFewTopics(topics.len())),
        };

        if first.as_symbol() == Some(&TRANSFER) {
            trace!("skipping token transfer event");
            return Ok(None);
        }
        if first.as_symbol() != Some(&PERUN) {
            return Err(DecodeError::NotOurContract(first.clone()));
        }
        let kind = second
            .as_symbol()
            .and_then(EventKind::from_symbol)
            .ok_or_else(|| DecodeError::UnsupportedEvent(second.clone()))?;

        if let (Some(expected), Some(found)) = (self.contract, event.contract) {
            if expected != found {
                return Err(DecodeError::ContractMismatch { expected, found });
            }
        }

        let malformed = |source: scval::Error| DecodeError::MalformedPayload { kind, source };
        let (channel, party) = if kind.has_party() {
            <(Channel, Party)>::from_scval(&event.data).map_err(malformed)?
        } else {
            (Channel::from_scval(&event.data).map_err(malformed)?, Party::A)
        };

        if kind == EventKind::Open && channel.control != pristine(&channel) {
            warn!(
                channel = ?channel.id(),
                control = ?channel.control,
                "open event carries control flags that are already set"
            );
        }

        Ok(Some(Event::new(kind, channel, party)))
    }
}

/// Control of a freshly opened channel, keeping the timestamp.
fn pristine(channel: &Channel) -> Control {
    Control {
        timestamp: channel.control.timestamp,
        ..Default::default()
    }
}

/// Decodes `events` without checking the emitting contract.
pub fn decode_events(events: &[ContractEvent]) -> Result<Vec<Event>, DecodeError> {
    EventDecoder::new().decode(events)
}
