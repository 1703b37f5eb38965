//! Derives events from two consecutive [Control] snapshots.
//!
//! The contract only ever sets flags, so a flag going from true to false
//! means the snapshots are inconsistent (or the channel was replaced), which
//! is reported as [TransitionError::InvalidTransition].

use thiserror::Error;

use super::Event;
use crate::wire::{Channel, Control};

/// The six latched flags of [Control], in the order they are checked.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ControlFlag {
    FundedA,
    FundedB,
    Closed,
    WithdrawnA,
    WithdrawnB,
    Disputed,
}

impl ControlFlag {
    pub const ALL: [ControlFlag; 6] = [
        ControlFlag::FundedA,
        ControlFlag::FundedB,
        ControlFlag::Closed,
        ControlFlag::WithdrawnA,
        ControlFlag::WithdrawnB,
        ControlFlag::Disputed,
    ];

    pub fn get(self, control: &Control) -> bool {
        match self {
            ControlFlag::FundedA => control.funded_a,
            ControlFlag::FundedB => control.funded_b,
            ControlFlag::Closed => control.closed,
            ControlFlag::WithdrawnA => control.withdrawn_a,
            ControlFlag::WithdrawnB => control.withdrawn_b,
            ControlFlag::Disputed => control.disputed,
        }
    }
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransitionError {
    #[error("control flag {flag:?} went from true to false")]
    InvalidTransition { flag: ControlFlag },
}

/// Event derived from a [Control] change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ControlEvent {
    Fund,
    Close,
    Withdrawn,
    Disputed,
}

impl ControlEvent {
    /// Attaches the channel snapshot the change was observed in.
    pub fn into_event(self, channel: Channel) -> Event {
        match self {
            ControlEvent::Fund => Event::FundConfirmed(channel),
            ControlEvent::Close => Event::Closed(channel),
            ControlEvent::Withdrawn => Event::Withdrawn(channel),
            ControlEvent::Disputed => Event::Dispute(channel),
        }
    }
}

/// Whether both snapshots have the same flags. The timestamp is ignored.
pub fn identical_controls(a: &Control, b: &Control) -> bool {
    ControlFlag::ALL
        .iter()
        .all(|flag| flag.get(a) == flag.get(b))
}

/// Compares two snapshots and returns at most one event.
///
/// All flags are checked for a backwards transition before any event is
/// derived. Events are then derived in the order of [ControlFlag::ALL], the
/// first flag that produces one wins.
pub fn diff(previous: &Control, next: &Control) -> Result<Option<ControlEvent>, TransitionError> {
    if identical_controls(previous, next) {
        return Ok(None);
    }

    for flag in ControlFlag::ALL {
        if flag.get(previous) && !flag.get(next) {
            return Err(TransitionError::InvalidTransition { flag });
        }
    }

    for flag in ControlFlag::ALL {
        if flag.get(previous) || !flag.get(next) {
            continue;
        }
        let event = match flag {
            // The contract deletes channels once both parties withdrew, so a
            // funding change is only reported together with that.
            ControlFlag::FundedA | ControlFlag::FundedB if next.is_withdrawn() => {
                Some(ControlEvent::Fund)
            }
            ControlFlag::FundedA | ControlFlag::FundedB => None,
            ControlFlag::Closed => Some(ControlEvent::Close),
            ControlFlag::WithdrawnA | ControlFlag::WithdrawnB if next.is_withdrawn() => {
                Some(ControlEvent::Withdrawn)
            }
            ControlFlag::WithdrawnA | ControlFlag::WithdrawnB => None,
            ControlFlag::Disputed => Some(ControlEvent::Disputed),
        };
        if event.is_some() {
            return Ok(event);
        }
    }

    Ok(None)
}
