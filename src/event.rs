//! Typed events of the channel contract.
//!
//! Events reach us two ways: decoded from the events a transaction emitted
//! ([decoder]) or derived by comparing two polled [Control] snapshots
//! ([diff]). Both produce [Event].

pub mod decoder;
pub mod diff;

pub use decoder::{decode_events, ContractEvent, DecodeError, EventDecoder};
pub use diff::{diff, identical_controls, ControlEvent, ControlFlag, TransitionError};

use crate::{
    scval::Symbol,
    wire::{Channel, ChannelId, Control, Party},
};

/// First topic of every event emitted by the channel contract.
pub const PERUN: Symbol = Symbol::short("perun");
/// First topic of token transfer events, emitted alongside ours.
pub const TRANSFER: Symbol = Symbol::short("transfer");

/// Kinds of events emitted by the channel contract, see [EventKind::symbol]
/// for their on-chain names.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Open,
    Fund,
    FundConfirmed,
    Closed,
    Withdraw,
    Withdrawn,
    ForceClosed,
    Dispute,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Open,
        EventKind::Fund,
        EventKind::FundConfirmed,
        EventKind::Closed,
        EventKind::Withdraw,
        EventKind::Withdrawn,
        EventKind::ForceClosed,
        EventKind::Dispute,
    ];

    /// The second topic identifying this kind.
    pub fn symbol(self) -> Symbol {
        match self {
            EventKind::Open => Symbol::short("open"),
            EventKind::Fund => Symbol::short("fund"),
            EventKind::FundConfirmed => Symbol::short("fund_c"),
            EventKind::Closed => Symbol::short("closed"),
            EventKind::Withdraw => Symbol::short("withdraw"),
            EventKind::Withdrawn => Symbol::short("pay_c"),
            EventKind::ForceClosed => Symbol::short("f_closed"),
            EventKind::Dispute => Symbol::short("dispute"),
        }
    }

    pub fn from_symbol(sym: &Symbol) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.symbol() == *sym)
    }

    /// Whether the payload is a `(Channel, bool)` pair instead of a bare
    /// channel.
    pub fn has_party(self) -> bool {
        matches!(self, EventKind::Fund | EventKind::Withdraw)
    }
}

/// An event together with the channel snapshot it carries.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    Open(Channel),
    Fund { channel: Channel, party: Party },
    FundConfirmed(Channel),
    Closed(Channel),
    Withdraw { channel: Channel, party: Party },
    Withdrawn(Channel),
    ForceClosed(Channel),
    Dispute(Channel),
}

impl Event {
    pub(crate) fn new(kind: EventKind, channel: Channel, party: Party) -> Self {
        match kind {
            EventKind::Open => Event::Open(channel),
            EventKind::Fund => Event::Fund { channel, party },
            EventKind::FundConfirmed => Event::FundConfirmed(channel),
            EventKind::Closed => Event::Closed(channel),
            EventKind::Withdraw => Event::Withdraw { channel, party },
            EventKind::Withdrawn => Event::Withdrawn(channel),
            EventKind::ForceClosed => Event::ForceClosed(channel),
            EventKind::Dispute => Event::Dispute(channel),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::Open(_) => EventKind::Open,
            Event::Fund { .. } => EventKind::Fund,
            Event::FundConfirmed(_) => EventKind::FundConfirmed,
            Event::Closed(_) => EventKind::Closed,
            Event::Withdraw { .. } => EventKind::Withdraw,
            Event::Withdrawn(_) => EventKind::Withdrawn,
            Event::ForceClosed(_) => EventKind::ForceClosed,
            Event::Dispute(_) => EventKind::Dispute,
        }
    }

    pub fn channel(&self) -> &Channel {
        match self {
            Event::Open(channel)
            | Event::Fund { channel, .. }
            | Event::FundConfirmed(channel)
            | Event::Closed(channel)
            | Event::Withdraw { channel, .. }
            | Event::Withdrawn(channel)
            | Event::ForceClosed(channel)
            | Event::Dispute(channel) => channel,
        }
    }

    /// ID of the channel's state at the time of the event.
    pub fn channel_id(&self) -> ChannelId {
        self.channel().state.channel_id
    }

    pub fn version(&self) -> u64 {
        self.channel().state.version
    }

    pub fn control(&self) -> &Control {
        &self.channel().control
    }

    /// The acting party for [Event::Fund] and [Event::Withdraw].
    pub fn party(&self) -> Option<Party> {
        match self {
            Event::Fund { party, .. } | Event::Withdraw { party, .. } => Some(*party),
            _ => None,
        }
    }
}
