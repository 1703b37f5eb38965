//! Off-chain side of Perun payment channels settled by a Soroban contract on
//! Stellar.
//!
//! [wire] holds the contract's data types and [scval] their encoding.
//! [ContractClient] calls the contract, [event] turns what it emits into
//! typed events and [subscription] watches a channel by polling it. The
//! channel protocol drives all of this through [Funder] and [Adjudicator].

#[macro_use]
mod macros;

pub mod scval {
    mod error;
    mod hashing;
    mod ser;
    mod types;
    mod value;

    pub mod map;
    pub mod xdr;

    pub use error::{Error, Result};
    pub use hashing::{to_hash, Sha256Writer};
    pub use map::{make_map, make_symbol_map, map_value, ScMap, ScMapEntry};
    pub use ser::{to_scval, Serializer};
    pub use types::{Address, Symbol, MAX_SYMBOL_LEN};
    pub use value::ScVal;
}

pub mod adjudicator;
pub mod client;
pub mod config;
mod error;
pub mod event;
pub mod funder;
pub mod messages;
pub mod sig;
pub mod subscription;
pub mod wire;

pub use adjudicator::{Adjudicator, ContractAdjudicator};
pub use client::{BackendError, ContractBackend, ContractClient, TxResult};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use event::{Event, EventKind};
pub use funder::{ContractFunder, Funder};
pub use scval::{Address, ScVal, Symbol};
pub use subscription::{AdjudicatorEvent, PollingSubscription, SubscriptionState, Timeout};
