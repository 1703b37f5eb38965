//! Rust representations of the channel contract's data types and their
//! conversion to and from [ScVal].
//!
//! Encoding is driven by [serde::Serialize] (see [crate::scval::to_scval]),
//! decoding goes through [FromScVal], which reports the full path of the
//! field a decoding error occurred in.

mod decode;
mod types;

pub use decode::{FromScVal, StructMap};
pub use types::{
    Balances, Channel, ChannelId, Control, Nonce, Params, Participant, Party, PublicKey,
    Signature, State,
};

use serde::Serialize;

use crate::scval::{self, xdr, Result, ScVal};

/// Types with a fixed representation in the channel contract.
pub trait ScType: Serialize + FromScVal {
    fn to_scval(&self) -> Result<ScVal> {
        scval::to_scval(self)
    }

    /// XDR encoding of [ScType::to_scval].
    fn marshal(&self) -> Result<Vec<u8>> {
        xdr::to_xdr(&ScType::to_scval(self)?)
    }

    fn unmarshal(bytes: &[u8]) -> Result<Self> {
        Self::from_scval(&xdr::from_xdr(bytes)?)
    }
}

impl ScType for Participant {}
impl ScType for Params {}
impl ScType for Balances {}
impl ScType for State {}
impl ScType for Control {}
impl ScType for Channel {}
