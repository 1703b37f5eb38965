//! Requests handed to the [Funder][crate::Funder] and
//! [Adjudicator][crate::Adjudicator] by the channel protocol.

use crate::{
    sig::{self, verify_state},
    wire::{Params, Party, Signature, State},
};

/// Ask the funder to open (party A) and fund a ledger channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerChannelFundingRequest {
    /// The party we fund for.
    pub party: Party,
    pub params: Params,
    /// The initial state.
    pub state: State,
}

/// A state with the signatures of both participants, indexed by
/// [Party::index].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    pub state: State,
    pub sigs: [Signature; 2],
}

impl Transaction {
    /// Checks the signatures of both participants of `params`.
    pub fn verify(&self, params: &Params) -> Result<(), sig::Error> {
        for party in [Party::A, Party::B] {
            verify_state(
                &params.participant(party).pubkey,
                &self.state,
                &self.sigs[party.index()],
            )?;
        }
        Ok(())
    }
}

/// Ask the adjudicator to register or conclude a channel on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjudicatorReq {
    pub params: Params,
    pub tx: Transaction,
    /// The party we act for.
    pub party: Party,
    /// Set if the other party is expected to close the channel, in which case
    /// we give it time to do so before closing it ourselves.
    pub secondary: bool,
}
