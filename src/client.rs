use async_trait::async_trait;
use thiserror::Error as ThisError;
use tracing::debug;

use crate::{
    error::{Error, Result},
    event::{ContractEvent, Event, EventDecoder},
    scval::{to_scval, Address, ScVal, Symbol},
    wire::{Channel, ChannelId, FromScVal, Params, Party, Signature, State},
};

#[cfg(test)]
pub(crate) mod mock;

const FN_OPEN: Symbol = Symbol::short("open");
const FN_FUND: Symbol = Symbol::short("fund");
const FN_CLOSE: Symbol = Symbol::short("close");
const FN_FORCE_CLOSE: Symbol = Symbol::short("force_close");
const FN_DISPUTE: Symbol = Symbol::short("dispute");
const FN_WITHDRAW: Symbol = Symbol::short("withdraw");
const FN_ABORT_FUNDING: Symbol = Symbol::short("abort_funding");
const FN_GET_CHANNEL: Symbol = Symbol::short("get_channel");

/// Opaque error of a [ContractBackend].
#[derive(ThisError, Debug)]
#[error("{source}")]
pub struct BackendError {
    source: Box<dyn std::error::Error + Send + Sync>,
    not_found: bool,
}

impl BackendError {
    pub fn new(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            source: e.into(),
            not_found: false,
        }
    }

    /// The contract reported that the queried channel does not exist, which
    /// is also the case once it was settled.
    pub fn channel_not_found(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            source: e.into(),
            not_found: true,
        }
    }

    pub fn is_channel_not_found(&self) -> bool {
        self.not_found
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for BackendError {
    fn from(source: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::new(source)
    }
}

/// Result of a submitted transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxResult {
    /// Events emitted during the transaction, in order.
    pub events: Vec<ContractEvent>,
}

/// Access to the chain, usually an RPC client holding the account used to
/// sign transactions.
#[async_trait]
pub trait ContractBackend: Send + Sync {
    /// Simulates a read-only call and returns its return value.
    async fn query(
        &self,
        contract: &Address,
        function: &Symbol,
        args: Vec<ScVal>,
    ) -> Result<ScVal, BackendError>;

    /// Submits a call in a transaction and waits for it to be included.
    async fn submit_call(
        &self,
        contract: &Address,
        function: &Symbol,
        args: Vec<ScVal>,
    ) -> Result<TxResult, BackendError>;
}

/// Calls the entry points of one deployed channel contract.
///
/// State-changing calls return the channel events emitted by the
/// transaction. Events from a different contract are rejected.
#[derive(Debug)]
pub struct ContractClient<B: ContractBackend> {
    backend: B,
    contract: Address,
    decoder: EventDecoder,
}

impl<B: ContractBackend> ContractClient<B> {
    pub fn new(backend: B, contract: Address) -> Self {
        ContractClient {
            backend,
            contract,
            decoder: EventDecoder::for_contract(contract),
        }
    }

    pub fn contract(&self) -> &Address {
        &self.contract
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn call(&self, function: Symbol, args: Vec<ScVal>) -> Result<Vec<Event>> {
        debug!(contract = ?self.contract, %function, "submitting contract call");
        let result = self
            .backend
            .submit_call(&self.contract, &function, args)
            .await?;
        Ok(self.decoder.decode(&result.events)?)
    }

    /// Opens the channel, `state` must be the initial state for `params`.
    pub async fn open(&self, params: &Params, state: &State) -> Result<Vec<Event>> {
        self.call(FN_OPEN, vec![to_scval(params)?, to_scval(state)?])
            .await
    }

    /// Deposits the balance of `party`.
    pub async fn fund(&self, channel_id: ChannelId, party: Party) -> Result<Vec<Event>> {
        self.call(FN_FUND, vec![channel_id.into(), party.into()])
            .await
    }

    /// Closes the channel cooperatively with a final state signed by both
    /// parties.
    pub async fn close(&self, state: &State, sigs: &[Signature; 2]) -> Result<Vec<Event>> {
        self.call(FN_CLOSE, signed_state_args(state, sigs)?).await
    }

    /// Closes a disputed channel after the challenge duration has passed.
    pub async fn force_close(&self, channel_id: ChannelId) -> Result<Vec<Event>> {
        self.call(FN_FORCE_CLOSE, vec![channel_id.into()]).await
    }

    /// Registers `state` on-chain, starting or continuing a dispute.
    pub async fn dispute(&self, state: &State, sigs: &[Signature; 2]) -> Result<Vec<Event>> {
        self.call(FN_DISPUTE, signed_state_args(state, sigs)?).await
    }

    /// Pays out the balance of `party` from a closed channel.
    pub async fn withdraw(&self, channel_id: ChannelId, party: Party) -> Result<Vec<Event>> {
        self.call(FN_WITHDRAW, vec![channel_id.into(), party.into()])
            .await
    }

    /// Refunds the party that already funded a channel the other party never
    /// funded.
    pub async fn abort_funding(&self, channel_id: ChannelId) -> Result<Vec<Event>> {
        self.call(FN_ABORT_FUNDING, vec![channel_id.into()]).await
    }

    /// Arguments of the `get_channel` query, computed once by pollers.
    pub fn get_channel_args(channel_id: ChannelId) -> Vec<ScVal> {
        vec![channel_id.into()]
    }

    /// Reads the channel stored under `channel_id`. Fails with
    /// [Error::ChannelNotFound] if the contract holds no such channel.
    pub async fn fetch_channel(&self, channel_id: ChannelId) -> Result<Channel> {
        self.fetch_channel_with_args(channel_id, Self::get_channel_args(channel_id))
            .await
    }

    /// [ContractClient::fetch_channel] with precomputed `args`.
    pub async fn fetch_channel_with_args(
        &self,
        channel_id: ChannelId,
        args: Vec<ScVal>,
    ) -> Result<Channel> {
        let val = match self.backend.query(&self.contract, &FN_GET_CHANNEL, args).await {
            Ok(val) => val,
            Err(e) if e.is_channel_not_found() => return Err(Error::ChannelNotFound(channel_id)),
            Err(e) => return Err(e.into()),
        };
        Ok(Channel::from_scval(&val)?)
    }
}

fn signed_state_args(state: &State, sigs: &[Signature; 2]) -> Result<Vec<ScVal>> {
    Ok(vec![to_scval(state)?, sigs[0].into(), sigs[1].into()])
}
