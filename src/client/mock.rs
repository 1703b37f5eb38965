//! In-memory channel contract used by the tests.
//!
//! Implements the entry points of the deployed contract on top of a map of
//! channels, emitting the same events. Queries can be scripted to return a
//! sequence of snapshots or failures instead.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{BackendError, ContractBackend, ContractClient, TxResult};
use crate::{
    event::{ContractEvent, EventKind, PERUN, TRANSFER},
    messages::{AdjudicatorReq, LedgerChannelFundingRequest, Transaction},
    scval::{self, to_scval, Address, ScVal, Symbol},
    sig::{verify_state, Signer},
    wire::{Balances, Channel, ChannelId, Control, FromScVal, Params, Participant, Party, Signature, State},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ContractError {
    ChannelIdMismatch,
    InvalidVersionNumber,
    OpenOnFinalState,
    ChannelAlreadyExists,
    ChannelNotFound,
    EncodingError,
    AlreadyFunded,
    AlreadyWithdrawn,
    CloseOnNonFinalState,
    InvalidSignature,
    OperationOnUnfundedChannel,
    WithdrawOnOpenChannel,
    DisputeOnClosedChannel,
    InvalidStateTransition,
    ForceCloseOnClosedChannel,
    ForceCloseOnUndisputedChannel,
    TimelockNotExpired,
    AbortFundingOnFundedChannel,
    AbortFundingWithoutFunds,
    UnknownFunction,
}

impl From<scval::Error> for ContractError {
    fn from(_: scval::Error) -> Self {
        ContractError::EncodingError
    }
}

type CallResult = Result<Vec<ContractEvent>, ContractError>;

#[derive(Default)]
struct Inner {
    channels: HashMap<ChannelId, Channel>,
    now: u64,
    calls: Vec<(Symbol, Vec<ScVal>)>,
    queries: usize,
    scripted: VecDeque<Result<ScVal, String>>,
    failing_submits: usize,
}

pub(crate) struct MockBackend {
    contract: Address,
    emitter: Address,
    inner: Mutex<Inner>,
}

impl MockBackend {
    pub fn new(contract: Address) -> Self {
        Self::with_emitter(contract, contract)
    }

    /// Backend whose events name `emitter` as the emitting contract.
    pub fn with_emitter(contract: Address, emitter: Address) -> Self {
        Self {
            contract,
            emitter,
            inner: Mutex::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn set_time(&self, now: u64) {
        self.lock().now = now;
    }

    pub fn calls(&self) -> Vec<(Symbol, Vec<ScVal>)> {
        self.lock().calls.clone()
    }

    /// Number of submitted calls to `function`.
    pub fn called(&self, function: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|(f, _)| f.as_str() == function)
            .count()
    }

    pub fn queries(&self) -> usize {
        self.lock().queries
    }

    /// The next query returns `channel` instead of the stored one.
    pub fn push_query(&self, channel: Channel) {
        let val = to_scval(&channel).unwrap();
        self.lock().scripted.push_back(Ok(val));
    }

    pub fn push_raw_query(&self, val: ScVal) {
        self.lock().scripted.push_back(Ok(val));
    }

    pub fn push_query_error(&self, msg: &str) {
        self.lock().scripted.push_back(Err(msg.to_owned()));
    }

    /// The next `n` submitted calls fail without reaching the contract.
    pub fn fail_submits(&self, n: usize) {
        self.lock().failing_submits = n;
    }

    pub fn channel(&self, id: &ChannelId) -> Option<Channel> {
        self.lock().channels.get(id).copied()
    }

    fn event(&self, kind: EventKind, data: ScVal) -> ContractEvent {
        ContractEvent {
            contract: Some(self.emitter),
            topics: vec![ScVal::Symbol(PERUN), ScVal::Symbol(kind.symbol())],
            data,
        }
    }

    fn channel_event(&self, kind: EventKind, channel: &Channel) -> ContractEvent {
        self.event(kind, to_scval(channel).unwrap())
    }

    fn party_event(&self, kind: EventKind, channel: &Channel, party: Party) -> ContractEvent {
        self.event(kind, to_scval(&(channel, party)).unwrap())
    }

    fn transfer(&self, token: Address, from: Address, to: Address, amount: i128) -> ContractEvent {
        ContractEvent {
            contract: Some(token),
            topics: vec![
                ScVal::Symbol(TRANSFER),
                ScVal::Address(from),
                ScVal::Address(to),
            ],
            data: ScVal::I128(amount),
        }
    }

    fn execute(&self, inner: &mut Inner, function: &str, args: &[ScVal]) -> CallResult {
        match function {
            "open" => self.open(inner, arg(args, 0)?, arg(args, 1)?),
            "fund" => self.fund(inner, arg(args, 0)?, arg(args, 1)?),
            "close" => self.close(inner, arg(args, 0)?, [arg(args, 1)?, arg(args, 2)?]),
            "force_close" => self.force_close(inner, arg(args, 0)?),
            "dispute" => self.dispute(inner, arg(args, 0)?, [arg(args, 1)?, arg(args, 2)?]),
            "withdraw" => self.withdraw(inner, arg(args, 0)?, arg(args, 1)?),
            "abort_funding" => self.abort_funding(inner, arg(args, 0)?),
            _ => Err(ContractError::UnknownFunction),
        }
    }

    fn open(&self, inner: &mut Inner, params: Params, state: State) -> CallResult {
        let cid = params.channel_id()?;
        if cid != state.channel_id {
            return Err(ContractError::ChannelIdMismatch);
        }
        if state.version != 0 {
            return Err(ContractError::InvalidVersionNumber);
        }
        if state.finalized {
            return Err(ContractError::OpenOnFinalState);
        }
        if inner.channels.contains_key(&cid) {
            return Err(ContractError::ChannelAlreadyExists);
        }
        let channel = Channel {
            params,
            state,
            control: Control {
                funded_a: state.balances.bal_a == 0,
                funded_b: state.balances.bal_b == 0,
                timestamp: inner.now,
                ..Default::default()
            },
        };
        inner.channels.insert(cid, channel);
        Ok(vec![self.channel_event(EventKind::Open, &channel)])
    }

    fn fund(&self, inner: &mut Inner, cid: ChannelId, party: Party) -> CallResult {
        let mut channel = get(inner, &cid)?;
        if channel.control.funded(party) {
            return Err(ContractError::AlreadyFunded);
        }
        match party {
            Party::A => channel.control.funded_a = true,
            Party::B => channel.control.funded_b = true,
        }
        inner.channels.insert(cid, channel);

        let balances = channel.state.balances;
        let mut events = vec![
            self.transfer(
                balances.token,
                channel.params.participant(party).addr,
                self.contract,
                balances.balance(party),
            ),
            self.party_event(EventKind::Fund, &channel, party),
        ];
        if channel.control.is_funded() {
            events.push(self.channel_event(EventKind::FundConfirmed, &channel));
        }
        Ok(events)
    }

    fn close(&self, inner: &mut Inner, state: State, sigs: [Signature; 2]) -> CallResult {
        if !state.finalized {
            return Err(ContractError::CloseOnNonFinalState);
        }
        let mut channel = get(inner, &state.channel_id)?;
        if !channel.control.is_funded() {
            return Err(ContractError::OperationOnUnfundedChannel);
        }
        verify(&channel.params, &state, &sigs)?;

        channel.control.closed = true;
        channel.state = state;
        set_withdrawn_for_empty(&mut channel);
        store_or_delete(inner, channel);
        Ok(vec![self.channel_event(EventKind::Closed, &channel)])
    }

    fn force_close(&self, inner: &mut Inner, cid: ChannelId) -> CallResult {
        let mut channel = get(inner, &cid)?;
        if channel.control.closed {
            return Err(ContractError::ForceCloseOnClosedChannel);
        }
        if !channel.control.is_funded() {
            return Err(ContractError::OperationOnUnfundedChannel);
        }
        if !channel.control.disputed {
            return Err(ContractError::ForceCloseOnUndisputedChannel);
        }
        if channel.control.timestamp + channel.params.challenge_duration > inner.now {
            return Err(ContractError::TimelockNotExpired);
        }

        channel.control.closed = true;
        set_withdrawn_for_empty(&mut channel);
        store_or_delete(inner, channel);
        Ok(vec![self.channel_event(EventKind::ForceClosed, &channel)])
    }

    fn dispute(&self, inner: &mut Inner, state: State, sigs: [Signature; 2]) -> CallResult {
        let mut channel = get(inner, &state.channel_id)?;
        if !channel.control.is_funded() {
            return Err(ContractError::OperationOnUnfundedChannel);
        }
        if channel.control.closed {
            return Err(ContractError::DisputeOnClosedChannel);
        }
        if !is_valid_state_transition(&channel.state, &state) {
            return Err(ContractError::InvalidStateTransition);
        }
        verify(&channel.params, &state, &sigs)?;

        channel.control.disputed = true;
        channel.control.timestamp = inner.now;
        channel.state = state;
        inner.channels.insert(state.channel_id, channel);
        Ok(vec![self.channel_event(EventKind::Dispute, &channel)])
    }

    fn withdraw(&self, inner: &mut Inner, cid: ChannelId, party: Party) -> CallResult {
        let mut channel = get(inner, &cid)?;
        if !channel.control.closed {
            return Err(ContractError::WithdrawOnOpenChannel);
        }
        if channel.control.withdrawn(party) {
            return Err(ContractError::AlreadyWithdrawn);
        }
        match party {
            Party::A => channel.control.withdrawn_a = true,
            Party::B => channel.control.withdrawn_b = true,
        }
        store_or_delete(inner, channel);

        let balances = channel.state.balances;
        let mut events = vec![
            self.party_event(EventKind::Withdraw, &channel, party),
            self.transfer(
                balances.token,
                self.contract,
                channel.params.participant(party).addr,
                balances.balance(party),
            ),
        ];
        if channel.control.is_withdrawn() {
            events.push(self.channel_event(EventKind::Withdrawn, &channel));
        }
        Ok(events)
    }

    fn abort_funding(&self, inner: &mut Inner, cid: ChannelId) -> CallResult {
        let channel = get(inner, &cid)?;
        if channel.control.is_funded() {
            return Err(ContractError::AbortFundingOnFundedChannel);
        }
        let party = match (channel.control.funded_a, channel.control.funded_b) {
            (true, _) => Party::A,
            (_, true) => Party::B,
            _ => return Err(ContractError::AbortFundingWithoutFunds),
        };
        inner.channels.remove(&cid);

        let balances = channel.state.balances;
        Ok(vec![self.transfer(
            balances.token,
            self.contract,
            channel.params.participant(party).addr,
            balances.balance(party),
        )])
    }
}

fn arg<T: FromScVal>(args: &[ScVal], i: usize) -> Result<T, ContractError> {
    let val = args.get(i).ok_or(ContractError::EncodingError)?;
    Ok(T::from_scval(val)?)
}

fn get(inner: &Inner, cid: &ChannelId) -> Result<Channel, ContractError> {
    inner
        .channels
        .get(cid)
        .copied()
        .ok_or(ContractError::ChannelNotFound)
}

fn verify(params: &Params, state: &State, sigs: &[Signature; 2]) -> Result<(), ContractError> {
    for party in [Party::A, Party::B] {
        verify_state(
            &params.participant(party).pubkey,
            state,
            &sigs[party.index()],
        )
        .map_err(|_| ContractError::InvalidSignature)?;
    }
    Ok(())
}

fn set_withdrawn_for_empty(channel: &mut Channel) {
    channel.control.withdrawn_a = channel.state.balances.bal_a == 0;
    channel.control.withdrawn_b = channel.state.balances.bal_b == 0;
}

fn store_or_delete(inner: &mut Inner, channel: Channel) {
    if channel.control.closed && channel.control.is_withdrawn() {
        inner.channels.remove(&channel.id());
    } else {
        inner.channels.insert(channel.id(), channel);
    }
}

fn is_valid_state_transition(old: &State, new: &State) -> bool {
    if old.finalized {
        return false;
    }
    if old.version == 0 && new.version == 0 {
        return old == new;
    } else if old.version >= new.version {
        return false;
    }
    old.channel_id == new.channel_id
        && old.balances.token == new.balances.token
        && old.balances.bal_a + old.balances.bal_b == new.balances.bal_a + new.balances.bal_b
}

#[async_trait]
impl ContractBackend for MockBackend {
    async fn query(
        &self,
        contract: &Address,
        function: &Symbol,
        args: Vec<ScVal>,
    ) -> Result<ScVal, BackendError> {
        let mut inner = self.lock();
        inner.queries += 1;
        if let Some(scripted) = inner.scripted.pop_front() {
            return scripted.map_err(BackendError::new);
        }
        if *contract != self.contract || function.as_str() != "get_channel" {
            return Err(BackendError::new("unknown contract function"));
        }
        let cid: ChannelId = arg(&args, 0).map_err(|e| BackendError::new(format!("{:?}", e)))?;
        let channel = get(&inner, &cid)
            .map_err(|e| BackendError::channel_not_found(format!("contract error: {:?}", e)))?;
        to_scval(&channel).map_err(|e| BackendError::new(e.to_string()))
    }

    async fn submit_call(
        &self,
        contract: &Address,
        function: &Symbol,
        args: Vec<ScVal>,
    ) -> Result<TxResult, BackendError> {
        let mut inner = self.lock();
        if inner.failing_submits > 0 {
            inner.failing_submits -= 1;
            return Err(BackendError::new("transaction submission failed"));
        }
        if *contract != self.contract {
            return Err(BackendError::new("unknown contract"));
        }
        inner.calls.push((function.clone(), args.clone()));
        let events = self
            .execute(&mut inner, function.as_str(), &args)
            .map_err(|e| BackendError::new(format!("contract error: {:?}", e)))?;
        Ok(TxResult { events })
    }
}

/// Two participants with keys, a funded-to-be channel and a mock contract.
pub(crate) struct Setup {
    pub contract: Address,
    pub signers: [Signer; 2],
    pub params: Params,
    pub state: State,
}

impl Setup {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let signers = [Signer::new(&mut rng), Signer::new(&mut rng)];
        let participant = |signer: &Signer| Participant {
            addr: Address::Account(signer.public_key().0),
            pubkey: signer.public_key(),
        };
        let params = Params {
            a: participant(&signers[0]),
            b: participant(&signers[1]),
            nonce: rng.gen(),
            challenge_duration: 100,
        };
        let balances = Balances {
            token: Address::Contract(rng.gen()),
            bal_a: 100,
            bal_b: 50,
        };
        let state = State::new(&params, balances).unwrap();
        Self {
            contract: Address::Contract(rng.gen()),
            signers,
            params,
            state,
        }
    }

    pub fn with_balances(mut self, bal_a: i128, bal_b: i128) -> Self {
        self.state.balances.bal_a = bal_a;
        self.state.balances.bal_b = bal_b;
        self
    }

    pub fn channel_id(&self) -> ChannelId {
        self.state.channel_id
    }

    pub fn client(&self) -> ContractClient<MockBackend> {
        ContractClient::new(MockBackend::new(self.contract), self.contract)
    }

    pub fn shared_client(&self) -> Arc<ContractClient<MockBackend>> {
        Arc::new(self.client())
    }

    /// `state` signed by both participants.
    pub fn tx(&self, state: State) -> Transaction {
        Transaction {
            state,
            sigs: [
                self.signers[0].sign_state(&state).unwrap(),
                self.signers[1].sign_state(&state).unwrap(),
            ],
        }
    }

    pub fn funding_req(&self, party: Party) -> LedgerChannelFundingRequest {
        LedgerChannelFundingRequest {
            party,
            params: self.params,
            state: self.state,
        }
    }

    pub fn adjudicator_req(&self, state: State, party: Party, secondary: bool) -> AdjudicatorReq {
        AdjudicatorReq {
            params: self.params,
            tx: self.tx(state),
            party,
            secondary,
        }
    }

    /// The stored channel after opening with both parties funded.
    pub fn funded_channel(&self) -> Channel {
        Channel {
            params: self.params,
            state: self.state,
            control: Control {
                funded_a: true,
                funded_b: true,
                ..Default::default()
            },
        }
    }
}
