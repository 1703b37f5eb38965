use rand::{distributions::Standard, prelude::Distribution, Rng};
use serde::{Serialize, Serializer};

use super::{FromScVal, StructMap};
use crate::scval::{self, Address, Result, ScVal};

bytes_n!(
    /// ed25519 public key of a participant, used to verify state signatures.
    PublicKey,
    32
);
bytes_n!(Nonce, 32);
bytes_n!(
    /// sha256 of the encoded [Params].
    ChannelId,
    32
);
bytes_n!(
    /// ed25519 signature over the encoded [State].
    Signature,
    64
);

/// One of the two channel participants, encoded as `false` for A and `true`
/// for B.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Party {
    A,
    B,
}

impl Party {
    pub fn index(self) -> usize {
        match self {
            Party::A => 0,
            Party::B => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Party::A => Party::B,
            Party::B => Party::A,
        }
    }
}

impl From<bool> for Party {
    fn from(is_b: bool) -> Self {
        if is_b {
            Party::B
        } else {
            Party::A
        }
    }
}

impl From<Party> for bool {
    fn from(party: Party) -> Self {
        party == Party::B
    }
}

impl Serialize for Party {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bool((*self).into())
    }
}

impl FromScVal for Party {
    fn from_scval(val: &ScVal) -> Result<Self> {
        bool::from_scval(val).map(Party::from)
    }
}

impl From<Party> for ScVal {
    fn from(party: Party) -> Self {
        ScVal::Bool(party.into())
    }
}

#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Participant {
    pub addr: Address,
    pub pubkey: PublicKey,
}

impl FromScVal for Participant {
    fn from_scval(val: &ScVal) -> Result<Self> {
        let m = StructMap::new("Participant", val, &["addr", "pubkey"])?;
        Ok(Self {
            addr: m.field("addr")?,
            pubkey: m.field("pubkey")?,
        })
    }
}

/// Parameters of a channel, fixed when it is opened.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Params {
    pub a: Participant,
    pub b: Participant,
    pub nonce: Nonce,
    /// Seconds the other party has to respond to a dispute.
    pub challenge_duration: u64,
}

impl Params {
    /// Derives the channel ID the contract stores the channel under.
    pub fn channel_id(&self) -> Result<ChannelId> {
        scval::to_hash(self).map(ChannelId)
    }

    pub fn participant(&self, party: Party) -> &Participant {
        match party {
            Party::A => &self.a,
            Party::B => &self.b,
        }
    }
}

impl FromScVal for Params {
    fn from_scval(val: &ScVal) -> Result<Self> {
        let m = StructMap::new("Params", val, &["a", "b", "nonce", "challenge_duration"])?;
        Ok(Self {
            a: m.field("a")?,
            b: m.field("b")?,
            nonce: m.field("nonce")?,
            challenge_duration: m.field("challenge_duration")?,
        })
    }
}

/// Balances of both parties in a single token.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Balances {
    pub token: Address,
    pub bal_a: i128,
    pub bal_b: i128,
}

impl Balances {
    pub fn balance(&self, party: Party) -> i128 {
        match party {
            Party::A => self.bal_a,
            Party::B => self.bal_b,
        }
    }
}

impl FromScVal for Balances {
    fn from_scval(val: &ScVal) -> Result<Self> {
        let m = StructMap::new("Balances", val, &["token", "bal_a", "bal_b"])?;
        Ok(Self {
            token: m.field("token")?,
            bal_a: m.field("bal_a")?,
            bal_b: m.field("bal_b")?,
        })
    }
}

/// Off-chain state of a channel, signed by both participants.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct State {
    pub channel_id: ChannelId,
    pub balances: Balances,
    pub version: u64,
    pub finalized: bool,
}

impl State {
    /// Initial state of the channel described by `params`.
    pub fn new(params: &Params, balances: Balances) -> Result<Self> {
        Ok(State {
            channel_id: params.channel_id()?,
            balances,
            version: 0,
            finalized: false,
        })
    }

    /// Create a new state that will replace this state, with the version
    /// incremented. `None` if the version is exhausted.
    pub fn make_next_state(&self) -> Option<Self> {
        Some(State {
            version: self.version.checked_add(1)?,
            ..*self
        })
    }
}

impl FromScVal for State {
    fn from_scval(val: &ScVal) -> Result<Self> {
        let m = StructMap::new(
            "State",
            val,
            &["channel_id", "balances", "version", "finalized"],
        )?;
        Ok(Self {
            channel_id: m.field("channel_id")?,
            balances: m.field("balances")?,
            version: m.field("version")?,
            finalized: m.field("finalized")?,
        })
    }
}

/// On-chain progress flags of a channel.
///
/// Every flag is latched by the contract: once set it is never cleared.
#[derive(Serialize, Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Control {
    pub funded_a: bool,
    pub funded_b: bool,
    pub closed: bool,
    pub withdrawn_a: bool,
    pub withdrawn_b: bool,
    pub disputed: bool,
    /// Ledger time of the last dispute, in seconds.
    pub timestamp: u64,
}

impl Control {
    pub fn funded(&self, party: Party) -> bool {
        match party {
            Party::A => self.funded_a,
            Party::B => self.funded_b,
        }
    }

    pub fn withdrawn(&self, party: Party) -> bool {
        match party {
            Party::A => self.withdrawn_a,
            Party::B => self.withdrawn_b,
        }
    }

    pub fn is_funded(&self) -> bool {
        self.funded_a && self.funded_b
    }

    pub fn is_withdrawn(&self) -> bool {
        self.withdrawn_a && self.withdrawn_b
    }
}

impl FromScVal for Control {
    fn from_scval(val: &ScVal) -> Result<Self> {
        let m = StructMap::new(
            "Control",
            val,
            &[
                "funded_a",
                "funded_b",
                "closed",
                "withdrawn_a",
                "withdrawn_b",
                "disputed",
                "timestamp",
            ],
        )?;
        Ok(Self {
            funded_a: m.field("funded_a")?,
            funded_b: m.field("funded_b")?,
            closed: m.field("closed")?,
            withdrawn_a: m.field("withdrawn_a")?,
            withdrawn_b: m.field("withdrawn_b")?,
            disputed: m.field("disputed")?,
            timestamp: m.field("timestamp")?,
        })
    }
}

/// Everything the contract stores about a channel.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Channel {
    pub params: Params,
    pub state: State,
    pub control: Control,
}

impl Channel {
    pub fn id(&self) -> ChannelId {
        self.state.channel_id
    }
}

impl FromScVal for Channel {
    fn from_scval(val: &ScVal) -> Result<Self> {
        let m = StructMap::new("Channel", val, &["params", "state", "control"])?;
        Ok(Self {
            params: m.field("params")?,
            state: m.field("state")?,
            control: m.field("control")?,
        })
    }
}

impl Distribution<Participant> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Participant {
        let pubkey: PublicKey = rng.gen();
        Participant {
            addr: Address::Account(pubkey.0),
            pubkey,
        }
    }
}

impl Distribution<Params> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Params {
        Params {
            a: rng.gen(),
            b: rng.gen(),
            nonce: rng.gen(),
            challenge_duration: rng.gen_range(1..=86_400),
        }
    }
}

impl Distribution<Balances> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Balances {
        Balances {
            token: Address::Contract(rng.gen()),
            bal_a: rng.gen_range(0..1_000_000_000),
            bal_b: rng.gen_range(0..1_000_000_000),
        }
    }
}

impl Distribution<State> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> State {
        State {
            channel_id: rng.gen(),
            balances: rng.gen(),
            version: rng.gen(),
            finalized: rng.gen(),
        }
    }
}

impl Distribution<Control> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Control {
        Control {
            funded_a: rng.gen(),
            funded_b: rng.gen(),
            closed: rng.gen(),
            withdrawn_a: rng.gen(),
            withdrawn_b: rng.gen(),
            disputed: rng.gen(),
            timestamp: rng.gen(),
        }
    }
}

/// A freshly opened channel: the state matches the params and no flag is set.
impl Distribution<Channel> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Channel {
        let params: Params = rng.gen();
        let state = State {
            channel_id: ChannelId(random_channel_id(&params, rng)),
            balances: rng.gen(),
            version: 0,
            finalized: false,
        };
        Channel {
            params,
            state,
            control: Control::default(),
        }
    }
}

fn random_channel_id<R: Rng + ?Sized>(params: &Params, rng: &mut R) -> [u8; 32] {
    // Hashing a well-formed Params never fails, fall back to a random id
    // instead of panicking inside a Distribution.
    match params.channel_id() {
        Ok(id) => id.0,
        Err(_) => rng.gen(),
    }
}

