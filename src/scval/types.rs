use std::borrow::Cow;
use std::fmt::{Debug, Display};

use rand::{distributions::Standard, prelude::Distribution};
use serde::{Serialize, Serializer};

use super::{
    error::{Error, Result},
    ser::MARK_ADDRESS_NAME,
};

/// Maximum length of a [Symbol] in characters.
pub const MAX_SYMBOL_LEN: usize = 32;

const fn is_valid_symbol(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() > MAX_SYMBOL_LEN {
        return false;
    }
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if !(c.is_ascii_alphanumeric() || c == b'_') {
            return false;
        }
        i += 1;
    }
    true
}

/// Short identifier made of at most 32 characters from `[a-zA-Z0-9_]`.
///
/// Used for contract function names, event topics and struct field names.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Cow<'static, str>);

impl Symbol {
    /// Symbol from a string literal, checked at compile time when used in a
    /// `const`.
    pub const fn short(s: &'static str) -> Self {
        assert!(is_valid_symbol(s), "invalid symbol");
        Symbol(Cow::Borrowed(s))
    }

    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if is_valid_symbol(&s) {
            Ok(Symbol(Cow::Owned(s)))
        } else {
            Err(Error::InvalidSymbol(s))
        }
    }

    /// Only for field names known to be valid (struct fields of our own
    /// types).
    pub(crate) const fn from_static_unchecked(s: &'static str) -> Self {
        Symbol(Cow::Borrowed(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl Serialize for Symbol {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Symbols have no counterpart in the serde data model. Other
        // serializers see a plain string.
        serializer.serialize_newtype_struct(super::ser::MARK_SYMBOL_NAME, self.as_str())
    }
}

pub(crate) const ADDRESS_ACCOUNT: u32 = 0;
pub(crate) const ADDRESS_CONTRACT: u32 = 1;

/// On-chain address: either an account (ed25519 public key) or a contract
/// (hash of the contract id).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Address {
    Account([u8; 32]),
    Contract([u8; 32]),
}

impl Address {
    pub fn bytes(&self) -> &[u8; 32] {
        match self {
            Address::Account(b) | Address::Contract(b) => b,
        }
    }

    pub fn is_contract(&self) -> bool {
        matches!(self, Address::Contract(_))
    }

    pub(crate) fn from_parts(kind: u32, bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| Error::InvalidLength {
            expected: 32,
            found: bytes.len(),
        })?;
        match kind {
            ADDRESS_ACCOUNT => Ok(Address::Account(bytes)),
            ADDRESS_CONTRACT => Ok(Address::Contract(bytes)),
            _ => Err(Error::UnknownDiscriminant {
                what: "address",
                value: kind as i32,
            }),
        }
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let (name, bytes) = match self {
            Address::Account(b) => ("Account", b),
            Address::Contract(b) => ("Contract", b),
        };
        f.write_str(name)?;
        f.write_str("(0x")?;
        for b in bytes {
            f.write_fmt(format_args!("{:02x}", b))?;
        }
        f.write_str(")")
    }
}

/// Allows serializing a slice with `serialize_bytes` from within a tuple,
/// where only `serialize_element` is available.
pub(crate) struct RawBytes<'a>(pub &'a [u8]);

impl<'a> Serialize for RawBytes<'a> {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(self.0)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let kind = match self {
            Address::Account(_) => ADDRESS_ACCOUNT,
            Address::Contract(_) => ADDRESS_CONTRACT,
        };
        serializer.serialize_newtype_struct(MARK_ADDRESS_NAME, &(kind, RawBytes(self.bytes())))
    }
}

impl Distribution<Address> for Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Address {
        if rng.gen() {
            Address::Contract(rng.gen())
        } else {
            Address::Account(rng.gen())
        }
    }
}
