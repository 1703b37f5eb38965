use super::{map::ScMap, types::Address, Symbol};

/// A node of the tagged value tree passed to and returned from contract
/// calls.
///
/// The variants are declared in the order of their XDR discriminants, so the
/// derived [Ord] orders values of different types the same way the contract
/// host does. This is what map keys are sorted by.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScVal {
    Bool(bool),
    Void,
    U32(u32),
    U64(u64),
    I64(i64),
    /// Encoded as `hi: i64, lo: u64` on the wire.
    I128(i128),
    Bytes(Vec<u8>),
    String(String),
    Symbol(Symbol),
    Vec(Vec<ScVal>),
    Map(ScMap),
    Address(Address),
}

impl ScVal {
    /// Name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScVal::Bool(_) => "bool",
            ScVal::Void => "void",
            ScVal::U32(_) => "u32",
            ScVal::U64(_) => "u64",
            ScVal::I64(_) => "i64",
            ScVal::I128(_) => "i128",
            ScVal::Bytes(_) => "bytes",
            ScVal::String(_) => "string",
            ScVal::Symbol(_) => "symbol",
            ScVal::Vec(_) => "vec",
            ScVal::Map(_) => "map",
            ScVal::Address(_) => "address",
        }
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        ScVal::Bytes(bytes.into())
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            ScVal::Symbol(sym) => Some(sym),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ScMap> {
        match self {
            ScVal::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_vec(&self) -> Option<&[ScVal]> {
        match self {
            ScVal::Vec(elems) => Some(elems),
            _ => None,
        }
    }
}

impl From<bool> for ScVal {
    fn from(v: bool) -> Self {
        ScVal::Bool(v)
    }
}

impl From<u32> for ScVal {
    fn from(v: u32) -> Self {
        ScVal::U32(v)
    }
}

impl From<u64> for ScVal {
    fn from(v: u64) -> Self {
        ScVal::U64(v)
    }
}

impl From<i64> for ScVal {
    fn from(v: i64) -> Self {
        ScVal::I64(v)
    }
}

impl From<i128> for ScVal {
    fn from(v: i128) -> Self {
        ScVal::I128(v)
    }
}

impl From<Symbol> for ScVal {
    fn from(v: Symbol) -> Self {
        ScVal::Symbol(v)
    }
}

impl From<Address> for ScVal {
    fn from(v: Address) -> Self {
        ScVal::Address(v)
    }
}

impl From<ScMap> for ScVal {
    fn from(v: ScMap) -> Self {
        ScVal::Map(v)
    }
}

impl From<Vec<ScVal>> for ScVal {
    fn from(v: Vec<ScVal>) -> Self {
        ScVal::Vec(v)
    }
}
