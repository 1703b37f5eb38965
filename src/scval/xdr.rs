//! XDR encoding of [ScVal] trees.
//!
//! Every node is a 4 byte big-endian discriminant followed by its payload.
//! Variable length payloads carry a 4 byte length and are padded with zeros to
//! a multiple of 4 bytes. Vec and map payloads are optional on the wire and
//! start with a presence flag, absent containers are rejected when decoding.

use super::{
    error::{Error, Result},
    map::{ScMap, ScMapEntry},
    types::{Address, ADDRESS_ACCOUNT, ADDRESS_CONTRACT},
    ScVal, Symbol,
};

const TAG_BOOL: i32 = 0;
const TAG_VOID: i32 = 1;
const TAG_U32: i32 = 3;
const TAG_U64: i32 = 5;
const TAG_I64: i32 = 6;
const TAG_I128: i32 = 10;
const TAG_BYTES: i32 = 13;
const TAG_STRING: i32 = 14;
const TAG_SYMBOL: i32 = 15;
const TAG_VEC: i32 = 16;
const TAG_MAP: i32 = 17;
const TAG_ADDRESS: i32 = 18;

const PUBLIC_KEY_TYPE_ED25519: i32 = 0;

/// Decoding gives up on trees nested deeper than this.
pub const MAX_DEPTH: usize = 128;

/// Sink for encoded bytes.
///
/// Implemented by `Vec<u8>` and by the hasher computing channel IDs, which
/// allows hashing without materializing the encoding.
pub trait Writer {
    fn write(&mut self, bytes: &[u8]);
}

impl Writer for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// Encodes `value` into `writer`.
pub fn to_writer<W: Writer>(value: &ScVal, writer: &mut W) -> Result<()> {
    match value {
        ScVal::Bool(v) => {
            write_i32(writer, TAG_BOOL);
            write_u32(writer, *v as u32);
        }
        ScVal::Void => write_i32(writer, TAG_VOID),
        ScVal::U32(v) => {
            write_i32(writer, TAG_U32);
            write_u32(writer, *v);
        }
        ScVal::U64(v) => {
            write_i32(writer, TAG_U64);
            writer.write(&v.to_be_bytes());
        }
        ScVal::I64(v) => {
            write_i32(writer, TAG_I64);
            writer.write(&v.to_be_bytes());
        }
        ScVal::I128(v) => {
            write_i32(writer, TAG_I128);
            let hi = (*v >> 64) as i64;
            let lo = *v as u64;
            writer.write(&hi.to_be_bytes());
            writer.write(&lo.to_be_bytes());
        }
        ScVal::Bytes(v) => {
            write_i32(writer, TAG_BYTES);
            write_opaque(writer, v)?;
        }
        ScVal::String(v) => {
            write_i32(writer, TAG_STRING);
            write_opaque(writer, v.as_bytes())?;
        }
        ScVal::Symbol(v) => {
            write_i32(writer, TAG_SYMBOL);
            write_opaque(writer, v.as_str().as_bytes())?;
        }
        ScVal::Vec(elems) => {
            write_i32(writer, TAG_VEC);
            write_u32(writer, 1);
            write_len(writer, elems.len())?;
            for elem in elems {
                to_writer(elem, writer)?;
            }
        }
        ScVal::Map(map) => {
            write_i32(writer, TAG_MAP);
            write_u32(writer, 1);
            write_len(writer, map.len())?;
            for entry in map.iter() {
                to_writer(&entry.key, writer)?;
                to_writer(&entry.val, writer)?;
            }
        }
        ScVal::Address(addr) => {
            write_i32(writer, TAG_ADDRESS);
            match addr {
                Address::Account(key) => {
                    write_u32(writer, ADDRESS_ACCOUNT);
                    write_i32(writer, PUBLIC_KEY_TYPE_ED25519);
                    writer.write(key);
                }
                Address::Contract(hash) => {
                    write_u32(writer, ADDRESS_CONTRACT);
                    writer.write(hash);
                }
            }
        }
    }
    Ok(())
}

/// Encodes `value` into a new buffer.
pub fn to_xdr(value: &ScVal) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    to_writer(value, &mut buf)?;
    Ok(buf)
}

/// Decodes exactly one [ScVal] from `bytes`.
pub fn from_xdr(bytes: &[u8]) -> Result<ScVal> {
    let mut reader = Reader::new(bytes);
    let value = reader.read_scval(0)?;
    match reader.remaining() {
        0 => Ok(value),
        n => Err(Error::TrailingBytes(n)),
    }
}

fn write_u32<W: Writer>(writer: &mut W, v: u32) {
    writer.write(&v.to_be_bytes());
}

fn write_i32<W: Writer>(writer: &mut W, v: i32) {
    writer.write(&v.to_be_bytes());
}

fn write_len<W: Writer>(writer: &mut W, len: usize) -> Result<()> {
    let len = u32::try_from(len).map_err(|_| Error::LengthOverflow(len))?;
    write_u32(writer, len);
    Ok(())
}

fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

fn write_opaque<W: Writer>(writer: &mut W, data: &[u8]) -> Result<()> {
    write_len(writer, data.len())?;
    writer.write(data);
    writer.write(&[0u8; 3][..padding(data.len())]);
    Ok(())
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn remaining(&self) -> usize {
        self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.buf.len() < n {
            return Err(Error::UnexpectedEof {
                needed: n - self.buf.len(),
            });
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.take_array()?))
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    fn read_opaque(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32()? as usize;
        let data = self.take(len)?;
        if self.take(padding(len))?.iter().any(|b| *b != 0) {
            return Err(Error::NonZeroPadding);
        }
        Ok(data)
    }

    fn read_string(&mut self) -> Result<String> {
        let data = self.read_opaque()?;
        core::str::from_utf8(data)
            .map(str::to_owned)
            .map_err(|_| Error::InvalidUtf8)
    }

    /// Reads the presence flag and element count of a vec or map.
    fn read_container_len(&mut self, what: &'static str) -> Result<usize> {
        match self.read_u32()? {
            0 => Err(Error::AbsentContainer(what)),
            1 => Ok(self.read_u32()? as usize),
            other => Err(Error::InvalidBool(other)),
        }
    }

    fn read_scval(&mut self, depth: usize) -> Result<ScVal> {
        if depth > MAX_DEPTH {
            return Err(Error::DepthLimitExceeded(MAX_DEPTH));
        }
        let tag = self.read_i32()?;
        Ok(match tag {
            TAG_BOOL => match self.read_u32()? {
                0 => ScVal::Bool(false),
                1 => ScVal::Bool(true),
                other => return Err(Error::InvalidBool(other)),
            },
            TAG_VOID => ScVal::Void,
            TAG_U32 => ScVal::U32(self.read_u32()?),
            TAG_U64 => ScVal::U64(self.read_u64()?),
            TAG_I64 => ScVal::I64(self.read_i64()?),
            TAG_I128 => {
                let hi = self.read_i64()?;
                let lo = self.read_u64()?;
                ScVal::I128(((hi as i128) << 64) | lo as i128)
            }
            TAG_BYTES => ScVal::Bytes(self.read_opaque()?.to_vec()),
            TAG_STRING => ScVal::String(self.read_string()?),
            TAG_SYMBOL => ScVal::Symbol(Symbol::new(self.read_string()?)?),
            TAG_VEC => {
                let len = self.read_container_len("vec")?;
                // Every element takes at least 4 bytes, which bounds the
                // allocation by the input size.
                let mut elems = Vec::with_capacity(len.min(self.remaining() / 4));
                for _ in 0..len {
                    elems.push(self.read_scval(depth + 1)?);
                }
                ScVal::Vec(elems)
            }
            TAG_MAP => {
                let len = self.read_container_len("map")?;
                let mut entries = Vec::with_capacity(len.min(self.remaining() / 8));
                for _ in 0..len {
                    let key = self.read_scval(depth + 1)?;
                    let val = self.read_scval(depth + 1)?;
                    entries.push(ScMapEntry { key, val });
                }
                ScVal::Map(ScMap::from_sorted(entries)?)
            }
            TAG_ADDRESS => {
                let kind = self.read_u32()?;
                if kind == ADDRESS_ACCOUNT {
                    let key_type = self.read_i32()?;
                    if key_type != PUBLIC_KEY_TYPE_ED25519 {
                        return Err(Error::UnknownDiscriminant {
                            what: "public key type",
                            value: key_type,
                        });
                    }
                }
                let bytes: [u8; 32] = self.take_array()?;
                ScVal::Address(Address::from_parts(kind, &bytes)?)
            }
            other => {
                return Err(Error::UnknownDiscriminant {
                    what: "ScVal",
                    value: other,
                })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_xdr(v: &ScVal) -> String {
        hex::encode(to_xdr(v).unwrap())
    }

    #[test]
    fn primitives() {
        assert_eq!(hex_xdr(&ScVal::Bool(true)), "0000000000000001");
        assert_eq!(hex_xdr(&ScVal::Void), "00000001");
        assert_eq!(hex_xdr(&ScVal::U32(0x01020304)), "0000000301020304");
        assert_eq!(hex_xdr(&ScVal::U64(1)), "000000050000000000000001");
        assert_eq!(hex_xdr(&ScVal::I64(-1)), "00000006ffffffffffffffff");
        assert_eq!(
            hex_xdr(&ScVal::I128(-2)),
            "0000000afffffffffffffffffffffffffffffffe"
        );
        assert_eq!(
            hex_xdr(&ScVal::I128(1 << 64)),
            "0000000a00000000000000010000000000000000"
        );
    }

    #[test]
    fn variable_length_is_padded() {
        assert_eq!(hex_xdr(&ScVal::bytes(vec![0xab])), "0000000d00000001ab000000");
        assert_eq!(hex_xdr(&ScVal::bytes(vec![])), "0000000d00000000");
        assert_eq!(
            hex_xdr(&ScVal::String("abcd".into())),
            "0000000e0000000461626364"
        );
        assert_eq!(
            hex_xdr(&ScVal::Symbol(Symbol::short("perun"))),
            "0000000f00000005706572756e000000"
        );
    }

    #[test]
    fn containers_and_addresses() {
        let v = ScVal::Vec(vec![ScVal::U32(1), ScVal::Void]);
        assert_eq!(
            hex_xdr(&v),
            "000000100000000100000002000000030000000100000001"
        );

        let account = ScVal::Address(Address::Account([0x11; 32]));
        assert_eq!(
            hex_xdr(&account),
            format!("000000120000000000000000{}", "11".repeat(32))
        );
        let contract = ScVal::Address(Address::Contract([0x22; 32]));
        assert_eq!(
            hex_xdr(&contract),
            format!("0000001200000001{}", "22".repeat(32))
        );
    }

    #[test]
    fn decode_roundtrip_of_nested_value() {
        let v = ScVal::Vec(vec![
            ScVal::Map(
                ScMap::new(
                    vec![ScVal::Symbol(Symbol::short("b")), ScVal::Symbol(Symbol::short("a"))],
                    vec![ScVal::I128(i128::MIN), ScVal::String("é".into())],
                )
                .unwrap(),
            ),
            ScVal::Address(Address::Contract([7; 32])),
            ScVal::Bool(false),
        ]);
        assert_eq!(from_xdr(&to_xdr(&v).unwrap()).unwrap(), v);
    }

    #[test]
    fn rejects_malformed_input() {
        let mut trailing = to_xdr(&ScVal::Void).unwrap();
        trailing.push(0);
        assert_eq!(from_xdr(&trailing), Err(Error::TrailingBytes(1)));

        assert_eq!(
            from_xdr(&hex::decode("0000000000000002").unwrap()),
            Err(Error::InvalidBool(2))
        );
        assert_eq!(
            from_xdr(&hex::decode("0000000d00000001ab000100").unwrap()),
            Err(Error::NonZeroPadding)
        );
        assert_eq!(
            from_xdr(&hex::decode("00000002").unwrap()),
            Err(Error::UnknownDiscriminant {
                what: "ScVal",
                value: 2
            })
        );
        assert_eq!(
            from_xdr(&hex::decode("0000000e00000002c3280000").unwrap()),
            Err(Error::InvalidUtf8)
        );
        assert!(matches!(
            from_xdr(&hex::decode("0000000f000000012d000000").unwrap()),
            Err(Error::InvalidSymbol(_))
        ));
        assert_eq!(
            from_xdr(&hex::decode("0000001000000000").unwrap()),
            Err(Error::AbsentContainer("vec"))
        );
        assert_eq!(
            from_xdr(&hex::decode("0000000500000000").unwrap()),
            Err(Error::UnexpectedEof { needed: 4 })
        );
    }

    #[test]
    fn rejects_unsorted_map() {
        // {b: void, a: void}
        let mut buf = Vec::new();
        write_i32(&mut buf, TAG_MAP);
        write_u32(&mut buf, 1);
        write_u32(&mut buf, 2);
        for key in ["b", "a"] {
            to_writer(&ScVal::Symbol(Symbol::new(key).unwrap()), &mut buf).unwrap();
            to_writer(&ScVal::Void, &mut buf).unwrap();
        }
        assert_eq!(from_xdr(&buf), Err(Error::UnsortedMap));
    }

    #[test]
    fn depth_limit() {
        let mut v = ScVal::Void;
        for _ in 0..=MAX_DEPTH + 1 {
            v = ScVal::Vec(vec![v]);
        }
        let bytes = to_xdr(&v).unwrap();
        assert_eq!(from_xdr(&bytes), Err(Error::DepthLimitExceeded(MAX_DEPTH)));
    }
}
