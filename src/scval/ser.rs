//! [serde::Serializer] producing [ScVal] trees.
//!
//! Structs become maps keyed by their field names (as [Symbol]s), sequences
//! and tuples become vecs, and enums follow the contract SDK's convention of
//! a vec starting with the variant name.

use serde::{
    ser::{
        self, Impossible, SerializeMap, SerializeSeq, SerializeStruct, SerializeTuple,
        SerializeTupleStruct, SerializeTupleVariant,
    },
    Serialize,
};

use super::{
    error::{Error, Result},
    map::ScMap,
    types::Address,
    ScVal, Symbol,
};

/// Type name used for marking a newtype struct as an [Address].
///
/// The serde data model has no address type. [Address] serializes itself as
/// a newtype struct with this name wrapping `(kind, bytes)`, which this
/// Serializer turns back into [ScVal::Address]. The characters have no
/// special meaning, they have just been chosen in a way that normal Rust
/// types will never have this name.
pub(crate) const MARK_ADDRESS_NAME: &str = ":$&_ADDRESS";

/// Same as [MARK_ADDRESS_NAME] for [Symbol], wrapping a `str`.
pub(crate) const MARK_SYMBOL_NAME: &str = ":$&_SYMBOL";

/// Serializes `value` into a [ScVal] tree.
pub fn to_scval<T>(value: &T) -> Result<ScVal>
where
    T: Serialize + ?Sized,
{
    value.serialize(Serializer)
}

pub struct Serializer;

impl ser::Serializer for Serializer {
    type Ok = ScVal;
    type Error = Error;

    type SerializeSeq = SeqSerializer;
    type SerializeTuple = SeqSerializer;
    type SerializeTupleStruct = SeqSerializer;
    type SerializeTupleVariant = SeqSerializer;
    type SerializeMap = MapSerializer;
    type SerializeStruct = StructSerializer;
    type SerializeStructVariant = Impossible<ScVal, Error>;

    fn serialize_bool(self, v: bool) -> Result<ScVal> {
        Ok(ScVal::Bool(v))
    }

    fn serialize_i8(self, _: i8) -> Result<ScVal> {
        Err(Error::TypeNotRepresentable("i8"))
    }

    fn serialize_i16(self, _: i16) -> Result<ScVal> {
        Err(Error::TypeNotRepresentable("i16"))
    }

    fn serialize_i32(self, _: i32) -> Result<ScVal> {
        Err(Error::TypeNotRepresentable("i32"))
    }

    fn serialize_i64(self, v: i64) -> Result<ScVal> {
        Ok(ScVal::I64(v))
    }

    fn serialize_i128(self, v: i128) -> Result<ScVal> {
        Ok(ScVal::I128(v))
    }

    fn serialize_u8(self, _: u8) -> Result<ScVal> {
        Err(Error::TypeNotRepresentable("u8"))
    }

    fn serialize_u16(self, _: u16) -> Result<ScVal> {
        Err(Error::TypeNotRepresentable("u16"))
    }

    fn serialize_u32(self, v: u32) -> Result<ScVal> {
        Ok(ScVal::U32(v))
    }

    fn serialize_u64(self, v: u64) -> Result<ScVal> {
        Ok(ScVal::U64(v))
    }

    fn serialize_u128(self, _: u128) -> Result<ScVal> {
        Err(Error::TypeNotRepresentable("u128"))
    }

    fn serialize_f32(self, _: f32) -> Result<ScVal> {
        Err(Error::TypeNotRepresentable("f32"))
    }

    fn serialize_f64(self, _: f64) -> Result<ScVal> {
        Err(Error::TypeNotRepresentable("f64"))
    }

    fn serialize_char(self, _: char) -> Result<ScVal> {
        Err(Error::TypeNotRepresentable("char"))
    }

    fn serialize_str(self, v: &str) -> Result<ScVal> {
        Ok(ScVal::String(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<ScVal> {
        Ok(ScVal::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<ScVal> {
        Ok(ScVal::Void)
    }

    fn serialize_some<T: ?Sized>(self, value: &T) -> Result<ScVal>
    where
        T: Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<ScVal> {
        Ok(ScVal::Void)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<ScVal> {
        Ok(ScVal::Void)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<ScVal> {
        Ok(ScVal::Vec(vec![ScVal::Symbol(Symbol::new(variant)?)]))
    }

    fn serialize_newtype_struct<T: ?Sized>(self, name: &'static str, value: &T) -> Result<ScVal>
    where
        T: Serialize,
    {
        match name {
            MARK_ADDRESS_NAME => address_from_parts(value.serialize(self)?),
            MARK_SYMBOL_NAME => match value.serialize(self)? {
                ScVal::String(s) => Ok(ScVal::Symbol(Symbol::new(s)?)),
                other => Err(Error::unexpected("string", &other)),
            },
            _ => value.serialize(self),
        }
    }

    fn serialize_newtype_variant<T: ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<ScVal>
    where
        T: Serialize,
    {
        Ok(ScVal::Vec(vec![
            ScVal::Symbol(Symbol::new(variant)?),
            value.serialize(self)?,
        ]))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqSerializer> {
        Ok(SeqSerializer {
            elems: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqSerializer> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SeqSerializer> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SeqSerializer> {
        let mut elems = Vec::with_capacity(len + 1);
        elems.push(ScVal::Symbol(Symbol::new(variant)?));
        Ok(SeqSerializer { elems })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapSerializer> {
        let len = len.unwrap_or(0);
        Ok(MapSerializer {
            keys: Vec::with_capacity(len),
            values: Vec::with_capacity(len),
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<StructSerializer> {
        Ok(StructSerializer {
            keys: Vec::with_capacity(len),
            values: Vec::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Impossible<ScVal, Error>> {
        Err(Error::TypeNotRepresentable("struct variant"))
    }
}

fn address_from_parts(parts: ScVal) -> Result<ScVal> {
    match parts.as_vec() {
        Some([ScVal::U32(kind), ScVal::Bytes(bytes)]) => {
            Ok(ScVal::Address(Address::from_parts(*kind, bytes)?))
        }
        _ => Err(Error::Custom(format!(
            "malformed address representation: {:?}",
            parts
        ))),
    }
}

pub struct SeqSerializer {
    elems: Vec<ScVal>,
}

impl SerializeSeq for SeqSerializer {
    type Ok = ScVal;
    type Error = Error;

    fn serialize_element<T: ?Sized>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        self.elems.push(value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<ScVal> {
        Ok(ScVal::Vec(self.elems))
    }
}

impl SerializeTuple for SeqSerializer {
    type Ok = ScVal;
    type Error = Error;

    fn serialize_element<T: ?Sized>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<ScVal> {
        SerializeSeq::end(self)
    }
}

impl SerializeTupleStruct for SeqSerializer {
    type Ok = ScVal;
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<ScVal> {
        SerializeSeq::end(self)
    }
}

impl SerializeTupleVariant for SeqSerializer {
    type Ok = ScVal;
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<ScVal> {
        SerializeSeq::end(self)
    }
}

pub struct MapSerializer {
    keys: Vec<ScVal>,
    values: Vec<ScVal>,
}

impl SerializeMap for MapSerializer {
    type Ok = ScVal;
    type Error = Error;

    fn serialize_key<T: ?Sized>(&mut self, key: &T) -> Result<()>
    where
        T: Serialize,
    {
        self.keys.push(key.serialize(Serializer)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        self.values.push(value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<ScVal> {
        Ok(ScVal::Map(ScMap::new(self.keys, self.values)?))
    }
}

pub struct StructSerializer {
    keys: Vec<ScVal>,
    values: Vec<ScVal>,
}

impl SerializeStruct for StructSerializer {
    type Ok = ScVal;
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        self.keys.push(ScVal::Symbol(Symbol::new(key)?));
        self.values.push(value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<ScVal> {
        // Sorting happens here, the field order of the Rust struct does not
        // matter on the wire.
        Ok(ScVal::Map(ScMap::new(self.keys, self.values)?))
    }
}
