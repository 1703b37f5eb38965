use crate::scval::{Address, Error, Result, ScMap, ScVal, Symbol};

/// Conversion from a [ScVal] tree, the counterpart of serializing with
/// [crate::scval::to_scval].
pub trait FromScVal: Sized {
    fn from_scval(val: &ScVal) -> Result<Self>;
}

macro_rules! impl_from_scval {
    ($T:ty, $variant:ident, $name:literal) => {
        impl FromScVal for $T {
            fn from_scval(val: &ScVal) -> Result<Self> {
                match val {
                    ScVal::$variant(v) => Ok(v.clone()),
                    other => Err(Error::unexpected($name, other)),
                }
            }
        }
    };
}

impl_from_scval!(bool, Bool, "bool");
impl_from_scval!(u32, U32, "u32");
impl_from_scval!(u64, U64, "u64");
impl_from_scval!(i64, I64, "i64");
impl_from_scval!(i128, I128, "i128");
impl_from_scval!(Address, Address, "address");
impl_from_scval!(Symbol, Symbol, "symbol");
impl_from_scval!(String, String, "string");

impl FromScVal for ScVal {
    fn from_scval(val: &ScVal) -> Result<Self> {
        Ok(val.clone())
    }
}

/// Two-element vecs, used by events carrying a channel and a party.
impl<A: FromScVal, B: FromScVal> FromScVal for (A, B) {
    fn from_scval(val: &ScVal) -> Result<Self> {
        match val.as_vec() {
            Some([a, b]) => Ok((A::from_scval(a)?, B::from_scval(b)?)),
            Some(elems) => Err(Error::WrongElementCount {
                expected: 2,
                found: elems.len(),
            }),
            None => Err(Error::unexpected("vec", val)),
        }
    }
}

/// A map checked to contain exactly the fields of the struct `ty`.
pub struct StructMap<'a> {
    ty: &'static str,
    map: &'a ScMap,
}

impl<'a> StructMap<'a> {
    /// Checks that `val` is a map with exactly the given keys.
    pub fn new(ty: &'static str, val: &'a ScVal, keys: &[&'static str]) -> Result<Self> {
        let map = val.as_map().ok_or_else(|| Error::unexpected("map", val))?;
        if map.len() != keys.len() {
            return Err(Error::WrongArity {
                ty,
                expected: keys.len(),
                found: map.len(),
            });
        }
        let this = Self { ty, map };
        for key in keys {
            this.get(key)?;
        }
        Ok(this)
    }

    fn get(&self, key: &'static str) -> Result<&'a ScVal> {
        self.map
            .get(&ScVal::Symbol(Symbol::from_static_unchecked(key)))
            .map_err(|_| Error::MissingKey { ty: self.ty, key })
    }

    /// Decodes the field `key`, wrapping errors with the field's name.
    pub fn field<T: FromScVal>(&self, key: &'static str) -> Result<T> {
        T::from_scval(self.get(key)?).map_err(|e| e.in_field(self.ty, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scval::make_map;

    fn sym(s: &str) -> ScVal {
        ScVal::Symbol(Symbol::new(s).unwrap())
    }

    #[test]
    fn narrowing() {
        assert_eq!(u64::from_scval(&ScVal::U64(9)), Ok(9));
        assert_eq!(
            u64::from_scval(&ScVal::U32(9)),
            Err(Error::UnexpectedType {
                expected: "u64",
                found: "u32"
            })
        );
        assert_eq!(
            bool::from_scval(&ScVal::Void),
            Err(Error::UnexpectedType {
                expected: "bool",
                found: "void"
            })
        );
    }

    #[test]
    fn pairs() {
        let v = ScVal::Vec(vec![ScVal::U32(1), ScVal::Bool(true)]);
        assert_eq!(<(u32, bool)>::from_scval(&v), Ok((1, true)));

        let short = ScVal::Vec(vec![ScVal::U32(1)]);
        assert_eq!(
            <(u32, bool)>::from_scval(&short),
            Err(Error::WrongElementCount {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn struct_map_checks() {
        let v = make_map(vec![sym("x"), sym("y")], vec![ScVal::U32(1), ScVal::U32(2)]).unwrap();

        assert!(StructMap::new("Point", &v, &["x", "y"]).is_ok());
        assert_eq!(
            StructMap::new("Point", &v, &["x", "y", "z"]).err(),
            Some(Error::WrongArity {
                ty: "Point",
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            StructMap::new("Point", &v, &["x", "z"]).err(),
            Some(Error::MissingKey {
                ty: "Point",
                key: "z"
            })
        );
        assert_eq!(
            StructMap::new("Point", &ScVal::Void, &[]).err(),
            Some(Error::UnexpectedType {
                expected: "map",
                found: "void"
            })
        );

        let m = StructMap::new("Point", &v, &["x", "y"]).unwrap();
        assert_eq!(m.field::<u32>("y"), Ok(2));
        assert_eq!(
            m.field::<bool>("x"),
            Err(Error::UnexpectedType {
                expected: "bool",
                found: "u32"
            }
            .in_field("Point", "x"))
        );
    }
}
