//! Construction and lookup of the sorted maps every struct is encoded as.
//!
//! Maps are small (the largest domain type has 7 fields), so lookups are a
//! linear scan. Keys are compared as full [ScVal]s: `Symbol("a")` and
//! `String("a")` are different keys.

use super::{
    error::{Error, Result},
    ScVal, Symbol,
};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScMapEntry {
    pub key: ScVal,
    pub val: ScVal,
}

/// Map whose entries are sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScMap(Vec<ScMapEntry>);

impl ScMap {
    /// Builds a map from parallel vectors of keys and values.
    ///
    /// Keys are expected to be unique, which is not checked. The entries are
    /// sorted by key regardless of the order they are given in.
    pub fn new(keys: Vec<ScVal>, values: Vec<ScVal>) -> Result<Self> {
        if keys.len() != values.len() {
            return Err(Error::MapLengthMismatch {
                keys: keys.len(),
                values: values.len(),
            });
        }
        let entries = keys
            .into_iter()
            .zip(values)
            .map(|(key, val)| ScMapEntry { key, val })
            .collect();
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(mut entries: Vec<ScMapEntry>) -> Self {
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        ScMap(entries)
    }

    /// Used by the XDR decoder, which has to reject unsorted input instead of
    /// silently reordering it.
    pub(crate) fn from_sorted(entries: Vec<ScMapEntry>) -> Result<Self> {
        if entries.windows(2).any(|w| w[0].key >= w[1].key) {
            return Err(Error::UnsortedMap);
        }
        Ok(ScMap(entries))
    }

    pub fn get(&self, key: &ScVal) -> Result<&ScVal> {
        self.0
            .iter()
            .find(|entry| entry.key == *key)
            .map(|entry| &entry.val)
            .ok_or_else(|| Error::KeyNotFound(Box::new(key.clone())))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[ScMapEntry] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScMapEntry> {
        self.0.iter()
    }
}

/// Builds a [ScVal::Map] from parallel vectors of keys and values, see
/// [ScMap::new].
pub fn make_map(keys: Vec<ScVal>, values: Vec<ScVal>) -> Result<ScVal> {
    Ok(ScVal::Map(ScMap::new(keys, values)?))
}

/// Like [make_map], with [Symbol] keys.
pub fn make_symbol_map(keys: &[&str], values: Vec<ScVal>) -> Result<ScVal> {
    let keys = keys
        .iter()
        .map(|k| Symbol::new(*k).map(ScVal::Symbol))
        .collect::<Result<Vec<_>>>()?;
    make_map(keys, values)
}

/// Returns the value stored under `key` or [Error::KeyNotFound].
pub fn map_value<'a>(key: &ScVal, map: &'a ScMap) -> Result<&'a ScVal> {
    map.get(key)
}
