use core::fmt;

use gr_utils::hash::{HashTable, hash_table};

use crate::value::Value;
use crate::value::compare::{content_eq, content_hash};

/// A hash map from values to values, keyed by content like [`ValueSet`].
///
/// [`ValueSet`]: crate::value::ValueSet
#[derive(Clone, Default)]
pub struct ValueMap {
    table: HashTable<(Value, Value)>,
}

impl ValueMap {
    #[inline]
    pub const fn new() -> Self {
        Self {
            table: HashTable::new(),
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Inserts an entry, returning the value previously stored under `key`.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        let hash = content_hash(&key);
        match self.table.find_mut(hash, |(other, _)| content_eq(&key, other)) {
            Some((_, old)) => Some(core::mem::replace(old, value)),
            None => {
                self.table
                    .insert_unique(hash, (key, value), |(k, _)| content_hash(k));
                None
            }
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.table
            .find(content_hash(key), |(other, _)| content_eq(key, other))
            .map(|(_, v)| v)
    }

    #[inline]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        match self
            .table
            .find_entry(content_hash(key), |(other, _)| content_eq(key, other))
        {
            Ok(entry) => Some(entry.remove().0.1),
            Err(_) => None,
        }
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.table.iter().map(|(k, v)| (k, v))
    }

    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.table.iter().map(|(k, _)| k)
    }

    #[inline]
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.table.iter().map(|(_, v)| v)
    }
}

impl FromIterator<(Value, Value)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(entries: I) -> Self {
        let mut this = Self::new();
        for (key, value) in entries {
            this.insert(key, value);
        }
        this
    }
}

impl IntoIterator for ValueMap {
    type Item = (Value, Value);
    type IntoIter = hash_table::IntoIter<(Value, Value)>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.table.into_iter()
    }
}

impl fmt::Debug for ValueMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
