use core::fmt;

use gr_utils::hash::{HashTable, hash_table};

use crate::value::Value;
use crate::value::compare::{content_eq, content_hash};

/// A hash set of values, keyed by content.
///
/// The hash of a struct element is computed from its inline members when the
/// element is inserted. Elements must therefore be fully populated before
/// insertion and must not change while they are in the set.
///
/// # Examples
///
/// ```
/// use gr_serial::value::{ValueSet, Value};
///
/// let mut set = ValueSet::new();
/// assert!(set.insert(Value::from("alpha")));
/// assert!(!set.insert(Value::from("alpha")));
/// assert!(set.insert(Value::I32(42)));
///
/// assert_eq!(set.len(), 2);
/// assert!(set.contains(&Value::I32(42)));
/// ```
#[derive(Clone, Default)]
pub struct ValueSet {
    table: HashTable<Value>,
}

impl ValueSet {
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

    /// Inserts `value`, returning `false` if an equal element was replaced.
    pub fn insert(&mut self, value: Value) -> bool {
        let hash = content_hash(&value);
        match self.table.find_mut(hash, |other| content_eq(&value, other)) {
            Some(old) => {
                *old = value;
                false
            }
            None => {
                self.table.insert_unique(hash, value, content_hash);
                true
            }
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.table
            .find(content_hash(value), |other| content_eq(value, other))
            .is_some()
    }

    pub fn remove(&mut self, value: &Value) -> Option<Value> {
        match self
            .table
            .find_entry(content_hash(value), |other| content_eq(value, other))
        {
            Ok(entry) => Some(entry.remove().0),
            Err(_) => None,
        }
    }

    #[inline]
    pub fn iter(&self) -> hash_table::Iter<'_, Value> {
        self.table.iter()
    }
}

impl FromIterator<Value> for ValueSet {
    fn from_iter<I: IntoIterator<Item = Value>>(values: I) -> Self {
        let mut this = Self::new();
        for value in values {
            this.insert(value);
        }
        this
    }
}

impl IntoIterator for ValueSet {
    type Item = Value;
    type IntoIter = hash_table::IntoIter<Value>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.table.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValueSet {
    type Item = &'a Value;
    type IntoIter = hash_table::Iter<'a, Value>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.table.iter()
    }
}

impl fmt::Debug for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.table.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::ValueSet;
    use crate::value::{ObjRef, StructData, Value};

    fn tag(name: &str) -> Value {
        ObjRef::new_struct("app::Tag", StructData::new().with("name", name)).into()
    }

    #[test]
    fn struct_elements_collapse_by_content() {
        let set: ValueSet = [tag("a"), tag("b"), tag("a")].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&tag("b")));
    }

    #[test]
    fn unpopulated_elements_collide() {
        // Two shells look alike until their members are filled in.
        let set: ValueSet = [
            ObjRef::new_struct("app::Tag", StructData::new()).into(),
            ObjRef::new_struct("app::Tag", StructData::new()).into(),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove() {
        let mut set: ValueSet = [Value::I32(1), Value::I32(2)].into_iter().collect();
        assert_eq!(set.remove(&Value::I32(1)), Some(Value::I32(1)));
        assert_eq!(set.remove(&Value::I32(1)), None);
        assert_eq!(set.len(), 1);
    }
}
