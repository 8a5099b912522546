//! Provide [`HashMap`] based on [hashbrown]'s implementation.

use hashbrown::hash_map as hb;

use crate::hash::FixedHashState;

pub use hb::{Entry, IntoIter, Iter, Keys, Values};

/// [`hashbrown::HashMap`] with [`FixedHashState`] as the default hashing provider.
///
/// # Examples
///
/// ```
/// use gr_utils::hash::HashMap;
///
/// let mut map: HashMap<&str, u32> = HashMap::default();
/// map.insert("foo", 1);
///
/// assert_eq!(map.get("foo"), Some(&1));
/// ```
pub type HashMap<K, V, S = FixedHashState> = hb::HashMap<K, V, S>;
