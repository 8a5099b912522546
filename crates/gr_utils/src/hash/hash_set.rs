//! Provide [`HashSet`] based on [hashbrown]'s implementation.

use hashbrown::hash_set as hb;

use crate::hash::FixedHashState;

pub use hb::{IntoIter, Iter};

/// [`hashbrown::HashSet`] with [`FixedHashState`] as the default hashing provider.
///
/// # Examples
///
/// ```
/// use gr_utils::hash::HashSet;
///
/// let mut names: HashSet<&str> = HashSet::default();
/// assert!(names.insert("foo"));
/// assert!(!names.insert("foo"));
/// ```
pub type HashSet<T, S = FixedHashState> = hb::HashSet<T, S>;
