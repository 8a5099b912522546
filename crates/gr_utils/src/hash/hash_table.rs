//! [`HashTable`] from [hashbrown], for containers that hash their elements
//! themselves.
//!
//! The table stores no hasher. Callers pass the hash of every element, so
//! an element's hash may be derived from state the element does not expose
//! through [`Hash`](core::hash::Hash).

use hashbrown::hash_table as hb;

pub use hb::HashTable;

pub use hb::{Entry, IntoIter, Iter, IterMut};
