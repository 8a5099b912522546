//! Hash containers with a fixed seed, on top of *hashbrown* and *foldhash*.

// -----------------------------------------------------------------------------
// Modules

mod hasher;

pub mod hash_map;
pub mod hash_set;
pub mod hash_table;

// -----------------------------------------------------------------------------
// Exports

pub use hasher::{FixedHashState, FixedHasher};

pub use hash_map::HashMap;
pub use hash_set::HashSet;
pub use hash_table::HashTable;
