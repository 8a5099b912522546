//! Loading object graphs.
//!
//! A [`Deserializer`] reads the schema, header and root sections when it
//! opens and the data section on demand. Objects are allocated as shells when
//! they are first referenced and hydrated when the caller asks for them, so a
//! stream can be loaded partially.

mod context;
mod deserializer;
mod lazy;
mod session;

#[cfg(test)]
mod tests;

pub(crate) use context::LoadContext;

pub use deserializer::{Deserializer, load_from_slice};
pub use lazy::{LazyValue, TypeRef};
