//! Saving object graphs.

mod serializer;
mod session;

pub(crate) use session::SaveSession;

pub use serializer::{Serializer, save_to_vec};
