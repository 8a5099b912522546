//! The static type catalog.
//!
//! ## auto_register
//!
//! See [`TypeRegistry::auto_register`].
//!
//! Static registration is built on the [`inventory`] crate. Not every
//! platform supports it; where it is unavailable the call returns `false`
//! and types must be registered by hand.
//!
//! [`inventory`]: https://docs.rs/inventory

mod auto_register;
mod type_registry;

pub use auto_register::AutoRegistration;
pub use type_registry::TypeRegistry;
