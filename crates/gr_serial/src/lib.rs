#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// Compilation config

/// Some macros used for compilation control.
pub mod cfg {
    gr_cfg::define_alias! {
        #[cfg(feature = "auto_register")] => auto_register,
        #[cfg(feature = "strict_visibility")] => strict_visibility,
        #[cfg(all(debug_assertions, feature = "debug"))] => debug,
    }
}

// -----------------------------------------------------------------------------
// Extern Self

// Lets the exported macros name `gr_serial` from inside this crate as well.
extern crate self as gr_serial;

// -----------------------------------------------------------------------------
// no_std support

// Streams are `std::io` based, everything else sticks to `core` and `alloc`.
extern crate std;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod options;
mod repo;
mod state;

pub mod clone;
pub mod de;
pub mod registry;
pub mod schema;
pub mod ser;
pub mod value;
pub mod wire;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use clone::deep_clone;
pub use de::{Deserializer, load_from_slice};
pub use error::{SerialError, Warning, WarningKind};
pub use options::SerializerOptions;
pub use ser::{Serializer, save_to_vec};
pub use state::SessionState;
