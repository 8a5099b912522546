//! Items referenced by exported macros.

crate::cfg::auto_register! {
    pub use inventory;
}
