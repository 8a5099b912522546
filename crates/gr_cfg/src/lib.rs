#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// Switches

/// Expands its input unconditionally.
///
/// - `enabled!()` evaluates to `true`.
/// - `enabled! { if { a } else { b } }` expands to `a`.
/// - `enabled! { items... }` expands to `items...`.
#[doc(hidden)]
#[macro_export]
macro_rules! enabled {
    () => { true };
    (if { $($p:tt)* } else { $($n:tt)* }) => { $($p)* };
    ($($p:tt)*) => { $($p)* };
}

/// Discards its input unconditionally.
///
/// - `disabled!()` evaluates to `false`.
/// - `disabled! { if { a } else { b } }` expands to `b`.
/// - `disabled! { items... }` expands to nothing.
#[doc(hidden)]
#[macro_export]
macro_rules! disabled {
    () => { false };
    (if { $($p:tt)* } else { $($n:tt)* }) => { $($n)* };
    ($($p:tt)*) => {};
}

// -----------------------------------------------------------------------------
// define_alias

/// Defines one switch macro per `#[cfg(...)]` predicate.
///
/// Each alias is re-exported as [`enabled!`] when the predicate holds and as
/// [`disabled!`] otherwise.
///
/// # Examples
///
/// ```
/// pub mod cfg {
///     gr_cfg::define_alias! {
///         #[cfg(debug_assertions)] => debug,
///         #[cfg(feature = "never_defined")] => never,
///     }
/// }
///
/// assert_eq!(cfg::debug!(), cfg!(debug_assertions));
/// assert!(!cfg::never!());
///
/// let answer = cfg::never! { if { 1 } else { 2 } };
/// assert_eq!(answer, 2);
/// ```
#[macro_export]
macro_rules! define_alias {
    (
        #[cfg($meta:meta)] => $id:ident
        $(, $($tail:tt)*)?
    ) => {
        #[cfg($meta)]
        #[doc(hidden)]
        #[allow(unused_imports)]
        pub use $crate::enabled as $id;

        #[cfg(not($meta))]
        #[doc(hidden)]
        #[allow(unused_imports)]
        pub use $crate::disabled as $id;

        $($crate::define_alias! { $($tail)* })?
    };
    () => {};
}
