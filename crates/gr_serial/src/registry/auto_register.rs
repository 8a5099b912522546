use crate::registry::TypeRegistry;

/// A registration hook submitted through [`auto_register!`](crate::auto_register).
pub struct AutoRegistration {
    #[cfg_attr(not(feature = "auto_register"), allow(dead_code))]
    register: fn(&mut TypeRegistry),
}

impl AutoRegistration {
    #[inline]
    pub const fn new(register: fn(&mut TypeRegistry)) -> Self {
        Self { register }
    }
}

crate::cfg::auto_register! {
    inventory::collect!(AutoRegistration);
}

/// Runs every submitted hook. Returns `false` without the `auto_register` feature.
pub(crate) fn register_all(registry: &mut TypeRegistry) -> bool {
    crate::cfg::auto_register! {
        if {
            run_hooks(registry)
        } else {
            {
                let _ = registry;
                false
            }
        }
    }
}

crate::cfg::auto_register! {
    fn run_hooks(registry: &mut TypeRegistry) -> bool {
        for hook in inventory::iter::<AutoRegistration> {
            (hook.register)(registry);
        }
        true
    }
}

/// Submits a type implementing [`GetTypeDef`] for [`TypeRegistry::auto_register`].
///
/// Expands to nothing without the `auto_register` feature.
///
/// ```
/// use gr_serial::registry::TypeRegistry;
/// use gr_serial::schema::{GetTypeDef, ObjectDef, TypeDef};
///
/// struct Note;
///
/// impl GetTypeDef for Note {
///     fn type_def() -> TypeDef {
///         ObjectDef::new("app::Note").into()
///     }
/// }
///
/// gr_serial::auto_register!(Note);
///
/// let mut registry = TypeRegistry::new();
/// if registry.auto_register() {
///     assert!(registry.contains("app::Note"));
/// }
/// ```
///
/// [`GetTypeDef`]: crate::schema::GetTypeDef
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! auto_register {
    ($ty:ty) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::registry::AutoRegistration::new(|registry| registry.register::<$ty>())
        }
    };
}

/// Submits a type implementing [`GetTypeDef`] for [`TypeRegistry::auto_register`].
///
/// Expands to nothing without the `auto_register` feature.
///
/// [`GetTypeDef`]: crate::schema::GetTypeDef
#[cfg(not(feature = "auto_register"))]
#[macro_export]
macro_rules! auto_register {
    ($ty:ty) => {};
}
