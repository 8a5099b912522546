use alloc::vec::Vec;

use gr_utils::hash::HashMap;

use crate::schema::{EnumDef, GetTypeDef, MemberDef, ObjectDef, TypeDef, TypeDesc, TypePath};

// -----------------------------------------------------------------------------
// TypeRegistry

/// The static catalog of persistable types.
///
/// Every object and enum type that can appear in a graph is described once,
/// at startup, by an [`ObjectDef`] or an [`EnumDef`]. Sessions resolve
/// descriptors against the registry to decide how a type is coded.
///
/// # Example
///
/// ```
/// use gr_serial::registry::TypeRegistry;
/// use gr_serial::schema::{ObjectDef, TypeDesc};
///
/// let mut registry = TypeRegistry::new();
/// registry.register_object(ObjectDef::new("app::Shape").abstract_type());
/// registry.register_object(
///     ObjectDef::new("app::Circle").base("app::Shape").field("r", TypeDesc::F64),
/// );
///
/// assert!(registry.is_subtype("app::Circle", "app::Shape"));
/// assert!(registry.has_sub_types(&TypeDesc::object("app::Shape")));
/// assert!(!registry.has_sub_types(&TypeDesc::object("app::Circle")));
/// ```
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    objects: HashMap<TypePath, ObjectDef>,
    enums: HashMap<TypePath, EnumDef>,
    auto_registered: bool,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the definition of `T`, then its dependencies.
    ///
    /// A path that is already registered keeps its first definition, and its
    /// dependencies are not visited again.
    pub fn register<T: GetTypeDef>(&mut self) {
        if self.register_def(T::type_def()) {
            T::register_dependencies(self);
        }
    }

    /// Adds `def` unless its path is taken. Returns `true` if it was added.
    pub fn register_def(&mut self, def: TypeDef) -> bool {
        match def {
            TypeDef::Object(def) => self.register_object(def),
            TypeDef::Enum(def) => self.register_enum(def),
        }
    }

    pub fn register_object(&mut self, def: ObjectDef) -> bool {
        if self.contains(def.path()) {
            return false;
        }
        self.objects.insert(def.type_path().clone(), def);
        true
    }

    pub fn register_enum(&mut self, def: EnumDef) -> bool {
        if self.contains(def.path()) {
            return false;
        }
        self.enums.insert(def.type_path().clone(), def);
        true
    }

    /// Adds or replaces the definition of an object type.
    pub fn insert_object(&mut self, def: ObjectDef) {
        self.enums.remove(def.path());
        self.objects.insert(def.type_path().clone(), def);
    }

    /// Adds or replaces the definition of an enum type.
    pub fn insert_enum(&mut self, def: EnumDef) {
        self.objects.remove(def.path());
        self.enums.insert(def.type_path().clone(), def);
    }

    /// Removes the definition registered under `path`.
    pub fn remove(&mut self, path: &str) -> Option<TypeDef> {
        if let Some(def) = self.objects.remove(path) {
            return Some(TypeDef::Object(def));
        }
        self.enums.remove(path).map(TypeDef::Enum)
    }

    /// Registers every type submitted with [`auto_register!`](crate::auto_register).
    ///
    /// Returns `true` if static registration is available. Repeated calls are
    /// cheap. Without the `auto_register` feature this does nothing and
    /// returns `false`.
    pub fn auto_register(&mut self) -> bool {
        if self.auto_registered {
            return true;
        }
        self.auto_registered = crate::registry::auto_register::register_all(self);
        self.auto_registered
    }

    #[inline]
    pub fn contains(&self, path: &str) -> bool {
        self.objects.contains_key(path) || self.enums.contains_key(path)
    }

    #[inline]
    pub fn get_object(&self, path: &str) -> Option<&ObjectDef> {
        self.objects.get(path)
    }

    #[inline]
    pub fn get_enum(&self, path: &str) -> Option<&EnumDef> {
        self.enums.get(path)
    }

    #[inline]
    pub fn objects(&self) -> impl ExactSizeIterator<Item = &ObjectDef> {
        self.objects.values()
    }

    #[inline]
    pub fn enums(&self) -> impl ExactSizeIterator<Item = &EnumDef> {
        self.enums.values()
    }

    // ---- Hierarchy

    /// `true` if `derived` is `base` or inherits from it, directly or not.
    pub fn is_subtype(&self, derived: &str, base: &str) -> bool {
        let mut current = derived;
        // A malformed hierarchy may loop; no chain is longer than the registry.
        for _ in 0..=self.objects.len() {
            if current == base {
                return true;
            }
            match self.objects.get(current).and_then(ObjectDef::base_path) {
                Some(next) => current = next,
                None => return false,
            }
        }
        false
    }

    /// Whether a value of runtime type `actual` may be stored where `declared` is declared.
    pub fn is_assignable(&self, actual: &TypeDesc, declared: &TypeDesc) -> bool {
        match (actual, declared) {
            _ if actual == declared => true,
            (_, TypeDesc::Any) => true,
            (TypeDesc::Object(actual), TypeDesc::Object(declared)) => {
                self.is_subtype(actual, declared)
            }
            _ => false,
        }
    }

    /// Whether a reference declared as `desc` may hold a different runtime type.
    ///
    /// Decided from the registry alone: `Any` always may, an object type may
    /// if it is abstract or another registered type derives from it.
    pub fn has_sub_types(&self, desc: &TypeDesc) -> bool {
        match desc {
            TypeDesc::Any => true,
            TypeDesc::Object(path) => match self.objects.get(path.as_ref()) {
                Some(def) => {
                    def.is_abstract()
                        || self
                            .objects
                            .values()
                            .any(|other| other.base_path() == Some(path.as_ref()))
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Members of `path` including inherited ones, base members first.
    ///
    /// A member redeclared by a derived type replaces the inherited one in place.
    pub fn members_of(&self, path: &str) -> Vec<MemberDef> {
        let mut chain = Vec::new();
        let mut current = self.objects.get(path);
        while let Some(def) = current {
            if chain.len() > self.objects.len() {
                break;
            }
            chain.push(def);
            current = def.base_path().and_then(|base| self.objects.get(base));
        }

        let mut members: Vec<MemberDef> = Vec::new();
        for def in chain.into_iter().rev() {
            for member in def.members() {
                match members.iter_mut().find(|m| m.name() == member.name()) {
                    Some(slot) => *slot = member.clone(),
                    None => members.push(member.clone()),
                }
            }
        }
        members
    }
}

#[cfg(test)]
mod tests {
    use alloc::borrow::ToOwned;
    use alloc::vec::Vec;

    use super::TypeRegistry;
    use crate::schema::{EnumDef, GetTypeDef, ObjectDef, TypeDef, TypeDesc};

    fn shapes() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register_object(
            ObjectDef::new("app::Shape")
                .abstract_type()
                .field("name", TypeDesc::STRING),
        );
        registry.register_object(
            ObjectDef::new("app::Circle")
                .base("app::Shape")
                .field("radius", TypeDesc::F64),
        );
        registry.register_object(
            ObjectDef::new("app::Ring")
                .base("app::Circle")
                .field("name", TypeDesc::STRING)
                .field("inner", TypeDesc::F64),
        );
        registry
    }

    #[test]
    fn subtypes_are_transitive() {
        let registry = shapes();
        assert!(registry.is_subtype("app::Ring", "app::Shape"));
        assert!(!registry.is_subtype("app::Shape", "app::Ring"));

        let shape = TypeDesc::object("app::Shape");
        let ring = TypeDesc::object("app::Ring");
        assert!(registry.is_assignable(&ring, &shape));
        assert!(registry.is_assignable(&TypeDesc::I32, &TypeDesc::Any));
        assert!(!registry.is_assignable(&TypeDesc::I32, &TypeDesc::I64));
        assert!(!registry.is_assignable(
            &TypeDesc::list(ring.clone()),
            &TypeDesc::list(shape.clone())
        ));
    }

    #[test]
    fn has_sub_types() {
        let registry = shapes();
        assert!(registry.has_sub_types(&TypeDesc::Any));
        assert!(registry.has_sub_types(&TypeDesc::object("app::Circle")));
        assert!(!registry.has_sub_types(&TypeDesc::object("app::Ring")));
        assert!(!registry.has_sub_types(&TypeDesc::STRING));
    }

    #[test]
    fn inherited_members() {
        let registry = shapes();
        let names: Vec<_> = registry
            .members_of("app::Ring")
            .iter()
            .map(|m| m.name().to_owned())
            .collect();
        assert_eq!(names, ["name", "radius", "inner"]);
    }

    #[test]
    fn cyclic_hierarchy_terminates() {
        let mut registry = TypeRegistry::new();
        registry.register_object(ObjectDef::new("a").base("b"));
        registry.register_object(ObjectDef::new("b").base("a"));
        assert!(!registry.is_subtype("a", "c"));
        assert_eq!(registry.members_of("a").len(), 0);
    }

    #[test]
    fn register_keeps_the_first_definition() {
        struct Color;
        impl GetTypeDef for Color {
            fn type_def() -> TypeDef {
                EnumDef::new("app::Color").variant("Red", 0).into()
            }
        }

        let mut registry = TypeRegistry::new();
        registry.register::<Color>();
        assert!(!registry.register_def(EnumDef::new("app::Color").into()));
        assert_eq!(
            registry.get_enum("app::Color").unwrap().variant_name(0),
            Some("Red")
        );

        registry.insert_object(ObjectDef::new("app::Color"));
        assert!(registry.get_enum("app::Color").is_none());
        assert!(registry.get_object("app::Color").is_some());
    }
}
