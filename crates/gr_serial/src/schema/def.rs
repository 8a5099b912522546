//! Static type definitions registered in a [`TypeRegistry`].
//!
//! A definition is the compile-time knowledge about a type: its members, its
//! base type, how instances are constructed and how visible they are.
//! Sessions turn definitions into [`TypeSchema`]s.
//!
//! [`TypeRegistry`]: crate::registry::TypeRegistry
//! [`TypeSchema`]: crate::schema::TypeSchema

use alloc::string::String;
use alloc::vec::Vec;

use crate::registry::TypeRegistry;
use crate::schema::{MemberVisibility, TypeDesc, TypePath, Visibility};
use crate::value::{StructData, Value};

// -----------------------------------------------------------------------------
// MemberDef

/// Storage kind of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    /// Accessor pair. Overridable properties may be loaded lazily.
    Property { overridable: bool },
}

impl MemberKind {
    #[inline]
    pub const fn is_property(self) -> bool {
        matches!(self, Self::Property { .. })
    }

    pub(crate) const fn code(self) -> u8 {
        match self {
            Self::Field => 0,
            Self::Property { overridable: false } => 1,
            Self::Property { overridable: true } => 2,
        }
    }

    pub(crate) const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Field),
            1 => Some(Self::Property { overridable: false }),
            2 => Some(Self::Property { overridable: true }),
            _ => None,
        }
    }
}

/// Definition of one serializable member.
#[derive(Debug, Clone)]
pub struct MemberDef {
    name: TypePath,
    desc: TypeDesc,
    kind: MemberKind,
    visibility: MemberVisibility,
    getter: bool,
    setter: bool,
    default: Option<Value>,
}

impl MemberDef {
    pub fn field(name: impl Into<TypePath>, desc: TypeDesc) -> Self {
        Self {
            name: name.into(),
            desc,
            kind: MemberKind::Field,
            visibility: MemberVisibility::Unmarked,
            getter: true,
            setter: true,
            default: None,
        }
    }

    pub fn property(name: impl Into<TypePath>, desc: TypeDesc) -> Self {
        Self {
            kind: MemberKind::Property { overridable: false },
            ..Self::field(name, desc)
        }
    }

    /// Marks a property as overridable, which makes it eligible for lazy loading.
    pub fn overridable(mut self) -> Self {
        self.kind = MemberKind::Property { overridable: true };
        self
    }

    /// The member has no setter; it is saved but only restored through a constructor.
    pub fn read_only(mut self) -> Self {
        self.setter = false;
        self
    }

    /// The member has no getter; it is never saved.
    pub fn write_only(mut self) -> Self {
        self.getter = false;
        self
    }

    pub fn visibility(mut self, visibility: MemberVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Value of the member in a freshly constructed instance.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub(crate) fn path(&self) -> &TypePath {
        &self.name
    }

    #[inline]
    pub fn desc(&self) -> &TypeDesc {
        &self.desc
    }

    #[inline]
    pub const fn kind(&self) -> MemberKind {
        self.kind
    }

    #[inline]
    pub const fn member_visibility(&self) -> MemberVisibility {
        self.visibility
    }

    #[inline]
    pub const fn has_getter(&self) -> bool {
        self.getter
    }

    #[inline]
    pub const fn has_setter(&self) -> bool {
        self.setter
    }

    /// The explicit default, or the zero value of the declared type.
    pub fn initial_value(&self) -> Value {
        match &self.default {
            Some(value) => value.clone(),
            None => Value::default_for(&self.desc),
        }
    }
}

// -----------------------------------------------------------------------------
// Construction

/// Builds the initial state of an instance from constructor arguments.
///
/// Arguments arrive in parameter order. Members missing from the returned data
/// keep their initial values.
pub type ConstructorFn = fn(&[Value]) -> Result<StructData, String>;

/// A constructor taking arguments, matched by name against the members.
#[derive(Debug, Clone)]
pub struct CustomConstructor {
    params: Vec<TypePath>,
    func: ConstructorFn,
}

impl CustomConstructor {
    #[inline]
    pub fn params(&self) -> &[TypePath] {
        &self.params
    }

    #[inline]
    pub fn func(&self) -> ConstructorFn {
        self.func
    }
}

/// How instances of an object type come into existence.
#[derive(Debug, Clone)]
pub enum Construction {
    /// Parameterless construction followed by member assignment.
    Default,
    /// Construction from member values.
    Custom(CustomConstructor),
    /// Instances cannot be constructed (abstract types, interfaces).
    None,
}

// -----------------------------------------------------------------------------
// ObjectDef

/// Definition of an object type.
///
/// # Examples
///
/// ```
/// use gr_serial::schema::{MemberDef, ObjectDef, TypeDesc, Visibility};
///
/// let def = ObjectDef::new("app::Circle")
///     .base("app::Shape")
///     .visibility(Visibility::Public)
///     .field("radius", TypeDesc::F64)
///     .member(MemberDef::property("label", TypeDesc::STRING).read_only());
///
/// assert_eq!(def.members().len(), 2);
/// assert_eq!(def.base_path(), Some("app::Shape"));
/// ```
#[derive(Debug, Clone)]
pub struct ObjectDef {
    path: TypePath,
    base: Option<TypePath>,
    is_abstract: bool,
    visibility: Visibility,
    construction: Construction,
    members: Vec<MemberDef>,
}

impl ObjectDef {
    pub fn new(path: impl Into<TypePath>) -> Self {
        Self {
            path: path.into(),
            base: None,
            is_abstract: false,
            visibility: Visibility::Unmarked,
            construction: Construction::Default,
            members: Vec::new(),
        }
    }

    pub fn base(mut self, base: impl Into<TypePath>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Abstract types have no instances of their own and no constructor.
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self.construction = Construction::None;
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn field(self, name: impl Into<TypePath>, desc: TypeDesc) -> Self {
        self.member(MemberDef::field(name, desc))
    }

    pub fn property(self, name: impl Into<TypePath>, desc: TypeDesc) -> Self {
        self.member(MemberDef::property(name, desc))
    }

    pub fn member(mut self, member: MemberDef) -> Self {
        self.members.push(member);
        self
    }

    pub fn constructor(
        mut self,
        params: impl IntoIterator<Item = impl Into<TypePath>>,
        func: ConstructorFn,
    ) -> Self {
        self.construction = Construction::Custom(CustomConstructor {
            params: params.into_iter().map(Into::into).collect(),
            func,
        });
        self
    }

    /// Removes the parameterless constructor.
    pub fn no_default_constructor(mut self) -> Self {
        if matches!(self.construction, Construction::Default) {
            self.construction = Construction::None;
        }
        self
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub(crate) fn type_path(&self) -> &TypePath {
        &self.path
    }

    #[inline]
    pub fn base_path(&self) -> Option<&str> {
        self.base.as_deref()
    }

    #[inline]
    pub const fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    #[inline]
    pub const fn class_visibility(&self) -> Visibility {
        self.visibility
    }

    #[inline]
    pub const fn construction(&self) -> &Construction {
        &self.construction
    }

    #[inline]
    pub fn members(&self) -> &[MemberDef] {
        &self.members
    }

    pub fn get_member(&self, name: &str) -> Option<&MemberDef> {
        self.members.iter().find(|m| m.name() == name)
    }

    /// A struct holding the initial value of every member.
    pub fn initial_data(&self) -> StructData {
        self.members
            .iter()
            .map(|m| (m.path().clone(), m.initial_value()))
            .collect()
    }

    #[inline]
    pub fn desc(&self) -> TypeDesc {
        TypeDesc::Object(self.path.clone())
    }
}

// -----------------------------------------------------------------------------
// EnumDef

/// Definition of an enum type: named discriminants.
#[derive(Debug, Clone)]
pub struct EnumDef {
    path: TypePath,
    visibility: Visibility,
    variants: Vec<(TypePath, i64)>,
}

impl EnumDef {
    pub fn new(path: impl Into<TypePath>) -> Self {
        Self {
            path: path.into(),
            visibility: Visibility::Unmarked,
            variants: Vec::new(),
        }
    }

    pub fn variant(mut self, name: impl Into<TypePath>, value: i64) -> Self {
        self.variants.push((name.into(), value));
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub(crate) fn type_path(&self) -> &TypePath {
        &self.path
    }

    #[inline]
    pub const fn class_visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn variant_name(&self, value: i64) -> Option<&str> {
        self.variants
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(name, _)| name.as_ref())
    }

    pub fn variant_value(&self, name: &str) -> Option<i64> {
        self.variants
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

// -----------------------------------------------------------------------------
// GetTypeDef

/// A registered definition.
#[derive(Debug, Clone)]
pub enum TypeDef {
    Object(ObjectDef),
    Enum(EnumDef),
}

impl From<ObjectDef> for TypeDef {
    #[inline]
    fn from(value: ObjectDef) -> Self {
        Self::Object(value)
    }
}

impl From<EnumDef> for TypeDef {
    #[inline]
    fn from(value: EnumDef) -> Self {
        Self::Enum(value)
    }
}

/// Static schema registration for a Rust type.
///
/// Implemented by hand (or by the application's own macros) for every type
/// the application wants to persist.
///
/// # Examples
///
/// ```
/// use gr_serial::registry::TypeRegistry;
/// use gr_serial::schema::{GetTypeDef, ObjectDef, TypeDef, TypeDesc};
///
/// struct Bookmark;
///
/// impl GetTypeDef for Bookmark {
///     fn type_def() -> TypeDef {
///         ObjectDef::new("app::Bookmark")
///             .field("title", TypeDesc::STRING)
///             .field("visits", TypeDesc::U32)
///             .into()
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Bookmark>();
/// assert!(registry.get_object("app::Bookmark").is_some());
/// ```
pub trait GetTypeDef {
    fn type_def() -> TypeDef;

    /// Registers the definitions this type's members depend on.
    fn register_dependencies(_registry: &mut TypeRegistry) {}
}
