//! Type descriptors, static definitions and per-session schemas.

mod def;
mod desc;
mod member;
mod type_schema;

pub mod visibility;

pub use def::{
    Construction, ConstructorFn, CustomConstructor, EnumDef, GetTypeDef, MemberDef, MemberKind,
    ObjectDef, TypeDef,
};
pub use desc::{KnownKind, PrimitiveKind, TypeDesc, TypePath};
pub use member::MemberSchema;
pub use type_schema::{Category, SchemaFlags, TypeSchema};
pub use visibility::{ClassAdmission, MemberVisibility, Visibility};

pub(crate) use type_schema::StoredType;
