//! Classification of a descriptor into a category and its codec.
//!
//! Detectors run in a fixed order and the first that claims the descriptor
//! wins. A type nobody claims, or one that fails a check on the way, becomes
//! `Unknown`: its values are dropped on save and skipped on load.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::registry::TypeRegistry;
use crate::repo::Codec;
use crate::repo::bytes::BytesCodec;
use crate::repo::inline::{
    EnumCodec, KnownStructCodec, KnownValueCodec, PrimitiveCodec, StringCodec,
};
use crate::repo::map::MapCodec;
use crate::repo::object::ObjectCodec;
use crate::repo::seq::SeqCodec;
use crate::repo::set::SetCodec;
use crate::repo::unknown::UnknownCodec;
use crate::schema::visibility::{admit_class, admit_member};
use crate::schema::{
    Category, ClassAdmission, Construction, MemberDef, MemberKind, MemberSchema, ObjectDef,
    SchemaFlags, StoredType, TypeDesc, TypeSchema, Visibility,
};
use crate::{SerializerOptions, Warning, WarningKind};

/// What a detector may consult.
pub(crate) struct DetectEnv<'a> {
    pub registry: &'a TypeRegistry,
    pub options: SerializerOptions,
    /// The record read from the stream, when loading.
    pub stored: Option<&'a StoredType>,
    pub warnings: &'a mut Vec<Warning>,
}

impl DetectEnv<'_> {
    fn warn(&mut self, kind: WarningKind, desc: &TypeDesc, message: impl Into<String>) {
        Warning::new(kind, desc.to_string(), message).emit(self.warnings);
    }
}

/// Outcome of detection.
pub(crate) struct Detected {
    pub schema: TypeSchema,
    pub codec: Rc<dyn Codec>,
    /// The type exists but has no repo in this session. Its values are
    /// written as null.
    pub hidden: bool,
}

type Detector = fn(&TypeDesc, &mut DetectEnv<'_>) -> Option<Detected>;

const DETECTORS: [Detector; 12] = [
    detect_unknown,
    detect_primitive,
    detect_enum,
    detect_string,
    detect_known_value,
    detect_bytes,
    detect_array,
    detect_list,
    detect_map,
    detect_set,
    detect_known_struct,
    detect_object,
];

/// Classifies `desc`. Never fails: the fallback is an unknown type.
pub(crate) fn detect(desc: &TypeDesc, env: &mut DetectEnv<'_>) -> Detected {
    let detected = DETECTORS
        .iter()
        .find_map(|detector| detector(desc, env))
        .unwrap_or_else(|| unknown(desc, env));

    match env.stored {
        Some(stored)
            if detected.schema.resolved() && detected.schema.category() != stored.category =>
        {
            env.warn(
                WarningKind::TypeUnresolved,
                desc,
                format!(
                    "stored as `{}` but now resolves to `{}`",
                    stored.category,
                    detected.schema.category()
                ),
            );
            unknown(desc, env)
        }
        _ => detected,
    }
}

// -----------------------------------------------------------------------------
// Builders

fn unknown(desc: &TypeDesc, env: &DetectEnv<'_>) -> Detected {
    let mut schema = TypeSchema::new(
        desc.clone(),
        Category::Unknown,
        SchemaFlags::empty(),
        Rc::from([]),
    );
    if let Some(stored) = env.stored {
        schema.set_num_objects(stored.num_objects);
    }
    Detected {
        schema,
        codec: Rc::new(UnknownCodec),
        hidden: false,
    }
}

fn hidden(desc: &TypeDesc, env: &DetectEnv<'_>) -> Detected {
    Detected {
        hidden: true,
        ..unknown(desc, env)
    }
}

fn resolved(
    desc: &TypeDesc,
    env: &DetectEnv<'_>,
    category: Category,
    mut flags: SchemaFlags,
    members: Rc<[MemberSchema]>,
    codec: Rc<dyn Codec>,
) -> Detected {
    if category.is_inline() {
        flags |= SchemaFlags::PRIMITIVE;
    }
    if env.registry.has_sub_types(desc) {
        flags |= SchemaFlags::HAS_SUB_TYPE;
    }
    let mut schema = TypeSchema::new(desc.clone(), category, flags, members);
    if let Some(stored) = env.stored {
        schema.set_num_objects(stored.num_objects);
    }
    Detected {
        schema,
        codec,
        hidden: false,
    }
}

fn simple(
    desc: &TypeDesc,
    env: &DetectEnv<'_>,
    category: Category,
    codec: Rc<dyn Codec>,
) -> Detected {
    resolved(desc, env, category, SchemaFlags::empty(), Rc::from([]), codec)
}

// -----------------------------------------------------------------------------
// Detectors

/// Claims unresolved and unserializable types.
fn detect_unknown(desc: &TypeDesc, env: &mut DetectEnv<'_>) -> Option<Detected> {
    let registry = env.registry;
    let visibility = match desc {
        TypeDesc::Any => return Some(unknown(desc, env)),
        TypeDesc::Enum(path) => registry.get_enum(path).map(|def| def.class_visibility()),
        TypeDesc::Object(path) => registry.get_object(path).map(ObjectDef::class_visibility),
        _ => return None,
    };

    let Some(visibility) = visibility else {
        env.warn(WarningKind::TypeUnresolved, desc, "type is not registered");
        return Some(unknown(desc, env));
    };

    match admit_class(visibility, &env.options) {
        ClassAdmission::Admitted => None,
        ClassAdmission::Hidden => {
            log::debug!("`{desc}` is private and has no repo in a public-only session");
            Some(hidden(desc, env))
        }
        ClassAdmission::Rejected(reason) => {
            if visibility == Visibility::Unmarked {
                crate::cfg::strict_visibility! {
                    debug_assert!(false, "`{desc}` has no visibility annotation");
                }
            }
            env.warn(WarningKind::TypeRejected, desc, reason);
            Some(unknown(desc, env))
        }
    }
}

fn detect_primitive(desc: &TypeDesc, env: &mut DetectEnv<'_>) -> Option<Detected> {
    matches!(desc, TypeDesc::Primitive(_))
        .then(|| simple(desc, env, Category::Primitive, Rc::new(PrimitiveCodec)))
}

fn detect_enum(desc: &TypeDesc, env: &mut DetectEnv<'_>) -> Option<Detected> {
    matches!(desc, TypeDesc::Enum(_))
        .then(|| simple(desc, env, Category::Enum, Rc::new(EnumCodec)))
}

fn detect_string(desc: &TypeDesc, env: &mut DetectEnv<'_>) -> Option<Detected> {
    matches!(desc, TypeDesc::String)
        .then(|| simple(desc, env, Category::String, Rc::new(StringCodec)))
}

fn detect_known_value(desc: &TypeDesc, env: &mut DetectEnv<'_>) -> Option<Detected> {
    matches!(desc, TypeDesc::Known(kind) if kind.is_plain_value())
        .then(|| simple(desc, env, Category::KnownValue, Rc::new(KnownValueCodec)))
}

fn detect_bytes(desc: &TypeDesc, env: &mut DetectEnv<'_>) -> Option<Detected> {
    matches!(desc, TypeDesc::Bytes)
        .then(|| simple(desc, env, Category::Bytes, Rc::new(BytesCodec::new())))
}

fn detect_array(desc: &TypeDesc, env: &mut DetectEnv<'_>) -> Option<Detected> {
    let TypeDesc::Array(elem) = desc else {
        return None;
    };
    let codec = SeqCodec::new((**elem).clone(), true);
    Some(simple(desc, env, Category::Array, Rc::new(codec)))
}

fn detect_list(desc: &TypeDesc, env: &mut DetectEnv<'_>) -> Option<Detected> {
    let TypeDesc::List(elem) = desc else {
        return None;
    };
    let codec = SeqCodec::new((**elem).clone(), false);
    Some(simple(desc, env, Category::List, Rc::new(codec)))
}

fn detect_map(desc: &TypeDesc, env: &mut DetectEnv<'_>) -> Option<Detected> {
    let TypeDesc::Map(key, value) = desc else {
        return None;
    };
    let codec = MapCodec::new((**key).clone(), (**value).clone());
    Some(simple(desc, env, Category::Map, Rc::new(codec)))
}

fn detect_set(desc: &TypeDesc, env: &mut DetectEnv<'_>) -> Option<Detected> {
    let TypeDesc::Set(elem) = desc else {
        return None;
    };
    let codec = SetCodec::new((**elem).clone());
    Some(simple(desc, env, Category::Set, Rc::new(codec)))
}

fn detect_known_struct(desc: &TypeDesc, env: &mut DetectEnv<'_>) -> Option<Detected> {
    matches!(desc, TypeDesc::Known(kind) if !kind.is_plain_value())
        .then(|| simple(desc, env, Category::KnownStruct, Rc::new(KnownStructCodec)))
}

/// The generic fallback for registered object types.
fn detect_object(desc: &TypeDesc, env: &mut DetectEnv<'_>) -> Option<Detected> {
    let TypeDesc::Object(path) = desc else {
        return None;
    };
    let registry = env.registry;
    let def = registry.get_object(path)?;
    let visibility = def.class_visibility();

    if matches!(def.construction(), Construction::None) && visibility == Visibility::Unmarked {
        env.warn(
            WarningKind::TypeRejected,
            desc,
            "type has no constructor and no visibility annotation",
        );
        return Some(unknown(desc, env));
    }

    let mut flags = match def.construction() {
        Construction::Default => {
            SchemaFlags::HAS_CONSTRUCTOR | SchemaFlags::HAS_EMPTY_CONSTRUCTOR
        }
        Construction::Custom(_) => {
            SchemaFlags::HAS_CONSTRUCTOR | SchemaFlags::CUSTOM_CONSTRUCTOR
        }
        Construction::None => SchemaFlags::empty(),
    };
    flags.set(SchemaFlags::SERIALIZED, visibility != Visibility::Unmarked);
    flags.set(SchemaFlags::UNSERIALIZED, visibility == Visibility::Unserialized);
    flags.set(SchemaFlags::PRIVATE, visibility == Visibility::Private);
    flags.set(SchemaFlags::PUBLIC_ONLY, env.options.public_only);

    let live = registry.members_of(path);
    let members: Rc<[MemberSchema]> = match env.stored {
        None => save_members(visibility, &live, &env.options).into(),
        Some(stored) => {
            let stored = stored.members.clone();
            load_members(desc, visibility, &live, stored, env).into()
        }
    };

    let codec = ObjectCodec::new(desc.clone(), def, live, members.clone());
    Some(resolved(desc, env, Category::Object, flags, members, Rc::new(codec)))
}

// -----------------------------------------------------------------------------
// Members

/// Live members that are saved: admitted and readable.
fn save_members(
    class: Visibility,
    live: &[MemberDef],
    options: &SerializerOptions,
) -> Vec<MemberSchema> {
    live.iter()
        .filter(|m| m.has_getter() && admit_member(class, m.member_visibility(), options))
        .map(|m| {
            let mut member = MemberSchema::new(m.path().clone(), m.kind(), m.desc().clone());
            member.set_writeable(m.has_setter());
            member
        })
        .collect()
}

/// Stored members resolved against the live definition.
///
/// Every stored member is kept, in stream order, since its bytes have to be
/// consumed even when the value is discarded.
fn load_members(
    desc: &TypeDesc,
    class: Visibility,
    live: &[MemberDef],
    mut stored: Vec<MemberSchema>,
    env: &mut DetectEnv<'_>,
) -> Vec<MemberSchema> {
    for member in &mut stored {
        let Some(current) = live.iter().find(|m| m.name() == member.name()) else {
            Warning::new(
                WarningKind::MemberRemoved,
                desc.to_string(),
                "stored member no longer exists and is skipped",
            )
            .with_member(member.name())
            .emit(env.warnings);
            member.set_loadable(false);
            member.set_writeable(false);
            member.set_readable(false);
            continue;
        };

        if current.desc() != member.desc() {
            Warning::new(
                WarningKind::MemberTypeChanged,
                desc.to_string(),
                format!(
                    "stored as `{}` but declared as `{}`, the stored value is skipped",
                    member.desc(),
                    current.desc()
                ),
            )
            .with_member(member.name())
            .emit(env.warnings);
            member.set_loadable(false);
        } else if !admit_member(class, current.member_visibility(), &env.options) {
            log::debug!("`{desc}::{}` is not visible in this session", member.name());
            member.set_loadable(false);
        }

        member.set_writeable(current.has_setter());
        member.set_readable(current.has_getter());
        member.set_lazy(
            env.options.lazy
                && member.loadable()
                && current.kind() == (MemberKind::Property { overridable: true })
                && !member.desc().is_inline()
                && current.has_setter(),
        );
    }
    stored
}

#[cfg(test)]
mod tests {
    use alloc::borrow::Cow;
    use alloc::vec::Vec;

    use super::{DetectEnv, detect};
    use crate::registry::TypeRegistry;
    use crate::schema::{
        Category, EnumDef, MemberDef, MemberKind, MemberSchema, ObjectDef, SchemaFlags,
        StoredType, TypeDesc, Visibility,
    };
    use crate::{SerializerOptions, WarningKind};

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register_object(
            ObjectDef::new("app::Shape")
                .abstract_type()
                .visibility(Visibility::Public),
        );
        registry.register_object(
            ObjectDef::new("app::Circle")
                .base("app::Shape")
                .field("radius", TypeDesc::F64)
                .member(
                    MemberDef::property("center", TypeDesc::object("app::Point")).overridable(),
                )
                .member(MemberDef::property("area", TypeDesc::F64).write_only()),
        );
        registry.register_object(ObjectDef::new("app::Ghost").no_default_constructor());
        registry.register_enum(EnumDef::new("app::Color").variant("Red", 0));
        registry
    }

    fn run(
        registry: &TypeRegistry,
        options: SerializerOptions,
        stored: Option<&StoredType>,
        desc: &TypeDesc,
    ) -> (super::Detected, Vec<crate::Warning>) {
        let mut warnings = Vec::new();
        let mut env = DetectEnv {
            registry,
            options,
            stored,
            warnings: &mut warnings,
        };
        let detected = detect(desc, &mut env);
        (detected, warnings)
    }

    #[test]
    fn categories_in_order() {
        let registry = registry();
        let cases = [
            (TypeDesc::I32, Category::Primitive),
            (TypeDesc::enumeration("app::Color"), Category::Enum),
            (TypeDesc::STRING, Category::String),
            (TypeDesc::GUID, Category::KnownValue),
            (TypeDesc::Bytes, Category::Bytes),
            (TypeDesc::array(TypeDesc::I32), Category::Array),
            (TypeDesc::list(TypeDesc::STRING), Category::List),
            (TypeDesc::map(TypeDesc::I32, TypeDesc::Any), Category::Map),
            (TypeDesc::set(TypeDesc::I64), Category::Set),
            (TypeDesc::VERSION, Category::KnownStruct),
            (TypeDesc::object("app::Circle"), Category::Object),
        ];
        for (desc, category) in cases {
            let (detected, warnings) = run(&registry, SerializerOptions::new(), None, &desc);
            assert_eq!(detected.schema.category(), category, "{desc}");
            assert_eq!(detected.codec.category(), category, "{desc}");
            assert!(warnings.is_empty(), "{desc}");
            assert_eq!(detected.schema.is_primitive(), category.is_inline(), "{desc}");
        }
    }

    #[test]
    fn object_schema() {
        let registry = registry();
        let desc = TypeDesc::object("app::Circle");
        let (detected, _) = run(&registry, SerializerOptions::new(), None, &desc);
        let schema = detected.schema;

        let names: Vec<&str> = schema.members().iter().map(|m| m.name()).collect();
        assert_eq!(names, ["radius", "center"]);
        assert!(schema.flags().contains(SchemaFlags::HAS_EMPTY_CONSTRUCTOR));
        assert!(!schema.has_sub_type());

        let shape_desc = TypeDesc::object("app::Shape");
        let (shape, _) = run(&registry, SerializerOptions::new(), None, &shape_desc);
        assert!(shape.schema.has_sub_type());
    }

    #[test]
    fn unknown_types() {
        let registry = registry();

        let (detected, warnings) =
            run(&registry, SerializerOptions::new(), None, &TypeDesc::object("app::Gone"));
        assert_eq!(detected.schema.category(), Category::Unknown);
        assert!(!detected.schema.resolved());
        assert_eq!(warnings[0].kind, WarningKind::TypeUnresolved);

        let (detected, warnings) =
            run(&registry, SerializerOptions::new(), None, &TypeDesc::object("app::Ghost"));
        assert_eq!(detected.schema.category(), Category::Unknown);
        assert_eq!(warnings[0].kind, WarningKind::TypeRejected);
    }

    #[test]
    fn evolved_members() {
        let registry = registry();
        let desc = TypeDesc::object("app::Circle");
        let stored = StoredType {
            desc: desc.clone(),
            category: Category::Object,
            flags: SchemaFlags::empty(),
            num_objects: 2,
            members: alloc::vec![
                MemberSchema::new(Cow::Borrowed("radius"), MemberKind::Field, TypeDesc::F32),
                MemberSchema::new(Cow::Borrowed("label"), MemberKind::Field, TypeDesc::STRING),
                MemberSchema::new(
                    Cow::Borrowed("center"),
                    MemberKind::Property { overridable: true },
                    TypeDesc::object("app::Point"),
                ),
            ],
        };

        let options = SerializerOptions::new().lazy(true);
        let (detected, warnings) = run(&registry, options, Some(&stored), &desc);
        let members = detected.schema.members();

        assert_eq!(detected.schema.num_objects(), 2);
        assert_eq!(members.len(), 3);
        assert!(!members[0].loadable());
        assert!(!members[1].loadable());
        assert!(members[2].loadable());
        assert!(members[2].lazy());

        let kinds: Vec<WarningKind> = warnings.iter().map(|w| w.kind).collect();
        assert_eq!(kinds, [WarningKind::MemberTypeChanged, WarningKind::MemberRemoved]);
        assert_eq!(warnings[1].member.as_deref(), Some("label"));
    }

    #[test]
    fn category_change_is_unresolved() {
        let registry = registry();
        let desc = TypeDesc::object("app::Circle");
        let stored = StoredType {
            desc: desc.clone(),
            category: Category::List,
            flags: SchemaFlags::empty(),
            num_objects: 1,
            members: Vec::new(),
        };
        let (detected, warnings) = run(&registry, SerializerOptions::new(), Some(&stored), &desc);
        assert_eq!(detected.schema.category(), Category::Unknown);
        assert_eq!(detected.schema.num_objects(), 1);
        assert_eq!(warnings.len(), 1);
    }
}
