use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use std::io::Cursor;
use uuid::Uuid;

use crate::registry::TypeRegistry;
use crate::schema::{EnumDef, MemberDef, MemberVisibility, ObjectDef, TypeDesc, Visibility};
use crate::value::{
    EnumValue, ObjRef, ObjectData, ObjectState, StructData, TimeZoneId, Value, ValueMap, ValueSet,
    Version,
};
use crate::{
    Deserializer, SerialError, SerializerOptions, SessionState, WarningKind, load_from_slice,
    save_to_vec,
};

// -----------------------------------------------------------------------------
// Fixtures

fn node_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register_object(
        ObjectDef::new("app::Node")
            .field("id", TypeDesc::I32)
            .field("next", TypeDesc::object("app::Node"))
            .member(MemberDef::property("child", TypeDesc::object("app::Node")).overridable()),
    );
    registry
}

fn node(id: i32) -> ObjRef {
    let data = StructData::new()
        .with("id", id)
        .with("next", Value::Null)
        .with("child", Value::Null);
    ObjRef::new_struct("app::Node", data)
}

fn save(registry: &TypeRegistry, roots: &[Value]) -> Vec<u8> {
    save_to_vec(registry, SerializerOptions::new(), roots).unwrap()
}

fn open(
    registry: &TypeRegistry,
    bytes: Vec<u8>,
    options: SerializerOptions,
) -> Deserializer<Cursor<Vec<u8>>> {
    match Deserializer::open(registry, Cursor::new(bytes), options) {
        Ok(de) => de,
        Err(err) => panic!("failed to open stream: {err}"),
    }
}

fn id_of(value: &Value) -> Option<i64> {
    value.as_object()?.get("id").ok()?.as_i64()
}

/// Offset of the header section body.
fn header_start(bytes: &[u8]) -> usize {
    let schema_len = u32::from_le_bytes(bytes[6..10].try_into().unwrap()) as usize;
    10 + schema_len + 4
}

// -----------------------------------------------------------------------------
// Round trips

#[test]
fn every_category_round_trips() {
    let mut registry = TypeRegistry::new();
    registry.register_enum(EnumDef::new("app::Color").variant("Red", 0).variant("Green", 1));
    registry.register_object(
        ObjectDef::new("app::Record")
            .field("flag", TypeDesc::BOOL)
            .field("letter", TypeDesc::CHAR)
            .field("count", TypeDesc::I64)
            .field("ratio", TypeDesc::F64)
            .field("small", TypeDesc::U8)
            .field("name", TypeDesc::STRING)
            .field("color", TypeDesc::enumeration("app::Color"))
            .field("stamp", TypeDesc::DATE_TIME)
            .field("moment", TypeDesc::DATE_TIME_OFFSET)
            .field("span", TypeDesc::TIME_SPAN)
            .field("id", TypeDesc::GUID)
            .field("price", TypeDesc::DECIMAL)
            .field("version", TypeDesc::VERSION)
            .field("zone", TypeDesc::TIME_ZONE)
            .field("kind", TypeDesc::TYPE)
            .field("blob", TypeDesc::Bytes)
            .field("grid", TypeDesc::array(TypeDesc::I32))
            .field("names", TypeDesc::list(TypeDesc::STRING))
            .field("scores", TypeDesc::map(TypeDesc::STRING, TypeDesc::I32))
            .field("primes", TypeDesc::set(TypeDesc::I32))
            .field("child", TypeDesc::object("app::Record")),
    );

    let stamp: NaiveDateTime = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_nano_opt(12, 30, 15, 250)
        .unwrap();
    let offset = FixedOffset::east_opt(2 * 3600).unwrap();
    let moment = DateTime::<FixedOffset>::from_naive_utc_and_offset(stamp, offset);

    let mut scores = ValueMap::new();
    scores.insert(Value::from("alice"), Value::I32(3));
    scores.insert(Value::from("bob"), Value::I32(-4));
    let primes: ValueSet = [2, 3, 5, 7].into_iter().map(Value::I32).collect();

    let empty = registry.get_object("app::Record").unwrap().initial_data();
    let child = ObjRef::new_struct("app::Record", empty.with("name", "child"));

    let data = StructData::new()
        .with("flag", true)
        .with("letter", 'λ')
        .with("count", -9_000_000_000_i64)
        .with("ratio", 0.25_f64)
        .with("small", 255_u8)
        .with("name", "record")
        .with("color", EnumValue::new("app::Color", 1))
        .with("stamp", stamp)
        .with("moment", moment)
        .with("span", TimeDelta::new(90, 500).unwrap())
        .with("id", Uuid::from_u128(0x1234_5678_9abc_def0_1234_5678_9abc_def0))
        .with("price", Decimal::new(12_345, 2))
        .with("version", Version::new(1, 2, 3, 4))
        .with("zone", TimeZoneId::new("Europe/Berlin"))
        .with("kind", TypeDesc::list(TypeDesc::object("app::Record")))
        .with("blob", vec![0_u8, 1, 2, 254])
        .with("grid", ObjRef::new_array(TypeDesc::I32, [1, 2, 3].map(Value::I32)))
        .with("names", ObjRef::new_list(TypeDesc::STRING, [Value::from("x"), Value::Null]))
        .with("scores", ObjRef::new_map(TypeDesc::STRING, TypeDesc::I32, scores))
        .with("primes", ObjRef::new_set(TypeDesc::I32, primes))
        .with("child", child);
    let original = Value::Object(ObjRef::new_struct("app::Record", data));

    let bytes = save(&registry, &[original.clone()]);
    let (roots, warnings) = load_from_slice(&registry, &bytes, SerializerOptions::new()).unwrap();

    assert!(warnings.is_empty(), "{warnings:?}");
    assert_eq!(roots.len(), 1);
    assert!(roots[0].deep_eq(&original));
}

#[test]
fn inline_roots() {
    let registry = TypeRegistry::new();
    let roots = [Value::I32(7), Value::from("text"), Value::Null, Value::Bool(false)];
    let bytes = save(&registry, &roots);

    let (loaded, warnings) = load_from_slice(&registry, &bytes, SerializerOptions::new()).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(loaded, roots);
}

#[test]
fn cycles_and_shared_references() {
    let registry = node_registry();
    let a = node(1);
    let b = node(2);
    a.set("next", b.clone());
    b.set("next", a.clone());
    b.set("child", b.clone());

    let bytes = save(&registry, &[Value::Object(a.clone()), Value::Object(b)]);
    let (roots, _) = load_from_slice(&registry, &bytes, SerializerOptions::new()).unwrap();

    let a2 = roots[0].as_object().unwrap();
    let b2 = roots[1].as_object().unwrap();
    assert!(a2.get("next").unwrap().as_object().unwrap().ptr_eq(b2));
    assert!(b2.get("next").unwrap().as_object().unwrap().ptr_eq(a2));
    assert!(b2.get("child").unwrap().as_object().unwrap().ptr_eq(b2));
    assert!(roots[0].deep_eq(&Value::Object(a)));
}

#[test]
fn polymorphic_references() {
    let mut registry = TypeRegistry::new();
    registry.register_object(
        ObjectDef::new("app::Shape")
            .abstract_type()
            .visibility(Visibility::Public)
            .field("name", TypeDesc::STRING),
    );
    registry.register_object(
        ObjectDef::new("app::Circle")
            .base("app::Shape")
            .field("radius", TypeDesc::F64),
    );
    registry.register_object(
        ObjectDef::new("app::Drawing")
            .field("main", TypeDesc::object("app::Shape"))
            .field("shapes", TypeDesc::list(TypeDesc::object("app::Shape"))),
    );

    let circle = ObjRef::new_struct(
        "app::Circle",
        StructData::new().with("name", "sun").with("radius", 2.5_f64),
    );
    let shapes = ObjRef::new_list(
        TypeDesc::object("app::Shape"),
        [Value::Object(circle.clone()), Value::Null],
    );
    let drawing = ObjRef::new_struct(
        "app::Drawing",
        StructData::new().with("main", circle).with("shapes", shapes),
    );

    let bytes = save(&registry, &[Value::Object(drawing)]);
    let (roots, warnings) = load_from_slice(&registry, &bytes, SerializerOptions::new()).unwrap();
    assert!(warnings.is_empty());

    let drawing = roots[0].as_object().unwrap();
    let main = drawing.get("main").unwrap();
    let main = main.as_object().unwrap();
    assert_eq!(main.ty(), TypeDesc::object("app::Circle"));
    assert_eq!(main.get("name").unwrap(), Value::from("sun"));
    assert_eq!(main.get("radius").unwrap(), Value::F64(2.5));

    let shapes = drawing.get("shapes").unwrap().as_object().unwrap().items();
    assert_eq!(shapes.len(), 2);
    assert!(shapes[0].as_object().unwrap().ptr_eq(main));
    assert!(shapes[1].is_null());
}

#[test]
fn hashed_elements_are_hydrated_before_insertion() {
    let mut registry = TypeRegistry::new();
    registry.register_object(
        ObjectDef::new("app::Tag")
            .field("name", TypeDesc::STRING)
            .field("weight", TypeDesc::I32),
    );
    let tag_desc = TypeDesc::object("app::Tag");
    registry.register_object(
        ObjectDef::new("app::Bag")
            .field("tags", TypeDesc::set(tag_desc.clone()))
            .field("labels", TypeDesc::map(tag_desc.clone(), TypeDesc::STRING)),
    );

    let tag = |name: &str, weight: i32| {
        let data = StructData::new().with("name", name).with("weight", weight);
        Value::Object(ObjRef::new_struct("app::Tag", data))
    };

    let tags = [tag("a", 1), tag("b", 2), tag("c", 3)];
    let set: ValueSet = tags.iter().cloned().collect();
    let mut labels = ValueMap::new();
    for (tag, label) in tags.iter().zip(["first", "second", "third"]) {
        labels.insert(tag.clone(), Value::from(label));
    }
    let bag = ObjRef::new_struct(
        "app::Bag",
        StructData::new()
            .with("tags", ObjRef::new_set(tag_desc.clone(), set))
            .with("labels", ObjRef::new_map(tag_desc, TypeDesc::STRING, labels)),
    );

    let bytes = save(&registry, &[Value::Object(bag)]);
    let (roots, _) = load_from_slice(&registry, &bytes, SerializerOptions::new()).unwrap();
    let bag = roots[0].as_object().unwrap();

    let tags = bag.get("tags").unwrap();
    let tags = tags.as_object().unwrap().borrow();
    let ObjectData::Set(tags) = &tags.data else {
        panic!("expected a set, found {:?}", tags.data);
    };
    assert_eq!(tags.len(), 3);
    assert!(tags.contains(&tag("b", 2)));
    assert!(!tags.contains(&tag("b", 3)));

    let labels = bag.get("labels").unwrap();
    let labels = labels.as_object().unwrap().borrow();
    let ObjectData::Map(labels) = &labels.data else {
        panic!("expected a map, found {:?}", labels.data);
    };
    assert_eq!(labels.get(&tag("c", 3)), Some(&Value::from("third")));

    // Keys and elements are the same objects.
    for key in labels.keys() {
        assert!(tags.iter().any(|elem| elem == key));
    }
}

#[test]
fn set_elements_keep_their_identity_whatever_the_member_order() {
    let mut registry = TypeRegistry::new();
    registry.register_object(
        ObjectDef::new("app::Tag")
            .field("name", TypeDesc::STRING)
            .field("weight", TypeDesc::I32),
    );
    let tag_desc = TypeDesc::object("app::Tag");

    let in_order = |name: &str, weight: i32| {
        let data = StructData::new().with("name", name).with("weight", weight);
        Value::Object(ObjRef::new_struct("app::Tag", data))
    };
    let reversed = |name: &str, weight: i32| {
        let data = StructData::new().with("weight", weight).with("name", name);
        Value::Object(ObjRef::new_struct("app::Tag", data))
    };

    let mut set = ValueSet::new();
    assert!(set.insert(in_order("a", 1)));
    assert!(!set.insert(reversed("a", 1)));
    assert!(set.insert(reversed("b", 2)));
    assert_eq!(set.len(), 2);

    let root = Value::Object(ObjRef::new_set(tag_desc, set));
    let bytes = save(&registry, &[root.clone()]);
    let (roots, _) = load_from_slice(&registry, &bytes, SerializerOptions::new()).unwrap();
    assert!(roots[0].deep_eq(&root));

    let loaded = roots[0].as_object().unwrap().borrow();
    let ObjectData::Set(loaded) = &loaded.data else {
        panic!("expected a set, found {:?}", loaded.data);
    };
    assert_eq!(loaded.len(), 2);
    assert!(loaded.contains(&reversed("a", 1)));
    assert!(loaded.contains(&in_order("b", 2)));
}

// -----------------------------------------------------------------------------
// Partial and lazy loading

#[test]
fn partial_load_leaves_references_unpopulated() {
    let registry = node_registry();
    let (a, b, c) = (node(1), node(2), node(3));
    a.set("next", b.clone());
    b.set("next", c.clone());

    let bytes = save(&registry, &[Value::Object(a)]);
    let de = open(&registry, bytes, SerializerOptions::new());
    assert_eq!(de.state(), SessionState::Ready);
    assert_eq!(de.root_count(), 1);

    let root = de.load_object(0).unwrap();
    let a = root.as_object().unwrap();
    assert!(a.is_hydrated());
    let b = a.get("next").unwrap();
    let b = b.as_object().unwrap();
    assert_eq!(b.state(), ObjectState::Shell);
    assert_eq!(de.state(), SessionState::Ready);

    assert_eq!(de.hydrate_pending().unwrap(), 2);
    assert!(b.is_hydrated());
    assert_eq!(id_of(&b.get("next").unwrap()), Some(3));
    assert_eq!(de.state(), SessionState::Done);
    assert_eq!(de.hydrate_pending().unwrap(), 0);
}

#[test]
fn lazy_members_load_on_first_access() {
    let registry = node_registry();
    let (a, b, d) = (node(1), node(2), node(4));
    a.set("next", b);
    a.set("child", d);

    let bytes = save(&registry, &[Value::Object(a)]);
    let de = open(&registry, bytes.clone(), SerializerOptions::new().lazy(true));

    let root = de.load_object(0).unwrap();
    let a = root.as_object().unwrap();
    assert!(a.is_lazy("child"));
    assert!(!a.is_lazy("next"));
    assert!(a.get("next").unwrap().as_object().unwrap().is_hydrated());
    assert_eq!(de.state(), SessionState::Ready);

    let child = a.get("child").unwrap();
    assert_eq!(id_of(&child), Some(4));
    assert!(!a.is_lazy("child"));
    assert!(a.get("child").unwrap().as_object().unwrap().ptr_eq(child.as_object().unwrap()));
    assert_eq!(de.state(), SessionState::Done);

    // Unresolved slots need their deserializer.
    let de = open(&registry, bytes, SerializerOptions::new().lazy(true));
    let root = de.load_object(0).unwrap();
    drop(de);
    let a = root.as_object().unwrap();
    assert!(matches!(a.get("child"), Err(SerialError::SessionClosed)));
    assert_eq!(id_of(&a.get("next").unwrap()), Some(2));
}

#[test]
fn lazy_slots_reuse_allocated_objects() {
    let registry = node_registry();
    let a = node(1);
    let b = node(2);
    a.set("next", b.clone());
    a.set("child", b);

    let bytes = save(&registry, &[Value::Object(a)]);
    let de = open(&registry, bytes, SerializerOptions::new().lazy(true));
    let root = de.load_full_object(0).unwrap();
    let a = root.as_object().unwrap();

    assert!(!a.is_lazy("child"));
    let next = a.get("next").unwrap();
    assert!(a.get("child").unwrap().as_object().unwrap().ptr_eq(next.as_object().unwrap()));
}

// -----------------------------------------------------------------------------
// Schema evolution and visibility

#[test]
fn evolved_types_load_with_warnings() {
    let mut old = TypeRegistry::new();
    old.register_object(ObjectDef::new("app::Gone").field("x", TypeDesc::I32));
    old.register_object(
        ObjectDef::new("app::Doc")
            .field("title", TypeDesc::STRING)
            .field("pages", TypeDesc::I32)
            .field("legacy", TypeDesc::STRING)
            .field("extra", TypeDesc::object("app::Gone")),
    );

    let gone = ObjRef::new_struct("app::Gone", StructData::new().with("x", 1_i32));
    let doc = ObjRef::new_struct(
        "app::Doc",
        StructData::new()
            .with("title", "report")
            .with("pages", 12_i32)
            .with("legacy", "old")
            .with("extra", gone),
    );
    let bytes = save(&old, &[Value::Object(doc)]);

    let mut new = TypeRegistry::new();
    new.register_object(
        ObjectDef::new("app::Doc")
            .field("title", TypeDesc::STRING)
            .field("pages", TypeDesc::I64)
            .member(MemberDef::field("summary", TypeDesc::STRING).default_value(Value::from("n/a")))
            .field("extra", TypeDesc::object("app::Gone")),
    );

    let (roots, warnings) = load_from_slice(&new, &bytes, SerializerOptions::new()).unwrap();
    let doc = roots[0].as_object().unwrap();
    assert_eq!(doc.get("title").unwrap(), Value::from("report"));
    assert_eq!(doc.get("pages").unwrap(), Value::I64(0));
    assert_eq!(doc.get("summary").unwrap(), Value::from("n/a"));
    assert!(doc.get("extra").unwrap().is_null());
    assert!(doc.slot("legacy").is_none());

    let has = |kind: WarningKind, member: Option<&str>| {
        warnings
            .iter()
            .any(|w| w.kind == kind && w.member.as_deref() == member)
    };
    assert!(has(WarningKind::MemberTypeChanged, Some("pages")));
    assert!(has(WarningKind::MemberRemoved, Some("legacy")));
    assert!(has(WarningKind::TypeUnresolved, None));
}

#[test]
fn retyped_overridable_properties_are_skipped_in_lazy_sessions() {
    let holder = |child: TypeDesc| {
        ObjectDef::new("app::Holder")
            .field("id", TypeDesc::I32)
            .member(MemberDef::property("child", child).overridable())
    };
    let mut old = node_registry();
    old.register_object(holder(TypeDesc::object("app::Node")));
    let root = ObjRef::new_struct(
        "app::Holder",
        StructData::new().with("id", 5_i32).with("child", node(7)),
    );
    let bytes = save(&old, &[Value::Object(root)]);

    let mut new = node_registry();
    new.register_object(ObjectDef::new("app::Leaf").field("id", TypeDesc::I32));
    new.register_object(holder(TypeDesc::object("app::Leaf")));

    let de = open(&new, bytes, SerializerOptions::new().lazy(true));
    let root = de.load_object(0).unwrap();
    let holder = root.as_object().unwrap();
    assert!(!holder.is_lazy("child"));
    assert!(holder.get("child").unwrap().is_null());
    assert_eq!(holder.get("id").unwrap(), Value::I32(5));

    let warnings = de.warnings();
    assert!(warnings.iter().any(|w| {
        w.kind == WarningKind::MemberTypeChanged && w.member.as_deref() == Some("child")
    }));
    assert!(warnings.iter().all(|w| w.kind != WarningKind::ValueDropped));
}

#[test]
fn objects_behind_skipped_members_stay_unloaded() {
    let mut old = node_registry();
    old.register_object(
        ObjectDef::new("app::Holder").field("item", TypeDesc::object("app::Node")),
    );
    let root = ObjRef::new_struct("app::Holder", StructData::new().with("item", node(3)));
    let bytes = save(&old, &[Value::Object(root)]);

    let mut new = node_registry();
    new.register_object(ObjectDef::new("app::Holder").field("item", TypeDesc::I64));

    let de = open(&new, bytes, SerializerOptions::new());
    let root = de.load_full_object(0).unwrap();
    assert_eq!(root.as_object().unwrap().get("item").unwrap(), Value::I64(0));

    // The node is in the stream but nothing loaded references it.
    assert_eq!(de.hydrate_pending().unwrap(), 0);
    assert_eq!(de.state(), SessionState::Ready);
}

#[test]
fn public_only_sessions_filter_classes_and_members() {
    let mut registry = TypeRegistry::new();
    registry.register_object(
        ObjectDef::new("app::Account")
            .visibility(Visibility::Public)
            .field("owner", TypeDesc::STRING)
            .member(
                MemberDef::field("password", TypeDesc::STRING)
                    .visibility(MemberVisibility::Private),
            )
            .field("vault", TypeDesc::object("app::Vault"))
            .field("profile", TypeDesc::object("app::Profile"))
            .field("note", TypeDesc::object("app::Note")),
    );
    registry.register_object(
        ObjectDef::new("app::Vault")
            .visibility(Visibility::Private)
            .field("code", TypeDesc::I32),
    );
    registry.register_object(
        ObjectDef::new("app::Profile")
            .visibility(Visibility::Protected)
            .member(MemberDef::field("nick", TypeDesc::STRING).visibility(MemberVisibility::Public))
            .field("email", TypeDesc::STRING),
    );
    registry.register_object(ObjectDef::new("app::Note").field("text", TypeDesc::STRING));

    let account = ObjRef::new_struct(
        "app::Account",
        StructData::new()
            .with("owner", "me")
            .with("password", "hunter2")
            .with(
                "vault",
                ObjRef::new_struct("app::Vault", StructData::new().with("code", 1234_i32)),
            )
            .with(
                "profile",
                ObjRef::new_struct(
                    "app::Profile",
                    StructData::new().with("nick", "n").with("email", "e@x"),
                ),
            )
            .with(
                "note",
                ObjRef::new_struct("app::Note", StructData::new().with("text", "hi")),
            ),
    );

    let public = SerializerOptions::new().public_only(true);
    let mut serializer = crate::Serializer::with_options(&registry, public);
    let mut bytes = Vec::new();
    serializer.save(&mut bytes, &[Value::Object(account)]).unwrap();
    assert!(
        serializer
            .warnings()
            .iter()
            .any(|w| w.kind == WarningKind::TypeRejected && w.type_path == "app::Note")
    );

    let (roots, _) = load_from_slice(&registry, &bytes, SerializerOptions::new()).unwrap();
    let account = roots[0].as_object().unwrap();
    assert_eq!(account.get("owner").unwrap(), Value::from("me"));
    assert!(account.get("password").unwrap().is_null());
    assert!(account.get("vault").unwrap().is_null());
    assert!(account.get("note").unwrap().is_null());

    let profile = account.get("profile").unwrap();
    let profile = profile.as_object().unwrap();
    assert_eq!(profile.get("nick").unwrap(), Value::from("n"));
    assert!(profile.get("email").unwrap().is_null());
}

// -----------------------------------------------------------------------------
// Construction

#[test]
fn custom_constructors_restore_read_only_members() {
    let mut registry = TypeRegistry::new();
    registry.register_object(
        ObjectDef::new("app::Point")
            .member(MemberDef::field("x", TypeDesc::I32).read_only())
            .member(MemberDef::field("y", TypeDesc::I32).read_only())
            .field("label", TypeDesc::STRING)
            .constructor(["X", "Y"], |args| {
                let [x, y] = args else {
                    return Err("expected two arguments".to_string());
                };
                Ok(StructData::new().with("x", x.clone()).with("y", y.clone()))
            }),
    );

    let point = ObjRef::new_struct(
        "app::Point",
        StructData::new().with("x", 3_i32).with("y", -4_i32).with("label", "p"),
    );
    let bytes = save(&registry, &[Value::Object(point.clone())]);
    let (roots, _) = load_from_slice(&registry, &bytes, SerializerOptions::new()).unwrap();

    assert!(roots[0].deep_eq(&Value::Object(point)));
}

#[test]
fn types_without_constructor_fail_to_load() {
    let mut old = TypeRegistry::new();
    old.register_object(ObjectDef::new("app::Widget").field("size", TypeDesc::U16));
    let widget = ObjRef::new_struct("app::Widget", StructData::new().with("size", 3_u16));
    let bytes = save(&old, &[Value::Object(widget)]);

    let mut new = TypeRegistry::new();
    new.register_object(
        ObjectDef::new("app::Widget")
            .visibility(Visibility::Public)
            .no_default_constructor()
            .field("size", TypeDesc::U16),
    );
    let err = load_from_slice(&new, &bytes, SerializerOptions::new()).unwrap_err();
    assert!(matches!(err, SerialError::NoConstructor(ref ty) if ty == "app::Widget"));
}

// -----------------------------------------------------------------------------
// Failures

#[test]
fn mismatched_values_fail_to_save() {
    let registry = node_registry();
    let a = node(1);
    a.set("next", "not a node");

    let err = save_to_vec(&registry, SerializerOptions::new(), &[Value::Object(a)]).unwrap_err();
    assert!(matches!(
        err,
        SerialError::TypeMismatch { ref declared, ref actual }
            if *declared == TypeDesc::object("app::Node") && *actual == TypeDesc::STRING
    ));
}

#[test]
fn corrupt_streams() {
    let registry = node_registry();
    let bytes = save(&registry, &[Value::Object(node(1))]);

    let mut bad = bytes.clone();
    bad[0] = b'X';
    assert!(matches!(
        Deserializer::open(&registry, Cursor::new(bad), SerializerOptions::new()),
        Err(SerialError::BadMagic(_))
    ));

    let mut bad = bytes.clone();
    bad[4] = 9;
    assert!(matches!(
        Deserializer::open(&registry, Cursor::new(bad), SerializerOptions::new()),
        Err(SerialError::UnsupportedVersion(9))
    ));

    let truncated = bytes[..12].to_vec();
    let opened = Deserializer::open(&registry, Cursor::new(truncated), SerializerOptions::new());
    assert!(opened.is_err());

    let de = open(&registry, bytes, SerializerOptions::new());
    assert!(matches!(
        de.load_object(5),
        Err(SerialError::NoSuchRoot { index: 5, count: 1 })
    ));
}

#[test]
fn regions_are_bounded_by_the_declared_data_size() {
    let registry = node_registry();
    let mut bytes = save(&registry, &[Value::Object(node(1))]);

    let start = header_start(&bytes);
    bytes[start..start + 8].copy_from_slice(&0_u64.to_le_bytes());

    let de = open(&registry, bytes, SerializerOptions::new());
    assert!(matches!(
        de.load_full_object(0),
        Err(SerialError::RegionOverflow { index: 0, data_size: 0, .. })
    ));
}

#[test]
fn failed_objects_fail_again_when_reloaded() {
    let registry = node_registry();
    let mut bytes = save(&registry, &[Value::Object(node(1))]);

    let start = header_start(&bytes);
    bytes[start..start + 8].copy_from_slice(&0_u64.to_le_bytes());

    let de = open(&registry, bytes, SerializerOptions::new());
    for _ in 0..2 {
        assert!(matches!(
            de.load_full_object(0),
            Err(SerialError::RegionOverflow { index: 0, .. })
        ));
    }
    assert!(matches!(
        de.hydrate_pending(),
        Err(SerialError::RegionOverflow { index: 0, .. })
    ));
}

#[test]
fn truncated_payloads_are_out_of_bounds() {
    let registry = node_registry();
    let mut bytes = save(&registry, &[Value::Object(node(1))]);
    bytes.truncate(bytes.len() - 2);

    let de = open(&registry, bytes, SerializerOptions::new());
    assert!(matches!(
        de.load_full_object(0),
        Err(SerialError::OutOfBounds { .. })
    ));
}

#[test]
fn byte_arrays_are_bounded_by_their_region() {
    let registry = TypeRegistry::new();
    let mut bytes = save(&registry, &[Value::from(vec![1_u8, 2, 3])]);

    // data_size, one object size, then the custom header with the length.
    let length = header_start(&bytes) + 8 + 4;
    bytes[length..length + 4].copy_from_slice(&100_u32.to_le_bytes());

    let de = open(&registry, bytes, SerializerOptions::new());
    assert!(matches!(
        de.load_full_object(0),
        Err(SerialError::OutOfBounds { requested: 100, remaining: 3 })
    ));
}

#[test]
fn schemas_describe_the_stream() {
    let registry = node_registry();
    let a = node(1);
    a.set("next", node(2));
    let bytes = save(&registry, &[Value::Object(a)]);

    let de = open(&registry, bytes, SerializerOptions::new());
    let schemas = de.type_schemas();
    let descs: Vec<_> = schemas.iter().map(|schema| schema.desc().clone()).collect();
    assert_eq!(descs, [TypeDesc::object("app::Node"), TypeDesc::I32]);

    assert_eq!(schemas[0].num_objects(), 2);
    assert_eq!(schemas[1].num_objects(), 0);
    assert!(schemas[1].is_primitive());
    let names: Vec<_> = schemas[0].members().iter().map(|m| m.name()).collect();
    assert_eq!(names, ["id", "next", "child"]);
}
