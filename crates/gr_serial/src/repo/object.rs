//! The generic codec of registered object types.
//!
//! The payload of an object is one reference per member schema, in schema
//! order. Loading allocates a shell first and populates it in a second step,
//! so cyclic references resolve to the shell.

use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::SerialError;
use crate::clone::CloneSession;
use crate::de::LoadContext;
use crate::repo::{Codec, shape_mismatch};
use crate::schema::{
    Category, Construction, ConstructorFn, MemberDef, MemberSchema, ObjectDef, TypeDesc, TypePath,
};
use crate::ser::SaveSession;
use crate::value::{ObjRef, Object, ObjectData, Slot, StructData, Value};
use crate::wire::{DataReader, DataWriter};

/// Source of one constructor argument.
#[derive(Debug)]
enum Param {
    /// The value stored for the member at this schema position.
    Member(usize),
    /// A live member the stream does not carry.
    Default(Value),
}

#[derive(Debug)]
enum ConstructorPlan {
    Default,
    Custom {
        func: ConstructorFn,
        params: Vec<Param>,
    },
    /// No constructor, or a parameter matching no member.
    Missing,
}

pub(crate) struct ObjectCodec {
    desc: TypeDesc,
    path: TypePath,
    members: Rc<[MemberSchema]>,
    live: Vec<MemberDef>,
    plan: ConstructorPlan,
    /// Schema positions consumed by the custom constructor.
    is_param: Vec<bool>,
}

impl ObjectCodec {
    pub fn new(
        desc: TypeDesc,
        def: &ObjectDef,
        live: Vec<MemberDef>,
        members: Rc<[MemberSchema]>,
    ) -> Self {
        let plan = match def.construction() {
            Construction::Default => ConstructorPlan::Default,
            Construction::None => ConstructorPlan::Missing,
            Construction::Custom(ctor) => ctor
                .params()
                .iter()
                .map(|param| match_param(param, &members, &live))
                .collect::<Option<Vec<_>>>()
                .map_or(ConstructorPlan::Missing, |params| ConstructorPlan::Custom {
                    func: ctor.func(),
                    params,
                }),
        };

        let mut is_param = alloc::vec![false; members.len()];
        if let ConstructorPlan::Custom { params, .. } = &plan {
            for param in params {
                if let Param::Member(index) = param {
                    is_param[*index] = true;
                }
            }
        }

        Self {
            path: def.type_path().clone(),
            desc,
            members,
            live,
            plan,
            is_param,
        }
    }

    /// Current member values of `obj` in schema order. Lazy slots are resolved.
    fn read_members(&self, obj: &ObjRef) -> Result<Vec<Value>, SerialError> {
        let slots: Vec<Option<Slot>> = {
            let object = obj.borrow();
            let ObjectData::Struct(data) = &object.data else {
                return Err(shape_mismatch(obj));
            };
            self.members
                .iter()
                .map(|member| data.slot(member.name()).cloned())
                .collect()
        };

        self.members
            .iter()
            .zip(slots)
            .map(|(member, slot)| match slot {
                Some(slot) => slot.resolve(),
                None => Ok(Value::default_for(member.desc())),
            })
            .collect()
    }

    /// Constructs the member data of a new instance from the values read for
    /// each schema position.
    fn build(&self, mut slots: Vec<Option<Slot>>) -> Result<StructData, SerialError> {
        let mut data: StructData = self
            .live
            .iter()
            .map(|member| (member.path().clone(), member.initial_value()))
            .collect();

        match &self.plan {
            ConstructorPlan::Default => {}
            ConstructorPlan::Custom { func, params } => {
                let args: Vec<Value> = params
                    .iter()
                    .map(|param| match param {
                        Param::Member(index) => match &slots[*index] {
                            Some(slot) => slot.peek().unwrap_or_default(),
                            None => Value::Null,
                        },
                        Param::Default(value) => value.clone(),
                    })
                    .collect();
                let built = func(&args).map_err(|reason| SerialError::ConstructorFailed {
                    ty: self.path.clone(),
                    reason,
                })?;
                for (name, slot) in built {
                    data.set_slot(name, slot);
                }
            }
            ConstructorPlan::Missing => return Err(SerialError::NoConstructor(self.path.clone())),
        }

        for (member, slot) in self.members.iter().zip(&mut slots) {
            if member.loadable() && member.writeable() {
                if let Some(slot) = slot.take() {
                    data.set_slot(member.path().clone(), slot);
                }
            }
        }
        Ok(data)
    }
}

fn match_param(param: &str, members: &[MemberSchema], live: &[MemberDef]) -> Option<Param> {
    if let Some(index) = members
        .iter()
        .position(|member| member.name().eq_ignore_ascii_case(param))
    {
        return Some(Param::Member(index));
    }
    live.iter()
        .find(|member| member.name().eq_ignore_ascii_case(param))
        .map(|member| Param::Default(member.initial_value()))
}

impl Codec for ObjectCodec {
    fn category(&self) -> Category {
        Category::Object
    }

    fn add_child_objects(
        &self,
        obj: &ObjRef,
        cx: &mut SaveSession<'_>,
    ) -> Result<(), SerialError> {
        let values = self.read_members(obj)?;
        for (member, value) in self.members.iter().zip(&values) {
            cx.add_value(member.desc(), value)?;
        }
        Ok(())
    }

    fn save_object(
        &self,
        obj: &ObjRef,
        w: &mut DataWriter,
        cx: &SaveSession<'_>,
    ) -> Result<(), SerialError> {
        let values = self.read_members(obj)?;
        for (member, value) in self.members.iter().zip(&values) {
            cx.write_ref(member.desc(), value, w)?;
        }
        Ok(())
    }

    fn create_object(&self, desc: &TypeDesc) -> Result<Option<Object>, SerialError> {
        match self.plan {
            ConstructorPlan::Missing => Err(SerialError::NoConstructor(self.path.clone())),
            _ => Ok(Some(Object::shell(desc.clone()))),
        }
    }

    fn load_object_data(
        &self,
        obj: &ObjRef,
        _index: u32,
        r: &mut DataReader<'_>,
        cx: &mut dyn LoadContext,
    ) -> Result<(), SerialError> {
        let mut slots = Vec::with_capacity(self.members.len());
        for (member, &is_param) in self.members.iter().zip(&self.is_param) {
            let slot = if is_param {
                // Constructor arguments are read even when the member itself
                // is not assignable.
                Some(Slot::Value(cx.read_ref(member.desc(), r)?))
            } else if !member.loadable() || !member.writeable() {
                cx.skip_ref(member.desc(), r)?;
                None
            } else if member.lazy() {
                Some(cx.read_lazy_ref(member.desc(), r)?)
            } else {
                Some(Slot::Value(cx.read_ref(member.desc(), r)?))
            };
            slots.push(slot);
        }

        let data = self.build(slots)?;
        obj.borrow_mut().data = ObjectData::Struct(data);
        Ok(())
    }

    fn clone_object(
        &self,
        src: &ObjRef,
        cx: &mut CloneSession<'_>,
    ) -> Result<ObjectData, SerialError> {
        let values = self.read_members(src)?;
        let mut slots = Vec::with_capacity(values.len());
        for value in &values {
            slots.push(Some(Slot::Value(cx.clone_value(value)?)));
        }
        log::trace!("cloning `{}` with {} members", self.desc, slots.len());
        Ok(ObjectData::Struct(self.build(slots)?))
    }
}

#[cfg(test)]
mod tests {
    use alloc::borrow::Cow;
    use alloc::format;
    use alloc::rc::Rc;
    use alloc::string::ToString;
    use alloc::vec;

    use super::ObjectCodec;
    use crate::SerialError;
    use crate::repo::Codec;
    use crate::schema::{MemberDef, MemberKind, MemberSchema, ObjectDef, TypeDesc};
    use crate::value::{Slot, StructData, Value};

    fn point_def() -> ObjectDef {
        ObjectDef::new("app::Point")
            .member(MemberDef::field("x", TypeDesc::I32).read_only())
            .member(MemberDef::field("y", TypeDesc::I32).read_only())
            .field("tag", TypeDesc::STRING)
            .constructor(["X", "Y"], |args| {
                let [x, y] = args else {
                    return Err("expected two arguments".to_string());
                };
                if x.as_i64() == Some(-1) {
                    return Err(format!("rejected {x:?}"));
                }
                Ok(StructData::new().with("x", x.clone()).with("y", y.clone()))
            })
    }

    fn make(def: &ObjectDef, stored: &[(&'static str, TypeDesc)]) -> ObjectCodec {
        let members: Rc<[MemberSchema]> = stored
            .iter()
            .map(|(name, desc)| {
                let mut member =
                    MemberSchema::new(Cow::Borrowed(*name), MemberKind::Field, desc.clone());
                member.set_writeable(def.get_member(name).is_some_and(MemberDef::has_setter));
                member
            })
            .collect();
        ObjectCodec::new(def.desc(), def, def.members().to_vec(), members)
    }

    #[test]
    fn custom_constructor_receives_read_only_members() {
        let def = point_def();
        let codec = make(
            &def,
            &[("x", TypeDesc::I32), ("y", TypeDesc::I32), ("tag", TypeDesc::STRING)],
        );
        let data = codec
            .build(vec![
                Some(Slot::Value(Value::I32(3))),
                Some(Slot::Value(Value::I32(4))),
                Some(Slot::Value(Value::from("p"))),
            ])
            .unwrap();

        let get = |name| data.slot(name).and_then(Slot::peek);
        assert_eq!(get("x"), Some(Value::I32(3)));
        assert_eq!(get("y"), Some(Value::I32(4)));
        assert_eq!(get("tag"), Some(Value::from("p")));
    }

    #[test]
    fn missing_members_use_defaults() {
        let def = point_def();
        let codec = make(&def, &[("x", TypeDesc::I32)]);
        let data = codec.build(vec![Some(Slot::Value(Value::I32(7)))]).unwrap();
        assert_eq!(data.slot("y").and_then(Slot::peek), Some(Value::I32(0)));
        assert_eq!(data.slot("tag").and_then(Slot::peek), Some(Value::Null));
    }

    #[test]
    fn constructor_failures() {
        let def = point_def();
        let codec = make(&def, &[("x", TypeDesc::I32), ("y", TypeDesc::I32)]);
        let err = codec
            .build(vec![
                Some(Slot::Value(Value::I32(-1))),
                Some(Slot::Value(Value::I32(0))),
            ])
            .unwrap_err();
        assert!(matches!(err, SerialError::ConstructorFailed { .. }));

        let orphan =
            ObjectDef::new("app::Orphan").constructor(["missing"], |_| Ok(StructData::new()));
        let codec = make(&orphan, &[]);
        assert!(matches!(
            codec.create_object(&orphan.desc()),
            Err(SerialError::NoConstructor(_))
        ));
    }
}
