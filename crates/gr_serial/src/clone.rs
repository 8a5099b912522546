//! Deep copies of object graphs.
//!
//! Cloning walks the graph the way a save followed by a load would, without
//! the byte stream in between: every source object is mapped to exactly one
//! copy, so shared references and cycles are preserved.

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;

use gr_utils::hash::HashMap;

use crate::registry::TypeRegistry;
use crate::repo::{Codec, DetectEnv, detect};
use crate::schema::TypeDesc;
use crate::value::{ObjRef, ObjectState, Value};
use crate::{SerialError, SerializerOptions, Warning};

pub(crate) struct CloneSession<'a> {
    registry: &'a TypeRegistry,
    options: SerializerOptions,
    codecs: HashMap<TypeDesc, Option<Rc<dyn Codec>>>,
    /// Source identity to its copy.
    clones: HashMap<usize, ObjRef>,
    queue: VecDeque<(ObjRef, ObjRef)>,
    warnings: Vec<Warning>,
}

impl<'a> CloneSession<'a> {
    fn new(registry: &'a TypeRegistry, options: SerializerOptions) -> Self {
        Self {
            registry,
            options,
            codecs: HashMap::default(),
            clones: HashMap::default(),
            queue: VecDeque::new(),
            warnings: Vec::new(),
        }
    }

    fn codec_for(&mut self, desc: &TypeDesc) -> Option<Rc<dyn Codec>> {
        if let Some(codec) = self.codecs.get(desc) {
            return codec.clone();
        }
        let detected = detect(
            desc,
            &mut DetectEnv {
                registry: self.registry,
                options: self.options,
                stored: None,
                warnings: &mut self.warnings,
            },
        );
        let codec = (!detected.hidden && detected.schema.resolved()).then_some(detected.codec);
        self.codecs.insert(desc.clone(), codec.clone());
        codec
    }

    /// The copy of `value`. Inline values are copied, objects are mapped to
    /// their copy, which may still be unpopulated.
    pub fn clone_value(&mut self, value: &Value) -> Result<Value, SerialError> {
        let Value::Object(src) = value else {
            return Ok(value.clone());
        };
        if let Some(dst) = self.clones.get(&src.addr()) {
            return Ok(Value::Object(dst.clone()));
        }

        let ty = src.ty();
        let Some(codec) = self.codec_for(&ty) else {
            return Ok(Value::Null);
        };
        let Some(object) = codec.create_object(&ty)? else {
            return Ok(Value::Null);
        };
        let dst = ObjRef::new(object);
        self.clones.insert(src.addr(), dst.clone());
        self.queue.push_back((src.clone(), dst.clone()));
        Ok(Value::Object(dst))
    }

    /// Like [`clone_value`](Self::clone_value), but a new copy is populated
    /// before it is returned. Hashed elements need their content.
    pub fn clone_complete(&mut self, value: &Value) -> Result<Value, SerialError> {
        let cloned = self.clone_value(value)?;
        if let (Value::Object(src), Value::Object(dst)) = (value, &cloned) {
            self.fill(src, dst)?;
        }
        Ok(cloned)
    }

    fn fill(&mut self, src: &ObjRef, dst: &ObjRef) -> Result<(), SerialError> {
        if dst.state() != ObjectState::Shell {
            return Ok(());
        }
        let codec = self
            .codec_for(&src.ty())
            .ok_or_else(|| SerialError::NotCloneable(src.ty()))?;

        dst.set_state(ObjectState::Hydrating);
        let data = codec.clone_object(src, self)?;
        let mut object = dst.borrow_mut();
        object.data = data;
        object.state = ObjectState::Hydrated;
        Ok(())
    }

    fn drain(&mut self) -> Result<(), SerialError> {
        while let Some((src, dst)) = self.queue.pop_front() {
            self.fill(&src, &dst)?;
        }
        Ok(())
    }
}

/// Copies the graph reachable from `value`.
///
/// Types are resolved exactly as for a save with `options`: types that would
/// be written as null are cloned as null. Inline values have value semantics
/// and cannot be cloned as objects.
///
/// # Examples
///
/// ```
/// use gr_serial::registry::TypeRegistry;
/// use gr_serial::schema::{ObjectDef, TypeDesc};
/// use gr_serial::value::{ObjRef, StructData, Value};
/// use gr_serial::{SerializerOptions, deep_clone};
///
/// let mut registry = TypeRegistry::new();
/// registry.register_object(ObjectDef::new("app::Cell").field("value", TypeDesc::I64));
///
/// let cell = ObjRef::new_struct("app::Cell", StructData::new().with("value", 7_i64));
/// let root = Value::Object(cell.clone());
/// let copy = deep_clone(&registry, SerializerOptions::new(), &root).unwrap();
///
/// let copy = copy.as_object().unwrap();
/// assert!(!copy.ptr_eq(&cell));
/// assert_eq!(copy.get("value").unwrap(), Value::I64(7));
/// ```
pub fn deep_clone(
    registry: &TypeRegistry,
    options: SerializerOptions,
    value: &Value,
) -> Result<Value, SerialError> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Object(_) => {
            let mut session = CloneSession::new(registry, options);
            let copy = session.clone_value(value)?;
            session.drain()?;
            Ok(copy)
        }
        _ => Err(SerialError::NotCloneable(
            value.type_desc().unwrap_or(TypeDesc::Any),
        )),
    }
}
