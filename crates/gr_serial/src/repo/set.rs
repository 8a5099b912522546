//! Sets: a `u32` element count followed by one reference per element.
//!
//! Elements are hashed by content. The preload pass hydrates every element
//! before the load pass inserts any of them.

use alloc::vec::Vec;

use crate::SerialError;
use crate::clone::CloneSession;
use crate::de::LoadContext;
use crate::repo::{Codec, shape_mismatch};
use crate::schema::{Category, TypeDesc};
use crate::ser::SaveSession;
use crate::value::{ObjRef, Object, ObjectData, Value, ValueSet};
use crate::wire::{DataReader, DataWriter};

pub(crate) struct SetCodec {
    elem: TypeDesc,
}

impl SetCodec {
    pub fn new(elem: TypeDesc) -> Self {
        Self { elem }
    }

    fn items(obj: &ObjRef) -> Result<Vec<Value>, SerialError> {
        match &obj.borrow().data {
            ObjectData::Set(set) => Ok(set.iter().cloned().collect()),
            _ => Err(shape_mismatch(obj)),
        }
    }
}

impl Codec for SetCodec {
    fn category(&self) -> Category {
        Category::Set
    }

    fn add_child_objects(
        &self,
        obj: &ObjRef,
        cx: &mut SaveSession<'_>,
    ) -> Result<(), SerialError> {
        for item in &Self::items(obj)? {
            cx.add_value(&self.elem, item)?;
        }
        Ok(())
    }

    fn save_object(
        &self,
        obj: &ObjRef,
        w: &mut DataWriter,
        cx: &SaveSession<'_>,
    ) -> Result<(), SerialError> {
        let items = Self::items(obj)?;
        let count = u32::try_from(items.len())
            .map_err(|_| SerialError::corrupt("set has more than u32::MAX elements"))?;
        w.write_u32(count);
        for item in &items {
            cx.write_ref(&self.elem, item, w)?;
        }
        Ok(())
    }

    fn create_object(&self, desc: &TypeDesc) -> Result<Option<Object>, SerialError> {
        Ok(Some(Object::shell(desc.clone())))
    }

    fn preload_object_data(
        &self,
        _obj: &ObjRef,
        _index: u32,
        r: &mut DataReader<'_>,
        cx: &mut dyn LoadContext,
    ) -> Result<(), SerialError> {
        let count = r.read_count(1)?;
        for _ in 0..count {
            let item = cx.read_ref(&self.elem, r)?;
            cx.hydrate_now(&item)?;
        }
        Ok(())
    }

    fn load_object_data(
        &self,
        obj: &ObjRef,
        _index: u32,
        r: &mut DataReader<'_>,
        cx: &mut dyn LoadContext,
    ) -> Result<(), SerialError> {
        let count = r.read_count(1)?;
        let mut set = ValueSet::with_capacity(count);
        for _ in 0..count {
            set.insert(cx.read_ref(&self.elem, r)?);
        }
        obj.borrow_mut().data = ObjectData::Set(set);
        Ok(())
    }

    fn clone_object(
        &self,
        src: &ObjRef,
        cx: &mut CloneSession<'_>,
    ) -> Result<ObjectData, SerialError> {
        let mut set = ValueSet::new();
        for item in &Self::items(src)? {
            set.insert(cx.clone_complete(item)?);
        }
        Ok(ObjectData::Set(set))
    }
}
