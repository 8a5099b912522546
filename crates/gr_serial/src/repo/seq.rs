//! Arrays and lists: a `u32` element count followed by one reference per element.

use alloc::vec::Vec;

use crate::SerialError;
use crate::clone::CloneSession;
use crate::de::LoadContext;
use crate::repo::{Codec, shape_mismatch};
use crate::schema::{Category, TypeDesc};
use crate::ser::SaveSession;
use crate::value::{ObjRef, Object, ObjectData, Value};
use crate::wire::{DataReader, DataWriter};

pub(crate) struct SeqCodec {
    elem: TypeDesc,
    array: bool,
}

impl SeqCodec {
    pub fn new(elem: TypeDesc, array: bool) -> Self {
        Self { elem, array }
    }

    fn items(obj: &ObjRef) -> Result<Vec<Value>, SerialError> {
        match obj.borrow().data.as_seq() {
            Some(items) => Ok(items.to_vec()),
            None => Err(shape_mismatch(obj)),
        }
    }

    fn wrap(&self, items: Vec<Value>) -> ObjectData {
        if self.array {
            ObjectData::Array(items)
        } else {
            ObjectData::List(items)
        }
    }
}

impl Codec for SeqCodec {
    fn category(&self) -> Category {
        if self.array {
            Category::Array
        } else {
            Category::List
        }
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
            .map_err(|_| SerialError::corrupt("collection has more than u32::MAX elements"))?;
        w.write_u32(count);
        for item in &items {
            cx.write_ref(&self.elem, item, w)?;
        }
        Ok(())
    }

    fn create_object(&self, desc: &TypeDesc) -> Result<Option<Object>, SerialError> {
        Ok(Some(Object::shell(desc.clone())))
    }

    fn load_object_data(
        &self,
        obj: &ObjRef,
        _index: u32,
        r: &mut DataReader<'_>,
        cx: &mut dyn LoadContext,
    ) -> Result<(), SerialError> {
        // Every element takes at least its tag byte.
        let count = r.read_count(1)?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(cx.read_ref(&self.elem, r)?);
        }
        obj.borrow_mut().data = self.wrap(items);
        Ok(())
    }

    fn clone_object(
        &self,
        src: &ObjRef,
        cx: &mut CloneSession<'_>,
    ) -> Result<ObjectData, SerialError> {
        let items = Self::items(src)?
            .iter()
            .map(|item| cx.clone_value(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.wrap(items))
    }
}
