//! Maps: a `u32` entry count followed by a key and a value reference per entry.
//!
//! Keys are hashed by content, so a key object has to be complete before it
//! is inserted. The preload pass hydrates every key first.

use alloc::vec::Vec;

use crate::SerialError;
use crate::clone::CloneSession;
use crate::de::LoadContext;
use crate::repo::{Codec, shape_mismatch};
use crate::schema::{Category, TypeDesc};
use crate::ser::SaveSession;
use crate::value::{ObjRef, Object, ObjectData, Value, ValueMap};
use crate::wire::{DataReader, DataWriter};

pub(crate) struct MapCodec {
    key: TypeDesc,
    value: TypeDesc,
}

impl MapCodec {
    pub fn new(key: TypeDesc, value: TypeDesc) -> Self {
        Self { key, value }
    }

    fn entries(obj: &ObjRef) -> Result<Vec<(Value, Value)>, SerialError> {
        match &obj.borrow().data {
            ObjectData::Map(map) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
            _ => Err(shape_mismatch(obj)),
        }
    }
}

impl Codec for MapCodec {
    fn category(&self) -> Category {
        Category::Map
    }

    fn add_child_objects(
        &self,
        obj: &ObjRef,
        cx: &mut SaveSession<'_>,
    ) -> Result<(), SerialError> {
        for (key, value) in &Self::entries(obj)? {
            cx.add_value(&self.key, key)?;
            cx.add_value(&self.value, value)?;
        }
        Ok(())
    }

    fn save_object(
        &self,
        obj: &ObjRef,
        w: &mut DataWriter,
        cx: &SaveSession<'_>,
    ) -> Result<(), SerialError> {
        let entries = Self::entries(obj)?;
        let count = u32::try_from(entries.len())
            .map_err(|_| SerialError::corrupt("map has more than u32::MAX entries"))?;
        w.write_u32(count);
        for (key, value) in &entries {
            cx.write_ref(&self.key, key, w)?;
            cx.write_ref(&self.value, value, w)?;
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
        let count = r.read_count(2)?;
        for _ in 0..count {
            let key = cx.read_ref(&self.key, r)?;
            cx.hydrate_now(&key)?;
            cx.skip_ref(&self.value, r)?;
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
        let count = r.read_count(2)?;
        let mut map = ValueMap::with_capacity(count);
        for _ in 0..count {
            let key = cx.read_ref(&self.key, r)?;
            let value = cx.read_ref(&self.value, r)?;
            map.insert(key, value);
        }
        obj.borrow_mut().data = ObjectData::Map(map);
        Ok(())
    }

    fn clone_object(
        &self,
        src: &ObjRef,
        cx: &mut CloneSession<'_>,
    ) -> Result<ObjectData, SerialError> {
        let entries = Self::entries(src)?;
        let mut map = ValueMap::with_capacity(entries.len());
        for (key, value) in &entries {
            let key = cx.clone_complete(key)?;
            let value = cx.clone_value(value)?;
            map.insert(key, value);
        }
        Ok(ObjectData::Map(map))
    }
}
