//! Raw byte arrays.
//!
//! The payload is the bytes themselves. Their lengths are kept in the custom
//! header of the type, one `u32` per object.

use alloc::vec::Vec;
use core::cell::RefCell;

use crate::SerialError;
use crate::clone::CloneSession;
use crate::de::LoadContext;
use crate::repo::{Codec, shape_mismatch};
use crate::schema::{Category, TypeDesc};
use crate::ser::SaveSession;
use crate::value::{ObjRef, Object, ObjectData};
use crate::wire::{DataReader, DataWriter};

pub(crate) struct BytesCodec {
    lengths: RefCell<Vec<u32>>,
}

impl BytesCodec {
    pub fn new() -> Self {
        Self {
            lengths: RefCell::new(Vec::new()),
        }
    }

    fn bytes(obj: &ObjRef) -> Result<Vec<u8>, SerialError> {
        match &obj.borrow().data {
            ObjectData::Bytes(bytes) => Ok(bytes.clone()),
            _ => Err(shape_mismatch(obj)),
        }
    }

    fn len_of(obj: &ObjRef) -> Result<u32, SerialError> {
        match &obj.borrow().data {
            ObjectData::Bytes(bytes) => u32::try_from(bytes.len())
                .map_err(|_| SerialError::corrupt("byte array longer than u32::MAX")),
            _ => Err(shape_mismatch(obj)),
        }
    }
}

impl Codec for BytesCodec {
    fn category(&self) -> Category {
        Category::Bytes
    }

    fn save_object(
        &self,
        obj: &ObjRef,
        w: &mut DataWriter,
        _cx: &SaveSession<'_>,
    ) -> Result<(), SerialError> {
        match &obj.borrow().data {
            ObjectData::Bytes(bytes) => {
                w.write_bytes(bytes);
                Ok(())
            }
            _ => Err(shape_mismatch(obj)),
        }
    }

    fn write_custom_header(
        &self,
        objects: &[ObjRef],
        w: &mut DataWriter,
    ) -> Result<(), SerialError> {
        for obj in objects {
            w.write_u32(Self::len_of(obj)?);
        }
        Ok(())
    }

    fn read_custom_header(&self, count: u32, r: &mut DataReader<'_>) -> Result<(), SerialError> {
        let mut lengths = Vec::with_capacity((count as usize).min(r.remaining() / 4));
        for _ in 0..count {
            lengths.push(r.read_u32()?);
        }
        *self.lengths.borrow_mut() = lengths;
        Ok(())
    }

    fn create_object(&self, desc: &TypeDesc) -> Result<Option<Object>, SerialError> {
        Ok(Some(Object::shell(desc.clone())))
    }

    fn load_object_data(
        &self,
        obj: &ObjRef,
        index: u32,
        r: &mut DataReader<'_>,
        _cx: &mut dyn LoadContext,
    ) -> Result<(), SerialError> {
        let len = self
            .lengths
            .borrow()
            .get(index as usize)
            .copied()
            .ok_or_else(|| SerialError::corrupt("byte array without a length entry"))?;
        let bytes = r.take(len as usize)?.to_vec();
        obj.borrow_mut().data = ObjectData::Bytes(bytes);
        Ok(())
    }

    fn clone_object(
        &self,
        src: &ObjRef,
        _cx: &mut CloneSession<'_>,
    ) -> Result<ObjectData, SerialError> {
        Ok(ObjectData::Bytes(Self::bytes(src)?))
    }
}
