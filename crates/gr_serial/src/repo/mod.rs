//! Per-type codecs and their session state.
//!
//! Every distinct runtime type seen by a session gets one [`TypeRepo`]: its
//! [`TypeSchema`], the [`Codec`] chosen for its category, and the objects of
//! that type known to the session. The position of a repo in the session's
//! table is the type index written to the stream.

mod bytes;
mod detect;
mod inline;
mod map;
mod object;
mod seq;
mod set;
mod unknown;

use alloc::format;
use alloc::rc::Rc;
use alloc::vec::Vec;

use gr_utils::hash::HashMap;

use crate::SerialError;
use crate::clone::CloneSession;
use crate::de::LoadContext;
use crate::schema::{Category, TypeDesc, TypeSchema};
use crate::ser::SaveSession;
use crate::value::{ObjRef, Object, ObjectData, Value};
use crate::wire::{DataReader, DataWriter};

pub(crate) use detect::{DetectEnv, Detected, detect};
pub(crate) use inline::inline_codec;

// -----------------------------------------------------------------------------
// Codec

/// Encoding rules of one value category.
///
/// Inline categories implement the `*_value` methods and are never asked to
/// save, load or clone objects. Object categories implement the two-phase
/// load: [`create_object`](Codec::create_object) allocates a shell that is
/// registered under its index before
/// [`load_object_data`](Codec::load_object_data) populates it.
pub(crate) trait Codec {
    fn category(&self) -> Category;

    // ---- Inline values

    fn write_value(&self, value: &Value, w: &mut DataWriter) -> Result<(), SerialError> {
        let _ = (value, w);
        Err(not_inline(self.category()))
    }

    fn read_value(&self, desc: &TypeDesc, r: &mut DataReader<'_>) -> Result<Value, SerialError> {
        let _ = (desc, r);
        Err(not_inline(self.category()))
    }

    fn skip_value(&self, desc: &TypeDesc, r: &mut DataReader<'_>) -> Result<(), SerialError> {
        self.read_value(desc, r).map(drop)
    }

    // ---- Save

    /// Registers every value `obj` refers to.
    fn add_child_objects(
        &self,
        obj: &ObjRef,
        cx: &mut SaveSession<'_>,
    ) -> Result<(), SerialError> {
        let _ = (obj, cx);
        Ok(())
    }

    /// Writes the payload of `obj`: its own data, with references to children.
    fn save_object(
        &self,
        obj: &ObjRef,
        w: &mut DataWriter,
        cx: &SaveSession<'_>,
    ) -> Result<(), SerialError> {
        let _ = (obj, w, cx);
        Ok(())
    }

    /// Writes codec data that follows the size table of the type.
    fn write_custom_header(
        &self,
        objects: &[ObjRef],
        w: &mut DataWriter,
    ) -> Result<(), SerialError> {
        let _ = (objects, w);
        Ok(())
    }

    // ---- Load

    fn read_custom_header(&self, count: u32, r: &mut DataReader<'_>) -> Result<(), SerialError> {
        let _ = (count, r);
        Ok(())
    }

    /// Allocates an unpopulated object, or `None` if the type cannot be loaded.
    fn create_object(&self, desc: &TypeDesc) -> Result<Option<Object>, SerialError> {
        let _ = desc;
        Ok(None)
    }

    /// Runs over the payload before [`load_object_data`](Codec::load_object_data).
    fn preload_object_data(
        &self,
        obj: &ObjRef,
        index: u32,
        r: &mut DataReader<'_>,
        cx: &mut dyn LoadContext,
    ) -> Result<(), SerialError> {
        let _ = (obj, index, r, cx);
        Ok(())
    }

    fn load_object_data(
        &self,
        obj: &ObjRef,
        index: u32,
        r: &mut DataReader<'_>,
        cx: &mut dyn LoadContext,
    ) -> Result<(), SerialError> {
        let _ = (obj, index, r, cx);
        Ok(())
    }

    // ---- Clone

    /// Copies the data of `src`, cloning referenced objects through `cx`.
    fn clone_object(
        &self,
        src: &ObjRef,
        cx: &mut CloneSession<'_>,
    ) -> Result<ObjectData, SerialError> {
        let _ = cx;
        Err(SerialError::NotCloneable(src.ty()))
    }
}

#[cold]
fn not_inline(category: Category) -> SerialError {
    SerialError::CorruptData(format!("`{category}` values are not written inline").into())
}

/// Error for an object whose data does not have the shape of its type.
#[cold]
pub(crate) fn shape_mismatch(obj: &ObjRef) -> SerialError {
    SerialError::CorruptData(format!("object data does not match its type `{}`", obj.ty()).into())
}

// -----------------------------------------------------------------------------
// TypeRepo

/// One type of one session.
pub(crate) struct TypeRepo {
    pub schema: TypeSchema,
    pub codec: Rc<dyn Codec>,

    // ---- Save
    /// Discovered objects, in index order.
    pub objects: Vec<ObjRef>,
    /// Identity of each discovered object to its index.
    pub object_to_index: HashMap<usize, u32>,

    // ---- Load
    /// Allocated objects. A slot is filled before its object is populated.
    pub loaded: Vec<Option<ObjRef>>,
    pub offsets: Vec<u64>,
    pub sizes: Vec<u32>,
}

impl TypeRepo {
    pub fn new(detected: Detected) -> Self {
        Self {
            schema: detected.schema,
            codec: detected.codec,
            objects: Vec::new(),
            object_to_index: HashMap::default(),
            loaded: Vec::new(),
            offsets: Vec::new(),
            sizes: Vec::new(),
        }
    }

    #[inline]
    pub fn desc(&self) -> &TypeDesc {
        self.schema.desc()
    }
}
