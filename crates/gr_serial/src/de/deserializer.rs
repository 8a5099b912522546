use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Ref, RefCell, RefMut};

use std::io::{Cursor, Read, Seek};

use crate::de::session::LoadSession;
use crate::registry::TypeRegistry;
use crate::schema::TypeSchema;
use crate::value::Value;
use crate::{SerialError, SerializerOptions, SessionState, Warning};

/// Reads object graphs from a byte stream.
///
/// Objects are shared between every root loaded through the same
/// deserializer, so references across roots keep their identity. Lazy slots
/// hold a weak handle to the deserializer and can only be resolved while it
/// is alive.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
///
/// use gr_serial::registry::TypeRegistry;
/// use gr_serial::schema::{ObjectDef, TypeDesc};
/// use gr_serial::value::{ObjRef, StructData, Value};
/// use gr_serial::{Deserializer, SerializerOptions, save_to_vec};
///
/// let mut registry = TypeRegistry::new();
/// registry.register_object(
///     ObjectDef::new("app::Node")
///         .field("id", TypeDesc::I32)
///         .field("next", TypeDesc::object("app::Node")),
/// );
///
/// let a = ObjRef::new_struct("app::Node", StructData::new().with("id", 1_i32));
/// let b = ObjRef::new_struct("app::Node", StructData::new().with("id", 2_i32));
/// a.set("next", b.clone());
/// b.set("next", a.clone());
///
/// let bytes = save_to_vec(&registry, SerializerOptions::new(), &[Value::Object(a)]).unwrap();
///
/// let de = Deserializer::open(&registry, Cursor::new(bytes), SerializerOptions::new()).unwrap();
/// let root = de.load_full_object(0).unwrap();
/// let a = root.as_object().unwrap();
/// let b = a.get("next").unwrap();
/// let back = b.as_object().unwrap().get("next").unwrap();
/// assert!(back.as_object().unwrap().ptr_eq(a));
/// ```
pub struct Deserializer<R> {
    session: Rc<RefCell<LoadSession<R>>>,
}

impl<R: Read + Seek + 'static> Deserializer<R> {
    /// Opens a stream and reads everything but the object payloads.
    pub fn open(
        registry: &TypeRegistry,
        reader: R,
        options: SerializerOptions,
    ) -> Result<Self, SerialError> {
        Ok(Self {
            session: LoadSession::open(registry, reader, options)?,
        })
    }

    fn session(&self) -> Result<RefMut<'_, LoadSession<R>>, SerialError> {
        self.session
            .try_borrow_mut()
            .map_err(|_| SerialError::SessionBusy)
    }

    pub fn root_count(&self) -> usize {
        self.session.borrow().root_count()
    }

    /// Loads root `index` and hydrates it.
    ///
    /// The objects it references are allocated but stay unpopulated until
    /// [`hydrate_pending`](Self::hydrate_pending) runs or they are loaded as
    /// part of another root. In a lazy session every eagerly referenced
    /// object is hydrated as well, and lazy slots are left for first access.
    pub fn load_object(&self, index: usize) -> Result<Value, SerialError> {
        let mut session = self.session()?;
        session.state = SessionState::Hydrating;
        let (value, target) = session.root(index)?;
        if let Some(target) = target {
            session.hydrate(target)?;
        }
        if session.options.lazy {
            session.drain()?;
        }
        session.update_state();
        Ok(value)
    }

    /// Loads root `index` with everything it references, except lazy slots.
    pub fn load_full_object(&self, index: usize) -> Result<Value, SerialError> {
        let mut session = self.session()?;
        session.state = SessionState::Hydrating;
        let (value, target) = session.root(index)?;
        if let Some(target) = target {
            session.hydrate(target)?;
        }
        session.drain()?;
        session.update_state();
        Ok(value)
    }

    /// Hydrates every allocated but unpopulated object. Returns how many were hydrated.
    pub fn hydrate_pending(&self) -> Result<usize, SerialError> {
        let mut session = self.session()?;
        session.state = SessionState::Hydrating;
        let before = session.hydrated();
        session.drain()?;
        session.update_state();
        Ok((session.hydrated() - before) as usize)
    }

    /// Warnings collected so far, from opening the stream and from loading.
    pub fn warnings(&self) -> Ref<'_, [Warning]> {
        Ref::map(self.session.borrow(), |session| session.warnings.as_slice())
    }

    /// The schema of every type in the stream, in type-index order.
    pub fn type_schemas(&self) -> Vec<TypeSchema> {
        self.session
            .borrow()
            .repos()
            .map(|repo| repo.schema.clone())
            .collect()
    }

    pub fn state(&self) -> SessionState {
        self.session.borrow().state
    }

    pub fn options(&self) -> SerializerOptions {
        self.session.borrow().options
    }
}

/// Loads every root of `bytes` completely.
///
/// Lazy loading needs a live [`Deserializer`], so the `lazy` option is
/// ignored here.
pub fn load_from_slice(
    registry: &TypeRegistry,
    bytes: &[u8],
    options: SerializerOptions,
) -> Result<(Vec<Value>, Vec<Warning>), SerialError> {
    let de = Deserializer::open(registry, Cursor::new(bytes.to_vec()), options.lazy(false))?;
    let roots = (0..de.root_count())
        .map(|index| de.load_full_object(index))
        .collect::<Result<Vec<_>, _>>()?;
    let warnings = de.warnings().to_vec();
    Ok((roots, warnings))
}
