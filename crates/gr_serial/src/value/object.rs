use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Ref, RefCell, RefMut};
use core::fmt;

use crate::SerialError;
use crate::de::LazyValue;
use crate::schema::{TypeDesc, TypePath};
use crate::value::{Value, ValueMap, ValueSet};

// -----------------------------------------------------------------------------
// ObjectState

/// Load progress of an object.
///
/// Objects built by hand are `Hydrated`. A deserializer allocates `Shell`s
/// first, so references to them can be handed out before their data is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectState {
    Shell,
    Hydrating,
    Hydrated,
}

// -----------------------------------------------------------------------------
// Slot

/// A struct member: a value, or a reference that is loaded on first access.
#[derive(Debug, Clone)]
pub enum Slot {
    Value(Value),
    Lazy(Rc<LazyValue>),
}

impl Slot {
    /// The value of the slot, loading it if needed.
    pub fn resolve(&self) -> Result<Value, SerialError> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Lazy(lazy) => lazy.resolve(),
        }
    }

    /// The value of the slot if it is available without loading.
    pub fn peek(&self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value.clone()),
            Self::Lazy(lazy) => lazy.get().cloned(),
        }
    }

    #[inline]
    pub fn is_lazy(&self) -> bool {
        matches!(self, Self::Lazy(lazy) if lazy.get().is_none())
    }
}

impl From<Value> for Slot {
    #[inline]
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

// -----------------------------------------------------------------------------
// StructData

/// Named members of an object, in definition order.
#[derive(Debug, Clone, Default)]
pub struct StructData {
    slots: Vec<(TypePath, Slot)>,
}

impl StructData {
    #[inline]
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Replaces the slot `name`, appending it if it does not exist yet.
    pub fn set_slot(&mut self, name: impl Into<TypePath>, slot: Slot) {
        let name = name.into();
        match self.slots.iter_mut().find(|(n, _)| *n == name) {
            Some((_, old)) => *old = slot,
            None => self.slots.push((name, slot)),
        }
    }

    #[inline]
    pub fn set(&mut self, name: impl Into<TypePath>, value: impl Into<Value>) {
        self.set_slot(name, Slot::Value(value.into()));
    }

    /// Builder form of [`set`](Self::set).
    #[inline]
    pub fn with(mut self, name: impl Into<TypePath>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Slot)> {
        self.slots.iter().map(|(n, s)| (n.as_ref(), s))
    }
}

impl IntoIterator for StructData {
    type Item = (TypePath, Slot);
    type IntoIter = alloc::vec::IntoIter<(TypePath, Slot)>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.slots.into_iter()
    }
}

impl<N: Into<TypePath>> FromIterator<(N, Value)> for StructData {
    fn from_iter<I: IntoIterator<Item = (N, Value)>>(iter: I) -> Self {
        let mut data = Self::new();
        for (name, value) in iter {
            data.set(name, value);
        }
        data
    }
}

// -----------------------------------------------------------------------------
// Object

/// Payload of an object, by category.
#[derive(Debug, Clone)]
pub enum ObjectData {
    Struct(StructData),
    Array(Vec<Value>),
    List(Vec<Value>),
    Map(ValueMap),
    Set(ValueSet),
    Bytes(Vec<u8>),
}

impl ObjectData {
    /// Empty payload matching the shape of `desc`.
    pub fn empty_for(desc: &TypeDesc) -> Self {
        match desc {
            TypeDesc::Array(_) => Self::Array(Vec::new()),
            TypeDesc::List(_) => Self::List(Vec::new()),
            TypeDesc::Map(..) => Self::Map(ValueMap::new()),
            TypeDesc::Set(_) => Self::Set(ValueSet::new()),
            TypeDesc::Bytes => Self::Bytes(Vec::new()),
            _ => Self::Struct(StructData::new()),
        }
    }

    #[inline]
    pub fn as_struct(&self) -> Option<&StructData> {
        match self {
            Self::Struct(data) => Some(data),
            _ => None,
        }
    }

    /// Elements of an array or a list.
    #[inline]
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) | Self::List(items) => Some(items),
            _ => None,
        }
    }
}

/// An object of the graph.
#[derive(Debug, Clone)]
pub struct Object {
    pub ty: TypeDesc,
    pub data: ObjectData,
    pub state: ObjectState,
}

impl Object {
    #[inline]
    pub fn new(ty: TypeDesc, data: ObjectData) -> Self {
        Self {
            ty,
            data,
            state: ObjectState::Hydrated,
        }
    }

    /// An allocated object whose data has not been read yet.
    #[inline]
    pub fn shell(ty: TypeDesc) -> Self {
        Self {
            data: ObjectData::empty_for(&ty),
            ty,
            state: ObjectState::Shell,
        }
    }
}

// -----------------------------------------------------------------------------
// ObjRef

/// Shared handle to an [`Object`]. The allocation is the object's identity.
///
/// # Examples
///
/// ```
/// use gr_serial::schema::TypeDesc;
/// use gr_serial::value::{ObjRef, StructData, Value};
///
/// let a = ObjRef::new_struct("app::Node", StructData::new().with("id", 1_i32));
/// let b = ObjRef::new_struct("app::Node", StructData::new().with("next", a.clone()));
/// a.set("next", b.clone());
///
/// let next = b.get("next").unwrap();
/// assert!(next.as_object().unwrap().ptr_eq(&a));
/// assert_eq!(a.ty(), TypeDesc::object("app::Node"));
/// ```
#[derive(Clone)]
pub struct ObjRef(Rc<RefCell<Object>>);

impl ObjRef {
    #[inline]
    pub fn new(object: Object) -> Self {
        Self(Rc::new(RefCell::new(object)))
    }

    #[inline]
    pub fn new_struct(path: impl Into<TypePath>, data: StructData) -> Self {
        Self::new(Object::new(
            TypeDesc::Object(path.into()),
            ObjectData::Struct(data),
        ))
    }

    pub fn new_list(elem: TypeDesc, items: impl IntoIterator<Item = Value>) -> Self {
        Self::new(Object::new(
            TypeDesc::list(elem),
            ObjectData::List(items.into_iter().collect()),
        ))
    }

    pub fn new_array(elem: TypeDesc, items: impl IntoIterator<Item = Value>) -> Self {
        Self::new(Object::new(
            TypeDesc::array(elem),
            ObjectData::Array(items.into_iter().collect()),
        ))
    }

    pub fn new_map(key: TypeDesc, value: TypeDesc, entries: ValueMap) -> Self {
        Self::new(Object::new(TypeDesc::map(key, value), ObjectData::Map(entries)))
    }

    pub fn new_set(elem: TypeDesc, items: ValueSet) -> Self {
        Self::new(Object::new(TypeDesc::set(elem), ObjectData::Set(items)))
    }

    pub fn new_bytes(bytes: Vec<u8>) -> Self {
        Self::new(Object::new(TypeDesc::Bytes, ObjectData::Bytes(bytes)))
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Identity key of the object.
    #[inline]
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    #[inline]
    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    #[inline]
    pub fn borrow_mut(&self) -> RefMut<'_, Object> {
        self.0.borrow_mut()
    }

    #[inline]
    pub(crate) fn try_borrow(&self) -> Option<Ref<'_, Object>> {
        self.0.try_borrow().ok()
    }

    #[inline]
    pub fn ty(&self) -> TypeDesc {
        self.0.borrow().ty.clone()
    }

    #[inline]
    pub fn state(&self) -> ObjectState {
        self.0.borrow().state
    }

    #[inline]
    pub(crate) fn set_state(&self, state: ObjectState) {
        self.0.borrow_mut().state = state;
    }

    #[inline]
    pub fn is_hydrated(&self) -> bool {
        self.state() == ObjectState::Hydrated
    }

    /// The slot `name` of a struct object.
    pub fn slot(&self, name: &str) -> Option<Slot> {
        self.0.borrow().data.as_struct()?.slot(name).cloned()
    }

    /// Member `name`, loading it first if it is lazy. Missing members read as `Null`.
    pub fn get(&self, name: &str) -> Result<Value, SerialError> {
        // The borrow is released before a lazy slot calls back into its session.
        match self.slot(name) {
            Some(slot) => slot.resolve(),
            None => Ok(Value::Null),
        }
    }

    /// Member `name` if it is available without loading.
    pub fn peek(&self, name: &str) -> Option<Value> {
        self.slot(name)?.peek()
    }

    /// `true` while member `name` is an unresolved lazy slot.
    pub fn is_lazy(&self, name: &str) -> bool {
        self.slot(name).is_some_and(|slot| slot.is_lazy())
    }

    /// Sets member `name` of a struct object. Other objects are left unchanged.
    pub fn set(&self, name: impl Into<TypePath>, value: impl Into<Value>) {
        if let ObjectData::Struct(data) = &mut self.0.borrow_mut().data {
            data.set(name, value);
        }
    }

    /// Number of elements of a collection, or of members of a struct.
    pub fn len(&self) -> usize {
        match &self.0.borrow().data {
            ObjectData::Struct(data) => data.len(),
            ObjectData::Array(items) | ObjectData::List(items) => items.len(),
            ObjectData::Map(map) => map.len(),
            ObjectData::Set(set) => set.len(),
            ObjectData::Bytes(bytes) => bytes.len(),
        }
    }

    /// Elements of an array or a list.
    pub fn items(&self) -> Vec<Value> {
        match &self.0.borrow().data {
            ObjectData::Array(items) | ObjectData::List(items) => items.clone(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Graphs may be cyclic, so only the identity is printed.
        match self.0.try_borrow() {
            Ok(obj) => write!(f, "ObjRef({} @ {:#x})", obj.ty, self.addr()),
            Err(_) => write!(f, "ObjRef(<borrowed> @ {:#x})", self.addr()),
        }
    }
}
