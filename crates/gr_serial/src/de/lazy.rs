use alloc::rc::Weak;
use core::cell::{OnceCell, RefCell};

use crate::SerialError;
use crate::value::Value;

/// An object of a stream, not loaded yet: its type index and its index
/// within that type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub type_index: u16,
    pub object_index: u32,
}

impl TypeRef {
    #[inline]
    pub const fn new(type_index: u16, object_index: u32) -> Self {
        Self {
            type_index,
            object_index,
        }
    }
}

/// Loads the target of a lazy slot.
pub(crate) trait LazyResolver {
    fn resolve(&mut self, target: TypeRef) -> Result<Value, SerialError>;
}

/// A member value that is loaded on first access.
///
/// The slot only holds a weak handle to its deserializer. Once the
/// deserializer is dropped, unresolved slots fail with
/// [`SerialError::SessionClosed`]; resolved ones keep their value.
#[derive(Debug)]
pub struct LazyValue {
    target: TypeRef,
    cell: OnceCell<Value>,
    session: Weak<RefCell<dyn LazyResolver>>,
}

impl LazyValue {
    pub(crate) fn new(target: TypeRef, session: Weak<RefCell<dyn LazyResolver>>) -> Self {
        Self {
            target,
            cell: OnceCell::new(),
            session,
        }
    }

    #[inline]
    pub const fn target(&self) -> TypeRef {
        self.target
    }

    /// The value, if it has been loaded.
    #[inline]
    pub fn get(&self) -> Option<&Value> {
        self.cell.get()
    }

    /// Loads the value through the deserializer on first call, then returns
    /// the cached value.
    pub fn resolve(&self) -> Result<Value, SerialError> {
        if let Some(value) = self.cell.get() {
            return Ok(value.clone());
        }
        let session = self.session.upgrade().ok_or(SerialError::SessionClosed)?;
        let value = session
            .try_borrow_mut()
            .map_err(|_| SerialError::SessionBusy)?
            .resolve(self.target)?;
        Ok(self.cell.get_or_init(|| value).clone())
    }
}
