//! Content hashing and structural comparison.
//!
//! Hash containers key their elements by *content*: inline values by value,
//! struct objects by type path plus their inline members. Nested objects only
//! contribute their identity, so the hash of an element is fixed once the
//! element itself is populated. Other objects (collections, byte arrays)
//! hash by identity.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::hash::{BuildHasher, Hash, Hasher};
use core::mem;

use gr_utils::hash::{FixedHashState, HashSet};

use crate::value::{ObjRef, ObjectData, Slot, Value};

// -----------------------------------------------------------------------------
// Inline values

fn hash_inline<H: Hasher>(value: &Value, state: &mut H) {
    mem::discriminant(value).hash(state);
    match value {
        Value::Null => {}
        Value::Bool(v) => v.hash(state),
        Value::Char(v) => v.hash(state),
        Value::I8(v) => v.hash(state),
        Value::I16(v) => v.hash(state),
        Value::I32(v) => v.hash(state),
        Value::I64(v) => v.hash(state),
        Value::U8(v) => v.hash(state),
        Value::U16(v) => v.hash(state),
        Value::U32(v) => v.hash(state),
        Value::U64(v) => v.hash(state),
        Value::F32(v) => v.to_bits().hash(state),
        Value::F64(v) => v.to_bits().hash(state),
        Value::Enum(v) => v.hash(state),
        Value::String(v) => v.hash(state),
        Value::DateTime(v) => v.hash(state),
        Value::DateTimeOffset(v) => v.hash(state),
        Value::TimeSpan(v) => v.hash(state),
        Value::Guid(v) => v.hash(state),
        Value::Decimal(v) => v.hash(state),
        Value::Version(v) => v.hash(state),
        Value::TimeZone(v) => v.hash(state),
        Value::Type(v) => v.hash(state),
        Value::Object(obj) => obj.addr().hash(state),
    }
}

/// Equality of two non-object values. Floats compare by bit pattern.
pub(crate) fn inline_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Char(a), Value::Char(b)) => a == b,
        (Value::I8(a), Value::I8(b)) => a == b,
        (Value::I16(a), Value::I16(b)) => a == b,
        (Value::I32(a), Value::I32(b)) => a == b,
        (Value::I64(a), Value::I64(b)) => a == b,
        (Value::U8(a), Value::U8(b)) => a == b,
        (Value::U16(a), Value::U16(b)) => a == b,
        (Value::U32(a), Value::U32(b)) => a == b,
        (Value::U64(a), Value::U64(b)) => a == b,
        (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
        (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
        (Value::Enum(a), Value::Enum(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::DateTime(a), Value::DateTime(b)) => a == b,
        (Value::DateTimeOffset(a), Value::DateTimeOffset(b)) => a == b,
        (Value::TimeSpan(a), Value::TimeSpan(b)) => a == b,
        (Value::Guid(a), Value::Guid(b)) => a == b,
        (Value::Decimal(a), Value::Decimal(b)) => a == b,
        (Value::Version(a), Value::Version(b)) => a == b,
        (Value::TimeZone(a), Value::TimeZone(b)) => a == b,
        (Value::Type(a), Value::Type(b)) => a == b,
        (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
        _ => false,
    }
}

// -----------------------------------------------------------------------------
// Content hash

/// Hash of `value` as a set element or map key.
pub(crate) fn content_hash(value: &Value) -> u64 {
    let mut state = FixedHashState.build_hasher();
    match value {
        Value::Object(obj) => hash_object(obj, &mut state),
        other => hash_inline(other, &mut state),
    }
    state.finish()
}

fn hash_object<H: Hasher>(obj: &ObjRef, state: &mut H) {
    // An object that is being mutated right now can only hash by identity.
    let Some(inner) = obj.try_borrow() else {
        obj.addr().hash(state);
        return;
    };
    match &inner.data {
        ObjectData::Struct(data) => {
            inner.ty.hash(state);
            // Member order is not part of the content.
            let mut members: Vec<_> = data.iter().collect();
            members.sort_unstable_by_key(|(name, _)| *name);
            for (name, slot) in members {
                name.hash(state);
                match slot {
                    Slot::Value(value) => hash_inline(value, state),
                    Slot::Lazy(_) => 0xFFu8.hash(state),
                }
            }
        }
        _ => obj.addr().hash(state),
    }
}

/// Equality matching [`content_hash`].
pub(crate) fn content_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => object_content_eq(a, b),
        _ => inline_eq(a, b),
    }
}

fn object_content_eq(a: &ObjRef, b: &ObjRef) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    let (Some(a), Some(b)) = (a.try_borrow(), b.try_borrow()) else {
        return false;
    };
    match (&a.data, &b.data) {
        (ObjectData::Struct(x), ObjectData::Struct(y)) => {
            a.ty == b.ty
                && x.len() == y.len()
                && x.iter().all(|(name, sx)| match (sx, y.slot(name)) {
                    (Slot::Value(vx), Some(Slot::Value(vy))) => inline_eq(vx, vy),
                    (Slot::Lazy(lx), Some(Slot::Lazy(ly))) => Rc::ptr_eq(lx, ly),
                    _ => false,
                })
        }
        _ => false,
    }
}

// -----------------------------------------------------------------------------
// Deep equality

impl Value {
    /// Structural equality of two graphs.
    ///
    /// Objects are equal when they have the same runtime type and equal
    /// content. Cycles are followed once: a pair of objects already under
    /// comparison is assumed equal. Lazy slots are compared by their loaded
    /// value when available, and by identity otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use gr_serial::value::{ObjRef, StructData, Value};
    ///
    /// let a = ObjRef::new_struct("app::Node", StructData::new().with("id", 1_i32));
    /// let b = ObjRef::new_struct("app::Node", StructData::new().with("id", 1_i32));
    /// a.set("next", a.clone());
    /// b.set("next", b.clone());
    ///
    /// assert_ne!(Value::from(a.clone()), Value::from(b.clone()));
    /// assert!(Value::from(a).deep_eq(&Value::from(b)));
    /// ```
    pub fn deep_eq(&self, other: &Value) -> bool {
        let mut seen = HashSet::default();
        deep_eq_inner(self, other, &mut seen)
    }
}

fn deep_eq_inner(a: &Value, b: &Value, seen: &mut HashSet<(usize, usize)>) -> bool {
    let (Value::Object(x), Value::Object(y)) = (a, b) else {
        return inline_eq(a, b);
    };
    let key = (x.addr(), y.addr());
    if x.ptr_eq(y) || !seen.insert(key) {
        return true;
    }

    let equal = objects_deep_eq(x, y, seen);
    if !equal {
        // Only pairs still under comparison may be assumed equal.
        seen.remove(&key);
    }
    equal
}

fn objects_deep_eq(x: &ObjRef, y: &ObjRef, seen: &mut HashSet<(usize, usize)>) -> bool {
    let (ox, oy) = (x.borrow(), y.borrow());
    if ox.ty != oy.ty {
        return false;
    }
    match (&ox.data, &oy.data) {
        (ObjectData::Struct(dx), ObjectData::Struct(dy)) => {
            dx.len() == dy.len()
                && dx.iter().all(|(name, sx)| {
                    dy.slot(name)
                        .is_some_and(|sy| slot_deep_eq(sx, sy, seen))
                })
        }
        (ObjectData::Array(vx), ObjectData::Array(vy))
        | (ObjectData::List(vx), ObjectData::List(vy)) => {
            vx.len() == vy.len()
                && vx.iter().zip(vy).all(|(ex, ey)| deep_eq_inner(ex, ey, seen))
        }
        (ObjectData::Bytes(bx), ObjectData::Bytes(by)) => bx == by,
        (ObjectData::Set(sx), ObjectData::Set(sy)) => {
            sx.len() == sy.len()
                && sx
                    .iter()
                    .all(|ex| sy.iter().any(|ey| deep_eq_inner(ex, ey, seen)))
        }
        (ObjectData::Map(mx), ObjectData::Map(my)) => {
            mx.len() == my.len()
                && mx.iter().all(|(kx, vx)| {
                    my.iter()
                        .any(|(ky, vy)| deep_eq_inner(kx, ky, seen) && deep_eq_inner(vx, vy, seen))
                })
        }
        _ => false,
    }
}

fn slot_deep_eq(a: &Slot, b: &Slot, seen: &mut HashSet<(usize, usize)>) -> bool {
    match (a.peek(), b.peek()) {
        (Some(x), Some(y)) => deep_eq_inner(&x, &y, seen),
        (None, None) => match (a, b) {
            (Slot::Lazy(x), Slot::Lazy(y)) => x.target() == y.target(),
            _ => false,
        },
        _ => false,
    }
}
