//! The dynamic object-graph model.

mod compare;
mod known;
mod map;
mod object;
mod set;
mod value;

pub use known::{EnumValue, TimeZoneId, Version};
pub use map::ValueMap;
pub use object::{ObjRef, Object, ObjectData, ObjectState, Slot, StructData};
pub use set::ValueSet;
pub use value::Value;
