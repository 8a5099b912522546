use alloc::string::String;
use alloc::vec::Vec;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::schema::{KnownKind, PrimitiveKind, TypeDesc};
use crate::value::{EnumValue, ObjRef, TimeZoneId, Version};

/// A dynamically typed value in an object graph.
///
/// Inline values are copied around freely. `Object` holds a shared handle;
/// two values referring to the same allocation are the same object.
///
/// `PartialEq` is shallow: inline values compare by value and objects by
/// identity. Use [`Value::deep_eq`] for structural comparison.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Enum(EnumValue),
    String(String),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    TimeSpan(TimeDelta),
    Guid(Uuid),
    Decimal(Decimal),
    Version(Version),
    TimeZone(TimeZoneId),
    Type(TypeDesc),
    Object(ObjRef),
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl From<$ty> for Value {
            #[inline]
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        }
    )*};
}

impl_from! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    EnumValue => Enum,
    String => String,
    NaiveDateTime => DateTime,
    DateTime<FixedOffset> => DateTimeOffset,
    TimeDelta => TimeSpan,
    Uuid => Guid,
    Decimal => Decimal,
    Version => Version,
    TimeZoneId => TimeZone,
    TypeDesc => Type,
    ObjRef => Object,
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(String::from(value))
    }
}

impl From<Vec<u8>> for Value {
    #[inline]
    fn from(value: Vec<u8>) -> Self {
        Self::Object(ObjRef::new_bytes(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Self::Null,
        }
    }
}

impl Value {
    /// Runtime type of the value, `None` for `Null`.
    pub fn type_desc(&self) -> Option<TypeDesc> {
        Some(match self {
            Self::Null => return None,
            Self::Bool(_) => TypeDesc::BOOL,
            Self::Char(_) => TypeDesc::CHAR,
            Self::I8(_) => TypeDesc::I8,
            Self::I16(_) => TypeDesc::I16,
            Self::I32(_) => TypeDesc::I32,
            Self::I64(_) => TypeDesc::I64,
            Self::U8(_) => TypeDesc::U8,
            Self::U16(_) => TypeDesc::U16,
            Self::U32(_) => TypeDesc::U32,
            Self::U64(_) => TypeDesc::U64,
            Self::F32(_) => TypeDesc::F32,
            Self::F64(_) => TypeDesc::F64,
            Self::Enum(e) => TypeDesc::Enum(e.ty.clone()),
            Self::String(_) => TypeDesc::STRING,
            Self::DateTime(_) => TypeDesc::DATE_TIME,
            Self::DateTimeOffset(_) => TypeDesc::DATE_TIME_OFFSET,
            Self::TimeSpan(_) => TypeDesc::TIME_SPAN,
            Self::Guid(_) => TypeDesc::GUID,
            Self::Decimal(_) => TypeDesc::DECIMAL,
            Self::Version(_) => TypeDesc::VERSION,
            Self::TimeZone(_) => TypeDesc::TIME_ZONE,
            Self::Type(_) => TypeDesc::TYPE,
            Self::Object(obj) => obj.ty(),
        })
    }

    /// Value held by a freshly constructed member of type `desc`.
    ///
    /// Plain value types start at zero; strings, well-known structs and
    /// objects start as `Null`.
    pub fn default_for(desc: &TypeDesc) -> Self {
        match desc {
            TypeDesc::Primitive(kind) => match kind {
                PrimitiveKind::Bool => Self::Bool(false),
                PrimitiveKind::Char => Self::Char('\0'),
                PrimitiveKind::I8 => Self::I8(0),
                PrimitiveKind::I16 => Self::I16(0),
                PrimitiveKind::I32 => Self::I32(0),
                PrimitiveKind::I64 => Self::I64(0),
                PrimitiveKind::U8 => Self::U8(0),
                PrimitiveKind::U16 => Self::U16(0),
                PrimitiveKind::U32 => Self::U32(0),
                PrimitiveKind::U64 => Self::U64(0),
                PrimitiveKind::F32 => Self::F32(0.0),
                PrimitiveKind::F64 => Self::F64(0.0),
            },
            TypeDesc::Enum(path) => Self::Enum(EnumValue::new(path.clone(), 0)),
            TypeDesc::Known(kind) => match kind {
                KnownKind::DateTime => Self::DateTime(NaiveDateTime::default()),
                KnownKind::DateTimeOffset => Self::DateTimeOffset(DateTime::default()),
                KnownKind::TimeSpan => Self::TimeSpan(TimeDelta::zero()),
                KnownKind::Guid => Self::Guid(Uuid::nil()),
                KnownKind::Decimal => Self::Decimal(Decimal::ZERO),
                KnownKind::Version | KnownKind::TimeZone | KnownKind::Type => Self::Null,
            },
            _ => Self::Null,
        }
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Written in place rather than through an object index.
    #[inline]
    pub const fn is_inline(&self) -> bool {
        !matches!(self, Self::Null | Self::Object(_))
    }

    #[inline]
    pub const fn as_object(&self) -> Option<&ObjRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Any integer that fits into an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::I8(v) => Some(v as i64),
            Self::I16(v) => Some(v as i64),
            Self::I32(v) => Some(v as i64),
            Self::I64(v) => Some(v),
            Self::U8(v) => Some(v as i64),
            Self::U16(v) => Some(v as i64),
            Self::U32(v) => Some(v as i64),
            Self::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::F32(v) => Some(v as f64),
            Self::F64(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Object(_), _) | (_, Self::Object(_)) => false,
            _ => crate::value::compare::inline_eq(self, other),
        }
    }
}
