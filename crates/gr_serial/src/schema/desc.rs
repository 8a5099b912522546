use alloc::borrow::Cow;
use alloc::boxed::Box;
use core::fmt;

use crate::SerialError;
use crate::wire::{DataReader, DataWriter};

/// Fully qualified name of a registered object or enum type.
pub type TypePath = Cow<'static, str>;

// -----------------------------------------------------------------------------
// PrimitiveKind

/// Fixed-size scalar categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PrimitiveKind {
    Bool = 0,
    Char = 1,
    I8 = 2,
    I16 = 3,
    I32 = 4,
    I64 = 5,
    U8 = 6,
    U16 = 7,
    U32 = 8,
    U64 = 9,
    F32 = 10,
    F64 = 11,
}

impl PrimitiveKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    pub const fn from_u8(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Bool,
            1 => Self::Char,
            2 => Self::I8,
            3 => Self::I16,
            4 => Self::I32,
            5 => Self::I64,
            6 => Self::U8,
            7 => Self::U16,
            8 => Self::U32,
            9 => Self::U64,
            10 => Self::F32,
            11 => Self::F64,
            _ => return None,
        })
    }
}

// -----------------------------------------------------------------------------
// KnownKind

/// Well-known value types with a dedicated inline encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum KnownKind {
    DateTime = 0,
    DateTimeOffset = 1,
    TimeSpan = 2,
    Guid = 3,
    Decimal = 4,
    Version = 5,
    TimeZone = 6,
    Type = 7,
}

impl KnownKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::DateTime => "DateTime",
            Self::DateTimeOffset => "DateTimeOffset",
            Self::TimeSpan => "TimeSpan",
            Self::Guid => "Guid",
            Self::Decimal => "Decimal",
            Self::Version => "Version",
            Self::TimeZone => "TimeZone",
            Self::Type => "Type",
        }
    }

    pub const fn from_u8(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::DateTime,
            1 => Self::DateTimeOffset,
            2 => Self::TimeSpan,
            3 => Self::Guid,
            4 => Self::Decimal,
            5 => Self::Version,
            6 => Self::TimeZone,
            7 => Self::Type,
            _ => return None,
        })
    }

    /// Plain values, as opposed to the small structs (`Version`, `TimeZone`, `Type`).
    pub const fn is_plain_value(self) -> bool {
        matches!(
            self,
            Self::DateTime | Self::DateTimeOffset | Self::TimeSpan | Self::Guid | Self::Decimal
        )
    }
}

// -----------------------------------------------------------------------------
// TypeDesc

/// Structural description of a declared or runtime type.
///
/// A member is declared with a `TypeDesc`, and every [`Value`] reports the
/// `TypeDesc` of what it actually holds. The two are compared at each reference
/// site to decide between a base and a derived reference.
///
/// # Examples
///
/// ```
/// use gr_serial::schema::TypeDesc;
///
/// let desc = TypeDesc::map(TypeDesc::STRING, TypeDesc::list(TypeDesc::object("app::Node")));
/// assert_eq!(desc.to_string(), "Map<String, List<app::Node>>");
/// assert!(!desc.is_inline());
/// assert!(TypeDesc::I32.is_inline());
/// ```
///
/// [`Value`]: crate::value::Value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeDesc {
    /// Accepts any value; every non-null reference is derived.
    Any,
    Primitive(PrimitiveKind),
    String,
    Known(KnownKind),
    Enum(TypePath),
    /// Raw byte array.
    Bytes,
    Array(Box<TypeDesc>),
    List(Box<TypeDesc>),
    Map(Box<TypeDesc>, Box<TypeDesc>),
    Set(Box<TypeDesc>),
    Object(TypePath),
}

const TAG_ANY: u8 = 0;
const TAG_PRIMITIVE: u8 = 1;
const TAG_STRING: u8 = 2;
const TAG_KNOWN: u8 = 3;
const TAG_ENUM: u8 = 4;
const TAG_BYTES: u8 = 5;
const TAG_ARRAY: u8 = 6;
const TAG_LIST: u8 = 7;
const TAG_MAP: u8 = 8;
const TAG_SET: u8 = 9;
const TAG_OBJECT: u8 = 10;

/// Nesting limit when decoding, so a hostile stream cannot exhaust the stack.
const MAX_DEPTH: u32 = 64;

impl TypeDesc {
    pub const BOOL: Self = Self::Primitive(PrimitiveKind::Bool);
    pub const CHAR: Self = Self::Primitive(PrimitiveKind::Char);
    pub const I8: Self = Self::Primitive(PrimitiveKind::I8);
    pub const I16: Self = Self::Primitive(PrimitiveKind::I16);
    pub const I32: Self = Self::Primitive(PrimitiveKind::I32);
    pub const I64: Self = Self::Primitive(PrimitiveKind::I64);
    pub const U8: Self = Self::Primitive(PrimitiveKind::U8);
    pub const U16: Self = Self::Primitive(PrimitiveKind::U16);
    pub const U32: Self = Self::Primitive(PrimitiveKind::U32);
    pub const U64: Self = Self::Primitive(PrimitiveKind::U64);
    pub const F32: Self = Self::Primitive(PrimitiveKind::F32);
    pub const F64: Self = Self::Primitive(PrimitiveKind::F64);
    pub const STRING: Self = Self::String;
    pub const DATE_TIME: Self = Self::Known(KnownKind::DateTime);
    pub const DATE_TIME_OFFSET: Self = Self::Known(KnownKind::DateTimeOffset);
    pub const TIME_SPAN: Self = Self::Known(KnownKind::TimeSpan);
    pub const GUID: Self = Self::Known(KnownKind::Guid);
    pub const DECIMAL: Self = Self::Known(KnownKind::Decimal);
    pub const VERSION: Self = Self::Known(KnownKind::Version);
    pub const TIME_ZONE: Self = Self::Known(KnownKind::TimeZone);
    pub const TYPE: Self = Self::Known(KnownKind::Type);

    #[inline]
    pub fn object(path: impl Into<TypePath>) -> Self {
        Self::Object(path.into())
    }

    #[inline]
    pub fn enumeration(path: impl Into<TypePath>) -> Self {
        Self::Enum(path.into())
    }

    #[inline]
    pub fn array(elem: TypeDesc) -> Self {
        Self::Array(Box::new(elem))
    }

    #[inline]
    pub fn list(elem: TypeDesc) -> Self {
        Self::List(Box::new(elem))
    }

    #[inline]
    pub fn set(elem: TypeDesc) -> Self {
        Self::Set(Box::new(elem))
    }

    #[inline]
    pub fn map(key: TypeDesc, value: TypeDesc) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Values of this type are written in place, never through an object index.
    #[inline]
    pub const fn is_inline(&self) -> bool {
        matches!(
            self,
            Self::Primitive(_) | Self::String | Self::Known(_) | Self::Enum(_)
        )
    }

    /// The registered path of an object or enum type.
    #[inline]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Object(path) | Self::Enum(path) => Some(path.as_ref()),
            _ => None,
        }
    }

    pub fn encode(&self, w: &mut DataWriter) {
        match self {
            Self::Any => w.write_u8(TAG_ANY),
            Self::Primitive(kind) => {
                w.write_u8(TAG_PRIMITIVE);
                w.write_u8(*kind as u8);
            }
            Self::String => w.write_u8(TAG_STRING),
            Self::Known(kind) => {
                w.write_u8(TAG_KNOWN);
                w.write_u8(*kind as u8);
            }
            Self::Enum(path) => {
                w.write_u8(TAG_ENUM);
                w.write_str(path);
            }
            Self::Bytes => w.write_u8(TAG_BYTES),
            Self::Array(elem) => {
                w.write_u8(TAG_ARRAY);
                elem.encode(w);
            }
            Self::List(elem) => {
                w.write_u8(TAG_LIST);
                elem.encode(w);
            }
            Self::Map(key, value) => {
                w.write_u8(TAG_MAP);
                key.encode(w);
                value.encode(w);
            }
            Self::Set(elem) => {
                w.write_u8(TAG_SET);
                elem.encode(w);
            }
            Self::Object(path) => {
                w.write_u8(TAG_OBJECT);
                w.write_str(path);
            }
        }
    }

    #[inline]
    pub fn decode(r: &mut DataReader<'_>) -> Result<Self, SerialError> {
        Self::decode_nested(r, 0)
    }

    fn decode_nested(r: &mut DataReader<'_>, depth: u32) -> Result<Self, SerialError> {
        if depth > MAX_DEPTH {
            return Err(SerialError::corrupt("type descriptor nested too deeply"));
        }
        let nested = |r: &mut DataReader<'_>| Self::decode_nested(r, depth + 1).map(Box::new);

        Ok(match r.read_u8()? {
            TAG_ANY => Self::Any,
            TAG_PRIMITIVE => match PrimitiveKind::from_u8(r.read_u8()?) {
                Some(kind) => Self::Primitive(kind),
                None => return Err(SerialError::corrupt("unknown primitive kind")),
            },
            TAG_STRING => Self::String,
            TAG_KNOWN => match KnownKind::from_u8(r.read_u8()?) {
                Some(kind) => Self::Known(kind),
                None => return Err(SerialError::corrupt("unknown well-known kind")),
            },
            TAG_ENUM => Self::Enum(Cow::Owned(r.read_string()?)),
            TAG_BYTES => Self::Bytes,
            TAG_ARRAY => Self::Array(nested(r)?),
            TAG_LIST => Self::List(nested(r)?),
            TAG_MAP => {
                let key = nested(r)?;
                Self::Map(key, nested(r)?)
            }
            TAG_SET => Self::Set(nested(r)?),
            TAG_OBJECT => Self::Object(Cow::Owned(r.read_string()?)),
            _ => return Err(SerialError::corrupt("unknown type descriptor tag")),
        })
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.pad("object"),
            Self::Primitive(kind) => f.pad(kind.name()),
            Self::String => f.pad("String"),
            Self::Known(kind) => f.pad(kind.name()),
            Self::Enum(path) | Self::Object(path) => f.pad(path),
            Self::Bytes => f.pad("Bytes"),
            Self::Array(elem) => write!(f, "[{elem}]"),
            Self::List(elem) => write!(f, "List<{elem}>"),
            Self::Map(key, value) => write!(f, "Map<{key}, {value}>"),
            Self::Set(elem) => write!(f, "Set<{elem}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::TypeDesc;
    use crate::wire::{DataReader, DataWriter};

    #[test]
    fn display() {
        assert_eq!(TypeDesc::Any.to_string(), "object");
        assert_eq!(TypeDesc::array(TypeDesc::U8).to_string(), "[u8]");
        assert_eq!(TypeDesc::set(TypeDesc::GUID).to_string(), "Set<Guid>");
    }

    #[test]
    fn nested_descriptor_survives_the_wire() {
        let desc = TypeDesc::map(
            TypeDesc::enumeration("app::Color"),
            TypeDesc::list(TypeDesc::set(TypeDesc::object("app::Node"))),
        );
        let mut w = DataWriter::new();
        desc.encode(&mut w);
        w.write_u8(0xAB);

        let bytes = w.into_inner();
        let mut r = DataReader::new(&bytes);
        assert_eq!(TypeDesc::decode(&mut r).unwrap(), desc);
        assert_eq!(r.read_u8().unwrap(), 0xAB);
    }

    #[test]
    fn rejects_runaway_nesting() {
        let mut w = DataWriter::new();
        for _ in 0..100 {
            w.write_u8(7); // List<...>
        }
        w.write_u8(0);
        let bytes = w.into_inner();
        assert!(TypeDesc::decode(&mut DataReader::new(&bytes)).is_err());
    }
}
