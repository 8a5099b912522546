//! Codecs of the inline categories.
//!
//! Inline values are written in place at each reference site and are never
//! deduplicated. Their encoding only depends on the descriptor, so a value
//! can be read or skipped even when its type no longer resolves.

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::SerialError;
use crate::repo::Codec;
use crate::schema::{Category, KnownKind, PrimitiveKind, TypeDesc};
use crate::value::{EnumValue, TimeZoneId, Value, Version};
use crate::wire::{DataReader, DataWriter};

/// The codec writing values of `desc` in place, if `desc` is inline.
pub(crate) fn inline_codec(desc: &TypeDesc) -> Option<&'static dyn Codec> {
    match desc {
        TypeDesc::Primitive(_) => Some(&PrimitiveCodec),
        TypeDesc::Enum(_) => Some(&EnumCodec),
        TypeDesc::String => Some(&StringCodec),
        TypeDesc::Known(kind) if kind.is_plain_value() => Some(&KnownValueCodec),
        TypeDesc::Known(_) => Some(&KnownStructCodec),
        _ => None,
    }
}

#[cold]
fn wrong_value(desc: &TypeDesc, value: &Value) -> SerialError {
    SerialError::TypeMismatch {
        declared: desc.clone(),
        actual: value.type_desc().unwrap_or(TypeDesc::Any),
    }
}

#[cold]
fn wrong_desc() -> SerialError {
    SerialError::corrupt("descriptor does not belong to this codec")
}

// -----------------------------------------------------------------------------
// Primitive

pub(crate) struct PrimitiveCodec;

impl Codec for PrimitiveCodec {
    fn category(&self) -> Category {
        Category::Primitive
    }

    fn write_value(&self, value: &Value, w: &mut DataWriter) -> Result<(), SerialError> {
        match *value {
            Value::Bool(v) => w.write_bool(v),
            Value::Char(v) => w.write_u32(v as u32),
            Value::I8(v) => w.write_i8(v),
            Value::I16(v) => w.write_i16(v),
            Value::I32(v) => w.write_i32(v),
            Value::I64(v) => w.write_i64(v),
            Value::U8(v) => w.write_u8(v),
            Value::U16(v) => w.write_u16(v),
            Value::U32(v) => w.write_u32(v),
            Value::U64(v) => w.write_u64(v),
            Value::F32(v) => w.write_f32(v),
            Value::F64(v) => w.write_f64(v),
            _ => return Err(wrong_value(&TypeDesc::Any, value)),
        }
        Ok(())
    }

    fn read_value(&self, desc: &TypeDesc, r: &mut DataReader<'_>) -> Result<Value, SerialError> {
        let TypeDesc::Primitive(kind) = desc else {
            return Err(wrong_desc());
        };
        Ok(match kind {
            PrimitiveKind::Bool => Value::Bool(r.read_bool()?),
            PrimitiveKind::Char => match char::from_u32(r.read_u32()?) {
                Some(c) => Value::Char(c),
                None => return Err(SerialError::corrupt("invalid char")),
            },
            PrimitiveKind::I8 => Value::I8(r.read_i8()?),
            PrimitiveKind::I16 => Value::I16(r.read_i16()?),
            PrimitiveKind::I32 => Value::I32(r.read_i32()?),
            PrimitiveKind::I64 => Value::I64(r.read_i64()?),
            PrimitiveKind::U8 => Value::U8(r.read_u8()?),
            PrimitiveKind::U16 => Value::U16(r.read_u16()?),
            PrimitiveKind::U32 => Value::U32(r.read_u32()?),
            PrimitiveKind::U64 => Value::U64(r.read_u64()?),
            PrimitiveKind::F32 => Value::F32(r.read_f32()?),
            PrimitiveKind::F64 => Value::F64(r.read_f64()?),
        })
    }

    fn skip_value(&self, desc: &TypeDesc, r: &mut DataReader<'_>) -> Result<(), SerialError> {
        let TypeDesc::Primitive(kind) = desc else {
            return Err(wrong_desc());
        };
        let size = match kind {
            PrimitiveKind::Bool | PrimitiveKind::I8 | PrimitiveKind::U8 => 1,
            PrimitiveKind::I16 | PrimitiveKind::U16 => 2,
            PrimitiveKind::Char | PrimitiveKind::I32 | PrimitiveKind::U32 | PrimitiveKind::F32 => 4,
            PrimitiveKind::I64 | PrimitiveKind::U64 | PrimitiveKind::F64 => 8,
        };
        r.take(size).map(drop)
    }
}

// -----------------------------------------------------------------------------
// Enum

/// Enum values are written as their `i64` discriminant.
pub(crate) struct EnumCodec;

impl Codec for EnumCodec {
    fn category(&self) -> Category {
        Category::Enum
    }

    fn write_value(&self, value: &Value, w: &mut DataWriter) -> Result<(), SerialError> {
        match value {
            Value::Enum(e) => {
                w.write_i64(e.value);
                Ok(())
            }
            _ => Err(wrong_value(&TypeDesc::Any, value)),
        }
    }

    fn read_value(&self, desc: &TypeDesc, r: &mut DataReader<'_>) -> Result<Value, SerialError> {
        let TypeDesc::Enum(path) = desc else {
            return Err(wrong_desc());
        };
        Ok(Value::Enum(EnumValue::new(path.clone(), r.read_i64()?)))
    }

    fn skip_value(&self, _desc: &TypeDesc, r: &mut DataReader<'_>) -> Result<(), SerialError> {
        r.take(8).map(drop)
    }
}

// -----------------------------------------------------------------------------
// String

pub(crate) struct StringCodec;

impl Codec for StringCodec {
    fn category(&self) -> Category {
        Category::String
    }

    fn write_value(&self, value: &Value, w: &mut DataWriter) -> Result<(), SerialError> {
        match value {
            Value::String(s) => {
                w.write_str(s);
                Ok(())
            }
            _ => Err(wrong_value(&TypeDesc::STRING, value)),
        }
    }

    fn read_value(&self, _desc: &TypeDesc, r: &mut DataReader<'_>) -> Result<Value, SerialError> {
        Ok(Value::String(r.read_string()?))
    }

    fn skip_value(&self, _desc: &TypeDesc, r: &mut DataReader<'_>) -> Result<(), SerialError> {
        let len = r.read_u32()? as usize;
        r.take(len).map(drop)
    }
}

// -----------------------------------------------------------------------------
// Well-known values

/// `DateTime`, `DateTimeOffset`, `TimeSpan`, `Guid` and `Decimal`.
///
/// Instants are written as UTC seconds and nanoseconds since the Unix epoch;
/// `DateTimeOffset` adds its offset in seconds.
pub(crate) struct KnownValueCodec;

impl Codec for KnownValueCodec {
    fn category(&self) -> Category {
        Category::KnownValue
    }

    fn write_value(&self, value: &Value, w: &mut DataWriter) -> Result<(), SerialError> {
        match value {
            Value::DateTime(v) => {
                let utc = v.and_utc();
                w.write_i64(utc.timestamp());
                w.write_u32(utc.timestamp_subsec_nanos());
            }
            Value::DateTimeOffset(v) => {
                w.write_i64(v.timestamp());
                w.write_u32(v.timestamp_subsec_nanos());
                w.write_i32(v.offset().local_minus_utc());
            }
            Value::TimeSpan(v) => {
                w.write_i64(v.num_seconds());
                w.write_i32(v.subsec_nanos());
            }
            Value::Guid(v) => w.write_bytes(v.as_bytes()),
            Value::Decimal(v) => w.write_bytes(&v.serialize()),
            _ => return Err(wrong_value(&TypeDesc::Any, value)),
        }
        Ok(())
    }

    fn read_value(&self, desc: &TypeDesc, r: &mut DataReader<'_>) -> Result<Value, SerialError> {
        let TypeDesc::Known(kind) = desc else {
            return Err(wrong_desc());
        };
        Ok(match kind {
            KnownKind::DateTime => Value::DateTime(read_instant(r)?.naive_utc()),
            KnownKind::DateTimeOffset => {
                let instant = read_instant(r)?;
                let offset = FixedOffset::east_opt(r.read_i32()?)
                    .ok_or_else(|| SerialError::corrupt("time zone offset out of range"))?;
                Value::DateTimeOffset(instant.with_timezone(&offset))
            }
            KnownKind::TimeSpan => {
                let secs = r.read_i64()?;
                let nanos = r.read_i32()?;
                TimeDelta::try_seconds(secs)
                    .and_then(|d| d.checked_add(&TimeDelta::nanoseconds(nanos as i64)))
                    .map(Value::TimeSpan)
                    .ok_or_else(|| SerialError::corrupt("time span out of range"))?
            }
            KnownKind::Guid => Value::Guid(Uuid::from_bytes(r.read_array()?)),
            KnownKind::Decimal => Value::Decimal(Decimal::deserialize(r.read_array()?)),
            _ => return Err(wrong_desc()),
        })
    }

    fn skip_value(&self, desc: &TypeDesc, r: &mut DataReader<'_>) -> Result<(), SerialError> {
        let TypeDesc::Known(kind) = desc else {
            return Err(wrong_desc());
        };
        let size = match kind {
            KnownKind::DateTime | KnownKind::TimeSpan => 12,
            KnownKind::DateTimeOffset => 16,
            KnownKind::Guid | KnownKind::Decimal => 16,
            _ => return Err(wrong_desc()),
        };
        r.take(size).map(drop)
    }
}

fn read_instant(r: &mut DataReader<'_>) -> Result<DateTime<Utc>, SerialError> {
    let secs = r.read_i64()?;
    let nanos = r.read_u32()?;
    DateTime::from_timestamp(secs, nanos).ok_or_else(|| SerialError::corrupt("instant out of range"))
}

// -----------------------------------------------------------------------------
// Well-known structs

/// `Version`, `TimeZone` and `Type`.
pub(crate) struct KnownStructCodec;

impl Codec for KnownStructCodec {
    fn category(&self) -> Category {
        Category::KnownStruct
    }

    fn write_value(&self, value: &Value, w: &mut DataWriter) -> Result<(), SerialError> {
        match value {
            Value::Version(v) => {
                w.write_i32(v.major);
                w.write_i32(v.minor);
                w.write_i32(v.build);
                w.write_i32(v.revision);
            }
            Value::TimeZone(v) => w.write_str(v.as_str()),
            Value::Type(v) => v.encode(w),
            _ => return Err(wrong_value(&TypeDesc::Any, value)),
        }
        Ok(())
    }

    fn read_value(&self, desc: &TypeDesc, r: &mut DataReader<'_>) -> Result<Value, SerialError> {
        let TypeDesc::Known(kind) = desc else {
            return Err(wrong_desc());
        };
        Ok(match kind {
            KnownKind::Version => Value::Version(Version {
                major: r.read_i32()?,
                minor: r.read_i32()?,
                build: r.read_i32()?,
                revision: r.read_i32()?,
            }),
            KnownKind::TimeZone => Value::TimeZone(TimeZoneId(r.read_string()?)),
            KnownKind::Type => Value::Type(TypeDesc::decode(r)?),
            _ => return Err(wrong_desc()),
        })
    }
}
