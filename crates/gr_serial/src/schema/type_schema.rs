use alloc::borrow::Cow;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;

use crate::SerialError;
use crate::schema::{MemberKind, MemberSchema, TypeDesc};
use crate::wire::{DataReader, DataWriter};

// -----------------------------------------------------------------------------
// Category

/// The codec family a type is handled by.
///
/// Detection tries the categories in declaration order; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Category {
    /// Unresolved or unserializable. Data is dropped on save and skipped on load.
    Unknown = 0,
    Primitive = 1,
    Enum = 2,
    String = 3,
    KnownValue = 4,
    Bytes = 5,
    Array = 6,
    List = 7,
    Map = 8,
    Set = 9,
    KnownStruct = 10,
    Object = 11,
}

impl Category {
    pub const fn from_u8(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Unknown,
            1 => Self::Primitive,
            2 => Self::Enum,
            3 => Self::String,
            4 => Self::KnownValue,
            5 => Self::Bytes,
            6 => Self::Array,
            7 => Self::List,
            8 => Self::Map,
            9 => Self::Set,
            10 => Self::KnownStruct,
            11 => Self::Object,
            _ => return None,
        })
    }

    /// Values of the category are written in place.
    #[inline]
    pub const fn is_inline(self) -> bool {
        matches!(
            self,
            Self::Primitive | Self::Enum | Self::String | Self::KnownValue | Self::KnownStruct
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// -----------------------------------------------------------------------------
// SchemaFlags

bitflags! {
    /// Persisted classification bits of a [`TypeSchema`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SchemaFlags: u16 {
        const PRIMITIVE             = 1 << 0;
        /// A reference declared with this type may hold a different runtime type.
        const HAS_SUB_TYPE          = 1 << 1;
        const HAS_CONSTRUCTOR       = 1 << 2;
        const HAS_EMPTY_CONSTRUCTOR = 1 << 3;
        const CUSTOM_CONSTRUCTOR    = 1 << 4;
        /// The class carries an explicit visibility annotation.
        const SERIALIZED            = 1 << 5;
        const UNSERIALIZED          = 1 << 6;
        const PUBLIC_ONLY           = 1 << 7;
        const PRIVATE               = 1 << 8;
    }
}

// -----------------------------------------------------------------------------
// TypeSchema

/// Session metadata of one type: its classification, its members and where
/// its objects live in the data section.
///
/// Schemas are immutable once the schema section has been written or read.
#[derive(Debug, Clone)]
pub struct TypeSchema {
    desc: TypeDesc,
    category: Category,
    resolved: bool,
    flags: SchemaFlags,
    members: Rc<[MemberSchema]>,
    num_objects: u32,
    start_data_offset: u64,
    end_data_offset: u64,
}

impl TypeSchema {
    pub(crate) fn new(
        desc: TypeDesc,
        category: Category,
        flags: SchemaFlags,
        members: Rc<[MemberSchema]>,
    ) -> Self {
        Self {
            desc,
            resolved: category != Category::Unknown,
            category,
            flags,
            members,
            num_objects: 0,
            start_data_offset: 0,
            end_data_offset: 0,
        }
    }

    #[inline]
    pub fn desc(&self) -> &TypeDesc {
        &self.desc
    }

    #[inline]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// `false` when the type no longer resolves against the registry.
    #[inline]
    pub const fn resolved(&self) -> bool {
        self.resolved
    }

    #[inline]
    pub const fn flags(&self) -> SchemaFlags {
        self.flags
    }

    #[inline]
    pub const fn is_primitive(&self) -> bool {
        self.flags.contains(SchemaFlags::PRIMITIVE)
    }

    #[inline]
    pub const fn has_sub_type(&self) -> bool {
        self.flags.contains(SchemaFlags::HAS_SUB_TYPE)
    }

    #[inline]
    pub fn members(&self) -> &[MemberSchema] {
        &self.members
    }

    #[inline]
    pub(crate) fn members_rc(&self) -> &Rc<[MemberSchema]> {
        &self.members
    }

    #[inline]
    pub const fn num_objects(&self) -> u32 {
        self.num_objects
    }

    #[inline]
    pub const fn start_data_offset(&self) -> u64 {
        self.start_data_offset
    }

    #[inline]
    pub const fn end_data_offset(&self) -> u64 {
        self.end_data_offset
    }

    /// Bytes declared for the objects of this type.
    #[inline]
    pub const fn data_size(&self) -> u64 {
        self.end_data_offset - self.start_data_offset
    }

    #[inline]
    pub(crate) fn set_num_objects(&mut self, num_objects: u32) {
        self.num_objects = num_objects;
    }

    #[inline]
    pub(crate) fn set_data_region(&mut self, start: u64, size: u64) {
        self.start_data_offset = start;
        self.end_data_offset = start.saturating_add(size);
    }

    pub(crate) fn encode(&self, w: &mut DataWriter) -> Result<(), SerialError> {
        let count = u16::try_from(self.members.len())
            .map_err(|_| SerialError::TooManyMembers(self.desc.clone()))?;
        self.desc.encode(w);
        w.write_u8(self.category as u8);
        w.write_u16(self.flags.bits());
        w.write_u32(self.num_objects);
        w.write_u16(count);
        for member in self.members.iter() {
            w.write_str(member.name());
            w.write_u8(member.kind().code());
            member.desc().encode(w);
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// StoredType

/// A schema record as found in a stream, before it is resolved.
#[derive(Debug, Clone)]
pub(crate) struct StoredType {
    pub desc: TypeDesc,
    pub category: Category,
    pub flags: SchemaFlags,
    pub num_objects: u32,
    pub members: Vec<MemberSchema>,
}

impl StoredType {
    pub fn decode(r: &mut DataReader<'_>) -> Result<Self, SerialError> {
        let desc = TypeDesc::decode(r)?;
        let category = Category::from_u8(r.read_u8()?)
            .ok_or_else(|| SerialError::corrupt("unknown type category"))?;
        let flags = SchemaFlags::from_bits_retain(r.read_u16()?);
        let num_objects = r.read_u32()?;

        let count = r.read_u16()? as usize;
        let mut members = Vec::with_capacity(count.min(r.remaining()));
        for _ in 0..count {
            let name = Cow::Owned(r.read_string()?);
            let kind = MemberKind::from_code(r.read_u8()?)
                .ok_or_else(|| SerialError::corrupt("unknown member kind"))?;
            let desc = TypeDesc::decode(r)?;
            members.push(MemberSchema::new(name, kind, desc));
        }

        Ok(Self {
            desc,
            category,
            flags,
            num_objects,
            members,
        })
    }
}

#[cfg(test)]
mod tests {
    use alloc::borrow::Cow;
    use alloc::rc::Rc;

    use alloc::format;

    use super::{Category, SchemaFlags, StoredType, TypeSchema};
    use crate::SerialError;
    use crate::schema::{MemberKind, MemberSchema, TypeDesc};
    use crate::wire::{DataReader, DataWriter};

    #[test]
    fn record_round_trip() {
        let members: Rc<[MemberSchema]> = Rc::from([
            MemberSchema::new(Cow::Borrowed("name"), MemberKind::Field, TypeDesc::STRING),
            MemberSchema::new(
                Cow::Borrowed("next"),
                MemberKind::Property { overridable: true },
                TypeDesc::object("app::Node"),
            ),
        ]);
        let mut schema = TypeSchema::new(
            TypeDesc::object("app::Node"),
            Category::Object,
            SchemaFlags::HAS_CONSTRUCTOR | SchemaFlags::HAS_EMPTY_CONSTRUCTOR,
            members,
        );
        schema.set_num_objects(3);

        let mut w = DataWriter::new();
        schema.encode(&mut w).unwrap();
        let bytes = w.into_inner();
        let stored = StoredType::decode(&mut DataReader::new(&bytes)).unwrap();

        assert_eq!(stored.desc, *schema.desc());
        assert_eq!(stored.category, Category::Object);
        assert_eq!(stored.flags, schema.flags());
        assert_eq!(stored.num_objects, 3);
        assert_eq!(stored.members.as_slice(), schema.members());
    }

    #[test]
    fn data_region() {
        let mut schema = TypeSchema::new(
            TypeDesc::list(TypeDesc::I32),
            Category::List,
            SchemaFlags::empty(),
            Rc::from([]),
        );
        schema.set_data_region(40, 12);
        assert_eq!(schema.start_data_offset(), 40);
        assert_eq!(schema.end_data_offset(), 52);
        assert_eq!(schema.data_size(), 12);
        assert!(!Category::List.is_inline());
        assert!(Category::KnownStruct.is_inline());
    }

    #[test]
    fn member_count_must_fit_the_record() {
        let members: Rc<[MemberSchema]> = (0..=u16::MAX as usize)
            .map(|i| MemberSchema::new(Cow::Owned(format!("m{i}")), MemberKind::Field, TypeDesc::I32))
            .collect();
        let schema = TypeSchema::new(
            TypeDesc::object("app::Wide"),
            Category::Object,
            SchemaFlags::HAS_CONSTRUCTOR,
            members,
        );

        let mut w = DataWriter::new();
        assert!(matches!(
            schema.encode(&mut w),
            Err(SerialError::TooManyMembers(ref desc)) if *desc == TypeDesc::object("app::Wide")
        ));
        assert_eq!(w.len(), 0);
    }
}
