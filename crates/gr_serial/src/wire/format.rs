use crate::SerialError;

/// Leading bytes of every stream.
pub const MAGIC: [u8; 4] = *b"GRPO";

/// Layout revision written after [`MAGIC`].
pub const FORMAT_VERSION: u16 = 1;

/// First byte of every reference site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RefTag {
    /// No value follows.
    Null = 0,
    /// The runtime type is the declared type.
    BaseType = 1,
    /// A `u16` type index precedes the value.
    DerivedType = 2,
}

impl RefTag {
    #[inline]
    pub const fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Null),
            1 => Some(Self::BaseType),
            2 => Some(Self::DerivedType),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn decode(tag: u8) -> Result<Self, SerialError> {
        Self::from_u8(tag).ok_or_else(|| SerialError::corrupt("invalid reference tag"))
    }
}
