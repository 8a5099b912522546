use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::TypeDesc;

// -----------------------------------------------------------------------------
// SerialError

/// Hard failures. The operation that triggered one is aborted.
///
/// Recoverable problems (renamed types, retyped members, rejected classes)
/// never surface as a `SerialError`; they are reported as [`Warning`]s and the
/// affected data is left at its default.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SerialError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid stream magic {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u16),

    #[error("read of {requested} bytes exceeds the {remaining} bytes left in the region")]
    OutOfBounds { requested: usize, remaining: usize },

    #[error(
        "object {index} of `{ty}` spans {start}..{end}, beyond the {data_size} bytes declared for the type"
    )]
    RegionOverflow {
        ty: TypeDesc,
        index: u32,
        start: u64,
        end: u64,
        data_size: u64,
    },

    #[error("corrupt data: {0}")]
    CorruptData(Cow<'static, str>),

    #[error("value of type `{actual}` cannot be stored where `{declared}` is declared")]
    TypeMismatch { declared: TypeDesc, actual: TypeDesc },

    #[error("`{0}` has value semantics and cannot be cloned as an object")]
    NotCloneable(TypeDesc),

    #[error("`{0}` has neither a default nor a matching custom constructor")]
    NoConstructor(Cow<'static, str>),

    #[error("constructor of `{ty}` failed: {reason}")]
    ConstructorFailed { ty: Cow<'static, str>, reason: String },

    #[error("a stream cannot hold more than {} types", u16::MAX)]
    TooManyTypes,

    #[error("too many objects of type `{0}`")]
    TooManyObjects(TypeDesc),

    #[error("`{0}` has more than {max} members", max = u16::MAX)]
    TooManyMembers(TypeDesc),

    #[error("root {index} out of range, the stream holds {count} roots")]
    NoSuchRoot { index: usize, count: usize },

    #[error("the load session is already in use")]
    SessionBusy,

    #[error("the load session has been closed")]
    SessionClosed,
}

impl SerialError {
    #[cold]
    #[inline(never)]
    pub(crate) fn corrupt(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::CorruptData(msg.into())
    }
}

// -----------------------------------------------------------------------------
// Warning

/// Category of a recoverable problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// A stored type no longer resolves against the registry.
    TypeUnresolved,
    /// A type exists but is not serializable in this session.
    TypeRejected,
    /// A stored member no longer exists on the live type.
    MemberRemoved,
    /// A stored member's declared type differs from the live member.
    MemberTypeChanged,
    /// A value was written as null because its type has no repo.
    ValueDropped,
}

/// A recoverable problem recorded during a save or load session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub type_path: String,
    pub member: Option<String>,
    pub message: String,
}

impl Warning {
    pub(crate) fn new(
        kind: WarningKind,
        type_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            type_path: type_path.into(),
            member: None,
            message: message.into(),
        }
    }

    pub(crate) fn with_member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }

    /// Logs the warning and records it in `sink`.
    pub(crate) fn emit(self, sink: &mut Vec<Warning>) {
        log::warn!("{self}");
        sink.push(self);
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            Some(member) => write!(f, "`{}::{member}`: {}", self.type_path, self.message),
            None => write!(f, "`{}`: {}", self.type_path, self.message),
        }
    }
}
