use crate::schema::{MemberKind, TypeDesc, TypePath};

/// A member as it takes part in one session.
///
/// On save the list of member schemas is taken from the live definition; on
/// load it is the list recorded in the stream, resolved against the live
/// definition. A member whose `loadable` gate is cleared is still consumed
/// from the stream, since the format carries no per-member presence marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSchema {
    name: TypePath,
    kind: MemberKind,
    desc: TypeDesc,
    loadable: bool,
    writeable: bool,
    readable: bool,
    lazy: bool,
}

impl MemberSchema {
    pub(crate) fn new(name: TypePath, kind: MemberKind, desc: TypeDesc) -> Self {
        Self {
            name,
            kind,
            desc,
            loadable: true,
            writeable: true,
            readable: true,
            lazy: false,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub(crate) fn path(&self) -> &TypePath {
        &self.name
    }

    #[inline]
    pub const fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Declared type, as written to the stream.
    #[inline]
    pub fn desc(&self) -> &TypeDesc {
        &self.desc
    }

    /// The stored value may be assigned to the live member.
    #[inline]
    pub const fn loadable(&self) -> bool {
        self.loadable
    }

    /// The live member has a setter.
    #[inline]
    pub const fn writeable(&self) -> bool {
        self.writeable
    }

    /// The live member has a getter.
    #[inline]
    pub const fn readable(&self) -> bool {
        self.readable
    }

    /// The value is deferred behind a lazy slot.
    #[inline]
    pub const fn lazy(&self) -> bool {
        self.lazy
    }

    #[inline]
    pub(crate) fn set_loadable(&mut self, loadable: bool) {
        self.loadable = loadable;
        if !loadable {
            self.lazy = false;
        }
    }

    #[inline]
    pub(crate) fn set_writeable(&mut self, writeable: bool) {
        self.writeable = writeable;
    }

    #[inline]
    pub(crate) fn set_readable(&mut self, readable: bool) {
        self.readable = readable;
    }

    #[inline]
    pub(crate) fn set_lazy(&mut self, lazy: bool) {
        self.lazy = lazy && self.loadable;
    }
}
