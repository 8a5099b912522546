use alloc::vec::Vec;

use std::io::Write;

use crate::registry::TypeRegistry;
use crate::ser::SaveSession;
use crate::value::Value;
use crate::{SerialError, SerializerOptions, SessionState, Warning};

/// Writes object graphs to a byte stream.
///
/// A `Serializer` can be reused; every call to [`save`](Self::save) is an
/// independent session with its own type table.
///
/// # Examples
///
/// ```
/// use gr_serial::registry::TypeRegistry;
/// use gr_serial::schema::{ObjectDef, TypeDesc};
/// use gr_serial::value::{ObjRef, StructData, Value};
/// use gr_serial::{Serializer, SessionState};
///
/// let mut registry = TypeRegistry::new();
/// registry.register_object(ObjectDef::new("app::Note").field("text", TypeDesc::STRING));
///
/// let note = ObjRef::new_struct("app::Note", StructData::new().with("text", "hi"));
///
/// let mut serializer = Serializer::new(&registry);
/// let mut bytes = Vec::new();
/// serializer.save(&mut bytes, &[Value::Object(note)]).unwrap();
///
/// assert_eq!(&bytes[..4], b"GRPO");
/// assert_eq!(serializer.state(), SessionState::Done);
/// assert!(serializer.warnings().is_empty());
/// ```
pub struct Serializer<'a> {
    registry: &'a TypeRegistry,
    options: SerializerOptions,
    state: SessionState,
    warnings: Vec<Warning>,
}

impl<'a> Serializer<'a> {
    #[inline]
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self::with_options(registry, SerializerOptions::new())
    }

    pub fn with_options(registry: &'a TypeRegistry, options: SerializerOptions) -> Self {
        Self {
            registry,
            options,
            state: SessionState::Idle,
            warnings: Vec::new(),
        }
    }

    #[inline]
    pub const fn options(&self) -> SerializerOptions {
        self.options
    }

    /// Saves the graph reachable from `roots`.
    ///
    /// Roots are declared as `Any`, so each one records its runtime type.
    /// On error, nothing useful has been written and the stream should be
    /// discarded.
    pub fn save<W: Write + ?Sized>(
        &mut self,
        writer: &mut W,
        roots: &[Value],
    ) -> Result<(), SerialError> {
        let mut session = SaveSession::new(self.registry, self.options);
        let result = session.run(writer, roots);
        self.state = session.state;
        self.warnings = session.warnings;
        result
    }

    /// State reached by the last save.
    #[inline]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Warnings of the last save.
    #[inline]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

/// Saves `roots` into a new buffer.
pub fn save_to_vec(
    registry: &TypeRegistry,
    options: SerializerOptions,
    roots: &[Value],
) -> Result<Vec<u8>, SerialError> {
    let mut bytes = Vec::new();
    Serializer::with_options(registry, options).save(&mut bytes, roots)?;
    Ok(bytes)
}
