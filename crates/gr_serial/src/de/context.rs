use crate::SerialError;
use crate::schema::TypeDesc;
use crate::value::{Slot, Value};
use crate::wire::DataReader;

/// What codecs may ask of a load session while they read a payload.
pub(crate) trait LoadContext {
    /// Reads a reference. Objects are returned as shells that are hydrated
    /// later, unless they already are.
    fn read_ref(
        &mut self,
        declared: &TypeDesc,
        r: &mut DataReader<'_>,
    ) -> Result<Value, SerialError>;

    /// Consumes a reference without allocating anything.
    fn skip_ref(&mut self, declared: &TypeDesc, r: &mut DataReader<'_>) -> Result<(), SerialError>;

    /// Reads a reference into a slot that defers unloaded objects.
    fn read_lazy_ref(
        &mut self,
        declared: &TypeDesc,
        r: &mut DataReader<'_>,
    ) -> Result<Slot, SerialError>;

    /// Hydrates `value` immediately if it is an object shell of this session.
    fn hydrate_now(&mut self, value: &Value) -> Result<(), SerialError>;
}
