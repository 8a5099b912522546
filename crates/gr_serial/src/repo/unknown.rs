use crate::repo::Codec;
use crate::schema::Category;

/// Codec of types that cannot be serialized in a session.
///
/// Values of an unknown type are written as null. When loading, the stream
/// may still hold references to them; those are skipped and read as null.
pub(crate) struct UnknownCodec;

impl Codec for UnknownCodec {
    fn category(&self) -> Category {
        Category::Unknown
    }
}
