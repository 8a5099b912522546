use serde::{Deserialize, Serialize};

/// Session-wide switches for [`Serializer`](crate::Serializer),
/// [`Deserializer`](crate::Deserializer) and [`deep_clone`](crate::deep_clone).
///
/// The struct is `serde`-serializable so settings stores can persist it next to
/// the data they save.
///
/// # Examples
///
/// ```
/// use gr_serial::SerializerOptions;
///
/// let options = SerializerOptions::default().public_only(true);
/// assert!(options.public_only);
/// assert!(!options.lazy);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerOptions {
    /// Only serialize classes and members annotated as public.
    ///
    /// Private classes serialize as null, protected classes keep only members
    /// marked public, and unannotated classes are rejected.
    pub public_only: bool,
    /// Defer virtual, non-inline properties until they are first read.
    ///
    /// Only meaningful for loading.
    pub lazy: bool,
}

impl SerializerOptions {
    #[inline]
    pub const fn new() -> Self {
        Self {
            public_only: false,
            lazy: false,
        }
    }

    #[inline]
    pub const fn public_only(mut self, public_only: bool) -> Self {
        self.public_only = public_only;
        self
    }

    #[inline]
    pub const fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::SerializerOptions;

    #[test]
    fn settings_round_trip() {
        let options = SerializerOptions::new().public_only(true).lazy(true);
        let text = serde_json::to_string(&options).unwrap();
        assert_eq!(text, r#"{"public_only":true,"lazy":true}"#);

        let partial: SerializerOptions = serde_json::from_str(r#"{"lazy":true}"#).unwrap();
        assert_eq!(partial, SerializerOptions::new().lazy(true));
    }
}
