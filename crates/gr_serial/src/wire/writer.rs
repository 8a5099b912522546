use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};

/// Growable little-endian output buffer.
///
/// Codecs write one object payload at a time into a `DataWriter`; the
/// serializer takes the resulting length as the object's size table entry.
#[derive(Debug, Default, Clone)]
pub struct DataWriter {
    buf: Vec<u8>,
}

macro_rules! write_le {
    ($($name:ident: $ty:ty => $size:literal, $method:ident;)*) => {$(
        #[inline]
        pub fn $name(&mut self, value: $ty) {
            let mut bytes = [0u8; $size];
            LittleEndian::$method(&mut bytes, value);
            self.buf.extend_from_slice(&bytes);
        }
    )*};
}

impl DataWriter {
    #[inline]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    #[inline]
    pub fn write_i8(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    write_le! {
        write_u16: u16 => 2, write_u16;
        write_i16: i16 => 2, write_i16;
        write_u32: u32 => 4, write_u32;
        write_i32: i32 => 4, write_i32;
        write_u64: u64 => 8, write_u64;
        write_i64: i64 => 8, write_i64;
        write_f32: f32 => 4, write_f32;
        write_f64: f64 => 8, write_f64;
    }

    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// A `u32` byte length followed by the UTF-8 bytes.
    pub fn write_str(&mut self, value: &str) {
        self.write_u32(value.len() as u32);
        self.buf.extend_from_slice(value.as_bytes());
    }
}
