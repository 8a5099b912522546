use alloc::string::String;

use byteorder::{ByteOrder, LittleEndian};

use crate::SerialError;

/// Bounded little-endian cursor over one region of a stream.
///
/// Every read goes through [`take`](Self::take), which refuses to move past
/// the end of the region. A reader over an object payload therefore can never
/// consume bytes belonging to the next object.
#[derive(Debug, Clone)]
pub struct DataReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

macro_rules! read_le {
    ($($name:ident: $ty:ty => $size:literal, $method:ident;)*) => {$(
        #[inline]
        pub fn $name(&mut self) -> Result<$ty, SerialError> {
            Ok(LittleEndian::$method(self.take($size)?))
        }
    )*};
}

impl<'a> DataReader<'a> {
    #[inline]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub const fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub const fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Consumes the next `len` bytes of the region.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], SerialError> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(SerialError::OutOfBounds {
                requested: len,
                remaining,
            });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, SerialError> {
        Ok(self.take(1)?[0])
    }

    #[inline]
    pub fn read_i8(&mut self) -> Result<i8, SerialError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool, SerialError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(SerialError::corrupt("invalid bool byte")),
        }
    }

    read_le! {
        read_u16: u16 => 2, read_u16;
        read_i16: i16 => 2, read_i16;
        read_u32: u32 => 4, read_u32;
        read_i32: i32 => 4, read_i32;
        read_u64: u64 => 8, read_u64;
        read_i64: i64 => 8, read_i64;
        read_f32: f32 => 4, read_f32;
        read_f64: f64 => 8, read_f64;
    }

    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], SerialError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_string(&mut self) -> Result<String, SerialError> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        match core::str::from_utf8(bytes) {
            Ok(text) => Ok(String::from(text)),
            Err(_) => Err(SerialError::corrupt("string is not valid UTF-8")),
        }
    }

    /// Reads a `u32` element count, each element taking at least `min_size` bytes.
    ///
    /// Counts that cannot fit into the rest of the region are rejected before
    /// anything is allocated for them.
    pub fn read_count(&mut self, min_size: usize) -> Result<usize, SerialError> {
        let count = self.read_u32()? as usize;
        let needed = count.saturating_mul(min_size);
        let remaining = self.remaining();
        if needed > remaining {
            return Err(SerialError::OutOfBounds {
                requested: needed,
                remaining,
            });
        }
        Ok(count)
    }
}
