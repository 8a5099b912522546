//! Little-endian primitives shared by every codec and by the stream layout.
//!
//! ```text
//! +----------------------------------------------------------------+
//! | magic "GRPO" (4) | format version u16                          |
//! +----------------------------------------------------------------+
//! | schema section: byte length u32 | type count u16 | records     |
//! |   desc | category u8 | flags u16 | num_objects u32             |
//! |   member count u16 | members (name, kind u8, desc)             |
//! +----------------------------------------------------------------+
//! | header section: byte length u32 | per type, in type order:     |
//! |   data_size u64 | sizes u32 x num_objects | custom header      |
//! +----------------------------------------------------------------+
//! | root section: byte length u32 | root count u32 | references    |
//! +----------------------------------------------------------------+
//! | data section: per type, concatenated object payloads           |
//! +----------------------------------------------------------------+
//! ```
//!
//! Every object payload is exactly as long as its entry in the size table,
//! so `offset[i] = sum(sizes[0..i])` inside a type region and type regions
//! follow each other in type order. `data_size` is the byte budget of a
//! type region; no object may extend past it.

mod format;
mod reader;
mod writer;

pub use format::{FORMAT_VERSION, MAGIC, RefTag};
pub use reader::DataReader;
pub use writer::DataWriter;
