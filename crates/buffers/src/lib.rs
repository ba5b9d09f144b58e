//! Binary buffer utilities for picklepack.
//!
//! The structural wire format is little-endian, so the plain integer
//! accessors on both types read and write little-endian. The one big-endian
//! payload (the float opcode argument) gets its own `f64_be` accessor.
//!
//! # Overview
//!
//! - [`Reader`] - Reads binary data from a byte slice with cursor tracking
//! - [`Writer`] - Writes binary data to an auto-growing buffer
//!
//! # Example
//!
//! ```
//! use picklepack_buffers::{Reader, Writer};
//!
//! // Write some data
//! let mut writer = Writer::new();
//! writer.u8(0x01);
//! writer.u32(0x0203_0405);
//! writer.utf8("hello");
//! let data = writer.flush();
//!
//! // Read it back
//! let mut reader = Reader::new(&data);
//! assert_eq!(reader.u8(), 0x01);
//! assert_eq!(reader.u32(), 0x0203_0405);
//! assert_eq!(reader.utf8(5), "hello");
//! ```

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;
