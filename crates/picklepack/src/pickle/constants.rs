//! Structural stream opcode table.
//!
//! The byte values follow the legacy protocol-2 table so archives written by
//! existing producers stay readable. Integer arguments are little-endian;
//! the [`BINFLOAT`] payload is big-endian.

/// Stream header marker, followed by the one-byte protocol version.
pub const PROTO: u8 = 0x80;
/// Protocol version emitted after [`PROTO`].
pub const PROTOCOL_VERSION: u8 = 2;
/// Stream terminator. The decoded root is the stack top at this point.
pub const STOP: u8 = b'.';

// Scalar literals
pub const NONE: u8 = b'N';
pub const NEWTRUE: u8 = 0x88;
pub const NEWFALSE: u8 = 0x89;
/// Signed 32-bit integer argument.
pub const BININT: u8 = b'J';
/// Unsigned 8-bit integer argument.
pub const BININT1: u8 = b'K';
/// Unsigned 16-bit integer argument.
pub const BININT2: u8 = b'M';
/// Length-prefixed little-endian two's-complement integer.
pub const LONG1: u8 = 0x8a;
/// 64-bit float argument (big-endian).
pub const BINFLOAT: u8 = b'G';
/// Length-prefixed UTF-8 string.
pub const BINUNICODE: u8 = b'X';

// Composite builders
pub const EMPTY_LIST: u8 = b']';
pub const EMPTY_DICT: u8 = b'}';
pub const MARK: u8 = b'(';
/// Appends everything above the nearest mark to the list below it.
pub const APPENDS: u8 = b'e';
/// Stores key/value pairs above the nearest mark into the dict below it.
pub const SETITEMS: u8 = b'u';
/// Collects everything above the nearest mark into a tuple.
pub const TUPLE: u8 = b't';

// Objects
/// Pushes a class slot from two newline-terminated strings (module, name).
pub const GLOBAL: u8 = b'c';
/// Pops an argument tuple and a class slot, pushes the reconstructed object.
pub const REDUCE: u8 = b'R';

// Memo binding and back-references
pub const BINPUT: u8 = b'q';
pub const LONG_BINPUT: u8 = b'r';
pub const BINGET: u8 = b'h';
pub const LONG_BINGET: u8 = b'j';

/// Out-of-line tensor reference; consumes a pushed meta tuple.
pub const BINPERSID: u8 = b'Q';
