//! Structural stream encoder/decoder (opcode protocol).
//!
//! The stream is self-describing: a protocol header, then opcodes that push
//! literals, build composites, bind memo entries for back-references, and
//! reference tensors by side-table index, then a terminator.

pub mod constants;

mod error;
mod pickler;
mod shared;
mod unpickler;

pub use error::{DecodeError, EncodeError};
pub use pickler::Pickler;
pub use shared::{pickle, unpickle};
pub use unpickler::{TensorResolver, Unpickler};
