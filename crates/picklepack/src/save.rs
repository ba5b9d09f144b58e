//! Top-level save/load entry points.
//!
//! Tensor-table mode ([`crate::pickle`]/[`crate::unpickle`]) keeps tensor
//! payloads caller-managed; container mode packages the structural stream
//! and every payload into one self-contained blob. Builds without the
//! `container` feature keep the entry points but fail fast.

use thiserror::Error;

use crate::pickle::{DecodeError, EncodeError};
use crate::value::Value;

#[cfg(feature = "container")]
use crate::container::{
    read_archive_and_tensors, write_archive_and_tensors, ArchiveReader, ArchiveWriter,
    ContainerError, VecReader,
};
#[cfg(feature = "container")]
use crate::pickle::Pickler;

/// Root entry name used by container-mode archives.
pub const ROOT_ENTRY: &str = "data";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[cfg(feature = "container")]
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error("container mode is not available in this build")]
    Unsupported,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[cfg(feature = "container")]
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error("container mode is not available in this build")]
    Unsupported,
}

/// Serializes a value graph and every tensor payload it references into one
/// self-contained archive blob.
#[cfg(feature = "container")]
pub fn pickle_save(value: &Value) -> Result<Vec<u8>, SaveError> {
    let mut struct_bytes: Vec<u8> = Vec::new();
    let tensors = {
        let mut pickler = Pickler::new(|bytes: &[u8]| struct_bytes.extend_from_slice(bytes));
        pickler.protocol();
        pickler.push_value(value)?;
        pickler.stop();
        pickler.into_tensor_data()
    };
    let mut container: Vec<u8> = Vec::new();
    {
        let mut writer = ArchiveWriter::new(|bytes: &[u8]| container.extend_from_slice(bytes));
        write_archive_and_tensors(ROOT_ENTRY, &struct_bytes, &tensors, &mut writer);
        writer.finish();
    }
    Ok(container)
}

/// Reconstructs a value graph from a container blob, pulling each tensor
/// payload from its archive entry.
#[cfg(feature = "container")]
pub fn pickle_load(data: &[u8]) -> Result<Value, LoadError> {
    let reader = ArchiveReader::open(VecReader::new(data.to_vec()))?;
    read_archive_and_tensors(ROOT_ENTRY, None, None, None, &reader)
}

/// Container mode is excluded from this build; fails fast.
#[cfg(not(feature = "container"))]
pub fn pickle_save(_value: &Value) -> Result<Vec<u8>, SaveError> {
    Err(SaveError::Unsupported)
}

/// Container mode is excluded from this build; fails fast.
#[cfg(not(feature = "container"))]
pub fn pickle_load(_data: &[u8]) -> Result<Value, LoadError> {
    Err(LoadError::Unsupported)
}
