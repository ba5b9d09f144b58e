//! Convenience wrappers for one-shot encode/decode over byte vectors.

use crate::registry::ClassResolver;
use crate::tensor::TensorTable;
use crate::value::Value;

use super::error::{DecodeError, EncodeError};
use super::pickler::Pickler;
use super::unpickler::Unpickler;

/// Encodes a value graph into a structural byte stream.
///
/// With a tensor table, payloads stay caller-managed and the stream carries
/// only indices. Without one, tensor records land in the pickler's internal
/// table and are dropped with it; use [`crate::pickle_save`] to keep them.
pub fn pickle(value: &Value, tensor_table: Option<&mut TensorTable>) -> Result<Vec<u8>, EncodeError> {
    let mut data: Vec<u8> = Vec::new();
    {
        let sink = |bytes: &[u8]| data.extend_from_slice(bytes);
        let mut pickler = match tensor_table {
            Some(table) => Pickler::new(sink).tensor_table(table),
            None => Pickler::new(sink),
        };
        pickler.protocol();
        pickler.push_value(value)?;
        pickler.stop();
    }
    Ok(data)
}

/// Decodes a structural byte stream back into a value graph.
pub fn unpickle<'a>(
    data: &'a [u8],
    class_resolver: Option<ClassResolver<'a>>,
    tensor_table: Option<&'a TensorTable>,
) -> Result<Value, DecodeError> {
    let mut pos = 0usize;
    let source = move |buf: &mut [u8]| -> usize {
        let n = buf.len().min(data.len() - pos);
        buf[..n].copy_from_slice(&data[pos..pos + n]);
        pos += n;
        n
    };
    let mut unpickler = Unpickler::new(source);
    if let Some(resolver) = class_resolver {
        unpickler = unpickler.class_resolver(resolver);
    }
    if let Some(table) = tensor_table {
        unpickler = unpickler.tensor_table(table);
    }
    unpickler.parse_value()
}
