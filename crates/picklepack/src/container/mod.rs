//! Named-entry archive bridging the structural stream and the tensor
//! side-table into one byte container.
//!
//! Entry `root` holds the structural stream; `root/0`, `root/1`, … hold raw
//! tensor payloads in side-table order. The physical source and destination
//! are injected ([`ReadAdapter`], the writer's byte sink), so the same
//! machinery serves in-memory blobs and external media alike.

pub mod constants;

mod error;
mod reader;
mod writer;

pub use error::ContainerError;
pub use reader::{ArchiveReader, ReadAdapter, VecReader};
pub use writer::{write_archive_and_tensors, ArchiveWriter};

use std::cell::RefCell;
use std::rc::Rc;

use crate::pickle::{DecodeError, Unpickler};
use crate::registry::{ClassResolver, ObjectLoader};
use crate::save::LoadError;
use crate::tensor::{Device, Storage, TensorMeta};
use crate::value::Value;

/// Reads entry `root_name` as the structural stream and decodes it,
/// resolving tensor references from entries `root_name/<index>` on demand
/// and applying `device_map` (identity when absent) to each reconstructed
/// tensor.
pub fn read_archive_and_tensors<R: ReadAdapter>(
    root_name: &str,
    class_resolver: Option<ClassResolver<'_>>,
    object_loader: Option<ObjectLoader<'_>>,
    device_map: Option<&dyn Fn(&Device) -> Device>,
    reader: &ArchiveReader<R>,
) -> Result<Value, LoadError> {
    let struct_bytes = reader.entry(root_name)?;
    let mut pos = 0usize;
    let source = move |buf: &mut [u8]| -> usize {
        let n = buf.len().min(struct_bytes.len() - pos);
        buf[..n].copy_from_slice(&struct_bytes[pos..pos + n]);
        pos += n;
        n
    };

    // Container failures inside the tensor resolver are carried out-of-band
    // so they surface typed instead of as a generic decode error.
    let container_failure: Rc<RefCell<Option<ContainerError>>> = Rc::new(RefCell::new(None));
    let failure = Rc::clone(&container_failure);
    let tensor_resolver = move |index: usize, meta: &TensorMeta| -> Result<Value, DecodeError> {
        let name = format!("{root_name}/{index}");
        let bytes = match reader.entry(&name) {
            Ok(bytes) => bytes,
            Err(err) => {
                *failure.borrow_mut() = Some(err);
                return Err(DecodeError::StreamCorrupt);
            }
        };
        let device = match device_map {
            Some(map) => map(&meta.device),
            None => meta.device.clone(),
        };
        let tensor = meta.materialize(Rc::new(Storage::new(bytes)), device);
        Ok(Value::Tensor(Rc::new(tensor)))
    };

    let mut unpickler = Unpickler::new(source).tensor_resolver(tensor_resolver);
    if let Some(resolver) = class_resolver {
        unpickler = unpickler.class_resolver(resolver);
    }
    if let Some(loader) = object_loader {
        unpickler = unpickler.object_loader(loader);
    }
    let result = unpickler.parse_value();
    if let Some(err) = container_failure.borrow_mut().take() {
        return Err(LoadError::Container(err));
    }
    result.map_err(LoadError::Decode)
}
