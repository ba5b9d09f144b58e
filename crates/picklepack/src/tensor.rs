//! Tensor records and the index-addressed side-table.
//!
//! Large binary payloads never enter the structural stream; the encoder
//! routes them here and emits only a table index, so the stream stays small
//! no matter how big the buffers are.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Raw tensor payload bytes. The `Rc<Storage>` allocation is the storage
/// identity used for de-duplication across one encode.
#[derive(Debug, Clone, PartialEq)]
pub struct Storage {
    pub data: Vec<u8>,
}

impl Storage {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Byte layout descriptor. Opaque to the serializer beyond carrying it
/// across the wire intact.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorLayout {
    pub dtype: String,
    pub shape: Vec<i64>,
    pub stride: Vec<i64>,
}

impl TensorLayout {
    pub fn new(dtype: &str, shape: Vec<i64>, stride: Vec<i64>) -> Self {
        Self {
            dtype: dtype.to_owned(),
            shape,
            stride,
        }
    }
}

/// Logical device placement, e.g. `cpu`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device(pub String);

impl Device {
    pub fn new(name: &str) -> Self {
        Device(name.to_owned())
    }

    pub fn cpu() -> Self {
        Device("cpu".to_owned())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tensor record: layout descriptor, device placement, and the shared
/// storage holding the raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    pub layout: TensorLayout,
    pub device: Device,
    pub storage: Rc<Storage>,
}

impl Tensor {
    pub fn new(layout: TensorLayout, device: Device, storage: Rc<Storage>) -> Self {
        Self {
            layout,
            device,
            storage,
        }
    }

    /// Size of the raw payload in bytes.
    pub fn nbytes(&self) -> usize {
        self.storage.data.len()
    }
}

/// Per-reference tensor descriptor carried inside the structural stream.
///
/// Archive entries hold raw payload bytes only, so every reference embeds
/// enough layout to rebuild the tensor from those bytes alone.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorMeta {
    pub index: usize,
    pub dtype: String,
    pub shape: Vec<i64>,
    pub stride: Vec<i64>,
    pub nbytes: usize,
    pub device: Device,
}

impl TensorMeta {
    /// Captures the descriptor of a tensor at the given side-table index.
    pub fn of(index: usize, tensor: &Tensor) -> Self {
        Self {
            index,
            dtype: tensor.layout.dtype.clone(),
            shape: tensor.layout.shape.clone(),
            stride: tensor.layout.stride.clone(),
            nbytes: tensor.nbytes(),
            device: tensor.device.clone(),
        }
    }

    /// Rebuilds a tensor record from this descriptor plus its raw bytes.
    pub fn materialize(&self, storage: Rc<Storage>, device: Device) -> Tensor {
        Tensor {
            layout: TensorLayout {
                dtype: self.dtype.clone(),
                shape: self.shape.clone(),
                stride: self.stride.clone(),
            },
            device,
            storage,
        }
    }
}

/// Ordered, index-addressed store of tensor records kept outside the
/// structural stream.
///
/// Table order is encoder-assigned: index N on write is index N on read.
#[derive(Debug, Default)]
pub struct TensorTable {
    tensors: Vec<Rc<Tensor>>,
    by_storage: HashMap<usize, usize>,
}

impl TensorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Rc<Tensor>> {
        self.tensors.get(index)
    }

    /// Appends a tensor unconditionally and returns its index, recording the
    /// storage identity for later lookups.
    pub fn push(&mut self, tensor: Rc<Tensor>) -> usize {
        let index = self.tensors.len();
        self.by_storage
            .entry(Rc::as_ptr(&tensor.storage) as usize)
            .or_insert(index);
        self.tensors.push(tensor);
        index
    }

    /// Returns the index of a previously-seen storage, or appends the tensor
    /// and returns the new index. The payload is never duplicated.
    pub fn lookup_or_insert(&mut self, tensor: &Rc<Tensor>) -> usize {
        let key = Rc::as_ptr(&tensor.storage) as usize;
        if let Some(&index) = self.by_storage.get(&key) {
            return index;
        }
        let index = self.tensors.len();
        self.by_storage.insert(key, index);
        self.tensors.push(Rc::clone(tensor));
        index
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<Tensor>> {
        self.tensors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor_of(bytes: Vec<u8>) -> Rc<Tensor> {
        let len = bytes.len() as i64;
        Rc::new(Tensor::new(
            TensorLayout::new("u8", vec![len], vec![1]),
            Device::cpu(),
            Rc::new(Storage::new(bytes)),
        ))
    }

    #[test]
    fn lookup_or_insert_deduplicates_by_storage() {
        let mut table = TensorTable::new();
        let a = tensor_of(vec![1, 2, 3, 4]);
        // Same storage, distinct record.
        let b = Rc::new(Tensor::new(
            TensorLayout::new("u8", vec![2, 2], vec![2, 1]),
            Device::cpu(),
            Rc::clone(&a.storage),
        ));
        assert_eq!(table.lookup_or_insert(&a), 0);
        assert_eq!(table.lookup_or_insert(&b), 0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn distinct_storages_get_distinct_indices() {
        let mut table = TensorTable::new();
        let a = tensor_of(vec![1, 2]);
        let b = tensor_of(vec![1, 2]);
        assert_eq!(table.lookup_or_insert(&a), 0);
        assert_eq!(table.lookup_or_insert(&b), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn meta_roundtrip() {
        let t = tensor_of(vec![9, 9, 9]);
        let meta = TensorMeta::of(0, &t);
        assert_eq!(meta.nbytes, 3);
        let rebuilt = meta.materialize(Rc::clone(&t.storage), meta.device.clone());
        assert_eq!(rebuilt, *t);
    }
}
