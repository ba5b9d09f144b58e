//! Depth-first value-graph encoder.

use std::collections::HashMap;
use std::rc::Rc;

use picklepack_buffers::Writer;

use crate::registry::{ClassRegistry, TypeTag};
use crate::tensor::{Tensor, TensorMeta, TensorTable};
use crate::value::Value;

use super::constants::*;
use super::error::EncodeError;

/// Streaming value-graph encoder.
///
/// Output accumulates in an internal buffer and drains through the supplied
/// byte sink on [`Pickler::stop`]. One graph per instance: the memo table is
/// not reusable across graphs.
///
/// Composites are memo-bound before their children are written, so shared
/// sub-objects encode as back-references and cyclic graphs terminate.
pub struct Pickler<'a> {
    writer: Writer,
    sink: Box<dyn FnMut(&[u8]) + 'a>,
    external_table: Option<&'a mut TensorTable>,
    own_table: TensorTable,
    registry: Option<&'a ClassRegistry>,
    memo: HashMap<usize, u32>,
}

impl<'a> Pickler<'a> {
    pub fn new(sink: impl FnMut(&[u8]) + 'a) -> Self {
        Self {
            writer: Writer::new(),
            sink: Box::new(sink),
            external_table: None,
            own_table: TensorTable::new(),
            registry: None,
            memo: HashMap::new(),
        }
    }

    /// Routes tensor records into a caller-owned side-table instead of the
    /// pickler's internal one.
    pub fn tensor_table(mut self, table: &'a mut TensorTable) -> Self {
        self.external_table = Some(table);
        self
    }

    /// Installs custom object reduction hooks. The registry is closed-world:
    /// an object tag it does not know fails the encode.
    pub fn class_registry(mut self, registry: &'a ClassRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Emits the stream header.
    pub fn protocol(&mut self) {
        self.writer.u8(PROTO);
        self.writer.u8(PROTOCOL_VERSION);
    }

    /// Serializes one value, recursing through composites.
    pub fn push_value(&mut self, value: &Value) -> Result<(), EncodeError> {
        match value {
            Value::None => self.writer.u8(NONE),
            Value::Bool(true) => self.writer.u8(NEWTRUE),
            Value::Bool(false) => self.writer.u8(NEWFALSE),
            Value::Int(int) => self.push_int(*int),
            Value::Double(double) => {
                self.writer.u8(BINFLOAT);
                self.writer.f64_be(*double);
            }
            Value::Str(s) => self.push_str(s),
            Value::List(list) => {
                let key = Rc::as_ptr(list) as usize;
                if let Some(&id) = self.memo.get(&key) {
                    self.push_back_reference(id);
                    return Ok(());
                }
                self.writer.u8(EMPTY_LIST);
                self.bind_memo(key);
                let items = list.borrow();
                if !items.is_empty() {
                    self.writer.u8(MARK);
                    for item in items.iter() {
                        self.push_value(item)?;
                    }
                    self.writer.u8(APPENDS);
                }
            }
            Value::Dict(dict) => {
                let key = Rc::as_ptr(dict) as usize;
                if let Some(&id) = self.memo.get(&key) {
                    self.push_back_reference(id);
                    return Ok(());
                }
                self.writer.u8(EMPTY_DICT);
                self.bind_memo(key);
                let pairs = dict.borrow();
                if !pairs.is_empty() {
                    self.writer.u8(MARK);
                    for (item_key, item_value) in pairs.iter() {
                        self.push_value(item_key)?;
                        self.push_value(item_value)?;
                    }
                    self.writer.u8(SETITEMS);
                }
            }
            Value::Object(object) => {
                let key = Rc::as_ptr(object) as usize;
                if let Some(&id) = self.memo.get(&key) {
                    self.push_back_reference(id);
                    return Ok(());
                }
                let (tag, fields) = {
                    let object = object.borrow();
                    let fields = match self.registry {
                        Some(registry) => registry.reduce(&object).ok_or_else(|| {
                            EncodeError::TypeUnsupported {
                                kind: object.tag.qualified(),
                            }
                        })?,
                        None => object.fields.clone(),
                    };
                    (object.tag.clone(), fields)
                };
                self.push_global(&tag);
                self.writer.u8(MARK);
                for field in &fields {
                    self.push_value(field)?;
                }
                self.writer.u8(TUPLE);
                self.writer.u8(REDUCE);
                self.bind_memo(key);
            }
            Value::Tensor(tensor) => self.push_tensor(tensor),
        }
        Ok(())
    }

    /// Emits the stream terminator and drains the buffer through the sink.
    pub fn stop(&mut self) {
        self.writer.u8(STOP);
        self.flush();
    }

    /// Tensor records captured by the internal side-table. Empty when an
    /// external table was supplied.
    pub fn tensor_data(&self) -> &TensorTable {
        &self.own_table
    }

    /// Consumes the pickler, returning the internal side-table.
    pub fn into_tensor_data(self) -> TensorTable {
        self.own_table
    }

    fn flush(&mut self) {
        let bytes = self.writer.flush();
        if !bytes.is_empty() {
            (self.sink)(&bytes);
        }
    }

    fn push_int(&mut self, int: i64) {
        if (0..=0xff).contains(&int) {
            self.writer.u8(BININT1);
            self.writer.u8(int as u8);
        } else if (0..=0xffff).contains(&int) {
            self.writer.u8(BININT2);
            self.writer.u16(int as u16);
        } else if (i32::MIN as i64..=i32::MAX as i64).contains(&int) {
            self.writer.u8(BININT);
            self.writer.u32(int as i32 as u32);
        } else {
            self.writer.u8(LONG1);
            self.writer.u8(8);
            self.writer.u64(int as u64);
        }
    }

    fn push_str(&mut self, s: &str) {
        self.writer.u8(BINUNICODE);
        self.writer.u32(s.len() as u32);
        self.writer.utf8(s);
    }

    fn push_global(&mut self, tag: &TypeTag) {
        self.writer.u8(GLOBAL);
        self.writer.utf8(&tag.module);
        self.writer.u8(b'\n');
        self.writer.utf8(&tag.name);
        self.writer.u8(b'\n');
    }

    fn push_tensor(&mut self, tensor: &Rc<Tensor>) {
        let index = match self.external_table.as_deref_mut() {
            Some(table) => table.lookup_or_insert(tensor),
            None => self.own_table.lookup_or_insert(tensor),
        };
        let meta = TensorMeta::of(index, tensor);
        self.push_meta(&meta);
        self.writer.u8(BINPERSID);
    }

    fn push_meta(&mut self, meta: &TensorMeta) {
        self.writer.u8(MARK);
        self.push_int(meta.index as i64);
        self.push_str(&meta.dtype);
        self.push_int_tuple(&meta.shape);
        self.push_int_tuple(&meta.stride);
        self.push_int(meta.nbytes as i64);
        self.push_str(&meta.device.0);
        self.writer.u8(TUPLE);
    }

    fn push_int_tuple(&mut self, ints: &[i64]) {
        self.writer.u8(MARK);
        for &int in ints {
            self.push_int(int);
        }
        self.writer.u8(TUPLE);
    }

    fn bind_memo(&mut self, key: usize) {
        let id = self.memo.len() as u32;
        self.memo.insert(key, id);
        if id <= 0xff {
            self.writer.u8(BINPUT);
            self.writer.u8(id as u8);
        } else {
            self.writer.u8(LONG_BINPUT);
            self.writer.u32(id);
        }
    }

    fn push_back_reference(&mut self, id: u32) {
        if id <= 0xff {
            self.writer.u8(BINGET);
            self.writer.u8(id as u8);
        } else {
            self.writer.u8(LONG_BINGET);
            self.writer.u32(id);
        }
    }
}
