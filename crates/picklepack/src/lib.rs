//! Graph serialization with out-of-line tensor storage.
//!
//! Converts dynamically-typed value graphs (scalars, strings, lists, dicts,
//! typed objects, tensors) into a compact self-describing opcode stream,
//! routing large binary payloads into an index-addressed side-table instead
//! of the stream itself. The container module bundles stream and payloads
//! into one named-entry archive blob.
//!
//! Two modes:
//! - tensor-table: [`pickle`]/[`unpickle`] — the caller owns the side-table
//!   and the stream carries only indices
//! - container: [`pickle_save`]/[`pickle_load`] — everything travels in one
//!   self-contained blob (requires the `container` feature)

mod convert;
mod registry;
mod save;
mod tensor;
mod value;

#[cfg(feature = "container")]
pub mod container;
pub mod pickle;

pub use convert::{json_to_value, value_to_json, ConvertError};
pub use pickle::{pickle, unpickle, DecodeError, EncodeError, Pickler, TensorResolver, Unpickler};
pub use registry::{ClassDescriptor, ClassRegistry, ClassResolver, ObjectLoader, TypeTag};
pub use save::{pickle_load, pickle_save, LoadError, SaveError, ROOT_ENTRY};
pub use tensor::{Device, Storage, Tensor, TensorLayout, TensorMeta, TensorTable};
pub use value::{Object, Value};

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn roundtrip(value: &Value) -> Value {
        let bytes = pickle(value, None).expect("encode");
        unpickle(&bytes, None, None).expect("decode")
    }

    #[test]
    fn scalar_roundtrip_matrix() {
        let cases = vec![
            Value::None,
            Value::Bool(true),
            Value::Bool(false),
            Value::Int(0),
            Value::Int(255),
            Value::Int(256),
            Value::Int(65535),
            Value::Int(65536),
            Value::Int(-1),
            Value::Int(i64::from(i32::MIN)),
            Value::Int(i64::from(i32::MAX) + 1),
            Value::Int(i64::MIN),
            Value::Int(i64::MAX),
            Value::Double(0.0),
            Value::Double(-2.5),
            Value::Str(String::new()),
            Value::Str("hello".to_owned()),
            Value::Str("héllo wörld ✓".to_owned()),
        ];
        for case in cases {
            assert_eq!(roundtrip(&case), case, "roundtrip failed for {case:?}");
        }
    }

    #[test]
    fn composite_roundtrip_matrix() {
        let cases = vec![
            Value::list(vec![]),
            Value::dict(vec![]),
            Value::list(vec![Value::Int(1), Value::None, Value::from("x")]),
            Value::dict(vec![
                (Value::from("a"), Value::Int(1)),
                (
                    Value::from("b"),
                    Value::list(vec![1.into(), 2.into(), 3.into()]),
                ),
            ]),
            Value::list(vec![Value::dict(vec![(
                Value::from("nested"),
                Value::list(vec![Value::dict(vec![])]),
            )])]),
            // Non-string dict keys are first-class.
            Value::dict(vec![(Value::Int(7), Value::from("seven"))]),
        ];
        for case in cases {
            assert_eq!(roundtrip(&case), case, "roundtrip failed for {case:?}");
        }
    }

    #[test]
    fn object_roundtrip_without_resolution() {
        let value = Value::object(
            TypeTag::new("mymod", "Point"),
            vec![Value::Int(3), Value::Int(4)],
        );
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn shared_sublist_decodes_to_one_allocation() {
        let shared = Value::list(vec![Value::Int(1)]);
        let value = Value::list(vec![shared.clone(), shared]);
        let decoded = roundtrip(&value);
        let items = match &decoded {
            Value::List(items) => items.borrow().clone(),
            other => panic!("expected list, got {other:?}"),
        };
        assert!(items[0].ptr_eq(&items[1]));
        // Mutating through one handle is visible through the other.
        if let Value::List(first) = &items[0] {
            first.borrow_mut().push(Value::Int(2));
        }
        assert_eq!(items[1], Value::list(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn self_referential_list_roundtrips() {
        let cycle = Value::list(vec![]);
        if let Value::List(items) = &cycle {
            items.borrow_mut().push(cycle.clone());
        }
        let decoded = roundtrip(&cycle);
        let inner = match &decoded {
            Value::List(items) => items.borrow()[0].clone(),
            other => panic!("expected list, got {other:?}"),
        };
        assert!(decoded.ptr_eq(&inner));
    }

    #[test]
    fn tensor_table_mode_carries_indices_only() {
        let storage = Rc::new(Storage::new(vec![1, 2, 3, 4]));
        let tensor = Value::tensor(Tensor::new(
            TensorLayout::new("f32", vec![1], vec![1]),
            Device::cpu(),
            storage,
        ));
        let mut table = TensorTable::new();
        let bytes = pickle(&tensor, Some(&mut table)).expect("encode");
        assert_eq!(table.len(), 1);
        // The payload stays out of the stream.
        assert!(bytes.len() < 64);
        let decoded = unpickle(&bytes, None, Some(&table)).expect("decode");
        assert_eq!(decoded, tensor);
    }

    #[test]
    fn duplicate_storage_is_encoded_once() {
        let storage = Rc::new(Storage::new(vec![7; 16]));
        let a = Value::tensor(Tensor::new(
            TensorLayout::new("f32", vec![4], vec![1]),
            Device::cpu(),
            Rc::clone(&storage),
        ));
        let b = Value::tensor(Tensor::new(
            TensorLayout::new("f32", vec![4], vec![1]),
            Device::cpu(),
            storage,
        ));
        let value = Value::list(vec![a, b]);
        let mut table = TensorTable::new();
        let bytes = pickle(&value, Some(&mut table)).expect("encode");
        assert_eq!(table.len(), 1);
        // Two tensor-reference opcodes, both pointing at index 0.
        let persid_count = bytes
            .iter()
            .filter(|&&b| b == pickle::constants::BINPERSID)
            .count();
        assert_eq!(persid_count, 2);
        let decoded = unpickle(&bytes, None, Some(&table)).expect("decode");
        if let Value::List(items) = &decoded {
            let items = items.borrow();
            assert!(items[0].ptr_eq(&items[1]));
        } else {
            panic!("expected list");
        }
    }

    #[test]
    fn tensor_index_out_of_range() {
        let storage = Rc::new(Storage::new(vec![1]));
        let tensor = Value::tensor(Tensor::new(
            TensorLayout::new("u8", vec![1], vec![1]),
            Device::cpu(),
            storage,
        ));
        let mut table = TensorTable::new();
        let bytes = pickle(&tensor, Some(&mut table)).expect("encode");
        let empty = TensorTable::new();
        let err = unpickle(&bytes, None, Some(&empty)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::IndexOutOfRange { index: 0, len: 0 }
        ));
    }

    #[test]
    fn tensor_without_table_or_resolver_fails() {
        let storage = Rc::new(Storage::new(vec![1]));
        let tensor = Value::tensor(Tensor::new(
            TensorLayout::new("u8", vec![1], vec![1]),
            Device::cpu(),
            storage,
        ));
        let mut table = TensorTable::new();
        let bytes = pickle(&tensor, Some(&mut table)).expect("encode");
        let err = unpickle(&bytes, None, None).unwrap_err();
        assert!(matches!(err, DecodeError::TensorTableMissing));
    }

    #[test]
    fn truncation_always_fails_clean() {
        let value = Value::dict(vec![
            (Value::from("a"), Value::Int(1)),
            (
                Value::from("b"),
                Value::list(vec![1.into(), 2.into(), 3.into()]),
            ),
        ]);
        let bytes = pickle(&value, None).expect("encode");
        for len in 0..bytes.len() - 1 {
            let err = unpickle(&bytes[..len], None, None).unwrap_err();
            assert!(
                matches!(err, DecodeError::StreamCorrupt),
                "prefix of {len} bytes gave {err:?}"
            );
        }
    }

    #[test]
    fn unresolvable_class_fails() {
        let value = Value::object(TypeTag::new("mymod", "Gone"), vec![]);
        let bytes = pickle(&value, None).expect("encode");
        let resolver: ClassResolver<'_> = Box::new(|_tag| None);
        let err = unpickle(&bytes, Some(resolver), None).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::ClassNotFound { tag } if tag == TypeTag::new("mymod", "Gone")
        ));
    }

    #[test]
    fn resolver_can_remap_tags() {
        let value = Value::object(TypeTag::new("old", "Name"), vec![Value::Int(1)]);
        let bytes = pickle(&value, None).expect("encode");
        let resolver: ClassResolver<'_> = Box::new(|tag| {
            (tag.module == "old").then(|| ClassDescriptor::new(TypeTag::new("new", "Name")))
        });
        let decoded = unpickle(&bytes, Some(resolver), None).expect("decode");
        match &decoded {
            Value::Object(object) => {
                assert_eq!(object.borrow().tag, TypeTag::new("new", "Name"));
                assert_eq!(object.borrow().fields, vec![Value::Int(1)]);
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn object_loader_takes_precedence() {
        let value = Value::object(TypeTag::new("mymod", "Wrapped"), vec![Value::Int(41)]);
        let bytes = pickle(&value, None).expect("encode");
        let mut pos = 0usize;
        let data = bytes.as_slice();
        let source = move |buf: &mut [u8]| -> usize {
            let n = buf.len().min(data.len() - pos);
            buf[..n].copy_from_slice(&data[pos..pos + n]);
            pos += n;
            n
        };
        let mut unpickler = Unpickler::new(source).object_loader(|tag, fields| {
            (tag.name == "Wrapped").then(|| match fields {
                [Value::Int(int)] => Value::Int(int + 1),
                _ => Value::None,
            })
        });
        assert_eq!(unpickler.parse_value().expect("decode"), Value::Int(42));
    }
}
