//! `gbin` is a self-describing binary format. Every value is written as a chunk: a control byte holding a type tag
//! and the width of the length field, a big-endian length of one to three bytes and the payload. Containers announce
//! the zero value of their element types before their contents, so that even empty containers and absent pointers
//! keep their type on the wire.
//!
//! Decoding happens in two stages. The bytes are first read into a [`Generic`] tree without any knowledge of the
//! expected type, which is then reconciled with a target [`Shape`] into a typed [`Value`]. Errors of every stage carry
//! the path of the offending value, for instance `/field[Inner]/el3`.
//!
//! # A note on integers
//!
//! The wire format distinguishes the platform integers `int` and `uint` from their fixed-width counterparts but
//! encodes all of them with eight bytes. When reconciling, any integer converts to any other integer shape as long as
//! the value fits, otherwise a `ReconcileError::UnconvertibleScalar` is raised.
//!
//! # Examples
//!
//! ```
//! use gbin::*;
//!
//! let shape = Shape::structure([("A", Shape::String)]);
//! let value = Value::Struct(vec![("A".into(), Value::String("Hi".into()))]);
//! let buf = Encoder::new(shape.clone()).unwrap().encode(&value).unwrap();
//! assert_eq!(buf, [
//!     0x11, // Struct, one length byte
//!     0x07, // of length 7
//!     0x29, // String, one length byte
//!     0x01, // of length 1
//!     b'A',
//!     0x29, // String, one length byte
//!     0x02, // of length 2
//!     b'H',
//!     b'i',
//! ]);
//! let decoded = Decoder::new(shape).unwrap().decode(&buf).unwrap();
//! assert_eq!(value, decoded);
//! ```

mod decode;
mod encode;
mod error;
mod generic;
mod reconcile;
mod shape;
mod tag;
mod trace;
mod value;

pub use decode::*;
pub use encode::*;
pub use error::*;
pub use generic::Generic;
pub use reconcile::reconcile;
pub use shape::Shape;
pub use tag::*;
pub use trace::*;
pub use value::{Key, Value};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use std::convert::TryFrom;

    fn round_trip_value(shape: Shape, value: Value) {
        let buf = Encoder::new(shape.clone()).unwrap().encode(&value).unwrap();
        assert_eq!(Decoder::new(shape).unwrap().decode(&buf).unwrap(), value);
    }

    #[test]
    fn struct_with_map() {
        let mut map = BTreeMap::new();
        map.insert(Key::String("1".into()), Value::Int(2));
        map.insert(Key::String("2".into()), Value::Int(3));
        round_trip_value(
            Shape::structure([("A", Shape::String), ("B", Shape::map(Shape::String, Shape::Int))]),
            Value::Struct(vec![
                ("A".into(), Value::String("Hi there".into())),
                ("B".into(), Value::Map(Shape::String, Shape::Int, map)),
            ]),
        );
    }

    #[test]
    fn absent_string_pointer() {
        round_trip_value(
            Shape::structure([("A", Shape::pointer(Shape::String))]),
            Value::Struct(vec![("A".into(), Value::Pointer(Shape::String, None))]),
        );
    }

    #[test]
    fn any_slot_keeps_int() {
        let shape = Shape::structure([("A", Shape::Any)]);
        let value = Value::Struct(vec![("A".into(), Value::Any(Some(Box::new(Value::Int(2)))))]);
        let buf = Encoder::new(shape.clone()).unwrap().encode(&value).unwrap();
        let decoded = Decoder::new(shape).unwrap().decode(&buf).unwrap();
        let slot = decoded.field("A").unwrap();
        assert_eq!(slot.downcast(&Shape::Int).unwrap(), &Value::Int(2));
        assert_eq!(slot.downcast(&Shape::Int64).unwrap_err().to_string(), "Type int does not match reference type of int64");
    }

    #[test]
    fn scenario_struct_with_empty_containers() {
        let shape = Shape::structure([
            ("A", Shape::String),
            ("B", Shape::sequence(Shape::Int)),
            ("C", Shape::map(Shape::String, Shape::Float64)),
            ("D", Shape::pointer(Shape::Int64)),
        ]);
        let value = shape.zero();
        let buf = Encoder::new(shape.clone()).unwrap().encode(&value).unwrap();
        let (tree, _) = decode_tree(&buf).unwrap();
        assert_eq!(tree.shape(), shape);
        assert_eq!(Decoder::new(shape).unwrap().decode(&buf).unwrap(), value);
    }

    #[test]
    fn scenario_nested_any() {
        let mut inner = BTreeMap::new();
        inner.insert(Key::String("x".into()), Value::Any(Some(Box::new(Value::Sequence(Shape::Byte, vec![Value::Byte(1), Value::Byte(2)])))));
        inner.insert(Key::String("y".into()), Value::Any(None));
        let value = Value::Map(Shape::String, Shape::Any, inner);
        let shape = value.shape();
        let buf = encode_value(&value).unwrap();
        let decoded = Decoder::new(shape.clone()).unwrap().decode(&buf).unwrap();
        assert_eq!(decoded, value);
        let x = match &decoded {
            Value::Map(_, _, m) => m[&Key::String("x".into())].clone(),
            _ => unreachable!(),
        };
        assert_eq!(x.downcast(&Shape::sequence(Shape::Byte)).unwrap(), &Value::Sequence(Shape::Byte, vec![Value::Byte(1), Value::Byte(2)]));
    }

    #[test]
    fn scenario_widening_into_other_shape() {
        let written = Shape::structure([("N", Shape::Int), ("P", Shape::pointer(Shape::Byte))]);
        let value = Value::Struct(vec![
            ("N".into(), Value::Int(-7)),
            ("P".into(), Value::Pointer(Shape::Byte, Some(Box::new(Value::Byte(200))))),
        ]);
        let buf = Encoder::new(written).unwrap().encode(&value).unwrap();
        let read = Shape::structure([("N", Shape::Int64), ("P", Shape::pointer(Shape::UInt)), ("Q", Shape::Bool)]);
        assert_eq!(Decoder::new(read).unwrap().decode(&buf).unwrap(), Value::Struct(vec![
            ("N".into(), Value::Int64(-7)),
            ("P".into(), Value::Pointer(Shape::UInt, Some(Box::new(Value::UInt(200))))),
            ("Q".into(), Value::Bool(false)),
        ]));
        let narrow = Shape::structure([("N", Shape::UInt)]);
        let err = Decoder::new(narrow).unwrap().decode(&buf).unwrap_err();
        match err {
            Error::Reconcile(e) => {
                assert_eq!(e.path(), "/field[N]");
                assert_eq!(e.into_inner(), ReconcileError::UnconvertibleScalar { from: Tag::Int, to: "uint".into() });
            },
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn error_display() {
        let err = Decoder::new(Shape::Int).unwrap().decode(&[7 << 3 | 1, 2, 0, 0]).unwrap_err();
        assert_eq!(err.to_string(), "Decoding error: Payload of 2 bytes is not a valid int at /");
    }

    fn leaves() -> impl Strategy<Value = Shape> {
        prop_oneof![
            Just(Shape::Bool),
            Just(Shape::Int),
            Just(Shape::Int64),
            Just(Shape::UInt),
            Just(Shape::UInt64),
            Just(Shape::Byte),
            Just(Shape::Float64),
            Just(Shape::String),
            Just(Shape::Any),
        ]
    }

    fn keys() -> impl Strategy<Value = Shape> {
        prop_oneof![Just(Shape::String), Just(Shape::Int), Just(Shape::Byte), Just(Shape::Float64)]
    }

    fn shapes() -> impl Strategy<Value = Shape> {
        leaves().prop_recursive(4, 24, 4, |inner| prop_oneof![
            inner.clone().prop_map(Shape::sequence),
            (keys(), inner.clone()).prop_map(|(k, v)| Shape::map(k, v)),
            inner.clone().prop_map(Shape::pointer),
            prop::collection::vec(inner, 0..4).prop_map(|fields| Shape::Struct(fields.into_iter()
                .enumerate()
                .map(|(i, shape)| (format!("F{}", i), shape))
                .collect())),
        ])
    }

    fn values(shape: Shape) -> BoxedStrategy<Value> {
        match shape {
            Shape::Bool => any::<bool>().prop_map(Value::Bool).boxed(),
            Shape::Int => any::<i64>().prop_map(Value::Int).boxed(),
            Shape::Int64 => any::<i64>().prop_map(Value::Int64).boxed(),
            Shape::UInt => any::<u64>().prop_map(Value::UInt).boxed(),
            Shape::UInt64 => any::<u64>().prop_map(Value::UInt64).boxed(),
            Shape::Byte => any::<u8>().prop_map(Value::Byte).boxed(),
            Shape::Float64 => (-1e9..1e9f64).prop_map(Value::Float64).boxed(),
            Shape::String => "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String).boxed(),
            Shape::Any => prop_oneof![
                Just(Value::Any(None)),
                any::<i64>().prop_map(|i| Value::Any(Some(Box::new(Value::Int(i))))),
                "[a-z]{0,4}".prop_map(|s| Value::Any(Some(Box::new(Value::String(s))))),
            ].boxed(),
            Shape::Sequence(element) => prop::collection::vec(values((*element).clone()), 0..4)
                .prop_map(move |items| Value::Sequence((*element).clone(), items))
                .boxed(),
            Shape::Map(key, value) => {
                let entries = prop::collection::btree_map(
                    values((*key).clone()).prop_map(|k| Key::try_from(k).unwrap()),
                    values((*value).clone()),
                    0..4,
                );
                entries.prop_map(move |m| Value::Map((*key).clone(), (*value).clone(), m)).boxed()
            },
            Shape::Struct(fields) => {
                let names: Vec<String> = fields.iter().map(|(name, _)| name.clone()).collect();
                fields.into_iter()
                    .map(|(_, shape)| values(shape))
                    .collect::<Vec<_>>()
                    .prop_map(move |vs| Value::Struct(names.iter().cloned().zip(vs).collect()))
                    .boxed()
            },
            Shape::Pointer(pointee) => prop::option::of(values((*pointee).clone()))
                .prop_map(move |v| Value::Pointer((*pointee).clone(), v.map(Box::new)))
                .boxed(),
        }
    }

    fn shaped_values() -> impl Strategy<Value = (Shape, Value)> {
        shapes().prop_flat_map(|shape| (Just(shape.clone()), values(shape)))
    }

    proptest! {
        #[test]
        fn round_trip((shape, value) in shaped_values()) {
            let buf = encode_value(&value).unwrap();
            let (tree, len) = decode_tree(&buf).unwrap();
            prop_assert_eq!(len, buf.len());
            prop_assert_eq!(reconcile(&tree, &shape).unwrap(), value);
        }

        #[test]
        fn decode_is_idempotent((shape, value) in shaped_values()) {
            let buf = encode_value(&value).unwrap();
            let (tree, _) = decode_tree(&buf).unwrap();
            prop_assert_eq!(decode_tree(&buf).unwrap(), decode_tree(&buf).unwrap());
            let again = encode_value(&reconcile(&tree, &shape).unwrap()).unwrap();
            prop_assert_eq!(again, buf);
        }

        #[test]
        fn truncation_is_detected((_shape, value) in shaped_values(), cut in any::<prop::sample::Index>()) {
            let buf = encode_value(&value).unwrap();
            let cut = cut.index(buf.len());
            let is_truncated = matches!(decode_tree(&buf[..cut]).unwrap_err().into_inner(), DecodeError::Truncated { .. });
            prop_assert!(is_truncated);
        }

        #[test]
        fn minimal_length_field(len in 0..(1usize << 24)) {
            let bytes = Header::new(Tag::String, len).to_bytes().unwrap();
            let expected = if len < 0x100 { 1 } else if len < 0x1_0000 { 2 } else { 3 };
            prop_assert_eq!(bytes.len(), 1 + expected);
            prop_assert_eq!(bytes[0] & 0x07, expected as u8);
            prop_assert_eq!(Header::decode(&bytes).unwrap(), (Header::new(Tag::String, len), bytes.len()));
        }
    }

}
