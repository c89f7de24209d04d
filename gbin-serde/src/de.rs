use serde::de::{self, DeserializeOwned, IntoDeserializer, Visitor};
use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::forward_to_deserialize_any;
use gbin::{decode_tree, reconcile, Value};
use std::io::Read;
use tracing::debug;

use crate::describe::Describe;
use crate::error::{Error, Result};

/// Hands a reconciled [`Value`] to serde. Since the value already has the shape `T` described, no further checks
/// are necessary beyond what the visitors do themselves.
pub struct Deserializer {
    value: Value,
}

impl Deserializer {
    pub fn new(value: Value) -> Self {
        Deserializer { value }
    }
}

pub fn from_bytes<T: DeserializeOwned + Describe>(buf: &[u8]) -> Result<T> {
    let (tree, c) = decode_tree(buf)?;
    if c < buf.len() {
        return Err(Error::Trailing(buf.len() - c));
    }
    let shape = T::shape();
    let value = reconcile(&tree, &shape)?;
    debug!(%shape, len = c, "deserializing");
    T::deserialize(Deserializer::new(value))
}

pub fn from_reader<T: DeserializeOwned + Describe, R: Read>(mut reader: R) -> Result<T> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    from_bytes(&buf)
}

impl<'de> IntoDeserializer<'de, Error> for Deserializer {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

impl<'de> de::Deserializer<'de> for Deserializer {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Bool(v) => visitor.visit_bool(v),
            Value::Int(v) | Value::Int64(v) => visitor.visit_i64(v),
            Value::UInt(v) | Value::UInt64(v) => visitor.visit_u64(v),
            Value::Byte(v) => visitor.visit_u8(v),
            Value::Float64(v) => visitor.visit_f64(v),
            Value::String(v) => visitor.visit_string(v),
            Value::Pointer(_, None) | Value::Any(None) => visitor.visit_none(),
            Value::Pointer(_, Some(v)) | Value::Any(Some(v)) => visitor.visit_some(Deserializer::new(*v)),
            Value::Sequence(_, items) => {
                let mut seq = SeqDeserializer::<_, Error>::new(items.into_iter().map(Deserializer::new));
                let v = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(v)
            },
            Value::Map(_, _, entries) => {
                let mut map = MapDeserializer::<_, Error>::new(entries.into_iter().map(|(k, v)| (Deserializer::new(k.into()), Deserializer::new(v))));
                let v = visitor.visit_map(&mut map)?;
                map.end()?;
                Ok(v)
            },
            Value::Struct(fields) => {
                let mut map = MapDeserializer::<_, Error>::new(fields.into_iter().map(|(k, v)| (k, Deserializer::new(v))));
                let v = visitor.visit_map(&mut map)?;
                map.end()?;
                Ok(v)
            },
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Sequence(_, items) => visitor.visit_byte_buf(items.into_iter()
                .map(|item| match item {
                    Value::Byte(b) => Ok(b),
                    other => Err(Error::Message(format!("expected byte, found {}", other.tag()))),
                })
                .collect::<Result<Vec<u8>>>()?),
            other => de::Deserializer::deserialize_any(Deserializer::new(other), visitor),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        option unit unit_struct seq tuple tuple_struct map struct enum identifier ignored_any
    }
}
