use serde::{ser, Serialize};
use gbin::{encode_value, Key, Shape, Value};
use std::collections::BTreeMap;
use std::convert::{TryFrom, TryInto};
use std::io::Write;
use tracing::debug;

use crate::describe::Describe;
use crate::error::{Error, Result};

/// Builds a [`Value`] of a given shape from a serializable type. Integers of any width are accepted for every integer
/// shape as long as they fit.
pub struct Serializer<'s> {
    shape: &'s Shape,
}

impl<'s> Serializer<'s> {
    pub fn new(shape: &'s Shape) -> Self {
        Serializer { shape }
    }
}

pub fn to_bytes<T: Serialize + Describe>(value: &T) -> Result<Vec<u8>> {
    let shape = T::shape();
    let value = value.serialize(Serializer::new(&shape))?;
    let bytes = encode_value(&value)?;
    debug!(%shape, len = bytes.len(), "serialized");
    Ok(bytes)
}

pub fn to_writer<T: Serialize + Describe, W: Write>(mut writer: W, value: &T) -> Result<()> {
    let bytes = to_bytes(value)?;
    writer.write_all(&bytes)?;
    Ok(())
}

impl<'s> Serializer<'s> {

    fn mismatch(&self, kind: &'static str) -> Error {
        Error::Mismatch(self.shape.to_string(), kind)
    }

    /// Wraps a value of its natural shape if the target is an any-slot.
    fn scalar(self, value: Value, kind: &'static str) -> Result<Value> {
        match self.shape {
            Shape::Any => Ok(Value::Any(Some(Box::new(value)))),
            shape if *shape == value.shape() => Ok(value),
            _ => Err(self.mismatch(kind)),
        }
    }

    fn integer(self, v: i128, natural: Value) -> Result<Value> {
        Ok(match self.shape {
            Shape::Int    => Value::Int(v.try_into()?),
            Shape::Int64  => Value::Int64(v.try_into()?),
            Shape::UInt   => Value::UInt(v.try_into()?),
            Shape::UInt64 => Value::UInt64(v.try_into()?),
            Shape::Byte   => Value::Byte(v.try_into()?),
            Shape::Any    => Value::Any(Some(Box::new(natural))),
            _ => return Err(self.mismatch("integer")),
        })
    }

}

impl<'s> ser::Serializer for Serializer<'s> {

    type Ok = Value;
    type Error = Error;
    type SerializeSeq = SerializeVec<'s>;
    type SerializeTuple = ser::Impossible<Value, Error>;
    type SerializeTupleStruct = ser::Impossible<Value, Error>;
    type SerializeTupleVariant = ser::Impossible<Value, Error>;
    type SerializeMap = SerializeMap<'s>;
    type SerializeStruct = SerializeStruct<'s>;
    type SerializeStructVariant = ser::Impossible<Value, Error>;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        self.scalar(Value::Bool(v), "bool")
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        self.integer(v.into(), Value::Int(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        self.integer(v.into(), Value::Int(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        self.integer(v.into(), Value::Int(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        self.integer(v.into(), Value::Int64(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        self.integer(v.into(), Value::Byte(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        self.integer(v.into(), Value::UInt(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        self.integer(v.into(), Value::UInt(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        self.integer(v.into(), Value::UInt64(v))
    }

    fn serialize_f32(self, _v: f32) -> Result<Value> {
        Err(Error::UnsupportedType("f32"))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        self.scalar(Value::Float64(v), "f64")
    }

    fn serialize_char(self, _v: char) -> Result<Value> {
        Err(Error::UnsupportedType("char"))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        self.scalar(Value::String(v.to_owned()), "string")
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        match self.shape {
            Shape::Sequence(element) if **element == Shape::Byte => Ok(Value::Sequence(Shape::Byte, v.iter().map(|b| Value::Byte(*b)).collect())),
            _ => Err(self.mismatch("bytes")),
        }
    }

    fn serialize_none(self) -> Result<Value> {
        match self.shape {
            Shape::Pointer(pointee) => Ok(Value::Pointer((**pointee).clone(), None)),
            Shape::Any => Ok(Value::Any(None)),
            _ => Err(self.mismatch("none")),
        }
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Value> {
        match self.shape {
            Shape::Pointer(pointee) => {
                let inner = value.serialize(Serializer::new(pointee))?;
                Ok(Value::Pointer((**pointee).clone(), Some(Box::new(inner))))
            },
            Shape::Any => value.serialize(self),
            _ => Err(self.mismatch("option")),
        }
    }

    fn serialize_unit(self) -> Result<Value> {
        Err(Error::UnsupportedType("unit"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Err(Error::UnsupportedType("unit struct"))
    }

    fn serialize_unit_variant(self, _name: &'static str, _variant_index: u32, _variant: &'static str) -> Result<Value> {
        Err(Error::UnsupportedType("enum"))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(self, _name: &'static str, value: &T) -> Result<Value> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(self, _name: &'static str, _variant_index: u32, _variant: &'static str, _value: &T) -> Result<Value> {
        Err(Error::UnsupportedType("enum"))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        match self.shape {
            Shape::Sequence(element) => Ok(SerializeVec { element, items: Vec::with_capacity(len.unwrap_or(0)) }),
            _ => Err(self.mismatch("sequence")),
        }
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(Error::UnsupportedType("tuple"))
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeTupleStruct> {
        Err(Error::UnsupportedType("tuple struct"))
    }

    fn serialize_tuple_variant(self, _name: &'static str, _variant_index: u32, _variant: &'static str, _len: usize) -> Result<Self::SerializeTupleVariant> {
        Err(Error::UnsupportedType("enum"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        match self.shape {
            Shape::Map(key, value) if key.is_comparable() => Ok(SerializeMap { key, value, entries: BTreeMap::new(), next: None }),
            Shape::Map(_, _) => Err(Error::KeyType),
            _ => Err(self.mismatch("map")),
        }
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        match self.shape {
            Shape::Struct(fields) => Ok(SerializeStruct { fields, values: fields.iter().map(|(_, shape)| shape.zero()).collect() }),
            _ => Err(self.mismatch("struct")),
        }
    }

    fn serialize_struct_variant(self, _name: &'static str, _variant_index: u32, _variant: &'static str, _len: usize) -> Result<Self::SerializeStructVariant> {
        Err(Error::UnsupportedType("enum"))
    }

}

pub struct SerializeVec<'s> {
    element: &'s Shape,
    items: Vec<Value>,
}

impl<'s> ser::SerializeSeq for SerializeVec<'s> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.items.push(value.serialize(Serializer::new(self.element))?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Sequence(self.element.clone(), self.items))
    }
}

pub struct SerializeMap<'s> {
    key: &'s Shape,
    value: &'s Shape,
    entries: BTreeMap<Key, Value>,
    next: Option<Key>,
}

impl<'s> ser::SerializeMap for SerializeMap<'s> {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        let key = key.serialize(Serializer::new(self.key))?;
        self.next = Some(Key::try_from(key).map_err(|_| Error::KeyType)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let key = self.next.take().ok_or_else(|| Error::Message("serialize_value called before serialize_key".into()))?;
        self.entries.insert(key, value.serialize(Serializer::new(self.value))?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Map(self.key.clone(), self.value.clone(), self.entries))
    }
}

pub struct SerializeStruct<'s> {
    fields: &'s [(String, Shape)],
    values: Vec<Value>,
}

impl<'s> ser::SerializeStruct for SerializeStruct<'s> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        let i = self.fields.iter().position(|(name, _)| name == key).ok_or_else(|| Error::UnknownField(key.to_owned()))?;
        self.values[i] = value.serialize(Serializer::new(&self.fields[i].1))?;
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Struct(self.fields.iter().map(|(name, _)| name.clone()).zip(self.values).collect()))
    }
}
