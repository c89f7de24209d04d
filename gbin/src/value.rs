//! The concrete, typed values of the `gbin` data model. A `Value` knows its own [`Shape`] down to
//! the element types of empty containers, which is what allows the encoder to emit exemplars.

use crate::error::ReconcileError;
use crate::shape::Shape;
use crate::tag::Tag;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::convert::TryFrom;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Int64(i64),
    UInt(u64),
    UInt64(u64),
    Byte(u8),
    Float64(f64),
    String(String),
    /// Element shape and elements
    Sequence(Shape, Vec<Value>),
    /// Key shape, value shape and entries
    Map(Shape, Shape, BTreeMap<Key, Value>),
    /// Fields in declaration order
    Struct(Vec<(String, Value)>),
    /// Pointee shape and the pointee, if present
    Pointer(Shape, Option<Box<Value>>),
    /// A boxed-any slot, holding a value of arbitrary shape or nothing at all
    Any(Option<Box<Value>>),
}

impl Value {

    pub fn tag(&self) -> Tag {
        match *self {
            Value::Bool(_)        => Tag::Bool,
            Value::Int(_)         => Tag::Int,
            Value::Int64(_)       => Tag::Int64,
            Value::UInt(_)        => Tag::UInt,
            Value::UInt64(_)      => Tag::UInt64,
            Value::Byte(_)        => Tag::Byte,
            Value::Float64(_)     => Tag::Float64,
            Value::String(_)      => Tag::String,
            Value::Sequence(_, _) => Tag::Sequence,
            Value::Map(_, _, _)   => Tag::Map,
            Value::Struct(_)      => Tag::Struct,
            Value::Pointer(_, _)  => Tag::Pointer,
            Value::Any(_)         => Tag::Interface,
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Value::Sequence(e, _)  => Shape::sequence(e.clone()),
            Value::Map(k, v, _)    => Shape::map(k.clone(), v.clone()),
            Value::Struct(fields)  => Shape::Struct(fields.iter().map(|(name, v)| (name.clone(), v.shape())).collect()),
            Value::Pointer(p, _)   => Shape::pointer(p.clone()),
            Value::Any(_)          => Shape::Any,
            // scalars always have a scalar shape
            scalar                 => Shape::scalar(scalar.tag()).unwrap_or(Shape::Any),
        }
    }

    /// Looks up a struct field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Unwraps an any-slot, checking that the held value has the requested shape. Values which
    /// are not any-slots are checked directly.
    pub fn downcast(&self, shape: &Shape) -> Result<&Value, ReconcileError> {
        let inner = match self {
            Value::Any(Some(inner)) => inner.as_ref(),
            Value::Any(None) => return Err(ReconcileError::KindMismatch { expected: shape.to_string(), found: Tag::Invalid }),
            other => other,
        };
        if inner.shape() == *shape {
            Ok(inner)
        } else {
            Err(ReconcileError::KindMismatch { expected: shape.to_string(), found: inner.tag() })
        }
    }

}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(v)       => write!(f, "{}", v),
            Value::Int(v)        => write!(f, "{}", v),
            Value::Int64(v)      => write!(f, "int64({})", v),
            Value::UInt(v)       => write!(f, "uint({})", v),
            Value::UInt64(v)     => write!(f, "uint64({})", v),
            Value::Byte(v)       => write!(f, "byte({})", v),
            Value::Float64(v)    => write!(f, "{:?}", v),
            Value::String(v)     => write!(f, "\"{}\"", escape(v)),
            Value::Pointer(_, None) => f.write_str("nil"),
            Value::Pointer(_, Some(v)) => write!(f, "&{}", v),
            Value::Any(None)     => f.write_str("nil"),
            Value::Any(Some(v))  => write!(f, "any({})", v),
            Value::Sequence(e, v) => write!(f, "[]{}[\n{}\n]", e, v.iter()
                .flat_map(|f| indent(format!("{},", f)))
                .collect::<Vec<String>>().join("\n")),
            Value::Map(k, v, m)  => write!(f, "map[{}]{}{{\n{}\n}}", k, v, m.iter()
                .flat_map(|(k, f)| indent(format!("{}: {},", k, f)))
                .collect::<Vec<String>>().join("\n")),
            Value::Struct(v)     => write!(f, "struct(\n{}\n)", v.iter()
                .flat_map(|(k, f)| indent(format!("{}: {},", k, f)))
                .collect::<Vec<String>>().join("\n")),
        }
    }
}

pub(crate) fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

pub(crate) fn indent(block: String) -> Vec<String> {
    block.lines().map(|line| format!("  {}", line)).collect()
}

/// Map keys: the comparable subset of [`Value`]. Keys of different kinds order by their tag code,
/// floats by their total order.
#[derive(Debug, Clone)]
pub enum Key {
    Bool(bool),
    Int(i64),
    Int64(i64),
    UInt(u64),
    UInt64(u64),
    Byte(u8),
    Float64(f64),
    String(String),
}

impl Key {

    pub fn tag(&self) -> Tag {
        Value::from(self.clone()).tag()
    }

    pub fn shape(&self) -> Shape {
        Value::from(self.clone()).shape()
    }

}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Key::Bool(a), Key::Bool(b))       => a.cmp(b),
            (Key::Int(a), Key::Int(b))         => a.cmp(b),
            (Key::Int64(a), Key::Int64(b))     => a.cmp(b),
            (Key::UInt(a), Key::UInt(b))       => a.cmp(b),
            (Key::UInt64(a), Key::UInt64(b))   => a.cmp(b),
            (Key::Byte(a), Key::Byte(b))       => a.cmp(b),
            (Key::Float64(a), Key::Float64(b)) => a.total_cmp(b),
            (Key::String(a), Key::String(b))   => a.cmp(b),
            (a, b)                             => a.tag().cmp(&b.tag()),
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl From<Key> for Value {
    fn from(key: Key) -> Value {
        match key {
            Key::Bool(v)    => Value::Bool(v),
            Key::Int(v)     => Value::Int(v),
            Key::Int64(v)   => Value::Int64(v),
            Key::UInt(v)    => Value::UInt(v),
            Key::UInt64(v)  => Value::UInt64(v),
            Key::Byte(v)    => Value::Byte(v),
            Key::Float64(v) => Value::Float64(v),
            Key::String(v)  => Value::String(v),
        }
    }
}

impl TryFrom<Value> for Key {
    type Error = Value;

    fn try_from(value: Value) -> Result<Key, Value> {
        match value {
            Value::Bool(v)    => Ok(Key::Bool(v)),
            Value::Int(v)     => Ok(Key::Int(v)),
            Value::Int64(v)   => Ok(Key::Int64(v)),
            Value::UInt(v)    => Ok(Key::UInt(v)),
            Value::UInt64(v)  => Ok(Key::UInt64(v)),
            Value::Byte(v)    => Ok(Key::Byte(v)),
            Value::Float64(v) => Ok(Key::Float64(v)),
            Value::String(v)  => Ok(Key::String(v)),
            other             => Err(other),
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Value::from(self.clone()).fmt(f)
    }
}
