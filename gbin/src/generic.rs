//! The decoder's output: a self-describing tree built without any knowledge of the target type.
//! Containers keep the exemplar they were announced with, so the natural [`Shape`] of every node
//! can be recovered even if the container is empty.

use crate::shape::Shape;
use crate::tag::Tag;
use crate::value::{escape, indent};

#[derive(Debug, Clone, PartialEq)]
pub enum Generic {
    Bool(bool),
    Int(i64),
    Int64(i64),
    UInt(u64),
    UInt64(u64),
    Byte(u8),
    Float64(f64),
    String(String),
    Sequence { exemplar: Box<Generic>, items: Vec<Generic> },
    /// Entries in read order. Keys all share the tag of the key exemplar.
    Map { key: Box<Generic>, value: Box<Generic>, entries: Vec<(Generic, Generic)> },
    /// Fields in read order, duplicates already collapsed.
    Struct(Vec<(String, Generic)>),
    Pointer { exemplar: Box<Generic>, target: Option<Box<Generic>> },
    Interface(Box<Generic>),
    /// An explicitly absent value
    Invalid,
}

impl Generic {

    pub fn tag(&self) -> Tag {
        match *self {
            Generic::Bool(_)         => Tag::Bool,
            Generic::Int(_)          => Tag::Int,
            Generic::Int64(_)        => Tag::Int64,
            Generic::UInt(_)         => Tag::UInt,
            Generic::UInt64(_)       => Tag::UInt64,
            Generic::Byte(_)         => Tag::Byte,
            Generic::Float64(_)      => Tag::Float64,
            Generic::String(_)       => Tag::String,
            Generic::Sequence { .. } => Tag::Sequence,
            Generic::Map { .. }      => Tag::Map,
            Generic::Struct(_)       => Tag::Struct,
            Generic::Pointer { .. }  => Tag::Pointer,
            Generic::Interface(_)    => Tag::Interface,
            Generic::Invalid         => Tag::Invalid,
        }
    }

    /// The shape this node was encoded from, as far as the wire format tells. Struct shapes only
    /// list the fields which were present on the wire.
    pub fn shape(&self) -> Shape {
        match self {
            Generic::Sequence { exemplar, .. } => Shape::sequence(exemplar.shape()),
            Generic::Map { key, value, .. }    => Shape::map(key.shape(), value.shape()),
            Generic::Struct(fields)            => Shape::Struct(fields.iter().map(|(n, g)| (n.clone(), g.shape())).collect()),
            Generic::Pointer { exemplar, .. }  => Shape::pointer(exemplar.shape()),
            Generic::Interface(_) | Generic::Invalid => Shape::Any,
            scalar => Shape::scalar(scalar.tag()).unwrap_or(Shape::Any),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Generic> {
        match self {
            Generic::Struct(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, g)| g),
            _ => None,
        }
    }

}

impl std::fmt::Display for Generic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Generic::Bool(v)    => write!(f, "{}", v),
            Generic::Int(v)     => write!(f, "{}", v),
            Generic::Int64(v)   => write!(f, "int64({})", v),
            Generic::UInt(v)    => write!(f, "uint({})", v),
            Generic::UInt64(v)  => write!(f, "uint64({})", v),
            Generic::Byte(v)    => write!(f, "byte({})", v),
            Generic::Float64(v) => write!(f, "{:?}", v),
            Generic::String(v)  => write!(f, "\"{}\"", escape(v)),
            Generic::Invalid    => f.write_str("invalid"),
            Generic::Interface(v) => write!(f, "interface({})", v),
            Generic::Pointer { target: None, .. } => f.write_str("nil"),
            Generic::Pointer { target: Some(v), .. } => write!(f, "&{}", v),
            Generic::Sequence { exemplar, items } => write!(f, "[]{}[\n{}\n]", exemplar.shape(), items.iter()
                .flat_map(|f| indent(format!("{},", f)))
                .collect::<Vec<String>>().join("\n")),
            Generic::Map { key, value, entries } => write!(f, "map[{}]{}{{\n{}\n}}", key.shape(), value.shape(), entries.iter()
                .flat_map(|(k, f)| indent(format!("{}: {},", k, f)))
                .collect::<Vec<String>>().join("\n")),
            Generic::Struct(fields) => write!(f, "struct(\n{}\n)", fields.iter()
                .flat_map(|(k, f)| indent(format!("{}: {},", k, f)))
                .collect::<Vec<String>>().join("\n")),
        }
    }
}
