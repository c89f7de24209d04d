//! Target descriptors. A `Shape` is the statically known type of a value: the encoder uses it to
//! produce zero-value exemplars for containers and the reconciler uses it to turn a schema-less
//! [`Generic`](crate::Generic) tree back into a typed [`Value`].

use crate::tag::Tag;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// The fully erased slot which can hold a value of any shape.
    Any,
    Bool,
    Int,
    Int64,
    UInt,
    UInt64,
    Byte,
    Float64,
    String,
    Sequence(Box<Shape>),
    Map(Box<Shape>, Box<Shape>),
    /// Field names and shapes in declaration order.
    Struct(Vec<(String, Shape)>),
    Pointer(Box<Shape>),
}

impl Shape {

    pub fn sequence(element: Shape) -> Self {
        Shape::Sequence(Box::new(element))
    }

    pub fn map(key: Shape, value: Shape) -> Self {
        Shape::Map(Box::new(key), Box::new(value))
    }

    pub fn pointer(pointee: Shape) -> Self {
        Shape::Pointer(Box::new(pointee))
    }

    pub fn structure<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Shape)>,
        S: Into<String>,
    {
        Shape::Struct(fields.into_iter().map(|(name, shape)| (name.into(), shape)).collect())
    }

    /// The shape of a scalar tag, `None` for containers, interfaces and `Invalid`.
    pub fn scalar(tag: Tag) -> Option<Self> {
        match tag {
            Tag::Bool    => Some(Shape::Bool),
            Tag::Int     => Some(Shape::Int),
            Tag::Int64   => Some(Shape::Int64),
            Tag::UInt    => Some(Shape::UInt),
            Tag::UInt64  => Some(Shape::UInt64),
            Tag::Byte    => Some(Shape::Byte),
            Tag::Float64 => Some(Shape::Float64),
            Tag::String  => Some(Shape::String),
            _            => None,
        }
    }

    pub fn tag(&self) -> Tag {
        match *self {
            Shape::Any         => Tag::Interface,
            Shape::Bool        => Tag::Bool,
            Shape::Int         => Tag::Int,
            Shape::Int64       => Tag::Int64,
            Shape::UInt        => Tag::UInt,
            Shape::UInt64      => Tag::UInt64,
            Shape::Byte        => Tag::Byte,
            Shape::Float64     => Tag::Float64,
            Shape::String      => Tag::String,
            Shape::Sequence(_) => Tag::Sequence,
            Shape::Map(_, _)   => Tag::Map,
            Shape::Struct(_)   => Tag::Struct,
            Shape::Pointer(_)  => Tag::Pointer,
        }
    }

    /// Whether values of this shape have a canonical comparable form and can be used as map keys.
    pub fn is_comparable(&self) -> bool {
        Shape::scalar(self.tag()).is_some()
    }

    /// Looks up a struct field by name, returning its declaration index and shape.
    pub fn field(&self, name: &str) -> Option<(usize, &Shape)> {
        match self {
            Shape::Struct(fields) => fields.iter().enumerate()
                .find(|(_, (n, _))| n == name)
                .map(|(i, (_, shape))| (i, shape)),
            _ => None,
        }
    }

    /// The zero value of this shape: empty containers, absent pointers and an empty any-slot.
    pub fn zero(&self) -> Value {
        match self {
            Shape::Any           => Value::Any(None),
            Shape::Bool          => Value::Bool(false),
            Shape::Int           => Value::Int(0),
            Shape::Int64         => Value::Int64(0),
            Shape::UInt          => Value::UInt(0),
            Shape::UInt64        => Value::UInt64(0),
            Shape::Byte          => Value::Byte(0),
            Shape::Float64       => Value::Float64(0.0),
            Shape::String        => Value::String(String::new()),
            Shape::Sequence(e)   => Value::Sequence((**e).clone(), Vec::new()),
            Shape::Map(k, v)     => Value::Map((**k).clone(), (**v).clone(), BTreeMap::new()),
            Shape::Struct(fields) => Value::Struct(fields.iter().map(|(name, shape)| (name.clone(), shape.zero())).collect()),
            Shape::Pointer(p)    => Value::Pointer((**p).clone(), None),
        }
    }

}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Any         => f.write_str("any"),
            Shape::Sequence(e) => write!(f, "[]{}", e),
            Shape::Map(k, v)   => write!(f, "map[{}]{}", k, v),
            Shape::Pointer(p)  => write!(f, "*{}", p),
            Shape::Struct(fields) if fields.is_empty() => f.write_str("struct {}"),
            Shape::Struct(fields) => write!(f, "struct {{ {} }}", fields.iter()
                .map(|(name, shape)| format!("{}: {}", name, shape))
                .collect::<Vec<String>>().join(", ")),
            scalar => f.write_str(scalar.tag().name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Shape;
    use crate::value::Value;

    #[test]
    fn display() {
        let shape = Shape::structure([
            ("A", Shape::String),
            ("B", Shape::map(Shape::String, Shape::Int)),
            ("C", Shape::pointer(Shape::sequence(Shape::Any))),
        ]);
        assert_eq!(shape.to_string(), "struct { A: string, B: map[string]int, C: *[]any }");
        assert_eq!(Shape::structure(Vec::<(String, Shape)>::new()).to_string(), "struct {}");
    }

    #[test]
    fn zero_struct() {
        let shape = Shape::structure([("A", Shape::Float64), ("B", Shape::pointer(Shape::String))]);
        assert_eq!(shape.zero(), Value::Struct(vec![
            ("A".to_string(), Value::Float64(0.0)),
            ("B".to_string(), Value::Pointer(Shape::String, None)),
        ]));
        assert_eq!(shape.zero().shape(), shape);
    }

    #[test]
    fn comparable() {
        assert!(Shape::String.is_comparable());
        assert!(Shape::Float64.is_comparable());
        assert!(!Shape::Any.is_comparable());
        assert!(!Shape::pointer(Shape::Int).is_comparable());
        assert!(!Shape::structure([("A", Shape::Int)]).is_comparable());
    }

}
