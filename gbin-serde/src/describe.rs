//! Serde only reveals the layout of a type while serializing an instance of it, but `gbin` needs the shape of
//! every container up front to write its exemplars, even for empty sequences and absent options. Types therefore
//! describe their shape through [`Describe`].
//!
//! Records implement it by hand, listing their fields the way serde names them:
//!
//! ```
//! use gbin::Shape;
//! use gbin_serde::Describe;
//!
//! struct Cat {
//!     name: String,
//!     lives: Option<u8>,
//! }
//!
//! impl Describe for Cat {
//!     fn shape() -> Shape {
//!         Shape::structure([("name", String::shape()), ("lives", <Option<u8>>::shape())])
//!     }
//! }
//!
//! assert_eq!(Cat::shape().to_string(), "struct { name: string, lives: *byte }");
//! ```

use gbin::Shape;
use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub trait Describe {
    fn shape() -> Shape;
}

macro_rules! describe {
    ($($t:ty => $shape:expr),* $(,)?) => {
        $(
            impl Describe for $t {
                fn shape() -> Shape {
                    $shape
                }
            }
        )*
    }
}

describe! {
    bool   => Shape::Bool,
    i8     => Shape::Int,
    i16    => Shape::Int,
    i32    => Shape::Int,
    isize  => Shape::Int,
    i64    => Shape::Int64,
    u8     => Shape::Byte,
    u16    => Shape::UInt,
    u32    => Shape::UInt,
    usize  => Shape::UInt,
    u64    => Shape::UInt64,
    f64    => Shape::Float64,
    String => Shape::String,
    Erased => Shape::Any,
}

impl<T: Describe> Describe for Vec<T> {
    fn shape() -> Shape {
        Shape::sequence(T::shape())
    }
}

impl<K: Describe, V: Describe, S> Describe for HashMap<K, V, S> {
    fn shape() -> Shape {
        Shape::map(K::shape(), V::shape())
    }
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn shape() -> Shape {
        Shape::map(K::shape(), V::shape())
    }
}

impl<T: Describe> Describe for Option<T> {
    fn shape() -> Shape {
        Shape::pointer(T::shape())
    }
}

impl<T: Describe> Describe for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }
}

/// The content of an any-slot. Only scalars and strings can be carried since nothing else is self-contained on the
/// Rust side.
///
/// Integers are always written as `int64` or `uint64`. Any signed kind reads back as `Int`, any unsigned kind or
/// `byte` as `UInt`.
#[derive(Debug, Clone, PartialEq)]
pub enum Erased {
    Nil,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float64(f64),
    String(String),
}

impl Default for Erased {
    fn default() -> Self {
        Erased::Nil
    }
}

impl Serialize for Erased {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Erased::Nil        => serializer.serialize_none(),
            Erased::Bool(v)    => serializer.serialize_bool(*v),
            Erased::Int(v)     => serializer.serialize_i64(*v),
            Erased::UInt(v)    => serializer.serialize_u64(*v),
            Erased::Float64(v) => serializer.serialize_f64(*v),
            Erased::String(v)  => serializer.serialize_str(v),
        }
    }
}

struct ErasedVisitor;

impl<'de> Visitor<'de> for ErasedVisitor {
    type Value = Erased;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a scalar, a string or nothing")
    }

    fn visit_none<E: de::Error>(self) -> Result<Erased, E> {
        Ok(Erased::Nil)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Erased, D::Error> {
        Erased::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Erased, E> {
        Ok(Erased::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Erased, E> {
        Ok(Erased::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Erased, E> {
        Ok(Erased::UInt(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Erased, E> {
        Ok(Erased::Float64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Erased, E> {
        Ok(Erased::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Erased, E> {
        Ok(Erased::String(v))
    }
}

impl<'de> Deserialize<'de> for Erased {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Erased, D::Error> {
        deserializer.deserialize_any(ErasedVisitor)
    }
}
