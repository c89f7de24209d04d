//! Conveniently serialize and deserialize your Rust data structures into the `gbin` wire format.
//!
//! # Shapes come first
//!
//! Every `gbin` container carries the zero value of its element type, so the shape of a type must be known before
//! any of its instances is serialized. Serde does not provide that information, which is why every type passed to
//! [to_bytes] or [from_bytes] must also implement [Describe]. Serialization then builds a [gbin::Value] guided by
//! that shape, deserialization decodes the message, reconciles it with the shape and hands the result to serde.
//!
//! Not every serde data type has a counterpart in `gbin`: `f32`, `char`, unit types, enums and tuples are rejected
//! with [Error::UnsupportedType].
//!
//! # Examples
//!
//! ```
//! use gbin::Shape;
//! use gbin_serde::Describe;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Cat {
//!     name: String,
//! }
//!
//! impl Describe for Cat {
//!     fn shape() -> Shape {
//!         Shape::structure([("name", String::shape())])
//!     }
//! }
//!
//! let cat = Cat { name: "Tom".to_string() };
//! let bytes = gbin_serde::to_bytes(&cat).unwrap();
//! assert_eq!(bytes, [
//!   0x11, 0x0b,                     // Struct of length 11
//!     0x29, 0x04,                   // String of length 4
//!       0x6e, 0x61, 0x6d, 0x65,     // 'name'
//!     0x29, 0x03,                   // String of length 3
//!       0x54, 0x6f, 0x6d,           // 'Tom'
//! ]);
//!
//! let deserialized: Cat = gbin_serde::from_bytes(&bytes).unwrap();
//! assert_eq!(cat, deserialized);
//! ```

mod de;
mod describe;
mod error;
mod ser;

pub use de::{from_bytes, from_reader, Deserializer};
pub use describe::{Describe, Erased};
pub use error::{Error, Result};
pub use ser::{to_bytes, to_writer, Serializer};
