use std::fmt::{self, Display};
use serde::{de, ser};
use gbin::{DecoderError, EncoderError, ReconcilerError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    // Decode
    Decode(DecoderError),
    Reconcile(ReconcilerError),
    Trailing(usize),
    // Encode
    Encode(EncoderError),
    UnsupportedType(&'static str),
    Mismatch(String, &'static str),
    UnknownField(String),
    Int,
    KeyType,
    // Both
    Io(std::io::Error),
    Message(String),
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Message(msg) => fmt.write_str(msg),
            Error::Encode(e) => write!(fmt, "Encoding error: {}", e),
            Error::Decode(e) => write!(fmt, "Decoding error: {}", e),
            Error::Reconcile(e) => write!(fmt, "Reconciliation error: {}", e),
            Error::Io(e) => write!(fmt, "IO error {}", e),
            Error::Trailing(n) => write!(fmt, "{} trailing bytes in input", n),
            Error::UnsupportedType(kind) => write!(fmt, "Type {} is not supported for serialization", kind),
            Error::Mismatch(shape, kind) => write!(fmt, "Cannot serialize {} into a value of shape {}", kind, shape),
            Error::UnknownField(name) => write!(fmt, "Field {} is not part of the described shape", name),
            Error::Int => fmt.write_str("Integer didn't fit into target type"),
            Error::KeyType => fmt.write_str("Map key must be a scalar or a string"),
        }
    }
}

impl From<EncoderError> for Error {
    fn from(e: EncoderError) -> Error {
        Error::Encode(e)
    }
}

impl From<DecoderError> for Error {
    fn from(e: DecoderError) -> Error {
        Error::Decode(e)
    }
}

impl From<ReconcilerError> for Error {
    fn from(e: ReconcilerError) -> Error {
        Error::Reconcile(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<std::num::TryFromIntError> for Error {
    fn from(_e: std::num::TryFromIntError) -> Error {
        Error::Int
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(e) => Some(e),
            Error::Reconcile(e) => Some(e),
            Error::Encode(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}
