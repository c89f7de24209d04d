use crate::tag::Tag;
use std::fmt::{Display, Formatter, self};

/// A stage error together with the path of the value which caused it, rendered as `/segment/segment`.
#[derive(Debug, PartialEq)]
pub struct Traced<E> {
    inner: E,
    path: String,
}

pub type EncoderError = Traced<EncodeError>;
pub type DecoderError = Traced<DecodeError>;
pub type ReconcilerError = Traced<ReconcileError>;

impl<E> Traced<E> {

    pub fn new(inner: E, path: String) -> Self {
        Self { inner, path }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }

    pub fn path(&self) -> &str {
        &self.path
    }

}

impl<E: std::error::Error + 'static> std::error::Error for Traced<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
       Some(&self.inner)
    }
}

impl<E: Display> Display for Traced<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{} at {}", self.inner, self.path)
    }
}

#[derive(Debug)]
pub enum EncodeError {
    Io(std::io::Error),
    UnsupportedType(String),
    PayloadTooLarge(usize),
    ShapeMismatch { expected: String, found: String },
}

impl From<std::io::Error> for EncodeError {
    fn from(e: std::io::Error) -> EncodeError {
        EncodeError::Io(e)
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            EncodeError::Io(e) => write!(f, "IO error {}", e),
            EncodeError::UnsupportedType(kind) => write!(f, "Type {} is not supported for serialization", kind),
            EncodeError::PayloadTooLarge(len) => write!(f, "Payload of {} bytes does not fit into a chunk", len),
            EncodeError::ShapeMismatch { expected, found } => write!(f, "Value of type {} does not match shape {}", found, expected),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum DecodeError {
    Truncated { needed: usize, available: usize },
    UnknownTag(u8),
    InconsistentElementKind { expected: Tag, found: Tag },
    InconsistentKeyKind { expected: Tag, found: Tag },
    InconsistentValueKind { expected: Tag, found: Tag },
    InterfaceValueUnsupported,
    ScalarWidth { tag: Tag, len: usize },
    FieldName(Tag),
    Utf8(std::str::Utf8Error),
    Trailing(usize),
    DepthExceeded(usize),
}

impl From<std::str::Utf8Error> for DecodeError {
    fn from(e: std::str::Utf8Error) -> DecodeError {
        DecodeError::Utf8(e)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Utf8(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            DecodeError::Truncated { needed, available } => write!(f, "Unexpected end of buffer: needed {} bytes but only {} remain", needed, available),
            DecodeError::UnknownTag(control) => write!(f, "Unknown control byte 0x{:02x}", control),
            DecodeError::InconsistentElementKind { expected, found } => write!(f, "Slice element types must be consistent (found {} but expected {})", found, expected),
            DecodeError::InconsistentKeyKind { expected, found } => write!(f, "Map key types must be consistent (found {} but expected {})", found, expected),
            DecodeError::InconsistentValueKind { expected, found } => write!(f, "Map value types must be consistent (found {} but expected {})", found, expected),
            DecodeError::InterfaceValueUnsupported => f.write_str("Maps to interfaces are not supported"),
            DecodeError::ScalarWidth { tag, len } => write!(f, "Payload of {} bytes is not a valid {}", len, tag),
            DecodeError::FieldName(tag) => write!(f, "Encoded struct key must be of type string, not {}", tag),
            DecodeError::Utf8(e) => write!(f, "String was not valid Utf-8: {}", e),
            DecodeError::Trailing(n) => write!(f, "{} trailing bytes after value", n),
            DecodeError::DepthExceeded(max) => write!(f, "Nesting exceeds the maximum depth of {}", max),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum ReconcileError {
    KindMismatch { expected: String, found: Tag },
    UnconvertibleScalar { from: Tag, to: String },
    FieldNotFoundInTarget(String),
    IllegalKeyType(String),
}

impl std::error::Error for ReconcileError {}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            ReconcileError::KindMismatch { expected, found } => write!(f, "Type {} does not match reference type of {}", found, expected),
            ReconcileError::UnconvertibleScalar { from, to } => write!(f, "Cannot convert {} value to {}", from, to),
            ReconcileError::FieldNotFoundInTarget(name) => write!(f, "Decoded struct has field of name {} but not found in reference type", name),
            ReconcileError::IllegalKeyType(shape) => write!(f, "Found illegal key type for map: {}", shape),
        }
    }
}

/// Errors of the shape-bound `Encoder` and `Decoder`, which run several stages per call.
#[derive(Debug)]
pub enum Error {
    ErasedShape,
    Io(std::io::Error),
    Encode(EncoderError),
    Decode(DecoderError),
    Reconcile(ReconcilerError),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
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

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ErasedShape => None,
            Error::Io(e) => Some(e),
            Error::Encode(e) => Some(e),
            Error::Decode(e) => Some(e),
            Error::Reconcile(e) => Some(e),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Error::ErasedShape => f.write_str("Target shape must not be any"),
            Error::Io(e) => write!(f, "IO error {}", e),
            Error::Encode(e) => write!(f, "Encoding error: {}", e),
            Error::Decode(e) => write!(f, "Decoding error: {}", e),
            Error::Reconcile(e) => write!(f, "Reconciliation error: {}", e),
        }
    }
}
