//! A `gbin` chunk starts with a control byte. Its five high bits carry the `Tag` of the chunk,
//! its three low bits the number of bytes, consistently named `len_len`, which follow the
//! control byte and contain the payload length in network byte order. `len_len` is always the
//! smallest value in `1..=3` that can represent the length, so an empty payload is announced by
//! a single zero byte. The payload itself follows directly.

use crate::error::{DecodeError, EncodeError};
use std::convert::TryFrom;
use std::io::Write;

/// Upper bound for the payload of a single chunk.
pub const MAX_PAYLOAD_LEN: usize = 0xfff_ffff;

/// Width in bytes of the fixed size scalars except `Byte`.
pub const SCALAR_WIDTH: usize = 8;

const SHIFT: u8 = 3;
const LEN_MASK: u8 = (1 << SHIFT) - 1;
const MAX_LEN_LEN: u8 = 3;

/// The closed set of chunk kinds. The numeric codes are part of the wire format.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    Interface = 0,
    Map = 1,
    Struct = 2,
    Pointer = 3,
    Sequence = 4,
    String = 5,
    Bool = 6,
    Int = 7,
    Int64 = 8,
    UInt = 9,
    UInt64 = 10,
    Byte = 11,
    Float64 = 12,
    Invalid = 13,
}

impl TryFrom<u8> for Tag {
    type Error = ();

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            x if x == Tag::Interface as u8 => Ok(Tag::Interface),
            x if x == Tag::Map as u8       => Ok(Tag::Map),
            x if x == Tag::Struct as u8    => Ok(Tag::Struct),
            x if x == Tag::Pointer as u8   => Ok(Tag::Pointer),
            x if x == Tag::Sequence as u8  => Ok(Tag::Sequence),
            x if x == Tag::String as u8    => Ok(Tag::String),
            x if x == Tag::Bool as u8      => Ok(Tag::Bool),
            x if x == Tag::Int as u8       => Ok(Tag::Int),
            x if x == Tag::Int64 as u8     => Ok(Tag::Int64),
            x if x == Tag::UInt as u8      => Ok(Tag::UInt),
            x if x == Tag::UInt64 as u8    => Ok(Tag::UInt64),
            x if x == Tag::Byte as u8      => Ok(Tag::Byte),
            x if x == Tag::Float64 as u8   => Ok(Tag::Float64),
            x if x == Tag::Invalid as u8   => Ok(Tag::Invalid),
            _ => Err(()),
        }
    }
}

impl Tag {

    /// Returns the mnemonic of the tag. This is useful for error messages.
    pub fn name(&self) -> &'static str {
        match *self {
            Tag::Interface => "interface",
            Tag::Map       => "map",
            Tag::Struct    => "struct",
            Tag::Pointer   => "ptr",
            Tag::Sequence  => "slice",
            Tag::String    => "string",
            Tag::Bool      => "bool",
            Tag::Int       => "int",
            Tag::Int64     => "int64",
            Tag::UInt      => "uint",
            Tag::UInt64    => "uint64",
            Tag::Byte      => "byte",
            Tag::Float64   => "float64",
            Tag::Invalid   => "invalid",
        }
    }

    /// The payload size of fixed width scalars, `None` for everything else.
    pub fn width(&self) -> Option<usize> {
        match *self {
            Tag::Bool | Tag::Int | Tag::Int64 | Tag::UInt | Tag::UInt64 | Tag::Float64 => Some(SCALAR_WIDTH),
            Tag::Byte => Some(1),
            _ => None,
        }
    }

    /// Members of the integer family convert into each other during reconciliation.
    pub fn is_integer(&self) -> bool {
        matches!(*self, Tag::Int | Tag::Int64 | Tag::UInt | Tag::UInt64 | Tag::Byte)
    }

}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Tag and payload length of a chunk.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Header {
    pub tag: Tag,
    pub len: usize,
}

impl Header {

    pub fn new(tag: Tag, len: usize) -> Self {
        Self { tag, len }
    }

    /// Returns the number of written bytes
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<usize, EncodeError> {
        let len_len = Self::len_len(self.len)?;
        let buf = (self.len as u32).to_be_bytes();
        w.write_all(&[(self.tag as u8) << SHIFT | len_len])?;
        w.write_all(&buf[buf.len() - len_len as usize ..])?;
        Ok(1 + len_len as usize)
    }

    /// Returns the encoded header as a standalone buffer, used when the payload has already been written.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = Vec::with_capacity(1 + MAX_LEN_LEN as usize);
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Returns the decoded header and the number of consumed bytes
    pub fn decode<B: ?Sized + AsRef<[u8]>>(buf: &B) -> Result<(Self, usize), DecodeError> {
        let buf = buf.as_ref();
        if buf.is_empty() {
            return Err(DecodeError::Truncated { needed: 1, available: 0 });
        }
        let control = buf[0];
        let tag = Tag::try_from(control >> SHIFT).map_err(|_| DecodeError::UnknownTag(control))?;
        let len_len = control & LEN_MASK;
        if len_len == 0 || len_len > MAX_LEN_LEN {
            return Err(DecodeError::UnknownTag(control));
        }
        let bytes = len_len as usize;
        if buf.len() - 1 < bytes {
            return Err(DecodeError::Truncated { needed: bytes, available: buf.len() - 1 });
        }
        let mut tmp = [0u8; 4];
        tmp[4 - bytes..].copy_from_slice(&buf[1..1 + bytes]);
        Ok((Header { tag, len: u32::from_be_bytes(tmp) as usize }, 1 + bytes))
    }

    /// Returns the number of bytes needed to encode this length
    #[inline]
    fn len_len(len: usize) -> Result<u8, EncodeError> {
        if len >= MAX_PAYLOAD_LEN {
            Err(EncodeError::PayloadTooLarge(len))
        } else if len < 1 << 8 {
            Ok(1)
        } else if len < 1 << 16 {
            Ok(2)
        } else if len < 1 << 24 {
            Ok(3)
        } else {
            Err(EncodeError::PayloadTooLarge(len))
        }
    }

}
