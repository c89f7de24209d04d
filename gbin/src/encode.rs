use crate::error::{EncodeError, EncoderError, Error};
use crate::shape::Shape;
use crate::tag::{Header, Tag};
use crate::trace::{PathTrace, Segment, Traceable};
use crate::value::{Key, Value};
use std::collections::BTreeMap;
use std::io::Write;
use tracing::{debug, trace};

/// Encodes values of one particular shape.
#[derive(Debug, Clone)]
pub struct Encoder {
    shape: Shape,
}

impl Encoder {

    /// Fails if `shape` is the fully erased `Shape::Any`, since nothing would be known about the
    /// encoded values on the receiving side.
    pub fn new(shape: Shape) -> Result<Self, Error> {
        match shape {
            Shape::Any => Err(Error::ErasedShape),
            shape => Ok(Self { shape }),
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, EncoderError> {
        let mut buf = Vec::new();
        Emitter::encode(value, &self.shape, &mut buf)?;
        Ok(buf)
    }

    /// Encode a value to the given writer. The resulting `usize` is the amount of bytes that got written.
    pub fn encode_to_writer<W: Write>(&self, value: &Value, writer: &mut W) -> Result<usize, EncoderError> {
        let buf = self.encode(value)?;
        writer.write_all(&buf).map_err(|e| PathTrace::new().fail(EncodeError::from(e)))?;
        Ok(buf.len())
    }

}

/// Encodes `value` according to its own shape.
pub fn encode_value(value: &Value) -> Result<Vec<u8>, EncoderError> {
    let mut buf = Vec::new();
    Emitter::encode(value, &value.shape(), &mut buf)?;
    Ok(buf)
}

/// Writes chunks into a single buffer. Payloads are written first and their header is inserted in
/// front of them afterwards, since the width of the length field depends on the payload size.
struct Emitter<'b> {
    buf: &'b mut Vec<u8>,
    trace: PathTrace,
}

impl<'b> Traceable for Emitter<'b> {
    fn trace(&mut self) -> &mut PathTrace {
        &mut self.trace
    }
}

impl<'b> Emitter<'b> {

    /// Appends the encoding of `value` to `buf`, leaving `buf` untouched on failure.
    fn encode(value: &Value, shape: &Shape, buf: &'b mut Vec<u8>) -> Result<usize, EncoderError> {
        let start = buf.len();
        let mut emitter = Self { buf, trace: PathTrace::new() };
        match emitter.emit(value, shape) {
            Ok(()) => {
                let len = emitter.buf.len() - start;
                debug!(shape = %shape, len, "encoded value");
                Ok(len)
            },
            Err(e) => {
                emitter.buf.truncate(start);
                debug!(error = %e, "encoding failed");
                Err(e)
            },
        }
    }

    fn emit(&mut self, value: &Value, shape: &Shape) -> Result<(), EncoderError> {
        match (value, shape) {
            (Value::Bool(v), Shape::Bool)       => self.raw(Tag::Bool, &(*v as u64).to_be_bytes()),
            (Value::Int(v), Shape::Int)         => self.raw(Tag::Int, &v.to_be_bytes()),
            (Value::Int64(v), Shape::Int64)     => self.raw(Tag::Int64, &v.to_be_bytes()),
            (Value::UInt(v), Shape::UInt)       => self.raw(Tag::UInt, &v.to_be_bytes()),
            (Value::UInt64(v), Shape::UInt64)   => self.raw(Tag::UInt64, &v.to_be_bytes()),
            (Value::Byte(v), Shape::Byte)       => self.raw(Tag::Byte, &[*v]),
            (Value::Float64(v), Shape::Float64) => self.raw(Tag::Float64, &v.to_bits().to_be_bytes()),
            (Value::String(v), Shape::String)   => self.raw(Tag::String, v.as_bytes()),
            (Value::Sequence(e, items), Shape::Sequence(expected)) if e == expected.as_ref() => self.sequence(e, items),
            (Value::Map(k, v, entries), Shape::Map(ek, ev)) if k == ek.as_ref() && v == ev.as_ref() => self.map(k, v, entries),
            (Value::Struct(fields), Shape::Struct(expected)) if Self::same_layout(fields, expected) => self.structure(fields, expected),
            (Value::Pointer(p, target), Shape::Pointer(expected)) if p == expected.as_ref() => self.pointer(p, target.as_deref()),
            (Value::Any(inner), Shape::Any)     => self.any(inner.as_deref()),
            (value, shape) => Err(self.trace.fail(EncodeError::ShapeMismatch {
                expected: shape.to_string(),
                found: value.shape().to_string(),
            })),
        }
    }

    fn same_layout(fields: &[(String, Value)], expected: &[(String, Shape)]) -> bool {
        fields.len() == expected.len() && fields.iter().zip(expected).all(|((a, _), (b, _))| a == b)
    }

    // PAYLOAD: ZERO ELEMENT, ELEMENTS
    fn sequence(&mut self, element: &Shape, items: &[Value]) -> Result<(), EncoderError> {
        self.chunk(Tag::Sequence, |e| {
            e.scoped(Segment::Exemplar, |e| e.emit(&element.zero(), element))?;
            for (i, item) in items.iter().enumerate() {
                e.scoped(Segment::Element(i), |e| e.emit(item, element))?;
            }
            Ok(())
        })
    }

    // PAYLOAD: ZERO KEY, ZERO VALUE, KEY VALUE KEY VALUE ...
    fn map(&mut self, key: &Shape, value: &Shape, entries: &BTreeMap<Key, Value>) -> Result<(), EncoderError> {
        if !key.is_comparable() {
            return Err(self.trace.fail(EncodeError::UnsupportedType(format!("map key {}", key))));
        }
        self.chunk(Tag::Map, |e| {
            e.scoped(Segment::KeyExemplar, |e| e.emit(&key.zero(), key))?;
            e.scoped(Segment::ValueExemplar, |e| e.emit(&value.zero(), value))?;
            for (k, v) in entries.iter() {
                let name = k.to_string();
                e.scoped(Segment::Key(name.clone()), |e| e.emit(&Value::from(k.clone()), key))?;
                e.scoped(Segment::Value(name), |e| e.emit(v, value))?;
            }
            Ok(())
        })
    }

    // PAYLOAD: FIELD NAME, FIELD VALUE, FIELD NAME, FIELD VALUE ...
    fn structure(&mut self, fields: &[(String, Value)], shapes: &[(String, Shape)]) -> Result<(), EncoderError> {
        self.chunk(Tag::Struct, |e| {
            for ((name, value), (_, shape)) in fields.iter().zip(shapes) {
                e.scoped(Segment::Field(name.clone()), |e| {
                    e.raw(Tag::String, name.as_bytes())?;
                    e.emit(value, shape)
                })?;
            }
            Ok(())
        })
    }

    // PAYLOAD: ZERO POINTEE, POINTEE OR INVALID
    fn pointer(&mut self, pointee: &Shape, target: Option<&Value>) -> Result<(), EncoderError> {
        self.chunk(Tag::Pointer, |e| {
            e.scoped(Segment::Exemplar, |e| e.emit(&pointee.zero(), pointee))?;
            e.scoped(Segment::Pointee, |e| match target {
                Some(v) => e.emit(v, pointee),
                None    => e.raw(Tag::Invalid, &[]),
            })
        })
    }

    // PAYLOAD: DYNAMIC VALUE OR INVALID
    fn any(&mut self, inner: Option<&Value>) -> Result<(), EncoderError> {
        self.chunk(Tag::Interface, |e| {
            e.scoped(Segment::Boxed, |e| match inner {
                Some(v) => e.emit(v, &v.shape()),
                None    => e.raw(Tag::Invalid, &[]),
            })
        })
    }

    fn raw(&mut self, tag: Tag, payload: &[u8]) -> Result<(), EncoderError> {
        Header::new(tag, payload.len()).encode(&mut *self.buf).map_err(|e| self.trace.fail(e))?;
        self.buf.extend_from_slice(payload);
        trace!(%tag, len = payload.len(), "chunk");
        Ok(())
    }

    fn chunk<F>(&mut self, tag: Tag, payload: F) -> Result<(), EncoderError>
    where
        F: FnOnce(&mut Self) -> Result<(), EncoderError>,
    {
        let start = self.buf.len();
        payload(self)?;
        let len = self.buf.len() - start;
        let header = Header::new(tag, len).to_bytes().map_err(|e| self.trace.fail(e))?;
        self.buf.splice(start..start, header);
        trace!(%tag, len, "chunk");
        Ok(())
    }

}
