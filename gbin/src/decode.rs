use crate::error::{DecodeError, DecoderError, Error};
use crate::generic::Generic;
use crate::reconcile::reconcile;
use crate::shape::Shape;
use crate::tag::{Header, Tag, SCALAR_WIDTH};
use crate::trace::{PathTrace, Segment, Traceable};
use crate::value::Value;
use std::collections::HashMap;
use std::io::Read;
use std::str::from_utf8;
use tracing::{debug, trace};

/// Nesting limit applied unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Decodes messages into values of one particular shape.
#[derive(Debug, Clone)]
pub struct Decoder {
    shape: Shape,
    max_depth: usize,
}

impl Decoder {

    /// Fails if `shape` is the fully erased `Shape::Any`.
    pub fn new(shape: Shape) -> Result<Self, Error> {
        match shape {
            Shape::Any => Err(Error::ErasedShape),
            shape => Ok(Self { shape, max_depth: DEFAULT_MAX_DEPTH }),
        }
    }

    /// Messages nested deeper than `max_depth` chunks are rejected with `DecodeError::DepthExceeded`.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Decodes exactly one message from `buf` and reconciles it with the decoder's shape.
    pub fn decode<B: ?Sized + AsRef<[u8]>>(&self, buf: &B) -> Result<Value, Error> {
        let buf = buf.as_ref();
        let (tree, c) = TreeReader::read(buf, self.max_depth)?;
        if c < buf.len() {
            return Err(PathTrace::new().fail(DecodeError::Trailing(buf.len() - c)).into());
        }
        Ok(reconcile(&tree, &self.shape)?)
    }

    pub fn decode_from_reader<R: Read>(&self, mut reader: R) -> Result<Value, Error> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.decode(&buf)
    }

}

/// Decode a single chunk from the given buffer into a schema-less tree. Returns the tree and the
/// number of consumed bytes.
pub fn decode_tree<B: ?Sized + AsRef<[u8]>>(buf: &B) -> Result<(Generic, usize), DecoderError> {
    TreeReader::read(buf.as_ref(), DEFAULT_MAX_DEPTH)
}

/// Consecutive chunks within one payload.
struct Chunks<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Chunks<'a> {

    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn next(&mut self) -> Result<(Tag, &'a [u8]), DecodeError> {
        let (header, c) = Header::decode(&self.buf[self.pos..])?;
        let start = self.pos + c;
        let available = self.buf.len() - start;
        if available < header.len {
            return Err(DecodeError::Truncated { needed: header.len, available });
        }
        self.pos = start + header.len;
        Ok((header.tag, &self.buf[start..self.pos]))
    }

}

struct TreeReader {
    trace: PathTrace,
    depth: usize,
    max_depth: usize,
}

impl Traceable for TreeReader {
    fn trace(&mut self) -> &mut PathTrace {
        &mut self.trace
    }
}

impl TreeReader {

    fn read(buf: &[u8], max_depth: usize) -> Result<(Generic, usize), DecoderError> {
        let mut reader = Self { trace: PathTrace::new(), depth: 0, max_depth };
        let mut chunks = Chunks::new(buf);
        match reader.chunk(&mut chunks) {
            Ok(tree) => {
                debug!(tag = %tree.tag(), len = chunks.pos, "decoded tree");
                Ok((tree, chunks.pos))
            },
            Err(e) => {
                debug!(error = %e, "decoding failed");
                Err(e)
            },
        }
    }

    fn chunk(&mut self, chunks: &mut Chunks) -> Result<Generic, DecoderError> {
        if self.depth >= self.max_depth {
            return Err(self.trace.fail(DecodeError::DepthExceeded(self.max_depth)));
        }
        let (tag, payload) = chunks.next().map_err(|e| self.trace.fail(e))?;
        trace!(%tag, len = payload.len(), "chunk");
        self.depth += 1;
        let result = self.payload(tag, payload);
        self.depth -= 1;
        result
    }

    fn payload(&mut self, tag: Tag, payload: &[u8]) -> Result<Generic, DecoderError> {
        match tag {
            Tag::Bool      => Ok(Generic::Bool(self.fixed(tag, payload)? != 0)),
            Tag::Int       => Ok(Generic::Int(self.fixed(tag, payload)? as i64)),
            Tag::Int64     => Ok(Generic::Int64(self.fixed(tag, payload)? as i64)),
            Tag::UInt      => Ok(Generic::UInt(self.fixed(tag, payload)?)),
            Tag::UInt64    => Ok(Generic::UInt64(self.fixed(tag, payload)?)),
            Tag::Float64   => Ok(Generic::Float64(f64::from_bits(self.fixed(tag, payload)?))),
            Tag::Byte      => match payload {
                [b] => Ok(Generic::Byte(*b)),
                _   => Err(self.trace.fail(DecodeError::ScalarWidth { tag, len: payload.len() })),
            },
            Tag::String    => from_utf8(payload)
                .map(|s| Generic::String(s.to_owned()))
                .map_err(|e| self.trace.fail(e.into())),
            Tag::Sequence  => self.sequence(payload),
            Tag::Map       => self.map(payload),
            Tag::Struct    => self.structure(payload),
            Tag::Pointer   => self.pointer(payload),
            Tag::Interface => self.interface(payload),
            Tag::Invalid if payload.is_empty() => Ok(Generic::Invalid),
            Tag::Invalid   => Err(self.trace.fail(DecodeError::Trailing(payload.len()))),
        }
    }

    fn fixed(&self, tag: Tag, payload: &[u8]) -> Result<u64, DecoderError> {
        if payload.len() != SCALAR_WIDTH {
            return Err(self.trace.fail(DecodeError::ScalarWidth { tag, len: payload.len() }));
        }
        let mut tmp = [0u8; SCALAR_WIDTH];
        tmp.copy_from_slice(payload);
        Ok(u64::from_be_bytes(tmp))
    }

    fn sequence(&mut self, payload: &[u8]) -> Result<Generic, DecoderError> {
        let mut chunks = Chunks::new(payload);
        let exemplar = self.scoped(Segment::Exemplar, |r| r.chunk(&mut chunks))?;
        let expected = exemplar.tag();
        let mut items = Vec::new();
        while !chunks.is_empty() {
            let item = self.scoped(Segment::Element(items.len()), |r| {
                let item = r.chunk(&mut chunks)?;
                match item.tag() {
                    found if found == expected => Ok(item),
                    found => Err(r.trace.fail(DecodeError::InconsistentElementKind { expected, found })),
                }
            })?;
            items.push(item);
        }
        Ok(Generic::Sequence { exemplar: Box::new(exemplar), items })
    }

    fn map(&mut self, payload: &[u8]) -> Result<Generic, DecoderError> {
        let mut chunks = Chunks::new(payload);
        let key = self.scoped(Segment::KeyExemplar, |r| r.chunk(&mut chunks))?;
        let value = self.scoped(Segment::ValueExemplar, |r| r.chunk(&mut chunks))?;
        let (key_tag, value_tag) = (key.tag(), value.tag());
        let mut entries = Vec::new();
        while !chunks.is_empty() {
            let k = self.scoped(Segment::Entry(entries.len()), |r| {
                let k = r.chunk(&mut chunks)?;
                match k.tag() {
                    found if found == key_tag => Ok(k),
                    found => Err(r.trace.fail(DecodeError::InconsistentKeyKind { expected: key_tag, found })),
                }
            })?;
            let v = self.scoped(Segment::Value(k.to_string()), |r| {
                let v = r.chunk(&mut chunks)?;
                match v.tag() {
                    found if found == value_tag => Ok(v),
                    found if found == Tag::Interface || value_tag == Tag::Interface => Err(r.trace.fail(DecodeError::InterfaceValueUnsupported)),
                    found => Err(r.trace.fail(DecodeError::InconsistentValueKind { expected: value_tag, found })),
                }
            })?;
            entries.push((k, v));
        }
        Ok(Generic::Map { key: Box::new(key), value: Box::new(value), entries })
    }

    fn structure(&mut self, payload: &[u8]) -> Result<Generic, DecoderError> {
        let mut chunks = Chunks::new(payload);
        let mut fields: Vec<(String, Generic)> = Vec::new();
        // slot of every field name in `fields`, so repeated names overwrite in place
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut count = 0;
        while !chunks.is_empty() {
            let name = self.scoped(Segment::Entry(count), |r| match r.chunk(&mut chunks)? {
                Generic::String(name) => Ok(name),
                other => Err(r.trace.fail(DecodeError::FieldName(other.tag()))),
            })?;
            let value = self.scoped(Segment::Field(name.clone()), |r| r.chunk(&mut chunks))?;
            match slots.get(&name) {
                Some(&slot) => fields[slot].1 = value,
                None => {
                    slots.insert(name.clone(), fields.len());
                    fields.push((name, value));
                },
            }
            count += 1;
        }
        Ok(Generic::Struct(fields))
    }

    fn pointer(&mut self, payload: &[u8]) -> Result<Generic, DecoderError> {
        let mut chunks = Chunks::new(payload);
        let exemplar = self.scoped(Segment::Exemplar, |r| r.chunk(&mut chunks))?;
        let expected = exemplar.tag();
        let target = self.scoped(Segment::Pointee, |r| match r.chunk(&mut chunks)? {
            Generic::Invalid => Ok(None),
            t if t.tag() == expected => Ok(Some(Box::new(t))),
            t => Err(r.trace.fail(DecodeError::InconsistentElementKind { expected, found: t.tag() })),
        })?;
        self.finish(&chunks)?;
        Ok(Generic::Pointer { exemplar: Box::new(exemplar), target })
    }

    fn interface(&mut self, payload: &[u8]) -> Result<Generic, DecoderError> {
        let mut chunks = Chunks::new(payload);
        let inner = self.scoped(Segment::Boxed, |r| r.chunk(&mut chunks))?;
        self.finish(&chunks)?;
        Ok(Generic::Interface(Box::new(inner)))
    }

    fn finish(&self, chunks: &Chunks) -> Result<(), DecoderError> {
        match chunks.remaining() {
            0 => Ok(()),
            n => Err(self.trace.fail(DecodeError::Trailing(n))),
        }
    }

}

#[cfg(test)]
mod tests {
    use super::{decode_tree, Decoder};
    use crate::encode::encode_value;
    use crate::error::{DecodeError, Error};
    use crate::generic::Generic;
    use crate::shape::Shape;
    use crate::tag::Tag;
    use crate::value::Value;
    use std::time::{Duration, Instant};

    #[test]
    fn scalars() {
        let buf = [7 << 3 | 1, 8, 0, 0, 0, 0, 0, 0x09, 0x80, 0x77];
        assert_eq!(decode_tree(&buf).unwrap(), (Generic::Int(622_711), 10));
        let buf = [11 << 3 | 1, 1, 122];
        assert_eq!(decode_tree(&buf).unwrap(), (Generic::Byte(122), 3));
        let buf = [6 << 3 | 1, 8, 0, 0, 0, 0, 0, 0, 0, 1];
        assert_eq!(decode_tree(&buf).unwrap().0, Generic::Bool(true));
    }

    #[test]
    fn empty_sequence() {
        let buf = [4 << 3 | 1, 2, 5 << 3 | 1, 0];
        let (tree, _) = decode_tree(&buf).unwrap();
        assert_eq!(tree, Generic::Sequence { exemplar: Box::new(Generic::String(String::new())), items: Vec::new() });
        assert_eq!(tree.shape(), Shape::sequence(Shape::String));
    }

    #[test]
    fn inconsistent_elements() {
        let buf = [
            4 << 3 | 1, 15,
              5 << 3 | 1, 0,
              5 << 3 | 1, 1, b'a',
              6 << 3 | 1, 8, 0, 0, 0, 0, 0, 0, 0, 1,
        ];
        let err = decode_tree(&buf).unwrap_err();
        assert_eq!(err.path(), "/el1");
        assert_eq!(err.into_inner(), DecodeError::InconsistentElementKind { expected: Tag::String, found: Tag::Bool });
    }

    #[test]
    fn inconsistent_keys() {
        let buf = [
            1 << 3 | 1, 11,
              5 << 3 | 1, 0,
              11 << 3 | 1, 1, 0,
              11 << 3 | 1, 1, 1,
              11 << 3 | 1, 1, 2,
        ];
        let err = decode_tree(&buf).unwrap_err();
        assert_eq!(err.path(), "/key0");
        assert_eq!(err.into_inner(), DecodeError::InconsistentKeyKind { expected: Tag::String, found: Tag::Byte });
    }

    #[test]
    fn boxed_map_value() {
        let buf = [
            1 << 3 | 1, 13,
              5 << 3 | 1, 0,
              11 << 3 | 1, 1, 0,
              5 << 3 | 1, 1, b'a',
              0 << 3 | 1, 3,
                11 << 3 | 1, 1, 7,
        ];
        let err = decode_tree(&buf).unwrap_err();
        assert_eq!(err.path(), "/val[\"a\"]");
        assert_eq!(err.into_inner(), DecodeError::InterfaceValueUnsupported);
    }

    #[test]
    fn unknown_tag() {
        assert_eq!(decode_tree(&[14 << 3 | 1, 0]).unwrap_err().into_inner(), DecodeError::UnknownTag(14 << 3 | 1));
        assert_eq!(decode_tree(&[5 << 3, 0]).unwrap_err().into_inner(), DecodeError::UnknownTag(5 << 3));
        assert_eq!(decode_tree(&[5 << 3 | 4, 0, 0, 0, 0]).unwrap_err().into_inner(), DecodeError::UnknownTag(5 << 3 | 4));
    }

    #[test]
    fn truncated() {
        let buf = encode_value(&Value::String("abcd".into())).unwrap();
        for cut in 0..buf.len() {
            assert!(matches!(decode_tree(&buf[..cut]).unwrap_err().into_inner(), DecodeError::Truncated { .. }));
        }
    }

    #[test]
    fn duplicate_fields_overwrite() {
        let buf = [
            2 << 3 | 1, 18,
              5 << 3 | 1, 1, b'A', 11 << 3 | 1, 1, 1,
              5 << 3 | 1, 1, b'B', 11 << 3 | 1, 1, 2,
              5 << 3 | 1, 1, b'A', 11 << 3 | 1, 1, 3,
        ];
        assert_eq!(decode_tree(&buf).unwrap().0, Generic::Struct(vec![
            ("A".into(), Generic::Byte(3)),
            ("B".into(), Generic::Byte(2)),
        ]));
    }

    #[test]
    fn many_fields() {
        let n = 50_000;
        let mut payload = Vec::new();
        for i in 0..n {
            let name = format!("{:x}", i);
            payload.extend_from_slice(&[5 << 3 | 1, name.len() as u8]);
            payload.extend_from_slice(name.as_bytes());
            payload.extend_from_slice(&[13 << 3 | 1, 0]);
        }
        // repeat the first field at the very end
        payload.extend_from_slice(&[5 << 3 | 1, 1, b'0', 11 << 3 | 1, 1, 9]);
        let mut buf = vec![2 << 3 | 3, (payload.len() >> 16) as u8, (payload.len() >> 8) as u8, payload.len() as u8];
        buf.extend_from_slice(&payload);
        let start = Instant::now();
        let (tree, c) = decode_tree(&buf).unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(c, buf.len());
        match tree {
            Generic::Struct(fields) => {
                assert_eq!(fields.len(), n);
                assert_eq!(fields[0], ("0".to_string(), Generic::Byte(9)));
                assert_eq!(fields[n - 1], (format!("{:x}", n - 1), Generic::Invalid));
            },
            other => panic!("unexpected tree {}", other),
        }
    }

    #[test]
    fn inconsistent_values() {
        let buf = [
            1 << 3 | 1, 18,
              5 << 3 | 1, 0,
              11 << 3 | 1, 1, 0,
              5 << 3 | 1, 1, b'a',
              7 << 3 | 1, 8, 0, 0, 0, 0, 0, 0, 0, 7,
        ];
        let err = decode_tree(&buf).unwrap_err();
        assert_eq!(err.path(), "/val[\"a\"]");
        assert_eq!(err.into_inner(), DecodeError::InconsistentValueKind { expected: Tag::Byte, found: Tag::Int });
    }

    #[test]
    fn inconsistent_pointee() {
        let buf = [
            3 << 3 | 1, 5,
              5 << 3 | 1, 0,
              11 << 3 | 1, 1, 7,
        ];
        let err = decode_tree(&buf).unwrap_err();
        assert_eq!(err.path(), "/ptr");
        assert_eq!(err.into_inner(), DecodeError::InconsistentElementKind { expected: Tag::String, found: Tag::Byte });
    }

    #[test]
    fn leftovers_in_payload() {
        let buf = [
            3 << 3 | 1, 7,
              5 << 3 | 1, 0,
              5 << 3 | 1, 1, b'a',
              13 << 3 | 1, 0,
        ];
        let err = decode_tree(&buf).unwrap_err();
        assert_eq!(err.path(), "/");
        assert_eq!(err.into_inner(), DecodeError::Trailing(2));

        let buf = [
            0 << 3 | 1, 4,
              11 << 3 | 1, 1, 7,
              11 << 3 | 1,
        ];
        let err = decode_tree(&buf).unwrap_err();
        assert_eq!(err.path(), "/");
        assert_eq!(err.into_inner(), DecodeError::Trailing(1));

        let buf = [
            4 << 3 | 1, 5,
              5 << 3 | 1, 0,
              13 << 3 | 1, 1, 0,
        ];
        let err = decode_tree(&buf).unwrap_err();
        assert_eq!(err.path(), "/el0");
        assert_eq!(err.into_inner(), DecodeError::Trailing(1));
    }

    #[test]
    fn erased_shape() {
        assert!(matches!(Decoder::new(Shape::Any), Err(Error::ErasedShape)));
    }

    #[test]
    fn field_name_must_be_string() {
        let buf = [2 << 3 | 1, 6, 11 << 3 | 1, 1, 1, 11 << 3 | 1, 1, 1];
        let err = decode_tree(&buf).unwrap_err();
        assert_eq!(err.path(), "/key0");
        assert_eq!(err.into_inner(), DecodeError::FieldName(Tag::Byte));
    }

    #[test]
    fn scalar_width() {
        let buf = [8 << 3 | 1, 4, 0, 0, 0, 1];
        assert_eq!(decode_tree(&buf).unwrap_err().into_inner(), DecodeError::ScalarWidth { tag: Tag::Int64, len: 4 });
    }

    #[test]
    fn utf8() {
        let buf = [5 << 3 | 1, 2, 0xc3, 0x28];
        assert!(matches!(decode_tree(&buf).unwrap_err().into_inner(), DecodeError::Utf8(_)));
    }

    #[test]
    fn depth_limit() {
        let mut value = Value::Int(1);
        for _ in 0..20 {
            value = Value::Pointer(value.shape(), Some(Box::new(value)));
        }
        let buf = encode_value(&value).unwrap();
        let decoder = Decoder::new(value.shape()).unwrap();
        assert_eq!(decoder.decode(&buf).unwrap(), value);
        let err = decoder.with_max_depth(10).decode(&buf).unwrap_err();
        assert!(matches!(err, Error::Decode(e) if *e.inner() == DecodeError::DepthExceeded(10)));
    }

    #[test]
    fn trailing_bytes() {
        let mut buf = encode_value(&Value::Byte(1)).unwrap();
        buf.push(0);
        let decoder = Decoder::new(Shape::Byte).unwrap();
        assert!(matches!(decoder.decode(&buf), Err(Error::Decode(e)) if *e.inner() == DecodeError::Trailing(1)));
        assert_eq!(decode_tree(&buf).unwrap(), (Generic::Byte(1), 3));
    }

    #[test]
    fn reader() {
        let buf = encode_value(&Value::String("Hi there".into())).unwrap();
        let decoder = Decoder::new(Shape::String).unwrap();
        assert_eq!(decoder.decode_from_reader(&buf[..]).unwrap(), Value::String("Hi there".into()));
    }

}
