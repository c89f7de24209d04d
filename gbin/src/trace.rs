//! Breadcrumbs for error messages. Every recursive step enters a `Segment` through
//! [`Traceable::scoped`], which pops it again on every exit path. Errors are raised through
//! [`PathTrace::fail`] so they capture the path of the innermost failing value.

use crate::error::Traced;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// A named struct field
    Field(String),
    /// Position within a sequence
    Element(usize),
    /// Position of a key/value pair within a map whose key is not known yet
    Entry(usize),
    Key(String),
    Value(String),
    /// The zero value preceding container contents
    Exemplar,
    KeyExemplar,
    ValueExemplar,
    Pointee,
    Boxed,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name)   => write!(f, "field[{}]", name),
            Segment::Element(i)    => write!(f, "el{}", i),
            Segment::Entry(i)      => write!(f, "key{}", i),
            Segment::Key(k)        => write!(f, "key[{}]", k),
            Segment::Value(k)      => write!(f, "val[{}]", k),
            Segment::Exemplar      => f.write_str("zero"),
            Segment::KeyExemplar   => f.write_str("zero_key"),
            Segment::ValueExemplar => f.write_str("zero_val"),
            Segment::Pointee       => f.write_str("ptr"),
            Segment::Boxed         => f.write_str("interface"),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct PathTrace {
    segments: Vec<Segment>,
}

impl PathTrace {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn pop(&mut self) -> Option<Segment> {
        self.segments.pop()
    }

    /// Attaches the current path to `e`.
    pub fn fail<E>(&self, e: E) -> Traced<E> {
        Traced::new(e, self.to_string())
    }

}

impl fmt::Display for PathTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in self.segments.iter() {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// Implemented by the recursive walkers, which own their `PathTrace` next to their other state.
pub trait Traceable {

    fn trace(&mut self) -> &mut PathTrace;

    /// Runs `f` with `segment` on top of the trace.
    fn scoped<T, E, F>(&mut self, segment: Segment, f: F) -> Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        self.trace().push(segment);
        let result = f(self);
        self.trace().pop();
        result
    }

}

impl Traceable for PathTrace {
    fn trace(&mut self) -> &mut PathTrace {
        self
    }
}
