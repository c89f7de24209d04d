//! Turns a schema-less [`Generic`] tree into a [`Value`] of a requested [`Shape`].
//!
//! Integers convert freely within their family as long as the value fits the target width.
//! Absent values (`Invalid`) become the zero value of whatever shape is requested, and interface
//! boxes are transparent unless the target is an any-slot itself.

use crate::error::{ReconcileError, ReconcilerError};
use crate::generic::Generic;
use crate::shape::Shape;
use crate::trace::{PathTrace, Segment, Traceable};
use crate::value::{Key, Value};
use std::collections::BTreeMap;
use std::convert::TryFrom;
use tracing::{debug, trace};

pub fn reconcile(tree: &Generic, shape: &Shape) -> Result<Value, ReconcilerError> {
    let mut reconciler = Reconciler { trace: PathTrace::new() };
    reconciler.visit(tree, shape).map_err(|e| {
        debug!(error = %e, %shape, "reconciliation failed");
        e
    })
}

struct Reconciler {
    trace: PathTrace,
}

impl Traceable for Reconciler {
    fn trace(&mut self) -> &mut PathTrace {
        &mut self.trace
    }
}

impl Reconciler {

    fn visit(&mut self, tree: &Generic, shape: &Shape) -> Result<Value, ReconcilerError> {
        match (tree, shape) {
            (Generic::Invalid, shape) => Ok(shape.zero()),
            (Generic::Interface(inner), Shape::Any) => match inner.as_ref() {
                Generic::Invalid => Ok(Value::Any(None)),
                inner => {
                    let natural = inner.shape();
                    let value = self.scoped(Segment::Boxed, |r| r.visit(inner, &natural))?;
                    Ok(Value::Any(Some(Box::new(value))))
                },
            },
            (Generic::Interface(inner), shape) => self.scoped(Segment::Boxed, |r| r.visit(inner, shape)),
            (tree, Shape::Any) => {
                let value = self.visit(tree, &tree.shape())?;
                Ok(Value::Any(Some(Box::new(value))))
            },
            (Generic::Sequence { items, .. }, Shape::Sequence(element)) => {
                let mut values = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    values.push(self.scoped(Segment::Element(i), |r| r.visit(item, element))?);
                }
                Ok(Value::Sequence((**element).clone(), values))
            },
            (Generic::Map { entries, .. }, Shape::Map(key, value)) => self.map(entries, key, value),
            (Generic::Struct(fields), Shape::Struct(targets)) => self.structure(fields, targets),
            (Generic::Pointer { target, .. }, Shape::Pointer(pointee)) => match target {
                None => Ok(Value::Pointer((**pointee).clone(), None)),
                Some(target) => {
                    let value = self.scoped(Segment::Pointee, |r| r.visit(target, pointee))?;
                    Ok(Value::Pointer((**pointee).clone(), Some(Box::new(value))))
                },
            },
            (tree, shape) => self.scalar(tree, shape),
        }
    }

    fn map(&mut self, entries: &[(Generic, Generic)], key: &Shape, value: &Shape) -> Result<Value, ReconcilerError> {
        if !key.is_comparable() {
            return Err(self.trace.fail(ReconcileError::IllegalKeyType(key.to_string())));
        }
        let mut map = BTreeMap::new();
        for (k, v) in entries {
            let label = k.to_string();
            let converted = self.scoped(Segment::Key(label.clone()), |r| {
                let converted = r.visit(k, key)?;
                Key::try_from(converted).map_err(|other| r.trace.fail(ReconcileError::IllegalKeyType(other.shape().to_string())))
            })?;
            let v = self.scoped(Segment::Value(label), |r| r.visit(v, value))?;
            map.insert(converted, v);
        }
        Ok(Value::Map(key.clone(), value.clone(), map))
    }

    fn structure(&mut self, fields: &[(String, Generic)], targets: &[(String, Shape)]) -> Result<Value, ReconcilerError> {
        let mut values: Vec<(String, Value)> = targets.iter().map(|(name, shape)| (name.clone(), shape.zero())).collect();
        for (name, tree) in fields {
            let i = self.scoped(Segment::Field(name.clone()), |r| {
                let i = targets.iter().position(|(n, _)| n == name)
                    .ok_or_else(|| r.trace.fail(ReconcileError::FieldNotFoundInTarget(name.clone())))?;
                values[i].1 = r.visit(tree, &targets[i].1)?;
                Ok(i)
            })?;
            trace!(field = %name, index = i, "reconciled field");
        }
        Ok(Value::Struct(values))
    }

    fn scalar(&self, tree: &Generic, shape: &Shape) -> Result<Value, ReconcilerError> {
        let found = tree.tag();
        let value = match (tree, shape) {
            (Generic::Bool(v), Shape::Bool)       => Value::Bool(*v),
            (Generic::Float64(v), Shape::Float64) => Value::Float64(*v),
            (Generic::String(v), Shape::String)   => Value::String(v.clone()),
            (tree, shape) if found.is_integer() && shape.tag().is_integer() => {
                let n = integer(tree).unwrap_or_default();
                let unconvertible = || self.trace.fail(ReconcileError::UnconvertibleScalar { from: found, to: shape.to_string() });
                match shape {
                    Shape::Int    => Value::Int(i64::try_from(n).map_err(|_| unconvertible())?),
                    Shape::Int64  => Value::Int64(i64::try_from(n).map_err(|_| unconvertible())?),
                    Shape::UInt   => Value::UInt(u64::try_from(n).map_err(|_| unconvertible())?),
                    Shape::UInt64 => Value::UInt64(u64::try_from(n).map_err(|_| unconvertible())?),
                    Shape::Byte   => Value::Byte(u8::try_from(n).map_err(|_| unconvertible())?),
                    _ => return Err(unconvertible()),
                }
            },
            _ => return Err(self.trace.fail(ReconcileError::KindMismatch { expected: shape.to_string(), found })),
        };
        Ok(value)
    }

}

fn integer(tree: &Generic) -> Option<i128> {
    match *tree {
        Generic::Int(v)    => Some(v.into()),
        Generic::Int64(v)  => Some(v.into()),
        Generic::UInt(v)   => Some(v.into()),
        Generic::UInt64(v) => Some(v.into()),
        Generic::Byte(v)   => Some(v.into()),
        _ => None,
    }
}
