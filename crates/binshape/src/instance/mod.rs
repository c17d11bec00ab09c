// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mutable instances of a schema.
//!
//! An [`Instance`] owns a value tree shaped like its schema and is addressed
//! with dot paths: name segments select record fields, numeric segments index
//! array elements and bit slices (`"messages.0.length"`). Every operation
//! that walks a path resizes reference-sized arrays on the way down, so
//! indexing and assignment always see the length currently promised by the
//! referenced field; packing and sizing reconcile the whole tree the same
//! way. That is why the accessors take `&mut self`.

mod value;

pub use value::Value;
pub(crate) use value::default_value;

use crate::error::{Error, Result};
use crate::layout;
use crate::schema::reference::Frame;
use crate::schema::{ArrayLen, Schema, SchemaKind};
use std::sync::Arc;

/// A value tree bound to the schema that shapes it.
#[derive(Debug, Clone)]
pub struct Instance {
    schema: Arc<Schema>,
    value: Value,
}

// Schemas compare by identity and parametrization, values structurally.
impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.schema.id == other.schema.id
            && self.schema.config == other.schema.config
            && self.value == other.value
    }
}

impl Instance {
    /// A zeroed instance of `schema`. Reference-sized arrays start empty.
    pub fn new(schema: &Arc<Schema>) -> Result<Self> {
        Ok(Self {
            schema: Arc::clone(schema),
            value: default_value(schema)?,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The value at `path`. Scalars come back as their scalar variant, bit
    /// slices as `Value::U8`. Dynamic arrays along the path are resized to
    /// their referenced lengths first.
    pub fn get(&mut self, path: &str) -> Result<Value> {
        let segments = split_path(path)?;
        match descend(&self.schema, &mut self.value, &segments, path, &[])? {
            Place::Node(_, node) => Ok(node.clone()),
            Place::Slice(slot, _) => Ok(Value::U8(*slot)),
        }
    }

    /// Replace the value at `path`, checking shape against the schema node.
    /// Arrays must be assigned exactly their current length: the declared
    /// one when fixed, the referenced field's value when dynamic.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        let segments = split_path(path)?;
        let new = value.into();
        match descend(&self.schema, &mut self.value, &segments, path, &[])? {
            Place::Node(schema, node) => assign(&schema, node, new),
            Place::Slice(slot, width) => {
                *slot = slice_value(&new, width)?;
                Ok(())
            }
        }
    }

    /// The element count of the array or bit unit at `path`.
    pub fn len(&mut self, path: &str) -> Result<usize> {
        match self.get(path)? {
            Value::Array(elements) => Ok(elements.len()),
            Value::Bits(parts) => Ok(parts.len()),
            other => Err(Error::TypeMismatch {
                expected: "array".into(),
                got: other.type_name().into(),
            }),
        }
    }

    /// One element of the array (or one bit slice) at `path`. Negative
    /// indices count from the end of the resolved length.
    pub fn elem(&mut self, path: &str, index: isize) -> Result<Value> {
        match self.get(path)? {
            Value::Array(elements) => {
                let i = wrap_index(index, elements.len())?;
                Ok(elements[i].clone())
            }
            Value::Bits(parts) => {
                let i = wrap_index(index, parts.len())?;
                Ok(Value::U8(parts[i]))
            }
            other => Err(Error::TypeMismatch {
                expected: "array".into(),
                got: other.type_name().into(),
            }),
        }
    }

    /// Replace one element of the array (or bit slice) at `path`. Negative
    /// indices count from the end.
    pub fn set_elem(&mut self, path: &str, index: isize, value: impl Into<Value>) -> Result<()> {
        let segments = split_path(path)?;
        let (node_schema, node) = node_at(&self.schema, &mut self.value, &segments, path)?;
        let value = value.into();
        match (&node_schema.kind, node) {
            (SchemaKind::Array(desc), Value::Array(elements)) => {
                let i = wrap_index(index, elements.len())?;
                if !value.matches(&desc.element.kind) {
                    return Err(Error::TypeMismatch {
                        expected: desc.element.name.clone(),
                        got: value.type_name().into(),
                    });
                }
                elements[i] = value;
                Ok(())
            }
            (SchemaKind::Bits(bit_layout), Value::Bits(parts)) => {
                let i = wrap_index(index, parts.len())?;
                parts[i] = slice_value(&value, bit_layout.widths[i])?;
                Ok(())
            }
            (_, node) => Err(Error::TypeMismatch {
                expected: "array".into(),
                got: node.type_name().into(),
            }),
        }
    }

    /// Whole-array assignment against the *resolved* current length. The
    /// array is trued up against its length field first; a count mismatch is
    /// `SizeMismatch`. On a bit unit the values are per-slice integers,
    /// padding slice included, each checked against its width.
    pub fn set_array(&mut self, path: &str, values: Vec<Value>) -> Result<()> {
        let segments = split_path(path)?;
        let (node_schema, node) = node_at(&self.schema, &mut self.value, &segments, path)?;
        match (&node_schema.kind, node) {
            (SchemaKind::Array(desc), Value::Array(elements)) => {
                if values.len() != elements.len() {
                    return Err(Error::SizeMismatch {
                        expected: elements.len(),
                        got: values.len(),
                    });
                }
                if let Some(bad) = values.iter().find(|v| !v.matches(&desc.element.kind)) {
                    return Err(Error::TypeMismatch {
                        expected: desc.element.name.clone(),
                        got: bad.type_name().to_string(),
                    });
                }
                *elements = values;
                Ok(())
            }
            (SchemaKind::Bits(bit_layout), Value::Bits(parts)) => {
                if values.len() != bit_layout.widths.len() {
                    return Err(Error::SizeMismatch {
                        expected: bit_layout.widths.len(),
                        got: values.len(),
                    });
                }
                let mut checked = Vec::with_capacity(values.len());
                for (value, width) in values.iter().zip(&bit_layout.widths) {
                    checked.push(slice_value(value, *width)?);
                }
                *parts = checked;
                Ok(())
            }
            (_, node) => Err(Error::TypeMismatch {
                expected: "array".into(),
                got: node.type_name().into(),
            }),
        }
    }

    /// Assign a whole bit unit from its encoded byte, splitting it into
    /// slices (padding included).
    pub fn set_byte(&mut self, path: &str, byte: u8) -> Result<()> {
        let segments = split_path(path)?;
        let (node_schema, node) = node_at(&self.schema, &mut self.value, &segments, path)?;
        match (&node_schema.kind, node) {
            (SchemaKind::Bits(bit_layout), Value::Bits(parts)) => {
                *parts = layout::unpack_bits(bit_layout, byte);
                Ok(())
            }
            (_, node) => Err(Error::TypeMismatch {
                expected: "bits".into(),
                got: node.type_name().into(),
            }),
        }
    }

    /// Encoded size in bytes. Resizes reference-sized arrays to match their
    /// length fields, so the value tree reflects what would be packed.
    pub fn size(&mut self) -> Result<usize> {
        layout::sized(&self.schema, &mut self.value, &[])
    }

    /// Encode the whole tree to bytes.
    pub fn pack(&mut self) -> Result<Vec<u8>> {
        let total = layout::sized(&self.schema, &mut self.value, &[])?;
        let mut buf = vec![0u8; total];
        let end = layout::pack_value(&self.schema, &mut self.value, &[], &mut buf, 0)?;
        debug_assert_eq!(end, total);
        Ok(buf)
    }

    /// Encode into a caller-owned buffer starting at `offset`, returning the
    /// offset just past the written bytes. The buffer must hold at least
    /// `size()` bytes from `offset`.
    pub fn pack_into(&mut self, buf: &mut [u8], offset: usize) -> Result<usize> {
        layout::sized(&self.schema, &mut self.value, &[])?;
        layout::pack_value(&self.schema, &mut self.value, &[], buf, offset)
    }

    /// Decode an instance of `schema` from the front of `buf`. Trailing
    /// bytes are ignored.
    pub fn unpack(schema: &Arc<Schema>, buf: &[u8]) -> Result<Self> {
        Ok(Self::unpack_from(schema, buf, 0)?.0)
    }

    /// Decode an instance of `schema` at `offset`, returning it with the
    /// offset just past the consumed bytes.
    pub fn unpack_from(schema: &Arc<Schema>, buf: &[u8], offset: usize) -> Result<(Self, usize)> {
        let mut offset = offset;
        let value = layout::unpack_value(schema, buf, &mut offset, &[])?;
        Ok((
            Self {
                schema: Arc::clone(schema),
                value,
            },
            offset,
        ))
    }
}

fn split_path(path: &str) -> Result<Vec<&str>> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(Error::FieldNotFound(path.to_string()));
    }
    Ok(segments)
}

fn wrap_index(index: isize, len: usize) -> Result<usize> {
    let wrapped = if index < 0 {
        index + len as isize
    } else {
        index
    };
    if wrapped < 0 || wrapped as usize >= len {
        return Err(Error::IndexOutOfRange { index, len });
    }
    Ok(wrapped as usize)
}

/// Resolved location of a dot path: a whole value node, or one slice of a
/// bit unit together with its declared width.
enum Place<'v> {
    Node(Arc<Schema>, &'v mut Value),
    Slice(&'v mut u8, u8),
}

/// Walk `segments` down the tree, resizing every reference-sized array on
/// the way so indexing always sees the resolved length. `scope` carries one
/// frame per ancestor record, exposing the siblings declared before the
/// branch being walked, exactly as the layout walkers do.
fn descend<'v>(
    schema: &Arc<Schema>,
    value: &'v mut Value,
    segments: &[&str],
    path: &str,
    scope: &[Frame<'_>],
) -> Result<Place<'v>> {
    if let (SchemaKind::Array(desc), Value::Array(elements)) = (&schema.kind, &mut *value) {
        let len = layout::resolve_len(&desc.len, scope)?;
        layout::fit_elements(elements, len, &desc.element)?;
    }
    let Some((head, rest)) = segments.split_first() else {
        return Ok(Place::Node(Arc::clone(schema), value));
    };
    match (&schema.kind, value) {
        (SchemaKind::Record(fields), Value::Record(children)) => {
            let index = fields
                .iter()
                .position(|f| f.name == *head)
                .ok_or_else(|| Error::FieldNotFound(path.to_string()))?;
            let effective = schema.field_effective(&fields[index])?;
            let (done, tail) = children.split_at_mut(index);
            let mut inner: Vec<Frame> = scope.to_vec();
            inner.push(Frame {
                schema: Arc::clone(schema),
                visible: done,
            });
            descend(&effective, &mut tail[0], rest, path, &inner)
        }
        (SchemaKind::Array(desc), Value::Array(elements)) => {
            let index = parse_index(head, path)?;
            let len = elements.len();
            let element = elements.get_mut(index).ok_or(Error::IndexOutOfRange {
                index: index as isize,
                len,
            })?;
            descend(&desc.element, element, rest, path, scope)
        }
        (SchemaKind::Bits(bit_layout), Value::Bits(parts)) => {
            if !rest.is_empty() {
                return Err(Error::FieldNotFound(path.to_string()));
            }
            let index = parse_index(head, path)?;
            let len = parts.len();
            let slot = parts.get_mut(index).ok_or(Error::IndexOutOfRange {
                index: index as isize,
                len,
            })?;
            Ok(Place::Slice(slot, bit_layout.widths[index]))
        }
        _ => Err(Error::FieldNotFound(path.to_string())),
    }
}

/// Navigate to the whole node at `segments`, for the element-wise mutators.
fn node_at<'v>(
    schema: &Arc<Schema>,
    value: &'v mut Value,
    segments: &[&str],
    path: &str,
) -> Result<(Arc<Schema>, &'v mut Value)> {
    match descend(schema, value, segments, path, &[])? {
        Place::Node(node_schema, node) => Ok((node_schema, node)),
        Place::Slice(..) => Err(Error::TypeMismatch {
            expected: "array".into(),
            got: "bit slice".into(),
        }),
    }
}

/// Range-check an integer assignment against a bit slice's width. Negative
/// values and values of `2^width` or more are out of range.
fn slice_value(value: &Value, width: u8) -> Result<u8> {
    let v = value.as_int().ok_or_else(|| Error::TypeMismatch {
        expected: "integer".into(),
        got: value.type_name().into(),
    })?;
    if v < 0 || v >= (1i64 << width) {
        return Err(Error::OutOfRange { value: v, width });
    }
    Ok(v as u8)
}

fn parse_index(segment: &str, path: &str) -> Result<usize> {
    segment
        .parse::<usize>()
        .map_err(|_| Error::FieldNotFound(path.to_string()))
}

/// Type-check `new` against `schema` and store it.
fn assign(schema: &Arc<Schema>, value: &mut Value, new: Value) -> Result<()> {
    if !new.matches(&schema.kind) {
        return Err(Error::TypeMismatch {
            expected: match &schema.kind {
                SchemaKind::Primitive(kind) => kind.type_name().to_string(),
                _ => schema.name.clone(),
            },
            got: new.type_name().to_string(),
        });
    }
    match (&schema.kind, &new) {
        (SchemaKind::Record(fields), Value::Record(children)) => {
            if children.len() != fields.len() {
                return Err(Error::SizeMismatch {
                    expected: fields.len(),
                    got: children.len(),
                });
            }
        }
        (SchemaKind::Array(desc), Value::Array(elements)) => {
            // A dynamic array was already trued up against its length field
            // on the way down, so its storage length is the resolved one.
            let expected = match &desc.len {
                ArrayLen::Fixed(n) => *n,
                ArrayLen::Ref(_) => match &*value {
                    Value::Array(current) => current.len(),
                    _ => elements.len(),
                },
            };
            if elements.len() != expected {
                return Err(Error::SizeMismatch {
                    expected,
                    got: elements.len(),
                });
            }
            if let Some(bad) = elements.iter().find(|e| !e.matches(&desc.element.kind)) {
                return Err(Error::TypeMismatch {
                    expected: desc.element.name.clone(),
                    got: bad.type_name().to_string(),
                });
            }
        }
        (SchemaKind::Bits(layout), Value::Bits(parts)) => {
            if parts.len() != layout.widths.len() {
                return Err(Error::SizeMismatch {
                    expected: layout.widths.len(),
                    got: parts.len(),
                });
            }
            for (part, width) in parts.iter().zip(&layout.widths) {
                if u16::from(*part) >= (1u16 << width) {
                    return Err(Error::OutOfRange {
                        value: i64::from(*part),
                        width: *width,
                    });
                }
            }
        }
        _ => {}
    }
    *value = new;
    Ok(())
}
