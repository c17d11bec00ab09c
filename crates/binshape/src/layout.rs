// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Size, pack and unpack walkers.
//!
//! All three walkers recurse over a schema and a value tree in lockstep,
//! threading a stack of scope frames so reference-sized arrays can read the
//! current value of the field they point at. Frames only ever expose fields
//! declared before the branch being walked, which is what makes resolution
//! total: by the time an array's length is needed, its target has already
//! been sized, packed or decoded.
//!
//! Sizing and packing take the value tree mutably. Both resize every
//! reference-sized array to its resolved length first, so the reported size,
//! the packed bytes and the in-memory tree always agree.

use crate::error::{Error, Result};
use crate::instance::{default_value, Value};
use crate::schema::reference::{self, Frame};
use crate::schema::{ArrayLen, BitLayout, Schema, SchemaKind};
use crate::wire;
use std::sync::Arc;

fn kind_name(kind: &SchemaKind) -> &'static str {
    match kind {
        SchemaKind::Primitive(kind) => kind.type_name(),
        SchemaKind::Record(_) => "record",
        SchemaKind::Array(_) => "array",
        SchemaKind::Bits(_) => "bits",
    }
}

fn mismatch(schema: &Schema, value: &Value) -> Error {
    Error::TypeMismatch {
        expected: kind_name(&schema.kind).to_string(),
        got: value.type_name().to_string(),
    }
}

/// Encoded size of `value` under `schema`, resizing reference-sized arrays
/// to their currently referenced lengths.
pub(crate) fn sized(schema: &Arc<Schema>, value: &mut Value, scope: &[Frame<'_>]) -> Result<usize> {
    match &schema.kind {
        SchemaKind::Primitive(kind) => {
            if !value.matches(&schema.kind) {
                return Err(mismatch(schema, value));
            }
            Ok(kind.width())
        }
        SchemaKind::Record(fields) => {
            let Value::Record(children) = value else {
                return Err(mismatch(schema, value));
            };
            if children.len() != fields.len() {
                return Err(Error::SizeMismatch {
                    expected: fields.len(),
                    got: children.len(),
                });
            }
            let mut total = 0;
            for i in 0..fields.len() {
                let effective = schema.field_effective(&fields[i])?;
                let (done, rest) = children.split_at_mut(i);
                let mut inner: Vec<Frame> = scope.to_vec();
                inner.push(Frame {
                    schema: Arc::clone(schema),
                    visible: done,
                });
                total += sized(&effective, &mut rest[0], &inner)?;
            }
            Ok(total)
        }
        SchemaKind::Array(desc) => {
            let len = resolve_len(&desc.len, scope)?;
            let Value::Array(elements) = value else {
                return Err(mismatch(schema, value));
            };
            fit_elements(elements, len, &desc.element)?;
            let mut total = 0;
            for element in elements.iter_mut() {
                total += sized(&desc.element, element, scope)?;
            }
            Ok(total)
        }
        SchemaKind::Bits(layout) => {
            let Value::Bits(parts) = value else {
                return Err(mismatch(schema, value));
            };
            if parts.len() != layout.widths.len() {
                return Err(Error::SizeMismatch {
                    expected: layout.widths.len(),
                    got: parts.len(),
                });
            }
            Ok(1)
        }
    }
}

/// Encode `value` at `offset`, returning the offset just past the written
/// bytes. Callers size first; the buffer must already be large enough.
pub(crate) fn pack_value(
    schema: &Arc<Schema>,
    value: &mut Value,
    scope: &[Frame<'_>],
    buf: &mut [u8],
    offset: usize,
) -> Result<usize> {
    match &schema.kind {
        SchemaKind::Primitive(kind) => {
            if !value.matches(&schema.kind) {
                return Err(mismatch(schema, value));
            }
            let bits = value.to_bits().ok_or_else(|| mismatch(schema, value))?;
            wire::encode(*kind, schema.endianness(), bits, buf, offset)
        }
        SchemaKind::Record(fields) => {
            let Value::Record(children) = value else {
                return Err(mismatch(schema, value));
            };
            if children.len() != fields.len() {
                return Err(Error::SizeMismatch {
                    expected: fields.len(),
                    got: children.len(),
                });
            }
            let mut offset = offset;
            for i in 0..fields.len() {
                let effective = schema.field_effective(&fields[i])?;
                let (done, rest) = children.split_at_mut(i);
                let mut inner: Vec<Frame> = scope.to_vec();
                inner.push(Frame {
                    schema: Arc::clone(schema),
                    visible: done,
                });
                offset = pack_value(&effective, &mut rest[0], &inner, buf, offset)?;
            }
            Ok(offset)
        }
        SchemaKind::Array(desc) => {
            let len = resolve_len(&desc.len, scope)?;
            let Value::Array(elements) = value else {
                return Err(mismatch(schema, value));
            };
            fit_elements(elements, len, &desc.element)?;
            let mut offset = offset;
            for element in elements.iter_mut() {
                offset = pack_value(&desc.element, element, scope, buf, offset)?;
            }
            Ok(offset)
        }
        SchemaKind::Bits(layout) => {
            let Value::Bits(parts) = value else {
                return Err(mismatch(schema, value));
            };
            let byte = pack_bits(layout, parts)?;
            if offset >= buf.len() {
                return Err(Error::BufferUnderflow { need: 1, have: 0 });
            }
            buf[offset] = byte;
            Ok(offset + 1)
        }
    }
}

/// Decode one value of `schema` at `*offset`, advancing the cursor. Bytes
/// past the decoded region are left untouched.
pub(crate) fn unpack_value(
    schema: &Arc<Schema>,
    buf: &[u8],
    offset: &mut usize,
    scope: &[Frame<'_>],
) -> Result<Value> {
    match &schema.kind {
        SchemaKind::Primitive(kind) => {
            let (bits, next) = wire::decode(*kind, schema.endianness(), buf, *offset)?;
            *offset = next;
            Ok(Value::from_bits(*kind, bits))
        }
        SchemaKind::Record(fields) => {
            let mut children: Vec<Value> = Vec::with_capacity(fields.len());
            for field in fields {
                let effective = schema.field_effective(field)?;
                let child = {
                    let mut inner: Vec<Frame> = scope.to_vec();
                    inner.push(Frame {
                        schema: Arc::clone(schema),
                        visible: &children,
                    });
                    unpack_value(&effective, buf, offset, &inner)?
                };
                children.push(child);
            }
            Ok(Value::Record(children))
        }
        SchemaKind::Array(desc) => {
            let len = resolve_len(&desc.len, scope)?;
            // A referenced length was itself decoded from the buffer, so it
            // cannot be trusted: every element consumes at least one byte,
            // which bounds the claim before any allocation happens.
            if matches!(desc.len, ArrayLen::Ref(_)) {
                let have = buf.len().saturating_sub(*offset);
                if len > have {
                    return Err(Error::BufferUnderflow { need: len, have });
                }
            }
            let mut elements = Vec::with_capacity(len);
            for _ in 0..len {
                elements.push(unpack_value(&desc.element, buf, offset, scope)?);
            }
            Ok(Value::Array(elements))
        }
        SchemaKind::Bits(layout) => {
            let byte = *buf.get(*offset).ok_or(Error::BufferUnderflow {
                need: 1,
                have: 0,
            })?;
            *offset += 1;
            Ok(Value::Bits(unpack_bits(layout, byte)))
        }
    }
}

pub(crate) fn resolve_len(len: &ArrayLen, scope: &[Frame<'_>]) -> Result<usize> {
    match len {
        ArrayLen::Fixed(n) => Ok(*n),
        ArrayLen::Ref(path) => reference::resolve(path, scope),
    }
}

/// Grow or shrink `elements` to `len`, new slots taking the element default.
pub(crate) fn fit_elements(
    elements: &mut Vec<Value>,
    len: usize,
    element: &Arc<Schema>,
) -> Result<()> {
    if elements.len() > len {
        elements.truncate(len);
    }
    while elements.len() < len {
        elements.push(default_value(element)?);
    }
    Ok(())
}

/// Compose one byte from per-slice values, most significant slice first.
pub(crate) fn pack_bits(layout: &BitLayout, parts: &[u8]) -> Result<u8> {
    if parts.len() != layout.widths.len() {
        return Err(Error::SizeMismatch {
            expected: layout.widths.len(),
            got: parts.len(),
        });
    }
    let mut byte = 0u8;
    let mut shift = 8u8;
    for (part, width) in parts.iter().zip(&layout.widths) {
        if u16::from(*part) >= (1u16 << width) {
            return Err(Error::OutOfRange {
                value: i64::from(*part),
                width: *width,
            });
        }
        shift -= width;
        byte |= part << shift;
    }
    Ok(byte)
}

/// Split one byte into per-slice values, most significant slice first.
pub(crate) fn unpack_bits(layout: &BitLayout, byte: u8) -> Vec<u8> {
    let mut parts = Vec::with_capacity(layout.widths.len());
    let mut shift = 8u8;
    for width in &layout.widths {
        shift -= width;
        let mask = ((1u16 << width) - 1) as u8;
        parts.push((byte >> shift) & mask);
    }
    parts
}
