// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime values carried by instances.

use crate::error::{Error, Result};
use crate::schema::{ArrayLen, PrimitiveKind, Schema, SchemaKind};

/// One node of an instance's value tree, parallel to its schema's shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    /// Single encoded byte, kept distinct from `U8` so character fields
    /// cannot be used as array lengths.
    Char(u8),
    /// Record children in field declaration order.
    Record(Vec<Value>),
    Array(Vec<Value>),
    /// One entry per bit slice, padding slice included.
    Bits(Vec<u8>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::Char(_) => "char",
            Self::Record(_) => "record",
            Self::Array(_) => "array",
            Self::Bits(_) => "bits",
        }
    }

    /// Integer reading for length references. `Char` deliberately reads as
    /// `None`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::U8(v) => Some(i64::from(*v)),
            Self::U16(v) => Some(i64::from(*v)),
            Self::U32(v) => Some(i64::from(*v)),
            Self::U64(v) => i64::try_from(*v).ok(),
            Self::I8(v) => Some(i64::from(*v)),
            Self::I16(v) => Some(i64::from(*v)),
            Self::I32(v) => Some(i64::from(*v)),
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Raw bit pattern of a scalar, sign-extended to 64 bits. The codec
    /// truncates to the primitive's width.
    pub(crate) fn to_bits(&self) -> Option<u64> {
        match self {
            Self::U8(v) | Self::Char(v) => Some(u64::from(*v)),
            Self::U16(v) => Some(u64::from(*v)),
            Self::U32(v) => Some(u64::from(*v)),
            Self::U64(v) => Some(*v),
            Self::I8(v) => Some(*v as i64 as u64),
            Self::I16(v) => Some(*v as i64 as u64),
            Self::I32(v) => Some(*v as i64 as u64),
            Self::I64(v) => Some(*v as u64),
            _ => None,
        }
    }

    /// Rebuild a scalar of `kind` from its raw bit pattern.
    pub(crate) fn from_bits(kind: PrimitiveKind, bits: u64) -> Value {
        match kind {
            PrimitiveKind::U8 => Value::U8(bits as u8),
            PrimitiveKind::U16 => Value::U16(bits as u16),
            PrimitiveKind::U32 => Value::U32(bits as u32),
            PrimitiveKind::U64 => Value::U64(bits),
            PrimitiveKind::I8 => Value::I8(bits as u8 as i8),
            PrimitiveKind::I16 => Value::I16(bits as u16 as i16),
            PrimitiveKind::I32 => Value::I32(bits as u32 as i32),
            PrimitiveKind::I64 => Value::I64(bits as i64),
            PrimitiveKind::Char => Value::Char(bits as u8),
        }
    }

    /// The scalar kind of this value, if it is a scalar.
    pub(crate) fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Self::U8(_) => Some(PrimitiveKind::U8),
            Self::U16(_) => Some(PrimitiveKind::U16),
            Self::U32(_) => Some(PrimitiveKind::U32),
            Self::U64(_) => Some(PrimitiveKind::U64),
            Self::I8(_) => Some(PrimitiveKind::I8),
            Self::I16(_) => Some(PrimitiveKind::I16),
            Self::I32(_) => Some(PrimitiveKind::I32),
            Self::I64(_) => Some(PrimitiveKind::I64),
            Self::Char(_) => Some(PrimitiveKind::Char),
            _ => None,
        }
    }

    /// Whether this value has the shape `kind` expects at its root.
    pub(crate) fn matches(&self, kind: &SchemaKind) -> bool {
        match kind {
            SchemaKind::Primitive(prim) => self.primitive_kind() == Some(*prim),
            SchemaKind::Record(_) => matches!(self, Value::Record(_)),
            SchemaKind::Array(_) => matches!(self, Value::Array(_)),
            SchemaKind::Bits(_) => matches!(self, Value::Bits(_)),
        }
    }
}

/// The zeroed value tree for `schema`. Reference-sized arrays start empty.
pub(crate) fn default_value(schema: &Schema) -> Result<Value> {
    match &schema.kind {
        SchemaKind::Primitive(kind) => Ok(Value::from_bits(*kind, 0)),
        SchemaKind::Record(fields) => {
            let mut children = Vec::with_capacity(fields.len());
            for field in fields {
                let effective = schema.field_effective(field)?;
                children.push(default_value(&effective)?);
            }
            Ok(Value::Record(children))
        }
        SchemaKind::Array(desc) => {
            let len = match &desc.len {
                ArrayLen::Fixed(n) => *n,
                ArrayLen::Ref(_) => 0,
            };
            let mut elements = Vec::with_capacity(len);
            for _ in 0..len {
                elements.push(default_value(&desc.element)?);
            }
            Ok(Value::Array(elements))
        }
        SchemaKind::Bits(layout) => Ok(Value::Bits(vec![0; layout.widths.len()])),
    }
}

macro_rules! impl_value_conv {
    ($($variant:ident => $ty:ty),* $(,)?) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }

        impl TryFrom<&Value> for $ty {
            type Error = Error;

            fn try_from(value: &Value) -> Result<$ty> {
                match value {
                    Value::$variant(v) => Ok(*v),
                    other => Err(Error::TypeMismatch {
                        expected: stringify!($ty).into(),
                        got: other.type_name().into(),
                    }),
                }
            }
        }
    )*};
}

impl_value_conv! {
    U8 => u8,
    U16 => u16,
    U32 => u32,
    U64 => u64,
    I8 => i8,
    I16 => i16,
    I32 => i32,
    I64 => i64,
}
