// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema descriptors: the immutable blueprint a declaration compiles into.
//!
//! A [`Schema`] couples a stable identity, a structural kind and a validated
//! configuration. Identity is assigned once at first definition; applying a
//! configuration never mutates a schema, it yields a (registry-cached)
//! sibling specialization under the same identity.

use crate::config::{Condition, Config, ConfigValue, ENDIANNESS};
use crate::error::{Error, Result};
use crate::registry::{self, SchemaId};
use crate::schema::reference::FieldPath;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

/// Byte order of a primitive leaf. Network order is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endianness {
    #[default]
    Big,
    Little,
}

/// Fixed-width scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Char,
}

impl PrimitiveKind {
    /// Encoded width in bytes.
    pub fn width(&self) -> usize {
        match self {
            Self::U8 | Self::I8 | Self::Char => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 => 4,
            Self::U64 | Self::I64 => 8,
        }
    }

    /// Whether the kind can supply an array length.
    pub fn is_integer(&self) -> bool {
        !matches!(self, Self::Char)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Char => "char",
        }
    }
}

const ALL_PRIMITIVES: [PrimitiveKind; 9] = [
    PrimitiveKind::U8,
    PrimitiveKind::U16,
    PrimitiveKind::U32,
    PrimitiveKind::U64,
    PrimitiveKind::I8,
    PrimitiveKind::I16,
    PrimitiveKind::I32,
    PrimitiveKind::I64,
    PrimitiveKind::Char,
];

/// A per-field configuration override, captured unevaluated at declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Literal value applied to the field's schema.
    Literal(ConfigValue),
    /// Named parameter resolved through the owning record's configuration.
    Param(String),
}

/// One entry of a record's ordered field table.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub schema: Arc<Schema>,
    /// `(config key, override)` pairs applied when the field's effective
    /// schema is resolved.
    pub patch: Vec<(String, Patch)>,
}

/// Length source of an array schema.
#[derive(Debug, Clone)]
pub enum ArrayLen {
    /// Baked-in constant.
    Fixed(usize),
    /// Resolved at use time from a sibling field's current value.
    Ref(FieldPath),
}

#[derive(Debug, Clone)]
pub struct ArrayDescriptor {
    pub element: Arc<Schema>,
    pub len: ArrayLen,
}

/// Ordered sub-byte slices, padding slice included.
#[derive(Debug, Clone)]
pub struct BitLayout {
    /// All slice widths in declaration order; sums to exactly 8.
    pub widths: Vec<u8>,
    /// Number of declared slices (widths beyond this index are padding).
    pub declared: usize,
}

#[derive(Debug, Clone)]
pub enum SchemaKind {
    Primitive(PrimitiveKind),
    Record(Vec<FieldDescriptor>),
    Array(ArrayDescriptor),
    Bits(BitLayout),
}

/// An immutable schema definition.
#[derive(Debug)]
pub struct Schema {
    pub id: SchemaId,
    pub name: String,
    pub kind: SchemaKind,
    pub config: Config,
}

fn endianness_condition() -> Condition {
    // Both members validate their own default, so this cannot fail.
    Condition::set(
        vec![
            ConfigValue::Endian(Endianness::Big),
            ConfigValue::Endian(Endianness::Little),
        ],
        ConfigValue::Endian(Endianness::Big),
    )
    .unwrap_or_else(|_| unreachable!("endianness default is a member of its set"))
}

static PRIMITIVES: OnceLock<Vec<Arc<Schema>>> = OnceLock::new();

impl Schema {
    /// The canonical schema for a scalar kind. One base per kind per process,
    /// so differently-derived references to the same primitive share identity.
    pub fn primitive(kind: PrimitiveKind) -> Arc<Schema> {
        let table = PRIMITIVES.get_or_init(|| {
            ALL_PRIMITIVES
                .iter()
                .map(|&kind| {
                    let mut conditions = BTreeMap::new();
                    conditions.insert(ENDIANNESS.to_string(), endianness_condition());
                    let schema = Schema {
                        id: SchemaId::mint(),
                        name: kind.type_name().to_string(),
                        kind: SchemaKind::Primitive(kind),
                        config: Config::new(conditions),
                    };
                    registry::global()
                        .register_base(schema)
                        .unwrap_or_else(|_| unreachable!("fresh identity cannot collide"))
                })
                .collect()
        });
        let index = ALL_PRIMITIVES
            .iter()
            .position(|&k| k == kind)
            .unwrap_or_else(|| unreachable!("every kind is in the table"));
        Arc::clone(&table[index])
    }

    /// An array over `element`, registered as a fresh base schema. The array
    /// mirrors its element's configuration so that configuring the array
    /// reconfigures the elements.
    pub fn array(element: &Arc<Schema>, len: ArrayLen) -> Result<Arc<Schema>> {
        let name = match &len {
            ArrayLen::Fixed(n) => format!("{}[{}]", element.name, n),
            ArrayLen::Ref(path) => format!("{}[{}]", element.name, path),
        };
        registry::global().register_base(Schema {
            id: SchemaId::mint(),
            name,
            kind: SchemaKind::Array(ArrayDescriptor {
                element: Arc::clone(element),
                len,
            }),
            config: element.config.clone(),
        })
    }

    /// A bit-packed unit from declared slice widths. Widths must each be
    /// 1..=8 and sum to at most 8; a remainder appends one padding slice.
    pub fn bits(widths: &[u8]) -> Result<Arc<Schema>> {
        if widths.is_empty() {
            return Err(Error::InvalidBitLayout {
                detail: "no slices declared".into(),
            });
        }
        if let Some(bad) = widths.iter().find(|w| **w == 0 || **w > 8) {
            return Err(Error::InvalidBitLayout {
                detail: format!("slice width {} outside 1..=8", bad),
            });
        }
        let total: u32 = widths.iter().map(|w| u32::from(*w)).sum();
        if total > 8 {
            return Err(Error::InvalidBitLayout {
                detail: format!("slice widths sum to {} bits, more than one byte", total),
            });
        }
        let declared = widths.len();
        let mut widths = widths.to_vec();
        if total < 8 {
            widths.push((8 - total) as u8);
        }
        let names: Vec<String> = widths[..declared].iter().map(u8::to_string).collect();
        registry::global().register_base(Schema {
            id: SchemaId::mint(),
            name: format!("bits({})", names.join(",")),
            kind: SchemaKind::Bits(BitLayout { widths, declared }),
            config: Config::empty(),
        })
    }

    /// Apply a configuration patch, returning the registry-cached
    /// specialization under this schema's identity. Never mutates in place.
    pub fn configure(self: &Arc<Self>, patch: &[(&str, ConfigValue)]) -> Result<Arc<Schema>> {
        let config = self.config.update(patch)?;
        if config == self.config {
            return Ok(Arc::clone(self));
        }
        let cache_key = config.clone();
        let base = Arc::clone(self);
        registry::global().get_or_create(self.id, &cache_key, move || {
            base.specialize(patch, config)
        })
    }

    fn specialize(&self, patch: &[(&str, ConfigValue)], config: Config) -> Result<Schema> {
        let kind = match &self.kind {
            // Arrays push the patch down so elements encode accordingly.
            SchemaKind::Array(desc) => SchemaKind::Array(ArrayDescriptor {
                element: desc.element.configure(patch)?,
                len: desc.len.clone(),
            }),
            other => other.clone(),
        };
        Ok(Schema {
            id: self.id,
            name: self.name.clone(),
            kind,
            config,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_config(&self, config: Config) -> Schema {
        Schema {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind.clone(),
            config,
        }
    }

    /// The field's schema with its declaration-time patch applied, literals
    /// directly and params through this record's configuration.
    pub fn field_effective(&self, field: &FieldDescriptor) -> Result<Arc<Schema>> {
        if field.patch.is_empty() {
            return Ok(Arc::clone(&field.schema));
        }
        let mut resolved: Vec<(&str, ConfigValue)> = Vec::with_capacity(field.patch.len());
        for (key, patch) in &field.patch {
            let value = match patch {
                Patch::Literal(value) => *value,
                Patch::Param(param) => self.config.get(param)?,
            };
            // An unset nullable param leaves the field at its own default.
            if value != ConfigValue::Null {
                resolved.push((key.as_str(), value));
            }
        }
        field.schema.configure(&resolved)
    }

    pub fn is_record(&self) -> bool {
        matches!(self.kind, SchemaKind::Record(_))
    }

    /// Ordered field table, if this is a record.
    pub fn fields(&self) -> Option<&[FieldDescriptor]> {
        match &self.kind {
            SchemaKind::Record(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields()?.iter().find(|f| f.name == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields()?.iter().position(|f| f.name == name)
    }

    /// Effective byte order; Big unless configured otherwise.
    pub fn endianness(&self) -> Endianness {
        self.config
            .get(ENDIANNESS)
            .ok()
            .and_then(|v| v.as_endian())
            .unwrap_or_default()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.config == other.config
    }
}
