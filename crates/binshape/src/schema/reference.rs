// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dot-path references between fields.
//!
//! A [`FieldPath`] is captured once at declaration time (`"size"`,
//! `"header.count"`) and statically checked against the declaring record's
//! field table, so every runtime evaluation is plain table lookup. At run
//! time a path is resolved against a stack of scope [`Frame`]s: the ancestor
//! records of the point of use, each exposing the sibling values declared
//! before the branch being walked. The frames are read-only borrows, which is
//! what keeps reference resolution structurally unable to mutate the tree.

use crate::error::{Error, Result};
use crate::instance::Value;
use crate::schema::{FieldDescriptor, Schema, SchemaKind};
use std::fmt;
use std::sync::Arc;

/// An unevaluated dot-path expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(Error::UnresolvableReference {
                path: raw.to_string(),
                detail: "empty path segment".into(),
            });
        }
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn head(&self) -> &str {
        &self.segments[0]
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Statically resolve `path` against a record's field table, returning the
/// index of the head field. Every segment must name a field at that point and
/// the terminal segment must be an integer primitive.
pub(crate) fn validate_reference(path: &FieldPath, fields: &[FieldDescriptor]) -> Result<usize> {
    let head = fields
        .iter()
        .position(|f| f.name == path.head())
        .ok_or_else(|| Error::UnresolvableReference {
            path: path.to_string(),
            detail: format!("no sibling field named '{}'", path.head()),
        })?;

    let mut cursor = Arc::clone(&fields[head].schema);
    for segment in &path.segments()[1..] {
        let field = cursor
            .field(segment)
            .ok_or_else(|| Error::UnresolvableReference {
                path: path.to_string(),
                detail: format!("'{}' has no field '{}'", cursor.name, segment),
            })?;
        cursor = Arc::clone(&field.schema);
    }

    match &cursor.kind {
        SchemaKind::Primitive(kind) if kind.is_integer() => Ok(head),
        _ => Err(Error::UnresolvableReference {
            path: path.to_string(),
            detail: format!("terminal '{}' is not an integer field", cursor.name),
        }),
    }
}

/// One ancestor record on the resolution stack: the record's schema plus the
/// child values declared before the branch currently being walked.
#[derive(Clone)]
pub(crate) struct Frame<'a> {
    pub schema: Arc<Schema>,
    pub visible: &'a [Value],
}

/// Evaluate `path` against live scope frames, innermost first, returning the
/// current value of the referenced integer field. Never mutates; idempotent.
pub(crate) fn resolve(path: &FieldPath, scope: &[Frame<'_>]) -> Result<usize> {
    for frame in scope.iter().rev() {
        let Some(fields) = frame.schema.fields() else {
            continue;
        };
        let Some(index) = fields.iter().position(|f| f.name == path.head()) else {
            continue;
        };
        if index >= frame.visible.len() {
            // Statically rejected; only reachable through a malformed scope.
            return Err(Error::FieldNotFound(path.to_string()));
        }

        let mut schema = Arc::clone(&fields[index].schema);
        let mut value = &frame.visible[index];
        for segment in &path.segments()[1..] {
            let (child, next) = schema
                .field_index(segment)
                .and_then(|i| schema.fields().map(|f| (i, Arc::clone(&f[i].schema))))
                .ok_or_else(|| Error::FieldNotFound(path.to_string()))?;
            let children = match value {
                Value::Record(children) => children,
                _ => return Err(Error::FieldNotFound(path.to_string())),
            };
            value = &children[child];
            schema = next;
        }

        let len = value.as_int().ok_or_else(|| Error::TypeMismatch {
            expected: "integer length field".into(),
            got: value.type_name().into(),
        })?;
        if len < 0 {
            return Err(Error::TypeMismatch {
                expected: "non-negative length".into(),
                got: len.to_string(),
            });
        }
        return Ok(len as usize);
    }
    Err(Error::FieldNotFound(path.to_string()))
}
