// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent construction of record schemas.
//!
//! The builder accumulates fields and record-level parameters, then validates
//! the whole declaration in one pass at [`SchemaBuilder::build`]. Nothing is
//! registered until validation succeeds, so a failed build never leaves a
//! half-defined schema behind.

use crate::config::{Condition, Config};
use crate::error::{Error, Result};
use crate::registry::{self, SchemaId};
use crate::schema::reference::{self, FieldPath};
use crate::schema::{ArrayLen, FieldDescriptor, Patch, Schema, SchemaKind};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builder for record schemas.
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
    params: BTreeMap<String, Condition>,
    /// First error raised inside a fluent call, surfaced by `build`.
    deferred: Option<Error>,
}

impl SchemaBuilder {
    pub fn record(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
            params: BTreeMap::new(),
            deferred: None,
        }
    }

    /// Append a field with no declaration-time overrides.
    pub fn field(self, name: &str, schema: Arc<Schema>) -> Self {
        self.field_with(name, schema, &[])
    }

    /// Append a field with per-field configuration overrides. Overrides are
    /// stored unevaluated and applied when the field's effective schema is
    /// resolved against the owning record's configuration.
    pub fn field_with(mut self, name: &str, schema: Arc<Schema>, patch: &[(&str, Patch)]) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.to_string(),
            schema,
            patch: patch
                .iter()
                .map(|(key, p)| ((*key).to_string(), p.clone()))
                .collect(),
        });
        self
    }

    /// Append an array field over `element`. Shorthand for building the
    /// array schema separately and passing it to [`SchemaBuilder::field`].
    pub fn array(mut self, name: &str, element: &Arc<Schema>, len: ArrayLen) -> Self {
        match Schema::array(element, len) {
            Ok(schema) => self.field(name, schema),
            Err(err) => {
                self.deferred.get_or_insert(err);
                self
            }
        }
    }

    /// Append a bit-packed field from declared slice widths.
    pub fn bits(mut self, name: &str, widths: &[u8]) -> Self {
        match Schema::bits(widths) {
            Ok(schema) => self.field(name, schema),
            Err(err) => {
                self.deferred.get_or_insert(err);
                self
            }
        }
    }

    /// Declare a record-level parameter. Fields bind to it with
    /// [`Patch::Param`]; instances of the record select a value for it
    /// through [`Schema::configure`].
    pub fn param(mut self, name: &str, condition: Condition) -> Self {
        self.params.insert(name.to_string(), condition);
        self
    }

    /// Validate the declaration and register it as a fresh base schema.
    pub fn build(self) -> Result<Arc<Schema>> {
        if let Some(err) = &self.deferred {
            return Err(err.clone());
        }
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(Error::DuplicateField(field.name.clone()));
            }
        }
        self.check_patches()?;
        self.check_references()?;

        registry::global().register_base(Schema {
            id: SchemaId::mint(),
            name: self.name,
            kind: SchemaKind::Record(self.fields),
            config: Config::new(self.params),
        })
    }

    /// Every literal override must pass its target key's condition now; every
    /// parameter override must name a declared record parameter.
    fn check_patches(&self) -> Result<()> {
        for field in &self.fields {
            for (key, patch) in &field.patch {
                match patch {
                    Patch::Literal(value) => {
                        field.schema.config.update(&[(key.as_str(), *value)])?;
                    }
                    Patch::Param(param) => {
                        if !field.schema.config.has_key(key) {
                            return Err(Error::UnknownKey(key.clone()));
                        }
                        if !self.params.contains_key(param) {
                            return Err(Error::UnknownKey(param.clone()));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Reference-sized arrays must target a sibling integer field that is
    /// declared before them. The walk descends through nested array element
    /// schemas too: their references resolve against this record's scope at
    /// run time, so a dangling path inside a multidimensional element is
    /// already a declaration error. Nested records validated their own
    /// references when they were built.
    fn check_references(&self) -> Result<()> {
        for (i, field) in self.fields.iter().enumerate() {
            let mut schema = &field.schema;
            while let SchemaKind::Array(desc) = &schema.kind {
                if let ArrayLen::Ref(path) = &desc.len {
                    self.check_reference(path, i)?;
                }
                schema = &desc.element;
            }
        }
        Ok(())
    }

    /// Cycles are diagnosed before ordering so a self-referential
    /// declaration reports as a cycle, not as mis-ordering.
    fn check_reference(&self, path: &FieldPath, field_index: usize) -> Result<()> {
        let head = self
            .fields
            .iter()
            .position(|f| f.name == path.head())
            .ok_or_else(|| Error::UnresolvableReference {
                path: path.to_string(),
                detail: format!("no sibling field named '{}'", path.head()),
            })?;
        if head == field_index {
            return Err(Error::ReferenceCycle {
                path: path.to_string(),
            });
        }
        if head > field_index {
            return Err(Error::UnresolvableReference {
                path: path.to_string(),
                detail: format!(
                    "'{}' is declared after '{}'",
                    self.fields[head].name, self.fields[field_index].name
                ),
            });
        }
        reference::validate_reference(path, &self.fields)?;
        Ok(())
    }
}
