// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide schema registry.
//!
//! Maps a schema's stable identity to its canonical base definition and to a
//! cache of `(identity, Config)` specializations. The cache is the single
//! synchronization point of the crate: at most one schema object ever exists
//! per `(identity, configuration)` pair, so configuration-derived references
//! to "the same" parametrized type stay pointer-identical.
//!
//! Registrations happen at schema-definition time, not in data-path loops, so
//! one coarse lock over the whole map is enough.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::schema::Schema;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Stable identity of a schema, assigned once at first definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaId(u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

impl SchemaId {
    /// Mint a fresh identity.
    pub(crate) fn mint() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema #{}", self.0)
    }
}

struct Entry {
    base: Arc<Schema>,
    variants: HashMap<Config, Arc<Schema>>,
}

/// Registry of base schemas and their configured specializations.
pub struct Registry {
    entries: RwLock<HashMap<SchemaId, Entry>>,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry, initialized on first use and never torn down.
pub fn global() -> &'static Registry {
    REGISTRY.get_or_init(|| Registry {
        entries: RwLock::new(HashMap::new()),
    })
}

impl Registry {
    /// Record `schema` as the canonical definition under its own identity.
    /// The base also seeds the variant cache under its own configuration.
    pub fn register_base(&self, schema: Schema) -> Result<Arc<Schema>> {
        let id = schema.id;
        let mut entries = self.entries.write();
        if entries.contains_key(&id) {
            return Err(Error::DuplicateIdentity(id));
        }
        let base = Arc::new(schema);
        let mut variants = HashMap::new();
        variants.insert(base.config.clone(), Arc::clone(&base));
        entries.insert(
            id,
            Entry {
                base: Arc::clone(&base),
                variants,
            },
        );
        log::debug!("[registry] registered base '{}' as {}", base.name, id);
        Ok(base)
    }

    /// The canonical schema for `id`, for reconfiguration or introspection.
    pub fn get_base(&self, id: SchemaId) -> Result<Arc<Schema>> {
        let entries = self.entries.read();
        entries
            .get(&id)
            .map(|entry| Arc::clone(&entry.base))
            .ok_or(Error::UnknownIdentity(id))
    }

    /// The specialization of `id` under `config`, building it with `factory`
    /// on first request. Check-then-insert runs under the write lock, so
    /// concurrent callers for an equal key are linearized and receive the
    /// same object.
    pub fn get_or_create<F>(&self, id: SchemaId, config: &Config, factory: F) -> Result<Arc<Schema>>
    where
        F: FnOnce() -> Result<Schema>,
    {
        {
            let entries = self.entries.read();
            let entry = entries.get(&id).ok_or(Error::UnknownIdentity(id))?;
            if let Some(hit) = entry.variants.get(config) {
                return Ok(Arc::clone(hit));
            }
        }

        let mut entries = self.entries.write();
        let entry = entries.get_mut(&id).ok_or(Error::UnknownIdentity(id))?;
        if let Some(hit) = entry.variants.get(config) {
            return Ok(Arc::clone(hit));
        }
        let built = Arc::new(factory()?);
        debug_assert_eq!(built.id, id, "factory must preserve schema identity");
        entry.variants.insert(config.clone(), Arc::clone(&built));
        log::debug!(
            "[registry] specialized '{}' ({} variants cached for {})",
            built.name,
            entry.variants.len(),
            id
        );
        Ok(built)
    }
}
