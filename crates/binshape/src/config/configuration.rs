// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Immutable, hashable configuration maps.
//!
//! A [`Config`] pairs explicit key/value entries with the condition set that
//! defines the legal keys and values. Missing keys resolve to their condition
//! defaults, and equality/hashing are defined over the resolved value set, so
//! two configurations built along different update paths compare and hash
//! identically when their effective values agree. That property is what makes
//! the registry's `(identity, Config)` cache behave as type identity.

use crate::config::{Condition, ConfigValue};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Config {
    conditions: Arc<BTreeMap<String, Condition>>,
    values: BTreeMap<String, ConfigValue>,
}

impl Config {
    /// A configuration with no declared keys.
    pub fn empty() -> Self {
        Self {
            conditions: Arc::new(BTreeMap::new()),
            values: BTreeMap::new(),
        }
    }

    /// A configuration over the given condition set, all keys at default.
    pub fn new(conditions: BTreeMap<String, Condition>) -> Self {
        Self {
            conditions: Arc::new(conditions),
            values: BTreeMap::new(),
        }
    }

    /// The stored value for `key`, or the key's condition default.
    pub fn get(&self, key: &str) -> Result<ConfigValue> {
        let condition = self
            .conditions
            .get(key)
            .ok_or_else(|| Error::UnknownKey(key.to_string()))?;
        Ok(self
            .values
            .get(key)
            .copied()
            .unwrap_or_else(|| condition.default()))
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.conditions.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys().map(String::as_str)
    }

    pub fn condition(&self, key: &str) -> Option<&Condition> {
        self.conditions.get(key)
    }

    /// Validate every entry of `patch` and return a new configuration with
    /// those values applied. The original is untouched.
    pub fn update(&self, patch: &[(&str, ConfigValue)]) -> Result<Self> {
        let mut values = self.values.clone();
        for (key, value) in patch {
            let condition = self
                .conditions
                .get(*key)
                .ok_or_else(|| Error::UnknownKey((*key).to_string()))?;
            if !condition.validate(value) {
                return Err(Error::InvalidConfigValue {
                    key: (*key).to_string(),
                    value: value.to_string(),
                    expected: condition.describe(),
                });
            }
            values.insert((*key).to_string(), *value);
        }
        Ok(Self {
            conditions: Arc::clone(&self.conditions),
            values,
        })
    }

    /// Union of condition sets and explicit values; `other` wins where both
    /// declare the same key. Used when a subtype adds configuration keys its
    /// base does not have.
    pub fn merge(&self, other: &Self) -> Self {
        let mut conditions = (*self.conditions).clone();
        for (key, condition) in other.conditions.iter() {
            conditions.insert(key.clone(), condition.clone());
        }
        let mut values = self.values.clone();
        for (key, value) in &other.values {
            values.insert(key.clone(), *value);
        }
        Self {
            conditions: Arc::new(conditions),
            values,
        }
    }

    /// The same condition set with every explicit value dropped.
    pub fn defaults(&self) -> Self {
        Self {
            conditions: Arc::clone(&self.conditions),
            values: BTreeMap::new(),
        }
    }

    /// Every declared key at its effective (stored or defaulted) value, in
    /// key order.
    pub fn resolved(&self) -> impl Iterator<Item = (&str, ConfigValue)> {
        self.conditions.iter().map(|(key, condition)| {
            let value = self
                .values
                .get(key)
                .copied()
                .unwrap_or_else(|| condition.default());
            (key.as_str(), value)
        })
    }
}

impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        if self.conditions.len() != other.conditions.len() {
            return false;
        }
        self.resolved()
            .zip(other.resolved())
            .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
    }
}

impl Eq for Config {}

impl Hash for Config {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (key, value) in self.resolved() {
            key.hash(state);
            value.hash(state);
        }
    }
}
