// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy for schema construction and instance operations.
//!
//! Construction-time failures (`InvalidConfigValue` through `InvalidBitLayout`)
//! are fatal: a failed build leaves no partially-registered schema behind.
//! Instance-operation failures abort the enclosing call; a failed pack or
//! unpack never exposes a partial buffer or a partial instance.

use crate::registry::SchemaId;
use std::fmt;

/// All binshape failures. Every variant carries enough context (field name,
/// path, expected vs. actual) to diagnose without inspecting internals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // --- schema construction time ---
    /// A configuration value failed its key's condition.
    InvalidConfigValue {
        key: String,
        value: String,
        expected: String,
    },
    /// A configuration key is not declared in the schema's condition set.
    UnknownKey(String),
    /// No base schema is registered under the given identity.
    UnknownIdentity(SchemaId),
    /// `register_base` called twice for one identity (programming error).
    DuplicateIdentity(SchemaId),
    /// Two fields of one record share a name.
    DuplicateField(String),
    /// A size reference cannot be resolved statically.
    UnresolvableReference { path: String, detail: String },
    /// Expanding a size reference revisits a field already on the stack.
    ReferenceCycle { path: String },
    /// Bit widths are out of range or sum past a byte.
    InvalidBitLayout { detail: String },

    // --- instance operation time ---
    /// The dot-path names a field the schema does not have.
    FieldNotFound(String),
    /// Wrong value type for a field.
    TypeMismatch { expected: String, got: String },
    /// Whole-array or bit-slice assignment with the wrong element count.
    SizeMismatch { expected: usize, got: usize },
    /// Element index outside `[-len, len)`.
    IndexOutOfRange { index: isize, len: usize },
    /// Bit-field value does not fit its declared width.
    OutOfRange { value: i64, width: u8 },
    /// Fewer bytes remain than a decode or encode step requires.
    BufferUnderflow { need: usize, have: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfigValue {
                key,
                value,
                expected,
            } => write!(
                f,
                "invalid value {} for config key '{}' (expected {})",
                value, key, expected
            ),
            Self::UnknownKey(key) => write!(f, "unknown config key '{}'", key),
            Self::UnknownIdentity(id) => write!(f, "no base schema registered for {}", id),
            Self::DuplicateIdentity(id) => {
                write!(f, "base schema already registered for {}", id)
            }
            Self::DuplicateField(name) => write!(f, "duplicate field '{}'", name),
            Self::UnresolvableReference { path, detail } => {
                write!(f, "unresolvable reference '{}': {}", path, detail)
            }
            Self::ReferenceCycle { path } => {
                write!(f, "reference cycle through '{}'", path)
            }
            Self::InvalidBitLayout { detail } => write!(f, "invalid bit layout: {}", detail),
            Self::FieldNotFound(path) => write!(f, "field not found: '{}'", path),
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {}, got {}", expected, got)
            }
            Self::SizeMismatch { expected, got } => {
                write!(f, "size mismatch: expected {} elements, got {}", expected, got)
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {} out of range for length {}", index, len)
            }
            Self::OutOfRange { value, width } => {
                write!(f, "value {} out of range for {}-bit field", value, width)
            }
            Self::BufferUnderflow { need, have } => {
                write!(f, "buffer underflow: need {} bytes, have {}", need, have)
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
