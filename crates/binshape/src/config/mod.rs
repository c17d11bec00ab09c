// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema configuration: validated key/value parameter sets.

mod condition;
mod configuration;

pub use condition::{Condition, ConfigValue, ValueKind};
pub use configuration::Config;

/// Configuration key selecting the byte order of a primitive schema.
pub const ENDIANNESS: &str = "endianness";
