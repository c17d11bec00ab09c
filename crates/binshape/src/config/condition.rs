// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-key configuration validators.
//!
//! A [`Condition`] pairs a validity check with a default value for one
//! configuration key. The closed [`ConfigValue`] universe keeps configurations
//! hashable, which the registry cache depends on.

use crate::error::{Error, Result};
use crate::schema::{Endianness, PrimitiveKind};
use std::fmt;

/// A validated configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigValue {
    Int(i64),
    Endian(Endianness),
    Prim(PrimitiveKind),
    Null,
}

impl ConfigValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Int(_) => ValueKind::Int,
            Self::Endian(_) => ValueKind::Endian,
            Self::Prim(_) => ValueKind::Prim,
            Self::Null => ValueKind::Null,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_endian(&self) -> Option<Endianness> {
        match self {
            Self::Endian(e) => Some(*e),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Endian(e) => write!(f, "{:?}", e),
            Self::Prim(p) => write!(f, "{:?}", p),
            Self::Null => write!(f, "null"),
        }
    }
}

/// Discriminant of a [`ConfigValue`], for typed-value conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Endian,
    Prim,
    Null,
}

/// Validator plus default for one configuration key.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Integer bound check against an anchor. The three flags combine:
    /// `more` accepts values above the anchor, `less` below, `exact` the
    /// anchor itself. All three together accept any integer.
    Int {
        anchor: i64,
        exact: bool,
        more: bool,
        less: bool,
        default: i64,
    },
    /// Closed enumerated-set membership.
    Set {
        values: Vec<ConfigValue>,
        default: ConfigValue,
    },
    /// Arithmetic-series membership: `anchor + k * step` for `k >= 0`.
    Series {
        start: i64,
        step: i64,
        default: i64,
    },
    /// Typed-value check with nullability.
    Kind {
        kind: ValueKind,
        nullable: bool,
        default: ConfigValue,
    },
}

impl Condition {
    /// Integer bound condition. No flag set means no value is legal, which is
    /// rejected here rather than at first use.
    pub fn int(anchor: i64, exact: bool, more: bool, less: bool, default: i64) -> Result<Self> {
        let cond = Self::Int {
            anchor,
            exact,
            more,
            less,
            default,
        };
        cond.check_default()?;
        Ok(cond)
    }

    /// Closed-set condition over the given values.
    pub fn set(values: Vec<ConfigValue>, default: ConfigValue) -> Result<Self> {
        let cond = Self::Set { values, default };
        cond.check_default()?;
        Ok(cond)
    }

    /// Arithmetic-series condition; `step` must be non-zero.
    pub fn series(start: i64, step: i64, default: i64) -> Result<Self> {
        if step == 0 {
            return Err(Error::InvalidConfigValue {
                key: String::new(),
                value: "0".into(),
                expected: "non-zero series step".into(),
            });
        }
        let cond = Self::Series {
            start,
            step,
            default,
        };
        cond.check_default()?;
        Ok(cond)
    }

    /// Typed-value condition.
    pub fn kind(kind: ValueKind, nullable: bool, default: ConfigValue) -> Result<Self> {
        let cond = Self::Kind {
            kind,
            nullable,
            default,
        };
        cond.check_default()?;
        Ok(cond)
    }

    fn check_default(&self) -> Result<()> {
        let default = self.default();
        if !self.validate(&default) {
            return Err(Error::InvalidConfigValue {
                key: String::new(),
                value: default.to_string(),
                expected: self.describe(),
            });
        }
        Ok(())
    }

    pub fn validate(&self, value: &ConfigValue) -> bool {
        match self {
            Self::Int {
                anchor,
                exact,
                more,
                less,
                ..
            } => match value.as_int() {
                Some(v) => {
                    (*exact && v == *anchor) || (*more && v > *anchor) || (*less && v < *anchor)
                }
                None => false,
            },
            Self::Set { values, .. } => values.contains(value),
            Self::Series { start, step, .. } => match value.as_int() {
                // The offset from the anchor must have the step's direction
                // and divide evenly. Arithmetic that would overflow `i64`
                // simply means the value is not on the series.
                Some(v) => match v.checked_sub(*start) {
                    Some(diff) => {
                        diff.signum() * step.signum() >= 0 && diff.checked_rem(*step) == Some(0)
                    }
                    None => false,
                },
                None => false,
            },
            Self::Kind {
                kind, nullable, ..
            } => {
                if matches!(value, ConfigValue::Null) {
                    *nullable
                } else {
                    value.kind() == *kind
                }
            }
        }
    }

    pub fn default(&self) -> ConfigValue {
        match self {
            Self::Int { default, .. } | Self::Series { default, .. } => ConfigValue::Int(*default),
            Self::Set { default, .. } | Self::Kind { default, .. } => *default,
        }
    }

    /// Human description of what the condition accepts, for error context.
    pub fn describe(&self) -> String {
        match self {
            Self::Int {
                anchor,
                exact,
                more,
                less,
                ..
            } => {
                let mut parts = Vec::new();
                if *less {
                    parts.push(format!("< {}", anchor));
                }
                if *exact {
                    parts.push(format!("== {}", anchor));
                }
                if *more {
                    parts.push(format!("> {}", anchor));
                }
                format!("integer {}", parts.join(" or "))
            }
            Self::Set { values, .. } => {
                let names: Vec<String> = values.iter().map(ToString::to_string).collect();
                format!("one of {{{}}}", names.join(", "))
            }
            Self::Series { start, step, .. } => format!("{} + k*{}", start, step),
            Self::Kind { kind, nullable, .. } => {
                if *nullable {
                    format!("{:?} or null", kind)
                } else {
                    format!("{:?}", kind)
                }
            }
        }
    }
}
