// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Declarative binary record layouts.
//!
//! A schema declares the shape of a binary record once: fixed-width scalars,
//! bit-packed sub-byte units, nested records, and arrays whose length is
//! either a constant or a dot-path reference to a sibling field's current
//! value. Instances of a schema then size, pack and unpack themselves, with
//! reference-sized arrays kept in line with their length fields.
//!
//! Schemas are immutable. Applying a configuration (byte order, record
//! parameters) yields a registry-cached specialization under the same
//! identity, so two independently configured references to the same
//! parametrized type are pointer-identical.
//!
//! # Example
//!
//! ```
//! use binshape::{ArrayLen, FieldPath, Instance, PrimitiveKind, Schema, SchemaBuilder, Value};
//!
//! let payload = Schema::array(
//!     &Schema::primitive(PrimitiveKind::Char),
//!     ArrayLen::Ref(FieldPath::parse("length")?),
//! )?;
//! let message = SchemaBuilder::record("Message")
//!     .field("length", Schema::primitive(PrimitiveKind::I16))
//!     .field("payload", payload)
//!     .build()?;
//!
//! let mut msg = Instance::new(&message)?;
//! msg.set("length", 2i16)?;
//! msg.set_elem("payload", 0, Value::Char(b'h'))?;
//! msg.set_elem("payload", 1, Value::Char(b'i'))?;
//! assert_eq!(msg.pack()?, b"\x00\x02hi");
//!
//! let mut back = Instance::unpack(&message, b"\x00\x02hi")?;
//! assert_eq!(back.get("payload.1")?, Value::Char(b'i'));
//! # Ok::<(), binshape::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod instance;
mod layout;
pub mod registry;
pub mod schema;
pub mod wire;

pub use config::{Condition, Config, ConfigValue, ValueKind, ENDIANNESS};
pub use error::{Error, Result};
pub use instance::{Instance, Value};
pub use registry::SchemaId;
pub use schema::{
    ArrayLen, Endianness, FieldPath, Patch, PrimitiveKind, Schema, SchemaBuilder, SchemaKind,
};
