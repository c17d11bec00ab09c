// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema declaration and specialization.

mod builder;
mod descriptor;
pub(crate) mod reference;

pub use builder::SchemaBuilder;
pub use descriptor::{
    ArrayDescriptor, ArrayLen, BitLayout, Endianness, FieldDescriptor, Patch, PrimitiveKind,
    Schema, SchemaKind,
};
pub use reference::FieldPath;
