// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-width scalar codec.
//!
//! The leaf collaborator of the layout engine: encode or decode exactly one
//! scalar, given its kind and byte order, at a caller-supplied offset. All
//! multi-byte handling above this module is pure offset arithmetic.

use crate::error::{Error, Result};
use crate::schema::{Endianness, PrimitiveKind};

fn check(buf_len: usize, offset: usize, width: usize) -> Result<()> {
    let have = buf_len.saturating_sub(offset);
    if have < width {
        return Err(Error::BufferUnderflow { need: width, have });
    }
    Ok(())
}

/// Write the low `kind.width()` bytes of `bits` at `offset`, returning the
/// offset just past the written bytes.
pub fn encode(
    kind: PrimitiveKind,
    endian: Endianness,
    bits: u64,
    buf: &mut [u8],
    offset: usize,
) -> Result<usize> {
    let width = kind.width();
    check(buf.len(), offset, width)?;
    let be = bits.to_be_bytes();
    let le = bits.to_le_bytes();
    let src = match endian {
        Endianness::Big => &be[8 - width..],
        Endianness::Little => &le[..width],
    };
    buf[offset..offset + width].copy_from_slice(src);
    Ok(offset + width)
}

/// Read `kind.width()` bytes at `offset`, returning the value's bit pattern
/// (zero-extended to 64 bits) and the offset just past the consumed bytes.
pub fn decode(
    kind: PrimitiveKind,
    endian: Endianness,
    buf: &[u8],
    offset: usize,
) -> Result<(u64, usize)> {
    let width = kind.width();
    check(buf.len(), offset, width)?;
    let bytes = &buf[offset..offset + width];
    let mut bits = 0u64;
    match endian {
        Endianness::Big => {
            for b in bytes {
                bits = (bits << 8) | u64::from(*b);
            }
        }
        Endianness::Little => {
            for b in bytes.iter().rev() {
                bits = (bits << 8) | u64::from(*b);
            }
        }
    }
    Ok((bits, offset + width))
}
