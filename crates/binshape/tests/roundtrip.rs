// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end declaration, pack and unpack coverage.

use binshape::{
    ArrayLen, Condition, ConfigValue, Endianness, Error, FieldPath, Instance, Patch,
    PrimitiveKind, Schema, SchemaBuilder, Value, ENDIANNESS,
};
use std::sync::Arc;

fn message_schema() -> Arc<Schema> {
    SchemaBuilder::record("Message")
        .field("length", Schema::primitive(PrimitiveKind::I16))
        .array(
            "payload",
            &Schema::primitive(PrimitiveKind::Char),
            ArrayLen::Ref(FieldPath::parse("length").unwrap()),
        )
        .build()
        .unwrap()
}

#[test]
fn char_and_int16_pack_big_endian() {
    let tag = SchemaBuilder::record("Tag")
        .field("c", Schema::primitive(PrimitiveKind::Char))
        .field("s", Schema::primitive(PrimitiveKind::I16))
        .build()
        .unwrap();

    let mut inst = Instance::new(&tag).unwrap();
    inst.set("c", Value::Char(b'@')).unwrap();
    inst.set("s", 9251i16).unwrap();
    assert_eq!(inst.size().unwrap(), 3);
    assert_eq!(inst.pack().unwrap(), b"@$#");

    let mut back = Instance::unpack(&tag, b"%&^").unwrap();
    assert_eq!(back.get("c").unwrap(), Value::Char(b'%'));
    assert_eq!(back.get("s").unwrap(), Value::I16(9822));
}

#[test]
fn reference_sized_payload_round_trips() {
    let message = message_schema();
    let mut msg = Instance::new(&message).unwrap();
    msg.set("length", 2i16).unwrap();
    assert_eq!(msg.size().unwrap(), 4);
    msg.set_elem("payload", 0, Value::Char(b'$')).unwrap();
    msg.set_elem("payload", 1, Value::Char(b'#')).unwrap();
    assert_eq!(msg.pack().unwrap(), b"\x00\x02$#");

    let mut back = Instance::unpack(&message, b"\x00\x02$#").unwrap();
    assert_eq!(back.get("length").unwrap(), Value::I16(2));
    assert_eq!(back.get("payload.0").unwrap(), Value::Char(b'$'));
    assert_eq!(back, msg);
}

#[test]
fn shrinking_the_length_field_truncates_the_payload() {
    let message = message_schema();
    let mut msg = Instance::new(&message).unwrap();
    msg.set("length", 5i16).unwrap();
    msg.set(
        "payload",
        Value::Array(b"abcde".iter().map(|c| Value::Char(*c)).collect()),
    )
    .unwrap();
    assert_eq!(msg.pack().unwrap(), b"\x00\x05abcde");

    msg.set("length", 2i16).unwrap();
    assert_eq!(msg.pack().unwrap(), b"\x00\x02ab");
    assert_eq!(msg.len("payload").unwrap(), 2);
}

#[test]
fn regrown_arrays_keep_surviving_elements() {
    let message = message_schema();
    let mut msg = Instance::new(&message).unwrap();
    msg.set("length", 3i16).unwrap();
    msg.set(
        "payload",
        Value::Array(b"abc".iter().map(|c| Value::Char(*c)).collect()),
    )
    .unwrap();

    // Shrink drops the tail, growing back pads with defaults.
    msg.set("length", 1i16).unwrap();
    msg.size().unwrap();
    msg.set("length", 3i16).unwrap();
    msg.size().unwrap();

    assert_eq!(msg.get("payload.0").unwrap(), Value::Char(b'a'));
    assert_eq!(msg.get("payload.1").unwrap(), Value::Char(0));
    assert_eq!(msg.get("payload.2").unwrap(), Value::Char(0));
}

#[test]
fn whole_array_assignment_checks_resolved_length() {
    let message = message_schema();
    let mut msg = Instance::new(&message).unwrap();
    msg.set("length", 2i16).unwrap();

    let err = msg
        .set_array("payload", vec![Value::Char(b'a')])
        .unwrap_err();
    assert_eq!(err, Error::SizeMismatch { expected: 2, got: 1 });

    msg.set_array("payload", vec![Value::Char(b'a'), Value::Char(b'b')])
        .unwrap();
    assert_eq!(msg.pack().unwrap(), b"\x00\x02ab");
}

#[test]
fn whole_array_set_checks_the_referenced_length() {
    let message = message_schema();
    let mut msg = Instance::new(&message).unwrap();
    msg.set("length", 5i16).unwrap();
    let err = msg
        .set("payload", Value::Array(vec![Value::Char(b'a'); 4]))
        .unwrap_err();
    assert_eq!(err, Error::SizeMismatch { expected: 5, got: 4 });
}

#[test]
fn paths_resize_dynamic_arrays_on_the_way_down() {
    let message = message_schema();
    let thread = SchemaBuilder::record("Thread")
        .field("count", Schema::primitive(PrimitiveKind::I16))
        .array(
            "messages",
            &message,
            ArrayLen::Ref(FieldPath::parse("count").unwrap()),
        )
        .build()
        .unwrap();

    // No sizing calls anywhere: each path walk trues up what it crosses.
    let mut inst = Instance::new(&thread).unwrap();
    inst.set("count", 1i16).unwrap();
    inst.set("messages.0.length", 2i16).unwrap();
    inst.set_elem("messages.0.payload", 0, Value::Char(b'h'))
        .unwrap();
    inst.set_elem("messages.0.payload", 1, Value::Char(b'i'))
        .unwrap();
    assert_eq!(inst.get("messages.0.payload.0").unwrap(), Value::Char(b'h'));
    assert_eq!(inst.pack().unwrap(), b"\x00\x01\x00\x02hi");
}

#[test]
fn nested_records_resolve_inner_references_first() {
    let message = message_schema();
    let chat = SchemaBuilder::record("Chat")
        .field("count", Schema::primitive(PrimitiveKind::I16))
        .field(
            "messages",
            Schema::array(&message, ArrayLen::Ref(FieldPath::parse("count").unwrap())).unwrap(),
        )
        .build()
        .unwrap();

    let mut inst = Instance::new(&chat).unwrap();
    inst.set("count", 2i16).unwrap();
    inst.size().unwrap();
    inst.set("messages.0.length", 1i16).unwrap();
    inst.set("messages.0.payload", Value::Array(vec![Value::Char(b'a')]))
        .unwrap();
    inst.set("messages.1.length", 2i16).unwrap();
    inst.set(
        "messages.1.payload",
        Value::Array(vec![Value::Char(b'b'), Value::Char(b'c')]),
    )
    .unwrap();

    let bytes = inst.pack().unwrap();
    assert_eq!(bytes, b"\x00\x02\x00\x01a\x00\x02bc");

    let mut back = Instance::unpack(&chat, &bytes).unwrap();
    assert_eq!(back.get("messages.1.payload.1").unwrap(), Value::Char(b'c'));
    assert_eq!(back, inst);
}

#[test]
fn reference_can_descend_into_a_sibling_record() {
    let number = SchemaBuilder::record("Number")
        .field("value", Schema::primitive(PrimitiveKind::I16))
        .build()
        .unwrap();
    let group = SchemaBuilder::record("Group")
        .field("size", Arc::clone(&number))
        .field(
            "data",
            Schema::array(
                &Schema::primitive(PrimitiveKind::U8),
                ArrayLen::Ref(FieldPath::parse("size.value").unwrap()),
            )
            .unwrap(),
        )
        .build()
        .unwrap();

    let mut inst = Instance::new(&group).unwrap();
    inst.set("size.value", 3i16).unwrap();
    assert_eq!(inst.size().unwrap(), 5);
    inst.set_elem("data", 1, 7u8).unwrap();
    assert_eq!(inst.pack().unwrap(), b"\x00\x03\x00\x07\x00");
}

#[test]
fn bit_slices_share_one_byte() {
    let flags = SchemaBuilder::record("Flags")
        .field("bits", Schema::bits(&[1, 2, 3, 2]).unwrap())
        .build()
        .unwrap();

    let mut inst = Instance::new(&flags).unwrap();
    inst.set("bits.0", 1u8).unwrap();
    inst.set("bits.1", 3u8).unwrap();
    inst.set("bits.2", 7u8).unwrap();
    inst.set("bits.3", 3u8).unwrap();
    assert_eq!(inst.pack().unwrap(), [0xFF]);

    let mut back = Instance::unpack(&flags, &[0xDA]).unwrap();
    assert_eq!(back.get("bits.0").unwrap(), Value::U8(1));
    assert_eq!(back.get("bits.1").unwrap(), Value::U8(2));
    assert_eq!(back.get("bits.2").unwrap(), Value::U8(6));
    assert_eq!(back.get("bits.3").unwrap(), Value::U8(2));
}

#[test]
fn mixed_bit_units_pack_side_by_side() {
    let packed = SchemaBuilder::record("Packed")
        .field("a", Schema::bits(&[1, 2, 3]).unwrap())
        .field("b", Schema::bits(&[1, 2, 3, 2]).unwrap())
        .field("c", Schema::bits(&[4]).unwrap())
        .build()
        .unwrap();

    let mut inst = Instance::new(&packed).unwrap();
    // First unit slice by slice, padding slice included.
    inst.set("a.0", 1u8).unwrap();
    inst.set("a.1", 3u8).unwrap();
    inst.set("a.2", 7u8).unwrap();
    inst.set("a.3", 3u8).unwrap();
    // The other two from whole bytes.
    inst.set_byte("b", 0xDA).unwrap();
    inst.set_byte("c", 129).unwrap();
    assert_eq!(inst.pack().unwrap(), b"\xFF\xDA\x81");
}

#[test]
fn bit_slice_assignment_is_range_checked() {
    let flags = SchemaBuilder::record("Checked")
        .field("bits", Schema::bits(&[3, 5]).unwrap())
        .build()
        .unwrap();
    let mut inst = Instance::new(&flags).unwrap();
    inst.set("bits.0", 7u8).unwrap();
    assert!(matches!(
        inst.set("bits.0", 8u8).unwrap_err(),
        Error::OutOfRange { value: 8, width: 3 }
    ));
    assert!(matches!(
        inst.set("bits.0", -1i8).unwrap_err(),
        Error::OutOfRange { value: -1, width: 3 }
    ));
}

#[test]
fn padded_bit_unit_occupies_the_low_bits() {
    let padded = SchemaBuilder::record("Padded")
        .field("bits", Schema::bits(&[4]).unwrap())
        .build()
        .unwrap();
    let mut inst = Instance::new(&padded).unwrap();
    inst.set("bits.0", 8u8).unwrap();
    assert_eq!(inst.pack().unwrap(), [0x80]);
    inst.set_byte("bits", 129).unwrap();
    assert_eq!(inst.get("bits.0").unwrap(), Value::U8(8));
    assert_eq!(inst.get("bits.1").unwrap(), Value::U8(1));
}

#[test]
fn per_field_byte_order_overrides() {
    let mixed = SchemaBuilder::record("Mixed")
        .field("big", Schema::primitive(PrimitiveKind::U16))
        .field_with(
            "little",
            Schema::primitive(PrimitiveKind::U16),
            &[(
                ENDIANNESS,
                Patch::Literal(ConfigValue::Endian(Endianness::Little)),
            )],
        )
        .build()
        .unwrap();

    let mut inst = Instance::new(&mixed).unwrap();
    inst.set("big", 0x6162u16).unwrap();
    inst.set("little", 0x6162u16).unwrap();
    assert_eq!(inst.pack().unwrap(), b"abba");

    let mut back = Instance::unpack(&mixed, b"abba").unwrap();
    assert_eq!(back.get("little").unwrap(), Value::U16(0x6162));
}

#[test]
fn record_parameters_reconfigure_bound_fields() {
    let order = Condition::kind(
        binshape::ValueKind::Endian,
        true,
        ConfigValue::Null,
    )
    .unwrap();
    let frame = SchemaBuilder::record("Frame")
        .param("order", order)
        .field_with(
            "a",
            Schema::primitive(PrimitiveKind::U16),
            &[(ENDIANNESS, Patch::Param("order".into()))],
        )
        .field_with(
            "b",
            Schema::primitive(PrimitiveKind::U16),
            &[(ENDIANNESS, Patch::Param("order".into()))],
        )
        .build()
        .unwrap();

    // Unset nullable param leaves the fields at their own default (big).
    let mut big = Instance::new(&frame).unwrap();
    big.set("a", 0x0102u16).unwrap();
    big.set("b", 0x0304u16).unwrap();
    assert_eq!(big.pack().unwrap(), [1, 2, 3, 4]);

    let little_frame = frame
        .configure(&[("order", ConfigValue::Endian(Endianness::Little))])
        .unwrap();
    let mut little = Instance::new(&little_frame).unwrap();
    little.set("a", 0x0102u16).unwrap();
    little.set("b", 0x0304u16).unwrap();
    assert_eq!(little.pack().unwrap(), [2, 1, 4, 3]);

    // Same parametrization resolves to the same cached schema.
    let again = frame
        .configure(&[("order", ConfigValue::Endian(Endianness::Little))])
        .unwrap();
    assert!(Arc::ptr_eq(&little_frame, &again));
}

#[test]
fn endianness_propagates_through_arrays() {
    let arr = Schema::array(&Schema::primitive(PrimitiveKind::U16), ArrayLen::Fixed(2)).unwrap();
    let little = arr
        .configure(&[(ENDIANNESS, ConfigValue::Endian(Endianness::Little))])
        .unwrap();
    let rec = SchemaBuilder::record("LE")
        .field("pair", little)
        .build()
        .unwrap();
    let mut inst = Instance::new(&rec).unwrap();
    inst.set_elem("pair", 0, 0x0102u16).unwrap();
    inst.set_elem("pair", 1, 0x0304u16).unwrap();
    assert_eq!(inst.pack().unwrap(), [2, 1, 4, 3]);
}

#[test]
fn multidimensional_arrays_nest() {
    let row = Schema::array(&Schema::primitive(PrimitiveKind::U8), ArrayLen::Fixed(2)).unwrap();
    let grid = Schema::array(&row, ArrayLen::Fixed(2)).unwrap();
    let rec = SchemaBuilder::record("Grid")
        .field("cells", grid)
        .build()
        .unwrap();

    let mut inst = Instance::new(&rec).unwrap();
    inst.set("cells.0.1", 5u8).unwrap();
    inst.set("cells.1.0", 9u8).unwrap();
    assert_eq!(inst.pack().unwrap(), [0, 5, 9, 0]);

    let mut back = Instance::unpack(&rec, &[0, 5, 9, 0]).unwrap();
    assert_eq!(back.get("cells.1.0").unwrap(), Value::U8(9));
}

#[test]
fn multidimensional_arrays_take_reference_lengths() {
    let row = Schema::array(
        &Schema::primitive(PrimitiveKind::I16),
        ArrayLen::Ref(FieldPath::parse("cols").unwrap()),
    )
    .unwrap();
    let rec = SchemaBuilder::record("DynGrid")
        .field("rows", Schema::primitive(PrimitiveKind::I16))
        .field("cols", Schema::primitive(PrimitiveKind::I16))
        .array("data", &row, ArrayLen::Ref(FieldPath::parse("rows").unwrap()))
        .build()
        .unwrap();

    let mut inst = Instance::new(&rec).unwrap();
    inst.set("rows", 2i16).unwrap();
    inst.set("cols", 3i16).unwrap();
    assert_eq!(inst.size().unwrap(), 2 + 2 + 2 * 3 * 2);

    inst.set("data.1.2", 5i16).unwrap();
    let bytes = inst.pack().unwrap();
    assert_eq!(bytes.len(), 16);
    assert_eq!(&bytes[14..], [0, 5]);

    let mut back = Instance::unpack(&rec, &bytes).unwrap();
    assert_eq!(back.get("data.1.2").unwrap(), Value::I16(5));
}

#[test]
fn unpack_tolerates_trailing_bytes() {
    let message = message_schema();
    let mut back = Instance::unpack(&message, b"\x00\x01xEXTRA").unwrap();
    assert_eq!(back.get("payload.0").unwrap(), Value::Char(b'x'));
}

#[test]
fn short_buffers_are_rejected_without_a_partial_instance() {
    let message = message_schema();
    assert!(matches!(
        Instance::unpack(&message, &[0x00]).unwrap_err(),
        Error::BufferUnderflow { need: 2, have: 1 }
    ));
    // Length promises more payload than the buffer carries.
    assert!(matches!(
        Instance::unpack(&message, b"\x00\x05ab").unwrap_err(),
        Error::BufferUnderflow { .. }
    ));
}

#[test]
fn hostile_length_fields_fail_to_unpack_cleanly() {
    let claimed = SchemaBuilder::record("Claimed")
        .field("length", Schema::primitive(PrimitiveKind::I64))
        .array(
            "payload",
            &Schema::primitive(PrimitiveKind::Char),
            ArrayLen::Ref(FieldPath::parse("length").unwrap()),
        )
        .build()
        .unwrap();

    // A length field claiming i64::MAX elements must not drive allocation.
    let mut bytes = i64::MAX.to_be_bytes().to_vec();
    bytes.push(b'x');
    assert!(matches!(
        Instance::unpack(&claimed, &bytes).unwrap_err(),
        Error::BufferUnderflow { .. }
    ));
}

#[test]
fn offset_based_packing_leaves_surroundings_alone() {
    let message = message_schema();
    let mut msg = Instance::new(&message).unwrap();
    msg.set("length", 1i16).unwrap();
    msg.size().unwrap();
    msg.set_elem("payload", 0, Value::Char(b'z')).unwrap();

    let mut buf = [0xEEu8; 6];
    let end = msg.pack_into(&mut buf, 2).unwrap();
    assert_eq!(end, 5);
    assert_eq!(&buf, b"\xEE\xEE\x00\x01z\xEE");

    let (back, next) = Instance::unpack_from(&message, &buf, 2).unwrap();
    assert_eq!(next, 5);
    assert_eq!(back, msg);
}

#[test]
fn randomized_scalar_records_round_trip() {
    let rec = SchemaBuilder::record("Scalars")
        .field("a", Schema::primitive(PrimitiveKind::U8))
        .field("b", Schema::primitive(PrimitiveKind::I16))
        .field("c", Schema::primitive(PrimitiveKind::U32))
        .field("d", Schema::primitive(PrimitiveKind::I64))
        .build()
        .unwrap();

    fastrand::seed(7);
    for _ in 0..64 {
        let mut inst = Instance::new(&rec).unwrap();
        inst.set("a", fastrand::u8(..)).unwrap();
        inst.set("b", fastrand::i16(..)).unwrap();
        inst.set("c", fastrand::u32(..)).unwrap();
        inst.set("d", fastrand::i64(..)).unwrap();
        let bytes = inst.pack().unwrap();
        assert_eq!(bytes.len(), 15);
        assert_eq!(Instance::unpack(&rec, &bytes).unwrap(), inst);
    }
}
