// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use chrono::NaiveDate;
use skein_core::buffer::DEFAULT_SEGMENT_SIZE;
use skein_core::{BufferWriter, Error, SegmentedBuffer, Skein, Type, Value};
use tests::{models, point, point_type};

fn primitives() -> Vec<Value> {
    vec![
        Value::Bool(true),
        Value::Bool(false),
        Value::Char('λ'),
        Value::I8(-128),
        Value::U8(255),
        Value::I16(-300),
        Value::U16(60_000),
        Value::I32(i32::MIN),
        Value::I32(-1),
        Value::U32(u32::MAX),
        Value::I64(i64::MAX),
        Value::I64(-(1 << 40)),
        Value::U64(u64::MAX),
        Value::U64(0),
        Value::F32(1.25),
        Value::F64(-3.5e100),
        Value::from("hello, 世界"),
        Value::from(""),
        Value::Bytes(vec![0, 1, 2, 255]),
        Value::Bytes(vec![]),
        Value::Type(Type::class("app.Thing")),
    ]
}

#[test]
fn test_primitives_round_trip_as_object() {
    let _ = env_logger::builder().is_test(true).try_init();
    let skein = Skein::default();
    for value in primitives() {
        let bytes = skein.serialize(&value).unwrap();
        assert_eq!(skein.deserialize(&bytes).unwrap(), value, "{:?}", value);
    }
}

#[test]
fn test_primitives_round_trip_as_expected_type() {
    let skein = Skein::default();
    for value in primitives() {
        let ty = value.runtime_type().unwrap();
        let typed = skein.serialize_as(&value, &ty).unwrap();
        let untyped = skein.serialize(&value).unwrap();
        // The expected type saves the well-known id.
        assert_eq!(typed.len() + 1, untyped.len(), "{:?}", value);
        assert_eq!(skein.deserialize_as(&typed, &ty).unwrap(), value);
    }
}

#[test]
fn test_well_known_header_for_object_field() {
    let skein = Skein::default();
    // field 0, VarInt with well-known id 8, zigzag(5) = 10.
    assert_eq!(
        skein.serialize(&Value::I32(5)).unwrap(),
        vec![0x00, 0x08, 0x08, 0x0A]
    );
    assert_eq!(
        skein.serialize_as(&Value::I32(5), &Type::i32()).unwrap(),
        vec![0x00, 0x00, 0x0A]
    );
}

#[test]
fn test_integer_wire_type_selection() {
    let skein = Skein::default();
    let i32_ty = Type::i32();
    let small = skein.serialize_as(&Value::I32(1 << 20), &i32_ty).unwrap();
    assert_eq!(small[1], 0x00);

    let large = skein.serialize_as(&Value::I32((1 << 20) + 1), &i32_ty).unwrap();
    assert_eq!(large, vec![0x00, 0x60, 0x01, 0x00, 0x10, 0x00]);

    let negative = skein.serialize_as(&Value::I32(-(1 << 21)), &i32_ty).unwrap();
    assert_eq!(negative[1], 0x60);
    assert_eq!(
        skein.deserialize_as(&negative, &i32_ty).unwrap(),
        Value::I32(-(1 << 21))
    );

    let i64_ty = Type::i64();
    // Fits 32 bits: the 32-bit threshold applies even to an i64.
    let mid = skein.serialize_as(&Value::I64(1 << 30), &i64_ty).unwrap();
    assert_eq!(mid[1], 0x60);
    let wide = skein.serialize_as(&Value::I64(1 << 41), &i64_ty).unwrap();
    assert_eq!(wide[1], 0x00);
    let wider = skein.serialize_as(&Value::I64((1 << 41) + 1), &i64_ty).unwrap();
    assert_eq!(wider[1], 0x80);
    assert_eq!(wider.len(), 10);

    let u64_ty = Type::u64();
    let max = skein.serialize_as(&Value::U64(u64::MAX), &u64_ty).unwrap();
    assert_eq!(max[1], 0x80);
    assert_eq!(&max[2..], &[0xFFu8; 8][..]);
}

#[test]
fn test_narrowing_checks_range() {
    let skein = Skein::default();
    let bytes = skein.serialize_as(&Value::I64(300), &Type::i64()).unwrap();
    assert_eq!(
        skein.deserialize_as(&bytes, &Type::i16()).unwrap(),
        Value::I16(300)
    );
    assert!(matches!(
        skein.deserialize_as(&bytes, &Type::i8()),
        Err(Error::InvalidData(_))
    ));

    let unsigned = skein.serialize_as(&Value::U32(256), &Type::u32()).unwrap();
    assert!(matches!(
        skein.deserialize_as(&unsigned, &Type::u8()),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn test_integer_wire_type_mismatch() {
    let skein = Skein::default();
    let string = skein.serialize_as(&Value::from("7"), &Type::string()).unwrap();
    assert!(matches!(
        skein.deserialize_as(&string, &Type::i32()),
        Err(Error::UnknownWireType(_))
    ));
}

#[test]
fn test_invalid_utf8_is_rejected() {
    let skein = Skein::default();
    let bytes = [0x00, 0x40, 0x02, 0xFF, 0xFE];
    assert!(matches!(
        skein.deserialize_as(&bytes, &Type::string()),
        Err(Error::InvalidData(_))
    ));
    assert_eq!(
        skein.deserialize_as(&bytes, &Type::bytes()).unwrap(),
        Value::Bytes(vec![0xFF, 0xFE])
    );
}

#[test]
fn test_invalid_char_is_rejected() {
    let skein = Skein::default();
    // A surrogate code point.
    let bytes = skein.serialize_as(&Value::U32(0xD800), &Type::u32()).unwrap();
    assert!(matches!(
        skein.deserialize_as(&bytes, &Type::char()),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn test_timestamps() {
    let skein = Skein::default();
    let before_epoch = NaiveDate::from_ymd_opt(1969, 7, 20)
        .unwrap()
        .and_hms_micro_opt(20, 17, 40, 123_456)
        .unwrap();
    let recent = NaiveDate::from_ymd_opt(2024, 2, 29)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    for ts in [before_epoch, recent] {
        let value = Value::Timestamp(ts);
        let bytes = skein.serialize_as(&value, &Type::timestamp()).unwrap();
        assert_eq!(bytes.len(), 10);
        assert_eq!(bytes[1], 0x80);
        assert_eq!(skein.deserialize_as(&bytes, &Type::timestamp()).unwrap(), value);
        let bytes = skein.serialize(&value).unwrap();
        assert_eq!(skein.deserialize(&bytes).unwrap(), value);
    }
}

#[test]
fn test_float_widening() {
    let skein = Skein::default();
    let bytes = skein.serialize_as(&Value::F32(0.5), &Type::f32()).unwrap();
    assert_eq!(bytes.len(), 6);
    assert_eq!(
        skein.deserialize_as(&bytes, &Type::f64()).unwrap(),
        Value::F64(0.5)
    );
}

#[test]
fn test_value_type_round_trip() {
    let skein = models();
    let bytes = skein.serialize(&point(-7, 11)).unwrap();
    assert_eq!(skein.deserialize(&bytes).unwrap(), point(-7, 11));

    let typed = skein.serialize_as(&point(1, 2), &point_type()).unwrap();
    assert!(typed.len() < bytes.len());
    assert_eq!(
        skein.deserialize_as(&typed, &point_type()).unwrap(),
        point(1, 2)
    );
}

#[test]
fn test_plain_object() {
    let skein = Skein::default();
    let bytes = skein.serialize(&Value::new_object()).unwrap();
    // No type: a plain object is the expected type itself.
    assert_eq!(bytes, vec![0x00, 0x20, 0x00, 0xE0]);
    let decoded = skein.deserialize(&bytes).unwrap();
    assert_eq!(decoded.runtime_type(), Some(Type::object()));
}

#[test]
fn test_null_root() {
    let skein = Skein::default();
    let bytes = skein.serialize(&Value::Null).unwrap();
    assert_eq!(skein.deserialize(&bytes).unwrap(), Value::Null);
    assert_eq!(
        skein.deserialize_as(&bytes, &Type::i32()).unwrap(),
        Value::Null
    );
}

#[test]
fn test_segmented_output_and_input() {
    let skein = Skein::default().segment_size(16);
    let value = Value::from("a string long enough to span several small segments");
    let mut buffer = SegmentedBuffer::with_segment_size(8);
    skein.serialize_into(&value, &mut buffer).unwrap();
    assert!(buffer.segment_count() > 1);

    let flat = buffer.to_vec();
    assert_eq!(flat, skein.serialize(&value).unwrap());
    let segments: Vec<&[u8]> = buffer.segments().collect();
    assert_eq!(skein.deserialize_segments(&segments).unwrap(), value);

    let (head, tail) = flat.split_at(3);
    assert_eq!(skein.deserialize_segments(&[head, &[], tail]).unwrap(), value);
}

/// Sink that records every span request and hands out exactly what was asked.
#[derive(Default)]
struct RecordingSink {
    requests: Vec<usize>,
    bytes: Vec<u8>,
}

impl BufferWriter for RecordingSink {
    fn get_span(&mut self, size_hint: usize) -> Result<Vec<u8>, Error> {
        self.requests.push(size_hint);
        Ok(vec![0; size_hint])
    }

    fn advance(&mut self, span: Vec<u8>, written: usize) {
        self.bytes.extend_from_slice(&span[..written]);
    }
}

#[test]
fn test_configured_segment_size_reaches_the_sink() {
    let value = Value::from("x".repeat(100));

    let skein = Skein::default().segment_size(16);
    let mut sink = RecordingSink::default();
    skein.serialize_into(&value, &mut sink).unwrap();
    assert_eq!(sink.requests[0], 16);
    assert!(sink.requests.len() > 1);
    assert!(sink.requests.iter().all(|&n| n >= 16));
    assert_eq!(sink.bytes, skein.serialize(&value).unwrap());

    let mut sink = RecordingSink::default();
    Skein::default().serialize_into(&value, &mut sink).unwrap();
    assert_eq!(sink.requests, [DEFAULT_SEGMENT_SIZE]);
}
