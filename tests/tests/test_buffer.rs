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

use proptest::prelude::*;
use skein_core::buffer::{var_u32_len, var_u64_len, BufferWriter, Reader, SegmentedBuffer, Writer};
use skein_core::{Error, Skein, Value};

fn encode(f: impl FnOnce(&mut Writer) -> Result<(), Error>) -> Vec<u8> {
    let mut out = Vec::new();
    let mut writer = Writer::new(&mut out);
    f(&mut writer).unwrap();
    writer.commit();
    out
}

#[test]
fn test_varint_thresholds() {
    let cases: [(u32, usize); 10] = [
        (0, 1),
        (127, 1),
        (128, 2),
        ((1 << 14) - 1, 2),
        (1 << 14, 3),
        ((1 << 21) - 1, 3),
        (1 << 21, 4),
        ((1 << 28) - 1, 4),
        (1 << 28, 5),
        (u32::MAX, 5),
    ];
    for (value, len) in cases {
        let bytes = encode(|w| w.write_var_u32(value));
        assert_eq!(bytes.len(), len, "value {}", value);
        assert_eq!(var_u32_len(value), len);
    }
    assert_eq!(encode(|w| w.write_var_u64(1 << 28)).len(), 9);
    assert_eq!(var_u64_len(u64::MAX), 9);
}

#[test]
fn test_varint_layout() {
    assert_eq!(encode(|w| w.write_var_u32(127)), vec![0x7F]);
    assert_eq!(encode(|w| w.write_var_u32(128)), vec![0x80, 0x80]);
    assert_eq!(encode(|w| w.write_var_u32(0x3FFF)), vec![0xBF, 0xFF]);
    assert_eq!(encode(|w| w.write_var_u32(0x4000)), vec![0xC0, 0x40, 0x00]);
    assert_eq!(
        encode(|w| w.write_var_u32(0x0FFF_FFFF)),
        vec![0xEF, 0xFF, 0xFF, 0xFF]
    );
    assert_eq!(
        encode(|w| w.write_var_u32(0x1000_0000)),
        vec![0xF0, 0x10, 0x00, 0x00, 0x00]
    );
    assert_eq!(
        encode(|w| w.write_var_u64(0x0102_0304_0506_0708)),
        vec![0xF0, 1, 2, 3, 4, 5, 6, 7, 8]
    );
}

#[test]
fn test_fixed_width_is_little_endian() {
    let bytes = encode(|w| {
        w.write_u16(0x0102)?;
        w.write_u32(0x0304_0506)?;
        w.write_i64(-2)
    });
    assert_eq!(
        bytes,
        vec![0x02, 0x01, 0x06, 0x05, 0x04, 0x03, 0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
    );
    let mut reader = Reader::new(&bytes);
    assert_eq!(reader.read_u16().unwrap(), 0x0102);
    assert_eq!(reader.read_u32().unwrap(), 0x0304_0506);
    assert_eq!(reader.read_i64().unwrap(), -2);
    assert!(reader.is_at_end());
}

#[test]
fn test_segmented_writes_span_segments() {
    let mut buffer = SegmentedBuffer::with_segment_size(8);
    let payload: Vec<u8> = (0..=40).collect();
    {
        let mut writer = Writer::new(&mut buffer);
        writer.write_u32(7).unwrap();
        writer.write_var_u64(u64::MAX).unwrap();
        writer.write_bytes(&payload).unwrap();
        assert_eq!(writer.position(), 4 + 9 + payload.len());
        writer.commit();
    }
    assert!(buffer.segment_count() > 1);
    assert_eq!(buffer.len(), 4 + 9 + payload.len());

    let mut reader = buffer.reader();
    assert_eq!(reader.read_u32().unwrap(), 7);
    assert_eq!(reader.read_var_u64().unwrap(), u64::MAX);
    assert_eq!(reader.read_bytes(payload.len()).unwrap().as_ref(), payload.as_slice());
    assert!(reader.is_at_end());
}

#[test]
fn test_reader_crosses_segment_boundaries() {
    let bytes = encode(|w| {
        w.write_var_u32(1 << 20)?;
        w.write_f64(1.5)?;
        w.write_bytes(b"segmented")
    });
    for split in 0..bytes.len() {
        let (head, tail) = bytes.split_at(split);
        let mut reader = Reader::from_segments([head, tail]);
        assert_eq!(reader.read_var_u32().unwrap(), 1 << 20);
        assert_eq!(reader.read_f64().unwrap(), 1.5);
        assert_eq!(reader.read_bytes(9).unwrap().as_ref(), b"segmented");
        assert!(reader.is_at_end(), "split at {}", split);
    }
}

#[test]
fn test_truncated_input_is_out_of_bound() {
    let bytes = encode(|w| w.write_var_u32(1 << 21));
    let mut reader = Reader::new(&bytes[..2]);
    assert!(matches!(
        reader.read_var_u32(),
        Err(Error::BufferOutOfBound(..))
    ));
    let mut reader = Reader::new(&[1, 2]);
    assert!(reader.skip(3).is_err());
}

#[test]
fn test_invalid_varint_prefix() {
    let mut reader = Reader::new(&[0xF8, 0, 0, 0, 0]);
    assert!(matches!(reader.read_var_u32(), Err(Error::InvalidData(_))));
}

/// Sink that hands out spans half the requested length.
struct ShortSpanSink;

impl BufferWriter for ShortSpanSink {
    fn get_span(&mut self, size_hint: usize) -> Result<Vec<u8>, Error> {
        Ok(vec![0; size_hint / 2])
    }

    fn advance(&mut self, _span: Vec<u8>, _written: usize) {}
}

#[test]
fn test_short_span_is_allocation_failure() {
    let mut sink = ShortSpanSink;
    let mut writer = Writer::new(&mut sink);
    assert!(matches!(writer.allocate(8), Err(Error::BufferAllocation(_))));
    assert!(matches!(writer.write_u64(1), Err(Error::BufferAllocation(_))));

    let skein = Skein::default();
    assert!(matches!(
        skein.serialize_into(&Value::I32(1), &mut ShortSpanSink),
        Err(Error::BufferAllocation(_))
    ));
    // The failure does not poison later operations.
    assert_eq!(skein.serialize(&Value::I32(1)).unwrap(), [0, 0x08, 0x08, 0x02]);
}

#[test]
fn test_oversized_request_is_allocation_failure() {
    let mut out = Vec::new();
    let mut writer = Writer::new(&mut out);
    assert!(matches!(
        writer.allocate(usize::MAX),
        Err(Error::BufferAllocation(_))
    ));
}

proptest! {
    #[test]
    fn prop_var_u32_bijection(value: u32) {
        let bytes = encode(|w| w.write_var_u32(value));
        prop_assert_eq!(bytes.len(), var_u32_len(value));
        let mut reader = Reader::new(&bytes);
        prop_assert_eq!(reader.read_var_u32().unwrap(), value);
        prop_assert!(reader.is_at_end());
    }

    #[test]
    fn prop_var_u64_bijection(value: u64) {
        let bytes = encode(|w| w.write_var_u64(value));
        prop_assert_eq!(bytes.len(), var_u64_len(value));
        let mut reader = Reader::new(&bytes);
        prop_assert_eq!(reader.read_var_u64().unwrap(), value);
        prop_assert!(reader.is_at_end());
    }

    #[test]
    fn prop_var_i64_bijection(value: i64) {
        let bytes = encode(|w| w.write_var_i64(value));
        let mut reader = Reader::new(&bytes);
        prop_assert_eq!(reader.read_var_i64().unwrap(), value);
    }
}
