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

//! Segmented buffer engine.
//!
//! [`Writer`] writes into a sequence of independently allocated segments
//! handed out by a [`BufferWriter`]; [`Reader`] reads back from one or more
//! borrowed segments behind a single logical cursor. Fixed-width integers
//! are little-endian. Variable-length integers use a prefix encoding in which
//! the number of leading one bits of the first byte gives the number of
//! additional bytes, and the value itself is stored big-endian:
//!
//! | value range      | bytes | first byte  |
//! |------------------|-------|-------------|
//! | `< 2^7`          | 1     | `0xxxxxxx`  |
//! | `< 2^14`         | 2     | `10xxxxxx`  |
//! | `< 2^21`         | 3     | `110xxxxx`  |
//! | `< 2^28`         | 4     | `1110xxxx`  |
//! | 32-bit otherwise | 5     | `11110000`  |
//! | 64-bit otherwise | 9     | `11110000`  |

use std::borrow::Cow;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::ensure;
use crate::error::Error;

/// Marker byte of the escaped varint form.
pub const VARINT_ESCAPE: u8 = 0xF0;

/// Upper bound of a single segment request.
pub const MAX_SEGMENT_SIZE: usize = i32::MAX as usize;

pub const DEFAULT_SEGMENT_SIZE: usize = 4096;

/// Smallest span a `Vec<u8>` sink hands out.
const MIN_VEC_SPAN_SIZE: usize = 64;

/// A sink that hands out writable segments and takes them back once filled.
///
/// `get_span` must return a buffer of at least `size_hint` bytes (any
/// length when the hint is zero). `advance` transfers ownership of the span
/// back together with the number of bytes that were actually written to it.
pub trait BufferWriter {
    fn get_span(&mut self, size_hint: usize) -> Result<Vec<u8>, Error>;

    fn advance(&mut self, span: Vec<u8>, written: usize);
}

impl BufferWriter for Vec<u8> {
    fn get_span(&mut self, size_hint: usize) -> Result<Vec<u8>, Error> {
        ensure!(
            size_hint <= MAX_SEGMENT_SIZE,
            Error::buffer_allocation(format!(
                "Requested buffer length {} cannot be satisfied",
                size_hint
            ))
        );
        Ok(vec![0; size_hint.max(MIN_VEC_SPAN_SIZE)])
    }

    fn advance(&mut self, span: Vec<u8>, written: usize) {
        self.extend_from_slice(&span[..written]);
    }
}

/// Growable list of segments. Committed segments are never moved or copied.
#[derive(Debug, Clone)]
pub struct SegmentedBuffer {
    segments: Vec<Vec<u8>>,
    segment_size: usize,
}

impl Default for SegmentedBuffer {
    fn default() -> Self {
        SegmentedBuffer::with_segment_size(DEFAULT_SEGMENT_SIZE)
    }
}

impl SegmentedBuffer {
    pub fn new() -> SegmentedBuffer {
        SegmentedBuffer::default()
    }

    pub fn with_segment_size(segment_size: usize) -> SegmentedBuffer {
        SegmentedBuffer {
            segments: Vec::new(),
            segment_size: segment_size.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> impl Iterator<Item = &[u8]> {
        self.segments.iter().map(Vec::as_slice)
    }

    /// Copies all committed bytes into one contiguous vector.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for segment in &self.segments {
            out.extend_from_slice(segment);
        }
        out
    }

    pub fn reader(&self) -> Reader<'_> {
        Reader::from_segments(self.segments())
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }
}

impl BufferWriter for SegmentedBuffer {
    fn get_span(&mut self, size_hint: usize) -> Result<Vec<u8>, Error> {
        ensure!(
            size_hint <= MAX_SEGMENT_SIZE,
            Error::buffer_allocation(format!(
                "Requested buffer length {} cannot be satisfied",
                size_hint
            ))
        );
        Ok(vec![0; size_hint.max(self.segment_size)])
    }

    fn advance(&mut self, mut span: Vec<u8>, written: usize) {
        if written == 0 {
            return;
        }
        span.truncate(written);
        self.segments.push(span);
    }
}

/// Number of bytes `write_var_u32` emits for `value`.
#[inline(always)]
pub fn var_u32_len(value: u32) -> usize {
    if value < 1 << 7 {
        1
    } else if value < 1 << 14 {
        2
    } else if value < 1 << 21 {
        3
    } else if value < 1 << 28 {
        4
    } else {
        5
    }
}

/// Number of bytes `write_var_u64` emits for `value`.
#[inline(always)]
pub fn var_u64_len(value: u64) -> usize {
    if value < 1 << 28 {
        var_u32_len(value as u32)
    } else {
        9
    }
}

#[inline(always)]
pub fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

#[inline(always)]
pub fn zigzag_decode32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

#[inline(always)]
pub fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline(always)]
pub fn zigzag_decode64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Forward-only writer over a [`BufferWriter`].
///
/// Bytes written to the current segment only become visible to the output
/// once [`Writer::commit`] is called (or implicitly, when a new segment is
/// requested).
pub struct Writer<'a> {
    output: &'a mut dyn BufferWriter,
    current: Vec<u8>,
    pos: usize,
    previous_buffers_size: usize,
    segment_size: usize,
}

impl<'a> Writer<'a> {
    /// A writer that leaves segment sizing to the sink.
    pub fn new(output: &'a mut dyn BufferWriter) -> Writer<'a> {
        Writer::with_segment_size(output, 0)
    }

    /// A writer that asks the sink for segments of at least `segment_size` bytes.
    pub fn with_segment_size(output: &'a mut dyn BufferWriter, segment_size: usize) -> Writer<'a> {
        Writer {
            output,
            current: Vec::new(),
            pos: 0,
            previous_buffers_size: 0,
            segment_size,
        }
    }

    /// Logical position across every segment written so far.
    #[inline(always)]
    pub fn position(&self) -> usize {
        self.previous_buffers_size + self.pos
    }

    pub fn commit(&mut self) {
        let span = std::mem::take(&mut self.current);
        self.output.advance(span, self.pos);
        self.previous_buffers_size += self.pos;
        self.pos = 0;
    }

    /// Makes sure the next `length` bytes fit in the current segment.
    #[inline(always)]
    pub fn ensure_contiguous(&mut self, length: usize) -> Result<(), Error> {
        if self.pos + length <= self.current.len() {
            return Ok(());
        }
        self.allocate(length)
    }

    /// Commits the current segment and requests a new one of at least `length` bytes.
    pub fn allocate(&mut self, length: usize) -> Result<(), Error> {
        self.commit();
        self.current = self.output.get_span(length.max(self.segment_size))?;
        ensure!(
            self.current.len() >= length,
            Error::buffer_allocation(format!(
                "Requested buffer length {} cannot be satisfied by the writer",
                length
            ))
        );
        Ok(())
    }

    #[inline(always)]
    fn writable(&mut self) -> &mut [u8] {
        &mut self.current[self.pos..]
    }

    pub fn write_bytes(&mut self, value: &[u8]) -> Result<(), Error> {
        if value.len() <= self.current.len() - self.pos {
            let end = self.pos + value.len();
            self.current[self.pos..end].copy_from_slice(value);
            self.pos = end;
            return Ok(());
        }
        self.write_multi_segment(value)
    }

    fn write_multi_segment(&mut self, mut input: &[u8]) -> Result<(), Error> {
        loop {
            let write_size = (self.current.len() - self.pos).min(input.len());
            let end = self.pos + write_size;
            self.current[self.pos..end].copy_from_slice(&input[..write_size]);
            self.pos = end;
            input = &input[write_size..];
            if input.is_empty() {
                return Ok(());
            }
            self.allocate(input.len())?;
        }
    }

    #[inline(always)]
    pub fn write_u8(&mut self, value: u8) -> Result<(), Error> {
        self.ensure_contiguous(1)?;
        self.current[self.pos] = value;
        self.pos += 1;
        Ok(())
    }

    #[inline(always)]
    pub fn write_i8(&mut self, value: i8) -> Result<(), Error> {
        self.write_u8(value as u8)
    }

    #[inline(always)]
    pub fn write_u16(&mut self, value: u16) -> Result<(), Error> {
        self.ensure_contiguous(2)?;
        LittleEndian::write_u16(self.writable(), value);
        self.pos += 2;
        Ok(())
    }

    #[inline(always)]
    pub fn write_i16(&mut self, value: i16) -> Result<(), Error> {
        self.write_u16(value as u16)
    }

    #[inline(always)]
    pub fn write_u32(&mut self, value: u32) -> Result<(), Error> {
        self.ensure_contiguous(4)?;
        LittleEndian::write_u32(self.writable(), value);
        self.pos += 4;
        Ok(())
    }

    #[inline(always)]
    pub fn write_i32(&mut self, value: i32) -> Result<(), Error> {
        self.write_u32(value as u32)
    }

    #[inline(always)]
    pub fn write_u64(&mut self, value: u64) -> Result<(), Error> {
        self.ensure_contiguous(8)?;
        LittleEndian::write_u64(self.writable(), value);
        self.pos += 8;
        Ok(())
    }

    #[inline(always)]
    pub fn write_i64(&mut self, value: i64) -> Result<(), Error> {
        self.write_u64(value as u64)
    }

    #[inline(always)]
    pub fn write_f32(&mut self, value: f32) -> Result<(), Error> {
        self.write_u32(value.to_bits())
    }

    #[inline(always)]
    pub fn write_f64(&mut self, value: f64) -> Result<(), Error> {
        self.write_u64(value.to_bits())
    }

    pub fn write_var_u32(&mut self, value: u32) -> Result<(), Error> {
        let len = var_u32_len(value);
        self.ensure_contiguous(len)?;
        let buf = self.writable();
        match len {
            1 => buf[0] = value as u8,
            2 => BigEndian::write_u16(buf, value as u16 | 0x8000),
            3 => {
                buf[0] = (value >> 16) as u8 | 0xC0;
                BigEndian::write_u16(&mut buf[1..], value as u16);
            }
            4 => BigEndian::write_u32(buf, value | 0xE000_0000),
            _ => {
                buf[0] = VARINT_ESCAPE;
                BigEndian::write_u32(&mut buf[1..], value);
            }
        }
        self.pos += len;
        Ok(())
    }

    pub fn write_var_u64(&mut self, value: u64) -> Result<(), Error> {
        if value < 1 << 28 {
            return self.write_var_u32(value as u32);
        }
        self.ensure_contiguous(9)?;
        let buf = self.writable();
        buf[0] = VARINT_ESCAPE;
        BigEndian::write_u64(&mut buf[1..], value);
        self.pos += 9;
        Ok(())
    }

    #[inline(always)]
    pub fn write_var_i32(&mut self, value: i32) -> Result<(), Error> {
        self.write_var_u32(zigzag_encode32(value))
    }

    #[inline(always)]
    pub fn write_var_i64(&mut self, value: i64) -> Result<(), Error> {
        self.write_var_u64(zigzag_encode64(value))
    }
}

/// Cursor over one or more borrowed segments.
pub struct Reader<'a> {
    segments: Vec<&'a [u8]>,
    segment_index: usize,
    current: &'a [u8],
    pos: usize,
    previous_buffers_size: usize,
    total_len: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bf: &'a [u8]) -> Reader<'a> {
        Reader::from_segments([bf])
    }

    pub fn from_segments<I: IntoIterator<Item = &'a [u8]>>(segments: I) -> Reader<'a> {
        let segments: Vec<&'a [u8]> = segments.into_iter().collect();
        let total_len = segments.iter().map(|s| s.len()).sum();
        let current = segments.first().copied().unwrap_or(&[]);
        Reader {
            segments,
            segment_index: 0,
            current,
            pos: 0,
            previous_buffers_size: 0,
            total_len,
        }
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.previous_buffers_size + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.total_len - self.position()
    }

    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Moves to the next non-empty segment. Returns `false` when none is left.
    fn next_segment(&mut self) -> bool {
        while self.segment_index + 1 < self.segments.len() {
            self.previous_buffers_size += self.current.len();
            self.segment_index += 1;
            self.current = self.segments[self.segment_index];
            self.pos = 0;
            if !self.current.is_empty() {
                return true;
            }
        }
        false
    }

    #[inline(always)]
    fn out_of_bound(&self, length: usize) -> Error {
        Error::buffer_out_of_bound(self.position(), length, self.total_len)
    }

    #[inline(always)]
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        if self.pos >= self.current.len() && !self.next_segment() {
            return Err(self.out_of_bound(1));
        }
        let value = self.current[self.pos];
        self.pos += 1;
        Ok(value)
    }

    #[inline(always)]
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut out = [0u8; N];
        if let Some(bytes) = self.current.get(self.pos..self.pos + N) {
            out.copy_from_slice(bytes);
            self.pos += N;
            return Ok(out);
        }
        if self.remaining() < N {
            return Err(self.out_of_bound(N));
        }
        for byte in out.iter_mut() {
            *byte = self.read_u8()?;
        }
        Ok(out)
    }

    #[inline(always)]
    pub fn read_i8(&mut self) -> Result<i8, Error> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        Ok(LittleEndian::read_u16(&self.read_array::<2>()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, Error> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(LittleEndian::read_u32(&self.read_array::<4>()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        Ok(LittleEndian::read_u64(&self.read_array::<8>()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, Error> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, Error> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Reads the short forms shared by both varint widths. `Ok(None)` means
    /// the escape marker was consumed and the full-width value follows.
    #[inline(always)]
    fn read_var_prefix(&mut self) -> Result<Option<u32>, Error> {
        let first = self.read_u8()?;
        let extra = first.leading_ones();
        match extra {
            0..=3 => {
                let mut value = (first & (0x7F >> extra)) as u32;
                for _ in 0..extra {
                    value = (value << 8) | self.read_u8()? as u32;
                }
                Ok(Some(value))
            }
            _ => {
                ensure!(
                    first == VARINT_ESCAPE,
                    Error::invalid_data(format!(
                        "Invalid varint prefix 0x{:02x} at position {}",
                        first,
                        self.position() - 1
                    ))
                );
                Ok(None)
            }
        }
    }

    pub fn read_var_u32(&mut self) -> Result<u32, Error> {
        match self.read_var_prefix()? {
            Some(value) => Ok(value),
            None => Ok(BigEndian::read_u32(&self.read_array::<4>()?)),
        }
    }

    pub fn read_var_u64(&mut self) -> Result<u64, Error> {
        match self.read_var_prefix()? {
            Some(value) => Ok(value as u64),
            None => Ok(BigEndian::read_u64(&self.read_array::<8>()?)),
        }
    }

    #[inline(always)]
    pub fn read_var_i32(&mut self) -> Result<i32, Error> {
        Ok(zigzag_decode32(self.read_var_u32()?))
    }

    #[inline(always)]
    pub fn read_var_i64(&mut self) -> Result<i64, Error> {
        Ok(zigzag_decode64(self.read_var_u64()?))
    }

    /// Borrows `len` bytes when they sit in one segment, copies otherwise.
    pub fn read_bytes(&mut self, len: usize) -> Result<Cow<'a, [u8]>, Error> {
        if self.pos + len <= self.current.len() {
            let current: &'a [u8] = self.current;
            let bytes = &current[self.pos..self.pos + len];
            self.pos += len;
            return Ok(Cow::Borrowed(bytes));
        }
        if self.remaining() < len {
            return Err(self.out_of_bound(len));
        }
        let mut out = Vec::with_capacity(len);
        while out.len() < len {
            if self.pos >= self.current.len() && !self.next_segment() {
                return Err(self.out_of_bound(len - out.len()));
            }
            let take = (self.current.len() - self.pos).min(len - out.len());
            out.extend_from_slice(&self.current[self.pos..self.pos + take]);
            self.pos += take;
        }
        Ok(Cow::Owned(out))
    }

    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        if self.remaining() < len {
            return Err(self.out_of_bound(len));
        }
        let mut left = len;
        while left > 0 {
            if self.pos >= self.current.len() && !self.next_segment() {
                return Err(self.out_of_bound(left));
            }
            let take = (self.current.len() - self.pos).min(left);
            self.pos += take;
            left -= take;
        }
        Ok(())
    }
}
