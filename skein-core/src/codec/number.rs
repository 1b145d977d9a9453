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

//! Codecs for `bool`, `char`, the integer types and the float types.
//!
//! Integers prefer `VarInt` and switch to a fixed-width payload once the
//! magnitude makes the varint form larger: above `2^20` for values that fit
//! in 32 bits, above `2^41` otherwise. Readers accept any of the three
//! integer wire types and narrow with an overflow check.

use paste::paste;

use crate::buffer::{Reader, Writer};
use crate::codec::{unexpected_value, FieldCodec};
use crate::error::Error;
use crate::meta::Type;
use crate::resolver::session::Session;
use crate::types::WireType;
use crate::value::Value;
use crate::wire::{write_field_header, Field};

const FIXED32_THRESHOLD: u64 = 1 << 20;
const FIXED64_THRESHOLD: u64 = 1 << 41;

#[inline(always)]
fn integer_wire_type(magnitude: u64, fits_32_bits: bool) -> WireType {
    if fits_32_bits {
        if magnitude > FIXED32_THRESHOLD {
            WireType::Fixed32
        } else {
            WireType::VarInt
        }
    } else if magnitude > FIXED64_THRESHOLD {
        WireType::Fixed64
    } else {
        WireType::VarInt
    }
}

fn write_signed(
    writer: &mut Writer,
    session: &mut Session,
    field_id_delta: u32,
    expected: &Type,
    actual: &Type,
    value: i64,
) -> Result<(), Error> {
    let wire_type = integer_wire_type(value.unsigned_abs(), i32::try_from(value).is_ok());
    write_field_header(writer, session, field_id_delta, expected, Some(actual), wire_type)?;
    match wire_type {
        WireType::Fixed32 => writer.write_i32(value as i32),
        WireType::Fixed64 => writer.write_i64(value),
        _ => writer.write_var_i64(value),
    }
}

fn write_unsigned(
    writer: &mut Writer,
    session: &mut Session,
    field_id_delta: u32,
    expected: &Type,
    actual: &Type,
    value: u64,
) -> Result<(), Error> {
    let wire_type = integer_wire_type(value, u32::try_from(value).is_ok());
    write_field_header(writer, session, field_id_delta, expected, Some(actual), wire_type)?;
    match wire_type {
        WireType::Fixed32 => writer.write_u32(value as u32),
        WireType::Fixed64 => writer.write_u64(value),
        _ => writer.write_var_u64(value),
    }
}

fn read_signed(reader: &mut Reader, field: &Field) -> Result<i64, Error> {
    match field.wire_type {
        WireType::VarInt => reader.read_var_i64(),
        WireType::Fixed32 => Ok(reader.read_i32()? as i64),
        WireType::Fixed64 => reader.read_i64(),
        other => Err(unsupported_wire_type(other, "an integer")),
    }
}

fn read_unsigned(reader: &mut Reader, field: &Field) -> Result<u64, Error> {
    match field.wire_type {
        WireType::VarInt => reader.read_var_u64(),
        WireType::Fixed32 => Ok(reader.read_u32()? as u64),
        WireType::Fixed64 => reader.read_u64(),
        other => Err(unsupported_wire_type(other, "an integer")),
    }
}

#[cold]
fn unsupported_wire_type(wire_type: WireType, what: &str) -> Error {
    Error::unknown_wire_type(format!(
        "Wire type {:?} cannot hold {}",
        wire_type, what
    ))
}

#[cold]
fn overflow<V: std::fmt::Display>(value: V, target: &str) -> Error {
    Error::invalid_data(format!("Value {} does not fit in {}", value, target))
}

macro_rules! impl_integer_codec {
    ($($variant:ident: $ty:ident => $kind:ident),* $(,)?) => {
        paste! {
            $(
                #[derive(Clone, Copy, Debug, Default)]
                pub struct [<$variant Codec>];

                impl FieldCodec for [<$variant Codec>] {
                    fn value_type(&self) -> Type {
                        Type::$ty()
                    }

                    fn write_field(
                        &self,
                        writer: &mut Writer,
                        session: &mut Session,
                        field_id_delta: u32,
                        expected: &Type,
                        value: &Value,
                    ) -> Result<(), Error> {
                        let Value::$variant(v) = value else {
                            return Err(unexpected_value(&Type::$ty(), value));
                        };
                        session.mark_value_field();
                        [<write_ $kind>](
                            writer,
                            session,
                            field_id_delta,
                            expected,
                            &Type::$ty(),
                            (*v).into(),
                        )
                    }

                    fn read_value(
                        &self,
                        reader: &mut Reader,
                        session: &mut Session,
                        field: &Field,
                    ) -> Result<Value, Error> {
                        session.mark_value_field();
                        let raw = [<read_ $kind>](reader, field)?;
                        $ty::try_from(raw)
                            .map(Value::$variant)
                            .map_err(|_| overflow(raw, stringify!($ty)))
                    }
                }
            )*
        }
    };
}

impl_integer_codec!(
    I8: i8 => signed,
    I16: i16 => signed,
    I32: i32 => signed,
    I64: i64 => signed,
    U8: u8 => unsigned,
    U16: u16 => unsigned,
    U32: u32 => unsigned,
    U64: u64 => unsigned,
);

#[derive(Clone, Copy, Debug, Default)]
pub struct BoolCodec;

impl FieldCodec for BoolCodec {
    fn value_type(&self) -> Type {
        Type::bool()
    }

    fn write_field(
        &self,
        writer: &mut Writer,
        session: &mut Session,
        field_id_delta: u32,
        expected: &Type,
        value: &Value,
    ) -> Result<(), Error> {
        let Value::Bool(v) = value else {
            return Err(unexpected_value(&Type::bool(), value));
        };
        session.mark_value_field();
        write_field_header(
            writer,
            session,
            field_id_delta,
            expected,
            Some(&Type::bool()),
            WireType::VarInt,
        )?;
        writer.write_var_u32(*v as u32)
    }

    fn read_value(
        &self,
        reader: &mut Reader,
        session: &mut Session,
        field: &Field,
    ) -> Result<Value, Error> {
        session.mark_value_field();
        Ok(Value::Bool(read_unsigned(reader, field)? != 0))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CharCodec;

impl FieldCodec for CharCodec {
    fn value_type(&self) -> Type {
        Type::char()
    }

    fn write_field(
        &self,
        writer: &mut Writer,
        session: &mut Session,
        field_id_delta: u32,
        expected: &Type,
        value: &Value,
    ) -> Result<(), Error> {
        let Value::Char(v) = value else {
            return Err(unexpected_value(&Type::char(), value));
        };
        session.mark_value_field();
        write_field_header(
            writer,
            session,
            field_id_delta,
            expected,
            Some(&Type::char()),
            WireType::VarInt,
        )?;
        writer.write_var_u32(*v as u32)
    }

    fn read_value(
        &self,
        reader: &mut Reader,
        session: &mut Session,
        field: &Field,
    ) -> Result<Value, Error> {
        session.mark_value_field();
        let raw = read_unsigned(reader, field)?;
        u32::try_from(raw)
            .ok()
            .and_then(char::from_u32)
            .map(Value::Char)
            .ok_or_else(|| overflow(raw, "char"))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct F32Codec;

impl FieldCodec for F32Codec {
    fn value_type(&self) -> Type {
        Type::f32()
    }

    fn write_field(
        &self,
        writer: &mut Writer,
        session: &mut Session,
        field_id_delta: u32,
        expected: &Type,
        value: &Value,
    ) -> Result<(), Error> {
        let Value::F32(v) = value else {
            return Err(unexpected_value(&Type::f32(), value));
        };
        session.mark_value_field();
        write_field_header(
            writer,
            session,
            field_id_delta,
            expected,
            Some(&Type::f32()),
            WireType::Fixed32,
        )?;
        writer.write_f32(*v)
    }

    fn read_value(
        &self,
        reader: &mut Reader,
        session: &mut Session,
        field: &Field,
    ) -> Result<Value, Error> {
        session.mark_value_field();
        match field.wire_type {
            WireType::Fixed32 => Ok(Value::F32(reader.read_f32()?)),
            other => Err(unsupported_wire_type(other, "an f32")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct F64Codec;

impl FieldCodec for F64Codec {
    fn value_type(&self) -> Type {
        Type::f64()
    }

    fn write_field(
        &self,
        writer: &mut Writer,
        session: &mut Session,
        field_id_delta: u32,
        expected: &Type,
        value: &Value,
    ) -> Result<(), Error> {
        let Value::F64(v) = value else {
            return Err(unexpected_value(&Type::f64(), value));
        };
        session.mark_value_field();
        write_field_header(
            writer,
            session,
            field_id_delta,
            expected,
            Some(&Type::f64()),
            WireType::Fixed64,
        )?;
        writer.write_f64(*v)
    }

    fn read_value(
        &self,
        reader: &mut Reader,
        session: &mut Session,
        field: &Field,
    ) -> Result<Value, Error> {
        session.mark_value_field();
        match field.wire_type {
            WireType::Fixed64 => Ok(Value::F64(reader.read_f64()?)),
            // An f32 payload widens losslessly.
            WireType::Fixed32 => Ok(Value::F64(reader.read_f32()? as f64)),
            other => Err(unsupported_wire_type(other, "an f64")),
        }
    }
}
