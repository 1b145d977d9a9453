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

use chrono::{DateTime, NaiveDateTime};

use crate::buffer::{Reader, Writer};
use crate::codec::{unexpected_value, FieldCodec};
use crate::error::Error;
use crate::meta::Type;
use crate::resolver::session::Session;
use crate::types::WireType;
use crate::value::Value;
use crate::wire::{write_field_header, Field};

fn write_length_prefixed(writer: &mut Writer, bytes: &[u8]) -> Result<(), Error> {
    let len = u32::try_from(bytes.len()).map_err(|_| {
        Error::buffer_allocation(format!("Payload of {} bytes is too large", bytes.len()))
    })?;
    writer.write_var_u32(len)?;
    writer.write_bytes(bytes)
}

fn read_length_prefixed(reader: &mut Reader, field: &Field) -> Result<Vec<u8>, Error> {
    field.ensure_wire_type(WireType::LengthPrefixed)?;
    let len = reader.read_var_u32()? as usize;
    Ok(reader.read_bytes(len)?.into_owned())
}

/// UTF-8 strings, written length-prefixed.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringCodec;

impl FieldCodec for StringCodec {
    fn value_type(&self) -> Type {
        Type::string()
    }

    fn write_field(
        &self,
        writer: &mut Writer,
        session: &mut Session,
        field_id_delta: u32,
        expected: &Type,
        value: &Value,
    ) -> Result<(), Error> {
        let Value::String(v) = value else {
            return Err(unexpected_value(&Type::string(), value));
        };
        session.mark_value_field();
        write_field_header(
            writer,
            session,
            field_id_delta,
            expected,
            Some(&Type::string()),
            WireType::LengthPrefixed,
        )?;
        write_length_prefixed(writer, v.as_bytes())
    }

    fn read_value(
        &self,
        reader: &mut Reader,
        session: &mut Session,
        field: &Field,
    ) -> Result<Value, Error> {
        session.mark_value_field();
        let bytes = read_length_prefixed(reader, field)?;
        String::from_utf8(bytes)
            .map(Value::String)
            .map_err(|e| Error::invalid_data(format!("String is not valid UTF-8: {}", e)))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BytesCodec;

impl FieldCodec for BytesCodec {
    fn value_type(&self) -> Type {
        Type::bytes()
    }

    fn write_field(
        &self,
        writer: &mut Writer,
        session: &mut Session,
        field_id_delta: u32,
        expected: &Type,
        value: &Value,
    ) -> Result<(), Error> {
        let Value::Bytes(v) = value else {
            return Err(unexpected_value(&Type::bytes(), value));
        };
        session.mark_value_field();
        write_field_header(
            writer,
            session,
            field_id_delta,
            expected,
            Some(&Type::bytes()),
            WireType::LengthPrefixed,
        )?;
        write_length_prefixed(writer, v)
    }

    fn read_value(
        &self,
        reader: &mut Reader,
        session: &mut Session,
        field: &Field,
    ) -> Result<Value, Error> {
        session.mark_value_field();
        read_length_prefixed(reader, field).map(Value::Bytes)
    }
}

/// `NaiveDateTime` as microseconds since the Unix epoch, `Fixed64`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimestampCodec;

impl FieldCodec for TimestampCodec {
    fn value_type(&self) -> Type {
        Type::timestamp()
    }

    fn write_field(
        &self,
        writer: &mut Writer,
        session: &mut Session,
        field_id_delta: u32,
        expected: &Type,
        value: &Value,
    ) -> Result<(), Error> {
        let Value::Timestamp(v) = value else {
            return Err(unexpected_value(&Type::timestamp(), value));
        };
        session.mark_value_field();
        write_field_header(
            writer,
            session,
            field_id_delta,
            expected,
            Some(&Type::timestamp()),
            WireType::Fixed64,
        )?;
        writer.write_i64(v.and_utc().timestamp_micros())
    }

    fn read_value(
        &self,
        reader: &mut Reader,
        session: &mut Session,
        field: &Field,
    ) -> Result<Value, Error> {
        session.mark_value_field();
        field.ensure_wire_type(WireType::Fixed64)?;
        let micros = reader.read_i64()?;
        let secs = micros.div_euclid(1_000_000);
        let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
        let datetime: NaiveDateTime = DateTime::from_timestamp(secs, nanos)
            .ok_or_else(|| Error::invalid_data(format!("Timestamp {} is out of range", micros)))?
            .naive_utc();
        Ok(Value::Timestamp(datetime))
    }
}
