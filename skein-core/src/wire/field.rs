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

use crate::buffer::{Reader, Writer};
use crate::codec::type_codec::{read_type_identity, TypeIdentity};
use crate::error::Error;
use crate::meta::Type;
use crate::resolver::session::Session;
use crate::types::{ExtendedWireType, SchemaType, Tag, WireType};
use crate::wire::skip::skip_field;

/// A decoded field header.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub field_id_delta: u32,
    pub wire_type: WireType,
    pub schema_type: SchemaType,
    /// Set for [`WireType::Extended`] markers only.
    pub extended_wire_type: Option<ExtendedWireType>,
    /// Concrete type carried by the header. `None` means "the expected type".
    pub field_type: Option<Type>,
}

impl Field {
    pub fn is_end_object(&self) -> bool {
        self.extended_wire_type == Some(ExtendedWireType::EndTagDelimited)
    }

    pub fn is_end_base_fields(&self) -> bool {
        self.extended_wire_type == Some(ExtendedWireType::EndBaseFields)
    }

    pub fn is_end_base_or_end_object(&self) -> bool {
        self.extended_wire_type.is_some()
    }

    pub fn has_field_type(&self) -> bool {
        self.field_type.is_some()
    }

    /// Fails with `UnknownWireType` unless the payload has the given shape.
    pub fn ensure_wire_type(&self, expected: WireType) -> Result<(), Error> {
        if self.wire_type != expected {
            return Err(Error::unknown_wire_type(format!(
                "Expected wire type {:?} but found {:?}",
                expected, self.wire_type
            )));
        }
        Ok(())
    }
}

/// Writes a field header.
///
/// The concrete type is written only when `actual` differs from
/// `expected`, preferring a well-known id, then a type already mentioned in
/// this session, then the encoded name.
pub fn write_field_header(
    writer: &mut Writer,
    session: &mut Session,
    field_id_delta: u32,
    expected: &Type,
    actual: Option<&Type>,
    wire_type: WireType,
) -> Result<(), Error> {
    writer.write_var_u32(field_id_delta)?;
    match actual {
        Some(actual) if actual != expected => {
            let identity = TypeIdentity::resolve(session, actual)?;
            writer.write_u8(Tag::new(wire_type, identity.schema_type()).raw())?;
            identity.write_payload(writer)
        }
        _ => writer.write_u8(Tag::new(wire_type, SchemaType::Expected).raw()),
    }
}

/// Opens a tag-delimited object.
#[inline(always)]
pub fn write_start_object(
    writer: &mut Writer,
    session: &mut Session,
    field_id_delta: u32,
    expected: &Type,
    actual: &Type,
) -> Result<(), Error> {
    write_field_header(
        writer,
        session,
        field_id_delta,
        expected,
        Some(actual),
        WireType::TagDelimited,
    )
}

pub fn write_end_object(writer: &mut Writer) -> Result<(), Error> {
    writer.write_var_u32(0)?;
    writer.write_u8(Tag::extended(ExtendedWireType::EndTagDelimited).raw())
}

/// Separates base-type members from derived-type members.
pub fn write_end_base_fields(writer: &mut Writer) -> Result<(), Error> {
    writer.write_var_u32(0)?;
    writer.write_u8(Tag::extended(ExtendedWireType::EndBaseFields).raw())
}

pub fn read_field_header(reader: &mut Reader, session: &mut Session) -> Result<Field, Error> {
    let field_id_delta = reader.read_var_u32()?;
    let tag = Tag::from_raw(reader.read_u8()?)?;
    let wire_type = tag.wire_type()?;
    if wire_type == WireType::Extended {
        return Ok(Field {
            field_id_delta,
            wire_type,
            schema_type: SchemaType::Expected,
            extended_wire_type: Some(tag.extended_wire_type()),
            field_type: None,
        });
    }
    let schema_type = tag.schema_type();
    let field_type = read_type_identity(reader, session, schema_type)?;
    Ok(Field {
        field_id_delta,
        wire_type,
        schema_type,
        extended_wire_type: None,
        field_type,
    })
}

/// Drives the member loop of a tag-delimited object.
///
/// `f` receives each field with its absolute id and returns whether it
/// consumed the payload; unconsumed fields are skipped. Returns after
/// reading either end marker.
pub fn read_members<F>(reader: &mut Reader, session: &mut Session, mut f: F) -> Result<(), Error>
where
    F: FnMut(&mut Reader, &mut Session, u32, &Field) -> Result<bool, Error>,
{
    let mut field_id: u32 = 0;
    loop {
        let field = read_field_header(reader, session)?;
        if field.is_end_base_or_end_object() {
            return Ok(());
        }
        field_id = field_id.checked_add(field.field_id_delta).ok_or_else(|| {
            Error::invalid_data(format!(
                "Field id overflow: {} + {}",
                field_id, field.field_id_delta
            ))
        })?;
        if !f(reader, session, field_id, &field)? {
            skip_field(reader, session, &field)?;
        }
    }
}
