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

//! Type identity codec.
//!
//! A type reference travels in one of three forms: the id of a well-known
//! type, the id of a type already mentioned in the current session, or the
//! encoded name on first mention (after which the type joins the session
//! table). Field headers use the form directly; [`TypeSerializerCodec`]
//! wraps it in a tag-delimited object for fields whose value is a `Type`.

use crate::buffer::{Reader, Writer};
use crate::codec::reference::{read_reference, try_write_reference_field};
use crate::codec::{unexpected_value, FieldCodec};
use crate::error::Error;
use crate::meta::Type;
use crate::resolver::session::Session;
use crate::types::{SchemaType, WireType};
use crate::value::Value;
use crate::wire::{read_members, write_end_object, write_field_header, write_start_object, Field};

const SCHEMA_TYPE_FIELD: u32 = 0;
const ENCODED_NAME_FIELD: u32 = 1;
const TYPE_ID_FIELD: u32 = 2;

pub enum TypeIdentity {
    WellKnown(u32),
    Referenced(u32),
    Encoded(Vec<u8>),
}

impl TypeIdentity {
    /// Picks the most compact form for `ty`. An encoded type is recorded in
    /// the session so that later mentions are written as references.
    pub fn resolve(session: &mut Session, ty: &Type) -> Result<TypeIdentity, Error> {
        if let Some(identity) = TypeIdentity::lookup(session, ty) {
            return Ok(identity);
        }
        let name = session.type_names().encode(ty)?;
        session.types_mut().record(ty.clone());
        Ok(TypeIdentity::Encoded(name))
    }

    /// The id form of `ty`, if it has one. Records nothing.
    pub fn lookup(session: &Session, ty: &Type) -> Option<TypeIdentity> {
        if let Some(id) = session.well_known_types().get_id(ty) {
            return Some(TypeIdentity::WellKnown(id));
        }
        session.types().get_id(ty).map(TypeIdentity::Referenced)
    }

    pub fn schema_type(&self) -> SchemaType {
        match self {
            TypeIdentity::WellKnown(_) => SchemaType::WellKnown,
            TypeIdentity::Referenced(_) => SchemaType::Referenced,
            TypeIdentity::Encoded(_) => SchemaType::Encoded,
        }
    }

    pub fn write_payload(&self, writer: &mut Writer) -> Result<(), Error> {
        match self {
            TypeIdentity::WellKnown(id) | TypeIdentity::Referenced(id) => writer.write_var_u32(*id),
            TypeIdentity::Encoded(name) => write_encoded_name(writer, name),
        }
    }
}

fn write_encoded_name(writer: &mut Writer, name: &[u8]) -> Result<(), Error> {
    writer.write_var_u32(name.len() as u32)?;
    writer.write_bytes(name)
}

fn read_encoded_name(reader: &mut Reader, session: &mut Session) -> Result<Type, Error> {
    let len = reader.read_var_u32()? as usize;
    if len == 0 {
        return Err(Error::type_missing("Encoded type has an empty name payload"));
    }
    let bytes = reader.read_bytes(len)?;
    let ty = session.type_names().decode(&bytes)?;
    session.types_mut().record(ty.clone());
    Ok(ty)
}

fn lookup_well_known(session: &Session, id: u32) -> Result<Type, Error> {
    session
        .well_known_types()
        .get_type(id)
        .cloned()
        .ok_or_else(|| Error::unknown_well_known_type(id))
}

fn lookup_referenced(session: &Session, id: u32) -> Result<Type, Error> {
    session
        .types()
        .get_type(id)
        .cloned()
        .ok_or_else(|| Error::unknown_referenced_type(id))
}

/// Reads the type payload following a tag byte. `Expected` carries none.
pub fn read_type_identity(
    reader: &mut Reader,
    session: &mut Session,
    schema_type: SchemaType,
) -> Result<Option<Type>, Error> {
    match schema_type {
        SchemaType::Expected => Ok(None),
        SchemaType::WellKnown => {
            let id = reader.read_var_u32()?;
            lookup_well_known(session, id).map(Some)
        }
        SchemaType::Referenced => {
            let id = reader.read_var_u32()?;
            lookup_referenced(session, id).map(Some)
        }
        SchemaType::Encoded => read_encoded_name(reader, session).map(Some),
    }
}

/// Codec for fields whose value is itself a [`Type`].
///
/// ```text
/// TagDelimited {
///   0: schema type (VarInt)
///   1: VarInt 0, header typed with the encoded name   -- Encoded
///   2: id (VarInt)                                     -- WellKnown, Referenced
/// }
/// ```
///
/// The encoded name rides in a field header so that a reader skipping the
/// value still records the type and keeps later type ids aligned.
#[derive(Clone, Copy, Debug, Default)]
pub struct TypeSerializerCodec;

impl FieldCodec for TypeSerializerCodec {
    fn value_type(&self) -> Type {
        Type::type_type()
    }

    fn write_field(
        &self,
        writer: &mut Writer,
        session: &mut Session,
        field_id_delta: u32,
        expected: &Type,
        value: &Value,
    ) -> Result<(), Error> {
        let ty = match value {
            Value::Type(ty) => ty,
            Value::Null => {
                try_write_reference_field(writer, session, field_id_delta, expected, value)?;
                return Ok(());
            }
            other => return Err(unexpected_value(&self.value_type(), other)),
        };
        session.mark_value_field();
        write_start_object(writer, session, field_id_delta, expected, &Type::type_type())?;
        let identity = TypeIdentity::lookup(session, ty);
        let schema_type = identity
            .as_ref()
            .map_or(SchemaType::Encoded, TypeIdentity::schema_type);

        session.mark_value_field();
        write_field_header(
            writer,
            session,
            SCHEMA_TYPE_FIELD,
            &Type::u32(),
            None,
            WireType::VarInt,
        )?;
        writer.write_var_u64(u8::from(schema_type) as u64)?;

        session.mark_value_field();
        match identity {
            None | Some(TypeIdentity::Encoded(_)) => {
                write_field_header(
                    writer,
                    session,
                    ENCODED_NAME_FIELD - SCHEMA_TYPE_FIELD,
                    &Type::type_type(),
                    Some(ty),
                    WireType::VarInt,
                )?;
                writer.write_var_u64(0)?;
            }
            Some(TypeIdentity::WellKnown(id)) | Some(TypeIdentity::Referenced(id)) => {
                write_field_header(
                    writer,
                    session,
                    TYPE_ID_FIELD - SCHEMA_TYPE_FIELD,
                    &Type::u32(),
                    None,
                    WireType::VarInt,
                )?;
                writer.write_var_u64(id as u64)?;
            }
        }
        write_end_object(writer)
    }

    fn read_value(
        &self,
        reader: &mut Reader,
        session: &mut Session,
        field: &Field,
    ) -> Result<Value, Error> {
        if field.wire_type == WireType::Reference {
            return read_reference(reader, session, field);
        }
        field.ensure_wire_type(WireType::TagDelimited)?;
        session.mark_value_field();
        let mut schema_type = None;
        let mut id = None;
        let mut encoded = None;
        read_members(reader, session, |reader, session, field_id, member| {
            match field_id {
                SCHEMA_TYPE_FIELD => {
                    member.ensure_wire_type(WireType::VarInt)?;
                    session.mark_value_field();
                    let raw = reader.read_var_u64()?;
                    let parsed = u8::try_from(raw)
                        .ok()
                        .and_then(|raw| SchemaType::try_from(raw).ok())
                        .ok_or_else(|| {
                            Error::invalid_data(format!("Invalid schema type {}", raw))
                        })?;
                    schema_type = Some(parsed);
                }
                ENCODED_NAME_FIELD => {
                    member.ensure_wire_type(WireType::VarInt)?;
                    session.mark_value_field();
                    reader.read_var_u64()?;
                    encoded = member.field_type.clone();
                }
                TYPE_ID_FIELD => {
                    member.ensure_wire_type(WireType::VarInt)?;
                    session.mark_value_field();
                    let raw = reader.read_var_u64()?;
                    id = Some(u32::try_from(raw).map_err(|_| {
                        Error::invalid_data(format!("Type id {} out of range", raw))
                    })?);
                }
                _ => return Ok(false),
            }
            Ok(true)
        })?;

        let ty = match schema_type {
            Some(SchemaType::WellKnown) => {
                let id = id.ok_or_else(|| Error::type_missing("Well-known type id is missing"))?;
                lookup_well_known(session, id)?
            }
            Some(SchemaType::Referenced) => {
                let id = id.ok_or_else(|| Error::type_missing("Referenced type id is missing"))?;
                lookup_referenced(session, id)?
            }
            Some(SchemaType::Encoded) => {
                encoded.ok_or_else(|| Error::type_missing("Encoded type name is missing"))?
            }
            Some(SchemaType::Expected) | None => {
                return Err(Error::type_missing(
                    "Type value does not specify how the type is encoded",
                ))
            }
        };
        Ok(Value::Type(ty))
    }
}
