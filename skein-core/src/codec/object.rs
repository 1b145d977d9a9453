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

//! Codecs that dispatch on the runtime type of a value.

use crate::buffer::{Reader, Writer};
use crate::codec::reference::{read_reference, record_object, try_write_reference_field};
use crate::codec::FieldCodec;
use crate::error::Error;
use crate::meta::Type;
use crate::resolver::session::Session;
use crate::types::WireType;
use crate::value::{ObjectRef, PlainObject, Value};
use crate::wire::{read_members, write_end_object, write_start_object, Field};

/// Codec registered for the universal `object` type.
///
/// Null is written as reference `0`. A plain `object` instance is written as
/// an empty tag-delimited object; anything else is handed to the codec of
/// the value's runtime type.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectCodec;

impl FieldCodec for ObjectCodec {
    fn value_type(&self) -> Type {
        Type::object()
    }

    fn write_field(
        &self,
        writer: &mut Writer,
        session: &mut Session,
        field_id_delta: u32,
        expected: &Type,
        value: &Value,
    ) -> Result<(), Error> {
        let Some(runtime_type) = value.runtime_type() else {
            try_write_reference_field(writer, session, field_id_delta, expected, value)?;
            return Ok(());
        };
        if runtime_type.is_object() {
            if try_write_reference_field(writer, session, field_id_delta, expected, value)? {
                return Ok(());
            }
            write_start_object(writer, session, field_id_delta, expected, &runtime_type)?;
            return write_end_object(writer);
        }
        let codec = session.get_codec(&runtime_type)?;
        session.enter()?;
        codec.write_field(writer, session, field_id_delta, expected, value)?;
        session.leave();
        Ok(())
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
        match &field.field_type {
            Some(field_type) if !field_type.is_object() => {
                let codec = session.get_codec(field_type)?;
                session.enter()?;
                let value = codec.read_value(reader, session, field)?;
                session.leave();
                Ok(value)
            }
            _ if field.wire_type == WireType::TagDelimited => {
                let object = ObjectRef::new(Type::object(), PlainObject);
                record_object(session, &object, None);
                read_members(reader, session, |_, _, _, _| Ok(false))?;
                Ok(Value::Object(object))
            }
            _ => Err(Error::type_missing(format!(
                "Field with wire type {:?} does not carry the type needed to decode it",
                field.wire_type
            ))),
        }
    }
}

/// Placeholder codec for interface and abstract types.
///
/// Writes re-resolve by the value's own runtime type. Reads resolve from the
/// type carried in the field header, which is always present because no
/// value can have an abstract type as its exact runtime type.
#[derive(Clone, Debug)]
pub struct AbstractTypeCodec {
    ty: Type,
}

impl AbstractTypeCodec {
    pub fn new(ty: Type) -> AbstractTypeCodec {
        AbstractTypeCodec { ty }
    }
}

impl FieldCodec for AbstractTypeCodec {
    fn value_type(&self) -> Type {
        self.ty.clone()
    }

    fn write_field(
        &self,
        writer: &mut Writer,
        session: &mut Session,
        field_id_delta: u32,
        expected: &Type,
        value: &Value,
    ) -> Result<(), Error> {
        let Some(runtime_type) = value.runtime_type() else {
            try_write_reference_field(writer, session, field_id_delta, expected, value)?;
            return Ok(());
        };
        if runtime_type == self.ty {
            return Err(Error::illegal_type(format!(
                "Type {} is abstract and cannot have instances",
                self.ty
            )));
        }
        let codec = session.get_codec(&runtime_type)?;
        session.enter()?;
        codec.write_field(writer, session, field_id_delta, expected, value)?;
        session.leave();
        Ok(())
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
        let field_type = field.field_type.as_ref().ok_or_else(|| {
            Error::type_missing(format!(
                "Field of abstract type {} does not specify its concrete type",
                self.ty
            ))
        })?;
        if *field_type == self.ty {
            return Err(Error::illegal_type(format!(
                "Type {} is abstract and cannot have instances",
                self.ty
            )));
        }
        let codec = session.get_codec(field_type)?;
        session.enter()?;
        let value = codec.read_value(reader, session, field)?;
        session.leave();
        Ok(value)
    }
}
