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

//! Codecs built by the registry around member-only serializers, and the
//! adapters that convert between typed and `object` codecs.

use std::sync::Arc;

use crate::buffer::{Reader, Writer};
use crate::codec::reference::{read_reference, record_object, try_write_reference_field};
use crate::codec::{unexpected_value, FieldCodec, PartialSerializer, ValueSerializer};
use crate::error::Error;
use crate::meta::Type;
use crate::resolver::session::Session;
use crate::types::WireType;
use crate::value::Value;
use crate::wire::{write_end_object, write_start_object, Field};

/// Full codec for a reference type described by a [`PartialSerializer`].
///
/// Supplies reference tracking, activation and framing. On decode the
/// instance is activated and recorded before its members are read, so that
/// members can refer back to it.
pub struct ConcreteTypeCodec {
    ty: Type,
    serializer: Arc<dyn PartialSerializer>,
}

impl ConcreteTypeCodec {
    pub fn new(ty: Type, serializer: Arc<dyn PartialSerializer>) -> ConcreteTypeCodec {
        ConcreteTypeCodec { ty, serializer }
    }
}

impl FieldCodec for ConcreteTypeCodec {
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
        let object = match value {
            Value::Null => {
                try_write_reference_field(writer, session, field_id_delta, expected, value)?;
                return Ok(());
            }
            Value::Object(object) => object,
            other => return Err(unexpected_value(&self.ty, other)),
        };
        if *object.ty() != self.ty {
            // A derived type; its own codec frames it.
            let codec = session.get_codec(object.ty())?;
            return codec.write_field(writer, session, field_id_delta, expected, value);
        }
        if try_write_reference_field(writer, session, field_id_delta, expected, value)? {
            return Ok(());
        }
        write_start_object(writer, session, field_id_delta, expected, &self.ty)?;
        self.serializer.serialize(writer, session, object)?;
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
        if let Some(field_type) = &field.field_type {
            if *field_type != self.ty {
                let codec = session.get_codec(field_type)?;
                return codec.read_value(reader, session, field);
            }
        }
        field.ensure_wire_type(WireType::TagDelimited)?;

        let placeholder = session.references_mut().create_record_placeholder();
        let activator = session.registry().get_activator(&self.ty)?;
        let object = activator.create()?;
        if *object.ty() != self.ty {
            return Err(Error::illegal_type(format!(
                "Activator for {} produced an instance of {}",
                self.ty,
                object.ty()
            )));
        }
        record_object(session, &object, Some(placeholder));

        self.serializer.deserialize(reader, session, &object)?;
        Ok(Value::Object(object))
    }
}

/// Full codec for a value type described by a [`ValueSerializer`].
pub struct ValueSerializerCodec {
    ty: Type,
    serializer: Arc<dyn ValueSerializer>,
}

impl ValueSerializerCodec {
    pub fn new(ty: Type, serializer: Arc<dyn ValueSerializer>) -> ValueSerializerCodec {
        ValueSerializerCodec { ty, serializer }
    }
}

impl FieldCodec for ValueSerializerCodec {
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
        let value = match value {
            Value::Struct(v) if *v.ty() == self.ty => v,
            other => return Err(unexpected_value(&self.ty, other)),
        };
        session.mark_value_field();
        write_start_object(writer, session, field_id_delta, expected, &self.ty)?;
        self.serializer.serialize(writer, session, value)?;
        write_end_object(writer)
    }

    fn read_value(
        &self,
        reader: &mut Reader,
        session: &mut Session,
        field: &Field,
    ) -> Result<Value, Error> {
        if let Some(field_type) = &field.field_type {
            if *field_type != self.ty {
                let codec = session.get_codec(field_type)?;
                return codec.read_value(reader, session, field);
            }
        }
        field.ensure_wire_type(WireType::TagDelimited)?;
        session.mark_value_field();
        let value = self.serializer.deserialize(reader, session)?;
        if *value.ty() != self.ty {
            return Err(Error::illegal_type(format!(
                "Value serializer for {} produced a value of type {}",
                self.ty,
                value.ty()
            )));
        }
        Ok(Value::Struct(value))
    }
}

/// Presents an `object` codec as a codec for one specific type.
///
/// Values of any other type are rejected in both directions.
pub struct TypedCodecAdapter {
    ty: Type,
    inner: Arc<dyn FieldCodec>,
}

impl TypedCodecAdapter {
    pub fn new(ty: Type, inner: Arc<dyn FieldCodec>) -> TypedCodecAdapter {
        TypedCodecAdapter { ty, inner }
    }

    fn check(&self, value: &Value) -> Result<(), Error> {
        match value.runtime_type() {
            Some(actual) if actual != self.ty => Err(Error::illegal_type(format!(
                "Expected a value of type {} but found {}",
                self.ty, actual
            ))),
            _ => Ok(()),
        }
    }
}

impl FieldCodec for TypedCodecAdapter {
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
        self.check(value)?;
        self.inner
            .write_field(writer, session, field_id_delta, expected, value)
    }

    fn read_value(
        &self,
        reader: &mut Reader,
        session: &mut Session,
        field: &Field,
    ) -> Result<Value, Error> {
        let value = self.inner.read_value(reader, session, field)?;
        self.check(&value)?;
        Ok(value)
    }

    fn inner_codec(&self) -> Option<&Arc<dyn FieldCodec>> {
        Some(&self.inner)
    }
}

/// Presents a typed codec as an `object` codec.
pub struct UntypedCodecAdapter {
    inner: Arc<dyn FieldCodec>,
}

impl UntypedCodecAdapter {
    pub fn new(inner: Arc<dyn FieldCodec>) -> UntypedCodecAdapter {
        UntypedCodecAdapter { inner }
    }
}

impl FieldCodec for UntypedCodecAdapter {
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
        self.inner
            .write_field(writer, session, field_id_delta, expected, value)
    }

    fn read_value(
        &self,
        reader: &mut Reader,
        session: &mut Session,
        field: &Field,
    ) -> Result<Value, Error> {
        self.inner.read_value(reader, session, field)
    }

    fn inner_codec(&self) -> Option<&Arc<dyn FieldCodec>> {
        Some(&self.inner)
    }
}
