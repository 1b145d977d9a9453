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

//! Codec contracts and the built-in codecs.
//!
//! A [`FieldCodec`] owns the complete encoding of one type: header framing,
//! reference handling and payload. Member-only logic is expressed through
//! [`PartialSerializer`] (reference types) or [`ValueSerializer`] (value
//! types); the registry wraps those in framing adapters. An [`Activator`]
//! creates the blank instance a decoder records before reading members, which
//! is what allows descendants to point back at a parent that is still being
//! built.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::meta::Type;
use crate::resolver::session::Session;
use crate::types::WireType;
use crate::value::{ObjectRef, StructValue, Value};
use crate::wire::Field;

pub mod adapter;
pub mod list;
pub mod number;
pub mod object;
pub mod reference;
pub mod string;
pub mod type_codec;

pub trait FieldCodec: Send + Sync {
    /// Type whose values this codec writes and returns.
    fn value_type(&self) -> Type;

    fn write_field(
        &self,
        writer: &mut Writer,
        session: &mut Session,
        field_id_delta: u32,
        expected: &Type,
        value: &Value,
    ) -> Result<(), Error>;

    fn read_value(
        &self,
        reader: &mut Reader,
        session: &mut Session,
        field: &Field,
    ) -> Result<Value, Error>;

    /// Codec wrapped by an adapter, if any.
    fn inner_codec(&self) -> Option<&Arc<dyn FieldCodec>> {
        None
    }
}

/// A codec selected by predicate rather than by registered type.
pub trait GeneralizedCodec: FieldCodec {
    fn is_supported_type(&self, ty: &Type) -> bool;
}

/// Writes and reads only the members a type itself declares. No header, no
/// end marker on write, no reference bookkeeping: those belong to the codec
/// wrapping the serializer. `deserialize` consumes members up to and
/// including the terminating marker.
pub trait PartialSerializer: Send + Sync {
    fn serialize(
        &self,
        writer: &mut Writer,
        session: &mut Session,
        value: &ObjectRef,
    ) -> Result<(), Error>;

    fn deserialize(
        &self,
        reader: &mut Reader,
        session: &mut Session,
        value: &ObjectRef,
    ) -> Result<(), Error>;
}

/// Member-only logic for value types.
pub trait ValueSerializer: Send + Sync {
    fn serialize(
        &self,
        writer: &mut Writer,
        session: &mut Session,
        value: &StructValue,
    ) -> Result<(), Error>;

    fn deserialize(&self, reader: &mut Reader, session: &mut Session)
        -> Result<StructValue, Error>;
}

pub trait Activator: Send + Sync {
    fn create(&self) -> Result<ObjectRef, Error>;
}

/// Activates `T::default()` under a fixed type.
pub struct DefaultActivator<T> {
    ty: Type,
    _marker: PhantomData<fn() -> T>,
}

impl<T> DefaultActivator<T> {
    pub fn new(ty: Type) -> Self {
        DefaultActivator {
            ty,
            _marker: PhantomData,
        }
    }
}

impl<T: Default + Send + Sync + 'static> Activator for DefaultActivator<T> {
    fn create(&self) -> Result<ObjectRef, Error> {
        Ok(ObjectRef::new(self.ty.clone(), T::default()))
    }
}

/// Activator backed by a closure.
pub struct FnActivator<F>(pub F);

impl<F> Activator for FnActivator<F>
where
    F: Fn() -> Result<ObjectRef, Error> + Send + Sync,
{
    fn create(&self) -> Result<ObjectRef, Error> {
        (self.0)()
    }
}

/// Writes `value` through the codec registered for `expected`. Null is
/// written as reference `0` whatever the expected type.
pub fn write_field(
    writer: &mut Writer,
    session: &mut Session,
    field_id_delta: u32,
    expected: &Type,
    value: &Value,
) -> Result<(), Error> {
    if value.is_null() {
        reference::try_write_reference_field(writer, session, field_id_delta, expected, value)?;
        return Ok(());
    }
    let codec = session.get_codec(expected)?;
    codec.write_field(writer, session, field_id_delta, expected, value)
}

/// Reads the payload of `field` through the codec registered for `expected`.
/// `Reference` fields resolve without consulting the codec.
pub fn read_field(
    reader: &mut Reader,
    session: &mut Session,
    expected: &Type,
    field: &Field,
) -> Result<Value, Error> {
    if field.wire_type == WireType::Reference {
        return reference::read_reference(reader, session, field);
    }
    let codec = session.get_codec(expected)?;
    codec.read_value(reader, session, field)
}

#[cold]
pub(crate) fn unexpected_value(codec_type: &Type, value: &Value) -> Error {
    match value.runtime_type() {
        Some(actual) => Error::illegal_type(format!(
            "Codec for {} cannot write a value of type {}",
            codec_type, actual
        )),
        None => Error::illegal_type(format!("Codec for {} cannot write null", codec_type)),
    }
}
