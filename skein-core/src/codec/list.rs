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

use std::sync::Arc;

use crate::buffer::{Reader, Writer};
use crate::codec::reference::{read_reference, record_object, try_write_reference_field};
use crate::codec::{read_field, unexpected_value, write_field, FieldCodec};
use crate::error::Error;
use crate::meta::Type;
use crate::resolver::session::Session;
use crate::types::WireType;
use crate::value::{ObjectRef, Value};
use crate::wire::{read_members, write_end_object, write_start_object, Field};

/// Codec for closed `List<T>` types, instantiated from the open definition.
///
/// A list is a reference object holding a `Vec<Value>`. Elements are written
/// as consecutive fields with id `0`, each with `T` as its expected type.
#[derive(Debug)]
pub struct ListCodec {
    ty: Type,
    element: Type,
}

impl ListCodec {
    pub fn new(ty: Type) -> Result<ListCodec, Error> {
        match ty.generic_arguments() {
            [element] => Ok(ListCodec {
                element: element.clone(),
                ty,
            }),
            _ => Err(Error::unsupported_type(format!(
                "Type {} is not a closed list type",
                ty
            ))),
        }
    }

    /// Factory registered against the open `List` definition.
    pub fn factory(ty: &Type) -> Result<Arc<dyn FieldCodec>, Error> {
        Ok(Arc::new(ListCodec::new(ty.clone())?))
    }
}

impl FieldCodec for ListCodec {
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
            Value::Object(object) if *object.ty() == self.ty => object,
            Value::Null => {
                try_write_reference_field(writer, session, field_id_delta, expected, value)?;
                return Ok(());
            }
            other => return Err(unexpected_value(&self.ty, other)),
        };
        if try_write_reference_field(writer, session, field_id_delta, expected, value)? {
            return Ok(());
        }
        // Snapshot so that no lock is held while elements are written.
        let items = object.with(|items: &Vec<Value>| items.clone())?;
        write_start_object(writer, session, field_id_delta, expected, &self.ty)?;
        for item in &items {
            write_field(writer, session, 0, &self.element, item)?;
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
        let list = ObjectRef::new(self.ty.clone(), Vec::<Value>::new());
        record_object(session, &list, None);
        read_members(reader, session, |reader, session, field_id, member| {
            if field_id != 0 {
                return Ok(false);
            }
            let item = read_field(reader, session, &self.element, member)?;
            list.with_mut(|items: &mut Vec<Value>| items.push(item))?;
            Ok(true)
        })?;
        Ok(Value::Object(list))
    }
}
