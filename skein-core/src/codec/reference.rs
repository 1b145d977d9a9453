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

//! Reference fields: null, and repeated occurrences of an object.
//!
//! A new object is written in full and no id is emitted; both sides derive
//! its id from traversal order. Only repeats (and null, id `0`) are written
//! as `Reference` fields carrying an explicit id.

use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::meta::Type;
use crate::resolver::session::Session;
use crate::types::WireType;
use crate::value::{ObjectRef, Value};
use crate::wire::{write_field_header, Field};

/// Writes a `Reference` field when `value` is null or was already written in
/// this session. Returns `false` for a new object; its id has been assigned
/// and the caller must write the payload.
pub fn try_write_reference_field(
    writer: &mut Writer,
    session: &mut Session,
    field_id_delta: u32,
    expected: &Type,
    value: &Value,
) -> Result<bool, Error> {
    let object = match value {
        Value::Null => None,
        Value::Object(object) => Some(object),
        other => {
            return Err(Error::illegal_type(format!(
                "Value of type {} cannot be written as a reference",
                other.runtime_type().map_or_else(|| "null".to_string(), |t| t.to_string())
            )))
        }
    };
    let (id, already_present) = session.references_mut().get_or_add_reference(object);
    if !already_present {
        return Ok(false);
    }
    write_field_header(
        writer,
        session,
        field_id_delta,
        expected,
        None,
        WireType::Reference,
    )?;
    writer.write_var_u32(id)?;
    Ok(true)
}

/// Resolves a `Reference` field to null or a previously recorded object.
pub fn read_reference(
    reader: &mut Reader,
    session: &mut Session,
    field: &Field,
) -> Result<Value, Error> {
    field.ensure_wire_type(WireType::Reference)?;
    session.mark_value_field();
    let id = reader.read_var_u32()?;
    session
        .references()
        .try_get_referenced_object(id)
        .ok_or_else(|| {
            Error::invalid_ref(format!(
                "Reference {} does not point to a recorded object",
                id
            ))
        })
}

/// Records a decoded object at its reserved id, or at the next id.
pub fn record_object(session: &mut Session, object: &ObjectRef, reference_id: Option<u32>) -> u32 {
    session
        .references_mut()
        .record_object(object.clone(), reference_id)
}
