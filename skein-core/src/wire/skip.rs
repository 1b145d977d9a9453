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

use crate::bail;
use crate::buffer::Reader;
use crate::error::Error;
use crate::resolver::session::Session;
use crate::types::WireType;
use crate::wire::field::{read_field_header, Field};

/// Consumes the payload of a field the reader does not understand, using
/// nothing but its wire type.
///
/// One reference id is consumed per skipped field header, nested ones
/// included, so ids assigned after the skipped field stay aligned with the
/// encoder. Objects inside the skipped payload are never recorded; a later
/// reference to one of them fails with `InvalidRef`.
pub fn skip_field(reader: &mut Reader, session: &mut Session, field: &Field) -> Result<(), Error> {
    session.mark_value_field();
    match field.wire_type {
        WireType::TagDelimited => skip_tag_delimited(reader, session),
        wire_type => skip_payload(reader, wire_type),
    }
}

fn skip_payload(reader: &mut Reader, wire_type: WireType) -> Result<(), Error> {
    match wire_type {
        WireType::Extended => bail!("Cannot skip an end marker"),
        WireType::TagDelimited => bail!("Tag-delimited payloads are skipped by nesting level"),
        WireType::VarInt => {
            reader.read_var_u64()?;
        }
        WireType::Fixed32 => reader.skip(4)?,
        WireType::Fixed64 => reader.skip(8)?,
        WireType::LengthPrefixed => {
            let len = reader.read_var_u32()? as usize;
            reader.skip(len)?;
        }
        WireType::Reference => {
            reader.read_var_u32()?;
        }
    }
    Ok(())
}

/// Skips nested objects by counting open levels, so arbitrarily deep
/// content never recurses.
fn skip_tag_delimited(reader: &mut Reader, session: &mut Session) -> Result<(), Error> {
    let mut open: usize = 1;
    while open > 0 {
        let field = read_field_header(reader, session)?;
        if field.is_end_object() {
            open -= 1;
            continue;
        }
        if field.is_end_base_fields() {
            continue;
        }
        session.mark_value_field();
        if field.wire_type == WireType::TagDelimited {
            open += 1;
        } else {
            skip_payload(reader, field.wire_type)?;
        }
    }
    Ok(())
}
