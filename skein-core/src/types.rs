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

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::Error;

/// Shape of a field payload. Says nothing about what the field means.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum WireType {
    VarInt = 0,
    TagDelimited = 1,
    LengthPrefixed = 2,
    Fixed32 = 3,
    Fixed64 = 4,
    Reference = 5,
    Extended = 7,
}

/// How the concrete type of a field is conveyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SchemaType {
    /// The concrete type equals the statically expected type; nothing follows.
    Expected = 0,
    WellKnown = 1,
    Encoded = 2,
    Referenced = 3,
}

/// Payload-less markers carried by [`WireType::Extended`] tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ExtendedWireType {
    EndTagDelimited = 0,
    EndBaseFields = 1,
}

/// The tag byte following a field id delta.
///
/// ```text
/// bit  7 6 5   4 3          2 1 0
///      wire    schema/ext   reserved (zero)
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(u8);

impl Tag {
    pub const WIRE_TYPE_MASK: u8 = 0b1110_0000;
    pub const SCHEMA_TYPE_MASK: u8 = 0b0001_1000;
    pub const RESERVED_MASK: u8 = 0b0000_0111;

    pub fn new(wire_type: WireType, schema_type: SchemaType) -> Tag {
        Tag((u8::from(wire_type) << 5) | (u8::from(schema_type) << 3))
    }

    pub fn extended(extended: ExtendedWireType) -> Tag {
        Tag((u8::from(WireType::Extended) << 5) | (u8::from(extended) << 3))
    }

    pub fn from_raw(raw: u8) -> Result<Tag, Error> {
        if raw & Tag::RESERVED_MASK != 0 {
            return Err(Error::invalid_data(format!(
                "Reserved bits set in tag byte 0x{:02x}",
                raw
            )));
        }
        Ok(Tag(raw))
    }

    #[inline(always)]
    pub fn raw(self) -> u8 {
        self.0
    }

    pub fn wire_type(self) -> Result<WireType, Error> {
        let raw = self.0 >> 5;
        WireType::try_from(raw)
            .map_err(|_| Error::unknown_wire_type(format!("Unknown wire type {}", raw)))
    }

    pub fn schema_type(self) -> SchemaType {
        match (self.0 & Tag::SCHEMA_TYPE_MASK) >> 3 {
            0 => SchemaType::Expected,
            1 => SchemaType::WellKnown,
            2 => SchemaType::Encoded,
            _ => SchemaType::Referenced,
        }
    }

    pub fn extended_wire_type(self) -> ExtendedWireType {
        match (self.0 & Tag::SCHEMA_TYPE_MASK) >> 3 {
            0 => ExtendedWireType::EndTagDelimited,
            1 => ExtendedWireType::EndBaseFields,
            raw => {
                // Codes 2 and 3 are unassigned; treat them as terminators.
                log::debug!("unassigned extended wire type {}", raw);
                ExtendedWireType::EndTagDelimited
            }
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.wire_type() {
            Ok(WireType::Extended) => write!(f, "Tag({:?})", self.extended_wire_type()),
            Ok(wire) => write!(f, "Tag({:?}, {:?})", wire, self.schema_type()),
            Err(_) => write!(f, "Tag(0x{:02x})", self.0),
        }
    }
}
