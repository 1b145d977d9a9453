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

//! Self-describing field framing.
//!
//! ```text
//! field   := delta:varint tag:u8 [type] payload
//! type    := id:varint                 (WellKnown, Referenced)
//!          | len:varint name:bytes     (Encoded)
//! end     := 0:varint tag(Extended)
//! ```

mod field;
mod skip;

pub use field::{
    read_field_header, read_members, write_end_base_fields, write_end_object, write_field_header,
    write_start_object, Field,
};
pub use skip::skip_field;
