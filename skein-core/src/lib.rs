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

//! # Skein Core
//!
//! Runtime engine of the skein object-graph serialization framework. It
//! writes arbitrary graphs of values, including shared and cyclic
//! references and fields of interface or abstract type, into a compact
//! self-describing binary format that tolerates schema evolution.
//!
//! ## Architecture
//!
//! - **`skein`**: the [`Skein`] entry point and its registration API
//! - **`buffer`**: segmented writer and reader with prefix varints
//! - **`wire`**: field headers, tag-delimited framing and field skipping
//! - **`resolver`**: per-operation sessions, reference tables, the session
//!   pool and the codec registry
//! - **`codec`**: codec contracts, adapters and the built-in codecs
//! - **`meta`**: type descriptors, well-known ids and type-name encoding
//! - **`value`**: the dynamically typed values codecs exchange
//! - **`types`**: wire-level enums and the tag byte
//! - **`config`**: runtime options and registration tables
//! - **`error`**: the error type shared by every layer
//!
//! ## Wire model
//!
//! Every value is a field: a varint field-id delta, a tag byte holding the
//! wire type and schema type, an optional type identity and a payload whose
//! shape is fully determined by the wire type. Objects are tag-delimited
//! and closed by an explicit end marker, so a reader can skip any field it
//! does not know without understanding its contents.
//!
//! Object references are positional. Each field occurrence advances a
//! per-operation counter; the first occurrence of an object is written in
//! full and later occurrences are written as a `Reference` field carrying
//! the id the counter assigned. Decoders activate and record an instance
//! before reading its members, which lets members point back at it.
//!
//! ## Usage
//!
//! ```rust
//! use skein_core::{Skein, Type, Value};
//!
//! let skein = Skein::default();
//! let bytes = skein.serialize_as(&Value::I64(1 << 50), &Type::i64()).unwrap();
//! assert_eq!(skein.deserialize_as(&bytes, &Type::i64()).unwrap(), Value::I64(1 << 50));
//! ```

pub mod buffer;
pub mod codec;
pub mod config;
pub mod error;
pub mod meta;
pub mod resolver;
pub mod skein;
pub mod types;
pub mod util;
pub mod value;
pub mod wire;

pub use crate::buffer::{BufferWriter, Reader, SegmentedBuffer, Writer};
pub use crate::codec::{
    Activator, DefaultActivator, FieldCodec, FnActivator, GeneralizedCodec, PartialSerializer,
    ValueSerializer,
};
pub use crate::config::{CodecConfig, Config, Producer};
pub use crate::error::Error;
pub use crate::meta::{Type, TypeKind, WellKnownTypes};
pub use crate::resolver::codec_registry::CodecRegistry;
pub use crate::resolver::session::Session;
pub use crate::skein::Skein;
pub use crate::types::{ExtendedWireType, SchemaType, WireType};
pub use crate::value::{ObjectRef, StructValue, Value};
