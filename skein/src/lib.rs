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

//! # Skein
//!
//! Object-graph binary serialization with shared and cyclic references,
//! polymorphic fields and schema evolution.
//!
//! Types are described at runtime with [`Type`] and serialized through
//! codecs registered on a [`Skein`] instance. Reference types implement
//! [`PartialSerializer`] plus an [`Activator`]; value types implement
//! [`ValueSerializer`]. Fields the reader does not know are skipped from
//! their wire type alone.
//!
//! ```rust
//! use skein::{Skein, Type, Value};
//!
//! let skein = Skein::default();
//! let list = Value::from(skein::ObjectRef::list(
//!     Type::i32(),
//!     vec![Value::I32(1), Value::I32(2)],
//! ));
//! let bytes = skein.serialize(&list).unwrap();
//! let decoded = skein.deserialize(&bytes).unwrap();
//! let items = decoded
//!     .as_object()
//!     .unwrap()
//!     .with(|items: &Vec<Value>| items.clone())
//!     .unwrap();
//! assert_eq!(items, vec![Value::I32(1), Value::I32(2)]);
//! ```

pub use skein_core::{
    bail, ensure, error::Error, skein::Skein, wire, Activator, CodecConfig, Config,
    DefaultActivator, FieldCodec, FnActivator, GeneralizedCodec, ObjectRef, PartialSerializer,
    Reader, SchemaType, SegmentedBuffer, Session, StructValue, Type, TypeKind, Value,
    ValueSerializer, WellKnownTypes, WireType, Writer,
};
