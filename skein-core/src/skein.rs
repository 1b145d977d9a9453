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

use std::sync::{Arc, Mutex, OnceLock};

use log::debug;

use crate::buffer::{BufferWriter, Reader, Writer};
use crate::codec::{
    read_field, write_field, Activator, FieldCodec, GeneralizedCodec, PartialSerializer,
    ValueSerializer,
};
use crate::config::{CodecConfig, Config, Producer};
use crate::bail;
use crate::error::Error;
use crate::meta::{DefaultTypeNameCodec, Type, TypeNameCodec, WellKnownTypes, WellKnownTypesBuilder};
use crate::resolver::codec_registry::CodecRegistry;
use crate::resolver::pool::Pool;
use crate::resolver::session::Session;
use crate::value::Value;
use crate::wire::read_field_header;

struct Runtime {
    registry: Arc<CodecRegistry>,
    sessions: Pool<Session>,
}

/// Entry point of the serialization engine.
///
/// A `Skein` collects registrations, then builds its codec registry on the
/// first serialize or deserialize call. From then on the instance can be
/// shared across threads and further registrations are rejected with
/// [`Error::RegistryFrozen`].
///
/// ```rust
/// use skein_core::{Skein, Value};
///
/// let skein = Skein::default().max_depth(32);
/// let bytes = skein.serialize(&Value::from("hello")).unwrap();
/// let value = skein.deserialize(&bytes).unwrap();
/// assert_eq!(value.as_str(), Some("hello"));
/// ```
pub struct Skein {
    config: Config,
    codecs: CodecConfig,
    well_known: WellKnownTypesBuilder,
    type_names: Arc<dyn TypeNameCodec>,
    runtime: OnceLock<Runtime>,
    init: Mutex<()>,
}

impl Default for Skein {
    fn default() -> Self {
        Skein {
            config: Config::default(),
            codecs: CodecConfig::with_builtins(),
            well_known: WellKnownTypes::builder(),
            type_names: Arc::new(DefaultTypeNameCodec),
            runtime: OnceLock::new(),
            init: Mutex::new(()),
        }
    }
}

impl Skein {
    /// Sets the maximum nesting of runtime-type dispatch within one operation.
    /// Fields whose static type is concrete do not count.
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Sets the size of each segment allocated while writing.
    pub fn segment_size(mut self, segment_size: usize) -> Self {
        self.config.segment_size = segment_size;
        self
    }

    /// Replaces the codec used for `Encoded` type names.
    pub fn type_name_codec(mut self, type_names: Arc<dyn TypeNameCodec>) -> Self {
        self.type_names = type_names;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registry built from the registrations, initializing it if needed.
    pub fn registry(&self) -> Result<&Arc<CodecRegistry>, Error> {
        Ok(&self.runtime()?.registry)
    }

    fn runtime(&self) -> Result<&Runtime, Error> {
        if let Some(runtime) = self.runtime.get() {
            return Ok(runtime);
        }
        let _guard = self
            .init
            .lock()
            .map_err(|_| Error::invalid_data("Registry initialization lock is poisoned"))?;
        if let Some(runtime) = self.runtime.get() {
            return Ok(runtime);
        }
        debug!("Building codec registry");
        let well_known = self.well_known.clone().build()?;
        let registry = Arc::new(CodecRegistry::new(
            self.codecs.clone(),
            well_known,
            self.type_names.clone(),
        ));
        let max_depth = self.config.max_depth;
        let pooled = registry.clone();
        let runtime = Runtime {
            registry,
            sessions: Pool::new(
                move || Session::new(pooled.clone(), max_depth),
                Session::reset,
            ),
        };
        Ok(self.runtime.get_or_init(|| runtime))
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.runtime.get().is_some() {
            return Err(Error::registry_frozen(
                "Cannot register after the first serialize or deserialize call",
            ));
        }
        Ok(())
    }

    /// Serializes `value` with `object` as the expected type.
    pub fn serialize(&self, value: &Value) -> Result<Vec<u8>, Error> {
        self.serialize_as(value, &Type::object())
    }

    /// Serializes `value` as a field whose static type is `expected`.
    pub fn serialize_as(&self, value: &Value, expected: &Type) -> Result<Vec<u8>, Error> {
        let mut output = Vec::with_capacity(self.config.segment_size);
        self.write_root(value, expected, &mut output)?;
        Ok(output)
    }

    /// Serializes `value` into caller-provided storage, such as a
    /// [`SegmentedBuffer`](crate::buffer::SegmentedBuffer).
    pub fn serialize_into(&self, value: &Value, output: &mut dyn BufferWriter) -> Result<(), Error> {
        self.write_root(value, &Type::object(), output)
    }

    fn write_root(
        &self,
        value: &Value,
        expected: &Type,
        output: &mut dyn BufferWriter,
    ) -> Result<(), Error> {
        let runtime = self.runtime()?;
        let segment_size = self.config.segment_size;
        runtime.sessions.borrow_mut(|session| {
            let mut writer = Writer::with_segment_size(output, segment_size);
            write_field(&mut writer, session, 0, expected, value)?;
            writer.commit();
            Ok(())
        })
    }

    /// Deserializes a value written with `object` as the expected type.
    pub fn deserialize(&self, bytes: &[u8]) -> Result<Value, Error> {
        self.deserialize_as(bytes, &Type::object())
    }

    pub fn deserialize_as(&self, bytes: &[u8], expected: &Type) -> Result<Value, Error> {
        self.read_root(Reader::new(bytes), expected)
    }

    /// Deserializes a value whose bytes are split across several segments.
    pub fn deserialize_segments(&self, segments: &[&[u8]]) -> Result<Value, Error> {
        self.read_root(Reader::from_segments(segments.iter().copied()), &Type::object())
    }

    fn read_root(&self, mut reader: Reader, expected: &Type) -> Result<Value, Error> {
        let runtime = self.runtime()?;
        runtime.sessions.borrow_mut(|session| {
            let field = read_field_header(&mut reader, session)?;
            let value = read_field(&mut reader, session, expected, &field)?;
            if !reader.is_at_end() {
                bail!("{} trailing bytes after the top-level value", reader.remaining());
            }
            Ok(value)
        })
    }

    pub fn register_codec<C: FieldCodec + 'static>(&mut self, ty: Type, codec: C) -> Result<(), Error> {
        self.ensure_open()?;
        debug!("Registering codec for {}", ty);
        self.codecs.add_codec(ty, Arc::new(codec));
        Ok(())
    }

    /// Registers a factory instantiated once per closed form of `definition`.
    pub fn register_generic_codec<F>(&mut self, definition: Type, factory: F) -> Result<(), Error>
    where
        F: Fn(&Type) -> Result<Arc<dyn FieldCodec>, Error> + Send + Sync + 'static,
    {
        self.ensure_open()?;
        ensure_definition(&definition)?;
        self.codecs.add_generic_codec(definition, Arc::new(factory));
        Ok(())
    }

    pub fn register_partial_serializer<S: PartialSerializer + 'static>(
        &mut self,
        ty: Type,
        serializer: S,
    ) -> Result<(), Error> {
        self.ensure_open()?;
        self.codecs
            .add_partial_serializer(ty, Producer::Instance(Arc::new(serializer)));
        Ok(())
    }

    pub fn register_generic_partial_serializer<F>(
        &mut self,
        definition: Type,
        factory: F,
    ) -> Result<(), Error>
    where
        F: Fn(&Type) -> Result<Arc<dyn PartialSerializer>, Error> + Send + Sync + 'static,
    {
        self.ensure_open()?;
        ensure_definition(&definition)?;
        self.codecs
            .add_partial_serializer(definition, Producer::Generic(Arc::new(factory)));
        Ok(())
    }

    pub fn register_value_serializer<S: ValueSerializer + 'static>(
        &mut self,
        ty: Type,
        serializer: S,
    ) -> Result<(), Error> {
        self.ensure_open()?;
        self.codecs
            .add_value_serializer(ty, Producer::Instance(Arc::new(serializer)));
        Ok(())
    }

    pub fn register_activator<A: Activator + 'static>(
        &mut self,
        ty: Type,
        activator: A,
    ) -> Result<(), Error> {
        self.ensure_open()?;
        self.codecs
            .add_activator(ty, Producer::Instance(Arc::new(activator)));
        Ok(())
    }

    pub fn register_generic_activator<F>(&mut self, definition: Type, factory: F) -> Result<(), Error>
    where
        F: Fn(&Type) -> Result<Arc<dyn Activator>, Error> + Send + Sync + 'static,
    {
        self.ensure_open()?;
        ensure_definition(&definition)?;
        self.codecs
            .add_activator(definition, Producer::Generic(Arc::new(factory)));
        Ok(())
    }

    /// Registers a predicate-selected codec. Codecs are tried in
    /// registration order.
    pub fn register_generalized_codec<C: GeneralizedCodec + 'static>(
        &mut self,
        codec: C,
    ) -> Result<(), Error> {
        self.ensure_open()?;
        self.codecs.add_generalized_codec(codec);
        Ok(())
    }

    /// Assigns `ty` a well-known id. Conflicts surface when the registry is
    /// built.
    pub fn register_well_known_type(&mut self, id: u32, ty: Type) -> Result<(), Error> {
        self.ensure_open()?;
        self.well_known.add(id, ty);
        Ok(())
    }
}

fn ensure_definition(ty: &Type) -> Result<(), Error> {
    if !ty.is_generic_type_definition() {
        return Err(Error::unsupported_type(format!(
            "{} is not an open generic definition",
            ty
        )));
    }
    Ok(())
}
