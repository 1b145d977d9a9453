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

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use log::debug;

use crate::codec::adapter::{
    ConcreteTypeCodec, TypedCodecAdapter, UntypedCodecAdapter, ValueSerializerCodec,
};
use crate::codec::object::AbstractTypeCodec;
use crate::codec::{Activator, FieldCodec, PartialSerializer, ValueSerializer};
use crate::config::{CodecConfig, GeneralizedEntry, Producer};
use crate::error::Error;
use crate::meta::{Type, TypeNameCodec, WellKnownTypes};

/// Process-wide map from types to the codecs that serialize them.
///
/// The registration tables are fixed at construction. Resolved codecs are
/// cached per `(runtime type, requested type)` for the registry's lifetime;
/// two threads resolving the same key concurrently may both build a codec,
/// and whichever is inserted last is kept.
pub struct CodecRegistry {
    codecs: HashMap<Type, Producer<dyn FieldCodec>>,
    partial_serializers: HashMap<Type, Producer<dyn PartialSerializer>>,
    value_serializers: HashMap<Type, Producer<dyn ValueSerializer>>,
    activators: HashMap<Type, Producer<dyn Activator>>,
    generalized: Vec<GeneralizedEntry>,
    well_known: WellKnownTypes,
    type_names: Arc<dyn TypeNameCodec>,
    resolved: DashMap<(Type, Type), Arc<dyn FieldCodec>>,
    partial_instances: DashMap<Type, Arc<dyn PartialSerializer>>,
    value_instances: DashMap<Type, Arc<dyn ValueSerializer>>,
    activator_instances: DashMap<Type, Arc<dyn Activator>>,
}

impl CodecRegistry {
    pub fn new(
        config: CodecConfig,
        well_known: WellKnownTypes,
        type_names: Arc<dyn TypeNameCodec>,
    ) -> CodecRegistry {
        debug!(
            "Initializing codec registry: {} codecs, {} partial serializers, {} value serializers, {} activators, {} generalized codecs, {} well-known types",
            config.codecs.len(),
            config.partial_serializers.len(),
            config.value_serializers.len(),
            config.activators.len(),
            config.generalized.len(),
            well_known.len()
        );
        CodecRegistry {
            codecs: config.codecs,
            partial_serializers: config.partial_serializers,
            value_serializers: config.value_serializers,
            activators: config.activators,
            generalized: config.generalized,
            well_known,
            type_names,
            resolved: DashMap::new(),
            partial_instances: DashMap::new(),
            value_instances: DashMap::new(),
            activator_instances: DashMap::new(),
        }
    }

    #[inline(always)]
    pub fn well_known_types(&self) -> &WellKnownTypes {
        &self.well_known
    }

    #[inline(always)]
    pub fn type_names(&self) -> &dyn TypeNameCodec {
        self.type_names.as_ref()
    }

    /// Codec for fields whose static type is `ty`.
    pub fn get_codec(&self, ty: &Type) -> Result<Arc<dyn FieldCodec>, Error> {
        self.get_codec_for(ty, ty)
    }

    /// Codec for values of type `runtime`, adapted to present `requested` as
    /// its value type.
    pub fn get_codec_for(
        &self,
        runtime: &Type,
        requested: &Type,
    ) -> Result<Arc<dyn FieldCodec>, Error> {
        let key = (runtime.clone(), requested.clone());
        if let Some(codec) = self.resolved.get(&key) {
            return Ok(codec.value().clone());
        }
        let codec = self.create_codec(runtime)?;
        let codec = adapt(codec, requested)?;
        debug!("Resolved codec for {} requested as {}", runtime, requested);
        self.resolved.insert(key, codec.clone());
        Ok(codec)
    }

    pub fn get_partial_serializer(&self, ty: &Type) -> Result<Arc<dyn PartialSerializer>, Error> {
        find(&self.partial_serializers, &self.partial_instances, ty)?
            .ok_or_else(|| Error::partial_serializer_not_found(ty.to_string()))
    }

    pub fn get_value_serializer(&self, ty: &Type) -> Result<Arc<dyn ValueSerializer>, Error> {
        find(&self.value_serializers, &self.value_instances, ty)?
            .ok_or_else(|| Error::value_serializer_not_found(ty.to_string()))
    }

    pub fn get_activator(&self, ty: &Type) -> Result<Arc<dyn Activator>, Error> {
        find(&self.activators, &self.activator_instances, ty)?
            .ok_or_else(|| Error::activator_not_found(ty.to_string()))
    }

    fn create_codec(&self, ty: &Type) -> Result<Arc<dyn FieldCodec>, Error> {
        ensure_supported(ty)?;

        let subject = ty.definition().unwrap_or_else(|| ty.clone());
        if let Some(producer) = self.codecs.get(&subject) {
            if producer.is_generic() {
                debug!("Instantiating codec for {}", ty);
            }
            return producer.produce(ty);
        }
        if let Some(serializer) = find(&self.partial_serializers, &self.partial_instances, ty)? {
            return Ok(Arc::new(ConcreteTypeCodec::new(ty.clone(), serializer)));
        }
        if let Some(serializer) = find(&self.value_serializers, &self.value_instances, ty)? {
            return Ok(Arc::new(ValueSerializerCodec::new(ty.clone(), serializer)));
        }

        if !ty.is_constructed_generic_type() {
            if let Some(entry) = self
                .generalized
                .iter()
                .find(|entry| entry.predicate.is_supported_type(ty))
            {
                return Ok(entry.codec.clone());
            }
        }

        if ty.is_interface() || ty.is_abstract() {
            return Ok(Arc::new(AbstractTypeCodec::new(ty.clone())));
        }

        Err(Error::codec_not_found(ty.to_string()))
    }
}

fn ensure_supported(ty: &Type) -> Result<(), Error> {
    if ty.is_generic_type_definition() {
        return Err(Error::unsupported_type(format!(
            "Open generic definition {} cannot be serialized",
            ty
        )));
    }
    if ty.is_pointer() {
        return Err(Error::unsupported_type(format!(
            "Pointer type {} cannot be serialized",
            ty
        )));
    }
    if ty.is_by_ref() {
        return Err(Error::unsupported_type(format!(
            "By-reference type {} cannot be serialized",
            ty
        )));
    }
    Ok(())
}

/// Looks `ty` up directly or through its generic definition, memoizing the
/// instance produced for it.
fn find<T: ?Sized>(
    table: &HashMap<Type, Producer<T>>,
    instances: &DashMap<Type, Arc<T>>,
    ty: &Type,
) -> Result<Option<Arc<T>>, Error> {
    if let Some(instance) = instances.get(ty) {
        return Ok(Some(instance.value().clone()));
    }
    let subject = ty.definition().unwrap_or_else(|| ty.clone());
    let producer = match table.get(&subject) {
        Some(producer) => producer,
        None => return Ok(None),
    };
    if producer.is_generic() {
        debug!("Instantiating producer for {}", ty);
    }
    let instance = producer.produce(ty)?;
    instances.insert(ty.clone(), instance.clone());
    Ok(Some(instance))
}

fn adapt(codec: Arc<dyn FieldCodec>, requested: &Type) -> Result<Arc<dyn FieldCodec>, Error> {
    let value_type = codec.value_type();
    if value_type == *requested {
        return Ok(codec);
    }
    if let Some(inner) = codec.inner_codec() {
        if inner.value_type() == *requested {
            return Ok(inner.clone());
        }
    }
    if value_type.is_object() {
        return Ok(Arc::new(TypedCodecAdapter::new(requested.clone(), codec)));
    }
    if requested.is_object() {
        return Ok(Arc::new(UntypedCodecAdapter::new(codec)));
    }
    Err(Error::cannot_adapt_codec(format!(
        "Codec for {} cannot be used for fields of type {}",
        value_type, requested
    )))
}
