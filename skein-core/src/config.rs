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
use std::fmt;
use std::sync::Arc;

use crate::buffer::DEFAULT_SEGMENT_SIZE;
use crate::codec::list::ListCodec;
use crate::codec::number::{
    BoolCodec, CharCodec, F32Codec, F64Codec, I16Codec, I32Codec, I64Codec, I8Codec, U16Codec,
    U32Codec, U64Codec, U8Codec,
};
use crate::codec::object::ObjectCodec;
use crate::codec::string::{BytesCodec, StringCodec, TimestampCodec};
use crate::codec::type_codec::TypeSerializerCodec;
use crate::codec::{Activator, FieldCodec, GeneralizedCodec, PartialSerializer, ValueSerializer};
use crate::error::Error;
use crate::meta::Type;

/// Runtime options of a [`Skein`](crate::Skein) instance.
#[derive(Clone, Debug)]
pub struct Config {
    /// Size hint for each new output segment.
    pub segment_size: usize,
    /// Maximum nesting of fields dispatched on their runtime type (`object`,
    /// interface and abstract fields) within one operation.
    pub max_depth: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            segment_size: DEFAULT_SEGMENT_SIZE,
            max_depth: 64,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    #[inline(always)]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}

/// Instantiates a producer for a closed generic type.
pub type GenericFactory<T> = Arc<dyn Fn(&Type) -> Result<Arc<T>, Error> + Send + Sync>;

/// How a registration entry yields its codec, serializer or activator.
pub enum Producer<T: ?Sized> {
    /// One shared instance, for a non-generic subject.
    Instance(Arc<T>),
    /// Built per closed type from an open generic definition.
    Generic(GenericFactory<T>),
}

impl<T: ?Sized> Clone for Producer<T> {
    fn clone(&self) -> Self {
        match self {
            Producer::Instance(instance) => Producer::Instance(instance.clone()),
            Producer::Generic(factory) => Producer::Generic(factory.clone()),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Producer::Instance(_) => f.write_str("Producer::Instance"),
            Producer::Generic(_) => f.write_str("Producer::Generic"),
        }
    }
}

impl<T: ?Sized> Producer<T> {
    /// Produces the instance for `ty`, the closed form of the registered subject.
    pub fn produce(&self, ty: &Type) -> Result<Arc<T>, Error> {
        match self {
            Producer::Instance(instance) => Ok(instance.clone()),
            Producer::Generic(factory) => factory(ty),
        }
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, Producer::Generic(_))
    }
}

/// A generalized codec, kept both as its predicate and as a field codec.
#[derive(Clone)]
pub(crate) struct GeneralizedEntry {
    pub(crate) predicate: Arc<dyn GeneralizedCodec>,
    pub(crate) codec: Arc<dyn FieldCodec>,
}

/// Registration tables consumed once by the codec registry.
///
/// Subjects are either closed types or open generic definitions; in the
/// latter case the producer must be [`Producer::Generic`].
#[derive(Clone, Default)]
pub struct CodecConfig {
    pub(crate) codecs: HashMap<Type, Producer<dyn FieldCodec>>,
    pub(crate) partial_serializers: HashMap<Type, Producer<dyn PartialSerializer>>,
    pub(crate) value_serializers: HashMap<Type, Producer<dyn ValueSerializer>>,
    pub(crate) activators: HashMap<Type, Producer<dyn Activator>>,
    pub(crate) generalized: Vec<GeneralizedEntry>,
}

impl CodecConfig {
    /// Tables holding the built-in codecs.
    pub fn with_builtins() -> CodecConfig {
        let mut config = CodecConfig::default();
        let builtins: Vec<Arc<dyn FieldCodec>> = vec![
            Arc::new(ObjectCodec),
            Arc::new(BoolCodec),
            Arc::new(CharCodec),
            Arc::new(I8Codec),
            Arc::new(U8Codec),
            Arc::new(I16Codec),
            Arc::new(U16Codec),
            Arc::new(I32Codec),
            Arc::new(U32Codec),
            Arc::new(I64Codec),
            Arc::new(U64Codec),
            Arc::new(F32Codec),
            Arc::new(F64Codec),
            Arc::new(StringCodec),
            Arc::new(BytesCodec),
            Arc::new(TimestampCodec),
            Arc::new(TypeSerializerCodec),
        ];
        for codec in builtins {
            config
                .codecs
                .insert(codec.value_type(), Producer::Instance(codec));
        }
        config.codecs.insert(
            Type::list_definition(),
            Producer::Generic(Arc::new(ListCodec::factory)),
        );
        config
    }

    pub fn add_codec(&mut self, ty: Type, codec: Arc<dyn FieldCodec>) {
        self.codecs.insert(ty, Producer::Instance(codec));
    }

    pub fn add_generic_codec(&mut self, definition: Type, factory: GenericFactory<dyn FieldCodec>) {
        self.codecs.insert(definition, Producer::Generic(factory));
    }

    pub fn add_partial_serializer(&mut self, ty: Type, producer: Producer<dyn PartialSerializer>) {
        self.partial_serializers.insert(ty, producer);
    }

    pub fn add_value_serializer(&mut self, ty: Type, producer: Producer<dyn ValueSerializer>) {
        self.value_serializers.insert(ty, producer);
    }

    pub fn add_activator(&mut self, ty: Type, producer: Producer<dyn Activator>) {
        self.activators.insert(ty, producer);
    }

    /// Appends a generalized codec. Earlier registrations take precedence.
    pub fn add_generalized_codec<C: GeneralizedCodec + 'static>(&mut self, codec: C) {
        let codec = Arc::new(codec);
        self.generalized.push(GeneralizedEntry {
            predicate: codec.clone(),
            codec,
        });
    }
}
