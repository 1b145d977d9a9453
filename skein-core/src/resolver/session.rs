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

use log::trace;

use crate::codec::FieldCodec;
use crate::error::Error;
use crate::meta::{Type, TypeNameCodec, WellKnownTypes};
use crate::resolver::codec_registry::CodecRegistry;
use crate::resolver::ref_resolver::{ReferencedObjects, ReferencedTypes};

/// Mutable state of one serialize or deserialize call.
///
/// A session is owned by exactly one in-flight operation. After success it
/// may be [`reset`](Session::reset) and reused; after a failure its tables
/// may be half populated and it must be dropped.
pub struct Session {
    registry: Arc<CodecRegistry>,
    references: ReferencedObjects,
    types: ReferencedTypes,
    max_depth: u32,
    current_depth: u32,
}

impl Session {
    pub fn new(registry: Arc<CodecRegistry>, max_depth: u32) -> Session {
        Session {
            registry,
            references: ReferencedObjects::new(),
            types: ReferencedTypes::new(),
            max_depth,
            current_depth: 0,
        }
    }

    #[inline(always)]
    pub fn registry(&self) -> &Arc<CodecRegistry> {
        &self.registry
    }

    #[inline(always)]
    pub fn well_known_types(&self) -> &WellKnownTypes {
        self.registry.well_known_types()
    }

    #[inline(always)]
    pub fn type_names(&self) -> &dyn TypeNameCodec {
        self.registry.type_names()
    }

    /// Shorthand for resolving the codec of `ty` through the registry.
    pub fn get_codec(&self, ty: &Type) -> Result<Arc<dyn FieldCodec>, Error> {
        self.registry.get_codec(ty)
    }

    #[inline(always)]
    pub fn references(&self) -> &ReferencedObjects {
        &self.references
    }

    #[inline(always)]
    pub fn references_mut(&mut self) -> &mut ReferencedObjects {
        &mut self.references
    }

    #[inline(always)]
    pub fn types(&self) -> &ReferencedTypes {
        &self.types
    }

    #[inline(always)]
    pub fn types_mut(&mut self) -> &mut ReferencedTypes {
        &mut self.types
    }

    #[inline(always)]
    pub fn mark_value_field(&mut self) {
        self.references.mark_value_field();
    }

    pub fn depth(&self) -> u32 {
        self.current_depth
    }

    /// Enters one level of runtime-type dispatch.
    pub fn enter(&mut self) -> Result<(), Error> {
        self.current_depth += 1;
        if self.current_depth > self.max_depth {
            return Err(Error::depth_exceed(format!(
                "Maximum object nesting depth ({}) exceeded. Current depth: {}. \
                 Consider increasing max_depth if this is expected.",
                self.max_depth, self.current_depth
            )));
        }
        Ok(())
    }

    pub fn leave(&mut self) {
        self.current_depth = self.current_depth.saturating_sub(1);
    }

    /// Clears reference and type tables for reuse by another operation.
    pub fn reset(&mut self) {
        trace!(
            "resetting session: {} ids, {} types",
            self.references.current_reference_id(),
            self.types.len()
        );
        self.references.reset();
        self.types.reset();
        self.current_depth = 0;
    }
}
