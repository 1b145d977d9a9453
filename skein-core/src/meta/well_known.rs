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

use crate::error::Error;
use crate::meta::ty::Type;

/// Process-wide table of types with a globally agreed numeric id.
///
/// A well-known type is written on the wire as its id alone. The table is
/// built once, before the first operation, and is read-only afterwards.
/// Id `0` is reserved.
#[derive(Clone, Debug)]
pub struct WellKnownTypes {
    by_id: HashMap<u32, Type>,
    by_type: HashMap<Type, u32>,
}

impl Default for WellKnownTypes {
    fn default() -> Self {
        WellKnownTypesBuilder::with_builtins().build_unchecked()
    }
}

impl WellKnownTypes {
    /// Builder pre-populated with the built-in types.
    pub fn builder() -> WellKnownTypesBuilder {
        WellKnownTypesBuilder::with_builtins()
    }

    pub fn get_type(&self, id: u32) -> Option<&Type> {
        self.by_id.get(&id)
    }

    pub fn get_id(&self, ty: &Type) -> Option<u32> {
        self.by_type.get(ty).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct WellKnownTypesBuilder {
    entries: Vec<(u32, Type)>,
}

impl WellKnownTypesBuilder {
    pub fn empty() -> WellKnownTypesBuilder {
        WellKnownTypesBuilder::default()
    }

    pub fn with_builtins() -> WellKnownTypesBuilder {
        let builtins = [
            Type::object(),
            Type::bool(),
            Type::char(),
            Type::i8(),
            Type::u8(),
            Type::i16(),
            Type::u16(),
            Type::i32(),
            Type::u32(),
            Type::i64(),
            Type::u64(),
            Type::f32(),
            Type::f64(),
            Type::string(),
            Type::bytes(),
            Type::type_type(),
            Type::timestamp(),
        ];
        WellKnownTypesBuilder {
            entries: builtins
                .into_iter()
                .enumerate()
                .map(|(i, ty)| (i as u32 + 1, ty))
                .collect(),
        }
    }

    pub fn with(mut self, id: u32, ty: Type) -> Self {
        self.entries.push((id, ty));
        self
    }

    pub fn add(&mut self, id: u32, ty: Type) {
        self.entries.push((id, ty));
    }

    pub fn build(self) -> Result<WellKnownTypes, Error> {
        let mut by_id = HashMap::with_capacity(self.entries.len());
        let mut by_type = HashMap::with_capacity(self.entries.len());
        for (id, ty) in self.entries {
            if id == 0 {
                return Err(Error::invalid_data(format!(
                    "Well-known id 0 is reserved, cannot assign it to {}",
                    ty
                )));
            }
            if let Some(existing) = by_id.get(&id) {
                return Err(Error::invalid_data(format!(
                    "Well-known id {} is assigned to both {} and {}",
                    id, existing, ty
                )));
            }
            if let Some(existing) = by_type.get(&ty) {
                return Err(Error::invalid_data(format!(
                    "Type {} is registered under both id {} and {}",
                    ty, existing, id
                )));
            }
            by_id.insert(id, ty.clone());
            by_type.insert(ty, id);
        }
        Ok(WellKnownTypes { by_id, by_type })
    }

    fn build_unchecked(self) -> WellKnownTypes {
        let mut by_id = HashMap::with_capacity(self.entries.len());
        let mut by_type = HashMap::with_capacity(self.entries.len());
        for (id, ty) in self.entries {
            by_id.insert(id, ty.clone());
            by_type.insert(ty, id);
        }
        WellKnownTypes { by_id, by_type }
    }
}
