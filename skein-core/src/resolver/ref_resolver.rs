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

use crate::meta::Type;
use crate::value::{ObjectRef, Value};

/// Per-operation reference table.
///
/// Ids are positional: every field occurrence, whether it carries a new
/// object, a repeated object, null or a plain value, advances the counter by
/// exactly one. An encoder and a decoder that visit fields in the same order
/// therefore agree on every id without the id of a new object ever being
/// written. Id `0` is reserved for null.
///
/// # Examples
///
/// ```rust
/// use skein_core::meta::Type;
/// use skein_core::resolver::ref_resolver::ReferencedObjects;
/// use skein_core::value::ObjectRef;
///
/// let mut refs = ReferencedObjects::new();
/// let node = ObjectRef::new(Type::class("app.Node"), ());
///
/// // First encounter: a fresh id, the payload must be written.
/// assert_eq!(refs.get_or_add_reference(Some(&node)), (1, false));
/// // Second encounter: the same id, only a reference is written.
/// assert_eq!(refs.get_or_add_reference(Some(&node)), (1, true));
/// assert_eq!(refs.current_reference_id(), 2);
/// ```
#[derive(Default)]
pub struct ReferencedObjects {
    /// Decode side: id to object.
    references: HashMap<u32, ObjectRef>,
    /// Encode side: identity to id. Holding the handle keeps the address
    /// from being reused by another allocation during the operation.
    reference_to_id: HashMap<usize, (u32, ObjectRef)>,
    current_reference_id: u32,
}

impl ReferencedObjects {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn current_reference_id(&self) -> u32 {
        self.current_reference_id
    }

    #[inline(always)]
    fn next_id(&mut self) -> u32 {
        self.current_reference_id += 1;
        self.current_reference_id
    }

    /// Returns the id of `value` and whether it was already present.
    /// Null is always `(0, true)`.
    pub fn get_or_add_reference(&mut self, value: Option<&ObjectRef>) -> (u32, bool) {
        let id = self.next_id();
        let Some(object) = value else {
            return (0, true);
        };
        if let Some((existing, _)) = self.reference_to_id.get(&object.identity()) {
            return (*existing, true);
        }
        self.reference_to_id
            .insert(object.identity(), (id, object.clone()));
        (id, false)
    }

    /// Consumes an id slot for a field that cannot be referenced.
    #[inline(always)]
    pub fn mark_value_field(&mut self) {
        self.next_id();
    }

    /// Reserves the id of an object that is about to be activated.
    pub fn create_record_placeholder(&mut self) -> u32 {
        self.next_id()
    }

    /// Records a decoded object, either at a reserved id or at the next one.
    pub fn record_object(&mut self, object: ObjectRef, reference_id: Option<u32>) -> u32 {
        let id = match reference_id {
            Some(id) => id,
            None => self.next_id(),
        };
        self.references.insert(id, object);
        id
    }

    /// Looks up a previously recorded object. Id `0` is null.
    pub fn try_get_referenced_object(&self, reference_id: u32) -> Option<Value> {
        if reference_id == 0 {
            return Some(Value::Null);
        }
        self.references
            .get(&reference_id)
            .map(|object| Value::Object(object.clone()))
    }

    pub fn reset(&mut self) {
        self.references.clear();
        self.reference_to_id.clear();
        self.current_reference_id = 0;
    }
}

/// Types mentioned earlier in the operation, numbered from 1 independently
/// of object ids.
#[derive(Default)]
pub struct ReferencedTypes {
    by_id: HashMap<u32, Type>,
    by_type: HashMap<Type, u32>,
    next_id: u32,
}

impl ReferencedTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_id(&self, ty: &Type) -> Option<u32> {
        self.by_type.get(ty).copied()
    }

    pub fn get_type(&self, id: u32) -> Option<&Type> {
        self.by_id.get(&id)
    }

    pub fn record(&mut self, ty: Type) -> u32 {
        if let Some(id) = self.by_type.get(&ty) {
            return *id;
        }
        self.next_id += 1;
        self.by_id.insert(self.next_id, ty.clone());
        self.by_type.insert(ty, self.next_id);
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn reset(&mut self) {
        self.by_id.clear();
        self.by_type.clear();
        self.next_id = 0;
    }
}
