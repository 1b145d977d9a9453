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

use skein_core::resolver::ref_resolver::{ReferencedObjects, ReferencedTypes};
use skein_core::{ObjectRef, Type, Value};
use tests::{link, models, node, node_type};

#[test]
fn test_null_is_reference_zero() {
    let skein = models();
    let bytes = skein.serialize(&Value::Null).unwrap();
    // delta 0, Reference tag, id 0
    assert_eq!(bytes, vec![0x00, 0xA0, 0x00]);
    assert_eq!(skein.deserialize(&bytes).unwrap(), Value::Null);
    assert_eq!(skein.deserialize_as(&bytes, &node_type()).unwrap(), Value::Null);
    assert_eq!(skein.deserialize_as(&bytes, &Type::string()).unwrap(), Value::Null);
}

#[test]
fn test_ids_are_positional() {
    let mut refs = ReferencedObjects::new();
    let a = node("a");
    let b = node("b");
    assert_eq!(refs.get_or_add_reference(Some(&a)), (1, false));
    refs.mark_value_field();
    assert_eq!(refs.get_or_add_reference(None), (0, true));
    assert_eq!(refs.get_or_add_reference(Some(&b)), (4, false));
    assert_eq!(refs.get_or_add_reference(Some(&a)), (1, true));
    assert_eq!(refs.current_reference_id(), 5);
}

#[test]
fn test_decode_side_records() {
    let mut refs = ReferencedObjects::new();
    let placeholder = refs.create_record_placeholder();
    refs.mark_value_field();
    let a = node("a");
    assert_eq!(refs.record_object(a.clone(), Some(placeholder)), 1);
    let b = node("b");
    assert_eq!(refs.record_object(b.clone(), None), 3);
    assert_eq!(refs.try_get_referenced_object(0), Some(Value::Null));
    assert_eq!(refs.try_get_referenced_object(1), Some(Value::Object(a)));
    assert_eq!(refs.try_get_referenced_object(3), Some(Value::Object(b)));
    assert_eq!(refs.try_get_referenced_object(2), None);
    refs.reset();
    assert_eq!(refs.current_reference_id(), 0);
    assert_eq!(refs.try_get_referenced_object(1), None);
}

#[test]
fn test_type_ids_are_independent() {
    let mut types = ReferencedTypes::new();
    assert_eq!(types.record(node_type()), 1);
    assert_eq!(types.record(Type::class("app.Other")), 2);
    assert_eq!(types.record(node_type()), 1);
    assert_eq!(types.get_type(2), Some(&Type::class("app.Other")));
    assert_eq!(types.get_id(&node_type()), Some(1));
    assert_eq!(types.len(), 2);
}

fn chain() -> Value {
    let a = node("a");
    let b = node("b");
    let c = node("c");
    link(&a, &b);
    link(&b, &c);
    link(&c, &b);
    Value::Object(a)
}

#[test]
fn test_encoding_is_deterministic() {
    let skein = models();
    let first = skein.serialize(&chain()).unwrap();
    let second = skein.serialize(&chain()).unwrap();
    // The pooled session is reset between operations.
    let third = skein.serialize(&chain()).unwrap();
    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(first, models().serialize(&chain()).unwrap());
}

#[test]
fn test_shared_objects_stay_shared() {
    let skein = models();
    let a = node("a");
    let b = node("b");
    let list = ObjectRef::list(
        node_type(),
        vec![
            Value::Object(a.clone()),
            Value::Object(a),
            Value::Null,
            Value::Object(b),
        ],
    );
    let bytes = skein.serialize(&Value::Object(list)).unwrap();
    let decoded = skein.deserialize(&bytes).unwrap();
    let items = decoded
        .as_object()
        .unwrap()
        .with(|items: &Vec<Value>| items.clone())
        .unwrap();
    assert_eq!(items.len(), 4);
    let first = items[0].as_object().unwrap();
    assert!(first.ptr_eq(items[1].as_object().unwrap()));
    assert!(items[2].is_null());
    assert!(!first.ptr_eq(items[3].as_object().unwrap()));
}
