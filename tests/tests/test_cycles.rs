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

use skein_core::wire::{read_field_header, skip_field};
use skein_core::{Error, ObjectRef, Reader, Session, Skein, Type, Value, WireType};
use tests::{link, models, name_of, next_of, node};

/// Counts `Reference` fields anywhere in `bytes`, descending into objects.
fn count_references(skein: &Skein, bytes: &[u8]) -> usize {
    let mut session = Session::new(skein.registry().unwrap().clone(), 64);
    let mut reader = Reader::new(bytes);
    let mut count = 0;
    while !reader.is_at_end() {
        let field = read_field_header(&mut reader, &mut session).unwrap();
        match field.wire_type {
            WireType::Extended | WireType::TagDelimited => {}
            WireType::Reference => {
                count += 1;
                skip_field(&mut reader, &mut session, &field).unwrap();
            }
            _ => skip_field(&mut reader, &mut session, &field).unwrap(),
        }
    }
    count
}

fn chain(len: usize) -> ObjectRef {
    let head = node("0");
    let mut tail = head.clone();
    for i in 1..len {
        let next = node(&i.to_string());
        link(&tail, &next);
        tail = next;
    }
    head
}

#[test]
fn test_two_node_cycle() {
    let _ = env_logger::builder().is_test(true).try_init();
    let skein = models();
    let a = node("a");
    let b = node("b");
    link(&a, &b);
    link(&b, &a);

    let bytes = skein.serialize(&Value::Object(a)).unwrap();
    assert_eq!(count_references(&skein, &bytes), 1);

    let decoded = skein.deserialize(&bytes).unwrap();
    let a2 = decoded.as_object().unwrap();
    let b2 = next_of(a2).unwrap();
    assert_eq!(name_of(a2), "a");
    assert_eq!(name_of(&b2), "b");
    assert!(!b2.ptr_eq(a2));
    assert!(next_of(&b2).unwrap().ptr_eq(a2));
}

#[test]
fn test_self_loop() {
    let skein = models();
    let a = node("self");
    link(&a, &a);

    let bytes = skein.serialize(&Value::Object(a)).unwrap();
    assert_eq!(count_references(&skein, &bytes), 1);
    let decoded = skein.deserialize(&bytes).unwrap();
    let a2 = decoded.as_object().unwrap();
    assert!(next_of(a2).unwrap().ptr_eq(a2));
}

#[test]
fn test_cycle_through_the_middle() {
    let skein = models();
    let head = chain(4);
    let second = next_of(&head).unwrap();
    let last = next_of(&next_of(&second).unwrap()).unwrap();
    link(&last, &second);

    let bytes = skein.serialize(&Value::Object(head)).unwrap();
    assert_eq!(count_references(&skein, &bytes), 1);
    let decoded = skein.deserialize(&bytes).unwrap();
    let head2 = decoded.as_object().unwrap();
    let second2 = next_of(head2).unwrap();
    let last2 = next_of(&next_of(&second2).unwrap()).unwrap();
    assert_eq!(name_of(&last2), "3");
    assert!(next_of(&last2).unwrap().ptr_eq(&second2));
}

#[test]
fn test_acyclic_chain_has_no_references() {
    let skein = models();
    let bytes = skein.serialize(&Value::Object(chain(10))).unwrap();
    assert_eq!(count_references(&skein, &bytes), 0);

    let decoded = skein.deserialize(&bytes).unwrap();
    let mut current = decoded.as_object().cloned();
    let mut names = Vec::new();
    while let Some(n) = current {
        names.push(name_of(&n));
        current = next_of(&n);
    }
    let expected: Vec<String> = (0..10).map(|i| i.to_string()).collect();
    assert_eq!(names, expected);
}

#[test]
fn test_long_chain_with_default_config() {
    let skein = models();
    let bytes = skein.serialize(&Value::Object(chain(256))).unwrap();
    assert_eq!(count_references(&skein, &bytes), 0);

    let decoded = skein.deserialize(&bytes).unwrap();
    let mut current = decoded.as_object().cloned();
    let mut len = 0;
    while let Some(n) = current {
        assert_eq!(name_of(&n), len.to_string());
        len += 1;
        current = next_of(&n);
    }
    assert_eq!(len, 256);
}

/// `levels` lists of `object`, each holding the next as its only element.
fn nested_lists(levels: usize) -> ObjectRef {
    let mut inner = ObjectRef::list(Type::object(), Vec::new());
    for _ in 1..levels {
        inner = ObjectRef::list(Type::object(), vec![Value::Object(inner)]);
    }
    inner
}

#[test]
fn test_depth_limit_on_write() {
    let skein = models().max_depth(8);
    assert!(skein.serialize(&Value::Object(nested_lists(3))).is_ok());
    assert!(matches!(
        skein.serialize(&Value::Object(nested_lists(20))),
        Err(Error::DepthExceed(_))
    ));
    // A failed operation leaves later ones unaffected.
    assert!(skein.serialize(&Value::Object(nested_lists(3))).is_ok());
    // Concretely typed fields do not count.
    assert!(skein.serialize(&Value::Object(chain(20))).is_ok());
}

#[test]
fn test_depth_limit_on_read() {
    let writer = models();
    let bytes = writer.serialize(&Value::Object(nested_lists(20))).unwrap();
    let reader = models().max_depth(8);
    assert!(matches!(
        reader.deserialize(&bytes),
        Err(Error::DepthExceed(_))
    ));
    assert!(writer.deserialize(&bytes).is_ok());
}
