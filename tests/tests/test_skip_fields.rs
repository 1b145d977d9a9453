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

use skein_core::{Error, ObjectRef, Skein, Type, Value};
use tests::{
    models, name_of, node, node_type, person_type, person_v1_reader, person_v2_writer, point,
    PersonV1, PersonV1Serializer, PersonV2,
};

fn person_v2(pet: Value, kind: Type) -> ObjectRef {
    ObjectRef::new(
        person_type(),
        PersonV2 {
            name: "Ada".to_string(),
            pet,
            age: 36,
            tags: Value::Object(ObjectRef::list(
                Type::string(),
                vec![Value::from("math"), Value::Null, Value::from("engines")],
            )),
            origin: point(3, 4),
            kind: Value::Type(kind),
            partner: Value::Null,
            nickname: "Countess".to_string(),
        },
    )
}

fn set_partner(person: &ObjectRef, partner: Value) {
    person
        .with_mut(|p: &mut PersonV2| p.partner = partner)
        .unwrap();
}

/// A version-1 reader that also knows the shared models.
fn v1_reader_with_models() -> Skein {
    let mut skein = models();
    skein
        .register_partial_serializer(person_type(), PersonV1Serializer)
        .unwrap();
    skein
        .register_activator(
            person_type(),
            skein_core::DefaultActivator::<PersonV1>::new(person_type()),
        )
        .unwrap();
    skein
}

#[test]
fn test_newer_fields_are_skipped() {
    let _ = env_logger::builder().is_test(true).try_init();
    let writer = person_v2_writer();
    let person = person_v2(Value::Object(node("Rex")), Type::class("app.Kind"));
    set_partner(&person, Value::Object(person.clone()));
    let bytes = writer.serialize(&Value::Object(person)).unwrap();

    // The reader knows neither nodes nor points.
    let reader = person_v1_reader();
    let decoded = reader.deserialize(&bytes).unwrap();
    let decoded = decoded.as_object().unwrap();
    let (name, partner, nickname) = decoded
        .with(|p: &PersonV1| (p.name.clone(), p.partner.clone(), p.nickname.clone()))
        .unwrap();
    assert_eq!(name, "Ada");
    assert_eq!(nickname, "Countess");
    assert!(partner.as_object().unwrap().ptr_eq(decoded));
}

#[test]
fn test_reference_into_skipped_field_fails() {
    let writer = person_v2_writer();
    let pet = node("Rex");
    let person = person_v2(Value::Object(pet.clone()), Type::class("app.Kind"));
    set_partner(&person, Value::Object(pet));
    let bytes = writer.serialize(&Value::Object(person)).unwrap();

    assert!(matches!(
        person_v1_reader().deserialize(&bytes),
        Err(Error::InvalidRef(_))
    ));
    // The newer reader resolves it.
    let decoded = writer.deserialize(&bytes).unwrap();
    let (pet, partner) = decoded
        .as_object()
        .unwrap()
        .with(|p: &PersonV2| (p.pet.clone(), p.partner.clone()))
        .unwrap();
    assert!(pet
        .as_object()
        .unwrap()
        .ptr_eq(partner.as_object().unwrap()));
}

#[test]
fn test_type_ids_stay_aligned_across_skipped_type_values() {
    let writer = person_v2_writer();
    // The skipped `kind` field is the first mention of the node type; the
    // partner header then refers to it by id.
    let person = person_v2(Value::Null, node_type());
    set_partner(&person, Value::Object(node("Bob")));
    let bytes = writer.serialize(&Value::Object(person)).unwrap();

    let decoded = v1_reader_with_models().deserialize(&bytes).unwrap();
    let partner = decoded
        .as_object()
        .unwrap()
        .with(|p: &PersonV1| p.partner.clone())
        .unwrap();
    let partner = partner.as_object().unwrap();
    assert_eq!(partner.ty(), &node_type());
    assert_eq!(name_of(partner), "Bob");
}

#[test]
fn test_older_payload_leaves_defaults() {
    let writer = person_v1_reader();
    let person = ObjectRef::new(
        person_type(),
        PersonV1 {
            name: "Grace".to_string(),
            partner: Value::Null,
            nickname: "Amazing".to_string(),
        },
    );
    let bytes = writer.serialize(&Value::Object(person)).unwrap();

    let decoded = person_v2_writer().deserialize(&bytes).unwrap();
    decoded
        .as_object()
        .unwrap()
        .with(|p: &PersonV2| {
            assert_eq!(p.name, "Grace");
            assert_eq!(p.nickname, "Amazing");
            assert_eq!(p.age, 0);
            assert!(p.pet.is_null());
            assert!(p.tags.is_null());
            assert!(p.origin.is_null());
            assert!(p.kind.is_null());
            assert!(p.partner.is_null());
        })
        .unwrap();
}

#[test]
fn test_full_round_trip_with_newer_reader() {
    let writer = person_v2_writer();
    let person = person_v2(Value::Object(node("Rex")), Type::list_of(node_type()));
    let bytes = writer.serialize(&Value::Object(person)).unwrap();

    let decoded = writer.deserialize(&bytes).unwrap();
    decoded
        .as_object()
        .unwrap()
        .with(|p: &PersonV2| {
            assert_eq!(p.name, "Ada");
            assert_eq!(p.age, 36);
            assert_eq!(name_of(p.pet.as_object().unwrap()), "Rex");
            let tags = p
                .tags
                .as_object()
                .unwrap()
                .with(|items: &Vec<Value>| items.clone())
                .unwrap();
            assert_eq!(
                tags,
                vec![Value::from("math"), Value::Null, Value::from("engines")]
            );
            assert_eq!(p.origin, point(3, 4));
            assert_eq!(p.kind, Value::Type(Type::list_of(node_type())));
            assert!(p.partner.is_null());
        })
        .unwrap();
}
