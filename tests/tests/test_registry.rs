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

use anyhow::anyhow;

use skein_core::codec::adapter::TypedCodecAdapter;
use skein_core::codec::list::ListCodec;
use skein_core::codec::number::I32Codec;
use skein_core::codec::object::ObjectCodec;
use skein_core::wire::Field;
use skein_core::{
    Activator, DefaultActivator, Error, FieldCodec, FnActivator, GeneralizedCodec, ObjectRef,
    Reader, Session, Skein, StructValue, Type, Value, Writer,
};
use tests::{legacy, models, node_type, point, point_type, shape_type, Node};

#[test]
fn test_codec_cache_returns_same_instance() {
    let skein = models();
    let registry = skein.registry().unwrap();
    for ty in [node_type(), point_type(), Type::list_of(node_type()), shape_type()] {
        let first = registry.get_codec(&ty).unwrap();
        let second = registry.get_codec(&ty).unwrap();
        assert!(Arc::ptr_eq(&first, &second), "{}", ty);
        assert_eq!(first.value_type(), ty);
    }
    let typed = registry.get_codec_for(&node_type(), &Type::object()).unwrap();
    let again = registry.get_codec_for(&node_type(), &Type::object()).unwrap();
    assert!(Arc::ptr_eq(&typed, &again));
    assert_eq!(typed.value_type(), Type::object());
}

#[test]
fn test_unsupported_subjects() {
    let skein = Skein::default();
    let registry = skein.registry().unwrap();
    for ty in [
        Type::list_definition(),
        node_type().pointer(),
        node_type().by_ref(),
    ] {
        assert!(matches!(
            registry.get_codec(&ty),
            Err(Error::UnsupportedType(_))
        ));
    }
}

#[test]
fn test_not_found_categories() {
    let skein = Skein::default();
    let registry = skein.registry().unwrap();
    let missing = Type::class("app.Missing");
    let err = registry.get_codec(&missing).err().unwrap();
    assert!(matches!(err, Error::CodecNotFound(_)) && err.is_not_found());
    assert!(matches!(
        registry.get_activator(&missing),
        Err(Error::ActivatorNotFound(_))
    ));
    assert!(matches!(
        skein.serialize(&Value::Object(ObjectRef::new(missing, ()))),
        Err(Error::CodecNotFound(_))
    ));
}

#[test]
fn test_missing_activator_fails_decode() {
    let mut writer = Skein::default();
    writer
        .register_partial_serializer(node_type(), tests::NodeSerializer)
        .unwrap();
    let bytes = writer.serialize(&Value::Object(tests::node("n"))).unwrap();
    assert!(matches!(
        writer.deserialize(&bytes),
        Err(Error::ActivatorNotFound(_))
    ));
}

#[test]
fn test_generic_producers_are_instantiated_per_type() {
    let mut skein = Skein::default();
    let boxed = Type::generic_class("app.Box", 1);
    skein
        .register_generic_codec(boxed.clone(), |ty| {
            let codec: Arc<dyn FieldCodec> =
                Arc::new(TypedCodecAdapter::new(ty.clone(), Arc::new(ObjectCodec)));
            Ok(codec)
        })
        .unwrap();
    skein
        .register_generic_activator(boxed.clone(), |ty| {
            let ty = ty.clone();
            let activator: Arc<dyn Activator> =
                Arc::new(FnActivator(move || Ok::<_, Error>(ObjectRef::new(ty.clone(), ()))));
            Ok(activator)
        })
        .unwrap();
    let registry = skein.registry().unwrap();

    let of_i32 = boxed.make_generic(vec![Type::i32()]).unwrap();
    let of_string = boxed.make_generic(vec![Type::string()]).unwrap();
    let codec = registry.get_codec(&of_i32).unwrap();
    assert_eq!(codec.value_type(), of_i32);
    assert!(Arc::ptr_eq(&codec, &registry.get_codec(&of_i32).unwrap()));
    assert_eq!(registry.get_codec(&of_string).unwrap().value_type(), of_string);

    let activator = registry.get_activator(&of_i32).unwrap();
    assert!(Arc::ptr_eq(&activator, &registry.get_activator(&of_i32).unwrap()));
    assert_eq!(activator.create().unwrap().ty(), &of_i32);
    assert_eq!(
        registry.get_activator(&of_string).unwrap().create().unwrap().ty(),
        &of_string
    );
}

#[test]
fn test_generic_codec_of_the_wrong_type_cannot_be_adapted() {
    let mut skein = Skein::default();
    let boxed = Type::generic_class("app.Box", 1);
    skein
        .register_generic_codec(boxed.clone(), |ty| {
            ListCodec::factory(&Type::list_of(ty.generic_arguments()[0].clone()))
        })
        .unwrap();
    let of_i32 = boxed.make_generic(vec![Type::i32()]).unwrap();
    assert!(matches!(
        skein.registry().unwrap().get_codec(&of_i32),
        Err(Error::CannotAdaptCodec(_))
    ));
}

#[test]
fn test_adaptation_depends_on_requested_type() {
    let mut skein = Skein::default();
    let alias = Type::class("app.Alias");
    skein
        .register_codec(alias.clone(), TypedCodecAdapter::new(Type::i32(), Arc::new(I32Codec)))
        .unwrap();
    let registry = skein.registry().unwrap();
    assert!(matches!(
        registry.get_codec(&alias),
        Err(Error::CannotAdaptCodec(_))
    ));
    let unwrapped = registry.get_codec_for(&alias, &Type::i32()).unwrap();
    assert_eq!(unwrapped.value_type(), Type::i32());
}

#[test]
fn test_generalized_codec_round_trip() {
    let skein = models();
    let value = legacy("Blob", &[1, 2, 3]);
    let bytes = skein.serialize(&value).unwrap();
    assert_eq!(skein.deserialize(&bytes).unwrap(), value);

    let ty = value.runtime_type().unwrap();
    let codec = skein.registry().unwrap().get_codec(&ty).unwrap();
    assert_eq!(codec.value_type(), ty);
    assert_eq!(codec.inner_codec().unwrap().value_type(), Type::object());

    let bytes = skein.serialize_as(&value, &ty).unwrap();
    assert_eq!(skein.deserialize_as(&bytes, &ty).unwrap(), value);
    // The typed adapter refuses other legacy types.
    let other = legacy("Other", &[]);
    assert!(matches!(
        skein.serialize_as(&other, &ty),
        Err(Error::IllegalType(_))
    ));
}

#[test]
fn test_value_serializer_and_activator_registration() {
    let mut skein = models();
    skein
        .register_activator(
            Type::class("app.Extra"),
            DefaultActivator::<Node>::new(Type::class("app.Extra")),
        )
        .unwrap();
    let registry = skein.registry().unwrap();
    assert!(registry.get_value_serializer(&point_type()).is_ok());
    assert!(matches!(
        registry.get_partial_serializer(&point_type()),
        Err(Error::PartialSerializerNotFound(_))
    ));
    assert!(registry.get_activator(&Type::class("app.Extra")).is_ok());

    let bytes = skein.serialize(&point(3, -4)).unwrap();
    assert_eq!(skein.deserialize(&bytes).unwrap(), point(3, -4));
}

#[test]
fn test_registration_is_frozen_after_first_use() {
    let mut skein = models();
    skein.serialize(&Value::I32(1)).unwrap();
    assert!(matches!(
        skein.register_codec(Type::class("app.Late"), I32Codec),
        Err(Error::RegistryFrozen(_))
    ));
}

/// Stands in for a collaborator codec backed by storage that can fail.
struct QuotaCodec;

impl FieldCodec for QuotaCodec {
    fn value_type(&self) -> Type {
        Type::object()
    }

    fn write_field(
        &self,
        _writer: &mut Writer,
        _session: &mut Session,
        _field_id_delta: u32,
        _expected: &Type,
        value: &Value,
    ) -> Result<(), Error> {
        Err(Error::external(anyhow!(
            "quota exceeded writing {}",
            value.runtime_type().map_or_else(String::new, |t| t.to_string())
        )))
    }

    fn read_value(
        &self,
        _reader: &mut Reader,
        _session: &mut Session,
        _field: &Field,
    ) -> Result<Value, Error> {
        Err(Error::external(anyhow!("quota exceeded reading")))
    }
}

impl GeneralizedCodec for QuotaCodec {
    fn is_supported_type(&self, ty: &Type) -> bool {
        ty.name().starts_with("quota.")
    }
}

#[test]
fn test_collaborator_errors_reach_the_caller() {
    let mut skein = models();
    skein.register_generalized_codec(QuotaCodec).unwrap();
    let value = Value::Struct(StructValue::new(Type::struct_type("quota.Record"), 7i32));

    match skein.serialize(&value) {
        Err(Error::External(err)) => {
            assert_eq!(err.to_string(), "quota exceeded writing quota.Record")
        }
        other => panic!("unexpected result {:?}", other),
    }

    // Header naming the type, then an empty tag-delimited payload.
    let mut bytes = vec![0x00, 0x30, 0x0D];
    bytes.extend_from_slice(b"vquota.Record");
    bytes.extend_from_slice(&[0x00, 0xE0]);
    match skein.deserialize(&bytes) {
        Err(Error::External(err)) => assert_eq!(err.to_string(), "quota exceeded reading"),
        other => panic!("unexpected result {:?}", other),
    }

    // The pool dropped the failed sessions; later operations still work.
    let bytes = skein.serialize(&Value::I32(3)).unwrap();
    assert_eq!(skein.deserialize(&bytes).unwrap(), Value::I32(3));
}
