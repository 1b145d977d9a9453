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

use std::fmt;
use std::sync::{Arc, OnceLock};

use paste::paste;

use crate::error::Error;

/// Category of a type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Reference type with identity. Instances are tracked by the session.
    Class,
    /// Value type. Instances carry no identity and are never referenced.
    Struct,
    Interface,
    Abstract,
    Pointer(Type),
    ByRef(Type),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Generics {
    NonGeneric,
    /// Open generic definition, e.g. ``List`1``.
    Definition { arity: usize },
    /// Closed generic type, e.g. `List<i32>`.
    Instance(Vec<Type>),
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct TypeInner {
    name: String,
    kind: TypeKind,
    generics: Generics,
}

/// Runtime type descriptor.
///
/// Cloning is cheap. Equality and hashing are structural, so two
/// descriptors built independently for the same name, kind and generic
/// arguments are interchangeable.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Type(Arc<TypeInner>);

impl Type {
    pub fn new<S: Into<String>>(name: S, kind: TypeKind, generics: Generics) -> Type {
        Type(Arc::new(TypeInner {
            name: name.into(),
            kind,
            generics,
        }))
    }

    pub fn class<S: Into<String>>(name: S) -> Type {
        Type::new(name, TypeKind::Class, Generics::NonGeneric)
    }

    pub fn struct_type<S: Into<String>>(name: S) -> Type {
        Type::new(name, TypeKind::Struct, Generics::NonGeneric)
    }

    pub fn interface<S: Into<String>>(name: S) -> Type {
        Type::new(name, TypeKind::Interface, Generics::NonGeneric)
    }

    pub fn abstract_class<S: Into<String>>(name: S) -> Type {
        Type::new(name, TypeKind::Abstract, Generics::NonGeneric)
    }

    /// Open generic class definition with `arity` type parameters.
    pub fn generic_class<S: Into<String>>(name: S, arity: usize) -> Type {
        Type::new(name, TypeKind::Class, Generics::Definition { arity })
    }

    pub fn pointer(&self) -> Type {
        Type::new(
            format!("{}*", self.name()),
            TypeKind::Pointer(self.clone()),
            Generics::NonGeneric,
        )
    }

    pub fn by_ref(&self) -> Type {
        Type::new(
            format!("{}&", self.name()),
            TypeKind::ByRef(self.clone()),
            Generics::NonGeneric,
        )
    }

    /// Closes this generic definition over `args`.
    pub fn make_generic(&self, args: Vec<Type>) -> Result<Type, Error> {
        match self.generics() {
            Generics::Definition { arity } if *arity == args.len() => Ok(Type::new(
                self.name(),
                self.kind().clone(),
                Generics::Instance(args),
            )),
            Generics::Definition { arity } => Err(Error::invalid_data(format!(
                "Type {} expects {} type arguments but {} were supplied",
                self, arity, args.len()
            ))),
            _ => Err(Error::invalid_data(format!(
                "Type {} is not a generic type definition",
                self
            ))),
        }
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[inline(always)]
    pub fn kind(&self) -> &TypeKind {
        &self.0.kind
    }

    #[inline(always)]
    pub fn generics(&self) -> &Generics {
        &self.0.generics
    }

    pub fn is_value_type(&self) -> bool {
        self.0.kind == TypeKind::Struct
    }

    pub fn is_interface(&self) -> bool {
        self.0.kind == TypeKind::Interface
    }

    pub fn is_abstract(&self) -> bool {
        self.0.kind == TypeKind::Abstract
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.0.kind, TypeKind::Pointer(_))
    }

    pub fn is_by_ref(&self) -> bool {
        matches!(self.0.kind, TypeKind::ByRef(_))
    }

    pub fn is_generic_type_definition(&self) -> bool {
        matches!(self.0.generics, Generics::Definition { .. })
    }

    pub fn is_constructed_generic_type(&self) -> bool {
        matches!(self.0.generics, Generics::Instance(_))
    }

    pub fn generic_arguments(&self) -> &[Type] {
        match &self.0.generics {
            Generics::Instance(args) => args,
            _ => &[],
        }
    }

    /// Open definition of a closed generic type.
    pub fn definition(&self) -> Option<Type> {
        match &self.0.generics {
            Generics::Instance(args) => Some(Type::new(
                self.name(),
                self.kind().clone(),
                Generics::Definition { arity: args.len() },
            )),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        *self == Type::object()
    }

    /// Open definition of the built-in list type.
    pub fn list_definition() -> Type {
        static LIST: OnceLock<Type> = OnceLock::new();
        LIST.get_or_init(|| Type::generic_class("List", 1)).clone()
    }

    pub fn list_of(element: Type) -> Type {
        Type::new("List", TypeKind::Class, Generics::Instance(vec![element]))
    }
}

macro_rules! builtin_types {
    ($($id:ident => ($name:literal, $kind:ident)),* $(,)?) => {
        paste! {
            impl Type {
                $(
                    #[doc = concat!("Built-in `", $name, "` type.")]
                    pub fn $id() -> Type {
                        static [<$id:upper _TYPE>]: OnceLock<Type> = OnceLock::new();
                        [<$id:upper _TYPE>]
                            .get_or_init(|| Type::new($name, TypeKind::$kind, Generics::NonGeneric))
                            .clone()
                    }
                )*
            }
        }
    };
}

builtin_types!(
    object => ("object", Class),
    bool => ("bool", Struct),
    char => ("char", Struct),
    i8 => ("i8", Struct),
    u8 => ("u8", Struct),
    i16 => ("i16", Struct),
    u16 => ("u16", Struct),
    i32 => ("i32", Struct),
    u32 => ("u32", Struct),
    i64 => ("i64", Struct),
    u64 => ("u64", Struct),
    f32 => ("f32", Struct),
    f64 => ("f64", Struct),
    string => ("string", Class),
    bytes => ("bytes", Class),
    timestamp => ("timestamp", Struct),
    type_type => ("type", Class),
);

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.generics {
            Generics::NonGeneric => write!(f, "{}", self.0.name),
            Generics::Definition { arity } => write!(f, "{}`{}", self.0.name, arity),
            Generics::Instance(args) => {
                write!(f, "{}<", self.0.name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self)
    }
}
