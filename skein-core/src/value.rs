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

//! Dynamically typed values exchanged with codecs.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, RwLock};

use chrono::NaiveDateTime;

use crate::error::Error;
use crate::meta::Type;

/// Payload of a [`StructValue`]. Implemented for every
/// `Any + Debug + PartialEq + Send + Sync` type.
pub trait StructData: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn eq_data(&self, other: &dyn StructData) -> bool;
}

impl<T: Any + fmt::Debug + PartialEq + Send + Sync> StructData for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_data(&self, other: &dyn StructData) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }
}

/// An instance of a value type. Compared by content, never tracked by identity.
#[derive(Clone, Debug)]
pub struct StructValue {
    ty: Type,
    data: Arc<dyn StructData>,
}

impl StructValue {
    pub fn new<T: StructData>(ty: Type, data: T) -> StructValue {
        StructValue {
            ty,
            data: Arc::new(data),
        }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn get<T: 'static>(&self) -> Result<&T, Error> {
        self.data.as_any().downcast_ref::<T>().ok_or_else(|| {
            Error::illegal_type(format!(
                "Value of type {} is not a {}",
                self.ty,
                std::any::type_name::<T>()
            ))
        })
    }
}

impl PartialEq for StructValue {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.data.eq_data(other.data.as_ref())
    }
}

type Cell = Arc<RwLock<Box<dyn Any + Send + Sync>>>;

/// A shared, mutable instance of a reference type.
///
/// Clones share the same allocation. Identity is the allocation address, so
/// two handles are "the same object" exactly when [`ObjectRef::ptr_eq`]
/// holds. Fields are populated through [`ObjectRef::with_mut`] after the
/// instance has been created, which lets a decoder record an object before
/// its members (and any back-references to it) are read.
#[derive(Clone)]
pub struct ObjectRef {
    ty: Type,
    cell: Cell,
}

impl ObjectRef {
    pub fn new<T: Any + Send + Sync>(ty: Type, value: T) -> ObjectRef {
        ObjectRef {
            ty,
            cell: Arc::new(RwLock::new(Box::new(value))),
        }
    }

    /// A list of `element` values, as handled by the built-in list codec.
    pub fn list(element: Type, items: Vec<Value>) -> ObjectRef {
        ObjectRef::new(Type::list_of(element), items)
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline(always)]
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.cell) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    pub fn is<T: Any>(&self) -> bool {
        self.cell
            .read()
            .map(|guard| guard.is::<T>())
            .unwrap_or(false)
    }

    /// Runs `f` with shared access to the payload.
    pub fn with<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, Error> {
        let guard = self
            .cell
            .read()
            .map_err(|_| Error::invalid_data(format!("Object of type {} is poisoned", self.ty)))?;
        let value = guard.downcast_ref::<T>().ok_or_else(|| self.mismatch::<T>())?;
        Ok(f(value))
    }

    /// Runs `f` with exclusive access to the payload.
    ///
    /// Must not be called while the same object is borrowed through
    /// [`ObjectRef::with`] on this thread.
    pub fn with_mut<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, Error> {
        let mut guard = self
            .cell
            .write()
            .map_err(|_| Error::invalid_data(format!("Object of type {} is poisoned", self.ty)))?;
        let value = guard.downcast_mut::<T>().ok_or_else(|| self.mismatch::<T>())?;
        Ok(f(value))
    }

    fn mismatch<T>(&self) -> Error {
        Error::illegal_type(format!(
            "Object of type {} is not a {}",
            self.ty,
            std::any::type_name::<T>()
        ))
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({} @ {:#x})", self.ty, self.identity())
    }
}

/// Empty payload of a plain `object` instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlainObject;

#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    Type(Type),
    Struct(StructValue),
    Object(ObjectRef),
}

impl Value {
    /// A fresh plain `object` instance.
    pub fn new_object() -> Value {
        Value::Object(ObjectRef::new(Type::object(), PlainObject))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Concrete runtime type, or `None` for null.
    pub fn runtime_type(&self) -> Option<Type> {
        Some(match self {
            Value::Null => return None,
            Value::Bool(_) => Type::bool(),
            Value::Char(_) => Type::char(),
            Value::I8(_) => Type::i8(),
            Value::U8(_) => Type::u8(),
            Value::I16(_) => Type::i16(),
            Value::U16(_) => Type::u16(),
            Value::I32(_) => Type::i32(),
            Value::U32(_) => Type::u32(),
            Value::I64(_) => Type::i64(),
            Value::U64(_) => Type::u64(),
            Value::F32(_) => Type::f32(),
            Value::F64(_) => Type::f64(),
            Value::String(_) => Type::string(),
            Value::Bytes(_) => Type::bytes(),
            Value::Timestamp(_) => Type::timestamp(),
            Value::Type(_) => Type::type_type(),
            Value::Struct(s) => s.ty().clone(),
            Value::Object(o) => o.ty().clone(),
        })
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&Type> {
        match self {
            Value::Type(t) => Some(t),
            _ => None,
        }
    }
}

/// Objects compare by identity, everything else by content.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_primitive!(
    bool => Bool,
    char => Char,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    Vec<u8> => Bytes,
    NaiveDateTime => Timestamp,
    Type => Type,
    StructValue => Struct,
    ObjectRef => Object,
);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
