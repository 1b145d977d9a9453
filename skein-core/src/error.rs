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

//! Error type shared by every layer of the engine.
//!
//! Errors are constructed through the static functions on [`Error`] rather
//! than the enum variants. Constructors are `#[cold]` so that the hot read and
//! write paths stay small; set `SKEIN_PANIC_ON_ERROR=1` at build time to turn
//! every constructor into a panic at the creation site, which together with
//! `RUST_BACKTRACE=1` pinpoints where a failure originated.

use std::borrow::Cow;

use thiserror::Error;

/// Set `SKEIN_PANIC_ON_ERROR` at compile time to panic where errors are created.
pub const PANIC_ON_ERROR: bool = option_env!("SKEIN_PANIC_ON_ERROR").is_some();

#[inline(always)]
pub const fn should_panic_on_error() -> bool {
    PANIC_ON_ERROR
}

/// Error type for serialization and deserialization operations.
///
/// Every error is a hard failure of the operation that raised it: nothing is
/// retried internally and no partially built object graph is handed back.
/// A [`Session`](crate::resolver::session::Session) that took part in a
/// failed operation must be discarded.
///
/// ```rust
/// use skein_core::error::Error;
///
/// let err = Error::codec_not_found("app.Node");
/// assert_eq!(err.to_string(), "Could not find a codec for type app.Node");
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// No field codec is registered for the requested type.
    #[error("Could not find a codec for type {0}")]
    CodecNotFound(Cow<'static, str>),

    #[error("Could not find a partial serializer for type {0}")]
    PartialSerializerNotFound(Cow<'static, str>),

    #[error("Could not find a value serializer for type {0}")]
    ValueSerializerNotFound(Cow<'static, str>),

    #[error("Could not find an activator for type {0}")]
    ActivatorNotFound(Cow<'static, str>),

    /// The subject is an open generic definition, a pointer or a by-ref type.
    #[error("{0}")]
    UnsupportedType(Cow<'static, str>),

    /// A resolved codec cannot be converted to the requested static type.
    #[error("{0}")]
    CannotAdaptCodec(Cow<'static, str>),

    /// A wire type that is invalid for the current decoding context.
    #[error("{0}")]
    UnknownWireType(Cow<'static, str>),

    #[error("Unknown referenced type id {0}")]
    UnknownReferencedType(u32),

    #[error("Unknown well-known type id {0}")]
    UnknownWellKnownType(u32),

    /// A type payload required to reconstruct a value is absent.
    #[error("{0}")]
    TypeMissing(Cow<'static, str>),

    /// The runtime type of a value is not allowed for the codec invoked.
    #[error("{0}")]
    IllegalType(Cow<'static, str>),

    #[error("Buffer out of bound: {0} + {1} > {2}")]
    BufferOutOfBound(usize, usize, usize),

    /// A buffer segment could not be provided for the requested length.
    #[error("{0}")]
    BufferAllocation(Cow<'static, str>),

    #[error("{0}")]
    InvalidData(Cow<'static, str>),

    #[error("{0}")]
    InvalidRef(Cow<'static, str>),

    #[error("{0}")]
    DepthExceed(Cow<'static, str>),

    /// A type name could not be encoded or decoded.
    #[error("{0}")]
    Encoding(Cow<'static, str>),

    /// A registration arrived after the registry was built.
    #[error("{0}")]
    RegistryFrozen(Cow<'static, str>),

    /// Failure raised by a collaborator codec.
    #[error(transparent)]
    External(#[from] anyhow::Error),
}

macro_rules! impl_error_constructor {
    ($(#[$meta:meta])* $name:ident => $variant:ident) => {
        $(#[$meta])*
        #[inline(always)]
        #[cold]
        #[track_caller]
        pub fn $name<S: Into<Cow<'static, str>>>(s: S) -> Self {
            let err = Error::$variant(s.into());
            if PANIC_ON_ERROR {
                panic!("SKEIN_PANIC_ON_ERROR: {}", err);
            }
            err
        }
    };
}

impl Error {
    impl_error_constructor!(
        /// Creates a new [`Error::CodecNotFound`] naming the subject type.
        codec_not_found => CodecNotFound
    );
    impl_error_constructor!(partial_serializer_not_found => PartialSerializerNotFound);
    impl_error_constructor!(value_serializer_not_found => ValueSerializerNotFound);
    impl_error_constructor!(activator_not_found => ActivatorNotFound);
    impl_error_constructor!(
        /// Creates a new [`Error::UnsupportedType`].
        ///
        /// ```
        /// use skein_core::error::Error;
        ///
        /// let err = Error::unsupported_type("Type List`1 is an open generic definition");
        /// ```
        unsupported_type => UnsupportedType
    );
    impl_error_constructor!(cannot_adapt_codec => CannotAdaptCodec);
    impl_error_constructor!(
        /// Creates a new [`Error::UnknownWireType`].
        unknown_wire_type => UnknownWireType
    );
    impl_error_constructor!(type_missing => TypeMissing);
    impl_error_constructor!(illegal_type => IllegalType);
    impl_error_constructor!(buffer_allocation => BufferAllocation);
    impl_error_constructor!(
        /// Creates a new [`Error::InvalidData`].
        ///
        /// ```
        /// use skein_core::error::Error;
        ///
        /// let err = Error::invalid_data(format!("Invalid value at position {}", 42));
        /// ```
        invalid_data => InvalidData
    );
    impl_error_constructor!(invalid_ref => InvalidRef);
    impl_error_constructor!(depth_exceed => DepthExceed);
    impl_error_constructor!(encoding => Encoding);
    impl_error_constructor!(registry_frozen => RegistryFrozen);

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unknown_referenced_type(id: u32) -> Self {
        let err = Error::UnknownReferencedType(id);
        if PANIC_ON_ERROR {
            panic!("SKEIN_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unknown_well_known_type(id: u32) -> Self {
        let err = Error::UnknownWellKnownType(id);
        if PANIC_ON_ERROR {
            panic!("SKEIN_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::BufferOutOfBound`] with the given bounds.
    ///
    /// ```
    /// use skein_core::error::Error;
    ///
    /// let err = Error::buffer_out_of_bound(10, 20, 25);
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn buffer_out_of_bound(offset: usize, length: usize, capacity: usize) -> Self {
        let err = Error::BufferOutOfBound(offset, length, capacity);
        if PANIC_ON_ERROR {
            panic!("SKEIN_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Wraps a failure raised by a collaborator codec.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn external<E: Into<anyhow::Error>>(err: E) -> Self {
        let err = Error::External(err.into());
        if PANIC_ON_ERROR {
            panic!("SKEIN_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Returns `true` for the four "no registered producer" failures.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::CodecNotFound(_)
                | Error::PartialSerializerNotFound(_)
                | Error::ValueSerializerNotFound(_)
                | Error::ActivatorNotFound(_)
        )
    }
}

/// Ensures a condition is true; otherwise returns an [`enum@Error`].
///
/// ```
/// use skein_core::ensure;
/// use skein_core::error::Error;
///
/// fn check_len(n: usize) -> Result<(), Error> {
///     ensure!(n > 0, "length must be positive");
///     ensure!(n < 10, Error::invalid_data(format!("length {} too large", n)));
///     Ok(())
/// }
/// assert!(check_len(3).is_ok());
/// assert!(check_len(0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data($msg));
        }
    };
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)));
        }
    };
}

/// Returns early with an [`Error::InvalidData`].
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($crate::error::Error::invalid_data($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)))
    };
}
