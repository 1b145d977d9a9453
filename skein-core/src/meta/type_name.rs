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

//! Pluggable encoding of type names for the `Encoded` schema form.

use crate::error::Error;
use crate::meta::ty::{Generics, Type, TypeKind};

const MAX_NESTING: usize = 32;
const RESERVED: [char; 4] = ['`', '[', ']', ','];

/// Converts a [`Type`] to and from the name payload written on the wire.
pub trait TypeNameCodec: Send + Sync {
    fn encode(&self, ty: &Type) -> Result<Vec<u8>, Error>;

    fn decode(&self, bytes: &[u8]) -> Result<Type, Error>;
}

/// UTF-8 text form: a kind marker followed by the name and an optional
/// generic suffix.
///
/// | form                  | example               |
/// |-----------------------|-----------------------|
/// | class                 | `capp.Node`           |
/// | struct                | `vapp.Point`          |
/// | interface             | `iapp.Shape`          |
/// | abstract              | `aapp.Animal`         |
/// | generic definition    | ``cList`1``           |
/// | closed generic        | `cList[vi32]`         |
/// | pointer / by-ref      | `pvapp.Point`         |
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultTypeNameCodec;

impl DefaultTypeNameCodec {
    fn write(ty: &Type, out: &mut String, depth: usize) -> Result<(), Error> {
        if depth > MAX_NESTING {
            return Err(Error::encoding(format!(
                "Type {} is nested too deeply to be encoded",
                ty
            )));
        }
        let marker = match ty.kind() {
            TypeKind::Pointer(element) => {
                out.push('p');
                return Self::write(element, out, depth + 1);
            }
            TypeKind::ByRef(element) => {
                out.push('r');
                return Self::write(element, out, depth + 1);
            }
            TypeKind::Class => 'c',
            TypeKind::Struct => 'v',
            TypeKind::Interface => 'i',
            TypeKind::Abstract => 'a',
        };
        if ty.name().is_empty() || ty.name().contains(&RESERVED[..]) {
            return Err(Error::encoding(format!(
                "Type name {:?} cannot be encoded",
                ty.name()
            )));
        }
        out.push(marker);
        out.push_str(ty.name());
        match ty.generics() {
            Generics::NonGeneric => {}
            Generics::Definition { arity } => {
                out.push('`');
                out.push_str(&arity.to_string());
            }
            Generics::Instance(args) => {
                out.push('[');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    Self::write(arg, out, depth + 1)?;
                }
                out.push(']');
            }
        }
        Ok(())
    }
}

impl TypeNameCodec for DefaultTypeNameCodec {
    fn encode(&self, ty: &Type) -> Result<Vec<u8>, Error> {
        let mut out = String::new();
        Self::write(ty, &mut out, 0)?;
        Ok(out.into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Type, Error> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::encoding(format!("Type name is not valid UTF-8: {}", e)))?;
        let mut parser = Parser { input: text, pos: 0 };
        let ty = parser.parse_type(0)?;
        if parser.pos != text.len() {
            return Err(parser.error("trailing characters"));
        }
        Ok(ty)
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, what: &str) -> Error {
        Error::encoding(format!(
            "Malformed type name {:?} at offset {}: {}",
            self.input, self.pos, what
        ))
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn expect(&mut self, expected: char) -> Result<(), Error> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            _ => Err(self.error(&format!("expected '{}'", expected))),
        }
    }

    fn parse_type(&mut self, depth: usize) -> Result<Type, Error> {
        if depth > MAX_NESTING {
            return Err(self.error("nesting too deep"));
        }
        let kind = match self.bump() {
            Some('p') => return Ok(self.parse_type(depth + 1)?.pointer()),
            Some('r') => return Ok(self.parse_type(depth + 1)?.by_ref()),
            Some('c') => TypeKind::Class,
            Some('v') => TypeKind::Struct,
            Some('i') => TypeKind::Interface,
            Some('a') => TypeKind::Abstract,
            _ => return Err(self.error("unknown kind marker")),
        };
        let start = self.pos;
        while let Some(c) = self.peek() {
            if RESERVED.contains(&c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        let name = &self.input[start..self.pos];
        if name.is_empty() {
            return Err(self.error("empty name"));
        }
        let generics = match self.peek() {
            Some('`') => {
                self.pos += 1;
                let digits = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.pos += 1;
                }
                let arity = self.input[digits..self.pos]
                    .parse::<usize>()
                    .map_err(|_| self.error("invalid arity"))?;
                Generics::Definition { arity }
            }
            Some('[') => {
                self.pos += 1;
                let mut args = vec![self.parse_type(depth + 1)?];
                while self.peek() == Some(',') {
                    self.pos += 1;
                    args.push(self.parse_type(depth + 1)?);
                }
                self.expect(']')?;
                Generics::Instance(args)
            }
            _ => Generics::NonGeneric,
        };
        Ok(Type::new(name, kind, generics))
    }
}
