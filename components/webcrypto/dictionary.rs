/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Algorithm arguments as received from script.
//!
//! An [`Algorithm`] is the object form of an `AlgorithmIdentifier`: an ordered bag of named
//! members that is converted to the dictionary type each algorithm registers for an operation.
//! Conversion follows WebIDL, so a missing required member, a member of the wrong type, or an
//! integer outside the range of its IDL type is a `TypeError`.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::cryptokey::CryptoKey;
use crate::error::{Error, Fallible};

/// <https://w3c.github.io/webcrypto/#dfn-AlgorithmIdentifier>
#[derive(Clone, Debug)]
pub enum AlgorithmIdentifier {
    String(String),
    Object(Algorithm),
}

impl AlgorithmIdentifier {
    /// The algorithm name as given by the caller, if there is one.
    pub fn name(&self) -> Option<&str> {
        match self {
            AlgorithmIdentifier::String(name) => Some(name),
            AlgorithmIdentifier::Object(algorithm) => algorithm.name().ok(),
        }
    }
}

impl From<&str> for AlgorithmIdentifier {
    fn from(name: &str) -> Self {
        AlgorithmIdentifier::String(name.to_owned())
    }
}

impl From<String> for AlgorithmIdentifier {
    fn from(name: String) -> Self {
        AlgorithmIdentifier::String(name)
    }
}

impl From<Algorithm> for AlgorithmIdentifier {
    fn from(algorithm: Algorithm) -> Self {
        AlgorithmIdentifier::Object(algorithm)
    }
}

impl From<&AlgorithmIdentifier> for AlgorithmIdentifier {
    fn from(algorithm: &AlgorithmIdentifier) -> Self {
        algorithm.clone()
    }
}

/// A single dictionary member value.
#[derive(Clone, Debug)]
pub enum Member {
    String(String),
    Integer(i64),
    Boolean(bool),
    Bytes(Vec<u8>),
    Algorithm(AlgorithmIdentifier),
    Key(Arc<CryptoKey>),
}

impl Member {
    fn type_name(&self) -> &'static str {
        match self {
            Member::String(_) => "string",
            Member::Integer(_) => "integer",
            Member::Boolean(_) => "boolean",
            Member::Bytes(_) => "BufferSource",
            Member::Algorithm(_) => "object",
            Member::Key(_) => "CryptoKey",
        }
    }
}

impl From<&str> for Member {
    fn from(value: &str) -> Self {
        Member::String(value.to_owned())
    }
}

impl From<String> for Member {
    fn from(value: String) -> Self {
        Member::String(value)
    }
}

impl From<bool> for Member {
    fn from(value: bool) -> Self {
        Member::Boolean(value)
    }
}

macro_rules! integer_member {
    ($($integer:ty),*) => {
        $(
            impl From<$integer> for Member {
                fn from(value: $integer) -> Self {
                    Member::Integer(i64::from(value))
                }
            }
        )*
    };
}

integer_member!(i8, u8, i16, u16, i32, u32, i64);

impl From<Vec<u8>> for Member {
    fn from(value: Vec<u8>) -> Self {
        Member::Bytes(value)
    }
}

impl From<&[u8]> for Member {
    fn from(value: &[u8]) -> Self {
        Member::Bytes(value.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Member {
    fn from(value: &[u8; N]) -> Self {
        Member::Bytes(value.to_vec())
    }
}

impl From<Algorithm> for Member {
    fn from(value: Algorithm) -> Self {
        Member::Algorithm(AlgorithmIdentifier::Object(value))
    }
}

impl From<AlgorithmIdentifier> for Member {
    fn from(value: AlgorithmIdentifier) -> Self {
        Member::Algorithm(value)
    }
}

impl From<Arc<CryptoKey>> for Member {
    fn from(value: Arc<CryptoKey>) -> Self {
        Member::Key(value)
    }
}

impl From<&Arc<CryptoKey>> for Member {
    fn from(value: &Arc<CryptoKey>) -> Self {
        Member::Key(value.clone())
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-Algorithm>
#[derive(Clone, Debug, Default)]
pub struct Algorithm {
    members: IndexMap<String, Member>,
}

impl Algorithm {
    /// A dictionary whose `name` member is `name`.
    pub fn new(name: impl Into<String>) -> Algorithm {
        Algorithm::default().with("name", name.into())
    }

    /// Add, or replace, the member `key`.
    pub fn with(mut self, key: &str, value: impl Into<Member>) -> Algorithm {
        self.members.insert(key.to_owned(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Member> {
        self.members.get(key)
    }

    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    pub fn name(&self) -> Fallible<&str> {
        self.get_string("name")
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.members
            .insert("name".to_owned(), Member::String(name.to_owned()));
    }

    fn required(&self, key: &str) -> Fallible<&Member> {
        self.get(key).ok_or_else(|| {
            Error::Type(format!(
                "Missing required member \"{key}\" in algorithm dictionary"
            ))
        })
    }

    fn mismatch(key: &str, expected: &str, member: &Member) -> Error {
        Error::Type(format!(
            "Member \"{key}\" of algorithm dictionary is not a {expected} but a {}",
            member.type_name()
        ))
    }

    pub(crate) fn get_string(&self, key: &str) -> Fallible<&str> {
        match self.required(key)? {
            Member::String(value) => Ok(value),
            member => Err(Self::mismatch(key, "string", member)),
        }
    }

    /// A `BufferSource` member; the bytes are copied.
    pub(crate) fn get_bytes(&self, key: &str) -> Fallible<Vec<u8>> {
        match self.required(key)? {
            Member::Bytes(value) => Ok(value.clone()),
            member => Err(Self::mismatch(key, "BufferSource", member)),
        }
    }

    pub(crate) fn get_optional_bytes(&self, key: &str) -> Fallible<Option<Vec<u8>>> {
        match self.get(key) {
            None => Ok(None),
            Some(_) => self.get_bytes(key).map(Some),
        }
    }

    /// An `[EnforceRange]` integer member converted to the IDL type `T`.
    pub(crate) fn get_integer<T: TryFrom<i64>>(&self, key: &str) -> Fallible<T> {
        match self.required(key)? {
            Member::Integer(value) => T::try_from(*value).map_err(|_| {
                Error::Type(format!(
                    "Member \"{key}\" of algorithm dictionary is out of range: {value}"
                ))
            }),
            member => Err(Self::mismatch(key, "integer", member)),
        }
    }

    pub(crate) fn get_optional_integer<T: TryFrom<i64>>(&self, key: &str) -> Fallible<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(_) => self.get_integer(key).map(Some),
        }
    }

    /// A `(object or DOMString)` member such as `HashAlgorithmIdentifier`.
    pub(crate) fn get_algorithm(&self, key: &str) -> Fallible<AlgorithmIdentifier> {
        match self.required(key)? {
            Member::String(name) => Ok(AlgorithmIdentifier::String(name.clone())),
            Member::Algorithm(algorithm) => Ok(algorithm.clone()),
            member => Err(Self::mismatch(key, "algorithm identifier", member)),
        }
    }

    pub(crate) fn get_key(&self, key: &str) -> Fallible<Arc<CryptoKey>> {
        match self.required(key)? {
            Member::Key(value) => Ok(value.clone()),
            member => Err(Self::mismatch(key, "CryptoKey", member)),
        }
    }
}
