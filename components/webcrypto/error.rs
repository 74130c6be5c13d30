/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The exceptions surfaced by the Web Cryptography API.
//!
//! Every variant except [`Error::Type`] corresponds to a `DOMException` name. The optional
//! payload is a human readable detail message; it never contains key material.

use std::fmt;

/// <https://webidl.spec.whatwg.org/#idl-DOMException-error-names>
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// NotSupportedError DOMException
    NotSupported(Option<String>),
    /// InvalidAccessError DOMException
    InvalidAccess(Option<String>),
    /// DataError DOMException
    Data(Option<String>),
    /// OperationError DOMException
    Operation(Option<String>),
    /// SyntaxError DOMException
    Syntax(Option<String>),
    /// QuotaExceededError DOMException
    QuotaExceeded(Option<String>),
    /// TypeMismatchError DOMException
    TypeMismatch(Option<String>),
    /// TypeError JavaScript Error
    Type(String),
}

/// The result of a fallible operation.
pub type Fallible<T> = Result<T, Error>;

impl Error {
    /// The name of the exception, as exposed to script.
    pub fn name(&self) -> &'static str {
        match self {
            Error::NotSupported(_) => "NotSupportedError",
            Error::InvalidAccess(_) => "InvalidAccessError",
            Error::Data(_) => "DataError",
            Error::Operation(_) => "OperationError",
            Error::Syntax(_) => "SyntaxError",
            Error::QuotaExceeded(_) => "QuotaExceededError",
            Error::TypeMismatch(_) => "TypeMismatchError",
            Error::Type(_) => "TypeError",
        }
    }

    /// The detail message attached to the exception, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Error::NotSupported(message) |
            Error::InvalidAccess(message) |
            Error::Data(message) |
            Error::Operation(message) |
            Error::Syntax(message) |
            Error::QuotaExceeded(message) |
            Error::TypeMismatch(message) => message.as_deref(),
            Error::Type(message) => Some(message),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{}: {}", self.name(), message),
            None => f.write_str(self.name()),
        }
    }
}

impl std::error::Error for Error {}
