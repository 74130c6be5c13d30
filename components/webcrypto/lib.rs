/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The Web Cryptography API: the `crypto` interface and the `SubtleCrypto` operations behind
//! `crypto.subtle`.
//!
//! <https://w3c.github.io/webcrypto/>

#![deny(unsafe_code)]

mod crypto;
mod cryptokey;
mod dictionary;
mod error;
mod prefs;
mod subtlecrypto;

pub use crate::crypto::{ArrayBufferViewMut, Crypto};
pub use crate::cryptokey::{
    CryptoKey, CryptoKeyOrCryptoKeyPair, CryptoKeyPair, KeyType, KeyUsage,
};
pub use crate::dictionary::{Algorithm, AlgorithmIdentifier, Member};
pub use crate::error::{Error, Fallible};
pub use crate::prefs::Preferences;
pub use crate::subtlecrypto::jwk::{JsonWebKey, RsaOtherPrimesInfo};
pub use crate::subtlecrypto::{
    ExportedKey, KeyAlgorithmAndDerivatives, KeyData, KeyFormat, SubtleAesKeyAlgorithm,
    SubtleCrypto, SubtleEcKeyAlgorithm, SubtleHmacKeyAlgorithm, SubtleKeyAlgorithm,
    SubtleRsaHashedKeyAlgorithm,
};
