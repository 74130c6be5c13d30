/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fmt;
use std::sync::Arc;

use aes::cipher::crypto_common::Key;
use aes::{Aes128, Aes192, Aes256};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::Serialize;
use strum::{EnumString, IntoStaticStr, VariantArray};

use crate::subtlecrypto::KeyAlgorithmAndDerivatives;

/// <https://w3c.github.io/webcrypto/#dfn-KeyType>
#[derive(Clone, Copy, Debug, EnumString, Eq, IntoStaticStr, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum KeyType {
    Public,
    Private,
    Secret,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-KeyUsage>
///
/// The declaration order is the order in which usages are reported by [`CryptoKey::usages`].
#[derive(
    Clone,
    Copy,
    Debug,
    EnumString,
    Eq,
    Hash,
    IntoStaticStr,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    VariantArray,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum KeyUsage {
    Encrypt,
    Decrypt,
    Sign,
    Verify,
    DeriveKey,
    DeriveBits,
    WrapKey,
    UnwrapKey,
}

impl KeyUsage {
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }
}

/// The underlying cryptographic data this key represents
pub(crate) enum Handle {
    Aes128Key(Key<Aes128>),
    Aes192Key(Key<Aes192>),
    Aes256Key(Key<Aes256>),
    Hmac(Vec<u8>),
    Hkdf(Vec<u8>),
    Pbkdf2(Vec<u8>),
    RsaPrivateKey(RsaPrivateKey),
    RsaPublicKey(RsaPublicKey),
    P256PrivateKey(p256::SecretKey),
    P384PrivateKey(p384::SecretKey),
    P521PrivateKey(p521::SecretKey),
    K256PrivateKey(k256::SecretKey),
    P256PublicKey(p256::PublicKey),
    P384PublicKey(p384::PublicKey),
    P521PublicKey(p521::PublicKey),
    K256PublicKey(k256::PublicKey),
}

impl Handle {
    /// The raw bytes of a secret key. Asymmetric handles have none.
    pub(crate) fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Handle::Aes128Key(key) => Some(key.as_slice()),
            Handle::Aes192Key(key) => Some(key.as_slice()),
            Handle::Aes256Key(key) => Some(key.as_slice()),
            Handle::Hmac(key) | Handle::Hkdf(key) | Handle::Pbkdf2(key) => Some(key),
            _ => None,
        }
    }
}

/// <https://w3c.github.io/webcrypto/#cryptokey-interface>
///
/// A key never changes after construction. Its material is only reachable from inside this
/// crate, and only leaves it through an export of an extractable key.
pub struct CryptoKey {
    /// <https://w3c.github.io/webcrypto/#dom-cryptokey-type>
    key_type: KeyType,

    /// <https://w3c.github.io/webcrypto/#dom-cryptokey-extractable>
    extractable: bool,

    /// <https://w3c.github.io/webcrypto/#dom-cryptokey-algorithm>
    algorithm: KeyAlgorithmAndDerivatives,

    /// <https://w3c.github.io/webcrypto/#dom-cryptokey-usages>
    usages: Vec<KeyUsage>,

    /// <https://w3c.github.io/webcrypto/#dfn-CryptoKey-slot-handle>
    handle: Handle,
}

impl CryptoKey {
    pub(crate) fn new(
        key_type: KeyType,
        extractable: bool,
        algorithm: KeyAlgorithmAndDerivatives,
        mut usages: Vec<KeyUsage>,
        handle: Handle,
    ) -> Arc<CryptoKey> {
        usages.sort();
        usages.dedup();
        Arc::new(CryptoKey {
            key_type,
            extractable,
            algorithm,
            usages,
            handle,
        })
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn extractable(&self) -> bool {
        self.extractable
    }

    pub fn algorithm(&self) -> &KeyAlgorithmAndDerivatives {
        &self.algorithm
    }

    pub fn usages(&self) -> &[KeyUsage] {
        &self.usages
    }

    pub(crate) fn handle(&self) -> &Handle {
        &self.handle
    }
}

impl fmt::Debug for CryptoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoKey")
            .field("type", &self.key_type)
            .field("extractable", &self.extractable)
            .field("algorithm", &self.algorithm)
            .field("usages", &self.usages)
            .finish_non_exhaustive()
    }
}

/// <https://w3c.github.io/webcrypto/#keypair>
#[derive(Clone, Debug)]
pub struct CryptoKeyPair {
    pub public_key: Arc<CryptoKey>,
    pub private_key: Arc<CryptoKey>,
}

/// The result of `generateKey`: a single secret key, or a key pair.
#[derive(Clone, Debug)]
pub enum CryptoKeyOrCryptoKeyPair {
    CryptoKey(Arc<CryptoKey>),
    CryptoKeyPair(CryptoKeyPair),
}
