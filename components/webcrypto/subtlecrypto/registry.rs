/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! <https://w3c.github.io/webcrypto/#dfn-supportedAlgorithms>
//!
//! The table of registered algorithms, keyed by operation. It is built on first use and never
//! modified afterwards, so lookups need no synchronization.

use std::collections::HashMap;
use std::sync::LazyLock;

use strum::{IntoStaticStr, VariantArray};

use crate::error::{Error, Fallible};
use crate::subtlecrypto::CryptoAlgorithm;

/// <https://w3c.github.io/webcrypto/#supported-operation>
#[derive(Clone, Copy, Debug, Eq, Hash, IntoStaticStr, PartialEq, VariantArray)]
pub(crate) enum SupportedOperation {
    #[strum(serialize = "encrypt")]
    Encrypt,
    #[strum(serialize = "decrypt")]
    Decrypt,
    #[strum(serialize = "sign")]
    Sign,
    #[strum(serialize = "verify")]
    Verify,
    #[strum(serialize = "digest")]
    Digest,
    #[strum(serialize = "generateKey")]
    GenerateKey,
    #[strum(serialize = "deriveBits")]
    DeriveBits,
    #[strum(serialize = "importKey")]
    ImportKey,
    #[strum(serialize = "exportKey")]
    ExportKey,
    #[strum(serialize = "wrapKey")]
    WrapKey,
    #[strum(serialize = "unwrapKey")]
    UnwrapKey,
    #[strum(serialize = "get key length")]
    GetKeyLength,
}

impl SupportedOperation {
    pub(crate) fn as_str(&self) -> &'static str {
        (*self).into()
    }
}

use SupportedOperation::*;

const AES_OPERATIONS: &[SupportedOperation] = &[
    Encrypt,
    Decrypt,
    GenerateKey,
    ImportKey,
    ExportKey,
    GetKeyLength,
];
const RSA_SIGNATURE_OPERATIONS: &[SupportedOperation] =
    &[Sign, Verify, GenerateKey, ImportKey, ExportKey];
const KDF_OPERATIONS: &[SupportedOperation] = &[DeriveBits, ImportKey, GetKeyLength];

/// The operations each algorithm is registered for.
///
/// RSASSA-PKCS1-v1_5: <https://w3c.github.io/webcrypto/#rsassa-pkcs1-registration>
/// RSA-PSS:           <https://w3c.github.io/webcrypto/#rsa-pss-registration>
/// RSA-OAEP:          <https://w3c.github.io/webcrypto/#rsa-oaep-registration>
/// ECDSA:             <https://w3c.github.io/webcrypto/#ecdsa-registration>
/// ECDH:              <https://w3c.github.io/webcrypto/#ecdh-registration>
/// AES-CTR:           <https://w3c.github.io/webcrypto/#aes-ctr-registration>
/// AES-CBC:           <https://w3c.github.io/webcrypto/#aes-cbc-registration>
/// AES-GCM:           <https://w3c.github.io/webcrypto/#aes-gcm-registration>
/// AES-KW:            <https://w3c.github.io/webcrypto/#aes-kw-registration>
/// HMAC:              <https://w3c.github.io/webcrypto/#hmac-registration>
/// SHA:               <https://w3c.github.io/webcrypto/#sha-registration>
/// HKDF:              <https://w3c.github.io/webcrypto/#hkdf-registration>
/// PBKDF2:            <https://w3c.github.io/webcrypto/#pbkdf2-registration>
const REGISTRATIONS: &[(CryptoAlgorithm, &[SupportedOperation])] = &[
    (CryptoAlgorithm::RsassaPkcs1V1_5, RSA_SIGNATURE_OPERATIONS),
    (CryptoAlgorithm::RsaPss, RSA_SIGNATURE_OPERATIONS),
    (
        CryptoAlgorithm::RsaOaep,
        &[Encrypt, Decrypt, GenerateKey, ImportKey, ExportKey],
    ),
    (
        CryptoAlgorithm::Ecdsa,
        &[Sign, Verify, GenerateKey, ImportKey, ExportKey],
    ),
    (
        CryptoAlgorithm::Ecdh,
        &[DeriveBits, GenerateKey, ImportKey, ExportKey],
    ),
    (CryptoAlgorithm::AesCtr, AES_OPERATIONS),
    (CryptoAlgorithm::AesCbc, AES_OPERATIONS),
    (CryptoAlgorithm::AesGcm, AES_OPERATIONS),
    (
        CryptoAlgorithm::AesKw,
        &[
            WrapKey,
            UnwrapKey,
            GenerateKey,
            ImportKey,
            ExportKey,
            GetKeyLength,
        ],
    ),
    (
        CryptoAlgorithm::Hmac,
        &[Sign, Verify, GenerateKey, ImportKey, ExportKey, GetKeyLength],
    ),
    (CryptoAlgorithm::Sha1, &[Digest]),
    (CryptoAlgorithm::Sha256, &[Digest]),
    (CryptoAlgorithm::Sha384, &[Digest]),
    (CryptoAlgorithm::Sha512, &[Digest]),
    (CryptoAlgorithm::Hkdf, KDF_OPERATIONS),
    (CryptoAlgorithm::Pbkdf2, KDF_OPERATIONS),
];

/// (ASCII-lowercased algorithm name, operation) to the registered algorithm.
static SUPPORTED_ALGORITHMS: LazyLock<HashMap<(String, SupportedOperation), CryptoAlgorithm>> =
    LazyLock::new(|| {
        REGISTRATIONS
            .iter()
            .flat_map(|(algorithm, operations)| {
                operations.iter().map(move |operation| {
                    (
                        (algorithm.as_str().to_ascii_lowercase(), *operation),
                        *algorithm,
                    )
                })
            })
            .collect()
    });

/// Look up the algorithm registered for `operation` under a case-insensitive match of `name`.
pub(crate) fn resolve(name: &str, operation: SupportedOperation) -> Fallible<CryptoAlgorithm> {
    SUPPORTED_ALGORITHMS
        .get(&(name.to_ascii_lowercase(), operation))
        .copied()
        .ok_or_else(|| {
            Error::NotSupported(Some(format!(
                "{name} does not support \"{}\" operation",
                operation.as_str()
            )))
        })
}

/// Whether `algorithm` is registered for `operation`.
pub(crate) fn supports(algorithm: CryptoAlgorithm, operation: SupportedOperation) -> bool {
    SUPPORTED_ALGORITHMS.contains_key(&(algorithm.as_str().to_ascii_lowercase(), operation))
}
