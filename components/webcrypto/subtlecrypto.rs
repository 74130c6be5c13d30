/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

mod aes_cbc_operation;
mod aes_common;
mod aes_ctr_operation;
mod aes_gcm_operation;
mod aes_kw_operation;
mod asn1;
mod ec_common;
mod ecdh_operation;
mod ecdsa_operation;
mod hkdf_operation;
mod hmac_operation;
pub(crate) mod jwk;
mod pbkdf2_operation;
pub(crate) mod registry;
mod rsa_common;
mod rsa_oaep_operation;
mod rsa_pss_operation;
mod rsassa_pkcs1_v1_5_operation;
mod sha_operation;

use std::sync::Arc;

use log::debug;
use serde::Serialize;
use strum::{EnumString, IntoStaticStr, VariantArray};

use crate::cryptokey::{CryptoKey, CryptoKeyOrCryptoKeyPair, KeyType, KeyUsage};
use crate::dictionary::{Algorithm, AlgorithmIdentifier};
use crate::error::{Error, Fallible};
use crate::prefs::Preferences;
use crate::subtlecrypto::jwk::{JsonWebKey, JsonWebKeyExt};
use crate::subtlecrypto::registry::SupportedOperation;
use crate::subtlecrypto::sha_operation::HashFunction;

// Regconized algorithm name from <https://w3c.github.io/webcrypto/>
const ALG_RSASSA_PKCS1_V1_5: &str = "RSASSA-PKCS1-v1_5";
const ALG_RSA_PSS: &str = "RSA-PSS";
const ALG_RSA_OAEP: &str = "RSA-OAEP";
const ALG_ECDSA: &str = "ECDSA";
const ALG_ECDH: &str = "ECDH";
const ALG_AES_CTR: &str = "AES-CTR";
const ALG_AES_CBC: &str = "AES-CBC";
const ALG_AES_GCM: &str = "AES-GCM";
const ALG_AES_KW: &str = "AES-KW";
const ALG_HMAC: &str = "HMAC";
const ALG_SHA1: &str = "SHA-1";
const ALG_SHA256: &str = "SHA-256";
const ALG_SHA384: &str = "SHA-384";
const ALG_SHA512: &str = "SHA-512";
const ALG_HKDF: &str = "HKDF";
const ALG_PBKDF2: &str = "PBKDF2";

// Named elliptic curves
const NAMED_CURVE_P256: &str = "P-256";
const NAMED_CURVE_P384: &str = "P-384";
const NAMED_CURVE_P521: &str = "P-521";
const NAMED_CURVE_K256: &str = "K-256";

#[derive(Clone, Copy, Debug, Eq, Hash, IntoStaticStr, PartialEq, VariantArray)]
pub(crate) enum CryptoAlgorithm {
    #[strum(serialize = "RSASSA-PKCS1-v1_5")]
    RsassaPkcs1V1_5,
    #[strum(serialize = "RSA-PSS")]
    RsaPss,
    #[strum(serialize = "RSA-OAEP")]
    RsaOaep,
    #[strum(serialize = "ECDSA")]
    Ecdsa,
    #[strum(serialize = "ECDH")]
    Ecdh,
    #[strum(serialize = "AES-CTR")]
    AesCtr,
    #[strum(serialize = "AES-CBC")]
    AesCbc,
    #[strum(serialize = "AES-GCM")]
    AesGcm,
    #[strum(serialize = "AES-KW")]
    AesKw,
    #[strum(serialize = "HMAC")]
    Hmac,
    #[strum(serialize = "SHA-1")]
    Sha1,
    #[strum(serialize = "SHA-256")]
    Sha256,
    #[strum(serialize = "SHA-384")]
    Sha384,
    #[strum(serialize = "SHA-512")]
    Sha512,
    #[strum(serialize = "HKDF")]
    Hkdf,
    #[strum(serialize = "PBKDF2")]
    Pbkdf2,
}

impl CryptoAlgorithm {
    /// <https://w3c.github.io/webcrypto/#recognized-algorithm-name>
    pub(crate) fn as_str(&self) -> &'static str {
        (*self).into()
    }

    fn from_str_ignore_case(algorithm_name: &str) -> Fallible<CryptoAlgorithm> {
        Self::VARIANTS
            .iter()
            .find(|algorithm| algorithm.as_str().eq_ignore_ascii_case(algorithm_name))
            .cloned()
            .ok_or(Error::NotSupported(Some(format!(
                "Unsupported algorithm: {algorithm_name}"
            ))))
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-KeyFormat>
#[derive(Clone, Copy, Debug, EnumString, Eq, IntoStaticStr, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum KeyFormat {
    Raw,
    Spki,
    Pkcs8,
    Jwk,
}

impl KeyFormat {
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }
}

/// The `keyData` argument of `importKey`: a `BufferSource` for "raw", "spki" and "pkcs8", or a
/// `JsonWebKey` dictionary for "jwk".
#[derive(Clone, Debug)]
pub enum KeyData {
    Bytes(Vec<u8>),
    Jwk(Box<JsonWebKey>),
}

impl From<Vec<u8>> for KeyData {
    fn from(bytes: Vec<u8>) -> Self {
        KeyData::Bytes(bytes)
    }
}

impl From<&[u8]> for KeyData {
    fn from(bytes: &[u8]) -> Self {
        KeyData::Bytes(bytes.to_vec())
    }
}

impl From<JsonWebKey> for KeyData {
    fn from(jwk: JsonWebKey) -> Self {
        KeyData::Jwk(Box::new(jwk))
    }
}

/// The returned type of the successful export key operation. `Bytes` should be used when the key
/// is exported in "raw", "spki" or "pkcs8" format. `Jwk` should be used when the key is exported
/// in "jwk" format.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExportedKey {
    Bytes(Vec<u8>),
    Jwk(Box<JsonWebKey>),
}

// These "subtle" structs are the normalized forms of the IDL dictionaries. Dictionary members
// typed `HashAlgorithmIdentifier` are normalized for the "digest" operation while converting.

/// <https://w3c.github.io/webcrypto/#dfn-Algorithm>
#[derive(Clone, Debug)]
pub(crate) struct SubtleAlgorithm {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,
}

impl TryFrom<&Algorithm> for SubtleAlgorithm {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtleAlgorithm {
            name: dictionary.name()?.to_owned(),
        })
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-KeyAlgorithm>
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SubtleKeyAlgorithm {
    /// <https://w3c.github.io/webcrypto/#dom-keyalgorithm-name>
    pub name: String,
}

/// <https://w3c.github.io/webcrypto/#dfn-RsaHashedKeyGenParams>
#[derive(Clone, Debug)]
pub(crate) struct SubtleRsaHashedKeyGenParams {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-RsaKeyGenParams-modulusLength>
    modulus_length: u32,

    /// <https://w3c.github.io/webcrypto/#dfn-RsaKeyGenParams-publicExponent>
    public_exponent: Vec<u8>,

    /// <https://w3c.github.io/webcrypto/#dfn-RsaHashedKeyGenParams-hash>
    hash: DigestAlgorithm,
}

impl TryFrom<&Algorithm> for SubtleRsaHashedKeyGenParams {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtleRsaHashedKeyGenParams {
            name: dictionary.name()?.to_owned(),
            modulus_length: dictionary.get_integer("modulusLength")?,
            public_exponent: dictionary.get_bytes("publicExponent")?,
            hash: normalize_algorithm::<DigestOperation>(&dictionary.get_algorithm("hash")?)?,
        })
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-RsaHashedKeyAlgorithm>
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtleRsaHashedKeyAlgorithm {
    /// <https://w3c.github.io/webcrypto/#dom-keyalgorithm-name>
    pub name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-RsaKeyAlgorithm-modulusLength>
    pub modulus_length: u32,

    /// <https://w3c.github.io/webcrypto/#dfn-RsaKeyAlgorithm-publicExponent>
    pub public_exponent: Vec<u8>,

    /// <https://w3c.github.io/webcrypto/#dfn-RsaHashedKeyAlgorithm-hash>
    pub hash: SubtleKeyAlgorithm,
}

/// <https://w3c.github.io/webcrypto/#dfn-RsaHashedImportParams>
#[derive(Clone, Debug)]
pub(crate) struct SubtleRsaHashedImportParams {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-RsaHashedImportParams-hash>
    hash: DigestAlgorithm,
}

impl TryFrom<&Algorithm> for SubtleRsaHashedImportParams {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtleRsaHashedImportParams {
            name: dictionary.name()?.to_owned(),
            hash: normalize_algorithm::<DigestOperation>(&dictionary.get_algorithm("hash")?)?,
        })
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-RsaPssParams>
#[derive(Clone, Debug)]
pub(crate) struct SubtleRsaPssParams {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-RsaPssParams-saltLength>
    salt_length: u32,
}

impl TryFrom<&Algorithm> for SubtleRsaPssParams {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtleRsaPssParams {
            name: dictionary.name()?.to_owned(),
            salt_length: dictionary.get_integer("saltLength")?,
        })
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-RsaOaepParams>
#[derive(Clone, Debug)]
pub(crate) struct SubtleRsaOaepParams {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-RsaOaepParams-label>
    label: Option<Vec<u8>>,
}

impl TryFrom<&Algorithm> for SubtleRsaOaepParams {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtleRsaOaepParams {
            name: dictionary.name()?.to_owned(),
            label: dictionary.get_optional_bytes("label")?,
        })
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-EcdsaParams>
#[derive(Clone, Debug)]
pub(crate) struct SubtleEcdsaParams {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-EcdsaParams-hash>
    hash: DigestAlgorithm,
}

impl TryFrom<&Algorithm> for SubtleEcdsaParams {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtleEcdsaParams {
            name: dictionary.name()?.to_owned(),
            hash: normalize_algorithm::<DigestOperation>(&dictionary.get_algorithm("hash")?)?,
        })
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-EcKeyGenParams>
#[derive(Clone, Debug)]
pub(crate) struct SubtleEcKeyGenParams {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-EcKeyGenParams-namedCurve>
    named_curve: String,
}

impl TryFrom<&Algorithm> for SubtleEcKeyGenParams {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtleEcKeyGenParams {
            name: dictionary.name()?.to_owned(),
            named_curve: dictionary.get_string("namedCurve")?.to_owned(),
        })
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-EcKeyAlgorithm>
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtleEcKeyAlgorithm {
    /// <https://w3c.github.io/webcrypto/#dom-keyalgorithm-name>
    pub name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-EcKeyAlgorithm-namedCurve>
    pub named_curve: String,
}

/// <https://w3c.github.io/webcrypto/#dfn-EcKeyImportParams>
#[derive(Clone, Debug)]
pub(crate) struct SubtleEcKeyImportParams {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-EcKeyImportParams-namedCurve>
    named_curve: String,
}

impl TryFrom<&Algorithm> for SubtleEcKeyImportParams {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtleEcKeyImportParams {
            name: dictionary.name()?.to_owned(),
            named_curve: dictionary.get_string("namedCurve")?.to_owned(),
        })
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-EcdhKeyDeriveParams>
#[derive(Clone, Debug)]
pub(crate) struct SubtleEcdhKeyDeriveParams {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-EcdhKeyDeriveParams-public>
    public: Arc<CryptoKey>,
}

impl TryFrom<&Algorithm> for SubtleEcdhKeyDeriveParams {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtleEcdhKeyDeriveParams {
            name: dictionary.name()?.to_owned(),
            public: dictionary.get_key("public")?,
        })
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-AesCtrParams>
#[derive(Clone, Debug)]
pub(crate) struct SubtleAesCtrParams {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-AesCtrParams-counter>
    counter: Vec<u8>,

    /// <https://w3c.github.io/webcrypto/#dfn-AesCtrParams-length>
    length: u8,
}

impl TryFrom<&Algorithm> for SubtleAesCtrParams {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtleAesCtrParams {
            name: dictionary.name()?.to_owned(),
            counter: dictionary.get_bytes("counter")?,
            length: dictionary.get_integer("length")?,
        })
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-AesKeyAlgorithm>
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SubtleAesKeyAlgorithm {
    /// <https://w3c.github.io/webcrypto/#dom-keyalgorithm-name>
    pub name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-AesKeyAlgorithm-length>
    pub length: u16,
}

/// <https://w3c.github.io/webcrypto/#dfn-AesKeyGenParams>
#[derive(Clone, Debug)]
pub(crate) struct SubtleAesKeyGenParams {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-AesKeyGenParams-length>
    length: u16,
}

impl TryFrom<&Algorithm> for SubtleAesKeyGenParams {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtleAesKeyGenParams {
            name: dictionary.name()?.to_owned(),
            length: dictionary.get_integer("length")?,
        })
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-AesDerivedKeyParams>
#[derive(Clone, Debug)]
pub(crate) struct SubtleAesDerivedKeyParams {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-AesDerivedKeyParams-length>
    length: u16,
}

impl TryFrom<&Algorithm> for SubtleAesDerivedKeyParams {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtleAesDerivedKeyParams {
            name: dictionary.name()?.to_owned(),
            length: dictionary.get_integer("length")?,
        })
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-AesCbcParams>
#[derive(Clone, Debug)]
pub(crate) struct SubtleAesCbcParams {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-AesCbcParams-iv>
    iv: Vec<u8>,
}

impl TryFrom<&Algorithm> for SubtleAesCbcParams {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtleAesCbcParams {
            name: dictionary.name()?.to_owned(),
            iv: dictionary.get_bytes("iv")?,
        })
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-AesGcmParams>
#[derive(Clone, Debug)]
pub(crate) struct SubtleAesGcmParams {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-AesGcmParams-iv>
    iv: Vec<u8>,

    /// <https://w3c.github.io/webcrypto/#dfn-AesGcmParams-additionalData>
    additional_data: Option<Vec<u8>>,

    /// <https://w3c.github.io/webcrypto/#dfn-AesGcmParams-tagLength>
    tag_length: Option<u8>,
}

impl TryFrom<&Algorithm> for SubtleAesGcmParams {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtleAesGcmParams {
            name: dictionary.name()?.to_owned(),
            iv: dictionary.get_bytes("iv")?,
            additional_data: dictionary.get_optional_bytes("additionalData")?,
            tag_length: dictionary.get_optional_integer("tagLength")?,
        })
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-HmacImportParams>
#[derive(Clone, Debug)]
pub(crate) struct SubtleHmacImportParams {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-HmacImportParams-hash>
    hash: DigestAlgorithm,

    /// <https://w3c.github.io/webcrypto/#dfn-HmacImportParams-length>
    length: Option<u32>,
}

impl TryFrom<&Algorithm> for SubtleHmacImportParams {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtleHmacImportParams {
            name: dictionary.name()?.to_owned(),
            hash: normalize_algorithm::<DigestOperation>(&dictionary.get_algorithm("hash")?)?,
            length: dictionary.get_optional_integer("length")?,
        })
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-HmacKeyAlgorithm>
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SubtleHmacKeyAlgorithm {
    /// <https://w3c.github.io/webcrypto/#dom-keyalgorithm-name>
    pub name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-HmacKeyAlgorithm-hash>
    pub hash: SubtleKeyAlgorithm,

    /// <https://w3c.github.io/webcrypto/#dfn-HmacKeyGenParams-length>
    pub length: u32,
}

/// <https://w3c.github.io/webcrypto/#dfn-HmacKeyGenParams>
#[derive(Clone, Debug)]
pub(crate) struct SubtleHmacKeyGenParams {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-HmacKeyGenParams-hash>
    hash: DigestAlgorithm,

    /// <https://w3c.github.io/webcrypto/#dfn-HmacKeyGenParams-length>
    length: Option<u32>,
}

impl TryFrom<&Algorithm> for SubtleHmacKeyGenParams {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtleHmacKeyGenParams {
            name: dictionary.name()?.to_owned(),
            hash: normalize_algorithm::<DigestOperation>(&dictionary.get_algorithm("hash")?)?,
            length: dictionary.get_optional_integer("length")?,
        })
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-HkdfParams>
#[derive(Clone, Debug)]
pub(crate) struct SubtleHkdfParams {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-HkdfParams-hash>
    hash: DigestAlgorithm,

    /// <https://w3c.github.io/webcrypto/#dfn-HkdfParams-salt>
    salt: Vec<u8>,

    /// <https://w3c.github.io/webcrypto/#dfn-HkdfParams-info>
    info: Vec<u8>,
}

impl TryFrom<&Algorithm> for SubtleHkdfParams {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtleHkdfParams {
            name: dictionary.name()?.to_owned(),
            hash: normalize_algorithm::<DigestOperation>(&dictionary.get_algorithm("hash")?)?,
            salt: dictionary.get_bytes("salt")?,
            info: dictionary.get_bytes("info")?,
        })
    }
}

/// <https://w3c.github.io/webcrypto/#dfn-Pbkdf2Params>
#[derive(Clone, Debug)]
pub(crate) struct SubtlePbkdf2Params {
    /// <https://w3c.github.io/webcrypto/#dom-algorithm-name>
    name: String,

    /// <https://w3c.github.io/webcrypto/#dfn-Pbkdf2Params-salt>
    salt: Vec<u8>,

    /// <https://w3c.github.io/webcrypto/#dfn-Pbkdf2Params-iterations>
    iterations: u32,

    /// <https://w3c.github.io/webcrypto/#dfn-Pbkdf2Params-hash>
    hash: DigestAlgorithm,
}

impl TryFrom<&Algorithm> for SubtlePbkdf2Params {
    type Error = Error;

    fn try_from(dictionary: &Algorithm) -> Fallible<Self> {
        Ok(SubtlePbkdf2Params {
            name: dictionary.name()?.to_owned(),
            salt: dictionary.get_bytes("salt")?,
            iterations: dictionary.get_integer("iterations")?,
            hash: normalize_algorithm::<DigestOperation>(&dictionary.get_algorithm("hash")?)?,
        })
    }
}

/// Union type of KeyAlgorithm and IDL dictionary types derived from it. It serializes to the
/// object exposed as the `algorithm` attribute of a key.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
#[expect(clippy::enum_variant_names)]
pub enum KeyAlgorithmAndDerivatives {
    KeyAlgorithm(SubtleKeyAlgorithm),
    RsaHashedKeyAlgorithm(SubtleRsaHashedKeyAlgorithm),
    EcKeyAlgorithm(SubtleEcKeyAlgorithm),
    AesKeyAlgorithm(SubtleAesKeyAlgorithm),
    HmacKeyAlgorithm(SubtleHmacKeyAlgorithm),
}

impl KeyAlgorithmAndDerivatives {
    pub fn name(&self) -> &str {
        match self {
            KeyAlgorithmAndDerivatives::KeyAlgorithm(algorithm) => &algorithm.name,
            KeyAlgorithmAndDerivatives::RsaHashedKeyAlgorithm(algorithm) => &algorithm.name,
            KeyAlgorithmAndDerivatives::EcKeyAlgorithm(algorithm) => &algorithm.name,
            KeyAlgorithmAndDerivatives::AesKeyAlgorithm(algorithm) => &algorithm.name,
            KeyAlgorithmAndDerivatives::HmacKeyAlgorithm(algorithm) => &algorithm.name,
        }
    }
}

/// <https://w3c.github.io/webcrypto/#algorithm-normalization-normalize-an-algorithm>
fn normalize_algorithm<Op: Operation>(
    algorithm: &AlgorithmIdentifier,
) -> Fallible<Op::RegisteredAlgorithm> {
    match algorithm {
        // If alg is an instance of a DOMString:
        AlgorithmIdentifier::String(name) => {
            // Return the result of running the normalize an algorithm algorithm, with the alg set
            // to a new Algorithm dictionary whose name attribute is alg, and with the op set to
            // op.
            normalize_algorithm::<Op>(&AlgorithmIdentifier::Object(Algorithm::new(name.clone())))
        },
        // If alg is an object:
        AlgorithmIdentifier::Object(dictionary) => {
            // Step 1. Let registeredAlgorithms be the associative container stored at the op key
            // of supportedAlgorithms.
            // Step 2. Let initialAlg be the result of converting the ECMAScript object represented
            // by alg to the IDL dictionary type Algorithm, as defined by [WebIDL].
            // Step 3. If an error occurred, return the error and terminate this algorithm.
            // Step 4. Let algName be the value of the name attribute of initialAlg.
            // Step 5.
            //     If registeredAlgorithms contains a key that is a case-insensitive string match
            //     for algName:
            //         Step 5.1. Set algName to the value of the matching key.
            //         Step 5.2. Let desiredType be the IDL dictionary type stored at algName in
            //         registeredAlgorithms.
            //     Otherwise:
            //         Return a new NotSupportedError and terminate this algorithm.
            let algorithm_name = registry::resolve(dictionary.name()?, Op::OPERATION)?;

            // Step 6. Let normalizedAlgorithm be the result of converting the ECMAScript object
            // represented by alg to the IDL dictionary type desiredType, as defined by [WebIDL].
            // Step 7. Set the name attribute of normalizedAlgorithm to algName.
            // Step 8. If an error occurred, return the error and terminate this algorithm.
            // Step 9 - 10. Copy BufferSource members and normalize HashAlgorithmIdentifier
            // members for the "digest" operation.
            //
            // NOTE: Step 7 is done before the conversion of Step 6 so that every dictionary
            // conversion reads the canonical name. Step 9 and 10 are done by the `TryFrom`
            // implementations of the dictionaries.
            let mut dictionary = dictionary.clone();
            dictionary.set_name(algorithm_name.as_str());
            let normalized_algorithm =
                Op::RegisteredAlgorithm::from_dictionary(algorithm_name, &dictionary)?;

            // Step 11. Return normalizedAlgorithm.
            Ok(normalized_algorithm)
        },
    }
}

// <https://w3c.github.io/webcrypto/#dfn-supportedAlgorithms>
//
// The internal object supportedAlgorithms is split in two parts. The `registry` module holds the
// table of which algorithm names are registered for which operation, and answers the lookups of
// Step 5 of normalizing an algorithm. This module holds the desired IDL dictionary type of each
// registration.
//
// For each operation v in the list of [supported
// operations](https://w3c.github.io/webcrypto/#supported-operation), we define a struct to
// represent it, which acts a key of the internal object supportedAlgorithms.
//
// We then implement the [`Operation`] trait for these structs. When implementing the trait for
// each of these structs, we set the associated type [`RegisteredAlgorithm`] of [`Operation`] to an
// enum as the value of the operation v in supportedAlgorithms. The enum lists all algorithms
// supporting the operation v as its variants.
//
// To [define an algorithm](https://w3c.github.io/webcrypto/#concept-define-an-algorithm), each
// variant in the enum has an inner type corresponding to the desired input IDL dictionary type for
// the supported algorithm represented by the variant. Moreover, the enum also need to implement
// the [`NormalizedAlgorithm`] trait since it is used as the output of [`normalize_algorithm`].
//
// For example, we define the [`EncryptOperation`] struct to represent the "encrypt" operation, and
// implement the [`Operation`] trait for it. The associated type [`RegisteredAlgorithm`] of
// [`Operation`] is set to the [`EncryptAlgorithm`] enum, whose variants are cryptographic
// algorithms that support the "encrypt" operation. The variant [`EncryptAlgorithm::AesCtr`] has an
// inner type [`SubtleAesCtrParams`] since the desired input IDL dictionary type for "encrypt"
// operation of AES-CTR algorithm is the `AesCtrParams` dictionary.

trait Operation {
    const OPERATION: SupportedOperation;
    type RegisteredAlgorithm: NormalizedAlgorithm;
}

trait NormalizedAlgorithm: Sized {
    /// Step 6 - 10 of normalizing an algorithm.
    ///
    /// <https://w3c.github.io/webcrypto/#algorithm-normalization-normalize-an-algorithm>
    fn from_dictionary(algorithm_name: CryptoAlgorithm, dictionary: &Algorithm) -> Fallible<Self>;
    fn name(&self) -> &str;
}

fn unsupported(algorithm_name: CryptoAlgorithm, operation: SupportedOperation) -> Error {
    Error::NotSupported(Some(format!(
        "{} does not support \"{}\" operation",
        algorithm_name.as_str(),
        operation.as_str()
    )))
}

/// The value of the key "encrypt" in the internal object supportedAlgorithms
struct EncryptOperation {}

impl Operation for EncryptOperation {
    const OPERATION: SupportedOperation = SupportedOperation::Encrypt;
    type RegisteredAlgorithm = EncryptAlgorithm;
}

/// Normalized algorithm for the "encrypt" operation, used as output of
/// <https://w3c.github.io/webcrypto/#dfn-normalize-an-algorithm>
enum EncryptAlgorithm {
    RsaOaep(SubtleRsaOaepParams),
    AesCtr(SubtleAesCtrParams),
    AesCbc(SubtleAesCbcParams),
    AesGcm(SubtleAesGcmParams),
}

impl NormalizedAlgorithm for EncryptAlgorithm {
    fn from_dictionary(algorithm_name: CryptoAlgorithm, dictionary: &Algorithm) -> Fallible<Self> {
        match algorithm_name {
            CryptoAlgorithm::RsaOaep => Ok(EncryptAlgorithm::RsaOaep(dictionary.try_into()?)),
            CryptoAlgorithm::AesCtr => Ok(EncryptAlgorithm::AesCtr(dictionary.try_into()?)),
            CryptoAlgorithm::AesCbc => Ok(EncryptAlgorithm::AesCbc(dictionary.try_into()?)),
            CryptoAlgorithm::AesGcm => Ok(EncryptAlgorithm::AesGcm(dictionary.try_into()?)),
            _ => Err(unsupported(algorithm_name, SupportedOperation::Encrypt)),
        }
    }

    fn name(&self) -> &str {
        match self {
            EncryptAlgorithm::RsaOaep(algorithm) => &algorithm.name,
            EncryptAlgorithm::AesCtr(algorithm) => &algorithm.name,
            EncryptAlgorithm::AesCbc(algorithm) => &algorithm.name,
            EncryptAlgorithm::AesGcm(algorithm) => &algorithm.name,
        }
    }
}

impl EncryptAlgorithm {
    fn encrypt(&self, key: &CryptoKey, plaintext: &[u8]) -> Fallible<Vec<u8>> {
        match self {
            EncryptAlgorithm::RsaOaep(algorithm) => {
                rsa_oaep_operation::encrypt(algorithm, key, plaintext)
            },
            EncryptAlgorithm::AesCtr(algorithm) => {
                aes_ctr_operation::encrypt(algorithm, key, plaintext)
            },
            EncryptAlgorithm::AesCbc(algorithm) => {
                aes_cbc_operation::encrypt(algorithm, key, plaintext)
            },
            EncryptAlgorithm::AesGcm(algorithm) => {
                aes_gcm_operation::encrypt(algorithm, key, plaintext)
            },
        }
    }
}

/// The value of the key "decrypt" in the internal object supportedAlgorithms
struct DecryptOperation {}

impl Operation for DecryptOperation {
    const OPERATION: SupportedOperation = SupportedOperation::Decrypt;
    type RegisteredAlgorithm = DecryptAlgorithm;
}

/// Normalized algorithm for the "decrypt" operation, used as output of
/// <https://w3c.github.io/webcrypto/#dfn-normalize-an-algorithm>
enum DecryptAlgorithm {
    RsaOaep(SubtleRsaOaepParams),
    AesCtr(SubtleAesCtrParams),
    AesCbc(SubtleAesCbcParams),
    AesGcm(SubtleAesGcmParams),
}

impl NormalizedAlgorithm for DecryptAlgorithm {
    fn from_dictionary(algorithm_name: CryptoAlgorithm, dictionary: &Algorithm) -> Fallible<Self> {
        match algorithm_name {
            CryptoAlgorithm::RsaOaep => Ok(DecryptAlgorithm::RsaOaep(dictionary.try_into()?)),
            CryptoAlgorithm::AesCtr => Ok(DecryptAlgorithm::AesCtr(dictionary.try_into()?)),
            CryptoAlgorithm::AesCbc => Ok(DecryptAlgorithm::AesCbc(dictionary.try_into()?)),
            CryptoAlgorithm::AesGcm => Ok(DecryptAlgorithm::AesGcm(dictionary.try_into()?)),
            _ => Err(unsupported(algorithm_name, SupportedOperation::Decrypt)),
        }
    }

    fn name(&self) -> &str {
        match self {
            DecryptAlgorithm::RsaOaep(algorithm) => &algorithm.name,
            DecryptAlgorithm::AesCtr(algorithm) => &algorithm.name,
            DecryptAlgorithm::AesCbc(algorithm) => &algorithm.name,
            DecryptAlgorithm::AesGcm(algorithm) => &algorithm.name,
        }
    }
}

impl DecryptAlgorithm {
    fn decrypt(&self, key: &CryptoKey, ciphertext: &[u8]) -> Fallible<Vec<u8>> {
        match self {
            DecryptAlgorithm::RsaOaep(algorithm) => {
                rsa_oaep_operation::decrypt(algorithm, key, ciphertext)
            },
            DecryptAlgorithm::AesCtr(algorithm) => {
                aes_ctr_operation::decrypt(algorithm, key, ciphertext)
            },
            DecryptAlgorithm::AesCbc(algorithm) => {
                aes_cbc_operation::decrypt(algorithm, key, ciphertext)
            },
            DecryptAlgorithm::AesGcm(algorithm) => {
                aes_gcm_operation::decrypt(algorithm, key, ciphertext)
            },
        }
    }
}

/// The value of the key "sign" in the internal object supportedAlgorithms
struct SignOperation {}

impl Operation for SignOperation {
    const OPERATION: SupportedOperation = SupportedOperation::Sign;
    type RegisteredAlgorithm = SignAlgorithm;
}

/// Normalized algorithm for the "sign" operation, used as output of
/// <https://w3c.github.io/webcrypto/#dfn-normalize-an-algorithm>
enum SignAlgorithm {
    RsassaPkcs1V1_5(SubtleAlgorithm),
    RsaPss(SubtleRsaPssParams),
    Ecdsa(SubtleEcdsaParams),
    Hmac(SubtleAlgorithm),
}

impl NormalizedAlgorithm for SignAlgorithm {
    fn from_dictionary(algorithm_name: CryptoAlgorithm, dictionary: &Algorithm) -> Fallible<Self> {
        match algorithm_name {
            CryptoAlgorithm::RsassaPkcs1V1_5 => {
                Ok(SignAlgorithm::RsassaPkcs1V1_5(dictionary.try_into()?))
            },
            CryptoAlgorithm::RsaPss => Ok(SignAlgorithm::RsaPss(dictionary.try_into()?)),
            CryptoAlgorithm::Ecdsa => Ok(SignAlgorithm::Ecdsa(dictionary.try_into()?)),
            CryptoAlgorithm::Hmac => Ok(SignAlgorithm::Hmac(dictionary.try_into()?)),
            _ => Err(unsupported(algorithm_name, SupportedOperation::Sign)),
        }
    }

    fn name(&self) -> &str {
        match self {
            SignAlgorithm::RsassaPkcs1V1_5(algorithm) => &algorithm.name,
            SignAlgorithm::RsaPss(algorithm) => &algorithm.name,
            SignAlgorithm::Ecdsa(algorithm) => &algorithm.name,
            SignAlgorithm::Hmac(algorithm) => &algorithm.name,
        }
    }
}

impl SignAlgorithm {
    fn sign(&self, key: &CryptoKey, message: &[u8]) -> Fallible<Vec<u8>> {
        match self {
            SignAlgorithm::RsassaPkcs1V1_5(_algorithm) => {
                rsassa_pkcs1_v1_5_operation::sign(key, message)
            },
            SignAlgorithm::RsaPss(algorithm) => rsa_pss_operation::sign(algorithm, key, message),
            SignAlgorithm::Ecdsa(algorithm) => ecdsa_operation::sign(algorithm, key, message),
            SignAlgorithm::Hmac(_algorithm) => hmac_operation::sign(key, message),
        }
    }
}

/// The value of the key "verify" in the internal object supportedAlgorithms
struct VerifyOperation {}

impl Operation for VerifyOperation {
    const OPERATION: SupportedOperation = SupportedOperation::Verify;
    type RegisteredAlgorithm = VerifyAlgorithm;
}

/// Normalized algorithm for the "verify" operation, used as output of
/// <https://w3c.github.io/webcrypto/#dfn-normalize-an-algorithm>
enum VerifyAlgorithm {
    RsassaPkcs1V1_5(SubtleAlgorithm),
    RsaPss(SubtleRsaPssParams),
    Ecdsa(SubtleEcdsaParams),
    Hmac(SubtleAlgorithm),
}

impl NormalizedAlgorithm for VerifyAlgorithm {
    fn from_dictionary(algorithm_name: CryptoAlgorithm, dictionary: &Algorithm) -> Fallible<Self> {
        match algorithm_name {
            CryptoAlgorithm::RsassaPkcs1V1_5 => {
                Ok(VerifyAlgorithm::RsassaPkcs1V1_5(dictionary.try_into()?))
            },
            CryptoAlgorithm::RsaPss => Ok(VerifyAlgorithm::RsaPss(dictionary.try_into()?)),
            CryptoAlgorithm::Ecdsa => Ok(VerifyAlgorithm::Ecdsa(dictionary.try_into()?)),
            CryptoAlgorithm::Hmac => Ok(VerifyAlgorithm::Hmac(dictionary.try_into()?)),
            _ => Err(unsupported(algorithm_name, SupportedOperation::Verify)),
        }
    }

    fn name(&self) -> &str {
        match self {
            VerifyAlgorithm::RsassaPkcs1V1_5(algorithm) => &algorithm.name,
            VerifyAlgorithm::RsaPss(algorithm) => &algorithm.name,
            VerifyAlgorithm::Ecdsa(algorithm) => &algorithm.name,
            VerifyAlgorithm::Hmac(algorithm) => &algorithm.name,
        }
    }
}

impl VerifyAlgorithm {
    fn verify(&self, key: &CryptoKey, message: &[u8], signature: &[u8]) -> Fallible<bool> {
        match self {
            VerifyAlgorithm::RsassaPkcs1V1_5(_algorithm) => {
                rsassa_pkcs1_v1_5_operation::verify(key, message, signature)
            },
            VerifyAlgorithm::RsaPss(algorithm) => {
                rsa_pss_operation::verify(algorithm, key, message, signature)
            },
            VerifyAlgorithm::Ecdsa(algorithm) => {
                ecdsa_operation::verify(algorithm, key, message, signature)
            },
            VerifyAlgorithm::Hmac(_algorithm) => hmac_operation::verify(key, message, signature),
        }
    }
}

/// The value of the key "digest" in the internal object supportedAlgorithms
struct DigestOperation {}

impl Operation for DigestOperation {
    const OPERATION: SupportedOperation = SupportedOperation::Digest;
    type RegisteredAlgorithm = DigestAlgorithm;
}

/// Normalized algorithm for the "digest" operation, used as output of
/// <https://w3c.github.io/webcrypto/#dfn-normalize-an-algorithm>
#[derive(Clone, Debug)]
pub(crate) enum DigestAlgorithm {
    Sha(SubtleAlgorithm),
}

impl NormalizedAlgorithm for DigestAlgorithm {
    fn from_dictionary(algorithm_name: CryptoAlgorithm, dictionary: &Algorithm) -> Fallible<Self> {
        match algorithm_name {
            CryptoAlgorithm::Sha1 |
            CryptoAlgorithm::Sha256 |
            CryptoAlgorithm::Sha384 |
            CryptoAlgorithm::Sha512 => Ok(DigestAlgorithm::Sha(dictionary.try_into()?)),
            _ => Err(unsupported(algorithm_name, SupportedOperation::Digest)),
        }
    }

    fn name(&self) -> &str {
        match self {
            DigestAlgorithm::Sha(algorithm) => &algorithm.name,
        }
    }
}

impl DigestAlgorithm {
    fn digest(&self, message: &[u8]) -> Fallible<Vec<u8>> {
        match self {
            DigestAlgorithm::Sha(algorithm) => sha_operation::digest(algorithm, message),
        }
    }

    fn hash_function(&self) -> Fallible<HashFunction> {
        HashFunction::from_name(self.name())
    }

    /// The `KeyAlgorithm` dictionary recorded as the hash of a key.
    fn key_algorithm(&self) -> SubtleKeyAlgorithm {
        SubtleKeyAlgorithm {
            name: self.name().to_owned(),
        }
    }
}

/// The value of the key "deriveBits" in the internal object supportedAlgorithms
struct DeriveBitsOperation {}

impl Operation for DeriveBitsOperation {
    const OPERATION: SupportedOperation = SupportedOperation::DeriveBits;
    type RegisteredAlgorithm = DeriveBitsAlgorithm;
}

/// Normalized algorithm for the "deriveBits" operation, used as output of
/// <https://w3c.github.io/webcrypto/#dfn-normalize-an-algorithm>
enum DeriveBitsAlgorithm {
    Ecdh(SubtleEcdhKeyDeriveParams),
    Hkdf(SubtleHkdfParams),
    Pbkdf2(SubtlePbkdf2Params),
}

impl NormalizedAlgorithm for DeriveBitsAlgorithm {
    fn from_dictionary(algorithm_name: CryptoAlgorithm, dictionary: &Algorithm) -> Fallible<Self> {
        match algorithm_name {
            CryptoAlgorithm::Ecdh => Ok(DeriveBitsAlgorithm::Ecdh(dictionary.try_into()?)),
            CryptoAlgorithm::Hkdf => Ok(DeriveBitsAlgorithm::Hkdf(dictionary.try_into()?)),
            CryptoAlgorithm::Pbkdf2 => Ok(DeriveBitsAlgorithm::Pbkdf2(dictionary.try_into()?)),
            _ => Err(unsupported(algorithm_name, SupportedOperation::DeriveBits)),
        }
    }

    fn name(&self) -> &str {
        match self {
            DeriveBitsAlgorithm::Ecdh(algorithm) => &algorithm.name,
            DeriveBitsAlgorithm::Hkdf(algorithm) => &algorithm.name,
            DeriveBitsAlgorithm::Pbkdf2(algorithm) => &algorithm.name,
        }
    }
}

impl DeriveBitsAlgorithm {
    fn derive_bits(&self, key: &CryptoKey, length: Option<u32>) -> Fallible<Vec<u8>> {
        match self {
            DeriveBitsAlgorithm::Ecdh(algorithm) => {
                ecdh_operation::derive_bits(algorithm, key, length)
            },
            DeriveBitsAlgorithm::Hkdf(algorithm) => {
                hkdf_operation::derive_bits(algorithm, key, length)
            },
            DeriveBitsAlgorithm::Pbkdf2(algorithm) => {
                pbkdf2_operation::derive_bits(algorithm, key, length)
            },
        }
    }
}

/// The value of the key "wrapKey" in the internal object supportedAlgorithms
struct WrapKeyOperation {}

impl Operation for WrapKeyOperation {
    const OPERATION: SupportedOperation = SupportedOperation::WrapKey;
    type RegisteredAlgorithm = WrapKeyAlgorithm;
}

/// Normalized algorithm for the "wrapKey" operation, used as output of
/// <https://w3c.github.io/webcrypto/#dfn-normalize-an-algorithm>
enum WrapKeyAlgorithm {
    AesKw(SubtleAlgorithm),
}

impl NormalizedAlgorithm for WrapKeyAlgorithm {
    fn from_dictionary(algorithm_name: CryptoAlgorithm, dictionary: &Algorithm) -> Fallible<Self> {
        match algorithm_name {
            CryptoAlgorithm::AesKw => Ok(WrapKeyAlgorithm::AesKw(dictionary.try_into()?)),
            _ => Err(unsupported(algorithm_name, SupportedOperation::WrapKey)),
        }
    }

    fn name(&self) -> &str {
        match self {
            WrapKeyAlgorithm::AesKw(algorithm) => &algorithm.name,
        }
    }
}

impl WrapKeyAlgorithm {
    fn wrap_key(&self, key: &CryptoKey, plaintext: &[u8]) -> Fallible<Vec<u8>> {
        match self {
            WrapKeyAlgorithm::AesKw(_algorithm) => aes_kw_operation::wrap_key(key, plaintext),
        }
    }
}

/// The value of the key "unwrapKey" in the internal object supportedAlgorithms
struct UnwrapKeyOperation {}

impl Operation for UnwrapKeyOperation {
    const OPERATION: SupportedOperation = SupportedOperation::UnwrapKey;
    type RegisteredAlgorithm = UnwrapKeyAlgorithm;
}

/// Normalized algorithm for the "unwrapKey" operation, used as output of
/// <https://w3c.github.io/webcrypto/#dfn-normalize-an-algorithm>
enum UnwrapKeyAlgorithm {
    AesKw(SubtleAlgorithm),
}

impl NormalizedAlgorithm for UnwrapKeyAlgorithm {
    fn from_dictionary(algorithm_name: CryptoAlgorithm, dictionary: &Algorithm) -> Fallible<Self> {
        match algorithm_name {
            CryptoAlgorithm::AesKw => Ok(UnwrapKeyAlgorithm::AesKw(dictionary.try_into()?)),
            _ => Err(unsupported(algorithm_name, SupportedOperation::UnwrapKey)),
        }
    }

    fn name(&self) -> &str {
        match self {
            UnwrapKeyAlgorithm::AesKw(algorithm) => &algorithm.name,
        }
    }
}

impl UnwrapKeyAlgorithm {
    fn unwrap_key(&self, key: &CryptoKey, ciphertext: &[u8]) -> Fallible<Vec<u8>> {
        match self {
            UnwrapKeyAlgorithm::AesKw(_algorithm) => aes_kw_operation::unwrap_key(key, ciphertext),
        }
    }
}

/// The value of the key "generateKey" in the internal object supportedAlgorithms
struct GenerateKeyOperation {}

impl Operation for GenerateKeyOperation {
    const OPERATION: SupportedOperation = SupportedOperation::GenerateKey;
    type RegisteredAlgorithm = GenerateKeyAlgorithm;
}

/// Normalized algorithm for the "generateKey" operation, used as output of
/// <https://w3c.github.io/webcrypto/#dfn-normalize-an-algorithm>
enum GenerateKeyAlgorithm {
    RsassaPkcs1V1_5(SubtleRsaHashedKeyGenParams),
    RsaPss(SubtleRsaHashedKeyGenParams),
    RsaOaep(SubtleRsaHashedKeyGenParams),
    Ecdsa(SubtleEcKeyGenParams),
    Ecdh(SubtleEcKeyGenParams),
    AesCtr(SubtleAesKeyGenParams),
    AesCbc(SubtleAesKeyGenParams),
    AesGcm(SubtleAesKeyGenParams),
    AesKw(SubtleAesKeyGenParams),
    Hmac(SubtleHmacKeyGenParams),
}

impl NormalizedAlgorithm for GenerateKeyAlgorithm {
    fn from_dictionary(algorithm_name: CryptoAlgorithm, dictionary: &Algorithm) -> Fallible<Self> {
        match algorithm_name {
            CryptoAlgorithm::RsassaPkcs1V1_5 => {
                Ok(GenerateKeyAlgorithm::RsassaPkcs1V1_5(dictionary.try_into()?))
            },
            CryptoAlgorithm::RsaPss => Ok(GenerateKeyAlgorithm::RsaPss(dictionary.try_into()?)),
            CryptoAlgorithm::RsaOaep => Ok(GenerateKeyAlgorithm::RsaOaep(dictionary.try_into()?)),
            CryptoAlgorithm::Ecdsa => Ok(GenerateKeyAlgorithm::Ecdsa(dictionary.try_into()?)),
            CryptoAlgorithm::Ecdh => Ok(GenerateKeyAlgorithm::Ecdh(dictionary.try_into()?)),
            CryptoAlgorithm::AesCtr => Ok(GenerateKeyAlgorithm::AesCtr(dictionary.try_into()?)),
            CryptoAlgorithm::AesCbc => Ok(GenerateKeyAlgorithm::AesCbc(dictionary.try_into()?)),
            CryptoAlgorithm::AesGcm => Ok(GenerateKeyAlgorithm::AesGcm(dictionary.try_into()?)),
            CryptoAlgorithm::AesKw => Ok(GenerateKeyAlgorithm::AesKw(dictionary.try_into()?)),
            CryptoAlgorithm::Hmac => Ok(GenerateKeyAlgorithm::Hmac(dictionary.try_into()?)),
            _ => Err(unsupported(algorithm_name, SupportedOperation::GenerateKey)),
        }
    }

    fn name(&self) -> &str {
        match self {
            GenerateKeyAlgorithm::RsassaPkcs1V1_5(algorithm) => &algorithm.name,
            GenerateKeyAlgorithm::RsaPss(algorithm) => &algorithm.name,
            GenerateKeyAlgorithm::RsaOaep(algorithm) => &algorithm.name,
            GenerateKeyAlgorithm::Ecdsa(algorithm) => &algorithm.name,
            GenerateKeyAlgorithm::Ecdh(algorithm) => &algorithm.name,
            GenerateKeyAlgorithm::AesCtr(algorithm) => &algorithm.name,
            GenerateKeyAlgorithm::AesCbc(algorithm) => &algorithm.name,
            GenerateKeyAlgorithm::AesGcm(algorithm) => &algorithm.name,
            GenerateKeyAlgorithm::AesKw(algorithm) => &algorithm.name,
            GenerateKeyAlgorithm::Hmac(algorithm) => &algorithm.name,
        }
    }
}

impl GenerateKeyAlgorithm {
    fn generate_key(
        &self,
        extractable: bool,
        usages: Vec<KeyUsage>,
        prefs: &Preferences,
    ) -> Fallible<CryptoKeyOrCryptoKeyPair> {
        match self {
            GenerateKeyAlgorithm::RsassaPkcs1V1_5(algorithm) => {
                rsassa_pkcs1_v1_5_operation::generate_key(algorithm, extractable, usages)
                    .map(CryptoKeyOrCryptoKeyPair::CryptoKeyPair)
            },
            GenerateKeyAlgorithm::RsaPss(algorithm) => {
                rsa_pss_operation::generate_key(algorithm, extractable, usages)
                    .map(CryptoKeyOrCryptoKeyPair::CryptoKeyPair)
            },
            GenerateKeyAlgorithm::RsaOaep(algorithm) => {
                rsa_oaep_operation::generate_key(algorithm, extractable, usages)
                    .map(CryptoKeyOrCryptoKeyPair::CryptoKeyPair)
            },
            GenerateKeyAlgorithm::Ecdsa(algorithm) => {
                ecdsa_operation::generate_key(algorithm, extractable, usages)
                    .map(CryptoKeyOrCryptoKeyPair::CryptoKeyPair)
            },
            GenerateKeyAlgorithm::Ecdh(algorithm) => ecdh_operation::generate_key(
                algorithm,
                extractable,
                usages,
                prefs.dom_crypto_subtle_k256_enabled,
            )
            .map(CryptoKeyOrCryptoKeyPair::CryptoKeyPair),
            GenerateKeyAlgorithm::AesCtr(algorithm) => {
                aes_ctr_operation::generate_key(algorithm, extractable, usages)
                    .map(CryptoKeyOrCryptoKeyPair::CryptoKey)
            },
            GenerateKeyAlgorithm::AesCbc(algorithm) => {
                aes_cbc_operation::generate_key(algorithm, extractable, usages)
                    .map(CryptoKeyOrCryptoKeyPair::CryptoKey)
            },
            GenerateKeyAlgorithm::AesGcm(algorithm) => {
                aes_gcm_operation::generate_key(algorithm, extractable, usages)
                    .map(CryptoKeyOrCryptoKeyPair::CryptoKey)
            },
            GenerateKeyAlgorithm::AesKw(algorithm) => {
                aes_kw_operation::generate_key(algorithm, extractable, usages)
                    .map(CryptoKeyOrCryptoKeyPair::CryptoKey)
            },
            GenerateKeyAlgorithm::Hmac(algorithm) => {
                hmac_operation::generate_key(algorithm, extractable, usages)
                    .map(CryptoKeyOrCryptoKeyPair::CryptoKey)
            },
        }
    }
}

/// The value of the key "importKey" in the internal object supportedAlgorithms
struct ImportKeyOperation {}

impl Operation for ImportKeyOperation {
    const OPERATION: SupportedOperation = SupportedOperation::ImportKey;
    type RegisteredAlgorithm = ImportKeyAlgorithm;
}

/// Normalized algorithm for the "importKey" operation, used as output of
/// <https://w3c.github.io/webcrypto/#dfn-normalize-an-algorithm>
enum ImportKeyAlgorithm {
    RsassaPkcs1V1_5(SubtleRsaHashedImportParams),
    RsaPss(SubtleRsaHashedImportParams),
    RsaOaep(SubtleRsaHashedImportParams),
    Ecdsa(SubtleEcKeyImportParams),
    Ecdh(SubtleEcKeyImportParams),
    AesCtr(SubtleAlgorithm),
    AesCbc(SubtleAlgorithm),
    AesGcm(SubtleAlgorithm),
    AesKw(SubtleAlgorithm),
    Hmac(SubtleHmacImportParams),
    Hkdf(SubtleAlgorithm),
    Pbkdf2(SubtleAlgorithm),
}

impl NormalizedAlgorithm for ImportKeyAlgorithm {
    fn from_dictionary(algorithm_name: CryptoAlgorithm, dictionary: &Algorithm) -> Fallible<Self> {
        match algorithm_name {
            CryptoAlgorithm::RsassaPkcs1V1_5 => {
                Ok(ImportKeyAlgorithm::RsassaPkcs1V1_5(dictionary.try_into()?))
            },
            CryptoAlgorithm::RsaPss => Ok(ImportKeyAlgorithm::RsaPss(dictionary.try_into()?)),
            CryptoAlgorithm::RsaOaep => Ok(ImportKeyAlgorithm::RsaOaep(dictionary.try_into()?)),
            CryptoAlgorithm::Ecdsa => Ok(ImportKeyAlgorithm::Ecdsa(dictionary.try_into()?)),
            CryptoAlgorithm::Ecdh => Ok(ImportKeyAlgorithm::Ecdh(dictionary.try_into()?)),
            CryptoAlgorithm::AesCtr => Ok(ImportKeyAlgorithm::AesCtr(dictionary.try_into()?)),
            CryptoAlgorithm::AesCbc => Ok(ImportKeyAlgorithm::AesCbc(dictionary.try_into()?)),
            CryptoAlgorithm::AesGcm => Ok(ImportKeyAlgorithm::AesGcm(dictionary.try_into()?)),
            CryptoAlgorithm::AesKw => Ok(ImportKeyAlgorithm::AesKw(dictionary.try_into()?)),
            CryptoAlgorithm::Hmac => Ok(ImportKeyAlgorithm::Hmac(dictionary.try_into()?)),
            CryptoAlgorithm::Hkdf => Ok(ImportKeyAlgorithm::Hkdf(dictionary.try_into()?)),
            CryptoAlgorithm::Pbkdf2 => Ok(ImportKeyAlgorithm::Pbkdf2(dictionary.try_into()?)),
            _ => Err(unsupported(algorithm_name, SupportedOperation::ImportKey)),
        }
    }

    fn name(&self) -> &str {
        match self {
            ImportKeyAlgorithm::RsassaPkcs1V1_5(algorithm) => &algorithm.name,
            ImportKeyAlgorithm::RsaPss(algorithm) => &algorithm.name,
            ImportKeyAlgorithm::RsaOaep(algorithm) => &algorithm.name,
            ImportKeyAlgorithm::Ecdsa(algorithm) => &algorithm.name,
            ImportKeyAlgorithm::Ecdh(algorithm) => &algorithm.name,
            ImportKeyAlgorithm::AesCtr(algorithm) => &algorithm.name,
            ImportKeyAlgorithm::AesCbc(algorithm) => &algorithm.name,
            ImportKeyAlgorithm::AesGcm(algorithm) => &algorithm.name,
            ImportKeyAlgorithm::AesKw(algorithm) => &algorithm.name,
            ImportKeyAlgorithm::Hmac(algorithm) => &algorithm.name,
            ImportKeyAlgorithm::Hkdf(algorithm) => &algorithm.name,
            ImportKeyAlgorithm::Pbkdf2(algorithm) => &algorithm.name,
        }
    }
}

impl ImportKeyAlgorithm {
    fn import_key(
        &self,
        format: KeyFormat,
        key_data: &[u8],
        extractable: bool,
        usages: Vec<KeyUsage>,
        prefs: &Preferences,
    ) -> Fallible<Arc<CryptoKey>> {
        match self {
            ImportKeyAlgorithm::RsassaPkcs1V1_5(algorithm) => {
                rsassa_pkcs1_v1_5_operation::import_key(
                    algorithm,
                    format,
                    key_data,
                    extractable,
                    usages,
                )
            },
            ImportKeyAlgorithm::RsaPss(algorithm) => {
                rsa_pss_operation::import_key(algorithm, format, key_data, extractable, usages)
            },
            ImportKeyAlgorithm::RsaOaep(algorithm) => {
                rsa_oaep_operation::import_key(algorithm, format, key_data, extractable, usages)
            },
            ImportKeyAlgorithm::Ecdsa(algorithm) => {
                ecdsa_operation::import_key(algorithm, format, key_data, extractable, usages)
            },
            ImportKeyAlgorithm::Ecdh(algorithm) => ecdh_operation::import_key(
                algorithm,
                format,
                key_data,
                extractable,
                usages,
                prefs.dom_crypto_subtle_k256_enabled,
            ),
            ImportKeyAlgorithm::AesCtr(_algorithm) => {
                aes_ctr_operation::import_key(format, key_data, extractable, usages)
            },
            ImportKeyAlgorithm::AesCbc(_algorithm) => {
                aes_cbc_operation::import_key(format, key_data, extractable, usages)
            },
            ImportKeyAlgorithm::AesGcm(_algorithm) => {
                aes_gcm_operation::import_key(format, key_data, extractable, usages)
            },
            ImportKeyAlgorithm::AesKw(_algorithm) => {
                aes_kw_operation::import_key(format, key_data, extractable, usages)
            },
            ImportKeyAlgorithm::Hmac(algorithm) => {
                hmac_operation::import_key(algorithm, format, key_data, extractable, usages)
            },
            ImportKeyAlgorithm::Hkdf(_algorithm) => {
                hkdf_operation::import_key(format, key_data, extractable, usages)
            },
            ImportKeyAlgorithm::Pbkdf2(_algorithm) => {
                pbkdf2_operation::import_key(format, key_data, extractable, usages)
            },
        }
    }
}

/// The value of the key "exportKey" in the internal object supportedAlgorithms
struct ExportKeyOperation {}

impl Operation for ExportKeyOperation {
    const OPERATION: SupportedOperation = SupportedOperation::ExportKey;
    type RegisteredAlgorithm = ExportKeyAlgorithm;
}

/// Normalized algorithm for the "exportKey" operation, used as output of
/// <https://w3c.github.io/webcrypto/#dfn-normalize-an-algorithm>
enum ExportKeyAlgorithm {
    RsassaPkcs1V1_5(SubtleAlgorithm),
    RsaPss(SubtleAlgorithm),
    RsaOaep(SubtleAlgorithm),
    Ecdsa(SubtleAlgorithm),
    Ecdh(SubtleAlgorithm),
    AesCtr(SubtleAlgorithm),
    AesCbc(SubtleAlgorithm),
    AesGcm(SubtleAlgorithm),
    AesKw(SubtleAlgorithm),
    Hmac(SubtleAlgorithm),
}

impl NormalizedAlgorithm for ExportKeyAlgorithm {
    fn from_dictionary(algorithm_name: CryptoAlgorithm, dictionary: &Algorithm) -> Fallible<Self> {
        match algorithm_name {
            CryptoAlgorithm::RsassaPkcs1V1_5 => {
                Ok(ExportKeyAlgorithm::RsassaPkcs1V1_5(dictionary.try_into()?))
            },
            CryptoAlgorithm::RsaPss => Ok(ExportKeyAlgorithm::RsaPss(dictionary.try_into()?)),
            CryptoAlgorithm::RsaOaep => Ok(ExportKeyAlgorithm::RsaOaep(dictionary.try_into()?)),
            CryptoAlgorithm::Ecdsa => Ok(ExportKeyAlgorithm::Ecdsa(dictionary.try_into()?)),
            CryptoAlgorithm::Ecdh => Ok(ExportKeyAlgorithm::Ecdh(dictionary.try_into()?)),
            CryptoAlgorithm::AesCtr => Ok(ExportKeyAlgorithm::AesCtr(dictionary.try_into()?)),
            CryptoAlgorithm::AesCbc => Ok(ExportKeyAlgorithm::AesCbc(dictionary.try_into()?)),
            CryptoAlgorithm::AesGcm => Ok(ExportKeyAlgorithm::AesGcm(dictionary.try_into()?)),
            CryptoAlgorithm::AesKw => Ok(ExportKeyAlgorithm::AesKw(dictionary.try_into()?)),
            CryptoAlgorithm::Hmac => Ok(ExportKeyAlgorithm::Hmac(dictionary.try_into()?)),
            _ => Err(unsupported(algorithm_name, SupportedOperation::ExportKey)),
        }
    }

    fn name(&self) -> &str {
        match self {
            ExportKeyAlgorithm::RsassaPkcs1V1_5(algorithm) => &algorithm.name,
            ExportKeyAlgorithm::RsaPss(algorithm) => &algorithm.name,
            ExportKeyAlgorithm::RsaOaep(algorithm) => &algorithm.name,
            ExportKeyAlgorithm::Ecdsa(algorithm) => &algorithm.name,
            ExportKeyAlgorithm::Ecdh(algorithm) => &algorithm.name,
            ExportKeyAlgorithm::AesCtr(algorithm) => &algorithm.name,
            ExportKeyAlgorithm::AesCbc(algorithm) => &algorithm.name,
            ExportKeyAlgorithm::AesGcm(algorithm) => &algorithm.name,
            ExportKeyAlgorithm::AesKw(algorithm) => &algorithm.name,
            ExportKeyAlgorithm::Hmac(algorithm) => &algorithm.name,
        }
    }
}

impl ExportKeyAlgorithm {
    fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> Fallible<ExportedKey> {
        match self {
            ExportKeyAlgorithm::RsassaPkcs1V1_5(_algorithm) => {
                rsassa_pkcs1_v1_5_operation::export_key(format, key)
            },
            ExportKeyAlgorithm::RsaPss(_algorithm) => rsa_pss_operation::export_key(format, key),
            ExportKeyAlgorithm::RsaOaep(_algorithm) => rsa_oaep_operation::export_key(format, key),
            ExportKeyAlgorithm::Ecdsa(_algorithm) => ecdsa_operation::export_key(format, key),
            ExportKeyAlgorithm::Ecdh(_algorithm) => ecdh_operation::export_key(format, key),
            ExportKeyAlgorithm::AesCtr(_algorithm) => aes_ctr_operation::export_key(format, key),
            ExportKeyAlgorithm::AesCbc(_algorithm) => aes_cbc_operation::export_key(format, key),
            ExportKeyAlgorithm::AesGcm(_algorithm) => aes_gcm_operation::export_key(format, key),
            ExportKeyAlgorithm::AesKw(_algorithm) => aes_kw_operation::export_key(format, key),
            ExportKeyAlgorithm::Hmac(_algorithm) => hmac_operation::export_key(format, key),
        }
    }
}

/// The value of the key "get key length" in the internal object supportedAlgorithms
struct GetKeyLengthOperation {}

impl Operation for GetKeyLengthOperation {
    const OPERATION: SupportedOperation = SupportedOperation::GetKeyLength;
    type RegisteredAlgorithm = GetKeyLengthAlgorithm;
}

/// Normalized algorithm for the "get key length" operation, used as output of
/// <https://w3c.github.io/webcrypto/#dfn-normalize-an-algorithm>
enum GetKeyLengthAlgorithm {
    AesCtr(SubtleAesDerivedKeyParams),
    AesCbc(SubtleAesDerivedKeyParams),
    AesGcm(SubtleAesDerivedKeyParams),
    AesKw(SubtleAesDerivedKeyParams),
    Hmac(SubtleHmacImportParams),
    Hkdf(SubtleAlgorithm),
    Pbkdf2(SubtleAlgorithm),
}

impl NormalizedAlgorithm for GetKeyLengthAlgorithm {
    fn from_dictionary(algorithm_name: CryptoAlgorithm, dictionary: &Algorithm) -> Fallible<Self> {
        match algorithm_name {
            CryptoAlgorithm::AesCtr => Ok(GetKeyLengthAlgorithm::AesCtr(dictionary.try_into()?)),
            CryptoAlgorithm::AesCbc => Ok(GetKeyLengthAlgorithm::AesCbc(dictionary.try_into()?)),
            CryptoAlgorithm::AesGcm => Ok(GetKeyLengthAlgorithm::AesGcm(dictionary.try_into()?)),
            CryptoAlgorithm::AesKw => Ok(GetKeyLengthAlgorithm::AesKw(dictionary.try_into()?)),
            CryptoAlgorithm::Hmac => Ok(GetKeyLengthAlgorithm::Hmac(dictionary.try_into()?)),
            CryptoAlgorithm::Hkdf => Ok(GetKeyLengthAlgorithm::Hkdf(dictionary.try_into()?)),
            CryptoAlgorithm::Pbkdf2 => Ok(GetKeyLengthAlgorithm::Pbkdf2(dictionary.try_into()?)),
            _ => Err(unsupported(algorithm_name, SupportedOperation::GetKeyLength)),
        }
    }

    fn name(&self) -> &str {
        match self {
            GetKeyLengthAlgorithm::AesCtr(algorithm) => &algorithm.name,
            GetKeyLengthAlgorithm::AesCbc(algorithm) => &algorithm.name,
            GetKeyLengthAlgorithm::AesGcm(algorithm) => &algorithm.name,
            GetKeyLengthAlgorithm::AesKw(algorithm) => &algorithm.name,
            GetKeyLengthAlgorithm::Hmac(algorithm) => &algorithm.name,
            GetKeyLengthAlgorithm::Hkdf(algorithm) => &algorithm.name,
            GetKeyLengthAlgorithm::Pbkdf2(algorithm) => &algorithm.name,
        }
    }
}

impl GetKeyLengthAlgorithm {
    fn get_key_length(&self) -> Fallible<Option<u32>> {
        match self {
            GetKeyLengthAlgorithm::AesCtr(algorithm) => {
                aes_ctr_operation::get_key_length(algorithm)
            },
            GetKeyLengthAlgorithm::AesCbc(algorithm) => {
                aes_cbc_operation::get_key_length(algorithm)
            },
            GetKeyLengthAlgorithm::AesGcm(algorithm) => {
                aes_gcm_operation::get_key_length(algorithm)
            },
            GetKeyLengthAlgorithm::AesKw(algorithm) => aes_kw_operation::get_key_length(algorithm),
            GetKeyLengthAlgorithm::Hmac(algorithm) => hmac_operation::get_key_length(algorithm),
            GetKeyLengthAlgorithm::Hkdf(_algorithm) => hkdf_operation::get_key_length(),
            GetKeyLengthAlgorithm::Pbkdf2(_algorithm) => pbkdf2_operation::get_key_length(),
        }
    }
}

/// The algorithm `wrapKey` runs: the dedicated "wrapKey" operation when the algorithm registers
/// one, its "encrypt" operation otherwise.
enum WrapKeyAlgorithmOrEncryptAlgorithm {
    WrapKeyAlgorithm(WrapKeyAlgorithm),
    EncryptAlgorithm(EncryptAlgorithm),
}

impl WrapKeyAlgorithmOrEncryptAlgorithm {
    fn name(&self) -> &str {
        match self {
            Self::WrapKeyAlgorithm(algorithm) => algorithm.name(),
            Self::EncryptAlgorithm(algorithm) => algorithm.name(),
        }
    }
}

/// The algorithm `unwrapKey` runs: the dedicated "unwrapKey" operation when the algorithm
/// registers one, its "decrypt" operation otherwise.
enum UnwrapKeyAlgorithmOrDecryptAlgorithm {
    UnwrapKeyAlgorithm(UnwrapKeyAlgorithm),
    DecryptAlgorithm(DecryptAlgorithm),
}

impl UnwrapKeyAlgorithmOrDecryptAlgorithm {
    fn name(&self) -> &str {
        match self {
            Self::UnwrapKeyAlgorithm(algorithm) => algorithm.name(),
            Self::DecryptAlgorithm(algorithm) => algorithm.name(),
        }
    }
}

/// Whether the algorithm named by `algorithm` registers `operation`. Unrecognized or unnamed
/// algorithms register nothing.
fn algorithm_supports(algorithm: &AlgorithmIdentifier, operation: SupportedOperation) -> bool {
    algorithm
        .name()
        .and_then(|name| CryptoAlgorithm::from_str_ignore_case(name).ok())
        .is_some_and(|algorithm| registry::supports(algorithm, operation))
}

/// Secret and private keys must be usable for something.
fn check_usages_of_result(result: &CryptoKeyOrCryptoKeyPair) -> Fallible<()> {
    let key = match result {
        CryptoKeyOrCryptoKeyPair::CryptoKey(key) => key,
        CryptoKeyOrCryptoKeyPair::CryptoKeyPair(key_pair) => &key_pair.private_key,
    };
    if matches!(key.key_type(), KeyType::Secret | KeyType::Private) && key.usages().is_empty() {
        return Err(Error::Syntax(Some(
            "The usages of a secret or private key must not be empty".to_string(),
        )));
    }
    Ok(())
}

/// Run the steps of an operation, logging the error it is rejected with.
fn settle<T>(
    operation: &str,
    algorithm: &AlgorithmIdentifier,
    steps: impl FnOnce() -> Fallible<T>,
) -> Fallible<T> {
    steps().inspect_err(|error| {
        debug!(
            "{operation} with {} rejected: {error}",
            algorithm.name().unwrap_or("unnamed algorithm")
        )
    })
}

/// <https://w3c.github.io/webcrypto/#subtlecrypto-interface>
#[derive(Debug)]
pub struct SubtleCrypto {
    prefs: Preferences,
}

impl SubtleCrypto {
    pub(crate) fn new(prefs: Preferences) -> SubtleCrypto {
        SubtleCrypto { prefs }
    }

    /// <https://w3c.github.io/webcrypto/#SubtleCrypto-method-encrypt>
    pub async fn encrypt(
        &self,
        algorithm: impl Into<AlgorithmIdentifier>,
        key: &CryptoKey,
        data: &[u8],
    ) -> Fallible<Vec<u8>> {
        let algorithm = algorithm.into();
        settle("encrypt", &algorithm, || {
            // Step 2. Let data be the result of getting a copy of the bytes held by the data
            // parameter passed to the encrypt() method.
            // Step 3. Let normalizedAlgorithm be the result of normalizing an algorithm, with alg
            // set to algorithm and op set to "encrypt".
            // Step 4. If an error occurred, return a Promise rejected with normalizedAlgorithm.
            let normalized_algorithm = normalize_algorithm::<EncryptOperation>(&algorithm)?;

            // Step 9. If the name member of normalizedAlgorithm is not equal to the name
            // attribute of the [[algorithm]] internal slot of key then throw an
            // InvalidAccessError.
            if normalized_algorithm.name() != key.algorithm().name() {
                return Err(Error::InvalidAccess(None));
            }

            // Step 10. If the [[usages]] internal slot of key does not contain an entry that is
            // "encrypt", then throw an InvalidAccessError.
            if !key.usages().contains(&KeyUsage::Encrypt) {
                return Err(Error::InvalidAccess(None));
            }

            // Step 11. Let ciphertext be the result of performing the encrypt operation specified
            // by normalizedAlgorithm using algorithm and key and with data as plaintext.
            normalized_algorithm.encrypt(key, data)
        })
    }

    /// <https://w3c.github.io/webcrypto/#SubtleCrypto-method-decrypt>
    pub async fn decrypt(
        &self,
        algorithm: impl Into<AlgorithmIdentifier>,
        key: &CryptoKey,
        data: &[u8],
    ) -> Fallible<Vec<u8>> {
        let algorithm = algorithm.into();
        settle("decrypt", &algorithm, || {
            // Step 3. Let normalizedAlgorithm be the result of normalizing an algorithm, with alg
            // set to algorithm and op set to "decrypt".
            let normalized_algorithm = normalize_algorithm::<DecryptOperation>(&algorithm)?;

            // Step 9. If the name member of normalizedAlgorithm is not equal to the name
            // attribute of the [[algorithm]] internal slot of key then throw an
            // InvalidAccessError.
            if normalized_algorithm.name() != key.algorithm().name() {
                return Err(Error::InvalidAccess(None));
            }

            // Step 10. If the [[usages]] internal slot of key does not contain an entry that is
            // "decrypt", then throw an InvalidAccessError.
            if !key.usages().contains(&KeyUsage::Decrypt) {
                return Err(Error::InvalidAccess(None));
            }

            // Step 11. Let plaintext be the result of performing the decrypt operation specified
            // by normalizedAlgorithm using key and algorithm and with data as ciphertext.
            normalized_algorithm.decrypt(key, data)
        })
    }

    /// <https://w3c.github.io/webcrypto/#SubtleCrypto-method-sign>
    pub async fn sign(
        &self,
        algorithm: impl Into<AlgorithmIdentifier>,
        key: &CryptoKey,
        data: &[u8],
    ) -> Fallible<Vec<u8>> {
        let algorithm = algorithm.into();
        settle("sign", &algorithm, || {
            // Step 3. Let normalizedAlgorithm be the result of normalizing an algorithm, with alg
            // set to algorithm and op set to "sign".
            let normalized_algorithm = normalize_algorithm::<SignOperation>(&algorithm)?;

            // Step 9. If the name member of normalizedAlgorithm is not equal to the name
            // attribute of the [[algorithm]] internal slot of key then throw an
            // InvalidAccessError.
            if normalized_algorithm.name() != key.algorithm().name() {
                return Err(Error::InvalidAccess(None));
            }

            // Step 10. If the [[usages]] internal slot of key does not contain an entry that is
            // "sign", then throw an InvalidAccessError.
            if !key.usages().contains(&KeyUsage::Sign) {
                return Err(Error::InvalidAccess(None));
            }

            // Step 11. Let signature be the result of performing the sign operation specified by
            // normalizedAlgorithm using key and algorithm and with data as message.
            normalized_algorithm.sign(key, data)
        })
    }

    /// <https://w3c.github.io/webcrypto/#SubtleCrypto-method-verify>
    pub async fn verify(
        &self,
        algorithm: impl Into<AlgorithmIdentifier>,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> Fallible<bool> {
        let algorithm = algorithm.into();
        settle("verify", &algorithm, || {
            // Step 4. Let normalizedAlgorithm be the result of normalizing an algorithm, with alg
            // set to algorithm and op set to "verify".
            let normalized_algorithm = normalize_algorithm::<VerifyOperation>(&algorithm)?;

            // Step 10. If the name member of normalizedAlgorithm is not equal to the name
            // attribute of the [[algorithm]] internal slot of key then throw an
            // InvalidAccessError.
            if normalized_algorithm.name() != key.algorithm().name() {
                return Err(Error::InvalidAccess(None));
            }

            // Step 11. If the [[usages]] internal slot of key does not contain an entry that is
            // "verify", then throw an InvalidAccessError.
            if !key.usages().contains(&KeyUsage::Verify) {
                return Err(Error::InvalidAccess(None));
            }

            // Step 12. Let result be the result of performing the verify operation specified by
            // normalizedAlgorithm using key, algorithm and signature and with data as message.
            normalized_algorithm.verify(key, data, signature)
        })
    }

    /// <https://w3c.github.io/webcrypto/#SubtleCrypto-method-digest>
    pub async fn digest(
        &self,
        algorithm: impl Into<AlgorithmIdentifier>,
        data: &[u8],
    ) -> Fallible<Vec<u8>> {
        let algorithm = algorithm.into();
        settle("digest", &algorithm, || {
            // Step 3. Let normalizedAlgorithm be the result of normalizing an algorithm, with alg
            // set to algorithm and op set to "digest".
            let normalized_algorithm = normalize_algorithm::<DigestOperation>(&algorithm)?;

            // Step 8. Let digest be the result of performing the digest operation specified by
            // normalizedAlgorithm using algorithm, with data as message.
            normalized_algorithm.digest(data)
        })
    }

    /// <https://w3c.github.io/webcrypto/#SubtleCrypto-method-generateKey>
    pub async fn generate_key(
        &self,
        algorithm: impl Into<AlgorithmIdentifier>,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Fallible<CryptoKeyOrCryptoKeyPair> {
        let algorithm = algorithm.into();
        settle("generateKey", &algorithm, || {
            // Step 2. Let normalizedAlgorithm be the result of normalizing an algorithm, with alg
            // set to algorithm and op set to "generateKey".
            let normalized_algorithm = normalize_algorithm::<GenerateKeyOperation>(&algorithm)?;

            // Step 7. Let result be the result of performing the generate key operation specified
            // by normalizedAlgorithm using algorithm, extractable and usages.
            let result =
                normalized_algorithm.generate_key(extractable, usages.to_vec(), &self.prefs)?;

            // Step 8.
            // If result is a CryptoKey object:
            //     If the [[type]] internal slot of result is "secret" or "private" and usages is
            //     empty, then throw a SyntaxError.
            // If result is a CryptoKeyPair object:
            //     If the [[usages]] internal slot of the privateKey attribute of result is the
            //     empty sequence, then throw a SyntaxError.
            check_usages_of_result(&result)?;

            Ok(result)
        })
    }

    /// <https://w3c.github.io/webcrypto/#SubtleCrypto-method-deriveKey>
    pub async fn derive_key(
        &self,
        algorithm: impl Into<AlgorithmIdentifier>,
        base_key: &CryptoKey,
        derived_key_type: impl Into<AlgorithmIdentifier>,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Fallible<Arc<CryptoKey>> {
        let algorithm = algorithm.into();
        let derived_key_type = derived_key_type.into();
        settle("deriveKey", &algorithm, || {
            // Step 2. Let normalizedAlgorithm be the result of normalizing an algorithm, with alg
            // set to algorithm and op set to "deriveBits".
            let normalized_algorithm = normalize_algorithm::<DeriveBitsOperation>(&algorithm)?;

            // Step 4. Let normalizedDerivedKeyAlgorithmImport be the result of normalizing an
            // algorithm, with alg set to derivedKeyType and op set to "importKey".
            let normalized_derived_key_algorithm_import =
                normalize_algorithm::<ImportKeyOperation>(&derived_key_type)?;

            // Step 6. Let normalizedDerivedKeyAlgorithmLength be the result of normalizing an
            // algorithm, with alg set to derivedKeyType and op set to "get key length".
            let normalized_derived_key_algorithm_length =
                normalize_algorithm::<GetKeyLengthOperation>(&derived_key_type)?;

            // Step 12. If the name member of normalizedAlgorithm is not equal to the name
            // attribute of the [[algorithm]] internal slot of baseKey then throw an
            // InvalidAccessError.
            if normalized_algorithm.name() != base_key.algorithm().name() {
                return Err(Error::InvalidAccess(None));
            }

            // Step 13. If the [[usages]] internal slot of baseKey does not contain an entry that
            // is "deriveKey", then throw an InvalidAccessError.
            if !base_key.usages().contains(&KeyUsage::DeriveKey) {
                return Err(Error::InvalidAccess(None));
            }

            // Step 14. Let length be the result of performing the get key length algorithm
            // specified by normalizedDerivedKeyAlgorithmLength using derivedKeyType.
            let length = normalized_derived_key_algorithm_length.get_key_length()?;

            // Step 15. Let secret be the result of performing the derive bits operation specified
            // by normalizedAlgorithm using key, algorithm and length.
            let secret = normalized_algorithm.derive_bits(base_key, length)?;

            // Step 16. Let result be the result of performing the import key operation specified
            // by normalizedDerivedKeyAlgorithmImport using "raw" as format, secret as keyData,
            // derivedKeyType as algorithm and using extractable and usages.
            let result = normalized_derived_key_algorithm_import.import_key(
                KeyFormat::Raw,
                &secret,
                extractable,
                usages.to_vec(),
                &self.prefs,
            )?;

            // Step 17. If the [[type]] internal slot of result is "secret" or "private" and usages
            // is empty, then throw a SyntaxError.
            check_usages_of_result(&CryptoKeyOrCryptoKeyPair::CryptoKey(result.clone()))?;

            Ok(result)
        })
    }

    /// <https://w3c.github.io/webcrypto/#dfn-SubtleCrypto-method-deriveBits>
    pub async fn derive_bits(
        &self,
        algorithm: impl Into<AlgorithmIdentifier>,
        base_key: &CryptoKey,
        length: Option<u32>,
    ) -> Fallible<Vec<u8>> {
        let algorithm = algorithm.into();
        settle("deriveBits", &algorithm, || {
            // Step 2. Let normalizedAlgorithm be the result of normalizing an algorithm, with alg
            // set to algorithm and op set to "deriveBits".
            let normalized_algorithm = normalize_algorithm::<DeriveBitsOperation>(&algorithm)?;

            // Step 8. If the name member of normalizedAlgorithm is not equal to the name
            // attribute of the [[algorithm]] internal slot of baseKey then throw an
            // InvalidAccessError.
            if normalized_algorithm.name() != base_key.algorithm().name() {
                return Err(Error::InvalidAccess(None));
            }

            // Step 9. If the [[usages]] internal slot of baseKey does not contain an entry that
            // is "deriveBits", then throw an InvalidAccessError.
            if !base_key.usages().contains(&KeyUsage::DeriveBits) {
                return Err(Error::InvalidAccess(None));
            }

            // Step 10. Let bits be the result of performing the derive bits operation specified
            // by normalizedAlgorithm using baseKey, algorithm and length.
            normalized_algorithm.derive_bits(base_key, length)
        })
    }

    /// <https://w3c.github.io/webcrypto/#SubtleCrypto-method-importKey>
    pub async fn import_key(
        &self,
        format: KeyFormat,
        key_data: impl Into<KeyData>,
        algorithm: impl Into<AlgorithmIdentifier>,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Fallible<Arc<CryptoKey>> {
        let algorithm = algorithm.into();
        let key_data = key_data.into();
        settle("importKey", &algorithm, || {
            // Step 2. Let normalizedAlgorithm be the result of normalizing an algorithm, with alg
            // set to algorithm and op set to "importKey".
            let normalized_algorithm = normalize_algorithm::<ImportKeyOperation>(&algorithm)?;

            // Step 4.
            // If format is equal to the string "jwk":
            //     If the keyData parameter passed to the importKey() method is not a JsonWebKey
            //     dictionary, throw a TypeError.
            //     Let keyData be the keyData parameter passed to the importKey() method.
            // Otherwise:
            //     If the keyData parameter passed to the importKey() method is a JsonWebKey
            //     dictionary, throw a TypeError.
            //     Let keyData be the result of getting a copy of the bytes held by the keyData
            //     parameter passed to the importKey() method.
            //
            // NOTE: A JsonWebKey dictionary is handed to the import steps as its serialization,
            // which they parse back with the parse a JWK algorithm.
            let key_data = match (format, key_data) {
                (KeyFormat::Jwk, KeyData::Jwk(jwk)) => jwk.stringify()?,
                (KeyFormat::Raw | KeyFormat::Spki | KeyFormat::Pkcs8, KeyData::Bytes(bytes)) => {
                    bytes
                },
                _ => {
                    return Err(Error::Type(
                        "The keyData type does not match the format".to_string(),
                    ));
                },
            };

            // Step 9. Let result be the CryptoKey object that results from performing the import
            // key operation specified by normalizedAlgorithm using keyData, algorithm, format,
            // extractable and usages.
            let result = normalized_algorithm.import_key(
                format,
                &key_data,
                extractable,
                usages.to_vec(),
                &self.prefs,
            )?;

            // Step 10. If the [[type]] internal slot of result is "secret" or "private" and usages
            // is empty, then throw a SyntaxError.
            check_usages_of_result(&CryptoKeyOrCryptoKeyPair::CryptoKey(result.clone()))?;

            Ok(result)
        })
    }

    /// <https://w3c.github.io/webcrypto/#SubtleCrypto-method-exportKey>
    pub async fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> Fallible<ExportedKey> {
        let algorithm = AlgorithmIdentifier::String(key.algorithm().name().to_owned());
        settle("exportKey", &algorithm, || {
            // Step 5. If name member of the [[algorithm]] internal slot of key does not identify
            // a registered algorithm that supports the export key operation, then throw a
            // NotSupportedError.
            //
            // NOTE: We normalize the name of the [[algorithm]] internal slot of key for the
            // "exportKey" operation to find the export key operation.
            let normalized_algorithm = normalize_algorithm::<ExportKeyOperation>(&algorithm)?;

            // Step 6. If the [[extractable]] internal slot of key is false, then throw an
            // InvalidAccessError.
            if !key.extractable() {
                return Err(Error::InvalidAccess(None));
            }

            // Step 7. Let result be the result of performing the export key operation specified
            // by the [[algorithm]] internal slot of key using key and format.
            normalized_algorithm.export_key(format, key)
        })
    }

    /// <https://w3c.github.io/webcrypto/#SubtleCrypto-method-wrapKey>
    pub async fn wrap_key(
        &self,
        format: KeyFormat,
        key: &CryptoKey,
        wrapping_key: &CryptoKey,
        wrap_algorithm: impl Into<AlgorithmIdentifier>,
    ) -> Fallible<Vec<u8>> {
        let algorithm = wrap_algorithm.into();
        settle("wrapKey", &algorithm, || {
            // Step 2. Let normalizedAlgorithm be the result of normalizing an algorithm, with alg
            // set to algorithm and op set to "wrapKey".
            // Step 3. If an error occurred, let normalizedAlgorithm be the result of normalizing
            // an algorithm, with alg set to algorithm and op set to "encrypt".
            // Step 4. If an error occurred, return a Promise rejected with normalizedAlgorithm.
            let normalized_algorithm =
                if algorithm_supports(&algorithm, SupportedOperation::WrapKey) {
                    WrapKeyAlgorithmOrEncryptAlgorithm::WrapKeyAlgorithm(
                        normalize_algorithm::<WrapKeyOperation>(&algorithm)?,
                    )
                } else {
                    WrapKeyAlgorithmOrEncryptAlgorithm::EncryptAlgorithm(
                        normalize_algorithm::<EncryptOperation>(&algorithm)?,
                    )
                };

            // Step 9. If the name member of normalizedAlgorithm is not equal to the name
            // attribute of the [[algorithm]] internal slot of wrappingKey then throw an
            // InvalidAccessError.
            if normalized_algorithm.name() != wrapping_key.algorithm().name() {
                return Err(Error::InvalidAccess(None));
            }

            // Step 10. If the [[usages]] internal slot of wrappingKey does not contain an entry
            // that is "wrapKey", then throw an InvalidAccessError.
            if !wrapping_key.usages().contains(&KeyUsage::WrapKey) {
                return Err(Error::InvalidAccess(None));
            }

            // Step 11. If the algorithm identified by the [[algorithm]] internal slot of key does
            // not support the export key operation, then throw a NotSupportedError.
            let export_key_algorithm = normalize_algorithm::<ExportKeyOperation>(
                &AlgorithmIdentifier::String(key.algorithm().name().to_owned()),
            )?;

            // Step 12. If the [[extractable]] internal slot of key is false, then throw an
            // InvalidAccessError.
            if !key.extractable() {
                return Err(Error::InvalidAccess(None));
            }

            // Step 13. Let exportedKey be the result of performing the export key operation
            // specified by the [[algorithm]] internal slot of key using key and format.
            // Step 14.
            // If format is equal to the string "jwk":
            //     Let json be the result of representing exportedKey as a UTF-16 string
            //     conforming to the JSON grammar.
            //     Let bytes be the result of UTF-8 encoding json.
            // Otherwise:
            //     Let bytes be exportedKey.
            let bytes = match export_key_algorithm.export_key(format, key)? {
                ExportedKey::Bytes(bytes) => bytes,
                ExportedKey::Jwk(jwk) => jwk.stringify()?,
            };

            // Step 15.
            // If normalizedAlgorithm supports the wrap key operation:
            //     Let result be the result of performing the wrap key operation specified by
            //     normalizedAlgorithm using algorithm, wrappingKey as key and bytes as plaintext.
            // Otherwise, if normalizedAlgorithm supports the encrypt operation:
            //     Let result be the result of performing the encrypt operation specified by
            //     normalizedAlgorithm using algorithm, wrappingKey as key and bytes as plaintext.
            // Otherwise:
            //     throw a NotSupportedError.
            match normalized_algorithm {
                WrapKeyAlgorithmOrEncryptAlgorithm::WrapKeyAlgorithm(algorithm) => {
                    algorithm.wrap_key(wrapping_key, &bytes)
                },
                WrapKeyAlgorithmOrEncryptAlgorithm::EncryptAlgorithm(algorithm) => {
                    algorithm.encrypt(wrapping_key, &bytes)
                },
            }
        })
    }

    /// <https://w3c.github.io/webcrypto/#SubtleCrypto-method-unwrapKey>
    #[expect(clippy::too_many_arguments)]
    pub async fn unwrap_key(
        &self,
        format: KeyFormat,
        wrapped_key: &[u8],
        unwrapping_key: &CryptoKey,
        unwrap_algorithm: impl Into<AlgorithmIdentifier>,
        unwrapped_key_algorithm: impl Into<AlgorithmIdentifier>,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Fallible<Arc<CryptoKey>> {
        let algorithm = unwrap_algorithm.into();
        let unwrapped_key_algorithm = unwrapped_key_algorithm.into();
        settle("unwrapKey", &algorithm, || {
            // Step 3. Let normalizedAlgorithm be the result of normalizing an algorithm, with alg
            // set to algorithm and op set to "unwrapKey".
            // Step 4. If an error occurred, let normalizedAlgorithm be the result of normalizing
            // an algorithm, with alg set to algorithm and op set to "decrypt".
            // Step 5. If an error occurred, return a Promise rejected with normalizedAlgorithm.
            let normalized_algorithm =
                if algorithm_supports(&algorithm, SupportedOperation::UnwrapKey) {
                    UnwrapKeyAlgorithmOrDecryptAlgorithm::UnwrapKeyAlgorithm(
                        normalize_algorithm::<UnwrapKeyOperation>(&algorithm)?,
                    )
                } else {
                    UnwrapKeyAlgorithmOrDecryptAlgorithm::DecryptAlgorithm(
                        normalize_algorithm::<DecryptOperation>(&algorithm)?,
                    )
                };

            // Step 6. Let normalizedKeyAlgorithm be the result of normalizing an algorithm, with
            // alg set to unwrappedKeyAlgorithm and op set to "importKey".
            let normalized_key_algorithm =
                normalize_algorithm::<ImportKeyOperation>(&unwrapped_key_algorithm)?;

            // Step 12. If the name member of normalizedAlgorithm is not equal to the name
            // attribute of the [[algorithm]] internal slot of unwrappingKey then throw an
            // InvalidAccessError.
            if normalized_algorithm.name() != unwrapping_key.algorithm().name() {
                return Err(Error::InvalidAccess(None));
            }

            // Step 13. If the [[usages]] internal slot of unwrappingKey does not contain an entry
            // that is "unwrapKey", then throw an InvalidAccessError.
            if !unwrapping_key.usages().contains(&KeyUsage::UnwrapKey) {
                return Err(Error::InvalidAccess(None));
            }

            // Step 14.
            // If normalizedAlgorithm supports an unwrap key operation:
            //     Let bytes be the result of performing the unwrap key operation specified by
            //     normalizedAlgorithm using algorithm, unwrappingKey as key and wrappedKey as
            //     ciphertext.
            // Otherwise, if normalizedAlgorithm supports a decrypt operation:
            //     Let bytes be the result of performing the decrypt operation specified by
            //     normalizedAlgorithm using algorithm, unwrappingKey as key and wrappedKey as
            //     ciphertext.
            // Otherwise:
            //     throw a NotSupportedError.
            let bytes = match normalized_algorithm {
                UnwrapKeyAlgorithmOrDecryptAlgorithm::UnwrapKeyAlgorithm(algorithm) => {
                    algorithm.unwrap_key(unwrapping_key, wrapped_key)?
                },
                UnwrapKeyAlgorithmOrDecryptAlgorithm::DecryptAlgorithm(algorithm) => {
                    algorithm.decrypt(unwrapping_key, wrapped_key)?
                },
            };

            // Step 15.
            // If format is equal to the string "jwk":
            //     Let key be the result of executing the parse a JWK algorithm, with bytes as the
            //     data to be parsed.
            // Otherwise:
            //     Let key be bytes.
            let key_data = match format {
                KeyFormat::Jwk => JsonWebKey::parse(&bytes)?.stringify()?,
                _ => bytes,
            };

            // Step 16. Let result be the result of performing the import key operation specified
            // by normalizedKeyAlgorithm using unwrappedKeyAlgorithm as algorithm, format, usages
            // and extractable and with key as keyData.
            let result = normalized_key_algorithm.import_key(
                format,
                &key_data,
                extractable,
                usages.to_vec(),
                &self.prefs,
            )?;

            // Step 17. If the [[type]] internal slot of result is "secret" or "private" and usages
            // is empty, then throw a SyntaxError.
            check_usages_of_result(&CryptoKeyOrCryptoKeyPair::CryptoKey(result.clone()))?;

            Ok(result)
        })
    }
}

#[cfg(test)]
mod test {
    use super::{
        CryptoAlgorithm, DigestAlgorithm, DigestOperation, EncryptAlgorithm, EncryptOperation,
        GetKeyLengthOperation, KeyFormat, NormalizedAlgorithm, normalize_algorithm,
    };
    use crate::dictionary::{Algorithm, AlgorithmIdentifier};

    #[test]
    fn test_string_and_object_identifiers_normalize_alike() {
        let from_string = normalize_algorithm::<DigestOperation>(&"sha-256".into()).unwrap();
        let from_object = normalize_algorithm::<DigestOperation>(&AlgorithmIdentifier::from(
            Algorithm::new("Sha-256"),
        ))
        .unwrap();
        assert_eq!(from_string.name(), "SHA-256");
        assert_eq!(from_object.name(), "SHA-256");
        assert!(matches!(from_string, DigestAlgorithm::Sha(_)));
    }

    #[test]
    fn test_normalization_converts_the_registered_dictionary() {
        let algorithm = Algorithm::new("aes-ctr")
            .with("counter", vec![0u8; 16])
            .with("length", 64u8);
        let Ok(EncryptAlgorithm::AesCtr(params)) =
            normalize_algorithm::<EncryptOperation>(&algorithm.into())
        else {
            panic!("AES-CTR did not normalize to AesCtrParams");
        };
        assert_eq!(params.name, "AES-CTR");
        assert_eq!(params.length, 64);

        // The counter member is required.
        let missing = Algorithm::new("AES-CTR").with("length", 64u8);
        assert_eq!(
            normalize_algorithm::<EncryptOperation>(&missing.into())
                .err()
                .map(|error| error.name()),
            Some("TypeError")
        );
    }

    #[test]
    fn test_hash_members_are_normalized_for_digest() {
        let algorithm = Algorithm::new("HMAC").with("hash", "sha-1").with("length", 0u32);
        assert!(normalize_algorithm::<GetKeyLengthOperation>(&algorithm.into()).is_ok());

        let algorithm = Algorithm::new("HMAC").with("hash", "HKDF");
        assert_eq!(
            normalize_algorithm::<GetKeyLengthOperation>(&algorithm.into())
                .err()
                .map(|error| error.name()),
            Some("NotSupportedError")
        );
    }

    #[test]
    fn test_unknown_algorithms_are_not_supported() {
        assert_eq!(
            CryptoAlgorithm::from_str_ignore_case("ROT13")
                .unwrap_err()
                .name(),
            "NotSupportedError"
        );
        assert_eq!(
            CryptoAlgorithm::from_str_ignore_case("rsa-oaep").unwrap(),
            CryptoAlgorithm::RsaOaep
        );
        assert_eq!(
            normalize_algorithm::<EncryptOperation>(&"HMAC".into())
                .err()
                .map(|error| error.name()),
            Some("NotSupportedError")
        );
    }

    #[test]
    fn test_key_format_names() {
        assert_eq!(KeyFormat::Pkcs8.as_str(), "pkcs8");
        assert_eq!("spki".parse::<KeyFormat>(), Ok(KeyFormat::Spki));
    }
}
