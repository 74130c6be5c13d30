/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use log::debug;
use pkcs8::rand_core::OsRng;
use rsa::pkcs1::{
    DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey,
};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};

use crate::cryptokey::{CryptoKey, CryptoKeyPair, Handle, KeyType, KeyUsage};
use crate::error::{Error, Fallible};
use crate::subtlecrypto::asn1;
use crate::subtlecrypto::jwk::{JsonWebKey, JsonWebKeyExt, JwkStringField};
use crate::subtlecrypto::sha_operation::HashFunction;
use crate::subtlecrypto::{
    ALG_RSA_OAEP, ALG_RSA_PSS, ALG_RSASSA_PKCS1_V1_5, ExportedKey, KeyAlgorithmAndDerivatives,
    KeyFormat, NormalizedAlgorithm, SubtleRsaHashedImportParams, SubtleRsaHashedKeyAlgorithm,
    SubtleRsaHashedKeyGenParams,
};

/// Smallest and largest modulus lengths accepted for key generation, in bits.
const MIN_MODULUS_LENGTH: u32 = 256;
const MAX_MODULUS_LENGTH: u32 = 16384;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum RsaAlgorithm {
    RsassaPkcs1V1_5,
    RsaPss,
    RsaOaep,
}

impl RsaAlgorithm {
    fn name(&self) -> &'static str {
        match self {
            RsaAlgorithm::RsassaPkcs1V1_5 => ALG_RSASSA_PKCS1_V1_5,
            RsaAlgorithm::RsaPss => ALG_RSA_PSS,
            RsaAlgorithm::RsaOaep => ALG_RSA_OAEP,
        }
    }

    /// Usages allowed for keys of `key_type`.
    fn allowed_usages(&self, key_type: KeyType) -> &'static [KeyUsage] {
        match (self, key_type) {
            (RsaAlgorithm::RsaOaep, KeyType::Public) => &[KeyUsage::Encrypt, KeyUsage::WrapKey],
            (RsaAlgorithm::RsaOaep, _) => &[KeyUsage::Decrypt, KeyUsage::UnwrapKey],
            (_, KeyType::Public) => &[KeyUsage::Verify],
            (_, _) => &[KeyUsage::Sign],
        }
    }

    fn check_usages(&self, usages: &[KeyUsage], key_type: KeyType) -> Fallible<()> {
        let allowed_usages = self.allowed_usages(key_type);
        if usages.iter().any(|usage| !allowed_usages.contains(usage)) {
            return Err(Error::Syntax(Some(format!(
                "Usages contains an entry which is not allowed for a {} {} key",
                key_type.as_str(),
                self.name()
            ))));
        }
        Ok(())
    }

    /// The JWK "use" value of keys of this algorithm.
    fn jwk_use(&self) -> &'static str {
        match self {
            RsaAlgorithm::RsaOaep => "enc",
            _ => "sig",
        }
    }

    /// The JWK "alg" value of keys of this algorithm with the given hash.
    fn jwk_alg(&self, hash: HashFunction) -> &'static str {
        match (self, hash) {
            (RsaAlgorithm::RsassaPkcs1V1_5, HashFunction::Sha1) => "RS1",
            (RsaAlgorithm::RsassaPkcs1V1_5, HashFunction::Sha256) => "RS256",
            (RsaAlgorithm::RsassaPkcs1V1_5, HashFunction::Sha384) => "RS384",
            (RsaAlgorithm::RsassaPkcs1V1_5, HashFunction::Sha512) => "RS512",
            (RsaAlgorithm::RsaPss, HashFunction::Sha1) => "PS1",
            (RsaAlgorithm::RsaPss, HashFunction::Sha256) => "PS256",
            (RsaAlgorithm::RsaPss, HashFunction::Sha384) => "PS384",
            (RsaAlgorithm::RsaPss, HashFunction::Sha512) => "PS512",
            (RsaAlgorithm::RsaOaep, HashFunction::Sha1) => "RSA-OAEP",
            (RsaAlgorithm::RsaOaep, HashFunction::Sha256) => "RSA-OAEP-256",
            (RsaAlgorithm::RsaOaep, HashFunction::Sha384) => "RSA-OAEP-384",
            (RsaAlgorithm::RsaOaep, HashFunction::Sha512) => "RSA-OAEP-512",
        }
    }

    /// The inverse of [`RsaAlgorithm::jwk_alg`]. An unknown value is a DataError.
    fn hash_of_jwk_alg(&self, alg: &str) -> Fallible<HashFunction> {
        [
            HashFunction::Sha1,
            HashFunction::Sha256,
            HashFunction::Sha384,
            HashFunction::Sha512,
        ]
        .into_iter()
        .find(|hash| self.jwk_alg(*hash) == alg)
        .ok_or(Error::Data(Some(format!(
            "The alg field of jwk is not a known value for {}: {alg}",
            self.name()
        ))))
    }
}

/// The hash function recorded in the [[algorithm]] internal slot of an RSA key.
pub(crate) fn key_hash_function(key: &CryptoKey) -> Fallible<HashFunction> {
    let KeyAlgorithmAndDerivatives::RsaHashedKeyAlgorithm(algorithm) = key.algorithm() else {
        return Err(Error::Operation(Some(
            "[[algorithm]] internal slot of key is not an RsaHashedKeyAlgorithm".to_string(),
        )));
    };
    HashFunction::from_name(&algorithm.hash.name)
}

/// <https://w3c.github.io/webcrypto/#rsassa-pkcs1-operations-generate-key>
/// <https://w3c.github.io/webcrypto/#rsa-pss-operations-generate-key>
/// <https://w3c.github.io/webcrypto/#rsa-oaep-operations-generate-key>
pub(crate) fn generate_key(
    rsa_algorithm: RsaAlgorithm,
    normalized_algorithm: &SubtleRsaHashedKeyGenParams,
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<CryptoKeyPair> {
    // Step 1. If usages contains an entry which is not allowed for either the public or the
    // private key of the algorithm, then throw a SyntaxError.
    if usages.iter().any(|usage| {
        !rsa_algorithm.allowed_usages(KeyType::Public).contains(usage) &&
            !rsa_algorithm.allowed_usages(KeyType::Private).contains(usage)
    }) {
        return Err(Error::Syntax(Some(format!(
            "Usages contains an entry which is not allowed for {}",
            rsa_algorithm.name()
        ))));
    }

    // Step 2. Generate an RSA key pair, as defined in [RFC3447], with RSA modulus length equal
    // to the modulusLength attribute of normalizedAlgorithm and RSA public exponent equal to the
    // publicExponent attribute of normalizedAlgorithm.
    // Step 3. If generation of the key pair fails, then throw an OperationError.
    let public_exponent = public_exponent_from_bytes(&normalized_algorithm.public_exponent)?;
    let modulus_length = normalized_algorithm.modulus_length;
    if !(MIN_MODULUS_LENGTH..=MAX_MODULUS_LENGTH).contains(&modulus_length) {
        return Err(Error::Operation(Some(format!(
            "The modulus length is not between {MIN_MODULUS_LENGTH} and {MAX_MODULUS_LENGTH}"
        ))));
    }
    // An exponent with no inverse modulo phi(n) can never produce a key pair.
    if public_exponent < 3 || public_exponent % 2 == 0 {
        return Err(Error::Operation(Some(format!(
            "The public exponent {public_exponent} is not an odd integer greater than 1"
        ))));
    }
    debug!(
        "Generating {modulus_length}-bit {} key pair",
        rsa_algorithm.name()
    );
    let private_key = RsaPrivateKey::new_with_exp(
        &mut OsRng,
        modulus_length as usize,
        &BigUint::from(public_exponent),
    )
    .map_err(|error| {
        Error::Operation(Some(format!("Failed to generate RSA key pair: {error}")))
    })?;
    let public_key = private_key.to_public_key();

    // Step 4. Let algorithm be a new RsaHashedKeyAlgorithm dictionary.
    // Step 5. Set the name attribute of algorithm to the name of the algorithm.
    // Step 6. Set the modulusLength attribute of algorithm to equal the modulusLength attribute
    // of normalizedAlgorithm.
    // Step 7. Set the publicExponent attribute of algorithm to equal the publicExponent
    // attribute of normalizedAlgorithm.
    // Step 8. Set the hash attribute of algorithm to the hash member of normalizedAlgorithm.
    let algorithm = SubtleRsaHashedKeyAlgorithm {
        name: rsa_algorithm.name().to_string(),
        modulus_length,
        public_exponent: public_exponent_to_bytes(public_exponent),
        hash: normalized_algorithm.hash.key_algorithm(),
    };

    // Step 9. Let publicKey be a new CryptoKey representing the public key of the generated key
    // pair.
    // Step 10. Set the [[type]] internal slot of publicKey to "public"
    // Step 11. Set the [[algorithm]] internal slot of publicKey to algorithm.
    // Step 12. Set the [[extractable]] internal slot of publicKey to true.
    // Step 13. Set the [[usages]] internal slot of publicKey to be the usage intersection of
    // usages and the usages of a public key.
    let public_usages = intersect_usages(&usages, rsa_algorithm.allowed_usages(KeyType::Public));
    let public_key = CryptoKey::new(
        KeyType::Public,
        true,
        KeyAlgorithmAndDerivatives::RsaHashedKeyAlgorithm(algorithm.clone()),
        public_usages,
        Handle::RsaPublicKey(public_key),
    );

    // Step 14. Let privateKey be a new CryptoKey representing the private key of the generated
    // key pair.
    // Step 15. Set the [[type]] internal slot of privateKey to "private"
    // Step 16. Set the [[algorithm]] internal slot of privateKey to algorithm.
    // Step 17. Set the [[extractable]] internal slot of privateKey to extractable.
    // Step 18. Set the [[usages]] internal slot of privateKey to be the usage intersection of
    // usages and the usages of a private key.
    let private_usages =
        intersect_usages(&usages, rsa_algorithm.allowed_usages(KeyType::Private));
    let private_key = CryptoKey::new(
        KeyType::Private,
        extractable,
        KeyAlgorithmAndDerivatives::RsaHashedKeyAlgorithm(algorithm),
        private_usages,
        Handle::RsaPrivateKey(private_key),
    );

    // Step 19. Let result be a new CryptoKeyPair dictionary.
    // Step 20. Set the publicKey attribute of result to be publicKey.
    // Step 21. Set the privateKey attribute of result to be privateKey.
    // Step 22. Return result.
    Ok(CryptoKeyPair {
        public_key,
        private_key,
    })
}

/// <https://w3c.github.io/webcrypto/#rsassa-pkcs1-operations-import-key>
/// <https://w3c.github.io/webcrypto/#rsa-pss-operations-import-key>
/// <https://w3c.github.io/webcrypto/#rsa-oaep-operations-import-key>
pub(crate) fn import_key(
    rsa_algorithm: RsaAlgorithm,
    normalized_algorithm: &SubtleRsaHashedImportParams,
    format: KeyFormat,
    key_data: &[u8],
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    // Step 1. Let keyData be the key data to be imported.

    // Step 2.
    let (key_type, handle) = match format {
        // If format is "spki":
        KeyFormat::Spki => {
            // Step 2.1. If usages contains an entry which is not allowed for a public key, then
            // throw a SyntaxError.
            rsa_algorithm.check_usages(&usages, KeyType::Public)?;

            // Step 2.2. Let spki be the result of running the parse a subjectPublicKeyInfo
            // algorithm over keyData.
            // Step 2.3. If an error occurred while parsing, then throw a DataError.
            // Step 2.4. If the algorithm object identifier field of the algorithm
            // AlgorithmIdentifier field of spki is not equal to the rsaEncryption object
            // identifier defined in [RFC3447], then throw a DataError.
            // Step 2.5. Let publicKey be the result of performing the parse an ASN.1 structure
            // algorithm, with data as the subjectPublicKeyInfo field of spki, structure as the
            // RSAPublicKey structure specified in Section A.1.1 of [RFC3447], and exactData set
            // to true.
            // Step 2.6. If an error occurred while parsing, or it can be determined that
            // publicKey is not a valid public key according to [RFC3447], then throw a
            // DataError.
            let public_key = RsaPublicKey::from_public_key_der(key_data).map_err(|_| {
                Error::Data(Some("Failed to parse SPKI as an RSA public key".to_string()))
            })?;

            // Step 2.7. Let key be a new CryptoKey that represents the RSA public key identified
            // by publicKey.
            // Step 2.8. Set the [[type]] internal slot of key to "public"
            (KeyType::Public, Handle::RsaPublicKey(public_key))
        },
        // If format is "pkcs8":
        KeyFormat::Pkcs8 => {
            // Step 2.1. If usages contains an entry which is not allowed for a private key, then
            // throw a SyntaxError.
            rsa_algorithm.check_usages(&usages, KeyType::Private)?;

            // Step 2.2. Let privateKeyInfo be the result of running the parse a privateKeyInfo
            // algorithm over keyData.
            // Step 2.3. If an error occurred while parsing, then throw a DataError.
            // Step 2.4. If the algorithm object identifier field of the privateKeyAlgorithm
            // PrivateKeyAlgorithm field of privateKeyInfo is not equal to the rsaEncryption
            // object identifier defined in [RFC3447], then throw a DataError.
            // Step 2.5. Let rsaPrivateKey be the result of performing the parse an ASN.1
            // structure algorithm, with data as the privateKey field of privateKeyInfo,
            // structure as the RSAPrivateKey structure specified in Section A.1.2 of [RFC3447],
            // and exactData set to true.
            // Step 2.6. If an error occurred while parsing, or if rsaPrivateKey is not a valid
            // RSA private key according to [RFC3447], then throw a DataError.
            let private_key = RsaPrivateKey::from_pkcs8_der(key_data).map_err(|_| {
                Error::Data(Some(
                    "Failed to parse PKCS #8 as an RSA private key".to_string(),
                ))
            })?;

            // Step 2.7. Let key be a new CryptoKey that represents the RSA private key
            // identified by rsaPrivateKey.
            // Step 2.8. Set the [[type]] internal slot of key to "private"
            (KeyType::Private, Handle::RsaPrivateKey(private_key))
        },
        // If format is "jwk":
        KeyFormat::Jwk => {
            // Step 2.1.
            // If keyData is a JsonWebKey dictionary:
            //     Let jwk equal keyData.
            // Otherwise:
            //     Throw a DataError.
            let jwk = JsonWebKey::parse(key_data)?;

            // Step 2.2. If the d field of jwk is present and usages contains an entry which is
            // not allowed for a private key, or, if the d field of jwk is not present and usages
            // contains an entry which is not allowed for a public key, then throw a SyntaxError.
            let key_type = if jwk.d.is_some() {
                KeyType::Private
            } else {
                KeyType::Public
            };
            rsa_algorithm.check_usages(&usages, key_type)?;

            // Step 2.3. If the kty field of jwk is not a case-sensitive string match to "RSA",
            // then throw a DataError.
            if jwk.kty.as_deref() != Some("RSA") {
                return Err(Error::Data(Some(
                    "The kty field of jwk is not \"RSA\"".to_string(),
                )));
            }

            // Step 2.4. If usages is non-empty and the use field of jwk is present and is not a
            // case-sensitive string match to "sig" ("enc" for RSA-OAEP), then throw a DataError.
            jwk.check_use(&usages, rsa_algorithm.jwk_use())?;

            // Step 2.5. If the key_ops field of jwk is present, and is invalid according to the
            // requirements of JSON Web Key [JWK] or does not contain all of the specified usages
            // values, then throw a DataError.
            jwk.check_key_ops(&usages)?;

            // Step 2.6. If the ext field of jwk is present and has the value false and
            // extractable is true, then throw a DataError.
            jwk.check_ext(extractable)?;

            // Step 2.7. If the alg field of jwk is not present, let hash be undefined. Otherwise
            // let hash be the hash function named by the alg field, or throw a DataError if it
            // names none.
            // Step 2.8. If hash is not undefined:
            //     Step 2.8.1. Let normalizedHash be the result of normalize an algorithm with
            //     alg set to hash and op set to digest.
            //     Step 2.8.2. If normalizedHash is not equal to the hash member of
            //     normalizedAlgorithm, throw a DataError.
            if let Some(alg) = &jwk.alg {
                let hash = rsa_algorithm.hash_of_jwk_alg(alg)?;
                if hash.name() != normalized_algorithm.hash.name() {
                    return Err(Error::Data(Some(format!(
                        "The alg field of jwk does not match the hash {}",
                        normalized_algorithm.hash.name()
                    ))));
                }
            }

            // Step 2.9.
            let handle = match key_type {
                // If the d field of jwk is present:
                KeyType::Private => Handle::RsaPrivateKey(private_key_from_jwk(&jwk)?),
                // Otherwise:
                _ => Handle::RsaPublicKey(public_key_from_jwk(&jwk)?),
            };
            (key_type, handle)
        },
        // Otherwise:
        _ => {
            // throw a NotSupportedError.
            return Err(Error::NotSupported(Some(format!(
                "Unsupported import key format for {}: {}",
                rsa_algorithm.name(),
                format.as_str()
            ))));
        },
    };

    // Step 3. Let algorithm be a new RsaHashedKeyAlgorithm dictionary.
    // Step 4. Set the name attribute of algorithm to the name of the algorithm.
    // Step 5. Set the modulusLength attribute of algorithm to the length, in bits, of the RSA
    // public modulus.
    // Step 6. Set the publicExponent attribute of algorithm to the BigInteger representation of
    // the RSA public exponent.
    // Step 7. Set the hash attribute of algorithm to the hash member of normalizedAlgorithm.
    let (modulus, public_exponent) = match &handle {
        Handle::RsaPrivateKey(private_key) => (private_key.n(), private_key.e()),
        Handle::RsaPublicKey(public_key) => (public_key.n(), public_key.e()),
        _ => {
            return Err(Error::Operation(Some(
                "The key handle is not an RSA key".to_string(),
            )));
        },
    };
    let algorithm = SubtleRsaHashedKeyAlgorithm {
        name: rsa_algorithm.name().to_string(),
        modulus_length: modulus.bits() as u32,
        public_exponent: public_exponent.to_bytes_be(),
        hash: normalized_algorithm.hash.key_algorithm(),
    };

    // Step 8. Set the [[algorithm]] internal slot of key to algorithm.
    // Step 9. Return key.
    Ok(CryptoKey::new(
        key_type,
        extractable,
        KeyAlgorithmAndDerivatives::RsaHashedKeyAlgorithm(algorithm),
        usages,
        handle,
    ))
}

/// <https://w3c.github.io/webcrypto/#rsassa-pkcs1-operations-export-key>
/// <https://w3c.github.io/webcrypto/#rsa-pss-operations-export-key>
/// <https://w3c.github.io/webcrypto/#rsa-oaep-operations-export-key>
///
/// The steps that are different among RSA algorithms are differentiated by match arms on
/// `rsa_algorithm` parameters.
pub(crate) fn export_key(
    rsa_algorithm: RsaAlgorithm,
    format: KeyFormat,
    key: &CryptoKey,
) -> Fallible<ExportedKey> {
    // Step 1. Let key be the key to be exported.

    // Step 2. If the underlying cryptographic key material represented by the [[handle]] internal
    // slot of key cannot be accessed, then throw an OperationError.
    // Step 3.
    let result = match format {
        // If format is "spki"
        KeyFormat::Spki => {
            // Step 3.1. If the [[type]] internal slot of key is not "public", then throw an
            // InvalidAccessError.
            if key.key_type() != KeyType::Public {
                return Err(Error::InvalidAccess(Some(
                    "[[type]] internal slot of key is not \"public\"".to_string(),
                )));
            }

            // Step 3.2. Let data be an instance of the SubjectPublicKeyInfo ASN.1 structure
            // defined in [RFC5280] with the algorithm field set to rsaEncryption and the
            // subjectPublicKey field set to the DER encoding of an RSAPublicKey.
            // Step 3.3. Let result be the result of DER-encoding data.
            let Handle::RsaPublicKey(public_key) = key.handle() else {
                return Err(Error::Operation(Some(
                    "[[handle]] internal slot of key is not an RSA public key".to_string(),
                )));
            };
            let data = public_key.to_public_key_der().map_err(|_| {
                Error::Operation(Some("Failed to encode RSA public key".to_string()))
            })?;
            ExportedKey::Bytes(data.as_bytes().to_vec())
        },
        // If format is "pkcs8":
        KeyFormat::Pkcs8 => {
            // Step 3.1. If the [[type]] internal slot of key is not "private", then throw an
            // InvalidAccessError.
            if key.key_type() != KeyType::Private {
                return Err(Error::InvalidAccess(Some(
                    "[[type]] internal slot of key is not \"private\"".to_string(),
                )));
            }

            // Step 3.2. Let data be an instance of the PrivateKeyInfo ASN.1 structure defined in
            // [RFC5208] with the privateKeyAlgorithm field set to rsaEncryption and the
            // privateKey field set to the DER encoding of an RSAPrivateKey.
            // Step 3.3. Let result be the result of DER-encoding data.
            let Handle::RsaPrivateKey(private_key) = key.handle() else {
                return Err(Error::Operation(Some(
                    "[[handle]] internal slot of key is not an RSA private key".to_string(),
                )));
            };
            let data = private_key.to_pkcs8_der().map_err(|_| {
                Error::Operation(Some("Failed to encode RSA private key".to_string()))
            })?;
            ExportedKey::Bytes(data.as_bytes().to_vec())
        },
        // If format is "jwk":
        KeyFormat::Jwk => {
            // Step 3.1. Let jwk be a new JsonWebKey dictionary.
            // Step 3.2. Set the kty attribute of jwk to the string "RSA".
            let mut jwk = JsonWebKey {
                kty: Some("RSA".to_string()),
                ..Default::default()
            };

            // Step 3.3. Let hash be the name attribute of the hash attribute of the [[algorithm]]
            // internal slot of key.
            // Step 3.4. Set the alg attribute of jwk to the value mapped from hash: "RS*" for
            // RSASSA-PKCS1-v1_5, "PS*" for RSA-PSS and "RSA-OAEP*" for RSA-OAEP.
            let hash = key_hash_function(key)?;
            jwk.alg = Some(rsa_algorithm.jwk_alg(hash).to_string());

            // Step 3.5. Set the attributes n and e of jwk according to the corresponding
            // definitions in JSON Web Algorithms [JWA], Section 6.3.1.
            // Step 3.6. If the [[type]] internal slot of key is "private":
            //     Step 3.6.1. Set the attributes named d, p, q, dp, dq, and qi of jwk according to
            //     the corresponding definitions in JSON Web Algorithms [JWA], Section 6.3.2.
            //     Step 3.6.2. If the underlying RSA private key represented by the [[handle]]
            //     internal slot of key is represented by more than two primes, set the attribute
            //     named oth of jwk according to the corresponding definition in JSON Web
            //     Algorithms [JWA], Section 6.3.2.7
            //
            // NOTE: Only two-prime keys can be imported or generated, so oth is never set.
            match key.handle() {
                Handle::RsaPrivateKey(private_key) => {
                    write_private_key_to_jwk(private_key, &mut jwk)?
                },
                Handle::RsaPublicKey(public_key) => write_public_key_to_jwk(public_key, &mut jwk)?,
                _ => {
                    return Err(Error::Operation(Some(
                        "The key handle is not an RSA key".to_string(),
                    )));
                },
            }

            // Step 3.7. Set the key_ops attribute of jwk to the usages attribute of key.
            jwk.set_key_ops(key.usages());

            // Step 3.8. Set the ext attribute of jwk to the [[extractable]] internal slot of key.
            jwk.ext = Some(key.extractable());

            // Step 3.9. Let result be jwk.
            ExportedKey::Jwk(Box::new(jwk))
        },
        // Otherwise
        _ => {
            // throw a NotSupportedError.
            return Err(Error::NotSupported(Some(format!(
                "Unsupported export key format for {}: {}",
                rsa_algorithm.name(),
                format.as_str()
            ))));
        },
    };

    // Step 4. Return result.
    Ok(result)
}

fn intersect_usages(usages: &[KeyUsage], allowed_usages: &[KeyUsage]) -> Vec<KeyUsage> {
    usages
        .iter()
        .filter(|usage| allowed_usages.contains(usage))
        .cloned()
        .collect()
}

/// Convert the big-endian publicExponent of an RsaKeyGenParams dictionary.
fn public_exponent_from_bytes(bytes: &[u8]) -> Fallible<u32> {
    let skip = bytes.iter().take_while(|byte| **byte == 0).count();
    let significant = &bytes[skip..];
    if significant.len() > 3 {
        return Err(Error::NotSupported(Some(
            "The public exponent is larger than 24 bits".to_string(),
        )));
    }
    Ok(significant
        .iter()
        .fold(0u32, |exponent, byte| (exponent << 8) | *byte as u32))
}

/// The minimal big-endian encoding of `exponent`.
fn public_exponent_to_bytes(exponent: u32) -> Vec<u8> {
    let bytes = exponent.to_be_bytes();
    let skip = bytes.iter().take_while(|byte| **byte == 0).count();
    bytes[skip..].to_vec()
}

/// The RSAPublicKey structure of [RFC3447] for the n and e fields of `jwk`.
fn public_key_from_jwk(jwk: &JsonWebKey) -> Fallible<RsaPublicKey> {
    // Step 2.9.1. Let publicKey be the result of interpreting jwk according to Section 6.3.1 of
    // JSON Web Algorithms [JWA].
    // Step 2.9.2. If publicKey can be determined to not be a valid RSA public key according to
    // [RFC3447], then throw a DataError.
    let n = jwk.decode_required_string_field(JwkStringField::N)?;
    let e = jwk.decode_required_string_field(JwkStringField::E)?;
    let der = asn1::encode_integer_sequence(&[&n, &e]);
    RsaPublicKey::from_pkcs1_der(&der)
        .map_err(|_| Error::Data(Some("The jwk is not a valid RSA public key".to_string())))
}

/// The RSAPrivateKey structure of [RFC3447] for the fields of `jwk`.
fn private_key_from_jwk(jwk: &JsonWebKey) -> Fallible<RsaPrivateKey> {
    // Step 2.9.1. If jwk does not meet the requirements of Section 6.3.2 of JSON Web Algorithms
    // [JWA], then throw a DataError.
    if jwk.oth.is_some() {
        return Err(Error::NotSupported(Some(
            "Multi-prime RSA keys are not supported".to_string(),
        )));
    }
    let n = jwk.decode_required_string_field(JwkStringField::N)?;
    let e = jwk.decode_required_string_field(JwkStringField::E)?;
    let d = jwk.decode_required_string_field(JwkStringField::D)?;
    let p = jwk.decode_required_string_field(JwkStringField::P)?;
    let q = jwk.decode_required_string_field(JwkStringField::Q)?;
    let dp = jwk.decode_required_string_field(JwkStringField::DP)?;
    let dq = jwk.decode_required_string_field(JwkStringField::DQ)?;
    let qi = jwk.decode_required_string_field(JwkStringField::QI)?;

    // Step 2.9.2. Let privateKey represent the RSA private key identified by interpreting jwk
    // according to Section 6.3.2 of JSON Web Algorithms [JWA].
    // Step 2.9.3. If privateKey is not a valid RSA private key according to [RFC3447], then
    // throw a DataError.
    let version: &[u8] = &[0];
    let der = asn1::encode_integer_sequence(&[version, &n, &e, &d, &p, &q, &dp, &dq, &qi]);
    let private_key = RsaPrivateKey::from_pkcs1_der(&der)
        .map_err(|_| Error::Data(Some("The jwk is not a valid RSA private key".to_string())))?;

    // The CRT parameters are recomputed from the primes, so check that the given ones agree.
    let consistent = private_key.dp() == Some(&BigUint::from_bytes_be(&dp)) &&
        private_key.dq() == Some(&BigUint::from_bytes_be(&dq)) &&
        private_key.crt_coefficient() == Some(BigUint::from_bytes_be(&qi));
    if !consistent {
        return Err(Error::Data(Some(
            "The dp, dq and qi fields of jwk do not match the key".to_string(),
        )));
    }
    Ok(private_key)
}

fn write_public_key_to_jwk(public_key: &RsaPublicKey, jwk: &mut JsonWebKey) -> Fallible<()> {
    let der = public_key
        .to_pkcs1_der()
        .map_err(|_| Error::Operation(Some("Failed to encode RSA public key".to_string())))?;
    let [n, e] = <[Vec<u8>; 2]>::try_from(asn1::decode_integer_sequence(der.as_bytes())?)
        .map_err(|_| Error::Operation(Some("Unexpected RSAPublicKey structure".to_string())))?;
    jwk.encode_string_field(JwkStringField::N, &n);
    jwk.encode_string_field(JwkStringField::E, &e);
    Ok(())
}

fn write_private_key_to_jwk(private_key: &RsaPrivateKey, jwk: &mut JsonWebKey) -> Fallible<()> {
    let der = private_key
        .to_pkcs1_der()
        .map_err(|_| Error::Operation(Some("Failed to encode RSA private key".to_string())))?;
    let [_version, n, e, d, p, q, dp, dq, qi] =
        <[Vec<u8>; 9]>::try_from(asn1::decode_integer_sequence(der.as_bytes())?).map_err(
            |_| Error::Operation(Some("Unexpected RSAPrivateKey structure".to_string())),
        )?;
    jwk.encode_string_field(JwkStringField::N, &n);
    jwk.encode_string_field(JwkStringField::E, &e);
    jwk.encode_string_field(JwkStringField::D, &d);
    jwk.encode_string_field(JwkStringField::P, &p);
    jwk.encode_string_field(JwkStringField::Q, &q);
    jwk.encode_string_field(JwkStringField::DP, &dp);
    jwk.encode_string_field(JwkStringField::DQ, &dq);
    jwk.encode_string_field(JwkStringField::QI, &qi);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::{RsaAlgorithm, public_exponent_from_bytes, public_exponent_to_bytes};
    use crate::cryptokey::{KeyType, KeyUsage};
    use crate::subtlecrypto::sha_operation::HashFunction;

    #[test]
    fn test_public_exponent() {
        assert_eq!(public_exponent_from_bytes(&[0x01, 0x00, 0x01]).unwrap(), 65537);
        assert_eq!(public_exponent_from_bytes(&[0x00, 0x00, 0x03]).unwrap(), 3);
        assert_eq!(
            public_exponent_from_bytes(&[0x01, 0x00, 0x00, 0x01])
                .unwrap_err()
                .name(),
            "NotSupportedError"
        );

        let exponent = public_exponent_from_bytes(&[0x00, 0x01, 0x00, 0x01]).unwrap();
        assert_eq!(public_exponent_to_bytes(exponent), vec![0x01, 0x00, 0x01]);
        assert_eq!(public_exponent_to_bytes(3), vec![0x03]);
        assert!(public_exponent_to_bytes(0).is_empty());
    }

    #[test]
    fn test_jwk_alg_table() {
        assert_eq!(RsaAlgorithm::RsaPss.jwk_alg(HashFunction::Sha384), "PS384");
        assert_eq!(
            RsaAlgorithm::RsaOaep.hash_of_jwk_alg("RSA-OAEP").unwrap(),
            HashFunction::Sha1
        );
        assert_eq!(
            RsaAlgorithm::RsassaPkcs1V1_5
                .hash_of_jwk_alg("RS256")
                .unwrap(),
            HashFunction::Sha256
        );
        assert!(RsaAlgorithm::RsassaPkcs1V1_5.hash_of_jwk_alg("PS256").is_err());
    }

    #[test]
    fn test_usages_per_key_type() {
        let oaep = RsaAlgorithm::RsaOaep;
        assert!(oaep.check_usages(&[KeyUsage::WrapKey], KeyType::Public).is_ok());
        assert!(oaep.check_usages(&[KeyUsage::Decrypt], KeyType::Public).is_err());
        let pss = RsaAlgorithm::RsaPss;
        assert!(pss.check_usages(&[KeyUsage::Sign], KeyType::Private).is_ok());
        assert!(pss.check_usages(&[KeyUsage::Verify], KeyType::Private).is_err());
    }
}
