/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};

use crate::cryptokey::{CryptoKey, CryptoKeyPair, Handle, KeyType, KeyUsage};
use crate::error::{Error, Fallible};
use crate::subtlecrypto::asn1;
use crate::subtlecrypto::ec_common::{self, EcAlgorithm};
use crate::subtlecrypto::{
    ALG_ECDSA, ExportedKey, KeyFormat, SubtleEcKeyGenParams, SubtleEcKeyImportParams,
    SubtleEcdsaParams,
};

/// <https://w3c.github.io/webcrypto/#ecdsa-operations-sign>
pub(crate) fn sign(
    normalized_algorithm: &SubtleEcdsaParams,
    key: &CryptoKey,
    message: &[u8],
) -> Fallible<Vec<u8>> {
    // Step 1. If the [[type]] internal slot of key is not "private", then throw an
    // InvalidAccessError.
    if key.key_type() != KeyType::Private {
        return Err(Error::InvalidAccess(Some(
            "[[type]] internal slot of key is not \"private\"".to_string(),
        )));
    }

    // Step 2. Let hashAlgorithm be the hash member of normalizedAlgorithm.
    // Step 3. Let M be the result of performing the digest operation specified by hashAlgorithm
    // using message.
    let hash_function = normalized_algorithm.hash.hash_function()?;
    hash_function.warn_if_legacy(ALG_ECDSA);
    let curve = ec_common::key_named_curve(key)?;
    let digest = prehash_for_field(hash_function.digest(message), curve.order_size());

    // Step 4. Let d be the ECDSA private key associated with key.
    // Step 5. Let params be the EC domain parameters associated with key.
    // Step 6. If the namedCurve attribute of the [[algorithm]] internal slot of key is "P-256",
    // "P-384" or "P-521":
    //     Step 6.1. Perform the ECDSA signing process, as specified in [RFC6090], Section 5.4,
    //     with M as the message, using params as the EC domain parameters, and with d as the
    //     private key.
    //     Step 6.2. Let r and s be the pair of integers resulting from performing the ECDSA
    //     signing process.
    //     Step 6.3. Let result be an empty byte sequence.
    //     Step 6.4. Let n be the smallest integer such that n * 8 is greater than the logarithm
    //     to base 2 of the order of the base point of the elliptic curve identified by params.
    //     Step 6.5. Convert r to a byte sequence of length n and append it to result.
    //     Step 6.6. Convert s to a byte sequence of length n and append it to result.
    // Otherwise, the namedCurve attribute of the [[algorithm]] internal slot of key is a value
    // specified in an applicable specification:
    //     Perform the ECDSA signature steps specified in that specification, passing in M,
    //     params and d and resulting in result.
    // Step 7. Return result.
    let der = match key.handle() {
        Handle::P256PrivateKey(secret_key) => {
            let signing_key = p256::ecdsa::SigningKey::from_bytes(&secret_key.to_bytes())
                .map_err(|_| signing_failed())?;
            let signature: p256::ecdsa::Signature =
                signing_key.sign_prehash(&digest).map_err(|_| signing_failed())?;
            signature.to_der().as_bytes().to_vec()
        },
        Handle::P384PrivateKey(secret_key) => {
            let signing_key = p384::ecdsa::SigningKey::from_bytes(&secret_key.to_bytes())
                .map_err(|_| signing_failed())?;
            let signature: p384::ecdsa::Signature =
                signing_key.sign_prehash(&digest).map_err(|_| signing_failed())?;
            signature.to_der().as_bytes().to_vec()
        },
        Handle::P521PrivateKey(secret_key) => {
            let signing_key = p521::ecdsa::SigningKey::from_bytes(&secret_key.to_bytes())
                .map_err(|_| signing_failed())?;
            let signature: p521::ecdsa::Signature =
                signing_key.sign_prehash(&digest).map_err(|_| signing_failed())?;
            signature.to_der().as_bytes().to_vec()
        },
        _ => {
            return Err(Error::Operation(Some(
                "[[handle]] internal slot of key is not an ECDSA private key".to_string(),
            )));
        },
    };
    der_to_fixed_width(&der, curve.order_size())
}

/// <https://w3c.github.io/webcrypto/#ecdsa-operations-verify>
pub(crate) fn verify(
    normalized_algorithm: &SubtleEcdsaParams,
    key: &CryptoKey,
    message: &[u8],
    signature: &[u8],
) -> Fallible<bool> {
    // Step 1. If the [[type]] internal slot of key is not "public", then throw an
    // InvalidAccessError.
    if key.key_type() != KeyType::Public {
        return Err(Error::InvalidAccess(Some(
            "[[type]] internal slot of key is not \"public\"".to_string(),
        )));
    }

    // Step 2. Let hashAlgorithm be the hash member of normalizedAlgorithm.
    // Step 3. Let M be the result of performing the digest operation specified by hashAlgorithm
    // using message.
    let hash_function = normalized_algorithm.hash.hash_function()?;
    hash_function.warn_if_legacy(ALG_ECDSA);
    let curve = ec_common::key_named_curve(key)?;
    let digest = prehash_for_field(hash_function.digest(message), curve.order_size());

    // Step 4. Let Q be the ECDSA public key associated with key.
    // Step 5. Let params be the EC domain parameters associated with key.
    // Step 6. If the namedCurve attribute of the [[algorithm]] internal slot of key is "P-256",
    // "P-384" or "P-521":
    //     Perform the ECDSA verifying process, as specified in [RFC6090], Section 5.3, with M as
    //     the received message, signature as the received signature and using params as the EC
    //     domain parameters, and Q as the public key.
    // Otherwise, the namedCurve attribute of the [[algorithm]] internal slot of key is a value
    // specified in an applicable specification:
    //     Perform the ECDSA verification steps specified in that specification passing in M,
    //     signature, params and Q and resulting in an indication of whether or not the purported
    //     signature is valid.
    // Step 7. Let result be a boolean with the value true if the signature is valid and the
    // value false otherwise.
    let Some(der) = fixed_width_to_der(signature, curve.order_size()) else {
        return Ok(false);
    };
    let result = match key.handle() {
        Handle::P256PublicKey(public_key) => {
            p256::ecdsa::VerifyingKey::from_affine(*public_key.as_affine())
                .ok()
                .zip(p256::ecdsa::Signature::from_der(&der).ok())
                .is_some_and(|(verifying_key, signature)| {
                    verifying_key.verify_prehash(&digest, &signature).is_ok()
                })
        },
        Handle::P384PublicKey(public_key) => {
            p384::ecdsa::VerifyingKey::from_affine(*public_key.as_affine())
                .ok()
                .zip(p384::ecdsa::Signature::from_der(&der).ok())
                .is_some_and(|(verifying_key, signature)| {
                    verifying_key.verify_prehash(&digest, &signature).is_ok()
                })
        },
        Handle::P521PublicKey(public_key) => {
            p521::ecdsa::VerifyingKey::from_affine(*public_key.as_affine())
                .ok()
                .zip(p521::ecdsa::Signature::from_der(&der).ok())
                .is_some_and(|(verifying_key, signature)| {
                    verifying_key.verify_prehash(&digest, &signature).is_ok()
                })
        },
        _ => {
            return Err(Error::Operation(Some(
                "[[handle]] internal slot of key is not an ECDSA public key".to_string(),
            )));
        },
    };

    // Step 8. Return result.
    Ok(result)
}

/// <https://w3c.github.io/webcrypto/#ecdsa-operations-generate-key>
pub(crate) fn generate_key(
    normalized_algorithm: &SubtleEcKeyGenParams,
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<CryptoKeyPair> {
    ec_common::generate_key(
        EcAlgorithm::Ecdsa,
        normalized_algorithm,
        extractable,
        usages,
    )
}

/// <https://w3c.github.io/webcrypto/#ecdsa-operations-import-key>
pub(crate) fn import_key(
    normalized_algorithm: &SubtleEcKeyImportParams,
    format: KeyFormat,
    key_data: &[u8],
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    ec_common::import_key(
        EcAlgorithm::Ecdsa,
        normalized_algorithm,
        format,
        key_data,
        extractable,
        usages,
    )
}

/// <https://w3c.github.io/webcrypto/#ecdsa-operations-export-key>
pub(crate) fn export_key(format: KeyFormat, key: &CryptoKey) -> Fallible<ExportedKey> {
    ec_common::export_key(format, key)
}

fn signing_failed() -> Error {
    Error::Operation(Some("ECDSA failed to sign message".to_string()))
}

/// Left-pad a digest shorter than the field to the field size. Both denote the same integer,
/// and the signer rejects digests shorter than half the field.
fn prehash_for_field(digest: Vec<u8>, field_size: usize) -> Vec<u8> {
    if digest.len() >= field_size {
        return digest;
    }
    let mut padded = vec![0; field_size - digest.len()];
    padded.extend_from_slice(&digest);
    padded
}

/// Convert a DER `SEQUENCE { r INTEGER, s INTEGER }` into `r || s`, each zero-padded to `size`
/// bytes.
fn der_to_fixed_width(der: &[u8], size: usize) -> Fallible<Vec<u8>> {
    let integers = asn1::decode_integer_sequence(der)
        .map_err(|_| Error::Operation(Some("Malformed ECDSA signature".to_string())))?;
    if integers.len() != 2 || integers.iter().any(|integer| integer.len() > size) {
        return Err(Error::Operation(Some(
            "Malformed ECDSA signature".to_string(),
        )));
    }
    let mut result = Vec::with_capacity(2 * size);
    for integer in integers {
        result.resize(result.len() + size - integer.len(), 0);
        result.extend_from_slice(&integer);
    }
    Ok(result)
}

/// The inverse of [`der_to_fixed_width`]. A signature of the wrong length has no DER form.
fn fixed_width_to_der(signature: &[u8], size: usize) -> Option<Vec<u8>> {
    if signature.len() != 2 * size {
        return None;
    }
    let (r, s) = signature.split_at(size);
    Some(asn1::encode_integer_sequence(&[r, s]))
}
