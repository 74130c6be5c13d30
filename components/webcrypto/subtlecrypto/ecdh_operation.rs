/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use elliptic_curve::ecdh::diffie_hellman;

use crate::cryptokey::{CryptoKey, CryptoKeyPair, Handle, KeyType, KeyUsage};
use crate::error::{Error, Fallible};
use crate::subtlecrypto::ec_common::{self, EcAlgorithm};
use crate::subtlecrypto::{
    ExportedKey, KeyFormat, SubtleEcKeyGenParams, SubtleEcKeyImportParams,
    SubtleEcdhKeyDeriveParams,
};

/// <https://w3c.github.io/webcrypto/#ecdh-operations-derive-bits>
pub(crate) fn derive_bits(
    normalized_algorithm: &SubtleEcdhKeyDeriveParams,
    key: &CryptoKey,
    length: Option<u32>,
) -> Fallible<Vec<u8>> {
    // Step 1. If the [[type]] internal slot of key is not "private", then throw an
    // InvalidAccessError.
    if key.key_type() != KeyType::Private {
        return Err(Error::InvalidAccess(Some(
            "[[type]] internal slot of key is not \"private\"".to_string(),
        )));
    }

    // Step 2. Let publicKey be the public member of normalizedAlgorithm.
    let public_key = &normalized_algorithm.public;

    // Step 3. If the [[type]] internal slot of publicKey is not "public", then throw an
    // InvalidAccessError.
    if public_key.key_type() != KeyType::Public {
        return Err(Error::InvalidAccess(Some(
            "[[type]] internal slot of public key is not \"public\"".to_string(),
        )));
    }

    // Step 4. If the name attribute of the [[algorithm]] internal slot of publicKey is not equal
    // to the name property of the [[algorithm]] internal slot of key, then throw an
    // InvalidAccessError.
    if public_key.algorithm().name() != key.algorithm().name() {
        return Err(Error::InvalidAccess(Some(
            "The algorithm of the public key does not match the algorithm of key".to_string(),
        )));
    }

    // Step 5. If the namedCurve property of the [[algorithm]] internal slot of publicKey is not
    // equal to the namedCurve property of the [[algorithm]] internal slot of key, then throw an
    // InvalidAccessError.
    if ec_common::key_named_curve(public_key)? != ec_common::key_named_curve(key)? {
        return Err(Error::InvalidAccess(Some(
            "The named curve of the public key does not match the named curve of key"
                .to_string(),
        )));
    }

    // Step 6.
    // If the namedCurve property of the [[algorithm]] internal slot of key is "P-256", "P-384"
    // or "P-521":
    //     Step 6.1. Perform the ECDH primitive specified in [RFC6090] Section 4 with key as the
    //     EC private key d and the EC public key represented by the [[handle]] internal slot of
    //     publicKey as the EC public key.
    //     Step 6.2. Let secret be a byte sequence containing the result of applying the field
    //     element to octet string conversion defined in Section 6.2 of [RFC6090] to the output of
    //     the ECDH primitive.
    // If the namedCurve property of the [[algorithm]] internal slot of key is a value specified
    // in an applicable specification that specifies the use of that value with ECDH:
    //     Perform the ECDH derivation steps specified in that specification, passing in key and
    //     publicKey and resulting in secret.
    // Step 7. If performing the operation results in an error, then throw a OperationError.
    let secret = match (key.handle(), public_key.handle()) {
        (Handle::P256PrivateKey(private_key), Handle::P256PublicKey(public_key)) => {
            diffie_hellman(private_key.to_nonzero_scalar(), public_key.as_affine())
                .raw_secret_bytes()
                .to_vec()
        },
        (Handle::P384PrivateKey(private_key), Handle::P384PublicKey(public_key)) => {
            diffie_hellman(private_key.to_nonzero_scalar(), public_key.as_affine())
                .raw_secret_bytes()
                .to_vec()
        },
        (Handle::P521PrivateKey(private_key), Handle::P521PublicKey(public_key)) => {
            diffie_hellman(private_key.to_nonzero_scalar(), public_key.as_affine())
                .raw_secret_bytes()
                .to_vec()
        },
        (Handle::K256PrivateKey(private_key), Handle::K256PublicKey(public_key)) => {
            diffie_hellman(private_key.to_nonzero_scalar(), public_key.as_affine())
                .raw_secret_bytes()
                .to_vec()
        },
        _ => {
            return Err(Error::Operation(Some(
                "The key handles are not a matching ECDH key pair".to_string(),
            )));
        },
    };

    // Step 8.
    // If length is null:
    //     Return secret
    // Otherwise:
    //     If the length of secret in bits is less than length:
    //         throw an OperationError.
    //     Otherwise:
    //         Return a byte sequence containing the first length bits of secret.
    truncate_secret(secret, length)
}

/// <https://w3c.github.io/webcrypto/#ecdh-operations-generate-key>
pub(crate) fn generate_key(
    normalized_algorithm: &SubtleEcKeyGenParams,
    extractable: bool,
    usages: Vec<KeyUsage>,
    k256_enabled: bool,
) -> Fallible<CryptoKeyPair> {
    ec_common::generate_key(
        EcAlgorithm::Ecdh { k256_enabled },
        normalized_algorithm,
        extractable,
        usages,
    )
}

/// <https://w3c.github.io/webcrypto/#ecdh-operations-import-key>
pub(crate) fn import_key(
    normalized_algorithm: &SubtleEcKeyImportParams,
    format: KeyFormat,
    key_data: &[u8],
    extractable: bool,
    usages: Vec<KeyUsage>,
    k256_enabled: bool,
) -> Fallible<Arc<CryptoKey>> {
    ec_common::import_key(
        EcAlgorithm::Ecdh { k256_enabled },
        normalized_algorithm,
        format,
        key_data,
        extractable,
        usages,
    )
}

/// <https://w3c.github.io/webcrypto/#ecdh-operations-export-key>
pub(crate) fn export_key(format: KeyFormat, key: &CryptoKey) -> Fallible<ExportedKey> {
    ec_common::export_key(format, key)
}

/// The first `length` bits of `secret`, with the unused bits of the last byte cleared.
fn truncate_secret(mut secret: Vec<u8>, length: Option<u32>) -> Fallible<Vec<u8>> {
    let Some(length) = length else {
        return Ok(secret);
    };
    let length = length as usize;
    if secret.len() * 8 < length {
        return Err(Error::Operation(Some(format!(
            "The shared secret is shorter than {length} bits"
        ))));
    }
    secret.truncate(length.div_ceil(8));
    if length % 8 != 0 {
        if let Some(last) = secret.last_mut() {
            *last &= 0xff << (8 - length % 8);
        }
    }
    Ok(secret)
}
