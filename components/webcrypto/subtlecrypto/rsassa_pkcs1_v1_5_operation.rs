/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use rsa::Pkcs1v15Sign;
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::cryptokey::{CryptoKey, CryptoKeyPair, Handle, KeyType, KeyUsage};
use crate::error::{Error, Fallible};
use crate::subtlecrypto::rsa_common::{self, RsaAlgorithm};
use crate::subtlecrypto::sha_operation::HashFunction;
use crate::subtlecrypto::{
    ALG_RSASSA_PKCS1_V1_5, ExportedKey, KeyFormat, SubtleRsaHashedImportParams,
    SubtleRsaHashedKeyGenParams,
};

fn padding_scheme(hash: HashFunction) -> Pkcs1v15Sign {
    match hash {
        HashFunction::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
        HashFunction::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        HashFunction::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        HashFunction::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}

/// <https://w3c.github.io/webcrypto/#rsassa-pkcs1-operations-sign>
pub(crate) fn sign(key: &CryptoKey, message: &[u8]) -> Fallible<Vec<u8>> {
    // Step 1. If the [[type]] internal slot of key is not "private", then throw an
    // InvalidAccessError.
    if key.key_type() != KeyType::Private {
        return Err(Error::InvalidAccess(Some(
            "[[type]] internal slot of key is not \"private\"".to_string(),
        )));
    }

    // Step 2. Perform the signature generation operation defined in Section 8.2 of [RFC3447] with
    // the key represented by the [[handle]] internal slot of key as the signer's private key and
    // message as M and using the hash function specified in the hash attribute of the
    // [[algorithm]] internal slot of key as the Hash option for the EMSA-PKCS1-v1_5 encoding
    // method.
    // Step 3. If performing the operation results in an error, then throw an OperationError.
    // Step 4. Let signature be the value S that results from performing the operation.
    let Handle::RsaPrivateKey(private_key) = key.handle() else {
        return Err(Error::Operation(Some(
            "[[handle]] internal slot of key is not an RSA private key".to_string(),
        )));
    };
    let hash = rsa_common::key_hash_function(key)?;
    hash.warn_if_legacy(ALG_RSASSA_PKCS1_V1_5);
    let signature = private_key
        .sign(padding_scheme(hash), &hash.digest(message))
        .map_err(|_| {
            Error::Operation(Some(
                "RSASSA-PKCS1-v1_5 failed to sign message".to_string(),
            ))
        })?;

    // Step 5. Return signature.
    Ok(signature)
}

/// <https://w3c.github.io/webcrypto/#rsassa-pkcs1-operations-verify>
pub(crate) fn verify(key: &CryptoKey, message: &[u8], signature: &[u8]) -> Fallible<bool> {
    // Step 1. If the [[type]] internal slot of key is not "public", then throw an
    // InvalidAccessError.
    if key.key_type() != KeyType::Public {
        return Err(Error::InvalidAccess(Some(
            "[[type]] internal slot of key is not \"public\"".to_string(),
        )));
    }

    // Step 2. Perform the signature verification operation defined in Section 8.2 of [RFC3447]
    // with the key represented by the [[handle]] internal slot of key as the signer's RSA public
    // key and message as M and signature as S and using the hash function specified in the hash
    // attribute of the [[algorithm]] internal slot of key as the Hash option for the
    // EMSA-PKCS1-v1_5 encoding method.
    // Step 3. Let result be a boolean with value true if the result of the operation was "valid
    // signature" and the value false otherwise.
    let Handle::RsaPublicKey(public_key) = key.handle() else {
        return Err(Error::Operation(Some(
            "[[handle]] internal slot of key is not an RSA public key".to_string(),
        )));
    };
    let hash = rsa_common::key_hash_function(key)?;
    hash.warn_if_legacy(ALG_RSASSA_PKCS1_V1_5);
    let result = public_key
        .verify(padding_scheme(hash), &hash.digest(message), signature)
        .is_ok();

    // Step 4. Return result.
    Ok(result)
}

/// <https://w3c.github.io/webcrypto/#rsassa-pkcs1-operations-generate-key>
pub(crate) fn generate_key(
    normalized_algorithm: &SubtleRsaHashedKeyGenParams,
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<CryptoKeyPair> {
    rsa_common::generate_key(
        RsaAlgorithm::RsassaPkcs1V1_5,
        normalized_algorithm,
        extractable,
        usages,
    )
}

/// <https://w3c.github.io/webcrypto/#rsassa-pkcs1-operations-import-key>
pub(crate) fn import_key(
    normalized_algorithm: &SubtleRsaHashedImportParams,
    format: KeyFormat,
    key_data: &[u8],
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    rsa_common::import_key(
        RsaAlgorithm::RsassaPkcs1V1_5,
        normalized_algorithm,
        format,
        key_data,
        extractable,
        usages,
    )
}

/// <https://w3c.github.io/webcrypto/#rsassa-pkcs1-operations-export-key>
pub(crate) fn export_key(format: KeyFormat, key: &CryptoKey) -> Fallible<ExportedKey> {
    rsa_common::export_key(RsaAlgorithm::RsassaPkcs1V1_5, format, key)
}
