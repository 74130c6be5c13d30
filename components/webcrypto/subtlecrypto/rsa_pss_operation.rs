/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use pkcs8::rand_core::OsRng;
use rsa::Pss;
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::cryptokey::{CryptoKey, CryptoKeyPair, Handle, KeyType, KeyUsage};
use crate::error::{Error, Fallible};
use crate::subtlecrypto::rsa_common::{self, RsaAlgorithm};
use crate::subtlecrypto::sha_operation::HashFunction;
use crate::subtlecrypto::{
    ALG_RSA_PSS, ExportedKey, KeyFormat, SubtleRsaHashedImportParams,
    SubtleRsaHashedKeyGenParams, SubtleRsaPssParams,
};

fn padding_scheme(hash: HashFunction, salt_length: u32) -> Pss {
    let salt_length = salt_length as usize;
    match hash {
        HashFunction::Sha1 => Pss::new_with_salt::<Sha1>(salt_length),
        HashFunction::Sha256 => Pss::new_with_salt::<Sha256>(salt_length),
        HashFunction::Sha384 => Pss::new_with_salt::<Sha384>(salt_length),
        HashFunction::Sha512 => Pss::new_with_salt::<Sha512>(salt_length),
    }
}

/// <https://w3c.github.io/webcrypto/#rsa-pss-operations-sign>
pub(crate) fn sign(
    normalized_algorithm: &SubtleRsaPssParams,
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

    // Step 2. Perform the signature generation operation defined in Section 8.1 of [RFC3447] with
    // the key represented by the [[handle]] internal slot of key as the signer's private key, K,
    // and message as the message to be signed, M, and using the hash function specified by the
    // hash attribute of the [[algorithm]] internal slot of key as the Hash option, MGF1 (defined
    // in Section B.2.1 of [RFC3447]) as the MGF option and the saltLength member of
    // normalizedAlgorithm as the salt length option for the EMSA-PSS-ENCODE operation.
    // Step 3. If performing the operation results in an error, then throw an OperationError.
    // Step 4. Let signature be the signature, S, that results from performing the operation.
    let Handle::RsaPrivateKey(private_key) = key.handle() else {
        return Err(Error::Operation(Some(
            "[[handle]] internal slot of key is not an RSA private key".to_string(),
        )));
    };
    let hash = rsa_common::key_hash_function(key)?;
    hash.warn_if_legacy(ALG_RSA_PSS);
    let signature = private_key
        .sign_with_rng(
            &mut OsRng,
            padding_scheme(hash, normalized_algorithm.salt_length),
            &hash.digest(message),
        )
        .map_err(|_| Error::Operation(Some("RSA-PSS failed to sign message".to_string())))?;

    // Step 5. Return signature.
    Ok(signature)
}

/// <https://w3c.github.io/webcrypto/#rsa-pss-operations-verify>
pub(crate) fn verify(
    normalized_algorithm: &SubtleRsaPssParams,
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

    // Step 2. Perform the signature verification operation defined in Section 8.1 of [RFC3447]
    // with the key represented by the [[handle]] internal slot of key as the signer's RSA public
    // key and message as M and signature as S and using the hash function specified by the hash
    // attribute of the [[algorithm]] internal slot of key as the Hash option, MGF1 (defined in
    // Section B.2.1 of [RFC3447]) as the MGF option and the saltLength member of
    // normalizedAlgorithm as the salt length option for the EMSA-PSS-VERIFY operation.
    // Step 3. Let result be a boolean with the value true if the result of the operation was
    // "valid signature" and the value false otherwise.
    let Handle::RsaPublicKey(public_key) = key.handle() else {
        return Err(Error::Operation(Some(
            "[[handle]] internal slot of key is not an RSA public key".to_string(),
        )));
    };
    let hash = rsa_common::key_hash_function(key)?;
    hash.warn_if_legacy(ALG_RSA_PSS);
    let result = public_key
        .verify(
            padding_scheme(hash, normalized_algorithm.salt_length),
            &hash.digest(message),
            signature,
        )
        .is_ok();

    // Step 4. Return result.
    Ok(result)
}

/// <https://w3c.github.io/webcrypto/#rsa-pss-operations-generate-key>
pub(crate) fn generate_key(
    normalized_algorithm: &SubtleRsaHashedKeyGenParams,
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<CryptoKeyPair> {
    rsa_common::generate_key(
        RsaAlgorithm::RsaPss,
        normalized_algorithm,
        extractable,
        usages,
    )
}

/// <https://w3c.github.io/webcrypto/#rsa-pss-operations-import-key>
pub(crate) fn import_key(
    normalized_algorithm: &SubtleRsaHashedImportParams,
    format: KeyFormat,
    key_data: &[u8],
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    rsa_common::import_key(
        RsaAlgorithm::RsaPss,
        normalized_algorithm,
        format,
        key_data,
        extractable,
        usages,
    )
}

/// <https://w3c.github.io/webcrypto/#rsa-pss-operations-export-key>
pub(crate) fn export_key(format: KeyFormat, key: &CryptoKey) -> Fallible<ExportedKey> {
    rsa_common::export_key(RsaAlgorithm::RsaPss, format, key)
}
