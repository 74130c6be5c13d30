/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::cryptokey::{CryptoKey, Handle, KeyType, KeyUsage};
use crate::error::{Error, Fallible};
use crate::subtlecrypto::sha_operation::HashFunction;
use crate::subtlecrypto::{
    ALG_PBKDF2, KeyAlgorithmAndDerivatives, KeyFormat, SubtleKeyAlgorithm, SubtlePbkdf2Params,
};

/// <https://w3c.github.io/webcrypto/#pbkdf2-operations-derive-bits>
pub(crate) fn derive_bits(
    normalized_algorithm: &SubtlePbkdf2Params,
    key: &CryptoKey,
    length: Option<u32>,
) -> Fallible<Vec<u8>> {
    // Step 1. If length is null or is not a multiple of 8, then throw an OperationError.
    let Some(length) = length.filter(|length| length % 8 == 0) else {
        return Err(Error::Operation(Some(
            "The length is null or is not a multiple of 8".to_string(),
        )));
    };

    // Step 2. If the iterations member of normalizedAlgorithm is zero, then throw an
    // OperationError.
    if normalized_algorithm.iterations == 0 {
        return Err(Error::Operation(Some(
            "The iterations member of the algorithm is zero".to_string(),
        )));
    }

    // Step 3. If length is zero, return an empty byte sequence.
    if length == 0 {
        return Ok(Vec::new());
    }

    // Step 4. Let prf be the MAC Generation function described in Section 4 of [FIPS-198-1]
    // using the hash function described by the hash member of normalizedAlgorithm.
    let hash = normalized_algorithm.hash.hash_function()?;
    hash.warn_if_legacy(ALG_PBKDF2);

    // Step 5. Let result be the result of performing the PBKDF2 operation defined in Section 5.2
    // of [RFC8018] using prf as the pseudo-random function, PRF, the password represented by
    // [[handle]] internal slot of key as the password, P, the salt attribute of
    // normalizedAlgorithm as the salt, S, the value of the iterations attribute of
    // normalizedAlgorithm as the iteration count, c, and length divided by 8 as the intended key
    // length, dkLen.
    // Step 6. If the key derivation operation fails, then throw an OperationError.
    let Handle::Pbkdf2(password) = key.handle() else {
        return Err(Error::Operation(Some(
            "[[handle]] internal slot of key is not a PBKDF2 key".to_string(),
        )));
    };
    let mut result = vec![0; (length / 8) as usize];
    let salt = &normalized_algorithm.salt;
    let iterations = normalized_algorithm.iterations;
    match hash {
        HashFunction::Sha1 => pbkdf2_hmac::<Sha1>(password, salt, iterations, &mut result),
        HashFunction::Sha256 => pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut result),
        HashFunction::Sha384 => pbkdf2_hmac::<Sha384>(password, salt, iterations, &mut result),
        HashFunction::Sha512 => pbkdf2_hmac::<Sha512>(password, salt, iterations, &mut result),
    }

    // Step 7. Return result.
    Ok(result)
}

/// <https://w3c.github.io/webcrypto/#pbkdf2-operations-import-key>
pub(crate) fn import_key(
    format: KeyFormat,
    key_data: &[u8],
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    // Step 1. If format is not "raw", throw a NotSupportedError.
    if format != KeyFormat::Raw {
        return Err(Error::NotSupported(Some(format!(
            "Unsupported import key format for PBKDF2: {}",
            format.as_str()
        ))));
    }

    // Step 2. If usages contains a value that is not "deriveKey" or "deriveBits", then throw a
    // SyntaxError.
    if usages
        .iter()
        .any(|usage| !matches!(usage, KeyUsage::DeriveKey | KeyUsage::DeriveBits))
    {
        return Err(Error::Syntax(Some(
            "Usages contains an entry which is not \"deriveKey\" or \"deriveBits\"".to_string(),
        )));
    }

    // Step 3. If extractable is not false, then throw a SyntaxError.
    if extractable {
        return Err(Error::Syntax(Some("PBKDF2 keys are not extractable".to_string())));
    }

    // Step 4. Let key be a new CryptoKey representing keyData.
    // Step 5. Set the [[type]] internal slot of key to "secret".
    // Step 6. Let algorithm be a new KeyAlgorithm object.
    // Step 7. Set the name attribute of algorithm to "PBKDF2".
    // Step 8. Set the [[algorithm]] internal slot of key to algorithm.
    let key = CryptoKey::new(
        KeyType::Secret,
        extractable,
        KeyAlgorithmAndDerivatives::KeyAlgorithm(SubtleKeyAlgorithm {
            name: ALG_PBKDF2.to_string(),
        }),
        usages,
        Handle::Pbkdf2(key_data.to_vec()),
    );

    // Step 9. Return key.
    Ok(key)
}

/// <https://w3c.github.io/webcrypto/#pbkdf2-operations-get-key-length>
pub(crate) fn get_key_length() -> Fallible<Option<u32>> {
    // Step 1. Return null.
    Ok(None)
}
