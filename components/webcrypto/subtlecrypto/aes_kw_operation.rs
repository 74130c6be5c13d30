/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use aes_kw::{KekAes128, KekAes192, KekAes256};

use crate::cryptokey::{CryptoKey, Handle, KeyUsage};
use crate::error::{Error, Fallible};
use crate::subtlecrypto::aes_common::{self, AesAlgorithm};
use crate::subtlecrypto::{
    ExportedKey, KeyFormat, SubtleAesDerivedKeyParams, SubtleAesKeyGenParams,
};

/// Length of a semiblock of the key wrap algorithm, in bytes.
const SEMIBLOCK_LENGTH: usize = 8;

/// <https://w3c.github.io/webcrypto/#aes-kw-operations-wrap-key>
pub(crate) fn wrap_key(key: &CryptoKey, plaintext: &[u8]) -> Fallible<Vec<u8>> {
    // Step 1. If plaintext is not a multiple of 64 bits in length, then throw an OperationError.
    // NOTE: [RFC3394] also needs at least two semiblocks of plaintext.
    if plaintext.len() % SEMIBLOCK_LENGTH != 0 || plaintext.len() < 2 * SEMIBLOCK_LENGTH {
        return Err(Error::Operation(Some(
            "The plaintext is not a multiple of 64 bits of at least 128 bits".to_string(),
        )));
    }

    // Step 2. Let ciphertext be the result of performing the Key Wrap operation described in
    // Section 2.2.1 of [RFC3394] with plaintext as the plaintext to be wrapped and using the
    // default Initial Value defined in Section 2.2.3.1 of the same document.
    // Step 3. If the previous step failed, then throw an OperationError.
    let ciphertext = match key.handle() {
        Handle::Aes128Key(key) => KekAes128::new(key).wrap_vec(plaintext),
        Handle::Aes192Key(key) => KekAes192::new(key).wrap_vec(plaintext),
        Handle::Aes256Key(key) => KekAes256::new(key).wrap_vec(plaintext),
        _ => {
            return Err(Error::Operation(Some(
                "The key handle is not an AES key".to_string(),
            )));
        },
    }
    .map_err(|error| Error::Operation(Some(format!("AES-KW failed to wrap key: {error}"))))?;

    // Step 4. Return ciphertext.
    Ok(ciphertext)
}

/// <https://w3c.github.io/webcrypto/#aes-kw-operations-unwrap-key>
pub(crate) fn unwrap_key(key: &CryptoKey, ciphertext: &[u8]) -> Fallible<Vec<u8>> {
    if ciphertext.len() % SEMIBLOCK_LENGTH != 0 || ciphertext.len() < 3 * SEMIBLOCK_LENGTH {
        return Err(Error::Operation(Some(
            "The ciphertext is not a multiple of 64 bits of at least 192 bits".to_string(),
        )));
    }

    // Step 1. Let plaintext be the result of performing the Key Unwrap operation described in
    // Section 2.2.2 of [RFC3394] with ciphertext as the input ciphertext and using the default
    // Initial Value defined in Section 2.2.3.1 of the same document.
    // Step 2. If the previous step failed, then throw an OperationError.
    let plaintext = match key.handle() {
        Handle::Aes128Key(key) => KekAes128::new(key).unwrap_vec(ciphertext),
        Handle::Aes192Key(key) => KekAes192::new(key).unwrap_vec(ciphertext),
        Handle::Aes256Key(key) => KekAes256::new(key).unwrap_vec(ciphertext),
        _ => {
            return Err(Error::Operation(Some(
                "The key handle is not an AES key".to_string(),
            )));
        },
    }
    .map_err(|error| Error::Operation(Some(format!("AES-KW failed to unwrap key: {error}"))))?;

    // Step 3. Return plaintext.
    Ok(plaintext)
}

/// <https://w3c.github.io/webcrypto/#aes-kw-operations-generate-key>
pub(crate) fn generate_key(
    normalized_algorithm: &SubtleAesKeyGenParams,
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    aes_common::generate_key(
        AesAlgorithm::AesKw,
        normalized_algorithm,
        extractable,
        usages,
    )
}

/// <https://w3c.github.io/webcrypto/#aes-kw-operations-import-key>
pub(crate) fn import_key(
    format: KeyFormat,
    key_data: &[u8],
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    // Step 1. If usages contains an entry which is not one of "wrapKey" or "unwrapKey", then
    // throw a SyntaxError.
    aes_common::check_import_usages(AesAlgorithm::AesKw, &usages)?;

    // Step 2.
    let data = aes_common::import_key_from_key_data(
        AesAlgorithm::AesKw,
        format,
        key_data,
        extractable,
        &usages,
    )?;

    // Step 3 - 8.
    aes_common::create_key(AesAlgorithm::AesKw, &data, extractable, usages)
}

/// <https://w3c.github.io/webcrypto/#aes-kw-operations-export-key>
pub(crate) fn export_key(format: KeyFormat, key: &CryptoKey) -> Fallible<ExportedKey> {
    aes_common::export_key(AesAlgorithm::AesKw, format, key)
}

/// <https://w3c.github.io/webcrypto/#aes-kw-operations-get-key-length>
pub(crate) fn get_key_length(
    normalized_derived_key_algorithm: &SubtleAesDerivedKeyParams,
) -> Fallible<Option<u32>> {
    aes_common::get_key_length(normalized_derived_key_algorithm)
}
