/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};

use crate::cryptokey::{CryptoKey, Handle, KeyUsage};
use crate::error::{Error, Fallible};
use crate::subtlecrypto::aes_common::{self, AesAlgorithm};
use crate::subtlecrypto::{
    ExportedKey, KeyFormat, SubtleAesCbcParams, SubtleAesDerivedKeyParams, SubtleAesKeyGenParams,
};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes192CbcEnc = cbc::Encryptor<Aes192>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes192CbcDec = cbc::Decryptor<Aes192>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// <https://w3c.github.io/webcrypto/#aes-cbc-operations-encrypt>
pub(crate) fn encrypt(
    normalized_algorithm: &SubtleAesCbcParams,
    key: &CryptoKey,
    plaintext: &[u8],
) -> Fallible<Vec<u8>> {
    // Step 1. If the iv member of normalizedAlgorithm does not have a length of 16 bytes, then
    // throw an OperationError.
    if normalized_algorithm.iv.len() != 16 {
        return Err(Error::Operation(Some(
            "The initialization vector length is not 16 bytes".to_string(),
        )));
    }
    let iv = GenericArray::from_slice(&normalized_algorithm.iv);

    // Step 2. Let paddedPlaintext be the result of adding padding octets to plaintext according
    // to the procedure defined in Section 10.3 of [RFC2315], step 2, with a value of k of 16.
    // Step 3. Let ciphertext be the result of performing the CBC Encryption operation described
    // in Section 6.2 of [NIST-SP800-38A] using AES as the block cipher, the iv member of
    // normalizedAlgorithm as the IV input parameter and paddedPlaintext as the input plaintext.
    let ciphertext = match key.handle() {
        Handle::Aes128Key(key) => {
            Aes128CbcEnc::new(key, iv).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
        },
        Handle::Aes192Key(key) => {
            Aes192CbcEnc::new(key, iv).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
        },
        Handle::Aes256Key(key) => {
            Aes256CbcEnc::new(key, iv).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
        },
        _ => {
            return Err(Error::Operation(Some(
                "The key handle is not an AES key".to_string(),
            )));
        },
    };

    // Step 4. Return ciphertext.
    Ok(ciphertext)
}

/// <https://w3c.github.io/webcrypto/#aes-cbc-operations-decrypt>
pub(crate) fn decrypt(
    normalized_algorithm: &SubtleAesCbcParams,
    key: &CryptoKey,
    ciphertext: &[u8],
) -> Fallible<Vec<u8>> {
    // Step 1. If the iv member of normalizedAlgorithm does not have a length of 16 bytes, then
    // throw an OperationError.
    if normalized_algorithm.iv.len() != 16 {
        return Err(Error::Operation(Some(
            "The initialization vector length is not 16 bytes".to_string(),
        )));
    }
    let iv = GenericArray::from_slice(&normalized_algorithm.iv);

    // Step 2. If the length of ciphertext is zero or is not a multiple of 16 bytes, then throw an
    // OperationError.
    if ciphertext.is_empty() || ciphertext.len() % 16 != 0 {
        return Err(Error::Operation(Some(
            "The ciphertext length is zero or not a multiple of 16 bytes".to_string(),
        )));
    }

    // Step 3. Let paddedPlaintext be the result of performing the CBC Decryption operation
    // described in Section 6.2 of [NIST-SP800-38A] using AES as the block cipher, the iv member
    // of normalizedAlgorithm as the IV input parameter and ciphertext as the input ciphertext.
    // Step 4. Let p be the value of the last octet of paddedPlaintext.
    // Step 5. If p is zero or greater than 16, or if any of the last p octets of paddedPlaintext
    // have a value which is not p, then throw an OperationError.
    // Step 6. Let plaintext be the result of removing p octets from the end of paddedPlaintext.
    let plaintext = match key.handle() {
        Handle::Aes128Key(key) => {
            Aes128CbcDec::new(key, iv).decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        },
        Handle::Aes192Key(key) => {
            Aes192CbcDec::new(key, iv).decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        },
        Handle::Aes256Key(key) => {
            Aes256CbcDec::new(key, iv).decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        },
        _ => {
            return Err(Error::Operation(Some(
                "The key handle is not an AES key".to_string(),
            )));
        },
    }
    .map_err(|_| Error::Operation(Some("Invalid padding in decrypted data".to_string())))?;

    // Step 7. Return plaintext.
    Ok(plaintext)
}

/// <https://w3c.github.io/webcrypto/#aes-cbc-operations-generate-key>
pub(crate) fn generate_key(
    normalized_algorithm: &SubtleAesKeyGenParams,
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    aes_common::generate_key(
        AesAlgorithm::AesCbc,
        normalized_algorithm,
        extractable,
        usages,
    )
}

/// <https://w3c.github.io/webcrypto/#aes-cbc-operations-import-key>
pub(crate) fn import_key(
    format: KeyFormat,
    key_data: &[u8],
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    // Step 1. Let keyData be the key data to be imported.

    // Step 2. If usages contains an entry which is not one of "encrypt", "decrypt", "wrapKey" or
    // "unwrapKey", then throw a SyntaxError.
    aes_common::check_import_usages(AesAlgorithm::AesCbc, &usages)?;

    // Step 3.
    let data = aes_common::import_key_from_key_data(
        AesAlgorithm::AesCbc,
        format,
        key_data,
        extractable,
        &usages,
    )?;

    // Step 4. Let key be a new CryptoKey object representing an AES key with value data.
    // Step 5. Let algorithm be a new AesKeyAlgorithm.
    // Step 6. Set the name attribute of algorithm to "AES-CBC".
    // Step 7. Set the length attribute of algorithm to the length, in bits, of data.
    // Step 8. Set the [[algorithm]] internal slot of key to algorithm.
    // Step 9. Return key.
    aes_common::create_key(AesAlgorithm::AesCbc, &data, extractable, usages)
}

/// <https://w3c.github.io/webcrypto/#aes-cbc-operations-export-key>
pub(crate) fn export_key(format: KeyFormat, key: &CryptoKey) -> Fallible<ExportedKey> {
    aes_common::export_key(AesAlgorithm::AesCbc, format, key)
}

/// <https://w3c.github.io/webcrypto/#aes-cbc-operations-get-key-length>
pub(crate) fn get_key_length(
    normalized_derived_key_algorithm: &SubtleAesDerivedKeyParams,
) -> Fallible<Option<u32>> {
    aes_common::get_key_length(normalized_derived_key_algorithm)
}
