/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use digest::Digest;
use pkcs8::rand_core::{OsRng, RngCore};
use rsa::BigUint;
use rsa::hazmat::{rsa_decrypt_and_check, rsa_encrypt};
use rsa::traits::PublicKeyParts;
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

use crate::cryptokey::{CryptoKey, CryptoKeyPair, Handle, KeyType, KeyUsage};
use crate::error::{Error, Fallible};
use crate::subtlecrypto::rsa_common::{self, RsaAlgorithm};
use crate::subtlecrypto::sha_operation::HashFunction;
use crate::subtlecrypto::{
    ExportedKey, KeyFormat, SubtleRsaHashedImportParams, SubtleRsaHashedKeyGenParams,
    SubtleRsaOaepParams,
};

/// MGF1 of [RFC8017] Appendix B.2.1, XORed into `out`.
fn mgf1_xor<D: Digest>(out: &mut [u8], seed: &[u8]) {
    for (counter, chunk) in out.chunks_mut(<D as Digest>::output_size()).enumerate() {
        let mask = D::new()
            .chain_update(seed)
            .chain_update((counter as u32).to_be_bytes())
            .finalize();
        chunk
            .iter_mut()
            .zip(mask.iter())
            .for_each(|(byte, mask)| *byte ^= mask);
    }
}

/// EME-OAEP encoding of [RFC8017] Section 7.1.1 step 2, for a modulus of `k` bytes.
fn oaep_encode<D: Digest>(message: &[u8], label: &[u8], k: usize) -> Fallible<Vec<u8>> {
    let hash_length = <D as Digest>::output_size();
    if message.len() + 2 * hash_length + 2 > k {
        return Err(Error::Operation(Some(format!(
            "RSA-OAEP can encrypt at most {} bytes with this key",
            k.saturating_sub(2 * hash_length + 2)
        ))));
    }

    // EM = 0x00 || maskedSeed || maskedDB, where DB = lHash || PS || 0x01 || M.
    let mut encoded = vec![0; k];
    let (seed, data_block) = encoded[1..].split_at_mut(hash_length);
    OsRng.fill_bytes(seed);
    data_block[..hash_length].copy_from_slice(&D::digest(label));
    let message_start = data_block.len() - message.len();
    data_block[message_start - 1] = 0x01;
    data_block[message_start..].copy_from_slice(message);

    mgf1_xor::<D>(data_block, seed);
    mgf1_xor::<D>(seed, data_block);
    Ok(encoded)
}

/// EME-OAEP decoding of [RFC8017] Section 7.1.2 step 3. The padding checks do not branch on
/// the encoded message.
fn oaep_decode<D: Digest>(encoded: &mut [u8], label: &[u8]) -> Fallible<Vec<u8>> {
    let hash_length = <D as Digest>::output_size();
    if encoded.len() < 2 * hash_length + 2 {
        return Err(Error::Operation(Some(
            "The RSA key is too small for RSA-OAEP with this hash".to_string(),
        )));
    }

    let (first, rest) = encoded.split_at_mut(1);
    let (seed, data_block) = rest.split_at_mut(hash_length);
    mgf1_xor::<D>(seed, data_block);
    mgf1_xor::<D>(data_block, seed);

    let mut valid = first[0].ct_eq(&0) & data_block[..hash_length].ct_eq(&D::digest(label)[..]);
    let mut looking = Choice::from(1);
    let mut separator = 0u32;
    for (index, byte) in data_block[hash_length..].iter().enumerate() {
        let is_separator = byte.ct_eq(&0x01);
        valid &= !looking | is_separator | byte.ct_eq(&0);
        separator.conditional_assign(&(index as u32), looking & is_separator);
        looking &= !is_separator;
    }
    valid &= !looking;

    if !bool::from(valid) {
        return Err(Error::Operation(Some(
            "RSA-OAEP failed to decrypt ciphertext".to_string(),
        )));
    }
    Ok(data_block[hash_length + separator as usize + 1..].to_vec())
}

/// The big-endian encoding of `value` left-padded with zeros to `width` bytes.
fn to_fixed_width(value: &BigUint, width: usize) -> Fallible<Vec<u8>> {
    let bytes = value.to_bytes_be();
    if bytes.len() > width {
        return Err(Error::Operation(Some(
            "The RSA result is larger than the modulus".to_string(),
        )));
    }
    let mut output = vec![0; width];
    output[width - bytes.len()..].copy_from_slice(&bytes);
    Ok(output)
}

/// <https://w3c.github.io/webcrypto/#rsa-oaep-operations-encrypt>
pub(crate) fn encrypt(
    normalized_algorithm: &SubtleRsaOaepParams,
    key: &CryptoKey,
    plaintext: &[u8],
) -> Fallible<Vec<u8>> {
    // Step 1. If the [[type]] internal slot of key is not "public", then throw an
    // InvalidAccessError.
    if key.key_type() != KeyType::Public {
        return Err(Error::InvalidAccess(Some(
            "[[type]] internal slot of key is not \"public\"".to_string(),
        )));
    }

    // Step 2. Let label be the label member of normalizedAlgorithm or the empty byte sequence if
    // the label member of normalizedAlgorithm is not present.
    // Step 3. Perform the encryption operation defined in Section 7.1 of [RFC3447] with the key
    // represented by key as the recipient's RSA public key, plaintext as the message to be
    // encrypted, M and label as the label, L, and with the hash function specified by the hash
    // attribute of the [[algorithm]] internal slot of key as the Hash option and MGF1 (defined in
    // Section B.2.1 of [RFC3447]) as the MGF option.
    // Step 4. If performing the operation results in an error, then throw an OperationError.
    // Step 5. Let ciphertext be the value C that results from performing the operation.
    let Handle::RsaPublicKey(public_key) = key.handle() else {
        return Err(Error::Operation(Some(
            "[[handle]] internal slot of key is not an RSA public key".to_string(),
        )));
    };
    let label = normalized_algorithm.label.as_deref().unwrap_or_default();
    let k = public_key.size();
    let encoded = match rsa_common::key_hash_function(key)? {
        HashFunction::Sha1 => oaep_encode::<Sha1>(plaintext, label, k)?,
        HashFunction::Sha256 => oaep_encode::<Sha256>(plaintext, label, k)?,
        HashFunction::Sha384 => oaep_encode::<Sha384>(plaintext, label, k)?,
        HashFunction::Sha512 => oaep_encode::<Sha512>(plaintext, label, k)?,
    };
    let ciphertext = rsa_encrypt(public_key, &BigUint::from_bytes_be(&encoded))
        .map_err(|_| Error::Operation(Some("RSA-OAEP failed to encrypt plaintext".to_string())))?;
    let ciphertext = to_fixed_width(&ciphertext, k)?;

    // Step 6. Return ciphertext.
    Ok(ciphertext)
}

/// <https://w3c.github.io/webcrypto/#rsa-oaep-operations-decrypt>
pub(crate) fn decrypt(
    normalized_algorithm: &SubtleRsaOaepParams,
    key: &CryptoKey,
    ciphertext: &[u8],
) -> Fallible<Vec<u8>> {
    // Step 1. If the [[type]] internal slot of key is not "private", then throw an
    // InvalidAccessError.
    if key.key_type() != KeyType::Private {
        return Err(Error::InvalidAccess(Some(
            "[[type]] internal slot of key is not \"private\"".to_string(),
        )));
    }

    // Step 2. Let label be the label member of normalizedAlgorithm or the empty byte sequence if
    // the label member of normalizedAlgorithm is not present.
    // Step 3. Perform the decryption operation defined in Section 7.1 of [RFC3447] with the key
    // represented by key as the recipient's RSA private key, ciphertext as the ciphertext to be
    // decrypted, C, and label as the label, L, and with the hash function specified by the hash
    // attribute of the [[algorithm]] internal slot of key as the Hash option and MGF1 (defined in
    // Section B.2.1 of [RFC3447]) as the MGF option.
    // Step 4. If performing the operation results in an error, then throw an OperationError.
    // Step 5. Let plaintext the value M that results from performing the operation.
    let Handle::RsaPrivateKey(private_key) = key.handle() else {
        return Err(Error::Operation(Some(
            "[[handle]] internal slot of key is not an RSA private key".to_string(),
        )));
    };
    let label = normalized_algorithm.label.as_deref().unwrap_or_default();
    let k = private_key.size();
    if ciphertext.len() != k {
        return Err(Error::Operation(Some(
            "The RSA-OAEP ciphertext does not match the modulus length".to_string(),
        )));
    }
    let encoded = rsa_decrypt_and_check(
        private_key,
        Some(&mut OsRng),
        &BigUint::from_bytes_be(ciphertext),
    )
    .map_err(|_| Error::Operation(Some("RSA-OAEP failed to decrypt ciphertext".to_string())))?;
    let mut encoded = to_fixed_width(&encoded, k)?;
    let plaintext = match rsa_common::key_hash_function(key)? {
        HashFunction::Sha1 => oaep_decode::<Sha1>(&mut encoded, label)?,
        HashFunction::Sha256 => oaep_decode::<Sha256>(&mut encoded, label)?,
        HashFunction::Sha384 => oaep_decode::<Sha384>(&mut encoded, label)?,
        HashFunction::Sha512 => oaep_decode::<Sha512>(&mut encoded, label)?,
    };

    // Step 6. Return plaintext.
    Ok(plaintext)
}

/// <https://w3c.github.io/webcrypto/#rsa-oaep-operations-generate-key>
pub(crate) fn generate_key(
    normalized_algorithm: &SubtleRsaHashedKeyGenParams,
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<CryptoKeyPair> {
    rsa_common::generate_key(
        RsaAlgorithm::RsaOaep,
        normalized_algorithm,
        extractable,
        usages,
    )
}

/// <https://w3c.github.io/webcrypto/#rsa-oaep-operations-import-key>
pub(crate) fn import_key(
    normalized_algorithm: &SubtleRsaHashedImportParams,
    format: KeyFormat,
    key_data: &[u8],
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    rsa_common::import_key(
        RsaAlgorithm::RsaOaep,
        normalized_algorithm,
        format,
        key_data,
        extractable,
        usages,
    )
}

/// <https://w3c.github.io/webcrypto/#rsa-oaep-operations-export-key>
pub(crate) fn export_key(format: KeyFormat, key: &CryptoKey) -> Fallible<ExportedKey> {
    rsa_common::export_key(RsaAlgorithm::RsaOaep, format, key)
}
