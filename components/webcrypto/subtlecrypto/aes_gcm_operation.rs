/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use aes::cipher::consts::U16;
use aes::cipher::{
    Block, BlockCipher, BlockEncrypt, BlockSizeUser, InnerIvInit, KeyInit, StreamCipherCore,
};
use aes::{Aes128, Aes192, Aes256};
use ctr::CtrCore;
use ctr::flavors::Ctr32BE;
use ghash::GHash;
use ghash::universal_hash::UniversalHash;
use subtle::ConstantTimeEq;

use crate::cryptokey::{CryptoKey, Handle, KeyUsage};
use crate::error::{Error, Fallible};
use crate::subtlecrypto::aes_common::{self, AesAlgorithm};
use crate::subtlecrypto::{
    ExportedKey, KeyFormat, SubtleAesDerivedKeyParams, SubtleAesGcmParams, SubtleAesKeyGenParams,
};

/// Maximum plaintext length of GCM, 2^39 - 256 bits.
const MAX_PLAINTEXT_LENGTH_IN_BYTES: u64 = ((1 << 39) - 256) / 8;

/// <https://w3c.github.io/webcrypto/#aes-gcm-operations-encrypt>
pub(crate) fn encrypt(
    normalized_algorithm: &SubtleAesGcmParams,
    key: &CryptoKey,
    plaintext: &[u8],
) -> Fallible<Vec<u8>> {
    // Step 1. If plaintext has a length greater than 2^39 - 256 bytes, then throw an
    // OperationError.
    if plaintext.len() as u64 > MAX_PLAINTEXT_LENGTH_IN_BYTES {
        return Err(Error::Operation(Some(
            "The plaintext is too long for AES-GCM".to_string(),
        )));
    }

    // Step 2. If the iv member of normalizedAlgorithm has a length greater than 2^64 - 1 bytes,
    // then throw an OperationError.
    // NOTE: An empty iv is not allowed by [NIST-SP800-38D] either.
    check_iv(&normalized_algorithm.iv)?;

    // Step 3. If the additionalData member of normalizedAlgorithm is present and has a length
    // greater than 2^64 - 1 bytes, then throw an OperationError.
    // NOTE: Lengths of byte slices cannot get there.

    // Step 4.
    // If the tagLength member of normalizedAlgorithm is not present:
    //     Let tagLength be 128.
    // If the tagLength member of normalizedAlgorithm is one of 32, 64, 96, 104, 112, 120 or 128:
    //     Let tagLength be equal to the tagLength member of normalizedAlgorithm
    // Otherwise:
    //     throw an OperationError.
    let tag_length = tag_length_in_bytes(normalized_algorithm.tag_length)?;

    // Step 5. Let additionalData be the additionalData member of normalizedAlgorithm if present
    // or an empty byte sequence otherwise.
    let additional_data = normalized_algorithm
        .additional_data
        .as_deref()
        .unwrap_or_default();

    // Step 6. Let C and T be the outputs that result from performing the Authenticated
    // Encryption Function described in Section 7.1 of [NIST-SP800-38D] using AES as the block
    // cipher, the iv member of normalizedAlgorithm as the IV input parameter, additionalData as
    // the A input parameter, tagLength as the t pre-requisite and plaintext as the input
    // plaintext.
    let mut ciphertext = plaintext.to_vec();
    let tag = match key.handle() {
        Handle::Aes128Key(key) => Gcm::new(&Aes128::new(key)).seal(
            &normalized_algorithm.iv,
            additional_data,
            &mut ciphertext,
        )?,
        Handle::Aes192Key(key) => Gcm::new(&Aes192::new(key)).seal(
            &normalized_algorithm.iv,
            additional_data,
            &mut ciphertext,
        )?,
        Handle::Aes256Key(key) => Gcm::new(&Aes256::new(key)).seal(
            &normalized_algorithm.iv,
            additional_data,
            &mut ciphertext,
        )?,
        _ => {
            return Err(Error::Operation(Some(
                "The key handle is not an AES key".to_string(),
            )));
        },
    };

    // Step 7. Let ciphertext be equal to C | T, where '|' denotes concatenation.
    ciphertext.extend_from_slice(&tag[..tag_length]);

    // Step 8. Return ciphertext.
    Ok(ciphertext)
}

/// <https://w3c.github.io/webcrypto/#aes-gcm-operations-decrypt>
pub(crate) fn decrypt(
    normalized_algorithm: &SubtleAesGcmParams,
    key: &CryptoKey,
    ciphertext: &[u8],
) -> Fallible<Vec<u8>> {
    // Step 1.
    // If the tagLength member of normalizedAlgorithm is not present:
    //     Let tagLength be 128.
    // If the tagLength member of normalizedAlgorithm is one of 32, 64, 96, 104, 112, 120 or 128:
    //     Let tagLength be equal to the tagLength member of normalizedAlgorithm
    // Otherwise:
    //     throw an OperationError.
    let tag_length = tag_length_in_bytes(normalized_algorithm.tag_length)?;

    // Step 2. If ciphertext has a length in bits less than tagLength, then throw an
    // OperationError.
    if ciphertext.len() < tag_length {
        return Err(Error::Operation(Some(
            "The ciphertext is shorter than the authentication tag".to_string(),
        )));
    }

    // Step 3. If the iv member of normalizedAlgorithm has a length greater than 2^64 - 1 bytes,
    // then throw an OperationError.
    check_iv(&normalized_algorithm.iv)?;

    // Step 4. If the additionalData member of normalizedAlgorithm is present and has a length
    // greater than 2^64 - 1 bytes, then throw an OperationError.

    // Step 5. Let tag be the last tagLength bits of ciphertext.
    // Step 6. Let actualCiphertext be the result of removing the last tagLength bits from
    // ciphertext.
    let (actual_ciphertext, tag) = ciphertext.split_at(ciphertext.len() - tag_length);

    // Step 7. Let additionalData be the additionalData member of normalizedAlgorithm if present
    // or an empty byte sequence otherwise.
    let additional_data = normalized_algorithm
        .additional_data
        .as_deref()
        .unwrap_or_default();

    // Step 8. Perform the Authenticated Decryption Function described in Section 7.2 of
    // [NIST-SP800-38D] using AES as the block cipher, the iv member of normalizedAlgorithm as the
    // IV input parameter, additionalData as the A input parameter, tagLength as the t
    // pre-requisite, actualCiphertext as the input ciphertext, C and tag as the authentication
    // tag, T.
    // If the result of the algorithm is the indication of inauthenticity, "FAIL":
    //     throw an OperationError
    // Otherwise:
    //     Let plaintext be the output P of the Authenticated Decryption Function.
    let mut plaintext = actual_ciphertext.to_vec();
    match key.handle() {
        Handle::Aes128Key(key) => Gcm::new(&Aes128::new(key)).open(
            &normalized_algorithm.iv,
            additional_data,
            &mut plaintext,
            tag,
        )?,
        Handle::Aes192Key(key) => Gcm::new(&Aes192::new(key)).open(
            &normalized_algorithm.iv,
            additional_data,
            &mut plaintext,
            tag,
        )?,
        Handle::Aes256Key(key) => Gcm::new(&Aes256::new(key)).open(
            &normalized_algorithm.iv,
            additional_data,
            &mut plaintext,
            tag,
        )?,
        _ => {
            return Err(Error::Operation(Some(
                "The key handle is not an AES key".to_string(),
            )));
        },
    };

    // Step 9. Return plaintext.
    Ok(plaintext)
}

/// <https://w3c.github.io/webcrypto/#aes-gcm-operations-generate-key>
pub(crate) fn generate_key(
    normalized_algorithm: &SubtleAesKeyGenParams,
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    aes_common::generate_key(
        AesAlgorithm::AesGcm,
        normalized_algorithm,
        extractable,
        usages,
    )
}

/// <https://w3c.github.io/webcrypto/#aes-gcm-operations-import-key>
pub(crate) fn import_key(
    format: KeyFormat,
    key_data: &[u8],
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    // Step 1. Let keyData be the key data to be imported.

    // Step 2. If usages contains an entry which is not one of "encrypt", "decrypt", "wrapKey" or
    // "unwrapKey", then throw a SyntaxError.
    aes_common::check_import_usages(AesAlgorithm::AesGcm, &usages)?;

    // Step 3.
    let data = aes_common::import_key_from_key_data(
        AesAlgorithm::AesGcm,
        format,
        key_data,
        extractable,
        &usages,
    )?;

    // Step 4 - 9.
    aes_common::create_key(AesAlgorithm::AesGcm, &data, extractable, usages)
}

/// <https://w3c.github.io/webcrypto/#aes-gcm-operations-export-key>
pub(crate) fn export_key(format: KeyFormat, key: &CryptoKey) -> Fallible<ExportedKey> {
    aes_common::export_key(AesAlgorithm::AesGcm, format, key)
}

/// <https://w3c.github.io/webcrypto/#aes-gcm-operations-get-key-length>
pub(crate) fn get_key_length(
    normalized_derived_key_algorithm: &SubtleAesDerivedKeyParams,
) -> Fallible<Option<u32>> {
    aes_common::get_key_length(normalized_derived_key_algorithm)
}

fn check_iv(iv: &[u8]) -> Fallible<()> {
    if iv.is_empty() {
        return Err(Error::Operation(Some(
            "The initialization vector is empty".to_string(),
        )));
    }
    Ok(())
}

fn tag_length_in_bytes(tag_length: Option<u8>) -> Fallible<usize> {
    match tag_length {
        None => Ok(16),
        Some(tag_length @ (32 | 64 | 96 | 104 | 112 | 120 | 128)) => Ok(tag_length as usize / 8),
        Some(_) => Err(Error::Operation(Some(
            "The tag length is not one of 32, 64, 96, 104, 112, 120 or 128".to_string(),
        ))),
    }
}

/// Galois/Counter Mode over a 128-bit block cipher, with initialization vectors of any length.
struct Gcm<'a, C>
where
    C: BlockCipher + BlockEncrypt + BlockSizeUser<BlockSize = U16>,
{
    cipher: &'a C,
    ghash: GHash,
}

impl<'a, C> Gcm<'a, C>
where
    C: BlockCipher + BlockEncrypt + BlockSizeUser<BlockSize = U16>,
{
    fn new(cipher: &'a C) -> Self {
        // The hash subkey H is the encryption of the zero block.
        let mut ghash_key = ghash::Key::default();
        cipher.encrypt_block(&mut ghash_key);
        Gcm {
            cipher,
            ghash: GHash::new(&ghash_key),
        }
    }

    /// Encrypt `buffer` in place and return the full 128-bit tag.
    fn seal(&self, iv: &[u8], additional_data: &[u8], buffer: &mut [u8]) -> Fallible<Block<C>> {
        let (ctr, mask) = self.init_ctr(iv);
        ctr.try_apply_keystream_partial(buffer.into())
            .map_err(|_| Error::Operation(Some("The plaintext is too long".to_string())))?;
        Ok(self.compute_tag(mask, additional_data, buffer))
    }

    /// Check the (possibly truncated) `tag` and decrypt `buffer` in place.
    fn open(
        &self,
        iv: &[u8],
        additional_data: &[u8],
        buffer: &mut [u8],
        tag: &[u8],
    ) -> Fallible<()> {
        let (ctr, mask) = self.init_ctr(iv);
        let expected_tag = self.compute_tag(mask, additional_data, buffer);
        if !bool::from(expected_tag[..tag.len()].ct_eq(tag)) {
            return Err(Error::Operation(Some(
                "The authentication tag does not match".to_string(),
            )));
        }
        ctr.try_apply_keystream_partial(buffer.into())
            .map_err(|_| Error::Operation(Some("The ciphertext is too long".to_string())))
    }

    /// Derive the pre-counter block J0 from `iv` and set up the counter at inc32(J0). The first
    /// keystream block, E(K, J0), masks the tag.
    fn init_ctr(&self, iv: &[u8]) -> (CtrCore<&'a C, Ctr32BE>, Block<C>) {
        let j0 = if iv.len() == 12 {
            let mut block = ghash::Block::default();
            block[..12].copy_from_slice(iv);
            block[15] = 1;
            block
        } else {
            let mut ghash = self.ghash.clone();
            ghash.update_padded(iv);

            let mut block = ghash::Block::default();
            let iv_bits = (iv.len() as u64) * 8;
            block[8..].copy_from_slice(&iv_bits.to_be_bytes());
            ghash.update(&[block]);
            ghash.finalize()
        };

        let mut ctr = CtrCore::<&'a C, Ctr32BE>::inner_iv_init(self.cipher, &j0);
        let mut tag_mask = Block::<C>::default();
        ctr.write_keystream_block(&mut tag_mask);
        (ctr, tag_mask)
    }

    fn compute_tag(&self, mask: Block<C>, additional_data: &[u8], ciphertext: &[u8]) -> Block<C> {
        let mut ghash = self.ghash.clone();
        ghash.update_padded(additional_data);
        ghash.update_padded(ciphertext);

        let additional_data_bits = (additional_data.len() as u64) * 8;
        let ciphertext_bits = (ciphertext.len() as u64) * 8;

        let mut block = ghash::Block::default();
        block[..8].copy_from_slice(&additional_data_bits.to_be_bytes());
        block[8..].copy_from_slice(&ciphertext_bits.to_be_bytes());
        ghash.update(&[block]);

        let mut tag = ghash.finalize();
        for (a, b) in tag.iter_mut().zip(mask.iter()) {
            *a ^= *b;
        }
        tag
    }
}
