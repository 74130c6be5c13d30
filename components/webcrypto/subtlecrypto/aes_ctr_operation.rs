/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use aes::cipher::consts::U16;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockCipher, BlockEncrypt, BlockSizeUser, InnerIvInit, KeyInit, StreamCipherCore};
use aes::{Aes128, Aes192, Aes256};
use ctr::CtrCore;
use ctr::flavors::Ctr128BE;

use crate::cryptokey::{CryptoKey, Handle, KeyUsage};
use crate::error::{Error, Fallible};
use crate::subtlecrypto::aes_common::{self, AesAlgorithm};
use crate::subtlecrypto::{
    ExportedKey, KeyFormat, SubtleAesCtrParams, SubtleAesDerivedKeyParams, SubtleAesKeyGenParams,
};

/// <https://w3c.github.io/webcrypto/#aes-ctr-operations-encrypt>
pub(crate) fn encrypt(
    normalized_algorithm: &SubtleAesCtrParams,
    key: &CryptoKey,
    plaintext: &[u8],
) -> Fallible<Vec<u8>> {
    // Step 1. If the counter member of normalizedAlgorithm does not have a length of 16 bytes,
    // then throw an OperationError.
    // Step 2. If the length member of normalizedAlgorithm is zero or is greater than 128, then
    // throw an OperationError.
    check_params(normalized_algorithm)?;

    // Step 3. Let ciphertext be the result of performing the CTR Encryption operation described
    // in Section 6.5 of [NIST-SP800-38A] using AES as the block cipher, the counter member of
    // normalizedAlgorithm as the initial value of the counter block, the length member of
    // normalizedAlgorithm as the input parameter m to the standard counter block incrementing
    // function defined in Appendix B.1 of [NIST-SP800-38A] and plaintext as the input plaintext.
    let mut ciphertext = plaintext.to_vec();
    apply_keystream_with_key(normalized_algorithm, key, &mut ciphertext)?;

    // Step 4. Return ciphertext.
    Ok(ciphertext)
}

/// <https://w3c.github.io/webcrypto/#aes-ctr-operations-decrypt>
pub(crate) fn decrypt(
    normalized_algorithm: &SubtleAesCtrParams,
    key: &CryptoKey,
    ciphertext: &[u8],
) -> Fallible<Vec<u8>> {
    // Step 1. If the counter member of normalizedAlgorithm does not have a length of 16 bytes,
    // then throw an OperationError.
    // Step 2. If the length member of normalizedAlgorithm is zero or is greater than 128, then
    // throw an OperationError.
    check_params(normalized_algorithm)?;

    // Step 3. Let plaintext be the result of performing the CTR Decryption operation described
    // in Section 6.5 of [NIST-SP800-38A] using AES as the block cipher, the counter member of
    // normalizedAlgorithm as the initial value of the counter block, the length member of
    // normalizedAlgorithm as the input parameter m to the standard counter block incrementing
    // function defined in Appendix B.1 of [NIST-SP800-38A] and ciphertext as the input
    // ciphertext.
    let mut plaintext = ciphertext.to_vec();
    apply_keystream_with_key(normalized_algorithm, key, &mut plaintext)?;

    // Step 4. Return plaintext.
    Ok(plaintext)
}

/// <https://w3c.github.io/webcrypto/#aes-ctr-operations-generate-key>
pub(crate) fn generate_key(
    normalized_algorithm: &SubtleAesKeyGenParams,
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    aes_common::generate_key(
        AesAlgorithm::AesCtr,
        normalized_algorithm,
        extractable,
        usages,
    )
}

/// <https://w3c.github.io/webcrypto/#aes-ctr-operations-import-key>
pub(crate) fn import_key(
    format: KeyFormat,
    key_data: &[u8],
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    // Step 1. Let keyData be the key data to be imported.

    // Step 2. If usages contains an entry which is not one of "encrypt", "decrypt", "wrapKey" or
    // "unwrapKey", then throw a SyntaxError.
    if usages.iter().any(|usage| {
        !matches!(
            usage,
            KeyUsage::Encrypt | KeyUsage::Decrypt | KeyUsage::WrapKey | KeyUsage::UnwrapKey
        )
    }) {
        return Err(Error::Syntax(Some(
            "Usages contains an entry which is not one of \"encrypt\", \"decrypt\", \"wrapKey\" \
            or \"unwrapKey\""
                .to_string(),
        )));
    }

    // Step 3.
    let data = aes_common::import_key_from_key_data(
        AesAlgorithm::AesCtr,
        format,
        key_data,
        extractable,
        &usages,
    )?;

    // Step 4 - 9.
    aes_common::create_key(AesAlgorithm::AesCtr, &data, extractable, usages)
}

/// <https://w3c.github.io/webcrypto/#aes-ctr-operations-export-key>
pub(crate) fn export_key(format: KeyFormat, key: &CryptoKey) -> Fallible<ExportedKey> {
    aes_common::export_key(AesAlgorithm::AesCtr, format, key)
}

/// <https://w3c.github.io/webcrypto/#aes-ctr-operations-get-key-length>
pub(crate) fn get_key_length(
    normalized_derived_key_algorithm: &SubtleAesDerivedKeyParams,
) -> Fallible<Option<u32>> {
    aes_common::get_key_length(normalized_derived_key_algorithm)
}

fn check_params(normalized_algorithm: &SubtleAesCtrParams) -> Fallible<()> {
    if normalized_algorithm.counter.len() != 16 {
        return Err(Error::Operation(Some(
            "The initial counter block length is not 16 bytes".to_string(),
        )));
    }
    if normalized_algorithm.length == 0 || normalized_algorithm.length > 128 {
        return Err(Error::Operation(Some(
            "The counter length is zero or greater than 128".to_string(),
        )));
    }
    Ok(())
}

fn apply_keystream_with_key(
    normalized_algorithm: &SubtleAesCtrParams,
    key: &CryptoKey,
    data: &mut [u8],
) -> Fallible<()> {
    let counter_block: [u8; 16] = normalized_algorithm
        .counter
        .as_slice()
        .try_into()
        .map_err(|_| {
            Error::Operation(Some(
                "The initial counter block length is not 16 bytes".to_string(),
            ))
        })?;
    let counter = u128::from_be_bytes(counter_block);
    let length = normalized_algorithm.length;

    match key.handle() {
        Handle::Aes128Key(key) => apply_keystream(&Aes128::new(key), counter, length, data),
        Handle::Aes192Key(key) => apply_keystream(&Aes192::new(key), counter, length, data),
        Handle::Aes256Key(key) => apply_keystream(&Aes256::new(key), counter, length, data),
        _ => Err(Error::Operation(Some(
            "The key handle is not an AES key".to_string(),
        ))),
    }
}

/// CTR mode where only the low `length` bits of the counter block take part in the increment.
///
/// Block ciphers in CTR mode increment the whole 128-bit block. Within a single run of blocks
/// that does not wrap the low `length` bits, this is the same as incrementing those bits only, so
/// the keystream is produced in runs: the blocks up to the first wrap start from the initial
/// counter, and every later run of `2^length` blocks starts from the counter with its low
/// `length` bits cleared.
fn apply_keystream<C>(cipher: &C, counter: u128, length: u8, data: &mut [u8]) -> Fallible<()>
where
    C: BlockCipher + BlockEncrypt + BlockSizeUser<BlockSize = U16> + Clone,
{
    if length >= 128 {
        return apply_keystream_run(cipher, counter, data);
    }

    let runs = CounterRuns::new(counter, length);
    let first_run_length = bytes_for_blocks(runs.blocks_before_wrap).min(data.len());
    let (first_run, rest) = data.split_at_mut(first_run_length);
    apply_keystream_run(cipher, counter, first_run)?;
    for run in rest.chunks_mut(bytes_for_blocks(runs.blocks_per_cycle)) {
        apply_keystream_run(cipher, runs.wrapped_counter, run)?;
    }
    Ok(())
}

fn apply_keystream_run<C>(cipher: &C, counter: u128, data: &mut [u8]) -> Fallible<()>
where
    C: BlockCipher + BlockEncrypt + BlockSizeUser<BlockSize = U16> + Clone,
{
    let counter_block = counter.to_be_bytes();
    CtrCore::<C, Ctr128BE>::inner_iv_init(cipher.clone(), GenericArray::from_slice(&counter_block))
        .try_apply_keystream_partial(data.into())
        .map_err(|_| Error::Operation(Some("The counter block space is exhausted".to_string())))
}

/// How a counter block with a `length`-bit counter field advances.
#[derive(Debug, Eq, PartialEq)]
struct CounterRuns {
    /// Number of blocks processed from the initial counter before the counter field wraps.
    blocks_before_wrap: u128,
    /// The counter block after a wrap: the nonce bits unchanged, the counter field zero.
    wrapped_counter: u128,
    /// Number of blocks between two wraps.
    blocks_per_cycle: u128,
}

impl CounterRuns {
    fn new(counter: u128, length: u8) -> CounterRuns {
        let blocks_per_cycle = 1u128 << length;
        let mask = blocks_per_cycle - 1;
        CounterRuns {
            blocks_before_wrap: blocks_per_cycle - (counter & mask),
            wrapped_counter: counter & !mask,
            blocks_per_cycle,
        }
    }
}

/// Byte length of `blocks` AES blocks, saturated to the addressable range.
fn bytes_for_blocks(blocks: u128) -> usize {
    blocks
        .checked_mul(16)
        .and_then(|bytes| usize::try_from(bytes).ok())
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod test {
    use aes::Aes128;
    use aes::cipher::KeyInit;

    use super::{CounterRuns, apply_keystream, bytes_for_blocks};

    #[test]
    fn test_counter_runs() {
        let runs = CounterRuns::new(0x0102_0304_0506_0708_090a_0b0c_0d0e_0ffd, 4);
        assert_eq!(runs.blocks_before_wrap, 3);
        assert_eq!(runs.wrapped_counter, 0x0102_0304_0506_0708_090a_0b0c_0d0e_0ff0);
        assert_eq!(runs.blocks_per_cycle, 16);

        let runs = CounterRuns::new(u128::MAX, 127);
        assert_eq!(runs.blocks_before_wrap, 1);
        assert_eq!(runs.wrapped_counter, 1 << 127);

        let runs = CounterRuns::new(0, 8);
        assert_eq!(runs.blocks_before_wrap, 256);
    }

    #[test]
    fn test_bytes_for_blocks_saturates() {
        assert_eq!(bytes_for_blocks(3), 48);
        assert_eq!(bytes_for_blocks(1 << 120), usize::MAX);
    }

    #[test]
    fn test_narrow_counter_wraps_within_its_field() {
        let cipher = Aes128::new_from_slice(&[0x2b; 16]).unwrap();
        let counter = 0xf0f0_f0f0_f0f0_f0f0_f0f0_f0f0_f0f0_f0ffu128;

        // An 8-bit counter at 0xff wraps to 0x00 after one block.
        let mut narrow = vec![0u8; 48];
        apply_keystream(&cipher, counter, 8, &mut narrow).unwrap();

        let mut first = vec![0u8; 16];
        apply_keystream(&cipher, counter, 128, &mut first).unwrap();
        let mut wrapped = vec![0u8; 32];
        apply_keystream(&cipher, counter & !0xff, 128, &mut wrapped).unwrap();

        assert_eq!(&narrow[..16], &first[..]);
        assert_eq!(&narrow[16..], &wrapped[..]);
    }

    #[test]
    fn test_partial_blocks_are_supported() {
        let cipher = Aes128::new_from_slice(&[0x01; 16]).unwrap();
        let mut full = vec![0u8; 80];
        apply_keystream(&cipher, 6, 2, &mut full).unwrap();
        let mut partial = vec![0u8; 37];
        apply_keystream(&cipher, 6, 2, &mut partial).unwrap();
        assert_eq!(&full[..37], &partial[..]);
    }
}
