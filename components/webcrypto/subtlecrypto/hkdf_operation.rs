/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use digest::Digest;
use digest::core_api::BlockSizeUser;
use hkdf::{InvalidLength, SimpleHkdf};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::cryptokey::{CryptoKey, Handle, KeyType, KeyUsage};
use crate::error::{Error, Fallible};
use crate::subtlecrypto::sha_operation::HashFunction;
use crate::subtlecrypto::{
    ALG_HKDF, KeyAlgorithmAndDerivatives, KeyFormat, SubtleHkdfParams, SubtleKeyAlgorithm,
};

/// <https://w3c.github.io/webcrypto/#hkdf-operations-derive-bits>
pub(crate) fn derive_bits(
    normalized_algorithm: &SubtleHkdfParams,
    key: &CryptoKey,
    length: Option<u32>,
) -> Fallible<Vec<u8>> {
    // Step 1. If length is null or is not a multiple of 8, then throw an OperationError.
    let Some(length) = length.filter(|length| length % 8 == 0) else {
        return Err(Error::Operation(Some(
            "The length is null or is not a multiple of 8".to_string(),
        )));
    };

    // Step 2. Let keyDerivationKey be the secret represented by the [[handle]] internal slot of
    // key.
    let Handle::Hkdf(key_derivation_key) = key.handle() else {
        return Err(Error::Operation(Some(
            "[[handle]] internal slot of key is not an HKDF key".to_string(),
        )));
    };

    // Step 3. Let result be the result of performing the HKDF extract and then the HKDF expand
    // step described in Section 2 of [RFC5869] using:
    //     * the hash member of normalizedAlgorithm as Hash,
    //     * keyDerivationKey as the input keying material, IKM,
    //     * the salt member of normalizedAlgorithm as salt,
    //     * the info member of normalizedAlgorithm as info,
    //     * length divided by 8 as the value of L,
    // Step 4. If the key derivation operation fails, then throw an OperationError.
    let hash = normalized_algorithm.hash.hash_function()?;
    hash.warn_if_legacy(ALG_HKDF);
    let result = extract_and_expand(
        hash,
        &normalized_algorithm.salt,
        key_derivation_key,
        &normalized_algorithm.info,
        (length / 8) as usize,
    )?;

    // Step 5. Return result.
    Ok(result)
}

/// <https://datatracker.ietf.org/doc/html/rfc5869#section-2>
fn extract_and_expand(
    hash: HashFunction,
    salt: &[u8],
    ikm: &[u8],
    info: &[u8],
    output_length: usize,
) -> Fallible<Vec<u8>> {
    fn hkdf<D>(salt: &[u8], ikm: &[u8], info: &[u8], okm: &mut [u8]) -> Result<(), InvalidLength>
    where
        D: Digest + BlockSizeUser + Clone,
    {
        SimpleHkdf::<D>::new(Some(salt), ikm).expand(info, okm)
    }

    let mut okm = vec![0; output_length];
    match hash {
        HashFunction::Sha1 => hkdf::<Sha1>(salt, ikm, info, &mut okm),
        HashFunction::Sha256 => hkdf::<Sha256>(salt, ikm, info, &mut okm),
        HashFunction::Sha384 => hkdf::<Sha384>(salt, ikm, info, &mut okm),
        HashFunction::Sha512 => hkdf::<Sha512>(salt, ikm, info, &mut okm),
    }
    .map_err(|_| {
        Error::Operation(Some(format!(
            "HKDF cannot derive more than {} bytes with {}",
            255 * hash.output_size(),
            hash.name()
        )))
    })?;
    Ok(okm)
}

/// <https://w3c.github.io/webcrypto/#hkdf-operations-import-key>
pub(crate) fn import_key(
    format: KeyFormat,
    key_data: &[u8],
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    // Step 1. Let keyData be the key data to be imported.

    // Step 2. If format is "raw":
    if format != KeyFormat::Raw {
        // Otherwise: throw a NotSupportedError.
        return Err(Error::NotSupported(Some(format!(
            "Unsupported import key format for HKDF: {}",
            format.as_str()
        ))));
    }

    // Step 2.1. If usages contains a value that is not "deriveKey" or "deriveBits", then throw a
    // SyntaxError.
    if usages
        .iter()
        .any(|usage| !matches!(usage, KeyUsage::DeriveKey | KeyUsage::DeriveBits))
    {
        return Err(Error::Syntax(Some(
            "Usages contains an entry which is not \"deriveKey\" or \"deriveBits\"".to_string(),
        )));
    }

    // Step 2.2. If extractable is not false, then throw a SyntaxError.
    if extractable {
        return Err(Error::Syntax(Some("HKDF keys are not extractable".to_string())));
    }

    // Step 2.3. Let key be a new CryptoKey representing the key data provided in keyData.
    // Step 2.4. Set the [[type]] internal slot of key to "secret".
    // Step 2.5. Let algorithm be a new KeyAlgorithm object.
    // Step 2.6. Set the name attribute of algorithm to "HKDF".
    // Step 2.7. Set the [[algorithm]] internal slot of key to algorithm.
    let key = CryptoKey::new(
        KeyType::Secret,
        extractable,
        KeyAlgorithmAndDerivatives::KeyAlgorithm(SubtleKeyAlgorithm {
            name: ALG_HKDF.to_string(),
        }),
        usages,
        Handle::Hkdf(key_data.to_vec()),
    );

    // Step 2.8. Return key.
    Ok(key)
}

/// <https://w3c.github.io/webcrypto/#hkdf-operations-get-key-length>
pub(crate) fn get_key_length() -> Fallible<Option<u32>> {
    // Step 1. Return null.
    Ok(None)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_extract_and_expand_rfc5869_case_1() {
        let okm = extract_and_expand(
            HashFunction::Sha256,
            &hex::decode("000102030405060708090a0b0c").unwrap(),
            &[0x0b; 22],
            &hex::decode("f0f1f2f3f4f5f6f7f8f9").unwrap(),
            42,
        )
        .unwrap();
        assert_eq!(
            hex::encode(okm),
            "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf34007208d5b887185865"
        );
    }

    #[test]
    fn test_extract_and_expand_rejects_long_output() {
        assert!(matches!(
            extract_and_expand(HashFunction::Sha1, &[], &[1], &[], 255 * 20 + 1),
            Err(Error::Operation(_))
        ));
        assert_eq!(
            extract_and_expand(HashFunction::Sha1, &[], &[1], &[], 255 * 20)
                .unwrap()
                .len(),
            255 * 20
        );
    }
}
