/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use digest::Digest;
use digest::core_api::BlockSizeUser;
use hmac::{Mac, SimpleHmac};
use pkcs8::rand_core::{OsRng, RngCore};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use crate::cryptokey::{CryptoKey, Handle, KeyType, KeyUsage};
use crate::error::{Error, Fallible};
use crate::subtlecrypto::jwk::{JsonWebKey, JsonWebKeyExt, JwkStringField};
use crate::subtlecrypto::sha_operation::HashFunction;
use crate::subtlecrypto::{
    ALG_HMAC, ExportedKey, KeyAlgorithmAndDerivatives, KeyFormat, SubtleHmacImportParams,
    SubtleHmacKeyAlgorithm, SubtleHmacKeyGenParams,
};

/// The MAC of `message` under `key`, as defined in Section 4 of [FIPS-198-1], with the hash
/// function `hash`.
pub(crate) fn compute_mac(hash: HashFunction, key: &[u8], message: &[u8]) -> Fallible<Vec<u8>> {
    match hash {
        HashFunction::Sha1 => compute_mac_with::<Sha1>(key, message),
        HashFunction::Sha256 => compute_mac_with::<Sha256>(key, message),
        HashFunction::Sha384 => compute_mac_with::<Sha384>(key, message),
        HashFunction::Sha512 => compute_mac_with::<Sha512>(key, message),
    }
}

fn compute_mac_with<D: Digest + BlockSizeUser>(key: &[u8], message: &[u8]) -> Fallible<Vec<u8>> {
    let mut mac = SimpleHmac::<D>::new_from_slice(key)
        .map_err(|_| Error::Operation(Some("Invalid HMAC key length".to_string())))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// The JWK "alg" value of HMAC keys with the given hash.
fn jwk_alg(hash: HashFunction) -> &'static str {
    match hash {
        HashFunction::Sha1 => "HS1",
        HashFunction::Sha256 => "HS256",
        HashFunction::Sha384 => "HS384",
        HashFunction::Sha512 => "HS512",
    }
}

fn key_hash_function(key: &CryptoKey) -> Fallible<HashFunction> {
    let KeyAlgorithmAndDerivatives::HmacKeyAlgorithm(algorithm) = key.algorithm() else {
        return Err(Error::Operation(Some(
            "[[algorithm]] internal slot of key is not an HmacKeyAlgorithm".to_string(),
        )));
    };
    HashFunction::from_name(&algorithm.hash.name)
}

fn key_bytes(key: &CryptoKey) -> Fallible<&[u8]> {
    match key.handle() {
        Handle::Hmac(bytes) => Ok(bytes),
        _ => Err(Error::Operation(Some(
            "[[handle]] internal slot of key is not an HMAC key".to_string(),
        ))),
    }
}

/// The length in bits of `byte_length` bytes of key data.
fn length_in_bits(byte_length: usize) -> Fallible<u32> {
    u32::try_from(byte_length)
        .ok()
        .and_then(|length| length.checked_mul(8))
        .ok_or_else(|| Error::Data(Some("The key data is too long".to_string())))
}

fn check_usages(usages: &[KeyUsage]) -> Fallible<()> {
    if usages
        .iter()
        .any(|usage| !matches!(usage, KeyUsage::Sign | KeyUsage::Verify))
    {
        return Err(Error::Syntax(Some(
            "Usages contains an entry which is not \"sign\" or \"verify\"".to_string(),
        )));
    }
    Ok(())
}

/// <https://w3c.github.io/webcrypto/#hmac-operations-sign>
pub(crate) fn sign(key: &CryptoKey, message: &[u8]) -> Fallible<Vec<u8>> {
    // Step 1. Let mac be the result of performing the MAC Generation operation described in
    // Section 4 of [FIPS-198-1] using the key represented by the [[handle]] internal slot of key,
    // the hash function identified by the hash attribute of the [[algorithm]] internal slot of key
    // and message as the input data text.
    let hash = key_hash_function(key)?;
    hash.warn_if_legacy(ALG_HMAC);
    let mac = compute_mac(hash, key_bytes(key)?, message)?;

    // Step 2. Return mac.
    Ok(mac)
}

/// <https://w3c.github.io/webcrypto/#hmac-operations-verify>
pub(crate) fn verify(key: &CryptoKey, message: &[u8], signature: &[u8]) -> Fallible<bool> {
    // Step 1. Let mac be the result of performing the MAC Generation operation described in
    // Section 4 of [FIPS-198-1] using the key represented by the [[handle]] internal slot of key,
    // the hash function identified by the hash attribute of the [[algorithm]] internal slot of key
    // and message as the input data text.
    let hash = key_hash_function(key)?;
    hash.warn_if_legacy(ALG_HMAC);
    let mac = compute_mac(hash, key_bytes(key)?, message)?;

    // Step 2. Return true if mac is equal to signature and false otherwise.
    Ok(bool::from(mac.as_slice().ct_eq(signature)))
}

/// <https://w3c.github.io/webcrypto/#hmac-operations-generate-key>
pub(crate) fn generate_key(
    normalized_algorithm: &SubtleHmacKeyGenParams,
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    // Step 1. If usages contains any entry which is not "sign" or "verify", then throw a
    // SyntaxError.
    check_usages(&usages)?;

    // Step 2.
    // If the length member of normalizedAlgorithm is not present:
    //     Let length be the block size in bits of the hash function identified by the hash
    //     member of normalizedAlgorithm.
    // Otherwise, if the length member of normalizedAlgorithm is non-zero:
    //     Let length be equal to the length member of normalizedAlgorithm.
    // Otherwise:
    //     throw an OperationError.
    let hash = normalized_algorithm.hash.hash_function()?;
    let length = match normalized_algorithm.length {
        None => hash.block_size(),
        Some(0) => {
            return Err(Error::Operation(Some(
                "The length member of the algorithm is zero".to_string(),
            )));
        },
        Some(length) => length,
    };

    // Step 3. Generate a key of length length bits.
    // Step 4. If the key generation step fails, then throw an OperationError.
    let mut key_data = vec![0; length.div_ceil(8) as usize];
    OsRng
        .try_fill_bytes(&mut key_data)
        .map_err(|_| Error::Operation(Some("Failed to generate HMAC key".to_string())))?;
    if length % 8 != 0 {
        if let Some(last) = key_data.last_mut() {
            *last &= 0xff << (8 - length % 8);
        }
    }

    // Step 5. Let key be a new CryptoKey object representing the generated key.
    // Step 6. Let algorithm be a new HmacKeyAlgorithm.
    // Step 7. Set the name attribute of algorithm to "HMAC".
    // Step 8. Set the length attribute of algorithm to length.
    // Step 9. Let hash be a new KeyAlgorithm.
    // Step 10. Set the name attribute of hash to equal the name member of the hash member of
    // normalizedAlgorithm.
    // Step 11. Set the hash attribute of algorithm to hash.
    let algorithm = SubtleHmacKeyAlgorithm {
        name: ALG_HMAC.to_string(),
        hash: normalized_algorithm.hash.key_algorithm(),
        length,
    };

    // Step 12. Set the [[type]] internal slot of key to "secret".
    // Step 13. Set the [[algorithm]] internal slot of key to algorithm.
    // Step 14. Set the [[extractable]] internal slot of key to be extractable.
    // Step 15. Set the [[usages]] internal slot of key to be usages.
    // Step 16. Return key.
    Ok(CryptoKey::new(
        KeyType::Secret,
        extractable,
        KeyAlgorithmAndDerivatives::HmacKeyAlgorithm(algorithm),
        usages,
        Handle::Hmac(key_data),
    ))
}

/// <https://w3c.github.io/webcrypto/#hmac-operations-import-key>
pub(crate) fn import_key(
    normalized_algorithm: &SubtleHmacImportParams,
    format: KeyFormat,
    key_data: &[u8],
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    // Step 1. Let keyData be the key data to be imported.
    // Step 2. If usages contains an entry which is not "sign" or "verify", then throw a
    // SyntaxError.
    check_usages(&usages)?;

    // Step 3. Let hash be a new KeyAlgorithm.
    let hash = normalized_algorithm.hash.hash_function()?;

    // Step 4.
    let data = match format {
        // If format is "raw":
        KeyFormat::Raw => {
            // Step 4.1. Let data be keyData.
            // Step 4.2. Set hash to equal the hash member of normalizedAlgorithm.
            key_data.to_vec()
        },
        // If format is "jwk":
        KeyFormat::Jwk => {
            // Step 4.1.
            // If keyData is a JsonWebKey dictionary:
            //     Let jwk equal keyData.
            // Otherwise:
            //     Throw a DataError.
            let jwk = JsonWebKey::parse(key_data)?;

            // Step 4.2. If the kty field of jwk is not "oct", then throw a DataError.
            if jwk.kty.as_deref() != Some("oct") {
                return Err(Error::Data(Some(
                    "The kty field of jwk is not \"oct\"".to_string(),
                )));
            }

            // Step 4.3. If jwk does not meet the requirements of Section 6.4 of JSON Web
            // Algorithms [JWA], then throw a DataError.
            // Step 4.4. Let data be the byte sequence obtained by decoding the k field of jwk.
            let data = jwk.decode_required_string_field(JwkStringField::K)?;

            // Step 4.5. Set the hash to equal the hash member of normalizedAlgorithm.
            // Step 4.6. If the alg field of jwk is present and is not the value mapped from the
            // name attribute of hash ("HS1", "HS256", "HS384" or "HS512"), then throw a
            // DataError.
            let expected_alg = jwk_alg(hash);
            if jwk.alg.as_ref().is_some_and(|alg| alg != expected_alg) {
                return Err(Error::Data(Some(format!(
                    "The alg field of jwk is present, and is not \"{expected_alg}\""
                ))));
            }

            // Step 4.7. If usages is non-empty and the use field of jwk is present and is not
            // "sig", then throw a DataError.
            jwk.check_use(&usages, "sig")?;

            // Step 4.8. If the key_ops field of jwk is present, and is invalid according to the
            // requirements of JSON Web Key [JWK] or does not contain all of the specified usages
            // values, then throw a DataError.
            jwk.check_key_ops(&usages)?;

            // Step 4.9. If the ext field of jwk is present and has the value false and
            // extractable is true, then throw a DataError.
            jwk.check_ext(extractable)?;

            data
        },
        // Otherwise:
        _ => {
            // throw a NotSupportedError.
            return Err(Error::NotSupported(Some(format!(
                "Unsupported import key format for HMAC: {}",
                format.as_str()
            ))));
        },
    };

    // Step 5. Let length be the length in bits of data.
    // Step 6. If length is zero then throw a DataError.
    let data_length = length_in_bits(data.len())?;
    if data_length == 0 {
        return Err(Error::Data(Some("The key data is empty".to_string())));
    }

    // Step 7. If the length member of normalizedAlgorithm is present:
    //     Step 7.1. If the length member of normalizedAlgorithm is greater than length, or is
    //     less than or equal to length minus eight, then throw a DataError.
    //     Step 7.2. Otherwise, set length equal to the length member of normalizedAlgorithm.
    let length = match normalized_algorithm.length {
        Some(length) if length > data_length || length <= data_length - 8 => {
            return Err(Error::Data(Some(format!(
                "The length member of the algorithm does not match a {data_length}-bit key"
            ))));
        },
        Some(length) => length,
        None => data_length,
    };

    // Step 8. Let key be a new CryptoKey object representing an HMAC key with the first length
    // bits of data.
    // Step 9. Set the [[type]] internal slot of key to "secret".
    // Step 10. Let algorithm be a new HmacKeyAlgorithm.
    // Step 11. Set the name attribute of algorithm to "HMAC".
    // Step 12. Set the length attribute of algorithm to length.
    // Step 13. Set the hash attribute of algorithm to hash.
    // Step 14. Set the [[algorithm]] internal slot of key to algorithm.
    let algorithm = SubtleHmacKeyAlgorithm {
        name: ALG_HMAC.to_string(),
        hash: normalized_algorithm.hash.key_algorithm(),
        length,
    };

    // Step 15. Return key.
    Ok(CryptoKey::new(
        KeyType::Secret,
        extractable,
        KeyAlgorithmAndDerivatives::HmacKeyAlgorithm(algorithm),
        usages,
        Handle::Hmac(data),
    ))
}

/// <https://w3c.github.io/webcrypto/#hmac-operations-export-key>
pub(crate) fn export_key(format: KeyFormat, key: &CryptoKey) -> Fallible<ExportedKey> {
    // Step 1. If the underlying cryptographic key material represented by the [[handle]]
    // internal slot of key cannot be accessed, then throw an OperationError.
    // Step 2. Let bits be the raw bits of the key represented by the [[handle]] internal slot of
    // key.
    // Step 3. Let data be a byte sequence containing bits.
    let data = key_bytes(key)?;

    // Step 4.
    let result = match format {
        // If format is "raw":
        KeyFormat::Raw => {
            // Step 4.1. Let result be data.
            ExportedKey::Bytes(data.to_vec())
        },
        // If format is "jwk":
        KeyFormat::Jwk => {
            // Step 4.1. Let jwk be a new JsonWebKey dictionary.
            // Step 4.2. Set the kty attribute of jwk to the string "oct".
            let mut jwk = JsonWebKey {
                kty: Some("oct".to_string()),
                ..Default::default()
            };

            // Step 4.3. Set the k attribute of jwk to be a string containing data, encoded
            // according to Section 6.4 of JSON Web Algorithms [JWA].
            jwk.encode_string_field(JwkStringField::K, data);

            // Step 4.4. Let algorithm be the [[algorithm]] internal slot of key.
            // Step 4.5. Let hash be the hash attribute of algorithm.
            // Step 4.6. Set the alg attribute of jwk to the value mapped from the name attribute
            // of hash.
            jwk.alg = Some(jwk_alg(key_hash_function(key)?).to_string());

            // Step 4.7. Set the key_ops attribute of jwk to equal the usages attribute of key.
            jwk.set_key_ops(key.usages());

            // Step 4.8. Set the ext attribute of jwk to equal the [[extractable]] internal slot
            // of key.
            jwk.ext = Some(key.extractable());

            // Step 4.9. Let result be jwk.
            ExportedKey::Jwk(Box::new(jwk))
        },
        // Otherwise:
        _ => {
            // throw a NotSupportedError.
            return Err(Error::NotSupported(Some(format!(
                "Unsupported export key format for HMAC: {}",
                format.as_str()
            ))));
        },
    };

    // Step 5. Return result.
    Ok(result)
}

/// <https://w3c.github.io/webcrypto/#hmac-operations-get-key-length>
pub(crate) fn get_key_length(
    normalized_derived_key_algorithm: &SubtleHmacImportParams,
) -> Fallible<Option<u32>> {
    // Step 1.
    // If the length member of normalizedDerivedKeyAlgorithm is not present:
    //     Let length be the block size in bits of the hash function identified by the hash
    //     member of normalizedDerivedKeyAlgorithm.
    // Otherwise, if the length member of normalizedDerivedKeyAlgorithm is non-zero:
    //     Let length be equal to the length member of normalizedDerivedKeyAlgorithm.
    // Otherwise:
    //     throw a TypeError.
    let length = match normalized_derived_key_algorithm.length {
        None => normalized_derived_key_algorithm
            .hash
            .hash_function()?
            .block_size(),
        Some(0) => {
            return Err(Error::Type(
                "The length member of the algorithm is zero".to_string(),
            ));
        },
        Some(length) => length,
    };

    // Step 2. Return length.
    Ok(Some(length))
}
