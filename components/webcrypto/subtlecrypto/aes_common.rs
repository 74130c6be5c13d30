/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use aes::cipher::crypto_common::Key;
use aes::{Aes128, Aes192, Aes256};
use pkcs8::rand_core::{OsRng, RngCore};

use crate::cryptokey::{CryptoKey, Handle, KeyType, KeyUsage};
use crate::error::{Error, Fallible};
use crate::subtlecrypto::jwk::{JsonWebKey, JsonWebKeyExt, JwkStringField};
use crate::subtlecrypto::{
    ALG_AES_CBC, ALG_AES_CTR, ALG_AES_GCM, ALG_AES_KW, ExportedKey, KeyAlgorithmAndDerivatives,
    KeyFormat, SubtleAesDerivedKeyParams, SubtleAesKeyAlgorithm, SubtleAesKeyGenParams,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum AesAlgorithm {
    AesCtr,
    AesCbc,
    AesGcm,
    AesKw,
}

impl AesAlgorithm {
    fn name(&self) -> &'static str {
        match self {
            AesAlgorithm::AesCtr => ALG_AES_CTR,
            AesAlgorithm::AesCbc => ALG_AES_CBC,
            AesAlgorithm::AesGcm => ALG_AES_GCM,
            AesAlgorithm::AesKw => ALG_AES_KW,
        }
    }

    /// The mode suffix of the JWK "alg" values of this algorithm, as in "A128CTR".
    fn jwk_alg_suffix(&self) -> &'static str {
        match self {
            AesAlgorithm::AesCtr => "CTR",
            AesAlgorithm::AesCbc => "CBC",
            AesAlgorithm::AesGcm => "GCM",
            AesAlgorithm::AesKw => "KW",
        }
    }

    fn jwk_alg(&self, length_in_bytes: usize) -> String {
        format!("A{}{}", length_in_bytes * 8, self.jwk_alg_suffix())
    }

    /// Whether `usage` is allowed for keys of this algorithm.
    fn allows(&self, usage: &KeyUsage) -> bool {
        match self {
            AesAlgorithm::AesKw => matches!(usage, KeyUsage::WrapKey | KeyUsage::UnwrapKey),
            _ => matches!(
                usage,
                KeyUsage::Encrypt | KeyUsage::Decrypt | KeyUsage::WrapKey | KeyUsage::UnwrapKey
            ),
        }
    }
}

/// <https://w3c.github.io/webcrypto/#aes-ctr-operations-generate-key>
/// <https://w3c.github.io/webcrypto/#aes-cbc-operations-generate-key>
/// <https://w3c.github.io/webcrypto/#aes-gcm-operations-generate-key>
/// <https://w3c.github.io/webcrypto/#aes-kw-operations-generate-key>
pub(crate) fn generate_key(
    aes_algorithm: AesAlgorithm,
    normalized_algorithm: &SubtleAesKeyGenParams,
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    // Step 1. If usages contains any entry which is not one of "encrypt", "decrypt", "wrapKey"
    // or "unwrapKey", then throw a SyntaxError.
    // NOTE: AES-KW only allows "wrapKey" and "unwrapKey".
    if usages.iter().any(|usage| !aes_algorithm.allows(usage)) {
        return Err(Error::Syntax(Some(format!(
            "Usages contains an entry which is not allowed for {}",
            aes_algorithm.name()
        ))));
    }

    // Step 2. If the length member of normalizedAlgorithm is not equal to one of 128, 192 or
    // 256, then throw an OperationError.
    if !matches!(normalized_algorithm.length, 128 | 192 | 256) {
        return Err(Error::Operation(Some(
            "The length member of the algorithm is not 128, 192 or 256".to_string(),
        )));
    }

    // Step 3. Generate an AES key of length equal to the length member of normalizedAlgorithm.
    // Step 4. If the key generation step fails, then throw an OperationError.
    let mut data = vec![0u8; normalized_algorithm.length as usize / 8];
    OsRng
        .try_fill_bytes(&mut data)
        .map_err(|_| Error::Operation(Some("Failed to generate random key".to_string())))?;

    // Step 5. Let key be a new CryptoKey object representing the generated AES key.
    // Step 6. Let algorithm be a new AesKeyAlgorithm.
    // Step 7. Set the name attribute of algorithm to the name of the algorithm.
    // Step 8. Set the length attribute of algorithm to equal the length member of
    // normalizedAlgorithm.
    // Step 9. Set the [[type]] internal slot of key to "secret".
    // Step 10. Set the [[algorithm]] internal slot of key to algorithm.
    // Step 11. Set the [[extractable]] internal slot of key to be extractable.
    // Step 12. Set the [[usages]] internal slot of key to be usages.
    // Step 13. Return key.
    create_key(aes_algorithm, &data, extractable, usages)
}

/// Step 2 of the import key operations of AES-CTR, AES-CBC and AES-GCM: usages must be a subset
/// of "encrypt", "decrypt", "wrapKey" and "unwrapKey". AES-KW allows "wrapKey" and "unwrapKey"
/// only.
pub(crate) fn check_import_usages(
    aes_algorithm: AesAlgorithm,
    usages: &[KeyUsage],
) -> Fallible<()> {
    if usages.iter().any(|usage| !aes_algorithm.allows(usage)) {
        return Err(Error::Syntax(Some(format!(
            "Usages contains an entry which is not allowed for {}",
            aes_algorithm.name()
        ))));
    }
    Ok(())
}

/// Step 3 of the import key operations: read the key bytes out of `key_data` in `format`.
pub(crate) fn import_key_from_key_data(
    aes_algorithm: AesAlgorithm,
    format: KeyFormat,
    key_data: &[u8],
    extractable: bool,
    usages: &[KeyUsage],
) -> Fallible<Vec<u8>> {
    match format {
        // If format is "raw":
        KeyFormat::Raw => {
            // Step 3.1. Let data be keyData.
            // Step 3.2. If the length in bits of data is not 128, 192 or 256 then throw a
            // DataError.
            if !matches!(key_data.len(), 16 | 24 | 32) {
                return Err(Error::Data(Some(
                    "The length in bits of key is not 128, 192 or 256".to_string(),
                )));
            }
            Ok(key_data.to_vec())
        },
        // If format is "jwk":
        KeyFormat::Jwk => {
            // Step 3.1.
            // If keyData is a JsonWebKey dictionary:
            //     Let jwk equal keyData.
            // Otherwise:
            //     Throw a DataError.
            let jwk = JsonWebKey::parse(key_data)?;

            // Step 3.2. If the kty field of jwk is not "oct", then throw a DataError.
            if jwk.kty.as_deref() != Some("oct") {
                return Err(Error::Data(Some(
                    "The kty field of jwk is not \"oct\"".to_string(),
                )));
            }

            // Step 3.3. If jwk does not meet the requirements of Section 6.4 of JSON Web
            // Algorithms [JWA], then throw a DataError.
            // Step 3.4. Let data be the byte sequence obtained by decoding the k field of jwk.
            let data = jwk.decode_required_string_field(JwkStringField::K)?;

            // Step 3.5.
            // If the length in bits of data is 128, 192 or 256:
            //     If the alg field of jwk is present, and is not "A{bits}{mode}", then throw a
            //     DataError.
            // Otherwise:
            //     Throw a DataError.
            if !matches!(data.len(), 16 | 24 | 32) {
                return Err(Error::Data(Some(
                    "The length in bits of key is not 128, 192 or 256".to_string(),
                )));
            }
            let expected_alg = aes_algorithm.jwk_alg(data.len());
            if jwk.alg.as_ref().is_some_and(|alg| *alg != expected_alg) {
                return Err(Error::Data(Some(format!(
                    "The alg field of jwk is present, and is not \"{expected_alg}\""
                ))));
            }

            // Step 3.6. If usages is non-empty and the use field of jwk is present and is not
            // "enc", then throw a DataError.
            jwk.check_use(usages, "enc")?;

            // Step 3.7. If the key_ops field of jwk is present, and is invalid according to the
            // requirements of JSON Web Key [JWK] or does not contain all of the specified usages
            // values, then throw a DataError.
            jwk.check_key_ops(usages)?;

            // Step 3.8. If the ext field of jwk is present and has the value false and
            // extractable is true, then throw a DataError.
            jwk.check_ext(extractable)?;

            Ok(data)
        },
        // Otherwise:
        _ => {
            // throw a NotSupportedError.
            Err(Error::NotSupported(Some(format!(
                "Unsupported import key format for {}: {}",
                aes_algorithm.name(),
                format.as_str()
            ))))
        },
    }
}

/// Steps 4 - 9 of the import key operations: wrap `data` in a new secret key.
pub(crate) fn create_key(
    aes_algorithm: AesAlgorithm,
    data: &[u8],
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    let handle = match data.len() {
        16 => Handle::Aes128Key(Key::<Aes128>::clone_from_slice(data)),
        24 => Handle::Aes192Key(Key::<Aes192>::clone_from_slice(data)),
        32 => Handle::Aes256Key(Key::<Aes256>::clone_from_slice(data)),
        _ => {
            return Err(Error::Data(Some(
                "The length in bits of key is not 128, 192 or 256".to_string(),
            )));
        },
    };
    let algorithm = SubtleAesKeyAlgorithm {
        name: aes_algorithm.name().to_string(),
        length: data.len() as u16 * 8,
    };
    Ok(CryptoKey::new(
        KeyType::Secret,
        extractable,
        KeyAlgorithmAndDerivatives::AesKeyAlgorithm(algorithm),
        usages,
        handle,
    ))
}

/// <https://w3c.github.io/webcrypto/#aes-ctr-operations-export-key>
/// <https://w3c.github.io/webcrypto/#aes-cbc-operations-export-key>
/// <https://w3c.github.io/webcrypto/#aes-gcm-operations-export-key>
/// <https://w3c.github.io/webcrypto/#aes-kw-operations-export-key>
pub(crate) fn export_key(
    aes_algorithm: AesAlgorithm,
    format: KeyFormat,
    key: &CryptoKey,
) -> Fallible<ExportedKey> {
    // Step 1. If the underlying cryptographic key material represented by the [[handle]]
    // internal slot of key cannot be accessed, then throw an OperationError.
    let data = key.handle().as_bytes().ok_or(Error::Operation(Some(
        "The key handle is not an AES key".to_string(),
    )))?;

    // Step 2.
    match format {
        // If format is "raw":
        KeyFormat::Raw => {
            // Step 2.1. Let data be a byte sequence containing the raw octets of the key
            // represented by the [[handle]] internal slot of key.
            // Step 2.2. Let result be data.
            Ok(ExportedKey::Bytes(data.to_vec()))
        },
        // If format is "jwk":
        KeyFormat::Jwk => {
            // Step 2.1. Let jwk be a new JsonWebKey dictionary.
            // Step 2.2. Set the kty attribute of jwk to the string "oct".
            let mut jwk = JsonWebKey {
                kty: Some("oct".to_string()),
                ..Default::default()
            };

            // Step 2.3. Set the k attribute of jwk to be a string containing the raw octets of
            // the key represented by the [[handle]] internal slot of key, encoded according to
            // Section 6.4 of JSON Web Algorithms [JWA].
            jwk.encode_string_field(JwkStringField::K, data);

            // Step 2.4. Set the alg attribute of jwk to "A{bits}{mode}".
            jwk.alg = Some(aes_algorithm.jwk_alg(data.len()));

            // Step 2.5. Set the key_ops attribute of jwk to equal the [[usages]] internal slot of
            // key.
            jwk.set_key_ops(key.usages());

            // Step 2.6. Set the ext attribute of jwk to equal the [[extractable]] internal slot
            // of key.
            jwk.ext = Some(key.extractable());

            // Step 2.7. Let result be jwk.
            Ok(ExportedKey::Jwk(Box::new(jwk)))
        },
        // Otherwise:
        _ => {
            // throw a NotSupportedError.
            Err(Error::NotSupported(Some(format!(
                "Unsupported export key format for {}: {}",
                aes_algorithm.name(),
                format.as_str()
            ))))
        },
    }
}

/// <https://w3c.github.io/webcrypto/#aes-ctr-operations-get-key-length>
pub(crate) fn get_key_length(
    normalized_derived_key_algorithm: &SubtleAesDerivedKeyParams,
) -> Fallible<Option<u32>> {
    // Step 1. If the length member of normalizedDerivedKeyAlgorithm is not 128, 192 or 256,
    // then throw an OperationError.
    if !matches!(normalized_derived_key_algorithm.length, 128 | 192 | 256) {
        return Err(Error::Operation(Some(
            "The length member of the algorithm is not 128, 192 or 256".to_string(),
        )));
    }

    // Step 2. Return the length member of normalizedDerivedKeyAlgorithm.
    Ok(Some(normalized_derived_key_algorithm.length as u32))
}
