/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use hkdf::Hkdf;
use sha2::Sha384;
use webcrypto::{Algorithm, CryptoKey, KeyAlgorithmAndDerivatives, KeyFormat, KeyUsage};
use webcrypto::SubtleCrypto;

use crate::{bytes, crypto, error_name};

struct HkdfVector {
    hash: &'static str,
    ikm: &'static str,
    salt: &'static str,
    info: &'static str,
    okm: &'static str,
}

/// The test cases of RFC 5869, Appendix A.
const RFC5869_VECTORS: [HkdfVector; 7] = [
    HkdfVector {
        hash: "SHA-256",
        ikm: "0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b",
        salt: "000102030405060708090a0b0c",
        info: "f0f1f2f3f4f5f6f7f8f9",
        okm: "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf34007208d5b887185865",
    },
    HkdfVector {
        hash: "SHA-256",
        ikm: "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f\
              202122232425262728292a2b2c2d2e2f303132333435363738393a3b3c3d3e3f\
              404142434445464748494a4b4c4d4e4f",
        salt: "606162636465666768696a6b6c6d6e6f707172737475767778797a7b7c7d7e7f\
               808182838485868788898a8b8c8d8e8f909192939495969798999a9b9c9d9e9f\
               a0a1a2a3a4a5a6a7a8a9aaabacadaeaf",
        info: "b0b1b2b3b4b5b6b7b8b9babbbcbdbebfc0c1c2c3c4c5c6c7c8c9cacbcccdcecf\
               d0d1d2d3d4d5d6d7d8d9dadbdcdddedfe0e1e2e3e4e5e6e7e8e9eaebecedeeef\
               f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff",
        okm: "b11e398dc80327a1c8e7f78c596a49344f012eda2d4efad8a050cc4c19afa97c\
              59045a99cac7827271cb41c65e590e09da3275600c2f09b8367793a9aca3db71\
              cc30c58179ec3e87c14c01d5c1f3434f1d87",
    },
    HkdfVector {
        hash: "SHA-256",
        ikm: "0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b",
        salt: "",
        info: "",
        okm: "8da4e775a563c18f715f802a063c5a31b8a11f5c5ee1879ec3454e5f3c738d2d9d201395faa4b61a96c8",
    },
    HkdfVector {
        hash: "SHA-1",
        ikm: "0b0b0b0b0b0b0b0b0b0b0b",
        salt: "000102030405060708090a0b0c",
        info: "f0f1f2f3f4f5f6f7f8f9",
        okm: "085a01ea1b10f36933068b56efa5ad81a4f14b822f5b091568a9cdd4f155fda2c22e422478d305f3f896",
    },
    HkdfVector {
        hash: "SHA-1",
        ikm: "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f\
              202122232425262728292a2b2c2d2e2f303132333435363738393a3b3c3d3e3f\
              404142434445464748494a4b4c4d4e4f",
        salt: "606162636465666768696a6b6c6d6e6f707172737475767778797a7b7c7d7e7f\
               808182838485868788898a8b8c8d8e8f909192939495969798999a9b9c9d9e9f\
               a0a1a2a3a4a5a6a7a8a9aaabacadaeaf",
        info: "b0b1b2b3b4b5b6b7b8b9babbbcbdbebfc0c1c2c3c4c5c6c7c8c9cacbcccdcecf\
               d0d1d2d3d4d5d6d7d8d9dadbdcdddedfe0e1e2e3e4e5e6e7e8e9eaebecedeeef\
               f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff",
        okm: "0bd770a74d1160f7c9f12cd5912a06ebff6adcae899d92191fe4305673ba2ffe\
              8fa3f1a4e5ad79f3f334b3b202b2173c486ea37ce3d397ed034c7f9dfeb15c5e\
              927336d0441f4c4300e2cff0d0900b52d3b4",
    },
    HkdfVector {
        hash: "SHA-1",
        ikm: "0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b",
        salt: "",
        info: "",
        okm: "0ac1af7002b3d761d1e55298da9d0506b9ae52057220a306e07b6b87e8df21d0ea00033de03984d34918",
    },
    HkdfVector {
        hash: "SHA-1",
        ikm: "0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c",
        salt: "",
        info: "",
        okm: "2c91117204d745f3500d636a62f64f0ab3bae548aa53d423b0d1f27ebba6f5e5673a081d70cce7acfc48",
    },
];

async fn import_derivation_key(
    subtle: &SubtleCrypto,
    name: &str,
    key_data: Vec<u8>,
    usages: &[KeyUsage],
) -> Arc<CryptoKey> {
    subtle
        .import_key(KeyFormat::Raw, key_data, name, false, usages)
        .await
        .unwrap()
}

fn hkdf(hash: &str, salt: Vec<u8>, info: Vec<u8>) -> Algorithm {
    Algorithm::new("HKDF")
        .with("hash", hash)
        .with("salt", salt)
        .with("info", info)
}

fn pbkdf2(hash: &str, salt: &[u8], iterations: u32) -> Algorithm {
    Algorithm::new("PBKDF2")
        .with("hash", hash)
        .with("salt", salt)
        .with("iterations", iterations)
}

#[tokio::test]
async fn test_hkdf_rfc5869_vectors() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();

    for vector in RFC5869_VECTORS.iter() {
        let key = import_derivation_key(
            subtle,
            "HKDF",
            hex::decode(vector.ikm).unwrap(),
            &[KeyUsage::DeriveBits],
        )
        .await;
        let okm = hex::decode(vector.okm).unwrap();
        let derived = subtle
            .derive_bits(
                hkdf(
                    vector.hash,
                    hex::decode(vector.salt).unwrap(),
                    hex::decode(vector.info).unwrap(),
                ),
                &key,
                Some(okm.len() as u32 * 8),
            )
            .await
            .unwrap();
        assert_eq!(hex::encode(derived), vector.okm);
    }
}

#[tokio::test]
async fn test_hkdf_matches_reference_implementation() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let ikm = b"input keying material".to_vec();
    let salt = b"some salt".to_vec();
    let info = b"context".to_vec();
    let key =
        import_derivation_key(subtle, "HKDF", ikm.clone(), &[KeyUsage::DeriveBits]).await;

    for length in [0usize, 8, 48, 100, 255 * 48] {
        let derived = subtle
            .derive_bits(
                hkdf("SHA-384", salt.clone(), info.clone()),
                &key,
                Some(length as u32 * 8),
            )
            .await
            .unwrap();
        let mut expected = vec![0; length];
        Hkdf::<Sha384>::new(Some(&salt), &ikm)
            .expand(&info, &mut expected)
            .unwrap();
        assert_eq!(derived, expected);
    }

    assert_eq!(
        error_name(
            subtle
                .derive_bits(
                    hkdf("SHA-384", salt.clone(), info.clone()),
                    &key,
                    Some((255 * 48 + 1) * 8),
                )
                .await
        ),
        "OperationError"
    );
}

#[tokio::test]
async fn test_hkdf_derive_bits_length_rules() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let key = import_derivation_key(subtle, "HKDF", vec![1; 16], &[KeyUsage::DeriveBits]).await;

    assert_eq!(
        error_name(
            subtle
                .derive_bits(hkdf("SHA-256", Vec::new(), Vec::new()), &key, None)
                .await
        ),
        "OperationError"
    );
    assert_eq!(
        error_name(
            subtle
                .derive_bits(hkdf("SHA-256", Vec::new(), Vec::new()), &key, Some(12))
                .await
        ),
        "OperationError"
    );
    // The salt and info members are required.
    assert_eq!(
        error_name(
            subtle
                .derive_bits(Algorithm::new("HKDF").with("hash", "SHA-256"), &key, Some(128))
                .await
        ),
        "TypeError"
    );
}

#[tokio::test]
async fn test_kdf_import_restrictions() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();

    for name in ["HKDF", "PBKDF2"] {
        assert_eq!(
            error_name(
                subtle
                    .import_key(KeyFormat::Raw, vec![1; 16], name, true, &[KeyUsage::DeriveBits])
                    .await
            ),
            "SyntaxError"
        );
        assert_eq!(
            error_name(
                subtle
                    .import_key(KeyFormat::Raw, vec![1; 16], name, false, &[KeyUsage::Sign])
                    .await
            ),
            "SyntaxError"
        );
        assert_eq!(
            error_name(
                subtle
                    .import_key(KeyFormat::Raw, vec![1; 16], name, false, &[])
                    .await
            ),
            "SyntaxError"
        );
        assert_eq!(
            error_name(
                subtle
                    .import_key(KeyFormat::Pkcs8, vec![1; 16], name, false, &[
                        KeyUsage::DeriveBits
                    ])
                    .await
            ),
            "NotSupportedError"
        );

        let key = import_derivation_key(subtle, name, vec![1; 16], &[KeyUsage::DeriveKey]).await;
        assert_eq!(
            serde_json::to_value(key.algorithm()).unwrap(),
            serde_json::json!({ "name": name })
        );
        assert_eq!(
            error_name(subtle.export_key(KeyFormat::Raw, &key).await),
            "InvalidAccessError"
        );
    }
}

#[tokio::test]
async fn test_pbkdf2_rfc6070_vectors() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let key = import_derivation_key(
        subtle,
        "PBKDF2",
        b"password".to_vec(),
        &[KeyUsage::DeriveBits],
    )
    .await;

    for (iterations, expected) in [
        (1, "0c60c80f961f0e71f3a9b524af6012062fe037a6"),
        (2, "ea6c014dc72d6f8ccd1ed92ace1d41f0d8de8957"),
        (4096, "4b007901b765489abead49d926f721d065a429c1"),
    ] {
        let derived = subtle
            .derive_bits(pbkdf2("SHA-1", b"salt", iterations), &key, Some(160))
            .await
            .unwrap();
        assert_eq!(hex::encode(derived), expected);
    }

    let derived = subtle
        .derive_bits(pbkdf2("SHA-256", b"salt", 4096), &key, Some(256))
        .await
        .unwrap();
    assert_eq!(
        hex::encode(derived),
        "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a"
    );
}

#[tokio::test]
async fn test_pbkdf2_rejects_bad_parameters() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let key = import_derivation_key(
        subtle,
        "PBKDF2",
        b"password".to_vec(),
        &[KeyUsage::DeriveBits],
    )
    .await;

    assert_eq!(
        error_name(
            subtle
                .derive_bits(pbkdf2("SHA-256", b"salt", 0), &key, Some(256))
                .await
        ),
        "OperationError"
    );
    assert_eq!(
        error_name(
            subtle
                .derive_bits(pbkdf2("SHA-256", b"salt", 1), &key, Some(255))
                .await
        ),
        "OperationError"
    );
    assert_eq!(
        error_name(subtle.derive_bits(pbkdf2("SHA-256", b"salt", 1), &key, None).await),
        "OperationError"
    );
    assert!(
        subtle
            .derive_bits(pbkdf2("SHA-256", b"salt", 1), &key, Some(0))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_derive_key_uses_the_derived_key_length() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let key = import_derivation_key(
        subtle,
        "PBKDF2",
        b"password".to_vec(),
        &[KeyUsage::DeriveKey, KeyUsage::DeriveBits],
    )
    .await;
    let algorithm = pbkdf2("SHA-256", b"salt", 1000);

    let aes_key = subtle
        .derive_key(
            algorithm.clone(),
            &key,
            Algorithm::new("AES-GCM").with("length", 256u16),
            true,
            &[KeyUsage::Encrypt],
        )
        .await
        .unwrap();
    let bits = subtle
        .derive_bits(algorithm.clone(), &key, Some(256))
        .await
        .unwrap();
    assert_eq!(bytes(subtle.export_key(KeyFormat::Raw, &aes_key).await), bits);

    // HMAC keys default to the block size of their hash.
    let hmac_key = subtle
        .derive_key(
            algorithm.clone(),
            &key,
            Algorithm::new("HMAC").with("hash", "SHA-384"),
            true,
            &[KeyUsage::Sign],
        )
        .await
        .unwrap();
    let KeyAlgorithmAndDerivatives::HmacKeyAlgorithm(hmac_algorithm) = hmac_key.algorithm() else {
        panic!("not an HMAC key algorithm");
    };
    assert_eq!(hmac_algorithm.length, 1024);
    assert_eq!(bytes(subtle.export_key(KeyFormat::Raw, &hmac_key).await).len(), 128);

    assert_eq!(
        error_name(
            subtle
                .derive_key(
                    algorithm.clone(),
                    &key,
                    Algorithm::new("HMAC").with("hash", "SHA-384").with("length", 0u32),
                    true,
                    &[KeyUsage::Sign],
                )
                .await
        ),
        "TypeError"
    );
    assert_eq!(
        error_name(
            subtle
                .derive_key(
                    algorithm.clone(),
                    &key,
                    Algorithm::new("AES-CBC").with("length", 64u16),
                    true,
                    &[KeyUsage::Encrypt],
                )
                .await
        ),
        "OperationError"
    );
    // HKDF keys have no fixed length, so PBKDF2 is asked for a null length.
    assert_eq!(
        error_name(
            subtle
                .derive_key(algorithm, &key, "HKDF", false, &[KeyUsage::DeriveBits])
                .await
        ),
        "OperationError"
    );
}
