/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use webcrypto::{
    Algorithm, CryptoKey, CryptoKeyPair, JsonWebKey, KeyAlgorithmAndDerivatives, KeyFormat,
    KeyType, KeyUsage, SubtleCrypto,
};

use crate::{bytes, crypto, error_name, jwk, key_pair};

fn rsa_hashed(name: &str, hash: &str) -> Algorithm {
    Algorithm::new(name).with("hash", hash)
}

fn rsa_key_gen(name: &str, modulus_length: u32, hash: &str) -> Algorithm {
    rsa_hashed(name, hash)
        .with("modulusLength", modulus_length)
        .with("publicExponent", &[1u8, 0, 1])
}

async fn generate(subtle: &SubtleCrypto, name: &str, usages: &[KeyUsage]) -> CryptoKeyPair {
    key_pair(
        subtle
            .generate_key(rsa_key_gen(name, 1024, "SHA-256"), true, usages)
            .await,
    )
}

/// Import both halves of `pair` under another RSA algorithm.
async fn reimport(
    subtle: &SubtleCrypto,
    pair: &CryptoKeyPair,
    name: &str,
    public_usages: &[KeyUsage],
    private_usages: &[KeyUsage],
) -> (Arc<CryptoKey>, Arc<CryptoKey>) {
    let spki = bytes(subtle.export_key(KeyFormat::Spki, &pair.public_key).await);
    let pkcs8 = bytes(subtle.export_key(KeyFormat::Pkcs8, &pair.private_key).await);
    let public_key = subtle
        .import_key(KeyFormat::Spki, spki, rsa_hashed(name, "SHA-256"), true, public_usages)
        .await
        .unwrap();
    let private_key = subtle
        .import_key(KeyFormat::Pkcs8, pkcs8, rsa_hashed(name, "SHA-256"), true, private_usages)
        .await
        .unwrap();
    (public_key, private_key)
}

#[tokio::test]
async fn test_rsa_generate_key() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let pair = generate(subtle, "RSASSA-PKCS1-v1_5", &[KeyUsage::Sign, KeyUsage::Verify]).await;

    assert_eq!(pair.public_key.key_type(), KeyType::Public);
    assert_eq!(pair.public_key.usages(), &[KeyUsage::Verify]);
    assert_eq!(pair.private_key.key_type(), KeyType::Private);
    assert_eq!(pair.private_key.usages(), &[KeyUsage::Sign]);

    let KeyAlgorithmAndDerivatives::RsaHashedKeyAlgorithm(algorithm) = pair.public_key.algorithm()
    else {
        panic!("not an RSA hashed key algorithm");
    };
    assert_eq!(algorithm.name, "RSASSA-PKCS1-v1_5");
    assert_eq!(algorithm.modulus_length, 1024);
    assert_eq!(algorithm.public_exponent, vec![1, 0, 1]);
    assert_eq!(algorithm.hash.name, "SHA-256");

    // The echoed exponent is minimal.
    let pair = key_pair(
        subtle
            .generate_key(
                rsa_hashed("RSASSA-PKCS1-v1_5", "SHA-256")
                    .with("modulusLength", 512u32)
                    .with("publicExponent", &[0u8, 1, 0, 1]),
                true,
                &[KeyUsage::Sign],
            )
            .await,
    );
    let KeyAlgorithmAndDerivatives::RsaHashedKeyAlgorithm(algorithm) =
        pair.private_key.algorithm()
    else {
        panic!("not an RSA hashed key algorithm");
    };
    assert_eq!(algorithm.public_exponent, vec![1, 0, 1]);

    assert_eq!(
        error_name(
            subtle
                .generate_key(rsa_key_gen("RSA-PSS", 1024, "SHA-256"), true, &[
                    KeyUsage::Encrypt
                ])
                .await
        ),
        "SyntaxError"
    );
    assert_eq!(
        error_name(
            subtle
                .generate_key(rsa_key_gen("RSA-PSS", 128, "SHA-256"), true, &[KeyUsage::Sign])
                .await
        ),
        "OperationError"
    );
    assert_eq!(
        error_name(
            subtle
                .generate_key(
                    rsa_hashed("RSA-PSS", "SHA-256")
                        .with("modulusLength", 1024u32)
                        .with("publicExponent", &[1u8, 0, 0, 0, 1]),
                    true,
                    &[KeyUsage::Sign],
                )
                .await
        ),
        "NotSupportedError"
    );
    // Zero, one and even exponents have no inverse modulo phi(n).
    let exponents: [&[u8]; 6] = [
        &[],
        &[0x00],
        &[0x01],
        &[0x02],
        &[0x00, 0x00],
        &[0x01, 0x00, 0x00],
    ];
    for exponent in exponents {
        assert_eq!(
            error_name(
                subtle
                    .generate_key(
                        rsa_hashed("RSASSA-PKCS1-v1_5", "SHA-256")
                            .with("modulusLength", 512u32)
                            .with("publicExponent", exponent),
                        true,
                        &[KeyUsage::Sign],
                    )
                    .await
            ),
            "OperationError"
        );
    }
    assert_eq!(
        error_name(
            subtle
                .generate_key(rsa_key_gen("RSA-OAEP", 1024, "SHA-224"), true, &[
                    KeyUsage::Encrypt
                ])
                .await
        ),
        "NotSupportedError"
    );
}

#[tokio::test]
async fn test_rsassa_pkcs1_v1_5_and_pss() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let pair = generate(subtle, "RSASSA-PKCS1-v1_5", &[KeyUsage::Sign, KeyUsage::Verify]).await;
    let message = b"message to be signed";

    // PKCS#1 v1.5 signatures are deterministic.
    let signature = subtle
        .sign("RSASSA-PKCS1-v1_5", &pair.private_key, message)
        .await
        .unwrap();
    assert_eq!(signature.len(), 128);
    assert_eq!(
        subtle
            .sign("RSASSA-PKCS1-v1_5", &pair.private_key, message)
            .await
            .unwrap(),
        signature
    );
    assert!(
        subtle
            .verify("RSASSA-PKCS1-v1_5", &pair.public_key, &signature, message)
            .await
            .unwrap()
    );
    assert!(
        !subtle
            .verify("RSASSA-PKCS1-v1_5", &pair.public_key, &signature, b"other")
            .await
            .unwrap()
    );
    assert_eq!(
        error_name(
            subtle
                .verify("RSASSA-PKCS1-v1_5", &pair.private_key, &signature, message)
                .await
        ),
        "InvalidAccessError"
    );

    // The same key material as RSA-PSS.
    let (public_key, private_key) =
        reimport(subtle, &pair, "RSA-PSS", &[KeyUsage::Verify], &[KeyUsage::Sign]).await;
    let pss = Algorithm::new("RSA-PSS").with("saltLength", 32u32);
    let first = subtle.sign(pss.clone(), &private_key, message).await.unwrap();
    let second = subtle.sign(pss.clone(), &private_key, message).await.unwrap();
    assert_ne!(first, second);
    for signature in [&first, &second] {
        assert!(
            subtle
                .verify(pss.clone(), &public_key, signature, message)
                .await
                .unwrap()
        );
    }
    let mut tampered = first.clone();
    tampered[0] ^= 1;
    assert!(
        !subtle
            .verify(pss.clone(), &public_key, &tampered, message)
            .await
            .unwrap()
    );

    // A salt which does not fit in the encoded message.
    assert_eq!(
        error_name(
            subtle
                .sign(
                    Algorithm::new("RSA-PSS").with("saltLength", 200u32),
                    &private_key,
                    message,
                )
                .await
        ),
        "OperationError"
    );
    assert_eq!(
        error_name(subtle.sign("RSA-PSS", &private_key, message).await),
        "TypeError"
    );
}

#[tokio::test]
async fn test_rsa_oaep() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let pair = generate(subtle, "RSA-OAEP", &[KeyUsage::Encrypt, KeyUsage::Decrypt]).await;
    let labelled = Algorithm::new("RSA-OAEP").with("label", b"label".as_slice());

    let ciphertext = subtle
        .encrypt(labelled.clone(), &pair.public_key, b"secret")
        .await
        .unwrap();
    assert_eq!(ciphertext.len(), 128);
    assert_eq!(
        subtle
            .decrypt(labelled.clone(), &pair.private_key, &ciphertext)
            .await
            .unwrap(),
        b"secret"
    );
    assert_eq!(
        error_name(
            subtle
                .decrypt("RSA-OAEP", &pair.private_key, &ciphertext)
                .await
        ),
        "OperationError"
    );

    let unlabelled = subtle
        .encrypt("RSA-OAEP", &pair.public_key, b"")
        .await
        .unwrap();
    assert!(
        subtle
            .decrypt("RSA-OAEP", &pair.private_key, &unlabelled)
            .await
            .unwrap()
            .is_empty()
    );

    // k - 2 * hLen - 2 bytes fit in a 1024-bit modulus with SHA-256.
    assert!(
        subtle
            .encrypt("RSA-OAEP", &pair.public_key, &[0; 62])
            .await
            .is_ok()
    );
    assert_eq!(
        error_name(subtle.encrypt("RSA-OAEP", &pair.public_key, &[0; 63]).await),
        "OperationError"
    );
    assert_eq!(
        error_name(
            subtle
                .encrypt("RSA-OAEP", &pair.private_key, b"secret")
                .await
        ),
        "InvalidAccessError"
    );

    // Labels are arbitrary bytes.
    let binary = Algorithm::new("RSA-OAEP").with("label", [0xffu8, 0xfe].as_slice());
    let ciphertext = subtle
        .encrypt(binary.clone(), &pair.public_key, b"secret")
        .await
        .unwrap();
    assert_eq!(
        subtle
            .decrypt(binary, &pair.private_key, &ciphertext)
            .await
            .unwrap(),
        b"secret"
    );
    assert_eq!(
        error_name(
            subtle
                .decrypt(labelled.clone(), &pair.private_key, &ciphertext)
                .await
        ),
        "OperationError"
    );
    assert_eq!(
        error_name(
            subtle
                .decrypt("RSA-OAEP", &pair.private_key, &ciphertext[1..])
                .await
        ),
        "OperationError"
    );
}

#[tokio::test]
async fn test_rsa_key_formats() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let pair = generate(subtle, "RSA-PSS", &[KeyUsage::Sign, KeyUsage::Verify]).await;
    let pss = Algorithm::new("RSA-PSS").with("saltLength", 0u32);
    let message = b"message";
    let signature = subtle.sign(pss.clone(), &pair.private_key, message).await.unwrap();

    assert_eq!(
        error_name(subtle.export_key(KeyFormat::Spki, &pair.private_key).await),
        "InvalidAccessError"
    );
    assert_eq!(
        error_name(subtle.export_key(KeyFormat::Pkcs8, &pair.public_key).await),
        "InvalidAccessError"
    );
    assert_eq!(
        error_name(subtle.export_key(KeyFormat::Raw, &pair.public_key).await),
        "NotSupportedError"
    );

    let private_jwk = jwk(subtle.export_key(KeyFormat::Jwk, &pair.private_key).await);
    assert_eq!(private_jwk.kty.as_deref(), Some("RSA"));
    assert_eq!(private_jwk.alg.as_deref(), Some("PS256"));
    assert_eq!(private_jwk.e.as_deref(), Some("AQAB"));
    for field in [
        &private_jwk.n,
        &private_jwk.d,
        &private_jwk.p,
        &private_jwk.q,
        &private_jwk.dp,
        &private_jwk.dq,
        &private_jwk.qi,
    ] {
        assert!(field.is_some());
    }

    let private_key = subtle
        .import_key(
            KeyFormat::Jwk,
            private_jwk.clone(),
            rsa_hashed("RSA-PSS", "SHA-256"),
            true,
            &[KeyUsage::Sign],
        )
        .await
        .unwrap();
    assert_eq!(
        bytes(subtle.export_key(KeyFormat::Pkcs8, &private_key).await),
        bytes(subtle.export_key(KeyFormat::Pkcs8, &pair.private_key).await)
    );

    let public_jwk = JsonWebKey {
        d: None,
        p: None,
        q: None,
        dp: None,
        dq: None,
        qi: None,
        key_ops: None,
        ..private_jwk.clone()
    };
    let public_key = subtle
        .import_key(
            KeyFormat::Jwk,
            public_jwk,
            rsa_hashed("RSA-PSS", "SHA-256"),
            true,
            &[KeyUsage::Verify],
        )
        .await
        .unwrap();
    assert!(
        subtle
            .verify(pss, &public_key, &signature, message)
            .await
            .unwrap()
    );

    // The alg member names SHA-256, not SHA-384.
    assert_eq!(
        error_name(
            subtle
                .import_key(
                    KeyFormat::Jwk,
                    private_jwk.clone(),
                    rsa_hashed("RSA-PSS", "SHA-384"),
                    true,
                    &[KeyUsage::Sign],
                )
                .await
        ),
        "DataError"
    );
    // A PSS alg is not an RSASSA-PKCS1-v1_5 alg.
    assert_eq!(
        error_name(
            subtle
                .import_key(
                    KeyFormat::Jwk,
                    private_jwk.clone(),
                    rsa_hashed("RSASSA-PKCS1-v1_5", "SHA-256"),
                    true,
                    &[KeyUsage::Sign],
                )
                .await
        ),
        "DataError"
    );
    let inconsistent = JsonWebKey {
        dp: private_jwk.dq.clone(),
        ..private_jwk
    };
    assert_eq!(
        error_name(
            subtle
                .import_key(
                    KeyFormat::Jwk,
                    inconsistent,
                    rsa_hashed("RSA-PSS", "SHA-256"),
                    true,
                    &[KeyUsage::Sign],
                )
                .await
        ),
        "DataError"
    );
    assert_eq!(
        error_name(
            subtle
                .import_key(
                    KeyFormat::Spki,
                    vec![0x30, 0x03, 0x02, 0x01, 0x01],
                    rsa_hashed("RSA-PSS", "SHA-256"),
                    true,
                    &[KeyUsage::Verify],
                )
                .await
        ),
        "DataError"
    );
}
