/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use webcrypto::{Algorithm, JsonWebKey, KeyAlgorithmAndDerivatives, KeyFormat, KeyUsage};

use crate::{bytes, crypto, error_name, jwk, secret_key};

fn hmac(hash: &str) -> Algorithm {
    Algorithm::new("HMAC").with("hash", hash)
}

#[tokio::test]
async fn test_hmac_rfc4231_vector() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let key = subtle
        .import_key(
            KeyFormat::Raw,
            b"Jefe".as_slice(),
            hmac("SHA-256"),
            false,
            &[KeyUsage::Sign, KeyUsage::Verify],
        )
        .await
        .unwrap();
    let message = b"what do ya want for nothing?";

    let signature = subtle.sign("HMAC", &key, message).await.unwrap();
    assert_eq!(
        hex::encode(&signature),
        "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
    );
    assert!(subtle.verify("HMAC", &key, &signature, message).await.unwrap());

    let mut tampered = signature.clone();
    tampered[31] ^= 1;
    assert!(!subtle.verify("HMAC", &key, &tampered, message).await.unwrap());
    assert!(
        !subtle
            .verify("HMAC", &key, &signature[..16], message)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_hmac_generate_key_lengths() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();

    // The default length is the block size of the hash.
    let key = secret_key(
        subtle
            .generate_key(hmac("SHA-512"), true, &[KeyUsage::Sign])
            .await,
    );
    let KeyAlgorithmAndDerivatives::HmacKeyAlgorithm(algorithm) = key.algorithm() else {
        panic!("not an HMAC key algorithm");
    };
    assert_eq!(algorithm.length, 1024);
    assert_eq!(algorithm.hash.name, "SHA-512");
    assert_eq!(bytes(subtle.export_key(KeyFormat::Raw, &key).await).len(), 128);

    // Lengths that are not whole bytes leave the trailing bits clear.
    let key = secret_key(
        subtle
            .generate_key(hmac("SHA-1").with("length", 100u32), true, &[KeyUsage::Sign])
            .await,
    );
    let raw = bytes(subtle.export_key(KeyFormat::Raw, &key).await);
    assert_eq!(raw.len(), 13);
    assert_eq!(raw[12] & 0x0f, 0);

    assert_eq!(
        error_name(
            subtle
                .generate_key(hmac("SHA-1").with("length", 0u32), true, &[KeyUsage::Sign])
                .await
        ),
        "OperationError"
    );
    assert_eq!(
        error_name(
            subtle
                .generate_key(hmac("SHA-256"), true, &[KeyUsage::Encrypt])
                .await
        ),
        "SyntaxError"
    );
}

#[tokio::test]
async fn test_hmac_import_length_must_match_key_data() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let import = |length: Option<u32>, data: Vec<u8>| {
        let mut algorithm = hmac("SHA-256");
        if let Some(length) = length {
            algorithm = algorithm.with("length", length);
        }
        subtle.import_key(KeyFormat::Raw, data, algorithm, true, &[KeyUsage::Sign])
    };

    for length in [121, 128] {
        assert!(import(Some(length), vec![1; 16]).await.is_ok());
    }
    for length in [120, 129] {
        assert_eq!(error_name(import(Some(length), vec![1; 16]).await), "DataError");
    }
    assert_eq!(error_name(import(None, Vec::new()).await), "DataError");
}

#[tokio::test]
async fn test_hmac_jwk() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let key = subtle
        .import_key(
            KeyFormat::Raw,
            b"Jefe".as_slice(),
            hmac("SHA-384"),
            true,
            &[KeyUsage::Verify, KeyUsage::Sign],
        )
        .await
        .unwrap();

    let exported = jwk(subtle.export_key(KeyFormat::Jwk, &key).await);
    assert_eq!(exported.kty.as_deref(), Some("oct"));
    assert_eq!(exported.k.as_deref(), Some("SmVmZQ"));
    assert_eq!(exported.alg.as_deref(), Some("HS384"));
    assert_eq!(
        exported.key_ops,
        Some(vec!["sign".to_string(), "verify".to_string()])
    );

    let imported = subtle
        .import_key(KeyFormat::Jwk, exported.clone(), hmac("SHA-384"), true, &[KeyUsage::Sign])
        .await
        .unwrap();
    assert_eq!(bytes(subtle.export_key(KeyFormat::Raw, &imported).await), b"Jefe");

    // The alg member must agree with the requested hash.
    assert_eq!(
        error_name(
            subtle
                .import_key(
                    KeyFormat::Jwk,
                    exported.clone(),
                    hmac("SHA-256"),
                    true,
                    &[KeyUsage::Sign],
                )
                .await
        ),
        "DataError"
    );

    let encryption_key = JsonWebKey {
        use_: Some("enc".to_string()),
        ..exported.clone()
    };
    assert_eq!(
        error_name(
            subtle
                .import_key(
                    KeyFormat::Jwk,
                    encryption_key,
                    hmac("SHA-384"),
                    true,
                    &[KeyUsage::Sign],
                )
                .await
        ),
        "DataError"
    );

    let not_extractable = JsonWebKey {
        ext: Some(false),
        ..exported
    };
    assert_eq!(
        error_name(
            subtle
                .import_key(
                    KeyFormat::Jwk,
                    not_extractable,
                    hmac("SHA-384"),
                    true,
                    &[KeyUsage::Sign],
                )
                .await
        ),
        "DataError"
    );
}
