/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use aes::Aes128;
use aes::cipher::consts::{U12, U16};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{AesGcm, Nonce};
use webcrypto::{Algorithm, CryptoKey, KeyFormat, KeyUsage, SubtleCrypto};

use crate::{bytes, crypto, error_name, jwk, secret_key};

const NIST_KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
const NIST_PLAINTEXT: &str = "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51\
                              30c81c46a35ce411e5fbc1191a0a52eff69f2445df4f9b17ad2b417be66c3710";

async fn import_aes_key(subtle: &SubtleCrypto, name: &str, key: &str) -> Arc<CryptoKey> {
    subtle
        .import_key(
            KeyFormat::Raw,
            hex::decode(key).unwrap(),
            name,
            true,
            &[KeyUsage::Encrypt, KeyUsage::Decrypt],
        )
        .await
        .unwrap()
}

fn aes_ctr(counter: &[u8], length: u8) -> Algorithm {
    Algorithm::new("AES-CTR")
        .with("counter", counter)
        .with("length", length)
}

#[tokio::test]
async fn test_aes_ctr_nist_vector() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let key = import_aes_key(subtle, "AES-CTR", NIST_KEY).await;
    let counter = hex::decode("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff").unwrap();
    let plaintext = hex::decode(NIST_PLAINTEXT).unwrap();

    // The low 64 bits never wrap over four blocks, so both lengths agree.
    for length in [64, 128] {
        let ciphertext = subtle
            .encrypt(aes_ctr(&counter, length), &key, &plaintext)
            .await
            .unwrap();
        assert_eq!(
            hex::encode(&ciphertext),
            "874d6191b620e3261bef6864990db6ce9806f66b7970fdff8617187bb9fffdff\
             5ae4df3edbd5d35e5b4f09020db03eab1e031dda2fbe03d1792170a0f3009cee"
        );
        let decrypted = subtle
            .decrypt(aes_ctr(&counter, length), &key, &ciphertext)
            .await
            .unwrap();
        assert_eq!(decrypted, plaintext);
    }
}

#[tokio::test]
async fn test_aes_ctr_is_deterministic() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let key = import_aes_key(subtle, "AES-CTR", "36adfe538cc234279e4cbb29e1f27af5").await;
    let counter = hex::decode("2159e5bd415791990e52b5c825572994").unwrap();

    let ciphertext = subtle
        .encrypt(aes_ctr(&counter, 128), &key, b"Hello WebCrypto!")
        .await
        .unwrap();
    assert_eq!(hex::encode(&ciphertext), "0bdbe0f2de637f43b9d86f8bb0ba5f05");
    assert_eq!(
        subtle
            .encrypt(aes_ctr(&counter, 128), &key, b"Hello WebCrypto!")
            .await
            .unwrap(),
        ciphertext
    );
    assert_eq!(
        subtle
            .decrypt(aes_ctr(&counter, 128), &key, &ciphertext)
            .await
            .unwrap(),
        b"Hello WebCrypto!"
    );
}

#[tokio::test]
async fn test_aes_ctr_counter_wraps_within_length_bits() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let key = import_aes_key(subtle, "AES-CTR", NIST_KEY).await;
    let counter = hex::decode("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff").unwrap();

    // With a one bit counter the keystream repeats every two blocks.
    let keystream = subtle
        .encrypt(aes_ctr(&counter, 1), &key, &[0; 48])
        .await
        .unwrap();
    assert_eq!(keystream[0..16], keystream[32..48]);
    assert_ne!(keystream[0..16], keystream[16..32]);
    let mut second_counter = counter.clone();
    second_counter[15] = 0xfe;
    let second_block = subtle
        .encrypt(aes_ctr(&second_counter, 128), &key, &[0; 16])
        .await
        .unwrap();
    assert_eq!(keystream[16..32], second_block[..]);

    // With an eight bit counter only the last byte wraps to zero.
    let keystream = subtle
        .encrypt(aes_ctr(&counter, 8), &key, &[0; 32])
        .await
        .unwrap();
    let mut wrapped_counter = counter.clone();
    wrapped_counter[15] = 0x00;
    let wrapped_block = subtle
        .encrypt(aes_ctr(&wrapped_counter, 128), &key, &[0; 16])
        .await
        .unwrap();
    assert_eq!(keystream[16..32], wrapped_block[..]);
}

#[tokio::test]
async fn test_aes_ctr_rejects_bad_parameters() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let key = import_aes_key(subtle, "AES-CTR", NIST_KEY).await;
    let counter = [0; 16];

    assert_eq!(
        error_name(subtle.encrypt(aes_ctr(&counter, 0), &key, b"data").await),
        "OperationError"
    );
    assert_eq!(
        error_name(subtle.encrypt(aes_ctr(&counter, 129), &key, b"data").await),
        "OperationError"
    );
    assert_eq!(
        error_name(subtle.encrypt(aes_ctr(&counter[..8], 64), &key, b"data").await),
        "OperationError"
    );
    // The length member is an octet.
    assert_eq!(
        error_name(
            subtle
                .encrypt(
                    Algorithm::new("AES-CTR")
                        .with("counter", &counter)
                        .with("length", 256u16),
                    &key,
                    b"data",
                )
                .await
        ),
        "TypeError"
    );
}

#[tokio::test]
async fn test_aes_cbc_nist_vector() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let key = import_aes_key(subtle, "AES-CBC", NIST_KEY).await;
    let iv = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
    let plaintext = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();
    let algorithm = Algorithm::new("AES-CBC").with("iv", iv.clone());

    let ciphertext = subtle
        .encrypt(algorithm.clone(), &key, &plaintext)
        .await
        .unwrap();
    // A full block of padding follows the single block of plaintext.
    assert_eq!(ciphertext.len(), 32);
    assert_eq!(hex::encode(&ciphertext[..16]), "7649abac8119b246cee98e9b12e9197d");
    assert_eq!(
        subtle.decrypt(algorithm.clone(), &key, &ciphertext).await.unwrap(),
        plaintext
    );

    assert_eq!(
        error_name(subtle.decrypt(algorithm.clone(), &key, &ciphertext[..20]).await),
        "OperationError"
    );
    assert_eq!(
        error_name(
            subtle
                .encrypt(Algorithm::new("AES-CBC").with("iv", &iv[..12]), &key, &plaintext)
                .await
        ),
        "OperationError"
    );
}

#[tokio::test]
async fn test_aes_gcm_matches_reference_implementation() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let key = secret_key(
        subtle
            .generate_key(
                Algorithm::new("AES-GCM").with("length", 128u16),
                true,
                &[KeyUsage::Encrypt, KeyUsage::Decrypt],
            )
            .await,
    );
    let raw_key = bytes(subtle.export_key(KeyFormat::Raw, &key).await);
    let plaintext = b"The quick brown fox jumps over the lazy dog";
    let aad = b"header";

    // A 96-bit IV.
    let iv = [7u8; 12];
    let expected = AesGcm::<Aes128, U12>::new_from_slice(&raw_key)
        .unwrap()
        .encrypt(Nonce::<U12>::from_slice(&iv), Payload {
            msg: plaintext,
            aad,
        })
        .unwrap();
    let algorithm = Algorithm::new("AES-GCM")
        .with("iv", &iv)
        .with("additionalData", aad);
    let ciphertext = subtle
        .encrypt(algorithm.clone(), &key, plaintext)
        .await
        .unwrap();
    assert_eq!(ciphertext, expected);
    assert_eq!(
        subtle.decrypt(algorithm, &key, &ciphertext).await.unwrap(),
        plaintext
    );

    // A 128-bit IV goes through GHASH.
    let iv = [9u8; 16];
    let expected = AesGcm::<Aes128, U16>::new_from_slice(&raw_key)
        .unwrap()
        .encrypt(Nonce::<U16>::from_slice(&iv), Payload {
            msg: plaintext,
            aad,
        })
        .unwrap();
    let algorithm = Algorithm::new("AES-GCM")
        .with("iv", &iv)
        .with("additionalData", aad)
        .with("tagLength", 96u8);
    let ciphertext = subtle
        .encrypt(algorithm.clone(), &key, plaintext)
        .await
        .unwrap();
    // A 96-bit tag is the prefix of the full tag.
    assert_eq!(ciphertext[..], expected[..expected.len() - 4]);
    assert_eq!(
        subtle.decrypt(algorithm, &key, &ciphertext).await.unwrap(),
        plaintext
    );
}

#[tokio::test]
async fn test_aes_gcm_rejects_forgeries() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let key = import_aes_key(subtle, "AES-GCM", NIST_KEY).await;
    let algorithm = Algorithm::new("AES-GCM").with("iv", &[1u8; 12]);
    let mut ciphertext = subtle
        .encrypt(algorithm.clone(), &key, b"attack at dawn")
        .await
        .unwrap();

    ciphertext[0] ^= 1;
    assert_eq!(
        error_name(subtle.decrypt(algorithm.clone(), &key, &ciphertext).await),
        "OperationError"
    );
    assert_eq!(
        error_name(subtle.decrypt(algorithm.clone(), &key, &ciphertext[..15]).await),
        "OperationError"
    );
    assert_eq!(
        error_name(
            subtle
                .encrypt(
                    Algorithm::new("AES-GCM")
                        .with("iv", &[1u8; 12])
                        .with("tagLength", 48u8),
                    &key,
                    b"attack at dawn",
                )
                .await
        ),
        "OperationError"
    );
    assert_eq!(
        error_name(
            subtle
                .encrypt(Algorithm::new("AES-GCM").with("iv", Vec::<u8>::new()), &key, b"x")
                .await
        ),
        "OperationError"
    );
}

#[tokio::test]
async fn test_aes_kw_rfc3394_vector() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let wrapping_key = subtle
        .import_key(
            KeyFormat::Raw,
            hex::decode("000102030405060708090a0b0c0d0e0f").unwrap(),
            "AES-KW",
            false,
            &[KeyUsage::WrapKey, KeyUsage::UnwrapKey],
        )
        .await
        .unwrap();
    let key = import_aes_key(subtle, "AES-CBC", "00112233445566778899aabbccddeeff").await;

    let wrapped = subtle
        .wrap_key(KeyFormat::Raw, &key, &wrapping_key, "AES-KW")
        .await
        .unwrap();
    assert_eq!(
        hex::encode(&wrapped),
        "1fa68b0a8112b447aef34bd8fb5a7b829d3e862371d2cfe5"
    );

    let unwrapped = subtle
        .unwrap_key(
            KeyFormat::Raw,
            &wrapped,
            &wrapping_key,
            "AES-KW",
            "AES-CBC",
            true,
            &[KeyUsage::Encrypt],
        )
        .await
        .unwrap();
    assert_eq!(
        hex::encode(bytes(subtle.export_key(KeyFormat::Raw, &unwrapped).await)),
        "00112233445566778899aabbccddeeff"
    );

    let mut tampered = wrapped.clone();
    tampered[5] ^= 0x80;
    assert_eq!(
        error_name(
            subtle
                .unwrap_key(
                    KeyFormat::Raw,
                    &tampered,
                    &wrapping_key,
                    "AES-KW",
                    "AES-CBC",
                    true,
                    &[KeyUsage::Encrypt],
                )
                .await
        ),
        "OperationError"
    );
}

#[tokio::test]
async fn test_aes_kw_adds_one_semiblock() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let wrapping_key = secret_key(
        subtle
            .generate_key(
                Algorithm::new("AES-KW").with("length", 256u16),
                false,
                &[KeyUsage::WrapKey, KeyUsage::UnwrapKey],
            )
            .await,
    );

    for length in [16usize, 24, 32, 40, 64] {
        let key = subtle
            .import_key(
                KeyFormat::Raw,
                vec![0x5a; length],
                Algorithm::new("HMAC").with("hash", "SHA-256"),
                true,
                &[KeyUsage::Sign],
            )
            .await
            .unwrap();
        let wrapped = subtle
            .wrap_key(KeyFormat::Raw, &key, &wrapping_key, "AES-KW")
            .await
            .unwrap();
        assert_eq!(wrapped.len(), length + 8);

        let unwrapped = subtle
            .unwrap_key(
                KeyFormat::Raw,
                &wrapped,
                &wrapping_key,
                "AES-KW",
                Algorithm::new("HMAC").with("hash", "SHA-256"),
                true,
                &[KeyUsage::Sign],
            )
            .await
            .unwrap();
        assert_eq!(
            bytes(subtle.export_key(KeyFormat::Raw, &unwrapped).await),
            vec![0x5a; length]
        );
    }
}

#[tokio::test]
async fn test_aes_jwk_round_trip() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();
    let key = import_aes_key(subtle, "AES-CTR", NIST_KEY).await;

    let exported = jwk(subtle.export_key(KeyFormat::Jwk, &key).await);
    assert_eq!(exported.kty.as_deref(), Some("oct"));
    assert_eq!(exported.alg.as_deref(), Some("A128CTR"));
    assert_eq!(exported.k.as_deref(), Some("K34VFiiu0qar9xWICc9PPA"));
    assert_eq!(exported.ext, Some(true));
    assert_eq!(
        exported.key_ops,
        Some(vec!["encrypt".to_string(), "decrypt".to_string()])
    );

    let imported = subtle
        .import_key(KeyFormat::Jwk, exported.clone(), "AES-CTR", true, &[KeyUsage::Encrypt])
        .await
        .unwrap();
    assert_eq!(
        hex::encode(bytes(subtle.export_key(KeyFormat::Raw, &imported).await)),
        NIST_KEY
    );

    // The alg member names a different mode.
    assert_eq!(
        error_name(
            subtle
                .import_key(KeyFormat::Jwk, exported, "AES-CBC", true, &[KeyUsage::Encrypt])
                .await
        ),
        "DataError"
    );
}

#[tokio::test]
async fn test_aes_key_lengths() {
    let crypto = crypto();
    let subtle = crypto.subtle().unwrap();

    assert_eq!(
        error_name(
            subtle
                .generate_key(
                    Algorithm::new("AES-CBC").with("length", 64u16),
                    true,
                    &[KeyUsage::Encrypt],
                )
                .await
        ),
        "OperationError"
    );
    assert_eq!(
        error_name(
            subtle
                .import_key(KeyFormat::Raw, vec![0; 20], "AES-CBC", true, &[KeyUsage::Encrypt])
                .await
        ),
        "DataError"
    );
    let key = subtle
        .import_key(KeyFormat::Raw, vec![0; 24], "AES-GCM", true, &[KeyUsage::Encrypt])
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(key.algorithm()).unwrap(),
        serde_json::json!({"name": "AES-GCM", "length": 192})
    );
}
