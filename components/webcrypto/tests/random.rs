/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::collections::HashSet;

use webcrypto::{ArrayBufferViewMut, Crypto, Preferences};

use crate::{crypto, error_name, init_logger};

#[test]
fn test_get_random_values_fills_the_array() {
    let crypto = crypto();

    let mut data = [0u8; 64];
    crypto
        .get_random_values(ArrayBufferViewMut::Uint8(&mut data))
        .unwrap();
    assert!(data.iter().any(|byte| *byte != 0));

    // The limit applies to the byte length, not the element count.
    let mut data = vec![0u32; 16384];
    crypto
        .get_random_values(ArrayBufferViewMut::Uint32(&mut data))
        .unwrap();
    assert!(data.iter().any(|word| *word != 0));

    let mut data = [0i64; 4];
    crypto
        .get_random_values(ArrayBufferViewMut::BigInt64(&mut data))
        .unwrap();
    assert!(data.iter().any(|word| *word != 0));

    let mut data: [u8; 0] = [];
    assert!(
        crypto
            .get_random_values(ArrayBufferViewMut::Uint8Clamped(&mut data))
            .is_ok()
    );
}

#[test]
fn test_get_random_values_rejections() {
    let crypto = crypto();

    let mut data = vec![0u8; 65537];
    assert_eq!(
        error_name(crypto.get_random_values(ArrayBufferViewMut::Uint8(&mut data))),
        "QuotaExceededError"
    );
    assert!(data.iter().all(|byte| *byte == 0));

    let mut data = vec![0u16; 32769];
    assert_eq!(
        error_name(crypto.get_random_values(ArrayBufferViewMut::Uint16(&mut data))),
        "QuotaExceededError"
    );

    let mut data = [0f32; 4];
    assert_eq!(
        error_name(crypto.get_random_values(ArrayBufferViewMut::Float32(&mut data))),
        "TypeMismatchError"
    );
    let mut data = [0u8; 4];
    assert_eq!(
        error_name(crypto.get_random_values(ArrayBufferViewMut::DataView(&mut data))),
        "TypeMismatchError"
    );
}

#[test]
fn test_random_uuid() {
    let crypto = crypto();
    let mut seen = HashSet::new();

    for _ in 0..64 {
        let uuid = crypto.random_uuid();
        assert_eq!(uuid.len(), 36);
        for (index, character) in uuid.char_indices() {
            match index {
                8 | 13 | 18 | 23 => assert_eq!(character, '-'),
                14 => assert_eq!(character, '4'),
                19 => assert!(matches!(character, '8' | '9' | 'a' | 'b')),
                _ => assert!(matches!(character, '0'..='9' | 'a'..='f')),
            }
        }
        assert!(seen.insert(uuid));
    }
}

#[test]
fn test_subtle_follows_preferences() {
    init_logger();
    let crypto = Crypto::new(Preferences {
        dom_crypto_subtle_enabled: false,
        ..Preferences::default()
    });
    assert!(crypto.subtle().is_none());
    assert_eq!(crypto.random_uuid().len(), 36);

    assert!(super::crypto().subtle().is_some());
}
