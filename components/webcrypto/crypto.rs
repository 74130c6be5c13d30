/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use log::debug;
use pkcs8::rand_core::{OsRng, RngCore};
use uuid::Uuid;

use crate::error::{Error, Fallible};
use crate::prefs::Preferences;
use crate::subtlecrypto::SubtleCrypto;

/// The largest byte length `getRandomValues` fills in a single call.
const MAX_RANDOM_VALUES_LENGTH: usize = 65536;

/// A mutable view over the storage of a typed array, as passed to `getRandomValues`.
#[derive(Debug)]
pub enum ArrayBufferViewMut<'a> {
    Int8(&'a mut [i8]),
    Uint8(&'a mut [u8]),
    Uint8Clamped(&'a mut [u8]),
    Int16(&'a mut [i16]),
    Uint16(&'a mut [u16]),
    Int32(&'a mut [i32]),
    Uint32(&'a mut [u32]),
    BigInt64(&'a mut [i64]),
    BigUint64(&'a mut [u64]),
    Float32(&'a mut [f32]),
    Float64(&'a mut [f64]),
    DataView(&'a mut [u8]),
}

impl ArrayBufferViewMut<'_> {
    /// The underlying bytes of an integer-typed view, or `None` for any other view.
    fn integer_bytes_mut(&mut self) -> Option<&mut [u8]> {
        match self {
            ArrayBufferViewMut::Int8(data) => Some(bytemuck::cast_slice_mut(&mut **data)),
            ArrayBufferViewMut::Uint8(data) | ArrayBufferViewMut::Uint8Clamped(data) => {
                Some(&mut **data)
            },
            ArrayBufferViewMut::Int16(data) => Some(bytemuck::cast_slice_mut(&mut **data)),
            ArrayBufferViewMut::Uint16(data) => Some(bytemuck::cast_slice_mut(&mut **data)),
            ArrayBufferViewMut::Int32(data) => Some(bytemuck::cast_slice_mut(&mut **data)),
            ArrayBufferViewMut::Uint32(data) => Some(bytemuck::cast_slice_mut(&mut **data)),
            ArrayBufferViewMut::BigInt64(data) => Some(bytemuck::cast_slice_mut(&mut **data)),
            ArrayBufferViewMut::BigUint64(data) => Some(bytemuck::cast_slice_mut(&mut **data)),
            ArrayBufferViewMut::Float32(_) |
            ArrayBufferViewMut::Float64(_) |
            ArrayBufferViewMut::DataView(_) => None,
        }
    }
}

/// <https://w3c.github.io/webcrypto/#crypto-interface>
#[derive(Debug)]
pub struct Crypto {
    subtle: Option<SubtleCrypto>,
}

impl Crypto {
    pub fn new(prefs: Preferences) -> Crypto {
        let subtle = prefs
            .dom_crypto_subtle_enabled
            .then(|| SubtleCrypto::new(prefs));
        Crypto { subtle }
    }

    /// <https://w3c.github.io/webcrypto/#dom-crypto-subtle>
    pub fn subtle(&self) -> Option<&SubtleCrypto> {
        self.subtle.as_ref()
    }

    /// <https://w3c.github.io/webcrypto/#Crypto-method-getRandomValues>
    pub fn get_random_values(&self, mut array: ArrayBufferViewMut) -> Fallible<()> {
        // Step 1. If array is not an Int8Array, Uint8Array, Uint8ClampedArray, Int16Array,
        // Uint16Array, Int32Array, Uint32Array, BigInt64Array, or BigUint64Array, then throw a
        // TypeMismatchError and terminate the algorithm.
        let Some(data) = array.integer_bytes_mut() else {
            return Err(Error::TypeMismatch(Some(
                "The array is not an integer-typed array".to_string(),
            )));
        };

        // Step 2. Let byteLength be the byte length of array.
        // Step 3. If byteLength is greater than 65536, throw a QuotaExceededError and terminate
        // the algorithm.
        if data.len() > MAX_RANDOM_VALUES_LENGTH {
            debug!("getRandomValues called with {} bytes", data.len());
            return Err(Error::QuotaExceeded(Some(format!(
                "The byte length ({}) exceeds the number of bytes of entropy available via this \
                 API ({MAX_RANDOM_VALUES_LENGTH})",
                data.len()
            ))));
        }

        // Step 4. Overwrite all elements of array with cryptographically strong random values of
        // the appropriate type.
        OsRng
            .try_fill_bytes(data)
            .map_err(|_| Error::Operation(Some("Failed to gather entropy".to_string())))?;

        // Step 5. Return array.
        Ok(())
    }

    /// <https://w3c.github.io/webcrypto/#Crypto-method-randomUUID>
    pub fn random_uuid(&self) -> String {
        Uuid::new_v4().hyphenated().to_string()
    }
}
