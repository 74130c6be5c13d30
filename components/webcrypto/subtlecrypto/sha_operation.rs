/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use digest::Digest;
use log::warn;
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::error::{Error, Fallible};
use crate::subtlecrypto::{ALG_SHA1, ALG_SHA256, ALG_SHA384, ALG_SHA512, SubtleAlgorithm};

/// The hash functions of the SHA registration, as used by the algorithms that are parameterized
/// by a hash.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum HashFunction {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashFunction {
    /// Map a normalized hash algorithm name to its hash function.
    pub(crate) fn from_name(name: &str) -> Fallible<HashFunction> {
        match name {
            ALG_SHA1 => Ok(HashFunction::Sha1),
            ALG_SHA256 => Ok(HashFunction::Sha256),
            ALG_SHA384 => Ok(HashFunction::Sha384),
            ALG_SHA512 => Ok(HashFunction::Sha512),
            _ => Err(Error::NotSupported(Some(format!(
                "{name} is not a supported hash function"
            )))),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            HashFunction::Sha1 => ALG_SHA1,
            HashFunction::Sha256 => ALG_SHA256,
            HashFunction::Sha384 => ALG_SHA384,
            HashFunction::Sha512 => ALG_SHA512,
        }
    }

    /// Block size in bits.
    pub(crate) fn block_size(&self) -> u32 {
        match self {
            HashFunction::Sha1 | HashFunction::Sha256 => 512,
            HashFunction::Sha384 | HashFunction::Sha512 => 1024,
        }
    }

    /// Output size in bytes.
    pub(crate) fn output_size(&self) -> usize {
        match self {
            HashFunction::Sha1 => 20,
            HashFunction::Sha256 => 32,
            HashFunction::Sha384 => 48,
            HashFunction::Sha512 => 64,
        }
    }

    pub(crate) fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashFunction::Sha1 => Sha1::digest(data).to_vec(),
            HashFunction::Sha256 => Sha256::digest(data).to_vec(),
            HashFunction::Sha384 => Sha384::digest(data).to_vec(),
            HashFunction::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// SHA-1 is still accepted for signatures and key derivation, but only for compatibility.
    pub(crate) fn warn_if_legacy(&self, algorithm: &str) {
        if *self == HashFunction::Sha1 {
            warn!("{algorithm} with SHA-1 is only supported for legacy use");
        }
    }
}

/// <https://w3c.github.io/webcrypto/#sha-operations-digest>
pub(crate) fn digest(normalized_algorithm: &SubtleAlgorithm, message: &[u8]) -> Fallible<Vec<u8>> {
    // Step 1.
    // If the name member of normalizedAlgorithm is a cases-sensitive string match for "SHA-1":
    //     Let result be the result of performing the SHA-1 hash function defined in Section 6.1
    //     of [FIPS-180-4] using message as the input message, M.
    // If the name member of normalizedAlgorithm is a cases-sensitive string match for "SHA-256":
    //     Let result be the result of performing the SHA-256 hash function defined in Section 6.2
    //     of [FIPS-180-4] using message as the input message, M.
    // If the name member of normalizedAlgorithm is a cases-sensitive string match for "SHA-384":
    //     Let result be the result of performing the SHA-384 hash function defined in Section 6.5
    //     of [FIPS-180-4] using message as the input message, M.
    // If the name member of normalizedAlgorithm is a cases-sensitive string match for "SHA-512":
    //     Let result be the result of performing the SHA-512 hash function defined in Section 6.4
    //     of [FIPS-180-4] using message as the input message, M.
    let hash_function = HashFunction::from_name(&normalized_algorithm.name)?;
    let result = hash_function.digest(message);

    // Step 2. If performing the operation results in an error, then throw an OperationError.
    // Step 3. Return result.
    Ok(result)
}

#[cfg(test)]
mod test {
    use super::HashFunction;

    #[test]
    fn test_sizes_match_outputs() {
        for hash_function in [
            HashFunction::Sha1,
            HashFunction::Sha256,
            HashFunction::Sha384,
            HashFunction::Sha512,
        ] {
            assert_eq!(hash_function.digest(b"").len(), hash_function.output_size());
            assert_eq!(
                HashFunction::from_name(hash_function.name()).unwrap(),
                hash_function
            );
        }
        assert_eq!(HashFunction::Sha384.block_size(), 1024);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert!(HashFunction::from_name("sha-256").is_err());
        assert!(HashFunction::from_name("SHA-224").is_err());
    }
}
