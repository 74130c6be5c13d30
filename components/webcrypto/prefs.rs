/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use serde::{Deserialize, Serialize};

use crate::error::{Error, Fallible};

/// Runtime switches for the `crypto` interface.
///
/// Preferences are read once, when a [`crate::Crypto`] is created, and never change afterwards.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Preferences {
    /// Expose `crypto.subtle`.
    pub dom_crypto_subtle_enabled: bool,
    /// Accept the secp256k1 curve ("K-256") for ECDH keys.
    pub dom_crypto_subtle_k256_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            dom_crypto_subtle_enabled: true,
            dom_crypto_subtle_k256_enabled: true,
        }
    }
}

impl Preferences {
    /// Read preferences from a JSON object. Missing keys keep their default value.
    pub fn from_json(json: &str) -> Fallible<Preferences> {
        serde_json::from_str(json)
            .map_err(|error| Error::Syntax(Some(format!("Invalid preferences: {error}"))))
    }
}

#[cfg(test)]
mod test {
    use super::Preferences;

    #[test]
    fn test_missing_keys_use_defaults() {
        let prefs = Preferences::from_json(r#"{"dom_crypto_subtle_k256_enabled": false}"#).unwrap();
        assert!(prefs.dom_crypto_subtle_enabled);
        assert!(!prefs.dom_crypto_subtle_k256_enabled);
        assert_eq!(Preferences::from_json("{}").unwrap(), Preferences::default());
    }

    #[test]
    fn test_malformed_json_is_a_syntax_error() {
        let error = Preferences::from_json("{dom_crypto_subtle_enabled").unwrap_err();
        assert_eq!(error.name(), "SyntaxError");
    }
}
