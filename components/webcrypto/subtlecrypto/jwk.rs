/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::collections::HashSet;
use std::fmt::Display;
use std::str::FromStr;

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};

use crate::cryptokey::KeyUsage;
use crate::error::{Error, Fallible};

/// <https://w3c.github.io/webcrypto/#dfn-JsonWebKey>
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct JsonWebKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kty: Option<String>,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oth: Option<Vec<RsaOtherPrimesInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<String>,
}

/// <https://w3c.github.io/webcrypto/#dfn-RsaOtherPrimesInfo>
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RsaOtherPrimesInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

#[derive(Clone, Copy)]
pub(crate) enum JwkStringField {
    X,
    Y,
    D,
    N,
    E,
    P,
    Q,
    DP,
    DQ,
    QI,
    K,
}

impl Display for JwkStringField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let field_name = match self {
            JwkStringField::X => "x",
            JwkStringField::Y => "y",
            JwkStringField::D => "d",
            JwkStringField::N => "n",
            JwkStringField::E => "e",
            JwkStringField::P => "p",
            JwkStringField::Q => "q",
            JwkStringField::DP => "dp",
            JwkStringField::DQ => "dq",
            JwkStringField::QI => "qi",
            JwkStringField::K => "k",
        };
        write!(f, "{}", field_name)
    }
}

pub(crate) trait JsonWebKeyExt {
    fn parse(data: &[u8]) -> Fallible<JsonWebKey>;
    fn stringify(&self) -> Fallible<Vec<u8>>;
    fn get_usages_from_key_ops(&self) -> Fallible<Vec<KeyUsage>>;
    fn check_key_ops(&self, specified_usages: &[KeyUsage]) -> Fallible<()>;
    fn check_use(&self, specified_usages: &[KeyUsage], expected_use: &str) -> Fallible<()>;
    fn check_ext(&self, extractable: bool) -> Fallible<()>;
    fn set_key_ops(&mut self, usages: &[KeyUsage]);
    fn encode_string_field(&mut self, field: JwkStringField, data: &[u8]);
    fn decode_optional_string_field(&self, field: JwkStringField) -> Fallible<Option<Vec<u8>>>;
    fn decode_required_string_field(&self, field: JwkStringField) -> Fallible<Vec<u8>>;
}

impl JsonWebKeyExt for JsonWebKey {
    /// <https://w3c.github.io/webcrypto/#concept-parse-a-jwk>
    fn parse(data: &[u8]) -> Fallible<JsonWebKey> {
        // Step 1. Let data be the sequence of bytes to be parsed.
        // Step 2. Let json be the Unicode string that results from interpreting data according to
        // UTF-8.
        // Step 3. Convert json to UTF-16.
        // Step 4. Let result be the object literal that results from executing the JSON.parse
        // internal function in the context of a new global object, with text argument set to a
        // JavaScript String containing json.
        // Step 5. Let key be the result of converting result to the IDL dictionary type of
        // JsonWebKey.
        let json = String::from_utf8_lossy(data);
        let key: JsonWebKey = serde_json::from_str(&json)
            .map_err(|error| Error::Data(Some(format!("Failed to parse jwk: {error}"))))?;

        // Step 6. If the kty field of key is not defined, then throw a DataError.
        if key.kty.is_none() {
            return Err(Error::Data(Some(
                "The kty field is not present in jwk".to_string(),
            )));
        }

        // Step 7. Result key.
        Ok(key)
    }

    /// Serialize the key to the UTF-8 bytes of its JSON text. This acts like the opposite of
    /// [`JsonWebKeyExt::parse`].
    fn stringify(&self) -> Fallible<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|error| Error::Operation(Some(format!("Failed to serialize jwk: {error}"))))
    }

    fn get_usages_from_key_ops(&self) -> Fallible<Vec<KeyUsage>> {
        let mut usages = vec![];
        for op in self.key_ops.as_ref().ok_or(Error::Data(Some(
            "The key_ops field is not present in jwk".to_string(),
        )))? {
            usages.push(KeyUsage::from_str(op).map_err(|_| {
                Error::Data(Some(format!("Unrecognized key operation \"{op}\" in jwk")))
            })?);
        }
        Ok(usages)
    }

    /// If the key_ops field of jwk is present, and is invalid according to the requirements of
    /// JSON Web Key [JWK] or does not contain all of the specified usages values, then throw a
    /// DataError.
    fn check_key_ops(&self, specified_usages: &[KeyUsage]) -> Fallible<()> {
        // If the key_ops field of jwk is present,
        let Some(key_ops) = &self.key_ops else {
            return Ok(());
        };

        // and is invalid according to the requirements of JSON Web Key [JWK]:
        // 1. Duplicate key operation values MUST NOT be present in the array.
        if key_ops.iter().collect::<HashSet<_>>().len() < key_ops.len() {
            return Err(Error::Data(Some(
                "The key_ops field of jwk contains duplicate values".to_string(),
            )));
        }
        let key_ops_as_usages = self.get_usages_from_key_ops()?;

        // 2. The "use" and "key_ops" JWK members SHOULD NOT be used together; however, if both
        //    are used, the information they convey MUST be consistent.
        if let Some(use_) = &self.use_ {
            let consistent = key_ops_as_usages.iter().all(|usage| match use_.as_str() {
                "sig" => matches!(usage, KeyUsage::Sign | KeyUsage::Verify),
                "enc" => !matches!(usage, KeyUsage::Sign | KeyUsage::Verify),
                _ => false,
            });
            if !consistent {
                return Err(Error::Data(Some(
                    "The use and key_ops fields of jwk are inconsistent".to_string(),
                )));
            }
        }

        // or does not contain all of the specified usages values
        if !specified_usages
            .iter()
            .all(|specified_usage| key_ops_as_usages.contains(specified_usage))
        {
            return Err(Error::Data(Some(
                "The key_ops field of jwk does not contain all of the specified usages"
                    .to_string(),
            )));
        }

        Ok(())
    }

    /// If usages is non-empty and the use field of jwk is present and is not equal to
    /// `expected_use`, then throw a DataError.
    fn check_use(&self, specified_usages: &[KeyUsage], expected_use: &str) -> Fallible<()> {
        match &self.use_ {
            Some(use_) if !specified_usages.is_empty() && use_ != expected_use => {
                Err(Error::Data(Some(format!(
                    "The use field of jwk is not \"{expected_use}\""
                ))))
            },
            _ => Ok(()),
        }
    }

    /// If the ext field of jwk is present and has the value false and extractable is true, then
    /// throw a DataError.
    fn check_ext(&self, extractable: bool) -> Fallible<()> {
        if self.ext == Some(false) && extractable {
            return Err(Error::Data(Some(
                "The ext field of jwk is false, but the key is requested to be extractable"
                    .to_string(),
            )));
        }
        Ok(())
    }

    // Set the key_ops attribute of jwk to equal the given usages.
    fn set_key_ops(&mut self, usages: &[KeyUsage]) {
        self.key_ops = Some(
            usages
                .iter()
                .map(|usage| usage.as_str().to_owned())
                .collect(),
        );
    }

    // Encode a byte sequence to a base64url-encoded string, and set the field to the encoded
    // string.
    fn encode_string_field(&mut self, field: JwkStringField, data: &[u8]) {
        let encoded_data = Some(Base64UrlUnpadded::encode_string(data));
        match field {
            JwkStringField::X => self.x = encoded_data,
            JwkStringField::Y => self.y = encoded_data,
            JwkStringField::D => self.d = encoded_data,
            JwkStringField::N => self.n = encoded_data,
            JwkStringField::E => self.e = encoded_data,
            JwkStringField::P => self.p = encoded_data,
            JwkStringField::Q => self.q = encoded_data,
            JwkStringField::DP => self.dp = encoded_data,
            JwkStringField::DQ => self.dq = encoded_data,
            JwkStringField::QI => self.qi = encoded_data,
            JwkStringField::K => self.k = encoded_data,
        }
    }

    // Decode a field from a base64url-encoded string to a byte sequence. If the field is not a
    // valid base64url-encoded string, then throw a DataError.
    fn decode_optional_string_field(&self, field: JwkStringField) -> Fallible<Option<Vec<u8>>> {
        let field_string = match field {
            JwkStringField::X => &self.x,
            JwkStringField::Y => &self.y,
            JwkStringField::D => &self.d,
            JwkStringField::N => &self.n,
            JwkStringField::E => &self.e,
            JwkStringField::P => &self.p,
            JwkStringField::Q => &self.q,
            JwkStringField::DP => &self.dp,
            JwkStringField::DQ => &self.dq,
            JwkStringField::QI => &self.qi,
            JwkStringField::K => &self.k,
        };

        field_string
            .as_ref()
            .map(|field_string| Base64UrlUnpadded::decode_vec(field_string))
            .transpose()
            .map_err(|_| Error::Data(Some(format!("Failed to decode {} field in jwk", field))))
    }

    // Decode a field from a base64url-encoded string to a byte sequence. If the field is not
    // present or it is not a valid base64url-encoded string, then throw a DataError.
    fn decode_required_string_field(&self, field: JwkStringField) -> Fallible<Vec<u8>> {
        self.decode_optional_string_field(field)?
            .ok_or(Error::Data(Some(format!(
                "The {} field is not present in jwk",
                field
            ))))
    }
}

#[cfg(test)]
mod test {
    use super::{JsonWebKey, JsonWebKeyExt, JwkStringField};
    use crate::cryptokey::KeyUsage;

    #[test]
    fn test_parse_requires_kty() {
        assert_eq!(
            JsonWebKey::parse(br#"{"k": "AAAA"}"#).unwrap_err().name(),
            "DataError"
        );
        assert_eq!(JsonWebKey::parse(b"not json").unwrap_err().name(), "DataError");

        let key = JsonWebKey::parse(br#"{"kty": "oct", "use": "enc", "ext": true}"#).unwrap();
        assert_eq!(key.kty.as_deref(), Some("oct"));
        assert_eq!(key.use_.as_deref(), Some("enc"));
        assert_eq!(key.ext, Some(true));
    }

    #[test]
    fn test_stringify_skips_absent_members() {
        let mut key = JsonWebKey {
            kty: Some("oct".to_string()),
            ..Default::default()
        };
        key.encode_string_field(JwkStringField::K, &[0xfb, 0xff]);
        key.set_key_ops(&[KeyUsage::Encrypt]);
        assert_eq!(
            String::from_utf8(key.stringify().unwrap()).unwrap(),
            r#"{"kty":"oct","key_ops":["encrypt"],"k":"-_8"}"#
        );
        assert_eq!(JsonWebKey::parse(&key.stringify().unwrap()).unwrap(), key);
    }

    #[test]
    fn test_base64url_fields() {
        let key = JsonWebKey {
            kty: Some("RSA".to_string()),
            e: Some("AQAB".to_string()),
            n: Some("AQAB=".to_string()),
            ..Default::default()
        };
        assert_eq!(
            key.decode_required_string_field(JwkStringField::E).unwrap(),
            vec![0x01, 0x00, 0x01]
        );
        assert!(key.decode_required_string_field(JwkStringField::N).is_err());
        let error = key.decode_required_string_field(JwkStringField::D).unwrap_err();
        assert_eq!(error.message(), Some("The d field is not present in jwk"));
        assert_eq!(key.decode_optional_string_field(JwkStringField::P).unwrap(), None);
    }

    #[test]
    fn test_key_ops_checks() {
        let mut key = JsonWebKey {
            kty: Some("oct".to_string()),
            key_ops: Some(vec!["sign".to_string(), "sign".to_string()]),
            ..Default::default()
        };
        assert!(key.check_key_ops(&[KeyUsage::Sign]).is_err());

        key.key_ops = Some(vec!["sign".to_string(), "verify".to_string()]);
        assert!(key.check_key_ops(&[KeyUsage::Sign]).is_ok());
        assert!(key.check_key_ops(&[KeyUsage::Sign, KeyUsage::Encrypt]).is_err());

        key.use_ = Some("sig".to_string());
        assert!(key.check_key_ops(&[KeyUsage::Verify]).is_ok());
        key.use_ = Some("enc".to_string());
        assert!(key.check_key_ops(&[KeyUsage::Verify]).is_err());

        key.key_ops = Some(vec!["frobnicate".to_string()]);
        assert!(key.check_key_ops(&[]).is_err());
    }

    #[test]
    fn test_use_and_ext_checks() {
        let key = JsonWebKey {
            kty: Some("oct".to_string()),
            use_: Some("sig".to_string()),
            ext: Some(false),
            ..Default::default()
        };
        assert!(key.check_use(&[KeyUsage::Sign], "sig").is_ok());
        assert!(key.check_use(&[KeyUsage::Encrypt], "enc").is_err());
        assert!(key.check_use(&[], "enc").is_ok());
        assert!(key.check_ext(false).is_ok());
        assert!(key.check_ext(true).is_err());
    }
}
