/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::sync::Arc;

use elliptic_curve::sec1::ToEncodedPoint;
use pkcs8::rand_core::OsRng;
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};

use crate::cryptokey::{CryptoKey, CryptoKeyPair, Handle, KeyType, KeyUsage};
use crate::error::{Error, Fallible};
use crate::subtlecrypto::jwk::{JsonWebKey, JsonWebKeyExt, JwkStringField};
use crate::subtlecrypto::{
    ALG_ECDH, ALG_ECDSA, ExportedKey, KeyAlgorithmAndDerivatives, KeyFormat, NAMED_CURVE_K256,
    NAMED_CURVE_P256, NAMED_CURVE_P384, NAMED_CURVE_P521, SubtleEcKeyAlgorithm,
    SubtleEcKeyGenParams, SubtleEcKeyImportParams,
};

/// <https://w3c.github.io/webcrypto/#dfn-NamedCurve>
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum NamedCurve {
    P256,
    P384,
    P521,
    K256,
}

impl NamedCurve {
    pub(crate) fn from_name(name: &str) -> Option<NamedCurve> {
        match name {
            NAMED_CURVE_P256 => Some(NamedCurve::P256),
            NAMED_CURVE_P384 => Some(NamedCurve::P384),
            NAMED_CURVE_P521 => Some(NamedCurve::P521),
            NAMED_CURVE_K256 => Some(NamedCurve::K256),
            _ => None,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            NamedCurve::P256 => NAMED_CURVE_P256,
            NamedCurve::P384 => NAMED_CURVE_P384,
            NamedCurve::P521 => NAMED_CURVE_P521,
            NamedCurve::K256 => NAMED_CURVE_K256,
        }
    }

    /// Size in bytes of a field element, which is also the size of the base point order.
    pub(crate) fn order_size(&self) -> usize {
        match self {
            NamedCurve::P256 | NamedCurve::K256 => 32,
            NamedCurve::P384 => 48,
            NamedCurve::P521 => 66,
        }
    }

    fn of_handle(handle: &Handle) -> Option<NamedCurve> {
        match handle {
            Handle::P256PrivateKey(_) | Handle::P256PublicKey(_) => Some(NamedCurve::P256),
            Handle::P384PrivateKey(_) | Handle::P384PublicKey(_) => Some(NamedCurve::P384),
            Handle::P521PrivateKey(_) | Handle::P521PublicKey(_) => Some(NamedCurve::P521),
            Handle::K256PrivateKey(_) | Handle::K256PublicKey(_) => Some(NamedCurve::K256),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum EcAlgorithm {
    Ecdsa,
    Ecdh { k256_enabled: bool },
}

impl EcAlgorithm {
    fn name(&self) -> &'static str {
        match self {
            EcAlgorithm::Ecdsa => ALG_ECDSA,
            EcAlgorithm::Ecdh { .. } => ALG_ECDH,
        }
    }

    /// Usages allowed for keys of `key_type`.
    fn allowed_usages(&self, key_type: KeyType) -> &'static [KeyUsage] {
        match (self, key_type) {
            (EcAlgorithm::Ecdsa, KeyType::Public) => &[KeyUsage::Verify],
            (EcAlgorithm::Ecdsa, _) => &[KeyUsage::Sign],
            (EcAlgorithm::Ecdh { .. }, KeyType::Public) => &[],
            (EcAlgorithm::Ecdh { .. }, _) => &[KeyUsage::DeriveKey, KeyUsage::DeriveBits],
        }
    }

    fn check_usages(&self, usages: &[KeyUsage], key_type: KeyType) -> Fallible<()> {
        let allowed_usages = self.allowed_usages(key_type);
        if usages.iter().any(|usage| !allowed_usages.contains(usage)) {
            return Err(Error::Syntax(Some(format!(
                "Usages contains an entry which is not allowed for a {} {} key",
                key_type.as_str(),
                self.name()
            ))));
        }
        Ok(())
    }

    fn jwk_use(&self) -> &'static str {
        match self {
            EcAlgorithm::Ecdsa => "sig",
            EcAlgorithm::Ecdh { .. } => "enc",
        }
    }

    /// Resolve `named_curve` to a curve this algorithm operates on. K-256 is only available for
    /// ECDH, and only while it is enabled in preferences.
    fn named_curve(&self, named_curve: &str) -> Fallible<NamedCurve> {
        let curve = match (NamedCurve::from_name(named_curve), self) {
            (Some(NamedCurve::K256), EcAlgorithm::Ecdh { k256_enabled: true }) => {
                Some(NamedCurve::K256)
            },
            (Some(NamedCurve::K256), _) => None,
            (curve, _) => curve,
        };
        curve.ok_or_else(|| {
            Error::NotSupported(Some(format!(
                "{named_curve} is not a supported curve for {}",
                self.name()
            )))
        })
    }
}

/// The curve recorded in the [[algorithm]] internal slot of an EC key.
pub(crate) fn key_named_curve(key: &CryptoKey) -> Fallible<NamedCurve> {
    let KeyAlgorithmAndDerivatives::EcKeyAlgorithm(algorithm) = key.algorithm() else {
        return Err(Error::Operation(Some(
            "[[algorithm]] internal slot of key is not an EcKeyAlgorithm".to_string(),
        )));
    };
    NamedCurve::from_name(&algorithm.named_curve).ok_or_else(|| {
        Error::Operation(Some(format!(
            "Unknown named curve {}",
            algorithm.named_curve
        )))
    })
}

/// <https://w3c.github.io/webcrypto/#ecdsa-operations-generate-key>
/// <https://w3c.github.io/webcrypto/#ecdh-operations-generate-key>
pub(crate) fn generate_key(
    ec_algorithm: EcAlgorithm,
    normalized_algorithm: &SubtleEcKeyGenParams,
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<CryptoKeyPair> {
    // Step 1. If usages contains an entry which is not allowed for either the public or the
    // private key of the algorithm, then throw a SyntaxError.
    if usages.iter().any(|usage| {
        !ec_algorithm.allowed_usages(KeyType::Public).contains(usage) &&
            !ec_algorithm.allowed_usages(KeyType::Private).contains(usage)
    }) {
        return Err(Error::Syntax(Some(format!(
            "Usages contains an entry which is not allowed for {}",
            ec_algorithm.name()
        ))));
    }

    // Step 2. If the namedCurve member of normalizedAlgorithm is "P-256", "P-384" or "P-521":
    // Generate an Elliptic Curve key pair, as defined in [RFC6090] with domain parameters for
    // the curve identified by the namedCurve member of normalizedAlgorithm.
    // If the namedCurve member of normalizedAlgorithm is a value specified in an applicable
    // specification: Perform the EC key generation steps specified in that specification.
    // Otherwise: throw a NotSupportedError.
    // Step 3. If performing the key generation operation results in an error, then throw an
    // OperationError.
    let curve = ec_algorithm.named_curve(&normalized_algorithm.named_curve)?;
    let (private_handle, public_handle) = match curve {
        NamedCurve::P256 => {
            let secret = p256::SecretKey::random(&mut OsRng);
            let public = secret.public_key();
            (Handle::P256PrivateKey(secret), Handle::P256PublicKey(public))
        },
        NamedCurve::P384 => {
            let secret = p384::SecretKey::random(&mut OsRng);
            let public = secret.public_key();
            (Handle::P384PrivateKey(secret), Handle::P384PublicKey(public))
        },
        NamedCurve::P521 => {
            let secret = p521::SecretKey::random(&mut OsRng);
            let public = secret.public_key();
            (Handle::P521PrivateKey(secret), Handle::P521PublicKey(public))
        },
        NamedCurve::K256 => {
            let secret = k256::SecretKey::random(&mut OsRng);
            let public = secret.public_key();
            (Handle::K256PrivateKey(secret), Handle::K256PublicKey(public))
        },
    };

    // Step 4. Let algorithm be a new EcKeyAlgorithm object.
    // Step 5. Set the name attribute of algorithm to the name of the algorithm.
    // Step 6. Set the namedCurve attribute of algorithm to equal the namedCurve member of
    // normalizedAlgorithm.
    let algorithm = SubtleEcKeyAlgorithm {
        name: ec_algorithm.name().to_string(),
        named_curve: curve.name().to_string(),
    };

    // Step 7. Let publicKey be a new CryptoKey representing the public key of the generated key
    // pair.
    // Step 8. Set the [[type]] internal slot of publicKey to "public"
    // Step 9. Set the [[algorithm]] internal slot of publicKey to algorithm.
    // Step 10. Set the [[extractable]] internal slot of publicKey to true.
    // Step 11. Set the [[usages]] internal slot of publicKey to be the usage intersection of
    // usages and the usages of a public key.
    let public_key = CryptoKey::new(
        KeyType::Public,
        true,
        KeyAlgorithmAndDerivatives::EcKeyAlgorithm(algorithm.clone()),
        intersect_usages(&usages, ec_algorithm.allowed_usages(KeyType::Public)),
        public_handle,
    );

    // Step 12. Let privateKey be a new CryptoKey representing the private key of the generated
    // key pair.
    // Step 13. Set the [[type]] internal slot of privateKey to "private"
    // Step 14. Set the [[algorithm]] internal slot of privateKey to algorithm.
    // Step 15. Set the [[extractable]] internal slot of privateKey to extractable.
    // Step 16. Set the [[usages]] internal slot of privateKey to be the usage intersection of
    // usages and the usages of a private key.
    let private_key = CryptoKey::new(
        KeyType::Private,
        extractable,
        KeyAlgorithmAndDerivatives::EcKeyAlgorithm(algorithm),
        intersect_usages(&usages, ec_algorithm.allowed_usages(KeyType::Private)),
        private_handle,
    );

    // Step 17. Let result be a new CryptoKeyPair dictionary.
    // Step 18. Set the publicKey attribute of result to be publicKey.
    // Step 19. Set the privateKey attribute of result to be privateKey.
    // Step 20. Return result.
    Ok(CryptoKeyPair {
        public_key,
        private_key,
    })
}

/// <https://w3c.github.io/webcrypto/#ecdsa-operations-import-key>
/// <https://w3c.github.io/webcrypto/#ecdh-operations-import-key>
pub(crate) fn import_key(
    ec_algorithm: EcAlgorithm,
    normalized_algorithm: &SubtleEcKeyImportParams,
    format: KeyFormat,
    key_data: &[u8],
    extractable: bool,
    usages: Vec<KeyUsage>,
) -> Fallible<Arc<CryptoKey>> {
    // Step 1. Let keyData be the key data to be imported.

    // Step 2.
    let (key_type, handle) = match format {
        // If format is "spki":
        KeyFormat::Spki => {
            // Step 2.1. If usages contains a value which is not allowed for a public key, then
            // throw a SyntaxError.
            ec_algorithm.check_usages(&usages, KeyType::Public)?;

            // Step 2.2. Let spki be the result of running the parse a subjectPublicKeyInfo
            // algorithm over keyData.
            // Step 2.3. If an error occurred while parsing, then throw a DataError.
            // Step 2.4. If the algorithm object identifier field of the algorithm
            // AlgorithmIdentifier field of spki is not equal to the id-ecPublicKey object
            // identifier defined in [RFC5480], then throw a DataError.
            // Step 2.5. If the parameters field of the algorithm AlgorithmIdentifier field of
            // spki is absent, or is not an instance of ECParameters, then throw a DataError.
            // Step 2.6 - 2.9. Let namedCurve be the curve identified by the parameters, and
            // publicKey the point decoded from the subjectPublicKey field. If namedCurve is not
            // equal to the namedCurve member of normalizedAlgorithm, or the point is not valid,
            // then throw a DataError.
            let curve = ec_algorithm.named_curve(&normalized_algorithm.named_curve)?;
            (KeyType::Public, public_key_from_spki(curve, key_data)?)
        },
        // If format is "pkcs8":
        KeyFormat::Pkcs8 => {
            // Step 2.1. If usages contains a value which is not allowed for a private key, then
            // throw a SyntaxError.
            ec_algorithm.check_usages(&usages, KeyType::Private)?;

            // Step 2.2. Let privateKeyInfo be the result of running the parse a privateKeyInfo
            // algorithm over keyData.
            // Step 2.3. If an error occurs while parsing, then throw a DataError.
            // Step 2.4. If the algorithm object identifier field of the privateKeyAlgorithm
            // PrivateKeyAlgorithm field of privateKeyInfo is not equal to the id-ecPublicKey
            // object identifier defined in [RFC5480], then throw a DataError.
            // Step 2.5 - 2.9. Let namedCurve be the curve identified by the parameters, and
            // key the ECPrivateKey decoded from the privateKey field. If namedCurve is not
            // equal to the namedCurve member of normalizedAlgorithm, or the key is not valid,
            // then throw a DataError.
            let curve = ec_algorithm.named_curve(&normalized_algorithm.named_curve)?;
            (KeyType::Private, private_key_from_pkcs8(curve, key_data)?)
        },
        // If format is "jwk":
        KeyFormat::Jwk => {
            // Step 2.1.
            // If keyData is a JsonWebKey dictionary:
            //     Let jwk equal keyData.
            // Otherwise:
            //     Throw a DataError.
            let jwk = JsonWebKey::parse(key_data)?;

            // Step 2.2. If the d field is present and usages contains a value which is not
            // allowed for a private key, or, if the d field is not present and usages contains
            // a value which is not allowed for a public key, then throw a SyntaxError.
            let key_type = if jwk.d.is_some() {
                KeyType::Private
            } else {
                KeyType::Public
            };
            ec_algorithm.check_usages(&usages, key_type)?;

            // Step 2.3. If the kty field of jwk is not "EC", then throw a DataError.
            if jwk.kty.as_deref() != Some("EC") {
                return Err(Error::Data(Some(
                    "The kty field of jwk is not \"EC\"".to_string(),
                )));
            }

            // Step 2.4. If usages is non-empty and the use field of jwk is present and is not
            // "sig" ("enc" for ECDH), then throw a DataError.
            jwk.check_use(&usages, ec_algorithm.jwk_use())?;

            // Step 2.5. If the key_ops field of jwk is present, and is invalid according to the
            // requirements of JSON Web Key [JWK], or it does not contain all of the specified
            // usages values, then throw a DataError.
            jwk.check_key_ops(&usages)?;

            // Step 2.6. If the ext field of jwk is present and has the value false and
            // extractable is true, then throw a DataError.
            jwk.check_ext(extractable)?;

            // Step 2.7. Let namedCurve be a string whose value is equal to the crv field of jwk.
            // Step 2.8. If namedCurve is not equal to the namedCurve member of
            // normalizedAlgorithm, throw a DataError.
            if jwk.crv.as_deref() != Some(normalized_algorithm.named_curve.as_str()) {
                return Err(Error::Data(Some(format!(
                    "The crv field of jwk is not \"{}\"",
                    normalized_algorithm.named_curve
                ))));
            }
            let curve = ec_algorithm.named_curve(&normalized_algorithm.named_curve)?;

            // Step 2.9. For ECDSA, if the alg field of jwk is present and is not the value
            // matching namedCurve ("ES256", "ES384" or "ES512"), then throw a DataError.
            if ec_algorithm == EcAlgorithm::Ecdsa {
                if let Some(alg) = &jwk.alg {
                    let expected_alg = match curve {
                        NamedCurve::P256 => "ES256",
                        NamedCurve::P384 => "ES384",
                        _ => "ES512",
                    };
                    if alg != expected_alg {
                        return Err(Error::Data(Some(format!(
                            "The alg field of jwk is not \"{expected_alg}\""
                        ))));
                    }
                }
            }

            // Step 2.10. If the d field is present:
            //     Step 2.10.1. If jwk does not meet the requirements of Section 6.2.2 of JSON Web
            //     Algorithms [JWA], then throw a DataError.
            //     Step 2.10.2. Let key be a new CryptoKey object that represents the Elliptic
            //     Curve private key identified by interpreting jwk according to Section 6.2.2 of
            //     JSON Web Algorithms [JWA].
            // Otherwise:
            //     Step 2.10.1. If jwk does not meet the requirements of Section 6.2.1 of JSON Web
            //     Algorithms [JWA], then throw a DataError.
            //     Step 2.10.2. Let key be a new CryptoKey object that represents the Elliptic
            //     Curve public key identified by interpreting jwk according to Section 6.2.1 of
            //     JSON Web Algorithms [JWA].
            let x = jwk.decode_required_string_field(JwkStringField::X)?;
            let y = jwk.decode_required_string_field(JwkStringField::Y)?;
            if x.len() != curve.order_size() || y.len() != curve.order_size() {
                return Err(Error::Data(Some(format!(
                    "The coordinates of jwk are not {} bytes long",
                    curve.order_size()
                ))));
            }
            let point = [&[0x04][..], &x, &y].concat();
            let public_handle = public_key_from_sec1(curve, &point)?;
            let handle = match jwk.decode_optional_string_field(JwkStringField::D)? {
                Some(d) => {
                    if d.len() != curve.order_size() {
                        return Err(Error::Data(Some(format!(
                            "The d field of jwk is not {} bytes long",
                            curve.order_size()
                        ))));
                    }
                    let private_handle = private_key_from_scalar(curve, &d)?;
                    if uncompressed_point(&private_handle)? != point {
                        return Err(Error::Data(Some(
                            "The d field of jwk does not match its x and y fields".to_string(),
                        )));
                    }
                    private_handle
                },
                None => public_handle,
            };
            (key_type, handle)
        },
        // If format is "raw":
        KeyFormat::Raw => {
            // Step 2.1. If the namedCurve member of normalizedAlgorithm is not a named curve,
            // then throw a DataError.
            let curve = ec_algorithm.named_curve(&normalized_algorithm.named_curve)?;

            // Step 2.2. If usages contains a value which is not allowed for a public key, then
            // throw a SyntaxError.
            ec_algorithm.check_usages(&usages, KeyType::Public)?;

            // Step 2.3. Let Q be the elliptic curve point on the curve identified by the
            // namedCurve member of normalizedAlgorithm identified by performing the conversion
            // steps defined in Section 2.3.4 of [SEC1] on keyData. The uncompressed point format
            // MUST be supported.
            // Step 2.4. If an error occurs or if Q is not a valid point on the curve, then throw
            // a DataError.
            if key_data.len() != 1 + 2 * curve.order_size() || key_data[0] != 0x04 {
                return Err(Error::Data(Some(
                    "The raw key data is not an uncompressed point".to_string(),
                )));
            }
            (KeyType::Public, public_key_from_sec1(curve, key_data)?)
        },
    };

    // Step 3. Let algorithm be a new EcKeyAlgorithm object.
    // Step 4. Set the name attribute of algorithm to the name of the algorithm.
    // Step 5. Set the namedCurve attribute of algorithm to namedCurve.
    // Step 6. Set the [[algorithm]] internal slot of key to algorithm.
    let curve = NamedCurve::of_handle(&handle).ok_or_else(|| {
        Error::Operation(Some("The key handle is not an EC key".to_string()))
    })?;
    let algorithm = SubtleEcKeyAlgorithm {
        name: ec_algorithm.name().to_string(),
        named_curve: curve.name().to_string(),
    };

    // Step 7. Return key.
    Ok(CryptoKey::new(
        key_type,
        extractable,
        KeyAlgorithmAndDerivatives::EcKeyAlgorithm(algorithm),
        usages,
        handle,
    ))
}

/// <https://w3c.github.io/webcrypto/#ecdsa-operations-export-key>
/// <https://w3c.github.io/webcrypto/#ecdh-operations-export-key>
pub(crate) fn export_key(format: KeyFormat, key: &CryptoKey) -> Fallible<ExportedKey> {
    // Step 1. Let key be the CryptoKey to be exported.

    // Step 2. If the underlying cryptographic key material represented by the [[handle]] internal
    // slot of key cannot be accessed, then throw an OperationError.
    // Step 3.
    let result = match format {
        // If format is "spki":
        KeyFormat::Spki => {
            // Step 3.1. If the [[type]] internal slot of key is not "public", then throw an
            // InvalidAccessError.
            if key.key_type() != KeyType::Public {
                return Err(Error::InvalidAccess(Some(
                    "[[type]] internal slot of key is not \"public\"".to_string(),
                )));
            }

            // Step 3.2. Let data be an instance of the SubjectPublicKeyInfo ASN.1 structure
            // defined in [RFC5280] with the algorithm field set to id-ecPublicKey with the
            // namedCurve parameters, and the subjectPublicKey field set to the uncompressed
            // point.
            // Step 3.3. Let result be the result of DER-encoding data.
            ExportedKey::Bytes(spki_of(key.handle())?)
        },
        // If format is "pkcs8":
        KeyFormat::Pkcs8 => {
            // Step 3.1. If the [[type]] internal slot of key is not "private", then throw an
            // InvalidAccessError.
            if key.key_type() != KeyType::Private {
                return Err(Error::InvalidAccess(Some(
                    "[[type]] internal slot of key is not \"private\"".to_string(),
                )));
            }

            // Step 3.2. Let data be an instance of the PrivateKeyInfo ASN.1 structure defined in
            // [RFC5208] with the privateKeyAlgorithm field set to id-ecPublicKey with the
            // namedCurve parameters, and the privateKey field set to the DER encoding of an
            // ECPrivateKey.
            // Step 3.3. Let result be the result of DER-encoding data.
            ExportedKey::Bytes(pkcs8_of(key.handle())?)
        },
        // If format is "jwk":
        KeyFormat::Jwk => {
            // Step 3.1. Let jwk be a new JsonWebKey dictionary.
            // Step 3.2. Set the kty attribute of jwk to "EC".
            // Step 3.3. Set the crv attribute of jwk to the namedCurve of key.
            let curve = NamedCurve::of_handle(key.handle()).ok_or_else(|| {
                Error::Operation(Some("The key handle is not an EC key".to_string()))
            })?;
            let mut jwk = JsonWebKey {
                kty: Some("EC".to_string()),
                crv: Some(curve.name().to_string()),
                ..Default::default()
            };

            // Step 3.4. Set the x attribute of jwk according to the definition in Section
            // 6.2.1.2 of JSON Web Algorithms [JWA].
            // Step 3.5. Set the y attribute of jwk according to the definition in Section
            // 6.2.1.3 of JSON Web Algorithms [JWA].
            let point = uncompressed_point(key.handle())?;
            let (x, y) = point[1..].split_at(curve.order_size());
            jwk.encode_string_field(JwkStringField::X, x);
            jwk.encode_string_field(JwkStringField::Y, y);

            // Step 3.6. If the [[type]] internal slot of key is "private", then set the d
            // attribute of jwk according to the definition in Section 6.2.2.1 of JSON Web
            // Algorithms [JWA].
            if key.key_type() == KeyType::Private {
                let d = private_scalar(key.handle()).ok_or_else(|| {
                    Error::Operation(Some(
                        "[[handle]] internal slot of key is not an EC private key".to_string(),
                    ))
                })?;
                jwk.encode_string_field(JwkStringField::D, &d);
            }

            // Step 3.7. Set the key_ops attribute of jwk to the usages attribute of key.
            jwk.set_key_ops(key.usages());

            // Step 3.8. Set the ext attribute of jwk to the [[extractable]] internal slot of key.
            jwk.ext = Some(key.extractable());

            // Step 3.9. Let result be jwk.
            ExportedKey::Jwk(Box::new(jwk))
        },
        // If format is "raw":
        KeyFormat::Raw => {
            // Step 3.1. If the [[type]] internal slot of key is not "public", then throw an
            // InvalidAccessError.
            if key.key_type() != KeyType::Public {
                return Err(Error::InvalidAccess(Some(
                    "[[type]] internal slot of key is not \"public\"".to_string(),
                )));
            }

            // Step 3.2. Let data be an octet string representing the Elliptic Curve point Q
            // represented by the [[handle]] internal slot of key according to [SEC1] 2.3.3 using
            // the uncompressed format.
            // Step 3.3. Let result be data.
            ExportedKey::Bytes(uncompressed_point(key.handle())?)
        },
    };

    // Step 4. Return result.
    Ok(result)
}

fn intersect_usages(usages: &[KeyUsage], allowed_usages: &[KeyUsage]) -> Vec<KeyUsage> {
    usages
        .iter()
        .filter(|usage| allowed_usages.contains(usage))
        .copied()
        .collect()
}

fn public_key_from_sec1(curve: NamedCurve, bytes: &[u8]) -> Fallible<Handle> {
    let handle = match curve {
        NamedCurve::P256 => p256::PublicKey::from_sec1_bytes(bytes).map(Handle::P256PublicKey),
        NamedCurve::P384 => p384::PublicKey::from_sec1_bytes(bytes).map(Handle::P384PublicKey),
        NamedCurve::P521 => p521::PublicKey::from_sec1_bytes(bytes).map(Handle::P521PublicKey),
        NamedCurve::K256 => k256::PublicKey::from_sec1_bytes(bytes).map(Handle::K256PublicKey),
    };
    handle.map_err(|_| {
        Error::Data(Some(format!(
            "The point is not a valid {} public key",
            curve.name()
        )))
    })
}

fn public_key_from_spki(curve: NamedCurve, der: &[u8]) -> Fallible<Handle> {
    let handle = match curve {
        NamedCurve::P256 => {
            p256::PublicKey::from_public_key_der(der).map(Handle::P256PublicKey)
        },
        NamedCurve::P384 => {
            p384::PublicKey::from_public_key_der(der).map(Handle::P384PublicKey)
        },
        NamedCurve::P521 => {
            p521::PublicKey::from_public_key_der(der).map(Handle::P521PublicKey)
        },
        NamedCurve::K256 => {
            k256::PublicKey::from_public_key_der(der).map(Handle::K256PublicKey)
        },
    };
    handle.map_err(|_| {
        Error::Data(Some(format!(
            "Failed to parse SPKI as a {} public key",
            curve.name()
        )))
    })
}

fn private_key_from_pkcs8(curve: NamedCurve, der: &[u8]) -> Fallible<Handle> {
    let handle = match curve {
        NamedCurve::P256 => p256::SecretKey::from_pkcs8_der(der).map(Handle::P256PrivateKey),
        NamedCurve::P384 => p384::SecretKey::from_pkcs8_der(der).map(Handle::P384PrivateKey),
        NamedCurve::P521 => p521::SecretKey::from_pkcs8_der(der).map(Handle::P521PrivateKey),
        NamedCurve::K256 => k256::SecretKey::from_pkcs8_der(der).map(Handle::K256PrivateKey),
    };
    handle.map_err(|_| {
        Error::Data(Some(format!(
            "Failed to parse PKCS #8 as a {} private key",
            curve.name()
        )))
    })
}

fn private_key_from_scalar(curve: NamedCurve, scalar: &[u8]) -> Fallible<Handle> {
    let handle = match curve {
        NamedCurve::P256 => p256::SecretKey::from_slice(scalar).map(Handle::P256PrivateKey),
        NamedCurve::P384 => p384::SecretKey::from_slice(scalar).map(Handle::P384PrivateKey),
        NamedCurve::P521 => p521::SecretKey::from_slice(scalar).map(Handle::P521PrivateKey),
        NamedCurve::K256 => k256::SecretKey::from_slice(scalar).map(Handle::K256PrivateKey),
    };
    handle.map_err(|_| {
        Error::Data(Some(format!(
            "The d field of jwk is not a valid {} private key",
            curve.name()
        )))
    })
}

/// The uncompressed SEC1 encoding of the public point of `handle`. For a private key this is
/// the point of its public key.
fn uncompressed_point(handle: &Handle) -> Fallible<Vec<u8>> {
    let point = match handle {
        Handle::P256PrivateKey(key) => {
            key.public_key().to_encoded_point(false).as_bytes().to_vec()
        },
        Handle::P384PrivateKey(key) => {
            key.public_key().to_encoded_point(false).as_bytes().to_vec()
        },
        Handle::P521PrivateKey(key) => {
            key.public_key().to_encoded_point(false).as_bytes().to_vec()
        },
        Handle::K256PrivateKey(key) => {
            key.public_key().to_encoded_point(false).as_bytes().to_vec()
        },
        Handle::P256PublicKey(key) => key.to_encoded_point(false).as_bytes().to_vec(),
        Handle::P384PublicKey(key) => key.to_encoded_point(false).as_bytes().to_vec(),
        Handle::P521PublicKey(key) => key.to_encoded_point(false).as_bytes().to_vec(),
        Handle::K256PublicKey(key) => key.to_encoded_point(false).as_bytes().to_vec(),
        _ => {
            return Err(Error::Operation(Some(
                "The key handle is not an EC key".to_string(),
            )));
        },
    };
    Ok(point)
}

fn private_scalar(handle: &Handle) -> Option<Vec<u8>> {
    match handle {
        Handle::P256PrivateKey(key) => Some(key.to_bytes().to_vec()),
        Handle::P384PrivateKey(key) => Some(key.to_bytes().to_vec()),
        Handle::P521PrivateKey(key) => Some(key.to_bytes().to_vec()),
        Handle::K256PrivateKey(key) => Some(key.to_bytes().to_vec()),
        _ => None,
    }
}

fn spki_of(handle: &Handle) -> Fallible<Vec<u8>> {
    let document = match handle {
        Handle::P256PublicKey(key) => key.to_public_key_der(),
        Handle::P384PublicKey(key) => key.to_public_key_der(),
        Handle::P521PublicKey(key) => key.to_public_key_der(),
        Handle::K256PublicKey(key) => key.to_public_key_der(),
        _ => {
            return Err(Error::Operation(Some(
                "[[handle]] internal slot of key is not an EC public key".to_string(),
            )));
        },
    };
    document
        .map(|document| document.as_bytes().to_vec())
        .map_err(|_| Error::Operation(Some("Failed to encode EC public key".to_string())))
}

fn pkcs8_of(handle: &Handle) -> Fallible<Vec<u8>> {
    let document = match handle {
        Handle::P256PrivateKey(key) => key.to_pkcs8_der(),
        Handle::P384PrivateKey(key) => key.to_pkcs8_der(),
        Handle::P521PrivateKey(key) => key.to_pkcs8_der(),
        Handle::K256PrivateKey(key) => key.to_pkcs8_der(),
        _ => {
            return Err(Error::Operation(Some(
                "[[handle]] internal slot of key is not an EC private key".to_string(),
            )));
        },
    };
    document
        .map(|document| document.as_bytes().to_vec())
        .map_err(|_| Error::Operation(Some("Failed to encode EC private key".to_string())))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_named_curve_order_sizes() {
        assert_eq!(NamedCurve::P256.order_size(), 32);
        assert_eq!(NamedCurve::P384.order_size(), 48);
        assert_eq!(NamedCurve::P521.order_size(), 66);
        assert_eq!(NamedCurve::K256.order_size(), 32);
    }

    #[test]
    fn test_k256_only_for_enabled_ecdh() {
        assert!(EcAlgorithm::Ecdsa.named_curve("K-256").is_err());
        assert!(
            EcAlgorithm::Ecdh {
                k256_enabled: false
            }
            .named_curve("K-256")
            .is_err()
        );
        assert_eq!(
            EcAlgorithm::Ecdh { k256_enabled: true }
                .named_curve("K-256")
                .ok(),
            Some(NamedCurve::K256)
        );
        assert!(matches!(
            EcAlgorithm::Ecdsa.named_curve("P-192"),
            Err(Error::NotSupported(_))
        ));
    }

    #[test]
    fn test_private_scalar_matches_public_point() {
        let secret = p256::SecretKey::random(&mut OsRng);
        let point = secret.public_key().to_encoded_point(false).as_bytes().to_vec();
        let handle = private_key_from_scalar(NamedCurve::P256, &secret.to_bytes()).unwrap();
        assert_eq!(uncompressed_point(&handle).unwrap(), point);
        assert!(private_key_from_scalar(NamedCurve::P256, &[0; 32]).is_err());
    }
}
