use {
    crate::{
        constants::*,
        crypto::{digest, hmac},
        Algorithm, AlgorithmFamily, HashAlgorithm, SignatureError,
    },
    base64::{engine::general_purpose::STANDARD, Engine as _},
    const_oid::ObjectIdentifier,
    lazy_static::lazy_static,
    log::trace,
    pkcs8::{DecodePrivateKey, DecodePublicKey, Document, PrivateKeyInfo, SecretDocument, SubjectPublicKeyInfoRef},
    regex::Regex,
    rsa::{
        pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey},
        Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey,
    },
    sha1::Sha1,
    sha2::{Digest, Sha256, Sha512},
    signature::{
        hazmat::{PrehashSigner, PrehashVerifier},
        DigestSigner, DigestVerifier, SignatureEncoding, Signer, Verifier,
    },
    std::fmt::{Debug, Display, Formatter, Result as FmtResult},
};

lazy_static! {
    /// Label of the first PEM block, e.g. `RSA PUBLIC KEY`.
    static ref PEM_LABEL: Regex = Regex::new(r"-----BEGIN ([A-Z0-9 ]+)-----").unwrap();
}

/// Key material supplied by the caller for a single signing or verification operation.
///
/// The crate never persists or caches key material. `Debug` and `Display` only reveal the kind of key.
#[derive(Clone)]
pub enum KeyMaterial {
    /// A shared secret used directly as the HMAC key.
    Secret(Vec<u8>),

    /// A PEM-encoded RSA, DSA, ECDSA (P-256 or P-384), or Ed25519 key. Signing requires a private key; verification
    /// accepts either a public key or a private key (from which the public key is derived).
    ///
    /// Recognized labels are `PUBLIC KEY` and `PRIVATE KEY` (SPKI and PKCS#8, dispatched on the algorithm OID),
    /// `RSA PUBLIC KEY` and `RSA PRIVATE KEY` (PKCS#1), and `EC PRIVATE KEY` (SEC1).
    Pem(String),

    /// A raw, base64-encoded Ed25519 key. For verification this is the 32-byte public key; for signing it is either
    /// the 32-byte seed or the 64-byte keypair.
    Ed25519(String),
}

impl KeyMaterial {
    /// Create key material from an HMAC secret.
    pub fn secret<S: AsRef<[u8]>>(secret: S) -> Self {
        Self::Secret(secret.as_ref().to_vec())
    }

    /// Create key material from a PEM-encoded key.
    pub fn pem<S: Into<String>>(pem: S) -> Self {
        Self::Pem(pem.into())
    }

    /// Create key material from a base64-encoded raw Ed25519 key.
    pub fn ed25519<S: Into<String>>(key: S) -> Self {
        Self::Ed25519(key.into())
    }

    /// Determine the algorithm family this key belongs to.
    pub fn family(&self) -> Result<AlgorithmFamily, SignatureError> {
        match self {
            Self::Secret(_) => Ok(AlgorithmFamily::Hmac),
            Self::Pem(pem) => pem_family(pem),
            Self::Ed25519(_) => Ok(AlgorithmFamily::Ed25519),
        }
    }

    /// Sign `message` with this key using `algorithm`, returning the raw signature bytes.
    ///
    /// HMAC secrets produce the HMAC digest; asymmetric keys produce PKCS#1 v1.5 (RSA), DER (DSA, ECDSA), or
    /// 64-byte (Ed25519) signatures.
    pub fn sign(&self, algorithm: Algorithm, message: &[u8]) -> Result<Vec<u8>, SignatureError> {
        self.check_family(algorithm)?;

        match self {
            Self::Secret(secret) => Ok(hmac(algorithm.hash(), secret, message)),
            _ => self.private_key()?.sign(algorithm.hash(), message),
        }
    }

    /// Verify an asymmetric signature. HMAC secrets are rejected here; the HMAC comparison lives in
    /// [`verify_signature`][crate::verify_signature].
    pub(crate) fn verify(
        &self,
        algorithm: Algorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, SignatureError> {
        self.check_family(algorithm)?;
        let public_key = self.public_key()?;
        let result = public_key.verify(algorithm.hash(), message, signature);
        trace!("{} signature verification result: {}", algorithm, result);
        Ok(result)
    }

    fn check_family(&self, algorithm: Algorithm) -> Result<(), SignatureError> {
        if self.family()? != algorithm.family() {
            return Err(SignatureError::TypeError(format!(
                "key type does not match signature algorithm {}",
                algorithm.to_string().to_uppercase()
            )));
        }

        Ok(())
    }

    pub(crate) fn private_key(&self) -> Result<PrivateKey, SignatureError> {
        match self {
            Self::Secret(_) => Err(SignatureError::TypeError("an HMAC secret is not a private key".to_string())),
            Self::Pem(pem) => decode_private_key(pem),
            Self::Ed25519(encoded) => {
                let raw = decode_raw_ed25519(encoded)?;
                if let Ok(seed) = <[u8; 32]>::try_from(raw.as_slice()) {
                    Ok(PrivateKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(&seed)))
                } else if let Ok(keypair) = <[u8; 64]>::try_from(raw.as_slice()) {
                    ed25519_dalek::SigningKey::from_keypair_bytes(&keypair)
                        .map(PrivateKey::Ed25519)
                        .map_err(invalid_key)
                } else {
                    Err(SignatureError::InvalidKey(format!("Ed25519 private key has invalid length {}", raw.len())))
                }
            }
        }
    }

    pub(crate) fn public_key(&self) -> Result<PublicKey, SignatureError> {
        match self {
            Self::Secret(_) => Err(SignatureError::TypeError("an HMAC secret is not a public key".to_string())),
            Self::Pem(pem) => decode_public_key(pem),
            Self::Ed25519(encoded) => {
                let raw = decode_raw_ed25519(encoded)?;
                if let Ok(public) = <[u8; 32]>::try_from(raw.as_slice()) {
                    ed25519_dalek::VerifyingKey::from_bytes(&public).map(PublicKey::Ed25519).map_err(invalid_key)
                } else if raw.len() == 64 {
                    Ok(self.private_key()?.public_key())
                } else {
                    Err(SignatureError::InvalidKey(format!("Ed25519 public key has invalid length {}", raw.len())))
                }
            }
        }
    }
}

impl Debug for KeyMaterial {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Secret(_) => f.write_str("KeyMaterial::Secret"),
            Self::Pem(_) => f.write_str("KeyMaterial::Pem"),
            Self::Ed25519(_) => f.write_str("KeyMaterial::Ed25519"),
        }
    }
}

impl Display for KeyMaterial {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        Debug::fmt(self, f)
    }
}

/// A decoded private key, ready for signing.
pub(crate) enum PrivateKey {
    Rsa(RsaPrivateKey),
    Dsa(dsa::SigningKey),
    EcdsaP256(p256::ecdsa::SigningKey),
    EcdsaP384(p384::ecdsa::SigningKey),
    Ed25519(ed25519_dalek::SigningKey),
}

impl PrivateKey {
    pub(crate) fn public_key(&self) -> PublicKey {
        match self {
            Self::Rsa(key) => PublicKey::Rsa(key.to_public_key()),
            Self::Dsa(key) => PublicKey::Dsa(key.verifying_key().clone()),
            Self::EcdsaP256(key) => PublicKey::EcdsaP256(*key.verifying_key()),
            Self::EcdsaP384(key) => PublicKey::EcdsaP384(*key.verifying_key()),
            Self::Ed25519(key) => PublicKey::Ed25519(key.verifying_key()),
        }
    }

    pub(crate) fn sign(&self, hash: HashAlgorithm, message: &[u8]) -> Result<Vec<u8>, SignatureError> {
        match self {
            Self::Rsa(key) => key.sign(pkcs1v15(hash), &digest(hash, message)).map_err(internal),
            Self::Dsa(key) => {
                let signature: dsa::Signature = match hash {
                    HashAlgorithm::Sha1 => key.try_sign_digest(Sha1::new_with_prefix(message)),
                    HashAlgorithm::Sha256 => key.try_sign_digest(Sha256::new_with_prefix(message)),
                    HashAlgorithm::Sha512 => key.try_sign_digest(Sha512::new_with_prefix(message)),
                }
                .map_err(internal)?;
                Ok(signature.to_vec())
            }
            Self::EcdsaP256(key) => {
                let signature: p256::ecdsa::Signature = key.sign_prehash(&digest(hash, message)).map_err(internal)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            Self::EcdsaP384(key) => {
                let signature: p384::ecdsa::Signature = key.sign_prehash(&digest(hash, message)).map_err(internal)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            Self::Ed25519(key) => {
                let signature: ed25519_dalek::Signature = key.sign(message);
                Ok(signature.to_bytes().to_vec())
            }
        }
    }
}

/// A decoded public key, ready for verification.
pub(crate) enum PublicKey {
    Rsa(RsaPublicKey),
    Dsa(dsa::VerifyingKey),
    EcdsaP256(p256::ecdsa::VerifyingKey),
    EcdsaP384(p384::ecdsa::VerifyingKey),
    Ed25519(ed25519_dalek::VerifyingKey),
}

impl PublicKey {
    /// Returns false for any well-formed but non-matching signature, and for signatures that cannot be decoded.
    pub(crate) fn verify(&self, hash: HashAlgorithm, message: &[u8], signature: &[u8]) -> bool {
        match self {
            Self::Rsa(key) => key.verify(pkcs1v15(hash), &digest(hash, message), signature).is_ok(),
            Self::Dsa(key) => {
                let Ok(signature) = dsa::Signature::try_from(signature) else {
                    return false;
                };

                match hash {
                    HashAlgorithm::Sha1 => key.verify_digest(Sha1::new_with_prefix(message), &signature),
                    HashAlgorithm::Sha256 => key.verify_digest(Sha256::new_with_prefix(message), &signature),
                    HashAlgorithm::Sha512 => key.verify_digest(Sha512::new_with_prefix(message), &signature),
                }
                .is_ok()
            }
            Self::EcdsaP256(key) => p256::ecdsa::Signature::from_der(signature)
                .and_then(|signature| key.verify_prehash(&digest(hash, message), &signature))
                .is_ok(),
            Self::EcdsaP384(key) => p384::ecdsa::Signature::from_der(signature)
                .and_then(|signature| key.verify_prehash(&digest(hash, message), &signature))
                .is_ok(),
            Self::Ed25519(key) => ed25519_dalek::Signature::from_slice(signature)
                .and_then(|signature| key.verify(message, &signature))
                .is_ok(),
        }
    }
}

fn pkcs1v15(hash: HashAlgorithm) -> Pkcs1v15Sign {
    match hash {
        HashAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
        HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}

fn invalid_key<E: Display>(e: E) -> SignatureError {
    SignatureError::InvalidKey(format!("could not decode key: {e}"))
}

fn internal<E: std::error::Error + Send + Sync + 'static>(e: E) -> SignatureError {
    SignatureError::InternalServiceError(Box::new(e))
}

fn decode_raw_ed25519(encoded: &str) -> Result<Vec<u8>, SignatureError> {
    STANDARD.decode(encoded.trim()).map_err(invalid_key)
}

fn pem_label(pem: &str) -> Result<&str, SignatureError> {
    PEM_LABEL
        .captures(pem)
        .and_then(|cap| cap.get(1))
        .map(|label| label.as_str())
        .ok_or_else(|| SignatureError::InvalidKey("key is not PEM encoded".to_string()))
}

fn family_for_oid(oid: ObjectIdentifier) -> Result<AlgorithmFamily, SignatureError> {
    if oid == OID_RSA_ENCRYPTION {
        Ok(AlgorithmFamily::Rsa)
    } else if oid == OID_DSA {
        Ok(AlgorithmFamily::Dsa)
    } else if oid == OID_EC_PUBLIC_KEY {
        Ok(AlgorithmFamily::Ecdsa)
    } else if oid == OID_ED25519 {
        Ok(AlgorithmFamily::Ed25519)
    } else {
        Err(SignatureError::InvalidKey(format!("unsupported key algorithm {oid}")))
    }
}

/// Infer the key family from the PEM label, falling back to the algorithm OID for SPKI and PKCS#8 documents.
fn pem_family(pem: &str) -> Result<AlgorithmFamily, SignatureError> {
    match pem_label(pem)? {
        "RSA PUBLIC KEY" | "RSA PRIVATE KEY" => Ok(AlgorithmFamily::Rsa),
        "DSA PUBLIC KEY" | "DSA PRIVATE KEY" => Ok(AlgorithmFamily::Dsa),
        "EC PRIVATE KEY" => Ok(AlgorithmFamily::Ecdsa),
        "PUBLIC KEY" => {
            let (_, document) = Document::from_pem(pem).map_err(invalid_key)?;
            let spki: SubjectPublicKeyInfoRef<'_> = document.decode_msg().map_err(invalid_key)?;
            family_for_oid(spki.algorithm.oid)
        }
        "PRIVATE KEY" => {
            let (_, document) = SecretDocument::from_pem(pem).map_err(invalid_key)?;
            let info: PrivateKeyInfo<'_> = document.decode_msg().map_err(invalid_key)?;
            family_for_oid(info.algorithm.oid)
        }
        label => Err(SignatureError::InvalidKey(format!("unsupported PEM label {label}"))),
    }
}

fn decode_private_key(pem: &str) -> Result<PrivateKey, SignatureError> {
    let label = pem_label(pem)?;

    match pem_family(pem)? {
        AlgorithmFamily::Rsa => {
            let key = if label == "RSA PRIVATE KEY" {
                RsaPrivateKey::from_pkcs1_pem(pem).map_err(invalid_key)?
            } else {
                RsaPrivateKey::from_pkcs8_pem(pem).map_err(invalid_key)?
            };
            Ok(PrivateKey::Rsa(key))
        }
        AlgorithmFamily::Dsa => dsa::SigningKey::from_pkcs8_pem(pem).map(PrivateKey::Dsa).map_err(invalid_key),
        AlgorithmFamily::Ecdsa if label == "EC PRIVATE KEY" => p256::SecretKey::from_sec1_pem(pem)
            .map(|key| PrivateKey::EcdsaP256(key.into()))
            .or_else(|_| p384::SecretKey::from_sec1_pem(pem).map(|key| PrivateKey::EcdsaP384(key.into())))
            .map_err(invalid_key),
        AlgorithmFamily::Ecdsa => p256::ecdsa::SigningKey::from_pkcs8_pem(pem)
            .map(PrivateKey::EcdsaP256)
            .or_else(|_| p384::ecdsa::SigningKey::from_pkcs8_pem(pem).map(PrivateKey::EcdsaP384))
            .map_err(invalid_key),
        AlgorithmFamily::Ed25519 => {
            ed25519_dalek::SigningKey::from_pkcs8_pem(pem).map(PrivateKey::Ed25519).map_err(invalid_key)
        }
        AlgorithmFamily::Hmac => Err(SignatureError::TypeError("a PEM key cannot be an HMAC secret".to_string())),
    }
}

fn decode_public_key(pem: &str) -> Result<PublicKey, SignatureError> {
    let label = pem_label(pem)?;
    if label.ends_with("PRIVATE KEY") {
        return Ok(decode_private_key(pem)?.public_key());
    }

    match pem_family(pem)? {
        AlgorithmFamily::Rsa => {
            let key = if label == "RSA PUBLIC KEY" {
                RsaPublicKey::from_pkcs1_pem(pem).map_err(invalid_key)?
            } else {
                RsaPublicKey::from_public_key_pem(pem).map_err(invalid_key)?
            };
            Ok(PublicKey::Rsa(key))
        }
        AlgorithmFamily::Dsa => dsa::VerifyingKey::from_public_key_pem(pem).map(PublicKey::Dsa).map_err(invalid_key),
        AlgorithmFamily::Ecdsa => p256::ecdsa::VerifyingKey::from_public_key_pem(pem)
            .map(PublicKey::EcdsaP256)
            .or_else(|_| p384::ecdsa::VerifyingKey::from_public_key_pem(pem).map(PublicKey::EcdsaP384))
            .map_err(invalid_key),
        AlgorithmFamily::Ed25519 => {
            ed25519_dalek::VerifyingKey::from_public_key_pem(pem).map(PublicKey::Ed25519).map_err(invalid_key)
        }
        AlgorithmFamily::Hmac => Err(SignatureError::TypeError("a PEM key cannot be an HMAC secret".to_string())),
    }
}
