use {
    crate::{crypto::hmac, Algorithm, AlgorithmFamily, HashAlgorithm, KeyMaterial, ParsedSignature, SignatureError},
    base64::{engine::general_purpose::STANDARD, Engine as _},
    log::{debug, trace},
};

/// Verify a parsed signature with the given key.
///
/// Returns `Ok(false)` for a well-formed signature that does not match, including one that is not valid base64.
/// Errors are reserved for structural problems: an unparseable algorithm ([SignatureError::TypeError]), a key that
/// cannot serve the algorithm's family ([SignatureError::TypeError]), or key material that cannot be decoded
/// ([SignatureError::InvalidKey]).
pub fn verify_signature(parsed: &ParsedSignature, key: &KeyMaterial) -> Result<bool, SignatureError> {
    verify_signature_with_type(parsed, key, None)
}

/// Verify a parsed signature, additionally requiring the algorithm to belong to `key_type` if one is given.
pub fn verify_signature_with_type(
    parsed: &ParsedSignature,
    key: &KeyMaterial,
    key_type: Option<AlgorithmFamily>,
) -> Result<bool, SignatureError> {
    let algorithm = parse_algorithm(parsed)?;

    if let Some(key_type) = key_type {
        if key_type != algorithm.family() {
            debug!("Signature algorithm {} does not match key type {}", algorithm, key_type);
            return Err(mismatch(parsed));
        }
    }

    match (algorithm.family(), key) {
        (AlgorithmFamily::Hmac, KeyMaterial::Secret(secret)) => Ok(hmac_matches(parsed, algorithm.hash(), secret)),
        (AlgorithmFamily::Hmac, _) => Err(mismatch(parsed)),
        (_, _) => {
            let Ok(signature) = STANDARD.decode(parsed.signature()) else {
                trace!("Signature for keyId {} is not valid base64", parsed.key_id());
                return Ok(false);
            };

            key.verify(algorithm, parsed.signing_string().as_bytes(), &signature)
        }
    }
}

/// Verify an HMAC signature with a shared secret. Fails with [SignatureError::TypeError] if the signature does not
/// use an HMAC algorithm.
pub fn verify_hmac(parsed: &ParsedSignature, secret: &[u8]) -> Result<bool, SignatureError> {
    let algorithm = parse_algorithm(parsed)?;
    if algorithm.family() != AlgorithmFamily::Hmac {
        return Err(SignatureError::TypeError(format!("algorithm {} is not an HMAC algorithm", parsed.algorithm())));
    }

    Ok(hmac_matches(parsed, algorithm.hash(), secret))
}

fn parse_algorithm(parsed: &ParsedSignature) -> Result<Algorithm, SignatureError> {
    parsed
        .params()
        .algorithm
        .parse()
        .map_err(|_| SignatureError::TypeError(format!("unsupported algorithm {}", parsed.algorithm())))
}

fn mismatch(parsed: &ParsedSignature) -> SignatureError {
    SignatureError::TypeError(format!("key type does not match signature algorithm {}", parsed.algorithm()))
}

/// Compare HMACs of the expected and claimed signatures rather than the signatures themselves, so the comparison
/// time reveals nothing about the expected value.
fn hmac_matches(parsed: &ParsedSignature, hash: HashAlgorithm, secret: &[u8]) -> bool {
    let Ok(claimed) = STANDARD.decode(parsed.signature()) else {
        trace!("HMAC signature for keyId {} is not valid base64", parsed.key_id());
        return false;
    };

    let expected = hmac(hash, secret, parsed.signing_string().as_bytes());
    let h1 = hmac(hash, secret, &expected);
    let h2 = hmac(hash, secret, &claimed);
    h1 == h2
}
