use {
    crate::SignatureError,
    std::{
        fmt::{Display, Formatter, Result as FmtResult},
        str::FromStr,
    },
};

/// Algorithms accepted by the parser unless the caller supplies an allow-list of its own.
pub const SUPPORTED_ALGORITHMS: &[&str] = &[
    "rsa-sha1",
    "rsa-sha256",
    "rsa-sha512",
    "dsa-sha1",
    "dsa-sha256",
    "ecdsa-sha256",
    "ecdsa-sha512",
    "hmac-sha1",
    "hmac-sha256",
    "hmac-sha512",
    "ed25519-sha512",
];

/// Returns true if the lowercase, `family-hash` form of an algorithm is in [`SUPPORTED_ALGORITHMS`].
pub fn is_supported_algorithm(algorithm: &str) -> bool {
    SUPPORTED_ALGORITHMS.contains(&algorithm)
}

/// The cryptographic primitive class of a signature algorithm, independent of the hash function.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AlgorithmFamily {
    /// Symmetric HMAC using a shared secret.
    Hmac,

    /// RSASSA-PKCS1-v1_5.
    Rsa,

    /// DSA with DER-encoded signatures.
    Dsa,

    /// ECDSA over P-256 or P-384 with DER-encoded signatures.
    Ecdsa,

    /// Ed25519 detached signatures.
    Ed25519,
}

impl AlgorithmFamily {
    /// The lowercase wire name of the family.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hmac => "hmac",
            Self::Rsa => "rsa",
            Self::Dsa => "dsa",
            Self::Ecdsa => "ecdsa",
            Self::Ed25519 => "ed25519",
        }
    }

    /// The hash used when a signer names only the family, or when the algorithm is inferred from the key.
    pub const fn default_hash(&self) -> HashAlgorithm {
        match self {
            Self::Dsa => HashAlgorithm::Sha1,
            Self::Ed25519 => HashAlgorithm::Sha512,
            _ => HashAlgorithm::Sha256,
        }
    }
}

impl Display for AlgorithmFamily {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmFamily {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hmac" => Ok(Self::Hmac),
            "rsa" => Ok(Self::Rsa),
            "dsa" => Ok(Self::Dsa),
            "ecdsa" => Ok(Self::Ecdsa),
            "ed25519" => Ok(Self::Ed25519),
            _ => Err(SignatureError::TypeError(format!("unsupported algorithm family {s}"))),
        }
    }
}

/// Hash functions usable with the signature families.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HashAlgorithm {
    /// SHA-1
    Sha1,

    /// SHA-256
    Sha256,

    /// SHA-512
    Sha512,
}

impl HashAlgorithm {
    /// The lowercase wire name of the hash.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(SignatureError::TypeError(format!("unsupported hash algorithm {s}"))),
        }
    }
}

/// A signature algorithm: a family paired with a hash function.
///
/// The wire form is `FAMILY-HASH`, parsed case-insensitively and displayed in lowercase (`rsa-sha256`).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Algorithm {
    family: AlgorithmFamily,
    hash: HashAlgorithm,
}

impl Algorithm {
    /// Create an algorithm from its parts.
    pub const fn new(family: AlgorithmFamily, hash: HashAlgorithm) -> Self {
        Self {
            family,
            hash,
        }
    }

    /// Create an algorithm using the default hash of the given family.
    pub const fn for_family(family: AlgorithmFamily) -> Self {
        Self::new(family, family.default_hash())
    }

    /// Parse either the full `FAMILY-HASH` form or a bare family name, which selects the family's default hash.
    pub fn parse_for_signing(s: &str) -> Result<Self, SignatureError> {
        if s.contains('-') {
            s.parse()
        } else {
            Ok(Self::for_family(s.parse()?))
        }
    }

    #[inline]
    pub fn family(&self) -> AlgorithmFamily {
        self.family
    }

    #[inline]
    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    /// Returns true if this algorithm is in [`SUPPORTED_ALGORITHMS`].
    pub fn is_supported(&self) -> bool {
        is_supported_algorithm(&self.to_string())
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}-{}", self.family, self.hash)
    }
}

impl FromStr for Algorithm {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || SignatureError::TypeError(format!("unsupported algorithm {s}"));
        let (family, hash) = s.split_once('-').ok_or_else(unsupported)?;
        let family: AlgorithmFamily = family.parse().map_err(|_| unsupported())?;
        let hash: HashAlgorithm = hash.parse().map_err(|_| unsupported())?;

        // Ed25519 fixes its own hash.
        if family == AlgorithmFamily::Ed25519 && hash != HashAlgorithm::Sha512 {
            return Err(unsupported());
        }

        Ok(Self::new(family, hash))
    }
}
