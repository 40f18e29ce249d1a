use const_oid::ObjectIdentifier;

/// Default allowed clock skew between the `date` header and the server clock, in seconds.
pub(crate) const DEFAULT_CLOCK_SKEW: u64 = 300;

/// Error code: ExpiredRequestError
pub(crate) const ERR_CODE_EXPIRED_REQUEST: &str = "ExpiredRequestError";

/// Error code: InternalFailure
pub(crate) const ERR_CODE_INTERNAL_FAILURE: &str = "InternalFailure";

/// Error code: InvalidHeaderError
pub(crate) const ERR_CODE_INVALID_HEADER: &str = "InvalidHeaderError";

/// Error code: InvalidKeyError
pub(crate) const ERR_CODE_INVALID_KEY: &str = "InvalidKeyError";

/// Error code: InvalidParamsError
pub(crate) const ERR_CODE_INVALID_PARAMS: &str = "InvalidParamsError";

/// Error code: MissingHeaderError
pub(crate) const ERR_CODE_MISSING_HEADER: &str = "MissingHeaderError";

/// Error code: StrictParsingError
pub(crate) const ERR_CODE_STRICT_PARSING: &str = "StrictParsingError";

/// Error code: TypeError
pub(crate) const ERR_CODE_TYPE_ERROR: &str = "TypeError";

/// Header for `authorization`
pub(crate) const HDR_AUTHORIZATION: &str = "authorization";

/// Header for `date`
pub(crate) const HDR_DATE: &str = "date";

/// Error message: `"algorithm was not specified"`
pub(crate) const MSG_ALGORITHM_NOT_SPECIFIED: &str = "algorithm was not specified";

/// Error message: `"bad param format"`
pub(crate) const MSG_BAD_PARAM_FORMAT: &str = "bad param format";

/// Error message: `"keyId was not specified"`
pub(crate) const MSG_KEY_ID_NOT_SPECIFIED: &str = "keyId was not specified";

/// Error message: `"request-line is not a valid header with strict parsing enabled."`
pub(crate) const MSG_REQUEST_LINE_STRICT: &str = "request-line is not a valid header with strict parsing enabled.";

/// Error message: `"scheme was not \"Signature\""`
pub(crate) const MSG_SCHEME_NOT_SIGNATURE: &str = "scheme was not \"Signature\"";

/// Error message: `"signature was not specified"`
pub(crate) const MSG_SIGNATURE_NOT_SPECIFIED: &str = "signature was not specified";

/// OID for DSA public keys (`id-dsa`).
pub(crate) const OID_DSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10040.4.1");

/// OID for elliptic curve public keys (`id-ecPublicKey`).
pub(crate) const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// OID for Ed25519 keys (`id-Ed25519`).
pub(crate) const OID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

/// OID for RSA public keys (`rsaEncryption`).
pub(crate) const OID_RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// Pseudo-header for the request line (`GET /path HTTP/1.1`).
pub(crate) const PSEUDO_REQUEST_LINE: &str = "request-line";

/// Pseudo-header for the request target (`(request-target): get /path`).
pub(crate) const PSEUDO_REQUEST_TARGET: &str = "(request-target)";

/// RFC 1123 date format used for the `date` header.
pub(crate) const RFC1123_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// The only authorization scheme accepted.
pub(crate) const SCHEME_SIGNATURE: &str = "Signature";
