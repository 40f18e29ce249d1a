use {
    crate::{constants::*, signature::ParseOptionsBuilderError, signer::SignOptionsBuilderError},
    http::status::StatusCode,
    scratchstack_errors::ServiceError,
    std::{
        error::Error,
        fmt::{Display, Formatter, Result as FmtResult},
    },
};

/// Error returned when an attempt at parsing, signing, or verifying an HTTP signature fails.
///
/// Signature mismatches are never reported through this type; [`verify_signature`][crate::verify_signature] and
/// [`verify_hmac`][crate::verify_hmac] return `Ok(false)` for those.
#[derive(Debug)]
#[non_exhaustive]
pub enum SignatureError {
    /// The `date` header is further away from the server clock than the allowed clock skew. Sample message:
    /// `clock skew of 301.5s was greater than 300s`
    ExpiredRequest(/* message */ String),

    /// The crypto engine or a remote signing service failed.
    InternalServiceError(Box<dyn Error + Send + Sync>),

    /// The authorization header is malformed or lacks a required parameter. Sample messages:
    /// `bad param format`
    /// `scheme was not "Signature"`
    /// `keyId was not specified`
    InvalidHeader(/* message */ String),

    /// Key material could not be decoded, or an SSH public key is malformed.
    InvalidKey(/* message */ String),

    /// The algorithm is syntactically valid but not permitted. Sample messages:
    /// `foo is not supported`
    /// `rsa-sha256 is not a supported algorithm`
    InvalidParams(/* message */ String),

    /// A header named by the signature parameters or required by the caller is absent. Sample messages:
    /// `date was not in the request`
    /// `x-unit-test was not a signed header`
    MissingHeader(/* message */ String),

    /// The `request-line` pseudo-header was used while strict parsing was enabled.
    StrictParsing(/* message */ String),

    /// The caller supplied malformed arguments, e.g. missing signing options, or a key that does not match the
    /// signature algorithm.
    TypeError(/* message */ String),
}

impl SignatureError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ExpiredRequest(_) => ERR_CODE_EXPIRED_REQUEST,
            Self::InternalServiceError(_) => ERR_CODE_INTERNAL_FAILURE,
            Self::InvalidHeader(_) => ERR_CODE_INVALID_HEADER,
            Self::InvalidKey(_) => ERR_CODE_INVALID_KEY,
            Self::InvalidParams(_) => ERR_CODE_INVALID_PARAMS,
            Self::MissingHeader(_) => ERR_CODE_MISSING_HEADER,
            Self::StrictParsing(_) => ERR_CODE_STRICT_PARSING,
            Self::TypeError(_) => ERR_CODE_TYPE_ERROR,
        }
    }

    fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidHeader(_)
            | Self::InvalidParams(_)
            | Self::MissingHeader(_)
            | Self::StrictParsing(_)
            | Self::TypeError(_) => StatusCode::BAD_REQUEST,
            Self::ExpiredRequest(_) => StatusCode::UNAUTHORIZED,
            Self::InternalServiceError(_) | Self::InvalidKey(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors the client can cause map to 4xx. [SignatureError::TypeError] is among them: a request may name an
/// algorithm that does not match the verifier's key. Only failures of the key material or of a signing service are
/// reported as 500.
impl ServiceError for SignatureError {
    fn error_code(&self) -> &'static str {
        SignatureError::error_code(self)
    }

    fn http_status(&self) -> StatusCode {
        SignatureError::http_status(self)
    }
}

impl Display for SignatureError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::ExpiredRequest(msg) => f.write_str(msg),
            Self::InternalServiceError(ref e) => Display::fmt(e, f),
            Self::InvalidHeader(msg) => f.write_str(msg),
            Self::InvalidKey(msg) => f.write_str(msg),
            Self::InvalidParams(msg) => f.write_str(msg),
            Self::MissingHeader(msg) => f.write_str(msg),
            Self::StrictParsing(msg) => f.write_str(msg),
            Self::TypeError(msg) => f.write_str(msg),
        }
    }
}

impl Error for SignatureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InternalServiceError(ref e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<Box<dyn Error + Send + Sync>> for SignatureError {
    fn from(e: Box<dyn Error + Send + Sync>) -> SignatureError {
        match e.downcast::<SignatureError>() {
            Ok(sig_err) => *sig_err,
            Err(e) => SignatureError::InternalServiceError(e),
        }
    }
}

impl From<ParseOptionsBuilderError> for SignatureError {
    fn from(e: ParseOptionsBuilderError) -> SignatureError {
        SignatureError::TypeError(e.to_string())
    }
}

impl From<SignOptionsBuilderError> for SignatureError {
    fn from(e: SignOptionsBuilderError) -> SignatureError {
        SignatureError::TypeError(e.to_string())
    }
}
