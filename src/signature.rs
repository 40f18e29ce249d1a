use {
    crate::{
        algorithm::is_supported_algorithm,
        auth::AuthorizationHeader,
        canonical::{latin1_to_string, CanonicalRequest, Draft},
        chronoutil::ParseRFC1123,
        constants::*,
        SignatureError,
    },
    chrono::{DateTime, Utc},
    derive_builder::Builder,
    http::request::Request,
    log::{debug, trace},
};

/// Options for [`parse_request`].
///
/// `ParseOptions::default()` gives a 300 second clock skew, requires `date` to be signed, accepts every algorithm
/// in [`SUPPORTED_ALGORITHMS`][crate::SUPPORTED_ALGORITHMS], and reads the `authorization` header.
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
#[builder(derive(Debug))]
pub struct ParseOptions {
    /// Allowed difference between the `date` header and the server clock, in seconds.
    #[builder(default = "DEFAULT_CLOCK_SKEW")]
    clock_skew: u64,

    /// Headers that must be covered by the signature.
    #[builder(setter(custom), default = "vec![HDR_DATE.to_string()]")]
    headers: Vec<String>,

    /// If set, only these algorithms are accepted.
    #[builder(setter(custom), default)]
    algorithms: Option<Vec<String>>,

    /// Reject the `request-line` pseudo-header.
    #[builder(default)]
    strict: bool,

    /// The header carrying the signature.
    #[builder(setter(into), default = "HDR_AUTHORIZATION.to_string()")]
    authorization_header_name: String,

    /// The signing string dialect.
    #[builder(default)]
    draft: Draft,
}

impl ParseOptions {
    /// Create a [ParseOptionsBuilder] to construct a [ParseOptions].
    #[inline(always)]
    pub fn builder() -> ParseOptionsBuilder {
        ParseOptionsBuilder::default()
    }

    #[inline(always)]
    pub fn clock_skew(&self) -> u64 {
        self.clock_skew
    }

    #[inline(always)]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[inline(always)]
    pub fn algorithms(&self) -> Option<&[String]> {
        self.algorithms.as_deref()
    }

    #[inline(always)]
    pub fn strict(&self) -> bool {
        self.strict
    }

    #[inline(always)]
    pub fn authorization_header_name(&self) -> &str {
        &self.authorization_header_name
    }

    #[inline(always)]
    pub fn draft(&self) -> Draft {
        self.draft
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptionsBuilder::default().build().expect("all fields have defaults")
    }
}

impl ParseOptionsBuilder {
    /// Set the headers that must be covered by the signature. Names are lowercased.
    pub fn headers<I, S>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.headers = Some(headers.into_iter().map(|h| h.as_ref().to_lowercase()).collect());
        self
    }

    /// Restrict the accepted algorithms. Names are lowercased.
    pub fn algorithms<I, S>(&mut self, algorithms: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.algorithms = Some(Some(algorithms.into_iter().map(|a| a.as_ref().to_lowercase()).collect()));
        self
    }
}

/// Parameters carried in the Authorization header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignatureParams {
    /// Opaque identifier of the key that produced the signature.
    pub key_id: String,

    /// Lowercase `family-hash` algorithm, e.g. `rsa-sha256`.
    pub algorithm: String,

    /// Lowercase header names and pseudo-headers covered by the signature, in signing order. Never empty.
    pub headers: Vec<String>,

    /// The base64 signature.
    pub signature: String,

    /// The opaque `extensions` parameter, if supplied.
    pub extensions: Option<String>,
}

/// The result of parsing and validating a signed request.
///
/// The signing string is computed once, at parse time, from the request and the signed header list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedSignature {
    scheme: String,
    params: SignatureParams,
    signing_string: String,
}

impl ParsedSignature {
    /// Assemble a parsed signature from its parameters and a precomputed signing string.
    pub fn new<S: Into<String>>(params: SignatureParams, signing_string: S) -> Self {
        Self {
            scheme: SCHEME_SIGNATURE.to_string(),
            params,
            signing_string: signing_string.into(),
        }
    }

    #[inline(always)]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[inline(always)]
    pub fn params(&self) -> &SignatureParams {
        &self.params
    }

    /// The base64 signature claimed by the request.
    #[inline(always)]
    pub fn signature(&self) -> &str {
        &self.params.signature
    }

    #[inline(always)]
    pub fn signing_string(&self) -> &str {
        &self.signing_string
    }

    /// The algorithm, uppercased (`RSA-SHA256`).
    pub fn algorithm(&self) -> String {
        self.params.algorithm.to_uppercase()
    }

    #[inline(always)]
    pub fn key_id(&self) -> &str {
        &self.params.key_id
    }
}

/// Parse and validate the signature on an HTTP request against the current time.
///
/// This does not verify the signature itself; pass the result to [`verify_signature`][crate::verify_signature]
/// with the key named by [`ParsedSignature::key_id`].
pub fn parse_request<B>(request: &Request<B>, options: &ParseOptions) -> Result<ParsedSignature, SignatureError> {
    parse_request_at(request, options, Utc::now())
}

/// Parse and validate the signature on an HTTP request, checking clock skew against `server_timestamp`.
///
/// Checks are applied in this order, and the first failure is returned:
/// 1. The authorization header must be present ([SignatureError::MissingHeader]).
/// 2. The header must use the `Signature` scheme, tokenize, and carry non-empty `keyId`, `algorithm`, and
///    `signature` values ([SignatureError::InvalidHeader]). A parameter cut off by the end of the header is ignored,
///    so a truncated header fails on the first value it is missing.
/// 3. The algorithm must be supported and, if [ParseOptions::algorithms] is set, allowed
///    ([SignatureError::InvalidParams]).
/// 4. Every signed header must be present ([SignatureError::MissingHeader]); `request-line` is rejected in strict
///    mode ([SignatureError::StrictParsing]).
/// 5. If the request has a `date` header, it must be within the clock skew ([SignatureError::ExpiredRequest]).
/// 6. Every header in [ParseOptions::headers] must be signed ([SignatureError::MissingHeader]).
pub fn parse_request_at<B>(
    request: &Request<B>,
    options: &ParseOptions,
    server_timestamp: DateTime<Utc>,
) -> Result<ParsedSignature, SignatureError> {
    let header_name = options.authorization_header_name();
    let Some(value) = request.headers().get(header_name) else {
        debug!("Request is missing the {} header", header_name);
        return Err(SignatureError::MissingHeader(format!("no {header_name} header present in the request")));
    };

    let header = AuthorizationHeader::parse(&latin1_to_string(value.as_bytes()))?;
    trace!("Parsed authorization header: {:?}", header);

    if header.scheme() != SCHEME_SIGNATURE {
        return Err(SignatureError::InvalidHeader(MSG_SCHEME_NOT_SIGNATURE.to_string()));
    }

    let Some(key_id) = non_empty(header.param("keyId")) else {
        return Err(SignatureError::InvalidHeader(MSG_KEY_ID_NOT_SPECIFIED.to_string()));
    };

    let Some(algorithm) = non_empty(header.param("algorithm")) else {
        return Err(SignatureError::InvalidHeader(MSG_ALGORITHM_NOT_SPECIFIED.to_string()));
    };

    let Some(signature) = non_empty(header.signature()) else {
        return Err(SignatureError::InvalidHeader(MSG_SIGNATURE_NOT_SPECIFIED.to_string()));
    };

    let algorithm = algorithm.to_lowercase();
    if !is_supported_algorithm(&algorithm) {
        debug!("Rejecting unsupported algorithm {}", algorithm);
        return Err(SignatureError::InvalidParams(format!("{algorithm} is not supported")));
    }

    if let Some(allowed) = options.algorithms() {
        if !allowed.iter().any(|a| a == &algorithm) {
            debug!("Rejecting algorithm {} not in allow-list {:?}", algorithm, allowed);
            return Err(SignatureError::InvalidParams(format!("{algorithm} is not a supported algorithm")));
        }
    }

    let headers: Vec<String> = match header.param("headers") {
        Some(headers) if !headers.trim().is_empty() => headers.split_whitespace().map(|h| h.to_lowercase()).collect(),
        _ => vec![HDR_DATE.to_string()],
    };

    let signing_string =
        CanonicalRequest::from_request(request).signing_string(&headers, options.draft(), options.strict())?;

    if let Some(date) = request.headers().get(HDR_DATE) {
        let date = latin1_to_string(date.as_bytes());
        let request_timestamp = DateTime::<Utc>::parse_from_rfc1123(&date)
            .map_err(|e| SignatureError::InvalidHeader(format!("date header {date:?} is invalid: {e}")))?;
        let skew_ms = (server_timestamp - request_timestamp).num_milliseconds().unsigned_abs();

        if skew_ms > options.clock_skew().saturating_mul(1000) {
            debug!(
                "Request timestamp {} is {}ms away from server timestamp {}",
                request_timestamp, skew_ms, server_timestamp
            );
            return Err(SignatureError::ExpiredRequest(format!(
                "clock skew of {}s was greater than {}s",
                skew_ms as f64 / 1000.0,
                options.clock_skew()
            )));
        }
    }

    for required in options.headers() {
        let required = required.to_lowercase();
        if !headers.contains(&required) {
            debug!("Required header {} was not signed", required);
            return Err(SignatureError::MissingHeader(format!("{required} was not a signed header")));
        }
    }

    Ok(ParsedSignature {
        scheme: header.scheme().to_string(),
        params: SignatureParams {
            key_id: key_id.to_string(),
            algorithm,
            headers,
            signature: signature.to_string(),
            extensions: header.param("extensions").map(|e| e.to_string()),
        },
        signing_string,
    })
}

#[inline(always)]
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
