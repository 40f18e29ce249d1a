use {
    crate::{
        canonical::{request_target_line, CanonicalRequest, Draft},
        chronoutil::format_rfc1123,
        constants::*,
        Algorithm, KeyMaterial, SignatureError,
    },
    base64::{engine::general_purpose::STANDARD, Engine as _},
    chrono::{DateTime, Utc},
    derive_builder::Builder,
    http::{
        header::{HeaderName, HeaderValue},
        method::Method,
        request::Request,
    },
    log::{debug, trace},
    std::{
        future::{ready, Future, Ready},
        task::{Context, Poll},
    },
    tower::{service_fn, util::ServiceFn, BoxError, Service, ServiceExt},
};

/// Options for [`sign_request`].
#[derive(Builder, Clone, Debug)]
#[builder(derive(Debug))]
pub struct SignOptions {
    /// Identifier of the key, sent in the `keyId` parameter. Must not be empty.
    #[builder(setter(into))]
    key_id: String,

    /// The HMAC secret or private key to sign with.
    key: KeyMaterial,

    /// The algorithm (`rsa-sha256`) or bare family (`rsa`). If unset, it is inferred from the key.
    #[builder(setter(into, strip_option), default)]
    algorithm: Option<String>,

    /// Headers and pseudo-headers to sign, in order.
    #[builder(setter(custom), default = "vec![HDR_DATE.to_string()]")]
    headers: Vec<String>,

    /// Overrides the HTTP version rendered on the `request-line`.
    #[builder(setter(into, strip_option), default)]
    http_version: Option<String>,

    /// Reject the `request-line` pseudo-header.
    #[builder(default)]
    strict: bool,

    #[builder(default)]
    draft: Draft,

    /// The header to write the signature to.
    #[builder(setter(into), default = "HDR_AUTHORIZATION.to_string()")]
    authorization_header_name: String,
}

impl SignOptions {
    /// Create a [SignOptionsBuilder] to construct a [SignOptions].
    #[inline(always)]
    pub fn builder() -> SignOptionsBuilder {
        SignOptionsBuilder::default()
    }

    #[inline(always)]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    #[inline(always)]
    pub fn key(&self) -> &KeyMaterial {
        &self.key
    }

    #[inline(always)]
    pub fn algorithm(&self) -> Option<&str> {
        self.algorithm.as_deref()
    }

    #[inline(always)]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[inline(always)]
    pub fn http_version(&self) -> Option<&str> {
        self.http_version.as_deref()
    }

    #[inline(always)]
    pub fn strict(&self) -> bool {
        self.strict
    }

    #[inline(always)]
    pub fn draft(&self) -> Draft {
        self.draft
    }

    #[inline(always)]
    pub fn authorization_header_name(&self) -> &str {
        &self.authorization_header_name
    }

    /// The algorithm to sign with: the configured one, or the default for the key's family.
    pub fn resolve_algorithm(&self) -> Result<Algorithm, SignatureError> {
        let algorithm = match self.algorithm() {
            Some(algorithm) => Algorithm::parse_for_signing(algorithm)?,
            None => Algorithm::for_family(self.key.family()?),
        };

        if !algorithm.is_supported() {
            return Err(SignatureError::InvalidParams(format!("{algorithm} is not supported")));
        }

        Ok(algorithm)
    }
}

impl SignOptionsBuilder {
    /// Set the headers to sign. Names are lowercased.
    pub fn headers<I, S>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.headers = Some(headers.into_iter().map(|h| h.as_ref().to_lowercase()).collect());
        self
    }
}

/// Sign an outbound HTTP request, setting the authorization header. The current time is used if a `date` header
/// needs to be added.
pub fn sign_request<B>(request: &mut Request<B>, options: &SignOptions) -> Result<String, SignatureError> {
    sign_request_at(request, options, Utc::now())
}

/// Sign an outbound HTTP request, setting the authorization header.
///
/// If `date` is to be signed but the request has no `date` header, one is added using `timestamp`. On success,
/// the signing string is returned. An empty header list fails with [SignatureError::TypeError], since verifiers
/// read a missing list as `date` and would rebuild a different signing string.
pub fn sign_request_at<B>(
    request: &mut Request<B>,
    options: &SignOptions,
    timestamp: DateTime<Utc>,
) -> Result<String, SignatureError> {
    if options.key_id().is_empty() {
        return Err(SignatureError::TypeError("keyId must be a non-empty string".to_string()));
    }

    let header_name = HeaderName::from_bytes(options.authorization_header_name().as_bytes()).map_err(|e| {
        SignatureError::TypeError(format!("invalid header name {}: {e}", options.authorization_header_name()))
    })?;

    let headers = options.headers();
    if headers.is_empty() {
        return Err(SignatureError::TypeError("headers must not be empty".to_string()));
    }

    if headers.iter().any(|h| h == HDR_DATE) && !request.headers().contains_key(HDR_DATE) {
        let date = format_rfc1123(&timestamp);
        trace!("Adding date header: {}", date);
        request.headers_mut().insert(http::header::DATE, header_value(&date)?);
    }

    let algorithm = options.resolve_algorithm()?;

    let mut canonical = CanonicalRequest::from_request(request);
    if let Some(http_version) = options.http_version() {
        canonical = canonical.with_http_version(http_version);
    }

    let signing_string = canonical.signing_string(headers, options.draft(), options.strict())?;
    let signature = STANDARD.encode(options.key().sign(algorithm, signing_string.as_bytes())?);
    let authorization = authorization_value(options.key_id(), algorithm, headers, &signature, options.draft());

    request.headers_mut().insert(header_name, header_value(&authorization)?);
    debug!("Signed request for keyId {} using {}", options.key_id(), algorithm);

    Ok(signing_string)
}

fn header_value(value: &str) -> Result<HeaderValue, SignatureError> {
    HeaderValue::from_str(value).map_err(|e| SignatureError::TypeError(format!("invalid header value {value:?}: {e}")))
}

/// Assemble an authorization header value. `headers` is left out when it is just `date`, the parser's default.
fn authorization_value<S: AsRef<str>>(
    key_id: &str,
    algorithm: Algorithm,
    headers: &[S],
    signature: &str,
    draft: Draft,
) -> String {
    let mut params = format!(r#"{SCHEME_SIGNATURE} keyId="{key_id}",algorithm="{algorithm}""#);
    if !matches!(headers, [only] if only.as_ref() == HDR_DATE) {
        let headers = headers.iter().map(|h| h.as_ref()).collect::<Vec<_>>().join(" ");
        params.push_str(&format!(r#",headers="{headers}""#));
    }

    if draft.uses_legacy_header() {
        format!("{params} {signature}")
    } else {
        format!(r#"{params},signature="{signature}""#)
    }
}

/// The request sent to a signing service by [`RequestSigner::sign`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SigningPayload {
    key_id: String,
    algorithm: Algorithm,
    signing_string: String,
}

impl SigningPayload {
    #[inline(always)]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    #[inline(always)]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    #[inline(always)]
    pub fn signing_string(&self) -> &str {
        &self.signing_string
    }
}

/// The outcome of [`RequestSigner::sign`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignatureResult {
    key_id: String,
    algorithm: Algorithm,
    signature: String,
    headers: Vec<String>,
}

impl SignatureResult {
    #[inline(always)]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    #[inline(always)]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The base64 signature.
    #[inline(always)]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The signed header names, in order.
    #[inline(always)]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// The authorization header value for this signature.
    pub fn authorization(&self, draft: Draft) -> String {
        authorization_value(&self.key_id, self.algorithm, &self.headers, &self.signature, draft)
    }
}

/// Builds a signing string line by line, then hands it to a signing service.
///
/// Unlike [`sign_request`], this needs no [`Request`]; the caller writes each line and attaches the resulting headers
/// to whatever it is sending. Lines are always in the current draft's `name: value` form.
///
/// ```rust
/// # tokio_test::block_on(async {
/// use http::Method;
/// use scratchstack_http_signature::{Algorithm, KeyMaterial, KeySigningService, RequestSigner};
///
/// let mut signer = RequestSigner::new("my-key", "hmac-sha256".parse::<Algorithm>().unwrap());
/// signer.write_target(&Method::GET, "/resource").unwrap();
/// let date = signer.write_date_header().unwrap();
///
/// let mut service = KeySigningService::new(KeyMaterial::secret("sekrit"));
/// let result = signer.sign(&mut service).await.unwrap();
/// assert_eq!(result.headers(), &["(request-target)".to_string(), "date".to_string()]);
/// # let _ = date;
/// # });
/// ```
#[derive(Clone, Debug)]
pub struct RequestSigner {
    key_id: String,
    algorithm: Algorithm,
    headers: Vec<String>,
    lines: Vec<String>,
}

impl RequestSigner {
    pub fn new<S: Into<String>>(key_id: S, algorithm: Algorithm) -> Self {
        Self {
            key_id: key_id.into(),
            algorithm,
            headers: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Write the `(request-target)` line.
    pub fn write_target(&mut self, method: &Method, path: &str) -> Result<(), SignatureError> {
        self.push(PSEUDO_REQUEST_TARGET, request_target_line(method, path))
    }

    /// Write a `date` line using the current time. The caller must send the returned value as the `date` header.
    pub fn write_date_header(&mut self) -> Result<String, SignatureError> {
        self.write_date_header_at(Utc::now())
    }

    /// Write a `date` line for `timestamp`, returning the formatted date.
    pub fn write_date_header_at(&mut self, timestamp: DateTime<Utc>) -> Result<String, SignatureError> {
        let date = format_rfc1123(&timestamp);
        self.write_header(HDR_DATE, &date)?;
        Ok(date)
    }

    /// Write an arbitrary header line. The name is lowercased; each name may be written once.
    pub fn write_header(&mut self, name: &str, value: &str) -> Result<(), SignatureError> {
        let name = name.to_lowercase();
        let line = format!("{name}: {value}");
        self.push(&name, line)
    }

    fn push(&mut self, name: &str, line: String) -> Result<(), SignatureError> {
        if self.headers.iter().any(|h| h == name) {
            return Err(SignatureError::TypeError(format!("{name} has already been written")));
        }

        self.headers.push(name.to_string());
        self.lines.push(line);
        Ok(())
    }

    /// The header names written so far.
    #[inline(always)]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// The signing string accumulated so far.
    pub fn signing_string(&self) -> String {
        self.lines.join("\n")
    }

    /// Finish the signing string and sign it with `service`.
    ///
    /// This consumes the signer, so a result is produced at most once.
    pub async fn sign<S, F>(self, service: &mut S) -> Result<SignatureResult, SignatureError>
    where
        S: Service<SigningPayload, Response = Vec<u8>, Error = BoxError, Future = F> + Send,
        F: Future<Output = Result<Vec<u8>, BoxError>> + Send,
    {
        if self.lines.is_empty() {
            return Err(SignatureError::TypeError("no headers have been written".to_string()));
        }

        let payload = SigningPayload {
            key_id: self.key_id.clone(),
            algorithm: self.algorithm,
            signing_string: self.signing_string(),
        };

        match service.oneshot(payload).await {
            Ok(signature) => {
                trace!("RequestSigner: signed {} headers for keyId {}", self.headers.len(), self.key_id);
                Ok(SignatureResult {
                    key_id: self.key_id,
                    algorithm: self.algorithm,
                    signature: STANDARD.encode(signature),
                    headers: self.headers,
                })
            }
            Err(e) => {
                debug!("RequestSigner: signing service failed: {}", e);
                Err(e.into())
            }
        }
    }
}

/// A signing service backed by local key material.
#[derive(Clone, Debug)]
pub struct KeySigningService {
    key: KeyMaterial,
}

impl KeySigningService {
    pub fn new(key: KeyMaterial) -> Self {
        Self {
            key,
        }
    }
}

impl Service<SigningPayload> for KeySigningService {
    type Response = Vec<u8>;
    type Error = BoxError;
    type Future = Ready<Result<Vec<u8>, BoxError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: SigningPayload) -> Self::Future {
        ready(self.key.sign(req.algorithm, req.signing_string.as_bytes()).map_err(Into::into))
    }
}

/// Create a Service that wraps a function that can produce a raw signature, e.g. by calling a remote signer.
pub fn service_for_signer_fn<F, Fut>(f: F) -> ServiceFn<F>
where
    F: FnMut(SigningPayload) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Vec<u8>, BoxError>> + Send + 'static,
{
    service_fn(f)
}
