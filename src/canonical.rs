//! Signing string construction.
//!
//! The signing string is built from an ordered list of header names and pseudo-headers. How each entry is rendered
//! depends on the [Draft] in use; the draft is always chosen by configuration and never guessed from the input.
//!
//! **Stability of this module is not guaranteed except for items exposed at the crate root**.
//! The functions and types are subject to change in minor/patch versions. This is exposed for
//! testing purposes only.

use {
    crate::{constants::*, SignatureError},
    http::{
        header::{HeaderMap, HeaderValue},
        request::Request,
        version::Version,
    },
    log::trace,
    qualifier_attr::qualifiers,
    std::{
        collections::HashMap,
        fmt::{Display, Formatter, Result as FmtResult},
        str::FromStr,
    },
};

/// A signing string dialect.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Draft {
    /// The earliest dialect: each line is the bare header value with no name prefix. `(request-target)` is not
    /// recognized. Signers emit the signature unquoted after a space.
    Legacy,

    /// Lines are `name: value`; `request-line` renders bare and `(request-target)` is not recognized. Signers emit
    /// the signature unquoted after a space.
    Draft01,

    /// Lines are `name: value`, including `(request-target): <method> <path>`. `request-line` is not recognized and
    /// is looked up as an ordinary header. Signers emit a quoted `signature="..."` parameter.
    Draft03,

    /// As [Draft::Draft03], except that `request-line` is still accepted outside of strict mode.
    #[default]
    Current,
}

impl Draft {
    /// Whether signers should place the signature after a space instead of in a quoted parameter.
    pub fn uses_legacy_header(&self) -> bool {
        matches!(self, Self::Legacy | Self::Draft01)
    }

    /// Whether `(request-target)` is a pseudo-header rather than an ordinary header name.
    pub fn has_request_target(&self) -> bool {
        matches!(self, Self::Draft03 | Self::Current)
    }
}

impl Display for Draft {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Draft01 => f.write_str("01"),
            Self::Draft03 => f.write_str("03"),
            Self::Current => f.write_str("current"),
        }
    }
}

impl FromStr for Draft {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" | "draft-00" | "00" | "0" => Ok(Self::Legacy),
            "draft-01" | "01" | "1" => Ok(Self::Draft01),
            "draft-03" | "03" | "3" => Ok(Self::Draft03),
            "current" => Ok(Self::Current),
            _ => Err(SignatureError::TypeError(format!("draft {s} is not supported"))),
        }
    }
}

/// The parts of an HTTP request that may be covered by a signature.
///
/// **The stability of this struct is not guaranteed.** The fields and methods are subject to
/// change in minor/patch versions.

#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
#[derive(Clone, Debug)]
struct CanonicalRequest {
    /// The HTTP method for the request, as sent (e.g., "GET").
    request_method: String,

    /// The path and query string, exactly as they appear on the request line.
    request_url: String,

    /// The HTTP version without the `HTTP/` prefix, e.g. "1.1".
    http_version: String,

    /// Headers from the HTTP request, keyed by lowercase name. Values are ordered as they appear in the request.
    headers: HashMap<String, Vec<Vec<u8>>>,
}

impl CanonicalRequest {
    /// Capture the signable parts of an HTTP request.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn from_request<B>(request: &Request<B>) -> Self {
        let request_url = request.uri().path_and_query().map(|pq| pq.as_str()).unwrap_or("/").to_string();

        Self {
            request_method: request.method().to_string(),
            request_url,
            http_version: version_to_string(request.version()).to_string(),
            headers: normalize_headers(request.headers()),
        }
    }

    /// Override the HTTP version rendered on the `request-line`.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn with_http_version(mut self, http_version: &str) -> Self {
        self.http_version = http_version.to_string();
        self
    }

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn request_method(&self) -> &str {
        &self.request_method
    }

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn request_url(&self) -> &str {
        &self.request_url
    }

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn http_version(&self) -> &str {
        &self.http_version
    }

    /// Returns the value of a header, with repeated values joined by `", "`, or `None` if it is absent.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn header_value(&self, name: &str) -> Option<String> {
        let values = self.headers.get(&name.to_lowercase())?;
        Some(values.iter().map(|v| latin1_to_string(v)).collect::<Vec<_>>().join(", "))
    }

    /// Build the signing string for the given header list.
    ///
    /// Each entry produces one line; lines are joined with `\n` and there is no trailing newline. An entry naming a
    /// header that is not present fails with [SignatureError::MissingHeader]. `request-line` fails with
    /// [SignatureError::StrictParsing] when `strict` is set, except under [Draft::Draft03], where it is an ordinary
    /// header name.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn signing_string<S: AsRef<str>>(&self, names: &[S], draft: Draft, strict: bool) -> Result<String, SignatureError> {
        let mut lines = Vec::with_capacity(names.len());

        for name in names {
            let name = name.as_ref();
            let line = match name {
                PSEUDO_REQUEST_LINE if draft != Draft::Draft03 => {
                    if strict {
                        return Err(SignatureError::StrictParsing(MSG_REQUEST_LINE_STRICT.to_string()));
                    }

                    format!("{} {} HTTP/{}", self.request_method, self.request_url, self.http_version)
                }
                PSEUDO_REQUEST_TARGET if draft.has_request_target() => {
                    request_target_line(&self.request_method, &self.request_url)
                }
                _ => {
                    let Some(value) = self.header_value(name) else {
                        return Err(SignatureError::MissingHeader(format!("{name} was not in the request")));
                    };

                    match draft {
                        Draft::Legacy => value,
                        _ => format!("{name}: {value}"),
                    }
                }
            };

            lines.push(line);
        }

        let result = lines.join("\n");
        trace!("Signing string ({}): {:?}", draft, result);
        Ok(result)
    }
}

/// Render the `(request-target)` line for a method and path.
pub(crate) fn request_target_line<M: AsRef<str>>(method: M, url: &str) -> String {
    format!("{PSEUDO_REQUEST_TARGET}: {} {url}", method.as_ref().to_lowercase())
}

/// Render an HTTP version the way it appears after `HTTP/` on a request line.
pub(crate) fn version_to_string(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "1.1",
    }
}

/// Convert a Latin-1 slice of bytes to a UTF-8 string.

#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| *b as char).collect()
}

/// Returns a dictionary of lowercase header names to their raw values.

#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
fn normalize_headers(headers: &HeaderMap<HeaderValue>) -> HashMap<String, Vec<Vec<u8>>> {
    let mut result = HashMap::<String, Vec<Vec<u8>>>::new();
    for (key, value) in headers.iter() {
        result.entry(key.as_str().to_lowercase()).or_default().push(value.as_bytes().to_vec());
    }

    result
}

#[cfg(test)]
mod tests {
    use {
        super::{latin1_to_string, request_target_line, CanonicalRequest, Draft},
        crate::SignatureError,
        http::{header::HeaderValue, method::Method, request::Request, version::Version},
    };

    macro_rules! expect_err {
        ($test:expr, $expected:ident) => {
            match $test {
                Ok(ref v) => panic!("Expected Err({}); got Ok({:?})", stringify!($expected), v),
                Err(ref e) => match e {
                    SignatureError::$expected(_) => e.to_string(),
                    _ => panic!("Expected {}; got {:#?}: {}", stringify!($expected), &e, &e),
                },
            }
        };
    }

    fn sample_request() -> CanonicalRequest {
        let request = Request::builder()
            .method(Method::POST)
            .uri("https://example.com/foo?param=value&pet=dog")
            .header("Host", "example.com")
            .header("Date", "Sun, 05 Jan 2014 21:31:40 GMT")
            .header("Content-Type", "application/json")
            .header("X-Multi", "a")
            .header("X-Multi", "b")
            .body(())
            .unwrap();
        CanonicalRequest::from_request(&request)
    }

    #[test_log::test]
    fn test_draft_from_str() {
        assert_eq!("legacy".parse::<Draft>().unwrap(), Draft::Legacy);
        assert_eq!("00".parse::<Draft>().unwrap(), Draft::Legacy);
        assert_eq!("draft-00".parse::<Draft>().unwrap(), Draft::Legacy);
        assert_eq!("01".parse::<Draft>().unwrap(), Draft::Draft01);
        assert_eq!("draft-01".parse::<Draft>().unwrap(), Draft::Draft01);
        assert_eq!("03".parse::<Draft>().unwrap(), Draft::Draft03);
        assert_eq!("Draft-03".parse::<Draft>().unwrap(), Draft::Draft03);
        assert_eq!("CURRENT".parse::<Draft>().unwrap(), Draft::Current);
        assert_eq!(Draft::default(), Draft::Current);
        assert_eq!(Draft::Draft01.to_string(), "01");
        assert_eq!(Draft::Draft03.to_string(), "03");
        assert!(Draft::Legacy.uses_legacy_header());
        assert!(!Draft::Draft03.uses_legacy_header());
        assert!(!Draft::Current.uses_legacy_header());

        for draft in [Draft::Legacy, Draft::Draft01, Draft::Draft03, Draft::Current] {
            assert_eq!(draft.to_string().parse::<Draft>().unwrap(), draft);
        }

        let e = expect_err!("02".parse::<Draft>(), TypeError);
        assert_eq!(e, "draft 02 is not supported");

        let e = expect_err!("draft-04".parse::<Draft>(), TypeError);
        assert_eq!(e, "draft draft-04 is not supported");
    }

    #[test_log::test]
    fn test_current_draft() {
        let cr = sample_request();
        assert_eq!(cr.request_method(), "POST");
        assert_eq!(cr.request_url(), "/foo?param=value&pet=dog");
        assert_eq!(cr.http_version(), "1.1");

        let ss = cr.signing_string(&["(request-target)", "host", "date"], Draft::Current, false).unwrap();
        assert_eq!(
            ss,
            "(request-target): post /foo?param=value&pet=dog\nhost: example.com\ndate: Sun, 05 Jan 2014 21:31:40 GMT"
        );

        let ss = cr.signing_string(&["date", "request-line"], Draft::Current, false).unwrap();
        assert_eq!(ss, "date: Sun, 05 Jan 2014 21:31:40 GMT\nPOST /foo?param=value&pet=dog HTTP/1.1");
    }

    #[test_log::test]
    fn test_legacy_drafts() {
        let cr = sample_request();

        let ss = cr.signing_string(&["date", "content-type"], Draft::Legacy, false).unwrap();
        assert_eq!(ss, "Sun, 05 Jan 2014 21:31:40 GMT\napplication/json");

        let ss = cr.signing_string(&["request-line", "date"], Draft::Draft01, false).unwrap();
        assert_eq!(ss, "POST /foo?param=value&pet=dog HTTP/1.1\ndate: Sun, 05 Jan 2014 21:31:40 GMT");

        // Older drafts treat (request-target) as an ordinary header name.
        let e = expect_err!(cr.signing_string(&["(request-target)"], Draft::Draft01, false), MissingHeader);
        assert_eq!(e, "(request-target) was not in the request");
    }

    #[test_log::test]
    fn test_draft03() {
        let cr = sample_request();

        let ss = cr.signing_string(&["(request-target)", "host", "date"], Draft::Draft03, false).unwrap();
        assert_eq!(
            ss,
            "(request-target): post /foo?param=value&pet=dog\nhost: example.com\ndate: Sun, 05 Jan 2014 21:31:40 GMT"
        );

        // request-line was replaced by (request-target), so it is looked up as a header, strict or not.
        for strict in [false, true] {
            let e = expect_err!(cr.signing_string(&["request-line"], Draft::Draft03, strict), MissingHeader);
            assert_eq!(e, "request-line was not in the request");
        }
    }

    #[test_log::test]
    fn test_missing_and_strict() {
        let cr = sample_request();

        let e = expect_err!(cr.signing_string(&["date", "digest"], Draft::Current, false), MissingHeader);
        assert_eq!(e, "digest was not in the request");

        let e = expect_err!(cr.signing_string(&["date", "request-line"], Draft::Current, true), StrictParsing);
        assert_eq!(e, "request-line is not a valid header with strict parsing enabled.");

        // Strict mode has no effect on other pseudo-headers.
        assert!(cr.signing_string(&["(request-target)"], Draft::Current, true).is_ok());
    }

    #[test_log::test]
    fn test_repeated_and_latin1_headers() {
        let cr = sample_request();
        assert_eq!(cr.signing_string(&["x-multi"], Draft::Current, false).unwrap(), "x-multi: a, b");

        let request = Request::builder()
            .uri("/")
            .version(Version::HTTP_10)
            .header("X-Latin1", HeaderValue::from_bytes(b"caf\xe9").unwrap())
            .body(())
            .unwrap();
        let cr = CanonicalRequest::from_request(&request);
        assert_eq!(cr.header_value("X-LATIN1").unwrap(), "café");
        assert_eq!(cr.signing_string(&["request-line"], Draft::Current, false).unwrap(), "GET / HTTP/1.0");

        let cr = cr.with_http_version("1.1");
        assert_eq!(cr.signing_string(&["request-line"], Draft::Current, false).unwrap(), "GET / HTTP/1.1");

        assert_eq!(latin1_to_string(b"\xa9 2014"), "© 2014");
    }

    #[test_log::test]
    fn test_request_target_line() {
        assert_eq!(request_target_line("GET", "/"), "(request-target): get /");
        assert_eq!(request_target_line(Method::DELETE, "/a/b?c=d"), "(request-target): delete /a/b?c=d");
    }
}
