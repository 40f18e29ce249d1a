use {
    chrono::{DateTime, Duration, TimeZone, Utc},
    http::{header::HeaderValue, method::Method, request::Request},
    scratchstack_http_signature::{
        parse_request_at, sign_request_at, verify_hmac, verify_signature, Algorithm, Draft, KeyMaterial,
        KeySigningService, ParseOptions, RequestSigner, SignOptions, SignatureError,
    },
};

const RSA_PRIVATE: &str = include_str!("data/rsa_private.pem");
const RSA_PUBLIC: &str = include_str!("data/rsa_public.pem");
const RSA_OTHER_PUBLIC: &str = include_str!("data/rsa_other_public.pem");
const DSA_PRIVATE: &str = include_str!("data/dsa_private.pem");
const DSA_PUBLIC: &str = include_str!("data/dsa_public.pem");
const EC_P256_PRIVATE: &str = include_str!("data/ecdsa_p256_private.pem");
const EC_P256_PUBLIC: &str = include_str!("data/ecdsa_p256_public.pem");
const EC_P384_PRIVATE: &str = include_str!("data/ecdsa_p384_private.pem");
const EC_P384_PUBLIC: &str = include_str!("data/ecdsa_p384_public.pem");
const ED25519_PRIVATE: &str = include_str!("data/ed25519_private.pem");
const ED25519_PUBLIC: &str = include_str!("data/ed25519_public.pem");

const DATE: &str = "Sun, 05 Jan 2014 21:31:40 GMT";
const DIGEST: &str = "SHA-256=X48E9qOokqqrvdts8nOJRJN3OWDUoyWxBf7kbu9DBPE=";
const RSA_SHA256_SIG: &str = "QaUx/VnAdAdAgcuIoNbUnkk/Jz5iRyxn3q/gCA51CcVT7CWJfJwk6I+tqPKFUaw38zW0jRvvFJpbNBCELk2AzZAemq4LBCKIEpayksVQD9UechOo7guu9cQ4L9xmFMDSVpd6cYc3zE2pJQ+eaHh9Ii0uRw2yle6rwSknGwVqbJQSq0VAh5oSe2SrZ15ephVBaB3E3Ptu9uctfIDp2YvKQenDmhoGQdsw+YPrKnMb+fQFyZfPCaS+nO+UDcB1HhGb+a4/Q6puoYgmkcZTjJESV38pe+l5l5TKuI7n2StN46oyaBOfLjfKWxGXFBal1o+isfLc9+/k9xAcvK40zn7CdQ==";

const SIGNED_HEADERS: [&str; 6] = ["(request-target)", "host", "date", "content-type", "digest", "content-length"];

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

fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2014, 1, 5, 21, 31, 40).unwrap()
}

fn request() -> Request<()> {
    Request::builder()
        .method(Method::POST)
        .uri("/foo?param=value&pet=dog")
        .header("host", "example.com")
        .header("content-type", "application/json")
        .header("digest", DIGEST)
        .header("content-length", "18")
        .body(())
        .unwrap()
}

/// Sign a request with `signing_key`, parse it back, and check that it verifies with `verifying_key` and not with
/// `wrong_key`.
fn run(signing_key: KeyMaterial, verifying_key: KeyMaterial, wrong_key: Option<KeyMaterial>, algorithm: &str) {
    let mut req = request();
    let options = SignOptions::builder()
        .key_id("Test")
        .key(signing_key)
        .algorithm(algorithm)
        .headers(SIGNED_HEADERS)
        .build()
        .unwrap();
    let signing_string = sign_request_at(&mut req, &options, timestamp()).unwrap();
    assert_eq!(
        signing_string,
        format!(
            "(request-target): post /foo?param=value&pet=dog\nhost: example.com\ndate: {DATE}\n\
             content-type: application/json\ndigest: {DIGEST}\ncontent-length: 18"
        )
    );

    let parse_options = ParseOptions::builder().headers(["(request-target)", "date", "digest"]).build().unwrap();
    let parsed = parse_request_at(&req, &parse_options, timestamp()).unwrap();
    assert_eq!(parsed.scheme(), "Signature");
    assert_eq!(parsed.key_id(), "Test");
    assert_eq!(parsed.algorithm(), algorithm.to_uppercase());
    assert_eq!(parsed.params().headers, SIGNED_HEADERS);
    assert_eq!(parsed.signing_string(), signing_string);

    assert!(verify_signature(&parsed, &verifying_key).unwrap(), "{algorithm} did not verify");
    if let Some(wrong_key) = wrong_key {
        assert!(!verify_signature(&parsed, &wrong_key).unwrap(), "{algorithm} verified with the wrong key");
    }

    // Changing a signed header after signing must break the signature.
    req.headers_mut().insert("digest", HeaderValue::from_static("SHA-256=tampered"));
    let parsed = parse_request_at(&req, &parse_options, timestamp()).unwrap();
    assert!(!verify_signature(&parsed, &verifying_key).unwrap(), "{algorithm} verified a tampered request");
}

#[test_log::test]
fn rsa_sha1() {
    run(
        KeyMaterial::pem(RSA_PRIVATE),
        KeyMaterial::pem(RSA_PUBLIC),
        Some(KeyMaterial::pem(RSA_OTHER_PUBLIC)),
        "rsa-sha1",
    );
}

#[test_log::test]
fn rsa_sha256() {
    run(
        KeyMaterial::pem(RSA_PRIVATE),
        KeyMaterial::pem(RSA_PUBLIC),
        Some(KeyMaterial::pem(RSA_OTHER_PUBLIC)),
        "rsa-sha256",
    );
}

#[test_log::test]
fn rsa_sha512() {
    run(
        KeyMaterial::pem(RSA_PRIVATE),
        KeyMaterial::pem(RSA_PUBLIC),
        Some(KeyMaterial::pem(RSA_OTHER_PUBLIC)),
        "rsa-sha512",
    );
}

#[test_log::test]
fn rsa_private_key_verifies() {
    run(KeyMaterial::pem(RSA_PRIVATE), KeyMaterial::pem(RSA_PRIVATE), None, "rsa-sha256");
}

#[test_log::test]
fn dsa_sha1() {
    run(KeyMaterial::pem(DSA_PRIVATE), KeyMaterial::pem(DSA_PUBLIC), None, "dsa-sha1");
}

#[test_log::test]
fn dsa_sha256() {
    run(KeyMaterial::pem(DSA_PRIVATE), KeyMaterial::pem(DSA_PUBLIC), None, "dsa-sha256");
}

#[test_log::test]
fn ecdsa_p256_sha256() {
    run(
        KeyMaterial::pem(EC_P256_PRIVATE),
        KeyMaterial::pem(EC_P256_PUBLIC),
        Some(KeyMaterial::pem(EC_P384_PUBLIC)),
        "ecdsa-sha256",
    );
}

#[test_log::test]
fn ecdsa_p384_sha512() {
    run(
        KeyMaterial::pem(EC_P384_PRIVATE),
        KeyMaterial::pem(EC_P384_PUBLIC),
        Some(KeyMaterial::pem(EC_P256_PUBLIC)),
        "ecdsa-sha512",
    );
}

#[test_log::test]
fn ed25519_sha512() {
    run(KeyMaterial::pem(ED25519_PRIVATE), KeyMaterial::pem(ED25519_PUBLIC), None, "ed25519-sha512");
}

#[test_log::test]
fn hmac_sha1() {
    run(KeyMaterial::secret("sekrit"), KeyMaterial::secret("sekrit"), Some(KeyMaterial::secret("wrong")), "hmac-sha1");
}

#[test_log::test]
fn hmac_sha256() {
    run(
        KeyMaterial::secret("sekrit"),
        KeyMaterial::secret("sekrit"),
        Some(KeyMaterial::secret("wrong")),
        "hmac-sha256",
    );
}

#[test_log::test]
fn hmac_sha512() {
    run(
        KeyMaterial::secret("sekrit"),
        KeyMaterial::secret("sekrit"),
        Some(KeyMaterial::secret("wrong")),
        "hmac-sha512",
    );
}

#[test_log::test]
fn rsa_sha256_vector() {
    let mut req = Request::get("/").body(()).unwrap();
    let options = SignOptions::builder().key_id("Test").key(KeyMaterial::pem(RSA_PRIVATE)).build().unwrap();
    let signing_string = sign_request_at(&mut req, &options, timestamp()).unwrap();
    assert_eq!(signing_string, format!("date: {DATE}"));
    assert_eq!(req.headers().get("date").unwrap(), DATE);
    assert_eq!(
        req.headers().get("authorization").unwrap(),
        format!(r#"Signature keyId="Test",algorithm="rsa-sha256",signature="{RSA_SHA256_SIG}""#)
            .as_str()
    );

    let parsed = parse_request_at(&req, &ParseOptions::default(), timestamp()).unwrap();
    assert_eq!(parsed.signature(), RSA_SHA256_SIG);
    assert!(verify_signature(&parsed, &KeyMaterial::pem(RSA_PUBLIC)).unwrap());
}

#[test_log::test]
fn legacy_dialect() {
    let key = KeyMaterial::secret("sekrit");
    let mut req = request();
    let options = SignOptions::builder()
        .key_id("Test")
        .key(key.clone())
        .algorithm("hmac-sha256")
        .headers(["date", "digest"])
        .draft(Draft::Legacy)
        .build()
        .unwrap();
    let signing_string = sign_request_at(&mut req, &options, timestamp()).unwrap();
    assert_eq!(signing_string, format!("{DATE}\n{DIGEST}"));

    let authorization = req.headers().get("authorization").unwrap().to_str().unwrap().to_string();
    assert!(authorization.starts_with(r#"Signature keyId="Test",algorithm="hmac-sha256",headers="date digest" "#));
    assert!(!authorization.contains("signature="));

    let parse_options = ParseOptions::builder().draft(Draft::Legacy).build().unwrap();
    let parsed = parse_request_at(&req, &parse_options, timestamp()).unwrap();
    assert_eq!(parsed.signing_string(), signing_string);
    assert!(verify_hmac(&parsed, b"sekrit").unwrap());

    // Canonicalizing with the wrong dialect yields a different signing string.
    let parsed = parse_request_at(&req, &ParseOptions::default(), timestamp()).unwrap();
    assert!(!verify_signature(&parsed, &key).unwrap());
}

#[test_log::test]
fn draft01_request_line() {
    let key = KeyMaterial::pem(RSA_PRIVATE);
    let mut req = request();
    let options = SignOptions::builder()
        .key_id("Test")
        .key(key)
        .headers(["request-line", "host", "date"])
        .draft(Draft::Draft01)
        .build()
        .unwrap();
    let signing_string = sign_request_at(&mut req, &options, timestamp()).unwrap();
    assert_eq!(signing_string, format!("POST /foo?param=value&pet=dog HTTP/1.1\nhost: example.com\ndate: {DATE}"));

    let parse_options = ParseOptions::builder().draft(Draft::Draft01).build().unwrap();
    let parsed = parse_request_at(&req, &parse_options, timestamp()).unwrap();
    assert!(verify_signature(&parsed, &KeyMaterial::pem(RSA_PUBLIC)).unwrap());

    let strict = ParseOptions::builder().draft(Draft::Draft01).strict(true).build().unwrap();
    let e = expect_err!(parse_request_at(&req, &strict, timestamp()), StrictParsing);
    assert_eq!(e, "request-line is not a valid header with strict parsing enabled.");
}

#[test_log::test]
fn every_draft_round_trips() {
    let key = KeyMaterial::secret("sekrit");
    let target = format!("(request-target): post /foo?param=value&pet=dog\ndate: {DATE}");
    let cases = [
        (Draft::Legacy, ["host", "date"], format!("example.com\n{DATE}")),
        (Draft::Draft01, ["request-line", "date"], format!("POST /foo?param=value&pet=dog HTTP/1.1\ndate: {DATE}")),
        (Draft::Draft03, ["(request-target)", "date"], target.clone()),
        (Draft::Current, ["(request-target)", "date"], target),
    ];

    for (draft, headers, expected) in cases {
        let mut req = request();
        let options =
            SignOptions::builder().key_id("Test").key(key.clone()).headers(headers).draft(draft).build().unwrap();
        let signing_string = sign_request_at(&mut req, &options, timestamp()).unwrap();
        assert_eq!(signing_string, expected, "{draft}");

        let authorization = req.headers().get("authorization").unwrap().to_str().unwrap().to_string();
        assert_eq!(authorization.contains(",signature="), !draft.uses_legacy_header(), "{draft}: {authorization}");

        let parse_options = ParseOptions::builder().draft(draft).build().unwrap();
        let parsed = parse_request_at(&req, &parse_options, timestamp()).unwrap();
        assert_eq!(parsed.params().headers, headers, "{draft}");
        assert_eq!(parsed.signing_string(), signing_string, "{draft}");
        assert!(verify_signature(&parsed, &key).unwrap(), "{draft} did not verify");
    }
}

#[test_log::test]
fn custom_header_name() {
    let key = KeyMaterial::pem(EC_P256_PRIVATE);
    let mut req = request();
    let options = SignOptions::builder()
        .key_id("Test")
        .key(key)
        .authorization_header_name("Signature")
        .build()
        .unwrap();
    sign_request_at(&mut req, &options, timestamp()).unwrap();
    assert!(req.headers().get("authorization").is_none());

    // The algorithm is inferred from the key.
    let parse_options = ParseOptions::builder().authorization_header_name("signature").build().unwrap();
    let parsed = parse_request_at(&req, &parse_options, timestamp()).unwrap();
    assert_eq!(parsed.algorithm(), "ECDSA-SHA256");
    assert!(verify_signature(&parsed, &KeyMaterial::pem(EC_P256_PUBLIC)).unwrap());

    let e = expect_err!(parse_request_at(&req, &ParseOptions::default(), timestamp()), MissingHeader);
    assert_eq!(e, "no authorization header present in the request");
}

#[test_log::test]
fn clock_skew() {
    let mut req = request();
    let options = SignOptions::builder().key_id("Test").key(KeyMaterial::secret("sekrit")).build().unwrap();
    sign_request_at(&mut req, &options, timestamp()).unwrap();

    let later = timestamp() + Duration::seconds(300);
    parse_request_at(&req, &ParseOptions::default(), later).unwrap();

    let later = timestamp() + Duration::seconds(301);
    let e = expect_err!(parse_request_at(&req, &ParseOptions::default(), later), ExpiredRequest);
    assert_eq!(e, "clock skew of 301s was greater than 300s");

    let relaxed = ParseOptions::builder().clock_skew(600).build().unwrap();
    parse_request_at(&req, &relaxed, later).unwrap();
}

#[test_log::test]
fn algorithm_allow_list() {
    let mut req = request();
    let options = SignOptions::builder().key_id("Test").key(KeyMaterial::pem(RSA_PRIVATE)).build().unwrap();
    sign_request_at(&mut req, &options, timestamp()).unwrap();

    let hmac_only = ParseOptions::builder().algorithms(["HMAC-SHA256"]).build().unwrap();
    let e = expect_err!(parse_request_at(&req, &hmac_only, timestamp()), InvalidParams);
    assert_eq!(e, "rsa-sha256 is not a supported algorithm");

    let rsa_only = ParseOptions::builder().algorithms(["rsa-sha256"]).build().unwrap();
    let parsed = parse_request_at(&req, &rsa_only, timestamp()).unwrap();

    // A caller expecting an HMAC signature must not accept an RSA one.
    let e = expect_err!(verify_hmac(&parsed, b"sekrit"), TypeError);
    assert_eq!(e, "algorithm RSA-SHA256 is not an HMAC algorithm");
}

#[test_log::test(tokio::test)]
async fn incremental_signer() {
    let key = KeyMaterial::pem(ED25519_PRIVATE);
    let algorithm = "ed25519-sha512".parse::<Algorithm>().unwrap();
    let mut signer = RequestSigner::new("Test", algorithm);
    signer.write_target(&Method::POST, "/foo?param=value&pet=dog").unwrap();
    signer.write_header("Host", "example.com").unwrap();
    let date = signer.write_date_header_at(timestamp()).unwrap();
    assert_eq!(date, DATE);

    let mut service = KeySigningService::new(key);
    let result = signer.sign(&mut service).await.unwrap();

    let mut req = request();
    req.headers_mut().insert("date", HeaderValue::from_str(&date).unwrap());
    req.headers_mut().insert("authorization", HeaderValue::from_str(&result.authorization(Draft::Current)).unwrap());

    let parse_options = ParseOptions::builder().headers(["(request-target)", "host", "date"]).build().unwrap();
    let parsed = parse_request_at(&req, &parse_options, timestamp()).unwrap();
    assert_eq!(parsed.params().headers, ["(request-target)", "host", "date"]);
    assert!(verify_signature(&parsed, &KeyMaterial::pem(ED25519_PUBLIC)).unwrap());
}
