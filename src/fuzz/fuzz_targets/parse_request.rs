#![no_main]
use {
    arbitrary::Arbitrary,
    chrono::{TimeZone, Utc},
    http::{Method, Request, Uri},
    libfuzzer_sys::{fuzz_target, Corpus},
    scratchstack_http_signature::{parse_request_at, verify_signature, Draft, KeyMaterial, ParseOptions},
};

#[derive(Arbitrary, Clone, Copy, Debug)]
enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
            HttpMethod::Patch => Method::PATCH,
        }
    }
}

#[derive(Arbitrary, Clone, Copy, Debug)]
enum FuzzDraft {
    Legacy,
    Draft01,
    Draft03,
    Current,
}

impl From<FuzzDraft> for Draft {
    fn from(draft: FuzzDraft) -> Self {
        match draft {
            FuzzDraft::Legacy => Draft::Legacy,
            FuzzDraft::Draft01 => Draft::Draft01,
            FuzzDraft::Draft03 => Draft::Draft03,
            FuzzDraft::Current => Draft::Current,
        }
    }
}

#[derive(Arbitrary, Debug)]
struct ParseInput {
    method: HttpMethod,
    uri: String,
    authorization: String,
    date: Option<String>,
    headers: Vec<(String, String)>,
    required: Vec<String>,
    strict: bool,
    draft: FuzzDraft,
}

fuzz_target!(|data: ParseInput| -> Corpus {
    let Some(request) = build_request(&data) else {
        return Corpus::Reject;
    };

    let Ok(options) =
        ParseOptions::builder().headers(data.required).strict(data.strict).draft(data.draft.into()).build()
    else {
        return Corpus::Reject;
    };

    let server_timestamp = Utc.with_ymd_and_hms(2014, 1, 5, 21, 31, 40).unwrap();
    if let Ok(parsed) = parse_request_at(&request, &options, server_timestamp) {
        assert!(!parsed.key_id().is_empty());
        assert!(!parsed.signature().is_empty());
        let _ = verify_signature(&parsed, &KeyMaterial::secret("sekrit"));
    }

    Corpus::Keep
});

fn build_request(data: &ParseInput) -> Option<Request<()>> {
    let uri = Uri::try_from(data.uri.as_str()).ok()?;
    let method: Method = data.method.into();

    let mut builder = Request::builder().method(method).uri(uri).header("authorization", data.authorization.as_str());
    if let Some(date) = &data.date {
        builder = builder.header("date", date.as_str());
    }

    for (name, value) in &data.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    builder.body(()).ok()
}
