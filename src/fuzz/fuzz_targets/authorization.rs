#![no_main]
use {
    libfuzzer_sys::fuzz_target,
    scratchstack_http_signature::auth::{transition, AuthorizationHeader, ParseState},
};

fuzz_target!(|data: &str| {
    let parsed = AuthorizationHeader::parse(data);
    let scheme = data.split_once(' ').map_or(data, |(scheme, _)| scheme);

    // Parameters of other schemes are never tokenized.
    if scheme != "Signature" {
        let header = parsed.expect("non-Signature schemes always tokenize");
        assert_eq!(header.scheme(), scheme);
        assert_eq!(header.signature(), None);
        return;
    }

    // Replaying the transitions by hand must agree with the parser. Running out of input is never an error.
    let mut state = ParseState::Scheme;
    let mut accepted = true;
    for c in data.chars() {
        match transition(state, c) {
            Ok((next, _)) => state = next,
            Err(_) => {
                accepted = false;
                break;
            }
        }
    }

    assert_eq!(parsed.is_ok(), accepted);
});
