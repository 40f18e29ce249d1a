//! Authorization header grammar.
//!
//! The header value is `<scheme> <params>` where `<params>` is a comma-separated list of `name="value"` pairs.
//! Two dialects are accepted:
//! * current: `Signature keyId="k",algorithm="rsa-sha256",headers="date",signature="<base64>"`
//! * legacy: `Signature keyId="k",algorithm="rsa-sha256",headers="date" <base64>`
//!
//! Tokenizing is an explicit state machine: [transition] is a pure function from a state and an input character to
//! the next state and an [Action] to apply to the header being built.
//!
//! **Stability of this module is not guaranteed except for items exposed at the crate root**.
//! The functions and types are subject to change in minor/patch versions. This is exposed for
//! testing purposes only.

use {
    crate::{constants::*, SignatureError},
    log::trace,
    qualifier_attr::qualifiers,
    std::collections::HashMap,
};

/// States of the Authorization header tokenizer.

#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum ParseState {
    /// Reading the scheme, up to the first space.
    Scheme,

    /// Expecting the first letter of a parameter name.
    ParamStart,

    /// Reading a parameter name, up to `=`.
    Name,

    /// Expecting the opening quote of a parameter value.
    Quote,

    /// Reading a quoted parameter value, up to the closing quote.
    Value,

    /// After a closing quote: expecting `,` before another parameter or a space before a legacy signature.
    Comma,

    /// Reading a legacy unquoted signature to the end of the input.
    Signature,
}

impl ParseState {
    /// Whether the parameters read so far are complete in this state.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn is_accepting(&self) -> bool {
        matches!(self, Self::Scheme | Self::Comma | Self::Signature)
    }
}

/// Side effect of a transition on the header being built.

#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum Action {
    None,
    PushScheme(char),
    StartName(char),
    PushName(char),
    StartValue,
    PushValue(char),
    EndValue,
    StartSignature,
    PushSignature(char),
}

/// Advance the tokenizer by one character.

#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
fn transition(state: ParseState, c: char) -> Result<(ParseState, Action), SignatureError> {
    match (state, c) {
        (ParseState::Scheme, ' ') => Ok((ParseState::ParamStart, Action::None)),
        (ParseState::Scheme, c) => Ok((ParseState::Scheme, Action::PushScheme(c))),
        (ParseState::ParamStart, c) if c.is_ascii_alphabetic() => Ok((ParseState::Name, Action::StartName(c))),
        (ParseState::Name, c) if c.is_ascii_alphabetic() => Ok((ParseState::Name, Action::PushName(c))),
        (ParseState::Name, '=') => Ok((ParseState::Quote, Action::None)),
        (ParseState::Quote, '"') => Ok((ParseState::Value, Action::StartValue)),
        (ParseState::Value, '"') => Ok((ParseState::Comma, Action::EndValue)),
        (ParseState::Value, c) => Ok((ParseState::Value, Action::PushValue(c))),
        (ParseState::Comma, ',') => Ok((ParseState::ParamStart, Action::None)),
        (ParseState::Comma, ' ') => Ok((ParseState::Signature, Action::StartSignature)),
        (ParseState::Signature, c) => Ok((ParseState::Signature, Action::PushSignature(c))),
        _ => Err(SignatureError::InvalidHeader(MSG_BAD_PARAM_FORMAT.to_string())),
    }
}

/// The tokenized contents of an Authorization header. No semantic validation has been performed.

#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct AuthorizationHeader {
    /// The scheme; everything before the first space.
    scheme: String,

    /// Quoted parameters. If a name repeats, the last value wins.
    params: HashMap<String, String>,

    /// The unquoted signature of the legacy dialect, if present.
    legacy_signature: Option<String>,
}

impl AuthorizationHeader {
    /// Tokenize an Authorization header value.
    ///
    /// Parameters are only tokenized for the `Signature` scheme; any other scheme yields a header with no parameters.
    /// If the input ends partway through a parameter, that parameter is dropped and the rest of the header is kept.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn parse(value: &str) -> Result<Self, SignatureError> {
        let scheme = value.split_once(' ').map_or(value, |(scheme, _)| scheme);
        if scheme != SCHEME_SIGNATURE {
            trace!("Authorization scheme {:?} is not {}; skipping parameters", scheme, SCHEME_SIGNATURE);
            return Ok(Self {
                scheme: scheme.to_string(),
                ..Default::default()
            });
        }

        let mut result = Self::default();
        let mut state = ParseState::Scheme;
        let mut name = String::new();
        let mut param_value = String::new();

        for c in value.chars() {
            let (next, action) = transition(state, c)?;

            match action {
                Action::None => (),
                Action::PushScheme(c) => result.scheme.push(c),
                Action::StartName(c) => {
                    name.clear();
                    name.push(c);
                }
                Action::PushName(c) => name.push(c),
                Action::StartValue => param_value.clear(),
                Action::PushValue(c) => param_value.push(c),
                Action::EndValue => {
                    result.params.insert(name.clone(), std::mem::take(&mut param_value));
                }
                Action::StartSignature => result.legacy_signature = Some(String::new()),
                Action::PushSignature(c) => {
                    if let Some(signature) = result.legacy_signature.as_mut() {
                        signature.push(c);
                    }
                }
            }

            state = next;
        }

        if !state.is_accepting() {
            trace!("Authorization header ended in state {:?}; dropping partial parameter {:?}", state, name);
        }

        Ok(result)
    }

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns a quoted parameter by its exact (case-sensitive) name.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// The signature: the legacy trailing value if present, otherwise the quoted `signature` parameter.

    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn signature(&self) -> Option<&str> {
        self.legacy_signature.as_deref().or_else(|| self.param("signature"))
    }
}
