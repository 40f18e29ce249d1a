//! HTTP Signature authentication (the `Signature` authorization scheme).
//!
//! This crate signs outgoing [`http::Request`]s and parses and verifies incoming ones. Signatures cover an ordered
//! list of headers and pseudo-headers rendered into a canonical signing string. HMAC (shared secret), RSA, DSA,
//! ECDSA (P-256, P-384), and Ed25519 keys are supported. Helpers are provided to convert OpenSSH public keys to PEM
//! and to compute their fingerprints.
//!
//! Four dialects of the signing string are supported through [`Draft`]. The dialect is always configured, never
//! detected.
//!
//! # Example
//! ```rust
//! use {
//!     chrono::{TimeZone, Utc},
//!     http::Request,
//!     scratchstack_http_signature::{
//!         parse_request_at, sign_request_at, verify_signature, KeyMaterial, ParseOptions, SignOptions,
//!     },
//! };
//!
//! let key = KeyMaterial::secret("sekrit");
//! let timestamp = Utc.with_ymd_and_hms(2014, 1, 5, 21, 31, 40).unwrap();
//!
//! let mut request = Request::get("/foo?param=value").body(()).unwrap();
//! let options = SignOptions::builder()
//!     .key_id("unit")
//!     .key(key.clone())
//!     .algorithm("hmac-sha256")
//!     .headers(["(request-target)", "date"])
//!     .build()
//!     .unwrap();
//! sign_request_at(&mut request, &options, timestamp).unwrap();
//!
//! let parsed = parse_request_at(&request, &ParseOptions::default(), timestamp).unwrap();
//! assert_eq!(parsed.key_id(), "unit");
//! assert_eq!(parsed.algorithm(), "HMAC-SHA256");
//! assert!(verify_signature(&parsed, &key).unwrap());
//! ```
#![warn(clippy::all)]

mod algorithm;
pub mod auth;
pub mod canonical;
mod chronoutil;
mod constants;
mod crypto;
mod error;
mod signature;
mod signer;
mod signing_key;
mod sshkey;
mod verify;

pub use crate::{
    algorithm::{is_supported_algorithm, Algorithm, AlgorithmFamily, HashAlgorithm, SUPPORTED_ALGORITHMS},
    canonical::Draft,
    chronoutil::ParseRFC1123,
    error::SignatureError,
    signature::{
        parse_request, parse_request_at, ParseOptions, ParseOptionsBuilder, ParseOptionsBuilderError, ParsedSignature,
        SignatureParams,
    },
    signer::{
        service_for_signer_fn, sign_request, sign_request_at, KeySigningService, RequestSigner, SignOptions,
        SignOptionsBuilder, SignOptionsBuilderError, SignatureResult, SigningPayload,
    },
    signing_key::KeyMaterial,
    sshkey::{fingerprint, pem_to_rsa_ssh_key, ssh_key_to_pem},
    verify::{verify_hmac, verify_signature, verify_signature_with_type},
};
