//! Twilio webhook signature verification.
//!
//! Twilio signs webhook requests using HMAC-SHA1.
//! Reference: https://www.twilio.com/docs/usage/security#validating-requests

use std::collections::{BTreeMap, BTreeSet};

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::warn;
use url::Url;

type HmacSha1 = Hmac<Sha1>;

/// Query parameter carrying the hex SHA-256 of a JSON webhook body.
pub const BODY_SHA256_PARAM: &str = "bodySHA256";

/// Validates Twilio request signatures for a single auth token.
#[derive(Clone)]
pub struct RequestValidator {
    auth_token: String,
}

impl std::fmt::Debug for RequestValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestValidator")
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

impl RequestValidator {
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
        }
    }

    /// Compute the base64 signature Twilio would send for `url` and `params`.
    ///
    /// The signed string is the full URL followed by every parameter name
    /// and value, names sorted and each name's distinct values sorted:
    /// `url + name1 + value1a + name1 + value1b + name2 + value2 ...`
    pub fn compute_signature(&self, url: &str, params: &[(String, String)]) -> Option<String> {
        let mut grouped: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (name, value) in params {
            grouped.entry(name.as_str()).or_default().insert(value.as_str());
        }

        let mut payload = String::from(url);
        for (name, values) in grouped {
            for value in values {
                payload.push_str(name);
                payload.push_str(value);
            }
        }

        let mut mac = match HmacSha1::new_from_slice(self.auth_token.as_bytes()) {
            Ok(m) => m,
            Err(_) => {
                warn!("twilio_signature_invalid_key");
                return None;
            }
        };
        mac.update(payload.as_bytes());

        Some(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Verify a form-encoded webhook signature.
    ///
    /// Twilio may or may not include the scheme's default port when it
    /// signs, so the signature is accepted against either form of the URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The externally visible URL Twilio requested
    /// * `params` - The POST form fields, in any order
    /// * `signature` - The `X-Twilio-Signature` header value
    pub fn validate(&self, url: &str, params: &[(String, String)], signature: &str) -> bool {
        if self.auth_token.is_empty() || signature.is_empty() {
            warn!(
                has_auth_token = !self.auth_token.is_empty(),
                has_signature = !signature.is_empty(),
                "twilio_signature_missing_fields"
            );
            return false;
        }

        url_variants(url).iter().any(|candidate| {
            self.compute_signature(candidate, params)
                .map(|expected| constant_time_compare(&expected, signature))
                .unwrap_or(false)
        })
    }

    /// Verify a JSON webhook, whose URL carries a `bodySHA256` query parameter.
    ///
    /// The signature covers the URL alone and the body must hash to the
    /// value in the query string.
    pub fn validate_body(&self, url: &str, body: &[u8], signature: &str) -> bool {
        let Some(expected_hash) = body_sha256_param(url) else {
            warn!("twilio_body_hash_missing");
            return false;
        };

        if !self.validate(url, &[], signature) {
            return false;
        }

        let actual_hash = hex::encode(Sha256::digest(body));
        let valid = constant_time_compare(&actual_hash, &expected_hash);
        if !valid {
            warn!(body_length = body.len(), "twilio_body_hash_mismatch");
        }
        valid
    }
}

/// Return the `bodySHA256` query value of `url`, if present.
pub fn body_sha256_param(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(name, _)| name == BODY_SHA256_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// The URL as given, plus the variant with its port removed or made explicit.
fn url_variants(url: &str) -> Vec<String> {
    let mut variants = vec![url.to_string()];

    let Ok(parsed) = Url::parse(url) else {
        return variants;
    };

    let alternate = if url_has_explicit_port(url, &parsed) {
        without_port(&parsed)
    } else {
        with_default_port(&parsed)
    };

    if let Some(alternate) = alternate {
        if alternate != url {
            variants.push(alternate);
        }
    }
    variants
}

/// `Url` drops default ports, so the raw authority has to be checked.
fn url_has_explicit_port(raw: &str, parsed: &Url) -> bool {
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let after_scheme = raw.split_once("://").map(|(_, rest)| rest).unwrap_or(raw);
    let authority = after_scheme
        .split(|c: char| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or("");
    let host_and_port = authority
        .rsplit('@')
        .next()
        .unwrap_or(authority)
        .to_ascii_lowercase();
    host_and_port
        .strip_prefix(host)
        .map(|rest| rest.starts_with(':'))
        .unwrap_or(false)
}

fn without_port(parsed: &Url) -> Option<String> {
    let mut stripped = parsed.clone();
    stripped.set_port(None).ok()?;
    Some(stripped.to_string())
}

fn with_default_port(parsed: &Url) -> Option<String> {
    let host = parsed.host_str()?;
    let port = parsed.port_or_known_default()?;

    let mut out = format!("{}://", parsed.scheme());
    if !parsed.username().is_empty() {
        out.push_str(parsed.username());
        if let Some(password) = parsed.password() {
            out.push(':');
            out.push_str(password);
        }
        out.push('@');
    }
    out.push_str(host);
    out.push(':');
    out.push_str(&port.to_string());
    out.push_str(parsed.path());
    if let Some(query) = parsed.query() {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = parsed.fragment() {
        out.push('#');
        out.push_str(fragment);
    }
    Some(out)
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
