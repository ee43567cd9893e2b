//! Extraction of the validation inputs from an inbound request.
//!
//! Twilio signs the URL it requested, which behind a reverse proxy is not
//! the URL this server sees, so the proxy's forwarded headers win when set.

use axum::http::{header, request::Parts, HeaderMap};
use url::form_urlencoded;

use crate::error::GuardError;

pub const SIGNATURE_HEADER: &str = "X-Twilio-Signature";
pub const FORWARDED_HOST_HEADER: &str = "X-Forwarded-Host";
pub const FORWARDED_SERVER_HEADER: &str = "X-Forwarded-Server";
pub const FORWARDED_PROTO_HEADER: &str = "X-Forwarded-Proto";
pub const ORIGINAL_URI_HEADER: &str = "X-Original-URI";

/// Rebuild the absolute URL Twilio requested.
///
/// With `X-Forwarded-Host` (or the older `X-Forwarded-Server`) present, the
/// URL is `{X-Forwarded-Proto}://{host}{X-Original-URI}` and all three
/// headers are required. Otherwise the request URI is used when absolute,
/// else `{local_scheme}://{Host}{path?query}`.
pub fn reconstruct_url(parts: &Parts, local_scheme: &str) -> Result<String, GuardError> {
    let headers = &parts.headers;

    let forwarded_host = header_str(headers, FORWARDED_HOST_HEADER)
        .or_else(|| header_str(headers, FORWARDED_SERVER_HEADER));

    if let Some(host) = forwarded_host {
        let proto = header_str(headers, FORWARDED_PROTO_HEADER)
            .ok_or_else(|| GuardError::missing(FORWARDED_PROTO_HEADER))?;
        let original_uri = header_str(headers, ORIGINAL_URI_HEADER)
            .ok_or_else(|| GuardError::missing(ORIGINAL_URI_HEADER))?;
        return Ok(format!("{}://{}{}", first_value(proto), first_value(host), original_uri));
    }

    if let (Some(scheme), Some(authority)) = (parts.uri.scheme_str(), parts.uri.authority()) {
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        return Ok(format!("{scheme}://{authority}{path}"));
    }

    let host = header_str(headers, header::HOST.as_str())
        .ok_or_else(|| GuardError::missing("Host"))?;
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Ok(format!("{local_scheme}://{host}{path}"))
}

/// Read the `X-Twilio-Signature` header.
pub fn extract_signature(headers: &HeaderMap) -> Result<String, GuardError> {
    header_str(headers, SIGNATURE_HEADER)
        .map(str::to_string)
        .ok_or_else(|| GuardError::missing(SIGNATURE_HEADER))
}

/// Parse the POST fields, in wire order, duplicates kept.
///
/// Only form-encoded bodies carry signed fields; anything else yields none.
pub fn form_params(headers: &HeaderMap, body: &[u8]) -> Vec<(String, String)> {
    if !is_form_encoded(headers) {
        return Vec::new();
    }
    form_urlencoded::parse(body)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}

fn is_form_encoded(headers: &HeaderMap) -> bool {
    header_str(headers, header::CONTENT_TYPE.as_str())
        .and_then(|ct| ct.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Chained proxies append to forwarded headers; the client-facing hop is first.
fn first_value(raw: &str) -> &str {
    raw.split(',').next().unwrap_or(raw).trim()
}
