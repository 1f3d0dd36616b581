//! Identifier canonicalization.
//!
//! Callers may address a record either by a raw identifier or by a URL-safe
//! base64 encoding of `urn:<id>`. Both converge on one storage key: the standard
//! base64 encoding of the identifier with the scheme marker removed. Input that
//! is not base64 (or does not decode to UTF-8) is used as-is. Only an
//! all-alphabet input whose length cannot be padded is rejected.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;
use tracing::trace;

/// Scheme marker stripped from decoded identifiers.
pub const URN_SCHEME_PREFIX: &str = "urn:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanonicalizationError {
    #[error("malformed base64 padding: {len} characters leaves a remainder of 1")]
    MalformedPadding { len: usize },
}

/// Produce the canonical storage key for `input`.
///
/// Pure and idempotent: `canonicalize(&canonicalize(x)?)? == canonicalize(x)?`.
pub fn canonicalize(input: &str) -> Result<String, CanonicalizationError> {
    let mut standard: String = input
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    if !standard.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')) {
        trace!(%input, "identifier is outside the base64 alphabet; using it verbatim");
        return Ok(input.to_string());
    }

    // ascii from here on, so byte length is the character count
    let len = standard.len();
    match len % 4 {
        0 => {}
        2 => standard.push_str("=="),
        3 => standard.push('='),
        _ => return Err(CanonicalizationError::MalformedPadding { len }),
    }

    let text = match STANDARD
        .decode(standard.as_bytes())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    {
        Some(text) => text,
        None => {
            trace!(%input, "identifier is not base64 text; using it verbatim");
            return Ok(input.to_string());
        }
    };

    let mut id = text.as_str();
    while let Some(rest) = id.strip_prefix(URN_SCHEME_PREFIX) {
        id = rest;
    }
    Ok(STANDARD.encode(id.as_bytes()))
}
