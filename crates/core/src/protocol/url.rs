//! Verification-id extraction from pasted links.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static QUERY_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)verificationId=([a-f0-9]+)").unwrap());
static PATH_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/verification/([a-f0-9]+)").unwrap());

/// Extract the hex verification id from a verification link.
///
/// Accepts both the `?verificationId=<hex>` query form and the
/// `/verification/<hex>` path form, case-insensitively. Returns `None` when
/// neither matches; callers treat that as a validation failure before any
/// network activity.
pub fn parse_verification_id(url: &str) -> Option<String> {
    QUERY_PARAM
        .captures(url)
        .or_else(|| PATH_SEGMENT.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}
