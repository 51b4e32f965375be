//! URL validation and destination building.
//!
//! A scanned value becomes a destination in one of two ways: it is already
//! an absolute URL and is used as-is, or it is handed to the configured
//! redirect as a `tag` query parameter.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Characters escaped in the `tag` parameter. Matches `encodeURIComponent`,
/// which leaves `A-Z a-z 0-9 - _ . ! ~ * ' ( )` untouched.
const TAG_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Query parameter carrying a scanned value to the redirect.
const TAG_PARAM: &str = "tag";

/// Check if a string is an absolute URL with a scheme and a host.
///
/// Relative paths, bare words and malformed input are all `false`.
#[must_use]
pub fn is_valid_url(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }

    Url::parse(value).is_ok_and(|url| url.host_str().is_some_and(|host| !host.is_empty()))
}

/// Compute where a scanned value should lead.
///
/// - A value that is itself a valid URL wins over the redirect.
/// - With no redirect configured the trimmed value is returned as-is.
/// - An empty value leads to the redirect.
/// - Anything else is appended to the redirect as `tag=<value>`, joined with
///   `&` when the redirect already has a query.
#[must_use]
pub fn build_destination_url(value: &str, default_redirect_url: &str) -> String {
    let trimmed = value.trim();

    if is_valid_url(trimmed) {
        return trimmed.to_string();
    }

    if default_redirect_url.is_empty() {
        return trimmed.to_string();
    }

    if trimmed.is_empty() {
        return default_redirect_url.to_string();
    }

    let separator = if !default_redirect_url.contains('?') {
        "?"
    } else if default_redirect_url.ends_with(['?', '&']) {
        ""
    } else {
        "&"
    };

    format!(
        "{default_redirect_url}{separator}{TAG_PARAM}={}",
        utf8_percent_encode(trimmed, TAG_VALUE)
    )
}
