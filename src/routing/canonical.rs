//! Request path canonicalization.
//!
//! # Responsibilities
//! - Enforce a leading `/`
//! - Collapse repeated slashes, `.` and `..` segments lexically
//! - Keep a trailing `/` so subtree patterns stay reachable
//! - Build the `Location` of a canonicalization redirect
//! - Convert between the wire form of a path and its decoded form
//!
//! # Design Decisions
//! - Matching and cleaning work on the percent-decoded path, so
//!   `/a/%2e%2e/b` is the same request as `/a/../b`
//! - Purely lexical: no filesystem involved
//! - `..` at the root is dropped, never escapes above `/`
//! - `clean_path(clean_path(p)) == clean_path(p)` for every input

use std::borrow::Cow;

use axum::http::Uri;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Bytes escaped when a decoded path is written back into a URL.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-decode a request path. Invalid UTF-8 is replaced, not rejected.
pub fn decode_path(path: &str) -> Cow<'_, str> {
    percent_decode_str(path).decode_utf8_lossy()
}

/// Percent-encode a decoded path for use in a URL or `Location` header.
pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH).to_string()
}

/// Return the canonical form of `path`.
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut cleaned = String::with_capacity(path.len() + 1);
    for segment in &segments {
        cleaned.push('/');
        cleaned.push_str(segment);
    }
    if cleaned.is_empty() {
        cleaned.push('/');
    }

    if path.ends_with('/') && cleaned != "/" {
        cleaned.push('/');
    }
    cleaned
}

/// Build the redirect target for `uri` with its path replaced by the
/// decoded `path`, re-encoded.
///
/// Query string is carried over, as are scheme and authority when the
/// request used an absolute-form target.
pub fn redirect_location(uri: &Uri, path: &str) -> String {
    let mut location = String::new();
    if let (Some(scheme), Some(authority)) = (uri.scheme_str(), uri.authority()) {
        location.push_str(scheme);
        location.push_str("://");
        location.push_str(authority.as_str());
    }
    location.push_str(&encode_path(path));
    if let Some(query) = uri.query() {
        location.push('?');
        location.push_str(query);
    }
    location
}
