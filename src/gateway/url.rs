//! Gemini URL to gateway path translation.
//!
//! # Rules (first match wins)
//! - `gemini://host[:port]/path?query#frag` → `/gateway/host[:port]/path?query#frag`
//! - `scheme:...` for any other scheme → unchanged (external link)
//! - `//host/path` → `/gateway/host/path`
//! - `/path` → `/gateway/<current host>/path`
//! - `relative` → joined onto the current document's directory
//!
//! The base is the current document's gateway path without the `/gateway/`
//! prefix and without a query, e.g. `example.org/dir/page.gmi`.

use url::Url;

/// Path prefix under which gemini space is exposed.
pub const GATEWAY_PREFIX: &str = "/gateway/";

/// Translate a link or redirect target found in a document at `base`.
pub fn to_proxy_path(reference: &str, base: &str) -> String {
    if let Ok(url) = Url::parse(reference) {
        return if url.scheme() == "gemini" {
            gemini_url_path(&url)
        } else {
            reference.to_string()
        };
    }

    if let Some(rest) = reference.strip_prefix("//") {
        format!("{}{}", GATEWAY_PREFIX, rest)
    } else if reference.starts_with('/') {
        format!("{}{}{}", GATEWAY_PREFIX, host_of(base), reference)
    } else {
        format!("{}{}", GATEWAY_PREFIX, join_relative(base, reference))
    }
}

/// First path segment of a gateway path: the gemini host (and port).
pub fn host_of(path: &str) -> &str {
    path.split('/').next().unwrap_or_default()
}

fn gemini_url_path(url: &Url) -> String {
    let mut out = String::from(GATEWAY_PREFIX);
    out.push_str(url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        out.push(':');
        out.push_str(&port.to_string());
    }

    let path = url.path();
    if path.is_empty() {
        out.push('/');
    } else {
        out.push_str(path);
    }

    if let Some(query) = url.query() {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

/// Resolve `reference` against the directory holding `base`.
///
/// `.` and `..` segments are collapsed; `..` never climbs above the host.
fn join_relative(base: &str, reference: &str) -> String {
    let mut segments: Vec<&str> = base.split('/').collect();
    // Drop the document name (empty when base ends with '/').
    if segments.len() > 1 {
        segments.pop();
    }

    for segment in reference.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.len() > 1 {
                    segments.pop();
                }
            }
            other => segments.push(other),
        }
    }

    let mut joined = segments.join("/");
    let wants_dir = reference.ends_with('/')
        || reference.ends_with("/.")
        || reference.ends_with("/..")
        || reference == "."
        || reference == "..";
    if wants_dir && !joined.ends_with('/') {
        joined.push('/');
    }
    joined
}
