//! Path normalization.
//!
//! Group prefixes are normalized once at registration time: they must start
//! with `/`, duplicate slashes collapse, and a trailing slash is stripped
//! unless the prefix is the root. Request paths only get their duplicate
//! slashes collapsed; a trailing slash there is significant.

use std::borrow::Cow;

use crate::error::RouteError;

/// Normalize a raw group prefix. `"/"` and `"//"` become `"/"`,
/// `"/users/"` becomes `"/users"`.
pub(crate) fn normalize_prefix(raw: &str) -> Result<String, RouteError> {
    if !raw.starts_with('/') {
        return Err(RouteError::InvalidPrefix(raw.to_owned()));
    }
    Ok(strip_trailing(collapse(raw).into_owned()))
}

/// Compose a parent's normalized prefix with a child's normalized prefix.
pub(crate) fn join_prefix(parent: &str, child: &str) -> String {
    strip_trailing(collapse(&format!("{parent}{child}")).into_owned())
}

/// Full pattern of a route registered under `prefix`.
pub(crate) fn join_route(prefix: &str, path: &str) -> Result<String, RouteError> {
    if !path.starts_with('/') {
        return Err(RouteError::InvalidPath(path.to_owned()));
    }
    Ok(collapse(&format!("{prefix}{path}")).into_owned())
}

/// Clean an inbound request path. Borrows when nothing needs fixing,
/// which is the common case.
pub(crate) fn clean(path: &str) -> Cow<'_, str> {
    if path.is_empty() {
        return Cow::Borrowed("/");
    }
    collapse(path)
}

fn collapse(path: &str) -> Cow<'_, str> {
    if !path.contains("//") {
        return Cow::Borrowed(path);
    }
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' && prev_slash {
            continue;
        }
        prev_slash = c == '/';
        out.push(c);
    }
    Cow::Owned(out)
}

fn strip_trailing(mut path: String) -> String {
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    path
}
