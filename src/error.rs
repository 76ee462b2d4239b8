//! Error types.
//!
//! Two families, kept apart on purpose:
//!
//! - [`RouteError`]: a programming mistake caught while the routing table
//!   is being built (bad prefix, ambiguous pattern, duplicate route). The
//!   plain registration methods panic with it; the `try_*` variants return it.
//! - [`Error`]: infrastructure failures at serve time: binding a port,
//!   accepting a connection.
//!
//! Not-found and method-not-allowed are *not* errors. They are ordinary
//! [`Lookup`](crate::Lookup) outcomes.

use http::Method;

/// A misconfigured route, group, or reverse-lookup request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("prefix `{0}` must start with `/`")]
    InvalidPrefix(String),

    #[error("path `{0}` must start with `/`")]
    InvalidPath(String),

    #[error("empty parameter name in `{0}`")]
    EmptyParamName(String),

    #[error("parameter in `{0}` must start a path segment")]
    MisplacedParam(String),

    #[error("wildcard in `{0}` must be the final segment")]
    WildcardNotLast(String),

    #[error("`{pattern}` binds `{new}` where an existing route binds `{existing}`")]
    ConflictingParam {
        pattern: String,
        existing: String,
        new: String,
    },

    #[error("route {method} {pattern} is already registered")]
    Duplicate { method: Method, pattern: String },

    #[error("route name `{name}` is already used by `{existing}`")]
    DuplicateName { name: String, existing: String },

    #[error("no route named `{0}`")]
    UnknownRoute(String),

    #[error("missing value for `{param}` in route `{route}`")]
    MissingParam { route: String, param: String },
}

/// The error type returned by the server.
///
/// Application-level errors (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let e = RouteError::Duplicate { method: Method::GET, pattern: "/ping".into() };
        assert_eq!(e.to_string(), "route GET /ping is already registered");

        let e = RouteError::ConflictingParam {
            pattern: "/users/:name".into(),
            existing: "id".into(),
            new: "name".into(),
        };
        assert!(e.to_string().contains("`id`"));
    }

    #[test]
    fn io_errors_convert() {
        let e: Error = std::io::Error::other("boom").into();
        assert_eq!(e.to_string(), "io: boom");
    }
}
