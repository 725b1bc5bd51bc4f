// Error types for the Wicket routing core

use crate::HttpStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A route path could not be compiled: bad placeholder syntax, an
    /// unknown constraint name, or malformed constraint arguments.
    /// Raised at cache/trie build time, before any request is served.
    #[error("Invalid route '{path}': {reason}")]
    RouteSyntax { path: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Handler error: {0}")]
    Handler(String),

    /// A fault raised while running a before/after/on-error hook,
    /// wrapping the underlying cause.
    #[error("Hook error: {0}")]
    Hook(#[source] Box<Error>),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Deserialization(_) => HttpStatus::BadRequest.code(),
            Error::Hook(inner) => inner.status_code(),
            _ => HttpStatus::InternalServerError.code(),
        }
    }

    /// Get the HttpStatus enum for this error
    pub fn http_status(&self) -> HttpStatus {
        HttpStatus::from_code(self.status_code()).unwrap_or(HttpStatus::InternalServerError)
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.http_status().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.http_status().is_server_error()
    }

    /// Unwrap wrapper errors to the innermost cause so callers see the
    /// real fault rather than the layers it bubbled through.
    pub fn flatten(self) -> Self {
        let mut current = self;
        while let Error::Hook(inner) = current {
            current = *inner;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::Deserialization("bad json".into()).status_code(), 400);
        assert_eq!(Error::Handler("boom".into()).status_code(), 500);
        assert_eq!(Error::Internal("boom".into()).status_code(), 500);
        let wrapped = Error::Hook(Box::new(Error::Deserialization("bad json".into())));
        assert_eq!(wrapped.status_code(), 400);
    }

    #[test]
    fn test_classification() {
        assert!(Error::Deserialization("bad json".into()).is_client_error());
        assert!(Error::Internal("boom".into()).is_server_error());
    }

    #[test]
    fn test_flatten_unwraps_hook_layers() {
        let err = Error::Hook(Box::new(Error::Hook(Box::new(Error::Handler(
            "boom".into(),
        )))));
        match err.flatten() {
            Error::Handler(msg) => assert_eq!(msg, "boom"),
            other => panic!("expected Handler, got {:?}", other),
        }
    }

    #[test]
    fn test_route_syntax_display() {
        let err = Error::RouteSyntax {
            path: "/foo/{bar:nope}".into(),
            reason: "unknown constraint 'nope'".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/foo/{bar:nope}"));
        assert!(msg.contains("unknown constraint"));
    }
}
