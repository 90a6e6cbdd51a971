//! Unified error type for yuzu.
//!
//! Every failure mode of provider loading and execution funnels into
//! [`Error`], which carries enough detail (failing URL, status, raw body) to
//! diagnose a failed invocation without retrying it. API handlers derive an
//! HTTP status code via [`Error::http_status`].

use std::fmt;

/// Unified error type covering all failure modes in yuzu.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "provider").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A provider definition could not be parsed or failed validation.
    #[error("Invalid provider definition <{path}>: {message}")]
    Definition {
        /// File path (or other origin) of the definition.
        path: String,
        /// Human-readable error description.
        message: String,
    },

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A resolved endpoint URL could not be parsed.
    #[error("Parsing url <{url}>: {message}")]
    Url {
        /// The URL text after substitution.
        url: String,
        /// Parser error description.
        message: String,
    },

    /// The HTTP request could not be completed.
    #[error("Fetching <{url}>: {source}")]
    Transport {
        /// The requested URL.
        url: String,
        /// The underlying client error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A substituted request header could not be built.
    #[error("Building header {name} for <{url}>: {message}")]
    Header {
        /// The URL the request was addressed to.
        url: String,
        /// Header name as declared.
        name: String,
        /// Why the name or value was rejected.
        message: String,
    },

    /// The upstream answered with a non-2xx status.
    #[error("Bad status <{status}> from <{url}>: {body}")]
    Status {
        /// The requested URL.
        url: String,
        /// HTTP status code returned by the upstream.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("Unmarshalling response from <{url}>: {message}\n{body}")]
    Decode {
        /// The requested URL.
        url: String,
        /// Decoder error description.
        message: String,
        /// Raw response body.
        body: String,
    },

    /// A query-path expression failed to evaluate or matched nothing.
    #[error("Retrieving query-path <{expr}>: {message}")]
    Extraction {
        /// The expression after substitution.
        expr: String,
        /// Human-readable error description.
        message: String,
    },

    /// A query-path matched a value that cannot be stored as a string.
    #[error("Retrieved value for <{key}> has unsupported type <{kind}>")]
    UnsupportedValue {
        /// The result key being populated.
        key: String,
        /// JSON kind of the matched value (e.g. "object").
        kind: String,
    },

    /// The provider requested an output type the renderer does not know.
    #[error("Output type {0} not supported")]
    UnsupportedOutput(String),

    /// An output field name cannot be used as an XML element name.
    #[error("Output field <{0}> is not a valid XML element name")]
    ElementName(String),

    /// A declared placeholder was left unbound in a rendered template.
    #[error("Unresolved placeholder {placeholder} in {context}")]
    UnresolvedPlaceholder {
        /// The placeholder token.
        placeholder: String,
        /// Where the template was used (e.g. "url", "header Authorization").
        context: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Definition { .. } => 400,
            Error::Validation(_) => 400,
            Error::Url { .. } => 400,
            Error::Header { .. } => 400,
            Error::UnresolvedPlaceholder { .. } => 400,
            Error::Transport { .. } => 502,
            Error::Status { .. } => 502,
            Error::Decode { .. } => 502,
            Error::Extraction { .. } => 422,
            Error::UnsupportedValue { .. } => 422,
            Error::UnsupportedOutput(_) => 500,
            Error::ElementName(_) => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Whether this error aborted a provider invocation (as opposed to a
    /// definition problem or a registry miss).
    pub fn is_execution(&self) -> bool {
        matches!(
            self,
            Error::Url { .. }
                | Error::Header { .. }
                | Error::Transport { .. }
                | Error::Status { .. }
                | Error::Decode { .. }
                | Error::Extraction { .. }
                | Error::UnsupportedValue { .. }
                | Error::UnsupportedOutput(_)
                | Error::ElementName(_)
                | Error::UnresolvedPlaceholder { .. }
        )
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Definition`].
    pub fn definition(path: impl fmt::Display, message: impl Into<String>) -> Self {
        Error::Definition {
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Transport`].
    pub fn transport(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Extraction`].
    pub fn extraction(expr: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Extraction {
            expr: expr.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = Error::not_found("provider", "kitsu");
        assert_eq!(err.to_string(), "provider not found: kitsu");
        assert_eq!(err.http_status(), 404);
        assert!(!err.is_execution());
    }

    #[test]
    fn header_error_is_an_execution_error() {
        let err = Error::Header {
            url: "https://example.test/chapters".into(),
            name: "X-Title".into(),
            message: "failed to parse header value".into(),
        };
        assert!(err.is_execution());
        assert_eq!(err.http_status(), 400);
        assert!(err.to_string().contains("https://example.test/chapters"));

        let err = Error::ElementName("has space".into());
        assert!(err.is_execution());
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn status_error_carries_body() {
        let err = Error::Status {
            url: "https://example.test/manga".into(),
            status: 404,
            body: "{\"errors\":[]}".into(),
        };
        let text = err.to_string();
        assert!(text.contains("404"));
        assert!(text.contains("https://example.test/manga"));
        assert!(text.contains("{\"errors\":[]}"));
        assert_eq!(err.http_status(), 502);
        assert!(err.is_execution());
    }

    #[test]
    fn decode_error_carries_raw_body() {
        let err = Error::Decode {
            url: "https://example.test".into(),
            message: "expected value".into(),
            body: "<html>".into(),
        };
        assert!(err.to_string().ends_with("<html>"));
    }

    #[test]
    fn definition_errors_are_not_execution_errors() {
        let err = Error::definition("providers/kitsu.json", "missing id");
        assert_eq!(
            err.to_string(),
            "Invalid provider definition <providers/kitsu.json>: missing id"
        );
        assert_eq!(err.http_status(), 400);
        assert!(!err.is_execution());
    }

    #[test]
    fn unsupported_output_is_execution_error() {
        let err = Error::UnsupportedOutput("csv".into());
        assert_eq!(err.to_string(), "Output type csv not supported");
        assert!(err.is_execution());
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.http_status(), 500);
    }
}
