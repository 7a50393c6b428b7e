//! Error taxonomy for the meeting core (C2).
//!
//! Every fallible operation in this crate returns a [`CoreError`], a tagged
//! value carrying a [`Kind`], a human-readable message, and an optional
//! wrapped cause. The outermost tag wins when errors are chained: a
//! [`Kind::Conflict`] wrapping a [`Kind::Internal`] is still reported and
//! routed as a conflict by callers such as the subject dispatcher (C10) and,
//! outside this crate, an HTTP/gRPC transport layer.

use std::error::Error as StdError;
use std::fmt;

/// Discriminates the handling policy for a [`CoreError`] .
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Malformed input: bad payload, missing required field, invalid UUID.
    Validation,
    /// The referenced entity does not exist.
    NotFound,
    /// A revision precondition mismatch, or a uniqueness violation.
    Conflict,
    /// A dependency (store, broker, external lookup) is unreachable or timed out.
    Unavailable,
    /// A bug or otherwise unclassified failure.
    Internal,
}

impl Kind {
    /// HTTP status an outer transport layer should map this kind to.
    pub fn http_status(self) -> u16 {
        match self {
            Kind::Validation => 400,
            Kind::NotFound => 404,
            Kind::Conflict => 409,
            Kind::Unavailable => 503,
            Kind::Internal => 500,
        }
    }

    /// Bounded-cardinality label for metrics (never format a raw message into a label).
    pub fn label(self) -> &'static str {
        match self {
            Kind::Validation => "validation",
            Kind::NotFound => "not_found",
            Kind::Conflict => "conflict",
            Kind::Unavailable => "unavailable",
            Kind::Internal => "internal",
        }
    }
}

/// A tagged error value. Construct with [`CoreError::new`] or one of the
/// `Kind`-named helpers, and chain causes with [`CoreError::wrap`].
#[derive(Debug)]
pub struct CoreError {
    kind: Kind,
    message: String,
    cause: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl CoreError {
    pub fn new(kind: Kind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(Kind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Kind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(Kind::Conflict, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(Kind::Unavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Kind::Internal, message)
    }

    /// Wrap an underlying cause. The outer `kind` is preserved; the cause is
    /// still reachable via `source()`/`cause()` for logging.
    pub fn wrap(
        kind: Kind,
        message: impl Into<String>,
        cause: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn StdError + 'static))
    }

    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }

    pub fn error_type_label(&self) -> &'static str {
        self.kind.label()
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " (caused by: {cause})")?;
        }
        Ok(())
    }
}

impl StdError for CoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause()
    }
}

/// Returns [`Kind::Internal`] for any error that was not produced by this
/// crate's tagged taxonomy.
pub fn kind_of(err: &(dyn StdError + 'static)) -> Kind {
    if let Some(core_err) = err.downcast_ref::<CoreError>() {
        core_err.kind()
    } else {
        Kind::Internal
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn http_status_mapping_matches_spec_table() {
        assert_eq!(Kind::Validation.http_status(), 400);
        assert_eq!(Kind::NotFound.http_status(), 404);
        assert_eq!(Kind::Conflict.http_status(), 409);
        assert_eq!(Kind::Unavailable.http_status(), 503);
        assert_eq!(Kind::Internal.http_status(), 500);
    }

    #[test]
    fn outermost_kind_wins_when_wrapping() {
        let inner = io::Error::new(io::ErrorKind::Other, "disk full");
        let wrapped = CoreError::wrap(Kind::Unavailable, "store write failed", inner);
        assert_eq!(wrapped.kind(), Kind::Unavailable);
        assert!(wrapped.cause().is_some());
        assert!(wrapped.to_string().contains("disk full"));
    }

    #[test]
    fn kind_of_defaults_unwrapped_errors_to_internal() {
        let err = io::Error::new(io::ErrorKind::Other, "boom");
        assert_eq!(kind_of(&err), Kind::Internal);

        let tagged = CoreError::conflict("revision mismatch");
        assert_eq!(kind_of(&tagged), Kind::Conflict);
    }

    #[test]
    fn display_includes_cause_chain() {
        let inner = CoreError::internal("underlying bug");
        let outer = CoreError::wrap(Kind::Conflict, "update failed", inner);
        let rendered = outer.to_string();
        assert!(rendered.contains("Conflict"));
        assert!(rendered.contains("underlying bug"));
    }
}
