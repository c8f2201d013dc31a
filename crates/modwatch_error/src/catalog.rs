//! Catalog API error types.

/// Catalog error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum CatalogErrorKind {
    /// The requested entity does not exist upstream.
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// The request never produced a response.
    #[display("Transport error: {}", _0)]
    Transport(String),
    /// The catalog answered with a non-success status.
    #[display("Catalog returned {}: {}", status, message)]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },
    /// The catalog asked us to slow down.
    #[display("Rate limited by catalog")]
    RateLimited,
    /// The response body could not be decoded.
    #[display("Failed to decode catalog response: {}", _0)]
    Decode(String),
}

impl CatalogErrorKind {
    /// Whether repeating the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::RateLimited => true,
            Self::Status { status, .. } => *status >= 500,
            Self::NotFound(_) | Self::Decode(_) => false,
        }
    }
}

/// Catalog error with source location tracking.
///
/// # Examples
///
/// ```
/// use modwatch_error::{CatalogError, CatalogErrorKind};
///
/// let err = CatalogError::new(CatalogErrorKind::RateLimited);
/// assert!(err.is_transient());
/// assert!(format!("{}", err).contains("Rate limited"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Catalog Error: {} at line {} in {}", kind, line, file)]
pub struct CatalogError {
    /// The kind of error that occurred
    pub kind: CatalogErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CatalogError {
    /// Create a new CatalogError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CatalogErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether repeating the same request could succeed.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }

    /// Whether the error means the entity is gone upstream.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, CatalogErrorKind::NotFound(_))
    }
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
