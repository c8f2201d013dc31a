//! Top-level error wrapper types.

use crate::{CatalogError, ConfigError, DeliveryError, StoreError};

/// Every error a modwatch operation can produce.
///
/// # Examples
///
/// ```
/// use modwatch_error::{ModwatchError, ConfigError};
///
/// let err: ModwatchError = ConfigError::new("bad interval").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ModwatchErrorKind {
    /// Catalog API error
    #[from(CatalogError)]
    Catalog(CatalogError),
    /// Persistence store error
    #[from(StoreError)]
    Store(StoreError),
    /// Notification delivery error
    #[from(DeliveryError)]
    Delivery(DeliveryError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Modwatch error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Modwatch Error: {}", _0)]
pub struct ModwatchError(Box<ModwatchErrorKind>);

impl ModwatchError {
    /// Create a new error from a kind.
    pub fn new(kind: ModwatchErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ModwatchErrorKind {
        &self.0
    }
}

impl<T> From<T> for ModwatchError
where
    T: Into<ModwatchErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for modwatch operations.
pub type ModwatchResult<T> = std::result::Result<T, ModwatchError>;
