//! Notification delivery error types.

/// Reasons a single notification could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DeliveryErrorKind {
    /// The subscription has no destination channel configured.
    #[display("No destination channel configured")]
    MissingDestination,
    /// The bot is not allowed to post in the channel.
    #[display("Permission denied in channel {}", _0)]
    PermissionDenied(u64),
    /// The channel no longer exists or is not visible.
    #[display("Unknown channel {}", _0)]
    UnknownChannel(u64),
    /// The messaging service refused the message.
    #[display("Message rejected: {}", _0)]
    Rejected(String),
    /// The request never reached the messaging service.
    #[display("Transport error: {}", _0)]
    Transport(String),
    /// The notification could not be assembled.
    #[display("Failed to render notification: {}", _0)]
    Render(String),
}

/// Delivery error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Delivery Error: {} at line {} in {}", kind, line, file)]
pub struct DeliveryError {
    /// The kind of error that occurred
    pub kind: DeliveryErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl DeliveryError {
    /// Create a new DeliveryError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DeliveryErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Result type for delivery operations.
pub type DeliveryResult<T> = Result<T, DeliveryError>;
