use thiserror::Error;

/// Everything that can go wrong during a booking conversation turn.
///
/// All of these are caught at the state-machine or dispatch boundary and
/// turned into a user-facing reply; none of them crash the conversation.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("input does not match the expected format")]
    InvalidFormat,
    #[error("requested date is in the past")]
    PastDate,
    #[error("requested time is inside the minimum lead time window")]
    InsufficientLeadTime,
    #[error("calendar id was rejected by the calendar provider")]
    InvalidCalendarId,
    #[error("calendar provider unreachable: {0}")]
    GatewayUnavailable(String),
    #[error("no calendar id configured for this user")]
    NoCalendarIdConfigured,
    #[error("storage error: {0}")]
    Storage(String),
}
