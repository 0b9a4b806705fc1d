use serde::{Deserialize, Serialize};

/// Durable record of a user's chosen target calendar.
///
/// `is_admin` is reserved for future access tiering; nothing in the booking
/// flow reads it today.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserRecord {
    pub user_id: String,
    pub target_calendar_id: String,
    #[serde(default)]
    pub is_admin: bool,
}
