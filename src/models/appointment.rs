use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Rejected,
}

/// Audit row written once a calendar event has been successfully requested.
/// Status stays `Pending`; no approval workflow transitions it yet.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppointmentRecord {
    pub id: String,
    pub user_id: String,
    pub target_calendar_id: String,
    pub date_time: DateTime<Utc>,
    pub status: AppointmentStatus,
}
