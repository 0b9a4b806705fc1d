use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serenity::async_trait;
use tracing::warn;

use crate::error::BookingError;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const EVENT_TIME_ZONE: &str = "UTC";
const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EventTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

impl EventTime {
    fn utc(at: DateTime<Utc>) -> Self {
        EventTime {
            // Wall-clock rendering; the zone travels in its own field.
            date_time: at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            time_zone: EVENT_TIME_ZONE.to_string(),
        }
    }
}

/// The provider's native event schema, as accepted by the events insert call.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
}

impl CalendarEvent {
    /// Fixed one-hour appointment slot starting at `start`.
    pub fn one_hour(summary: String, description: String, start: DateTime<Utc>) -> Self {
        CalendarEvent {
            summary,
            description,
            start: EventTime::utc(start),
            end: EventTime::utc(start + Duration::hours(1)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CalendarMetadata {
    pub id: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    id: String,
}

/// Narrow contract to the external calendar provider.
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// Read a calendar's metadata. Any failure, auth, not-found or network,
    /// means the id cannot be booked against.
    async fn get_metadata(&self, calendar_id: &str) -> Result<CalendarMetadata, BookingError>;

    /// Insert an event on the named calendar, returning the created event id.
    async fn create_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> Result<String, BookingError>;
}

pub struct GoogleCalendarClient {
    http: reqwest::Client,
    api_token: String,
}

impl GoogleCalendarClient {
    pub fn new(api_token: String) -> Result<Self, BookingError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| BookingError::GatewayUnavailable(e.to_string()))?;
        Ok(GoogleCalendarClient { http, api_token })
    }
}

#[async_trait]
impl CalendarGateway for GoogleCalendarClient {
    async fn get_metadata(&self, calendar_id: &str) -> Result<CalendarMetadata, BookingError> {
        let url = format!("{}/calendars/{}", CALENDAR_API_BASE, calendar_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| BookingError::GatewayUnavailable(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BookingError::GatewayUnavailable(e.to_string()))?;

        if !status.is_success() {
            warn!(%status, calendar_id, "calendar metadata lookup rejected");
            return Err(BookingError::InvalidCalendarId);
        }

        serde_json::from_str(&text).map_err(|e| {
            BookingError::GatewayUnavailable(format!("failed to parse calendar metadata: {}", e))
        })
    }

    async fn create_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> Result<String, BookingError> {
        let url = format!("{}/calendars/{}/events", CALENDAR_API_BASE, calendar_id);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(event)
            .send()
            .await
            .map_err(|e| BookingError::GatewayUnavailable(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BookingError::GatewayUnavailable(e.to_string()))?;

        if !status.is_success() {
            return Err(BookingError::GatewayUnavailable(format!(
                "event insert failed with status {}: {}",
                status, text
            )));
        }

        let created: CreatedEvent = serde_json::from_str(&text).map_err(|e| {
            BookingError::GatewayUnavailable(format!("failed to parse created event: {}", e))
        })?;
        Ok(created.id)
    }
}
