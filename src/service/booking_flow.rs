use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::clients::google_calendar::{CalendarEvent, CalendarGateway};
use crate::error::BookingError;
use crate::session::{ConversationSession, SessionStore, Stage};
use crate::storage::UserDirectory;
use crate::validation;

pub const NO_CALENDAR_ID_REPLY: &str =
    "You have not set a calendar ID yet. Use /start to set one.";
pub const UNEXPECTED_ERROR_REPLY: &str = "An unexpected error occurred. Please try again.";

/// (Re)begin onboarding: whatever the user was doing, they are back at the
/// calendar-id prompt with empty scratch.
pub async fn start_onboarding(sessions: &SessionStore, user_id: &str) -> Vec<String> {
    sessions
        .put(user_id, ConversationSession::awaiting_calendar_id())
        .await;
    vec![
        "Welcome to Calendar Call Bot! Hope you can get an appointment!".to_string(),
        "Please provide the Google Calendar ID of the person you want to schedule appointments with."
            .to_string(),
    ]
}

pub async fn my_calendar_id(
    directory: &dyn UserDirectory,
    user_id: &str,
) -> Result<String, BookingError> {
    match directory.find_by_user_id(user_id).await? {
        Some(user) => Ok(format!(
            "Your stored calendar ID is: {}",
            user.target_calendar_id
        )),
        None => Ok(NO_CALENDAR_ID_REPLY.to_string()),
    }
}

/// One conversation turn: the user's message against their current stage.
///
/// Validation failures never advance or regress the stage; the user retries
/// in place without losing already-validated steps. `Ok(None)` means the
/// message required no reply (the `Idle` rest state). An `Err` is an
/// unexpected internal failure, to be reported generically by the caller;
/// on that path the session is left exactly as it was before the turn.
///
/// The user's session slot stays locked for the whole turn, gateway waits
/// included, so turns for one user never overlap. Other users' turns only
/// touch their own slots and proceed in parallel.
pub async fn handle_turn(
    gateway: &dyn CalendarGateway,
    directory: &dyn UserDirectory,
    sessions: &SessionStore,
    user_id: &str,
    text: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>, BookingError> {
    let slot = sessions.slot(user_id).await;
    let mut stored = slot.lock().await;
    // Work on a copy; write back only once the turn's side effects landed,
    // so an Err return leaves the pre-turn state for a safe retry.
    let mut session = stored.clone();
    match session.stage {
        Stage::Idle => Ok(None),

        Stage::AwaitingCalendarId => match gateway.get_metadata(text).await {
            Ok(_) => {
                info!(user_id, calendar_id = text, "calendar id validated");
                directory.upsert(user_id, text).await?;
                session.stage = Stage::AwaitingDate;
                *stored = session;
                Ok(Some(format!(
                    "Calendar ID \"{}\" saved. Please provide the desired date for the appointment (e.g., YYYY-MM-DD).",
                    text
                )))
            }
            Err(BookingError::InvalidCalendarId) | Err(BookingError::GatewayUnavailable(_)) => {
                info!(user_id, calendar_id = text, "calendar id rejected");
                Ok(Some(
                    "This calendar ID is not valid. Please provide a valid one, like \"elonmusk@gmail.com\".".to_string(),
                ))
            }
            Err(other) => Err(other),
        },

        Stage::AwaitingDate => match validation::validate_date(text, now.date_naive()) {
            Ok(_) => {
                session.scratch.desired_date_text = Some(text.to_string());
                session.stage = Stage::AwaitingTime;
                *stored = session;
                Ok(Some(
                    "Please provide the desired time for the appointment (e.g., HH:MM in 24-hour format)."
                        .to_string(),
                ))
            }
            Err(BookingError::PastDate) => Ok(Some(
                "We're not time travelers here! Please give me a date that's today or in the future."
                    .to_string(),
            )),
            Err(_) => Ok(Some("Invalid date format. Please use YYYY-MM-DD.".to_string())),
        },

        Stage::AwaitingTime => {
            let date = session
                .scratch
                .desired_date_text
                .as_deref()
                .map(validation::parse_date)
                .transpose()?
                .ok_or_else(|| BookingError::Storage("missing stored date".to_string()))?;

            match validation::validate_time(text, date, now) {
                Ok(combined) => {
                    session.scratch.appointment_date_time = Some(combined);
                    session.scratch.desired_date_text = None;
                    session.stage = Stage::AwaitingName;
                    *stored = session;
                    Ok(Some(
                        "Please provide your name so the princess knows who is requesting the appointment."
                            .to_string(),
                    ))
                }
                Err(BookingError::InsufficientLeadTime) => Ok(Some(
                    "The princess requires a minimum of 5 hours to prepare for your audience. 5 hours, minimum, before any appointments can be scheduled"
                        .to_string(),
                )),
                Err(_) => Ok(Some(
                    "Invalid time format. Please use HH:MM in 24-hour format.".to_string(),
                )),
            }
        }

        Stage::AwaitingName => {
            let date_time = session
                .scratch
                .appointment_date_time
                .ok_or_else(|| BookingError::Storage("missing stored date/time".to_string()))?;

            let user = match directory
                .find_by_user_id(user_id)
                .await?
                .ok_or(BookingError::NoCalendarIdConfigured)
            {
                Ok(user) => user,
                Err(_) => {
                    *stored = ConversationSession::default();
                    return Ok(Some(NO_CALENDAR_ID_REPLY.to_string()));
                }
            };

            // Name is free text and is embedded verbatim, unescaped. That
            // looseness is documented behavior, not an accident.
            let event = CalendarEvent::one_hour(
                format!("Appointment with {}", text),
                format!("Scheduled via Discord bot by {}", text),
                date_time,
            );

            let reply = match gateway.create_event(&user.target_calendar_id, &event).await {
                Ok(event_id) => {
                    info!(
                        user_id,
                        event_id = %event_id,
                        calendar_id = %user.target_calendar_id,
                        "calendar event created"
                    );
                    if let Err(err) = directory
                        .record_appointment(user_id, &user.target_calendar_id, date_time)
                        .await
                    {
                        error!(user_id, error = %err, "failed to record appointment audit row");
                    }
                    format!(
                        "Appointment for \"{}\" with name \"{}\" created!",
                        date_time.format("%Y-%m-%d %H:%M"),
                        text
                    )
                }
                Err(err) => {
                    error!(user_id, error = %err, "failed to create calendar event");
                    "An error occurred while creating the event. Please try again.".to_string()
                }
            };

            // The name step is terminal either way.
            *stored = ConversationSession::default();
            Ok(Some(reply))
        }
    }
}
