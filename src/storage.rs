use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serenity::async_trait;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::BookingError;
use crate::models::appointment::{AppointmentRecord, AppointmentStatus};
use crate::models::user::UserRecord;

pub type DB<T> = HashMap<String, T>;

const USERS_DB: &str = "users.json";
const APPOINTMENTS_DB: &str = "appointments.json";

// Returns the directory where DB files live.
// Defaults to a relative "./data" directory.
pub fn get_db_location() -> String {
    env::var("DB_LOCATION").unwrap_or("./data".to_string())
}

pub fn load_db<T: DeserializeOwned>(dir: &str, name: &str) -> Result<DB<T>, BookingError> {
    let path = Path::new(dir).join(name);
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content = fs::read_to_string(&path).map_err(|e| BookingError::Storage(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| BookingError::Storage(e.to_string()))
}

pub fn save_db<T: Serialize>(dir: &str, name: &str, db: &DB<T>) -> Result<(), BookingError> {
    fs::create_dir_all(dir).map_err(|e| BookingError::Storage(e.to_string()))?;
    let content =
        serde_json::to_string_pretty(db).map_err(|e| BookingError::Storage(e.to_string()))?;
    fs::write(Path::new(dir).join(name), content).map_err(|e| BookingError::Storage(e.to_string()))
}

/// Durable mapping from user id to that user's chosen target calendar,
/// plus the appointment audit trail.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<UserRecord>, BookingError>;

    /// Create or overwrite the user's `target_calendar_id`. `is_admin`
    /// defaults to false on creation and is untouched on update.
    async fn upsert(
        &self,
        user_id: &str,
        target_calendar_id: &str,
    ) -> Result<UserRecord, BookingError>;

    async fn record_appointment(
        &self,
        user_id: &str,
        target_calendar_id: &str,
        date_time: DateTime<Utc>,
    ) -> Result<AppointmentRecord, BookingError>;
}

/// File-backed directory: both tables are JSON maps loaded at startup and
/// rewritten after every mutation.
pub struct JsonUserDirectory {
    dir: String,
    users: Mutex<DB<UserRecord>>,
    appointments: Mutex<DB<AppointmentRecord>>,
}

impl JsonUserDirectory {
    pub fn load(dir: &str) -> Result<Self, BookingError> {
        Ok(JsonUserDirectory {
            dir: dir.to_string(),
            users: Mutex::new(load_db(dir, USERS_DB)?),
            appointments: Mutex::new(load_db(dir, APPOINTMENTS_DB)?),
        })
    }
}

#[async_trait]
impl UserDirectory for JsonUserDirectory {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<UserRecord>, BookingError> {
        let users = self.users.lock().await;
        Ok(users.get(user_id).cloned())
    }

    async fn upsert(
        &self,
        user_id: &str,
        target_calendar_id: &str,
    ) -> Result<UserRecord, BookingError> {
        let mut users = self.users.lock().await;
        let record = users
            .entry(user_id.to_string())
            .and_modify(|user| user.target_calendar_id = target_calendar_id.to_string())
            .or_insert_with(|| UserRecord {
                user_id: user_id.to_string(),
                target_calendar_id: target_calendar_id.to_string(),
                is_admin: false,
            })
            .clone();
        save_db(&self.dir, USERS_DB, &users)?;
        Ok(record)
    }

    async fn record_appointment(
        &self,
        user_id: &str,
        target_calendar_id: &str,
        date_time: DateTime<Utc>,
    ) -> Result<AppointmentRecord, BookingError> {
        let id = Uuid::new_v4().to_string();
        let record = AppointmentRecord {
            id: id.clone(),
            user_id: user_id.to_string(),
            target_calendar_id: target_calendar_id.to_string(),
            date_time,
            status: AppointmentStatus::Pending,
        };
        let mut appointments = self.appointments.lock().await;
        appointments.insert(id, record.clone());
        save_db(&self.dir, APPOINTMENTS_DB, &appointments)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn temp_dir(test_name: &str) -> String {
        let dir = env::temp_dir().join(format!("appointmentBot_{}_{}", test_name, Uuid::new_v4()));
        dir.to_string_lossy().to_string()
    }

    #[tokio::test]
    async fn upsert_creates_then_overwrites_calendar_id() {
        let dir = temp_dir("upsert");
        let directory = JsonUserDirectory::load(&dir).unwrap();

        let created = directory.upsert("42", "alice@example.com").await.unwrap();
        assert_eq!(created.target_calendar_id, "alice@example.com");
        assert!(!created.is_admin);

        let updated = directory.upsert("42", "bob@example.com").await.unwrap();
        assert_eq!(updated.target_calendar_id, "bob@example.com");

        let found = directory.find_by_user_id("42").await.unwrap().unwrap();
        assert_eq!(found.target_calendar_id, "bob@example.com");
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn upsert_survives_reload() {
        let dir = temp_dir("reload");
        {
            let directory = JsonUserDirectory::load(&dir).unwrap();
            directory.upsert("7", "carol@example.com").await.unwrap();
        }
        let reloaded = JsonUserDirectory::load(&dir).unwrap();
        let found = reloaded.find_by_user_id("7").await.unwrap().unwrap();
        assert_eq!(found.target_calendar_id, "carol@example.com");
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn appointments_default_to_pending() {
        let dir = temp_dir("appointments");
        let directory = JsonUserDirectory::load(&dir).unwrap();
        let when = Utc.with_ymd_and_hms(2025, 6, 10, 23, 0, 0).unwrap();

        let record = directory
            .record_appointment("42", "alice@example.com", when)
            .await
            .unwrap();
        assert_eq!(record.status, AppointmentStatus::Pending);
        assert_eq!(record.date_time, when);
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_user_reads_as_absent() {
        let dir = temp_dir("absent");
        let directory = JsonUserDirectory::load(&dir).unwrap();
        assert!(directory.find_by_user_id("nobody").await.unwrap().is_none());
        let _ = fs::remove_dir_all(&dir);
    }
}
