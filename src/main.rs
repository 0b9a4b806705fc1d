#![allow(non_snake_case)]

use std::env;
use std::sync::Arc;

use appointmentBot::clients::google_calendar::GoogleCalendarClient;
use appointmentBot::config::AppConfig;
use appointmentBot::runtime;
use appointmentBot::storage::{JsonUserDirectory, get_db_location};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match env::var("CONFIG_FILE") {
        Ok(path) => AppConfig::from_file(&path).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    };

    let get_prop = |key: &str| -> Option<String> {
        config.get(key).or_else(|| env::var(key).ok())
    };

    let discord_client_secret = get_prop("DISCORD_CLIENT_SECRET")
        .expect("DISCORD_CLIENT_SECRET must be set");
    let google_api_token = get_prop("GOOGLE_API_TOKEN")
        .expect("GOOGLE_API_TOKEN must be set");

    let directory = JsonUserDirectory::load(&get_db_location())
        .expect("Unable to load user database.");
    let gateway = GoogleCalendarClient::new(google_api_token)
        .expect("Unable to build calendar client.");

    runtime::run_api(Arc::new(gateway), Arc::new(directory), discord_client_secret).await;
}
