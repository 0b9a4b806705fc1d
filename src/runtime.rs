use std::sync::Arc;

use serenity::model::gateway::GatewayIntents;
use tracing::error;

use crate::clients::google_calendar::CalendarGateway;
use crate::handlers::discord::BotHandler;
use crate::session::SessionStore;
use crate::storage::UserDirectory;

pub async fn run_api(
    gateway: Arc<dyn CalendarGateway>,
    directory: Arc<dyn UserDirectory>,
    discord_client_secret: String,
) {
    let sessions = Arc::new(SessionStore::new());

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;
    let mut client = serenity::Client::builder(discord_client_secret, intents)
        .event_handler(BotHandler::new(gateway, directory, sessions))
        .await
        .expect("Error creating Serenity client");

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }
}
