use chrono::Utc;
use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::Arc;
use tracing::{error, info};

use crate::clients::google_calendar::CalendarGateway;
use crate::service::booking_flow;
use crate::session::SessionStore;
use crate::storage::UserDirectory;

const START_COMMAND: &str = "/start";
const MY_CALENDAR_ID_COMMAND: &str = "/my_calendar_id";

pub struct BotHandler {
    gateway: Arc<dyn CalendarGateway>,
    directory: Arc<dyn UserDirectory>,
    sessions: Arc<SessionStore>,
}

impl BotHandler {
    pub fn new(
        gateway: Arc<dyn CalendarGateway>,
        directory: Arc<dyn UserDirectory>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        BotHandler {
            gateway,
            directory,
            sessions,
        }
    }

    /// Route one inbound message to the booking flow. Serialization is per
    /// user: the flow locks only the sender's session slot, so different
    /// users' messages are processed fully in parallel.
    pub async fn handle_message_internal(&self, user_id: &str, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        if text == START_COMMAND {
            return booking_flow::start_onboarding(self.sessions.as_ref(), user_id).await;
        }

        if text == MY_CALENDAR_ID_COMMAND {
            return match booking_flow::my_calendar_id(self.directory.as_ref(), user_id).await {
                Ok(reply) => vec![reply],
                Err(err) => {
                    error!(user_id, error = %err, "my_calendar_id lookup failed");
                    vec![booking_flow::UNEXPECTED_ERROR_REPLY.to_string()]
                }
            };
        }

        match booking_flow::handle_turn(
            self.gateway.as_ref(),
            self.directory.as_ref(),
            self.sessions.as_ref(),
            user_id,
            text,
            Utc::now(),
        )
        .await
        {
            Ok(Some(reply)) => vec![reply],
            Ok(None) => Vec::new(),
            Err(err) => {
                error!(user_id, error = %err, "unexpected error handling turn");
                vec![booking_flow::UNEXPECTED_ERROR_REPLY.to_string()]
            }
        }
    }
}

#[async_trait]
impl EventHandler for BotHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let user_id = msg.author.id.to_string();
        for reply in self.handle_message_internal(&user_id, &msg.content).await {
            if let Err(err) = msg.channel_id.say(&ctx.http, reply).await {
                error!(user_id, error = ?err, "failed to send reply");
            }
        }
    }
}
