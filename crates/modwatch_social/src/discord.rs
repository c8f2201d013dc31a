//! Discord delivery over the serenity HTTP client.

use async_trait::async_trait;
use modwatch_core::{ChannelId, RoleId};
use modwatch_error::{DeliveryError, DeliveryErrorKind, DeliveryResult};
use modwatch_interface::{Messenger, RenderedMessage};
use serenity::builder::{CreateAllowedMentions, CreateEmbed, CreateEmbedFooter, CreateMessage};
use serenity::http::{Http, HttpError};
use serenity::model::Timestamp;
use serenity::model::id::{ChannelId as SerenityChannelId, RoleId as SerenityRoleId};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Delivers notifications as Discord messages with one embed.
///
/// Only the HTTP API is used; no gateway connection is opened.
#[derive(Clone)]
pub struct DiscordMessenger {
    http: Arc<Http>,
}

impl DiscordMessenger {
    /// Create a messenger authenticated with a bot token.
    pub fn new(token: &str) -> Self {
        Self {
            http: Arc::new(Http::new(token)),
        }
    }

    /// Create a messenger sharing an existing HTTP client.
    pub fn from_http(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn embed(message: &RenderedMessage) -> CreateEmbed {
        let mut embed = CreateEmbed::new()
            .title(message.title())
            .color(*message.color());
        if let Some(url) = message.url() {
            embed = embed.url(url);
        }
        if let Some(description) = message.description() {
            embed = embed.description(description);
        }
        for field in message.fields() {
            embed = embed.field(&field.name, &field.value, field.inline);
        }
        if let Some(thumbnail) = message.thumbnail_url() {
            embed = embed.thumbnail(thumbnail);
        }
        if let Some(footer) = message.footer() {
            embed = embed.footer(CreateEmbedFooter::new(footer));
        }
        if let Some(timestamp) = message
            .timestamp()
            .as_ref()
            .and_then(|ts| Timestamp::from_unix_timestamp(ts.timestamp()).ok())
        {
            embed = embed.timestamp(timestamp);
        }
        embed
    }

    fn message(message: &RenderedMessage, mention: Option<RoleId>) -> CreateMessage {
        let builder = CreateMessage::new().embed(Self::embed(message));
        match mention.filter(|role| role.0 != 0) {
            Some(role) => builder
                .content(format!("<@&{}>", role.0))
                .allowed_mentions(
                    CreateAllowedMentions::new().roles(vec![SerenityRoleId::new(role.0)]),
                ),
            None => builder.allowed_mentions(CreateAllowedMentions::new()),
        }
    }
}

impl std::fmt::Debug for DiscordMessenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordMessenger").finish_non_exhaustive()
    }
}

/// Map a serenity failure onto the delivery error taxonomy.
fn classify(channel: ChannelId, err: serenity::Error) -> DeliveryError {
    let kind = match &err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            match response.status_code.as_u16() {
                403 => DeliveryErrorKind::PermissionDenied(channel.0),
                404 => DeliveryErrorKind::UnknownChannel(channel.0),
                _ => DeliveryErrorKind::Rejected(response.error.message.clone()),
            }
        }
        serenity::Error::Http(_) => DeliveryErrorKind::Transport(err.to_string()),
        _ => DeliveryErrorKind::Rejected(err.to_string()),
    };
    DeliveryError::new(kind)
}

#[async_trait]
impl Messenger for DiscordMessenger {
    #[instrument(skip(self, message), fields(channel_id = %channel, title = %message.title()))]
    async fn send_notification(
        &self,
        channel: ChannelId,
        message: &RenderedMessage,
        mention: Option<RoleId>,
    ) -> DeliveryResult<()> {
        if channel.0 == 0 {
            return Err(DeliveryError::new(DeliveryErrorKind::UnknownChannel(channel.0)));
        }

        let target = SerenityChannelId::new(channel.0);
        match target
            .send_message(&self.http, Self::message(message, mention))
            .await
        {
            Ok(sent) => {
                debug!(message_id = %sent.id, "Notification sent");
                Ok(())
            }
            Err(e) => {
                let err = classify(channel, e);
                warn!(error = %err.kind, "Discord rejected notification");
                Err(err)
            }
        }
    }

    fn platform_name(&self) -> &str {
        "discord"
    }
}
