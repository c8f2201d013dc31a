//! Platform-neutral rendered notification.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// One name/value pair shown beside the message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field label
    pub name: String,
    /// Field content
    pub value: String,
    /// Whether the field may share a row with its neighbours
    pub inline: bool,
}

/// A notification ready to hand to a [`Messenger`](crate::Messenger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct RenderedMessage {
    /// Headline
    title: String,
    /// Link behind the headline
    #[builder(default)]
    url: Option<String>,
    /// Body text (markdown)
    #[builder(default)]
    description: Option<String>,
    /// Accent colour as 0xRRGGBB
    #[builder(default)]
    color: u32,
    /// Extra fields
    #[builder(default)]
    fields: Vec<EmbedField>,
    /// Small image shown beside the title
    #[builder(default)]
    thumbnail_url: Option<String>,
    /// Footer line
    #[builder(default)]
    footer: Option<String>,
    /// Timestamp shown with the footer
    #[builder(default)]
    timestamp: Option<DateTime<Utc>>,
}
