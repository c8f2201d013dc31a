//! Guild presentation settings.

use crate::{GuildId, RoleId};
use serde::{Deserialize, Serialize};

/// How much detail a notification carries.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageStyle {
    /// Title, link and release type only.
    Compact,
    /// Full embed with changelog and files.
    #[default]
    Normal,
}

/// How changelogs are rendered.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChangelogStyle {
    /// Whole changelog, up to the platform limit.
    Full,
    /// First few lines only.
    #[default]
    Truncated,
    /// No changelog.
    Hidden,
}

/// A subscriber organization and its render-time settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct Guild {
    /// Guild id
    #[setters(skip)]
    pub id: GuildId,
    /// Notification verbosity
    pub message_style: MessageStyle,
    /// Changelog rendering
    pub changelog_style: ChangelogStyle,
    /// Role mentioned when an entry names none
    pub ping_role_id: Option<RoleId>,
}

impl Guild {
    /// A guild with default presentation settings.
    pub fn new(id: GuildId) -> Self {
        Self {
            id,
            message_style: MessageStyle::default(),
            changelog_style: ChangelogStyle::default(),
            ping_role_id: None,
        }
    }
}
