//! Rendering of version notifications.

use modwatch_core::{ChangelogStyle, Guild, MessageStyle, ProjectMetadata, ReleaseType, Version};
use modwatch_error::{DeliveryError, DeliveryErrorKind, DeliveryResult};
use modwatch_interface::{EmbedField, RenderedMessage, RenderedMessageBuilder};

/// Embed colour of stable releases.
pub const RELEASE_COLOR: u32 = 0x1b_d9_6a;
/// Embed colour of beta releases.
pub const BETA_COLOR: u32 = 0xff_a3_47;
/// Embed colour of alpha releases.
pub const ALPHA_COLOR: u32 = 0xff_49_6e;
/// Colour of diagnostic notices.
const NOTICE_COLOR: u32 = 0x5d_6c_7e;

/// Longest embed description the platform accepts.
pub const DESCRIPTION_LIMIT: usize = 4096;
/// Longest embed field value the platform accepts.
pub const FIELD_LIMIT: usize = 1024;
const TITLE_LIMIT: usize = 256;
const TRUNCATED_LINES: usize = 10;
const TRUNCATED_CHARS: usize = 500;

fn color_for(release_type: ReleaseType) -> u32 {
    match release_type {
        ReleaseType::Release => RELEASE_COLOR,
        ReleaseType::Beta => BETA_COLOR,
        ReleaseType::Alpha => ALPHA_COLOR,
    }
}

fn label_for(release_type: ReleaseType) -> &'static str {
    match release_type {
        ReleaseType::Release => "Release",
        ReleaseType::Beta => "Beta",
        ReleaseType::Alpha => "Alpha",
    }
}

/// Cut `text` to at most `limit` characters, marking the cut with an ellipsis.
fn clip(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(limit.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

/// Shorten a changelog according to the guild's changelog style.
///
/// Returns `None` when nothing should be shown.
pub fn truncate_changelog(changelog: &str, style: ChangelogStyle) -> Option<String> {
    let changelog = changelog.trim();
    if changelog.is_empty() {
        return None;
    }
    match style {
        ChangelogStyle::Hidden => None,
        ChangelogStyle::Full => Some(clip(changelog, DESCRIPTION_LIMIT)),
        ChangelogStyle::Truncated => {
            let lines: Vec<&str> = changelog.lines().take(TRUNCATED_LINES).collect();
            let mut short = lines.join("\n");
            let cut_lines = changelog.lines().count() > TRUNCATED_LINES;
            if cut_lines {
                short.push_str("\n…");
            }
            Some(clip(&short, TRUNCATED_CHARS))
        }
    }
}

fn joined_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        clip(&items.join(", "), FIELD_LIMIT)
    }
}

fn build(builder: &RenderedMessageBuilder) -> DeliveryResult<RenderedMessage> {
    builder
        .build()
        .map_err(|e| DeliveryError::new(DeliveryErrorKind::Render(e.to_string())))
}

/// Render the notification for one new version.
///
/// Compact guilds get the headline, link and release type only; normal guilds
/// also see loaders, game versions, the primary file and the changelog.
pub fn render_version(
    project: &ProjectMetadata,
    version: &Version,
    guild: &Guild,
) -> DeliveryResult<RenderedMessage> {
    let mut fields = vec![EmbedField {
        name: "Type".to_string(),
        value: label_for(version.version_type).to_string(),
        inline: true,
    }];

    let mut builder = RenderedMessageBuilder::default();
    builder
        .title(clip(
            &format!("{} {}", project.title, version.version_number),
            TITLE_LIMIT,
        ))
        .url(project.version_url(&version.id))
        .color(color_for(version.version_type))
        .footer(format!("{} · {}", project.title, version.name))
        .timestamp(version.date_published);

    if let Some(icon) = &project.icon_url {
        builder.thumbnail_url(icon.clone());
    }

    if guild.message_style == MessageStyle::Normal {
        fields.push(EmbedField {
            name: "Loaders".to_string(),
            value: joined_or_dash(&version.loaders),
            inline: true,
        });
        fields.push(EmbedField {
            name: "Game versions".to_string(),
            value: joined_or_dash(&version.game_versions),
            inline: true,
        });
        if let Some(file) = version.primary_file() {
            fields.push(EmbedField {
                name: "File".to_string(),
                value: clip(&format!("[{}]({})", file.filename, file.url), FIELD_LIMIT),
                inline: false,
            });
        }
        if let Some(changelog) = version
            .changelog
            .as_deref()
            .and_then(|c| truncate_changelog(c, guild.changelog_style))
        {
            builder.description(changelog);
        }
    }

    builder.fields(fields);
    build(&builder)
}

/// Render the notice sent when a project's cursor no longer matches any
/// version the catalog reports.
///
/// Tells subscribers the tracker skipped ahead to `newest` and that versions
/// published in between may not have been announced.
pub fn render_resync_notice(
    project: &ProjectMetadata,
    newest: &Version,
) -> DeliveryResult<RenderedMessage> {
    let mut builder = RenderedMessageBuilder::default();
    builder
        .title(clip(&format!("{}: tracking resynchronised", project.title), TITLE_LIMIT))
        .url(project.page_url())
        .color(NOTICE_COLOR)
        .description(format!(
            "The last version announced for **{}** is no longer listed by the catalog. \
             Tracking now continues from **{}**; versions published in between may not \
             have been announced.",
            project.title, newest.version_number
        ))
        .timestamp(newest.date_published);
    build(&builder)
}
