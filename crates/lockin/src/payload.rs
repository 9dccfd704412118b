use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::level::LockinLevel;

pub const DEFAULT_TITLE: &str = "🎮 Locked In Meter - Apex Legends";
pub const DEFAULT_FOOTER: &str = "Apex Legends Tracker";

/// Fixed text around the embed; everything else is derived from the level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadStyle {
    pub title: String,
    pub footer: String,
}

impl Default for PayloadStyle {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            footer: DEFAULT_FOOTER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub content: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub timestamp: String,
    pub footer: EmbedFooter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

impl NotificationPayload {
    pub fn build(level: LockinLevel, style: &PayloadStyle, now: DateTime<Utc>) -> Self {
        Self {
            content: level.notification_text().to_string(),
            embeds: vec![Embed {
                title: style.title.clone(),
                description: format!("**Locked In Level: {level}/100**"),
                color: level.tone().color(),
                fields: vec![EmbedField {
                    name: "Status".to_string(),
                    value: level.status_label().to_string(),
                    inline: true,
                }],
                timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
                footer: EmbedFooter {
                    text: style.footer.clone(),
                },
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn payload_shape_matches_webhook_format() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let payload =
            NotificationPayload::build(LockinLevel::new(96).unwrap(), &PayloadStyle::default(), now);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["content"], "✅ Get me in there! We're locked in!");
        let embed = &json["embeds"][0];
        assert_eq!(embed["title"], DEFAULT_TITLE);
        assert_eq!(embed["description"], "**Locked In Level: 96/100**");
        assert_eq!(embed["color"], 5371990);
        assert_eq!(embed["fields"][0]["name"], "Status");
        assert_eq!(embed["fields"][0]["value"], "🏆 MAXIMUM LOCK-IN");
        assert_eq!(embed["fields"][0]["inline"], true);
        assert_eq!(embed["timestamp"], "2024-05-01T12:30:00.000Z");
        assert_eq!(embed["footer"]["text"], DEFAULT_FOOTER);
    }

    #[test]
    fn repeated_builds_differ_only_in_timestamp() {
        let level = LockinLevel::new(42).unwrap();
        let style = PayloadStyle::default();
        let first = NotificationPayload::build(level, &style, Utc::now());
        let mut second = NotificationPayload::build(
            level,
            &style,
            Utc::now() + chrono::Duration::seconds(3),
        );
        assert_ne!(first.embeds[0].timestamp, second.embeds[0].timestamp);

        second.embeds[0].timestamp = first.embeds[0].timestamp.clone();
        assert_eq!(first, second);
    }
}
