// SPDX-License-Identifier: AGPL-3.0-or-later
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

/// Property values shared by every message of a run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageDefaults {
    pub app_id: String,
    pub content_type: Option<String>,
    pub message_type: Option<String>,
    /// Set only with `--add-user`.
    pub user_id: Option<String>,
    pub auto_id: bool,
}

impl MessageDefaults {
    /// A fresh property set for one message. Nothing is carried over from a
    /// previous call: `message_id` is regenerated or absent every time.
    pub fn properties_at(&self, timestamp: u64) -> Properties {
        Properties {
            app_id: Some(self.app_id.clone()),
            content_type: self.content_type.clone(),
            message_type: self.message_type.clone(),
            user_id: self.user_id.clone(),
            message_id: self.auto_id.then(|| Uuid::new_v4().to_string()),
            timestamp,
        }
    }

    pub fn properties(&self) -> Properties {
        self.properties_at(epoch_seconds())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Properties {
    pub app_id: Option<String>,
    pub content_type: Option<String>,
    pub message_type: Option<String>,
    pub user_id: Option<String>,
    pub message_id: Option<String>,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub body: Vec<u8>,
    pub properties: Properties,
}

impl Envelope {
    pub fn from_line(line: &[u8], defaults: &MessageDefaults) -> Self {
        Self {
            body: strip_line_ending(line).to_vec(),
            properties: defaults.properties(),
        }
    }
}

/// Drop any trailing run of `\r` / `\n` bytes and nothing else.
pub fn strip_line_ending(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| *b != b'\r' && *b != b'\n')
        .map_or(0, |i| i + 1);
    &line[..end]
}

pub fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn defaults(auto_id: bool) -> MessageDefaults {
        MessageDefaults {
            app_id: "rabbitstew".to_string(),
            auto_id,
            ..Default::default()
        }
    }

    #[test]
    fn strips_only_trailing_line_endings() {
        assert_eq!(strip_line_ending(b"a\n"), b"a");
        assert_eq!(strip_line_ending(b"a\r\n"), b"a");
        assert_eq!(strip_line_ending(b"a\n\r\n"), b"a");
        assert_eq!(strip_line_ending(b"  a \t\n"), b"  a \t");
        assert_eq!(strip_line_ending(b"a\rb\n"), b"a\rb");
        assert_eq!(strip_line_ending(b"\r\n"), b"");
        assert_eq!(strip_line_ending(b"no newline"), b"no newline");
    }

    #[test]
    fn no_message_id_without_auto_id() {
        let d = defaults(false);
        for _ in 0..3 {
            assert_eq!(d.properties().message_id, None);
        }
    }

    #[test]
    fn auto_id_is_fresh_per_message() {
        let d = defaults(true);
        let ids: HashSet<_> = (0..100)
            .map(|_| d.properties().message_id.unwrap())
            .collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn timestamp_tracks_wall_clock() {
        let before = epoch_seconds();
        let props = defaults(false).properties();
        let after = epoch_seconds();
        assert!(props.timestamp >= before && props.timestamp <= after);
    }

    #[test]
    fn optional_properties_follow_defaults() {
        let d = MessageDefaults {
            app_id: "test".to_string(),
            content_type: Some("text/plain".to_string()),
            message_type: Some("test".to_string()),
            user_id: Some("guest".to_string()),
            auto_id: false,
        };
        let props = d.properties_at(42);
        assert_eq!(props.app_id.as_deref(), Some("test"));
        assert_eq!(props.content_type.as_deref(), Some("text/plain"));
        assert_eq!(props.message_type.as_deref(), Some("test"));
        assert_eq!(props.user_id.as_deref(), Some("guest"));
        assert_eq!(props.timestamp, 42);

        let bare = defaults(false).properties_at(1);
        assert_eq!(bare.content_type, None);
        assert_eq!(bare.message_type, None);
        assert_eq!(bare.user_id, None);
    }

    #[test]
    fn envelope_keeps_raw_bytes() {
        let env = Envelope::from_line(b"caf\xe9\r\n", &defaults(false));
        assert_eq!(env.body, b"caf\xe9");
    }
}
