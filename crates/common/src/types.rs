use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A notification as returned by `GET /notifications` on the GitHub REST API.
///
/// Only the fields the relay needs are decoded; everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawNotification {
    /// GitHub sends a string, but older proxies have been seen to send a number.
    /// Missing ids decode as `null` and are skipped later.
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub unread: Option<bool>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subject: Option<RawSubject>,
    #[serde(default)]
    pub repository: Option<RawRepository>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSubject {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRepository {
    #[serde(default)]
    pub full_name: String,
}

/// A notification item in the shape the relay works with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationItem {
    /// Opaque identifier, always compared in its string form.
    pub id: String,
    pub unread: bool,
    pub title: String,
    /// Where the notification came from, e.g. `org/repo`.
    pub source_label: String,
    pub reason: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl NotificationItem {
    /// Convenience constructor for an unread item with no metadata.
    pub fn unread(
        id: impl Into<String>,
        title: impl Into<String>,
        source_label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            unread: true,
            title: title.into(),
            source_label: source_label.into(),
            reason: None,
            updated_at: None,
        }
    }

    /// Convert a GitHub payload entry. Returns `None` when the id is null,
    /// empty or not a string/number, since such an entry cannot be deduplicated.
    pub fn from_raw(raw: RawNotification) -> Option<Self> {
        let id = id_to_string(&raw.id)?;
        Some(Self {
            id,
            unread: raw.unread.unwrap_or(false),
            title: raw.subject.map(|s| s.title).unwrap_or_default(),
            source_label: raw.repository.map(|r| r.full_name).unwrap_or_default(),
            reason: raw.reason,
            updated_at: raw.updated_at,
        })
    }
}

/// Coerce a JSON identifier to the string used for dedup comparisons.
///
/// `"42"` and `42` both become `42`; anything else has no usable id.
pub fn id_to_string(id: &serde_json::Value) -> Option<String> {
    match id {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_id_coercion() {
        assert_eq!(id_to_string(&json!("42")).as_deref(), Some("42"));
        assert_eq!(id_to_string(&json!(42)).as_deref(), Some("42"));
        assert_eq!(
            id_to_string(&json!(7_000_000_001u64)).as_deref(),
            Some("7000000001")
        );
    }

    #[test]
    fn test_unusable_ids_are_rejected() {
        for id in [json!(null), json!(""), json!(true), json!([1]), json!({ "id": 1 })] {
            assert_eq!(id_to_string(&id), None, "id {id} should be rejected");
        }

        let raw: RawNotification =
            serde_json::from_value(json!({ "id": null, "unread": true })).unwrap();
        assert!(NotificationItem::from_raw(raw).is_none());
    }

    #[test]
    fn test_from_github_payload() {
        let raw: RawNotification = serde_json::from_value(json!({
            "id": "42",
            "unread": true,
            "reason": "mention",
            "updated_at": "2024-05-01T12:00:00Z",
            "subject": { "title": "Fix bug", "type": "PullRequest" },
            "repository": { "full_name": "org/repo", "private": false }
        }))
        .unwrap();

        let item = NotificationItem::from_raw(raw).unwrap();
        assert_eq!(item.id, "42");
        assert!(item.unread);
        assert_eq!(item.title, "Fix bug");
        assert_eq!(item.source_label, "org/repo");
        assert_eq!(item.reason.as_deref(), Some("mention"));
        assert!(item.updated_at.is_some());
    }

    #[test]
    fn test_missing_fields_are_tolerated() {
        let raw: RawNotification = serde_json::from_value(json!({ "id": 3 })).unwrap();
        let item = NotificationItem::from_raw(raw).unwrap();
        assert_eq!(item.id, "3");
        assert!(!item.unread, "missing unread flag must count as read");
        assert_eq!(item.title, "");
        assert_eq!(item.source_label, "");
    }
}
