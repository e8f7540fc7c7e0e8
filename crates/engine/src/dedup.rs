//! Delta between freshly fetched notifications and the notified set.

use octorelay_common::types::NotificationItem;

use crate::state::NotifiedSet;

/// Items that are unread and not yet notified, in the order the source returned them.
pub fn select_new<'a>(
    items: &'a [NotificationItem],
    notified: &NotifiedSet,
) -> Vec<&'a NotificationItem> {
    items
        .iter()
        .filter(|item| item.unread && !notified.contains(&item.id))
        .collect()
}

/// Mark an item as delivered. Durability is the [`StateStore`](crate::StateStore)'s job.
pub fn record(item: &NotificationItem, notified: &mut NotifiedSet) {
    if !notified.insert(item.id.clone()) {
        tracing::debug!(id = %item.id, "Item was already recorded");
    }
}

/// Text relayed for an item: `<title> (<source_label>)`, unescaped.
pub fn format_message(item: &NotificationItem) -> String {
    format!("{} ({})", item.title, item.source_label)
}

#[cfg(test)]
mod tests {
    use octorelay_common::types::RawNotification;
    use serde_json::json;

    use super::*;

    fn from_json(value: serde_json::Value) -> Vec<NotificationItem> {
        let raw: Vec<RawNotification> = serde_json::from_value(value).unwrap();
        raw.into_iter().filter_map(NotificationItem::from_raw).collect()
    }

    #[test]
    fn test_only_unread_items_selected() {
        let items = from_json(json!([
            { "id": 1, "unread": true },
            { "id": 2, "unread": false },
            { "id": 3 }
        ]));

        let new = select_new(&items, &NotifiedSet::new());
        assert_eq!(new.len(), 1);
        assert_eq!(new[0].id, "1");
    }

    #[test]
    fn test_notified_items_are_skipped() {
        let items = vec![
            NotificationItem::unread("10", "a", "org/a"),
            NotificationItem::unread("11", "b", "org/b"),
            NotificationItem::unread("12", "c", "org/c"),
        ];
        let notified: NotifiedSet = ["11"].into_iter().collect();

        let ids: Vec<&str> = select_new(&items, &notified)
            .into_iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, vec!["10", "12"]);
    }

    #[test]
    fn test_numeric_and_string_ids_compare_equal() {
        let items = from_json(json!([{ "id": 42, "unread": true }]));
        let notified: NotifiedSet = ["42"].into_iter().collect();
        assert!(select_new(&items, &notified).is_empty());
    }

    #[test]
    fn test_record_then_select_is_empty() {
        let items = vec![NotificationItem::unread("42", "Fix bug", "org/repo")];
        let mut notified = NotifiedSet::new();

        for item in select_new(&items, &notified.clone()) {
            record(item, &mut notified);
        }

        assert!(notified.contains("42"));
        assert!(select_new(&items, &notified).is_empty());
    }

    #[test]
    fn test_format_message() {
        let item = NotificationItem::unread("42", "Fix bug", "org/repo");
        assert_eq!(format_message(&item), "Fix bug (org/repo)");
    }

    #[test]
    fn test_format_message_does_not_escape() {
        let item = NotificationItem::unread("1", "Use <T> & *bold*", "org/_repo_");
        assert_eq!(format_message(&item), "Use <T> & *bold* (org/_repo_)");
    }
}
