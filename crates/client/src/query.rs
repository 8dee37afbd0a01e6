use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Filter conditions for a channel list query.
///
/// The backend matches on the channel type plus any custom metadata fields,
/// so conditions are kept as an open JSON object rather than a closed struct.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChannelFilter {
    conditions: Map<String, Value>,
}

impl ChannelFilter {
    /// Starts a filter matching one channel type.
    pub fn channel_type(channel_type: impl Into<String>) -> Self {
        let mut conditions = Map::new();
        conditions.insert("type".to_string(), Value::from(channel_type.into()));
        Self { conditions }
    }

    /// Adds a custom metadata condition.
    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(key.into(), value.into());
        self
    }

    pub fn conditions(&self) -> &Map<String, Value> {
        &self.conditions
    }
}

/// One sort key in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortField {
    pub field: String,
    pub direction: i8,
}

/// Ordered sort specification for a channel list query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChannelSort {
    fields: Vec<SortField>,
}

impl ChannelSort {
    /// Most-recent-activity-first ordering.
    pub fn last_message_at_desc() -> Self {
        Self::descending("last_message_at")
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            fields: vec![SortField {
                field: field.into(),
                direction: -1,
            }],
        }
    }

    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }
}

/// Query behavior flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueryOptions {
    /// When set, the matched channels stay subscribed for live updates.
    pub subscribe: bool,
}

impl QueryOptions {
    pub fn subscribed() -> Self {
        Self { subscribe: true }
    }
}

/// One channel as returned by a list query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelRef {
    pub cid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_serializes_type_and_custom_tag_as_flat_object() {
        let filter = ChannelFilter::channel_type("messaging").with_custom("example", 1);

        assert_eq!(
            serde_json::to_value(&filter).expect("filter must serialize"),
            json!({ "type": "messaging", "example": 1 })
        );
    }

    #[test]
    fn last_message_sort_is_single_descending_key() {
        let sort = ChannelSort::last_message_at_desc();

        assert_eq!(
            serde_json::to_value(&sort).expect("sort must serialize"),
            json!([{ "field": "last_message_at", "direction": -1 }])
        );
    }

    #[test]
    fn subscribed_options_enable_live_updates() {
        assert!(QueryOptions::subscribed().subscribe);
        assert!(!QueryOptions::default().subscribe);
    }

    #[test]
    fn channel_ref_decodes_with_missing_optional_fields() {
        let channel: ChannelRef =
            serde_json::from_value(json!({ "cid": "messaging:demo" })).expect("must decode");

        assert_eq!(channel.cid, "messaging:demo");
        assert_eq!(channel.name, None);
        assert_eq!(channel.last_message_at, None);
    }
}
