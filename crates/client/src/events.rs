use serde::Deserialize;

/// One user reference as embedded in event payloads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventUser {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One message as delivered over the event feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventMessage {
    pub id: String,
    #[serde(default)]
    pub text: String,
    pub user: EventUser,
}

/// Live event delivered by a watched channel.
///
/// Unknown event types decode to `Unknown` so protocol additions on the
/// backend never break an older client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ChannelEvent {
    #[serde(rename = "message.new")]
    MessageNew { message: EventMessage },
    #[serde(rename = "typing.start")]
    TypingStart { user: EventUser },
    #[serde(rename = "typing.stop")]
    TypingStop { user: EventUser },
    #[serde(rename = "health.check")]
    HealthCheck,
    #[serde(other)]
    Unknown,
}

/// Session lifecycle as observed by the client.
///
/// The client owns all transitions; callers read the current value and never
/// write it back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_message_event_decodes_text_and_sender() {
        let raw = r#"{
            "type": "message.new",
            "message": {
                "id": "m-1",
                "text": "hello from mission control",
                "user": { "id": "alice", "name": "Alice" }
            }
        }"#;

        let event: ChannelEvent = serde_json::from_str(raw).expect("must decode");
        let ChannelEvent::MessageNew { message } = event else {
            panic!("expected message.new, got {event:?}");
        };

        assert_eq!(message.id, "m-1");
        assert_eq!(message.text, "hello from mission control");
        assert_eq!(message.user.id, "alice");
        assert_eq!(message.user.name.as_deref(), Some("Alice"));
    }

    #[test]
    fn typing_events_carry_only_the_user() {
        let start: ChannelEvent =
            serde_json::from_str(r#"{ "type": "typing.start", "user": { "id": "bob" } }"#)
                .expect("must decode");
        let stop: ChannelEvent =
            serde_json::from_str(r#"{ "type": "typing.stop", "user": { "id": "bob" } }"#)
                .expect("must decode");

        assert!(matches!(start, ChannelEvent::TypingStart { user } if user.id == "bob"));
        assert!(matches!(stop, ChannelEvent::TypingStop { user } if user.id == "bob"));
    }

    #[test]
    fn unrecognized_event_types_decode_to_unknown() {
        let event: ChannelEvent =
            serde_json::from_str(r#"{ "type": "reaction.new", "reaction": "🚀" }"#)
                .expect("must decode");

        assert_eq!(event, ChannelEvent::Unknown);
    }
}
