use astra_client::EventMessage;

/// Server-assigned message identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

/// One message as rendered by the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub text: String,
    /// Sent by the locally authenticated user.
    pub is_own: bool,
}

impl ChatMessage {
    /// Maps a wire event message into the rendered model.
    pub fn from_event(message: EventMessage, own_user_id: &str) -> Self {
        let is_own = message.user.id == own_user_id;
        Self {
            id: MessageId(message.id),
            sender_id: message.user.id,
            sender_name: message.user.name,
            text: message.text,
            is_own,
        }
    }

    /// Name shown above messages from other users.
    pub fn display_name(&self) -> &str {
        self.sender_name.as_deref().unwrap_or(&self.sender_id)
    }
}

/// Which other users are currently composing a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypingState {
    users: Vec<String>,
}

impl TypingState {
    /// Records a typing start; returns whether the state changed.
    pub fn start(&mut self, user_id: impl Into<String>) -> bool {
        let user_id = user_id.into();
        if self.users.contains(&user_id) {
            return false;
        }
        self.users.push(user_id);
        true
    }

    /// Records a typing stop; returns whether the state changed.
    pub fn stop(&mut self, user_id: &str) -> bool {
        let before = self.users.len();
        self.users.retain(|user| user != user_id);
        self.users.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Indicator text, or `None` when nobody is typing.
    pub fn indicator_label(&self) -> Option<String> {
        match self.users.as_slice() {
            [] => None,
            [user] => Some(format!("{user} is typing...")),
            _ => Some("Several people are typing...".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_state_deduplicates_users() {
        let mut typing = TypingState::default();

        assert!(typing.start("alice"));
        assert!(!typing.start("alice"));
        assert_eq!(typing.indicator_label().as_deref(), Some("alice is typing..."));

        assert!(typing.start("bob"));
        assert_eq!(
            typing.indicator_label().as_deref(),
            Some("Several people are typing...")
        );

        assert!(typing.stop("alice"));
        assert!(!typing.stop("alice"));
        assert_eq!(typing.indicator_label().as_deref(), Some("bob is typing..."));

        assert!(typing.stop("bob"));
        assert!(typing.is_empty());
        assert_eq!(typing.indicator_label(), None);
    }

    #[test]
    fn own_messages_are_flagged_by_sender_id() {
        let event = EventMessage {
            id: "m-1".to_string(),
            text: "liftoff".to_string(),
            user: astra_client::EventUser {
                id: "alice".to_string(),
                name: Some("Alice".to_string()),
            },
        };

        let own = ChatMessage::from_event(event.clone(), "alice");
        assert!(own.is_own);
        assert_eq!(own.display_name(), "Alice");

        let other = ChatMessage::from_event(event, "bob");
        assert!(!other.is_own);
    }
}
