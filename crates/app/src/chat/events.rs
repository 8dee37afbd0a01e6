/// Emitted when the user submits the message input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submit {
    pub text: String,
}

impl Submit {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
