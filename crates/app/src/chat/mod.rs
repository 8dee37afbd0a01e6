/// Event contracts for chat component wiring.
pub mod events;
pub mod header;
/// Domain entities rendered by the chat window.
pub mod message;
pub mod message_input;
pub mod message_list;
pub mod scroll;
pub mod view;

pub use events::Submit;
pub use header::ChannelHeader;
pub use message::{ChatMessage, MessageId, TypingState};
pub use message_input::MessageInput;
pub use message_list::MessageList;
pub use scroll::FollowScroll;
pub use view::ChannelView;
