#![deny(unsafe_code)]

/// Hosted chat backend client.
///
/// This crate provides the thin client surface the astra app consumes: an
/// authenticated `ChatClient`, typed `Channel` handles with live watch
/// subscriptions, and channel list queries. Transport details (HTTP for
/// commands, WebSocket for the event feed) stay inside this crate; callers
/// fire operations and react to the event stream.
pub mod channel;
pub mod client;
pub mod error;
/// Live event payloads delivered by watched channels.
pub mod events;
pub mod query;

pub use channel::{Channel, ChannelEventStream, ChannelMetadata, WatchHandle};
pub use client::{BoxFuture, ChatClient, ClientWorker, ConnectHandle, DEFAULT_BASE_URL, UserRef};
pub use error::{ClientError, ClientResult};
pub use events::{ChannelEvent, ConnectionState, EventMessage, EventUser};
pub use query::{ChannelFilter, ChannelRef, ChannelSort, QueryOptions};
