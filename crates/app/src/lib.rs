#![deny(unsafe_code)]

/// Demonstration chat front end.
///
/// This crate wires the hosted chat backend client (`astra-client`) into a
/// fixed window built from gpui-component widgets: a channel header, a
/// message list with a typing indicator, and a message input. Session and
/// channel setup run once at startup; everything after that is reaction to
/// the client's event feed.
pub mod app;
/// Chat window components and their domain types.
pub mod chat;
pub mod config;
pub mod session;
