//! # Transport Layer
//!
//! Async client and server plumbing over framed TCP streams.
//!
//! ## Components
//! - **Connection**: send, receive and request/reply over any `AsyncRead + AsyncWrite`
//! - **Server**: accept loop that answers requests through a [`Dispatcher`](crate::protocol::dispatcher::Dispatcher)
//!
//! All waits are bounded by the timeouts in [`ClientConfig`](crate::config::ClientConfig)
//! and [`ServerConfig`](crate::config::ServerConfig).

pub mod connection;
pub mod server;

pub use connection::Connection;
