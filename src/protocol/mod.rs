//! # Matchmaking Protocol
//!
//! Message schemas exchanged between matchmaking clients and the server, and
//! routing of request frames to handlers.
//!
//! ## Components
//! - **Message**: every request/reply body, with its type tag
//! - **Dispatcher**: routes decoded request frames to typed handlers
//!
//! ## Message Flow
//! ```text
//! client                                server
//!   | -- AuthenticationRequest -------->  |
//!   | <------- AuthenticationReply ------ |
//!   | -- CreateRoomRequest / ListRoom...> |
//!   | <------------- ...Reply ----------- |
//! ```

pub mod dispatcher;
pub mod message;

#[cfg(test)]
mod tests;
