//! # Matchmaker Protocol
//!
//! Fixed-layout binary codec and message framing for a game matchmaking
//! client/server protocol.
//!
//! Every message is a one-byte type tag followed by a body whose size is
//! fixed by its schema: big-endian scalars, null-padded text slots and
//! sequences of an exact, annotated length. Sizes are computed once per type
//! and cached for the life of the process.
//!
//! ## Modules
//! - [`core`]: schema model, size calculator, writer, reader, frame codec
//! - [`protocol`]: matchmaking message schemas and the request dispatcher
//! - [`transport`]: async connections and the server accept loop
//! - [`config`]: TOML and environment configuration
//! - [`utils`]: logging bootstrap and codec metrics
//!
//! ## Example
//! ```rust
//! use matchmaker_protocol::protocol::message::{CreateRoomRequest, room_flags};
//! use matchmaker_protocol::{deserialize, serialize, size_of};
//!
//! let request = CreateRoomRequest {
//!     name: "lobby".to_string(),
//!     flags: room_flags::PUBLIC_ROOM,
//!     password: String::new(),
//!     max_player_count: 4,
//! };
//!
//! let bytes = serialize(&request).unwrap();
//! assert_eq!(bytes.len(), size_of::<CreateRoomRequest>().unwrap());
//! assert_eq!(deserialize::<CreateRoomRequest>(&bytes).unwrap(), request);
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use crate::core::codec::{Frame, MatchMakerCodec};
pub use crate::core::reader::{deserialize, deserialize_from};
pub use crate::core::schema::WireType;
pub use crate::core::size::{size_of, warm_size_cache};
pub use crate::core::writer::{serialize, serialize_into};
pub use crate::error::{ProtocolError, Result};
pub use crate::protocol::message::{Message, MessageType};
pub use crate::transport::Connection;
