//! # Matchmaking Messages
//!
//! Wire schemas for every message exchanged between matchmaking clients and
//! the server. A message on the wire is a one-byte [`MessageHeader`] followed
//! by the fixed-size body for that message type; no message exceeds 255 bytes.
//!
//! Field order in each record is the wire layout and is version-locked.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::schema::{TypeDescriptor, WireType};
use crate::core::size::size_of_descriptor;
use crate::error::Result;
use crate::wire_record;

/// Protocol version exchanged during authentication
pub const PROTOCOL_VERSION: u16 = 1;

/// Maximum encoded room name length (slot width including terminator)
pub const ROOM_NAME_LENGTH: usize = 24;

/// Maximum encoded room password length (slot width including terminator)
pub const ROOM_PASSWORD_LENGTH: usize = 16;

/// Rooms returned per list reply
pub const ROOM_INFO_LIST_LENGTH: usize = 6;

/// Room identifier assigned by the server
pub type RoomId = u32;

/// Message type tag carried in the header.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    AuthenticationRequest = 0,
    AuthenticationReply = 1,
    CreateRoomRequest = 2,
    CreateRoomReply = 3,
    ListRoomRequest = 4,
    ListRoomReply = 5,
    JoinRoomRequest = 6,
    JoinRoomReply = 7,
    UpdateRoomStatusRequest = 8,
    UpdateRoomStatusReply = 9,
    RandomMatchRequest = 10,
}

impl MessageType {
    pub const ALL: [MessageType; 11] = [
        MessageType::AuthenticationRequest,
        MessageType::AuthenticationReply,
        MessageType::CreateRoomRequest,
        MessageType::CreateRoomReply,
        MessageType::ListRoomRequest,
        MessageType::ListRoomReply,
        MessageType::JoinRoomRequest,
        MessageType::JoinRoomReply,
        MessageType::UpdateRoomStatusRequest,
        MessageType::UpdateRoomStatusReply,
        MessageType::RandomMatchRequest,
    ];

    pub fn from_u8(v: u8) -> Option<Self> {
        Self::ALL.get(usize::from(v)).copied()
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Descriptor of the body that follows a header with this tag.
    pub fn body_descriptor(self) -> TypeDescriptor {
        match self {
            MessageType::AuthenticationRequest => AuthenticationRequest::descriptor(),
            MessageType::AuthenticationReply => AuthenticationReply::descriptor(),
            MessageType::CreateRoomRequest => CreateRoomRequest::descriptor(),
            MessageType::CreateRoomReply => CreateRoomReply::descriptor(),
            MessageType::ListRoomRequest => ListRoomRequest::descriptor(),
            MessageType::ListRoomReply => ListRoomReply::descriptor(),
            MessageType::JoinRoomRequest => JoinRoomRequest::descriptor(),
            MessageType::JoinRoomReply => JoinRoomReply::descriptor(),
            MessageType::UpdateRoomStatusRequest => UpdateRoomStatusRequest::descriptor(),
            MessageType::UpdateRoomStatusReply => UpdateRoomStatusReply::descriptor(),
            MessageType::RandomMatchRequest => RandomMatchRequest::descriptor(),
        }
    }

    /// Serialized body size, used by transports to size receive buffers.
    pub fn body_size(self) -> Result<usize> {
        size_of_descriptor(&self.body_descriptor())
    }

    /// Body descriptors for every message type, for cache warm-up.
    pub fn all_body_descriptors() -> Vec<TypeDescriptor> {
        Self::ALL.iter().map(|t| t.body_descriptor()).collect()
    }
}

/// A record that travels as the body of a framed message.
pub trait Message: WireType {
    const TYPE: MessageType;
}

macro_rules! impl_message {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl Message for $ty {
                const TYPE: MessageType = MessageType::$ty;
            }
        )+
    };
}

// Byte-valued enums carried in u8 fields
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value),+
        }

        impl $name {
            pub fn from_u8(v: u8) -> Option<Self> {
                match v {
                    $($value => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn as_u8(self) -> u8 {
                self as u8
            }
        }

        impl From<$name> for u8 {
            fn from(v: $name) -> u8 {
                v as u8
            }
        }
    };
}

wire_enum! {
    pub enum AuthenticationErrorCode {
        Ok = 0,
        UnknownError = 1,
        VersionMismatch = 2,
        AuthenticationError = 3,
        /// Client is on the deny list
        Denied = 4,
    }
}

wire_enum! {
    pub enum CreateRoomErrorCode {
        Ok = 0,
        UnknownError = 1,
        RoomNameDuplicated = 2,
        RoomCountReachesLimit = 3,
    }
}

wire_enum! {
    pub enum ListRoomErrorCode {
        Ok = 0,
        UnknownError = 1,
    }
}

wire_enum! {
    pub enum RoomSortKind {
        NameAscending = 0,
        NameDescending = 1,
        CreateDatetimeAscending = 2,
        CreateDatetimeDescending = 3,
    }
}

wire_enum! {
    pub enum JoinRoomErrorCode {
        Ok = 0,
        UnknownError = 1,
        RoomNotExist = 2,
        PermissionDenied = 3,
        JoinRejected = 4,
        PlayerCountReachesLimit = 5,
    }
}

wire_enum! {
    pub enum RoomStatus {
        Open = 0,
        Close = 1,
        Remove = 2,
    }
}

wire_enum! {
    pub enum UpdateRoomStatusErrorCode {
        Ok = 0,
        UnknownError = 1,
        RoomNotExist = 2,
    }
}

wire_enum! {
    pub enum RandomMatchErrorCode {
        Ok = 0,
        UnknownError = 1,
    }
}

/// Room setting bits carried in `flags` fields.
pub mod room_flags {
    pub const NONE: u8 = 0;
    pub const PUBLIC_ROOM: u8 = 1 << 0;
    pub const OPEN_ROOM: u8 = 1 << 1;
}

wire_record! {
    /// Precedes every message body.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MessageHeader {
        pub message_type: u8,
    }
}

impl MessageHeader {
    pub fn new(message_type: MessageType) -> Self {
        Self {
            message_type: message_type.as_u8(),
        }
    }
}

wire_record! {
    /// Seconds since the Unix epoch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct Datetime {
        pub unix_time: i64,
    }
}

impl Datetime {
    pub fn from_unix_time(unix_time: i64) -> Self {
        Self { unix_time }
    }

    pub fn now() -> Self {
        let unix_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        Self { unix_time }
    }
}

wire_record! {
    /// IPv6 address (IPv4 stored as `::ffff:a.b.c.d`) and port.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct ClientAddress {
        pub ip_address: Vec<u8> [length = 16],
        pub port_number: u16,
    }
}

impl ClientAddress {
    pub fn is_ipv4(&self) -> bool {
        self.to_ip_addr().is_ipv4()
    }

    pub fn to_ip_addr(&self) -> IpAddr {
        let mut octets = [0u8; 16];
        let len = self.ip_address.len().min(16);
        octets[..len].copy_from_slice(&self.ip_address[..len]);
        let v6 = Ipv6Addr::from(octets);
        match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        }
    }

    pub fn to_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.to_ip_addr(), self.port_number)
    }
}

impl From<SocketAddr> for ClientAddress {
    fn from(addr: SocketAddr) -> Self {
        let v6 = match addr.ip() {
            IpAddr::V4(v4) => v4.to_ipv6_mapped(),
            IpAddr::V6(v6) => v6,
        };
        Self {
            ip_address: v6.octets().to_vec(),
            port_number: addr.port(),
        }
    }
}

impl Default for ClientAddress {
    fn default() -> Self {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0).into()
    }
}

wire_record! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AuthenticationRequest {
        pub version: u16,
    }
}

wire_record! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AuthenticationReply {
        pub error_code: u8,
        pub version: u16,
    }
}

wire_record! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct CreateRoomRequest {
        pub name: String [length = ROOM_NAME_LENGTH],
        pub flags: u8,
        /// Empty for a public room
        pub password: String [length = ROOM_PASSWORD_LENGTH],
        pub max_player_count: u8,
    }
}

wire_record! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CreateRoomReply {
        pub error_code: u8,
        pub room_id: RoomId,
    }
}

wire_record! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ListRoomRequest {
        pub start_index: u8,
        pub end_index: u8,
        pub sort_kind: u8,
        /// Room filter conditions
        pub flags: u8,
    }
}

wire_record! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RoomInfo {
        pub room_id: RoomId,
        pub name: String [length = ROOM_NAME_LENGTH],
        pub flags: u8,
        pub max_player_count: u8,
        pub current_player_count: u8,
        pub create_datetime: Datetime,
    }
}

impl Default for RoomInfo {
    fn default() -> Self {
        Self {
            room_id: 0,
            name: String::new(),
            flags: room_flags::NONE,
            max_player_count: 0,
            current_player_count: 0,
            create_datetime: Datetime::default(),
        }
    }
}

wire_record! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ListRoomReply {
        pub error_code: u8,
        pub total_room_count: u8,
        pub reply_room_count: u8,
        /// Always exactly six entries; unused slots are default rooms
        pub room_info_list: Vec<RoomInfo> [length = ROOM_INFO_LIST_LENGTH],
    }
}

impl ListRoomReply {
    /// Build a reply from up to six rooms, padding the fixed list with empty slots.
    pub fn new(error_code: ListRoomErrorCode, total_room_count: u8, rooms: &[RoomInfo]) -> Self {
        let mut room_info_list: Vec<RoomInfo> =
            rooms.iter().take(ROOM_INFO_LIST_LENGTH).cloned().collect();
        let reply_room_count = room_info_list.len() as u8;
        room_info_list.resize_with(ROOM_INFO_LIST_LENGTH, RoomInfo::default);
        Self {
            error_code: error_code.as_u8(),
            total_room_count,
            reply_room_count,
            room_info_list,
        }
    }

    /// The rooms actually carried by this reply.
    pub fn rooms(&self) -> &[RoomInfo] {
        let count = usize::from(self.reply_room_count).min(self.room_info_list.len());
        &self.room_info_list[..count]
    }
}

wire_record! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct JoinRoomRequest {
        pub room_id: RoomId,
        pub password: String [length = ROOM_PASSWORD_LENGTH],
    }
}

wire_record! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct JoinRoomReply {
        pub error_code: u8,
        pub host_address: ClientAddress,
    }
}

wire_record! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UpdateRoomStatusRequest {
        pub room_id: RoomId,
        pub status: u8,
    }
}

wire_record! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UpdateRoomStatusReply {
        pub error_code: u8,
    }
}

wire_record! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RandomMatchRequest {
        pub error_code: u8,
    }
}

impl_message!(
    AuthenticationRequest,
    AuthenticationReply,
    CreateRoomRequest,
    CreateRoomReply,
    ListRoomRequest,
    ListRoomReply,
    JoinRoomRequest,
    JoinRoomReply,
    UpdateRoomStatusRequest,
    UpdateRoomStatusReply,
    RandomMatchRequest,
);
