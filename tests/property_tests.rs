//! Property-based tests using proptest
//!
//! These tests check the codec laws across randomly generated values:
//! round-trips are lossless and every serialization is exactly `size_of` bytes.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::BytesMut;
use matchmaker_protocol::core::codec::{Frame, MatchMakerCodec};
use matchmaker_protocol::protocol::message::*;
use matchmaker_protocol::{deserialize, serialize, size_of};
use proptest::prelude::*;
use tokio_util::codec::{Decoder, Encoder};

fn room_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _-]{0,23}"
}

fn password() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{0,15}"
}

fn room_info() -> impl Strategy<Value = RoomInfo> {
    (any::<u32>(), room_name(), any::<u8>(), any::<u8>(), any::<u8>(), any::<i64>()).prop_map(
        |(room_id, name, flags, max_player_count, current_player_count, unix_time)| RoomInfo {
            room_id,
            name,
            flags,
            max_player_count,
            current_player_count,
            create_datetime: Datetime::from_unix_time(unix_time),
        },
    )
}

// Property: create-room requests survive a round-trip at the exact size
proptest! {
    #[test]
    fn prop_create_room_roundtrip(
        name in room_name(),
        password in password(),
        flags in any::<u8>(),
        max_player_count in any::<u8>(),
    ) {
        let request = CreateRoomRequest { name, flags, password, max_player_count };
        let bytes = serialize(&request).expect("Serialization should not fail");

        prop_assert_eq!(bytes.len(), size_of::<CreateRoomRequest>().unwrap());
        prop_assert_eq!(deserialize::<CreateRoomRequest>(&bytes).unwrap(), request);
    }
}

// Property: multi-byte text is limited by encoded bytes, not characters
proptest! {
    #[test]
    fn prop_text_limit_counts_utf8_bytes(name in "\\PC{0,30}") {
        let request = CreateRoomRequest {
            name: name.clone(),
            flags: 0,
            password: String::new(),
            max_player_count: 0,
        };
        let fits = name.len() < ROOM_NAME_LENGTH;
        let result = serialize(&request);
        prop_assert_eq!(result.is_ok(), fits);
        if let Ok(bytes) = result {
            prop_assert_eq!(deserialize::<CreateRoomRequest>(&bytes).unwrap().name, name);
        }
    }
}

// Property: text holding a NUL never encodes, so decode never truncates it
proptest! {
    #[test]
    fn prop_text_with_nul_is_rejected(
        name in prop::collection::vec(prop_oneof![Just('\0'), any::<char>()], 0..24)
            .prop_map(|chars| chars.into_iter().collect::<String>()),
    ) {
        let request = CreateRoomRequest {
            name: name.clone(),
            flags: 0,
            password: String::new(),
            max_player_count: 0,
        };
        let result = serialize(&request);
        if name.contains('\0') {
            prop_assert!(matches!(
                result,
                Err(matchmaker_protocol::error::ProtocolError::MalformedText { field: "name" })
            ), "expected MalformedText {{ field: \"name\" }}, got {:?}", result);
        } else {
            prop_assert_eq!(result.is_ok(), name.len() < ROOM_NAME_LENGTH);
            if let Ok(bytes) = result {
                prop_assert_eq!(deserialize::<CreateRoomRequest>(&bytes).unwrap().name, name);
            }
        }
    }
}

// Property: room lists round-trip whatever subset of rooms they carry
proptest! {
    #[test]
    fn prop_list_room_reply_roundtrip(
        rooms in prop::collection::vec(room_info(), 0..=ROOM_INFO_LIST_LENGTH),
        total in any::<u8>(),
    ) {
        let reply = ListRoomReply::new(ListRoomErrorCode::Ok, total, &rooms);
        let bytes = serialize(&reply).unwrap();

        prop_assert_eq!(bytes.len(), 237);
        let decoded = deserialize::<ListRoomReply>(&bytes).unwrap();
        prop_assert_eq!(decoded.rooms(), &rooms[..]);
    }
}

// Property: any socket address survives the IPv6 address slot
proptest! {
    #[test]
    fn prop_client_address_roundtrip(octets in any::<[u8; 4]>(), port in any::<u16>()) {
        let addr = std::net::SocketAddr::from((octets, port));
        let bytes = serialize(&ClientAddress::from(addr)).unwrap();
        let decoded = deserialize::<ClientAddress>(&bytes).unwrap();
        prop_assert_eq!(decoded.to_socket_addr(), addr);
    }
}

// Property: the decoder never panics and never yields a frame of the wrong size
proptest! {
    #[test]
    fn prop_decoder_handles_arbitrary_bytes(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut codec = MatchMakerCodec::new();
        let mut buf = BytesMut::from(&data[..]);
        while let Ok(Some(frame)) = codec.decode(&mut buf) {
            prop_assert_eq!(frame.body.len(), frame.message_type.body_size().unwrap());
        }
    }
}

// Property: encoding then decoding a frame is the identity
proptest! {
    #[test]
    fn prop_frame_roundtrip(room_id in any::<u32>(), status in 0u8..3) {
        let frame = Frame::from_message(&UpdateRoomStatusRequest { room_id, status }).unwrap();
        let mut codec = MatchMakerCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(frame.clone(), &mut buf).unwrap();

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        prop_assert_eq!(decoded, frame);
        prop_assert!(buf.is_empty());
    }
}
