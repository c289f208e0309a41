// test-only module included via protocol/mod.rs
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::{Arc, Mutex};

use crate::core::codec::Frame;
use crate::error::ProtocolError;
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::message::*;

/// Minimal room table used to drive the dispatcher end to end.
#[derive(Default)]
struct Rooms {
    next_id: RoomId,
    rooms: Vec<RoomInfo>,
}

fn matchmaking_dispatcher(rooms: Arc<Mutex<Rooms>>) -> Dispatcher {
    let dispatcher = Dispatcher::new();

    dispatcher
        .register(|req: AuthenticationRequest| {
            let error_code = if req.version == PROTOCOL_VERSION {
                AuthenticationErrorCode::Ok
            } else {
                AuthenticationErrorCode::VersionMismatch
            };
            Ok(AuthenticationReply {
                error_code: error_code.as_u8(),
                version: PROTOCOL_VERSION,
            })
        })
        .unwrap();

    let create_rooms = Arc::clone(&rooms);
    dispatcher
        .register(move |req: CreateRoomRequest| {
            let mut table = create_rooms.lock().unwrap();
            if table.rooms.iter().any(|r| r.name == req.name) {
                return Ok(CreateRoomReply {
                    error_code: CreateRoomErrorCode::RoomNameDuplicated.as_u8(),
                    room_id: 0,
                });
            }
            table.next_id += 1;
            let room_id = table.next_id;
            table.rooms.push(RoomInfo {
                room_id,
                name: req.name,
                flags: req.flags,
                max_player_count: req.max_player_count,
                current_player_count: 1,
                create_datetime: Datetime::from_unix_time(1_700_000_000 + i64::from(room_id)),
            });
            Ok(CreateRoomReply {
                error_code: CreateRoomErrorCode::Ok.as_u8(),
                room_id,
            })
        })
        .unwrap();

    let list_rooms = Arc::clone(&rooms);
    dispatcher
        .register(move |req: ListRoomRequest| {
            let table = list_rooms.lock().unwrap();
            let start = usize::from(req.start_index).min(table.rooms.len());
            let end = usize::from(req.end_index).min(table.rooms.len()).max(start);
            Ok(ListRoomReply::new(
                ListRoomErrorCode::Ok,
                table.rooms.len() as u8,
                &table.rooms[start..end],
            ))
        })
        .unwrap();

    dispatcher
}

#[test]
fn test_matchmaking_flow() {
    let rooms = Arc::new(Mutex::new(Rooms::default()));
    let dispatcher = matchmaking_dispatcher(Arc::clone(&rooms));

    // =================== Step 1: Authenticate ===================
    let auth = Frame::from_message(&AuthenticationRequest {
        version: PROTOCOL_VERSION,
    })
    .unwrap();
    let reply: AuthenticationReply = dispatcher.dispatch(&auth).unwrap().decode_body().unwrap();
    assert_eq!(reply.error_code, AuthenticationErrorCode::Ok.as_u8());

    // =================== Step 2: Create two rooms ===================
    for name in ["lobby", "ranked"] {
        let create = Frame::from_message(&CreateRoomRequest {
            name: name.to_string(),
            flags: room_flags::PUBLIC_ROOM | room_flags::OPEN_ROOM,
            password: String::new(),
            max_player_count: 4,
        })
        .unwrap();
        let reply: CreateRoomReply = dispatcher.dispatch(&create).unwrap().decode_body().unwrap();
        assert_eq!(reply.error_code, CreateRoomErrorCode::Ok.as_u8());
    }

    // =================== Step 3: Duplicate name is refused ===================
    let duplicate = Frame::from_message(&CreateRoomRequest {
        name: "lobby".to_string(),
        flags: room_flags::NONE,
        password: "secret".to_string(),
        max_player_count: 2,
    })
    .unwrap();
    let reply: CreateRoomReply = dispatcher.dispatch(&duplicate).unwrap().decode_body().unwrap();
    assert_eq!(reply.error_code, CreateRoomErrorCode::RoomNameDuplicated.as_u8());

    // =================== Step 4: List rooms ===================
    let list = Frame::from_message(&ListRoomRequest {
        start_index: 0,
        end_index: 6,
        sort_kind: RoomSortKind::NameAscending.as_u8(),
        flags: room_flags::NONE,
    })
    .unwrap();
    let reply: ListRoomReply = dispatcher.dispatch(&list).unwrap().decode_body().unwrap();
    assert_eq!(reply.total_room_count, 2);
    let names: Vec<&str> = reply.rooms().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["lobby", "ranked"]);
    assert_eq!(reply.room_info_list.len(), ROOM_INFO_LIST_LENGTH);
}

#[test]
fn test_version_mismatch_is_reported() {
    let dispatcher = matchmaking_dispatcher(Arc::new(Mutex::new(Rooms::default())));
    let auth = Frame::from_message(&AuthenticationRequest { version: 99 }).unwrap();
    let reply: AuthenticationReply = dispatcher.dispatch(&auth).unwrap().decode_body().unwrap();
    assert_eq!(reply.error_code, AuthenticationErrorCode::VersionMismatch.as_u8());
}

#[test]
fn test_unregistered_message_is_rejected() {
    let dispatcher = matchmaking_dispatcher(Arc::new(Mutex::new(Rooms::default())));
    assert!(!dispatcher.is_registered(MessageType::JoinRoomRequest).unwrap());
    assert!(dispatcher.is_registered(MessageType::ListRoomRequest).unwrap());

    let join = Frame::from_message(&JoinRoomRequest {
        room_id: 1,
        password: String::new(),
    })
    .unwrap();
    assert!(matches!(
        dispatcher.dispatch(&join),
        Err(ProtocolError::UnexpectedMessage)
    ));
}

#[test]
fn test_handler_error_propagates() {
    let dispatcher = Dispatcher::new();
    dispatcher
        .register(|_: UpdateRoomStatusRequest| -> crate::error::Result<UpdateRoomStatusReply> {
            Err(ProtocolError::Custom("room table unavailable".into()))
        })
        .unwrap();

    let frame = Frame::from_message(&UpdateRoomStatusRequest {
        room_id: 3,
        status: RoomStatus::Close.as_u8(),
    })
    .unwrap();
    assert!(matches!(
        dispatcher.dispatch(&frame),
        Err(ProtocolError::Custom(_))
    ));
}

#[test]
fn test_reply_with_oversized_text_fails_to_encode() {
    let dispatcher = Dispatcher::new();
    dispatcher
        .register(|req: ListRoomRequest| {
            let room = RoomInfo {
                room_id: 1,
                name: "n".repeat(ROOM_NAME_LENGTH),
                ..RoomInfo::default()
            };
            Ok(ListRoomReply::new(ListRoomErrorCode::Ok, req.end_index, &[room]))
        })
        .unwrap();

    let frame = Frame::from_message(&ListRoomRequest {
        start_index: 0,
        end_index: 1,
        sort_kind: 0,
        flags: 0,
    })
    .unwrap();
    assert!(matches!(
        dispatcher.dispatch(&frame),
        Err(ProtocolError::LengthViolation { .. })
    ));
}

#[test]
fn test_reregistering_replaces_handler() {
    let dispatcher = Dispatcher::new();
    dispatcher
        .register(|_: RandomMatchRequest| {
            Ok(UpdateRoomStatusReply {
                error_code: 1,
            })
        })
        .unwrap();
    dispatcher
        .register(|_: RandomMatchRequest| {
            Ok(UpdateRoomStatusReply {
                error_code: 0,
            })
        })
        .unwrap();

    let frame = Frame::from_message(&RandomMatchRequest { error_code: 0 }).unwrap();
    let reply: UpdateRoomStatusReply = dispatcher.dispatch(&frame).unwrap().decode_body().unwrap();
    assert_eq!(reply.error_code, 0);
}
