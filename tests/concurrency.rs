use bytes::BytesMut;
use matchmaker_protocol::core::codec::{Frame, MatchMakerCodec};
use matchmaker_protocol::core::size::{global_size_cache, size_of_descriptor, SizeCache};
use matchmaker_protocol::protocol::message::*;
use matchmaker_protocol::{deserialize, serialize, size_of};
use tokio_util::codec::{Decoder, Encoder};

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_size_queries_agree() {
    use tokio::task::JoinSet;

    let mut tasks = JoinSet::new();
    for _ in 0..32 {
        tasks.spawn(async move {
            for message_type in MessageType::ALL {
                let size = message_type.body_size().unwrap();
                assert_eq!(size, size_of_descriptor(&message_type.body_descriptor()).unwrap());
            }
            size_of::<ListRoomReply>().unwrap()
        });
    }

    while let Some(res) = tasks.join_next().await {
        assert_eq!(res.unwrap(), 237);
    }
    assert!(global_size_cache().len().unwrap() >= MessageType::ALL.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_encode_decode_heavy() {
    use tokio::task::JoinSet;

    let iterations = 5_000u32;
    let mut tasks = JoinSet::new();
    for worker in 0..8u32 {
        tasks.spawn(async move {
            let mut codec = MatchMakerCodec::new();
            let mut buf = BytesMut::new();
            for i in 0..iterations {
                let room = RoomInfo {
                    room_id: worker * iterations + i,
                    name: format!("room-{worker}-{i}"),
                    ..RoomInfo::default()
                };
                let reply = ListRoomReply::new(ListRoomErrorCode::Ok, 1, &[room.clone()]);

                let bytes = serialize(&reply).unwrap();
                assert_eq!(deserialize::<ListRoomReply>(&bytes).unwrap().rooms(), &[room]);

                codec.encode(Frame::from_message(&reply).unwrap(), &mut buf).unwrap();
                let frame = codec.decode(&mut buf).unwrap().unwrap();
                assert_eq!(frame.message_type, MessageType::ListRoomReply);
            }
            codec.metrics().snapshot().frames_decoded
        });
    }

    while let Some(res) = tasks.join_next().await {
        assert_eq!(res.unwrap(), u64::from(iterations));
    }
}

#[test]
fn racing_threads_fill_private_cache_once_per_type() {
    let cache = std::sync::Arc::new(SizeCache::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = std::sync::Arc::clone(&cache);
            std::thread::spawn(move || {
                MessageType::ALL
                    .iter()
                    .map(|t| cache.size_of_descriptor(&t.body_descriptor()).unwrap())
                    .sum::<usize>()
            })
        })
        .collect();

    let totals: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(totals.windows(2).all(|w| w[0] == w[1]));

    let before = cache.len().unwrap();
    for t in MessageType::ALL {
        cache.size_of_descriptor(&t.body_descriptor()).unwrap();
    }
    assert_eq!(cache.len().unwrap(), before);
}
