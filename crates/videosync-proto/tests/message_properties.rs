//! Property-based tests for the client message codec
//!
//! The decoder sits directly behind the network, so it must reject garbage
//! without panicking and must accept everything a well-behaved client sends.

use proptest::prelude::*;
use videosync_proto::{
    ClientMessage, MessageType, ProtocolError,
    payloads::client::{
        IntroducePayload, PositionPayload, QueueUrlPayload, RemoveFromQueuePayload,
        ReorderQueuePayload,
    },
};

/// Positions on a quarter-second grid, exactly representable in JSON
fn position() -> impl Strategy<Value = f64> {
    (0u32..345_600).prop_map(|quarters| f64::from(quarters) / 4.0)
}

/// Strategy for generating messages a browser client could send
fn arbitrary_client_message() -> impl Strategy<Value = ClientMessage> {
    prop_oneof![
        ".{0,40}".prop_map(|user_name| ClientMessage::Introduce(IntroducePayload { user_name })),
        position().prop_map(|position| ClientMessage::Play(PositionPayload { position })),
        position().prop_map(|position| ClientMessage::Pause(PositionPayload { position })),
        ".{0,80}".prop_map(|url| ClientMessage::QueueUrl(QueueUrlPayload { url })),
        (any::<i64>(), any::<i64>())
            .prop_map(|(from, to)| ClientMessage::ReorderQueue(ReorderQueuePayload { from, to })),
        any::<i64>()
            .prop_map(|index| ClientMessage::RemoveFromQueue(RemoveFromQueuePayload { index })),
        Just(ClientMessage::Skip),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: Arbitrary text never panics the decoder
    #[test]
    fn prop_decode_never_panics(text in ".{0,256}") {
        let _ = ClientMessage::decode(&text);
    }

    /// Property: Anything a client encodes is accepted with the same meaning
    #[test]
    fn prop_client_messages_are_accepted(msg in arbitrary_client_message()) {
        let text = msg.encode()?;
        let decoded = ClientMessage::decode(&text)?;
        prop_assert_eq!(decoded.kind(), msg.kind());
        prop_assert_eq!(decoded, msg);
    }

    /// Property: Server-only tags are always refused from clients, whatever
    /// the payload
    #[test]
    fn prop_server_only_tags_rejected(
        kind in prop::sample::select(
            MessageType::ALL.into_iter().filter(|k| !k.is_client_to_server()).collect::<Vec<_>>()
        ),
        video_id in "[a-zA-Z0-9_-]{0,11}",
    ) {
        let text = format!(r#"{{"type":"{kind}","payload":{{"videoId":"{video_id}"}}}}"#);
        let result = ClientMessage::decode(&text);
        prop_assert!(matches!(result, Err(ProtocolError::UnexpectedDirection(_))));
    }

    /// Property: Tags outside the closed set are rejected as unknown
    #[test]
    fn prop_unknown_tags_rejected(tag in "[a-z]{1,16}") {
        prop_assume!(MessageType::from_tag(&tag).is_none());
        let text = format!(r#"{{"type":"{tag}","payload":{{}}}}"#);
        let result = ClientMessage::decode(&text);
        prop_assert!(matches!(result, Err(ProtocolError::UnknownType(_))));
    }
}
