#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use bytes::Bytes;
use tokio_tungstenite::tungstenite::Message;

use parley_client::transport::codec::{decode, encode, utf8_frame, Inbound};

#[test]
fn text_frames_pass_through_verbatim() {
    let frame = "{\"action\":{}}\n{\"action\":{}}";
    assert_eq!(decode(Message::text(frame)), Inbound::Text(frame.to_string()));
}

#[test]
fn utf8_binary_frames_are_text() {
    let msg = Message::binary(Bytes::from_static("héllo".as_bytes()));
    assert_eq!(decode(msg), Inbound::Text("héllo".into()));
}

#[test]
fn non_utf8_binary_is_invalid() {
    let msg = Message::binary(Bytes::from_static(&[0xff, 0xfe, 0x00]));
    assert!(matches!(decode(msg), Inbound::Invalid(_)));

    let err = utf8_frame(Bytes::from_static(&[0xc3])).unwrap_err();
    assert_eq!(err.client_code().as_str(), "MALFORMED_RESPONSE");
}

#[test]
fn control_and_close() {
    assert_eq!(decode(Message::Ping(Bytes::new())), Inbound::Control);
    assert_eq!(decode(Message::Pong(Bytes::new())), Inbound::Control);
    assert_eq!(decode(Message::Close(None)), Inbound::Close);
}

#[test]
fn outbound_is_text() {
    let msg = encode("hello".to_string());
    assert!(msg.is_text());
    assert_eq!(msg.into_text().unwrap().as_str(), "hello");
}
