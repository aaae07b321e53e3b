//! Newline framing tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use parley_core::protocol::frame::{join_documents, peek_header, split_documents};

#[test]
fn splits_in_order_and_skips_blank_lines() {
    let frame = "{\"a\":1}\n\n{\"b\":2}\r\n  \n{\"c\":3}";
    let docs: Vec<&str> = split_documents(frame).collect();
    assert_eq!(docs, vec!["{\"a\":1}", "{\"b\":2}", "{\"c\":3}"]);
}

#[test]
fn join_then_split_preserves_documents() {
    let docs = ["{\"x\":1}", "not json", "{\"y\":2}"];
    let frame = join_documents(docs);
    assert_eq!(split_documents(&frame).collect::<Vec<_>>(), docs);
}

#[test]
fn header_peek_isolates_bad_documents() {
    let frame = "{\"action\":{\"type\":\"user_auth\",\"data\":{\"success\":true}}}\n{\"action\":{\"type\":";
    let headers: Vec<_> = split_documents(frame).map(peek_header).collect();
    assert_eq!(headers.len(), 2);
    assert_eq!(headers[0].as_ref().unwrap().action_type.as_deref(), Some("user_auth"));
    assert_eq!(headers[1].as_ref().unwrap_err().client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn header_peek_without_action() {
    let legacy = r#"{"message":{"id":"1","sender_id":"system","type":"text","content":{"text":"Switched to channel: dev"}}}"#;
    assert_eq!(peek_header(legacy).unwrap().action_type, None);

    // arrays and scalars are not documents
    assert!(peek_header("[1,2]").is_err());
    assert!(peek_header("42").is_err());
    assert!(peek_header("plain text line").is_err());
}
