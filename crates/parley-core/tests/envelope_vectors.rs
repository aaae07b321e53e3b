//! Envelope vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use parley_core::protocol::envelope::{Action, AuthData, Content};
use parley_core::protocol::frame::{decode, peek_header};

use vector_loader::load;

#[test]
fn envelope_vectors() {
    let files = [
        "auth_response_ok.json",
        "auth_response_rejected.json",
        "list_channels_zero_values.json",
        "send_message_file.json",
        "unknown_action.json",
        "truncated_json.json",
        "switch_channel_hex.json",
    ];

    for f in files {
        let v = load(f);
        let doc = v.frame.decode();
        let res = decode(&doc);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.client_code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let env = res.expect("expected ok envelope");
        let ex = v.expect.expect("missing expect block");

        assert_eq!(env.action.type_name(), ex["action_type"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(env.channel.id, ex["channel_id"].as_str().unwrap(), "vector={}", v.description);

        // header-only routing view agrees with the full decode
        let header = peek_header(&doc).unwrap();
        assert_eq!(header.action_type.as_deref(), Some(env.action.type_name()), "vector={}", v.description);

        if let Some(n) = ex.get("channels").and_then(|n| n.as_u64()) {
            let Action::ListChannels(list) = &env.action else {
                panic!("vector={} expected list_channels", v.description);
            };
            assert_eq!(list.channels.len() as u64, n, "vector={}", v.description);
        }
    }
}

#[test]
fn auth_response_fields() {
    let env = decode(&load("auth_response_ok.json").frame.decode()).unwrap();
    match env.action {
        Action::UserAuth(AuthData::Response(r)) => {
            assert!(r.success);
            assert_eq!(r.username.as_deref(), Some("alice"));
            assert_eq!(r.message, "Welcome alice");
        }
        other => panic!("unexpected action: {other:?}"),
    }
    assert_eq!(env.metadata.server_node.region, "eu");

    let env = decode(&load("auth_response_rejected.json").frame.decode()).unwrap();
    match env.action {
        Action::UserAuth(AuthData::Response(r)) => {
            assert!(!r.success);
            assert!(r.username.is_none());
            assert_eq!(r.message, "bad password");
        }
        other => panic!("unexpected action: {other:?}"),
    }
    assert!(env.channel.participants.is_empty());
}

#[test]
fn file_message_keeps_content_and_tolerates_null_reactions() {
    let env = decode(&load("send_message_file.json").frame.decode()).unwrap();
    let Action::SendMessage(data) = env.action else {
        panic!("expected send_message");
    };
    let msg = data.message;
    assert_eq!(msg.sender_id, "bob");
    assert_eq!(msg.kind, "file");
    assert!(msg.reactions.is_empty());
    match &msg.content {
        Content::File(file) => {
            assert_eq!(file.file_name, "cat.png");
            assert_eq!(file.file_size, 42);
        }
        other => panic!("unexpected content: {other:?}"),
    }
    // non-text messages render as their JSON content
    assert!(msg.display_text().contains("\"file_name\":\"cat.png\""));
}
