use serde_json::Value;

use parley_core::protocol::envelope::{Action, Channel, Envelope, LegacyMessage};
use parley_core::protocol::frame;

use crate::events::ChatEvent;

/// Re-parse a chat-slot document. `list_channels` is returned as-is for the
/// controller to reconcile; everything else maps straight to an event.
pub(crate) enum Interpreted {
    ChannelList(Vec<Channel>),
    Event(ChatEvent),
}

pub(crate) fn interpret(doc: &str) -> Interpreted {
    match frame::decode(doc) {
        Ok(Envelope {
            metadata,
            channel,
            action,
        }) => {
            let event = match action {
                Action::ListChannels(list) => return Interpreted::ChannelList(list.channels),
                Action::SendMessage(data) => ChatEvent::MessageReceived {
                    channel: Some(channel.id),
                    message: data.message,
                },
                Action::CreateChannel(data) => ChatEvent::ChannelCreated {
                    channel_id: data.channel.id,
                },
                Action::SwitchChannel(data) => ChatEvent::ChannelSwitched {
                    channel_id: data.channel_id,
                },
                Action::EditMessage(data) => ChatEvent::MessageEdited {
                    message_id: data.message_id,
                    new_content: data.new_content,
                },
                Action::DeleteMessage(data) => ChatEvent::MessageDeleted {
                    message_id: data.message_id,
                },
                Action::ReactMessage(data) => ChatEvent::ReactionAdded {
                    message_id: data.message_id,
                    reaction: data.reaction,
                },
                Action::UserPresence(data) => ChatEvent::PresenceChanged {
                    user_id: data.user_id,
                    status: data.status,
                },
                action @ Action::UserAuth(_) => ChatEvent::Action {
                    envelope: Box::new(Envelope {
                        metadata,
                        channel,
                        action,
                    }),
                },
            };
            Interpreted::Event(event)
        }
        Err(e) => {
            if let Ok(legacy) = serde_json::from_str::<LegacyMessage>(doc) {
                return Interpreted::Event(ChatEvent::MessageReceived {
                    channel: None,
                    message: legacy.message,
                });
            }
            tracing::debug!(error = %e, "chat document outside the envelope schema");
            let document = serde_json::from_str::<Value>(doc).unwrap_or_else(|_| Value::String(doc.to_string()));
            Interpreted::Event(ChatEvent::Opaque { document })
        }
    }
}
