use parley_core::protocol::envelope::action_type;
use parley_core::protocol::frame::{peek_header, split_documents};

/// Logical consumer kinds. Each kind has exactly one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Auth,
    Chat,
}

/// Registration token. A newer registration in the same slot invalidates older tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsumerId(u64);

/// Routing decision for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery<'a> {
    /// `user_auth` document for the registered auth consumer (exclusively).
    Auth { consumer: ConsumerId, doc: &'a str },
    /// Any other JSON document, raw, for the chat consumer to re-parse.
    Chat { consumer: ConsumerId, doc: &'a str },
    /// Not a JSON document: raw-text path.
    Discarded { doc: &'a str, reason: String },
    /// JSON document with no consumer to take it.
    Dropped { doc: &'a str },
}

/// Dispatch table: routing key (`action.type`) -> slot -> registered consumer.
#[derive(Debug, Default)]
pub struct Router {
    auth: Option<ConsumerId>,
    chat: Option<ConsumerId>,
    next_id: u64,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a consumer in `slot`, replacing whatever was there (last wins).
    pub fn register(&mut self, slot: Slot) -> ConsumerId {
        self.next_id += 1;
        let id = ConsumerId(self.next_id);
        if let Some(prev) = self.slot_mut(slot).replace(id) {
            tracing::debug!(?slot, prev = prev.0, next = id.0, "consumer replaced");
        }
        id
    }

    /// Deregister `consumer` if it still holds `slot`. Returns whether it did.
    pub fn deregister(&mut self, slot: Slot, consumer: ConsumerId) -> bool {
        let s = self.slot_mut(slot);
        if *s == Some(consumer) {
            *s = None;
            true
        } else {
            false
        }
    }

    /// Empty `slot` regardless of holder.
    pub fn clear(&mut self, slot: Slot) {
        *self.slot_mut(slot) = None;
    }

    pub fn registered(&self, slot: Slot) -> Option<ConsumerId> {
        match slot {
            Slot::Auth => self.auth,
            Slot::Chat => self.chat,
        }
    }

    /// Route every document of a raw frame, in frame order.
    pub fn route_frame<'a>(&self, frame: &'a str) -> Vec<Delivery<'a>> {
        split_documents(frame).map(|doc| self.route_document(doc)).collect()
    }

    /// Route one document to at most one consumer kind.
    pub fn route_document<'a>(&self, doc: &'a str) -> Delivery<'a> {
        let header = match peek_header(doc) {
            Ok(h) => h,
            Err(e) => {
                return Delivery::Discarded {
                    doc,
                    reason: e.to_string(),
                }
            }
        };

        if header.action_type.as_deref() == Some(action_type::USER_AUTH) {
            if let Some(consumer) = self.auth {
                return Delivery::Auth { consumer, doc };
            }
        }

        match self.chat {
            Some(consumer) => Delivery::Chat { consumer, doc },
            None => Delivery::Dropped { doc },
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Option<ConsumerId> {
        match slot {
            Slot::Auth => &mut self.auth,
            Slot::Chat => &mut self.chat,
        }
    }
}
