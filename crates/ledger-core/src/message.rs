//! Gossip messages exchanged between peers and how a node answers them.
//!
//! On the wire a message is `{"type": <n>, "data": <payload>}`:
//! - `0` query latest block, no payload
//! - `1` query the whole chain, no payload
//! - `2` blocks: an array of blocks, a bare block object, or either of those
//!   encoded as a JSON string

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::block::Block;
use crate::store::{ChainStore, ReconcileOutcome};

const QUERY_LATEST: u8 = 0;
const QUERY_ALL: u8 = 1;
const RESPONSE_BLOCKCHAIN: u8 = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireMessage", into = "WireMessage")]
pub enum Message {
    QueryLatest,
    QueryAll,
    ResponseBlockchain(Value),
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    data: Value,
}

impl TryFrom<WireMessage> for Message {
    type Error = String;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        match wire.kind {
            QUERY_LATEST => Ok(Message::QueryLatest),
            QUERY_ALL => Ok(Message::QueryAll),
            RESPONSE_BLOCKCHAIN => Ok(Message::ResponseBlockchain(wire.data)),
            other => Err(format!("unknown message type {other}")),
        }
    }
}

impl From<Message> for WireMessage {
    fn from(msg: Message) -> Self {
        match msg {
            Message::QueryLatest => WireMessage {
                kind: QUERY_LATEST,
                data: Value::Null,
            },
            Message::QueryAll => WireMessage {
                kind: QUERY_ALL,
                data: Value::Null,
            },
            Message::ResponseBlockchain(data) => WireMessage {
                kind: RESPONSE_BLOCKCHAIN,
                data,
            },
        }
    }
}

impl Message {
    pub fn blocks(blocks: &[Block]) -> Self {
        Message::ResponseBlockchain(json!(blocks))
    }

    /// One-element array holding our latest block.
    pub fn latest(store: &ChainStore) -> Self {
        Self::blocks(std::slice::from_ref(&store.latest()))
    }

    pub fn full_chain(store: &ChainStore) -> Self {
        Self::blocks(&store.snapshot())
    }
}

/// Normalize a block payload into one JSON value per block.
pub fn candidate_values(data: Value) -> Vec<Value> {
    match data {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::String(_)) | Err(_) => vec![Value::String(text)],
            Ok(inner) => candidate_values(inner),
        },
        other => vec![other],
    }
}

/// What to do after handling one inbound message.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reply {
    /// Send back to the peer that sent the message.
    pub respond: Option<Message>,
    /// Send to every peer.
    pub broadcast: Option<Message>,
    /// Set when the message carried blocks.
    pub outcome: Option<ReconcileOutcome>,
}

pub fn handle_message(store: &ChainStore, msg: Message) -> Reply {
    match msg {
        Message::QueryLatest => Reply {
            respond: Some(Message::latest(store)),
            ..Reply::default()
        },
        Message::QueryAll => Reply {
            respond: Some(Message::full_chain(store)),
            ..Reply::default()
        },
        Message::ResponseBlockchain(data) => {
            let outcome = store.reconcile(candidate_values(data));
            let mut reply = Reply::default();
            if outcome.changed_tip() {
                reply.broadcast = Some(Message::latest(store));
            } else if outcome == ReconcileOutcome::NeedFullChain {
                reply.respond = Some(Message::QueryAll);
            }
            reply.outcome = Some(outcome);
            reply
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::genesis_block;
    use crate::clock::FixedClock;
    use crate::params::ChainParams;
    use crate::store::IgnoreReason;
    use std::sync::Arc;

    const NOW: u64 = 1_700_000_000;

    fn store() -> ChainStore {
        ChainStore::with_clock(ChainParams::default(), Arc::new(FixedClock::new(NOW)))
    }

    #[test]
    fn wire_format_uses_numeric_types() {
        assert_eq!(
            serde_json::to_value(Message::QueryAll).unwrap(),
            json!({ "type": 1, "data": null })
        );
        let msg: Message = serde_json::from_value(json!({ "type": 0 })).unwrap();
        assert_eq!(msg, Message::QueryLatest);
        assert!(serde_json::from_value::<Message>(json!({ "type": 9 })).is_err());
    }

    #[test]
    fn payload_shapes_normalize() {
        let block = serde_json::to_value(genesis_block()).unwrap();
        assert_eq!(candidate_values(Value::Null), Vec::<Value>::new());
        assert_eq!(candidate_values(block.clone()), vec![block.clone()]);
        assert_eq!(
            candidate_values(json!([block.clone(), block.clone()])).len(),
            2
        );
        let encoded = Value::String(block.to_string());
        assert_eq!(candidate_values(encoded), vec![block]);
        assert_eq!(
            candidate_values(json!("plain text")),
            vec![json!("plain text")]
        );
    }

    #[test]
    fn queries_are_answered_from_the_store() {
        let store = store();
        let reply = handle_message(&store, Message::QueryLatest);
        assert_eq!(reply.respond, Some(Message::blocks(&[genesis_block().clone()])));
        assert!(reply.broadcast.is_none());

        let reply = handle_message(&store, Message::QueryAll);
        assert_eq!(reply.respond, Some(Message::full_chain(&store)));
    }

    #[test]
    fn extension_is_broadcast() {
        let store = store();
        let b1 = Block::new(1, genesis_block().hash(), NOW, "one", 0, 0);
        let reply = handle_message(&store, Message::blocks(&[b1.clone()]));
        assert_eq!(reply.outcome, Some(ReconcileOutcome::Extended));
        assert_eq!(reply.broadcast, Some(Message::blocks(&[b1])));
        assert!(reply.respond.is_none());
    }

    #[test]
    fn gap_asks_for_full_chain() {
        let store = store();
        let far = Block::new(5, "a".repeat(64), NOW, "far", 0, 0);
        let reply = handle_message(&store, Message::blocks(&[far]));
        assert_eq!(reply.outcome, Some(ReconcileOutcome::NeedFullChain));
        assert_eq!(reply.respond, Some(Message::QueryAll));
    }

    #[test]
    fn own_latest_is_ignored() {
        let store = store();
        let reply = handle_message(&store, Message::latest(&store));
        assert_eq!(
            reply.outcome,
            Some(ReconcileOutcome::Ignored(IgnoreReason::NotLonger))
        );
        assert_eq!(reply, Reply { outcome: reply.outcome.clone(), ..Reply::default() });
    }
}
