//! Phoenix channel frames used by the realtime endpoint.
//!
//! Every frame is a JSON object:
//!
//! ```json
//! {"topic":"realtime:admin-orders-changes","event":"phx_join","payload":{...},"ref":"1","join_ref":"1"}
//! ```
//!
//! Keepalives go to the reserved `phoenix` topic. Row changes arrive as
//! `postgres_changes` events whose `payload.data` carries the change type
//! and the `record` / `old_record` snapshots.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::port::{ChangeFilter, ChangeKind, RawChange};

/// Topic reserved for socket-level keepalives.
pub const PHOENIX_TOPIC: &str = "phoenix";

pub const EVENT_JOIN: &str = "phx_join";
pub const EVENT_LEAVE: &str = "phx_leave";
pub const EVENT_REPLY: &str = "phx_reply";
pub const EVENT_ERROR: &str = "phx_error";
pub const EVENT_CLOSE: &str = "phx_close";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const EVENT_CHANGES: &str = "postgres_changes";
pub const EVENT_SYSTEM: &str = "system";

/// One Phoenix frame, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

impl PhoenixMessage {
    /// Channel topic for a named realtime channel.
    #[must_use]
    pub fn channel_topic(channel: &str) -> String {
        format!("realtime:{channel}")
    }

    /// Join request subscribing `topic` to row changes matching `filter`.
    #[must_use]
    pub fn join(topic: &str, filter: &ChangeFilter, access_token: Option<&str>, reference: &str) -> Self {
        let mut payload = json!({
            "config": {
                "broadcast": { "ack": false, "self": false },
                "presence": { "key": "" },
                "postgres_changes": [{
                    "event": filter.events.as_wire(),
                    "schema": filter.schema,
                    "table": filter.table,
                }],
            },
        });
        if let Some(token) = access_token {
            payload["access_token"] = Value::String(token.to_string());
        }

        Self {
            topic: topic.to_string(),
            event: EVENT_JOIN.into(),
            payload,
            reference: Some(reference.to_string()),
            join_ref: Some(reference.to_string()),
        }
    }

    #[must_use]
    pub fn leave(topic: &str, reference: &str, join_ref: Option<&str>) -> Self {
        Self {
            topic: topic.to_string(),
            event: EVENT_LEAVE.into(),
            payload: json!({}),
            reference: Some(reference.to_string()),
            join_ref: join_ref.map(str::to_string),
        }
    }

    #[must_use]
    pub fn heartbeat(reference: &str) -> Self {
        Self {
            topic: PHOENIX_TOPIC.into(),
            event: EVENT_HEARTBEAT.into(),
            payload: json!({}),
            reference: Some(reference.to_string()),
            join_ref: None,
        }
    }

    /// Interpret a frame received while joined to `topic`.
    #[must_use]
    pub fn classify(self, topic: &str) -> Inbound {
        if self.topic == PHOENIX_TOPIC {
            return match self.event.as_str() {
                EVENT_REPLY => Inbound::Heartbeat {
                    reference: self.reference,
                },
                _ => Inbound::Ignored,
            };
        }
        if self.topic != topic {
            return Inbound::Ignored;
        }

        match self.event.as_str() {
            EVENT_REPLY => {
                let reply: ReplyPayload = match serde_json::from_value(self.payload) {
                    Ok(reply) => reply,
                    Err(e) => return Inbound::Malformed(e.to_string()),
                };
                Inbound::Reply {
                    reference: self.reference,
                    outcome: reply.outcome(),
                }
            }
            EVENT_CHANGES => match serde_json::from_value::<ChangesPayload>(self.payload) {
                Ok(changes) => Inbound::Change(changes.data.into_raw()),
                Err(e) => Inbound::Malformed(e.to_string()),
            },
            EVENT_SYSTEM => match serde_json::from_value::<SystemPayload>(self.payload) {
                Ok(system) if system.status == "ok" => Inbound::Ignored,
                Ok(system) => Inbound::ChannelError(system.message.unwrap_or(system.status)),
                Err(e) => Inbound::Malformed(e.to_string()),
            },
            EVENT_ERROR => Inbound::ChannelError("channel crashed on the server".into()),
            EVENT_CLOSE => Inbound::Closed,
            _ => Inbound::Ignored,
        }
    }
}

/// What a received frame means for the subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Reply on the channel topic; matched to a request by `reference`.
    Reply {
        reference: Option<String>,
        outcome: Result<(), String>,
    },
    /// Server acknowledged a keepalive.
    Heartbeat { reference: Option<String> },
    Change(RawChange),
    ChannelError(String),
    Closed,
    /// A frame for our topic whose payload did not parse.
    Malformed(String),
    Ignored,
}

#[derive(Debug, Deserialize)]
struct ReplyPayload {
    status: String,
    #[serde(default)]
    response: Value,
}

impl ReplyPayload {
    fn outcome(&self) -> Result<(), String> {
        if self.status == "ok" {
            return Ok(());
        }
        let reason = self
            .response
            .get("reason")
            .and_then(Value::as_str)
            .map_or_else(|| self.status.clone(), str::to_string);
        Err(reason)
    }
}

#[derive(Debug, Deserialize)]
struct ChangesPayload {
    data: ChangeData,
}

/// Body of a `postgres_changes` event.
#[derive(Debug, Deserialize)]
struct ChangeData {
    #[serde(rename = "type")]
    kind: ChangeKind,
    #[serde(default)]
    record: Option<Value>,
    #[serde(default)]
    old_record: Option<Value>,
}

impl ChangeData {
    fn into_raw(self) -> RawChange {
        RawChange {
            kind: self.kind,
            new: self.record,
            old: self.old_record,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SystemPayload {
    status: String,
    #[serde(default)]
    message: Option<String>,
}
