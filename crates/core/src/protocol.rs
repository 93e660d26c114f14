// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages for client-server communication.
//!
//! The protocol is request/response:
//! - Client sends one CRUD request tagged with a `request_id`
//! - Server answers with a message carrying the same `request_id`

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Create a record. The server assigns an id if `data` has none.
    Create {
        request_id: u64,
        table: String,
        data: Value,
    },

    /// Merge `patch` into the record with the given id.
    Update {
        request_id: u64,
        table: String,
        id: String,
        patch: Value,
    },

    /// Remove the record with the given id.
    Delete {
        request_id: u64,
        table: String,
        id: String,
    },

    /// List all records in a table.
    Select { request_id: u64, table: String },

    /// Ping message for keepalive.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A mutation was applied.
    Ok {
        request_id: u64,
        /// The record as stored, for creates and updates of existing rows.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        record: Option<Value>,
    },

    /// Response to a Select request.
    Rows { request_id: u64, rows: Vec<Value> },

    /// Pong response to client Ping.
    Pong {
        /// Echoed from the Ping message.
        id: u64,
    },

    /// The request was rejected or could not be parsed.
    Error {
        /// Absent when the request itself was unreadable.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<u64>,
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    /// Creates a Create message.
    pub fn create(request_id: u64, table: impl Into<String>, data: Value) -> Self {
        ClientMessage::Create {
            request_id,
            table: table.into(),
            data,
        }
    }

    /// Creates an Update message.
    pub fn update(
        request_id: u64,
        table: impl Into<String>,
        id: impl Into<String>,
        patch: Value,
    ) -> Self {
        ClientMessage::Update {
            request_id,
            table: table.into(),
            id: id.into(),
            patch,
        }
    }

    /// Creates a Delete message.
    pub fn delete(request_id: u64, table: impl Into<String>, id: impl Into<String>) -> Self {
        ClientMessage::Delete {
            request_id,
            table: table.into(),
            id: id.into(),
        }
    }

    /// Creates a Select message.
    pub fn select(request_id: u64, table: impl Into<String>) -> Self {
        ClientMessage::Select {
            request_id,
            table: table.into(),
        }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// The correlation id a response must echo, if this is a request.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            ClientMessage::Create { request_id, .. }
            | ClientMessage::Update { request_id, .. }
            | ClientMessage::Delete { request_id, .. }
            | ClientMessage::Select { request_id, .. } => Some(*request_id),
            ClientMessage::Ping { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates an Ok message.
    pub fn ok(request_id: u64, record: Option<Value>) -> Self {
        ServerMessage::Ok { request_id, record }
    }

    /// Creates a Rows message.
    pub fn rows(request_id: u64, rows: Vec<Value>) -> Self {
        ServerMessage::Rows { request_id, rows }
    }

    /// Creates a Pong message.
    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    /// Creates an Error message.
    pub fn error(request_id: Option<u64>, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            request_id,
            message: message.into(),
        }
    }

    /// The request this message answers, if any.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            ServerMessage::Ok { request_id, .. } | ServerMessage::Rows { request_id, .. } => {
                Some(*request_id)
            }
            ServerMessage::Error { request_id, .. } => *request_id,
            ServerMessage::Pong { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
