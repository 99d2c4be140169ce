//! Wire envelope and per-content-type payloads (spec §6).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::blockchain::{MainBlock, ShardBlock};
use crate::error::{Result, SsamError};
use crate::transaction::Transaction;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    ShardBlock,
    MainBlock,
    Control,
    Transaction,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ControlAction {
    Start,
    Stop,
}

/// `CONTROL.content`: `{ "action": "START"|"STOP", "shard": <name>, "epoch": <int> }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlMessage {
    pub action: ControlAction,
    pub shard: String,
    pub epoch: u64,
}

impl ControlMessage {
    pub fn start(shard: impl Into<String>, epoch: u64) -> Self {
        Self {
            action: ControlAction::Start,
            shard: shard.into(),
            epoch,
        }
    }

    pub fn stop(shard: impl Into<String>, epoch: u64) -> Self {
        Self {
            action: ControlAction::Stop,
            shard: shard.into(),
            epoch,
        }
    }
}

/// One JSON object per line: `{ sender, content_type, content }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub sender: String,
    pub content_type: ContentType,
    pub content: Value,
}

impl Envelope {
    pub fn new(
        sender: impl Into<String>,
        content_type: ContentType,
        content: Value,
    ) -> Self {
        Self {
            sender: sender.into(),
            content_type,
            content,
        }
    }

    pub fn shard_block(sender: impl Into<String>, block: &ShardBlock) -> Result<Self> {
        Ok(Self::new(
            sender,
            ContentType::ShardBlock,
            serde_json::to_value(block)?,
        ))
    }

    pub fn main_block(sender: impl Into<String>, block: &MainBlock) -> Result<Self> {
        // The receiver recomputes the hash and does not trust the
        // embedded value (spec §6), but the wire form still carries it.
        let mut value = serde_json::to_value(block)?;
        if let Value::Object(ref mut map) = value {
            map.insert(
                "block_hash".to_string(),
                Value::String(block.compute_hash()),
            );
        }
        Ok(Self::new(sender, ContentType::MainBlock, value))
    }

    pub fn control(sender: impl Into<String>, control: &ControlMessage) -> Result<Self> {
        Ok(Self::new(
            sender,
            ContentType::Control,
            serde_json::to_value(control)?,
        ))
    }

    pub fn transaction(sender: impl Into<String>, tx: &Transaction) -> Result<Self> {
        Ok(Self::new(
            sender,
            ContentType::Transaction,
            serde_json::to_value(tx)?,
        ))
    }

    pub fn decode_shard_block(&self) -> Result<ShardBlock> {
        self.decode(ContentType::ShardBlock)
    }

    pub fn decode_main_block(&self) -> Result<MainBlock> {
        self.decode(ContentType::MainBlock)
    }

    pub fn decode_control(&self) -> Result<ControlMessage> {
        self.decode(ContentType::Control)
    }

    pub fn decode_transaction(&self) -> Result<Transaction> {
        self.decode(ContentType::Transaction)
    }

    fn decode<T: serde::de::DeserializeOwned>(&self, expected: ContentType) -> Result<T> {
        if self.content_type != expected {
            return Err(SsamError::Protocol(format!(
                "expected {:?} content, got {:?}",
                expected, self.content_type
            )));
        }
        serde_json::from_value(self.content.clone())
            .map_err(|e| SsamError::Protocol(format!("malformed {:?} payload: {}", expected, e)))
    }

    /// Serializes to a single line terminated by `\n`, ready to write
    /// to the wire.
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    pub fn from_line(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim_end())
            .map_err(|e| SsamError::Protocol(format!("undecodable JSON message: {}", e)))
    }
}
