use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ==================== CHAT ====================
/// Either an emoji glyph or free text, never both.
///
/// Externally tagged so that a flattened payload serializes as a single
/// `"emoji": ...` or `"text": ...` field on the owning message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    #[serde(rename = "emoji")]
    Emoji(String),
    #[serde(rename = "text")]
    Text(String),
}

impl Payload {
    pub fn as_str(&self) -> &str {
        match self {
            Payload::Emoji(value) | Payload::Text(value) => value,
        }
    }
}

/// Snapshot of the message being replied to, taken at send time.
///
/// Older logs store replies to text messages as `{id, sender}` only, so the
/// payload may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyReference {
    pub id: String,
    #[serde(flatten)]
    pub payload: Option<Payload>,
    pub sender: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: String,
    pub timestamp: i64,
    #[serde(flatten)]
    pub payload: Payload,
    #[serde(default)]
    pub reactions: BTreeMap<String, BTreeSet<String>>,
    #[serde(rename = "replyTo", default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyReference>,
}

impl Message {
    pub fn reply_reference(&self) -> ReplyReference {
        ReplyReference {
            id: self.id.clone(),
            payload: Some(self.payload.clone()),
            sender: self.sender.clone(),
        }
    }

    /// Adds `actor` under `emoji`, or removes them if already present.
    /// Returns true when the reaction was added.
    pub fn toggle_reaction(&mut self, emoji: &str, actor: &str) -> bool {
        let users = self.reactions.entry(emoji.to_string()).or_default();
        let added = if users.remove(actor) {
            false
        } else {
            users.insert(actor.to_string());
            true
        };
        if users.is_empty() {
            self.reactions.remove(emoji);
        }
        added
    }

    pub fn reaction_count(&self, emoji: &str) -> usize {
        self.reactions.get(emoji).map(BTreeSet::len).unwrap_or(0)
    }
}
