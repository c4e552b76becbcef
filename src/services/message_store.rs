use std::collections::BTreeMap;

use crate::{
    constants::KEY_CHAT_MESSAGES,
    db::Database,
    error::{AppError, Result},
    models::{Identity, Message, Payload},
};

/// Append-only public chat log. The whole log is rewritten to the store
/// after every change.
pub struct MessageStore {
    db: Database,
    messages: Vec<Message>,
    last_id: i64,
}

impl MessageStore {
    pub async fn load(db: Database) -> Result<Self> {
        let messages: Vec<Message> = match db.get_item(KEY_CHAT_MESSAGES).await? {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)?,
            _ => Vec::new(),
        };
        let last_id = messages
            .iter()
            .filter_map(|message| message.id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);
        tracing::debug!("Loaded {} chat message(s)", messages.len());

        Ok(Self {
            db,
            messages,
            last_id,
        })
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == message_id)
    }

    pub async fn post_emoji(
        &mut self,
        author: &Identity,
        emoji: &str,
        reply_to: Option<&str>,
        now_ms: i64,
    ) -> Result<Message> {
        let emoji = emoji.trim();
        if emoji.is_empty() {
            return Err(AppError::BadRequest("emoji is required".to_string()));
        }
        self.append(author, Payload::Emoji(emoji.to_string()), reply_to, now_ms)
            .await
    }

    /// Text is reserved for unlocked identities. Locked authors and blank
    /// text are ignored (`None`).
    pub async fn post_text(
        &mut self,
        author: &Identity,
        text: &str,
        reply_to: Option<&str>,
        now_ms: i64,
    ) -> Result<Option<Message>> {
        if !author.has_access() || text.trim().is_empty() {
            return Ok(None);
        }
        self.append(author, Payload::Text(text.to_string()), reply_to, now_ms)
            .await
            .map(Some)
    }

    pub async fn toggle_reaction(
        &mut self,
        message_id: &str,
        emoji: &str,
        actor: &str,
    ) -> Result<Message> {
        let emoji = emoji.trim();
        if emoji.is_empty() {
            return Err(AppError::BadRequest("emoji is required".to_string()));
        }
        let message = self
            .messages
            .iter_mut()
            .find(|message| message.id == message_id)
            .ok_or_else(|| AppError::NotFound(format!("Message {message_id} not found")))?;

        let added = message.toggle_reaction(emoji, actor);
        let updated = message.clone();
        tracing::debug!(
            "{} {} {} on {}",
            actor,
            if added { "added" } else { "removed" },
            emoji,
            message_id
        );

        self.persist().await?;
        Ok(updated)
    }

    async fn append(
        &mut self,
        author: &Identity,
        payload: Payload,
        reply_to: Option<&str>,
        now_ms: i64,
    ) -> Result<Message> {
        let reply_to = match reply_to {
            Some(id) => Some(
                self.get(id)
                    .ok_or_else(|| AppError::NotFound(format!("Message {id} not found")))?
                    .reply_reference(),
            ),
            None => None,
        };

        let message = Message {
            id: self.next_id(now_ms),
            sender: author.display_name(),
            timestamp: now_ms,
            payload,
            reactions: BTreeMap::new(),
            reply_to,
        };

        self.messages.push(message.clone());
        self.persist().await?;
        Ok(message)
    }

    /// Time-derived ids, bumped past the last issued id so two posts in
    /// the same millisecond never collide.
    fn next_id(&mut self, now_ms: i64) -> String {
        self.last_id = now_ms.max(self.last_id + 1);
        self.last_id.to_string()
    }

    async fn persist(&self) -> Result<()> {
        let raw = serde_json::to_string(&self.messages)?;
        self.db.set_item(KEY_CHAT_MESSAGES, &raw).await
    }
}
