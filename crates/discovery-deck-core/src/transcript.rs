//! Chat transcript: turns, exchange extraction, and the sled-backed store.
//!
//! The store keeps the whole transcript under a single key as a JSON array of
//! `{role, content}` and overwrites it wholesale on every write.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

pub const TRANSCRIPT_KEY: &str = "chatTranscript";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    /// Set while the request for this user turn is in flight.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pending: bool,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), pending: false }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), pending: false }
    }

    pub fn pending_user(content: impl Into<String>) -> Self {
        Self { pending: true, ..Self::user(content) }
    }
}

/// One user turn immediately followed by one assistant turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
}

/// First `limit` user→assistant pairs in order. Unpaired or pending turns are skipped.
pub fn exchanges(turns: &[ChatTurn], limit: usize) -> Vec<Exchange> {
    let mut out = Vec::new();
    let mut i = 0;
    while i + 1 < turns.len() && out.len() < limit {
        let (a, b) = (&turns[i], &turns[i + 1]);
        if a.role == Role::User && b.role == Role::Assistant && !a.pending {
            out.push(Exchange { user: a.content.clone(), assistant: b.content.clone() });
            i += 2;
        } else {
            i += 1;
        }
    }
    out
}

/// Tolerant parse of a stored transcript: absent or malformed data is an empty transcript.
pub fn parse_transcript(raw: Option<&[u8]>) -> Vec<ChatTurn> {
    let Some(bytes) = raw else {
        return Vec::new();
    };
    match serde_json::from_slice::<Vec<ChatTurn>>(bytes) {
        Ok(turns) => turns,
        Err(e) => {
            tracing::warn!("transcript: stored value is not a valid transcript, treating as empty: {}", e);
            Vec::new()
        }
    }
}

/// Persisted transcript. Single writer by convention (the chat widget).
#[derive(Clone)]
pub struct TranscriptStore {
    db: sled::Db,
}

impl TranscriptStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Ephemeral store for tests and one-off sessions.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    pub fn load(&self) -> Result<Vec<ChatTurn>> {
        Ok(parse_transcript(self.load_raw()?.as_deref()))
    }

    pub fn load_raw(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(TRANSCRIPT_KEY)?.map(|v| v.to_vec()))
    }

    /// Overwrite the stored value verbatim (imports, fixtures).
    pub fn put_raw(&self, bytes: &[u8]) -> Result<()> {
        self.db.insert(TRANSCRIPT_KEY, bytes)?;
        self.db.flush()?;
        Ok(())
    }

    /// Append one turn and write the whole transcript back.
    pub fn append(&self, turn: ChatTurn) -> Result<Vec<ChatTurn>> {
        let mut turns = self.load()?;
        turns.push(turn);
        self.persist(&turns)?;
        Ok(turns)
    }

    /// Clear the pending tag on the last pending turn.
    pub fn promote_pending(&self) -> Result<()> {
        let mut turns = self.load()?;
        if let Some(t) = turns.iter_mut().rev().find(|t| t.pending) {
            t.pending = false;
            self.persist(&turns)?;
        }
        Ok(())
    }

    /// Drop the last pending turn.
    pub fn discard_pending(&self) -> Result<()> {
        let mut turns = self.load()?;
        if let Some(pos) = turns.iter().rposition(|t| t.pending) {
            turns.remove(pos);
            if turns.is_empty() {
                return self.clear();
            }
            self.persist(&turns)?;
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.db.remove(TRANSCRIPT_KEY)?;
        self.db.flush()?;
        Ok(())
    }

    /// Wholesale write; an empty transcript is never written.
    fn persist(&self, turns: &[ChatTurn]) -> Result<()> {
        if turns.is_empty() {
            return Ok(());
        }
        let bytes = serde_json::to_vec(turns).map_err(|e| crate::DeckError::Parse(e.to_string()))?;
        self.db.insert(TRANSCRIPT_KEY, bytes)?;
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turns(pairs: &[(Role, &str)]) -> Vec<ChatTurn> {
        pairs
            .iter()
            .map(|(r, c)| ChatTurn { role: *r, content: c.to_string(), pending: false })
            .collect()
    }

    #[test]
    fn exchanges_pair_in_order_and_cap() {
        let t = turns(&[
            (Role::User, "q1"),
            (Role::Assistant, "a1"),
            (Role::User, "q2"),
            (Role::Assistant, "a2"),
            (Role::User, "q3"),
            (Role::Assistant, "a3"),
            (Role::User, "q4"),
            (Role::Assistant, "a4"),
        ]);
        let ex = exchanges(&t, 3);
        assert_eq!(ex.len(), 3);
        assert_eq!(ex[0], Exchange { user: "q1".into(), assistant: "a1".into() });
        assert_eq!(ex[2].assistant, "a3");
    }

    #[test]
    fn exchanges_skip_unpaired() {
        let t = turns(&[
            (Role::User, "lost"),
            (Role::User, "q"),
            (Role::Assistant, "a"),
            (Role::Assistant, "stray"),
            (Role::User, "trailing"),
        ]);
        let ex = exchanges(&t, 3);
        assert_eq!(ex, vec![Exchange { user: "q".into(), assistant: "a".into() }]);
    }

    #[test]
    fn serialized_form_omits_pending_flag() {
        let json = serde_json::to_string(&ChatTurn::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
        let pending = serde_json::to_string(&ChatTurn::pending_user("hi")).unwrap();
        assert!(pending.contains(r#""pending":true"#));
    }

    #[test]
    fn parse_tolerates_garbage() {
        assert!(parse_transcript(None).is_empty());
        assert!(parse_transcript(Some(b"{not json")).is_empty());
        assert!(parse_transcript(Some(br#"[{"role":"robot","content":"x"}]"#)).is_empty());
        let ok = parse_transcript(Some(br#"[{"role":"user","content":"hi"}]"#));
        assert_eq!(ok, vec![ChatTurn::user("hi")]);
    }

    #[test]
    fn append_load_clear() {
        let store = TranscriptStore::temporary().unwrap();
        assert!(store.load().unwrap().is_empty());
        store.append(ChatTurn::user("hi")).unwrap();
        let all = store.append(ChatTurn::assistant("hello")).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(store.load().unwrap(), all);
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
        assert!(store.load_raw().unwrap().is_none());
    }

    #[test]
    fn pending_turn_promote_and_discard() {
        let store = TranscriptStore::temporary().unwrap();
        store.append(ChatTurn::pending_user("q")).unwrap();
        store.promote_pending().unwrap();
        assert_eq!(store.load().unwrap(), vec![ChatTurn::user("q")]);

        store.append(ChatTurn::pending_user("q2")).unwrap();
        store.discard_pending().unwrap();
        assert_eq!(store.load().unwrap(), vec![ChatTurn::user("q")]);

        store.clear().unwrap();
        store.append(ChatTurn::pending_user("only")).unwrap();
        store.discard_pending().unwrap();
        assert!(store.load_raw().unwrap().is_none());
    }

    #[test]
    fn open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::open(dir.path().join("transcript")).unwrap();
        store.append(ChatTurn::user("hi")).unwrap();
        assert_eq!(store.load().unwrap(), vec![ChatTurn::user("hi")]);
    }
}
