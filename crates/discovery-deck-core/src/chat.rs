//! Chat widget state machine.
//!
//! ```text
//! idle ──submit──▶ awaiting-response ──ok──▶ answered
//!                         │
//!                         └──err──▶ errored
//! (any) ──clear──▶ idle   (transcript emptied)
//! ```
//!
//! The user turn is written to the transcript as soon as the request starts, tagged
//! pending, and settled when the response arrives. Each request carries the widget
//! generation at submit time; `clear` bumps the generation so a late response is dropped.

use crate::client::DeckApi;
use crate::error::{DeckError, Result};
use crate::prompts::chat_prompt_or_default;
use crate::transcript::{ChatTurn, TranscriptStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    AwaitingResponse,
    Answered(String),
    Errored(String),
}

/// What happens to the user turn when its request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailedTurnPolicy {
    /// Keep the question in the transcript, unanswered.
    #[default]
    Keep,
    /// Remove the question from the transcript.
    Discard,
}

/// Handle for an in-flight request, returned by [`ChatWidget::begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChat {
    pub prompt: String,
    generation: u64,
}

/// Outcome of [`ChatWidget::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Applied,
    /// The widget was cleared while the request was in flight.
    Stale,
}

pub struct ChatWidget {
    store: TranscriptStore,
    state: ChatState,
    input: String,
    generation: u64,
    policy: FailedTurnPolicy,
}

impl ChatWidget {
    pub fn new(store: TranscriptStore) -> Self {
        Self {
            store,
            state: ChatState::Idle,
            input: String::new(),
            generation: 0,
            policy: FailedTurnPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailedTurnPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state == ChatState::AwaitingResponse
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
    }

    pub fn transcript(&self) -> Result<Vec<ChatTurn>> {
        self.store.load()
    }

    /// Start a request for the current input (or the canned prompt if empty).
    pub fn begin(&mut self) -> Result<PendingChat> {
        if self.is_busy() {
            return Err(DeckError::Busy("chat request"));
        }
        let prompt = chat_prompt_or_default(Some(&self.input)).to_string();
        self.store.append(ChatTurn::pending_user(prompt.clone()))?;
        self.state = ChatState::AwaitingResponse;
        tracing::debug!(generation = self.generation, "chat: request started");
        Ok(PendingChat { prompt, generation: self.generation })
    }

    /// Apply a response. Responses from before the last `clear` are ignored.
    pub fn complete(&mut self, pending: PendingChat, result: Result<String>) -> Result<Settled> {
        if pending.generation != self.generation {
            tracing::debug!(
                request = pending.generation,
                current = self.generation,
                "chat: dropping stale response"
            );
            return Ok(Settled::Stale);
        }
        let written = match &result {
            Ok(answer) => self
                .store
                .promote_pending()
                .and_then(|_| self.store.append(ChatTurn::assistant(answer.clone())).map(|_| ())),
            Err(_) => match self.policy {
                FailedTurnPolicy::Keep => self.store.promote_pending(),
                FailedTurnPolicy::Discard => self.store.discard_pending(),
            },
        };
        self.check_written(written)?;
        self.state = match result {
            Ok(answer) => ChatState::Answered(answer),
            Err(e) => {
                let msg = e.to_string();
                let msg = if msg.is_empty() { "Something went wrong".to_string() } else { msg };
                tracing::warn!("chat: request failed: {}", msg);
                ChatState::Errored(msg)
            }
        };
        Ok(Settled::Applied)
    }

    /// A failed transcript write ends the request in `Errored` so the widget is usable again.
    fn check_written(&mut self, written: Result<()>) -> Result<()> {
        if let Err(e) = written {
            tracing::error!("chat: transcript write failed: {}", e);
            self.state = ChatState::Errored(e.to_string());
            return Err(e);
        }
        Ok(())
    }

    /// Submit the current input and wait for the answer.
    pub async fn submit(&mut self, api: &dyn DeckApi) -> Result<&ChatState> {
        let pending = self.begin()?;
        let result = api.chat(&pending.prompt).await;
        self.complete(pending, result)?;
        Ok(&self.state)
    }

    /// Back to idle: input, answer and error emptied, transcript removed.
    pub fn clear(&mut self) -> Result<()> {
        self.generation += 1;
        self.input.clear();
        self.state = ChatState::Idle;
        self.store.clear()
    }
}
