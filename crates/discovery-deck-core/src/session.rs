//! Slide session controller.
//!
//! A [`SessionContext`] owns everything one presenter session mutates: the slide index,
//! icebreaker notes, the selected use cases, the notes-focus flag and the busy flags.
//! It lives as long as the session and is passed explicitly to whoever needs it.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::client::{DeckApi, SummarizeRequest};
use crate::error::{DeckError, Result};
use crate::slides::{is_known_option, Deck, Slide};
use crate::transcript::ChatTurn;

/// Navigation keys the controller understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowRight,
    ArrowLeft,
    Space,
    Other(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Advance,
    Retreat,
}

/// Space pages forward unless the notes field is being typed into; arrows always navigate.
pub fn nav_for_key(key: Key, notes_focused: bool) -> Option<Nav> {
    match key {
        Key::ArrowRight => Some(Nav::Advance),
        Key::ArrowLeft => Some(Nav::Retreat),
        Key::Space if !notes_focused => Some(Nav::Advance),
        Key::Space | Key::Other(_) => None,
    }
}

/// Result of the best-effort summary priming. Never an error: failures are swallowed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimingOutcome {
    Primed,
    Swallowed(String),
}

/// Fire the priming summary request and swallow its failure.
pub async fn prime_summary(api: &dyn DeckApi, request: &SummarizeRequest) -> PrimingOutcome {
    match api.summarize(request).await {
        Ok(_) => {
            tracing::debug!("session: summary primed");
            PrimingOutcome::Primed
        }
        Err(e) => {
            tracing::debug!("session: summary priming failed (ignored): {}", e);
            PrimingOutcome::Swallowed(e.to_string())
        }
    }
}

/// Result of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    Moved { from: usize, to: usize },
    /// Already at the boundary; index unchanged.
    Clamped(usize),
    /// A busy flag is set; nothing happened.
    Blocked,
}

pub struct SessionContext {
    deck: Arc<Deck>,
    index: usize,
    notes: String,
    selected: BTreeSet<String>,
    notes_focused: bool,
    exporting: bool,
}

impl SessionContext {
    pub fn new(deck: Arc<Deck>) -> Self {
        Self {
            deck,
            index: 0,
            notes: String::new(),
            selected: BTreeSet::new(),
            notes_focused: false,
            exporting: false,
        }
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// `None` only for an empty deck.
    pub fn current(&self) -> Option<&Slide> {
        self.deck.get(self.index)
    }

    /// "Slide i / N" label and completed fraction.
    pub fn progress(&self) -> (String, f32) {
        let n = self.deck.len();
        if n == 0 {
            return ("Slide 0 / 0".to_string(), 0.0);
        }
        let label = format!("Slide {} / {}", self.index + 1, n);
        (label, (self.index + 1) as f32 / n as f32)
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.notes = notes.to_string();
    }

    pub fn focus_notes(&mut self, focused: bool) {
        self.notes_focused = focused && self.index == self.deck.notes_index;
    }

    pub fn notes_focused(&self) -> bool {
        self.notes_focused
    }

    /// Selected use cases in stable (sorted) order.
    pub fn selected(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    /// Toggle an option; returns whether it is now selected.
    pub fn toggle_option(&mut self, id: &str) -> Result<bool> {
        if !is_known_option(id) {
            return Err(DeckError::UnknownOption(id.to_string()));
        }
        if self.selected.remove(id) {
            Ok(false)
        } else {
            self.selected.insert(id.to_string());
            Ok(true)
        }
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    pub fn is_busy(&self) -> bool {
        self.exporting
    }

    pub(crate) fn set_exporting(&mut self, exporting: bool) {
        self.exporting = exporting;
    }

    /// Summary request for the current session state.
    pub fn summary_request(&self, transcript: &[ChatTurn]) -> SummarizeRequest {
        let transcript = serde_json::to_string(transcript).ok();
        SummarizeRequest::new(&self.notes, self.selected())
            .with_slides(&self.deck.slides)
            .with_transcript(transcript)
    }

    /// Move forward one slide. Leaving the demo slide first runs the priming call;
    /// its failure never blocks navigation. The `&mut self` borrow held across the
    /// priming await is what keeps other navigation out until it settles.
    pub async fn advance(&mut self, api: &dyn DeckApi, transcript: &[ChatTurn]) -> NavOutcome {
        if self.is_busy() {
            return NavOutcome::Blocked;
        }
        if self.index == self.deck.demo_index {
            let request = self.summary_request(transcript);
            let outcome = prime_summary(api, &request).await;
            tracing::info!(?outcome, "session: left demo slide");
        }
        self.step(Nav::Advance)
    }

    /// Move back one slide.
    pub fn retreat(&mut self) -> NavOutcome {
        if self.is_busy() {
            return NavOutcome::Blocked;
        }
        self.step(Nav::Retreat)
    }

    /// Keyboard navigation; `None` when the key does not navigate.
    pub async fn handle_key(&mut self, key: Key, api: &dyn DeckApi, transcript: &[ChatTurn]) -> Option<NavOutcome> {
        match nav_for_key(key, self.notes_focused)? {
            Nav::Advance => Some(self.advance(api, transcript).await),
            Nav::Retreat => Some(self.retreat()),
        }
    }

    fn step(&mut self, nav: Nav) -> NavOutcome {
        let from = self.index;
        let to = match nav {
            Nav::Advance => (from + 1).min(self.deck.last_index()),
            Nav::Retreat => from.saturating_sub(1),
        };
        if to == from {
            return NavOutcome::Clamped(from);
        }
        self.index = to;
        if to != self.deck.notes_index {
            self.notes_focused = false;
        }
        tracing::debug!(from, to, "session: slide changed");
        NavOutcome::Moved { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slides::default_deck;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingApi {
        summaries: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl DeckApi for CountingApi {
        async fn chat(&self, _prompt: &str) -> Result<String> {
            Ok(String::new())
        }

        async fn summarize(&self, _request: &SummarizeRequest) -> Result<String> {
            self.summaries.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DeckError::Network("API error: 500".into()))
            } else {
                Ok("ok".into())
            }
        }
    }

    fn session() -> SessionContext {
        SessionContext::new(Arc::new(default_deck()))
    }

    #[tokio::test]
    async fn index_stays_in_bounds() {
        let api = CountingApi::default();
        let mut s = session();
        assert_eq!(s.retreat(), NavOutcome::Clamped(0));
        for _ in 0..20 {
            s.advance(&api, &[]).await;
            assert!(s.index() < s.deck().len());
        }
        assert_eq!(s.index(), 5);
        assert_eq!(s.advance(&api, &[]).await, NavOutcome::Clamped(5));
        for _ in 0..20 {
            s.retreat();
        }
        assert_eq!(s.index(), 0);
    }

    #[tokio::test]
    async fn leaving_demo_slide_primes_once_even_on_failure() {
        let api = CountingApi { fail: true, ..Default::default() };
        let mut s = session();
        for _ in 0..4 {
            s.advance(&api, &[]).await;
        }
        assert_eq!(api.summaries.load(Ordering::SeqCst), 0);
        assert_eq!(s.index(), 4);
        assert_eq!(s.advance(&api, &[]).await, NavOutcome::Moved { from: 4, to: 5 });
        assert_eq!(api.summaries.load(Ordering::SeqCst), 1);
        assert!(!s.is_busy());
    }

    #[tokio::test]
    async fn prime_summary_swallows() {
        let api = CountingApi { fail: true, ..Default::default() };
        let outcome = prime_summary(&api, &SummarizeRequest::default()).await;
        assert_eq!(outcome, PrimingOutcome::Swallowed("API error: 500".into()));
    }

    #[tokio::test]
    async fn busy_blocks_navigation() {
        let api = CountingApi::default();
        let mut s = session();
        s.advance(&api, &[]).await;
        s.set_exporting(true);
        assert_eq!(s.retreat(), NavOutcome::Blocked);
        assert_eq!(s.advance(&api, &[]).await, NavOutcome::Blocked);
        s.set_exporting(false);
        assert_eq!(s.retreat(), NavOutcome::Moved { from: 1, to: 0 });
    }

    #[test]
    fn space_suppressed_while_typing_notes() {
        assert_eq!(nav_for_key(Key::Space, false), Some(Nav::Advance));
        assert_eq!(nav_for_key(Key::Space, true), None);
        assert_eq!(nav_for_key(Key::ArrowRight, true), Some(Nav::Advance));
        assert_eq!(nav_for_key(Key::ArrowLeft, true), Some(Nav::Retreat));
        assert_eq!(nav_for_key(Key::Other('n'), false), None);
    }

    #[tokio::test]
    async fn handle_key_respects_focus() {
        let api = CountingApi::default();
        let mut s = session();
        s.focus_notes(true);
        assert!(s.notes_focused());
        assert_eq!(s.handle_key(Key::Space, &api, &[]).await, None);
        assert_eq!(s.index(), 0);
        assert_eq!(
            s.handle_key(Key::ArrowRight, &api, &[]).await,
            Some(NavOutcome::Moved { from: 0, to: 1 })
        );
        assert!(!s.notes_focused());
    }

    #[tokio::test]
    async fn empty_deck_has_no_current_slide() {
        let api = CountingApi::default();
        let deck = Deck { slides: Vec::new(), demo_index: 0, notes_index: 0 };
        let mut s = SessionContext::new(Arc::new(deck));
        assert!(s.current().is_none());
        assert_eq!(s.progress(), ("Slide 0 / 0".to_string(), 0.0));
        assert_eq!(s.retreat(), NavOutcome::Clamped(0));
        assert_eq!(s.advance(&api, &[]).await, NavOutcome::Clamped(0));
        assert!(s.current().is_none());
    }

    #[test]
    fn toggle_options() {
        let mut s = session();
        assert!(s.toggle_option("HR").unwrap());
        assert!(s.toggle_option("Education").unwrap());
        assert!(!s.toggle_option("HR").unwrap());
        assert_eq!(s.selected(), vec!["Education".to_string()]);
        assert!(matches!(s.toggle_option("Finance"), Err(DeckError::UnknownOption(_))));
    }

    #[test]
    fn summary_request_carries_state() {
        let mut s = session();
        s.set_notes("curious about AI");
        s.toggle_option("HR").unwrap();
        let req = s.summary_request(&[ChatTurn::user("hi"), ChatTurn::assistant("hello")]);
        assert_eq!(req.icebreaker_notes, "curious about AI");
        assert_eq!(req.selected_use_cases, vec!["HR".to_string()]);
        assert_eq!(req.slides.len(), 6);
        assert!(req.transcript.unwrap().contains("hello"));
        assert_eq!(s.progress().0, "Slide 1 / 6");
    }
}
