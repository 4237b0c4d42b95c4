//! AI Discovery Deck — core library.
//! Slide catalog, session controller, chat widget, transcript store, completion gateway
//! and the document export pipeline shared by the gateway and the presenter.

pub mod chat;
pub mod client;
pub mod completion;
pub mod config;
pub mod error;
pub mod export;
pub mod prompts;
pub mod session;
pub mod slides;
pub mod transcript;

pub use chat::{ChatState, ChatWidget, FailedTurnPolicy};
pub use client::{DeckApi, HttpDeckClient, SummarizeRequest};
pub use completion::{CompletionBackend, CompletionGateway, OpenAiBackend, MISSING_API_KEY};
pub use config::DeckConfig;
pub use error::{DeckError, Result};
pub use export::{ExportPipeline, ExportedDocument, EXPORT_FILE_NAME};
pub use session::{Key, NavOutcome, SessionContext};
pub use slides::{default_deck, Deck, Slide};
pub use transcript::{ChatTurn, Role, TranscriptStore};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
