//! Deck Presenter: terminal front end for the AI Discovery Deck.
//! Drives one session against a running gateway (or in-process with `--local`).
//! Run with: cargo run --bin deck-presenter [-- --local]

use discovery_deck_core::slides::{SlideLine, COMPARISON_HEADERS, COMPARISON_ROWS, USE_CASE_OPTIONS};
use discovery_deck_core::{
    ChatState, ChatWidget, CompletionGateway, DeckApi, DeckConfig, DeckError, ExportPipeline,
    HttpDeckClient, Key, NavOutcome, SessionContext, TranscriptStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
Commands:
  <enter> | n | right     next slide (enter is ignored while typing notes)
  p | left                previous slide
  focus / blur            start / stop typing into the icebreaker notes
  note <text>             set the icebreaker notes (Icebreaker slide)
  toggle <use case>       select / deselect a use case (HR, Education, Personal productivity)
  ask [prompt]            run the chat demo (Live Demo slide); empty uses the sample prompt
  clear                   clear the chat and its transcript
  import <file>           replace the stored transcript with a JSON file
  export                  generate the summary document
  show | help | quit";

struct Presenter {
    session: SessionContext,
    chat: ChatWidget,
    store: TranscriptStore,
    api: Box<dyn DeckApi>,
    export: ExportPipeline,
    export_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match DeckConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[presenter] config: {}", e);
            std::process::exit(1);
        }
    };

    let local = std::env::args().any(|a| a == "--local");
    let api: Box<dyn DeckApi> = if local {
        Box::new(CompletionGateway::from_config(&config))
    } else {
        Box::new(HttpDeckClient::new(&config.gateway_url))
    };

    let store = match TranscriptStore::open(config.transcript_path()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[presenter] {}", e);
            std::process::exit(1);
        }
    };

    let mut presenter = Presenter {
        session: SessionContext::new(Arc::new(Default::default())),
        chat: ChatWidget::new(store.clone()),
        store,
        api,
        export: ExportPipeline::new(&config.reference_image),
        export_dir: PathBuf::from(&config.export_dir),
    };

    println!("AI Discovery Deck {} ({})", discovery_deck_core::version(), if local { "local" } else { config.gateway_url.as_str() });
    println!("{}\n", HELP);
    presenter.show();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(l)) => l,
            Ok(None) => break,
            Err(e) => {
                eprintln!("[presenter] stdin: {}", e);
                break;
            }
        };
        if !presenter.handle(line.trim_end()).await {
            break;
        }
    }
}

impl Presenter {
    /// Returns false on quit.
    async fn handle(&mut self, line: &str) -> bool {
        let (cmd, arg) = match line.split_once(' ') {
            Some((c, a)) => (c, a.trim()),
            None => (line, ""),
        };
        match cmd {
            "" => self.key(Key::Space).await,
            "n" | "right" => self.key(Key::ArrowRight).await,
            "p" | "left" => self.key(Key::ArrowLeft).await,
            "focus" => {
                self.session.focus_notes(true);
                if !self.session.notes_focused() {
                    println!("Notes can only be typed on the Icebreaker slide.");
                }
            }
            "blur" => self.session.focus_notes(false),
            "note" => {
                if self.session.index() == self.session.deck().notes_index {
                    self.session.set_notes(arg);
                    println!("Notes saved.");
                } else {
                    println!("Notes can only be typed on the Icebreaker slide.");
                }
            }
            "toggle" => match self.session.toggle_option(arg) {
                Ok(true) => println!("Selected {}.", arg),
                Ok(false) => println!("Deselected {}.", arg),
                Err(e) => println!("{}", e),
            },
            "ask" => self.ask(arg).await,
            "clear" => match self.chat.clear() {
                Ok(()) => println!("Chat cleared."),
                Err(e) => println!("{}", e),
            },
            "import" => self.import(arg),
            "export" => self.run_export().await,
            "show" => self.show(),
            "help" => println!("{}", HELP),
            "quit" | "exit" | "q" => return false,
            other => println!("Unknown command: {} (try help)", other),
        }
        true
    }

    async fn key(&mut self, key: Key) {
        let transcript = self.store.load().unwrap_or_default();
        if self.session.index() == self.session.deck().demo_index && key != Key::ArrowLeft {
            println!("Preparing transcript...");
        }
        match self.session.handle_key(key, &*self.api, &transcript).await {
            Some(NavOutcome::Moved { .. }) => self.show(),
            Some(NavOutcome::Clamped(_)) => println!("(no more slides that way)"),
            Some(NavOutcome::Blocked) => println!("(busy)"),
            None => {}
        }
    }

    async fn ask(&mut self, prompt: &str) {
        if self.session.index() != self.session.deck().demo_index {
            println!("The chat demo lives on the Live Demo slide.");
            return;
        }
        self.chat.set_input(prompt);
        println!("Asking...");
        match self.chat.submit(&*self.api).await {
            Ok(ChatState::Answered(answer)) => println!("\n{}\n", answer),
            Ok(ChatState::Errored(msg)) => println!("Error: {}", msg),
            Ok(_) => {}
            Err(e) => println!("{}", e),
        }
    }

    fn import(&self, path: &str) {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                println!("Could not read {}: {}", path, e);
                return;
            }
        };
        if let Err(e) = self.store.put_raw(&bytes) {
            println!("{}", e);
            return;
        }
        let turns = self.store.load().unwrap_or_default();
        tracing::info!(path, turns = turns.len(), "presenter: transcript imported");
        println!("Imported {} turns.", turns.len());
    }

    async fn run_export(&mut self) {
        println!("Generating summary...");
        let doc = match self.export.export(&mut self.session, &*self.api, &self.store).await {
            Ok(d) => d,
            Err(DeckError::Busy(what)) => {
                println!("{} is already running.", what);
                return;
            }
            Err(e) => {
                println!("Export failed: {}", e);
                return;
            }
        };
        let path = self.export_dir.join(&doc.file_name);
        match std::fs::write(&path, &doc.bytes) {
            Ok(()) => println!(
                "Saved {} ({} pages, {} exchanges{}).",
                path.display(),
                doc.pages,
                doc.exchanges,
                if doc.image_embedded { ", with image" } else { "" }
            ),
            Err(e) => println!("Could not write {}: {}", path.display(), e),
        }
    }

    fn show(&self) {
        let Some(slide) = self.session.current() else {
            println!("(the deck is empty)");
            return;
        };
        let (progress, _) = self.session.progress();
        println!("==== {} ====  [{}]", slide.title, progress);
        for line in slide.lines() {
            match line {
                SlideLine::Bullet(t) => println!("  • {}", t),
                SlideLine::Link { text, url } => println!("  {} <{}>", text, url),
                SlideLine::Url(u) => println!("  <{}>", u),
                SlideLine::Text(t) => println!("{}", t),
            }
        }
        if slide.table {
            println!();
            println!("  {:<10} | {:<22} | {}", COMPARISON_HEADERS[0], COMPARISON_HEADERS[1], COMPARISON_HEADERS[2]);
            for row in COMPARISON_ROWS {
                println!("  {:<10} | {:<22} | {}", row.feature, row.subscription, row.api);
            }
        }
        if let Some(img) = &slide.image {
            println!("  [image: {}]", img);
        }
        if self.session.index() == self.session.deck().notes_index {
            println!("\n  Notes: {}", if self.session.notes().is_empty() { "(none)" } else { self.session.notes() });
        }
        if self.session.index() == self.session.deck().demo_index {
            println!("\n  Chat demo: ask <prompt>  |  clear");
        }
        if slide.title == "Practical Applications" {
            let selected = self.session.selected();
            for opt in USE_CASE_OPTIONS {
                let mark = if selected.iter().any(|s| s == opt.id) { "x" } else { " " };
                println!("  [{}] {} — {}", mark, opt.id, opt.description);
            }
        }
        println!();
    }
}
