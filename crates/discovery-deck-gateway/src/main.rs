//! AI Discovery Deck Gateway — proxies the deck's chat demo and workshop summary
//! to the completion API. The API key stays here; clients never see it.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use discovery_deck_core::client::{
    ChatRequestBody, ChatResponseBody, ErrorBody, SummarizeRequest, SummaryResponseBody,
};
use discovery_deck_core::prompts::SUMMARY_FAILED;
use discovery_deck_core::slides::{COMPARISON_HEADERS, COMPARISON_ROWS, USE_CASE_OPTIONS};
use discovery_deck_core::{CompletionGateway, Deck, DeckConfig};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
struct AppState {
    gateway: CompletionGateway,
    deck: Arc<Deck>,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(message: impl Into<String>) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody { error: message.into() }),
    )
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[deck-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match DeckConfig::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config: {}", e);
            std::process::exit(1);
        }
    };
    if config.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; /chat and /summarize will report errors until it is");
    }

    let state = AppState {
        gateway: CompletionGateway::from_config(&config),
        deck: Arc::new(Deck::default()),
    };

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("deck gateway listening on {}", addr);

    if let Err(e) = axum::serve(listener, app(state)).await {
        tracing::error!("server: {}", e);
    }
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/slides", get(slides_handler))
        .route("/chat", post(chat_handler))
        .route("/summarize", post(summarize_handler))
        .with_state(state)
        .layer(axum::middleware::from_fn(log_request))
}

async fn log_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    tracing::info!(%method, %path, status = response.status().as_u16(), "request");
    response
}

async fn health() -> &'static str {
    "OK"
}

/// Slide catalog plus the comparison table and the selectable use cases.
async fn slides_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "slides": state.deck.slides,
        "demoIndex": state.deck.demo_index,
        "notesIndex": state.deck.notes_index,
        "comparison": {
            "headers": COMPARISON_HEADERS,
            "rows": COMPARISON_ROWS,
        },
        "useCases": USE_CASE_OPTIONS,
    }))
}

/// JSON request body; an empty body means "all fields absent".
fn parse_body<T: DeserializeOwned + Default>(bytes: &[u8]) -> Result<T, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes)
}

/// POST /chat: `{prompt?}` → `{answer}`. Upstream failures echo their message.
async fn chat_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatResponseBody>, ApiError> {
    let req: ChatRequestBody = parse_body(&body).map_err(|e| {
        tracing::warn!("chat: rejected request body: {}", e);
        api_error(format!("Invalid request body: {}", e))
    })?;
    let answer = state
        .gateway
        .converse(req.prompt.as_deref())
        .await
        .map_err(|e| api_error(e.to_string()))?;
    Ok(Json(ChatResponseBody { answer }))
}

/// POST /summarize: notes + selected use cases → markdown summary.
async fn summarize_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SummaryResponseBody>, ApiError> {
    let req: SummarizeRequest = parse_body(&body).map_err(|e| {
        tracing::warn!("summarize: rejected request body: {}", e);
        api_error(SUMMARY_FAILED)
    })?;
    tracing::debug!(
        slides = req.slides.len(),
        transcript_bytes = req.transcript_text().map(str::len).unwrap_or(0),
        "summarize: request context"
    );
    let summary = state
        .gateway
        .summarize(&req.icebreaker_notes, &req.selected_use_cases)
        .await
        .map_err(|e| api_error(e.to_string()))?;
    Ok(Json(SummaryResponseBody { summary }))
}
