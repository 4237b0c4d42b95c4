//! HttpDeckClient against a throwaway axum server standing in for the gateway.

use axum::{http::StatusCode, routing::post, Json, Router};
use discovery_deck_core::client::{ChatRequestBody, SummarizeRequest};
use discovery_deck_core::{DeckApi, DeckError, HttpDeckClient};
use serde_json::{json, Value};

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn chat_and_summarize_round_trip() {
    let app = Router::new()
        .route(
            "/chat",
            post(|Json(body): Json<ChatRequestBody>| async move {
                Json(json!({ "answer": format!("re: {}", body.prompt.unwrap_or_default()) }))
            }),
        )
        .route(
            "/summarize",
            post(|Json(body): Json<SummarizeRequest>| async move {
                Json(json!({ "summary": body.selected_use_cases.join(",") }))
            }),
        );
    let client = HttpDeckClient::new(&spawn(app).await);

    assert_eq!(client.chat("hi").await.unwrap(), "re: hi");
    let req = SummarizeRequest::new("", vec!["HR".into(), "Education".into()]);
    assert_eq!(client.summarize(&req).await.unwrap(), "HR,Education");
}

#[tokio::test]
async fn error_status_becomes_api_error() {
    let app = Router::new().route(
        "/chat",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Missing OPENAI_API_KEY" })),
            )
        }),
    );
    let client = HttpDeckClient::new(&spawn(app).await);

    let err = client.chat("hi").await.unwrap_err();
    assert!(matches!(err, DeckError::Network(_)));
    assert_eq!(err.to_string(), "API error: 500");
}

#[tokio::test]
async fn unreachable_gateway_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = HttpDeckClient::new(&format!("http://{}", addr));

    let err = client.summarize(&SummarizeRequest::default()).await.unwrap_err();
    assert!(matches!(err, DeckError::Network(_)));
}

#[tokio::test]
async fn unexpected_body_is_reported() {
    let app = Router::new().route("/chat", post(|| async { Json(Value::Null) }));
    let client = HttpDeckClient::new(&spawn(app).await);
    assert!(client.chat("hi").await.is_err());
}
