//! TelegramNotifier against a local fake Bot API.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use serde_json::{Value, json};

use octorelay_common::error::RelayError;
use octorelay_notifier::{Notifier, TelegramNotifier};

const TOKEN: &str = "123:secret";

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

type Inbox = Arc<Mutex<Vec<Value>>>;

async fn accept(State(inbox): State<Inbox>, axum::Json(body): axum::Json<Value>) -> axum::Json<Value> {
    inbox.lock().unwrap().push(body);
    axum::Json(json!({ "ok": true, "result": { "message_id": 1 } }))
}

#[tokio::test]
async fn test_send_posts_chat_id_and_text() {
    let inbox = Inbox::default();
    let app = Router::new()
        .route("/bot123:secret/sendMessage", post(accept))
        .with_state(inbox.clone());
    let base = serve(app).await;

    let notifier = TelegramNotifier::new(reqwest::Client::new(), &base, TOKEN);
    notifier.send("-1001", "Fix bug (org/repo)").await.unwrap();

    let received = inbox.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["chat_id"], "-1001");
    assert_eq!(received[0]["text"], "Fix bug (org/repo)");
}

#[tokio::test]
async fn test_rejected_message_is_delivery_error() {
    let app = Router::new().route(
        "/bot123:secret/sendMessage",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({
                    "ok": false,
                    "error_code": 400,
                    "description": "Bad Request: chat not found"
                })),
            )
        }),
    );
    let base = serve(app).await;

    let notifier = TelegramNotifier::new(reqwest::Client::new(), &base, TOKEN);
    let err = notifier.send("nope", "hello").await.unwrap_err();

    match err {
        RelayError::Delivery(msg) => assert!(msg.contains("chat not found")),
        other => panic!("expected delivery error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit_carries_retry_hint() {
    let app = Router::new().route(
        "/bot123:secret/sendMessage",
        post(|| async {
            (
                StatusCode::TOO_MANY_REQUESTS,
                axum::Json(json!({
                    "ok": false,
                    "error_code": 429,
                    "description": "Too Many Requests: retry after 7",
                    "parameters": { "retry_after": 7 }
                })),
            )
        }),
    );
    let base = serve(app).await;

    let notifier = TelegramNotifier::new(reqwest::Client::new(), &base, TOKEN);
    let err = notifier.send("-1001", "hello").await.unwrap_err();
    assert!(err.to_string().contains("retry after 7s"));
}

#[tokio::test]
async fn test_non_json_error_is_delivery_error() {
    let app = Router::new().route(
        "/bot123:secret/sendMessage",
        post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
    );
    let base = serve(app).await;

    let notifier = TelegramNotifier::new(reqwest::Client::new(), &base, TOKEN);
    let err = notifier.send("-1001", "hello").await.unwrap_err();
    assert!(matches!(err, RelayError::Delivery(_)));
}

#[tokio::test]
async fn test_transport_error_hides_token() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let notifier = TelegramNotifier::new(reqwest::Client::new(), &format!("http://{addr}"), TOKEN);
    let err = notifier.send("-1001", "hello").await.unwrap_err();

    assert!(matches!(err, RelayError::Delivery(_)));
    assert!(!err.to_string().contains("secret"));
}
