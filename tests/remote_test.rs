mod helpers;

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use tramvia::config::RemoteConfig;
use tramvia::context::{ActionResult, ContextBridge};
use tramvia::error::PipelineError;
use tramvia::lang::Lang;
use tramvia::remote::{
    AnswerRequest, RemoteAssistantClient, MAX_EXAMPLES_PER_INTENT, MAX_SERIALIZED_INTENTS,
};

use helpers::intent;

/// Requests captured by the mock endpoint.
type Captured = Arc<Mutex<Vec<Value>>>;

/// Spin up a mock assistant endpoint returning `reply` for every POST, and
/// recording request bodies. Returns the client and the capture buffer.
async fn mock_endpoint(reply: Value) -> (RemoteAssistantClient, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));

    let state = (captured.clone(), reply);
    let app = Router::new()
        .route(
            "/assistant",
            post(
                |State((captured, reply)): State<(Captured, Value)>, Json(body): Json<Value>| async move {
                    captured.lock().unwrap().push(body);
                    Json(reply)
                },
            ),
        )
        .with_state(state);

    let client = serve(app).await;
    (client, captured)
}

/// Serve `app` on an ephemeral port and build a client pointed at it.
async fn serve(app: Router) -> RemoteAssistantClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    RemoteAssistantClient::new(&RemoteConfig {
        endpoint: format!("http://{addr}/assistant"),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn normalize_sends_bounded_intent_serialization() {
    let (client, captured) = mock_endpoint(json!({
        "normalized_text": "donde esta la cochera",
        "suggested_intent": "depot_lookup",
        "slots": {},
        "detected_lang": "es"
    }))
    .await;

    // Far more corpus than the wire contract allows through.
    let patterns: Vec<String> = (0..50).map(|i| format!("ejemplo numero {i}")).collect();
    let pattern_refs: Vec<&str> = patterns.iter().map(String::as_str).collect();
    let corpus: Vec<_> = (0..500)
        .map(|i| {
            let mut record = intent(&format!("intent_{i}"), &pattern_refs);
            record.meta.insert("internal_handler".into(), json!("h"));
            record
        })
        .collect();

    let response = client
        .normalize("dónde está la cochera?", Lang::Es, &corpus)
        .await
        .unwrap();
    assert_eq!(response.suggested_intent.as_deref(), Some("depot_lookup"));

    let bodies = captured.lock().unwrap();
    let body = &bodies[0];
    assert_eq!(body["mode"], json!("normalize"));
    assert_eq!(body["lang"], json!("es"));

    let intents = body["intents"].as_array().unwrap();
    assert_eq!(intents.len(), MAX_SERIALIZED_INTENTS);
    for entry in intents {
        assert!(entry["examples"].as_array().unwrap().len() <= MAX_EXAMPLES_PER_INTENT);
        // Internal metadata must not leak onto the wire.
        assert!(entry.get("internal_handler").is_none());
    }
}

#[tokio::test]
async fn answer_uses_bridge_context() {
    let (client, captured) = mock_endpoint(json!({"answer": "ok", "model": "m1"})).await;

    let bridge = ContextBridge::new();
    bridge.capture(&ActionResult {
        context: Some(json!({"found": true, "data": {"x": 1}})),
        extra: Default::default(),
    });

    let response = client
        .answer(
            AnswerRequest {
                text: "t",
                lang: Lang::Es,
                context: None,
                max_tokens: None,
            },
            &bridge,
        )
        .await
        .unwrap();
    assert_eq!(response.answer_text(), Some("ok"));

    let bodies = captured.lock().unwrap();
    assert_eq!(bodies[0]["context"], json!({"found": true, "data": {"x": 1}}));
}

#[tokio::test]
async fn explicit_context_beats_bridge() {
    let (client, captured) = mock_endpoint(json!({"answer": "ok"})).await;

    let bridge = ContextBridge::new();
    bridge.capture(&ActionResult {
        context: Some(json!({"from": "bridge"})),
        extra: Default::default(),
    });

    client
        .answer(
            AnswerRequest {
                text: "t",
                lang: Lang::Ca,
                context: Some(json!({"from": "arg"})),
                max_tokens: None,
            },
            &bridge,
        )
        .await
        .unwrap();

    let bodies = captured.lock().unwrap();
    assert_eq!(bodies[0]["context"], json!({"from": "arg"}));
}

#[tokio::test]
async fn answer_without_any_context_sends_the_stub() {
    let (client, captured) = mock_endpoint(json!({"answer": "ok"})).await;

    client
        .answer(
            AnswerRequest {
                text: "t",
                lang: Lang::Es,
                context: None,
                max_tokens: Some(9999),
            },
            &ContextBridge::new(),
        )
        .await
        .unwrap();

    let bodies = captured.lock().unwrap();
    let body = &bodies[0];
    assert_eq!(
        body["context"],
        json!({
            "found": false,
            "intent": null,
            "data": null,
            "meta": {"note": "no_db_context_available"},
        })
    );
    // maxTokens is forwarded untouched; clamping is the server's job.
    assert_eq!(body["maxTokens"], json!(9999));
}

#[tokio::test]
async fn non_2xx_surfaces_status_and_raw_body() {
    let app = Router::new().route(
        "/assistant",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "oops") }),
    );
    let client = serve(app).await;

    let err = client
        .answer(
            AnswerRequest {
                text: "t",
                lang: Lang::Es,
                context: None,
                max_tokens: None,
            },
            &ContextBridge::new(),
        )
        .await
        .unwrap_err();

    match err {
        PipelineError::Network { status, raw } => {
            assert_eq!(status, 500);
            assert_eq!(raw, "oops");
        }
        other => panic!("expected Network error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_json_body_is_a_parse_error() {
    let app = Router::new().route("/assistant", post(|| async { "not json at all" }));
    let client = serve(app).await;

    let err = client
        .normalize("hola", Lang::Es, &[])
        .await
        .unwrap_err();

    match err {
        PipelineError::Parse { raw, .. } => assert_eq!(raw, "not json at all"),
        other => panic!("expected Parse error, got {other:?}"),
    }
}

#[tokio::test]
async fn blank_text_is_rejected_before_any_request() {
    // Client pointed at a closed port — validation must fire first.
    let client = RemoteAssistantClient::new(&RemoteConfig {
        endpoint: "http://127.0.0.1:1/assistant".into(),
        timeout_secs: 1,
    })
    .unwrap();

    let err = client.normalize("   ", Lang::Es, &[]).await.unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)), "got {err:?}");

    let err = client
        .answer(
            AnswerRequest {
                text: "",
                lang: Lang::Es,
                context: None,
                max_tokens: None,
            },
            &ContextBridge::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)), "got {err:?}");
}
