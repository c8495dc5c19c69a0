use dispatch_engine::{
    CancelRequest, EnqueueRequest, HttpQueueTransport, QueueHandle, QueueStatus, QueueTransport,
    StatusRequest, TransportError, TransportSettings, ENQUEUE_FALLBACK_ERROR,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport_for(server: &MockServer) -> HttpQueueTransport {
    let settings = TransportSettings {
        base_url: server.uri(),
        ..TransportSettings::default()
    };
    HttpQueueTransport::new(settings).expect("build transport")
}

fn enqueue_request() -> EnqueueRequest {
    EnqueueRequest {
        user_id: "u1".to_owned(),
        chat_id: "chat-1".to_owned(),
        model: "default".to_owned(),
        is_authenticated: true,
        system_prompt: String::new(),
        enable_search: false,
        messages: Vec::new(),
        attachments: Vec::new(),
    }
}

#[tokio::test]
async fn enqueue_returns_server_id_and_initial_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/queue"))
        .and(body_partial_json(json!({
            "userId": "u1",
            "chatId": "chat-1",
            "isAuthenticated": true,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "queue": { "id": "q1", "status": "pending" },
        })))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let handle = transport.enqueue(&enqueue_request()).await.expect("enqueue ok");
    assert_eq!(
        handle,
        QueueHandle {
            id: "q1".to_owned(),
            status: QueueStatus::Pending,
        }
    );
}

#[tokio::test]
async fn enqueue_surfaces_the_server_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/queue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "rate limited",
        })))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let err = transport.enqueue(&enqueue_request()).await.unwrap_err();
    assert_eq!(err, TransportError::Rejected("rate limited".to_owned()));
}

#[tokio::test]
async fn enqueue_falls_back_to_a_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/queue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let err = transport.enqueue(&enqueue_request()).await.unwrap_err();
    assert_eq!(
        err,
        TransportError::Rejected(ENQUEUE_FALLBACK_ERROR.to_owned())
    );
}

#[tokio::test]
async fn enqueue_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/queue"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let err = transport.enqueue(&enqueue_request()).await.unwrap_err();
    assert_eq!(err, TransportError::HttpStatus(503));
}

#[tokio::test]
async fn enqueue_fails_on_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/queue"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let err = transport.enqueue(&enqueue_request()).await.unwrap_err();
    assert!(matches!(err, TransportError::Malformed(_)));
}

#[tokio::test]
async fn status_fetch_is_batched_and_parses_all_states() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/queue/status"))
        .and(body_partial_json(json!({ "queueIds": ["q1", "q2", "q3"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "queue": [
                { "id": "q1", "status": "completed" },
                { "id": "q2", "status": "processing" },
                { "id": "q3", "status": "failed" },
            ],
        })))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let statuses = transport
        .fetch_status(&StatusRequest {
            user_id: "u1".to_owned(),
            is_authenticated: false,
            queue_ids: vec!["q1".to_owned(), "q2".to_owned(), "q3".to_owned()],
        })
        .await
        .expect("status ok");

    assert_eq!(
        statuses,
        vec![
            ("q1".to_owned(), QueueStatus::Completed),
            ("q2".to_owned(), QueueStatus::Processing),
            ("q3".to_owned(), QueueStatus::Failed),
        ]
    );
}

#[tokio::test]
async fn cancel_reports_a_rejected_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/queue/cancel"))
        .and(body_partial_json(json!({ "queueId": "q3" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "job already picked up",
        })))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let err = transport
        .cancel(&CancelRequest {
            queue_id: "q3".to_owned(),
            user_id: "u1".to_owned(),
            is_authenticated: false,
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TransportError::Rejected("job already picked up".to_owned())
    );
}
