use super::*;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use shared::{
    domain::{CarId, OptionId},
    error::ErrorCode,
};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct GatewayState {
    calls: Arc<Mutex<Vec<(String, String, CallRequest)>>>,
    reply: Arc<Mutex<Option<(StatusCode, Value)>>>,
}

impl GatewayState {
    async fn respond_with(&self, status: StatusCode, body: Value) {
        *self.reply.lock().await = Some((status, body));
    }
}

async fn handle_call(
    State(state): State<GatewayState>,
    Path((canister_id, kind)): Path<(String, String)>,
    Json(request): Json<CallRequest>,
) -> impl IntoResponse {
    state
        .calls
        .lock()
        .await
        .push((canister_id, kind, request));
    let (status, body) = state
        .reply
        .lock()
        .await
        .clone()
        .unwrap_or((StatusCode::OK, json!({ "status": "replied", "reply": [] })));
    (status, Json(body))
}

async fn spawn_gateway() -> Result<(String, GatewayState)> {
    let state = GatewayState::default();
    let app = Router::new()
        .route("/api/v2/canister/:canister_id/:kind", post(handle_call))
        .with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

fn backend_for(gateway_url: &str) -> HttpQuizBackend {
    HttpQuizBackend::new(gateway_url, "ebwns-iiaaa-aaaam-qdtta-cai", Duration::from_secs(5))
        .expect("backend")
}

fn sample_question_json() -> Value {
    json!({
        "carId": 7,
        "carName": "Porsche 911",
        "carImage": "https://img.example/911.jpg",
        "options": [
            { "id": 1, "price": 90000 },
            { "id": 2, "price": 100000 }
        ]
    })
}

#[test]
fn builds_query_and_call_endpoints_under_gateway() {
    let backend = backend_for("https://icp0.io");
    assert_eq!(
        backend.endpoint(CallKind::Query).expect("url").as_str(),
        "https://icp0.io/api/v2/canister/ebwns-iiaaa-aaaam-qdtta-cai/query"
    );
    assert_eq!(
        backend.endpoint(CallKind::Update).expect("url").as_str(),
        "https://icp0.io/api/v2/canister/ebwns-iiaaa-aaaam-qdtta-cai/call"
    );

    let nested = backend_for("http://localhost:4943/proxy/");
    assert_eq!(
        nested.endpoint(CallKind::Query).expect("url").as_str(),
        "http://localhost:4943/proxy/api/v2/canister/ebwns-iiaaa-aaaam-qdtta-cai/query"
    );
}

#[test]
fn rejects_bad_gateway_or_empty_canister() {
    assert!(HttpQuizBackend::new("not a url", "abc", Duration::from_secs(1)).is_err());
    assert!(HttpQuizBackend::new("https://icp0.io", "  ", Duration::from_secs(1)).is_err());
}

#[tokio::test]
async fn get_questions_sends_query_envelope_and_decodes_reply() {
    let (url, state) = spawn_gateway().await.expect("gateway");
    state
        .respond_with(
            StatusCode::OK,
            json!({ "status": "replied", "reply": [sample_question_json()] }),
        )
        .await;

    let questions = backend_for(&url).get_questions().await.expect("questions");
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].car_id, CarId(7));
    assert_eq!(questions[0].car_name, "Porsche 911");
    assert_eq!(questions[0].options[1].price, 100_000);

    let calls = state.calls.lock().await;
    let (canister_id, kind, request) = &calls[0];
    assert_eq!(canister_id, "ebwns-iiaaa-aaaam-qdtta-cai");
    assert_eq!(kind, "query");
    assert_eq!(request.method_name, "getQuestions");
    assert!(request.arg.is_null());
}

#[tokio::test]
async fn submit_guesses_uses_update_endpoint_with_camel_case_guesses() {
    let (url, state) = spawn_gateway().await.expect("gateway");
    state
        .respond_with(
            StatusCode::OK,
            json!({
                "status": "replied",
                "reply": { "score": 1, "maxScore": 2, "message": "Nice try" }
            }),
        )
        .await;

    let result = backend_for(&url)
        .submit_guesses(vec![
            Guess {
                car_id: CarId(1),
                selected_option_id: OptionId(2),
            },
            Guess {
                car_id: CarId(2),
                selected_option_id: OptionId(3),
            },
        ])
        .await
        .expect("result");
    assert_eq!(
        result,
        GameResult {
            score: 1,
            max_score: 2,
            message: "Nice try".into(),
        }
    );

    let calls = state.calls.lock().await;
    let (_, kind, request) = &calls[0];
    assert_eq!(kind, "call");
    assert_eq!(request.method_name, "submitGuesses");
    assert_eq!(
        request.arg,
        json!([
            { "carId": 1, "selectedOptionId": 2 },
            { "carId": 2, "selectedOptionId": 3 }
        ])
    );
}

#[tokio::test]
async fn rejected_call_surfaces_reject_message() {
    let (url, state) = spawn_gateway().await.expect("gateway");
    state
        .respond_with(
            StatusCode::OK,
            json!({
                "status": "rejected",
                "reject_code": 5,
                "reject_message": "canister trapped"
            }),
        )
        .await;

    let err = backend_for(&url)
        .submit_guesses(Vec::new())
        .await
        .expect_err("should reject");
    match err.downcast_ref::<BackendError>() {
        Some(BackendError::Rejected {
            method,
            code,
            message,
        }) => {
            assert_eq!(*method, "submitGuesses");
            assert_eq!(*code, 5);
            assert_eq!(message, "canister trapped");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn api_error_body_is_decoded_on_http_failure() {
    let (url, state) = spawn_gateway().await.expect("gateway");
    state
        .respond_with(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "code": "unavailable", "message": "subnet is catching up" }),
        )
        .await;

    let err = backend_for(&url)
        .get_questions()
        .await
        .expect_err("should fail");
    match err.downcast_ref::<BackendError>() {
        Some(BackendError::Api { status, source }) => {
            assert_eq!(*status, 503);
            assert_eq!(source.code, ErrorCode::Unavailable);
            assert_eq!(source.message, "subnet is catching up");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unknown_error_code_falls_back_to_plain_http_error() {
    let (url, state) = spawn_gateway().await.expect("gateway");
    state
        .respond_with(
            StatusCode::TOO_MANY_REQUESTS,
            json!({ "code": "rate_limited", "message": "slow down" }),
        )
        .await;

    let err = backend_for(&url)
        .get_questions()
        .await
        .expect_err("should fail");
    match err.downcast_ref::<BackendError>() {
        Some(BackendError::Http { status, body }) => {
            assert_eq!(*status, 429);
            assert!(body.contains("slow down"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn plain_http_failure_keeps_status_and_body() {
    let (url, state) = spawn_gateway().await.expect("gateway");
    state
        .respond_with(StatusCode::BAD_GATEWAY, json!("upstream down"))
        .await;

    let err = backend_for(&url)
        .get_questions()
        .await
        .expect_err("should fail");
    match err.downcast_ref::<BackendError>() {
        Some(BackendError::Http { status, body }) => {
            assert_eq!(*status, 502);
            assert!(body.contains("upstream down"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_reply_is_reported() {
    let (url, state) = spawn_gateway().await.expect("gateway");
    state
        .respond_with(StatusCode::OK, json!({ "status": "replied", "reply": 42 }))
        .await;

    let err = backend_for(&url)
        .get_questions()
        .await
        .expect_err("should fail");
    assert!(matches!(
        err.downcast_ref::<BackendError>(),
        Some(BackendError::MalformedReply {
            method: "getQuestions",
            ..
        })
    ));
}

#[tokio::test]
async fn unreachable_gateway_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = backend_for(&format!("http://{addr}"))
        .get_questions()
        .await
        .expect_err("should fail");
    assert!(err.to_string().contains("failed to reach gateway"));
}

#[tokio::test]
async fn missing_backend_reports_unavailable_remote_client() {
    let err = MissingQuizBackend
        .get_questions()
        .await
        .expect_err("should fail");
    assert_eq!(err.to_string(), "remote client is unavailable");
}

#[tokio::test]
async fn client_loads_session_then_submits_to_result_screen() {
    let client = QuizClient::new(Arc::new(MockQuizBackend::default()));
    let mut session = GameSession::new();
    client.load_into(&mut session).await.expect("load");
    assert_eq!(session.screen(), Screen::Welcome);
    assert_eq!(session.question_count(), 4);

    let mut step = session.start().expect("start");
    while step == Step::Question {
        step = session.select_option(OptionId(2)).expect("answer");
    }
    let Step::Submit(guesses) = step else {
        panic!("round should end with a submission");
    };

    let result = client
        .submit_from(&mut session, guesses)
        .await
        .expect("submit");
    assert_eq!(result.score, 4);
    assert_eq!(result.message, "You got 4 out of 4 correct!");
    assert_eq!(session.screen(), Screen::Result);
}

#[tokio::test]
async fn client_failure_paths_update_session() {
    let client = QuizClient::new(Arc::new(MissingQuizBackend));
    let mut session = GameSession::new();
    assert!(client.load_into(&mut session).await.is_err());
    assert_eq!(session.screen(), Screen::Loading);
    assert_eq!(session.status(), Some("Error: remote client is unavailable"));

    session.questions_loaded(crate::mock::sample_questions());
    session.start().expect("start");
    assert!(client.submit_from(&mut session, Vec::new()).await.is_err());
    assert_eq!(session.screen(), Screen::Welcome);
}

#[tokio::test]
async fn downloads_image_bytes() {
    let app = Router::new().route(
        "/car.jpg",
        axum::routing::get(|| async { vec![0xFFu8, 0xD8, 0xFF] }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let bytes = download_image(&Client::new(), &format!("http://{addr}/car.jpg"))
        .await
        .expect("image");
    assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF]);

    assert!(download_image(&Client::new(), &format!("http://{addr}/missing.jpg"))
        .await
        .is_err());
}

async fn spawn_image_host(body: Vec<u8>) -> String {
    let app = Router::new().route(
        "/car.jpg",
        axum::routing::get(move || {
            let body = body.clone();
            async move { body }
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/car.jpg")
}

#[tokio::test]
async fn oversized_image_is_refused() {
    let url = spawn_image_host(vec![0u8; 4096]).await;

    let err = download_image_capped(&Client::new(), &url, 1024)
        .await
        .expect_err("over the limit");
    assert!(err.to_string().contains("limit is 1024"));

    let bytes = download_image_capped(&Client::new(), &url, 4096)
        .await
        .expect("at the limit");
    assert_eq!(bytes.len(), 4096);
}

#[tokio::test]
async fn oversized_streamed_image_stops_at_limit() {
    let app = Router::new().route(
        "/car.jpg",
        axum::routing::get(|| async {
            let chunks = (0..8).map(|_| Ok::<_, std::io::Error>(vec![0u8; 512]));
            axum::body::Body::from_stream(futures::stream::iter(chunks))
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let err = download_image_capped(&Client::new(), &format!("http://{addr}/car.jpg"), 1024)
        .await
        .expect_err("over the limit");
    assert!(err.to_string().contains("exceeds the 1024 byte limit"));
}

#[tokio::test]
async fn stalled_image_host_times_out() {
    // Connections complete in the backlog but nothing ever answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    let http = image_client(Duration::from_millis(200)).expect("client");
    let outcome = tokio::time::timeout(
        Duration::from_secs(3),
        download_image(&http, &format!("http://{addr}/car.jpg")),
    )
    .await
    .expect("download should give up before the outer timeout");
    assert!(outcome.is_err());
    drop(listener);
}
