use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use xcali_core::envelope::{ApiGatewayResponse, CHALLENGE_HEADER, CONTENT_TYPE_HEADER, SET_COOKIE_HEADER};
use xcali_core::event::EventError;
use xcali_core::invocation::Invocation;
use xcali_core::session::{SessionStore, SessionToken};
use xcali_core::store::{StoreError, StoreResult};
use xcali_lambda::adapters::asset_store::AssetStore;
use xcali_lambda::adapters::drawing_store::DrawingStore;
use xcali_lambda::handlers::error::DispatchError;
use xcali_lambda::handlers::request::RequestDispatcher;

const CREDENTIAL: &str = "Basic eGNhbGk6c2VjcmV0";

#[derive(Default)]
struct MemoryStore {
    tokens: Mutex<Vec<String>>,
    issued: Mutex<usize>,
    drawings: Mutex<BTreeMap<String, Vec<u8>>>,
    assets: HashMap<String, Vec<u8>>,
    fail_sessions: bool,
}

impl MemoryStore {
    fn new() -> Self {
        Self {
            assets: HashMap::from([
                ("/index.html".to_string(), b"<html>xcali</html>".to_vec()),
                ("/main.css".to_string(), b"body{}".to_vec()),
                (
                    "/fonts/Virgil.woff2".to_string(),
                    vec![0x77, 0x4f, 0x46, 0x32, 0xff, 0x00],
                ),
            ]),
            ..Self::default()
        }
    }

    fn with_token(self, token: &str) -> Self {
        self.tokens
            .lock()
            .expect("poisoned mutex")
            .push(token.to_string());
        self
    }

    fn issued(&self) -> usize {
        *self.issued.lock().expect("poisoned mutex")
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn list_valid_tokens(&self) -> StoreResult<Vec<String>> {
        if self.fail_sessions {
            return Err(StoreError::backend("list_valid_tokens", "access denied"));
        }
        Ok(self.tokens.lock().expect("poisoned mutex").clone())
    }

    async fn allowed_credential(&self) -> StoreResult<String> {
        Ok(CREDENTIAL.to_string())
    }

    async fn create_token(&self) -> StoreResult<SessionToken> {
        let mut issued = self.issued.lock().expect("poisoned mutex");
        *issued += 1;
        let token = format!("issued-{}", *issued);
        self.tokens
            .lock()
            .expect("poisoned mutex")
            .push(token.clone());
        Ok(SessionToken::new(token))
    }
}

#[async_trait]
impl DrawingStore for MemoryStore {
    async fn list_titles(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .drawings
            .lock()
            .expect("poisoned mutex")
            .keys()
            .cloned()
            .collect())
    }

    async fn get_by_title(&self, title: &str) -> StoreResult<Vec<u8>> {
        self.drawings
            .lock()
            .expect("poisoned mutex")
            .get(title)
            .cloned()
            .ok_or_else(|| StoreError::not_found(title))
    }

    async fn put_by_title(
        &self,
        title: &str,
        content: Vec<u8>,
        _modified_by: Option<&str>,
    ) -> StoreResult<()> {
        self.drawings
            .lock()
            .expect("poisoned mutex")
            .insert(title.to_string(), content);
        Ok(())
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    async fn get_asset(&self, path: &str) -> StoreResult<Vec<u8>> {
        self.assets
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::not_found(path))
    }
}

fn dispatcher(store: &Arc<MemoryStore>) -> RequestDispatcher {
    RequestDispatcher::new(store.clone(), store.clone(), store.clone())
}

fn event(method: &str, path: &str, headers: Value) -> Value {
    json!({
        "path": path,
        "httpMethod": method,
        "headers": headers,
        "queryStringParameters": null,
        "pathParameters": null,
        "body": null
    })
}

fn with_session(token: &str) -> Value {
    json!({"Cookie": format!("theme=dark; xcaliapp-session={token}")})
}

async fn send(dispatcher: &RequestDispatcher, event: Value) -> ApiGatewayResponse {
    dispatcher
        .dispatch(event, &Invocation::detached("integration"))
        .await
        .expect("dispatch should succeed")
}

#[tokio::test]
async fn valid_session_is_served_without_new_cookie() {
    let store = Arc::new(MemoryStore::new().with_token("known"));
    let response = send(&dispatcher(&store), event("GET", "/api/drawing", with_session("known"))).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "[]");
    assert!(!response.headers.contains_key(SET_COOKIE_HEADER));
    assert_eq!(store.issued(), 0);
}

#[tokio::test]
async fn invalid_session_is_challenged() {
    let store = Arc::new(MemoryStore::new().with_token("known"));
    let mut headers = with_session("forged");
    headers["authorization"] = json!(CREDENTIAL);

    let response = send(&dispatcher(&store), event("GET", "/api/drawing", headers)).await;

    assert_eq!(response.status_code, 401);
    assert_eq!(response.headers[CHALLENGE_HEADER], "Basic");
    assert_eq!(response.headers.len(), 1);
    assert!(response.body.is_empty());
    assert!(!response.is_base64_encoded);
    assert_eq!(store.issued(), 0);
}

#[tokio::test]
async fn missing_credentials_are_challenged() {
    let store = Arc::new(MemoryStore::new());
    let response = send(&dispatcher(&store), event("GET", "/", json!({}))).await;
    assert_eq!(response.status_code, 401);
    assert!(!response.headers.contains_key(SET_COOKIE_HEADER));
}

#[tokio::test]
async fn allowed_credential_is_served_without_new_cookie() {
    let store = Arc::new(MemoryStore::new());
    let response = send(
        &dispatcher(&store),
        event("GET", "/main.css", json!({"authorization": CREDENTIAL})),
    )
    .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.headers[CONTENT_TYPE_HEADER], "text/css");
    assert!(!response.headers.contains_key(SET_COOKIE_HEADER));
}

#[tokio::test]
async fn other_authorization_gets_a_session_cookie() {
    let store = Arc::new(MemoryStore::new());
    let dispatcher = dispatcher(&store);

    let first = send(
        &dispatcher,
        event("GET", "/api/drawing", json!({"authorization": "Basic b3RoZXI="})),
    )
    .await;
    let second = send(
        &dispatcher,
        event("GET", "/api/drawing", json!({"authorization": "Basic b3RoZXI="})),
    )
    .await;

    assert_eq!(first.status_code, 200);
    assert_eq!(
        first.headers[SET_COOKIE_HEADER],
        "xcaliapp-session=issued-1; Path=/; Max-Age=3600; HttpOnly; Secure; SameSite=Lax"
    );
    assert_ne!(first.headers[SET_COOKIE_HEADER], second.headers[SET_COOKIE_HEADER]);
    assert_eq!(store.issued(), 2);

    let follow_up = send(&dispatcher, event("GET", "/api/drawing", with_session("issued-1"))).await;
    assert_eq!(follow_up.status_code, 200);
    assert!(!follow_up.headers.contains_key(SET_COOKIE_HEADER));
}

#[tokio::test]
async fn drawing_put_then_get_round_trips() {
    let store = Arc::new(MemoryStore::new().with_token("known"));
    let dispatcher = dispatcher(&store);

    let mut put = event("PUT", "/api/drawing", with_session("known"));
    put["queryStringParameters"] = json!({"title": "T"});
    put["body"] = json!("{\"a\":1}");
    let stored = send(&dispatcher, put).await;
    assert_eq!(stored.status_code, 200);
    assert!(stored.body.is_empty());

    let mut get = event("GET", "/api/drawing", with_session("known"));
    get["queryStringParameters"] = json!({"title": "T"});
    let fetched = send(&dispatcher, get).await;

    assert_eq!(fetched.status_code, 200);
    assert_eq!(fetched.headers[CONTENT_TYPE_HEADER], "application/json");
    let body: Value = serde_json::from_str(&fetched.body).expect("body should be JSON");
    assert_eq!(body, json!({"a": 1}));

    let listed = send(&dispatcher, event("GET", "/api/drawing", with_session("known"))).await;
    assert_eq!(listed.body, r#"["T"]"#);
}

#[tokio::test]
async fn missing_asset_is_404_with_empty_envelope() {
    let store = Arc::new(MemoryStore::new().with_token("known"));
    let response = send(&dispatcher(&store), event("GET", "/missing.js", with_session("known"))).await;

    assert_eq!(response.status_code, 404);
    assert!(response.headers.is_empty());
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn missing_drawing_is_404() {
    let store = Arc::new(MemoryStore::new().with_token("known"));
    let mut get = event("GET", "/api/drawing/nope", with_session("known"));
    get["pathParameters"] = json!({"title": "nope"});

    let response = send(&dispatcher(&store), get).await;

    assert_eq!(response.status_code, 404);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn root_serves_index_page() {
    let store = Arc::new(MemoryStore::new().with_token("known"));
    let dispatcher = dispatcher(&store);

    let root = send(&dispatcher, event("GET", "/", with_session("known"))).await;
    let index = send(&dispatcher, event("GET", "/index.html", with_session("known"))).await;

    assert_eq!(root, index);
    assert_eq!(root.headers[CONTENT_TYPE_HEADER], "text/html");
    assert_eq!(root.body, r#""<html>xcali</html>""#);
}

#[tokio::test]
async fn font_asset_is_served_as_base64_json_string() {
    let store = Arc::new(MemoryStore::new().with_token("known"));
    let response = send(
        &dispatcher(&store),
        event("GET", "/fonts/Virgil.woff2", with_session("known")),
    )
    .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.headers[CONTENT_TYPE_HEADER], "font/woff2");
    assert_eq!(response.body, r#""d09GMv8A""#);
    assert!(!response.is_base64_encoded);
}

#[tokio::test]
async fn asset_requests_ignore_fields_only_drawing_routes_read() {
    let store = Arc::new(MemoryStore::new().with_token("known"));
    let mut headers = with_session("known");
    headers["X-Forwarded-Port"] = json!(443);
    let mut request = event("GET", "/main.css", headers);
    request["queryStringParameters"] = json!("v=2");

    let response = send(&dispatcher(&store), request).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, r#""body{}""#);
}

#[tokio::test]
async fn echo_entry_point_shares_negotiation() {
    let store = Arc::new(MemoryStore::new());
    let dispatcher = dispatcher(&store);

    let challenged = dispatcher
        .echo(event("GET", "/echo", json!({})), &Invocation::detached("echo"))
        .await
        .expect("echo should respond");
    assert_eq!(challenged.status_code, 401);

    let greeted = dispatcher
        .echo(
            event("GET", "/echo", json!({"authorization": CREDENTIAL})),
            &Invocation::detached("echo"),
        )
        .await
        .expect("echo should respond");
    assert_eq!(greeted.status_code, 200);
    assert_eq!(greeted.body, r#"{"message":"hello, xcali!"}"#);
}

#[tokio::test]
async fn store_failure_during_negotiation_is_an_error() {
    let store = Arc::new(MemoryStore {
        fail_sessions: true,
        ..MemoryStore::new()
    });

    let error = dispatcher(&store)
        .dispatch(
            event("GET", "/api/drawing", with_session("known")),
            &Invocation::detached("integration"),
        )
        .await
        .expect_err("store failure should surface");

    assert!(matches!(error, DispatchError::Negotiation(_)));
    assert!(!error.is_client_input());
}

#[tokio::test]
async fn malformed_events_and_methods_are_errors() {
    let store = Arc::new(MemoryStore::new().with_token("known"));
    let dispatcher = dispatcher(&store);

    let no_headers = dispatcher
        .dispatch(
            json!({"path": "/", "httpMethod": "GET"}),
            &Invocation::detached("integration"),
        )
        .await
        .expect_err("missing headers should fail");
    assert!(matches!(no_headers, DispatchError::Event(_)));

    let not_an_object = dispatcher
        .dispatch(json!("GET /"), &Invocation::detached("integration"))
        .await
        .expect_err("non-object payload should fail");
    assert!(matches!(not_an_object, DispatchError::Event(EventError::NotAnObject)));
    assert!(not_an_object.is_client_input());

    let mut bad_query = event("GET", "/api/drawing", with_session("known"));
    bad_query["queryStringParameters"] = json!("title=T");
    let bad_query = dispatcher
        .dispatch(bad_query, &Invocation::detached("integration"))
        .await
        .expect_err("non-object query parameters should fail on the drawing route");
    assert!(bad_query.is_client_input());

    let unsupported = dispatcher
        .dispatch(
            event("DELETE", "/api/drawing", with_session("known")),
            &Invocation::detached("integration"),
        )
        .await
        .expect_err("DELETE should fail");
    assert!(unsupported.is_client_input());
    assert_eq!(unsupported.to_string(), "unexpected httpMethod: DELETE");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_invalid_sessions_do_not_mint_tokens() {
    let store = Arc::new(MemoryStore::new().with_token("known"));
    let dispatcher = dispatcher(&store);

    let mut tasks = Vec::new();
    for index in 0..12 {
        let dispatcher = dispatcher.clone();
        tasks.push(tokio::spawn(async move {
            let mut headers = with_session("expired");
            headers["authorization"] = json!("Basic d3Jvbmc=");
            dispatcher
                .dispatch(
                    event("GET", "/api/drawing", headers),
                    &Invocation::detached(format!("req-{index}")),
                )
                .await
        }));
    }

    for task in tasks {
        let response = task
            .await
            .expect("task should join")
            .expect("dispatch should succeed");
        assert_eq!(response.status_code, 401);
    }
    assert_eq!(store.issued(), 0);
}
