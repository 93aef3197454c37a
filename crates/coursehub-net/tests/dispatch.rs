use async_trait::async_trait;
use coursehub_net::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UNUSED_PORT: u16 = 9;

fn local_config(server: &MockServer) -> ApiConfig {
    ApiConfig::new("coaching", "http://127.0.0.1:9", server.address().port())
}

fn remote_config(server: &MockServer) -> ApiConfig {
    ApiConfig::new("coaching", server.uri(), UNUSED_PORT)
}

struct FailingTransport;

#[async_trait]
impl Transport for FailingTransport {
    async fn send(&self, _request: NetRequest) -> Result<NetResponse, NetError> {
        Err(NetError::transport("Network Error"))
    }
}

#[tokio::test]
async fn untokened_call_goes_local_with_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses"))
        .and(header("app", "coaching"))
        .and(header_exists("key"))
        .and(query_param("search", "rust"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    let api = Api::from_config(local_config(&server)).unwrap();
    let options = RequestOptions::new().with_search(json!("rust"));
    let expected_key = api
        .canonical_key(ApiMethod::Get, "/courses", &options)
        .unwrap();

    let payload = api.get("/courses", options).await.unwrap();
    assert_eq!(payload, json!([{"id": 1}]));

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].headers["key"], expected_key.as_str());
    assert!(received[0].headers.get("token").is_none());
}

#[tokio::test]
async fn tokened_call_goes_remote_with_token_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses"))
        .and(header("token", "tok-courses"))
        .and(header("app", "coaching"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let config = remote_config(&server);
    let keyed = Api::from_config(config.clone()).unwrap();
    let key = keyed
        .canonical_key(ApiMethod::Get, "/courses", &RequestOptions::new())
        .unwrap();
    assert!(key.as_str().starts_with("get:/courses>"));

    let api = Api::builder(config)
        .with_tokens(TokenTable::from_map([(key.as_str(), "tok-courses")]))
        .build()
        .unwrap();
    let payload = api.get("/courses", RequestOptions::new()).await.unwrap();
    assert_eq!(payload, json!({"ok": true}));

    let received = server.received_requests().await.unwrap();
    assert!(received[0].headers.get("key").is_none());
}

#[tokio::test]
async fn option_headers_are_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/courses/4"))
        .and(header("filter", r#"{"id":4}"#))
        .and(header("session", "abc"))
        .and(header("collections", r#"["lessons"]"#))
        .and(body_json(json!({"title": "Rust 101"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updated": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let api = Api::from_config(local_config(&server)).unwrap();
    let options = RequestOptions::new()
        .with_filter(json!({"id": 4}))
        .with_session(json!("abc"))
        .with_joins(json!(["lessons"]))
        .with_body(json!({"title": "Rust 101"}));
    let payload = api.put("/courses/4", options).await.unwrap();
    assert_eq!(payload, json!({"updated": 1}));
}

#[tokio::test]
async fn sql_entry_point_posts_to_sql_path_with_exact_body() {
    let server = MockServer::start().await;
    let body = json!({"sql": "SELECT 1", "params": [{"id": 7}]});
    Mock::given(method("POST"))
        .and(path("/sql-reports"))
        .and(body_json(body.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[1]])))
        .expect(1)
        .mount(&server)
        .await;

    let api = Api::from_config(local_config(&server)).unwrap();
    let options = RequestOptions::new().with_sql(
        SqlStatement::new("SELECT 1").with_params(vec![json!({"id": 7})]),
    );
    let payload = api.sql("/reports", options).await.unwrap();
    assert_eq!(payload, json!([[1]]));

    let received = server.received_requests().await.unwrap();
    let key = received[0].headers["key"].to_str().unwrap().to_string();
    assert!(key.starts_with("sql:/sql-reports>"));
}

#[tokio::test]
async fn delete_returns_payload_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/courses/9"))
        .respond_with(ResponseTemplate::new(200).set_body_string("deleted"))
        .mount(&server)
        .await;

    let api = Api::from_config(local_config(&server)).unwrap();
    let payload = api.delete("/courses/9", RequestOptions::new()).await.unwrap();
    assert_eq!(payload, json!("deleted"));
}

#[tokio::test]
async fn upstream_status_is_a_request_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payments"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let api = Api::from_config(local_config(&server)).unwrap();
    let err = api
        .post("/payments", RequestOptions::new().with_body(json!({"amount": 10})))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UpstreamStatus);
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn transport_failure_is_returned_unchanged_from_every_entry_point() {
    let observer = RecordingObserver::new();
    let api = Api::builder(ApiConfig::new("coaching", "https://api.example.com", 3000))
        .with_transport(FailingTransport)
        .with_observer(observer.clone())
        .build()
        .unwrap();
    let expected = NetError::transport("Network Error");

    let results = vec![
        api.get("/courses", RequestOptions::new()).await,
        api.put("/courses/1", RequestOptions::new()).await,
        api.post("/courses", RequestOptions::new()).await,
        api.delete("/courses/1", RequestOptions::new()).await,
        api.sql("/reports", RequestOptions::new().with_sql(SqlStatement::new("SELECT 1"))).await,
    ];
    for result in results {
        assert_eq!(result.unwrap_err(), expected);
    }

    let events = observer.events();
    assert_eq!(events.len(), 10);
    assert!(events
        .iter()
        .all(|event| !matches!(event, ProgressEvent::Finished { ok: true, .. })));
}

#[tokio::test]
async fn loading_flag_controls_notifications() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let observer = RecordingObserver::new();
    let api = Api::builder(local_config(&server))
        .with_observer(observer.clone())
        .build()
        .unwrap();

    api.get("/courses", RequestOptions::new()).await.unwrap();
    let events = observer.events();
    assert_eq!(events.len(), 2);
    match (&events[0], &events[1]) {
        (ProgressEvent::Started(start), ProgressEvent::Finished { info, ok }) => {
            assert_eq!(start, info);
            assert_eq!(info.method, ApiMethod::Get);
            assert!(!info.trusted);
            assert!(*ok);
        }
        other => panic!("unexpected events: {other:?}"),
    }

    observer.clear();
    api.get("/courses", RequestOptions::new().with_loading(false))
        .await
        .unwrap();
    assert!(observer.events().is_empty());
}

#[tokio::test]
async fn identical_concurrent_calls_are_not_coalesced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(5)
        .mount(&server)
        .await;

    let api = Api::from_config(local_config(&server)).unwrap();
    let calls = (0..5).map(|_| {
        let api = api.clone();
        async move { api.get("/courses", RequestOptions::new()).await }
    });
    let results = futures::future::join_all(calls).await;
    assert!(results.iter().all(Result::is_ok));
}
