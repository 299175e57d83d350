//! Transport-level behaviour of `HackathonClient::call`: error
//! normalisation, timeouts, empty and malformed bodies.

use std::time::Duration;

use hackseed_client::error::{MALFORMED_BODY, TRANSPORT_FAILURE};
use hackseed_client::{ApiConfig, HackathonClient, Method};
use serde_json::{json, Value};
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_with_timeout(mock_server: &MockServer, timeout: Duration) -> HackathonClient {
    let config = ApiConfig::new(&mock_server.uri(), timeout).unwrap();
    HackathonClient::new(&config).unwrap()
}

#[tokio::test]
async fn call_returns_json_on_2xx() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = client_with_timeout(&mock_server, Duration::from_secs(2));
    let value = client.call(Method::GET, "/ping", None, None).await.unwrap();
    assert_eq!(value["ok"], true);
}

#[tokio::test]
async fn call_attaches_bearer_only_when_token_given() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/secure"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/open"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let client = client_with_timeout(&mock_server, Duration::from_secs(2));
    client.call(Method::GET, "/secure", None, Some("abc")).await.unwrap();
    client.call(Method::GET, "/open", None, None).await.unwrap();
}

#[tokio::test]
async fn empty_2xx_body_is_null() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/noop"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = client_with_timeout(&mock_server, Duration::from_secs(2));
    let value = client
        .call(Method::POST, "/noop", Some(&json!({"a": 1})), None)
        .await
        .unwrap();
    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn non_json_2xx_body_is_malformed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = client_with_timeout(&mock_server, Duration::from_secs(2));
    let err = client.call(Method::GET, "/html", None, None).await.unwrap_err();
    assert_eq!(err.status_code, 200);
    assert_eq!(err.message, MALFORMED_BODY);
    assert_eq!(err.raw_body, "<html>oops</html>");
}

#[tokio::test]
async fn server_error_keeps_raw_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/boom"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "maintenance"})))
        .mount(&mock_server)
        .await;

    let client = client_with_timeout(&mock_server, Duration::from_secs(2));
    let err = client.call(Method::GET, "/boom", None, None).await.unwrap_err();
    assert_eq!(err.status_code, 503);
    assert_eq!(err.message, "maintenance");
    assert!(err.raw_body.contains("maintenance"));
    assert!(!err.is_transport());
}

#[tokio::test]
async fn slow_response_times_out_as_transport_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(1_500)),
        )
        .mount(&mock_server)
        .await;

    let client = client_with_timeout(&mock_server, Duration::from_millis(100));
    let err = client.call(Method::GET, "/slow", None, None).await.unwrap_err();
    assert_eq!(err.status_code, 0);
    assert_eq!(err.message, TRANSPORT_FAILURE);
    assert!(err.is_timeout(), "expected timeout cause, got {:?}", err.cause);
}
