//! Stage behaviour on backend replies the stub never produces: machine
//! codes, 409 registration conflicts, persistent 401s, timeouts.

use std::time::Duration;

use hackseed_client::{ApiConfig, HackathonClient, RetryPolicy};
use hackseed_orchestrator::identity::{Identity, IdentityTemplate, ProvisionState};
use hackseed_orchestrator::provision::Provisioner;
use hackseed_orchestrator::registration::{RegistrationCoordinator, RegistrationOutcome};
use hackseed_orchestrator::submission::{SubmissionGenerator, SubmissionOutcome};
use hackseed_orchestrator::verify::{ExpectedIdentity, Verifier};
use hackseed_orchestrator::{FailureKind, ProvisionError};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(mock_server: &MockServer, timeout: Duration) -> HackathonClient {
    let config = ApiConfig::new(&format!("{}/api/v1", mock_server.uri()), timeout).unwrap();
    HackathonClient::new(&config).unwrap()
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 1,
        base_delay: Duration::from_millis(1),
    }
}

fn identity(token: &str) -> Identity {
    Identity::new(
        &IdentityTemplate::default().spec(1),
        ProvisionState::Existing,
        Some("u-1".into()),
        token.into(),
    )
}

#[tokio::test]
async fn registration_conflict_status_counts_as_already_registered() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/hackathons/E1/register"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "statusCode": 409,
            "message": "User is already registered for this hackathon"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server, Duration::from_secs(2));
    let coordinator = RegistrationCoordinator::new(client.clone(), Provisioner::new(client));
    let record = coordinator.register(&identity("tok-1"), "E1", 1).await;
    assert_eq!(record.outcome, RegistrationOutcome::AlreadyRegistered);
}

#[tokio::test]
async fn registration_bad_request_is_failed_with_cause() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/hackathons/E1/register"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Registration is not open for this hackathon"
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server, Duration::from_secs(2));
    let coordinator = RegistrationCoordinator::new(client.clone(), Provisioner::new(client));
    let record = coordinator.register(&identity("tok-1"), "E1", 1).await;
    match record.outcome {
        RegistrationOutcome::Failed(f) => {
            assert_eq!(f.kind, FailureKind::Validation);
            assert!(f.cause.contains("Registration is not open"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn persistent_401_relogs_in_once_then_fails_as_auth() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/hackathons/E1/register"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized"})))
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "tok-2"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server, Duration::from_secs(2));
    let coordinator = RegistrationCoordinator::new(client.clone(), Provisioner::new(client));
    let id = identity("tok-1");
    let record = coordinator.register(&id, "E1", 1).await;
    match record.outcome {
        RegistrationOutcome::Failed(f) => assert_eq!(f.kind, FailureKind::Auth),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(id.token().unwrap().as_str(), "tok-2");
}

#[tokio::test]
async fn duplicate_submission_code_wins_over_generic_message() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/submissions"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "DUPLICATE_SUBMISSION",
            "message": "Conflict"
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server, Duration::from_secs(2));
    let generator = SubmissionGenerator::new(client.clone(), Provisioner::new(client));
    let record = generator.submit(&identity("tok-1"), 0, "E1", 1).await;
    assert_eq!(record.outcome, SubmissionOutcome::AlreadyExists);
    assert_eq!(record.title, "Project 1 by testuser1");
    assert_eq!(
        record.links.repository.as_deref(),
        Some("https://github.com/testuser1/hackathon-project-1")
    );
}

#[tokio::test]
async fn submission_validation_error_is_failed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/submissions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": ["repositoryUrl must be a URL address"]
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server, Duration::from_secs(2));
    let generator = SubmissionGenerator::new(client.clone(), Provisioner::new(client));
    let record = generator.submit(&identity("tok-1"), 0, "E1", 1).await;
    match record.outcome {
        SubmissionOutcome::Failed(f) => {
            assert_eq!(f.kind, FailureKind::Validation);
            assert!(f.cause.contains("repositoryUrl"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn auth_reply_without_token_is_creation_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"user": {"id": "u-1"}})))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server, Duration::from_secs(2));
    let err = Provisioner::new(client)
        .ensure(&IdentityTemplate::default().spec(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::CreationFailed { .. }));
    assert_eq!(err.failure().kind, FailureKind::Validation);
}

#[tokio::test]
async fn user_exists_code_falls_back_to_login() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {"code": "USER_EXISTS", "message": "Conflict"}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "tok-9",
            "user": {"id": "u-9", "email": "testuser1@loadtest.com"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server, Duration::from_secs(2));
    let identity = Provisioner::new(client)
        .ensure(&IdentityTemplate::default().spec(1))
        .await
        .unwrap();
    assert_eq!(identity.state, ProvisionState::Existing);
    assert_eq!(identity.user_id.as_deref(), Some("u-9"));
    assert_eq!(identity.token().unwrap().as_str(), "tok-9");
}

#[tokio::test]
async fn non_conflict_creation_error_does_not_log_in() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "database down"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "x"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server, Duration::from_secs(2));
    let err = Provisioner::new(client)
        .ensure(&IdentityTemplate::default().spec(1))
        .await
        .unwrap_err();
    assert_eq!(err.failure().kind, FailureKind::Server);
    assert!(err.failure().cause.contains("database down"));
}

#[tokio::test]
async fn provisioning_retries_timeouts_once() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_millis(1500)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server, Duration::from_millis(100));
    let err = Provisioner::new(client)
        .with_retry(fast_retry())
        .ensure(&IdentityTemplate::default().spec(1))
        .await
        .unwrap_err();
    assert_eq!(err.failure().kind, FailureKind::Transport);
}

#[tokio::test]
async fn conflicts_are_never_retried() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "User with this email already exists"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server, Duration::from_secs(2));
    let err = Provisioner::new(client)
        .with_retry(fast_retry())
        .ensure(&IdentityTemplate::default().spec(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::ConflictUnresolved { .. }));
}

#[tokio::test]
async fn verifier_reads_nested_user_emails() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/hackathons/E1/participants"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"user": {"email": "testuser1@loadtest.com"}, "hasSubmission": true},
                {"user": {"email": "testuser2@loadtest.com"}, "hasSubmission": false}
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server, Duration::from_secs(2));
    let expected = ExpectedIdentity::from_emails(&["testuser1@loadtest.com", "testuser2@loadtest.com"], 1);
    let report = Verifier::new(client).verify("E1", &expected, "tok-1").await.unwrap();
    assert!(report.is_clean(), "{:?}", report.discrepancies);
    assert_eq!(report.observed_count, 2);
}

#[tokio::test]
async fn verifier_errors_when_participants_unavailable() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/hackathons/E1/participants"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server, Duration::from_secs(2));
    let expected = ExpectedIdentity::from_emails(&["testuser1@loadtest.com"], 0);
    let err = Verifier::new(client).verify("E1", &expected, "tok-1").await.unwrap_err();
    assert_eq!(err.status_code, 503);
}
