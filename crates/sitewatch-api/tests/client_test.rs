#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitewatch_api::types::{NewSiteRequest, SendAlertsRequest};
use sitewatch_api::{ApiClient, Error};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ApiClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_partial_json(json!({ "email": "ops@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-abc123",
            "user": { "id": "u1", "email": "ops@example.com", "name": "Ops" }
        })))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "hunter2".to_string().into();
    let session = client.login("ops@example.com", &secret).await.unwrap();

    assert_eq!(session.token, "tok-abc123");
    assert_eq!(session.user.email, "ops@example.com");
}

#[tokio::test]
async fn test_login_bad_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "wrong".to_string().into();
    let result = client.login("ops@example.com", &secret).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_bearer_header_applied() {
    let (server, client) = setup().await;
    client.set_token("tok-abc123".to_string().into());

    Mock::given(method("GET"))
        .and(path("/api/sites"))
        .and(header("authorization", "Bearer tok-abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let sites = client.list_sites().await.unwrap();
    assert!(sites.is_empty());
}

#[tokio::test]
async fn test_session_expired() {
    let (server, client) = setup().await;
    client.set_token("stale".to_string().into());

    Mock::given(method("GET"))
        .and(path("/api/sites"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_sites().await;

    assert!(
        matches!(result, Err(Error::SessionExpired)),
        "expected SessionExpired, got: {result:?}"
    );
}

// ── Site tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_sites() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "site-1",
            "name": "Main Website",
            "url": "https://example.com",
            "active": true,
            "createdAt": "2024-06-01T00:00:00Z",
            "lastChecked": "2024-06-15T10:30:00Z",
            "status": "up"
        }])))
        .mount(&server)
        .await;

    let sites = client.list_sites().await.unwrap();

    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].id, "site-1");
    assert_eq!(sites[0].name, "Main Website");
    assert_eq!(sites[0].status.as_deref(), Some("up"));
}

#[tokio::test]
async fn test_create_site_conflict_message_extraction() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/sites"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({ "message": "site with this URL already exists" })),
        )
        .mount(&server)
        .await;

    let req = NewSiteRequest {
        name: "Dup".into(),
        url: "https://example.com".into(),
        active: true,
    };
    let result = client.create_site(&req).await;

    match result {
        Err(err @ Error::Api { .. }) => {
            assert!(err.is_conflict());
            assert_eq!(err.to_string(), "API error (HTTP 409): site with this URL already exists");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_title_fallback() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/sites"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "title": "Internal Server Error" })),
        )
        .mount(&server)
        .await;

    match client.list_sites().await {
        Err(Error::Api { ref message, status }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_raw_text_fallback() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/sites"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    match client.list_sites().await {
        Err(Error::Api { ref message, status }) => {
            assert_eq!(status, 502);
            assert_eq!(message, "bad gateway");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

// ── Certificate tests ───────────────────────────────────────────────

#[tokio::test]
async fn test_list_certificates() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/certificates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "cert-1",
            "siteId": "site-1",
            "domain": "example.com",
            "expiryDate": "2024-09-01T00:00:00Z",
            "issuer": "Let's Encrypt",
            "daysRemaining": 78,
            "status": "valid",
            "alertSent": false,
            "lastChecked": "2024-06-15T10:30:00Z"
        }])))
        .mount(&server)
        .await;

    let certs = client.list_certificates().await.unwrap();

    assert_eq!(certs.len(), 1);
    assert_eq!(certs[0].site_id, "site-1");
    assert_eq!(certs[0].days_remaining, Some(78));
    assert_eq!(certs[0].issuer.as_deref(), Some("Let's Encrypt"));
}

#[tokio::test]
async fn test_certificate_summary() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/certificates/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 5, "valid": 2, "expiring": 1, "critical": 1, "expired": 1, "errors": 0
        })))
        .mount(&server)
        .await;

    let summary = client.certificate_summary().await.unwrap();
    assert_eq!(summary.total, 5);
    assert_eq!(summary.critical, 1);
}

#[tokio::test]
async fn test_check_certificate() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/certificates/check/site-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cert-1",
            "siteId": "site-1",
            "domain": "example.com",
            "expiryDate": "2024-06-18T10:30:00Z",
            "daysRemaining": 3,
            "status": "critical"
        })))
        .mount(&server)
        .await;

    let cert = client.check_certificate("site-1").await.unwrap();
    assert_eq!(cert.days_remaining, Some(3));
}

#[tokio::test]
async fn test_send_alerts() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/certificates/send-alerts"))
        .and(body_partial_json(json!({ "certificateIds": ["cert-1"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sent": 1, "failed": 0 })))
        .mount(&server)
        .await;

    let req = SendAlertsRequest {
        certificate_ids: vec!["cert-1".into()],
        recipients: vec![],
    };
    let dispatch = client.send_alerts(&req).await.unwrap();
    assert_eq!(dispatch.sent, 1);
}

// ── Probe tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_probe_reachable() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    assert!(client.probe().await);
}

#[tokio::test]
async fn test_probe_unreachable() {
    let client = ApiClient::with_client(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:1").unwrap(),
    );

    assert!(!client.probe().await);
}
