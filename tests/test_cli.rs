//! Command-line tests against mock HTTP servers
mod common;

use wiremock::matchers::{header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{authpulse, basic_header, ExitStatus, DUMMY_URL};

/// Mount a Basic-protected resource answering `body` for `user:pass`
async fn mount_basic(server: &MockServer, at: &str, user: &str, pass: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .and(header("Authorization", basic_header(user, pass).as_str()))
        .respond_with(ResponseTemplate::new(200)
            .insert_header("X-VO-Authenticated", user)
            .set_body_string(body))
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(401)
            .insert_header("WWW-Authenticate", r#"Basic realm="archive""#))
        .with_priority(10)
        .mount(server)
        .await;
}

// ============================================================================
// Fetch mode
// ============================================================================

#[tokio::test]
async fn test_public_resource() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(ResponseTemplate::new(200)
            .insert_header("X-Test", "yes")
            .set_body_string("hello world"))
        .mount(&server)
        .await;

    let r = authpulse(&[&format!("{}/public", server.uri())]);

    assert_eq!(r.exit_status, ExitStatus::Success);
    assert!(r.contains("200 OK"));
    assert!(r.contains("x-test: yes"));
    assert_eq!(r.body().map(str::trim), Some("hello world"));
}

#[tokio::test]
async fn test_basic_auth_with_fixed_credentials() {
    let server = MockServer::start().await;
    mount_basic(&server, "/data", "alice", "secret", "protected data").await;

    let r = authpulse(&["-a", "alice:secret", &format!("{}/data", server.uri())]);

    assert_eq!(r.exit_status, ExitStatus::Success, "stderr: {}", r.stderr);
    assert!(r.contains("200 OK"));
    assert!(r.contains("protected data"));
}

#[tokio::test]
async fn test_wrong_credentials_reported_by_status() {
    let server = MockServer::start().await;
    mount_basic(&server, "/data", "alice", "secret", "protected data").await;
    let url = format!("{}/data", server.uri());

    let r = authpulse(&["-a", "alice:wrong", &url]);
    assert_eq!(r.exit_status, ExitStatus::Success);
    assert!(r.contains("401 Unauthorized"));

    let r = authpulse(&["--check-status", "-a", "alice:wrong", &url]);
    assert_eq!(r.exit_status, ExitStatus::Error);
}

#[tokio::test]
async fn test_no_prompt_declines() {
    let server = MockServer::start().await;
    mount_basic(&server, "/data", "alice", "secret", "protected data").await;

    let r = authpulse(&["--no-prompt", "--check-status", &format!("{}/data", server.uri())]);

    assert_eq!(r.exit_status, ExitStatus::Error);
    assert!(r.contains("401"));
    assert!(!r.contains("protected data"));
}

#[tokio::test]
async fn test_digest_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/digest"))
        .and(header_regex("Authorization", r#"^Digest username="alice", realm="vo", nonce="abc123""#))
        .respond_with(ResponseTemplate::new(200).set_body_string("digest ok"))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/digest"))
        .respond_with(ResponseTemplate::new(401)
            .insert_header("WWW-Authenticate", r#"Digest realm="vo", nonce="abc123", qop="auth""#))
        .with_priority(10)
        .mount(&server)
        .await;

    let r = authpulse(&["-a", "alice:secret", &format!("{}/digest", server.uri())]);

    assert_eq!(r.exit_status, ExitStatus::Success, "stderr: {}", r.stderr);
    assert!(r.contains("digest ok"));
}

#[tokio::test]
async fn test_401_without_challenge_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let r = authpulse(&["--no-prompt", &format!("{}/broken", server.uri())]);

    assert_eq!(r.exit_status, ExitStatus::Error);
    assert!(r.stderr.contains("401 with no WWW-Authenticate challenges"));
}

#[tokio::test]
async fn test_unsupported_scheme_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401)
            .insert_header("WWW-Authenticate", r#"Bearer realm="api""#))
        .mount(&server)
        .await;

    let r = authpulse(&["--no-prompt", &format!("{}/token", server.uri())]);

    assert_eq!(r.exit_status, ExitStatus::Error);
    assert!(r.stderr.contains("No supported auth-schemes"));
}

#[tokio::test]
async fn test_scheme_flag_restricts_schemes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(401)
            .insert_header("WWW-Authenticate", r#"Basic realm="archive""#))
        .mount(&server)
        .await;

    let r = authpulse(&["--scheme", "digest", "-a", "u:p", &format!("{}/data", server.uri())]);

    assert_eq!(r.exit_status, ExitStatus::Error);
    assert!(r.stderr.contains("No supported auth-schemes"));
}

#[test]
fn test_unknown_scheme_flag() {
    let r = authpulse(&["--scheme", "kerberos", DUMMY_URL]);

    assert_eq!(r.exit_status, ExitStatus::Error);
    assert!(r.stderr.contains("Unknown auth scheme: kerberos"));
}

#[test]
fn test_invalid_url() {
    let r = authpulse(&["not a url"]);

    assert_eq!(r.exit_status, ExitStatus::Error);
    assert!(r.stderr.contains("URL parse error"));
}

#[test]
fn test_force_login_requires_authcheck() {
    let r = authpulse(&["--force-login", DUMMY_URL]);
    assert_eq!(r.exit_status, ExitStatus::Error);
}

// ============================================================================
// Redirects
// ============================================================================

#[tokio::test]
async fn test_redirect_followed_and_authenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/data"))
        .mount(&server)
        .await;
    mount_basic(&server, "/data", "alice", "secret", "moved data").await;

    let r = authpulse(&["-a", "alice:secret", &format!("{}/old", server.uri())]);

    assert_eq!(r.exit_status, ExitStatus::Success, "stderr: {}", r.stderr);
    assert!(r.contains("moved data"));
}

#[tokio::test]
async fn test_no_follow() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
        .mount(&server)
        .await;

    let r = authpulse(&["--no-follow", &format!("{}/old", server.uri())]);

    assert_eq!(r.exit_status, ExitStatus::Success);
    assert!(r.contains("302 Found"));
    assert!(r.contains("location: /new"));
}

#[tokio::test]
async fn test_too_many_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
        .mount(&server)
        .await;

    let r = authpulse(&["--max-redirects", "2", &format!("{}/loop", server.uri())]);

    assert_eq!(r.exit_status, ExitStatus::Error);
    assert!(r.stderr.contains("Too many redirects (max 2)"));
}

// ============================================================================
// Authcheck mode
// ============================================================================

#[tokio::test]
async fn test_authcheck_required() {
    let server = MockServer::start().await;
    mount_basic(&server, "/authcheck", "alice", "secret", "").await;

    let r = authpulse(&["--authcheck", "-a", "alice:secret", &format!("{}/authcheck", server.uri())]);

    assert_eq!(r.exit_status, ExitStatus::Success, "stderr: {}", r.stderr);
    assert!(r.contains("auth-type: required"));
    assert!(r.contains("authenticated: true"));
    assert!(r.contains("auth-id: alice"));
}

#[tokio::test]
async fn test_authcheck_declined() {
    let server = MockServer::start().await;
    mount_basic(&server, "/authcheck", "alice", "secret", "").await;

    let r = authpulse(&["--authcheck", "--no-prompt", &format!("{}/authcheck", server.uri())]);

    assert_eq!(r.exit_status, ExitStatus::Success);
    assert!(r.contains("auth-type: required"));
    assert!(r.contains("authenticated: false"));
    assert!(!r.contains("auth-id"));
}

#[tokio::test]
async fn test_authcheck_open_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/authcheck"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let r = authpulse(&["--authcheck", "--head", "--no-prompt", &format!("{}/authcheck", server.uri())]);

    assert_eq!(r.exit_status, ExitStatus::Success);
    assert!(r.contains("auth-type: none"));
    assert!(r.contains("authenticated: false"));
}

#[tokio::test]
async fn test_authcheck_force_login_on_optional() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/authcheck"))
        .and(header("Authorization", basic_header("alice", "secret").as_str()))
        .respond_with(ResponseTemplate::new(200).insert_header("X-VO-Authenticated", "alice"))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/authcheck"))
        .respond_with(ResponseTemplate::new(200)
            .insert_header("WWW-Authenticate", r#"Basic realm="archive""#))
        .with_priority(10)
        .mount(&server)
        .await;
    let url = format!("{}/authcheck", server.uri());

    let r = authpulse(&["--authcheck", "-a", "alice:secret", &url]);
    assert!(r.contains("auth-type: optional"));
    assert!(r.contains("authenticated: false"));

    let r = authpulse(&["--authcheck", "--force-login", "-a", "alice:secret", &url]);
    assert!(r.contains("auth-type: optional"));
    assert!(r.contains("authenticated: true"));
    assert!(r.contains("auth-id: alice"));
}

#[test]
fn test_authcheck_non_http_url() {
    let r = authpulse(&["--authcheck", "--no-prompt", "file:///tmp/authcheck"]);

    assert_eq!(r.exit_status, ExitStatus::Success);
    assert!(r.contains("auth-type: none"));
}
