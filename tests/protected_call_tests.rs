//! Tests for the authenticated request executor's 401 contract,
//! end-to-end through the facade client.

use bearer_auth_integration::{auth_config, BearerAuthClient, RequestError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts an issuer that hands out "AAA" on the first exchange and "BBB"
/// on the second.
async fn mount_rotating_issuer(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"accessToken": "AAA"})),
        )
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"accessToken": "BBB"})),
        )
        .mount(server)
        .await;
}

fn client_for(server: &MockServer) -> BearerAuthClient {
    let config = auth_config()
        .issuer_url(format!("{}/auth/login", server.uri()))
        .username("emilys")
        .password("emilyspass")
        .token_json_key("accessToken")
        .build()
        .unwrap();
    BearerAuthClient::new(config)
}

#[tokio::test]
async fn rejected_token_is_replaced_and_retried_exactly_once() {
    let server = MockServer::start().await;
    mount_rotating_issuer(&server).await;

    // AAA is stale downstream; BBB is accepted
    Mock::given(method("POST"))
        .and(path("/users/add"))
        .and(header("authorization", "Bearer AAA"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/add"))
        .and(header("authorization", "Bearer BBB"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id": 101}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let body = client
        .post_json(
            format!("{}/users/add", server.uri()),
            serde_json::json!({"firstName": "Ada", "age": 36}),
        )
        .await
        .unwrap();

    assert_eq!(body, r#"{"id": 101}"#);
    // two exchanges: the initial login and the forced refresh
    let exchanges = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/auth/login")
        .count();
    assert_eq!(exchanges, 2);
}

#[tokio::test]
async fn second_401_is_terminal_with_no_third_attempt() {
    let server = MockServer::start().await;
    mount_rotating_issuer(&server).await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_string("nope"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .get(format!("{}/auth/me", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RequestError::DownstreamRejected { status: 401, .. }
    ));
    let attempts = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/auth/me")
        .count();
    assert_eq!(attempts, 2, "exactly two attempts, no third");
}

#[tokio::test]
async fn non_401_errors_are_terminal_without_refresh() {
    let server = MockServer::start().await;
    mount_rotating_issuer(&server).await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .get(format!("{}/auth/me", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RequestError::DownstreamRejected { status: 500, body } if body == "boom"
    ));
    let exchanges = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/auth/login")
        .count();
    assert_eq!(exchanges, 1, "a non-401 failure must not force a refresh");
}

#[tokio::test]
async fn successful_call_attaches_bearer_header() {
    let server = MockServer::start().await;
    mount_rotating_issuer(&server).await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer AAA"))
        .respond_with(ResponseTemplate::new(200).set_body_string("me"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let body = client
        .get(format!("{}/auth/me", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "me");
}

#[tokio::test]
async fn one_login_serves_many_calls() {
    let server = MockServer::start().await;
    mount_rotating_issuer(&server).await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string("me"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.warm_up().await;
    for _ in 0..3 {
        client.get(format!("{}/auth/me", server.uri())).await.unwrap();
    }

    let exchanges = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/auth/login")
        .count();
    assert_eq!(exchanges, 1);
}
