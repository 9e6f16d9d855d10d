// ABOUTME: Concurrency tests for refresh-on-401 in the session manager
// ABOUTME: One exchange per stale token, single retry, and fail-fast after a failed refresh
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::time::Duration;

use common::{
    authenticated_client, expired_oauth2_token, mount_exchange, mount_sso, oauth1_token,
    success_page, test_client, token_body, EXCHANGE_PATH, OAUTH1_TOKEN, PREAUTHORIZED_PATH,
    TICKET,
};
use futures_util::future::join_all;
use garmin_connect::models::{SessionEvent, SessionState};
use garmin_connect::GarminError;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESOURCE_PATH: &str = "/userprofile-service/userprofile/user-settings/";

/// Resource that accepts only `accepted_token` and rejects everything else
async fn mount_resource(server: &MockServer, accepted_token: &str) {
    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .and(header("authorization", format!("Bearer {accepted_token}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 42 })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_unauthorized_calls_share_one_refresh() {
    let server = MockServer::start().await;
    mount_resource(&server, "new-token").await;
    mount_exchange(&server, "new-token", Duration::from_millis(300), Some(1)).await;

    let client = authenticated_client(&server, "old-token").await;
    let calls = (0..8).map(|_| {
        let client = client.clone();
        tokio::spawn(async move { client.get_user_settings().await })
    });
    let results = join_all(calls).await;

    for result in results {
        let body = result.unwrap().unwrap();
        assert_eq!(body["id"], 42);
    }
    assert_eq!(client.session().state().await, SessionState::Authenticated);
    assert_eq!(
        client.export_tokens().await.unwrap().oauth2.access_token,
        "new-token"
    );
    server.verify().await;
}

#[tokio::test]
async fn test_second_unauthorized_is_auth_expired_without_another_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    mount_exchange(&server, "new-token", Duration::ZERO, Some(1)).await;

    let client = authenticated_client(&server, "old-token").await;
    let error = client.get_user_settings().await.unwrap_err();

    assert!(matches!(error, GarminError::AuthExpired(_)));
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_refresh_releases_every_waiter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(5)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(EXCHANGE_PATH))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(500)))
        .expect(1)
        .mount(&server)
        .await;

    let client = authenticated_client(&server, "old-token").await;
    let mut events = client.subscribe();

    let calls = (0..5).map(|_| {
        let client = client.clone();
        tokio::spawn(async move { client.get_user_settings().await })
    });
    let errors: Vec<GarminError> = join_all(calls)
        .await
        .into_iter()
        .map(|result| result.unwrap().unwrap_err())
        .collect();

    let transport = errors
        .iter()
        .filter(|e| matches!(e, GarminError::Transport { .. }))
        .count();
    let expired = errors
        .iter()
        .filter(|e| matches!(e, GarminError::AuthExpired(_)))
        .count();
    assert_eq!(transport, 1, "only the refreshing call sees the exchange error");
    assert_eq!(expired, 4);
    assert_eq!(client.session().state().await, SessionState::Failed);
    assert!(matches!(
        events.recv().await.unwrap(),
        SessionEvent::RefreshFailed { .. }
    ));

    // Fails fast without touching the network until the next login
    let error = client.get_user_settings().await.unwrap_err();
    assert!(matches!(error, GarminError::AuthExpired(_)));
    server.verify().await;
}

#[tokio::test]
async fn test_expired_token_refreshed_before_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 42 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(0)
        .mount(&server)
        .await;
    mount_exchange(&server, "fresh-token", Duration::ZERO, Some(1)).await;

    let client = test_client(&server);
    client
        .load_tokens(oauth1_token(), expired_oauth2_token("stale-token"))
        .await
        .unwrap();
    let mut events = client.subscribe();

    let body = client.get_user_settings().await.unwrap();
    assert_eq!(body["id"], 42);
    match events.recv().await.unwrap() {
        SessionEvent::TokensRefreshed(tokens) => {
            assert_eq!(tokens.oauth2.access_token, "fresh-token");
            assert_eq!(tokens.oauth1, oauth1_token());
        }
        other => panic!("expected TokensRefreshed, got {other:?}"),
    }
    server.verify().await;
}

#[tokio::test]
async fn test_unauthorized_without_tokens_does_not_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    mount_exchange(&server, "new-token", Duration::ZERO, Some(0)).await;

    let client = test_client(&server);
    let error = client.get_user_settings().await.unwrap_err();

    assert!(matches!(error, GarminError::AuthExpired(_)));
    let request = &server.received_requests().await.unwrap()[0];
    assert!(request.headers.get("authorization").is_none());
    server.verify().await;
}

#[tokio::test]
async fn test_other_statuses_do_not_trigger_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/activity-service/activity/1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/activity-service/activity/2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_exchange(&server, "new-token", Duration::ZERO, Some(0)).await;

    let client = authenticated_client(&server, "old-token").await;

    match client.get_activity(1).await.unwrap_err() {
        GarminError::Api { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "not found");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    let error = client.get_activity(2).await.unwrap_err();
    assert!(matches!(
        error,
        GarminError::Transport {
            status: Some(503),
            ..
        }
    ));
    assert_eq!(client.session().state().await, SessionState::Authenticated);
    server.verify().await;
}

const LOGIN_OAUTH1_TOKEN: &str = "login-oauth1";

/// Login chain that issues its own OAuth1 token and `access_token`
async fn mount_login(server: &MockServer, access_token: &str) {
    mount_sso(server, success_page(TICKET)).await;
    Mock::given(method("GET"))
        .and(path(PREAUTHORIZED_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "oauth_token={LOGIN_OAUTH1_TOKEN}&oauth_token_secret=login-secret"
        )))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(EXCHANGE_PATH))
        .and(query_param("oauth_token", LOGIN_OAUTH1_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(access_token)))
        .expect(1)
        .mount(server)
        .await;
}

/// Exchange for the originally loaded OAuth1 token
fn refresh_exchange(status: u16, delay: Duration) -> Mock {
    let response = if status == 200 {
        ResponseTemplate::new(200).set_body_json(token_body("refreshed-token"))
    } else {
        ResponseTemplate::new(status)
    };
    Mock::given(method("POST"))
        .and(path(EXCHANGE_PATH))
        .and(query_param("oauth_token", OAUTH1_TOKEN))
        .respond_with(response.set_delay(delay))
        .expect(1)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_refresh_does_not_undo_concurrent_login() {
    let server = MockServer::start().await;
    mount_resource(&server, "login-access").await;
    refresh_exchange(500, Duration::from_millis(800))
        .mount(&server)
        .await;
    mount_login(&server, "login-access").await;

    let client = authenticated_client(&server, "old-token").await;
    let call = {
        let client = client.clone();
        tokio::spawn(async move { client.get_user_settings().await })
    };
    tokio::time::sleep(Duration::from_millis(150)).await;
    client.login(None, None).await.unwrap();

    // The stalled call retries with the token issued by the login
    let body = call.await.unwrap().unwrap();
    assert_eq!(body["id"], 42);

    assert_eq!(client.session().state().await, SessionState::Authenticated);
    let tokens = client.export_tokens().await.unwrap();
    assert_eq!(tokens.oauth1.oauth_token, LOGIN_OAUTH1_TOKEN);
    assert_eq!(tokens.oauth2.access_token, "login-access");
    client.get_user_settings().await.unwrap();
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_refresh_survives_concurrent_failed_login() {
    let server = MockServer::start().await;
    mount_resource(&server, "refreshed-token").await;
    refresh_exchange(200, Duration::from_millis(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sso/embed"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(1200)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sso/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = authenticated_client(&server, "old-token").await;
    let call = {
        let client = client.clone();
        tokio::spawn(async move { client.get_user_settings().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    let login_error = client.login(None, None).await.unwrap_err();

    assert!(matches!(
        login_error,
        GarminError::Protocol(garmin_connect::ProtocolFailure::CsrfNotFound)
    ));
    let body = call.await.unwrap().unwrap();
    assert_eq!(body["id"], 42);
    assert_eq!(client.session().state().await, SessionState::Authenticated);
    assert_eq!(
        client.export_tokens().await.unwrap().oauth2.access_token,
        "refreshed-token"
    );
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_successful_refresh_discarded_after_concurrent_login() {
    let server = MockServer::start().await;
    mount_resource(&server, "login-access").await;
    refresh_exchange(200, Duration::from_millis(800))
        .mount(&server)
        .await;
    mount_login(&server, "login-access").await;

    let client = authenticated_client(&server, "old-token").await;
    let mut events = client.subscribe();
    let call = {
        let client = client.clone();
        tokio::spawn(async move { client.get_user_settings().await })
    };
    tokio::time::sleep(Duration::from_millis(150)).await;
    client.login(None, None).await.unwrap();

    call.await.unwrap().unwrap();
    assert_eq!(
        client.export_tokens().await.unwrap().oauth2.access_token,
        "login-access"
    );
    assert!(matches!(events.recv().await.unwrap(), SessionEvent::LoggedIn(_)));
    assert!(events.try_recv().is_err(), "refresh result must not be announced");
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_logout_during_refresh_stays_logged_out() {
    let server = MockServer::start().await;
    mount_resource(&server, "refreshed-token").await;
    refresh_exchange(200, Duration::from_millis(500))
        .mount(&server)
        .await;

    let client = authenticated_client(&server, "old-token").await;
    let call = {
        let client = client.clone();
        tokio::spawn(async move { client.get_user_settings().await })
    };
    tokio::time::sleep(Duration::from_millis(150)).await;
    client.logout().await;

    let error = call.await.unwrap().unwrap_err();
    assert!(matches!(error, GarminError::AuthExpired(_)));
    assert_eq!(client.session().state().await, SessionState::Unauthenticated);
    assert!(client.export_tokens().await.is_err());
    server.verify().await;
}
