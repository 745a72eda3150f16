mod mocks;

use mocks::StubServer;
use twitch_recorder::error::RecorderError;
use twitch_recorder::twitch::{
    AccessToken, Credentials, HelixClient, PresenceOutcome, PresenceSource, TokenSource,
    TwitchAuth,
};

const LIVE: &str = r#"{"data":[{"user_login":"alice","user_name":"Alice","game_name":"Chess","title":"Late night blitz","viewer_count":42,"started_at":"2024-03-01T20:00:00Z"}],"pagination":{}}"#;
const OFFLINE: &str = r#"{"data":[],"pagination":{}}"#;

fn credentials() -> Credentials {
    Credentials::new("my-client", "my-secret")
}

#[tokio::test]
async fn test_token_request_shape() {
    let server = StubServer::start(200, r#"{"access_token":"abc123","expires_in":5000,"token_type":"bearer"}"#).await;
    let auth = TwitchAuth::new(server.url("/oauth2/token"), credentials()).unwrap();

    let token = auth.fetch_access_token().await.unwrap();

    assert_eq!(token.as_str(), "abc123");
    let request = server.last_request();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/oauth2/token");
    assert_eq!(request.query_value("client_id").as_deref(), Some("my-client"));
    assert_eq!(request.query_value("client_secret").as_deref(), Some("my-secret"));
    assert_eq!(
        request.query_value("grant_type").as_deref(),
        Some("client_credentials")
    );
}

#[tokio::test]
async fn test_token_rejected_is_auth_error() {
    let server = StubServer::start(400, r#"{"status":400,"message":"invalid client"}"#).await;
    let auth = TwitchAuth::new(server.url("/oauth2/token"), credentials()).unwrap();

    let err = auth.fetch_access_token().await.unwrap_err();

    assert!(matches!(err, RecorderError::Auth(_)), "{:?}", err);
}

#[tokio::test]
async fn test_streams_request_shape() {
    let server = StubServer::start(200, OFFLINE).await;
    let client = HelixClient::new(server.url("/helix"), "my-client").unwrap();

    let outcome = client
        .check_live("alice", &AccessToken::new("tok-1"))
        .await;

    assert_eq!(outcome, PresenceOutcome::Offline);
    let request = server.last_request();
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/helix/streams");
    assert_eq!(
        request.query_pairs(),
        vec![("user_login".to_string(), "alice".to_string())]
    );
    assert_eq!(request.header("Client-ID"), Some("my-client"));
    assert_eq!(request.header("Authorization"), Some("Bearer tok-1"));
}

#[tokio::test]
async fn test_live_channel_metadata() {
    let server = StubServer::start(200, LIVE).await;
    let client = HelixClient::new(server.url("/helix/"), "my-client").unwrap();

    let outcome = client.check_live("alice", &AccessToken::new("t")).await;

    let PresenceOutcome::Online(channel) = outcome else {
        panic!("expected online, got {:?}", outcome);
    };
    assert_eq!(channel.title, "Late night blitz");
    assert_eq!(channel.game_name.as_deref(), Some("Chess"));
    assert_eq!(channel.viewer_count, Some(42));
    assert!(channel.started_at.is_some());
}

#[tokio::test]
async fn test_status_mapping() {
    let cases = [
        (401, PresenceOutcome::Unauthorized),
        (404, PresenceOutcome::NotFound),
    ];

    for (status, expected) in cases {
        let server = StubServer::start(status, "{}").await;
        let client = HelixClient::new(server.url("/helix"), "id").unwrap();
        assert_eq!(
            client.check_live("alice", &AccessToken::new("t")).await,
            expected,
            "status {}",
            status
        );
    }

    for status in [429, 500, 503] {
        let server = StubServer::start(status, "{}").await;
        let client = HelixClient::new(server.url("/helix"), "id").unwrap();
        let outcome = client.check_live("alice", &AccessToken::new("t")).await;
        assert!(
            matches!(outcome, PresenceOutcome::TransientError(_)),
            "status {} gave {:?}",
            status,
            outcome
        );
    }
}

#[tokio::test]
async fn test_garbage_body_is_transient() {
    let server = StubServer::start(200, "<html>maintenance</html>").await;
    let client = HelixClient::new(server.url("/helix"), "id").unwrap();

    let outcome = client.check_live("alice", &AccessToken::new("t")).await;

    assert!(matches!(outcome, PresenceOutcome::TransientError(_)));
}

#[tokio::test]
async fn test_unreachable_api_is_transient() {
    let client = HelixClient::new("http://127.0.0.1:9/helix", "id").unwrap();

    let outcome = client.check_live("alice", &AccessToken::new("t")).await;

    assert!(matches!(outcome, PresenceOutcome::TransientError(_)));
}
