use moment_store::client::{StoreClient, StoreConfig, StoreError};
use serde_json::json;
use time::{
    Duration, OffsetDateTime, UtcDateTime, format_description::well_known::Rfc3339,
    macros::utc_datetime,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

fn client(server: &MockServer) -> StoreClient {
    StoreClient::new(StoreConfig {
        server_url: server.uri(),
        application_id: "app-id".to_owned(),
        client_key: "client-key".to_owned(),
    })
    .unwrap()
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .and(query_param("username", "benjamin"))
        .and(query_param("password", "hunter2"))
        .and(header("X-Parse-Application-Id", "app-id"))
        .and(header("X-Parse-Client-Key", "client-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objectId": "UsEr567890",
            "username": "benjamin",
            "lastPostedDate": { "__type": "Date", "iso": "2026-06-02T10:00:00.000Z" },
            "sessionToken": "r:abc123"
        })))
        .mount(server)
        .await;
}

fn rfc3339(stamp: UtcDateTime) -> String {
    OffsetDateTime::from(stamp).format(&Rfc3339).unwrap()
}

#[tokio::test]
async fn login_yields_a_session_with_the_user_resolved() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let session = client(&server).log_in("benjamin", "hunter2").await.unwrap();

    assert_eq!(session.user().username.get(), "benjamin");
    assert_eq!(
        session.user().last_posted_at,
        Some(utc_datetime!(2026-06-02 10:00))
    );
}

#[tokio::test]
async fn login_without_session_token_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objectId": "UsEr567890",
            "username": "benjamin"
        })))
        .mount(&server)
        .await;

    let result = client(&server).log_in("benjamin", "hunter2").await;

    assert!(matches!(result, Err(StoreError::MissingSessionToken)));
}

#[tokio::test]
async fn fetch_feed_sends_the_constrained_query() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let as_of = utc_datetime!(2026-06-05 12:00);
    let since = rfc3339(as_of - Duration::hours(24));
    let expected_where =
        format!(r#"{{"createdAt":{{"$gte":{{"__type":"Date","iso":"{since}"}}}}}}"#);

    Mock::given(method("GET"))
        .and(path("/classes/Post"))
        .and(query_param("where", expected_where))
        .and(query_param("order", "-createdAt"))
        .and(query_param("limit", "10"))
        .and(query_param("include", "user"))
        .and(header("X-Parse-Application-Id", "app-id"))
        .and(header("X-Parse-Session-Token", "r:abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {
                    "objectId": "PostNewer1",
                    "createdAt": "2026-06-05T11:00:00.000Z",
                    "caption": "lunch",
                    "user": { "objectId": "UsEr567890", "username": "benjamin" }
                },
                {
                    "objectId": "PostOlder1",
                    "createdAt": "2026-06-05T09:00:00.000Z",
                    "user": { "objectId": "FriendId12", "username": "ada" }
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let session = client.log_in("benjamin", "hunter2").await.unwrap();

    let posts = client.fetch_feed(&session, as_of).await.unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id.get(), "PostNewer1");
    assert_eq!(posts[0].caption.as_deref(), Some("lunch"));
    assert_eq!(posts[1].author.username.get(), "ada");
}

#[tokio::test]
async fn server_rejection_carries_the_error_description() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/classes/Post"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 209,
            "error": "invalid session token"
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let session = client.log_in("benjamin", "hunter2").await.unwrap();

    let error = client
        .fetch_feed(&session, utc_datetime!(2026-06-05 12:00))
        .await
        .unwrap_err();

    assert!(matches!(&error, StoreError::Rejected(message) if message == "invalid session token"));
}

#[tokio::test]
async fn post_missing_its_author_is_invalid_data() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/classes/Post"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "objectId": "PostNoUser", "createdAt": "2026-06-05T11:00:00.000Z" }
            ]
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let session = client.log_in("benjamin", "hunter2").await.unwrap();

    let error = client
        .fetch_feed(&session, utc_datetime!(2026-06-05 12:00))
        .await
        .unwrap_err();

    assert!(matches!(error, StoreError::Data(_)));
}

#[tokio::test]
async fn logout_broadcasts_even_when_the_server_fails() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client(&server);
    let session = client.log_in("benjamin", "hunter2").await.unwrap();
    let mut events = session.subscribe();

    let result = client.log_out(&session).await;

    assert!(result.is_err());
    assert!(events.recv().await.is_ok());
}
