use crate::{
    query::FeedQuery,
    record::{self, FeedResponse, RecordError, UserRecord},
    session::{Session, SessionToken},
};
use moment_common::model::{post::Post, user::User};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use time::UtcDateTime;
use tracing::debug;

const APPLICATION_ID_HEADER: &str = "X-Parse-Application-Id";
const CLIENT_KEY_HEADER: &str = "X-Parse-Client-Key";
const SESSION_TOKEN_HEADER: &str = "X-Parse-Session-Token";

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("The server URL is invalid: {0}")]
    InvalidServerUrl(String),
    #[error("The request could not be sent: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("The server rejected the request: {0}")]
    Rejected(String),
    #[error(transparent)]
    Data(#[from] RecordError),
    #[error("A query timestamp could not be encoded: {0}")]
    QueryTimestamp(#[from] time::error::Format),
    #[error("The login reply did not include a session token")]
    MissingSessionToken,
}

/// Connection settings for the remote object store.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct StoreConfig {
    pub server_url: String,
    pub application_id: String,
    pub client_key: String,
}

/// Client of the remote object store. All operations are plain reads or
/// single writes; re-invoking any of them is safe.
#[derive(Debug)]
pub struct StoreClient {
    http: reqwest::Client,
    base: String,
    application_id: String,
    client_key: String,
}

impl StoreClient {
    pub fn new(config: StoreConfig) -> Result<Self> {
        reqwest::Url::parse(&config.server_url)
            .map_err(|_| StoreError::InvalidServerUrl(config.server_url.clone()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            base: config.server_url.trim_end_matches('/').to_owned(),
            application_id: config.application_id,
            client_key: config.client_key,
        })
    }

    /// The underlying HTTP client, so image fetches share the pool.
    #[must_use]
    pub fn http(&self) -> reqwest::Client {
        self.http.clone()
    }

    pub async fn log_in(&self, username: &str, password: &str) -> Result<Session> {
        let response = self
            .http
            .get(format!("{}/login", self.base))
            .query(&[("username", username), ("password", password)])
            .header(APPLICATION_ID_HEADER, &self.application_id)
            .header(CLIENT_KEY_HEADER, &self.client_key)
            .send()
            .await?;

        let mut record: UserRecord = check(response).await?.json().await?;
        let token = record
            .session_token
            .take()
            .ok_or(StoreError::MissingSessionToken)?;
        let user = User::try_from(record)?;

        debug!(user = %user.username.get(), "Logged in");
        Ok(Session::new(user, SessionToken(token)))
    }

    /// Retrieves the feed as of the given wall-clock time: posts from the
    /// last 24 hours, newest first, at most ten, each with its author
    /// resolved. A failure leaves nothing half-done; the caller keeps
    /// whatever it was showing before.
    pub async fn fetch_feed(&self, session: &Session, as_of: UtcDateTime) -> Result<Vec<Post>> {
        let query = FeedQuery::as_of(as_of);
        let since = record::format_timestamp(query.since())?;
        let constraint = json!({
            "createdAt": { "$gte": { "__type": "Date", "iso": since } }
        });

        let response = self
            .http
            .get(format!("{}/classes/Post", self.base))
            .query(&[
                ("where", constraint.to_string()),
                ("order", "-createdAt".to_owned()),
                ("limit", query.limit().to_string()),
                ("include", "user".to_owned()),
            ])
            .header(APPLICATION_ID_HEADER, &self.application_id)
            .header(CLIENT_KEY_HEADER, &self.client_key)
            .header(SESSION_TOKEN_HEADER, session.token())
            .send()
            .await?;

        let feed: FeedResponse = check(response).await?.json().await?;
        let posts = feed
            .results
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = posts.len(), "Fetched feed");
        Ok(posts)
    }

    /// Ends the session. The logout event fires even if the server request
    /// fails; local state must not outlive the user's intent.
    pub async fn log_out(&self, session: &Session) -> Result<()> {
        let outcome = self
            .http
            .post(format!("{}/logout", self.base))
            .header(APPLICATION_ID_HEADER, &self.application_id)
            .header(CLIENT_KEY_HEADER, &self.client_key)
            .header(SESSION_TOKEN_HEADER, session.token())
            .send()
            .await;

        session.end();

        check(outcome?).await?;
        Ok(())
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Turns a non-success reply into the human-readable rejection the shell
/// presents.
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };
    Err(StoreError::Rejected(message))
}
