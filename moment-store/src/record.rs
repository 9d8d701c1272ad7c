//! Wire shapes of the remote store's JSON replies.
//!
//! Object timestamps come back as plain RFC 3339 strings, while date
//! fields inside an object use the `{"__type": "Date", "iso": ...}`
//! envelope; query constraints on the request side use the envelope form
//! as well.

use moment_common::model::{
    ModelValidationError,
    post::{ImageRef, Post},
    user::{User, Username},
};
use serde::Deserialize;
use thiserror::Error;
use time::{OffsetDateTime, UtcDateTime, format_description::well_known::Rfc3339};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("A timestamp in the reply could not be parsed: {0}")]
    Timestamp(#[from] time::error::Parse),
    #[error("An object in the reply was invalid: {0}")]
    Validation(#[from] ModelValidationError),
    #[error("A post record was missing its embedded author")]
    MissingAuthor,
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
pub(crate) struct FeedResponse {
    pub results: Vec<PostRecord>,
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostRecord {
    pub object_id: String,
    pub created_at: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub image_file: Option<FileValue>,
    #[serde(default)]
    pub user: Option<UserRecord>,
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserRecord {
    pub object_id: String,
    pub username: String,
    #[serde(default)]
    pub last_posted_date: Option<DateValue>,
    #[serde(default)]
    pub session_token: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
pub(crate) struct DateValue {
    pub iso: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
pub(crate) struct FileValue {
    pub url: String,
}

pub(crate) fn parse_timestamp(iso: &str) -> Result<UtcDateTime, time::error::Parse> {
    Ok(OffsetDateTime::parse(iso, &Rfc3339)?.to_utc())
}

pub(crate) fn format_timestamp(stamp: UtcDateTime) -> Result<String, time::error::Format> {
    OffsetDateTime::from(stamp).format(&Rfc3339)
}

impl TryFrom<UserRecord> for User {
    type Error = RecordError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let last_posted_at = value
            .last_posted_date
            .map(|date| parse_timestamp(&date.iso))
            .transpose()?;

        Ok(Self {
            id: value.object_id.into(),
            username: Username::new(value.username).map_err(ModelValidationError::Username)?,
            last_posted_at,
        })
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = RecordError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        let author = value.user.ok_or(RecordError::MissingAuthor)?.try_into()?;

        Ok(Self {
            id: value.object_id.into(),
            author,
            created_at: parse_timestamp(&value.created_at)?,
            caption: value.caption,
            image: value.image_file.map(|file| ImageRef { url: file.url }),
        })
    }
}
