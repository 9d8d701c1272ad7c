use bytes::Bytes;
use moment_common::{
    model::{post::Post, user::User},
    reveal,
};
use moment_store::{
    client::{StoreClient, StoreError},
    image::{ImageLoader, ImageRequest},
    session::Session,
};
use std::sync::Arc;
use thiserror::Error;
use time::{
    OffsetDateTime, UtcDateTime, format_description::BorrowedFormatItem,
    macros::format_description,
};
use tracing::warn;

const POSTED_AT_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[weekday repr:long], [month repr:long] [day padding:none], [year]");

pub type Result<T, E = FeedError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("You need to be logged in to view the feed")]
    AuthenticationRequired,
    #[error(transparent)]
    Fetch(#[from] StoreError),
}

/// Dialog contents for a failed feed refresh.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    #[must_use]
    pub fn for_error(error: &FeedError) -> Self {
        Self {
            title: "Couldn't load the feed".to_owned(),
            message: error.to_string(),
        }
    }
}

/// One rendered feed entry. The image arrives independently of the row; a
/// failed fetch leaves the slot empty without disturbing the rest of the
/// feed.
#[derive(Debug)]
pub struct FeedRow {
    pub username: String,
    pub caption: Option<String>,
    pub posted_at: UtcDateTime,
    pub posted_at_text: String,
    pub revealed: bool,
    image: ImageSlot,
}

#[derive(Debug, Default)]
enum ImageSlot {
    #[default]
    Empty,
    Pending(ImageRequest),
    Ready(Bytes),
    Failed,
}

impl FeedRow {
    fn new(post: Post, viewer: &User, images: &ImageLoader) -> Self {
        let image = match &post.image {
            Some(image_ref) => ImageSlot::Pending(images.fetch(&image_ref.url)),
            None => ImageSlot::Empty,
        };

        Self {
            username: post.author.username.get().to_owned(),
            caption: post.caption,
            posted_at: post.created_at,
            posted_at_text: posted_at_text(post.created_at),
            revealed: reveal::is_revealed(post.created_at, viewer.last_posted_at),
            image,
        }
    }

    /// Cancels a still-pending image fetch; called when the slot holding
    /// this row is reassigned.
    fn recycle(&self) {
        if let ImageSlot::Pending(request) = &self.image {
            request.cancel();
        }
    }

    pub async fn resolve_image(&mut self) {
        let ImageSlot::Pending(request) = std::mem::take(&mut self.image) else {
            return;
        };

        self.image = match request.join().await {
            Ok(bytes) => ImageSlot::Ready(bytes),
            Err(error) => {
                warn!(%error, "Error fetching image");
                ImageSlot::Failed
            }
        };
    }

    #[must_use]
    pub fn image(&self) -> Option<&Bytes> {
        match &self.image {
            ImageSlot::Ready(bytes) => Some(bytes),
            ImageSlot::Empty | ImageSlot::Pending(_) | ImageSlot::Failed => None,
        }
    }
}

fn posted_at_text(stamp: UtcDateTime) -> String {
    let stamp = OffsetDateTime::from(stamp);
    stamp
        .format(POSTED_AT_FORMAT)
        .unwrap_or_else(|_| stamp.to_string())
}

/// The feed screen: asks the store for the window of recent posts and
/// renders them as rows, obscured or revealed per viewer.
#[derive(Debug)]
pub struct FeedScreen {
    store: Arc<StoreClient>,
    images: ImageLoader,
    session: Option<Arc<Session>>,
    rows: Vec<FeedRow>,
}

impl FeedScreen {
    #[must_use]
    pub fn new(store: Arc<StoreClient>, session: Arc<Session>) -> Self {
        let images = ImageLoader::new(store.http());

        Self {
            store,
            images,
            session: Some(session),
            rows: Vec::new(),
        }
    }

    /// Refreshes the feed. Runs every time the screen becomes visible; on
    /// failure the previously rendered rows stay in place.
    pub async fn activate(&mut self) -> Result<()> {
        let session = self
            .session
            .clone()
            .ok_or(FeedError::AuthenticationRequired)?;

        let posts = self
            .store
            .fetch_feed(&session, UtcDateTime::now())
            .await?;

        for row in &self.rows {
            row.recycle();
        }
        self.rows = posts
            .into_iter()
            .map(|post| FeedRow::new(post, session.user(), &self.images))
            .collect();

        Ok(())
    }

    pub async fn resolve_images(&mut self) {
        for row in &mut self.rows {
            row.resolve_image().await;
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[FeedRow] {
        &self.rows
    }

    /// Drops the session and everything rendered under it; the next
    /// activation fails the authentication gate.
    pub fn clear_session(&mut self) {
        self.session = None;
        for row in &self.rows {
            row.recycle();
        }
        self.rows.clear();
    }
}
