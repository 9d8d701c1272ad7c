use bytes::Bytes;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub type Result<T, E = ImageFetchError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ImageFetchError {
    #[error("The image could not be retrieved: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("The fetch was cancelled before it completed")]
    Cancelled,
    #[error("The fetch task failed: {0}")]
    Task(tokio::task::JoinError),
}

/// Fetches store-hosted images. Cheap to clone; clones share the
/// underlying connection pool.
#[derive(Clone, Debug)]
pub struct ImageLoader {
    http: reqwest::Client,
}

/// Handle to one in-flight image fetch.
///
/// The slot that requested the image owns the handle and cancels it when
/// the slot is reassigned to different content, so a stale image can never
/// land in the wrong place.
#[derive(Debug)]
pub struct ImageRequest {
    cancel: CancellationToken,
    task: JoinHandle<Result<Bytes>>,
}

impl ImageLoader {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Starts fetching the image at `url` in the background.
    #[must_use]
    pub fn fetch(&self, url: &str) -> ImageRequest {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(fetch_bytes(
            self.http.clone(),
            url.to_owned(),
            cancel.clone(),
        ));

        ImageRequest { cancel, task }
    }
}

async fn fetch_bytes(
    http: reqwest::Client,
    url: String,
    cancel: CancellationToken,
) -> Result<Bytes> {
    let request = async {
        let response = http.get(&url).send().await?.error_for_status()?;
        Ok(response.bytes().await?)
    };

    tokio::select! {
        () = cancel.cancelled() => {
            debug!(%url, "Image fetch cancelled");
            Err(ImageFetchError::Cancelled)
        }
        result = request => result,
    }
}

impl ImageRequest {
    /// Cancels the fetch; [`ImageRequest::join`] then reports
    /// [`ImageFetchError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A clone of the request's cancellation token, for observers that
    /// outlive the handle itself.
    #[must_use]
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn join(self) -> Result<Bytes> {
        match self.task.await {
            Ok(result) => result,
            Err(error) if error.is_cancelled() => Err(ImageFetchError::Cancelled),
            Err(error) => Err(ImageFetchError::Task(error)),
        }
    }
}
