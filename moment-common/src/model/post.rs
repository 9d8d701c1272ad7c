use crate::model::{Id, user::User};
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

/// One user's daily photo submission.
///
/// `created_at` is assigned by the remote store on creation and never
/// changes; this client only ever reads posts.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author: User,
    pub created_at: UtcDateTime,
    pub caption: Option<String>,
    pub image: Option<ImageRef>,
}

/// Reference to an image resource owned by the remote store.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct ImageRef {
    pub url: String,
}
