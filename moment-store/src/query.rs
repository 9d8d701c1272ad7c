use moment_common::model::post::Post;
use time::{Duration, UtcDateTime};

pub const FEED_WINDOW: Duration = Duration::hours(24);
pub const FEED_LIMIT: usize = 10;

/// Constraints for one feed retrieval, fixed at the moment the feed screen
/// becomes visible: posts from yesterday onward, newest first, at most
/// [`FEED_LIMIT`] of them.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct FeedQuery {
    since: UtcDateTime,
    until: UtcDateTime,
    limit: usize,
}

impl FeedQuery {
    #[must_use]
    pub fn as_of(now: UtcDateTime) -> Self {
        Self {
            since: now - FEED_WINDOW,
            until: now,
            limit: FEED_LIMIT,
        }
    }

    #[must_use]
    pub fn since(self) -> UtcDateTime {
        self.since
    }

    #[must_use]
    pub fn until(self) -> UtcDateTime {
        self.until
    }

    #[must_use]
    pub fn limit(self) -> usize {
        self.limit
    }

    /// Whether a post created at the given time falls inside the window.
    /// Timestamps are store-assigned, so nothing after `until` should
    /// exist; it is excluded all the same.
    #[must_use]
    pub fn is_eligible(self, created_at: UtcDateTime) -> bool {
        created_at >= self.since && created_at <= self.until
    }

    /// Applies the query's constraints locally: window filter, newest
    /// first, truncated to the limit. The remote store applies the same
    /// constraints server side; this is the reference for what a
    /// conforming reply looks like.
    #[must_use]
    pub fn apply(self, posts: Vec<Post>) -> Vec<Post> {
        let mut eligible: Vec<Post> = posts
            .into_iter()
            .filter(|post| self.is_eligible(post.created_at))
            .collect();
        eligible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        eligible.truncate(self.limit);
        eligible
    }
}
