//! The post-visibility rule.
//!
//! A post's photo is shown plainly only to viewers whose own most recent
//! post falls within [`REVEAL_WINDOW`] of the post's creation time. The
//! comparison is between the two post timestamps, not against the current
//! time: posting today reveals yesterday evening's posts, never last
//! week's. A viewer who has never posted sees everything obscured.

use time::{Duration, UtcDateTime};

pub const REVEAL_WINDOW: Duration = Duration::hours(24);

#[must_use]
pub fn is_revealed(
    post_created_at: UtcDateTime,
    viewer_last_posted_at: Option<UtcDateTime>,
) -> bool {
    let Some(last_posted_at) = viewer_last_posted_at else {
        return false;
    };

    (post_created_at - last_posted_at).abs() < REVEAL_WINDOW
}
