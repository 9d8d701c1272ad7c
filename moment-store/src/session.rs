use moment_common::model::user::User;
use std::fmt::{Debug, Formatter};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 4;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum SessionEvent {
    LoggedOut,
}

/// The authenticated-user context.
///
/// Created by a successful login and passed explicitly to session-scoped
/// operations. Anything that needs to react to the end of the session
/// subscribes here instead of watching process-wide state.
#[derive(Debug)]
pub struct Session {
    user: User,
    token: SessionToken,
    events: broadcast::Sender<SessionEvent>,
}

#[derive(Clone, Eq, PartialEq, Hash)]
pub(crate) struct SessionToken(pub(crate) String);

impl Debug for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionToken").field(&"[redacted]").finish()
    }
}

impl Session {
    pub(crate) fn new(user: User, token: SessionToken) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            user,
            token,
            events,
        }
    }

    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }

    pub(crate) fn token(&self) -> &str {
        &self.token.0
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn end(&self) {
        // Nobody listening is fine.
        let _ = self.events.send(SessionEvent::LoggedOut);
    }
}

#[cfg(test)]
mod tests {
    use crate::session::{Session, SessionEvent, SessionToken};
    use moment_common::model::user::{User, Username};

    fn session() -> Session {
        let user = User {
            id: "UsEr567890".into(),
            username: Username::new("benjamin".to_owned()).unwrap(),
            last_posted_at: None,
        };
        Session::new(user, SessionToken("r:secret".to_owned()))
    }

    #[tokio::test]
    async fn subscribers_observe_the_logout() {
        let session = session();
        let mut events = session.subscribe();

        session.end();

        assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedOut);
    }

    #[test]
    fn token_is_redacted_in_debug_output() {
        let rendered = format!("{:?}", session());
        assert!(!rendered.contains("secret"));
    }
}
