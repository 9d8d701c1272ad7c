use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const REMINDER_TITLE: &str = "Moment";
pub const REMINDER_BODY: &str = "Reminder to upload today's photo!";

/// One delivered reminder notification.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Reminder {
    pub title: String,
    pub body: String,
}

/// Outcome of asking the platform for notification authorization.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum ReminderPermission {
    Granted,
    Denied,
}

/// Starts the repeating reminder loop.
///
/// Returns a token that stops the loop when cancelled, for example when
/// the session ends. A denied permission schedules nothing; the app keeps
/// working without reminders.
pub fn start(
    permission: ReminderPermission,
    interval: Duration,
    delivery: mpsc::Sender<Reminder>,
) -> CancellationToken {
    let cancel = CancellationToken::new();

    if permission == ReminderPermission::Denied {
        warn!("Notification permission denied; reminders are disabled");
        return cancel;
    }

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            info!("Reminder loop started (interval={interval:?})");
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        info!("Reminder loop stopped");
                        break;
                    }
                    () = tokio::time::sleep(interval) => {
                        debug!("Delivering reminder");
                        let reminder = Reminder {
                            title: REMINDER_TITLE.to_owned(),
                            body: REMINDER_BODY.to_owned(),
                        };
                        if delivery.send(reminder).await.is_err() {
                            // Receiver gone, nothing left to remind.
                            break;
                        }
                    }
                }
            }
        });
    }

    cancel
}

#[cfg(test)]
mod tests {
    use crate::reminder::{REMINDER_BODY, REMINDER_TITLE, ReminderPermission, start};
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn delivers_on_the_interval_until_cancelled() {
        let (delivery, mut reminders) = mpsc::channel(4);
        let cancel = start(
            ReminderPermission::Granted,
            Duration::from_secs(60),
            delivery,
        );

        let first = reminders.recv().await.unwrap();
        assert_eq!(first.title, REMINDER_TITLE);
        assert_eq!(first.body, REMINDER_BODY);

        let second = reminders.recv().await.unwrap();
        assert_eq!(second, first);

        cancel.cancel();
        assert!(reminders.recv().await.is_none());
    }

    #[tokio::test]
    async fn denied_permission_schedules_nothing() {
        let (delivery, mut reminders) = mpsc::channel(4);
        let cancel = start(
            ReminderPermission::Denied,
            Duration::from_millis(1),
            delivery,
        );

        assert!(reminders.recv().await.is_none());
        assert!(!cancel.is_cancelled());
    }
}
