use moment_app::{
    feed::{Alert, FeedScreen},
    reminder::{self, ReminderPermission},
};
use moment_store::client::{StoreClient, StoreConfig, StoreError};
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_REMINDER_INTERVAL_SECONDS: u64 = 60;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Error talking to the store: {0}")]
    Store(#[from] StoreError),
    #[error("Error waiting for shutdown signal: {0}")]
    Signal(std::io::Error),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    server_url: String,
    application_id: String,
    client_key: String,
    username: String,
    password: String,
    reminder_interval_seconds: Option<u64>,
    notifications_allowed: Option<bool>,
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "moment_app=debug,moment_store=debug,moment_common=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let store = Arc::new(StoreClient::new(StoreConfig {
        server_url: env.server_url,
        application_id: env.application_id,
        client_key: env.client_key,
    })?);

    let session = Arc::new(store.log_in(&env.username, &env.password).await?);
    info!(user = %session.user().username.get(), "Logged in");

    let permission = if env.notifications_allowed == Some(false) {
        ReminderPermission::Denied
    } else {
        ReminderPermission::Granted
    };
    let interval = Duration::from_secs(
        env.reminder_interval_seconds
            .unwrap_or(DEFAULT_REMINDER_INTERVAL_SECONDS),
    );
    let (delivery, mut reminders) = mpsc::channel(4);
    let reminder_loop = reminder::start(permission, interval, delivery);

    // Stop reminding once the user logs out.
    {
        let reminder_loop = reminder_loop.clone();
        let mut events = session.subscribe();
        tokio::spawn(async move {
            if events.recv().await.is_ok() {
                reminder_loop.cancel();
            }
        });
    }

    tokio::spawn(async move {
        while let Some(notification) = reminders.recv().await {
            info!("{}: {}", notification.title, notification.body);
        }
    });

    let mut screen = FeedScreen::new(Arc::clone(&store), Arc::clone(&session));
    match screen.activate().await {
        Ok(()) => {
            screen.resolve_images().await;
            for row in screen.rows() {
                info!(
                    username = %row.username,
                    posted_at = %row.posted_at_text,
                    revealed = row.revealed,
                    caption = row.caption.as_deref().unwrap_or(""),
                    has_image = row.image().is_some(),
                    "Feed row"
                );
            }
        }
        Err(err) => {
            let alert = Alert::for_error(&err);
            error!("{}: {}", alert.title, alert.message);
        }
    }

    tokio::signal::ctrl_c().await.map_err(InitError::Signal)?;

    store.log_out(&session).await?;
    screen.clear_session();
    info!("Logged out");

    Ok(())
}
