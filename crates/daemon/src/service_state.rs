use tokio::sync::watch;
use url::Url;

use super::service_config::Config;
use crate::database::{Database, DatabaseSetupError};

/// Shared service state handed to every request handler.
#[derive(Clone)]
pub struct State {
    database: Database,
    shutdown: Option<watch::Receiver<()>>,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        let sqlite_database_url = match config.sqlite_path {
            Some(ref path) => {
                if !path.exists() {
                    return Err(StateSetupError::DatabasePathDoesNotExist);
                }
                Url::parse(&format!("sqlite://{}", path.display()))
                    .map_err(|_| StateSetupError::InvalidDatabaseUrl)
            }
            // otherwise just set up an in-memory database
            None => Url::parse("sqlite::memory:").map_err(|_| StateSetupError::InvalidDatabaseUrl),
        }?;
        tracing::info!("Database URL: {:?}", sqlite_database_url);
        let database = Database::connect(&sqlite_database_url).await?;

        Ok(Self::from_database(database))
    }

    pub fn from_database(database: Database) -> Self {
        Self {
            database,
            shutdown: None,
        }
    }

    /// Watch the process shutdown signal so readiness can report it.
    pub fn with_shutdown(mut self, shutdown_rx: watch::Receiver<()>) -> Self {
        self.shutdown = Some(shutdown_rx);
        self
    }

    /// True once shutdown was signalled or every shutdown sender is gone.
    pub fn is_shutting_down(&self) -> bool {
        match &self.shutdown {
            Some(rx) => rx.has_changed().unwrap_or(true),
            None => false,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Database path does not exist")]
    DatabasePathDoesNotExist,
    #[error("Database setup error")]
    DatabaseSetupError(#[from] DatabaseSetupError),
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,
}
