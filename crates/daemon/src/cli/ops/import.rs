use std::path::PathBuf;

use clap::Args;

use marketplace_daemon::database::{DatabaseSetupError, ImportBundle};
use marketplace_daemon::state::AppState;
use marketplace_daemon::Database;

/// Load a JSON bundle of marketplace documents into the configured database
#[derive(Args, Debug, Clone)]
pub struct Import {
    /// Path to the JSON bundle
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("state error: {0}")]
    State(#[from] marketplace_daemon::state::StateError),
    #[error("unable to read bundle: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid bundle: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid database path: {0}")]
    Url(#[from] url::ParseError),
    #[error("database setup failed: {0}")]
    Setup(#[from] DatabaseSetupError),
    #[error("import failed: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Import {
    type Error = ImportError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;

        let raw = tokio::fs::read_to_string(&self.path).await?;
        let bundle: ImportBundle = serde_json::from_str(&raw)?;

        let url = url::Url::parse(&format!("sqlite://{}", state.db_path.display()))?;
        let db = Database::connect(&url).await?;
        let summary = db.import_bundle(&bundle).await?;

        Ok(summary.to_string())
    }
}
