use clap::Args;

use marketplace_daemon::state::AppState;
use marketplace_daemon::{spawn_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override API server port (default from config)
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Directory for log files (default from config, stdout only if unset)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,

    /// Serve from an in-memory database instead of the configured db.sqlite
    #[arg(long)]
    pub ephemeral: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] marketplace_daemon::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;

        let config = ServiceConfig {
            api_port: self.api_port.unwrap_or(state.config.api_port),
            sqlite_path: (!self.ephemeral).then_some(state.db_path),
            log_level: tracing::Level::DEBUG,
            log_dir: self.log_dir.clone().or(state.config.log_dir),
        };

        spawn_service(&config).await;
        Ok("daemon ended".to_string())
    }
}
