//! HTTP surface for notekeep.
//!
//! Handlers resolve the acting account from the session cookie, run one
//! core use-case and render a JSON view or a redirect.

pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;

use crate::config::{Config, ConfigError};
use crate::state::AppState;
use log::info;
use notekeep_core::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::net::TcpListener;

#[derive(Debug)]
pub enum ServeError {
    Config(ConfigError),
    Db(DbError),
    Io(std::io::Error),
}

impl Display for ServeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "failed to open database: {err}"),
            Self::Io(err) => write!(f, "server i/o failed: {err}"),
        }
    }
}

impl Error for ServeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ServeError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for ServeError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<std::io::Error> for ServeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Opens storage, binds `service.http_bind` and serves until Ctrl-C.
pub async fn serve(config: Config) -> Result<(), ServeError> {
    let http_addr = config.http_addr()?;
    let state = AppState::open(&config)?;
    let app = routes::router(state);

    let listener = TcpListener::bind(http_addr).await?;
    info!(
        "event=http_listen module=web status=ok addr={}",
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=http_shutdown module=web status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler the server runs until killed.
        std::future::pending::<()>().await;
    }
}
