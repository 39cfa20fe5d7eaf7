//! Backend entry-point: configuration, storage, and the HTTP listener.

mod server;

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{DatabaseSettings, ServerConfig, create_server};
use user_admin::inbound::http::session_config::{BuildMode, session_settings_from_env};
use user_admin::inbound::http::state::HttpState;
use user_admin::inbound::http::views::Views;
use user_admin::outbound::persistence::{DbPool, DieselUserRepository};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let database = DatabaseSettings::load_from_iter(env::args_os())
        .map_err(|e| std::io::Error::other(format!("invalid database settings: {e}")))?;
    let pool_config = database
        .pool_config()
        .map_err(|e| std::io::Error::other(format!("invalid database settings: {e}")))?;

    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::current())
        .map_err(|e| std::io::Error::other(format!("invalid session settings: {e}")))?;

    let bind_addr = bind_addr_from_env()?;

    let pool = DbPool::new(pool_config)
        .await
        .map_err(|e| std::io::Error::other(format!("database pool: {e}")))?;
    let views = Views::new().map_err(|e| std::io::Error::other(e.to_string()))?;
    let http_state = HttpState::new(Arc::new(DieselUserRepository::new(pool)), views);

    info!(
        %bind_addr,
        db_host = database.host(),
        db_name = database.name(),
        "starting user admin server"
    );
    create_server(http_state, ServerConfig::new(session, bind_addr))?.await
}

fn bind_addr_from_env() -> std::io::Result<SocketAddr> {
    let raw = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_owned());
    raw.parse()
        .map_err(|e| std::io::Error::other(format!("invalid BIND_ADDR '{raw}': {e}")))
}
