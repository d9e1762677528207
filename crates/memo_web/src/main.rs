//! Memo board web server.
//!
//! Default: http://127.0.0.1:8000/

use log::info;
use memo_core::{init_logging_to, open_db};
use memo_web::{build_router, AppState, WebConfig};
use std::error::Error;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    if let Err(err) = run().await {
        eprintln!("memo_web: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = WebConfig::from_env()?;
    init_logging_to(&config.log_level, config.log_sink.clone())?;

    info!(
        "event=db_path module=web status=ok path={}",
        config.db_path
    );
    let conn = open_db(&config.db_path)?;
    let state = Arc::new(AppState::new(conn, config.time_zone));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!(
        "event=http_listen module=web status=ok addr=http://{} time_zone={}",
        config.http_addr,
        config.time_zone.name()
    );

    axum::serve(listener, app).await?;
    Ok(())
}
