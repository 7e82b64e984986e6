//! Server: reads settings, opens storage, mounts common and entity routes.

use residence_api::{router, AppState, Settings, Store};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("residence_api=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let store = Store::open(&settings).await?;
    let app = router(AppState::new(store), settings.body_limit);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
