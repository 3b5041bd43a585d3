use pixelboard::config::Config;
use pixelboard::routes;
use pixelboard::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = config.port;
    let state = AppState::from_config(config).expect("whiteboard map load failed");

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "pixelboard listening");
    axum::serve(listener, app).await.expect("server failed");
}
