use aidx_api::{format_file_size, router, ApiConfig, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ApiConfig::from_env();
    let addr = config.bind_addr();
    tracing::info!("starting AIDX XML to JSON converter service");
    tracing::info!(
        "max file size: {}",
        format_file_size(config.max_content_length)
    );
    tracing::info!(skip_tags = ?config.skip_tags, include_only_tags = ?config.include_only_tags, "parser configuration");

    let app = router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to bind on {addr}");
            std::process::exit(1);
        });
    tracing::info!("listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
