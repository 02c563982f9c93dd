use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use shopqa_data::{FixtureSource, PostgresSource, RecordSource};
use shopqa_model::DeepSeekClient;
use shopqa_rag::OpenAiEmbedder;
use shopqa_server::{app_router, Config, DataStrategy, QaSession};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    let source: Arc<dyn RecordSource> = match config.strategy {
        DataStrategy::Fixture => {
            info!(path = %config.snapshot_path.display(), "using fixture record source");
            Arc::new(FixtureSource::new(&config.snapshot_path))
        }
        DataStrategy::Live => {
            info!(host = %config.db.host, database = %config.db.database, "using live record source");
            Arc::new(PostgresSource::connect(&config.db).await?)
        }
    };

    let embedder = Arc::new(OpenAiEmbedder::new(config.openai_api_key.clone())?);
    let model = Arc::new(DeepSeekClient::new(config.deepseek_api_key.clone())?);
    let session = Arc::new(QaSession::new(source, embedder, model, config.top_k));

    // Build the index up front so the first request doesn't pay for it;
    // failures here are retried lazily on the next request.
    if !session.ensure_initialized().await {
        tracing::warn!("initial index build failed; will retry on first request");
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid SHOPQA_HOST/SHOPQA_PORT")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("shopqa listening on http://{addr}");

    axum::serve(listener, app_router(session)).await?;
    Ok(())
}
