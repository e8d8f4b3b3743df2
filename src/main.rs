use std::sync::Arc;

use anyhow::Context;

use mailhook::adapters::AdapterRegistry;
use mailhook::config::{AppConfig, ServerConfig, SharedConfig};
use mailhook::http::email_routes;
use mailhook::pipeline::InboundPipeline;
use mailhook::processor::ProcessorRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let server = ServerConfig::from_env()?;
    let config = AppConfig::from_env();

    eprintln!("📬 mailhook v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Adapter: {}", config.email_service);
    eprintln!(
        "   Processor: {}#{}",
        config.processor.class(),
        config.processor.method()
    );
    for path in server.endpoint_paths() {
        eprintln!("   Endpoint: POST http://0.0.0.0:{}{}", server.port, path);
    }

    // ── Registries ──────────────────────────────────────────────────────
    let adapters = Arc::new(AdapterRegistry::with_builtin());
    let processors = Arc::new(ProcessorRegistry::with_defaults());

    if !adapters.has(&config.email_service).await {
        tracing::warn!(
            adapter = %config.email_service,
            available = ?adapters.list().await,
            "Configured adapter is not registered; requests will fail"
        );
    }

    let pipeline = InboundPipeline::new(adapters, processors, SharedConfig::new(config));
    let app = email_routes(pipeline, &server);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", server.port))
        .await
        .with_context(|| format!("failed to bind port {}", server.port))?;
    tracing::info!(port = server.port, "Webhook server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
