use std::net::SocketAddr;

use axum::extract::MatchedPath;
use dotenvy::dotenv;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use notewiki::application::services::template::PageTemplate;
use notewiki::bootstrap::app_context::{AppContext, AppServices, build_note_store};
use notewiki::bootstrap::config::Config;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(?e, "shutdown_signal_failed");
    }
    info!("shutdown_requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "notewiki=debug,tower_http=info".into()),
        )
        .init();

    let cfg = Config::from_env()?;
    info!(
        port = cfg.api_port,
        backend = ?cfg.storage_backend,
        roots = cfg.root_notes.len(),
        build = %cfg.build,
        "Starting notewiki"
    );

    let template = PageTemplate::load(&cfg.template_path, cfg.build.clone()).await?;
    let store = build_note_store(&cfg)?;
    let services = AppServices::new(&cfg, store, template);
    let ctx = AppContext::new(cfg.clone(), services);

    // pages appear as the crawl reaches them; serving starts right away
    let engine = ctx.sync_engine();
    let crawl_handle: JoinHandle<()> = tokio::spawn(async move {
        engine.crawl().await;
    });

    let app = notewiki::presentation::http::router(ctx).layer(
        TraceLayer::new_for_http().make_span_with(|req: &http::Request<_>| {
            let method = req.method().clone();
            let uri = req.uri().clone();
            let matched = req
                .extensions()
                .get::<MatchedPath>()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default();
            tracing::info_span!("http", %method, %uri, matched_path = %matched)
        }),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.api_port));
    info!(%addr, "HTTP listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let api_handle: JoinHandle<anyhow::Result<()>> = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    });

    match api_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(?e, "HTTP server task failed"),
        Err(e) => error!(?e, "HTTP server task panicked"),
    }

    if !crawl_handle.is_finished() {
        crawl_handle.abort();
    }
    Ok(())
}
