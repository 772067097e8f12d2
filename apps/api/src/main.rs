mod catalog;
mod config;
mod copywriting;
mod db;
mod errors;
mod llm_client;
mod orders;
mod quotation;
mod receipt;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::db::{create_pool, open_read_only};
use crate::llm_client::LlmClient;
use crate::orders::{legacy::import_legacy, OrderStore};
use crate::receipt::placeholders::RunStyle;
use crate::receipt::preview::HtmlRenderer;
use crate::receipt::templates::TemplateLibrary;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ATM API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite
    let db = create_pool(&config.database_url).await?;
    let store = OrderStore::new(db);

    // One-off import from the older table layout
    if let Some(legacy_url) = &config.legacy_database_url {
        import_legacy_if_empty(&store, legacy_url).await?;
    }

    let catalog = Catalog::load(config.catalog_path.as_deref()).context("Failed to load catalog")?;
    info!(
        "Catalog loaded: {} base plans, {} add-ons",
        catalog.base_plans.len(),
        catalog.add_ons.len()
    );

    let templates = TemplateLibrary::new(config.template_dir.clone());
    info!(
        "Receipt templates in {}: {:?}",
        templates.dir().display(),
        templates.list()?
    );

    // Initialize LLM client
    let llm = LlmClient::new(
        config.llm_api_key.clone(),
        config.llm_base_url.clone(),
        config.llm_model.clone(),
    )?;
    info!("LLM client initialized (model: {})", llm.model());

    // Build app state
    let state = AppState {
        store,
        catalog: Arc::new(catalog),
        templates,
        renderer: Arc::new(HtmlRenderer),
        copy_writer: Arc::new(llm),
        run_style: RunStyle::default(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Copies the legacy table in, but only into an empty canonical table.
async fn import_legacy_if_empty(store: &OrderStore, legacy_url: &str) -> Result<()> {
    if store.count().await? > 0 {
        info!("Work orders already present; skipping legacy import");
        return Ok(());
    }

    let legacy = open_read_only(legacy_url)
        .await
        .with_context(|| format!("Failed to open legacy database '{legacy_url}'"))?;
    let outcome = import_legacy(&legacy, store).await?;
    info!(
        "Imported {} legacy work orders ({} skipped)",
        outcome.imported, outcome.skipped
    );
    legacy.close().await;
    Ok(())
}
