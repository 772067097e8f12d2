use std::sync::Arc;

use crate::catalog::Catalog;
use crate::copywriting::CopyWriter;
use crate::orders::OrderStore;
use crate::receipt::placeholders::RunStyle;
use crate::receipt::preview::DocumentRenderer;
use crate::receipt::templates::TemplateLibrary;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: OrderStore,
    pub catalog: Arc<Catalog>,
    pub templates: TemplateLibrary,
    /// Preview renderer. Default: HtmlRenderer.
    pub renderer: Arc<dyn DocumentRenderer>,
    /// Marketing copy backend. Default: the configured LlmClient.
    pub copy_writer: Arc<dyn CopyWriter>,
    /// Font forced onto every receipt run.
    pub run_style: RunStyle,
}
