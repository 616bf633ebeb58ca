use crate::{
    config::AppConfig,
    db::PgStore,
    error::{Result, ServiceError},
    query::{ChartConfig, SalesListing, TextToVizRequest, VizEngine},
    state::AppState,
    store::SalesStore,
};
use axum::{
    extract::{FromRequest, State},
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

/// JSON body extractor whose rejections go through [`ServiceError`], so a
/// malformed body still gets a `{"detail": ...}` response.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ServiceError))]
struct JsonBody<T>(T);

pub struct Server {
    config: Arc<AppConfig>,
    state: AppState,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub db_host: String,
    pub db_name: String,
}

impl Server {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn SalesStore> = Arc::new(PgStore::new(&config.db)?);

        // One-time probe so misconfiguration shows up in the startup logs;
        // requests still connect on their own and fail individually.
        match store.ping().await {
            Ok(()) => info!("database connectivity check succeeded"),
            Err(err) => error!(error = %err, "initial database connectivity check failed"),
        }

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: AppConfig, store: Arc<dyn SalesStore>) -> Self {
        let config = Arc::new(config);
        let engine = VizEngine::new(store);
        let state = AppState::new(Arc::clone(&config), engine);
        Self { config, state }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(Self::root))
            .route("/health", get(Self::health))
            .route("/data/sales", get(Self::sales))
            .route("/query/text-to-viz", post(Self::text_to_viz))
            .with_state(self.state.clone())
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors_layer(&self.config)),
            )
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.config.listen_addr;
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "sales viz API listening");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    async fn root() -> Json<Value> {
        Json(json!({ "message": "AI Viz PoC API is running" }))
    }

    async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
        state.engine.health().await?;
        Ok(Json(HealthResponse {
            status: "healthy",
            database: "connected",
            db_host: state.config.db.display_host().to_string(),
            db_name: state.config.db.display_name().to_string(),
        }))
    }

    async fn sales(State(state): State<AppState>) -> Result<Json<SalesListing>> {
        let listing = state.engine.recent_sales().await?;
        Ok(Json(listing))
    }

    async fn text_to_viz(
        State(state): State<AppState>,
        JsonBody(request): JsonBody<TextToVizRequest>,
    ) -> Result<Json<ChartConfig>> {
        let chart = state.engine.text_to_viz(&request).await?;
        Ok(Json(chart))
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    // No allow_credentials: it cannot be combined with a wildcard origin, and
    // the API has no cookie or auth state to share.
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let Some(configured) = &config.allowed_origins else {
        return layer.allow_origin(Any);
    };

    let origins: Vec<HeaderValue> = configured
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}
