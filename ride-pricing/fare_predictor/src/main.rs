use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use fare_features::{FarePredictor, FeatureVector, LatLon, TripRequest};
use serde_json::Value;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

mod config;
mod model;
mod types;

// ---------- Server state ----------

#[derive(Clone)]
struct AppState {
    predictor: FarePredictor,
    log_features: bool,
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------- Handlers ----------

async fn predict(
    State(state): State<AppState>,
    Json(trip): Json<TripRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let features = state.predictor.features(&trip).map_err(types::reject)?;

    // Debug signal so we can see what the model is actually fed
    if state.log_features {
        log_vector(&features);
    }

    let estimate = state
        .predictor
        .price(&trip, &features)
        .map_err(types::reject)?;

    let variant = state.predictor.profile().variant();
    Ok(Json(types::fare_body(variant, estimate.fare)))
}

async fn health(State(state): State<AppState>) -> Json<types::Health> {
    Json(types::Health {
        status: "ok",
        variant: state.predictor.profile().variant().as_str(),
        model: state.predictor.model_name().to_string(),
        features: state.predictor.schema().names(),
    })
}

fn log_vector(features: &FeatureVector) {
    let sample: Vec<String> = features
        .iter()
        .take(6)
        .map(|(f, v)| format!("{}={:.4}", f, v))
        .collect();
    let nz = features.values().iter().filter(|x| **x != 0.0).count();
    tracing::info!(
        "features in_dim={} nonzero={} sample=[{}]",
        features.len(),
        nz,
        sample.join(", ")
    );
}

// ---------- Startup ----------

/// A trip that every variant can price; used to exercise the model once before serving.
fn warmup_trip() -> TripRequest {
    TripRequest::new(LatLon::new(0.0, 0.0), LatLon::new(0.0, 0.0), 1)
        .with_pickup_datetime("2000-01-03 00:00:00")
        .with_market(1, 1)
}

fn build_state(cfg: &config::ServiceConfig) -> anyhow::Result<AppState> {
    let profile = cfg.profile()?;
    let (mdl, meta) = model::load(&cfg.model_path, &cfg.meta_path)?;

    profile.schema().ensure_matches(&meta.feat_list)?;
    if let Some(trained_for) = meta.variant.as_deref() {
        if trained_for != profile.variant().as_str() {
            tracing::warn!(
                "model metadata says variant {:?}, serving as {}",
                trained_for,
                profile.variant()
            );
        }
    }

    let predictor = FarePredictor::new(profile, mdl)?;
    let warm = predictor.predict(&warmup_trip())?;
    tracing::info!("warmup prediction ok ({:.2})", warm.fare);

    Ok(AppState {
        predictor,
        log_features: cfg.log_predictions,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = config::ServiceConfig::from_env()?;
    let state = build_state(&cfg)?;
    tracing::info!(
        "loaded {} model; variant={} features[{}]: {}",
        state.predictor.model_name(),
        state.predictor.profile().variant(),
        state.predictor.schema().len(),
        state.predictor.schema()
    );

    let addr = cfg.addr()?;
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}
