use axum::{http::StatusCode, Json};
use fare_features::{FareError, Variant};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// `{"fare": x}` or `{"predicted_fare": x}`, depending on the variant.
pub fn fare_body(variant: Variant, fare: f64) -> Value {
    let mut body = Map::new();
    body.insert(variant.response_key().to_string(), json!(fare));
    Value::Object(body)
}

/// Map a pipeline error onto an HTTP status and `{"error": ..}` body.
pub fn reject(err: FareError) -> (StatusCode, Json<Value>) {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!("prediction failed: {}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(json!({ "error": err.to_string() })))
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub variant: &'static str,
    pub model: String,
    pub features: Vec<&'static str>,
}
