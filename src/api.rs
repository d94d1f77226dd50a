use std::path::PathBuf;

use rocket::fs::NamedFile;
use rocket::http::Status;
use rocket::serde::json::{self, Json};
use rocket::{Request, State};
use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::prompts::{self, PlanKind, UnknownPlan};
use crate::types::{
    AlertRequest,
    AlertResponse,
    ChatRequest,
    ChatResponse,
    ErrorResponse,
    HealthResponse,
    PlanResponse,
    PlannerRequest,
    PredictResponse,
};

/// Directory holding `index.html` and the page's assets.
pub struct StaticDir(pub PathBuf);

#[get("/")]
pub async fn index(dir: &State<StaticDir>) -> Option<NamedFile> {
    NamedFile::open(dir.0.join("index.html")).await.ok()
}

#[get("/health")]
pub async fn health(state: &State<AppState>) -> Json<HealthResponse> {
    let status = if state.is_degraded() { "degraded" } else { "ok" };
    Json(HealthResponse {
        status: status.to_string(),
        model_loaded: state.pipeline().is_some(),
        chat_available: state.engine().is_some(),
    })
}

#[post("/predict_stroke", data = "<body>")]
pub async fn predict_stroke(
    state: &State<AppState>,
    body: Result<Json<Map<String, Value>>, json::Error<'_>>,
) -> Result<Json<PredictResponse>, ApiError> {
    let pipeline = state.pipeline().ok_or_else(ApiError::model_not_loaded)?;

    let record = match body {
        Ok(Json(record)) if !record.is_empty() => record,
        _ => return Err(ApiError::BadRequest("No input data provided.".to_string())),
    };

    let prediction = tokio::task::spawn_blocking(move || pipeline.predict_record(&record))
        .await
        .map_err(ApiError::prediction_failed)??;

    Ok(Json(PredictResponse {
        prediction: prediction.label.as_str().to_string(),
        probability: prediction.probability,
    }))
}

#[post("/chatbot", data = "<body>")]
pub async fn chatbot(
    state: &State<AppState>,
    body: Result<Json<ChatRequest>, json::Error<'_>>,
) -> Result<Json<ChatResponse>, ApiError> {
    let engine = state.engine().ok_or_else(ApiError::engine_not_initialized)?;

    let message = body
        .ok()
        .and_then(|Json(req)| prompt_text(req.message))
        .ok_or_else(|| ApiError::BadRequest("No message provided for chatbot.".to_string()))?;

    let reply = engine.generate(&prompts::chat_parts(&message)).await.map_err(|e| {
        error!(error = %e, "Gemini API error");
        ApiError::from(e)
    })?;

    Ok(Json(ChatResponse {
        reply: reply.trim().to_string(),
    }))
}

#[post("/alert_system", data = "<body>")]
pub fn alert_system(body: Result<Json<AlertRequest>, json::Error<'_>>) -> Json<AlertResponse> {
    let request = body.map(Json::into_inner).unwrap_or_default();
    let patient_info = describe(request.patient_info.as_ref());
    let risk_level = describe(request.risk_level.as_ref());

    // stand-in for caregiver notification
    warn!("ALERT: High stroke risk detected for {patient_info} with risk level {risk_level}!");

    Json(AlertResponse {
        status: "Alert processed".to_string(),
        message: "Caregivers would be notified.".to_string(),
    })
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "N/A".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Text for a prompt field. Empty and zero-like values count as absent;
/// other non-string values are forwarded as their JSON text.
fn prompt_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Object(fields) if fields.is_empty() => None,
        other => Some(other.to_string()),
    }
}

#[post("/planner/<plan_type>", data = "<body>")]
pub async fn planner(
    state: &State<AppState>,
    plan_type: Result<PlanKind, UnknownPlan>,
    body: Result<Json<PlannerRequest>, json::Error<'_>>,
) -> Result<Json<PlanResponse>, ApiError> {
    let plan = plan_type.map_err(|_| ApiError::BadRequest("Invalid planner type.".to_string()))?;
    let engine = state.engine().ok_or_else(ApiError::engine_not_initialized)?;

    let input = body
        .ok()
        .and_then(|Json(req)| prompt_text(req.input))
        .ok_or_else(|| ApiError::BadRequest(format!("No input provided for {plan} planner.")))?;

    let reply = engine.generate(&plan.parts(&input)).await.map_err(|e| {
        error!(error = %e, plan = %plan, "Gemini API error");
        ApiError::from(e)
    })?;

    Ok(Json(PlanResponse {
        plan: reply.trim().to_string(),
    }))
}

#[catch(default)]
pub fn default_catcher(status: Status, _req: &Request<'_>) -> (Status, Json<ErrorResponse>) {
    let error = status.reason().unwrap_or("Unknown error").to_string();
    (status, Json(ErrorResponse { error }))
}
