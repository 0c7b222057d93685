use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::{
    body::{Body, Bytes},
    http::{Response as HttpResponse, StatusCode},
    response::Response,
    routing::{get, post},
    Router,
};
use lora_registry::{MappingEntry, Registry};
use serde::{Deserialize, Serialize};

const MANAGEMENT_PAGE: &str = include_str!("../assets/index.html");

/// Shared server state. The mutex serializes every load-mutate-save sequence
/// so interleaved admin requests cannot lose updates.
pub(crate) struct AppState {
    registry: Mutex<Registry>,
}

#[derive(Serialize)]
struct LoraListResponse {
    success: bool,
    loras: Vec<MappingEntry>,
}

#[derive(Deserialize)]
struct LoraActionRequest {
    action: String,
    #[serde(default)]
    trigger_word: String,
    #[serde(default)]
    lora_file: String,
    #[serde(default = "default_strength")]
    strength: f32,
    #[serde(default)]
    description: String,
}

#[derive(Serialize)]
struct LoraActionResponse {
    success: bool,
    message: String,
}

const fn default_strength() -> f32 {
    1.0
}

pub(crate) async fn serve(registry: Registry, bind: &str, port: u16) -> Result<()> {
    let state = Arc::new(AppState {
        registry: Mutex::new(registry),
    });

    let app = router(state);
    let listener = tokio::net::TcpListener::bind((bind, port)).await?;
    println!("Serving LoRA admin UI on http://{bind}:{port}/");
    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(management_page))
        .route(
            "/api/loras",
            get({
                let state = state.clone();
                move || list_loras(state.clone())
            })
            .post({
                let state = state.clone();
                move |body| lora_action(body, state.clone())
            }),
        )
}

async fn management_page() -> Response {
    HttpResponse::builder()
        .status(StatusCode::OK)
        .header("content-type", "text/html; charset=utf-8")
        .body(Body::from(MANAGEMENT_PAGE))
        .expect("valid HTTP response")
}

pub(crate) async fn list_loras(state: Arc<AppState>) -> Result<Response, StatusCode> {
    let loras = state
        .registry
        .lock()
        .expect("registry mutex poisoned")
        .mappings();
    json_response(&LoraListResponse {
        success: true,
        loras,
    })
}

pub(crate) async fn lora_action(
    body: Bytes,
    state: Arc<AppState>,
) -> Result<Response, StatusCode> {
    let request: LoraActionRequest =
        serde_json::from_slice(&body).map_err(|_| StatusCode::BAD_REQUEST)?;

    let mut registry = state.registry.lock().expect("registry mutex poisoned");
    let (success, message) = match request.action.as_str() {
        "add" => match registry.add(
            &request.trigger_word,
            &request.lora_file,
            request.strength,
            &request.description,
        ) {
            Ok(()) => (
                true,
                format!("added: '{}' -> {}", request.trigger_word, request.lora_file),
            ),
            Err(err) => (false, format!("add failed: {err}")),
        },
        "delete" => match registry.remove(&request.trigger_word) {
            Ok(()) => (true, format!("removed: '{}'", request.trigger_word)),
            Err(err) => (false, format!("remove failed: {err}")),
        },
        other => (false, format!("unknown action: {other}")),
    };
    drop(registry);

    json_response(&LoraActionResponse { success, message })
}

fn json_response<T: Serialize>(payload: &T) -> Result<Response, StatusCode> {
    let bytes = serde_json::to_vec(payload).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(HttpResponse::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .expect("valid HTTP response"))
}
