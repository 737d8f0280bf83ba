use std::path::PathBuf;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::{
    app_state::{lock_status, read_kb, write_kb, AppState, Status},
    error::RagError,
    ingest,
    knowledge_base::KnowledgeBaseStats,
    models::{Document, IngestReport, ScoredChunk},
    rag::{self, RagAnswer},
};

type ApiError = (StatusCode, Json<serde_json::Value>);

// --- Payloads y Respuestas de la API ---

#[derive(Deserialize)]
pub struct UploadDocumentPayload {
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub text: String,
}

#[derive(Deserialize)]
pub struct RetrievePayload {
    pub query: String,
    #[serde(default)]
    pub max_results: Option<usize>,
}

#[derive(Deserialize)]
pub struct RagQueryPayload {
    pub question: String,
}

#[derive(Deserialize)]
pub struct IngestDirectoryPayload {
    pub path: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub status: Status,
    pub knowledge_base: KnowledgeBaseStats,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

fn map_rag_error(err: RagError) -> ApiError {
    let status = match err {
        RagError::DuplicateDocument { .. } => StatusCode::CONFLICT,
        ref e if e.is_ingestion() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, err.to_string())
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/documents",
            get(list_documents_handler)
                .post(upload_document_handler)
                .delete(clear_handler),
        )
        .route("/api/retrieve", post(retrieve_handler))
        .route("/api/rag-query", post(rag_query_handler))
        .route("/api/ingest-directory", post(ingest_directory_handler))
        .route("/api/status", get(status_handler))
        .route("/api/shutdown", post(shutdown_handler))
        .with_state(app_state)
}

// --- Handlers ---

#[axum::debug_handler]
async fn list_documents_handler(State(state): State<AppState>) -> Json<Vec<Document>> {
    Json(read_kb(&state.knowledge_base).documents().to_vec())
}

#[axum::debug_handler]
async fn upload_document_handler(
    State(state): State<AppState>,
    Json(payload): Json<UploadDocumentPayload>,
) -> Result<(StatusCode, Json<IngestReport>), ApiError> {
    let mime_type = payload
        .mime_type
        .unwrap_or_else(|| "text/plain".to_string());
    if !mime_type.starts_with("text/") {
        return Err(error_response(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!("Sólo se admiten documentos de texto plano (recibido '{mime_type}')."),
        ));
    }

    let size_bytes = payload.text.len() as u64;
    let report = write_kb(&state.knowledge_base)
        .ingest_document(&payload.name, &mime_type, size_bytes, &payload.text)
        .map_err(map_rag_error)?;

    Ok((StatusCode::CREATED, Json(report)))
}

#[axum::debug_handler]
async fn clear_handler(State(state): State<AppState>) -> StatusCode {
    write_kb(&state.knowledge_base).clear();
    StatusCode::NO_CONTENT
}

#[axum::debug_handler]
async fn retrieve_handler(
    State(state): State<AppState>,
    Json(payload): Json<RetrievePayload>,
) -> Json<Vec<ScoredChunk>> {
    let kb = read_kb(&state.knowledge_base);
    let max_results = payload
        .max_results
        .unwrap_or(kb.ranking().max_results);
    Json(kb.search(&payload.query, max_results))
}

#[axum::debug_handler]
async fn rag_query_handler(
    State(state): State<AppState>,
    Json(payload): Json<RagQueryPayload>,
) -> Result<Json<RagAnswer>, ApiError> {
    if payload.question.trim().is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "La pregunta no puede estar vacía.",
        ));
    }

    let answer = rag::answer_question(
        &state.knowledge_base,
        state.generator.as_ref(),
        state.expander.as_ref(),
        &payload.question,
        state.config.ranking.max_results,
    )
    .await;

    Ok(Json(answer))
}

#[axum::debug_handler]
async fn ingest_directory_handler(
    State(state): State<AppState>,
    Json(payload): Json<IngestDirectoryPayload>,
) -> Result<StatusCode, ApiError> {
    let root_dir = PathBuf::from(&payload.path);
    if !root_dir.is_dir() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "La ruta proporcionada no es un directorio válido.",
        ));
    }

    {
        let mut status = lock_status(&state.status);
        if status.is_busy {
            return Err(error_response(
                StatusCode::CONFLICT,
                "Ya hay una indexación en curso.",
            ));
        }
        status.is_busy = true;
        status.message = "Iniciando indexación...".to_string();
        status.progress = 0.0;
    }

    tokio::task::spawn_blocking(move || {
        let result = ingest::ingest_directory(&state.knowledge_base, &root_dir, &state.status);

        let mut status = lock_status(&state.status);
        status.is_busy = false;
        status.progress = 0.0;
        match result {
            Ok(summary) => {
                status.message = format!("¡Indexación completada! {}", summary);
            }
            Err(err) => {
                status.message = format!("Error en la indexación: {}", err);
                error!("Error de ingesta: {}", err);
            }
        }
    });

    Ok(StatusCode::ACCEPTED)
}

#[axum::debug_handler]
async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = lock_status(&state.status).clone();
    let knowledge_base = read_kb(&state.knowledge_base).stats();
    Json(StatusResponse {
        status,
        knowledge_base,
    })
}

// --- Handler de Apagado ---

#[axum::debug_handler]
async fn shutdown_handler(State(state): State<AppState>) -> impl IntoResponse {
    info!("Petición de apagado recibida.");
    if let Some(sender) = state
        .shutdown_sender
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .take()
    {
        let _ = sender.send(());
    }
    StatusCode::OK
}
