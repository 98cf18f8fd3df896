use std::path::PathBuf;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use slaq_core::{parse, QueryExecutor, QueryResult};

use crate::error::{AppError, AppResult};
use crate::logs;

#[derive(Clone)]
pub struct AppState {
    /// Queries may only read log files under this directory.
    pub log_dir: PathBuf,
}

impl AppState {
    fn resolve(&self, log_file: &str) -> AppResult<PathBuf> {
        let joined = self.log_dir.join(log_file);
        let canonical = joined
            .canonicalize()
            .map_err(|_| AppError::LogFileNotFound(log_file.to_string()))?;
        let root = self.log_dir.canonicalize()?;
        if !canonical.starts_with(&root) {
            return Err(AppError::BadRequest(format!(
                "log file '{}' is outside the log directory",
                log_file
            )));
        }
        Ok(canonical)
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub action: String,
    #[serde(rename = "logFile")]
    pub log_file: String,
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub id: Option<serde_json::Value>,
    pub success: bool,
    pub data: Option<QueryData>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryData {
    #[serde(rename = "queryResults")]
    pub query_results: QueryResult,
}

pub async fn run_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Json<QueryResponse> {
    let id = request.id.clone();
    match execute(&state, &request) {
        Ok(result) => Json(QueryResponse {
            id,
            success: true,
            data: Some(QueryData {
                query_results: result,
            }),
            error: None,
        }),
        Err(e) => {
            tracing::warn!(error = %e, query = %request.query, "query failed");
            Json(QueryResponse {
                id,
                success: false,
                data: None,
                error: Some(e.to_string()),
            })
        }
    }
}

fn execute(state: &AppState, request: &QueryRequest) -> AppResult<QueryResult> {
    if request.action != "query" {
        return Err(AppError::BadRequest(format!(
            "unknown action: {}",
            request.action
        )));
    }
    let path = state.resolve(&request.log_file)?;
    let records = logs::load_file(&path)?;
    let stmt = parse(&request.query)?;
    let result = QueryExecutor::new(&records).execute(&stmt)?;
    Ok(result)
}
