//! API request handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::server::AppState;
use crate::engine::{ExcelQueryEngine, FileItem, UploadResult};
use crate::error::{QueryError, QueryResult};
use crate::excel::Record;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

/// HTTP status for an engine error. Bad input and missing files are the
/// caller's fault; everything else is the server's.
pub fn error_status(err: &QueryError) -> StatusCode {
    match err {
        QueryError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        QueryError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(result: QueryResult<T>) -> (StatusCode, Json<ApiResponse<T>>) {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))),
        Err(e) => {
            warn!("request failed: {}", e);
            (error_status(&e), Json(ApiResponse::err(e.to_string())))
        }
    }
}

/// Workbook reads block; keep them off the async workers
async fn run_blocking<T, F>(engine: &ExcelQueryEngine, f: F) -> QueryResult<T>
where
    F: FnOnce(ExcelQueryEngine) -> QueryResult<T> + Send + 'static,
    T: Send + 'static,
{
    let engine = engine.clone();
    tokio::task::spawn_blocking(move || f(engine))
        .await
        .unwrap_or_else(|e| Err(QueryError::Io(std::io::Error::other(e))))
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

impl EndpointInfo {
    fn new(path: &str, method: &str, description: &str) -> Self {
        Self {
            path: path.to_string(),
            method: method.to_string(),
            description: description.to_string(),
        }
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "Excel Query API Server".to_string(),
        version: state.version.clone(),
        description: "Spreadsheet rows as JSON records".to_string(),
        endpoints: vec![
            EndpointInfo::new("/health", "GET", "Health check endpoint"),
            EndpointInfo::new("/version", "GET", "Get server version"),
            EndpointInfo::new("/api/excel_list", "POST", "Brief list of a sheet's records"),
            EndpointInfo::new("/api/excel_data", "POST", "Full record by key"),
            EndpointInfo::new("/api/excel_cache/clear", "POST", "Drop all cached sheets"),
            EndpointInfo::new("/api/files", "GET", "List uploaded workbooks"),
            EndpointInfo::new("/api/upload", "POST", "Upload a workbook (multipart 'file')"),
            EndpointInfo::new("/api/download", "GET", "Download a workbook: ?file="),
            EndpointInfo::new("/api/delete", "POST", "Delete an uploaded workbook"),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub cached_sheets: usize,
}

/// GET /health - Health check
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        cached_sheets: state.engine.cache().len(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: [
            "excel_list",
            "excel_data",
            "cache_clear",
            "files",
            "upload",
            "download",
            "delete",
        ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }))
}

/// Body of `/api/excel_list` and `/api/excel_data`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExcelDataRequest {
    pub file: String,
    pub sheet: String,
    /// Comma-separated brief field list
    pub fields: String,
    pub key_name: String,
    pub key: String,
}

/// POST /api/excel_list - Brief records of a sheet
pub async fn excel_list(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExcelDataRequest>,
) -> impl IntoResponse {
    let result = run_blocking(&state.engine, move |engine| {
        engine.list_brief(&req.file, &req.sheet, &req.fields, &req.key_name)
    })
    .await;
    respond::<Vec<Record>>(result)
}

/// POST /api/excel_data - One full record by key; `data` is null when no row matches
pub async fn excel_data(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExcelDataRequest>,
) -> impl IntoResponse {
    let result = run_blocking(&state.engine, move |engine| {
        engine.get_by_key(&req.file, &req.sheet, &req.key_name, &req.key)
    })
    .await;
    respond::<Option<Record>>(result)
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub cleared: usize,
}

/// POST /api/excel_cache/clear - Drop every cached sheet
pub async fn clear_cache(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cleared = state.engine.cache().len();
    state.engine.clear_cache();
    Json(ApiResponse::ok(ClearCacheResponse { cleared }))
}

/// GET /api/files - Workbooks in the upload directory
pub async fn list_files(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let result = run_blocking(&state.engine, |engine| engine.list_files()).await;
    respond::<Vec<FileItem>>(result)
}

#[derive(Debug, Deserialize)]
pub struct DeleteFileRequest {
    pub file: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteFileResponse {
    pub file: String,
    pub deleted: bool,
}

/// POST /api/delete - Delete a workbook and its cached sheets
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteFileRequest>,
) -> impl IntoResponse {
    let file = req.file.clone();
    let result = run_blocking(&state.engine, move |engine| engine.delete_file(&req.file)).await;
    respond(result.map(|deleted| DeleteFileResponse { file, deleted }))
}

/// POST /api/upload - Store the multipart `file` field in the upload directory
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => {
                        upload = Some((file_name, bytes));
                        break;
                    }
                    Err(e) => return respond::<UploadResult>(Err(bad_multipart(e))),
                }
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => return respond::<UploadResult>(Err(bad_multipart(e))),
        }
    }

    let Some((file_name, bytes)) = upload else {
        return respond::<UploadResult>(Err(QueryError::InvalidRequest(
            "multipart field 'file' is required".to_string(),
        )));
    };
    let result = run_blocking(&state.engine, move |engine| {
        engine.upload_file(&file_name, &bytes)
    })
    .await;
    respond(result)
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> QueryError {
    QueryError::InvalidRequest(format!("invalid multipart body: {}", err))
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub file: String,
}

/// GET /api/download?file= - Workbook bytes as an attachment
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let file = query.file;
    match run_blocking(&state.engine, move |engine| engine.download_file(&file)).await {
        Ok((file_name, bytes)) => (
            [
                (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file_name),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => respond::<()>(Err(e)).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_ok_creates_success_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test data".to_string());

        assert!(response.success);
        assert_eq!(response.data, Some("test data".to_string()));
        assert!(response.error.is_none());
        // UUID format (8-4-4-4-12)
        assert_eq!(response.request_id.len(), 36);
    }

    #[test]
    fn test_api_response_err_serializes_without_data() {
        let response: ApiResponse<String> = ApiResponse::err("error message");
        let json = serde_json::to_string(&response).unwrap();

        assert!(!json.contains("\"data\""));
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"error\":\"error message\""));
    }

    #[test]
    fn test_absent_record_serializes_as_null() {
        let response: ApiResponse<Option<Record>> = ApiResponse::ok(None);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"data\":null"));
    }

    #[test]
    fn test_request_deserialize_camel_case() {
        let json = r#"{"file": "students", "sheet": "Sheet1", "fields": "studentNo,name", "keyName": "studentNo", "key": "S001"}"#;
        let req: ExcelDataRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.file, "students");
        assert_eq!(req.sheet, "Sheet1");
        assert_eq!(req.fields, "studentNo,name");
        assert_eq!(req.key_name, "studentNo");
        assert_eq!(req.key, "S001");
    }

    #[test]
    fn test_request_missing_fields_default_empty() {
        let req: ExcelDataRequest = serde_json::from_str(r#"{"file": "students"}"#).unwrap();
        assert!(req.sheet.is_empty());
        assert!(req.fields.is_empty());
        assert!(req.key.is_empty());
    }

    #[test]
    fn test_error_status() {
        assert_eq!(
            error_status(&QueryError::InvalidRequest("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&QueryError::Workbook("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert_eq!(error_status(&QueryError::Io(missing)), StatusCode::NOT_FOUND);
    }
}
