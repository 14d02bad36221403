//! Excel Query API Server binary
//!
//! HTTP REST API over the workbooks in an upload directory.

use clap::Parser;
use excel_query::api::{run_api_server, server::ApiConfig};
use excel_query::config::EngineConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "excel-query-server")]
#[command(version)]
#[command(about = "Excel Query API Server - spreadsheet rows as JSON records over HTTP")]
#[command(long_about = r#"
Excel Query API Server

Endpoints:
  - POST /api/excel_list         - Brief list: {"file", "sheet", "fields", "keyName"}
  - POST /api/excel_data         - Record by key: {"file", "sheet", "keyName", "key"}
  - POST /api/excel_cache/clear  - Drop every cached sheet
  - GET  /api/files              - Workbooks in the upload directory
  - POST /api/upload             - Upload a workbook (multipart field "file")
  - GET  /api/download?file=     - Download a workbook
  - POST /api/delete             - Delete a workbook: {"file"}

Additional endpoints:
  - GET  /health                 - Health check
  - GET  /version                - Server version info
  - GET  /                       - API documentation

Example usage:
  excel-query-server                              # localhost:8083, ./Upload
  excel-query-server --config excel-query.yaml --port 3000

  curl -X POST http://localhost:8083/api/excel_list \
    -H "Content-Type: application/json" \
    -d '{"file": "students", "sheet": "Sheet1", "fields": "studentNo,name", "keyName": "studentNo"}'
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "EXCEL_QUERY_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8083", env = "EXCEL_QUERY_PORT")]
    port: u16,

    /// YAML config file (upload dir, aliases, title rows)
    #[arg(short, long, env = "EXCEL_QUERY_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the workbooks; overrides the config file
    #[arg(short, long, env = "EXCEL_QUERY_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut engine = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = args.upload_dir {
        engine.upload_dir = dir;
    }

    let config = ApiConfig {
        host: args.host,
        port: args.port,
        engine,
    };

    run_api_server(config).await
}
