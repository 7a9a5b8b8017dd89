use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::charts::{self, ChartOptions};
use crate::dataset;
use crate::login;
use crate::report;
use crate::store::DatasetStore;
use crate::summary;

/// Shared application state: the dataset store
pub struct AppState {
    store: DatasetStore,
}

/// Start the dashboard web server
///
/// Initializes the user database and dataset store, builds the router, and
/// serves until shutdown. The dashboard page and all `/api` routes require a
/// valid session; the login/signup pages do not.
///
/// # Arguments
/// * `addr` - Socket address to bind, e.g. "127.0.0.1:3000"
/// * `data_dir` - Directory for the dataset store
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Runs until the server stops
pub async fn run(addr: &str, data_dir: &str) -> Result<(), Box<dyn std::error::Error>> {
    login::init_database()?;

    let store = DatasetStore::new(data_dir);
    store.init()?;

    let app_state = Arc::new(AppState { store });

    // Dashboard page and data API are session-gated
    let protected = Router::new()
        .route("/", get(serve_dashboard))
        .route("/api/upload", post(upload_dataset))
        .route("/api/summary", get(latest_summary))
        .route("/api/history", get(history))
        .route("/api/chart/pie/:id", get(pie_chart))
        .route("/api/chart/averages/:id", get(averages_chart))
        .route("/api/report/:id", get(download_report))
        .layer(middleware::from_fn(login::require_auth));

    // Build router
    let app = Router::new()
        .merge(protected)
        .route(
            "/login",
            get(login::serve_login_page).post(login::handle_login),
        )
        .route(
            "/signup",
            get(login::serve_signup_page).post(login::handle_signup),
        )
        .route("/logout", get(login::handle_logout))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = TcpListener::bind(addr).await?;
    log::info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_dashboard() -> Html<&'static str> {
    Html(include_str!("./static/dashboard.html"))
}

/// Handle a CSV dataset upload
///
/// Expects a multipart form with a `file` field carrying a `.csv`. The file
/// is parsed, validated, and persisted; the response carries the new dataset
/// id so the client can refresh its state.
async fn upload_dataset(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut filename = String::new();
    let mut file_data = Vec::new();

    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        if field.name() == Some("file") {
            filename = field.file_name().unwrap_or("").to_string();
            file_data = field.bytes().await.unwrap_or_default().to_vec();
        }
    }

    if filename.is_empty() && file_data.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
    }

    if !filename.to_lowercase().ends_with(".csv") {
        return error_response(StatusCode::BAD_REQUEST, "File must be a CSV");
    }

    let content = match String::from_utf8(file_data) {
        Ok(content) => content,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "File is not valid UTF-8 text"),
    };

    let records = match dataset::from_csv(&content) {
        Ok(records) => records,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    match state.store.save(&filename, records) {
        Ok(dataset) => {
            log::info!(
                "stored dataset {} ({}, {} rows)",
                dataset.id,
                dataset.filename,
                dataset.records.len()
            );
            (
                StatusCode::CREATED,
                Json(json!({"message": "Upload successful", "id": dataset.id})),
            )
                .into_response()
        }
        Err(e) => {
            log::error!("failed to store dataset '{}': {}", filename, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
    }
}

/// Summary of the most recent upload, or 404 when nothing has been uploaded
async fn latest_summary(State(state): State<Arc<AppState>>) -> Response {
    match state.store.latest_summary() {
        Ok(Some(summary)) => Json(summary).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "No data available"),
        Err(e) => {
            log::error!("failed to load latest summary: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
    }
}

/// The five most recent upload summaries, newest first
async fn history(State(state): State<Arc<AppState>>) -> Response {
    match state.store.history() {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => {
            log::error!("failed to load history: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
    }
}

/// PNG pie chart of a dataset's equipment-type distribution
async fn pie_chart(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let summary = match load_summary(&state, &id) {
        Ok(summary) => summary,
        Err(response) => return response,
    };

    let options = ChartOptions {
        title: "Equipment Type Distribution".to_string(),
        ..ChartOptions::default()
    };

    match charts::type_distribution_pie(&summary, &options) {
        Ok(png_data) => png_response(png_data),
        Err(e) => {
            log::error!("pie chart render failed for {}: {}", id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// PNG bar chart of a dataset's parameter averages
async fn averages_chart(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let summary = match load_summary(&state, &id) {
        Ok(summary) => summary,
        Err(response) => return response,
    };

    let options = ChartOptions {
        title: "Parameter Averages".to_string(),
        ..ChartOptions::default()
    };

    match charts::averages_bar(&summary, &options) {
        Ok(png_data) => png_response(png_data),
        Err(e) => {
            log::error!("averages chart render failed for {}: {}", id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// PDF report download for one dataset
async fn download_report(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let summary = match load_summary(&state, &id) {
        Ok(summary) => summary,
        Err(response) => return response,
    };

    match report::render_report(&summary) {
        Ok(pdf_data) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/pdf")
            .header(
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"{}\"",
                    report::report_filename(&summary)
                ),
            )
            .body(axum::body::Body::from(pdf_data))
            .unwrap_or_else(|_| {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to build response")
            }),
        Err(e) => {
            log::error!("report render failed for {}: {}", id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

// Resolve a dataset id into its summary, mapping misses to error responses
fn load_summary(state: &AppState, id: &str) -> Result<summary::Summary, Response> {
    match state.store.load(id) {
        Ok(Some(dataset)) => Ok(summary::summarize(&dataset)),
        Ok(None) => Err(error_response(StatusCode::NOT_FOUND, "Dataset not found")),
        Err(e) => {
            log::error!("failed to load dataset {}: {}", id, e);
            Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, &e))
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

fn png_response(png_data: Vec<u8>) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .body(axum::body::Body::from(png_data))
        .unwrap_or_else(|_| {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to build response")
        })
}
