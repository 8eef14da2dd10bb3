//! HTTP server exposing the task tracker API.
//!
//! Routes are registered under `/api/v1` and translate verbs/paths into
//! calls against the database layer; all validation happens here, before
//! any state is touched.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::str::FromStr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use crate::types::{Analytics, NewSubtask, NewTask, Status, Subtask, Task};

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Body for a subtask status update. The status arrives as a raw string so
/// an unknown label can be rejected as a 400 rather than a generic
/// deserialization failure.
#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Create a task on a page, optionally with nested subtasks.
async fn create_task(
    State(db): State<Database>,
    Path(page_name): Path<String>,
    Json(input): Json<NewTask>,
) -> ApiResult<Json<Task>> {
    if input.name.trim().is_empty() {
        return Err(ApiError::missing_field("name"));
    }
    for subtask in &input.subtasks {
        if subtask.title.trim().is_empty() {
            return Err(ApiError::missing_field("title"));
        }
    }

    let task = db.create_task(&page_name, &input)?;
    info!(task_id = task.id, page = %page_name, "created task");
    Ok(Json(task))
}

/// List all tasks for a page.
async fn list_page_tasks(
    State(db): State<Database>,
    Path(page_name): Path<String>,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(db.list_tasks_by_page(&page_name)?))
}

/// List all tasks across every page.
async fn list_all_tasks(State(db): State<Database>) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(db.list_tasks()?))
}

/// Transition a task to In progress.
async fn start_task(
    State(db): State<Database>,
    Path((page_name, task_id)): Path<(String, i64)>,
) -> ApiResult<Json<Task>> {
    db.start_task(&page_name, task_id)?
        .map(Json)
        .ok_or_else(|| ApiError::task_not_found(task_id))
}

/// Transition a task to Completed.
async fn complete_task(
    State(db): State<Database>,
    Path((page_name, task_id)): Path<(String, i64)>,
) -> ApiResult<Json<Task>> {
    db.complete_task(&page_name, task_id)?
        .map(Json)
        .ok_or_else(|| ApiError::task_not_found(task_id))
}

/// Delete a task and all its subtasks.
async fn delete_task(
    State(db): State<Database>,
    Path((page_name, task_id)): Path<(String, i64)>,
) -> ApiResult<Json<Value>> {
    if !db.delete_task(&page_name, task_id)? {
        return Err(ApiError::task_not_found(task_id));
    }
    info!(task_id, page = %page_name, "deleted task");
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}

/// Aggregate task analytics.
async fn task_analytics(State(db): State<Database>) -> ApiResult<Json<Analytics>> {
    Ok(Json(db.analytics()?))
}

/// Attach a subtask to an existing task.
async fn create_subtask(
    State(db): State<Database>,
    Path(task_id): Path<i64>,
    Json(input): Json<NewSubtask>,
) -> ApiResult<Json<Subtask>> {
    if input.title.trim().is_empty() {
        return Err(ApiError::missing_field("title"));
    }

    db.create_subtask(task_id, &input)?
        .map(Json)
        .ok_or_else(|| ApiError::task_not_found(task_id))
}

/// Update a subtask's status through the transition engine.
async fn update_subtask_status(
    State(db): State<Database>,
    Path(subtask_id): Path<i64>,
    Json(body): Json<StatusUpdate>,
) -> ApiResult<Json<Subtask>> {
    let status =
        Status::from_str(&body.status).map_err(|_| ApiError::invalid_status(&body.status))?;

    db.update_subtask_status(subtask_id, status)?
        .map(Json)
        .ok_or_else(|| ApiError::subtask_not_found(subtask_id))
}

/// Delete a subtask.
async fn delete_subtask(
    State(db): State<Database>,
    Path(subtask_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    if !db.delete_subtask(subtask_id)? {
        return Err(ApiError::subtask_not_found(subtask_id));
    }
    Ok(Json(json!({ "message": "Subtask deleted successfully" })))
}

/// Build the router with all routes.
pub fn build_router(db: Database) -> Router {
    // Permissive CORS so the frontend dev server can talk to us
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/pages/{page_name}/tasks", post(create_task).get(list_page_tasks))
        .route("/pages/{page_name}/tasks/{task_id}/start", put(start_task))
        .route(
            "/pages/{page_name}/tasks/{task_id}/complete",
            put(complete_task),
        )
        .route("/pages/{page_name}/tasks/{task_id}", delete(delete_task))
        .route("/tasks", get(list_all_tasks))
        .route("/tasks/analytics", get(task_analytics))
        .route("/tasks/{task_id}/subtasks", post(create_subtask))
        .route("/subtasks/{subtask_id}/status", put(update_subtask_status))
        .route("/subtasks/{subtask_id}", delete(delete_subtask));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

/// Bind and serve until ctrl-c.
pub async fn serve(db: Database, port: u16) -> anyhow::Result<()> {
    let app = build_router(db);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("taskpages listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    Ok(())
}
