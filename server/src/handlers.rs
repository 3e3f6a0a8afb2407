//! Axum handlers translating HTTP requests into `TodoStore` calls.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use todo_core::{Todo, TodoStore, UpdateTodo};
use uuid::Uuid;

use crate::error::ApiError;
use crate::validation::{validate_title, validate_update};

pub type Db = Arc<TodoStore>;

#[derive(Debug, Deserialize)]
pub struct CreateTodo {
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Health {
    pub status: String,
}

pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

pub async fn list_todos(State(db): State<Db>) -> Json<Vec<Todo>> {
    Json(db.list())
}

pub async fn create_todo(
    State(db): State<Db>,
    input: Result<Json<CreateTodo>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let Json(input) = input?;
    validate_title(&input.title)?;
    Ok((StatusCode::CREATED, Json(db.create(input.title))))
}

pub async fn get_todo(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    db.get(id).map(Json).ok_or(ApiError::NotFound)
}

pub async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<String>,
    input: Result<Json<UpdateTodo>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Json(patch) = input?;
    validate_update(&patch)?;
    let id = parse_id(&id)?;
    db.update(id, patch).map(Json).ok_or(ApiError::NotFound)
}

pub async fn delete_todo(State(db): State<Db>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if db.delete(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// Ids are only ever minted as UUIDs, so anything else cannot name a todo.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}
