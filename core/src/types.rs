//! Domain types for the todo store.
//!
//! # Design
//! `Todo` is the only entity. Records handed out by the store are owned
//! copies, so callers can hold or serialize them without touching the
//! store's lock again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single todo item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
    /// Set once at creation. Only used to order listings.
    pub created_at: DateTime<Utc>,
}

/// Partial update for an existing todo. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateTodo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateTodo {
    /// True when neither field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }

    pub(crate) fn apply(self, todo: &mut Todo) {
        if let Some(title) = self.title {
            todo.title = title;
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
    }
}
