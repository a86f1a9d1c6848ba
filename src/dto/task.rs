use crate::domain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// DTO for a task returned from the API
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug, PartialEq))]
pub struct Task {
    #[schema(example = 10)]
    pub id: i32,
    #[schema(example = 4)]
    pub user_id: Option<i32>,
    #[schema(example = "Buy milk")]
    pub title: String,
    #[schema(example = "Two liters, semi-skimmed")]
    pub description: Option<String>,
    pub complete: bool,
    /// When the task was created. Never changes.
    pub create: DateTime<Utc>,
}

impl From<domain::task::Task> for Task {
    fn from(value: domain::task::Task) -> Self {
        Task {
            id: value.id,
            user_id: value.owner_user_id,
            title: value.title,
            description: value.description,
            complete: value.complete,
            create: value.created_at,
        }
    }
}

/// DTO for creating a new task via the API. Leaving out "complete" creates an incomplete task.
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize, Debug))]
pub struct NewTask {
    #[schema(example = "Buy milk")]
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub complete: bool,
    /// The owning user, if any
    #[schema(example = 4)]
    pub user_id: Option<i32>,
}

impl From<NewTask> for domain::task::NewTask {
    fn from(value: NewTask) -> Self {
        domain::task::NewTask {
            title: value.title,
            description: value.description,
            complete: value.complete,
            owner_user_id: value.user_id,
        }
    }
}

/// DTO for replacing a task's editable content via the API
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct UpdateTask {
    #[schema(example = "Buy oat milk")]
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub complete: bool,
}

impl From<UpdateTask> for domain::task::UpdateTask {
    fn from(value: UpdateTask) -> Self {
        domain::task::UpdateTask {
            title: value.title,
            description: value.description,
            complete: value.complete,
        }
    }
}

/// DTO for marking a task complete or incomplete
#[derive(Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct TaskCompletion {
    pub complete: bool,
}
