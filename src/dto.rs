//! Data shapes accepted and returned by the HTTP API, kept separate from the domain types so
//! the wire format can change independently.

use crate::routing_utils::{BasicErrorResponse, ExtraInfo, ValidationErrorSchema};
use utoipa::OpenApi;

mod task;
mod user;

pub use task::*;
pub use user::*;

/// Schemas shared across the API that need to show up in the OpenAPI document
#[derive(OpenApi)]
#[openapi(components(
    schemas(
        Task,
        NewTask,
        UpdateTask,
        TaskCompletion,
        TodoUser,
        NewUser,
        InsertedUser,
        ExtraInfo,
        ValidationErrorSchema
    ),
    responses(BasicErrorResponse)
))]
pub struct OpenApiSchemas;
