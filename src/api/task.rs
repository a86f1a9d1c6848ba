use crate::domain::task::TaskService;
use crate::domain::task::driving_ports::{TaskError, TaskPort};
use crate::external_connections::ExternalConnectivity;
use crate::persistence::db_task_driven_ports::{DbTaskReader, DbTaskWriter};
use crate::persistence::db_user_driven_ports::DbDetectUser;
use crate::routing_utils::{
    BasicErrorResponse, GenericErrorResponse, Json, NotFoundResponse, Path,
    ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{get, patch};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;
use validator::Validate;

#[derive(OpenApi)]
#[openapi(paths(
    list_tasks,
    create_task,
    get_task,
    update_task,
    set_task_completion,
    delete_task
))]
/// Defines the OpenAPI documentation for the task API
pub struct TaskApi;
/// Constant used to group task endpoints in OpenAPI documentation
pub const TASK_API_GROUP: &str = "Tasks";

/// Creates a router for endpoints under the "/tasks" group of APIs
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            get(|State(app_state): AppState| async move {
                let mut ext_cxn = app_state.ext_cxn.clone();

                list_tasks(&mut ext_cxn, &TaskService).await
            })
            .post(
                |State(app_state): AppState, Json(new_task): Json<dto::NewTask>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    create_task(new_task, &mut ext_cxn, &TaskService).await
                },
            ),
        )
        .route(
            "/:task_id",
            get(
                |State(app_state): AppState, Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    get_task(task_id, &mut ext_cxn, &TaskService).await
                },
            )
            .put(
                |State(app_state): AppState,
                 Path(task_id): Path<i32>,
                 Json(update): Json<dto::UpdateTask>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    update_task(task_id, update, &mut ext_cxn, &TaskService).await
                },
            )
            .delete(
                |State(app_state): AppState, Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    delete_task(task_id, &mut ext_cxn, &TaskService).await
                },
            ),
        )
        .route(
            "/:task_id/completion",
            patch(
                |State(app_state): AppState,
                 Path(task_id): Path<i32>,
                 Json(completion): Json<dto::TaskCompletion>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    set_task_completion(task_id, completion, &mut ext_cxn, &TaskService).await
                },
            ),
        )
}

/// Maps a failed task operation onto the matching error response
pub(super) fn task_error_response(err: TaskError) -> ErrorResponse {
    match err {
        TaskError::UserDoesNotExist | TaskError::TaskDoesNotExist => NotFoundResponse.into(),
        TaskError::Invalid(issues) => ValidationErrorResponse::from(issues).into(),
        TaskError::PortError(cause) => {
            error!("Task operation failed: {cause:#}");
            GenericErrorResponse(cause).into()
        }
    }
}

#[utoipa::path(
    get,
    path = "/tasks",
    tag = TASK_API_GROUP,
    responses(
        (status = 200, description = "All tasks, incomplete ones first", body = [dto::Task]),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Lists every task
async fn list_tasks(
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<Vec<dto::Task>>, ErrorResponse> {
    info!("Listing all tasks");
    let tasks = task_service
        .list_tasks(&mut *ext_cxn, &DbTaskReader)
        .await
        .map_err(task_error_response)?;

    Ok(Json(tasks.into_iter().map(dto::Task::from).collect()))
}

#[utoipa::path(
    post,
    path = "/tasks",
    tag = TASK_API_GROUP,
    request_body = dto::NewTask,
    responses(
        (status = 201, description = "Task created", body = dto::Task),
        (status = 400, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Creates a task, optionally owned by a user
async fn create_task(
    new_task: dto::NewTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<(StatusCode, Json<dto::Task>), ErrorResponse> {
    info!("Creating task \"{}\"", new_task.title);
    new_task.validate().map_err(ValidationErrorResponse::from)?;

    let domain_task = domain::task::NewTask::from(new_task);
    let created = task_service
        .create_task(&domain_task, &mut *ext_cxn, &DbDetectUser, &DbTaskWriter)
        .await
        .map_err(task_error_response)?;

    Ok((StatusCode::CREATED, Json(dto::Task::from(created))))
}

#[utoipa::path(
    get,
    path = "/tasks/{task_id}",
    tag = TASK_API_GROUP,
    params(("task_id" = i32, Path, description = "ID of the task")),
    responses(
        (status = 200, description = "The requested task", body = dto::Task),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip(ext_cxn, task_service))]
/// Fetches a single task
async fn get_task(
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<dto::Task>, ErrorResponse> {
    let task = task_service
        .task_by_id(task_id, &mut *ext_cxn, &DbTaskReader)
        .await
        .map_err(task_error_response)?
        .ok_or(NotFoundResponse)?;

    Ok(Json(dto::Task::from(task)))
}

#[utoipa::path(
    put,
    path = "/tasks/{task_id}",
    tag = TASK_API_GROUP,
    params(("task_id" = i32, Path, description = "ID of the task")),
    request_body = dto::UpdateTask,
    responses(
        (status = 200, description = "The updated task", body = dto::Task),
        (status = 400, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Replaces the title, description, and completion of a task
async fn update_task(
    task_id: i32,
    task_data: dto::UpdateTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<dto::Task>, ErrorResponse> {
    info!("Updating task {task_id}");
    task_data.validate().map_err(ValidationErrorResponse::from)?;

    let domain_update = domain::task::UpdateTask::from(task_data);
    let updated = task_service
        .update_task(task_id, &domain_update, &mut *ext_cxn, &DbTaskWriter)
        .await
        .map_err(task_error_response)?;

    Ok(Json(dto::Task::from(updated)))
}

#[utoipa::path(
    patch,
    path = "/tasks/{task_id}/completion",
    tag = TASK_API_GROUP,
    params(("task_id" = i32, Path, description = "ID of the task")),
    request_body = dto::TaskCompletion,
    responses(
        (status = 200, description = "The updated task", body = dto::Task),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Marks a task complete or incomplete without touching anything else
async fn set_task_completion(
    task_id: i32,
    completion: dto::TaskCompletion,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<dto::Task>, ErrorResponse> {
    info!("Setting completion of task {task_id} to {}", completion.complete);
    let updated = task_service
        .set_task_completion(task_id, completion.complete, &mut *ext_cxn, &DbTaskWriter)
        .await
        .map_err(task_error_response)?;

    Ok(Json(dto::Task::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/tasks/{task_id}",
    tag = TASK_API_GROUP,
    params(("task_id" = i32, Path, description = "ID of the task")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip(ext_cxn, task_service))]
/// Deletes a task
async fn delete_task(
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<StatusCode, ErrorResponse> {
    task_service
        .delete_task(task_id, &mut *ext_cxn, &DbTaskWriter)
        .await
        .map_err(task_error_response)?;

    Ok(StatusCode::NO_CONTENT)
}
