use crate::domain::task::TaskService;
use crate::domain::task::driving_ports::TaskPort;
use crate::domain::user::UserService;
use crate::domain::user::driving_ports::{CreateUserError, DeleteUserError, UserPort};
use crate::external_connections::{ExternalConnectivity, Transactable, TransactionHandle};
use crate::persistence::db_task_driven_ports::DbTaskReader;
use crate::persistence::db_user_driven_ports::{DbDetectUser, DbReadUsers, DbWriteUsers};
use crate::routing_utils::{
    BasicErrorResponse, ConflictResponse, GenericErrorResponse, Json, NotFoundResponse, Path,
    ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{delete, get};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;
use validator::Validate;

#[derive(OpenApi)]
#[openapi(paths(get_users, create_user, delete_user, get_tasks_for_user))]
/// Defines the OpenAPI documentation for the user API
pub struct UsersApi;
/// Constant used to group user endpoints in OpenAPI documentation
pub const USER_API_GROUP: &str = "Users";

/// Builds a router for all the user routes
pub fn user_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            get(|State(app_state): AppState| async move {
                let mut ext_cxn = app_state.ext_cxn.clone();

                get_users(&mut ext_cxn, &UserService).await
            })
            .post(
                |State(app_state): AppState, Json(new_user): Json<dto::NewUser>| async move {
                    let ext_cxn = app_state.ext_cxn.clone();

                    create_user(new_user, &ext_cxn, &UserService).await
                },
            ),
        )
        .route(
            "/:user_id",
            delete(
                |State(app_state): AppState, Path(user_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    delete_user(user_id, &mut ext_cxn, &UserService).await
                },
            ),
        )
        .route(
            "/:user_id/tasks",
            get(
                |State(app_state): AppState, Path(user_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    get_tasks_for_user(user_id, &mut ext_cxn, &TaskService).await
                },
            ),
        )
}

#[utoipa::path(
    get,
    path = "/users",
    tag = USER_API_GROUP,
    responses(
        (status = 200, description = "List of users", body = [dto::TodoUser]),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Retrieves a list of all the users in the system.
async fn get_users(
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl UserPort,
) -> Result<Json<Vec<dto::TodoUser>>, ErrorResponse> {
    info!("Requested users");
    let users = user_service
        .get_users(ext_cxn, &DbReadUsers)
        .await
        .map_err(|err| {
            error!("Could not retrieve users: {err:#}");
            GenericErrorResponse(err)
        })?;

    Ok(Json(users.into_iter().map(dto::TodoUser::from).collect()))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = USER_API_GROUP,
    request_body = dto::NewUser,
    responses(
        (status = 201, description = "User created", body = dto::InsertedUser),
        (status = 400, response = BasicErrorResponse),
        (status = 409, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Creates a user. The duplicate-name check and the insert share a transaction.
async fn create_user(
    new_user: dto::NewUser,
    ext_cxn: &impl Transactable,
    user_service: &impl UserPort,
) -> Result<(StatusCode, Json<dto::InsertedUser>), ErrorResponse> {
    info!("Attempt to create user: {new_user}");
    new_user.validate().map_err(ValidationErrorResponse::from)?;

    let conflict_message = format!("A user named {new_user} already exists.");
    let domain_user = domain::user::CreateUser::from(new_user);

    let mut txn = ext_cxn.start_transaction().await.map_err(|err| {
        error!("Could not start user creation transaction: {err:#}");
        GenericErrorResponse(err)
    })?;
    let new_id = user_service
        .create_user(&domain_user, &mut txn, &DbWriteUsers, &DbDetectUser)
        .await
        .map_err(|err| -> ErrorResponse {
            match err {
                CreateUserError::UserAlreadyExists => ConflictResponse(conflict_message).into(),
                CreateUserError::PortError(cause) => {
                    error!("User create failure: {cause:#}");
                    GenericErrorResponse(cause).into()
                }
            }
        })?;
    txn.commit().await.map_err(|err| {
        error!("Could not commit new user: {err:#}");
        GenericErrorResponse(err)
    })?;

    Ok((StatusCode::CREATED, Json(dto::InsertedUser { id: new_id })))
}

#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = USER_API_GROUP,
    params(("user_id" = i32, Path, description = "ID of the user")),
    responses(
        (status = 204, description = "User and all of their tasks deleted"),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Deletes a user along with every task they own
async fn delete_user(
    user_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl UserPort,
) -> Result<StatusCode, ErrorResponse> {
    info!("Deleting user {user_id}");
    user_service
        .delete_user(user_id, ext_cxn, &DbWriteUsers)
        .await
        .map_err(|err| -> ErrorResponse {
            match err {
                DeleteUserError::UserDoesNotExist => NotFoundResponse.into(),
                DeleteUserError::PortError(cause) => {
                    error!("Failed to delete user {user_id}: {cause:#}");
                    GenericErrorResponse(cause).into()
                }
            }
        })?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/tasks",
    tag = USER_API_GROUP,
    params(("user_id" = i32, Path, description = "ID of the user")),
    responses(
        (status = 200, description = "The user's tasks, incomplete ones first", body = [dto::Task]),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
/// Retrieves the tasks owned by a user
async fn get_tasks_for_user(
    user_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<Vec<dto::Task>>, ErrorResponse> {
    info!("Get tasks for user {user_id}");
    let tasks = task_service
        .tasks_for_user(user_id, ext_cxn, &DbDetectUser, &DbTaskReader)
        .await
        .map_err(super::task::task_error_response)?;

    Ok(Json(tasks.into_iter().map(dto::Task::from).collect()))
}
