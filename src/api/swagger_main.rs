use crate::dto;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(info(
    title = "Task Tracker API",
    description = "Tracks to-do items, optionally owned by users"
))]
struct TaskTrackerApi;

/// Serves the swagger UI and the OpenAPI document it renders. The document pulls together
/// the shared schemas in [dto] and the paths declared by each [api][crate::api] submodule.
pub fn build_documentation() -> SwaggerUi {
    let mut api_docs = TaskTrackerApi::openapi();
    api_docs.merge(dto::OpenApiSchemas::openapi());
    api_docs.merge(super::user::UsersApi::openapi());
    api_docs.merge(super::task::TaskApi::openapi());

    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_docs)
}
