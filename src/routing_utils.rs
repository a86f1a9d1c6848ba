use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_macros::{FromRequest, FromRequestParts};

use serde::Serialize;
use utoipa::openapi::{RefOr, Schema};
use utoipa::{ToResponse, ToSchema, openapi};

use validator::ValidationErrors;

/// Contains diagnostic information about an API failure
#[derive(Serialize, Debug, ToResponse)]
#[response(examples(
    ("Not Found" = (
        summary = "Entity could not be found (404)",
        value = json!({
            "error_code": "not_found",
            "error_description": "The requested entity could not be found.",
            "extra_info": null
        })
    )),

    ("Already Exists" = (
        summary = "Entity conflicts with one that already exists (409)",
        value = json!({
            "error_code": "already_exists",
            "error_description": "The submitted entity already exists.",
            "extra_info": "A user with that name already exists."
        })
    )),

    ("Internal Failure" = (
        summary = "Something unexpected went wrong inside the server (500)",
        value = json!({
            "error_code": "internal_error",
            "error_description": "Could not access data to complete your request",
            "extra_info": null
        })
    )),

    ("Invalid Input" = (
        summary = "Invalid request body was passed (400)",
        value = json!({
            "error_code": "invalid_input",
            "error_description": "Submitted data was invalid.",
            "extra_info": {
                "title": [
                    {
                        "code": "length",
                        "message": null,
                        "params": {
                            "value": "",
                            "min": 1,
                            "max": 200
                        }
                    }
                ]
            }
        })
    )),

    ("Malformed Path" = (
        summary = "A path parameter couldn't be parsed (400)",
        value = json!({
            "error_code": "invalid_path",
            "error_description": "The request path contained an unreadable parameter.",
            "extra_info": "Invalid URL: Cannot parse `abc` to a `i32`"
        })
    )),

    ("Malformed JSON" = (
        summary = "Invalid JSON passed to server (400)",
        value = json!({
            "error_code": "invalid_json",
            "error_description": "The passed request body contained malformed or unreadable JSON.",
            "extra_info": "Failed to parse the request body as JSON: EOF while parsing an object at line 4 column 0"
        })
    ))
))]
pub struct BasicErrorResponse {
    error_code: String,
    error_description: String,
    extra_info: Option<ExtraInfo>,
}

impl BasicErrorResponse {
    fn respond(
        status: StatusCode,
        error_code: &str,
        error_description: &str,
        extra_info: Option<ExtraInfo>,
    ) -> Response {
        (
            status,
            axum::Json(BasicErrorResponse {
                error_code: error_code.into(),
                error_description: error_description.into(),
                extra_info,
            }),
        )
            .into_response()
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(untagged)]
pub enum ExtraInfo {
    ValidationIssues(ValidationErrorSchema),
    Message(String),
}

/// Stand-in OpenAPI schema for [ValidationErrors] which just provides an empty object
#[derive(Serialize, Debug)]
#[serde(transparent)]
pub struct ValidationErrorSchema(ValidationErrors);

impl<'schem> ToSchema<'schem> for ValidationErrorSchema {
    fn schema() -> (&'schem str, RefOr<Schema>) {
        (
            "ValidationErrorSchema",
            openapi::ObjectBuilder::new().into(),
        )
    }
}

/// Response for an unexpected failure talking to storage. The cause is logged by the
/// caller and never sent to the client.
pub struct GenericErrorResponse(pub anyhow::Error);

impl IntoResponse for GenericErrorResponse {
    fn into_response(self) -> Response {
        BasicErrorResponse::respond(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Could not access data to complete your request",
            None,
        )
    }
}

/// Response for a request naming an entity that doesn't exist
pub struct NotFoundResponse;

impl IntoResponse for NotFoundResponse {
    fn into_response(self) -> Response {
        BasicErrorResponse::respond(
            StatusCode::NOT_FOUND,
            "not_found",
            "The requested entity could not be found.",
            None,
        )
    }
}

/// Response for a request that would duplicate an existing entity
pub struct ConflictResponse(pub String);

impl IntoResponse for ConflictResponse {
    fn into_response(self) -> Response {
        BasicErrorResponse::respond(
            StatusCode::CONFLICT,
            "already_exists",
            "The submitted entity already exists.",
            Some(ExtraInfo::Message(self.0)),
        )
    }
}

/// Response type that wraps validation errors and turns them into [BasicErrorResponse]s
pub struct ValidationErrorResponse(ValidationErrors);

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        BasicErrorResponse::respond(
            StatusCode::BAD_REQUEST,
            "invalid_input",
            "Submitted data was invalid.",
            Some(ExtraInfo::ValidationIssues(ValidationErrorSchema(self.0))),
        )
    }
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(value: ValidationErrors) -> Self {
        Self(value)
    }
}

/// Wrapper for [axum::Json] which customizes the error response to use our
/// data structure for API errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(JsonErrorResponse))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Response type representing JSON parse errors
pub struct JsonErrorResponse {
    parse_problem: String,
}

impl From<JsonRejection> for JsonErrorResponse {
    fn from(value: JsonRejection) -> Self {
        JsonErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for JsonErrorResponse {
    fn into_response(self) -> Response {
        BasicErrorResponse::respond(
            StatusCode::BAD_REQUEST,
            "invalid_json",
            "The passed request body contained malformed or unreadable JSON.",
            Some(ExtraInfo::Message(self.parse_problem)),
        )
    }
}

/// Wrapper for [axum::extract::Path] which reports unparseable path parameters with our
/// data structure for API errors
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(PathErrorResponse))]
pub struct Path<T>(pub T);

/// Response type for path parameters that don't parse, like a non-numeric ID
pub struct PathErrorResponse {
    parse_problem: String,
}

impl From<PathRejection> for PathErrorResponse {
    fn from(value: PathRejection) -> Self {
        PathErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for PathErrorResponse {
    fn into_response(self) -> Response {
        BasicErrorResponse::respond(
            StatusCode::BAD_REQUEST,
            "invalid_path",
            "The request path contained an unreadable parameter.",
            Some(ExtraInfo::Message(self.parse_problem)),
        )
    }
}
