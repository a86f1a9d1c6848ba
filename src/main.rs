use crate::api::swagger_main::build_documentation;
use anyhow::Context;
use axum::Router;
use axum::extract::State;
use dotenv::dotenv;
use std::env;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

mod api;
mod app_env;
mod db;
mod domain;
mod dto;
mod external_connections;
#[cfg(test)]
mod integration_test;
mod logging;
mod persistence;
mod routing_utils;

/// State handed to every request handler
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
}

type AppState = State<Arc<SharedData>>;

/// Assembles the full HTTP surface: the user and task APIs, the swagger UI, and request tracing
fn build_router(shared_data: Arc<SharedData>) -> Router {
    let router = Router::new()
        .nest("/users", api::user::user_routes())
        .nest("/tasks", api::task::task_routes())
        .merge(build_documentation())
        .with_state(shared_data);

    logging::attach_tracing_http(router)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        println!("Starting server without .env file.");
    }
    let otel_exporters = logging::exporters_from_env()?;
    logging::setup_logging_and_tracing(logging::init_env_filter()?, otel_exporters);

    let db_url = env::var(app_env::DB_URL).context("DATABASE_URL must be set")?;
    let sqlx_db_connection = db::connect_sqlx(&db_url)
        .await
        .context("connecting to the database")?;
    db::migrate(&sqlx_db_connection)
        .await
        .context("running database migrations")?;

    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(sqlx_db_connection),
    });
    let router = build_router(shared_data);

    let bind_address =
        env::var(app_env::BIND_ADDRESS).unwrap_or_else(|_| app_env::DEFAULT_BIND_ADDRESS.to_owned());
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("binding to {bind_address}"))?;

    info!("Starting server on {bind_address}");
    axum::serve(listener, router)
        .await
        .context("running the HTTP server")?;

    Ok(())
}
