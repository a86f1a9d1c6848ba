//! Tests against a real PostgreSQL server. They're ignored unless the "integration_test"
//! feature is enabled.

mod api_routes;
mod test_util;
