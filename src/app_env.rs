/// URL for accessing the PostgreSQL database (should contain a database name in the path)
pub const DB_URL: &str = "DATABASE_URL";
/// Log level configuration for the application. Uses [EnvFilter directives](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html#directives)
pub const LOG_LEVEL: &str = "LOG_LEVEL";
/// Address and port the HTTP server listens on. Falls back to [DEFAULT_BIND_ADDRESS].
pub const BIND_ADDRESS: &str = "BIND_ADDRESS";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// OpenTelemetry span export URL. Typically http://localhost:4317, pointing at a collector sidecar.
/// Exporting is turned off unless this and [OTEL_METRIC_EXPORT_URL] are both set.
pub const OTEL_SPAN_EXPORT_URL: &str = "OTEL_SPAN_EXPORT_URL";
/// OpenTelemetry metrics export URL. Typically http://localhost:4317, pointing at a collector sidecar.
pub const OTEL_METRIC_EXPORT_URL: &str = "OTEL_METRIC_EXPORT_URL";
