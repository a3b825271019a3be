/// climapi_service: read-only HTTP query API over a daily climate
/// observation dataset (station metadata, precipitation, temperature).
///
/// # Module structure
///
/// ```text
/// climapi_service
/// ├── model    — typed records for the climate schema + response shapes
/// ├── config   — service.toml loader (anchor date, window, server settings)
/// ├── db       — DATABASE_URL handling, connection pool, schema validation
/// ├── queries  — bounded read-only queries (window filters, aggregates)
/// └── endpoint — HTTP server, routing, JSON response shaping
/// ```
///
/// All "last year" windows are computed from a fixed anchor date in
/// service.toml (the last observation date of the deployed dataset),
/// never from the wall clock.

/// Public modules
pub mod config;
pub mod db;
pub mod endpoint;
pub mod model;
pub mod queries;
