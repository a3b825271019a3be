/// HTTP endpoint for the climate observation API
///
/// Thin translation layer between HTTP routes and the query layer:
/// each handler validates its path parameters, makes one query-layer
/// call (two for /tobs, which first resolves the most-active station),
/// shapes the rows into the documented JSON contract, and responds 200.
///
/// Endpoints:
/// - GET /                        - HTML listing of the routes below
/// - GET /api/v1.0/precipitation  - [{date: prcp}, ...] for the last year of data
/// - GET /api/v1.0/stations       - distinct station ids
/// - GET /api/v1.0/tobs           - [{date, temperature}, ...] for the most-active station
/// - GET /api/v1.0/{start}        - {min_temp, avg_temp, max_temp} for dates >= start
/// - GET /api/v1.0/{start}/{end}  - {min_temp, avg_temp, max_temp} for [start, end]

use std::io::Cursor;

use chrono::NaiveDate;
use serde_json::{Value, json};
use threadpool::ThreadPool;
use tiny_http::{Method, Request, Response};

use crate::config::ServiceConfig;
use crate::db::Pool;
use crate::model::{PrecipObservation, TempObservation};
use crate::queries;

/// Data routes served by this endpoint, as printed by `/` and the 404
/// body. `{start}`/`{end}` are ISO dates.
pub const ROUTE_LISTING: &[&str] = &[
    "/api/v1.0/precipitation",
    "/api/v1.0/stations",
    "/api/v1.0/tobs",
    "/api/v1.0/{start}",
    "/api/v1.0/{start}/{end}",
];

// ---------------------------------------------------------------------------
// Request errors
// ---------------------------------------------------------------------------

/// Request-scoped error taxonomy. Empty results are not errors: list
/// endpoints respond 200 with an empty array and aggregate endpoints
/// with all-null fields.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed {start}/{end} path segment, rejected before the
    /// store is touched.
    BadDate(String),
    /// No pooled connection available (store down or pool exhausted).
    Pool(r2d2::Error),
    /// A query failed mid-request. Surfaced as 500, never retried.
    Store(postgres::Error),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadDate(_) => 400,
            ApiError::Pool(_) | ApiError::Store(_) => 500,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadDate(raw) => {
                write!(f, "Invalid date '{}': expected YYYY-MM-DD", raw)
            }
            ApiError::Pool(e) => write!(f, "Store connection unavailable: {}", e),
            ApiError::Store(e) => write!(f, "Store query failed: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<r2d2::Error> for ApiError {
    fn from(e: r2d2::Error) -> Self {
        ApiError::Pool(e)
    }
}

impl From<postgres::Error> for ApiError {
    fn from(e: postgres::Error) -> Self {
        ApiError::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Parsed request path. Literal segments win over the `{start}`
/// pattern, so `/api/v1.0/stations` is never read as a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Precipitation,
    Stations,
    Tobs,
    StatsFrom(String),
    StatsRange(String, String),
    NotFound,
}

impl Route {
    pub fn parse(url: &str) -> Route {
        // Query strings are irrelevant to every route; strip before matching.
        let path = match url.find('?') {
            Some(i) => &url[..i],
            None => url,
        };

        match path {
            "/" => Route::Home,
            "/api/v1.0/precipitation" => Route::Precipitation,
            "/api/v1.0/stations" => Route::Stations,
            "/api/v1.0/tobs" => Route::Tobs,
            _ => match path.strip_prefix("/api/v1.0/") {
                Some(rest) => {
                    let segments: Vec<&str> = rest.split('/').collect();
                    match segments.as_slice() {
                        [start] if !start.is_empty() => {
                            Route::StatsFrom((*start).to_string())
                        }
                        [start, end] if !start.is_empty() && !end.is_empty() => {
                            Route::StatsRange((*start).to_string(), (*end).to_string())
                        }
                        _ => Route::NotFound,
                    }
                }
                None => Route::NotFound,
            },
        }
    }
}

/// Strict date policy: `{start}`/`{end}` must be ISO `YYYY-MM-DD`.
/// Malformed input gets a 400 instead of a silently empty result.
fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ApiError::BadDate(raw.to_string()))
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// Shapes one precipitation observation into the canonical single-key
/// `{date: prcp}` object. An array of these (rather than one merged
/// date map) keeps duplicate dates from different stations distinct.
fn precipitation_entry(obs: &PrecipObservation) -> Value {
    let mut entry = serde_json::Map::with_capacity(1);
    entry.insert(obs.date.to_string(), json!(obs.prcp));
    Value::Object(entry)
}

/// Handle /api/v1.0/precipitation
fn handle_precipitation(pool: &Pool, window_start: NaiveDate) -> Result<Value, ApiError> {
    let mut conn = pool.get()?;
    let observations = queries::precipitation_in_window(&mut conn, window_start)?;

    Ok(Value::Array(
        observations.iter().map(precipitation_entry).collect(),
    ))
}

/// Handle /api/v1.0/stations
fn handle_stations(pool: &Pool) -> Result<Value, ApiError> {
    let mut conn = pool.get()?;
    let stations = queries::distinct_stations(&mut conn)?;

    Ok(json!(stations))
}

/// Handle /api/v1.0/tobs
///
/// Resolves the most-active station over the full dataset, then
/// returns its windowed temperature observations. An empty store has
/// no most-active station and yields an empty array.
fn handle_tobs(pool: &Pool, window_start: NaiveDate) -> Result<Value, ApiError> {
    let mut conn = pool.get()?;

    let most_active = match queries::most_active_station(&mut conn)? {
        Some(station) => station,
        None => return Ok(json!([])),
    };

    let rows = queries::station_temps_in_window(&mut conn, &most_active.station_id, window_start)?;
    let observations: Vec<TempObservation> = rows
        .into_iter()
        .map(|m| TempObservation {
            date: m.obs_date,
            temperature: m.tobs,
        })
        .collect();

    Ok(serde_json::to_value(&observations).unwrap_or(Value::Null))
}

/// Handle /api/v1.0/{start} and /api/v1.0/{start}/{end}
fn handle_temperature_stats(
    pool: &Pool,
    raw_start: &str,
    raw_end: Option<&str>,
) -> Result<Value, ApiError> {
    // Both dates must parse before the store is touched.
    let start = parse_date(raw_start)?;
    let end = match raw_end {
        Some(raw) => Some(parse_date(raw)?),
        None => None,
    };

    let mut conn = pool.get()?;
    let stats = queries::temperature_stats(&mut conn, start, end)?;

    Ok(serde_json::to_value(&stats).unwrap_or(Value::Null))
}

// ---------------------------------------------------------------------------
// HTTP server
// ---------------------------------------------------------------------------

/// Start the HTTP endpoint server. Blocks the calling thread; requests
/// are dispatched to a fixed-size worker pool, and each handler checks
/// a store connection out of `pool` for the duration of one request.
pub fn start_endpoint_server(config: &ServiceConfig, pool: Pool) -> Result<(), String> {
    let server = tiny_http::Server::http(config.server.bind.as_str())
        .map_err(|e| format!("Failed to start HTTP server on {}: {}", config.server.bind, e))?;

    let window_start = config.data.window_start();
    let workers = ThreadPool::new(config.server.workers);

    println!("📡 HTTP endpoint listening on http://{}", config.server.bind);
    println!("   GET /");
    for route in ROUTE_LISTING {
        println!("   GET {}", route);
    }
    println!();

    for request in server.incoming_requests() {
        let pool = pool.clone();
        workers.execute(move || handle_request(request, &pool, window_start));
    }

    Ok(())
}

fn handle_request(request: Request, pool: &Pool, window_start: NaiveDate) {
    let response = dispatch(request.method(), request.url(), pool, window_start);

    if let Err(e) = request.respond(response) {
        eprintln!("Failed to send response: {}", e);
    }
}

fn dispatch(
    method: &Method,
    url: &str,
    pool: &Pool,
    window_start: NaiveDate,
) -> Response<Cursor<Vec<u8>>> {
    // Read-only API: everything except GET is rejected up front.
    if *method != Method::Get {
        return create_response(405, json!({ "error": "Method not allowed" }));
    }

    match Route::parse(url) {
        Route::Home => home_response(),
        Route::Precipitation => finish(handle_precipitation(pool, window_start)),
        Route::Stations => finish(handle_stations(pool)),
        Route::Tobs => finish(handle_tobs(pool, window_start)),
        Route::StatsFrom(start) => finish(handle_temperature_stats(pool, &start, None)),
        Route::StatsRange(start, end) => {
            finish(handle_temperature_stats(pool, &start, Some(end.as_str())))
        }
        Route::NotFound => create_response(404, not_found_body()),
    }
}

/// Convert a handler result into an HTTP response, logging failures.
fn finish(result: Result<Value, ApiError>) -> Response<Cursor<Vec<u8>>> {
    match result {
        Ok(body) => create_response(200, body),
        Err(e) => {
            eprintln!("Request failed: {}", e);
            create_response(e.status_code(), json!({ "error": e.to_string() }))
        }
    }
}

fn not_found_body() -> Value {
    json!({
        "error": "Not found",
        "available_endpoints": ROUTE_LISTING,
    })
}

/// HTML body for the `/` route listing (reference behavior: an anchor
/// list; templated routes are listed without links).
fn home_body() -> String {
    let mut body = String::from("<html><body>\n<h3>Available Routes:</h3>\n");
    for route in ROUTE_LISTING {
        if route.contains('{') {
            body.push_str(route);
            body.push_str("<br/>\n");
        } else {
            body.push_str(&format!("<a href=\"{route}\">{route}</a><br/>\n"));
        }
    }
    body.push_str("</body></html>\n");
    body
}

fn home_response() -> Response<Cursor<Vec<u8>>> {
    Response::from_string(home_body()).with_header(
        tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
            .unwrap(),
    )
}

/// Create HTTP response with JSON body
fn create_response(status_code: u16, json: Value) -> Response<Cursor<Vec<u8>>> {
    let body = serde_json::to_string_pretty(&json).unwrap();
    let bytes = body.into_bytes();

    Response::from_data(bytes)
        .with_status_code(tiny_http::StatusCode::from(status_code))
        .with_header(
            tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap(),
        )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // --- Routing -----------------------------------------------------------

    #[test]
    fn test_parse_root_route() {
        assert_eq!(Route::parse("/"), Route::Home);
    }

    #[test]
    fn test_parse_literal_routes() {
        assert_eq!(Route::parse("/api/v1.0/precipitation"), Route::Precipitation);
        assert_eq!(Route::parse("/api/v1.0/stations"), Route::Stations);
        assert_eq!(Route::parse("/api/v1.0/tobs"), Route::Tobs);
    }

    #[test]
    fn test_parse_start_route() {
        assert_eq!(
            Route::parse("/api/v1.0/2017-08-01"),
            Route::StatsFrom("2017-08-01".to_string())
        );
    }

    #[test]
    fn test_parse_start_end_route() {
        assert_eq!(
            Route::parse("/api/v1.0/2017-08-01/2017-08-23"),
            Route::StatsRange("2017-08-01".to_string(), "2017-08-23".to_string())
        );
    }

    #[test]
    fn test_parse_strips_query_string() {
        assert_eq!(
            Route::parse("/api/v1.0/precipitation?pretty=1"),
            Route::Precipitation
        );
        assert_eq!(
            Route::parse("/api/v1.0/2017-08-01?x=y"),
            Route::StatsFrom("2017-08-01".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_unknown_paths() {
        assert_eq!(Route::parse("/api/v2.0/stations"), Route::NotFound);
        assert_eq!(Route::parse("/health"), Route::NotFound);
        assert_eq!(Route::parse("/api/v1.0"), Route::NotFound);
        assert_eq!(Route::parse("/api/v1.0/"), Route::NotFound);
    }

    #[test]
    fn test_parse_rejects_extra_segments() {
        assert_eq!(
            Route::parse("/api/v1.0/2017-08-01/2017-08-23/extra"),
            Route::NotFound
        );
        assert_eq!(Route::parse("/api/v1.0/2017-08-01/"), Route::NotFound);
    }

    #[test]
    fn test_literal_segments_win_over_date_pattern() {
        // "stations" must never be treated as a malformed start date.
        assert_ne!(
            Route::parse("/api/v1.0/stations"),
            Route::StatsFrom("stations".to_string())
        );
    }

    // --- Date policy -------------------------------------------------------

    #[test]
    fn test_parse_date_accepts_iso_format() {
        assert_eq!(
            parse_date("2017-08-23").expect("should parse"),
            NaiveDate::from_ymd_opt(2017, 8, 23).expect("valid date")
        );
    }

    #[test]
    fn test_parse_date_rejects_malformed_input() {
        for raw in ["08/23/2017", "2017-02-30", "yesterday", "", "2017-08-23T00:00:00"] {
            let result = parse_date(raw);
            match result {
                Err(e) => assert_eq!(e.status_code(), 400, "'{}' should map to 400", raw),
                Ok(date) => panic!("'{}' unexpectedly parsed as {}", raw, date),
            }
        }
    }

    #[test]
    fn test_bad_date_message_names_the_segment() {
        let error = parse_date("not-a-date").expect_err("should be rejected");
        assert!(error.to_string().contains("not-a-date"));
    }

    // --- Response shaping --------------------------------------------------

    #[test]
    fn test_precipitation_entry_is_single_key_object() {
        let entry = precipitation_entry(&PrecipObservation {
            date: NaiveDate::from_ymd_opt(2016, 8, 24).expect("valid date"),
            prcp: Some(0.08),
        });

        let object = entry.as_object().expect("should be an object");
        assert_eq!(object.len(), 1);
        assert_eq!(object["2016-08-24"], 0.08);
    }

    #[test]
    fn test_precipitation_entry_preserves_null() {
        let entry = precipitation_entry(&PrecipObservation {
            date: NaiveDate::from_ymd_opt(2016, 8, 24).expect("valid date"),
            prcp: None,
        });

        assert!(entry["2016-08-24"].is_null(), "NULL prcp must stay null, not 0");
    }

    #[test]
    fn test_not_found_body_lists_every_data_route() {
        let body = not_found_body();
        let listed = body["available_endpoints"]
            .as_array()
            .expect("should list endpoints");
        assert_eq!(listed.len(), ROUTE_LISTING.len());
    }

    #[test]
    fn test_home_body_mentions_every_route() {
        let body = home_body();
        for route in ROUTE_LISTING {
            assert!(body.contains(route), "home listing missing {}", route);
        }
        assert!(body.contains("<a href=\"/api/v1.0/precipitation\">"));
    }
}
