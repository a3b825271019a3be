//! Climate Observation API Service
//!
//! A read-only HTTP server over the Hawaii daily climate dataset:
//! 1. Validates the PostgreSQL store against the declared schema on startup
//! 2. Prints a dataset summary (row counts, date range, most-active station)
//! 3. Serves windowed precipitation/temperature queries as JSON
//!
//! The dataset is loaded externally (see sql/001_climate_schema.sql);
//! this service never writes to the store.
//!
//! Usage:
//!   cargo run --release                           # service.toml in cwd
//!   cargo run --release -- --config /etc/climapi/service.toml
//!   cargo run --release -- --port 9090            # override configured port
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string (read-only role)

use climapi_service::config::{self, ServiceConfig};
use climapi_service::db;
use climapi_service::endpoint;
use climapi_service::queries;
use std::env;

fn main() {
    println!("🌧  Climate Observation API Service");
    println!("====================================\n");

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut config_path = String::from("service.toml");
    let mut port_override: Option<u16> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if i + 1 < args.len() {
                    config_path = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: --config requires a file path");
                    std::process::exit(1);
                }
            }
            "--port" => {
                if i + 1 < args.len() {
                    port_override = args[i + 1].parse().ok();
                    if port_override.is_none() {
                        eprintln!("Error: --port requires a port number");
                        std::process::exit(1);
                    }
                    i += 2;
                } else {
                    eprintln!("Error: --port requires a port number");
                    std::process::exit(1);
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Usage: {} [--config PATH] [--port PORT]", args[0]);
                std::process::exit(1);
            }
        }
    }

    let mut config = config::load_config(&config_path);
    if let Some(port) = port_override {
        config.server.bind = config.server.bind_with_port(port);
    }

    println!("📋 Configuration ({}):", config_path);
    println!("   Anchor date: {}", config.data.anchor_date);
    println!(
        "   Window: last {} days ({} onward)",
        config.data.window_days,
        config.data.window_start()
    );
    println!("   Bind address: {}\n", config.server.bind);

    // Validate the store against the declared schema before serving.
    println!("📊 Validating climate store...");
    let pool = match db::connect_and_verify(config.database.pool_size) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("\n❌ Store validation failed: {}\n", e);
            std::process::exit(1);
        }
    };
    println!("✓ Schema and tables verified\n");

    print_dataset_report(&pool, &config);

    println!("🚀 Starting HTTP endpoint...");
    if let Err(e) = endpoint::start_endpoint_server(&config, pool) {
        eprintln!("❌ Endpoint server error: {}", e);
        std::process::exit(1);
    }
}

/// Print a startup summary of the deployed dataset. Failures here are
/// reported but never fatal; the endpoint can still serve.
fn print_dataset_report(pool: &db::Pool, config: &ServiceConfig) {
    let mut conn = match pool.get() {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("   Could not read dataset summary: {}", e);
            return;
        }
    };

    println!("📋 Dataset summary:");
    match queries::dataset_summary(&mut conn) {
        Ok(summary) => {
            println!(
                "   {} measurements across {} stations",
                summary.measurements, summary.stations
            );
            match (summary.first_date, summary.last_date) {
                (Some(first), Some(last)) => {
                    println!("   Observations from {} to {}", first, last);
                    if last != config.data.anchor_date {
                        println!(
                            "   ⚠ Configured anchor date {} differs from last observation {};",
                            config.data.anchor_date, last
                        );
                        println!("     \"last year\" windows stay anchored to the configured date.");
                    }
                }
                _ => println!("   No observations loaded"),
            }
        }
        Err(e) => eprintln!("   Error reading dataset summary: {}", e),
    }

    match queries::most_active_station(&mut conn) {
        Ok(Some(most_active)) => {
            match queries::station_by_id(&mut conn, &most_active.station_id) {
                Ok(Some(station)) => println!(
                    "   Most active station: {} ({}) at {:.4}, {:.4}, elevation {} m with {} temperature readings",
                    station.station_id,
                    station.name,
                    station.latitude,
                    station.longitude,
                    station.elevation,
                    most_active.temp_readings
                ),
                Ok(None) => println!(
                    "   Most active station: {} (no registry entry) with {} temperature readings",
                    most_active.station_id, most_active.temp_readings
                ),
                Err(e) => eprintln!("   Error reading station metadata: {}", e),
            }
        }
        Ok(None) => {}
        Err(e) => eprintln!("   Error resolving most active station: {}", e),
    }
    println!();
}
