/// Query layer: bounded read-only queries against the climate store.
///
/// Every operation here is a single SQL pass over `climate.measurement`
/// or `climate.station`; no caching, no retries, no partial results.
/// Date filtering happens in SQL with typed `DATE` parameters, and
/// result ordering is always explicit so repeated calls against an
/// unchanged store return identical output.
///
/// `prcp`/`tobs` are NUMERIC in the store and arrive as
/// `rust_decimal::Decimal`; they are converted to `f64` here, at the
/// edge, with NULL preserved as `None` throughout.

use chrono::NaiveDate;
use postgres::Client;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::model::{
    DatasetSummary, Measurement, MostActiveStation, PrecipObservation, Station,
    TemperatureStats,
};

/// Converts an optional NUMERIC value read from the store to `f64`.
fn numeric_to_f64(value: Option<Decimal>) -> Option<f64> {
    value.and_then(|d| d.to_f64())
}

// ---------------------------------------------------------------------------
// Windowed observation queries
// ---------------------------------------------------------------------------

/// All (date, precipitation) pairs with `obs_date >= window_start`,
/// ascending by date.
///
/// Duplicate dates are expected (several stations report the same
/// day) and are all included. A NULL precipitation reading stays
/// `None`; it is a recorded observation with no measurable value, not
/// a zero.
pub fn precipitation_in_window(
    client: &mut Client,
    window_start: NaiveDate,
) -> Result<Vec<PrecipObservation>, postgres::Error> {
    let rows = client.query(
        "SELECT obs_date, prcp
         FROM climate.measurement
         WHERE obs_date >= $1
         ORDER BY obs_date",
        &[&window_start],
    )?;

    Ok(rows
        .iter()
        .map(|row| PrecipObservation {
            date: row.get(0),
            prcp: numeric_to_f64(row.get(1)),
        })
        .collect())
}

/// Every distinct station id present in the measurement table, sorted.
///
/// Deliberately independent of the station metadata table: a station
/// that reports measurements but has no registry row still appears.
pub fn distinct_stations(client: &mut Client) -> Result<Vec<String>, postgres::Error> {
    let rows = client.query(
        "SELECT DISTINCT station_id
         FROM climate.measurement
         ORDER BY station_id",
        &[],
    )?;

    Ok(rows.iter().map(|row| row.get(0)).collect())
}

// ---------------------------------------------------------------------------
// Most-active station
// ---------------------------------------------------------------------------

/// The station with the most non-null temperature readings across the
/// full measurement set (not windowed).
///
/// Ties are broken by ascending station id, making the result fully
/// deterministic rather than dependent on store iteration order.
/// Returns `None` only when the measurement table is empty.
pub fn most_active_station(
    client: &mut Client,
) -> Result<Option<MostActiveStation>, postgres::Error> {
    let rows = client.query(
        "SELECT station_id, COUNT(tobs) AS temp_readings
         FROM climate.measurement
         GROUP BY station_id
         ORDER BY COUNT(tobs) DESC, station_id ASC
         LIMIT 1",
        &[],
    )?;

    Ok(rows.first().map(|row| MostActiveStation {
        station_id: row.get(0),
        temp_readings: row.get(1),
    }))
}

/// Full measurement rows for one station with `obs_date >=
/// window_start`, ascending by date.
///
/// The tobs endpoint composes `most_active_station` with this query;
/// returning whole rows keeps the station id attached so callers can
/// verify every row belongs to the station they asked for.
pub fn station_temps_in_window(
    client: &mut Client,
    station_id: &str,
    window_start: NaiveDate,
) -> Result<Vec<Measurement>, postgres::Error> {
    let rows = client.query(
        "SELECT station_id, obs_date, prcp, tobs
         FROM climate.measurement
         WHERE station_id = $1 AND obs_date >= $2
         ORDER BY obs_date",
        &[&station_id, &window_start],
    )?;

    Ok(rows
        .iter()
        .map(|row| Measurement {
            station_id: row.get(0),
            obs_date: row.get(1),
            prcp: numeric_to_f64(row.get(2)),
            tobs: numeric_to_f64(row.get(3)),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// MIN/AVG/MAX over temperature for `obs_date >= start`, optionally
/// bounded by `obs_date <= end` (both bounds inclusive).
///
/// SQL aggregates skip NULL temperatures, and an empty range yields a
/// single all-NULL row, so "no data" comes back as three `None` fields
/// rather than an error. An inverted range (`end < start`) matches
/// nothing and takes the same path.
pub fn temperature_stats(
    client: &mut Client,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Result<TemperatureStats, postgres::Error> {
    let row = match end {
        Some(end) => client.query_one(
            "SELECT MIN(tobs), AVG(tobs), MAX(tobs)
             FROM climate.measurement
             WHERE obs_date >= $1 AND obs_date <= $2",
            &[&start, &end],
        )?,
        None => client.query_one(
            "SELECT MIN(tobs), AVG(tobs), MAX(tobs)
             FROM climate.measurement
             WHERE obs_date >= $1",
            &[&start],
        )?,
    };

    Ok(TemperatureStats {
        min_temp: numeric_to_f64(row.get(0)),
        avg_temp: numeric_to_f64(row.get(1)),
        max_temp: numeric_to_f64(row.get(2)),
    })
}

// ---------------------------------------------------------------------------
// Startup report queries
// ---------------------------------------------------------------------------

/// Whole-dataset summary for the startup report.
pub fn dataset_summary(client: &mut Client) -> Result<DatasetSummary, postgres::Error> {
    let row = client.query_one(
        "SELECT COUNT(*), COUNT(DISTINCT station_id), MIN(obs_date), MAX(obs_date)
         FROM climate.measurement",
        &[],
    )?;

    Ok(DatasetSummary {
        measurements: row.get(0),
        stations: row.get(1),
        first_date: row.get(2),
        last_date: row.get(3),
    })
}

/// Metadata lookup for a single station. `None` when the id has no
/// registry row (measurements may reference unregistered stations).
pub fn station_by_id(
    client: &mut Client,
    station_id: &str,
) -> Result<Option<Station>, postgres::Error> {
    let row = client.query_opt(
        "SELECT station_id, name, latitude, longitude, elevation
         FROM climate.station
         WHERE station_id = $1",
        &[&station_id],
    )?;

    Ok(row.map(|row| Station {
        station_id: row.get(0),
        name: row.get(1),
        latitude: row.get(2),
        longitude: row.get(3),
        elevation: row.get(4),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // Query behavior against a live store is covered by
    // tests/query_integration.rs; these exercise the NUMERIC edge.

    #[test]
    fn test_numeric_to_f64_preserves_null() {
        assert_eq!(numeric_to_f64(None), None);
    }

    #[test]
    fn test_numeric_to_f64_converts_decimal_scale() {
        // NUMERIC(5,1) temperature: 76.5
        assert_eq!(numeric_to_f64(Some(Decimal::new(765, 1))), Some(76.5));
        // NUMERIC(6,2) precipitation: 0.08
        assert_eq!(numeric_to_f64(Some(Decimal::new(8, 2))), Some(0.08));
    }

    #[test]
    fn test_numeric_to_f64_handles_zero_without_coercing_null() {
        // 0.0 and NULL are distinct answers and must stay that way.
        assert_eq!(numeric_to_f64(Some(Decimal::ZERO)), Some(0.0));
        assert_ne!(numeric_to_f64(Some(Decimal::ZERO)), None);
    }
}
