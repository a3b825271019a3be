/// Shared data types for the climate observation query service.
///
/// The two record types mirror the tables of the `climate` schema
/// exactly: the schema is declared here, statically, and verified
/// against the live store at startup (see `db::verify_table`). Nothing
/// in this service discovers table structure at runtime.

use chrono::NaiveDate;
use serde::Serialize;

/// PostgreSQL schema holding both climate tables.
pub const SCHEMA: &str = "climate";

// ---------------------------------------------------------------------------
// Store records
// ---------------------------------------------------------------------------

/// One daily observation row from `climate.measurement`.
///
/// Both readings are nullable: a station may report precipitation
/// without temperature on a given day, or vice versa. NULL stays
/// `None` all the way to the JSON boundary and is never coerced to
/// zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// NOAA GHCN station identifier, e.g. "USC00519281".
    pub station_id: String,
    /// Observation date (local calendar date, no time component).
    pub obs_date: NaiveDate,
    /// Daily precipitation in inches, if reported.
    pub prcp: Option<f64>,
    /// Temperature observation in °F, if reported.
    pub tobs: Option<f64>,
}

impl Measurement {
    pub const TABLE: &'static str = "measurement";
    pub const COLUMNS: &'static [&'static str] =
        &["station_id", "obs_date", "prcp", "tobs"];
}

/// Station metadata row from `climate.station`.
///
/// Measurements reference stations by id only; a station row may be
/// absent for ids that appear in `measurement` (the registry is not
/// enforced by this service).
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub station_id: String,
    /// Official station name, e.g. "WAIHEE 837.5, HI US".
    pub name: String,
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    /// Elevation in meters above sea level.
    pub elevation: f64,
}

impl Station {
    pub const TABLE: &'static str = "station";
    pub const COLUMNS: &'static [&'static str] =
        &["station_id", "name", "latitude", "longitude", "elevation"];
}

// ---------------------------------------------------------------------------
// Query results and response shapes
// ---------------------------------------------------------------------------

/// One (date, precipitation) pair from the windowed precipitation query.
///
/// The endpoint layer shapes these into single-key `{date: prcp}` JSON
/// objects; see `endpoint::precipitation_entry`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecipObservation {
    pub date: NaiveDate,
    pub prcp: Option<f64>,
}

/// One (date, temperature) pair for the most-active-station response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TempObservation {
    pub date: NaiveDate,
    pub temperature: Option<f64>,
}

/// Aggregate temperature statistics over a date range.
///
/// All three fields are null when no row with a non-null temperature
/// falls in the range; an empty window is a valid answer, not an
/// error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureStats {
    pub min_temp: Option<f64>,
    pub avg_temp: Option<f64>,
    pub max_temp: Option<f64>,
}

/// The station with the highest count of non-null temperature readings
/// across the full measurement set.
#[derive(Debug, Clone, PartialEq)]
pub struct MostActiveStation {
    pub station_id: String,
    /// Count of non-null `tobs` rows for this station.
    pub temp_readings: i64,
}

/// Whole-dataset summary printed in the startup report.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub measurements: i64,
    pub stations: i64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_columns_are_distinct() {
        for columns in [Measurement::COLUMNS, Station::COLUMNS] {
            let mut seen = std::collections::HashSet::new();
            for column in columns {
                assert!(seen.insert(column), "duplicate column '{}'", column);
            }
        }
    }

    #[test]
    fn test_both_tables_declare_station_id() {
        // distinct_stations and station_by_id join the two tables on
        // this column name.
        assert!(Measurement::COLUMNS.contains(&"station_id"));
        assert!(Station::COLUMNS.contains(&"station_id"));
    }

    #[test]
    fn test_temp_observation_serializes_date_as_iso() {
        let obs = TempObservation {
            date: NaiveDate::from_ymd_opt(2017, 8, 23).expect("valid date"),
            temperature: Some(77.0),
        };
        let json = serde_json::to_value(&obs).expect("serializable");
        assert_eq!(json["date"], "2017-08-23");
        assert_eq!(json["temperature"], 77.0);
    }

    #[test]
    fn test_temp_observation_preserves_null_temperature() {
        let obs = TempObservation {
            date: NaiveDate::from_ymd_opt(2016, 12, 1).expect("valid date"),
            temperature: None,
        };
        let json = serde_json::to_value(&obs).expect("serializable");
        assert!(json["temperature"].is_null());
    }

    #[test]
    fn test_empty_stats_serialize_as_three_nulls() {
        let stats = TemperatureStats {
            min_temp: None,
            avg_temp: None,
            max_temp: None,
        };
        let json = serde_json::to_value(&stats).expect("serializable");
        assert!(json["min_temp"].is_null());
        assert!(json["avg_temp"].is_null());
        assert!(json["max_temp"].is_null());
        assert_eq!(json.as_object().map(|o| o.len()), Some(3));
    }

    #[test]
    fn test_stats_serialize_numeric_fields_unrounded() {
        let stats = TemperatureStats {
            min_temp: Some(58.0),
            avg_temp: Some(74.59058295964125),
            max_temp: Some(87.0),
        };
        let json = serde_json::to_value(&stats).expect("serializable");
        assert_eq!(json["avg_temp"], 74.59058295964125);
    }
}
