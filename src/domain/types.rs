use chrono::NaiveTime;
use std::fmt;

/// Stop sentinel: the final destination leg of a route, as opposed to a
/// passenger pickup.
pub const DESTINATION_STOP: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Canonical "lat,lng" fragment used in waypoint cache keys.
    pub fn key(&self) -> String {
        format!("{:.6},{:.6}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone)]
pub struct Passenger {
    pub id: i64,
    pub name: String,
    pub location: Coordinate,
    pub available_tomorrow: bool,
    /// Output slot, filled by the routing engine.
    pub estimated_pickup_time: Option<NaiveTime>,
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: i64,
    pub capacity: usize,
    pub start: Coordinate,
    pub available_tomorrow: bool,
    /// Output slot, filled by the routing engine.
    pub departure_time: Option<NaiveTime>,
    /// Output slot, filled by the solver (pickup order matters).
    pub assigned_passengers: Vec<Passenger>,
    /// Total route distance in km (output slot).
    pub total_distance: f64,
    /// Total route time in minutes (output slot).
    pub total_time: f64,
    /// Ordered route geometry (output slot).
    pub route_path: Vec<Coordinate>,
}

impl Vehicle {
    pub fn new(id: i64, capacity: usize, start: Coordinate) -> Self {
        Self {
            id,
            capacity,
            start,
            available_tomorrow: true,
            departure_time: None,
            assigned_passengers: Vec::new(),
            total_distance: 0.0,
            total_time: 0.0,
            route_path: Vec::new(),
        }
    }
}

/// The shared drop-off point; immutable for the duration of a solver run.
#[derive(Debug, Clone)]
pub struct Destination {
    pub name: String,
    pub location: Coordinate,
    pub target_arrival_time: NaiveTime,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulingSettings {
    pub enabled: bool,
    pub scheduled_time: NaiveTime,
}

/// One stop in a computed route: a passenger pickup, or the destination
/// itself when `passenger_id == DESTINATION_STOP`.
#[derive(Debug, Clone)]
pub struct RouteStop {
    pub passenger_id: i64,
    pub location: Coordinate,
    pub distance_from_previous: f64,
    pub time_from_previous: f64,
    pub cumulative_distance: f64,
    pub cumulative_time: f64,
}

/// Per-vehicle timing computed by the routing engine.
#[derive(Debug, Clone)]
pub struct RouteDetails {
    pub vehicle_id: i64,
    pub total_distance: f64,
    pub total_time: f64,
    pub departure_time: Option<NaiveTime>,
    pub stops: Vec<RouteStop>,
    pub path: Vec<Coordinate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failed,
    Skipped,
    Error,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Success => "Success",
            RunStatus::Failed => "Failed",
            RunStatus::Skipped => "Skipped",
            RunStatus::Error => "Error",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one scheduling run; becomes an append-only RunLog entry.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub routes_generated: usize,
    pub passengers_assigned: usize,
    pub message: String,
}

impl RunOutcome {
    pub fn success(routes_generated: usize, passengers_assigned: usize, message: String) -> Self {
        Self {
            status: RunStatus::Success,
            routes_generated,
            passengers_assigned,
            message,
        }
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Skipped,
            routes_generated: 0,
            passengers_assigned: 0,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Failed,
            routes_generated: 0,
            passengers_assigned: 0,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Error,
            routes_generated: 0,
            passengers_assigned: 0,
            message: message.into(),
        }
    }
}

/// Parse a stored time-of-day, accepting both "HH:MM:SS" and "HH:MM".
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// Format a time-of-day the way it is persisted ("HH:MM", minute precision).
pub fn format_hhmm(value: NaiveTime) -> String {
    value.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_stored_time_formats() {
        assert_eq!(
            parse_time_of_day("08:00:00"),
            NaiveTime::from_hms_opt(8, 0, 0)
        );
        assert_eq!(parse_time_of_day("07:45"), NaiveTime::from_hms_opt(7, 45, 0));
        assert_eq!(parse_time_of_day("not a time"), None);
    }

    #[test]
    fn formats_minute_precision() {
        let t = NaiveTime::from_hms_opt(6, 5, 59).unwrap();
        assert_eq!(format_hhmm(t), "06:05");
    }

    #[test]
    fn coordinate_key_is_stable() {
        let c = Coordinate::new(32.0741, 34.7922);
        assert_eq!(c.key(), "32.074100,34.792200");
    }
}
