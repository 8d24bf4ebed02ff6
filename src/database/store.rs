//! Transactional persistence of users, vehicles, passengers, the
//! destination, route sets, the run log and settings.
//!
//! `save_solution` is the single write transaction of the core: either the
//! whole route set for a date lands, or none of it.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::constant::{
    DEFAULT_SCHEDULING_TIME, SETTING_SCHEDULING_ENABLED, SETTING_SCHEDULING_TIME,
};
use crate::database::sqlx::{db_connection, memory_connection};
use crate::domain::solution::Solution;
use crate::domain::types::{
    format_hhmm, parse_time_of_day, Coordinate, Destination, Passenger, RouteDetails, RunOutcome,
    SchedulingSettings, Vehicle,
};

#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

/// A persisted Routes row.
#[derive(Debug, Clone)]
pub struct PersistedRoute {
    pub id: i64,
    pub solution_date: String,
    pub generated_time: String,
}

/// A persisted RouteDetails row.
#[derive(Debug, Clone)]
pub struct PersistedRouteDetail {
    pub id: i64,
    pub route_id: i64,
    pub vehicle_id: i64,
    pub total_distance: f64,
    pub total_time: f64,
    pub departure_time: Option<String>,
}

/// A persisted PassengerAssignments row.
#[derive(Debug, Clone)]
pub struct PersistedAssignment {
    pub passenger_id: i64,
    pub stop_order: i64,
    pub estimated_pickup_time: Option<String>,
}

/// A SchedulingLog row.
#[derive(Debug, Clone)]
pub struct RunLogEntry {
    pub run_time: String,
    pub status: String,
    pub routes_generated: i64,
    pub passengers_assigned: i64,
    pub message: String,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect() -> Result<Self, sqlx::Error> {
        Ok(Self::new(db_connection().await?))
    }

    /// In-memory store for tests.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let store = Self::new(memory_connection().await?);
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS Users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                passwordHash TEXT NOT NULL,
                userType TEXT NOT NULL,
                name TEXT,
                email TEXT,
                phone TEXT,
                createdDate TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS Vehicles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                userId INTEGER UNIQUE,
                capacity INTEGER NOT NULL,
                startLat REAL NOT NULL,
                startLng REAL NOT NULL,
                startAddress TEXT,
                availableTomorrow INTEGER NOT NULL DEFAULT 0,
                departureTime TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS Passengers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                userId INTEGER,
                name TEXT NOT NULL,
                lat REAL NOT NULL,
                lng REAL NOT NULL,
                address TEXT,
                availableTomorrow INTEGER NOT NULL DEFAULT 0,
                estimatedPickupTime TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS Destination (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                lat REAL NOT NULL,
                lng REAL NOT NULL,
                address TEXT,
                targetArrivalTime TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS Routes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                solutionDate TEXT NOT NULL,
                generatedTime TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS RouteDetails (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                routeId INTEGER NOT NULL REFERENCES Routes(id),
                vehicleId INTEGER NOT NULL,
                totalDistance REAL NOT NULL,
                totalTime REAL NOT NULL,
                departureTime TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS PassengerAssignments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                routeDetailId INTEGER NOT NULL REFERENCES RouteDetails(id),
                passengerId INTEGER NOT NULL,
                stopOrder INTEGER NOT NULL,
                estimatedPickupTime TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS RoutePathPoints (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                routeDetailId INTEGER NOT NULL REFERENCES RouteDetails(id),
                pointOrder INTEGER NOT NULL,
                lat REAL NOT NULL,
                lng REAL NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS Settings (
                name TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS SchedulingLog (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                runTime TEXT NOT NULL,
                status TEXT NOT NULL,
                routesGenerated INTEGER NOT NULL,
                passengersAssigned INTEGER NOT NULL,
                errorMessage TEXT
            )
            "#,
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        debug!("database schema ready");
        Ok(())
    }

    // === Settings ===

    async fn setting(&self, name: &str) -> Result<Option<String>, sqlx::Error> {
        let row = sqlx::query("SELECT value FROM Settings WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    pub async fn set_setting(&self, name: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO Settings (name, value) VALUES (?, ?)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
        )
        .bind(name)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Read every tick so admins can flip scheduling at runtime.
    pub async fn scheduling_settings(&self) -> Result<SchedulingSettings, sqlx::Error> {
        let enabled = self
            .setting(SETTING_SCHEDULING_ENABLED)
            .await?
            .map(|v| v == "1")
            .unwrap_or(false);
        let scheduled_time = self
            .setting(SETTING_SCHEDULING_TIME)
            .await?
            .as_deref()
            .and_then(parse_time_of_day)
            .unwrap_or_else(|| {
                parse_time_of_day(DEFAULT_SCHEDULING_TIME).expect("default time parses")
            });

        Ok(SchedulingSettings {
            enabled,
            scheduled_time,
        })
    }

    // === Destination ===

    pub async fn destination(&self) -> Result<Option<Destination>, sqlx::Error> {
        let row = sqlx::query("SELECT name, lat, lng, targetArrivalTime FROM Destination LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|r| {
            let target: String = r.get("targetArrivalTime");
            parse_time_of_day(&target).map(|target_arrival_time| Destination {
                name: r.get("name"),
                location: Coordinate::new(r.get::<f64, _>("lat"), r.get::<f64, _>("lng")),
                target_arrival_time,
            })
        }))
    }

    pub async fn set_destination(
        &self,
        name: &str,
        location: Coordinate,
        address: &str,
        target_arrival_time: NaiveTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO Destination (id, name, lat, lng, address, targetArrivalTime)
             VALUES (1, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 lat = excluded.lat,
                 lng = excluded.lng,
                 address = excluded.address,
                 targetArrivalTime = excluded.targetArrivalTime",
        )
        .bind(name)
        .bind(location.lat)
        .bind(location.lng)
        .bind(address)
        .bind(target_arrival_time.format("%H:%M:%S").to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // === Roster ===

    pub async fn available_vehicles(&self) -> Result<Vec<Vehicle>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, capacity, startLat, startLng, availableTomorrow, departureTime
             FROM Vehicles WHERE availableTomorrow = 1 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(vehicle_from_row).collect())
    }

    pub async fn available_passengers(&self) -> Result<Vec<Passenger>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, name, lat, lng, availableTomorrow, estimatedPickupTime
             FROM Passengers WHERE availableTomorrow = 1 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(passenger_from_row).collect())
    }

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        user_type: &str,
        name: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO Users (username, passwordHash, userType, name, createdDate)
             VALUES (?, ?, ?, ?, datetime('now', 'localtime'))",
        )
        .bind(username)
        .bind(password_hash)
        .bind(user_type)
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn create_vehicle(
        &self,
        user_id: i64,
        capacity: usize,
        start: Coordinate,
        address: &str,
        available_tomorrow: bool,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO Vehicles (userId, capacity, startLat, startLng, startAddress, availableTomorrow)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(capacity as i64)
        .bind(start.lat)
        .bind(start.lng)
        .bind(address)
        .bind(available_tomorrow as i64)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn create_passenger(
        &self,
        user_id: i64,
        name: &str,
        location: Coordinate,
        address: &str,
        available_tomorrow: bool,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO Passengers (userId, name, lat, lng, address, availableTomorrow)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(name)
        .bind(location.lat)
        .bind(location.lng)
        .bind(address)
        .bind(available_tomorrow as i64)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    // === Route sets ===

    /// Persist a timed solution as the route set for `solution_date`.
    /// All-or-nothing: Routes, RouteDetails, PassengerAssignments,
    /// RoutePathPoints and the Vehicle/Passenger time updates commit in one
    /// transaction. Repeat runs for the same date append a newer set.
    pub async fn save_solution(
        &self,
        solution: &Solution,
        details: &HashMap<i64, RouteDetails>,
        solution_date: NaiveDate,
        generated_at: NaiveDateTime,
    ) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let route_id = sqlx::query("INSERT INTO Routes (solutionDate, generatedTime) VALUES (?, ?)")
            .bind(solution_date.format("%Y-%m-%d").to_string())
            .bind(generated_at.format("%Y-%m-%d %H:%M:%S").to_string())
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

        for vehicle in solution.used_vehicles() {
            let detail = match details.get(&vehicle.id) {
                Some(detail) => detail,
                None => {
                    return Err(sqlx::Error::Protocol(format!(
                        "no route details for vehicle {}",
                        vehicle.id
                    )))
                }
            };

            let detail_id = sqlx::query(
                "INSERT INTO RouteDetails (routeId, vehicleId, totalDistance, totalTime, departureTime)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(route_id)
            .bind(vehicle.id)
            .bind(detail.total_distance)
            .bind(detail.total_time)
            .bind(detail.departure_time.map(format_hhmm))
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

            for (i, passenger) in vehicle.assigned_passengers.iter().enumerate() {
                let pickup = passenger.estimated_pickup_time.map(format_hhmm);
                sqlx::query(
                    "INSERT INTO PassengerAssignments
                         (routeDetailId, passengerId, stopOrder, estimatedPickupTime)
                     VALUES (?, ?, ?, ?)",
                )
                .bind(detail_id)
                .bind(passenger.id)
                .bind((i + 1) as i64)
                .bind(pickup.clone())
                .execute(&mut *tx)
                .await?;

                sqlx::query("UPDATE Passengers SET estimatedPickupTime = ? WHERE id = ?")
                    .bind(pickup)
                    .bind(passenger.id)
                    .execute(&mut *tx)
                    .await?;
            }

            for (i, point) in detail.path.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO RoutePathPoints (routeDetailId, pointOrder, lat, lng)
                     VALUES (?, ?, ?, ?)",
                )
                .bind(detail_id)
                .bind(i as i64)
                .bind(point.lat)
                .bind(point.lng)
                .execute(&mut *tx)
                .await?;
            }

            sqlx::query("UPDATE Vehicles SET departureTime = ? WHERE id = ?")
                .bind(detail.departure_time.map(format_hhmm))
                .bind(vehicle.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(
            "saved route set {} for {} ({} vehicles)",
            route_id,
            solution_date,
            solution.vehicles_used()
        );
        Ok(route_id)
    }

    pub async fn routes_for_date(&self, date: NaiveDate) -> Result<Vec<PersistedRoute>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, solutionDate, generatedTime FROM Routes WHERE solutionDate = ? ORDER BY id",
        )
        .bind(date.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| PersistedRoute {
                id: r.get("id"),
                solution_date: r.get("solutionDate"),
                generated_time: r.get("generatedTime"),
            })
            .collect())
    }

    pub async fn route_details(&self, route_id: i64) -> Result<Vec<PersistedRouteDetail>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, routeId, vehicleId, totalDistance, totalTime, departureTime
             FROM RouteDetails WHERE routeId = ? ORDER BY id",
        )
        .bind(route_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| PersistedRouteDetail {
                id: r.get("id"),
                route_id: r.get("routeId"),
                vehicle_id: r.get("vehicleId"),
                total_distance: r.get("totalDistance"),
                total_time: r.get("totalTime"),
                departure_time: r.get("departureTime"),
            })
            .collect())
    }

    pub async fn assignments(
        &self,
        route_detail_id: i64,
    ) -> Result<Vec<PersistedAssignment>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT passengerId, stopOrder, estimatedPickupTime
             FROM PassengerAssignments WHERE routeDetailId = ? ORDER BY stopOrder",
        )
        .bind(route_detail_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| PersistedAssignment {
                passenger_id: r.get("passengerId"),
                stop_order: r.get("stopOrder"),
                estimated_pickup_time: r.get("estimatedPickupTime"),
            })
            .collect())
    }

    pub async fn path_points(&self, route_detail_id: i64) -> Result<Vec<Coordinate>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT lat, lng FROM RoutePathPoints WHERE routeDetailId = ? ORDER BY pointOrder",
        )
        .bind(route_detail_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| Coordinate::new(r.get::<f64, _>("lat"), r.get::<f64, _>("lng")))
            .collect())
    }

    // === Run log ===

    pub async fn log_run(
        &self,
        run_time: NaiveDateTime,
        outcome: &RunOutcome,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO SchedulingLog
                 (runTime, status, routesGenerated, passengersAssigned, errorMessage)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(run_time.format("%Y-%m-%d %H:%M:%S").to_string())
        .bind(outcome.status.as_str())
        .bind(outcome.routes_generated as i64)
        .bind(outcome.passengers_assigned as i64)
        .bind(&outcome.message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn run_log(&self) -> Result<Vec<RunLogEntry>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT runTime, status, routesGenerated, passengersAssigned, errorMessage
             FROM SchedulingLog ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| RunLogEntry {
                run_time: r.get("runTime"),
                status: r.get("status"),
                routes_generated: r.get("routesGenerated"),
                passengers_assigned: r.get("passengersAssigned"),
                message: r.get::<Option<String>, _>("errorMessage").unwrap_or_default(),
            })
            .collect())
    }
}

fn vehicle_from_row(row: &SqliteRow) -> Vehicle {
    let departure: Option<String> = row.get("departureTime");
    Vehicle {
        id: row.get("id"),
        capacity: row.get::<i64, _>("capacity") as usize,
        start: Coordinate::new(row.get::<f64, _>("startLat"), row.get::<f64, _>("startLng")),
        available_tomorrow: row.get::<i64, _>("availableTomorrow") != 0,
        departure_time: departure.as_deref().and_then(parse_time_of_day),
        assigned_passengers: Vec::new(),
        total_distance: 0.0,
        total_time: 0.0,
        route_path: Vec::new(),
    }
}

fn passenger_from_row(row: &SqliteRow) -> Passenger {
    let pickup: Option<String> = row.get("estimatedPickupTime");
    Passenger {
        id: row.get("id"),
        name: row.get("name"),
        location: Coordinate::new(row.get::<f64, _>("lat"), row.get::<f64, _>("lng")),
        available_tomorrow: row.get::<i64, _>("availableTomorrow") != 0,
        estimated_pickup_time: pickup.as_deref().and_then(parse_time_of_day),
    }
}
