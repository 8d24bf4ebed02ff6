//! Demo roster seeding.
//!
//! Loads passengers from a CSV file when present ("name,lat,lng", header
//! optional), otherwise generates a reproducible random roster around the
//! city center.

use std::error::Error;

use chrono::NaiveTime;
use csv::ReaderBuilder;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::config::constant::{
    DEFAULT_SCHEDULING_TIME, PASSENGER_CSV_PATH, SETTING_SCHEDULING_ENABLED,
    SETTING_SCHEDULING_TIME,
};
use crate::database::Store;
use crate::domain::types::Coordinate;

const CITY_CENTER: Coordinate = Coordinate {
    lat: 32.0741,
    lng: 34.7922,
};
const DEMO_SEED: u64 = 12345;
const DEMO_VEHICLES: usize = 4;
const DEMO_PASSENGERS: usize = 12;
const MAX_CSV_PASSENGERS: usize = 24;

/// Reads demo passengers from a CSV file.
/// Accepts files with or without a header and keeps at most `max_count` rows.
fn read_passengers_from_csv(
    csv_path: &str,
    max_count: usize,
) -> Result<Vec<(String, Coordinate)>, Box<dyn Error>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(csv_path)?;

    let mut passengers = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let record = row?;
        let name = match record.get(0) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        let lat = record.get(1).and_then(|v| v.parse::<f64>().ok());
        let lng = record.get(2).and_then(|v| v.parse::<f64>().ok());

        match (lat, lng) {
            (Some(lat), Some(lng)) => {
                passengers.push((name, Coordinate::new(lat, lng)));
                if passengers.len() >= max_count {
                    break;
                }
            }
            // Treat the first non-numeric row as a header and skip it.
            _ if idx == 0 => continue,
            _ => warn!("skipping malformed row {} in {}", idx + 1, csv_path),
        }
    }

    Ok(passengers)
}

fn jitter(center: Coordinate, rng: &mut ChaCha8Rng, spread: f64) -> Coordinate {
    Coordinate::new(
        center.lat + rng.gen_range(-spread..spread),
        center.lng + rng.gen_range(-spread..spread),
    )
}

fn random_passengers(count: usize, rng: &mut ChaCha8Rng) -> Vec<(String, Coordinate)> {
    (0..count)
        .map(|i| {
            (
                format!("Demo Passenger {}", i + 1),
                jitter(CITY_CENTER, rng, 0.05),
            )
        })
        .collect()
}

/// Seed destination, settings and a full demo roster into an empty store.
pub async fn seed_demo_data(store: &Store) -> Result<(), Box<dyn Error>> {
    store
        .set_destination(
            "Central Office",
            CITY_CENTER,
            "132 Menachem Begin Rd, Tel Aviv",
            NaiveTime::from_hms_opt(8, 0, 0).expect("valid time"),
        )
        .await?;
    store.set_setting(SETTING_SCHEDULING_ENABLED, "1").await?;
    store
        .set_setting(SETTING_SCHEDULING_TIME, DEFAULT_SCHEDULING_TIME)
        .await?;

    let mut rng = ChaCha8Rng::seed_from_u64(DEMO_SEED);

    for i in 0..DEMO_VEHICLES {
        let user_id = store
            .create_user(
                &format!("driver{}", i + 1),
                "demo-hash",
                "Driver",
                &format!("Demo Driver {}", i + 1),
            )
            .await?;
        let start = jitter(CITY_CENTER, &mut rng, 0.06);
        store
            .create_vehicle(user_id, 4, start, "", true)
            .await?;
    }

    let passengers = match read_passengers_from_csv(PASSENGER_CSV_PATH, MAX_CSV_PASSENGERS) {
        Ok(list) if !list.is_empty() => {
            info!(
                "Loaded {} demo passengers from {}",
                list.len(),
                PASSENGER_CSV_PATH
            );
            list
        }
        Ok(_) => {
            warn!(
                "{} is empty, generating random demo passengers",
                PASSENGER_CSV_PATH
            );
            random_passengers(DEMO_PASSENGERS, &mut rng)
        }
        Err(err) => {
            warn!(
                "Failed to read {}: {}. Generating random demo passengers.",
                PASSENGER_CSV_PATH, err
            );
            random_passengers(DEMO_PASSENGERS, &mut rng)
        }
    };

    for (i, (name, location)) in passengers.iter().enumerate() {
        let user_id = store
            .create_user(
                &format!("passenger{}", i + 1),
                "demo-hash",
                "Passenger",
                name,
            )
            .await?;
        store
            .create_passenger(user_id, name, *location, "", true)
            .await?;
    }

    info!(
        "Seeded demo data: {} vehicles, {} passengers",
        DEMO_VEHICLES,
        passengers.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeds_a_complete_roster() {
        let store = Store::in_memory().await.unwrap();
        seed_demo_data(&store).await.unwrap();

        assert!(store.destination().await.unwrap().is_some());
        let settings = store.scheduling_settings().await.unwrap();
        assert!(settings.enabled);

        let vehicles = store.available_vehicles().await.unwrap();
        let passengers = store.available_passengers().await.unwrap();
        assert_eq!(vehicles.len(), DEMO_VEHICLES);
        assert!(!passengers.is_empty());
    }

    #[test]
    fn random_roster_is_reproducible() {
        let mut a = ChaCha8Rng::seed_from_u64(DEMO_SEED);
        let mut b = ChaCha8Rng::seed_from_u64(DEMO_SEED);
        let first = random_passengers(5, &mut a);
        let second = random_passengers(5, &mut b);
        for (x, y) in first.iter().zip(&second) {
            assert_eq!(x.0, y.0);
            assert!((x.1.lat - y.1.lat).abs() < 1e-12);
            assert!((x.1.lng - y.1.lng).abs() < 1e-12);
        }
    }
}
