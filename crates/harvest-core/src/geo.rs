//! # Distance Estimator
//!
//! Great-circle (haversine) distance between two coordinates plus a naive
//! travel-time estimate at a constant 30 km/h.
//!
//! ```text
//!   a = sin²(Δφ/2) + cos φ1 · cos φ2 · sin²(Δλ/2)
//!   c = 2 · atan2(√a, √(1−a))
//!   d = R · c                 (R = 6371 km)
//!   minutes = round(d / 30 · 60)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Average delivery speed used for the duration estimate.
pub const AVERAGE_SPEED_KMH: f64 = 30.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Coordinates {
            latitude,
            longitude,
        }
    }
}

/// Distance (km, two decimals) and duration (whole minutes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DistanceEstimate {
    pub distance: f64,
    pub duration: u64,
    pub distance_text: String,
    pub duration_text: String,
}

impl DistanceEstimate {
    /// Rounds `distance_km` to two decimals and renders both texts.
    pub fn new(distance_km: f64, duration_minutes: u64) -> Self {
        let distance = (distance_km * 100.0).round() / 100.0;
        DistanceEstimate {
            distance,
            duration: duration_minutes,
            distance_text: format!("{} km", distance),
            duration_text: format!("{} mins", duration_minutes),
        }
    }
}

/// Raw haversine distance in kilometres.
pub fn haversine_km(origin: Coordinates, destination: Coordinates) -> f64 {
    let d_lat = (destination.latitude - origin.latitude).to_radians();
    let d_lng = (destination.longitude - origin.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + origin.latitude.to_radians().cos()
            * destination.latitude.to_radians().cos()
            * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Estimates distance and travel time between two points.
///
/// The duration is computed from the unrounded distance; the reported
/// distance is rounded to two decimals afterwards.
///
/// ## Example
/// ```rust
/// use harvest_core::geo::{estimate_distance, Coordinates};
///
/// let here = Coordinates::new(12.9716, 77.5946);
/// let estimate = estimate_distance(here, here);
/// assert_eq!(estimate.distance, 0.0);
/// assert_eq!(estimate.duration, 0);
/// ```
pub fn estimate_distance(origin: Coordinates, destination: Coordinates) -> DistanceEstimate {
    let raw = haversine_km(origin, destination);
    let duration = (raw / AVERAGE_SPEED_KMH * 60.0).round() as u64;
    DistanceEstimate::new(raw, duration)
}
