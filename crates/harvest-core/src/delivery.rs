//! # Delivery Tracking
//!
//! View model behind the "Track your delivery" screen.
//!
//! A delivery may arrive with partial data: the route is only drawable when
//! both the pickup and the destination coordinates are known, and a missing
//! stored distance is filled in from the distance estimator.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::geo::{estimate_distance, Coordinates, DistanceEstimate};

/// Delivery progress reported for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Dispatched,
    InTransit,
    Delivered,
}

/// What the tracking screen renders.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeliveryTracking {
    pub status: DeliveryStatus,
    /// Stored route length in km.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration_minutes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<Coordinates>,
}

impl DeliveryTracking {
    /// Builds a tracking record for a freshly routed delivery.
    pub fn routed(pickup: Coordinates, destination: Coordinates, estimate: &DistanceEstimate) -> Self {
        DeliveryTracking {
            status: DeliveryStatus::Pending,
            distance: Some(estimate.distance),
            estimated_duration_minutes: Some(estimate.duration),
            pickup: Some(pickup),
            destination: Some(destination),
        }
    }

    /// Both endpoints, or `None` when either is unknown.
    pub fn route_endpoints(&self) -> Option<(Coordinates, Coordinates)> {
        Some((self.pickup?, self.destination?))
    }

    /// Distance and duration to display.
    ///
    /// Stored values win; otherwise they are estimated from the endpoints.
    pub fn estimate(&self) -> Option<DistanceEstimate> {
        match (self.distance, self.estimated_duration_minutes) {
            (Some(distance), Some(duration)) => Some(DistanceEstimate::new(distance, duration)),
            _ => self
                .route_endpoints()
                .map(|(pickup, destination)| estimate_distance(pickup, destination)),
        }
    }
}
