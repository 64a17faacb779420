//! Mock geocoding and distance.

use harvest_core::{estimate_distance, Coordinates, DistanceEstimate};

/// Known cities, matched in this order.
const CITIES: [(&str, Coordinates); 3] = [
    ("bangalore", Coordinates::new(12.9716, 77.5946)),
    ("mumbai", Coordinates::new(19.0760, 72.8777)),
    ("delhi", Coordinates::new(28.6139, 77.2090)),
];

/// Returned for any address that names none of the known cities.
pub const DEFAULT_LOCATION: Coordinates = Coordinates::new(12.9716, 77.5946);

/// First city whose name occurs in the address (case-insensitive).
pub fn geocode(address: &str) -> Coordinates {
    let address = address.to_lowercase();
    CITIES
        .iter()
        .find(|(city, _)| address.contains(city))
        .map(|(_, coordinates)| *coordinates)
        .unwrap_or(DEFAULT_LOCATION)
}

pub fn distance(origin: Coordinates, destination: Coordinates) -> DistanceEstimate {
    estimate_distance(origin, destination)
}
