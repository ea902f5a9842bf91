//! Coordinates, distances and the circle layouts used to cover a search area.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
pub const DEFAULT_BOUNDING_BOX_RADIUS_KM: f64 = 50.0;
/// Largest radius the nearby search accepts.
pub const MAX_SEARCH_RADIUS_METERS: f64 = 50_000.0;

const KM_PER_DEGREE: f64 = 111.32;
const METERS_PER_DEGREE: f64 = 111_320.0;
const SUBCIRCLE_FACTOR: f64 = 0.72791;
const TILING_EARTH_RADIUS_METERS: f64 = 6_374_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Coordinate,
    pub radius_m: f64,
}

impl Circle {
    pub fn new(center: Coordinate, radius_m: f64) -> Self {
        Self { center, radius_m }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub sw: Coordinate,
    pub ne: Coordinate,
}

impl BoundingBox {
    pub fn new(sw: Coordinate, ne: Coordinate) -> Self {
        Self { sw, ne }
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.sw.lat + self.ne.lat) / 2.0,
            (self.sw.lng + self.ne.lng) / 2.0,
        )
    }

    /// Edges count as inside.
    pub fn contains(&self, point: Coordinate) -> bool {
        self.sw.lat <= point.lat
            && point.lat <= self.ne.lat
            && self.sw.lng <= point.lng
            && point.lng <= self.ne.lng
    }
}

/// Great-circle distance in metres.
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lng1) = (a.lat.to_radians(), a.lng.to_radians());
    let (lat2, lng2) = (b.lat.to_radians(), b.lng.to_radians());
    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

pub fn bounding_box_around(center: Coordinate, radius_km: f64) -> BoundingBox {
    let lat_change = radius_km / KM_PER_DEGREE;
    let lng_change = (radius_km / (KM_PER_DEGREE * center.lat.to_radians().cos())).abs();

    BoundingBox::new(
        Coordinate::new(center.lat - lat_change, center.lng - lng_change),
        Coordinate::new(center.lat + lat_change, center.lng + lng_change),
    )
}

/// Grid of circle centres covering `bbox`, row by row from the SW corner.
/// The longitude step widens with latitude.
pub fn circle_centers(bbox: &BoundingBox, radius_m: f64) -> Vec<Coordinate> {
    let mut centers = Vec::new();
    if radius_m <= 0.0 {
        return centers;
    }

    let lat_step = radius_m * 2.0 / METERS_PER_DEGREE;
    let mut lat = bbox.sw.lat;
    while lat <= bbox.ne.lat {
        let lng_step = radius_m * 2.0 / (METERS_PER_DEGREE * lat.to_radians().cos());
        let mut lng = bbox.sw.lng;
        while lng <= bbox.ne.lng {
            centers.push(Coordinate::new(lat, lng));
            lng += lng_step;
        }
        lat += lat_step;
    }

    centers
}

/// Three sub-circles that together cover `circle`.
pub fn three_circle_tiling(circle: &Circle) -> [Circle; 3] {
    let meters_per_lat = TILING_EARTH_RADIUS_METERS * (2.0 * PI / 360.0);
    let meters_per_lng = meters_per_lat * circle.center.lat.to_radians().cos();
    let sub_radius = circle.radius_m * SUBCIRCLE_FACTOR;

    [0.0, 2.0 * PI / 3.0, 4.0 * PI / 3.0].map(|angle: f64| {
        Circle::new(
            Coordinate::new(
                circle.center.lat + sub_radius * angle.sin() / meters_per_lat,
                circle.center.lng + sub_radius * angle.cos() / meters_per_lng,
            ),
            sub_radius,
        )
    })
}

/// The single circle a nearby search starts from for `bbox`.
pub fn search_circle_for(bbox: &BoundingBox) -> Circle {
    let radius = (haversine_distance(bbox.sw, bbox.ne) / 2.0).min(MAX_SEARCH_RADIUS_METERS);
    Circle::new(bbox.center(), radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() <= tolerance
    }

    #[test]
    fn test_haversine_distance() {
        let chicago = Coordinate::new(41.8781, -87.6298);
        let new_york = Coordinate::new(40.7128, -74.0060);
        let distance = haversine_distance(chicago, new_york);
        assert!(close(distance, 1_144_000.0, 5_000.0), "got {}", distance);
        assert_eq!(haversine_distance(chicago, chicago), 0.0);
    }

    #[test]
    fn test_bounding_box_around() {
        let center = Coordinate::new(0.0, 10.0);
        let bbox = bounding_box_around(center, DEFAULT_BOUNDING_BOX_RADIUS_KM);
        assert!(close(bbox.ne.lat, 50.0 / 111.32, 1e-9));
        assert!(close(bbox.ne.lng - 10.0, 50.0 / 111.32, 1e-9));
        assert!(bbox.contains(center));
        assert!(close(bbox.center().lat, 0.0, 1e-9));
        assert!(close(bbox.center().lng, 10.0, 1e-9));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let bbox = BoundingBox::new(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0));
        assert!(bbox.contains(Coordinate::new(1.0, 0.0)));
        assert!(!bbox.contains(Coordinate::new(1.0001, 0.5)));
    }

    #[test]
    fn test_circle_centers_grid() {
        let bbox = BoundingBox::new(Coordinate::new(0.0, 0.0), Coordinate::new(0.01, 0.01));
        // step is 2 * 500 / 111320 ≈ 0.00898 degrees, so two rows of two
        let centers = circle_centers(&bbox, 500.0);
        assert_eq!(centers.len(), 4);
        assert_eq!(centers[0], Coordinate::new(0.0, 0.0));
        assert!(centers.iter().all(|c| bbox.contains(*c)));

        assert!(circle_centers(&bbox, 0.0).is_empty());
    }

    #[test]
    fn test_three_circle_tiling() {
        let parent = Circle::new(Coordinate::new(41.88, -87.63), 10_000.0);
        let children = three_circle_tiling(&parent);

        for child in &children {
            assert!(close(child.radius_m, 7_279.1, 1e-6));
            let offset = haversine_distance(parent.center, child.center);
            assert!(close(offset, 7_279.1, 50.0), "offset {}", offset);
        }
        // angle 0 moves east only
        assert!(close(children[0].center.lat, parent.center.lat, 1e-12));
        assert!(children[0].center.lng > parent.center.lng);
    }

    #[test]
    fn test_search_circle_is_capped() {
        let bbox = bounding_box_around(Coordinate::new(41.88, -87.63), 50.0);
        let circle = search_circle_for(&bbox);
        assert_eq!(circle.radius_m, MAX_SEARCH_RADIUS_METERS);
        assert_eq!(circle.center, bbox.center());

        let small = BoundingBox::new(Coordinate::new(0.0, 0.0), Coordinate::new(0.01, 0.0));
        let circle = search_circle_for(&small);
        assert!(close(circle.radius_m, 556.0, 2.0));
    }
}
