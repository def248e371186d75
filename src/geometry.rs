//! Planar and great-circle geometry on geodetic points.
//!
//! Crossing tests treat longitude as x and latitude as y. At track scale the
//! distortion of that projection is far below GPS accuracy; only the
//! proximity gate needs real distances and uses the haversine formula.

use crate::types::GeoPoint;

/// Orientation magnitudes below this count as collinear (degrees²).
pub const COLLINEAR_EPSILON: f64 = 1e-9;

/// Mean Earth radius used by [`great_circle_distance`], in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Signed area of the triplet (A, B, P).
///
/// Positive when P is left of the directed line A→B, negative when right,
/// exactly `0.0` when within [`COLLINEAR_EPSILON`] of it.
pub fn orientation(a: GeoPoint, b: GeoPoint, p: GeoPoint) -> f64 {
    // Canonical endpoint order so that swapping A and B negates the result
    // bit-for-bit instead of up to rounding.
    if (a.lon, a.lat) <= (b.lon, b.lat) {
        snap(cross(a, b, p))
    } else {
        -snap(cross(b, a, p))
    }
}

/// Side of the directed line A→B that P lies on; see [`orientation`].
pub fn side_of_line(a: GeoPoint, b: GeoPoint, p: GeoPoint) -> f64 {
    orientation(a, b, p)
}

/// P is collinear with A and B and inside their bounding box.
pub fn on_segment(a: GeoPoint, b: GeoPoint, p: GeoPoint) -> bool {
    orientation(a, b, p) == 0.0
        && p.lon >= a.lon.min(b.lon)
        && p.lon <= a.lon.max(b.lon)
        && p.lat >= a.lat.min(b.lat)
        && p.lat <= a.lat.max(b.lat)
}

/// Segment P1–Q1 intersects segment P2–Q2, including touching endpoints and
/// collinear overlap.
pub fn segments_intersect(p1: GeoPoint, q1: GeoPoint, p2: GeoPoint, q2: GeoPoint) -> bool {
    let o1 = sign(orientation(p1, q1, p2));
    let o2 = sign(orientation(p1, q1, q2));
    let o3 = sign(orientation(p2, q2, p1));
    let o4 = sign(orientation(p2, q2, q1));

    if o1 != 0 && o2 != 0 && o3 != 0 && o4 != 0 && o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == 0 && on_segment(p1, q1, p2))
        || (o2 == 0 && on_segment(p1, q1, q2))
        || (o3 == 0 && on_segment(p2, q2, p1))
        || (o4 == 0 && on_segment(p2, q2, q1))
}

/// Arithmetic midpoint of two points.
pub fn midpoint(a: GeoPoint, b: GeoPoint) -> GeoPoint {
    GeoPoint::new((a.lon + b.lon) / 2.0, (a.lat + b.lat) / 2.0)
}

/// Haversine distance between two points, in meters.
pub fn great_circle_distance(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();
    let dlat = (p2.lat - p1.lat).to_radians();
    let dlon = (p2.lon - p1.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

fn cross(a: GeoPoint, b: GeoPoint, p: GeoPoint) -> f64 {
    (b.lon - a.lon) * (p.lat - a.lat) - (b.lat - a.lat) * (p.lon - a.lon)
}

fn snap(value: f64) -> f64 {
    if value.abs() < COLLINEAR_EPSILON { 0.0 } else { value }
}

fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(lon: f64, lat: f64) -> GeoPoint {
        GeoPoint::new(lon, lat)
    }

    #[test]
    fn orientation_classifies_sides() {
        let a = p(0.0, 0.0);
        let b = p(1.0, 0.0);
        assert!(orientation(a, b, p(0.5, 1.0)) > 0.0);
        assert!(orientation(a, b, p(0.5, -1.0)) < 0.0);
        assert_eq!(orientation(a, b, p(2.0, 0.0)), 0.0);
        // Inside the epsilon band
        assert_eq!(orientation(a, b, p(0.5, 1e-10)), 0.0);
    }

    #[test]
    fn perpendicular_segments_intersect() {
        assert!(segments_intersect(p(0.0, 0.0), p(1.0, 0.0), p(0.5, -0.5), p(0.5, 0.5)));
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 0.1), p(1.0, 0.1)));
    }

    #[test]
    fn short_segment_stops_before_line() {
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 0.0), p(0.5, -0.5), p(0.5, -0.1)));
    }

    #[test]
    fn crossing_beyond_line_end_is_not_an_intersection() {
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 0.0), p(1.5, -0.5), p(1.5, 0.5)));
    }

    #[test]
    fn touching_endpoint_counts() {
        assert!(segments_intersect(p(0.0, 0.0), p(1.0, 0.0), p(0.5, -0.5), p(0.5, 0.0)));
    }

    #[test]
    fn collinear_overlap_and_gap() {
        assert!(segments_intersect(p(0.0, 0.0), p(1.0, 0.0), p(0.5, 0.0), p(1.5, 0.0)));
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 0.0), p(1.5, 0.0), p(2.5, 0.0)));
    }

    #[test]
    fn on_segment_respects_bounding_box() {
        assert!(on_segment(p(0.0, 0.0), p(1.0, 1.0), p(0.5, 0.5)));
        assert!(!on_segment(p(0.0, 0.0), p(1.0, 1.0), p(1.5, 1.5)));
        assert!(!on_segment(p(0.0, 0.0), p(1.0, 1.0), p(0.5, 0.6)));
    }

    #[test]
    fn haversine_one_degree_of_longitude_at_equator() {
        let dist = great_circle_distance(p(0.0, 0.0), p(1.0, 0.0));
        assert!((dist - 111_195.0).abs() < 200.0);
        assert_eq!(great_circle_distance(p(6.13, 49.61), p(6.13, 49.61)), 0.0);
    }

    #[test]
    fn midpoint_is_average() {
        assert_eq!(midpoint(p(0.0, 0.0), p(1.0, 2.0)), p(0.5, 1.0));
    }

    prop_compose! {
        fn arb_point()(lon in -180.0f64..180.0, lat in -90.0f64..90.0) -> GeoPoint {
            GeoPoint::new(lon, lat)
        }
    }

    prop_compose! {
        fn arb_track_point()(lon in 6.0f64..6.01, lat in 49.6f64..49.61) -> GeoPoint {
            GeoPoint::new(lon, lat)
        }
    }

    proptest! {
        #[test]
        fn orientation_is_antisymmetric(a in arb_point(), b in arb_point(), c in arb_point()) {
            prop_assert_eq!(orientation(a, b, c), -orientation(b, a, c));
        }

        #[test]
        fn intersection_is_symmetric(
            p1 in arb_point(), q1 in arb_point(), p2 in arb_point(), q2 in arb_point()
        ) {
            prop_assert_eq!(segments_intersect(p1, q1, p2, q2), segments_intersect(p2, q2, p1, q1));
        }

        #[test]
        fn intersection_is_symmetric_at_track_scale(
            p1 in arb_track_point(), q1 in arb_track_point(),
            p2 in arb_track_point(), q2 in arb_track_point()
        ) {
            prop_assert_eq!(segments_intersect(p1, q1, p2, q2), segments_intersect(p2, q2, p1, q1));
            prop_assert_eq!(segments_intersect(p1, q1, p2, q2), segments_intersect(q1, p1, p2, q2));
        }

        #[test]
        fn distance_is_symmetric_and_non_negative(a in arb_point(), b in arb_point()) {
            let d1 = great_circle_distance(a, b);
            let d2 = great_circle_distance(b, a);
            prop_assert!(d1 >= 0.0);
            prop_assert!((d1 - d2).abs() < 1e-6);
        }
    }
}
