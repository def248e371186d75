//! Core value types for lap timing.
//!
//! ## Overview
//!
//! - [`GeoPoint`] is a `(longitude, latitude)` pair in decimal degrees
//! - [`Timestamp`] is the instant a fix was taken
//! - [`Fix`] is one position sample with its validity flag
//! - [`ReferenceLine`] is a directed two-point timing gate, named by [`LineKind`]
//! - [`CrossingMode`] selects how probe segments are tested against lines
//! - [`RaceEvent`] is what the engine emits, [`EventPayload`] is its wire form
//!
//! ## Usage Example
//!
//! ```rust
//! use lapgate::types::{GeoPoint, LineKind, LinePayload, ReferenceLine};
//!
//! let payload: LinePayload =
//!     serde_yaml_ng::from_str(r#"{"p1": [6.1300, 49.6100], "p2": [6.1302, 49.6100]}"#).unwrap();
//! let line = payload.into_line(LineKind::Start).unwrap();
//!
//! assert_eq!(line, ReferenceLine::new(GeoPoint::new(6.1300, 49.6100), GeoPoint::new(6.1302, 49.6100)));
//! assert!(!line.is_degenerate());
//! ```

mod crossing_mode;
mod event;
mod fix;
mod geo;
mod line;

pub use crossing_mode::{CrossingMode, DEFAULT_PROXIMITY_RADIUS_M};
pub use event::{EventPayload, RaceEvent};
pub use fix::{Fix, FixRecord};
pub use geo::{GeoPoint, Timestamp};
pub use line::{LineKind, LinePayload, ReferenceLine};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use proptest::prelude::*;

    prop_compose! {
        fn arb_point()(lon in -180.0f64..180.0, lat in -90.0f64..90.0) -> GeoPoint {
            GeoPoint::new(lon, lat)
        }
    }

    proptest! {
        #[test]
        fn timestamp_ordering_matches_seconds(a in 0.0f64..1e9, b in 0.0f64..1e9) {
            let ta = Timestamp::from_secs_f64(a);
            let tb = Timestamp::from_secs_f64(b);

            prop_assert_eq!(ta < tb, ta.as_secs_f64() < tb.as_secs_f64());
            // One of the two directions always saturates to zero
            prop_assert!(
                ta.saturating_duration_since(tb).is_zero() || tb.saturating_duration_since(ta).is_zero()
            );
        }

        #[test]
        fn line_payload_conversion_preserves_endpoints(a in arb_point(), b in arb_point()) {
            let line = ReferenceLine::new(a, b);
            let payload = LinePayload::from(line);
            let back = payload.into_line(LineKind::Lap).unwrap();
            prop_assert_eq!(back, line);
        }

        #[test]
        fn only_coincident_endpoints_are_degenerate(a in arb_point(), b in arb_point()) {
            prop_assert!(ReferenceLine::new(a, a).is_degenerate());
            if (a.lon - b.lon).abs() > 1e-6 || (a.lat - b.lat).abs() > 1e-6 {
                prop_assert!(!ReferenceLine::new(a, b).is_degenerate());
            }
        }
    }

    #[test]
    fn timestamp_clamps_invalid_input() {
        assert_eq!(Timestamp::from_secs_f64(-3.0), Timestamp::ZERO);
        assert_eq!(Timestamp::from_secs_f64(f64::NAN), Timestamp::ZERO);
        assert_eq!(Timestamp::from_secs_f64(1.5) + Duration::from_millis(500), Timestamp::from_millis(2000));
    }

    #[test]
    fn line_payload_rejects_non_finite_coordinates() {
        let payload = LinePayload { p1: [f64::NAN, 0.0], p2: [1.0, 0.0] };
        let err = payload.into_line(LineKind::Finish).unwrap_err();
        assert!(matches!(err, crate::TimingError::InvalidLine { kind: LineKind::Finish, .. }));
    }

    #[test]
    fn geo_point_serializes_as_lon_lat_pair() {
        let point: GeoPoint = serde_yaml_ng::from_str("[6.13, 49.61]").unwrap();
        assert_eq!(point, GeoPoint::new(6.13, 49.61));
    }

    #[test]
    fn fix_record_without_fix_is_invalid() {
        let record = FixRecord { latitude: 49.61, longitude: 6.13, timestamp: 12.5, has_fix: false };
        let fix = Fix::from(record);
        assert!(!fix.valid);
        assert_eq!(fix.timestamp, Timestamp::from_secs_f64(12.5));

        let record = FixRecord { has_fix: true, latitude: f64::INFINITY, ..record };
        assert!(!Fix::from(record).valid);
    }

    #[test]
    fn event_payload_uses_wire_names() {
        let event = RaceEvent::LapCompleted {
            lap_number: 2,
            lap_duration: Duration::from_secs(12),
            total_laps: 2,
            start_time: Timestamp::from_secs_f64(11.0),
            end_time: Timestamp::from_secs_f64(23.0),
            race_finished: true,
        };
        assert_eq!(event.name(), "lap_completed");

        let yaml = serde_yaml_ng::to_string(&event.to_payload()).unwrap();
        assert!(yaml.contains("event: lap_completed"));
        assert!(yaml.contains("lap_time_seconds: 12.0"));
        assert!(yaml.contains("race_finished_flag: true"));

        let started = RaceEvent::RaceStarted { start_time: Timestamp::ZERO, total_laps: 3 };
        match started.to_payload() {
            EventPayload::RaceStarted { lap_number_starting, total_laps, .. } => {
                assert_eq!(lap_number_starting, 1);
                assert_eq!(total_laps, 3);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn crossing_mode_defaults_to_proximity_gate() {
        assert_eq!(CrossingMode::default().radius_m(), Some(DEFAULT_PROXIMITY_RADIUS_M));
        assert!(CrossingMode::Directed.is_valid());
        assert!(!CrossingMode::ProximityGated { radius_m: -1.0 }.is_valid());
        assert!(!CrossingMode::ProximityGated { radius_m: f64::NAN }.is_valid());

        let mode: CrossingMode = serde_yaml_ng::from_str("kind: proximity_gated\nradius_m: 40.0").unwrap();
        assert_eq!(mode, CrossingMode::ProximityGated { radius_m: 40.0 });
        let mode: CrossingMode = serde_yaml_ng::from_str("kind: directed").unwrap();
        assert_eq!(mode, CrossingMode::Directed);
    }
}
