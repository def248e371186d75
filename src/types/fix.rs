//! Position fix types

use serde::{Deserialize, Serialize};

use super::{GeoPoint, Timestamp};

/// A single position sample produced by the positioning feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub position: GeoPoint,
    pub timestamp: Timestamp,
    /// Receiver reported a usable fix. Position is meaningless when false.
    pub valid: bool,
}

impl Fix {
    /// A valid fix at `position`.
    pub fn new(position: GeoPoint, timestamp: Timestamp) -> Self {
        Self { position, timestamp, valid: true }
    }

    /// A report that the receiver has no fix at `timestamp`.
    pub fn lost(timestamp: Timestamp) -> Self {
        Self { position: GeoPoint::default(), timestamp, valid: false }
    }
}

/// Fix record as delivered by the decoding layer:
/// `{latitude, longitude, timestamp, has_fix}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixRecord {
    pub latitude: f64,
    pub longitude: f64,
    /// Fractional seconds
    pub timestamp: f64,
    pub has_fix: bool,
}

impl From<FixRecord> for Fix {
    fn from(record: FixRecord) -> Self {
        let position = GeoPoint::new(record.longitude, record.latitude);
        // Non-finite coordinates cannot take part in geometry.
        let valid = record.has_fix && position.is_finite();
        Fix { position, timestamp: Timestamp::from_secs_f64(record.timestamp), valid }
    }
}
