//! Aircraft situations
//!
//!  A situation is one observed or interpolated state of a remote aircraft:
//!  position, attitude and speed valid at a given time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buffer::Timestamped;
use crate::error::{Error, Result};
use crate::geo::GeoPosition;

/// Largest sender latency accepted, in either direction
pub const MAX_TIME_OFFSET_MS: i64 = 86_400_000;

/// Unique identity of a remote aircraft within a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Callsign(String);

impl Callsign {
    pub fn new(callsign: impl Into<String>) -> Self {
        Self(callsign.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Callsign {
    fn from(s: &str) -> Self {
        Callsign::new(s)
    }
}

impl From<String> for Callsign {
    fn from(s: String) -> Self {
        Callsign::new(s)
    }
}

/// North reference of a heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeadingReference {
    #[default]
    True,
    Magnetic,
}

/// Heading in degrees, normalized into [0, 360)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Heading {
    pub degrees: f64,
    pub reference: HeadingReference,
}

impl Heading {
    pub fn new(degrees: f64, reference: HeadingReference) -> Self {
        Self {
            degrees: normalize_degrees(degrees),
            reference,
        }
    }

    pub fn true_north(degrees: f64) -> Self {
        Self::new(degrees, HeadingReference::True)
    }
}

/// Map any angle into [0, 360)
pub fn normalize_degrees(degrees: f64) -> f64 {
    let d = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if d >= 360.0 { 0.0 } else { d }
}

/// Timestamped position, attitude and speed of a remote aircraft
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AircraftSituation {
    callsign: Callsign,
    timestamp_ms: i64,
    time_offset_ms: Option<i64>,
    position: GeoPosition,
    ground_elevation_ft: Option<f64>,
    height_above_ground_ft: Option<f64>,
    heading: Heading,
    pitch_deg: f64,
    bank_deg: f64,
    ground_speed_kts: f64,
    on_ground: Option<bool>,
}

impl AircraftSituation {
    pub fn new(
        callsign: Callsign,
        position: GeoPosition,
        heading: Heading,
        pitch_deg: f64,
        bank_deg: f64,
        ground_speed_kts: f64,
    ) -> Self {
        Self {
            callsign,
            position,
            heading,
            pitch_deg,
            bank_deg,
            ground_speed_kts,
            ..Default::default()
        }
    }

    /// Empty situation for a callsign without usable data
    pub fn null(callsign: Callsign) -> Self {
        Self {
            callsign,
            ..Default::default()
        }
    }

    pub fn is_null(&self) -> bool {
        self.timestamp_ms == 0 && self.position == GeoPosition::default()
    }

    pub fn with_timestamp_ms(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn with_time_offset_ms(mut self, offset_ms: i64) -> Self {
        self.time_offset_ms = Some(offset_ms);
        self
    }

    pub fn with_ground_elevation_ft(mut self, elevation_ft: f64) -> Self {
        self.set_ground_elevation_ft(Some(elevation_ft));
        self
    }

    pub fn with_on_ground(mut self, on_ground: bool) -> Self {
        self.on_ground = Some(on_ground);
        self
    }

    pub fn callsign(&self) -> &Callsign {
        &self.callsign
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    pub fn set_timestamp_ms(&mut self, timestamp_ms: i64) {
        self.timestamp_ms = timestamp_ms;
    }

    pub fn time_offset_ms(&self) -> Option<i64> {
        self.time_offset_ms
    }

    pub fn set_time_offset_ms(&mut self, offset_ms: Option<i64>) {
        self.time_offset_ms = offset_ms;
    }

    pub fn position(&self) -> &GeoPosition {
        &self.position
    }

    pub fn set_position(&mut self, position: GeoPosition) {
        self.position = position;
        self.update_height_above_ground();
    }

    /// Replace only the altitude, keeping latitude/longitude
    pub fn set_altitude_ft(&mut self, altitude_ft: f64) {
        self.position.altitude_ft = altitude_ft;
        self.update_height_above_ground();
    }

    pub fn ground_elevation_ft(&self) -> Option<f64> {
        self.ground_elevation_ft
    }

    pub fn set_ground_elevation_ft(&mut self, elevation_ft: Option<f64>) {
        self.ground_elevation_ft = elevation_ft;
        self.update_height_above_ground();
    }

    /// Altitude minus ground elevation, if the elevation is known
    pub fn height_above_ground_ft(&self) -> Option<f64> {
        self.height_above_ground_ft
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn set_heading(&mut self, heading: Heading) {
        self.heading = heading;
    }

    pub fn pitch_deg(&self) -> f64 {
        self.pitch_deg
    }

    pub fn set_pitch_deg(&mut self, pitch_deg: f64) {
        self.pitch_deg = pitch_deg;
    }

    pub fn bank_deg(&self) -> f64 {
        self.bank_deg
    }

    pub fn set_bank_deg(&mut self, bank_deg: f64) {
        self.bank_deg = bank_deg;
    }

    pub fn ground_speed_kts(&self) -> f64 {
        self.ground_speed_kts
    }

    pub fn set_ground_speed_kts(&mut self, ground_speed_kts: f64) {
        self.ground_speed_kts = ground_speed_kts;
    }

    /// `None` when unknown
    pub fn on_ground(&self) -> Option<bool> {
        self.on_ground
    }

    pub fn is_on_ground(&self) -> bool {
        self.on_ground.unwrap_or(false)
    }

    pub fn set_on_ground(&mut self, on_ground: Option<bool>) {
        self.on_ground = on_ground;
    }

    fn update_height_above_ground(&mut self) {
        self.height_above_ground_ft = self
            .ground_elevation_ft
            .map(|elevation| self.position.altitude_ft - elevation);
    }

    /// Reject situations the interpolator cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.callsign.is_empty() {
            return Err(Error::EmptyCallsign);
        }
        let invalid = |reason: &str| Error::InvalidSituation {
            callsign: self.callsign.clone(),
            reason: reason.to_string(),
        };
        if !self.position.is_finite() {
            return Err(invalid("non-finite position"));
        }
        if !(-90.0..=90.0).contains(&self.position.latitude) {
            return Err(invalid("latitude out of range"));
        }
        if !(-180.0..=180.0).contains(&self.position.longitude) {
            return Err(invalid("longitude out of range"));
        }
        if !self.heading.degrees.is_finite() || !self.pitch_deg.is_finite() || !self.bank_deg.is_finite() {
            return Err(invalid("non-finite attitude"));
        }
        if !self.ground_speed_kts.is_finite() {
            return Err(invalid("non-finite ground speed"));
        }
        if self.ground_elevation_ft.is_some_and(|e| !e.is_finite()) {
            return Err(invalid("non-finite ground elevation"));
        }
        if self
            .time_offset_ms
            .is_some_and(|offset| !(-MAX_TIME_OFFSET_MS..=MAX_TIME_OFFSET_MS).contains(&offset))
        {
            return Err(invalid("time offset out of range"));
        }
        Ok(())
    }
}

impl Timestamped for AircraftSituation {
    fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }
}

impl fmt::Display for AircraftSituation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @{} lat {:.5} lon {:.5} alt {:.0}ft hdg {:.1} pitch {:.1} bank {:.1} gs {:.0}kts",
            self.callsign,
            self.timestamp_ms,
            self.position.latitude,
            self.position.longitude,
            self.position.altitude_ft,
            self.heading.degrees,
            self.pitch_deg,
            self.bank_deg,
            self.ground_speed_kts
        )
    }
}
