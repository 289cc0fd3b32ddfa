//! Pitch, bank, heading and ground speed between two situations
//!
//!  Shared by both position interpolators so the heading wraparound is
//!  handled in one place.

use crate::geo::lerp;
use crate::situation::{AircraftSituation, Heading, normalize_degrees};

#[derive(Debug, Clone, Copy)]
pub struct PbhInterpolator<'a> {
    fraction: f64,
    older: &'a AircraftSituation,
    newer: &'a AircraftSituation,
}

impl<'a> PbhInterpolator<'a> {
    pub fn new(fraction: f64, older: &'a AircraftSituation, newer: &'a AircraftSituation) -> Self {
        Self { fraction, older, newer }
    }

    pub fn set_fraction(&mut self, fraction: f64) {
        self.fraction = fraction;
    }

    /// Heading along the shorter arc, reference taken from the newer situation
    pub fn heading(&self) -> Heading {
        let degrees = interpolate_heading(
            self.older.heading().degrees,
            self.newer.heading().degrees,
            self.fraction,
        );
        Heading::new(degrees, self.newer.heading().reference)
    }

    pub fn pitch_deg(&self) -> f64 {
        lerp(self.older.pitch_deg(), self.newer.pitch_deg(), self.fraction)
    }

    pub fn bank_deg(&self) -> f64 {
        lerp(self.older.bank_deg(), self.newer.bank_deg(), self.fraction)
    }

    pub fn ground_speed_kts(&self) -> f64 {
        lerp(self.older.ground_speed_kts(), self.newer.ground_speed_kts(), self.fraction)
    }
}

/// Interpolate two headings (degrees) on the shortest path, result in [0, 360)
pub fn interpolate_heading(older: f64, newer: f64, fraction: f64) -> f64 {
    let mut delta = newer - older;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta < -180.0 {
        delta += 360.0;
    }
    normalize_degrees(older + delta * fraction)
}
