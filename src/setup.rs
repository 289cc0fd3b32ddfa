//! Interpolation setup and per-aircraft hints
//!
//!  Both are plain values handed into every interpolation call.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::geo::GeoPosition;
use crate::situation::Callsign;

/// Which position interpolator is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InterpolatorMode {
    Linear,
    #[default]
    Spline,
}

impl fmt::Display for InterpolatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpolatorMode::Linear => f.write_str("linear"),
            InterpolatorMode::Spline => f.write_str("spline"),
        }
    }
}

impl FromStr for InterpolatorMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Ok(InterpolatorMode::Linear),
            "spline" | "curve" => Ok(InterpolatorMode::Spline),
            other => Err(Error::UnknownMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InterpolationSetup {
    pub default_mode: InterpolatorMode,
    /// Per-callsign strategy selection
    pub mode_overrides: HashMap<Callsign, InterpolatorMode>,
    /// Log every aircraft
    pub log_all: bool,
    pub log_callsigns: HashSet<Callsign>,
    /// Used when the newest situation carries no time offset
    pub default_time_offset_ms: i64,
    /// Linearly blend flap percentage between parts records
    pub blend_flaps: bool,
}

impl InterpolationSetup {
    pub fn mode_for(&self, callsign: &Callsign) -> InterpolatorMode {
        self.mode_overrides
            .get(callsign)
            .copied()
            .unwrap_or(self.default_mode)
    }

    pub fn set_mode_for(&mut self, callsign: Callsign, mode: InterpolatorMode) {
        self.mode_overrides.insert(callsign, mode);
    }

    pub fn log_interpolation_for(&self, callsign: &Callsign) -> bool {
        self.log_all || self.log_callsigns.contains(callsign)
    }

    pub fn add_callsign_to_log(&mut self, callsign: Callsign) {
        self.log_callsigns.insert(callsign);
    }

    pub fn clear_log_callsigns(&mut self) {
        self.log_all = false;
        self.log_callsigns.clear();
    }
}

/// Ground elevation known to be valid within `radius_m` of `center`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationPlane {
    pub center: GeoPosition,
    pub elevation_ft: f64,
    pub radius_m: f64,
}

impl ElevationPlane {
    pub fn new(center: GeoPosition, elevation_ft: f64, radius_m: f64) -> Self {
        Self {
            center,
            elevation_ft,
            radius_m,
        }
    }

    /// Elevation at `position` if it lies within the plane's radius
    pub fn elevation_at(&self, position: &GeoPosition) -> Option<f64> {
        (self.center.distance_m(position) <= self.radius_m).then_some(self.elevation_ft)
    }
}

/// Simulator supplied knowledge about one aircraft
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InterpolationHints {
    pub elevation: Option<ElevationPlane>,
    /// VTOL aircraft hover at low speed, so speed says nothing about ground contact
    pub vtol: bool,
    /// Height of the center of gravity above ground when on ground
    pub cg_above_ground_ft: Option<f64>,
}

impl InterpolationHints {
    pub fn with_elevation(elevation: ElevationPlane) -> Self {
        Self {
            elevation: Some(elevation),
            ..Default::default()
        }
    }

    pub fn ground_elevation_at(&self, position: &GeoPosition) -> Option<f64> {
        self.elevation.as_ref().and_then(|plane| plane.elevation_at(position))
    }
}
