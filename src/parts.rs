//! Aircraft parts
//!
//!  Discrete configuration of a remote aircraft: lights, gear, flaps,
//!  spoilers and engines.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buffer::Timestamped;
use crate::error::{Error, Result};
use crate::situation::Callsign;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AircraftLights {
    pub strobe: bool,
    pub landing: bool,
    pub taxi: bool,
    pub beacon: bool,
    pub nav: bool,
    pub logo: bool,
}

impl AircraftLights {
    pub fn new(strobe: bool, landing: bool, taxi: bool, beacon: bool, nav: bool, logo: bool) -> Self {
        Self {
            strobe,
            landing,
            taxi,
            beacon,
            nav,
            logo,
        }
    }

    pub fn all_on() -> Self {
        Self::new(true, true, true, true, true, true)
    }

    pub fn all_off() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AircraftEngine {
    /// Engine number, starting at 1
    pub number: u8,
    pub running: bool,
}

impl AircraftEngine {
    pub fn new(number: u8, running: bool) -> Self {
        Self { number, running }
    }
}

/// Timestamped discrete aircraft configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftParts {
    pub timestamp_ms: i64,
    pub lights: AircraftLights,
    pub gear_down: bool,
    /// Flaps deployment, 0-100
    pub flaps_percent: f64,
    pub spoilers_out: bool,
    pub engines: Vec<AircraftEngine>,
    pub on_ground: bool,
}

impl Default for AircraftParts {
    fn default() -> Self {
        Self::neutral(Vec::new())
    }
}

impl AircraftParts {
    pub fn new(
        lights: AircraftLights,
        gear_down: bool,
        flaps_percent: f64,
        spoilers_out: bool,
        engines: Vec<AircraftEngine>,
        on_ground: bool,
    ) -> Self {
        Self {
            timestamp_ms: 0,
            lights,
            gear_down,
            flaps_percent: flaps_percent.clamp(0.0, 100.0),
            spoilers_out,
            engines,
            on_ground,
        }
    }

    /// Parts used when nothing applicable was received: gear down,
    /// flaps and spoilers retracted, lights off
    pub fn neutral(engines: Vec<AircraftEngine>) -> Self {
        Self {
            timestamp_ms: 0,
            lights: AircraftLights::all_off(),
            gear_down: true,
            flaps_percent: 0.0,
            spoilers_out: false,
            engines,
            on_ground: false,
        }
    }

    pub fn with_timestamp_ms(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn set_flaps_percent(&mut self, flaps_percent: f64) {
        self.flaps_percent = flaps_percent.clamp(0.0, 100.0);
    }

    pub fn engine(&self, number: u8) -> Option<&AircraftEngine> {
        self.engines.iter().find(|e| e.number == number)
    }

    pub fn is_engine_on(&self, number: u8) -> bool {
        self.engine(number).is_some_and(|e| e.running)
    }

    pub fn engines_count(&self) -> usize {
        self.engines.len()
    }

    pub fn validate(&self, callsign: &Callsign) -> Result<()> {
        if callsign.is_empty() {
            return Err(Error::EmptyCallsign);
        }
        let invalid = |reason: &str| Error::InvalidParts {
            callsign: callsign.clone(),
            reason: reason.to_string(),
        };
        if !self.flaps_percent.is_finite() {
            return Err(invalid("non-finite flaps percentage"));
        }
        if self.engines.iter().any(|e| e.number == 0) {
            return Err(invalid("engine numbers start at 1"));
        }
        Ok(())
    }
}

impl Timestamped for AircraftParts {
    fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }
}

impl fmt::Display for AircraftParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let engines: Vec<String> = self
            .engines
            .iter()
            .map(|e| format!("{}:{}", e.number, if e.running { "on" } else { "off" }))
            .collect();
        write!(
            f,
            "@{} gear {} flaps {:.0}% spoilers {} engines [{}] {}",
            self.timestamp_ms,
            if self.gear_down { "down" } else { "up" },
            self.flaps_percent,
            if self.spoilers_out { "out" } else { "in" },
            engines.join(" "),
            if self.on_ground { "on ground" } else { "airborne" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engines() -> Vec<AircraftEngine> {
        vec![
            AircraftEngine::new(1, true),
            AircraftEngine::new(2, false),
            AircraftEngine::new(3, true),
        ]
    }

    #[test]
    fn test_engine_lookup() {
        let parts = AircraftParts::new(AircraftLights::all_on(), true, 20.0, false, engines(), false);
        assert_eq!(parts.engines_count(), 3);
        assert!(parts.is_engine_on(1));
        assert!(!parts.is_engine_on(2));
        assert!(parts.is_engine_on(3));
        assert!(!parts.is_engine_on(4));
    }

    #[test]
    fn test_flaps_clamped() {
        let mut parts = AircraftParts::new(AircraftLights::default(), false, 150.0, false, vec![], false);
        assert_eq!(parts.flaps_percent, 100.0);
        parts.set_flaps_percent(-3.0);
        assert_eq!(parts.flaps_percent, 0.0);
    }

    #[test]
    fn test_neutral_parts() {
        let parts = AircraftParts::neutral(engines());
        assert!(parts.gear_down);
        assert_eq!(parts.flaps_percent, 0.0);
        assert!(!parts.spoilers_out);
        assert_eq!(parts.lights, AircraftLights::all_off());
        assert_eq!(parts.engines_count(), 3);
    }

    #[test]
    fn test_validate() {
        let cs = Callsign::new("SWIFT");
        let parts = AircraftParts::neutral(engines());
        assert!(parts.validate(&cs).is_ok());
        assert!(matches!(parts.validate(&Callsign::default()), Err(Error::EmptyCallsign)));

        let bad = AircraftParts::neutral(vec![AircraftEngine::new(0, true)]);
        assert!(matches!(bad.validate(&cs), Err(Error::InvalidParts { .. })));
    }
}
