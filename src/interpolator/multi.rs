//! Per-aircraft strategy dispatch

use std::sync::Arc;

use crate::error::Result;
use crate::geo::GeoPosition;
use crate::logger::InterpolationLogger;
use crate::parts::AircraftParts;
use crate::provider::RemoteAircraftProvider;
use crate::setup::{InterpolationHints, InterpolationSetup, InterpolatorMode};
use crate::situation::{AircraftSituation, Callsign};
use crate::status::{InterpolationStatus, PartsStatus};

use super::{Interpolator, LinearInterpolator, SplineInterpolator};

/// Holds both interpolators of one aircraft and forwards to the one the
/// setup selects for its callsign
#[derive(Debug)]
pub struct InterpolatorMulti {
    linear: Interpolator<LinearInterpolator>,
    spline: Interpolator<SplineInterpolator>,
    /// Last result of either strategy
    last_position: Option<GeoPosition>,
}

impl InterpolatorMulti {
    pub fn new(callsign: Callsign, provider: Arc<RemoteAircraftProvider>) -> Self {
        Self {
            linear: Interpolator::new(callsign.clone(), Arc::clone(&provider), LinearInterpolator),
            spline: Interpolator::new(callsign, provider, SplineInterpolator),
            last_position: None,
        }
    }

    pub fn callsign(&self) -> &Callsign {
        self.linear.callsign()
    }

    pub fn attach_logger(&mut self, logger: Arc<InterpolationLogger>) {
        self.linear.attach_logger(Arc::clone(&logger));
        self.spline.attach_logger(logger);
    }

    pub fn detach_logger(&mut self) {
        self.linear.detach_logger();
        self.spline.detach_logger();
    }

    pub fn add_aircraft_situation(&self, situation: AircraftSituation) -> Result<()> {
        self.linear.add_aircraft_situation(situation)
    }

    pub fn add_aircraft_parts(&self, parts: AircraftParts) -> Result<()> {
        self.linear.add_aircraft_parts(parts)
    }

    pub fn get_interpolated_situation(
        &mut self,
        current_time_ms: i64,
        setup: &InterpolationSetup,
        hints: &InterpolationHints,
    ) -> (AircraftSituation, InterpolationStatus) {
        match setup.mode_for(self.callsign()) {
            InterpolatorMode::Linear => {
                self.linear
                    .interpolate(current_time_ms, setup, hints, &mut self.last_position)
            }
            InterpolatorMode::Spline => {
                self.spline
                    .interpolate(current_time_ms, setup, hints, &mut self.last_position)
            }
        }
    }

    pub fn get_interpolated_parts(&self, cutoff_ms: i64, setup: &InterpolationSetup) -> (AircraftParts, PartsStatus) {
        match setup.mode_for(self.callsign()) {
            InterpolatorMode::Linear => self.linear.get_interpolated_parts(cutoff_ms, setup),
            InterpolatorMode::Spline => self.spline.get_interpolated_parts(cutoff_ms, setup),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{provider_with, situation};
    use super::*;

    #[test]
    fn test_dispatch_by_mode() {
        let provider = provider_with(&[
            situation("SWIFT", 3000, 9.0, 0.0, 0.0),
            situation("SWIFT", 2000, 4.0, 0.0, 0.0),
            situation("SWIFT", 1000, 1.0, 0.0, 0.0),
            situation("SWIFT", 0, 0.0, 0.0, 0.0),
        ]);
        let callsign = Callsign::new("SWIFT");
        let mut multi = InterpolatorMulti::new(callsign.clone(), provider);
        let hints = InterpolationHints::default();

        let mut setup = InterpolationSetup::default();
        let (s, status) = multi.get_interpolated_situation(1500, &setup, &hints);
        assert!(status.did_interpolation_succeed());
        assert!((s.position().latitude - 2.25).abs() < 1e-9);

        setup.set_mode_for(callsign, InterpolatorMode::Linear);
        let (s, _) = multi.get_interpolated_situation(1500, &setup, &hints);
        assert!((s.position().latitude - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_changed_position_across_mode_switch() {
        let provider = provider_with(&[situation("SWIFT", 1000, 1.0, 0.0, 0.0), situation("SWIFT", 0, 0.0, 0.0, 0.0)]);
        let callsign = Callsign::new("SWIFT");
        let mut multi = InterpolatorMulti::new(callsign.clone(), provider);
        let hints = InterpolationHints::default();

        let mut setup = InterpolationSetup::default();
        let (s1, status) = multi.get_interpolated_situation(500, &setup, &hints);
        assert!(status.has_changed_position());

        // two points: both strategies land on the same position
        setup.set_mode_for(callsign.clone(), InterpolatorMode::Linear);
        let (s2, status) = multi.get_interpolated_situation(500, &setup, &hints);
        assert_eq!(s1.position(), s2.position());
        assert!(!status.has_changed_position());

        let (_, status) = multi.get_interpolated_situation(800, &setup, &hints);
        assert!(status.has_changed_position());

        // back to spline at the earlier time: moved relative to the linear result
        setup.set_mode_for(callsign, InterpolatorMode::Spline);
        let (_, status) = multi.get_interpolated_situation(500, &setup, &hints);
        assert!(status.has_changed_position());
    }

    #[test]
    fn test_logger_attached_to_both() {
        let provider = provider_with(&[situation("SWIFT", 1000, 1.0, 0.0, 0.0), situation("SWIFT", 0, 0.0, 0.0, 0.0)]);
        let logger = Arc::new(InterpolationLogger::default());
        let mut multi = InterpolatorMulti::new(Callsign::new("SWIFT"), provider);
        multi.attach_logger(Arc::clone(&logger));

        let mut setup = InterpolationSetup {
            log_all: true,
            ..Default::default()
        };
        let hints = InterpolationHints::default();
        multi.get_interpolated_situation(500, &setup, &hints);
        setup.default_mode = InterpolatorMode::Linear;
        multi.get_interpolated_situation(500, &setup, &hints);

        let modes: Vec<InterpolatorMode> = logger.situation_logs().iter().map(|l| l.mode).collect();
        assert_eq!(modes, vec![InterpolatorMode::Spline, InterpolatorMode::Linear]);
    }
}
